pub mod firm;
pub mod government;
pub mod household;

pub use firm::{Archetype, FirmAgent, FirmData};
pub use government::{GovernmentAgent, PolicyProvider, RulePolicy, Transition};
pub use household::{HouseholdAgent, HouseholdData, HouseholdObservation, SocialClass};

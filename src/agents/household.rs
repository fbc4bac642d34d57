use std::fmt;

use krabmaga::engine::{agent::Agent, state::State};
use rand::rngs::StdRng;
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};

use crate::rewards;
use crate::state::{EconomicState, SimState};

// ─────────────────────────────────────────────────────────────────────────────
// Social classes
// ─────────────────────────────────────────────────────────────────────────────

/// Social class of a household, fixed at creation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SocialClass {
    Poor,
    Working,
    Middle,
    Elite,
}

impl SocialClass {
    pub const ALL: [SocialClass; 4] = [
        SocialClass::Poor,
        SocialClass::Working,
        SocialClass::Middle,
        SocialClass::Elite,
    ];

    /// Population weights used when drawing classes at episode start.
    pub const WEIGHTS: [f64; 4] = [0.35, 0.35, 0.2, 0.1];

    /// Mean and standard deviation of the class's initial-wealth prior.
    pub fn income_prior(self) -> (f64, f64) {
        match self {
            SocialClass::Poor => (50.0, 10.0),
            SocialClass::Working => (100.0, 20.0),
            SocialClass::Middle => (300.0, 50.0),
            SocialClass::Elite => (1_000.0, 200.0),
        }
    }

    /// Baseline inclination to protest; scales the unrest response.
    pub fn protest_propensity(self) -> f64 {
        match self {
            SocialClass::Poor => 0.5,
            SocialClass::Working => 0.3,
            SocialClass::Middle => 0.2,
            SocialClass::Elite => 0.05,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Household data
// ─────────────────────────────────────────────────────────────────────────────

/// Per-tick observation a household acts on.
#[derive(Clone, Copy, Debug)]
pub struct HouseholdObservation {
    pub inflation: f64,
    pub unemployment: f64,
    pub avg_unrest: f64,
    pub gdp_growth: f64,
    pub wealth: f64,
}

impl HouseholdObservation {
    pub fn from_state(econ: &EconomicState, wealth: f64) -> Self {
        HouseholdObservation {
            inflation: econ.inflation,
            unemployment: econ.unemployment,
            avg_unrest: econ.avg_unrest,
            gdp_growth: econ.gdp_growth,
            wealth,
        }
    }
}

/// All mutable state for a single household.
///
/// Wealth can transiently go negative under shocks; unrest always stays in
/// [0, 1].  Households are never removed within an episode.
#[derive(Clone, Debug)]
pub struct HouseholdData {
    pub id: usize,
    pub class: SocialClass,
    pub wealth: f64,
    pub consumption: f64,
    pub savings: f64,
    pub unrest: f64,
    pub employed: bool,
}

impl HouseholdData {
    pub fn new(id: usize, class: SocialClass, wealth: f64) -> Self {
        HouseholdData {
            id,
            class,
            wealth,
            consumption: 0.0,
            savings: 0.0,
            unrest: 0.0,
            employed: false,
        }
    }

    /// Draw a household with wealth from its class prior.
    pub fn sample(id: usize, class: SocialClass, rng: &mut StdRng) -> Self {
        let (mean, std) = class.income_prior();
        let wealth = Normal::new(mean, std).unwrap().sample(rng);
        HouseholdData::new(id, class, wealth)
    }

    /// Decide consumption, savings, and protest fractions for this tick.
    ///
    /// The rule-based policy consumes a class-dependent share of wealth,
    /// saves the rest, and protests in proportion to the class propensity
    /// scaled by ambient unrest.  Consumed wealth leaves the household for
    /// good: after acting, wealth equals savings until wages are earned back.
    pub fn act(&mut self, obs: &HouseholdObservation) -> [f64; 3] {
        let propensity = self.class.protest_propensity();
        let consumption_frac = (0.5 + 0.2 * (1.0 - propensity)).clamp(0.0, 1.0);
        let savings_frac = 1.0 - consumption_frac;
        let protest_frac = (propensity * obs.avg_unrest).clamp(0.0, 1.0);

        self.apply_action([consumption_frac, savings_frac, protest_frac])
    }

    /// Apply an action vector (rule-based or externally supplied).
    pub fn apply_action(&mut self, action: [f64; 3]) -> [f64; 3] {
        self.consumption = self.wealth * action[0];
        self.savings = self.wealth * action[1];
        self.unrest = action[2].clamp(0.0, 1.0);
        self.wealth = self.savings;
        action
    }

    /// Bounded reward for the household's situation this tick, given its
    /// local exposure to unrest in the contact network.
    pub fn compute_reward(&self, econ: &EconomicState, local_exposure: f64) -> f64 {
        rewards::household_reward(
            self.consumption,
            econ.inflation,
            econ.unemployment,
            local_exposure,
        )
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Schedule proxy
// ─────────────────────────────────────────────────────────────────────────────

/// Proxy agent for a single household; only holds the index into
/// `SimState::households`.
#[derive(Clone)]
pub struct HouseholdAgent {
    pub id: usize,
}

impl fmt::Display for HouseholdAgent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HouseholdAgent({})", self.id)
    }
}

impl Agent for HouseholdAgent {
    fn step(&mut self, state: &mut dyn State) {
        let state = state
            .as_any_mut()
            .downcast_mut::<SimState>()
            .expect("state should be SimState");

        let wealth = state.households[self.id].wealth;
        let obs = HouseholdObservation::from_state(&state.econ, wealth);
        state.households[self.id].act(&obs);
    }
}

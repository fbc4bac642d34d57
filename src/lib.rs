/*!
# `national_economy_abm` — agent-based national-economy stress simulator

A discrete-time simulation of a national economy under socio-political
stress.  Heterogeneous households and firms interact through labour, goods,
and credit markets; social unrest diffuses over a preferential-attachment
contact network; stochastic and manually injected shocks disturb the system;
and the orchestrator tracks macro aggregates each tick until the economy
either survives a fixed horizon or collapses.

The per-tick phases run on a [krABMaga](https://github.com/krABMaga/krABMaga)
schedule: shock application and policy levers ahead of the agents, then firm
planning, household actions, unrest diffusion, and labour clearing as
scheduled proxies, with goods/credit clearing, settlement, and macro
aggregation closing the tick.

## Quick start

```no_run
use national_economy_abm::{
    Environment, InitialConditions, PolicyProvider, RulePolicy, SimConfig,
};

let config = SimConfig::default();
let mut policy = RulePolicy::new(&config);
let mut env = Environment::new(config, InitialConditions::default(), 42);

loop {
    let observation = env.policy_observation();
    let action = policy.decide(&observation);
    let outcome = env.step(action);
    if outcome.terminated || outcome.truncated {
        break;
    }
}
for record in env.records() {
    println!("{} gdp={:.1} unrest={:.3}", record.tick, record.gdp, record.avg_unrest);
}
```

For continuous operation behind a dashboard, [`Simulator`] runs the same
loop on a background thread and publishes immutable [`MetricsSnapshot`]s
between ticks.
*/

pub mod agents;
pub mod config;
pub mod env;
pub mod markets;
pub mod metrics;
pub mod rewards;
pub mod seed;
pub mod shocks;
pub mod simulator;
pub mod social;
pub mod state;

#[cfg(feature = "python")]
mod py;

pub use agents::{
    Archetype, FirmData, GovernmentAgent, HouseholdData, PolicyProvider, RulePolicy, SocialClass,
    Transition,
};
pub use config::SimConfig;
pub use env::{Environment, StepOutcome};
pub use seed::InitialConditions;
pub use shocks::{Shock, ShockKind, ShockManager};
pub use simulator::{MetricsSnapshot, Simulator};
pub use social::{NetworkSnapshot, SocialGraph};
pub use state::{EconomicState, Regime, SimState, TickRecord};

use krabmaga::engine::schedule::Schedule;
use krabmaga::engine::state::State;

use crate::config::SimConfig;
use crate::seed::InitialConditions;
use crate::shocks::ShockKind;
use crate::social::NetworkSnapshot;
use crate::state::{EconomicState, Regime, SimState, TickRecord};

/// Scale used to squash GDP into a bounded policy-observation component.
const GDP_NORM_SCALE: f64 = 100_000.0;

/// Result of advancing the simulation by one tick.
#[derive(Clone, Copy, Debug)]
pub struct StepOutcome {
    pub observation: [f64; 10],
    pub reward: f64,
    /// The economy collapsed this tick (terminal).
    pub terminated: bool,
    /// The step horizon was reached (terminal, but not a collapse).
    pub truncated: bool,
}

/// The simulation environment: owns the state and the schedule and advances
/// them one tick at a time.
///
/// Each `step` sequences shocks → policy → firm planning → household
/// actions → unrest diffusion → labour/goods/credit clearing → settlement →
/// macro aggregation → reward → collapse check, then reports the new
/// observation.  Collapse and truncation are normal returns, never errors.
pub struct Environment {
    state: SimState,
    schedule: Schedule,
}

impl Environment {
    pub fn new(config: SimConfig, init: InitialConditions, seed: u64) -> Self {
        let mut state = SimState::new(config, init, seed);
        let mut schedule = Schedule::new();
        state.init(&mut schedule);
        Environment { state, schedule }
    }

    /// Start a new episode with fresh agent draws and return the first
    /// observation.
    pub fn reset(&mut self) -> [f64; 10] {
        self.state.reset();
        self.schedule = Schedule::new();
        self.state.init(&mut self.schedule);
        self.observation()
    }

    /// Advance one tick under the given policy action
    /// `[interest_rate, tax_rate, welfare_spending, capital_controls]`.
    ///
    /// Once the economy has collapsed the state is frozen: further calls
    /// return the terminal observation without applying any updates.
    pub fn step(&mut self, action: [f64; 4]) -> StepOutcome {
        if self.state.econ.regime == Regime::Collapsed {
            return StepOutcome {
                observation: self.observation(),
                reward: 0.0,
                terminated: true,
                truncated: false,
            };
        }

        self.state.pending_action = action;
        self.schedule.step(&mut self.state);

        let terminated = self.state.econ.regime == Regime::Collapsed;
        let truncated = !terminated && self.state.timestep >= self.state.config.max_steps;

        StepOutcome {
            observation: self.observation(),
            reward: self.state.last_reward,
            terminated,
            truncated,
        }
    }

    /// Full macro observation:
    /// `[gdp, inflation, unemployment, gini, avg_unrest, top1_share,
    ///   interest_rate, tax_rate, welfare_spending, capital_controls]`.
    pub fn observation(&self) -> [f64; 10] {
        let econ = &self.state.econ;
        [
            econ.gdp,
            econ.inflation,
            econ.unemployment,
            econ.gini_coeff,
            econ.avg_unrest,
            econ.top1_wealth_share,
            econ.interest_rate,
            econ.tax_rate,
            econ.welfare_spending,
            econ.capital_controls,
        ]
    }

    /// Observation handed to the policy controller:
    /// `[inflation, unemployment, avg_unrest, inequality, squashed gdp]`.
    pub fn policy_observation(&self) -> [f64; 5] {
        let econ = &self.state.econ;
        [
            econ.inflation,
            econ.unemployment,
            econ.avg_unrest,
            econ.gini_coeff,
            (econ.gdp / GDP_NORM_SCALE).tanh(),
        ]
    }

    /// Manual shock injection, bypassing the stochastic trigger.
    pub fn inject_shock(&mut self, kind: ShockKind, severity: f64) {
        let tick = self.state.timestep;
        self.state.shocks.add_shock(kind, severity, tick);
    }

    /// Node/edge-list view of the contact network with current unrest.
    pub fn network_snapshot(&self) -> NetworkSnapshot {
        let unrest: Vec<f64> = self.state.households.iter().map(|h| h.unrest).collect();
        self.state.graph.snapshot(&unrest)
    }

    pub fn econ(&self) -> &EconomicState {
        &self.state.econ
    }

    pub fn households(&self) -> &[crate::agents::HouseholdData] {
        &self.state.households
    }

    pub fn firms(&self) -> &[crate::agents::FirmData] {
        &self.state.firms
    }

    pub fn records(&self) -> &[TickRecord] {
        &self.state.records
    }

    pub fn timestep(&self) -> u64 {
        self.state.timestep
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::{PolicyProvider, RulePolicy};

    fn small_config() -> SimConfig {
        let mut config = SimConfig {
            num_households: 30,
            num_firms: 8,
            max_steps: 25,
            ..SimConfig::default()
        };
        config.shock_probs.clear();
        config
    }

    fn run_episode(env: &mut Environment, policy: &mut RulePolicy, max: usize) -> Vec<StepOutcome> {
        let mut outcomes = Vec::new();
        for _ in 0..max {
            let obs = env.policy_observation();
            let action = policy.decide(&obs);
            let outcome = env.step(action);
            let done = outcome.terminated || outcome.truncated;
            outcomes.push(outcome);
            if done {
                break;
            }
        }
        outcomes
    }

    #[test]
    fn episode_runs_to_horizon_under_rule_policy() {
        let mut env = Environment::new(small_config(), InitialConditions::default(), 42);
        let mut policy = RulePolicy::new(&small_config());
        let outcomes = run_episode(&mut env, &mut policy, 100);

        let last = outcomes.last().unwrap();
        assert!(last.terminated || last.truncated);
        if last.truncated {
            assert_eq!(outcomes.len(), 25);
        }
        assert_eq!(env.records().len(), outcomes.len());

        for outcome in &outcomes {
            assert!((-5.0..=5.0).contains(&outcome.reward));
            let [_, inflation, unemployment, gini, unrest, top1, ..] = outcome.observation;
            for v in [inflation, unemployment, gini, unrest, top1] {
                assert!((0.0..=1.0).contains(&v), "macro field {v} out of bounds");
            }
        }
    }

    #[test]
    fn same_seed_same_actions_same_trajectory() {
        let actions = [[0.05, 0.2, 0.1, 0.0]; 10];
        let mut a = Environment::new(small_config(), InitialConditions::default(), 7);
        let mut b = Environment::new(small_config(), InitialConditions::default(), 7);
        for action in actions {
            let oa = a.step(action);
            let ob = b.step(action);
            assert_eq!(oa.observation, ob.observation);
            assert_eq!(oa.reward, ob.reward);
        }
    }

    #[test]
    fn catastrophic_crash_collapses_the_economy() {
        let mut env = Environment::new(small_config(), InitialConditions::default(), 11);
        env.inject_shock(ShockKind::FinancialCrash, 1.0);

        let mut terminated = false;
        for _ in 0..10 {
            let outcome = env.step([0.05, 0.2, 0.1, 0.0]);
            if outcome.terminated {
                terminated = true;
                break;
            }
        }
        assert!(terminated, "a severity-1 crash should collapse the economy");
        assert_eq!(env.econ().regime, Regime::Collapsed);
    }

    #[test]
    fn collapsed_environment_is_frozen() {
        let mut env = Environment::new(small_config(), InitialConditions::default(), 13);
        env.state.econ.regime = Regime::Collapsed;
        let ticks = env.timestep();
        let records = env.records().len();

        let outcome = env.step([0.1, 0.1, 0.1, 0.1]);
        assert!(outcome.terminated);
        assert!(!outcome.truncated);
        assert_eq!(outcome.reward, 0.0);
        assert_eq!(env.timestep(), ticks);
        assert_eq!(env.records().len(), records);
    }

    #[test]
    fn revolution_thresholds_must_both_bind() {
        let mut env = Environment::new(small_config(), InitialConditions::default(), 17);

        // Boundary values do not collapse: unrest and unemployment must
        // both strictly exceed their thresholds.
        env.state.econ.avg_unrest = 0.75;
        env.state.econ.unemployment = 0.15;
        env.state.check_collapse();
        assert_eq!(env.econ().regime, Regime::Stable);

        env.state.econ.unemployment = 0.2;
        env.state.check_collapse();
        assert_eq!(env.econ().regime, Regime::Collapsed);
    }

    #[test]
    fn reset_starts_a_new_episode() {
        let mut env = Environment::new(small_config(), InitialConditions::default(), 19);
        for _ in 0..5 {
            env.step([0.05, 0.2, 0.1, 0.0]);
        }
        assert!(env.timestep() > 0);

        let obs = env.reset();
        assert_eq!(env.timestep(), 0);
        assert_eq!(env.records().len(), 0);
        assert_eq!(obs[0], 10_000.0);
        assert_eq!(env.econ().regime, Regime::Stable);
    }

    #[test]
    fn policy_observation_squashes_gdp() {
        let env = Environment::new(small_config(), InitialConditions::default(), 23);
        let obs = env.policy_observation();
        assert!((-1.0..=1.0).contains(&obs[4]));
        assert_eq!(obs[0], env.econ().inflation);
        assert_eq!(obs[3], env.econ().gini_coeff);
    }

    #[test]
    fn network_snapshot_matches_population() {
        let env = Environment::new(small_config(), InitialConditions::default(), 29);
        let snap = env.network_snapshot();
        assert_eq!(snap.nodes.len(), 30);
        assert!(!snap.links.is_empty());
    }
}

use std::fmt;

use krabmaga::engine::{agent::Agent, state::State};
use rand::seq::SliceRandom;

use crate::state::SimState;

/// Outcome of labour market clearing for one tick.
#[derive(Clone, Copy, Debug, Default)]
pub struct LaborOutcome {
    pub wage: f64,
    pub labor_supply: usize,
    pub labor_demand: usize,
    pub employed: usize,
    pub unemployment_rate: f64,
}

/// Clear the labour market in-place on the simulation state.
///
/// Labour supply is one unit per household; demand is the sum of firm
/// desired labour.  The wage moves from its base by a tanh-bounded response
/// to relative imbalance, so extreme gluts or shortages cannot produce
/// unbounded swings.  Matched households are chosen by a fresh random
/// permutation each tick and paid the clearing wage; firms receive their
/// demand-proportional share of the matched workforce.
pub fn clear_labor_market(state: &mut SimState) {
    let labor_supply = state.households.len();
    let labor_demand: usize = state.firms.iter().map(|f| f.desired_labor).sum();

    let base_wage = state.config.base_wage * state.econ.wage_index;
    let excess = labor_demand as f64 - labor_supply as f64;
    let imbalance = excess / labor_supply.max(1) as f64;
    let wage = base_wage * (1.0 + state.config.wage_adjustment * imbalance.tanh());

    let employed = labor_supply.min(labor_demand);
    let unemployment_rate = 1.0 - employed as f64 / labor_supply.max(1) as f64;

    // Random assignment over a permutation of indices; the household arena
    // itself stays index-stable.
    let mut order: Vec<usize> = (0..labor_supply).collect();
    order.shuffle(&mut state.rng);

    for household in state.households.iter_mut() {
        household.employed = false;
    }
    for &idx in &order[..employed] {
        let household = &mut state.households[idx];
        household.employed = true;
        household.wealth += wage;
    }

    let fill_ratio = employed as f64 / labor_demand.max(1) as f64;
    for firm in state.firms.iter_mut() {
        firm.employees = (firm.desired_labor as f64 * fill_ratio) as usize;
        firm.wage_bill = firm.employees as f64 * wage;
    }

    state.labor_last = LaborOutcome {
        wage,
        labor_supply,
        labor_demand,
        employed,
        unemployment_rate,
    };
}

// ─────────────────────────────────────────────────────────────────────────────
// Schedule proxy
// ─────────────────────────────────────────────────────────────────────────────

/// Proxy agent that clears the labour market within the schedule, after the
/// unrest diffusion pass and before firms produce.
#[derive(Clone)]
pub struct LaborMarketAgent;

impl fmt::Display for LaborMarketAgent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LaborMarketAgent")
    }
}

impl Agent for LaborMarketAgent {
    fn step(&mut self, state: &mut dyn State) {
        let state = state
            .as_any_mut()
            .downcast_mut::<SimState>()
            .expect("state should be SimState");
        clear_labor_market(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SimConfig;
    use crate::seed::InitialConditions;
    use approx::assert_abs_diff_eq;

    fn small_state(num_households: usize, num_firms: usize) -> SimState {
        let config = SimConfig {
            num_households,
            num_firms,
            ..SimConfig::default()
        };
        SimState::new(config, InitialConditions::default(), 7)
    }

    #[test]
    fn excess_demand_raises_wage_boundedly() {
        let mut state = small_state(10, 1);
        state.firms[0].desired_labor = 15;
        clear_labor_market(&mut state);

        let outcome = state.labor_last;
        assert_eq!(outcome.employed, 10);
        assert_abs_diff_eq!(outcome.unemployment_rate, 0.0, epsilon = 1e-12);
        let expected_wage = 50.0 * (1.0 + 0.1 * (5.0_f64 / 10.0).tanh());
        assert_abs_diff_eq!(outcome.wage, expected_wage, epsilon = 1e-9);
    }

    #[test]
    fn short_demand_leaves_unemployment() {
        let mut state = small_state(10, 1);
        state.firms[0].desired_labor = 4;
        clear_labor_market(&mut state);

        let outcome = state.labor_last;
        assert_eq!(outcome.employed, 4);
        assert_abs_diff_eq!(outcome.unemployment_rate, 0.6, epsilon = 1e-12);
        assert_eq!(
            state.households.iter().filter(|h| h.employed).count(),
            4
        );
        // Wage falls below base under slack, but boundedly.
        assert!(outcome.wage < 50.0);
        assert!(outcome.wage > 50.0 * 0.9);
    }

    #[test]
    fn employed_households_receive_the_wage() {
        let mut state = small_state(6, 1);
        state.firms[0].desired_labor = 3;
        let before: Vec<f64> = state.households.iter().map(|h| h.wealth).collect();
        clear_labor_market(&mut state);

        let wage = state.labor_last.wage;
        for (household, old) in state.households.iter().zip(before) {
            if household.employed {
                assert_abs_diff_eq!(household.wealth, old + wage, epsilon = 1e-9);
            } else {
                assert_abs_diff_eq!(household.wealth, old, epsilon = 1e-9);
            }
        }
    }

    #[test]
    fn firms_share_the_matched_workforce() {
        let mut state = small_state(10, 2);
        state.firms[0].desired_labor = 10;
        state.firms[1].desired_labor = 10;
        clear_labor_market(&mut state);

        // 10 workers over demand of 20: each firm realizes half its ask.
        assert_eq!(state.firms[0].employees, 5);
        assert_eq!(state.firms[1].employees, 5);
        let wage = state.labor_last.wage;
        assert_abs_diff_eq!(state.firms[0].wage_bill, 5.0 * wage, epsilon = 1e-9);
    }

    #[test]
    fn zero_demand_clears_without_dividing_by_zero() {
        let mut state = small_state(5, 1);
        state.firms[0].desired_labor = 0;
        clear_labor_market(&mut state);
        assert_eq!(state.labor_last.employed, 0);
        assert_abs_diff_eq!(state.labor_last.unemployment_rate, 1.0, epsilon = 1e-12);
        assert_eq!(state.firms[0].employees, 0);
    }
}

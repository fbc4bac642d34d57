use crate::state::SimState;

/// Outcome of credit market clearing for one tick.
#[derive(Clone, Copy, Debug, Default)]
pub struct CreditOutcome {
    pub total_granted: f64,
    pub borrowers: usize,
    pub interest_rate: f64,
}

/// Clear the credit market in-place on the simulation state.
///
/// Only firms with negative capital seek credit, sized to cover the
/// deficit.  Grants are capped by a leverage multiple of the post-credit
/// capital position, and the repayment obligation (principal scaled by one
/// plus the policy rate) accrues to the firm's debt balance.  Debt is
/// tracked but never force-collected.
pub fn clear_credit_market(state: &mut SimState) {
    let interest_rate = state.econ.interest_rate;
    let max_leverage = state.config.max_leverage;

    let mut total_granted = 0.0;
    let mut borrowers = 0usize;

    for firm in state.firms.iter_mut() {
        if firm.capital >= 0.0 {
            continue;
        }
        let requested = -firm.capital;
        let cap = max_leverage * (firm.capital + requested).max(1.0);
        let granted = requested.min(cap);

        firm.capital += granted;
        firm.debt += granted * (1.0 + interest_rate);

        total_granted += granted;
        borrowers += 1;
    }

    state.credit_last = CreditOutcome {
        total_granted,
        borrowers,
        interest_rate,
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SimConfig;
    use crate::seed::InitialConditions;
    use approx::assert_abs_diff_eq;

    fn small_state(num_firms: usize) -> SimState {
        let config = SimConfig {
            num_households: 1,
            num_firms,
            ..SimConfig::default()
        };
        SimState::new(config, InitialConditions::default(), 13)
    }

    #[test]
    fn solvent_firms_do_not_borrow() {
        let mut state = small_state(1);
        state.firms[0].capital = 500.0;
        clear_credit_market(&mut state);
        assert_eq!(state.credit_last.borrowers, 0);
        assert_eq!(state.firms[0].debt, 0.0);
        assert_abs_diff_eq!(state.firms[0].capital, 500.0, epsilon = 1e-12);
    }

    #[test]
    fn deficit_requests_are_leverage_capped() {
        let mut state = small_state(1);
        state.econ.interest_rate = 0.05;
        state.firms[0].capital = -100.0;
        clear_credit_market(&mut state);

        // Covering the full deficit would leave zero post-credit capital, so
        // the leverage cap binds at max_leverage x the unit floor.
        let granted = 3.0;
        assert_abs_diff_eq!(state.firms[0].capital, -100.0 + granted, epsilon = 1e-9);
        assert_abs_diff_eq!(state.firms[0].debt, granted * 1.05, epsilon = 1e-9);
        assert_eq!(state.credit_last.borrowers, 1);
        assert_abs_diff_eq!(state.credit_last.total_granted, granted, epsilon = 1e-9);
    }

    #[test]
    fn debt_accrues_without_collection() {
        let mut state = small_state(1);
        state.econ.interest_rate = 0.1;
        state.firms[0].capital = -50.0;

        clear_credit_market(&mut state);
        let first_debt = state.firms[0].debt;
        assert!(first_debt > 0.0);

        // Further ticks keep accruing; nothing ever reduces the balance.
        clear_credit_market(&mut state);
        clear_credit_market(&mut state);
        assert!(state.firms[0].debt > first_debt);
    }
}

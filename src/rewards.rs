//! Bounded reward functions shared by the agents.
//!
//! Every function here is pure and total: inputs outside the nominal domain
//! are clamped before use and results are clamped to [-5, 5], so callers can
//! feed raw simulation values without pre-validation.

/// Weight on inflation in the household reward.
pub const HOUSEHOLD_ALPHA: f64 = 1.0;
/// Weight on unemployment risk in the household reward.
pub const HOUSEHOLD_BETA: f64 = 1.2;
/// Weight on squared unrest exposure in the household reward.
pub const HOUSEHOLD_GAMMA: f64 = 1.5;

/// Weight on inflation in the government reward.
pub const GOVERNMENT_ALPHA: f64 = 0.8;
/// Weight on unemployment in the government reward.
pub const GOVERNMENT_BETA: f64 = 1.2;
/// Weight on squared unrest in the government reward.
pub const GOVERNMENT_GAMMA: f64 = 2.0;
/// Weight on inequality in the government reward.
pub const GOVERNMENT_DELTA: f64 = 1.0;

const REWARD_MIN: f64 = -5.0;
const REWARD_MAX: f64 = 5.0;

/// Log utility of consumption with a numerical floor.
pub fn consumption_utility(consumption: f64) -> f64 {
    consumption.max(1e-6).ln()
}

/// Household objective: survival utility under inflation, job insecurity and
/// social instability.
///
/// `ln(consumption) - α·inflation - β·unemployment_risk - γ·exposure²`,
/// clamped to [-5, 5].  Unrest escalates nonlinearly.
pub fn household_reward(
    consumption: f64,
    inflation: f64,
    unemployment_risk: f64,
    unrest_exposure: f64,
) -> f64 {
    let inflation = inflation.clamp(0.0, 1.0);
    let unemployment_risk = unemployment_risk.clamp(0.0, 1.0);
    let unrest_exposure = unrest_exposure.clamp(0.0, 1.0);

    let utility = consumption_utility(consumption);
    let penalty = HOUSEHOLD_ALPHA * inflation
        + HOUSEHOLD_BETA * unemployment_risk
        + HOUSEHOLD_GAMMA * unrest_exposure.powi(2);

    (utility - penalty).clamp(REWARD_MIN, REWARD_MAX)
}

/// Government objective: balance growth against systemic stability.
///
/// `growth - α·inflation - β·unemployment - γ·unrest² - δ·inequality`, with
/// growth clamped to [-0.25, 0.25] and the rest to [0, 1].  A flat -2.0
/// surcharge applies when unrest > 0.85 and inequality > 0.6 at the same
/// time, before the final clamp to [-5, 5].
pub fn government_reward(
    gdp_growth: f64,
    inflation: f64,
    unemployment: f64,
    unrest: f64,
    inequality: f64,
) -> f64 {
    let gdp_growth = gdp_growth.clamp(-0.25, 0.25);
    let inflation = inflation.clamp(0.0, 1.0);
    let unemployment = unemployment.clamp(0.0, 1.0);
    let unrest = unrest.clamp(0.0, 1.0);
    let inequality = inequality.clamp(0.0, 1.0);

    let mut reward = gdp_growth
        - GOVERNMENT_ALPHA * inflation
        - GOVERNMENT_BETA * unemployment
        - GOVERNMENT_GAMMA * unrest.powi(2)
        - GOVERNMENT_DELTA * inequality;

    if unrest > 0.85 && inequality > 0.6 {
        reward -= 2.0;
    }

    reward.clamp(REWARD_MIN, REWARD_MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn household_reward_is_bounded_for_wild_inputs() {
        let cases = [
            (0.0, 0.0, 0.0, 0.0),
            (-100.0, 10.0, -3.0, 42.0),
            (1e18, -1.0, 2.0, -0.5),
            (f64::MIN_POSITIVE, 1.0, 1.0, 1.0),
        ];
        for (c, i, u, e) in cases {
            let r = household_reward(c, i, u, e);
            assert!((-5.0..=5.0).contains(&r), "reward {r} out of bounds");
            assert!(r.is_finite());
        }
    }

    #[test]
    fn household_reward_matches_formula_in_nominal_range() {
        let r = household_reward(100.0, 0.1, 0.2, 0.5);
        let expected = 100.0_f64.ln() - 1.0 * 0.1 - 1.2 * 0.2 - 1.5 * 0.25;
        assert_abs_diff_eq!(r, expected, epsilon = 1e-12);
    }

    #[test]
    fn household_reward_floors_consumption() {
        // Zero or negative consumption hits the 1e-6 floor and the clamp.
        assert_abs_diff_eq!(household_reward(0.0, 0.0, 0.0, 0.0), -5.0);
        assert_abs_diff_eq!(household_reward(-10.0, 0.0, 0.0, 0.0), -5.0);
    }

    #[test]
    fn government_reward_is_bounded_for_wild_inputs() {
        let cases = [
            (10.0, 5.0, 5.0, 5.0, 5.0),
            (-10.0, -5.0, -5.0, -5.0, -5.0),
            (0.0, 1.0, 1.0, 1.0, 1.0),
        ];
        for (g, i, u, n, q) in cases {
            let r = government_reward(g, i, u, n, q);
            assert!((-5.0..=5.0).contains(&r), "reward {r} out of bounds");
            assert!(r.is_finite());
        }
    }

    #[test]
    fn government_reward_growth_is_clamped() {
        // Growth of 3.0 counts as 0.25.
        let r = government_reward(3.0, 0.0, 0.0, 0.0, 0.0);
        assert_abs_diff_eq!(r, 0.25, epsilon = 1e-12);
    }

    #[test]
    fn government_reward_collapse_proximity_surcharge() {
        let base = government_reward(0.0, 0.0, 0.0, 0.86, 0.61);
        let expected = -2.0 * 0.86_f64.powi(2) - 1.0 * 0.61 - 2.0;
        assert_abs_diff_eq!(base, expected, epsilon = 1e-12);

        // Either condition alone does not trigger the surcharge.
        let only_unrest = government_reward(0.0, 0.0, 0.0, 0.86, 0.6);
        assert_abs_diff_eq!(
            only_unrest,
            -2.0 * 0.86_f64.powi(2) - 1.0 * 0.6,
            epsilon = 1e-12
        );
    }

    #[test]
    fn rewards_are_pure() {
        for _ in 0..3 {
            assert_eq!(
                household_reward(12.0, 0.3, 0.1, 0.9),
                household_reward(12.0, 0.3, 0.1, 0.9)
            );
            assert_eq!(
                government_reward(0.1, 0.3, 0.1, 0.9, 0.2),
                government_reward(0.1, 0.3, 0.1, 0.9, 0.2)
            );
        }
    }
}

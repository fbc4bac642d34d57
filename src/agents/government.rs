use crate::agents::HouseholdData;
use crate::config::SimConfig;
use crate::rewards;
use crate::state::EconomicState;

// ─────────────────────────────────────────────────────────────────────────────
// Government agent
// ─────────────────────────────────────────────────────────────────────────────

/// Government: sets the four macro levers and scores systemic stability.
///
/// Stateless apart from the previous-GDP memory used for growth in the
/// reward.  The lever-setting rule lives in [`GovernmentAgent::act`]; a
/// learned controller can replace it behind [`PolicyProvider`].
#[derive(Clone, Debug)]
pub struct GovernmentAgent {
    pub min_interest: f64,
    pub max_interest: f64,
    pub min_tax: f64,
    pub max_tax: f64,
    pub min_welfare: f64,
    pub max_welfare: f64,
    pub min_controls: f64,
    pub max_controls: f64,

    pub prev_gdp: Option<f64>,
}

impl GovernmentAgent {
    pub fn new(config: &SimConfig) -> Self {
        GovernmentAgent {
            min_interest: config.min_interest,
            max_interest: config.max_interest,
            min_tax: config.min_tax,
            max_tax: config.max_tax,
            min_welfare: config.min_welfare,
            max_welfare: config.max_welfare,
            min_controls: config.min_controls,
            max_controls: config.max_controls,
            prev_gdp: None,
        }
    }

    /// Rule-based lever setting from
    /// `[inflation, unemployment, unrest, inequality, gdp]`.
    ///
    /// Interest fights inflation; taxes redistribute only when inequality
    /// and unrest are elevated together; welfare pacifies unrest linearly;
    /// capital controls respond convexly, staying minimal until unrest runs
    /// high.  Each lever is clipped to its configured range.
    pub fn act(&self, observation: &[f64; 5]) -> [f64; 4] {
        let [inflation, _unemployment, unrest, inequality, _gdp] = *observation;

        let interest_rate = (0.02 + 0.15 * inflation).clamp(self.min_interest, self.max_interest);
        let tax_rate = (0.15 + 0.4 * inequality * unrest).clamp(self.min_tax, self.max_tax);
        let welfare_spending = (0.1 + 0.5 * unrest).clamp(self.min_welfare, self.max_welfare);
        let capital_controls = (unrest * unrest).clamp(self.min_controls, self.max_controls);

        [interest_rate, tax_rate, welfare_spending, capital_controls]
    }

    /// Bounded stability score for the current macro state, updating the
    /// GDP memory as a side effect.
    pub fn compute_reward(&mut self, econ: &EconomicState, households: &[HouseholdData]) -> f64 {
        let gdp_growth = match self.prev_gdp {
            Some(prev) => (econ.gdp - prev) / prev.max(1e-6),
            None => 0.0,
        };
        self.prev_gdp = Some(econ.gdp);

        let unrest = aggregate_unrest(households);

        rewards::government_reward(
            gdp_growth,
            econ.inflation,
            econ.unemployment,
            unrest,
            econ.gini_coeff,
        )
    }
}

/// Population-weighted average unrest (households carry unit weight).
fn aggregate_unrest(households: &[HouseholdData]) -> f64 {
    if households.is_empty() {
        return 0.0;
    }
    let total: f64 = households.iter().map(|h| h.unrest).sum();
    (total / households.len() as f64).clamp(0.0, 1.0)
}

// ─────────────────────────────────────────────────────────────────────────────
// Policy-controller boundary
// ─────────────────────────────────────────────────────────────────────────────

/// One experience tuple handed back to the controller after each tick.
#[derive(Clone, Copy, Debug)]
pub struct Transition {
    pub observation: [f64; 5],
    pub action: [f64; 4],
    pub reward: f64,
    pub next_observation: [f64; 5],
    pub terminal: bool,
}

/// Decision provider for the government's levers.
///
/// The runner only depends on this contract; whether the provider is the
/// rule-based government or a learned controller is invisible to it.
/// `observe` exists for providers that train from experience; the default
/// discards the transition.
pub trait PolicyProvider: Send {
    fn decide(&mut self, observation: &[f64; 5]) -> [f64; 4];

    fn observe(&mut self, _transition: Transition) {}
}

/// The rule-based government as a decision provider.
pub struct RulePolicy {
    government: GovernmentAgent,
}

impl RulePolicy {
    pub fn new(config: &SimConfig) -> Self {
        RulePolicy {
            government: GovernmentAgent::new(config),
        }
    }
}

impl PolicyProvider for RulePolicy {
    fn decide(&mut self, observation: &[f64; 5]) -> [f64; 4] {
        self.government.act(observation)
    }
}

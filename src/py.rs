//! Python bindings for the simulation core.
//!
//! Exposes a single [`run_simulation`] entry point plus a read-only record
//! class, so a Python-side dashboard or policy trainer can drive full
//! episodes without paying any per-tick crossing cost.

use pyo3::prelude::*;

use crate::agents::{PolicyProvider, RulePolicy};
use crate::config::SimConfig;
use crate::env::Environment;
use crate::seed::InitialConditions;
use crate::state::Regime;

/// Aggregate statistics for a single simulation tick.
///
/// All fields are read-only from Python.
#[pyclass(get_all)]
#[derive(Clone, Debug)]
pub struct PyTickRecord {
    pub tick: u64,
    pub gdp: f64,
    pub gdp_growth: f64,
    pub inflation: f64,
    pub unemployment: f64,
    pub gini: f64,
    pub avg_unrest: f64,
    pub top1_wealth_share: f64,
    pub interest_rate: f64,
    pub tax_rate: f64,
    pub welfare_spending: f64,
    pub capital_controls: f64,
    pub government_reward: f64,
    pub bankruptcies: usize,
}

#[pymethods]
impl PyTickRecord {
    fn __repr__(&self) -> String {
        format!(
            "PyTickRecord(tick={}, gdp={:.2}, inflation={:.4}, unemployment={:.4}, avg_unrest={:.4})",
            self.tick, self.gdp, self.inflation, self.unemployment, self.avg_unrest
        )
    }

    /// Convert to a plain Python dict for easy interop with pandas / polars.
    fn to_dict(&self) -> std::collections::HashMap<String, f64> {
        let mut m = std::collections::HashMap::new();
        m.insert("tick".to_string(), self.tick as f64);
        m.insert("gdp".to_string(), self.gdp);
        m.insert("gdp_growth".to_string(), self.gdp_growth);
        m.insert("inflation".to_string(), self.inflation);
        m.insert("unemployment".to_string(), self.unemployment);
        m.insert("gini".to_string(), self.gini);
        m.insert("avg_unrest".to_string(), self.avg_unrest);
        m.insert("top1_wealth_share".to_string(), self.top1_wealth_share);
        m.insert("interest_rate".to_string(), self.interest_rate);
        m.insert("tax_rate".to_string(), self.tax_rate);
        m.insert("welfare_spending".to_string(), self.welfare_spending);
        m.insert("capital_controls".to_string(), self.capital_controls);
        m.insert("government_reward".to_string(), self.government_reward);
        m.insert("bankruptcies".to_string(), self.bankruptcies as f64);
        m
    }
}

/// Run a full episode under the rule-based government and return per-tick
/// aggregate statistics.
///
/// Args:
///     num_households: Number of household agents to create.
///     num_firms: Number of firm agents to create.
///     max_steps: Step horizon for the episode.
///     seed: Random seed for reproducibility.
///
/// Returns:
///     A tuple `(records, collapsed)`: one :class:`PyTickRecord` per tick,
///     and whether the episode ended in collapse rather than truncation.
#[pyfunction]
#[pyo3(signature = (num_households=200, num_firms=50, max_steps=500, seed=42))]
fn run_simulation(
    num_households: usize,
    num_firms: usize,
    max_steps: u64,
    seed: u64,
) -> PyResult<(Vec<PyTickRecord>, bool)> {
    let config = SimConfig {
        num_households,
        num_firms,
        max_steps,
        ..SimConfig::default()
    };
    let mut policy = RulePolicy::new(&config);
    let mut env = Environment::new(config, InitialConditions::default(), seed);

    loop {
        let observation = env.policy_observation();
        let action = policy.decide(&observation);
        let outcome = env.step(action);
        if outcome.terminated || outcome.truncated {
            break;
        }
    }

    let collapsed = env.econ().regime == Regime::Collapsed;
    let records = env
        .records()
        .iter()
        .map(|r| PyTickRecord {
            tick: r.tick,
            gdp: r.gdp,
            gdp_growth: r.gdp_growth,
            inflation: r.inflation,
            unemployment: r.unemployment,
            gini: r.gini,
            avg_unrest: r.avg_unrest,
            top1_wealth_share: r.top1_wealth_share,
            interest_rate: r.interest_rate,
            tax_rate: r.tax_rate,
            welfare_spending: r.welfare_spending,
            capital_controls: r.capital_controls,
            government_reward: r.government_reward,
            bankruptcies: r.bankruptcies,
        })
        .collect();

    Ok((records, collapsed))
}

/// Rust-backed simulation core for the national-economy stress model.
#[pymodule]
fn national_economy_abm(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<PyTickRecord>()?;
    m.add_function(wrap_pyfunction!(run_simulation, m)?)?;
    Ok(())
}

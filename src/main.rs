//! Run one episode of the national-economy stress simulation from the
//! command line and dump the per-tick records to CSV.
//!
//! Usage: `national-economy-abm [config.toml] [seed.json]`
//! Both files are optional; anything missing or unreadable degrades to the
//! built-in defaults.

use std::path::PathBuf;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use national_economy_abm::{
    Environment, InitialConditions, PolicyProvider, Regime, RulePolicy, SimConfig,
};

const RECORDS_PATH: &str = "tick_records.csv";

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let mut args = std::env::args().skip(1);
    let config_path = args.next().map(PathBuf::from);
    let seed_path = args.next().map(PathBuf::from);

    let config = SimConfig::load_or_default(config_path.as_deref());
    let init = InitialConditions::load_or_baseline(seed_path.as_deref());
    let seed = 42;

    println!("=== National-economy stress simulation ===");
    println!("Households: {}", config.num_households);
    println!("Firms: {}", config.num_firms);
    println!("Horizon: {} ticks", config.max_steps);
    println!("Initial GDP: {:.0}", init.initial_gdp);
    println!();

    let mut policy = RulePolicy::new(&config);
    let mut env = Environment::new(config, init, seed);

    loop {
        let observation = env.policy_observation();
        let action = policy.decide(&observation);
        let outcome = env.step(action);
        if outcome.terminated || outcome.truncated {
            break;
        }
    }

    let mut writer =
        csv::Writer::from_path(RECORDS_PATH).context("failed to create records file")?;
    for record in env.records() {
        writer.serialize(record)?;
    }
    writer.flush()?;

    let econ = env.econ();
    println!("Finished after {} ticks", env.timestep());
    println!(
        "Outcome: {}",
        match econ.regime {
            Regime::Stable => "survived to the horizon",
            Regime::Collapsed => "collapsed",
        }
    );
    println!("GDP: {:.1}", econ.gdp);
    println!("Inflation: {:.3}", econ.inflation);
    println!("Unemployment: {:.3}", econ.unemployment);
    println!("Gini: {:.3}", econ.gini_coeff);
    println!("Average unrest: {:.3}", econ.avg_unrest);
    let bankruptcies = env.firms().iter().filter(|f| !f.alive).count();
    println!("Bankruptcies: {}", bankruptcies);
    println!("Records written to {RECORDS_PATH}");

    Ok(())
}

use std::collections::BTreeMap;

use rand::rngs::StdRng;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::agents::{FirmData, HouseholdData};
use crate::config::SimConfig;
use crate::state::EconomicState;

/// Severity used for stochastically triggered shocks.
const RANDOM_TRIGGER_SEVERITY: f64 = 0.5;

/// Exogenous disturbance categories.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum ShockKind {
    Pandemic,
    FinancialCrash,
    PoliticalCoup,
    SupplyChainCollapse,
    CyberAttack,
    ClimateCatastrophe,
    /// Long-lived marker with no per-tick effect of its own.
    Permanent,
}

impl ShockKind {
    /// Ticks a newly triggered shock of this kind stays active.
    pub fn default_duration(self) -> u32 {
        match self {
            ShockKind::Permanent => 1_000,
            _ => 10,
        }
    }
}

/// A time-bounded exogenous disturbance.
///
/// Effects are applied every tick the shock is active, so severity compounds
/// over the shock's duration.
#[derive(Clone, Copy, Debug)]
pub struct Shock {
    pub kind: ShockKind,
    pub severity: f64,
    pub remaining: u32,
    pub start_tick: u64,
}

/// Owns the set of active shocks: stochastic triggering, per-kind effects,
/// expiry, and manual injection.
#[derive(Clone, Debug)]
pub struct ShockManager {
    probs: BTreeMap<ShockKind, f64>,
    active: Vec<Shock>,
}

impl ShockManager {
    pub fn new(config: &SimConfig) -> Self {
        ShockManager {
            probs: config.shock_probs.clone(),
            active: Vec::new(),
        }
    }

    pub fn active(&self) -> &[Shock] {
        &self.active
    }

    /// Inject a shock directly, bypassing the probability draw.
    pub fn add_shock(&mut self, kind: ShockKind, severity: f64, tick: u64) {
        let severity = severity.clamp(0.0, 1.0);
        info!(?kind, severity, tick, "shock injected");
        self.active.push(Shock {
            kind,
            severity,
            remaining: kind.default_duration(),
            start_tick: tick,
        });
    }

    /// One tick of shock processing: independent trigger draws per
    /// configured kind, application of every active shock's effect, then
    /// decay and expiry.
    pub fn step(
        &mut self,
        econ: &mut EconomicState,
        households: &mut [HouseholdData],
        firms: &mut [FirmData],
        rng: &mut StdRng,
        tick: u64,
    ) {
        let triggered: Vec<ShockKind> = self
            .probs
            .iter()
            .filter(|&(_, &prob)| rng.gen::<f64>() < prob)
            .map(|(&kind, _)| kind)
            .collect();
        for kind in triggered {
            self.add_shock(kind, RANDOM_TRIGGER_SEVERITY, tick);
        }

        for shock in &mut self.active {
            apply_shock(shock, econ, households, firms);
            shock.remaining -= 1;
            if shock.remaining == 0 {
                debug!(kind = ?shock.kind, start = shock.start_tick, "shock expired");
            }
        }
        self.active.retain(|s| s.remaining > 0);
    }
}

/// Apply one tick of a single shock's effect to the state and agents.
///
/// Bounded macro fields stay clamped to [0, 1]; wealth and capital may go
/// negative, which is how crashes bankrupt firms.
fn apply_shock(
    shock: &Shock,
    econ: &mut EconomicState,
    households: &mut [HouseholdData],
    firms: &mut [FirmData],
) {
    let s = shock.severity;
    match shock.kind {
        ShockKind::Pandemic => {
            econ.bump_unemployment(5.0 * s);
            for h in households.iter_mut() {
                h.consumption *= 1.0 - 2.0 * s;
            }
        }
        ShockKind::FinancialCrash => {
            for f in firms.iter_mut() {
                f.capital *= 1.0 - 8.0 * s;
            }
            for h in households.iter_mut() {
                h.wealth *= 1.0 - 7.0 * s;
            }
            econ.bump_unemployment(40.0 * s);
        }
        ShockKind::PoliticalCoup => {
            for h in households.iter_mut() {
                h.unrest = (h.unrest + 20.0 * s).clamp(0.0, 1.0);
            }
        }
        ShockKind::SupplyChainCollapse => {
            econ.bump_inflation(50.0 * s);
            for f in firms.iter_mut() {
                f.productivity *= 1.0 - 6.0 * s;
            }
        }
        ShockKind::CyberAttack => {
            for f in firms.iter_mut() {
                f.capital *= 1.0 - 0.1 * s;
            }
            for h in households.iter_mut() {
                h.unrest = (h.unrest + 3.0 * s).clamp(0.0, 1.0);
            }
        }
        ShockKind::ClimateCatastrophe => {
            econ.bump_inflation(20.0 * s);
            econ.bump_unemployment(10.0 * s);
            for f in firms.iter_mut() {
                f.productivity *= 1.0 - 4.0 * s;
            }
            for h in households.iter_mut() {
                h.wealth *= 1.0 - 2.0 * s;
            }
        }
        ShockKind::Permanent => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::{Archetype, SocialClass};
    use approx::assert_abs_diff_eq;
    use rand::SeedableRng;

    fn empty_manager() -> ShockManager {
        let mut config = SimConfig::default();
        config.shock_probs.clear();
        ShockManager::new(&config)
    }

    #[test]
    fn financial_crash_destroys_firm_capital() {
        let mut firms = [FirmData::new(0, Archetype::Startup)];
        assert_eq!(firms[0].capital, 1_000.0);

        let shock = Shock {
            kind: ShockKind::FinancialCrash,
            severity: 0.5,
            remaining: 10,
            start_tick: 0,
        };
        apply_shock(&shock, &mut EconomicState::default(), &mut [], &mut firms);
        assert_abs_diff_eq!(firms[0].capital, -3_000.0, epsilon = 1e-9);
    }

    #[test]
    fn bounded_macro_fields_stay_clamped() {
        let mut econ = EconomicState::default();
        let shock = Shock {
            kind: ShockKind::FinancialCrash,
            severity: 1.0,
            remaining: 10,
            start_tick: 0,
        };
        apply_shock(&shock, &mut econ, &mut [], &mut []);
        assert_eq!(econ.unemployment, 1.0);

        let supply = Shock {
            kind: ShockKind::SupplyChainCollapse,
            severity: 1.0,
            remaining: 10,
            start_tick: 0,
        };
        apply_shock(&supply, &mut econ, &mut [], &mut []);
        assert_eq!(econ.inflation, 1.0);
    }

    #[test]
    fn coup_saturates_unrest_but_not_beyond_one() {
        let mut households = [HouseholdData::new(0, SocialClass::Poor, 100.0)];
        let shock = Shock {
            kind: ShockKind::PoliticalCoup,
            severity: 0.5,
            remaining: 10,
            start_tick: 0,
        };
        apply_shock(
            &shock,
            &mut EconomicState::default(),
            &mut households,
            &mut [],
        );
        assert_eq!(households[0].unrest, 1.0);
    }

    #[test]
    fn manual_injection_bypasses_probability_draw() {
        let mut manager = empty_manager();
        manager.add_shock(ShockKind::CyberAttack, 0.3, 7);
        assert_eq!(manager.active().len(), 1);
        assert_eq!(manager.active()[0].remaining, 10);
        assert_eq!(manager.active()[0].start_tick, 7);

        manager.add_shock(ShockKind::Permanent, 0.3, 7);
        assert_eq!(manager.active()[1].remaining, 1_000);
    }

    #[test]
    fn severity_is_clamped_on_injection() {
        let mut manager = empty_manager();
        manager.add_shock(ShockKind::Pandemic, 4.2, 0);
        assert_eq!(manager.active()[0].severity, 1.0);
    }

    #[test]
    fn shocks_expire_after_their_duration() {
        let mut manager = empty_manager();
        manager.add_shock(ShockKind::CyberAttack, 0.1, 0);

        let mut econ = EconomicState::default();
        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..10 {
            assert_eq!(manager.active().len(), 1);
            manager.step(&mut econ, &mut [], &mut [], &mut rng, 0);
        }
        assert!(manager.active().is_empty());
    }

    #[test]
    fn probability_one_always_triggers() {
        let mut config = SimConfig::default();
        config.shock_probs.clear();
        config.shock_probs.insert(ShockKind::Pandemic, 1.0);
        let mut manager = ShockManager::new(&config);

        let mut econ = EconomicState::default();
        let mut rng = StdRng::seed_from_u64(1);
        manager.step(&mut econ, &mut [], &mut [], &mut rng, 3);
        assert_eq!(manager.active().len(), 1);
        assert_eq!(manager.active()[0].kind, ShockKind::Pandemic);
        assert_eq!(manager.active()[0].severity, RANDOM_TRIGGER_SEVERITY);
    }
}

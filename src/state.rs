use std::any::Any;

use krabmaga::engine::{schedule::Schedule, state::State};
use rand::distributions::{Distribution, WeightedIndex};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::StandardNormal;
use serde::Serialize;
use tracing::info;

use crate::agents::{
    Archetype, FirmAgent, FirmData, GovernmentAgent, HouseholdAgent, HouseholdData, SocialClass,
};
use crate::config::SimConfig;
use crate::markets::{
    clear_credit_market, clear_goods_market, CreditOutcome, GoodsOutcome, LaborMarketAgent,
    LaborOutcome, MarketConditions,
};
use crate::metrics;
use crate::seed::InitialConditions;
use crate::shocks::ShockManager;
use crate::social::{DiffusionAgent, SocialGraph};

// ─────────────────────────────────────────────────────────────────────────────
// Macro state
// ─────────────────────────────────────────────────────────────────────────────

/// Survival status of the simulated economy.  Within an episode the regime
/// only ever moves from `Stable` to `Collapsed`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Regime {
    #[default]
    Stable,
    Collapsed,
}

/// Canonical macro snapshot, mutated in place each tick.
///
/// Inflation, unemployment, the Gini coefficient, average unrest, and the
/// top-1% share live in [0, 1]; the bump helpers keep them there whatever
/// the caller adds.
#[derive(Clone, Debug, Serialize)]
pub struct EconomicState {
    pub gdp: f64,
    pub gdp_last: f64,
    pub gdp_growth: f64,
    pub inflation: f64,
    pub unemployment: f64,
    pub interest_rate: f64,
    pub tax_rate: f64,
    pub gini_coeff: f64,
    pub wage_index: f64,
    pub price_index: f64,
    pub avg_unrest: f64,
    pub top1_wealth_share: f64,
    pub welfare_spending: f64,
    pub capital_controls: f64,
    pub regime: Regime,
}

impl Default for EconomicState {
    fn default() -> Self {
        EconomicState {
            gdp: 0.0,
            gdp_last: 0.0,
            gdp_growth: 0.0,
            inflation: 0.0,
            unemployment: 0.0,
            interest_rate: 0.05,
            tax_rate: 0.2,
            gini_coeff: 0.0,
            wage_index: 1.0,
            price_index: 1.0,
            avg_unrest: 0.0,
            top1_wealth_share: 0.0,
            welfare_spending: 0.0,
            capital_controls: 0.0,
            regime: Regime::Stable,
        }
    }
}

impl EconomicState {
    /// Kickstart the macro state from an initial-conditions record.
    pub fn from_seed(seed: &InitialConditions) -> Self {
        EconomicState {
            gdp: seed.initial_gdp,
            gdp_last: seed.initial_gdp,
            inflation: seed.inflation_target.clamp(0.0, 1.0),
            unemployment: seed.base_unemployment.clamp(0.0, 1.0),
            interest_rate: seed.base_interest_rate,
            ..EconomicState::default()
        }
    }

    /// Apply the government's levers:
    /// `[interest_rate, tax_rate, welfare_spending, capital_controls]`.
    pub fn apply_policy(&mut self, action: [f64; 4]) {
        self.interest_rate = action[0].clamp(0.0, 1.0);
        self.tax_rate = action[1].clamp(0.0, 1.0);
        self.welfare_spending = action[2].clamp(0.0, 1.0);
        self.capital_controls = action[3].clamp(0.0, 1.0);
    }

    /// Recompute growth from the stored GDP history and roll it forward.
    pub fn update_growth(&mut self) {
        self.gdp_growth = if self.gdp_last > 0.0 {
            (self.gdp - self.gdp_last) / self.gdp_last
        } else {
            0.0
        };
        self.gdp_last = self.gdp;
    }

    pub fn bump_inflation(&mut self, delta: f64) {
        self.inflation = (self.inflation + delta).clamp(0.0, 1.0);
    }

    pub fn bump_unemployment(&mut self, delta: f64) {
        self.unemployment = (self.unemployment + delta).clamp(0.0, 1.0);
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tick record
// ─────────────────────────────────────────────────────────────────────────────

/// Aggregate statistics recorded for a single completed tick.
#[derive(Clone, Debug, Default, Serialize)]
pub struct TickRecord {
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
    pub wage: f64,
    pub government_reward: f64,
    pub avg_household_reward: f64,
    pub active_shocks: usize,
    pub bankruptcies: usize,
}

// ─────────────────────────────────────────────────────────────────────────────
// Simulation state
// ─────────────────────────────────────────────────────────────────────────────

/// Central state struct holding all agent data and per-tick outcomes.
///
/// Implements the krabmaga `State` trait.  Agent *proxy* structs
/// (`FirmAgent`, `HouseholdAgent`, `DiffusionAgent`, `LaborMarketAgent`)
/// live in the Schedule; the mutable data for every agent lives here, in
/// index-stable arenas (agents are never removed within an episode).
pub struct SimState {
    pub econ: EconomicState,
    pub households: Vec<HouseholdData>,
    pub firms: Vec<FirmData>,
    pub government: GovernmentAgent,
    pub graph: SocialGraph,
    pub shocks: ShockManager,

    /// Levers to apply at the next tick, set by the environment.
    pub pending_action: [f64; 4],
    /// Market snapshot firms plan against, rebuilt each tick.
    pub conditions: MarketConditions,

    // Market outcomes (updated each tick)
    pub labor_last: LaborOutcome,
    pub goods_last: GoodsOutcome,
    pub credit_last: CreditOutcome,

    pub last_reward: f64,
    pub timestep: u64,
    pub records: Vec<TickRecord>,

    pub config: SimConfig,
    init: InitialConditions,
    pub rng: StdRng,
}

impl SimState {
    /// Create a fresh simulation state with all agents drawn from their
    /// priors using a single seeded generator.
    pub fn new(config: SimConfig, init: InitialConditions, seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let households = Self::create_households(&config, &mut rng);
        let firms = Self::create_firms(&config, &mut rng);
        let graph = SocialGraph::new(households.len(), &config, &mut rng);

        let mut government = GovernmentAgent::new(&config);
        government.prev_gdp = Some(init.initial_gdp);

        let econ = EconomicState::from_seed(&init);
        let pending_action = [
            econ.interest_rate,
            econ.tax_rate,
            econ.welfare_spending,
            econ.capital_controls,
        ];

        SimState {
            econ,
            households,
            firms,
            government,
            graph,
            shocks: ShockManager::new(&config),
            pending_action,
            conditions: MarketConditions::default(),
            labor_last: LaborOutcome::default(),
            goods_last: GoodsOutcome::default(),
            credit_last: CreditOutcome::default(),
            last_reward: 0.0,
            timestep: 0,
            records: Vec::new(),
            config,
            init,
            rng,
        }
    }

    // ─── Agent initialisation ────────────────────────────────────────────────

    fn create_households(config: &SimConfig, rng: &mut StdRng) -> Vec<HouseholdData> {
        let class_weights = WeightedIndex::new(SocialClass::WEIGHTS).unwrap();
        (0..config.num_households)
            .map(|id| {
                let class = SocialClass::ALL[class_weights.sample(rng)];
                HouseholdData::sample(id, class, rng)
            })
            .collect()
    }

    fn create_firms(config: &SimConfig, rng: &mut StdRng) -> Vec<FirmData> {
        let archetype_weights = WeightedIndex::new(Archetype::WEIGHTS).unwrap();
        (0..config.num_firms)
            .map(|id| FirmData::new(id, Archetype::ALL[archetype_weights.sample(rng)]))
            .collect()
    }

    /// Rebuild agents, graph, shocks, and macro state for a new episode.
    /// The generator keeps running, so every episode gets fresh draws.
    pub fn reinitialize(&mut self) {
        self.households = Self::create_households(&self.config, &mut self.rng);
        self.firms = Self::create_firms(&self.config, &mut self.rng);
        self.graph = SocialGraph::new(self.households.len(), &self.config, &mut self.rng);
        self.shocks = ShockManager::new(&self.config);

        self.government = GovernmentAgent::new(&self.config);
        self.government.prev_gdp = Some(self.init.initial_gdp);

        self.econ = EconomicState::from_seed(&self.init);
        self.pending_action = [
            self.econ.interest_rate,
            self.econ.tax_rate,
            self.econ.welfare_spending,
            self.econ.capital_controls,
        ];
        self.conditions = MarketConditions::default();
        self.labor_last = LaborOutcome::default();
        self.goods_last = GoodsOutcome::default();
        self.credit_last = CreditOutcome::default();
        self.last_reward = 0.0;
        self.timestep = 0;
        self.records.clear();
    }

    // ─── Per-tick helpers ────────────────────────────────────────────────────

    /// Recompute the macro aggregates after all markets have settled.
    fn update_macros(&mut self) {
        self.econ.gdp = self.firms.iter().map(|f| f.revenue).sum();

        let nudge: f64 = self.rng.sample(StandardNormal);
        self.econ.inflation = (self.econ.inflation + 0.01 * nudge).clamp(0.0, 1.0);

        self.econ.unemployment = self.labor_last.unemployment_rate.clamp(0.0, 1.0);

        let wealths: Vec<f64> = self.households.iter().map(|h| h.wealth).collect();
        self.econ.gini_coeff = metrics::gini(&wealths);
        self.econ.top1_wealth_share = metrics::wealth_share(&wealths, 0.01);

        self.econ.avg_unrest = if self.households.is_empty() {
            0.0
        } else {
            let total: f64 = self.households.iter().map(|h| h.unrest).sum();
            (total / self.households.len() as f64).clamp(0.0, 1.0)
        };

        self.econ.update_growth();
    }

    /// Mean unrest among a household's contacts; its own level when
    /// isolated.
    pub fn local_exposure(&self, id: usize) -> f64 {
        let mut sum = 0.0;
        let mut count = 0usize;
        for neighbor in self.graph.neighbors(id) {
            if let Some(h) = self.households.get(neighbor) {
                sum += h.unrest;
                count += 1;
            }
        }
        if count == 0 {
            self.households[id].unrest
        } else {
            sum / count as f64
        }
    }

    fn average_household_reward(&self) -> f64 {
        if self.households.is_empty() {
            return 0.0;
        }
        let total: f64 = self
            .households
            .iter()
            .enumerate()
            .map(|(id, h)| h.compute_reward(&self.econ, self.local_exposure(id)))
            .sum();
        total / self.households.len() as f64
    }

    /// Endogenous revolution (unrest plus unemployment) or economic death
    /// (GDP at zero) both end the episode; neither ever reverses.
    pub(crate) fn check_collapse(&mut self) {
        if self.econ.regime == Regime::Collapsed {
            return;
        }
        let revolution = self.econ.avg_unrest > 0.7 && self.econ.unemployment > 0.15;
        let economic_death = self.econ.gdp < 1e-3;
        if revolution || economic_death {
            self.econ.regime = Regime::Collapsed;
            info!(
                tick = self.timestep,
                avg_unrest = self.econ.avg_unrest,
                unemployment = self.econ.unemployment,
                gdp = self.econ.gdp,
                "regime collapsed"
            );
        }
    }

    /// Record aggregate statistics for the completed tick.
    fn record(&mut self) {
        let avg_household_reward = self.average_household_reward();
        let bankruptcies = self.firms.iter().filter(|f| !f.alive).count();
        self.records.push(TickRecord {
            tick: self.timestep,
            gdp: self.econ.gdp,
            gdp_growth: self.econ.gdp_growth,
            inflation: self.econ.inflation,
            unemployment: self.econ.unemployment,
            gini: self.econ.gini_coeff,
            avg_unrest: self.econ.avg_unrest,
            top1_wealth_share: self.econ.top1_wealth_share,
            interest_rate: self.econ.interest_rate,
            tax_rate: self.econ.tax_rate,
            welfare_spending: self.econ.welfare_spending,
            capital_controls: self.econ.capital_controls,
            wage: self.labor_last.wage,
            government_reward: self.last_reward,
            avg_household_reward,
            active_shocks: self.shocks.active().len(),
            bankruptcies,
        });
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// krabmaga State implementation
// ─────────────────────────────────────────────────────────────────────────────

impl State for SimState {
    /// Schedule all agent proxies when the simulation starts.
    ///
    /// Execution order per tick (lower ordering runs first):
    ///   0 → FirmAgent         (firms plan labour demand and reprice)
    ///   1 → HouseholdAgent    (households split wealth, set protest level)
    ///   2 → DiffusionAgent    (unrest spreads over the contact network)
    ///   3 → LaborMarketAgent  (labour market clears, wages paid)
    /// Goods/credit clearing, settlement, and macro aggregation run in
    /// `after_step`, mirroring the shock/policy phase in `before_step`.
    fn init(&mut self, schedule: &mut Schedule) {
        for i in 0..self.firms.len() {
            schedule.schedule_repeating(Box::new(FirmAgent { id: i }), 0.0, 0);
        }
        for i in 0..self.households.len() {
            schedule.schedule_repeating(Box::new(HouseholdAgent { id: i }), 0.0, 1);
        }
        schedule.schedule_repeating(Box::new(DiffusionAgent), 0.0, 2);
        schedule.schedule_repeating(Box::new(LaborMarketAgent), 0.0, 3);
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_state_mut(&mut self) -> &mut dyn State {
        self
    }

    fn as_state(&self) -> &dyn State {
        self
    }

    fn reset(&mut self) {
        self.reinitialize();
    }

    /// Shock phase and policy application, ahead of all agent proxies.
    fn before_step(&mut self, _schedule: &mut Schedule) {
        self.timestep += 1;
        let tick = self.timestep;

        {
            let SimState {
                shocks,
                econ,
                households,
                firms,
                rng,
                ..
            } = self;
            shocks.step(econ, households, firms, rng, tick);
        }

        self.econ.apply_policy(self.pending_action);

        self.conditions = MarketConditions {
            demand: self.econ.gdp,
            wage: self.config.base_wage * self.econ.wage_index,
            inflation: self.econ.inflation,
            interest_rate: self.econ.interest_rate,
            shock_multiplier: 1.0,
        };
    }

    /// Production, the remaining market clears, settlement, aggregation,
    /// reward, and the collapse check.
    fn after_step(&mut self, _schedule: &mut Schedule) {
        for firm in self.firms.iter_mut() {
            firm.produce();
        }

        clear_goods_market(self);
        clear_credit_market(self);

        for firm in self.firms.iter_mut() {
            firm.post_market_step();
        }

        self.update_macros();

        self.last_reward = {
            let SimState {
                government,
                econ,
                households,
                ..
            } = self;
            government.compute_reward(econ, households)
        };

        self.check_collapse();
        self.record();
    }

    fn update(&mut self, _step: u64) {}
}

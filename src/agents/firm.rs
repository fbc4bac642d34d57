use std::fmt;

use krabmaga::engine::{agent::Agent, state::State};
use serde::{Deserialize, Serialize};

use crate::markets::MarketConditions;
use crate::state::SimState;

// ─────────────────────────────────────────────────────────────────────────────
// Archetypes
// ─────────────────────────────────────────────────────────────────────────────

/// Firm archetype, fixed at creation.  Archetypes differ in starting
/// capital, productivity, pricing power, and cost of capital.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Archetype {
    Startup,
    Sme,
    Mnc,
}

impl Archetype {
    pub const ALL: [Archetype; 3] = [Archetype::Startup, Archetype::Sme, Archetype::Mnc];

    /// Population weights used when drawing archetypes at episode start.
    pub const WEIGHTS: [f64; 3] = [0.5, 0.35, 0.15];

    pub fn initial_capital(self) -> f64 {
        match self {
            Archetype::Startup => 1_000.0,
            Archetype::Sme => 10_000.0,
            Archetype::Mnc => 100_000.0,
        }
    }

    pub fn productivity(self) -> f64 {
        match self {
            Archetype::Startup => 0.8,
            Archetype::Sme => 1.0,
            Archetype::Mnc => 1.3,
        }
    }

    pub fn pricing_power(self) -> f64 {
        match self {
            Archetype::Startup => 0.9,
            Archetype::Sme => 1.0,
            Archetype::Mnc => 1.2,
        }
    }

    pub fn credit_cost(self) -> f64 {
        match self {
            Archetype::Startup => 0.10,
            Archetype::Sme => 0.06,
            Archetype::Mnc => 0.03,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Firm data
// ─────────────────────────────────────────────────────────────────────────────

/// All mutable state for a single firm.
///
/// `alive` is monotone: once a settlement leaves capital below zero the firm
/// is bankrupt for the rest of the episode, with employees and production
/// frozen at zero.  Productivity starts at the archetype coefficient and can
/// be eroded by shocks.
#[derive(Clone, Debug)]
pub struct FirmData {
    pub id: usize,
    pub archetype: Archetype,
    pub capital: f64,
    pub employees: usize,
    pub desired_labor: usize,
    pub production: f64,
    pub price: f64,
    pub revenue: f64,
    pub wage_bill: f64,
    pub debt: f64,
    pub alive: bool,
    pub productivity: f64,
    pub pricing_power: f64,
    pub credit_cost: f64,
}

/// Floor on the demand signal seen by firms; prevents a self-reinforcing
/// demand collapse when GDP approaches zero.
const DEMAND_FLOOR: f64 = 100.0;

impl FirmData {
    pub fn new(id: usize, archetype: Archetype) -> Self {
        FirmData {
            id,
            archetype,
            capital: archetype.initial_capital(),
            employees: 0,
            desired_labor: 0,
            production: 0.0,
            price: 10.0,
            revenue: 0.0,
            wage_bill: 0.0,
            debt: 0.0,
            alive: true,
            productivity: archetype.productivity(),
            pricing_power: archetype.pricing_power(),
            credit_cost: archetype.credit_cost(),
        }
    }

    /// Plan the tick: decide labour demand and reprice.
    ///
    /// Expected output follows the demand signal (floored) scaled by the
    /// shock multiplier and productivity; the labour needed for it is capped
    /// by what current capital can pay at the going wage.  Prices pass
    /// through half of observed inflation, amplified by pricing power.
    pub fn step(&mut self, conditions: &MarketConditions) {
        if !self.alive {
            self.desired_labor = 0;
            self.production = 0.0;
            return;
        }

        let effective_demand = conditions.demand.max(DEMAND_FLOOR);
        let expected_demand = effective_demand * conditions.shock_multiplier * self.productivity;

        let labor_required = (expected_demand / self.productivity.max(1e-9)) as usize;
        let labor_budget = (self.capital / conditions.wage.max(1.0)) as usize;
        self.desired_labor = labor_required.min(labor_budget);

        self.price *= 1.0 + conditions.inflation * 0.5 * self.pricing_power;

        self.revenue = 0.0;
        self.wage_bill = 0.0;
    }

    /// Convert matched employees into output.  Valid only after the labour
    /// market has assigned `employees`.
    pub fn produce(&mut self) {
        self.production = self.employees as f64 * self.productivity;
    }

    /// Settle the tick's accounts after all markets have cleared.
    ///
    /// Profit is revenue minus the wage bill minus the archetype's cost of
    /// holding capital.  A negative post-settlement capital position is
    /// terminal.
    pub fn post_market_step(&mut self) {
        if !self.alive {
            return;
        }

        let capital_cost = self.capital * self.credit_cost;
        let profit = self.revenue - self.wage_bill - capital_cost;
        self.capital += profit;

        if self.capital < 0.0 {
            self.alive = false;
            self.employees = 0;
            self.production = 0.0;
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Schedule proxy
// ─────────────────────────────────────────────────────────────────────────────

/// Proxy agent for a single firm; only holds the index into
/// `SimState::firms`.
#[derive(Clone)]
pub struct FirmAgent {
    pub id: usize,
}

impl fmt::Display for FirmAgent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FirmAgent({})", self.id)
    }
}

impl Agent for FirmAgent {
    fn step(&mut self, state: &mut dyn State) {
        let state = state
            .as_any_mut()
            .downcast_mut::<SimState>()
            .expect("state should be SimState");

        let conditions = state.conditions;
        state.firms[self.id].step(&conditions);
    }
}

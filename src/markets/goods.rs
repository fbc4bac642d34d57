use crate::state::SimState;

/// Outcome of goods market clearing for one tick.
#[derive(Clone, Copy, Debug, Default)]
pub struct GoodsOutcome {
    pub total_demand: f64,
    pub total_supply: f64,
    pub price_multiplier: f64,
}

/// Clear the goods market in-place on the simulation state.
///
/// Aggregate household consumption meets aggregate firm production; every
/// firm's price moves by the same tanh-bounded imbalance response.  Revenue
/// is allocated by production share of the matched volume, so a firm can
/// never realize more revenue than its slice of `min(demand, supply)` no
/// matter how it priced.
pub fn clear_goods_market(state: &mut SimState) {
    let total_demand: f64 = state.households.iter().map(|h| h.consumption).sum();
    let total_supply: f64 = state.firms.iter().map(|f| f.production).sum();

    let excess = total_demand - total_supply;
    let imbalance = excess / total_supply.max(1.0);
    let price_multiplier = 1.0 + state.config.price_adjustment * imbalance.tanh();

    for firm in state.firms.iter_mut() {
        firm.price *= price_multiplier;
    }

    if total_supply > 0.0 {
        let matched = total_demand.min(total_supply);
        for firm in state.firms.iter_mut() {
            let market_share = firm.production / total_supply;
            firm.revenue = market_share * matched * firm.price;
        }
    } else {
        for firm in state.firms.iter_mut() {
            firm.revenue = 0.0;
        }
    }

    state.econ.price_index *= price_multiplier;
    state.goods_last = GoodsOutcome {
        total_demand,
        total_supply,
        price_multiplier,
    };
}

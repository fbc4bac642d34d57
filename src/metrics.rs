//! Inequality metrics over a wealth distribution.

/// Gini coefficient of a wealth distribution.
///
/// 0 = perfect equality, 1 = one agent holds everything.  Empty and all-zero
/// distributions report 0.
pub fn gini(wealths: &[f64]) -> f64 {
    let n = wealths.len();
    if n == 0 {
        return 0.0;
    }
    let total: f64 = wealths.iter().sum();
    if wealths.iter().all(|&w| w == 0.0) {
        return 0.0;
    }

    let mut sorted = wealths.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    let weighted: f64 = sorted
        .iter()
        .enumerate()
        .map(|(i, &w)| (2.0 * (i as f64 + 1.0) - n as f64 - 1.0) * w)
        .sum();

    (weighted / (n as f64 * total)).clamp(0.0, 1.0)
}

/// Share of total wealth held by the top `top_percentile` of agents
/// (e.g. 0.01 for the top 1%).
///
/// Returns 0 when the distribution is empty or holds no positive total
/// wealth.  At least one agent always counts as the "top".
pub fn wealth_share(wealths: &[f64], top_percentile: f64) -> f64 {
    if wealths.is_empty() {
        return 0.0;
    }
    let total: f64 = wealths.iter().sum();
    if total <= 0.0 {
        return 0.0;
    }

    let k = ((wealths.len() as f64 * top_percentile).ceil() as usize).max(1);

    let mut sorted = wealths.to_vec();
    sorted.sort_by(|a, b| b.partial_cmp(a).unwrap_or(std::cmp::Ordering::Equal));

    let top: f64 = sorted.iter().take(k).sum();
    (top / total).clamp(0.0, 1.0)
}

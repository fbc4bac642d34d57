use std::fmt;

use krabmaga::engine::{agent::Agent, state::State};
use petgraph::graph::{NodeIndex, UnGraph};
use petgraph::visit::EdgeRef;
use rand::rngs::StdRng;
use rand::Rng;
use rand_distr::{Distribution, Normal};
use serde::Serialize;

use crate::config::SimConfig;
use crate::state::SimState;

// ─────────────────────────────────────────────────────────────────────────────
// Contact network
// ─────────────────────────────────────────────────────────────────────────────

/// Fixed contact network over household indices.
///
/// Built once per episode by preferential attachment: each new node links to
/// `avg_degree` existing nodes chosen proportionally to current degree, so a
/// few highly connected "opinion leaders" emerge.  The topology never
/// changes afterwards; only the unrest values carried by the households do.
pub struct SocialGraph {
    graph: UnGraph<(), ()>,
    influence_strength: f64,
    decay: f64,
    noise_std: f64,
}

impl SocialGraph {
    pub fn new(num_agents: usize, config: &SimConfig, rng: &mut StdRng) -> Self {
        SocialGraph {
            graph: build_preferential_attachment(num_agents, config.avg_degree, rng),
            influence_strength: config.influence_strength,
            decay: config.unrest_decay,
            noise_std: config.social_noise.max(0.0),
        }
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn neighbors(&self, id: usize) -> impl Iterator<Item = usize> + '_ {
        self.graph
            .neighbors(NodeIndex::new(id))
            .map(|n| n.index())
    }

    pub fn degree(&self, id: usize) -> usize {
        self.neighbors(id).count()
    }

    /// One diffusion pass over the network.
    ///
    /// Reads a single snapshot of the previous tick's values: no node ever
    /// sees a neighbor's already-updated value, so the result is independent
    /// of iteration order.  Isolated nodes keep their own (clamped) value.
    /// Every output lands in [0, 1].
    pub fn spread_influence(&self, current: &[f64], rng: &mut StdRng) -> Vec<f64> {
        let noise = Normal::new(0.0, self.noise_std).unwrap();

        (0..current.len())
            .map(|i| {
                let own = current[i];
                let mut sum = 0.0;
                let mut count = 0usize;
                for n in self.neighbors(i) {
                    if let Some(&u) = current.get(n) {
                        sum += u;
                        count += 1;
                    }
                }
                if count == 0 {
                    return own.clamp(0.0, 1.0);
                }
                let neighbor_mean = sum / count as f64;
                let propagated = own + self.influence_strength * (neighbor_mean - own)
                    - self.decay * own
                    + noise.sample(rng);
                propagated.clamp(0.0, 1.0)
            })
            .collect()
    }

    /// Node/edge-list exchange snapshot for external consumers, carrying the
    /// supplied unrest value on each node.
    pub fn snapshot(&self, unrest: &[f64]) -> NetworkSnapshot {
        let nodes = (0..self.graph.node_count())
            .map(|id| NetworkNode {
                id,
                unrest: unrest.get(id).copied().unwrap_or(0.0),
            })
            .collect();
        let links = self
            .graph
            .edge_references()
            .map(|e| NetworkLink {
                source: e.source().index(),
                target: e.target().index(),
            })
            .collect();
        NetworkSnapshot { nodes, links }
    }
}

/// Barabási–Albert construction: start from `m` isolated seed nodes, then
/// attach every further node to `m` distinct targets sampled from a list of
/// repeated edge endpoints (degree-proportional sampling).
///
/// `m` is clamped to the population size rather than rejected, so degenerate
/// configurations degrade to sparser (or empty) graphs.
fn build_preferential_attachment(n: usize, avg_degree: usize, rng: &mut StdRng) -> UnGraph<(), ()> {
    let mut graph = UnGraph::with_capacity(n, n.saturating_mul(avg_degree.max(1)));
    for _ in 0..n {
        graph.add_node(());
    }
    if n < 2 {
        return graph;
    }
    let m = avg_degree.clamp(1, n - 1);

    let mut repeated: Vec<usize> = Vec::with_capacity(2 * m * n);
    let mut targets: Vec<usize> = (0..m).collect();

    for source in m..n {
        for &t in &targets {
            graph.add_edge(NodeIndex::new(source), NodeIndex::new(t), ());
        }
        repeated.extend(targets.iter().copied());
        repeated.extend(std::iter::repeat(source).take(m));

        let mut next: Vec<usize> = Vec::with_capacity(m);
        while next.len() < m {
            let candidate = repeated[rng.gen_range(0..repeated.len())];
            if !next.contains(&candidate) {
                next.push(candidate);
            }
        }
        targets = next;
    }
    graph
}

// ─────────────────────────────────────────────────────────────────────────────
// Exchange format
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Clone, Debug, Serialize)]
pub struct NetworkNode {
    pub id: usize,
    pub unrest: f64,
}

#[derive(Clone, Debug, Serialize)]
pub struct NetworkLink {
    pub source: usize,
    pub target: usize,
}

/// Node/edge-list view of the contact network, serializable for the
/// presentation layer.
#[derive(Clone, Debug, Serialize)]
pub struct NetworkSnapshot {
    pub nodes: Vec<NetworkNode>,
    pub links: Vec<NetworkLink>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Schedule proxy
// ─────────────────────────────────────────────────────────────────────────────

/// Proxy agent that runs the unrest diffusion pass within the schedule,
/// after households have acted and before the labour market clears.
#[derive(Clone)]
pub struct DiffusionAgent;

impl fmt::Display for DiffusionAgent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DiffusionAgent")
    }
}

impl Agent for DiffusionAgent {
    fn step(&mut self, state: &mut dyn State) {
        let state = state
            .as_any_mut()
            .downcast_mut::<SimState>()
            .expect("state should be SimState");

        let current: Vec<f64> = state.households.iter().map(|h| h.unrest).collect();
        let SimState {
            graph,
            households,
            rng,
            ..
        } = state;
        let updated = graph.spread_influence(&current, rng);
        for (household, unrest) in households.iter_mut().zip(updated) {
            household.unrest = unrest;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn graph_with(n: usize, avg_degree: usize, noise: f64) -> (SocialGraph, StdRng) {
        let config = SimConfig {
            avg_degree,
            social_noise: noise,
            ..SimConfig::default()
        };
        let mut rng = StdRng::seed_from_u64(99);
        let graph = SocialGraph::new(n, &config, &mut rng);
        (graph, rng)
    }

    #[test]
    fn attachment_produces_expected_edge_count() {
        let (graph, _) = graph_with(100, 3, 0.0);
        assert_eq!(graph.node_count(), 100);
        // (n - m) new nodes each contribute m edges.
        assert_eq!(graph.edge_count(), (100 - 3) * 3);
    }

    #[test]
    fn attachment_favors_early_nodes() {
        let (graph, _) = graph_with(300, 2, 0.0);
        let early_max = (0..10).map(|i| graph.degree(i)).max().unwrap();
        let late_max = (290..300).map(|i| graph.degree(i)).max().unwrap();
        assert!(
            early_max > late_max,
            "expected hub formation: early max degree {early_max}, late max degree {late_max}"
        );
    }

    #[test]
    fn degenerate_populations_build_without_panicking() {
        for n in [0, 1, 2, 3] {
            let (graph, _) = graph_with(n, 5, 0.0);
            assert_eq!(graph.node_count(), n);
        }
    }

    #[test]
    fn diffusion_preserves_unit_interval() {
        let (graph, mut rng) = graph_with(50, 3, 0.5);
        let mut values: Vec<f64> = (0..50).map(|i| (i as f64 / 49.0)).collect();
        for _ in 0..20 {
            values = graph.spread_influence(&values, &mut rng);
            assert!(values.iter().all(|&v| (0.0..=1.0).contains(&v)));
        }
    }

    #[test]
    fn isolated_nodes_only_clip() {
        // avg_degree clamps to 1 for n=1; a single node has no neighbors.
        let (graph, mut rng) = graph_with(1, 3, 0.9);
        assert_eq!(graph.spread_influence(&[1.7], &mut rng), vec![1.0]);
        assert_eq!(graph.spread_influence(&[0.4], &mut rng), vec![0.4]);
    }

    #[test]
    fn diffusion_pulls_toward_neighbor_mean() {
        let (graph, mut rng) = graph_with(30, 3, 0.0);
        // One agitated node in a calm population relaxes toward its calm
        // neighborhood; calm neighbors of the agitator heat up.
        let mut values = vec![0.0; 30];
        values[0] = 1.0;
        let updated = graph.spread_influence(&values, &mut rng);
        assert!(updated[0] < 1.0);
        let spread: f64 = updated.iter().skip(1).sum();
        assert!(spread > 0.0);
    }

    #[test]
    fn diffusion_reads_one_snapshot() {
        // With zero noise the result must be identical however many times it
        // is computed from the same input.
        let (graph, mut rng) = graph_with(40, 2, 0.0);
        let values: Vec<f64> = (0..40).map(|i| ((i * 7) % 10) as f64 / 10.0).collect();
        let a = graph.spread_influence(&values, &mut rng);
        let b = graph.spread_influence(&values, &mut rng);
        assert_eq!(a, b);
    }

    #[test]
    fn snapshot_carries_unrest_attributes() {
        let (graph, _) = graph_with(10, 2, 0.0);
        let unrest: Vec<f64> = (0..10).map(|i| i as f64 / 10.0).collect();
        let snap = graph.snapshot(&unrest);
        assert_eq!(snap.nodes.len(), 10);
        assert_eq!(snap.links.len(), graph.edge_count());
        assert_eq!(snap.nodes[3].unrest, 0.3);

        let json = serde_json::to_value(&snap).unwrap();
        assert!(json["nodes"].is_array());
        assert!(json["links"].is_array());
    }
}

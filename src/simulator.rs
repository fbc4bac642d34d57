use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, RwLock};
use std::thread::JoinHandle;

use serde::Serialize;
use tracing::{info, warn};

use crate::agents::{PolicyProvider, Transition};
use crate::config::SimConfig;
use crate::env::Environment;
use crate::seed::InitialConditions;
use crate::shocks::ShockKind;
use crate::social::NetworkSnapshot;
use crate::state::{Regime, TickRecord};

// ─────────────────────────────────────────────────────────────────────────────
// Published snapshot
// ─────────────────────────────────────────────────────────────────────────────

/// Immutable view of the simulation published after every tick.
///
/// Consumers (a dashboard, an exporter) only ever read whole snapshots; the
/// worker replaces the published snapshot wholesale, so readers never
/// observe a half-written tick.
#[derive(Clone, Debug, Serialize)]
pub struct MetricsSnapshot {
    pub tick: u64,
    pub episode: u64,
    /// Episodes ended by collapse (rather than the horizon) since start.
    pub collapsed_episodes: u64,
    pub observation: [f64; 10],
    pub gdp_growth: f64,
    pub regime: Regime,
    /// Rolling per-tick history, capped at the configured capacity.
    pub history: Vec<TickRecord>,
    pub network: NetworkSnapshot,
}

enum Command {
    InjectShock { kind: ShockKind, severity: f64 },
}

// ─────────────────────────────────────────────────────────────────────────────
// Simulator
// ─────────────────────────────────────────────────────────────────────────────

struct Worker {
    config: SimConfig,
    init: InitialConditions,
    provider: Box<dyn PolicyProvider>,
    seed: u64,
    commands: Receiver<Command>,
}

/// Runs the environment on a dedicated background thread.
///
/// Each loop iteration drains pending manual commands, asks the policy
/// provider for an action, steps the environment, feeds the experience
/// tuple back to the provider, publishes a fresh [`MetricsSnapshot`], and
/// auto-resets finished episodes.  The stop flag is checked once per tick
/// boundary; stochastic draws all flow through the environment's single
/// seeded generator.
pub struct Simulator {
    running: Arc<AtomicBool>,
    snapshot: Arc<RwLock<Option<Arc<MetricsSnapshot>>>>,
    commands: Sender<Command>,
    worker: Option<Worker>,
    handle: Option<JoinHandle<()>>,
}

impl Simulator {
    pub fn new(
        config: SimConfig,
        init: InitialConditions,
        provider: Box<dyn PolicyProvider>,
        seed: u64,
    ) -> Self {
        let (tx, rx) = mpsc::channel();
        Simulator {
            running: Arc::new(AtomicBool::new(false)),
            snapshot: Arc::new(RwLock::new(None)),
            commands: tx,
            worker: Some(Worker {
                config,
                init,
                provider,
                seed,
                commands: rx,
            }),
            handle: None,
        }
    }

    /// Spawn the tick loop.  A second call is a no-op.
    pub fn start(&mut self) {
        let Some(worker) = self.worker.take() else {
            warn!("simulator already started");
            return;
        };
        self.running.store(true, Ordering::SeqCst);

        let running = Arc::clone(&self.running);
        let slot = Arc::clone(&self.snapshot);
        self.handle = Some(std::thread::spawn(move || run_loop(worker, running, slot)));
    }

    /// Request a cooperative stop and wait for the worker to finish its
    /// current tick.
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Queue a manual shock; it lands at the next tick boundary.
    pub fn inject_shock(&self, kind: ShockKind, severity: f64) {
        if self.commands.send(Command::InjectShock { kind, severity }).is_err() {
            warn!(?kind, "shock dropped: simulator is not running");
        }
    }

    /// Latest published snapshot, if at least one tick has completed.
    pub fn latest(&self) -> Option<Arc<MetricsSnapshot>> {
        self.snapshot
            .read()
            .expect("snapshot lock poisoned")
            .clone()
    }
}

impl Drop for Simulator {
    fn drop(&mut self) {
        self.stop();
    }
}

fn run_loop(
    mut worker: Worker,
    running: Arc<AtomicBool>,
    slot: Arc<RwLock<Option<Arc<MetricsSnapshot>>>>,
) {
    let history_capacity = worker.config.history_capacity.max(1);
    let mut env = Environment::new(worker.config, worker.init, worker.seed);
    let mut history: VecDeque<TickRecord> = VecDeque::with_capacity(history_capacity);
    let mut episode: u64 = 0;
    let mut collapsed_episodes: u64 = 0;

    info!(seed = worker.seed, "simulation loop started");

    while running.load(Ordering::SeqCst) {
        for command in worker.commands.try_iter() {
            match command {
                Command::InjectShock { kind, severity } => env.inject_shock(kind, severity),
            }
        }

        let observation = env.policy_observation();
        let action = worker.provider.decide(&observation);
        let outcome = env.step(action);
        let next_observation = env.policy_observation();

        worker.provider.observe(Transition {
            observation,
            action,
            reward: outcome.reward,
            next_observation,
            terminal: outcome.terminated,
        });

        if let Some(record) = env.records().last() {
            if history.len() == history_capacity {
                history.pop_front();
            }
            history.push_back(record.clone());
        }

        if outcome.terminated {
            collapsed_episodes += 1;
        }

        let snapshot = Arc::new(MetricsSnapshot {
            tick: env.timestep(),
            episode,
            collapsed_episodes,
            observation: outcome.observation,
            gdp_growth: env.econ().gdp_growth,
            regime: env.econ().regime,
            history: history.iter().cloned().collect(),
            network: env.network_snapshot(),
        });
        *slot.write().expect("snapshot lock poisoned") = Some(snapshot);

        if outcome.terminated || outcome.truncated {
            info!(
                episode,
                tick = env.timestep(),
                collapsed = outcome.terminated,
                "episode finished"
            );
            env.reset();
            history.clear();
            episode += 1;
        }
    }
}

//! Gauge reconciler — per-gauge evaluation loops.
//!
//! One background task per gauge drives `Pending → Evaluating →
//! {Ready | Failed}`: an immediate evaluation on creation, a jittered
//! interval timer that always re-runs, coalesced explicit triggers, and
//! exponential backoff after retryable failures. Gauges reconcile
//! independently; the only state a loop touches is its own slot.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{RwLock, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use capstan_core::ProducerSpec;
use capstan_producers::{ProduceError, ProducerFactory};

use crate::backoff::{BackoffPolicy, jittered};
use crate::gauge::{GaugePhase, GaugeState};
use crate::hash::SpecHash;

/// Tunables for the evaluation loops.
#[derive(Debug, Clone)]
pub struct ReconcilerConfig {
    /// Base re-evaluation interval.
    pub interval: Duration,
    /// Maximum jitter added to each interval tick.
    pub jitter: Duration,
    /// Backoff schedule for retryable failures.
    pub backoff: BackoffPolicy,
}

impl Default for ReconcilerConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(30),
            jitter: Duration::from_secs(3),
            backoff: BackoffPolicy::default(),
        }
    }
}

/// Per-gauge loop handle.
struct GaugeSlot {
    handle: JoinHandle<()>,
    shutdown_tx: watch::Sender<bool>,
    poke_tx: watch::Sender<u64>,
    state: Arc<RwLock<GaugeState>>,
    spec_hash: SpecHash,
}

/// Drives periodic recomputation for every registered gauge.
pub struct Reconciler {
    factory: Arc<ProducerFactory>,
    config: ReconcilerConfig,
    gauges: Arc<RwLock<HashMap<String, GaugeSlot>>>,
}

impl Reconciler {
    pub fn new(factory: Arc<ProducerFactory>, config: ReconcilerConfig) -> Self {
        Self {
            factory,
            config,
            gauges: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Create a gauge, or replace its spec if it changed.
    ///
    /// A no-op when the spec hash is unchanged. On change the evaluation
    /// task restarts against the new spec; the observable state, and with
    /// it the last valid status, carries over.
    pub async fn apply(&self, name: &str, spec: ProducerSpec) {
        let hash = SpecHash::of(&spec);
        let mut gauges = self.gauges.write().await;

        let state = match gauges.get(name) {
            Some(slot) if slot.spec_hash == hash => {
                debug!(gauge = %name, hash = %hash, "spec unchanged");
                return;
            }
            Some(slot) => slot.state.clone(),
            None => Arc::new(RwLock::new(GaugeState::new())),
        };

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let (poke_tx, poke_rx) = watch::channel(0u64);

        let handle = tokio::spawn(run_gauge_loop(
            name.to_string(),
            spec,
            self.factory.clone(),
            state.clone(),
            self.config.clone(),
            poke_rx,
            shutdown_rx,
        ));

        let slot = GaugeSlot {
            handle,
            shutdown_tx,
            poke_tx,
            state,
            spec_hash: hash,
        };
        if let Some(old) = gauges.insert(name.to_string(), slot) {
            let _ = old.shutdown_tx.send(true);
            old.handle.abort();
            info!(gauge = %name, "gauge spec replaced");
        } else {
            info!(gauge = %name, "gauge created");
        }
    }

    /// Request an immediate re-evaluation.
    ///
    /// Triggers arriving while an evaluation is in flight coalesce; the
    /// loop observes only the latest one, so evaluations of a single gauge
    /// never overlap.
    pub async fn trigger(&self, name: &str) -> bool {
        let gauges = self.gauges.read().await;
        match gauges.get(name) {
            Some(slot) => {
                slot.poke_tx.send_modify(|v| *v += 1);
                true
            }
            None => false,
        }
    }

    /// Delete a gauge and cancel further evaluation.
    ///
    /// An in-flight result is discarded: status is written only on
    /// success, and the slot owning the observable state is gone.
    pub async fn delete(&self, name: &str) -> bool {
        let mut gauges = self.gauges.write().await;
        match gauges.remove(name) {
            Some(slot) => {
                let _ = slot.shutdown_tx.send(true);
                slot.handle.abort();
                info!(gauge = %name, "gauge deleted");
                true
            }
            None => false,
        }
    }

    /// Snapshot one gauge's observable state.
    pub async fn status(&self, name: &str) -> Option<GaugeState> {
        let gauges = self.gauges.read().await;
        match gauges.get(name) {
            Some(slot) => Some(slot.state.read().await.clone()),
            None => None,
        }
    }

    /// Names of all registered gauges.
    pub async fn gauge_names(&self) -> Vec<String> {
        let gauges = self.gauges.read().await;
        let mut names: Vec<String> = gauges.keys().cloned().collect();
        names.sort_unstable();
        names
    }

    /// Stop every gauge loop (for graceful shutdown).
    pub async fn stop_all(&self) {
        let mut gauges = self.gauges.write().await;
        for (name, slot) in gauges.drain() {
            let _ = slot.shutdown_tx.send(true);
            slot.handle.abort();
            debug!(gauge = %name, "gauge loop stopped");
        }
        info!("all gauge loops stopped");
    }
}

/// The evaluation loop for a single gauge.
async fn run_gauge_loop(
    name: String,
    spec: ProducerSpec,
    factory: Arc<ProducerFactory>,
    state: Arc<RwLock<GaugeState>>,
    config: ReconcilerConfig,
    mut poke_rx: watch::Receiver<u64>,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut attempt: u32 = 0;
    debug!(gauge = %name, kind = spec.kind(), "gauge loop starting");

    loop {
        let outcome = evaluate(&name, &spec, &factory, &state).await;

        let delay = match outcome {
            Ok(()) => {
                attempt = 0;
                jittered(config.interval, config.jitter)
            }
            Err(e) if e.is_retryable() => {
                attempt += 1;
                config.backoff.delay(attempt)
            }
            // Permanent failures wait for the next tick or a spec change.
            Err(_) => {
                attempt = 0;
                jittered(config.interval, config.jitter)
            }
        };

        tokio::select! {
            _ = tokio::time::sleep(delay) => {}
            changed = poke_rx.changed() => {
                // The sender drops with the slot.
                if changed.is_err() {
                    break;
                }
            }
            _ = shutdown.changed() => {
                debug!(gauge = %name, "gauge loop shutting down");
                break;
            }
        }
    }
}

/// Run one evaluation and fold the outcome into the observable state.
///
/// The status mapping is overwritten wholesale on success and left
/// untouched on failure.
async fn evaluate(
    name: &str,
    spec: &ProducerSpec,
    factory: &ProducerFactory,
    state: &Arc<RwLock<GaugeState>>,
) -> Result<(), ProduceError> {
    state.write().await.phase = GaugePhase::Evaluating;

    let result = match factory.resolve(spec.kind()) {
        Ok(producer) => producer.compute(spec).await,
        Err(e) => Err(e),
    };

    let mut st = state.write().await;
    st.evaluations += 1;
    match result {
        Ok(status) => {
            st.status = status;
            st.ready = true;
            st.last_error = None;
            st.phase = GaugePhase::Ready;
            debug!(gauge = %name, dimensions = st.status.len(), "gauge evaluated");
            Ok(())
        }
        Err(e) => {
            st.ready = false;
            st.last_error = Some(e.to_string());
            st.phase = GaugePhase::Failed;
            warn!(
                gauge = %name,
                error = %e,
                retryable = e.is_retryable(),
                "gauge evaluation failed"
            );
            Err(e)
        }
    }
}

//! capstan-reconciler — per-gauge reconcile loops for the capstan engine.
//!
//! Each gauge pairs a producer spec (desired) with an observable
//! [`GaugeState`] (observed). A dedicated task re-evaluates the gauge on
//! creation, on spec change, on explicit triggers, and on a jittered
//! interval timer; retryable failures back off exponentially while the
//! last valid status stays visible with `ready = false`.

pub mod backoff;
pub mod gauge;
pub mod hash;
pub mod reconciler;

pub use backoff::{BackoffPolicy, jittered};
pub use gauge::{GaugePhase, GaugeState};
pub use hash::SpecHash;
pub use reconciler::{Reconciler, ReconcilerConfig};

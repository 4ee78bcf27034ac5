//! capstan-core — shared domain types for the capstan metrics engine.
//!
//! Exact resource quantities, label selectors, machine/workload snapshots,
//! gauge specs, and the capstan.toml configuration model. Everything here
//! is plain data; the computation lives in `capstan-producers` and the
//! loops in `capstan-reconciler`.

pub mod config;
pub mod quantity;
pub mod selector;
pub mod types;

pub use quantity::{Quantity, QuantityError, Scale};
pub use selector::Selector;
pub use types::*;

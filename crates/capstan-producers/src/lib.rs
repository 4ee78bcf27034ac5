//! capstan-producers — metric computation for the capstan engine.
//!
//! Each producer variant turns a gauge spec into a per-dimension status
//! mapping. The reserved-capacity variant runs filter → aggregate →
//! format sequentially over one inventory snapshot; the factory resolves
//! variants by the discriminator carried on the spec.

pub mod aggregate;
pub mod filter;
pub mod format;
pub mod producer;
pub mod reserved_capacity;

pub use aggregate::{Reservation, WORKLOAD_SLOTS, aggregate};
pub use filter::eligible_machines;
pub use format::format_reservation;
pub use producer::{ProduceError, ProduceResult, Producer, ProducerFactory};
pub use reserved_capacity::ReservedCapacityProducer;

//! Producer capability and factory.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use capstan_core::{ProducerSpec, ReservationStatus};
use capstan_inventory::{InventoryClient, InventoryError};

use crate::reserved_capacity::ReservedCapacityProducer;

/// Errors surfaced by a metric computation.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProduceError {
    #[error("inventory unavailable: {0}")]
    Unavailable(String),

    #[error("inventory read timed out after {0:?}")]
    Timeout(Duration),

    #[error("no producer registered for kind {0:?}")]
    NotFound(String),

    #[error("invalid spec: {0}")]
    InvalidSpec(String),
}

impl ProduceError {
    /// Transient failures are retried with backoff; permanent ones only
    /// clear when the spec changes.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ProduceError::Unavailable(_) | ProduceError::Timeout(_))
    }
}

impl From<InventoryError> for ProduceError {
    fn from(err: InventoryError) -> Self {
        match err {
            InventoryError::Unavailable(reason) => ProduceError::Unavailable(reason),
            InventoryError::Timeout(deadline) => ProduceError::Timeout(deadline),
        }
    }
}

pub type ProduceResult<T> = Result<T, ProduceError>;

/// A metric-computation variant.
///
/// Implementations are resolved by the discriminator carried on the spec
/// and must be safe to invoke concurrently from independent gauge loops.
#[async_trait]
pub trait Producer: Send + Sync {
    /// Discriminator this producer registers under.
    fn kind(&self) -> &'static str;

    /// Compute the status mapping for one spec.
    async fn compute(&self, spec: &ProducerSpec) -> ProduceResult<ReservationStatus>;
}

/// Registry of producer variants keyed by discriminator.
///
/// Populated once at wiring time and read-only thereafter; new variants
/// register here without touching the reconciler.
#[derive(Default)]
pub struct ProducerFactory {
    producers: HashMap<&'static str, Arc<dyn Producer>>,
}

impl ProducerFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register all built-in producers against the given inventory handle.
    pub fn with_builtins(inventory: Arc<dyn InventoryClient>) -> Self {
        Self::new().with_producer(Arc::new(ReservedCapacityProducer::new(inventory)))
    }

    /// Register an additional producer variant.
    pub fn with_producer(mut self, producer: Arc<dyn Producer>) -> Self {
        self.producers.insert(producer.kind(), producer);
        self
    }

    /// Resolve the producer for a discriminator.
    pub fn resolve(&self, kind: &str) -> ProduceResult<Arc<dyn Producer>> {
        self.producers
            .get(kind)
            .cloned()
            .ok_or_else(|| ProduceError::NotFound(kind.to_string()))
    }

    /// Registered discriminators, for diagnostics.
    pub fn kinds(&self) -> Vec<&'static str> {
        let mut kinds: Vec<_> = self.producers.keys().copied().collect();
        kinds.sort_unstable();
        kinds
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use capstan_core::RESERVED_CAPACITY;
    use capstan_inventory::StaticInventory;

    #[test]
    fn builtins_resolve_by_kind() {
        let factory = ProducerFactory::with_builtins(Arc::new(StaticInventory::new()));
        assert_eq!(factory.kinds(), vec![RESERVED_CAPACITY]);

        let producer = factory.resolve(RESERVED_CAPACITY).unwrap();
        assert_eq!(producer.kind(), RESERVED_CAPACITY);
    }

    #[test]
    fn unknown_kind_is_a_permanent_error() {
        let factory = ProducerFactory::new();
        let err = match factory.resolve("pending_capacity") {
            Ok(_) => panic!("expected resolve to fail for unknown kind"),
            Err(err) => err,
        };
        assert_eq!(err, ProduceError::NotFound("pending_capacity".to_string()));
        assert!(!err.is_retryable());
    }

    #[test]
    fn inventory_errors_stay_retryable() {
        let err: ProduceError = InventoryError::Unavailable("connection refused".into()).into();
        assert!(err.is_retryable());

        let err: ProduceError = InventoryError::Timeout(Duration::from_secs(5)).into();
        assert!(err.is_retryable());

        assert!(!ProduceError::InvalidSpec("empty dimensions".into()).is_retryable());
    }
}

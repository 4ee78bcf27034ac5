//! Inventory client seam.
//!
//! The inventory service (machine and workload listing) is an external
//! collaborator; this module defines the client trait the engine consumes
//! plus a decorator bounding every read with a deadline.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use capstan_core::{Machine, Workload};

/// Errors surfaced by inventory reads.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum InventoryError {
    /// The inventory service could not be reached.
    #[error("inventory unavailable: {0}")]
    Unavailable(String),

    /// The read exceeded its deadline.
    #[error("inventory read timed out after {0:?}")]
    Timeout(Duration),
}

pub type InventoryResult<T> = Result<T, InventoryError>;

/// Read access to the cluster inventory.
///
/// Reads do not mutate shared state, so concurrent calls from independent
/// gauge loops need no coordination.
#[async_trait]
pub trait InventoryClient: Send + Sync {
    async fn list_machines(&self) -> InventoryResult<Vec<Machine>>;
    async fn list_workloads(&self) -> InventoryResult<Vec<Workload>>;
}

/// Bounds every read of an inner client with a deadline.
///
/// An elapsed deadline surfaces as [`InventoryError::Timeout`], which the
/// reconciler treats as retryable; it is never fatal to the process.
#[derive(Clone)]
pub struct DeadlineClient {
    inner: Arc<dyn InventoryClient>,
    deadline: Duration,
}

impl DeadlineClient {
    pub fn new(inner: Arc<dyn InventoryClient>, deadline: Duration) -> Self {
        Self { inner, deadline }
    }

    async fn bounded<T>(
        &self,
        read: impl Future<Output = InventoryResult<T>> + Send,
    ) -> InventoryResult<T> {
        match tokio::time::timeout(self.deadline, read).await {
            Ok(result) => result,
            Err(_) => Err(InventoryError::Timeout(self.deadline)),
        }
    }
}

#[async_trait]
impl InventoryClient for DeadlineClient {
    async fn list_machines(&self) -> InventoryResult<Vec<Machine>> {
        self.bounded(self.inner.list_machines()).await
    }

    async fn list_workloads(&self) -> InventoryResult<Vec<Workload>> {
        self.bounded(self.inner.list_workloads()).await
    }
}

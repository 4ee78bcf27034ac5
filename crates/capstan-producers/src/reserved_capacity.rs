//! Reserved-capacity producer.
//!
//! Computes, for each tracked dimension, what fraction of the selected
//! machine pool's allocatable capacity is claimed by the workloads bound
//! to it, and renders each dimension as `"<pct>%, <used>/<total>"`.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use capstan_core::{ProducerSpec, RESERVED_CAPACITY, ReservationStatus};
use capstan_inventory::InventoryClient;

use crate::aggregate::aggregate;
use crate::filter::eligible_machines;
use crate::format::format_reservation;
use crate::producer::{ProduceError, ProduceResult, Producer};

pub struct ReservedCapacityProducer {
    inventory: Arc<dyn InventoryClient>,
}

impl ReservedCapacityProducer {
    pub fn new(inventory: Arc<dyn InventoryClient>) -> Self {
        Self { inventory }
    }
}

#[async_trait]
impl Producer for ReservedCapacityProducer {
    fn kind(&self) -> &'static str {
        RESERVED_CAPACITY
    }

    async fn compute(&self, spec: &ProducerSpec) -> ProduceResult<ReservationStatus> {
        let ProducerSpec::ReservedCapacity(reservation) = spec;
        reservation.validate().map_err(ProduceError::InvalidSpec)?;

        let machines = self.inventory.list_machines().await?;
        let workloads = self.inventory.list_workloads().await?;

        let eligible = eligible_machines(&machines, &reservation.selector);
        debug!(
            eligible = eligible.len(),
            machines = machines.len(),
            workloads = workloads.len(),
            "reserved-capacity snapshot read"
        );

        let reservations = aggregate(&eligible, &workloads, &reservation.dimensions);
        Ok(reservations
            .iter()
            .map(|(dimension, r)| (dimension.clone(), format_reservation(r)))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    use capstan_core::{Machine, Quantity, ReservationSpec, Selector, Workload};
    use capstan_inventory::StaticInventory;

    const POOL_LABEL: &str = "capstan.io/pool";

    fn machine(id: &str, pool: &str, ready: bool, schedulable: bool) -> Machine {
        Machine {
            id: id.to_string(),
            labels: [(POOL_LABEL.to_string(), pool.to_string())].into(),
            allocatable: [
                ("cpu".to_string(), "16300m".parse().unwrap()),
                ("memory".to_string(), "128500Mi".parse().unwrap()),
                ("pods".to_string(), Quantity::count(50)),
            ]
            .into(),
            ready,
            schedulable,
        }
    }

    fn workload(id: &str, machine: &str, cpu: &str, memory: &str) -> Workload {
        Workload {
            id: id.to_string(),
            namespace: "default".to_string(),
            machine: Some(machine.to_string()),
            requests: [
                ("cpu".to_string(), cpu.parse().unwrap()),
                ("memory".to_string(), memory.parse().unwrap()),
            ]
            .into(),
        }
    }

    fn spec() -> ProducerSpec {
        ProducerSpec::ReservedCapacity(ReservationSpec {
            selector: Selector::new().with(POOL_LABEL, "workers"),
            dimensions: ["cpu", "memory", "pods"].iter().map(|d| d.to_string()).collect(),
        })
    }

    async fn worked_example_inventory() -> StaticInventory {
        let inventory = StaticInventory::new();
        inventory
            .set_machines(vec![
                machine("m1", "workers", true, true),
                machine("m2", "workers", true, true),
                machine("m3", "batch", true, true),
                machine("m4", "workers", true, true),
                machine("m5", "workers", false, true),
                machine("m6", "workers", true, false),
            ])
            .await;
        inventory
            .set_workloads(vec![
                // m1: 6.5/16.3 cores, 76/128 Gi.
                workload("w1", "m1", "1100m", "1Gi"),
                workload("w2", "m1", "2100m", "25Gi"),
                workload("w3", "m1", "3300m", "50Gi"),
                // m2: 1.1/16.3 cores, 1/128 Gi.
                workload("w4", "m2", "1100m", "1Gi"),
                // m3 does not match the selector; its demand is out of scope.
                workload("w5", "m3", "99", "99Gi"),
                // m4 is unallocated, m5 is not ready, m6 is cordoned.
            ])
            .await;
        inventory
    }

    #[tokio::test]
    async fn worked_example_status() {
        let producer = ReservedCapacityProducer::new(Arc::new(worked_example_inventory().await));

        let status = producer.compute(&spec()).await.unwrap();

        let expected: BTreeMap<String, String> = [
            ("cpu", "15.54%, 7600m/48900m"),
            ("memory", "20.45%, 77Gi/385500Mi"),
            ("pods", "2.67%, 4/150"),
        ]
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
        assert_eq!(status, expected);
    }

    #[tokio::test]
    async fn empty_pool_reports_nan_for_every_dimension() {
        let inventory = StaticInventory::new();
        let producer = ReservedCapacityProducer::new(Arc::new(inventory));

        let status = producer.compute(&spec()).await.unwrap();

        assert_eq!(status.len(), 3);
        for value in status.values() {
            assert_eq!(value, "NaN%, 0/0");
        }
    }

    #[tokio::test]
    async fn status_keys_equal_tracked_dimensions() {
        let producer = ReservedCapacityProducer::new(Arc::new(worked_example_inventory().await));

        let status = producer.compute(&spec()).await.unwrap();
        let keys: Vec<&str> = status.keys().map(|k| k.as_str()).collect();
        assert_eq!(keys, vec!["cpu", "memory", "pods"]);
    }

    #[tokio::test]
    async fn recomputation_is_idempotent() {
        let producer = ReservedCapacityProducer::new(Arc::new(worked_example_inventory().await));

        let first = producer.compute(&spec()).await.unwrap();
        let second = producer.compute(&spec()).await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn empty_dimension_set_is_invalid() {
        let producer = ReservedCapacityProducer::new(Arc::new(StaticInventory::new()));
        let spec = ProducerSpec::ReservedCapacity(ReservationSpec {
            selector: Selector::new().with(POOL_LABEL, "workers"),
            dimensions: Default::default(),
        });

        let err = producer.compute(&spec).await.unwrap_err();
        assert!(matches!(err, ProduceError::InvalidSpec(_)));
        assert!(!err.is_retryable());
    }
}

//! In-memory inventory backed by a shared snapshot.

use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::debug;

use capstan_core::{Machine, Workload};

use crate::client::{InventoryClient, InventoryResult};

/// TOML fixture shape for [`StaticInventory::from_file`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InventoryFixture {
    #[serde(default)]
    pub machines: Vec<Machine>,
    #[serde(default)]
    pub workloads: Vec<Workload>,
}

#[derive(Debug, Default)]
struct Snapshot {
    machines: Vec<Machine>,
    workloads: Vec<Workload>,
}

/// Clonable in-memory inventory for demos and tests.
///
/// Each list is replaced wholesale, so a read observes either the old or
/// the new list, never a partial write.
#[derive(Clone, Default)]
pub struct StaticInventory {
    inner: Arc<RwLock<Snapshot>>,
}

impl StaticInventory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_fixture(fixture: InventoryFixture) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Snapshot {
                machines: fixture.machines,
                workloads: fixture.workloads,
            })),
        }
    }

    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading inventory fixture {}", path.display()))?;
        let fixture: InventoryFixture = toml::from_str(&content)
            .with_context(|| format!("parsing inventory fixture {}", path.display()))?;
        debug!(
            machines = fixture.machines.len(),
            workloads = fixture.workloads.len(),
            "inventory fixture loaded"
        );
        Ok(Self::from_fixture(fixture))
    }

    pub async fn set_machines(&self, machines: Vec<Machine>) {
        self.inner.write().await.machines = machines;
    }

    pub async fn set_workloads(&self, workloads: Vec<Workload>) {
        self.inner.write().await.workloads = workloads;
    }
}

#[async_trait]
impl InventoryClient for StaticInventory {
    async fn list_machines(&self) -> InventoryResult<Vec<Machine>> {
        Ok(self.inner.read().await.machines.clone())
    }

    async fn list_workloads(&self) -> InventoryResult<Vec<Workload>> {
        Ok(self.inner.read().await.workloads.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[tokio::test]
    async fn set_and_list_round_trip() {
        let inventory = StaticInventory::new();
        assert!(inventory.list_machines().await.unwrap().is_empty());

        let machine: Machine =
            toml::from_str("id = \"m1\"\nallocatable = { cpu = \"16300m\" }\n").unwrap();
        inventory.set_machines(vec![machine.clone()]).await;

        assert_eq!(inventory.list_machines().await.unwrap(), vec![machine]);
    }

    #[tokio::test]
    async fn fixture_file_loads_machines_and_workloads() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
[[machines]]
id = "m1"
labels = {{ "capstan.io/pool" = "workers" }}
allocatable = {{ cpu = "16300m", memory = "128500Mi", pods = 50 }}

[[machines]]
id = "m2"
ready = false

[[workloads]]
id = "w1"
namespace = "default"
machine = "m1"
requests = {{ cpu = "1100m", memory = "1Gi" }}

[[workloads]]
id = "w2"
namespace = "default"
"#
        )
        .unwrap();

        let inventory = StaticInventory::from_file(file.path()).unwrap();
        let machines = inventory.list_machines().await.unwrap();
        let workloads = inventory.list_workloads().await.unwrap();

        assert_eq!(machines.len(), 2);
        assert!(machines[0].ready && machines[0].schedulable);
        assert!(!machines[1].ready);
        assert_eq!(workloads.len(), 2);
        assert_eq!(workloads[0].machine.as_deref(), Some("m1"));
        assert!(workloads[1].machine.is_none());
    }

    #[test]
    fn missing_fixture_is_an_error() {
        assert!(StaticInventory::from_file(Path::new("/nonexistent/inventory.toml")).is_err());
    }
}

//! Capacity and usage aggregation.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use capstan_core::{Machine, Quantity, Workload};

/// Dimension that accounts one slot per bound workload.
pub const WORKLOAD_SLOTS: &str = "pods";

/// Exact (used, total) sums for one dimension.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Reservation {
    pub used: Quantity,
    pub total: Quantity,
}

impl Reservation {
    pub const fn zero() -> Self {
        Self {
            used: Quantity::zero(),
            total: Quantity::zero(),
        }
    }
}

/// Sum per-dimension reservations over the eligible machines and the
/// workloads bound to them.
///
/// Workloads bound to machines outside the eligible set model out-of-scope
/// capacity and are ignored entirely; unbound workloads never contribute.
/// Dimensions aggregate independently, and an empty eligible set yields
/// zero/zero for every dimension. All accumulation is scaled-integer.
pub fn aggregate(
    eligible: &[&Machine],
    workloads: &[Workload],
    dimensions: &BTreeSet<String>,
) -> BTreeMap<String, Reservation> {
    let mut reservations: BTreeMap<String, Reservation> = dimensions
        .iter()
        .map(|dimension| (dimension.clone(), Reservation::zero()))
        .collect();

    let members: HashSet<&str> = eligible.iter().map(|m| m.id.as_str()).collect();

    for machine in eligible {
        for (dimension, reservation) in reservations.iter_mut() {
            if let Some(capacity) = machine.allocatable.get(dimension) {
                reservation.total = reservation.total.saturating_add(capacity);
            }
        }
    }

    for workload in workloads {
        let Some(machine) = workload.machine.as_deref() else {
            continue;
        };
        if !members.contains(machine) {
            continue;
        }
        for (dimension, reservation) in reservations.iter_mut() {
            if dimension.as_str() == WORKLOAD_SLOTS {
                reservation.used = reservation.used.saturating_add(&Quantity::count(1));
            } else if let Some(request) = workload.requests.get(dimension) {
                reservation.used = reservation.used.saturating_add(request);
            }
        }
    }

    reservations
}

#[cfg(test)]
mod tests {
    use super::*;

    fn machine(id: &str, cpu: &str, pods: i64) -> Machine {
        Machine {
            id: id.to_string(),
            labels: Default::default(),
            allocatable: [
                ("cpu".to_string(), cpu.parse().unwrap()),
                ("pods".to_string(), Quantity::count(pods)),
            ]
            .into(),
            ready: true,
            schedulable: true,
        }
    }

    fn workload(id: &str, machine: Option<&str>, cpu: &str) -> Workload {
        Workload {
            id: id.to_string(),
            namespace: "default".to_string(),
            machine: machine.map(|m| m.to_string()),
            requests: [("cpu".to_string(), cpu.parse().unwrap())].into(),
        }
    }

    fn dimensions(names: &[&str]) -> BTreeSet<String> {
        names.iter().map(|d| d.to_string()).collect()
    }

    #[test]
    fn sums_capacity_and_bound_requests() {
        let m1 = machine("m1", "16300m", 50);
        let m2 = machine("m2", "16300m", 50);
        let eligible = vec![&m1, &m2];
        let workloads = vec![
            workload("w1", Some("m1"), "1100m"),
            workload("w2", Some("m2"), "2100m"),
        ];

        let result = aggregate(&eligible, &workloads, &dimensions(&["cpu", "pods"]));

        assert_eq!(result["cpu"].total.to_string(), "32600m");
        assert_eq!(result["cpu"].used.to_string(), "3200m");
        assert_eq!(result["pods"].total.to_string(), "100");
        assert_eq!(result["pods"].used.to_string(), "2");
    }

    #[test]
    fn excluded_and_unbound_workloads_never_contribute() {
        let m1 = machine("m1", "16300m", 50);
        let eligible = vec![&m1];
        let workloads = vec![
            workload("w1", Some("m1"), "1100m"),
            workload("w2", Some("m-excluded"), "99"),
            workload("w3", None, "99"),
        ];

        let result = aggregate(&eligible, &workloads, &dimensions(&["cpu", "pods"]));

        assert_eq!(result["cpu"].used.to_string(), "1100m");
        assert_eq!(result["pods"].used.to_string(), "1");
    }

    #[test]
    fn machine_without_workloads_contributes_capacity_only() {
        let m1 = machine("m1", "16300m", 50);
        let eligible = vec![&m1];

        let result = aggregate(&eligible, &[], &dimensions(&["cpu"]));

        assert_eq!(result["cpu"].total.to_string(), "16300m");
        assert!(result["cpu"].used.is_zero());
    }

    #[test]
    fn empty_eligible_set_is_all_zero() {
        let workloads = vec![workload("w1", Some("m1"), "1100m")];
        let result = aggregate(&[], &workloads, &dimensions(&["cpu", "memory", "pods"]));

        for reservation in result.values() {
            assert!(reservation.used.is_zero());
            assert!(reservation.total.is_zero());
        }
    }

    #[test]
    fn missing_dimension_on_machine_adds_nothing() {
        let mut m1 = machine("m1", "16300m", 50);
        m1.allocatable.remove("pods");
        let eligible = vec![&m1];

        let result = aggregate(&eligible, &[], &dimensions(&["pods"]));
        assert!(result["pods"].total.is_zero());
    }

    #[test]
    fn grouping_machines_is_associative() {
        let machines: Vec<Machine> =
            (0..6).map(|i| machine(&format!("m{i}"), "16300m", 50)).collect();
        let workloads: Vec<Workload> = (0..6)
            .map(|i| workload(&format!("w{i}"), Some(&format!("m{i}")), "1100m"))
            .collect();
        let dims = dimensions(&["cpu", "pods"]);

        let all: Vec<&Machine> = machines.iter().collect();
        let whole = aggregate(&all, &workloads, &dims);

        // Aggregate two halves separately and add the subtotals.
        let (left, right) = all.split_at(3);
        let a = aggregate(left, &workloads, &dims);
        let b = aggregate(right, &workloads, &dims);

        for dimension in &dims {
            let used = a[dimension].used.saturating_add(&b[dimension].used);
            let total = a[dimension].total.saturating_add(&b[dimension].total);
            assert_eq!(used, whole[dimension].used);
            assert_eq!(total, whole[dimension].total);
        }
    }
}

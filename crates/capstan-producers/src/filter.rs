//! Machine selection.

use capstan_core::{Machine, Selector};

/// Select machines eligible to back a reservation.
///
/// A machine is eligible iff it matches the selector, reports ready, and
/// is schedulable; the conjunction is strict. Output order follows input
/// order, which callers must not rely on.
pub fn eligible_machines<'a>(machines: &'a [Machine], selector: &Selector) -> Vec<&'a Machine> {
    machines
        .iter()
        .filter(|m| selector.matches(&m.labels) && m.ready && m.schedulable)
        .collect()
}

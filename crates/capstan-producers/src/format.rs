//! Status string rendering.

use crate::aggregate::Reservation;

/// Render one dimension's reservation as `"<pct>%, <used>/<total>"`.
///
/// The percentage carries exactly two decimals. Zero capacity renders the
/// literal `"NaN%, 0/0"` so an empty pool is a defined value, not an
/// error. Used and total keep the scale carried by the aggregated sums;
/// they are never re-derived to a nicer unit.
pub fn format_reservation(reservation: &Reservation) -> String {
    if reservation.total.is_zero() {
        return "NaN%, 0/0".to_string();
    }
    let pct = 100.0 * reservation.used.ratio_of(&reservation.total);
    format!("{pct:.2}%, {}/{}", reservation.used, reservation.total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use capstan_core::Quantity;

    fn reservation(used: &str, total: &str) -> Reservation {
        Reservation {
            used: used.parse().unwrap(),
            total: total.parse().unwrap(),
        }
    }

    #[test]
    fn zero_capacity_renders_nan() {
        assert_eq!(
            format_reservation(&Reservation::zero()),
            "NaN%, 0/0"
        );
        // Even with nonzero usage, zero capacity is the degenerate value.
        let r = Reservation {
            used: Quantity::count(4),
            total: Quantity::zero(),
        };
        assert_eq!(format_reservation(&r), "NaN%, 0/0");
    }

    #[test]
    fn full_pool_renders_one_hundred() {
        assert_eq!(format_reservation(&reservation("150", "150")), "100.00%, 150/150");
    }

    #[test]
    fn idle_pool_renders_zero_used() {
        assert_eq!(
            format_reservation(&reservation("0", "48900m")),
            "0.00%, 0/48900m"
        );
    }

    #[test]
    fn worked_example_strings() {
        assert_eq!(
            format_reservation(&reservation("7600m", "48900m")),
            "15.54%, 7600m/48900m"
        );
        assert_eq!(
            format_reservation(&reservation("77Gi", "385500Mi")),
            "20.45%, 77Gi/385500Mi"
        );
        // 4/150 rounds to nearest, not down.
        assert_eq!(format_reservation(&reservation("4", "150")), "2.67%, 4/150");
    }
}

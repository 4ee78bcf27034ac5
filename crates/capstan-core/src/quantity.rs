//! Exact resource quantities.
//!
//! A [`Quantity`] is an integer value paired with a [`Scale`] (milli,
//! unit, decimal k/M/G/T, or binary Ki/Mi/Gi/Ti). All arithmetic runs on
//! integer milli-units, so summing allocatable capacity and workload
//! requests never accumulates floating-point drift. Sums keep the finest
//! contributing scale: `1Gi + 25Gi` stays in `Gi`, while a `Mi` total is
//! rendered in `Mi` even when it happens to be a whole number of `Gi`.

use std::fmt;
use std::str::FromStr;

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// Errors from parsing quantity literals.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum QuantityError {
    #[error("invalid quantity literal: {0:?}")]
    Invalid(String),

    #[error("quantity fraction is not exactly representable: {0:?}")]
    Inexact(String),
}

/// Unit scale of a quantity value.
///
/// Factors are expressed in milli-units, the finest scale supported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scale {
    /// `m`, one thousandth of a unit (e.g. millicores).
    Milli,
    /// Bare units (counts, whole cores).
    One,
    /// `k`, 10^3.
    Kilo,
    /// `M`, 10^6.
    Mega,
    /// `G`, 10^9.
    Giga,
    /// `T`, 10^12.
    Tera,
    /// `Ki`, 2^10.
    Ki,
    /// `Mi`, 2^20.
    Mi,
    /// `Gi`, 2^30.
    Gi,
    /// `Ti`, 2^40.
    Ti,
}

impl Scale {
    /// All scales, coarsest first.
    const DESCENDING: [Scale; 10] = [
        Scale::Ti,
        Scale::Tera,
        Scale::Gi,
        Scale::Giga,
        Scale::Mi,
        Scale::Mega,
        Scale::Ki,
        Scale::Kilo,
        Scale::One,
        Scale::Milli,
    ];

    /// Scale factor in milli-units.
    const fn factor(self) -> i128 {
        match self {
            Scale::Milli => 1,
            Scale::One => 1_000,
            Scale::Kilo => 1_000_000,
            Scale::Mega => 1_000_000_000,
            Scale::Giga => 1_000_000_000_000,
            Scale::Tera => 1_000_000_000_000_000,
            Scale::Ki => 1_024_000,
            Scale::Mi => 1_048_576_000,
            Scale::Gi => 1_073_741_824_000,
            Scale::Ti => 1_099_511_627_776_000,
        }
    }

    const fn suffix(self) -> &'static str {
        match self {
            Scale::Milli => "m",
            Scale::One => "",
            Scale::Kilo => "k",
            Scale::Mega => "M",
            Scale::Giga => "G",
            Scale::Tera => "T",
            Scale::Ki => "Ki",
            Scale::Mi => "Mi",
            Scale::Gi => "Gi",
            Scale::Ti => "Ti",
        }
    }

    fn from_suffix(s: &str) -> Option<Scale> {
        match s {
            "m" => Some(Scale::Milli),
            "" => Some(Scale::One),
            "k" => Some(Scale::Kilo),
            "M" => Some(Scale::Mega),
            "G" => Some(Scale::Giga),
            "T" => Some(Scale::Tera),
            "Ki" => Some(Scale::Ki),
            "Mi" => Some(Scale::Mi),
            "Gi" => Some(Scale::Gi),
            "Ti" => Some(Scale::Ti),
            _ => None,
        }
    }
}

/// An exact resource quantity: integer value at a [`Scale`].
///
/// Equality and ordering compare magnitudes, so `1Gi == 1024Mi`. The scale
/// is display state: it records the unit the value was measured in and is
/// preserved through sums rather than re-derived.
#[derive(Debug, Clone, Copy)]
pub struct Quantity {
    value: i64,
    scale: Scale,
}

impl Quantity {
    pub const fn new(value: i64, scale: Scale) -> Self {
        Self { value, scale }
    }

    /// A bare count (unit scale).
    pub const fn count(value: i64) -> Self {
        Self::new(value, Scale::One)
    }

    pub const fn zero() -> Self {
        Self::count(0)
    }

    pub const fn is_zero(&self) -> bool {
        self.value == 0
    }

    /// Magnitude in milli-units.
    pub const fn canonical_millis(&self) -> i128 {
        self.value as i128 * self.scale.factor()
    }

    /// Sum preserving the finest contributing scale.
    ///
    /// Zero-valued operands are identity and never refine the result's
    /// scale. When the finer operand's scale does not divide the sum
    /// exactly (decimal and binary scales mixed), the result falls down the
    /// scale ladder to the coarsest scale that does.
    pub fn saturating_add(&self, other: &Quantity) -> Quantity {
        if self.value == 0 {
            return *other;
        }
        if other.value == 0 {
            return *self;
        }
        let sum = self.canonical_millis() + other.canonical_millis();
        let cap = if self.scale.factor() <= other.scale.factor() {
            self.scale
        } else {
            other.scale
        };
        Self::reduce(sum, cap)
    }

    /// Ratio of this quantity to `total`, for display-time percentages only.
    pub fn ratio_of(&self, total: &Quantity) -> f64 {
        self.canonical_millis() as f64 / total.canonical_millis() as f64
    }

    /// Represent `millis` at the coarsest scale no coarser than `cap` that
    /// divides it exactly. Milli always divides, so this is total.
    fn reduce(millis: i128, cap: Scale) -> Quantity {
        for scale in Scale::DESCENDING {
            if scale.factor() > cap.factor() {
                continue;
            }
            if millis % scale.factor() == 0 {
                return Quantity::new(clamp_i64(millis / scale.factor()), scale);
            }
        }
        Quantity::new(clamp_i64(millis), Scale::Milli)
    }
}

fn clamp_i64(v: i128) -> i64 {
    v.clamp(i64::MIN as i128, i64::MAX as i128) as i64
}

impl PartialEq for Quantity {
    fn eq(&self, other: &Self) -> bool {
        self.canonical_millis() == other.canonical_millis()
    }
}

impl Eq for Quantity {}

impl PartialOrd for Quantity {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Quantity {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.canonical_millis().cmp(&other.canonical_millis())
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.value == 0 {
            return write!(f, "0");
        }
        write!(f, "{}{}", self.value, self.scale.suffix())
    }
}

impl FromStr for Quantity {
    type Err = QuantityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let split = trimmed
            .find(|c: char| !c.is_ascii_digit() && c != '.')
            .unwrap_or(trimmed.len());
        let (number, suffix) = trimmed.split_at(split);
        let scale =
            Scale::from_suffix(suffix).ok_or_else(|| QuantityError::Invalid(s.to_string()))?;
        if number.is_empty() {
            return Err(QuantityError::Invalid(s.to_string()));
        }

        match number.split_once('.') {
            None => {
                let value: i64 = number
                    .parse()
                    .map_err(|_| QuantityError::Invalid(s.to_string()))?;
                Ok(Quantity::new(value, scale))
            }
            Some((int_part, frac_part)) => {
                if int_part.is_empty() || frac_part.is_empty() || frac_part.len() > 9 {
                    return Err(QuantityError::Invalid(s.to_string()));
                }
                let int: i128 = int_part
                    .parse()
                    .map_err(|_| QuantityError::Invalid(s.to_string()))?;
                let frac: i128 = frac_part
                    .parse()
                    .map_err(|_| QuantityError::Invalid(s.to_string()))?;
                let pow = 10i128.pow(frac_part.len() as u32);
                let scaled_frac = frac * scale.factor();
                if scaled_frac % pow != 0 {
                    return Err(QuantityError::Inexact(s.to_string()));
                }
                let millis = int * scale.factor() + scaled_frac / pow;
                Ok(Self::reduce(millis, scale))
            }
        }
    }
}

impl Serialize for Quantity {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Quantity {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(QuantityVisitor)
    }
}

struct QuantityVisitor;

impl Visitor<'_> for QuantityVisitor {
    type Value = Quantity;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a quantity string like \"16300m\" or a bare integer")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Quantity, E> {
        v.parse().map_err(de::Error::custom)
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Quantity, E> {
        Ok(Quantity::count(v))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Quantity, E> {
        i64::try_from(v)
            .map(Quantity::count)
            .map_err(|_| de::Error::custom("quantity out of range"))
    }
}

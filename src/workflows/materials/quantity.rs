use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Units a material can be stocked and consumed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaterialUnit {
    Piece,
    Meter,
    Kilogram,
    Liter,
    Roll,
    Set,
}

impl MaterialUnit {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Piece => "pc",
            Self::Meter => "m",
            Self::Kilogram => "kg",
            Self::Liter => "l",
            Self::Roll => "roll",
            Self::Set => "set",
        }
    }
}

/// Amount plus unit. Two quantities are equal only when both amount and
/// unit match; arithmetic across different units is refused.
///
/// Construction requires a strictly positive amount. Internal ledger
/// arithmetic may still legitimately land on zero (stock drained to
/// nothing), so `subtract` builds the result directly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialQuantity {
    amount: f64,
    unit: MaterialUnit,
}

impl MaterialQuantity {
    pub fn new(amount: f64, unit: MaterialUnit) -> Result<Self, StockError> {
        if amount <= 0.0 {
            return Err(StockError::NonPositiveQuantity { amount });
        }
        Ok(Self { amount, unit })
    }

    pub fn amount(&self) -> f64 {
        self.amount
    }

    pub fn unit(&self) -> MaterialUnit {
        self.unit
    }

    pub fn is_empty(&self) -> bool {
        self.amount <= 0.0
    }

    pub fn has_stock(&self) -> bool {
        self.amount > 0.0
    }

    pub fn add(&self, other: &Self) -> Result<Self, StockError> {
        self.require_same_unit(other)?;
        Ok(Self {
            amount: self.amount + other.amount,
            unit: self.unit,
        })
    }

    pub fn subtract(&self, other: &Self) -> Result<Self, StockError> {
        self.require_same_unit(other)?;
        if self.amount < other.amount {
            return Err(StockError::Insufficient {
                requested: other.amount,
                available: self.amount,
            });
        }
        Ok(Self {
            amount: self.amount - other.amount,
            unit: self.unit,
        })
    }

    /// Unit-checked comparison; refused across different units.
    pub fn try_cmp(&self, other: &Self) -> Result<Ordering, StockError> {
        self.require_same_unit(other)?;
        Ok(self
            .amount
            .partial_cmp(&other.amount)
            .unwrap_or(Ordering::Equal))
    }

    fn require_same_unit(&self, other: &Self) -> Result<(), StockError> {
        if self.unit != other.unit {
            return Err(StockError::UnitMismatch {
                left: self.unit,
                right: other.unit,
            });
        }
        Ok(())
    }
}

impl fmt::Display for MaterialQuantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.amount, self.unit.label())
    }
}

/// Stock and quantity rule violations.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StockError {
    #[error("material quantity must be greater than zero (got {amount})")]
    NonPositiveQuantity { amount: f64 },
    #[error("quantity units differ ({} vs {})", left.label(), right.label())]
    UnitMismatch {
        left: MaterialUnit,
        right: MaterialUnit,
    },
    #[error("insufficient stock: requested {requested}, available {available}")]
    Insufficient { requested: f64, available: f64 },
}

impl StockError {
    /// Stable reason code for mapping to an external error representation.
    pub const fn code(&self) -> &'static str {
        match self {
            Self::NonPositiveQuantity { .. } => "material.quantity.non_positive",
            Self::UnitMismatch { .. } => "material.quantity.unit_mismatch",
            Self::Insufficient { .. } => "material.stock.insufficient",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pieces(amount: f64) -> MaterialQuantity {
        MaterialQuantity::new(amount, MaterialUnit::Piece).expect("positive quantity")
    }

    #[test]
    fn rejects_non_positive_amounts() {
        for amount in [0.0, -1.0, -0.25] {
            let err = MaterialQuantity::new(amount, MaterialUnit::Meter)
                .expect_err("non-positive amount must be refused");
            assert_eq!(err.code(), "material.quantity.non_positive");
        }
    }

    #[test]
    fn add_then_subtract_round_trips() {
        let a = pieces(7.5);
        let b = pieces(2.25);
        let sum = a.add(&b).expect("same unit");
        let back = sum.subtract(&b).expect("same unit");
        assert_eq!(back, a);
    }

    #[test]
    fn subtract_fails_when_larger_than_available() {
        let err = pieces(1.0).subtract(&pieces(2.0)).expect_err("overdraw");
        assert_eq!(err.code(), "material.stock.insufficient");
    }

    #[test]
    fn subtract_may_land_on_zero() {
        let zero = pieces(3.0).subtract(&pieces(3.0)).expect("drains to zero");
        assert!(zero.is_empty());
        assert!(!zero.has_stock());
    }

    #[test]
    fn arithmetic_refuses_mixed_units() {
        let meters = MaterialQuantity::new(5.0, MaterialUnit::Meter).expect("valid");
        let rolls = MaterialQuantity::new(5.0, MaterialUnit::Roll).expect("valid");
        assert!(matches!(
            meters.add(&rolls),
            Err(StockError::UnitMismatch { .. })
        ));
        assert!(matches!(
            meters.subtract(&rolls),
            Err(StockError::UnitMismatch { .. })
        ));
        assert!(matches!(
            meters.try_cmp(&rolls),
            Err(StockError::UnitMismatch { .. })
        ));
    }

    #[test]
    fn equality_requires_amount_and_unit() {
        let a = MaterialQuantity::new(2.0, MaterialUnit::Kilogram).expect("valid");
        let b = MaterialQuantity::new(2.0, MaterialUnit::Kilogram).expect("valid");
        let c = MaterialQuantity::new(2.0, MaterialUnit::Liter).expect("valid");
        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}

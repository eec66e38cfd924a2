//! Weighted-average costing.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use fuelops_core::money::ratio_or;
use fuelops_core::{DomainError, DomainResult, Entity, GradeId, Liters, Money, PurchaseId};

/// New average unit cost after blending `qty` liters at `unit_cost` into `quantity`
/// liters held at `avg_cost`.
///
/// A zero (or negative) combined quantity falls back to the incoming unit cost. A
/// zero-quantity purchase leaves the average unchanged.
pub fn weighted_average_cost(quantity: Liters, avg_cost: Money, qty: Liters, unit_cost: Money) -> Money {
    if qty.is_zero() {
        return avg_cost;
    }

    let total_quantity = quantity + qty;
    if total_quantity <= Decimal::ZERO {
        return unit_cost;
    }

    let total_value = quantity * avg_cost + qty * unit_cost;
    ratio_or(total_value, total_quantity, unit_cost)
}

/// A fuel delivery. Immutable once recorded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Purchase {
    pub id: PurchaseId,
    pub grade_id: GradeId,
    pub date: NaiveDate,
    pub quantity: Liters,
    pub total_value: Money,
    /// `total_value / quantity`, derived at creation.
    pub unit_cost: Money,
}

impl Purchase {
    pub fn new(
        id: PurchaseId,
        grade_id: GradeId,
        date: NaiveDate,
        quantity: Liters,
        total_value: Money,
    ) -> DomainResult<Self> {
        if quantity <= Decimal::ZERO {
            return Err(DomainError::invalid_input(format!(
                "purchase {id}: quantity must be positive (got {quantity})"
            )));
        }
        if total_value < Decimal::ZERO {
            return Err(DomainError::invalid_input(format!(
                "purchase {id}: total value cannot be negative (got {total_value})"
            )));
        }

        Ok(Self {
            id,
            grade_id,
            date,
            quantity,
            total_value,
            unit_cost: ratio_or(total_value, quantity, Decimal::ZERO),
        })
    }
}

impl Entity for Purchase {
    type Id = PurchaseId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

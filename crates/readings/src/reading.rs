use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use fuelops_core::{DomainError, DomainResult, Entity, GradeId, Liters, Money, NozzleId, ReadingId, ShiftId};

/// Meter reading pair for one nozzle on one date/shift.
///
/// Stored exactly as entered: a reading whose final meter does not advance past the
/// initial one is kept, but contributes no sale (see [`ReadingOutcome::Invalid`]).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispenserReading {
    pub id: ReadingId,
    pub nozzle_id: NozzleId,
    pub grade_id: GradeId,
    pub shift_id: ShiftId,
    pub date: NaiveDate,
    pub initial_meter: Liters,
    pub final_meter: Liters,
    /// Price per liter in force when the reading was taken.
    pub price_per_liter: Money,
}

/// Natural key of a reading: one per nozzle per date per shift.
///
/// Saving a second reading with the same key overwrites the first.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ReadingKey {
    pub nozzle_id: NozzleId,
    pub date: NaiveDate,
    pub shift_id: ShiftId,
}

/// Why a reading produced no sale.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvalidReason {
    /// `final <= initial`: zero, negative, or not yet entered.
    MeterNotAdvanced,
    /// A negative unit price would turn the sale into negative revenue.
    NegativePrice,
}

impl core::fmt::Display for InvalidReason {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            InvalidReason::MeterNotAdvanced => f.write_str("final meter does not exceed initial meter"),
            InvalidReason::NegativePrice => f.write_str("price per liter is negative"),
        }
    }
}

/// Result of processing one reading. Invalid readings carry no liters or revenue at
/// all (absent, not zero).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ReadingOutcome {
    Valid { liters: Liters, revenue: Money },
    Invalid { reason: InvalidReason },
}

impl ReadingOutcome {
    pub fn liters(&self) -> Option<Liters> {
        match self {
            ReadingOutcome::Valid { liters, .. } => Some(*liters),
            ReadingOutcome::Invalid { .. } => None,
        }
    }

    pub fn revenue(&self) -> Option<Money> {
        match self {
            ReadingOutcome::Valid { revenue, .. } => Some(*revenue),
            ReadingOutcome::Invalid { .. } => None,
        }
    }

    pub fn is_valid(&self) -> bool {
        matches!(self, ReadingOutcome::Valid { .. })
    }
}

/// Convert a pair of meter values and a unit price into liters sold and revenue.
pub fn process_reading(initial: Liters, final_meter: Liters, price_per_liter: Money) -> ReadingOutcome {
    if final_meter <= initial {
        return ReadingOutcome::Invalid {
            reason: InvalidReason::MeterNotAdvanced,
        };
    }
    if price_per_liter < Decimal::ZERO {
        return ReadingOutcome::Invalid {
            reason: InvalidReason::NegativePrice,
        };
    }

    let liters = final_meter - initial;
    ReadingOutcome::Valid {
        liters,
        revenue: liters * price_per_liter,
    }
}

impl DispenserReading {
    pub fn key(&self) -> ReadingKey {
        ReadingKey {
            nozzle_id: self.nozzle_id,
            date: self.date,
            shift_id: self.shift_id,
        }
    }

    pub fn outcome(&self) -> ReadingOutcome {
        process_reading(self.initial_meter, self.final_meter, self.price_per_liter)
    }

    pub fn liters(&self) -> Option<Liters> {
        self.outcome().liters()
    }

    pub fn revenue(&self) -> Option<Money> {
        self.outcome().revenue()
    }

    /// Liters sold, or `InvalidInput` naming the reading.
    pub fn validate(&self) -> DomainResult<Liters> {
        match self.outcome() {
            ReadingOutcome::Valid { liters, .. } => Ok(liters),
            ReadingOutcome::Invalid { reason } => Err(DomainError::invalid_input(format!(
                "reading {}: {reason}",
                self.id
            ))),
        }
    }
}

impl Entity for DispenserReading {
    type Id = ReadingId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

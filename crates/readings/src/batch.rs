//! Multi-nozzle aggregation of readings into sales totals.

use std::collections::BTreeSet;

use rust_decimal::Decimal;
use serde::Serialize;

use fuelops_core::money::percent_of;
use fuelops_core::{GradeId, Liters, Money, NozzleId, ReadingId};

use crate::reading::{DispenserReading, InvalidReason, ReadingOutcome};

/// Sales of one fuel grade across all its nozzles.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GradeSales {
    pub grade_id: GradeId,
    pub liters: Liters,
    pub revenue: Money,
    pub nozzles: BTreeSet<NozzleId>,
    pub readings: usize,
}

impl GradeSales {
    fn new(grade_id: GradeId) -> Self {
        Self {
            grade_id,
            liters: Decimal::ZERO,
            revenue: Decimal::ZERO,
            nozzles: BTreeSet::new(),
            readings: 0,
        }
    }

    /// Realized price (revenue / liters), `None` when nothing was sold.
    pub fn average_price(&self) -> Option<Money> {
        if self.liters.is_zero() {
            None
        } else {
            Some(self.revenue / self.liters)
        }
    }
}

/// A reading excluded from every aggregate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedReading {
    pub reading_id: ReadingId,
    pub nozzle_id: NozzleId,
    pub reason: InvalidReason,
}

/// Totals over a set of readings (one shift, one day, or a whole period).
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct ReadingBatch {
    pub total_liters: Liters,
    pub total_revenue: Money,
    /// Per-grade sales in first-seen order.
    pub grades: Vec<GradeSales>,
    pub skipped: Vec<SkippedReading>,
    pub valid_readings: usize,
}

impl ReadingBatch {
    pub fn from_readings<'a, I>(readings: I) -> Self
    where
        I: IntoIterator<Item = &'a DispenserReading>,
    {
        let mut batch = ReadingBatch::default();
        for reading in readings {
            batch.push(reading);
        }
        batch
    }

    pub fn push(&mut self, reading: &DispenserReading) {
        match reading.outcome() {
            ReadingOutcome::Valid { liters, revenue } => {
                self.total_liters += liters;
                self.total_revenue += revenue;
                self.valid_readings += 1;

                let idx = match self.grades.iter().position(|g| g.grade_id == reading.grade_id) {
                    Some(idx) => idx,
                    None => {
                        self.grades.push(GradeSales::new(reading.grade_id));
                        self.grades.len() - 1
                    }
                };
                let grade = &mut self.grades[idx];
                grade.liters += liters;
                grade.revenue += revenue;
                grade.nozzles.insert(reading.nozzle_id);
                grade.readings += 1;
            }
            ReadingOutcome::Invalid { reason } => self.skipped.push(SkippedReading {
                reading_id: reading.id,
                nozzle_id: reading.nozzle_id,
                reason,
            }),
        }
    }

    pub fn grade(&self, grade_id: GradeId) -> Option<&GradeSales> {
        self.grades.iter().find(|g| g.grade_id == grade_id)
    }

    /// Liters sold for one grade (zero when the grade had no valid reading).
    pub fn liters_for(&self, grade_id: GradeId) -> Liters {
        self.grade(grade_id).map(|g| g.liters).unwrap_or(Decimal::ZERO)
    }

    /// Share of total revenue for one grade, in percent.
    pub fn revenue_share(&self, grade_id: GradeId) -> Decimal {
        let revenue = self.grade(grade_id).map(|g| g.revenue).unwrap_or(Decimal::ZERO);
        percent_of(revenue, self.total_revenue)
    }

    pub fn has_invalid_readings(&self) -> bool {
        !self.skipped.is_empty()
    }

    pub fn is_empty(&self) -> bool {
        self.valid_readings == 0 && self.skipped.is_empty()
    }
}

//! Closing computation: sales vs. received, variance classification and readiness.
//!
//! Precedence rules:
//! - sales: a figure already declared on the closing wins over the reading total;
//! - received: payment-method entries win over the attendants' declared totals.
//!
//! The raw variance always compares *gross* received against sales; fees only reduce
//! the net figures.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use fuelops_core::money::{percent_of, sum};
use fuelops_core::{AttendantId, Liters, Money};
use fuelops_readings::{DispenserReading, GradeSales, ReadingBatch, SkippedReading};

use crate::attendant::{AttendantSession, ReconciliationStatus, SessionKey};
use crate::closing::{ClosingFigures, ClosingStatus, ReceivedSource, SalesSource};
use crate::payment::PaymentEntry;

/// Thresholds for variance classification.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClosingPolicy {
    /// Absolute variance still considered balanced.
    pub tolerance: Money,
    /// Sales must exceed this before a near-total shortfall is read as missing payments.
    pub pending_sales_threshold: Money,
    /// Absolute floor of the "received is about zero" window.
    pub pending_match_window: Money,
    /// Relative part of the window, as a fraction of sales.
    pub pending_match_ratio: Decimal,
    /// Ceiling of the window, so a large day with a real shortfall stays divergent.
    pub pending_match_max: Money,
}

impl Default for ClosingPolicy {
    fn default() -> Self {
        Self {
            tolerance: Decimal::new(1, 2),
            pending_sales_threshold: Decimal::ONE_HUNDRED,
            pending_match_window: Decimal::new(5, 0),
            pending_match_ratio: Decimal::new(10, 2),
            pending_match_max: Decimal::ONE_HUNDRED,
        }
    }
}

impl ClosingPolicy {
    fn pending_window(&self, sales: Money) -> Money {
        let relative = (sales.abs() * self.pending_match_ratio).min(self.pending_match_max);
        self.pending_match_window.max(relative)
    }
}

/// Classify `received - sales` and return the status with the variance to display.
///
/// A balanced closing is always `Ok`. When sales are material and the received total
/// is close to zero, payments are taken as not yet entered: the status is `Pending`
/// and the displayed variance is zero.
pub fn classify_variance(sales: Money, received: Money, policy: &ClosingPolicy) -> (ClosingStatus, Money) {
    let variance = received - sales;
    if variance.is_zero() {
        return (ClosingStatus::Ok, variance);
    }

    if sales > policy.pending_sales_threshold && (variance + sales).abs() < policy.pending_window(sales) {
        return (ClosingStatus::Pending, Decimal::ZERO);
    }

    if variance.abs() > policy.tolerance {
        (ClosingStatus::Divergent, variance)
    } else {
        (ClosingStatus::Ok, variance)
    }
}

/// Why a closing cannot be closed yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum ReadinessBlocker {
    InvalidReadings { count: usize },
    NoReadings,
    NoAttendants,
    MissingAttendant { session: SessionKey },
    ZeroReconciled { session: SessionKey },
}

impl core::fmt::Display for ReadinessBlocker {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            ReadinessBlocker::InvalidReadings { count } => write!(f, "{count} invalid reading(s)"),
            ReadinessBlocker::NoReadings => f.write_str("no readings"),
            ReadinessBlocker::NoAttendants => f.write_str("no attendant sessions"),
            ReadinessBlocker::MissingAttendant { session } => write!(f, "session {session} has no attendant"),
            ReadinessBlocker::ZeroReconciled { session } => write!(f, "session {session} has no reconciled amount"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Readiness {
    pub blockers: Vec<ReadinessBlocker>,
}

impl Readiness {
    pub fn is_ready(&self) -> bool {
        self.blockers.is_empty()
    }

    pub fn describe(&self) -> String {
        self.blockers
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("; ")
    }

    fn evaluate(readings: &[DispenserReading], batch: &ReadingBatch, sessions: &[AttendantSession]) -> Self {
        let mut blockers = Vec::new();
        if batch.has_invalid_readings() {
            blockers.push(ReadinessBlocker::InvalidReadings {
                count: batch.skipped.len(),
            });
        }
        if readings.is_empty() {
            blockers.push(ReadinessBlocker::NoReadings);
        }
        if sessions.is_empty() {
            blockers.push(ReadinessBlocker::NoAttendants);
        }
        for session in sessions {
            if session.attendant_id.is_none() {
                blockers.push(ReadinessBlocker::MissingAttendant {
                    session: session.key.clone(),
                });
            }
            if !session.has_reconciled_amount() {
                blockers.push(ReadinessBlocker::ZeroReconciled {
                    session: session.key.clone(),
                });
            }
        }
        Self { blockers }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AttendantSummary {
    pub key: SessionKey,
    pub attendant_id: Option<AttendantId>,
    pub declared: Money,
    pub reconciled: Money,
    pub variance: Money,
    pub status: ReconciliationStatus,
}

impl From<&AttendantSession> for AttendantSummary {
    fn from(session: &AttendantSession) -> Self {
        Self {
            key: session.key.clone(),
            attendant_id: session.attendant_id,
            declared: session.declared_total(),
            reconciled: session.reconciled_amount(),
            variance: session.variance(),
            status: session.status,
        }
    }
}

/// Everything a closing is computed from.
#[derive(Debug, Clone, Copy, Default)]
pub struct ClosingInput<'a> {
    pub readings: &'a [DispenserReading],
    pub sessions: &'a [AttendantSession],
    pub payments: &'a [PaymentEntry],
    pub declared_sales: Option<Money>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClosingSummary {
    pub figures: ClosingFigures,
    /// `gross received - total sales`, never zeroed.
    pub raw_variance: Money,
    /// `|raw variance| / sales * 100`, 0 without sales.
    pub variance_percent: Decimal,
    pub total_liters: Liters,
    pub sales_from_readings: Money,
    pub grades: Vec<GradeSales>,
    pub skipped: Vec<SkippedReading>,
    pub attendants: Vec<AttendantSummary>,
    pub readiness: Readiness,
}

#[derive(Debug, Clone, Default)]
pub struct ClosingAggregator {
    policy: ClosingPolicy,
}

impl ClosingAggregator {
    pub fn new(policy: ClosingPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &ClosingPolicy {
        &self.policy
    }

    pub fn aggregate(&self, input: ClosingInput<'_>) -> ClosingSummary {
        let batch = ReadingBatch::from_readings(input.readings);

        let (total_sales, sales_source) = match input.declared_sales {
            Some(declared) => (declared, SalesSource::Declared),
            None => (batch.total_revenue, SalesSource::Readings),
        };

        let (gross_received, received_source, fee_total, non_cash_net_received) = if input.payments.is_empty() {
            (
                sum(input.sessions.iter().map(AttendantSession::declared_total)),
                ReceivedSource::Attendants,
                Decimal::ZERO,
                sum(input.sessions.iter().map(|s| s.amounts.non_cash())),
            )
        } else {
            (
                sum(input.payments.iter().map(|p| p.amount)),
                ReceivedSource::PaymentMethods,
                sum(input.payments.iter().map(PaymentEntry::fee)),
                sum(input
                    .payments
                    .iter()
                    .filter(|p| !p.channel.is_cash())
                    .map(PaymentEntry::net)),
            )
        };

        let raw_variance = gross_received - total_sales;
        let (status, variance) = classify_variance(total_sales, gross_received, &self.policy);

        ClosingSummary {
            figures: ClosingFigures {
                total_sales,
                sales_source,
                gross_received,
                received_source,
                fee_total,
                net_received: gross_received - fee_total,
                non_cash_net_received,
                variance,
                status,
            },
            raw_variance,
            variance_percent: percent_of(raw_variance.abs(), total_sales),
            total_liters: batch.total_liters,
            sales_from_readings: batch.total_revenue,
            readiness: Readiness::evaluate(input.readings, &batch, input.sessions),
            attendants: input.sessions.iter().map(AttendantSummary::from).collect(),
            grades: batch.grades,
            skipped: batch.skipped,
        }
    }
}

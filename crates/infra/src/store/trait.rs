use std::sync::Arc;

use thiserror::Error;

use fuelops_analytics::{Debt, Expense};
use fuelops_closing::{AttendantSession, ClosingKey, PaymentEntry, ShiftClosing};
use fuelops_core::{AttendantId, ClosingId, DateRange, ExpectedVersion, GradeId, PurchaseId};
use fuelops_inventory::{FuelGrade, InventoryPosition, Purchase};
use fuelops_readings::{DispenserReading, ReadingKey};

/// Storage failure.
///
/// The engine never retries; `Unavailable` is handed to the caller as-is.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("storage unavailable: {0}")]
    Unavailable(String),

    /// Compare-and-swap write lost against a concurrent writer.
    #[error("version conflict: {0}")]
    Conflict(String),

    /// The backend refused the record (constraint violation, duplicate key...).
    #[error("rejected by storage: {0}")]
    Rejected(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Storage collaborator.
///
/// Empty results mean "no data", never an error. Implementations must be safe to
/// share across threads; they give no transactional guarantee across calls.
pub trait FuelStore: Send + Sync {
    fn list_readings(&self, range: DateRange, grade_id: Option<GradeId>) -> StoreResult<Vec<DispenserReading>>;
    fn get_reading(&self, key: &ReadingKey) -> StoreResult<Option<DispenserReading>>;
    /// Insert or overwrite by natural key; returns the reading it replaced.
    fn upsert_reading(&self, reading: &DispenserReading) -> StoreResult<Option<DispenserReading>>;
    fn delete_reading(&self, key: &ReadingKey) -> StoreResult<()>;

    /// Purchases dated on or after `from`, in arrival order.
    fn list_purchases(&self, from: chrono::NaiveDate) -> StoreResult<Vec<Purchase>>;
    /// Idempotent per purchase id; returns `false` when it was already recorded.
    fn record_purchase(&self, purchase: &Purchase) -> StoreResult<bool>;
    fn purchase_exists(&self, id: PurchaseId) -> StoreResult<bool>;

    fn get_grade(&self, id: GradeId) -> StoreResult<Option<FuelGrade>>;
    fn list_grades(&self) -> StoreResult<Vec<FuelGrade>>;

    fn get_inventory(&self, grade_id: GradeId) -> StoreResult<Option<InventoryPosition>>;
    /// Compare-and-swap on the stored version (an absent position counts as version 0).
    fn upsert_inventory(&self, position: &InventoryPosition, expected_version: ExpectedVersion) -> StoreResult<()>;

    fn get_closing(&self, key: &ClosingKey) -> StoreResult<Option<ShiftClosing>>;
    /// One record per key: a second upsert for the same key replaces the first.
    fn upsert_closing(&self, closing: &ShiftClosing, expected_version: ExpectedVersion) -> StoreResult<()>;
    fn list_closings(&self, range: DateRange) -> StoreResult<Vec<ShiftClosing>>;

    /// Replace the session rows of a closing; draft rows come back with durable ids.
    /// Rows missing from `rows` are removed.
    fn replace_attendant_sessions(
        &self,
        closing_id: ClosingId,
        rows: &[AttendantSession],
    ) -> StoreResult<Vec<AttendantSession>>;
    fn list_attendant_sessions(&self, closing_id: ClosingId) -> StoreResult<Vec<AttendantSession>>;
    fn attendant_exists(&self, id: AttendantId) -> StoreResult<bool>;

    fn replace_payment_entries(&self, closing_id: ClosingId, entries: &[PaymentEntry]) -> StoreResult<()>;
    fn list_payment_entries(&self, closing_id: ClosingId) -> StoreResult<Vec<PaymentEntry>>;

    fn list_pending_debts(&self) -> StoreResult<Vec<Debt>>;
    fn list_expenses(&self, range: DateRange) -> StoreResult<Vec<Expense>>;
}

impl<S> FuelStore for Arc<S>
where
    S: FuelStore + ?Sized,
{
    fn list_readings(&self, range: DateRange, grade_id: Option<GradeId>) -> StoreResult<Vec<DispenserReading>> {
        (**self).list_readings(range, grade_id)
    }

    fn get_reading(&self, key: &ReadingKey) -> StoreResult<Option<DispenserReading>> {
        (**self).get_reading(key)
    }

    fn upsert_reading(&self, reading: &DispenserReading) -> StoreResult<Option<DispenserReading>> {
        (**self).upsert_reading(reading)
    }

    fn delete_reading(&self, key: &ReadingKey) -> StoreResult<()> {
        (**self).delete_reading(key)
    }

    fn list_purchases(&self, from: chrono::NaiveDate) -> StoreResult<Vec<Purchase>> {
        (**self).list_purchases(from)
    }

    fn record_purchase(&self, purchase: &Purchase) -> StoreResult<bool> {
        (**self).record_purchase(purchase)
    }

    fn purchase_exists(&self, id: PurchaseId) -> StoreResult<bool> {
        (**self).purchase_exists(id)
    }

    fn get_grade(&self, id: GradeId) -> StoreResult<Option<FuelGrade>> {
        (**self).get_grade(id)
    }

    fn list_grades(&self) -> StoreResult<Vec<FuelGrade>> {
        (**self).list_grades()
    }

    fn get_inventory(&self, grade_id: GradeId) -> StoreResult<Option<InventoryPosition>> {
        (**self).get_inventory(grade_id)
    }

    fn upsert_inventory(&self, position: &InventoryPosition, expected_version: ExpectedVersion) -> StoreResult<()> {
        (**self).upsert_inventory(position, expected_version)
    }

    fn get_closing(&self, key: &ClosingKey) -> StoreResult<Option<ShiftClosing>> {
        (**self).get_closing(key)
    }

    fn upsert_closing(&self, closing: &ShiftClosing, expected_version: ExpectedVersion) -> StoreResult<()> {
        (**self).upsert_closing(closing, expected_version)
    }

    fn list_closings(&self, range: DateRange) -> StoreResult<Vec<ShiftClosing>> {
        (**self).list_closings(range)
    }

    fn replace_attendant_sessions(
        &self,
        closing_id: ClosingId,
        rows: &[AttendantSession],
    ) -> StoreResult<Vec<AttendantSession>> {
        (**self).replace_attendant_sessions(closing_id, rows)
    }

    fn list_attendant_sessions(&self, closing_id: ClosingId) -> StoreResult<Vec<AttendantSession>> {
        (**self).list_attendant_sessions(closing_id)
    }

    fn attendant_exists(&self, id: AttendantId) -> StoreResult<bool> {
        (**self).attendant_exists(id)
    }

    fn replace_payment_entries(&self, closing_id: ClosingId, entries: &[PaymentEntry]) -> StoreResult<()> {
        (**self).replace_payment_entries(closing_id, entries)
    }

    fn list_payment_entries(&self, closing_id: ClosingId) -> StoreResult<Vec<PaymentEntry>> {
        (**self).list_payment_entries(closing_id)
    }

    fn list_pending_debts(&self) -> StoreResult<Vec<Debt>> {
        (**self).list_pending_debts()
    }

    fn list_expenses(&self, range: DateRange) -> StoreResult<Vec<Expense>> {
        (**self).list_expenses(range)
    }
}

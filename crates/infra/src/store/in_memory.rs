use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::NaiveDate;

use fuelops_analytics::{Debt, DebtStatus, Expense};
use fuelops_closing::{AttendantSession, ClosingKey, PaymentEntry, SessionKey, ShiftClosing};
use fuelops_core::{
    AggregateRoot, AttendantId, ClosingId, DateRange, ExpectedVersion, GradeId, PurchaseId, SessionId,
};
use fuelops_inventory::{FuelGrade, InventoryPosition, Purchase};
use fuelops_readings::{DispenserReading, ReadingKey};

use super::r#trait::{FuelStore, StoreError, StoreResult};

#[derive(Debug, Default)]
struct Tables {
    readings: BTreeMap<ReadingKey, DispenserReading>,
    purchases: Vec<Purchase>,
    grades: HashMap<GradeId, FuelGrade>,
    inventory: HashMap<GradeId, InventoryPosition>,
    closings: HashMap<ClosingKey, ShiftClosing>,
    sessions: HashMap<ClosingId, Vec<AttendantSession>>,
    draft_ids: HashMap<(ClosingId, String), SessionId>,
    attendants: HashSet<AttendantId>,
    payments: HashMap<ClosingId, Vec<PaymentEntry>>,
    debts: Vec<Debt>,
    expenses: Vec<Expense>,
}

/// In-memory store.
///
/// Intended for tests/dev. Operations can be switched to fail with
/// [`StoreError::Unavailable`] to exercise partial-failure paths.
#[derive(Debug, Default)]
pub struct InMemoryFuelStore {
    tables: RwLock<Tables>,
    failing: RwLock<HashSet<&'static str>>,
    failing_inventory: RwLock<HashSet<GradeId>>,
}

impl InMemoryFuelStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_grade(&self, grade: FuelGrade) {
        if let Ok(mut tables) = self.tables.write() {
            tables.grades.insert(grade.id, grade);
        }
    }

    pub fn add_attendant(&self, id: AttendantId) {
        if let Ok(mut tables) = self.tables.write() {
            tables.attendants.insert(id);
        }
    }

    pub fn add_debt(&self, debt: Debt) {
        if let Ok(mut tables) = self.tables.write() {
            tables.debts.push(debt);
        }
    }

    pub fn add_expense(&self, expense: Expense) {
        if let Ok(mut tables) = self.tables.write() {
            tables.expenses.push(expense);
        }
    }

    /// Make every call to `operation` (a [`FuelStore`] method name) fail.
    pub fn fail_operation(&self, operation: &'static str) {
        if let Ok(mut failing) = self.failing.write() {
            failing.insert(operation);
        }
    }

    pub fn restore_operation(&self, operation: &'static str) {
        if let Ok(mut failing) = self.failing.write() {
            failing.remove(operation);
        }
    }

    /// Make `upsert_inventory` fail for one grade only.
    pub fn fail_inventory_writes(&self, grade_id: GradeId) {
        if let Ok(mut failing) = self.failing_inventory.write() {
            failing.insert(grade_id);
        }
    }

    pub fn restore_inventory_writes(&self, grade_id: GradeId) {
        if let Ok(mut failing) = self.failing_inventory.write() {
            failing.remove(&grade_id);
        }
    }

    fn check(&self, operation: &'static str) -> StoreResult<()> {
        let failing = self
            .failing
            .read()
            .map_err(|_| StoreError::Unavailable("lock poisoned".to_string()))?;
        if failing.contains(operation) {
            return Err(StoreError::Unavailable(format!("{operation}: backend not reachable")));
        }
        Ok(())
    }

    fn read(&self, operation: &'static str) -> StoreResult<RwLockReadGuard<'_, Tables>> {
        self.check(operation)?;
        self.tables
            .read()
            .map_err(|_| StoreError::Unavailable("lock poisoned".to_string()))
    }

    fn write(&self, operation: &'static str) -> StoreResult<RwLockWriteGuard<'_, Tables>> {
        self.check(operation)?;
        self.tables
            .write()
            .map_err(|_| StoreError::Unavailable("lock poisoned".to_string()))
    }
}

impl FuelStore for InMemoryFuelStore {
    fn list_readings(&self, range: DateRange, grade_id: Option<GradeId>) -> StoreResult<Vec<DispenserReading>> {
        let tables = self.read("list_readings")?;
        let mut readings: Vec<DispenserReading> = tables
            .readings
            .values()
            .filter(|r| range.contains(r.date))
            .filter(|r| grade_id.is_none_or(|g| r.grade_id == g))
            .cloned()
            .collect();
        readings.sort_by_key(|r| (r.date, r.shift_id, r.nozzle_id));
        Ok(readings)
    }

    fn get_reading(&self, key: &ReadingKey) -> StoreResult<Option<DispenserReading>> {
        let tables = self.read("get_reading")?;
        Ok(tables.readings.get(key).cloned())
    }

    fn upsert_reading(&self, reading: &DispenserReading) -> StoreResult<Option<DispenserReading>> {
        let mut tables = self.write("upsert_reading")?;
        Ok(tables.readings.insert(reading.key(), reading.clone()))
    }

    fn delete_reading(&self, key: &ReadingKey) -> StoreResult<()> {
        let mut tables = self.write("delete_reading")?;
        tables.readings.remove(key);
        Ok(())
    }

    fn list_purchases(&self, from: NaiveDate) -> StoreResult<Vec<Purchase>> {
        let tables = self.read("list_purchases")?;
        Ok(tables.purchases.iter().filter(|p| p.date >= from).cloned().collect())
    }

    fn record_purchase(&self, purchase: &Purchase) -> StoreResult<bool> {
        let mut tables = self.write("record_purchase")?;
        if let Some(existing) = tables.purchases.iter().find(|p| p.id == purchase.id) {
            if existing != purchase {
                return Err(StoreError::Rejected(format!(
                    "purchase {} already recorded with different values",
                    purchase.id
                )));
            }
            return Ok(false);
        }
        tables.purchases.push(purchase.clone());
        Ok(true)
    }

    fn purchase_exists(&self, id: PurchaseId) -> StoreResult<bool> {
        let tables = self.read("purchase_exists")?;
        Ok(tables.purchases.iter().any(|p| p.id == id))
    }

    fn get_grade(&self, id: GradeId) -> StoreResult<Option<FuelGrade>> {
        let tables = self.read("get_grade")?;
        Ok(tables.grades.get(&id).cloned())
    }

    fn list_grades(&self) -> StoreResult<Vec<FuelGrade>> {
        let tables = self.read("list_grades")?;
        let mut grades: Vec<FuelGrade> = tables.grades.values().cloned().collect();
        grades.sort_by(|a, b| a.code.cmp(&b.code));
        Ok(grades)
    }

    fn get_inventory(&self, grade_id: GradeId) -> StoreResult<Option<InventoryPosition>> {
        let tables = self.read("get_inventory")?;
        Ok(tables.inventory.get(&grade_id).cloned())
    }

    fn upsert_inventory(&self, position: &InventoryPosition, expected_version: ExpectedVersion) -> StoreResult<()> {
        let blocked = self
            .failing_inventory
            .read()
            .map_err(|_| StoreError::Unavailable("lock poisoned".to_string()))?
            .contains(&position.grade_id());
        if blocked {
            return Err(StoreError::Unavailable(format!(
                "upsert_inventory: grade {} not reachable",
                position.grade_id()
            )));
        }
        let mut tables = self.write("upsert_inventory")?;
        let current = tables
            .inventory
            .get(&position.grade_id())
            .map(|p| p.version())
            .unwrap_or(0);
        if !expected_version.matches(current) {
            return Err(StoreError::Conflict(format!(
                "inventory of grade {}: expected {expected_version:?}, found {current}",
                position.grade_id()
            )));
        }
        tables.inventory.insert(position.grade_id(), position.clone());
        Ok(())
    }

    fn get_closing(&self, key: &ClosingKey) -> StoreResult<Option<ShiftClosing>> {
        let tables = self.read("get_closing")?;
        Ok(tables.closings.get(key).cloned())
    }

    fn upsert_closing(&self, closing: &ShiftClosing, expected_version: ExpectedVersion) -> StoreResult<()> {
        let mut tables = self.write("upsert_closing")?;
        let key = closing.key();
        let current = tables.closings.get(&key).map(|c| c.version()).unwrap_or(0);
        if !expected_version.matches(current) {
            return Err(StoreError::Conflict(format!(
                "closing {} / {}: expected {expected_version:?}, found {current}",
                key.date, key.shift_id
            )));
        }
        tables.closings.insert(key, closing.clone());
        Ok(())
    }

    fn list_closings(&self, range: DateRange) -> StoreResult<Vec<ShiftClosing>> {
        let tables = self.read("list_closings")?;
        let mut closings: Vec<ShiftClosing> = tables
            .closings
            .values()
            .filter(|c| range.contains(c.key().date))
            .cloned()
            .collect();
        closings.sort_by_key(|c| c.key());
        Ok(closings)
    }

    fn replace_attendant_sessions(
        &self,
        closing_id: ClosingId,
        rows: &[AttendantSession],
    ) -> StoreResult<Vec<AttendantSession>> {
        let mut tables = self.write("replace_attendant_sessions")?;
        let mut persisted = Vec::with_capacity(rows.len());

        for row in rows {
            let id = match &row.key {
                SessionKey::Persisted(id) => *id,
                SessionKey::Draft(temp) => *tables
                    .draft_ids
                    .entry((closing_id, temp.clone()))
                    .or_insert_with(SessionId::new),
            };
            let mut saved = row.clone();
            saved.persist_as(id);
            persisted.push(saved);
        }

        tables.sessions.insert(closing_id, persisted.clone());
        Ok(persisted)
    }

    fn list_attendant_sessions(&self, closing_id: ClosingId) -> StoreResult<Vec<AttendantSession>> {
        let tables = self.read("list_attendant_sessions")?;
        Ok(tables.sessions.get(&closing_id).cloned().unwrap_or_default())
    }

    fn attendant_exists(&self, id: AttendantId) -> StoreResult<bool> {
        let tables = self.read("attendant_exists")?;
        Ok(tables.attendants.contains(&id))
    }

    fn replace_payment_entries(&self, closing_id: ClosingId, entries: &[PaymentEntry]) -> StoreResult<()> {
        let mut tables = self.write("replace_payment_entries")?;
        tables.payments.insert(closing_id, entries.to_vec());
        Ok(())
    }

    fn list_payment_entries(&self, closing_id: ClosingId) -> StoreResult<Vec<PaymentEntry>> {
        let tables = self.read("list_payment_entries")?;
        Ok(tables.payments.get(&closing_id).cloned().unwrap_or_default())
    }

    fn list_pending_debts(&self) -> StoreResult<Vec<Debt>> {
        let tables = self.read("list_pending_debts")?;
        Ok(tables
            .debts
            .iter()
            .filter(|d| d.status == DebtStatus::Pending)
            .cloned()
            .collect())
    }

    fn list_expenses(&self, range: DateRange) -> StoreResult<Vec<Expense>> {
        let tables = self.read("list_expenses")?;
        Ok(tables.expenses.iter().filter(|e| range.contains(e.date)).cloned().collect())
    }
}

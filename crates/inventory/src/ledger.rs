//! Single-writer inventory ledger.
//!
//! Every mutation of a grade's position runs while holding that grade's mutex, so a
//! sale and a purchase for the same grade are strictly ordered while different
//! grades proceed independently. The map itself is only write-locked to register a
//! new grade.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, RwLock};

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;

use fuelops_core::money::ratio_or;
use fuelops_core::{Aggregate, DomainError, DomainResult, GradeId, Liters, PurchaseId};

use crate::cost::Purchase;
use crate::position::{
    days_remaining, AdjustStock, InventoryCommand, InventoryEvent, InventoryPosition, ReceivePurchase,
    RecordSale, TankLevel, TankThresholds,
};

/// Per-grade state guarded by the grade's mutex.
#[derive(Debug, Clone)]
pub struct LedgerEntry {
    position: InventoryPosition,
    applied_purchases: HashSet<PurchaseId>,
}

impl LedgerEntry {
    fn new(position: InventoryPosition) -> Self {
        Self {
            position,
            applied_purchases: HashSet::new(),
        }
    }

    pub fn position(&self) -> &InventoryPosition {
        &self.position
    }

    pub fn has_applied(&self, purchase_id: PurchaseId) -> bool {
        self.applied_purchases.contains(&purchase_id)
    }

    pub fn record_sale(&mut self, liters: Liters, date: NaiveDate) -> DomainResult<InventoryEvent> {
        let command = InventoryCommand::RecordSale(RecordSale {
            grade_id: self.position.grade_id(),
            liters,
            date,
        });
        let event = self.execute_single(&command)?;

        if self.position.quantity() < Decimal::ZERO {
            tracing::warn!(
                grade_id = %self.position.grade_id(),
                quantity = %self.position.quantity(),
                "inventory went negative; a purchase is probably missing or recorded late"
            );
        }
        Ok(event)
    }

    /// Reweights the average cost and adds the purchased liters. A purchase id is
    /// applied at most once.
    pub fn receive_purchase(&mut self, purchase: &Purchase) -> DomainResult<InventoryEvent> {
        if self.applied_purchases.contains(&purchase.id) {
            return Err(DomainError::conflict(format!(
                "purchase {} already applied to grade {}",
                purchase.id,
                self.position.grade_id()
            )));
        }

        let command = InventoryCommand::ReceivePurchase(ReceivePurchase {
            purchase: purchase.clone(),
        });
        let event = self.execute_single(&command)?;
        self.applied_purchases.insert(purchase.id);
        Ok(event)
    }

    /// Stop tracking a purchase id once storage has recorded the purchase itself.
    pub fn forget_purchase(&mut self, purchase_id: PurchaseId) {
        self.applied_purchases.remove(&purchase_id);
    }

    /// Signed correction after a physical tank dip.
    pub fn adjust(&mut self, delta: Liters, date: NaiveDate) -> DomainResult<InventoryEvent> {
        let command = InventoryCommand::AdjustStock(AdjustStock {
            grade_id: self.position.grade_id(),
            delta,
            date,
        });
        self.execute_single(&command)
    }

    /// Replace the cached position with a fresher copy (e.g. reloaded from storage
    /// after a compare-and-swap conflict).
    pub fn sync(&mut self, position: InventoryPosition) {
        self.position = position;
    }

    fn execute_single(&mut self, command: &InventoryCommand) -> DomainResult<InventoryEvent> {
        let mut events = self.position.execute(command)?;
        events
            .pop()
            .ok_or_else(|| DomainError::invariant("inventory command produced no event"))
    }
}

/// Stock outlook for one grade.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DepletionForecast {
    pub grade_id: GradeId,
    pub quantity: Liters,
    pub daily_average: Liters,
    pub days_remaining: u32,
    pub fill_percent: Option<Decimal>,
    pub level: Option<TankLevel>,
}

/// Owner of every grade's [`InventoryPosition`].
#[derive(Debug, Default)]
pub struct InventoryLedger {
    entries: RwLock<HashMap<GradeId, Arc<Mutex<LedgerEntry>>>>,
    thresholds: TankThresholds,
}

impl InventoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_thresholds(mut self, thresholds: TankThresholds) -> Self {
        self.thresholds = thresholds;
        self
    }

    pub fn thresholds(&self) -> TankThresholds {
        self.thresholds
    }

    /// Start tracking a grade. An already-tracked grade keeps its current state.
    pub fn register(&self, position: InventoryPosition) {
        let grade_id = position.grade_id();
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        entries
            .entry(grade_id)
            .or_insert_with(|| Arc::new(Mutex::new(LedgerEntry::new(position))));
    }

    pub fn contains(&self, grade_id: GradeId) -> bool {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        entries.contains_key(&grade_id)
    }

    pub fn position(&self, grade_id: GradeId) -> DomainResult<InventoryPosition> {
        let entry = self.entry(grade_id)?;
        let guard = lock(&entry);
        Ok(guard.position.clone())
    }

    /// Snapshot of every tracked position.
    pub fn positions(&self) -> Vec<InventoryPosition> {
        let entries: Vec<_> = {
            let map = self.entries.read().unwrap_or_else(|e| e.into_inner());
            map.values().cloned().collect()
        };
        entries.iter().map(|entry| lock(entry).position.clone()).collect()
    }

    /// Run `f` inside the grade's critical section.
    ///
    /// `f` works on a scratch copy of the entry; the copy is committed only when `f`
    /// returns `Ok`, so a failed storage write leaves the ledger untouched.
    pub fn execute<R, E, F>(&self, grade_id: GradeId, f: F) -> Result<R, E>
    where
        E: From<DomainError>,
        F: FnOnce(&mut LedgerEntry) -> Result<R, E>,
    {
        let entry = self.entry(grade_id)?;
        let mut guard = lock(&entry);

        let mut scratch = guard.clone();
        let result = f(&mut scratch)?;
        *guard = scratch;
        Ok(result)
    }

    pub fn apply_sale(&self, grade_id: GradeId, liters: Liters, date: NaiveDate) -> DomainResult<InventoryPosition> {
        self.execute(grade_id, |entry| {
            entry.record_sale(liters, date)?;
            Ok(entry.position.clone())
        })
    }

    pub fn apply_purchase(&self, purchase: &Purchase) -> DomainResult<InventoryPosition> {
        self.execute(purchase.grade_id, |entry| {
            let event = entry.receive_purchase(purchase)?;
            if let InventoryEvent::PurchaseReceived(received) = &event {
                tracing::info!(
                    grade_id = %received.grade_id,
                    purchase_id = %received.purchase_id,
                    previous_average_cost = %received.previous_average_cost,
                    new_average_cost = %received.new_average_cost,
                    "purchase applied"
                );
            }
            Ok(entry.position.clone())
        })
    }

    /// Drop a purchase id from the grade's applied set after it has been durably
    /// recorded; from then on storage answers whether the purchase exists.
    pub fn confirm_purchase(&self, grade_id: GradeId, purchase_id: PurchaseId) -> DomainResult<()> {
        let entry = self.entry(grade_id)?;
        lock(&entry).forget_purchase(purchase_id);
        Ok(())
    }

    pub fn adjust_stock(&self, grade_id: GradeId, delta: Liters, date: NaiveDate) -> DomainResult<InventoryPosition> {
        self.execute(grade_id, |entry| {
            entry.adjust(delta, date)?;
            tracing::info!(grade_id = %grade_id, delta = %delta, "stock adjusted");
            Ok(entry.position.clone())
        })
    }

    /// Days of stock left for a grade given the liters sold over the trailing window.
    pub fn days_remaining(
        &self,
        grade_id: GradeId,
        window_days: u32,
        liters_sold: Liters,
    ) -> DomainResult<DepletionForecast> {
        let position = self.position(grade_id)?;
        Ok(DepletionForecast {
            grade_id,
            quantity: position.quantity(),
            daily_average: ratio_or(liters_sold, Decimal::from(window_days), Decimal::ZERO),
            days_remaining: days_remaining(position.quantity(), window_days, liters_sold),
            fill_percent: position.fill_percent(),
            level: position.level(&self.thresholds),
        })
    }

    fn entry(&self, grade_id: GradeId) -> DomainResult<Arc<Mutex<LedgerEntry>>> {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        entries
            .get(&grade_id)
            .cloned()
            .ok_or_else(|| DomainError::missing("fuel grade", grade_id))
    }
}

fn lock(entry: &Mutex<LedgerEntry>) -> MutexGuard<'_, LedgerEntry> {
    entry.lock().unwrap_or_else(|e| e.into_inner())
}

//! Storage-backed orchestration of the engine.
//!
//! [`FuelOpsService`] wires the pure components (reading processor, inventory ledger,
//! closing aggregator, analytics) to a [`FuelStore`]:
//!
//! ```text
//! readings ──► ReadingProcessor ──► InventoryLedger ──► store (CAS)
//!                      │
//!                      └──► ClosingAggregator ──► ShiftClosing ──► store
//!                                                      │
//!                     Monthly / Solvency / Profitability ◄┘
//! ```
//!
//! Multi-step writes are not transactional. A failed step is reported together with
//! the steps that already went through; every step is safe to repeat.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;

use fuelops_analytics::{
    average_daily_net_revenue, average_margin_per_liter, consolidate, DailyFigures, GradeInput, MonthlySummary,
    ProfitabilityAnalyzer, ProfitabilityReport, SalesGoal, SolvencyProjector, SolvencyReport, SolvencyStatus,
};
use fuelops_closing::{
    AttendantSession, CloseShift, ClosingAggregator, ClosingCommand, ClosingInput, ClosingKey, ClosingSummary,
    DeclareSales, PaymentEntry, SaveClosing, SessionKey, ShiftClosing,
};
use fuelops_core::money::sum;
use fuelops_core::{
    Aggregate, AggregateRoot, BatchReport, ClosingId, DateRange, DomainError, ExpectedVersion, GradeId, Liters,
    Money, ReadingId, ShiftId,
};
use fuelops_inventory::{DepletionForecast, InventoryEvent, InventoryLedger, InventoryPosition, LedgerEntry, Purchase};
use fuelops_readings::{DispenserReading, ReadingBatch, ReadingKey};

use crate::config::EngineSettings;
use crate::store::{FuelStore, StoreError};

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Storage(#[from] StoreError),

    /// The inventory row kept changing under us.
    #[error("inventory of grade {grade_id} still contended after {attempts} attempts")]
    Contention { grade_id: GradeId, attempts: u32 },

    /// A multi-step save stopped at `step`; `completed` steps are already persisted.
    #[error("save failed at {step} (completed: {completed:?}): {source}")]
    PartialSave {
        step: &'static str,
        completed: Vec<&'static str>,
        #[source]
        source: StoreError,
    },
}

pub type ServiceResult<T> = Result<T, ServiceError>;

/// A reading that went through: stored, and its liters reflected in inventory.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReadingReceipt {
    pub key: ReadingKey,
    pub reading_id: ReadingId,
    pub grade_id: GradeId,
    pub liters: Option<Liters>,
    pub revenue: Option<Money>,
    /// Inventory of the reading's grade after the sale.
    pub position: InventoryPosition,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PurchaseReceipt {
    pub purchase: Purchase,
    pub position: InventoryPosition,
    /// `false` when the purchase id had already been recorded.
    pub newly_recorded: bool,
}

/// Everything entered on the closing screen for one date/shift.
#[derive(Debug, Clone)]
pub struct ClosingRequest {
    pub date: NaiveDate,
    pub shift_id: ShiftId,
    pub sessions: Vec<AttendantSession>,
    pub payments: Vec<PaymentEntry>,
    pub declared_sales: Option<Money>,
    /// Move the closing to `Closed` (refused unless it is ready).
    pub close: bool,
}

impl ClosingRequest {
    pub fn new(date: NaiveDate, shift_id: ShiftId) -> Self {
        Self {
            date,
            shift_id,
            sessions: Vec::new(),
            payments: Vec::new(),
            declared_sales: None,
            close: false,
        }
    }

    pub fn with_session(mut self, session: AttendantSession) -> Self {
        self.sessions.push(session);
        self
    }

    pub fn with_payment(mut self, entry: PaymentEntry) -> Self {
        self.payments.push(entry);
        self
    }

    pub fn with_declared_sales(mut self, amount: Money) -> Self {
        self.declared_sales = Some(amount);
        self
    }

    pub fn closing(mut self) -> Self {
        self.close = true;
        self
    }

    pub fn key(&self) -> ClosingKey {
        ClosingKey::new(self.date, self.shift_id)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClosingOutcome {
    pub closing: ShiftClosing,
    pub summary: ClosingSummary,
    /// Saved sessions (with durable ids) and sessions refused for an unknown attendant.
    pub sessions: BatchReport<AttendantSession, SessionKey>,
}

/// A stored closing with its detail rows.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClosingRecord {
    pub closing: ShiftClosing,
    pub sessions: Vec<AttendantSession>,
    pub payments: Vec<PaymentEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SolvencyOutlook {
    pub report: SolvencyReport,
    pub sales_goal: SalesGoal,
    pub status: SolvencyStatus,
}

pub struct FuelOpsService<S> {
    store: S,
    ledger: InventoryLedger,
    aggregator: ClosingAggregator,
    settings: EngineSettings,
}

impl<S> FuelOpsService<S>
where
    S: FuelStore,
{
    pub fn new(store: S, settings: EngineSettings) -> Self {
        Self {
            ledger: InventoryLedger::new().with_thresholds(settings.tank),
            aggregator: ClosingAggregator::new(settings.closing),
            store,
            settings,
        }
    }

    pub fn with_defaults(store: S) -> Self {
        Self::new(store, EngineSettings::default())
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    pub fn ledger(&self) -> &InventoryLedger {
        &self.ledger
    }

    // ---- readings -------------------------------------------------------------

    /// Save a batch of readings and move inventory by the liters they sold.
    ///
    /// Readings are stored as entered. A reading that does not advance its meter is
    /// reported as skipped; a reading for an unknown grade is reported as failed and not
    /// stored. Re-saving a reading applies only the liters delta to inventory.
    /// Storage failures abort the remaining batch.
    pub fn record_readings<I>(&self, readings: I) -> ServiceResult<BatchReport<ReadingReceipt, ReadingKey>>
    where
        I: IntoIterator<Item = DispenserReading>,
    {
        let mut report = BatchReport::new();

        for reading in readings {
            let key = reading.key();
            match self.record_reading(&reading) {
                Ok(receipt) => match reading.validate() {
                    Ok(_) => report.apply(receipt),
                    Err(invalid) => report.reject(key, &invalid),
                },
                Err(ServiceError::Domain(err)) => {
                    tracing::warn!(reading_id = %reading.id, error = %err, "reading rejected");
                    report.reject(key, &err);
                }
                Err(err) => return Err(err),
            }
        }

        tracing::info!(
            applied = report.applied.len(),
            skipped = report.skipped.len(),
            failed = report.failed.len(),
            "readings recorded"
        );
        Ok(report)
    }

    fn record_reading(&self, reading: &DispenserReading) -> ServiceResult<ReadingReceipt> {
        self.ensure_tracked(reading.grade_id)?;

        let key = reading.key();
        let previous = self.store.get_reading(&key)?;
        if let Some(previous) = &previous {
            self.ensure_tracked(previous.grade_id)?;
        }
        self.store.upsert_reading(reading)?;

        let movements = inventory_movements(previous.as_ref(), reading);
        let mut committed: Vec<(GradeId, Liters)> = Vec::with_capacity(movements.len());
        for (grade_id, delta) in movements {
            if let Err(err) = self.move_inventory(grade_id, delta, reading.date) {
                self.revert_movements(&committed, reading.date);
                self.restore_reading(&key, previous.as_ref());
                return Err(err);
            }
            committed.push((grade_id, delta));
        }

        Ok(ReadingReceipt {
            key,
            reading_id: reading.id,
            grade_id: reading.grade_id,
            liters: reading.liters(),
            revenue: reading.revenue(),
            position: self.ledger.position(reading.grade_id)?,
        })
    }

    /// Negative `delta` is a sale; positive gives liters back.
    fn move_inventory(&self, grade_id: GradeId, delta: Liters, date: NaiveDate) -> ServiceResult<InventoryPosition> {
        if delta < Decimal::ZERO {
            self.write_inventory(grade_id, |entry| entry.record_sale(-delta, date))
        } else {
            self.write_inventory(grade_id, |entry| entry.adjust(delta, date))
        }
    }

    /// Undo movements already committed for a reading, newest first.
    fn revert_movements(&self, committed: &[(GradeId, Liters)], date: NaiveDate) {
        for (grade_id, delta) in committed.iter().rev() {
            if let Err(err) = self.move_inventory(*grade_id, -*delta, date) {
                tracing::error!(
                    grade_id = %grade_id,
                    delta = %delta,
                    error = %err,
                    "could not revert inventory movement"
                );
            }
        }
    }

    /// Put back what the reading overwrote after its inventory step failed.
    fn restore_reading(&self, key: &ReadingKey, previous: Option<&DispenserReading>) {
        let restored = match previous {
            Some(previous) => self.store.upsert_reading(previous).map(|_| ()),
            None => self.store.delete_reading(key),
        };
        if let Err(err) = restored {
            tracing::error!(
                nozzle_id = %key.nozzle_id,
                date = %key.date,
                error = %err,
                "reading kept without its inventory movement"
            );
        }
    }

    // ---- inventory ------------------------------------------------------------

    /// Record a delivery: weighted-average the grade's cost and add the quantity.
    ///
    /// Idempotent per purchase id.
    pub fn register_purchase(&self, purchase: Purchase) -> ServiceResult<PurchaseReceipt> {
        let grade_id = purchase.grade_id;
        self.ensure_tracked(grade_id)?;

        if self.store.purchase_exists(purchase.id)? {
            tracing::debug!(purchase_id = %purchase.id, "purchase already recorded");
            return Ok(PurchaseReceipt {
                position: self.ledger.position(grade_id)?,
                newly_recorded: false,
                purchase,
            });
        }

        let already_applied = self
            .ledger
            .execute(grade_id, |entry| Ok::<_, DomainError>(entry.has_applied(purchase.id)))?;
        let position = if already_applied {
            self.ledger.position(grade_id)?
        } else {
            self.write_inventory(grade_id, |entry| {
                let event = entry.receive_purchase(&purchase)?;
                if let InventoryEvent::PurchaseReceived(received) = &event {
                    tracing::info!(
                        grade_id = %received.grade_id,
                        purchase_id = %received.purchase_id,
                        previous_average_cost = %received.previous_average_cost,
                        new_average_cost = %received.new_average_cost,
                        "purchase applied"
                    );
                }
                Ok(event)
            })?
        };

        let newly_recorded = self
            .store
            .record_purchase(&purchase)
            .map_err(|source| partial_save("purchase", &["inventory"], source))?;
        self.ledger.confirm_purchase(grade_id, purchase.id)?;

        Ok(PurchaseReceipt {
            purchase,
            position,
            newly_recorded,
        })
    }

    /// Purchases of one grade dated on or after `from`.
    pub fn purchase_history(&self, grade_id: GradeId, from: NaiveDate) -> ServiceResult<Vec<Purchase>> {
        let mut purchases = self.store.list_purchases(from)?;
        purchases.retain(|p| p.grade_id == grade_id);
        Ok(purchases)
    }

    /// Manual correction after a tank dip.
    pub fn adjust_stock(&self, grade_id: GradeId, delta: Liters, date: NaiveDate) -> ServiceResult<InventoryPosition> {
        self.ensure_tracked(grade_id)?;
        let position = self.write_inventory(grade_id, |entry| entry.adjust(delta, date))?;
        tracing::info!(grade_id = %grade_id, delta = %delta, quantity = %position.quantity(), "stock adjusted");
        Ok(position)
    }

    pub fn inventory(&self, grade_id: GradeId) -> ServiceResult<InventoryPosition> {
        self.ensure_tracked(grade_id)?;
        Ok(self.ledger.position(grade_id)?)
    }

    /// Days of stock left, from the liters sold over the trailing depletion window.
    pub fn depletion_forecast(&self, grade_id: GradeId, today: NaiveDate) -> ServiceResult<DepletionForecast> {
        self.ensure_tracked(grade_id)?;
        let window = self.settings.depletion_window_days;
        let readings = self.store.list_readings(DateRange::trailing(today, window), Some(grade_id))?;
        let sold = ReadingBatch::from_readings(&readings).liters_for(grade_id);
        Ok(self.ledger.days_remaining(grade_id, window, sold)?)
    }

    pub fn depletion_forecasts(&self, today: NaiveDate) -> ServiceResult<Vec<DepletionForecast>> {
        self.store
            .list_grades()?
            .iter()
            .map(|grade| self.depletion_forecast(grade.id, today))
            .collect()
    }

    /// Load a grade into the ledger on first use.
    fn ensure_tracked(&self, grade_id: GradeId) -> ServiceResult<()> {
        if self.ledger.contains(grade_id) {
            return Ok(());
        }
        if self.store.get_grade(grade_id)?.is_none() {
            return Err(DomainError::missing("fuel grade", grade_id).into());
        }
        let position = self
            .store
            .get_inventory(grade_id)?
            .unwrap_or_else(|| InventoryPosition::new(grade_id, Decimal::ZERO));
        self.ledger.register(position);
        Ok(())
    }

    /// Read-modify-write of one grade's inventory.
    ///
    /// Runs inside the grade's critical section and persists with compare-and-swap on
    /// the position version. On a lost race the stored row is reloaded and `op` is
    /// replayed on it.
    fn write_inventory<F>(&self, grade_id: GradeId, op: F) -> ServiceResult<InventoryPosition>
    where
        F: Fn(&mut LedgerEntry) -> Result<InventoryEvent, DomainError>,
    {
        let attempts = self.settings.inventory_write_attempts.max(1);

        self.ledger.execute(grade_id, |entry| {
            for attempt in 1..=attempts {
                let expected = ExpectedVersion::Exact(entry.position().version());
                let mut draft = entry.clone();
                op(&mut draft)?;

                match self.store.upsert_inventory(draft.position(), expected) {
                    Ok(()) => {
                        *entry = draft;
                        return Ok(entry.position().clone());
                    }
                    Err(StoreError::Conflict(reason)) => {
                        tracing::warn!(grade_id = %grade_id, attempt, %reason, "inventory write lost a race, reloading");
                        if let Some(stored) = self.store.get_inventory(grade_id)? {
                            entry.sync(stored);
                        }
                    }
                    Err(err) => return Err(err.into()),
                }
            }
            Err(ServiceError::Contention { grade_id, attempts })
        })
    }

    // ---- closing --------------------------------------------------------------

    /// Compute and persist the closing of one date/shift.
    ///
    /// Creating is idempotent per (date, shift): a second save updates the same record.
    /// Sessions naming an unknown attendant are left out and reported.
    pub fn save_closing(&self, request: ClosingRequest) -> ServiceResult<ClosingOutcome> {
        let key = request.key();

        let mut report = BatchReport::new();
        let mut sessions = Vec::with_capacity(request.sessions.len());
        for mut session in request.sessions {
            session.migrate_legacy_observation();
            if let Some(attendant_id) = session.attendant_id {
                if !self.store.attendant_exists(attendant_id)? {
                    report.reject(session.key.clone(), &DomainError::missing("attendant", attendant_id));
                    continue;
                }
            }
            sessions.push(session);
        }

        let readings: Vec<DispenserReading> = self
            .store
            .list_readings(DateRange::single_day(key.date), None)?
            .into_iter()
            .filter(|r| r.shift_id == key.shift_id)
            .collect();

        let mut closing = self
            .store
            .get_closing(&key)?
            .unwrap_or_else(|| ShiftClosing::new(ClosingId::new(), key));
        let expected = ExpectedVersion::Exact(closing.version());

        if let Some(amount) = request.declared_sales {
            closing.execute(&ClosingCommand::DeclareSales(DeclareSales { amount }))?;
        }

        let summary = self.aggregator.aggregate(ClosingInput {
            readings: &readings,
            sessions: &sessions,
            payments: &request.payments,
            declared_sales: closing.declared_sales(),
        });

        let command = if request.close {
            ClosingCommand::CloseShift(CloseShift {
                figures: summary.figures.clone(),
                readiness: summary.readiness.clone(),
            })
        } else {
            ClosingCommand::SaveClosing(SaveClosing {
                figures: summary.figures.clone(),
            })
        };
        closing.execute(&command)?;

        let closing_id = *closing.id();
        self.store
            .upsert_closing(&closing, expected)
            .map_err(|source| partial_save("closing", &[], source))?;
        let saved = self
            .store
            .replace_attendant_sessions(closing_id, &sessions)
            .map_err(|source| partial_save("attendant_sessions", &["closing"], source))?;
        self.store
            .replace_payment_entries(closing_id, &request.payments)
            .map_err(|source| partial_save("payment_entries", &["closing", "attendant_sessions"], source))?;

        for session in saved {
            report.apply(session);
        }

        tracing::info!(
            date = %key.date,
            shift_id = %key.shift_id,
            status = ?summary.figures.status,
            variance = %summary.figures.variance,
            state = ?closing.state(),
            "closing saved"
        );

        Ok(ClosingOutcome {
            closing,
            summary,
            sessions: report,
        })
    }

    pub fn load_closing(&self, date: NaiveDate, shift_id: ShiftId) -> ServiceResult<Option<ClosingRecord>> {
        let Some(closing) = self.store.get_closing(&ClosingKey::new(date, shift_id))? else {
            return Ok(None);
        };
        let closing_id = *closing.id();
        Ok(Some(ClosingRecord {
            sessions: self.store.list_attendant_sessions(closing_id)?,
            payments: self.store.list_payment_entries(closing_id)?,
            closing,
        }))
    }

    // ---- analytics ------------------------------------------------------------

    /// Debt outlook as of `today`.
    ///
    /// The balance is the non-cash net received over the trailing balance window; the
    /// daily pace averages the same figure over the revenue window.
    pub fn solvency_outlook(&self, today: NaiveDate) -> ServiceResult<SolvencyOutlook> {
        let balance_closings = self
            .store
            .list_closings(DateRange::trailing(today, self.settings.balance_window_days))?;
        let revenue_closings = self
            .store
            .list_closings(DateRange::trailing(today, self.settings.revenue_window_days))?;

        let current_balance = sum(balance_closings.iter().map(|c| c.figures().non_cash_net_received));
        let average_daily_revenue = average_daily_net_revenue(
            revenue_closings.iter().map(|c| c.figures().non_cash_net_received),
            self.settings.revenue_window_days,
        );

        let debts = self.store.list_pending_debts()?;
        let report = SolvencyProjector::new(today, current_balance, average_daily_revenue).project(&debts);

        let mut prices = Vec::new();
        for grade in self.store.list_grades()? {
            prices.push((grade.sale_price, self.average_cost(grade.id)?));
        }
        let margin = average_margin_per_liter(prices, self.settings.default_margin_per_liter);
        let month = self.store.list_readings(DateRange::month_to_date(today), None)?;
        let liters_sold = ReadingBatch::from_readings(&month).total_liters;

        let status = report.worst_status();
        tracing::info!(
            %today,
            status = ?status,
            balance = %current_balance,
            daily_average = %average_daily_revenue,
            pending = %report.total_pending,
            "solvency projected"
        );

        Ok(SolvencyOutlook {
            sales_goal: SalesGoal::compute(report.total_pending, margin, liters_sold),
            report,
            status,
        })
    }

    /// Day-by-day figures of a calendar month with the month-end projection.
    ///
    /// Revenue comes from the day's closings when there are any, otherwise from the
    /// readings. Profit is revenue minus cost at the current average cost, minus fees.
    pub fn monthly_summary(&self, year: i32, month: u32) -> ServiceResult<MonthlySummary> {
        let range = DateRange::month(year, month)?;
        let readings = self.store.list_readings(range, None)?;
        let closings = self.store.list_closings(range)?;

        let mut readings_by_date: BTreeMap<NaiveDate, Vec<&DispenserReading>> = BTreeMap::new();
        for reading in &readings {
            readings_by_date.entry(reading.date).or_default().push(reading);
        }
        let mut closings_by_date: BTreeMap<NaiveDate, Vec<&ShiftClosing>> = BTreeMap::new();
        for closing in &closings {
            closings_by_date.entry(closing.key().date).or_default().push(closing);
        }
        let dates: BTreeSet<NaiveDate> = readings_by_date
            .keys()
            .chain(closings_by_date.keys())
            .copied()
            .collect();

        let mut costs: HashMap<GradeId, Money> = HashMap::new();
        let mut days = Vec::with_capacity(dates.len());
        for date in dates {
            let batch = ReadingBatch::from_readings(readings_by_date.get(&date).into_iter().flatten().copied());
            let day_closings = closings_by_date.get(&date).map(Vec::as_slice).unwrap_or_default();

            let mut day = DailyFigures::new(date);
            let mut gross_margin = Decimal::ZERO;
            for grade in &batch.grades {
                let cost = match costs.get(&grade.grade_id) {
                    Some(cost) => *cost,
                    None => {
                        let cost = self.average_cost(grade.grade_id)?;
                        costs.insert(grade.grade_id, cost);
                        cost
                    }
                };
                gross_margin += grade.revenue - grade.liters * cost;
                day.volume_by_grade.insert(grade.grade_id, grade.liters);
            }

            day.volume = batch.total_liters;
            day.fees = sum(day_closings.iter().map(|c| c.figures().fee_total));
            day.revenue = if day_closings.is_empty() {
                batch.total_revenue
            } else {
                sum(day_closings.iter().map(|c| c.figures().total_sales))
            };
            day.profit = gross_margin - day.fees;
            days.push(day);
        }

        Ok(consolidate(year, month, days)?)
    }

    /// Per-grade unit economics over `period`, every catalog grade included, with the
    /// previous calendar month's volume and revenue for comparison.
    pub fn profitability_report(&self, period: DateRange) -> ServiceResult<ProfitabilityReport> {
        let readings = self.store.list_readings(period, None)?;
        let batch = ReadingBatch::from_readings(&readings);

        let mut inputs = Vec::new();
        for grade in self.store.list_grades()? {
            let sales = batch.grade(grade.id);
            inputs.push(GradeInput {
                grade_id: grade.id,
                liters: sales.map(|s| s.liters).unwrap_or(Decimal::ZERO),
                revenue: sales.map(|s| s.revenue).unwrap_or(Decimal::ZERO),
                average_cost: self.average_cost(grade.id)?,
                catalog_price: grade.sale_price,
            });
        }

        let expenses = sum(self.store.list_expenses(period)?.iter().map(|e| e.amount));
        let report = ProfitabilityAnalyzer::new()
            .with_default_expense_rate(self.settings.default_expense_rate)
            .analyze(period, &inputs, expenses);

        let previous = period.previous_month()?;
        let earlier = ReadingBatch::from_readings(&self.store.list_readings(previous, None)?);
        Ok(report.with_previous_period(previous, earlier.total_liters, earlier.total_revenue))
    }

    fn average_cost(&self, grade_id: GradeId) -> ServiceResult<Money> {
        self.ensure_tracked(grade_id)?;
        Ok(self.ledger.position(grade_id)?.average_cost())
    }
}

/// Net inventory movement per grade when `current` replaces `previous`.
///
/// Negative deltas are sales; positive deltas give liters back (a corrected or
/// invalidated reading).
fn inventory_movements(previous: Option<&DispenserReading>, current: &DispenserReading) -> Vec<(GradeId, Liters)> {
    let mut movements: Vec<(GradeId, Liters)> = Vec::with_capacity(2);
    let mut push = |grade_id: GradeId, delta: Liters| match movements.iter_mut().find(|(g, _)| *g == grade_id) {
        Some((_, total)) => *total += delta,
        None => movements.push((grade_id, delta)),
    };

    if let Some(previous) = previous {
        if let Some(liters) = previous.liters() {
            push(previous.grade_id, liters);
        }
    }
    if let Some(liters) = current.liters() {
        push(current.grade_id, -liters);
    }

    movements.retain(|(_, delta)| !delta.is_zero());
    movements
}

fn partial_save(step: &'static str, completed: &[&'static str], source: StoreError) -> ServiceError {
    tracing::error!(step, ?completed, error = %source, "save stopped part way");
    ServiceError::PartialSave {
        step,
        completed: completed.to_vec(),
        source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fuelops_core::NozzleId;

    fn reading(grade_id: GradeId, initial: i64, final_meter: i64) -> DispenserReading {
        DispenserReading {
            id: ReadingId::new(),
            nozzle_id: NozzleId::new(),
            grade_id,
            shift_id: ShiftId::new(),
            date: NaiveDate::from_ymd_opt(2024, 3, 4).unwrap(),
            initial_meter: Decimal::new(initial, 0),
            final_meter: Decimal::new(final_meter, 0),
            price_per_liter: Decimal::new(5, 0),
        }
    }

    #[test]
    fn first_save_is_a_plain_sale() {
        let grade = GradeId::new();
        let current = reading(grade, 100, 150);
        assert_eq!(inventory_movements(None, &current), vec![(grade, Decimal::new(-50, 0))]);
    }

    #[test]
    fn overwrite_moves_only_the_delta() {
        let grade = GradeId::new();
        let previous = reading(grade, 100, 150);
        let mut current = previous.clone();
        current.final_meter = Decimal::new(170, 0);
        assert_eq!(
            inventory_movements(Some(&previous), &current),
            vec![(grade, Decimal::new(-20, 0))]
        );

        assert!(inventory_movements(Some(&current), &current).is_empty());
    }

    #[test]
    fn invalidated_reading_gives_liters_back() {
        let grade = GradeId::new();
        let previous = reading(grade, 100, 150);
        let mut current = previous.clone();
        current.final_meter = Decimal::new(90, 0);
        assert_eq!(inventory_movements(Some(&previous), &current), vec![(grade, Decimal::new(50, 0))]);
    }

    #[test]
    fn regraded_reading_moves_both_grades() {
        let old_grade = GradeId::new();
        let new_grade = GradeId::new();
        let previous = reading(old_grade, 100, 150);
        let mut current = previous.clone();
        current.grade_id = new_grade;

        let movements = inventory_movements(Some(&previous), &current);
        assert_eq!(
            movements,
            vec![(old_grade, Decimal::new(50, 0)), (new_grade, Decimal::new(-50, 0))]
        );
    }

    #[test]
    fn partial_save_lists_completed_steps() {
        let err = partial_save(
            "payment_entries",
            &["closing", "attendant_sessions"],
            StoreError::Unavailable("down".to_string()),
        );
        assert_eq!(
            err.to_string(),
            "save failed at payment_entries (completed: [\"closing\", \"attendant_sessions\"]): storage unavailable: down"
        );
    }
}

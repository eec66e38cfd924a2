use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};

use fuelops_core::money::{percent_of, ratio_or};
use fuelops_core::{Aggregate, AggregateRoot, DomainError, Event, GradeId, Liters, Money, PurchaseId};

use crate::cost::{weighted_average_cost, Purchase};

/// Days-remaining value reported when nothing was sold in the window.
pub const DEPLETION_SENTINEL_DAYS: u32 = 999;

/// Aggregate root: the stock of one fuel grade (quantity + weighted-average cost).
///
/// Quantity is never clamped. A negative quantity means sales were recorded ahead of
/// the purchase that covers them and is left visible.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryPosition {
    grade_id: GradeId,
    quantity: Liters,
    average_cost: Money,
    tank_capacity: Liters,
    version: u64,
}

impl InventoryPosition {
    pub fn new(grade_id: GradeId, tank_capacity: Liters) -> Self {
        Self {
            grade_id,
            quantity: Decimal::ZERO,
            average_cost: Decimal::ZERO,
            tank_capacity,
            version: 0,
        }
    }

    /// Rehydrate a position from storage.
    pub fn restore(
        grade_id: GradeId,
        quantity: Liters,
        average_cost: Money,
        tank_capacity: Liters,
        version: u64,
    ) -> Self {
        Self {
            grade_id,
            quantity,
            average_cost,
            tank_capacity,
            version,
        }
    }

    pub fn grade_id(&self) -> GradeId {
        self.grade_id
    }

    pub fn quantity(&self) -> Liters {
        self.quantity
    }

    pub fn average_cost(&self) -> Money {
        self.average_cost
    }

    pub fn tank_capacity(&self) -> Liters {
        self.tank_capacity
    }

    /// Stock valuation at average cost.
    pub fn valuation(&self) -> Money {
        self.quantity * self.average_cost
    }

    /// Fill level in percent, `None` when the tank capacity is unknown.
    pub fn fill_percent(&self) -> Option<Decimal> {
        if self.tank_capacity <= Decimal::ZERO {
            return None;
        }
        Some(percent_of(self.quantity, self.tank_capacity))
    }

    pub fn level(&self, thresholds: &TankThresholds) -> Option<TankLevel> {
        self.fill_percent().map(|pct| thresholds.classify(pct))
    }
}

impl AggregateRoot for InventoryPosition {
    type Id = GradeId;

    fn id(&self) -> &Self::Id {
        &self.grade_id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

/// Tank fill classification shown on the stock dashboard.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TankLevel {
    Critical,
    Low,
    Ok,
}

/// Fill-percent bands: below `critical_percent` is critical, below `low_percent` low.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TankThresholds {
    pub critical_percent: Decimal,
    pub low_percent: Decimal,
}

impl Default for TankThresholds {
    fn default() -> Self {
        Self {
            critical_percent: Decimal::TEN,
            low_percent: Decimal::new(20, 0),
        }
    }
}

impl TankThresholds {
    pub fn classify(&self, fill_percent: Decimal) -> TankLevel {
        if fill_percent < self.critical_percent {
            TankLevel::Critical
        } else if fill_percent < self.low_percent {
            TankLevel::Low
        } else {
            TankLevel::Ok
        }
    }
}

/// Whole days of stock left at the trailing average daily sale.
///
/// `floor(quantity / (liters_sold / window_days))`; a zero average saturates at
/// [`DEPLETION_SENTINEL_DAYS`] and a negative quantity reports zero days.
pub fn days_remaining(quantity: Liters, window_days: u32, liters_sold: Liters) -> u32 {
    let daily_average = ratio_or(liters_sold, Decimal::from(window_days), Decimal::ZERO);
    if daily_average <= Decimal::ZERO {
        return DEPLETION_SENTINEL_DAYS;
    }
    if quantity <= Decimal::ZERO {
        return 0;
    }
    ratio_or(quantity, daily_average, Decimal::ZERO)
        .floor()
        .to_u32()
        .unwrap_or(u32::MAX)
}

/// Command: RecordSale (depletion from dispensed liters).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordSale {
    pub grade_id: GradeId,
    pub liters: Liters,
    pub date: NaiveDate,
}

/// Command: ReceivePurchase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceivePurchase {
    pub purchase: Purchase,
}

/// Command: AdjustStock (physical dip correction, signed).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdjustStock {
    pub grade_id: GradeId,
    pub delta: Liters,
    pub date: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum InventoryCommand {
    RecordSale(RecordSale),
    ReceivePurchase(ReceivePurchase),
    AdjustStock(AdjustStock),
}

/// Event: SaleRecorded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleRecorded {
    pub grade_id: GradeId,
    pub liters: Liters,
    pub date: NaiveDate,
}

/// Event: PurchaseReceived.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseReceived {
    pub grade_id: GradeId,
    pub purchase_id: PurchaseId,
    pub quantity: Liters,
    pub unit_cost: Money,
    pub previous_average_cost: Money,
    pub new_average_cost: Money,
    pub date: NaiveDate,
}

/// Event: StockAdjusted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockAdjusted {
    pub grade_id: GradeId,
    pub delta: Liters,
    pub date: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum InventoryEvent {
    SaleRecorded(SaleRecorded),
    PurchaseReceived(PurchaseReceived),
    StockAdjusted(StockAdjusted),
}

impl Event for InventoryEvent {
    fn event_type(&self) -> &'static str {
        match self {
            InventoryEvent::SaleRecorded(_) => "inventory.position.sale_recorded",
            InventoryEvent::PurchaseReceived(_) => "inventory.position.purchase_received",
            InventoryEvent::StockAdjusted(_) => "inventory.position.stock_adjusted",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn business_date(&self) -> NaiveDate {
        match self {
            InventoryEvent::SaleRecorded(e) => e.date,
            InventoryEvent::PurchaseReceived(e) => e.date,
            InventoryEvent::StockAdjusted(e) => e.date,
        }
    }
}

impl Aggregate for InventoryPosition {
    type Command = InventoryCommand;
    type Event = InventoryEvent;
    type Error = DomainError;

    fn apply(&mut self, event: &Self::Event) {
        match event {
            InventoryEvent::SaleRecorded(e) => {
                self.quantity -= e.liters;
            }
            InventoryEvent::PurchaseReceived(e) => {
                self.average_cost = e.new_average_cost;
                self.quantity += e.quantity;
            }
            InventoryEvent::StockAdjusted(e) => {
                self.quantity += e.delta;
            }
        }

        self.version += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            InventoryCommand::RecordSale(cmd) => self.handle_sale(cmd),
            InventoryCommand::ReceivePurchase(cmd) => self.handle_purchase(cmd),
            InventoryCommand::AdjustStock(cmd) => self.handle_adjust(cmd),
        }
    }
}

impl InventoryPosition {
    fn ensure_grade(&self, grade_id: GradeId) -> Result<(), DomainError> {
        if self.grade_id != grade_id {
            return Err(DomainError::invariant(format!(
                "command for grade {grade_id} routed to position of grade {}",
                self.grade_id
            )));
        }
        Ok(())
    }

    fn handle_sale(&self, cmd: &RecordSale) -> Result<Vec<InventoryEvent>, DomainError> {
        self.ensure_grade(cmd.grade_id)?;
        if cmd.liters <= Decimal::ZERO {
            return Err(DomainError::invalid_input(format!(
                "sale of {} liters cannot deplete stock",
                cmd.liters
            )));
        }

        Ok(vec![InventoryEvent::SaleRecorded(SaleRecorded {
            grade_id: cmd.grade_id,
            liters: cmd.liters,
            date: cmd.date,
        })])
    }

    fn handle_purchase(&self, cmd: &ReceivePurchase) -> Result<Vec<InventoryEvent>, DomainError> {
        let purchase = &cmd.purchase;
        self.ensure_grade(purchase.grade_id)?;
        if purchase.quantity <= Decimal::ZERO {
            return Err(DomainError::invalid_input(format!(
                "purchase {}: quantity must be positive",
                purchase.id
            )));
        }

        let new_average_cost =
            weighted_average_cost(self.quantity, self.average_cost, purchase.quantity, purchase.unit_cost);

        Ok(vec![InventoryEvent::PurchaseReceived(PurchaseReceived {
            grade_id: purchase.grade_id,
            purchase_id: purchase.id,
            quantity: purchase.quantity,
            unit_cost: purchase.unit_cost,
            previous_average_cost: self.average_cost,
            new_average_cost,
            date: purchase.date,
        })])
    }

    fn handle_adjust(&self, cmd: &AdjustStock) -> Result<Vec<InventoryEvent>, DomainError> {
        self.ensure_grade(cmd.grade_id)?;
        if cmd.delta.is_zero() {
            return Err(DomainError::invalid_input("delta cannot be zero"));
        }

        Ok(vec![InventoryEvent::StockAdjusted(StockAdjusted {
            grade_id: cmd.grade_id,
            delta: cmd.delta,
            date: cmd.date,
        })])
    }
}

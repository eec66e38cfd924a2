//! Fuel inventory: weighted-average costing and the per-grade stock ledger.
//!
//! Pure domain logic plus the in-process single-writer ledger; storage round-trips
//! are orchestrated by `fuelops-infra`.

pub mod cost;
pub mod grade;
pub mod ledger;
pub mod position;

pub use cost::{weighted_average_cost, Purchase};
pub use grade::FuelGrade;
pub use ledger::{DepletionForecast, InventoryLedger, LedgerEntry};
pub use position::{
    days_remaining, AdjustStock, InventoryCommand, InventoryEvent, InventoryPosition,
    PurchaseReceived, ReceivePurchase, RecordSale, SaleRecorded, StockAdjusted, TankLevel,
    TankThresholds, DEPLETION_SENTINEL_DAYS,
};

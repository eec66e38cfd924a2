//! Infrastructure layer: storage boundary, settings, and the service that runs the
//! engine against a store.

pub mod config;
pub mod service;
pub mod store;

mod integration_tests;

pub use config::{ConfigError, EngineSettings};
pub use service::{
    ClosingOutcome, ClosingRecord, ClosingRequest, FuelOpsService, PurchaseReceipt, ReadingReceipt, ServiceError,
    ServiceResult, SolvencyOutlook,
};
pub use store::{FuelStore, InMemoryFuelStore, StoreError, StoreResult};

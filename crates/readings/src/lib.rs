//! Dispenser-meter reading processing.
//!
//! Pure functions turning meter reading pairs into liters sold and revenue, plus the
//! per-grade aggregation used by closings, inventory depletion and reports.

pub mod batch;
pub mod reading;

pub use batch::{GradeSales, ReadingBatch, SkippedReading};
pub use reading::{process_reading, DispenserReading, InvalidReason, ReadingKey, ReadingOutcome};

//! `fuelops-core`: shared building blocks for the fuel operations engine.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns).

pub mod aggregate;
pub mod entity;
pub mod error;
pub mod event;
pub mod id;
pub mod money;
pub mod period;
pub mod report;

pub use aggregate::{Aggregate, AggregateRoot, ExpectedVersion};
pub use entity::Entity;
pub use error::{DomainError, DomainResult};
pub use event::Event;
pub use id::{
    AttendantId, ClosingId, DebtId, ExpenseId, GradeId, NozzleId, PurchaseId, ReadingId,
    SessionId, ShiftId,
};
pub use money::{Liters, Money};
pub use period::DateRange;
pub use report::{BatchReport, Rejected};

//! Shift/day cash closing: reconciles dispensed sales against what attendants and
//! payment channels report.

pub mod aggregator;
pub mod attendant;
pub mod closing;
pub mod payment;

pub use aggregator::{
    classify_variance, AttendantSummary, ClosingAggregator, ClosingInput, ClosingPolicy,
    ClosingSummary, Readiness, ReadinessBlocker,
};
pub use attendant::{AttendantSession, ReconciliationStatus, SessionKey, LEGACY_RECONCILED_MARKER};
pub use closing::{
    CloseShift, ClosingCommand, ClosingEvent, ClosingFigures, ClosingKey, ClosingState,
    ClosingStatus, DeclareSales, ReceivedSource, SalesSource, SaveClosing, ShiftClosing,
};
pub use payment::{net_of_fee, ChannelAmounts, PaymentChannel, PaymentEntry};

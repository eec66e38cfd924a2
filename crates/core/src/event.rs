use chrono::NaiveDate;

/// A domain event emitted by an aggregate.
///
/// Events are:
/// - **immutable** (treat them as facts)
/// - **versioned** (schema evolution)
/// - dated in business time (the operating day they belong to)
pub trait Event: Clone + core::fmt::Debug + Send + Sync + 'static {
    /// Stable event name/type identifier (e.g. "inventory.position.sale_recorded").
    fn event_type(&self) -> &'static str;

    /// Schema version for this event type.
    fn version(&self) -> u32;

    /// Operating day the event belongs to.
    fn business_date(&self) -> NaiveDate;
}

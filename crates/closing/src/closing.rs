use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use fuelops_core::{Aggregate, AggregateRoot, ClosingId, DomainError, Event, Money, ShiftId};

use crate::aggregator::Readiness;

/// Natural key of a closing: one record per operating day and shift.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ClosingKey {
    pub date: NaiveDate,
    pub shift_id: ShiftId,
}

impl ClosingKey {
    pub fn new(date: NaiveDate, shift_id: ShiftId) -> Self {
        Self { date, shift_id }
    }
}

/// Lifecycle: `Draft -> Closed`, one-way.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClosingState {
    #[default]
    Draft,
    Closed,
}

/// Outcome of comparing what was received against what was sold.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClosingStatus {
    #[default]
    Ok,
    Divergent,
    /// Payments look structurally missing rather than short.
    Pending,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SalesSource {
    /// Σ revenue over valid dispenser readings.
    #[default]
    Readings,
    /// Sales figure already declared on the closing.
    Declared,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReceivedSource {
    PaymentMethods,
    #[default]
    Attendants,
}

/// Totals stored on a closing record.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ClosingFigures {
    pub total_sales: Money,
    pub sales_source: SalesSource,
    pub gross_received: Money,
    pub received_source: ReceivedSource,
    pub fee_total: Money,
    pub net_received: Money,
    /// Net of fees, cash excluded. Feeds the solvency revenue average.
    pub non_cash_net_received: Money,
    /// Displayed variance (zeroed when `status` is `Pending`).
    pub variance: Money,
    pub status: ClosingStatus,
}

/// Aggregate root for one (date, shift) closing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShiftClosing {
    id: ClosingId,
    key: ClosingKey,
    state: ClosingState,
    figures: ClosingFigures,
    declared_sales: Option<Money>,
    version: u64,
}

impl ShiftClosing {
    pub fn new(id: ClosingId, key: ClosingKey) -> Self {
        Self {
            id,
            key,
            state: ClosingState::Draft,
            figures: ClosingFigures::default(),
            declared_sales: None,
            version: 0,
        }
    }

    pub fn key(&self) -> ClosingKey {
        self.key
    }

    pub fn state(&self) -> ClosingState {
        self.state
    }

    pub fn figures(&self) -> &ClosingFigures {
        &self.figures
    }

    /// Sales figure declared on the record, authoritative over reading totals.
    pub fn declared_sales(&self) -> Option<Money> {
        self.declared_sales
    }

    pub fn is_closed(&self) -> bool {
        self.state == ClosingState::Closed
    }
}

impl AggregateRoot for ShiftClosing {
    type Id = ClosingId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

/// Command: DeclareSales.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeclareSales {
    pub amount: Money,
}

/// Command: SaveClosing (persist current totals, state unchanged).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveClosing {
    pub figures: ClosingFigures,
}

/// Command: CloseShift.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CloseShift {
    pub figures: ClosingFigures,
    pub readiness: Readiness,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClosingCommand {
    DeclareSales(DeclareSales),
    SaveClosing(SaveClosing),
    CloseShift(CloseShift),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClosingEvent {
    SalesDeclared { key: ClosingKey, amount: Money },
    ClosingSaved { key: ClosingKey, figures: ClosingFigures },
    ShiftClosed { key: ClosingKey, figures: ClosingFigures },
}

impl Event for ClosingEvent {
    fn event_type(&self) -> &'static str {
        match self {
            ClosingEvent::SalesDeclared { .. } => "closing.shift.sales_declared",
            ClosingEvent::ClosingSaved { .. } => "closing.shift.saved",
            ClosingEvent::ShiftClosed { .. } => "closing.shift.closed",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn business_date(&self) -> NaiveDate {
        match self {
            ClosingEvent::SalesDeclared { key, .. }
            | ClosingEvent::ClosingSaved { key, .. }
            | ClosingEvent::ShiftClosed { key, .. } => key.date,
        }
    }
}

impl Aggregate for ShiftClosing {
    type Command = ClosingCommand;
    type Event = ClosingEvent;
    type Error = DomainError;

    fn apply(&mut self, event: &Self::Event) {
        match event {
            ClosingEvent::SalesDeclared { amount, .. } => {
                self.declared_sales = Some(*amount);
            }
            ClosingEvent::ClosingSaved { figures, .. } => {
                self.figures = figures.clone();
            }
            ClosingEvent::ShiftClosed { figures, .. } => {
                self.figures = figures.clone();
                self.state = ClosingState::Closed;
            }
        }

        self.version += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            ClosingCommand::DeclareSales(cmd) => {
                if cmd.amount < Decimal::ZERO {
                    return Err(DomainError::invalid_input(format!(
                        "declared sales cannot be negative (got {})",
                        cmd.amount
                    )));
                }
                Ok(vec![ClosingEvent::SalesDeclared {
                    key: self.key,
                    amount: cmd.amount,
                }])
            }
            ClosingCommand::SaveClosing(cmd) => Ok(vec![ClosingEvent::ClosingSaved {
                key: self.key,
                figures: cmd.figures.clone(),
            }]),
            ClosingCommand::CloseShift(cmd) => {
                if !cmd.readiness.is_ready() {
                    return Err(DomainError::invalid_input(format!(
                        "closing {} / {} is not ready: {}",
                        self.key.date,
                        self.key.shift_id,
                        cmd.readiness.describe()
                    )));
                }
                Ok(vec![ClosingEvent::ShiftClosed {
                    key: self.key,
                    figures: cmd.figures.clone(),
                }])
            }
        }
    }
}

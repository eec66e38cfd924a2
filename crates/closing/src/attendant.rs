//! Attendant sessions: what each attendant declares having received on a closing.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use fuelops_core::{AttendantId, Money, SessionId};

use crate::payment::{ChannelAmounts, PaymentChannel};

/// Observation prefix older records used to flag a reconciled session.
pub const LEGACY_RECONCILED_MARKER: &str = "[CONFERIDO]";

/// Identity of a session row: a temporary key while drafting, a durable id once saved.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum SessionKey {
    Draft(String),
    Persisted(SessionId),
}

impl SessionKey {
    pub fn is_draft(&self) -> bool {
        matches!(self, SessionKey::Draft(_))
    }
}

impl core::fmt::Display for SessionKey {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            SessionKey::Draft(tmp) => write!(f, "draft:{tmp}"),
            SessionKey::Persisted(id) => write!(f, "{id}"),
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReconciliationStatus {
    #[default]
    Pending,
    Reconciled,
}

impl ReconciliationStatus {
    /// Reads the status out of a legacy free-text observation.
    pub fn from_legacy_observation(observation: &str) -> Self {
        if observation.contains(LEGACY_RECONCILED_MARKER) {
            ReconciliationStatus::Reconciled
        } else {
            ReconciliationStatus::Pending
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendantSession {
    pub key: SessionKey,
    /// Unset while the row is still being filled in.
    pub attendant_id: Option<AttendantId>,
    pub amounts: ChannelAmounts,
    /// Independently counted amount; `None` means nobody verified the declaration.
    pub reconciled: Option<Money>,
    pub status: ReconciliationStatus,
    pub observation: String,
}

impl AttendantSession {
    pub fn draft(temp_key: impl Into<String>) -> Self {
        Self {
            key: SessionKey::Draft(temp_key.into()),
            attendant_id: None,
            amounts: ChannelAmounts::default(),
            reconciled: None,
            status: ReconciliationStatus::Pending,
            observation: String::new(),
        }
    }

    pub fn with_attendant(mut self, attendant_id: AttendantId) -> Self {
        self.attendant_id = Some(attendant_id);
        self
    }

    pub fn with_amount(mut self, channel: PaymentChannel, amount: Money) -> Self {
        self.amounts.set(channel, amount);
        self
    }

    pub fn with_reconciled(mut self, amount: Money) -> Self {
        self.reconciled = Some(amount);
        self
    }

    pub fn declared_total(&self) -> Money {
        self.amounts.total()
    }

    /// The reconciled figure, defaulting to the declaration itself.
    pub fn reconciled_amount(&self) -> Money {
        self.reconciled.unwrap_or_else(|| self.declared_total())
    }

    /// `declared - reconciled`.
    pub fn variance(&self) -> Money {
        self.declared_total() - self.reconciled_amount()
    }

    pub fn mark_reconciled(&mut self, amount: Money) {
        self.reconciled = Some(amount);
        self.status = ReconciliationStatus::Reconciled;
    }

    /// Swap a draft key for the durable id assigned by storage.
    pub fn persist_as(&mut self, id: SessionId) {
        self.key = SessionKey::Persisted(id);
    }

    /// One-shot migration of a record saved before the explicit status existed: the
    /// marker becomes `status` and is stripped from the observation.
    pub fn migrate_legacy_observation(&mut self) {
        if ReconciliationStatus::from_legacy_observation(&self.observation) == ReconciliationStatus::Reconciled {
            self.status = ReconciliationStatus::Reconciled;
            self.observation = self.observation.replace(LEGACY_RECONCILED_MARKER, "").trim().to_string();
        }
    }

    pub fn has_reconciled_amount(&self) -> bool {
        self.reconciled_amount() != Decimal::ZERO
    }
}

//! Engine settings.
//!
//! Defaults match the station's historical behavior. Every field can be overridden
//! from a JSON document and then from `FUELOPS_*` environment variables.

use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use fuelops_analytics::DEFAULT_MARGIN_PER_LITER;
use fuelops_closing::ClosingPolicy;
use fuelops_inventory::TankThresholds;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {key}: {value:?}")]
    InvalidValue { key: &'static str, value: String },

    #[error("invalid settings document: {0}")]
    Document(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    pub closing: ClosingPolicy,
    pub tank: TankThresholds,
    /// Expense per liter used when a period has no volume.
    pub default_expense_rate: Decimal,
    /// Margin per liter used by the sales goal when no grade has price and cost.
    pub default_margin_per_liter: Decimal,
    /// Trailing days of sales behind the days-remaining forecast.
    pub depletion_window_days: u32,
    /// Trailing days of non-cash receipts averaged into daily revenue.
    pub revenue_window_days: u32,
    /// Trailing days of non-cash receipts counted as the current balance.
    pub balance_window_days: u32,
    /// Attempts at a compare-and-swap inventory write before giving up.
    pub inventory_write_attempts: u32,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            closing: ClosingPolicy::default(),
            tank: TankThresholds::default(),
            default_expense_rate: Decimal::ZERO,
            default_margin_per_liter: DEFAULT_MARGIN_PER_LITER,
            depletion_window_days: 7,
            revenue_window_days: 30,
            balance_window_days: 7,
            inventory_write_attempts: 3,
        }
    }
}

impl EngineSettings {
    /// Defaults overlaid with `FUELOPS_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::default().overlay(|key| std::env::var(key).ok())
    }

    /// Parse a JSON settings document; missing fields keep their defaults.
    pub fn from_json(document: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(document)?)
    }

    /// Override fields from `lookup` (usually the process environment).
    pub fn overlay<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = &lookup;
        read(lookup, "FUELOPS_CLOSING_TOLERANCE", &mut self.closing.tolerance)?;
        read(lookup, "FUELOPS_PENDING_SALES_THRESHOLD", &mut self.closing.pending_sales_threshold)?;
        read(lookup, "FUELOPS_PENDING_MATCH_WINDOW", &mut self.closing.pending_match_window)?;
        read(lookup, "FUELOPS_PENDING_MATCH_RATIO", &mut self.closing.pending_match_ratio)?;
        read(lookup, "FUELOPS_PENDING_MATCH_MAX", &mut self.closing.pending_match_max)?;
        read(lookup, "FUELOPS_TANK_CRITICAL_PERCENT", &mut self.tank.critical_percent)?;
        read(lookup, "FUELOPS_TANK_LOW_PERCENT", &mut self.tank.low_percent)?;
        read(lookup, "FUELOPS_DEFAULT_EXPENSE_RATE", &mut self.default_expense_rate)?;
        read(lookup, "FUELOPS_DEFAULT_MARGIN_PER_LITER", &mut self.default_margin_per_liter)?;
        read(lookup, "FUELOPS_DEPLETION_WINDOW_DAYS", &mut self.depletion_window_days)?;
        read(lookup, "FUELOPS_REVENUE_WINDOW_DAYS", &mut self.revenue_window_days)?;
        read(lookup, "FUELOPS_BALANCE_WINDOW_DAYS", &mut self.balance_window_days)?;
        read(lookup, "FUELOPS_INVENTORY_WRITE_ATTEMPTS", &mut self.inventory_write_attempts)?;
        Ok(self)
    }
}

fn read<F, T>(lookup: &F, key: &'static str, target: &mut T) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    let Some(raw) = lookup(key) else {
        return Ok(());
    };
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(());
    }
    *target = raw.parse().map_err(|_| ConfigError::InvalidValue {
        key,
        value: raw.to_string(),
    })?;
    Ok(())
}

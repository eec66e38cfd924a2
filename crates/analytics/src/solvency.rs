//! Debt coverage projection and the sales goal that would clear pending debt.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use fuelops_core::money::{cap_percent, percent_of, ratio_or, sum, HUNDRED};
use fuelops_core::{DebtId, Entity, Liters, Money};

/// Margin per liter assumed when no grade has both a sale price and a cost.
pub const DEFAULT_MARGIN_PER_LITER: Decimal = Decimal::from_parts(30, 0, 0, false, 2);

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DebtStatus {
    Pending,
    Paid,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Debt {
    pub id: DebtId,
    pub description: String,
    pub amount: Money,
    pub due_date: NaiveDate,
    pub status: DebtStatus,
}

impl Entity for Debt {
    type Id = DebtId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SolvencyStatus {
    /// Current balance already covers the debt.
    Green,
    /// Covered by the due date at the current revenue pace.
    Yellow,
    Red,
}

/// Σ receipts ÷ window (0 for an empty window).
pub fn average_daily_net_revenue<I>(receipts: I, window_days: u32) -> Money
where
    I: IntoIterator<Item = Money>,
{
    ratio_or(sum(receipts), Decimal::from(window_days), Decimal::ZERO)
}

/// Mean of `sale_price - average_cost` over grades where both are set (positive),
/// or `default` when none qualifies.
pub fn average_margin_per_liter<I>(prices: I, default: Money) -> Money
where
    I: IntoIterator<Item = (Money, Money)>,
{
    let margins: Vec<Money> = prices
        .into_iter()
        .filter(|(sale, cost)| *sale > Decimal::ZERO && *cost > Decimal::ZERO)
        .map(|(sale, cost)| sale - cost)
        .collect();

    if margins.is_empty() {
        return default;
    }
    ratio_or(sum(margins.iter().copied()), Decimal::from(margins.len()), default)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DebtProjection {
    pub debt_id: DebtId,
    pub description: String,
    pub amount: Money,
    pub due_date: NaiveDate,
    pub days_until_due: i64,
    pub projected_balance: Money,
    pub status: SolvencyStatus,
    /// `amount - projected_balance` when `Red`, else 0.
    pub deficit: Money,
    pub coverage_percent: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SalesGoal {
    pub total_pending: Money,
    pub margin_per_liter: Money,
    pub liters_needed: Liters,
    pub liters_sold: Liters,
    pub profit_generated: Money,
    pub progress_percent: Decimal,
    pub remaining: Money,
}

impl SalesGoal {
    pub fn compute(total_pending: Money, margin_per_liter: Money, liters_sold: Liters) -> Self {
        let liters_needed = if margin_per_liter > Decimal::ZERO {
            ratio_or(total_pending, margin_per_liter, Decimal::ZERO).ceil()
        } else {
            Decimal::ZERO
        };
        let profit_generated = liters_sold * margin_per_liter;
        let progress_percent = if total_pending > Decimal::ZERO {
            cap_percent(percent_of(profit_generated, total_pending))
        } else {
            HUNDRED
        };

        Self {
            total_pending,
            margin_per_liter,
            liters_needed,
            liters_sold,
            profit_generated,
            progress_percent,
            remaining: (total_pending - profit_generated).max(Decimal::ZERO),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SolvencyReport {
    pub today: NaiveDate,
    pub current_balance: Money,
    pub average_daily_revenue: Money,
    /// Pending debts, earliest due first.
    pub debts: Vec<DebtProjection>,
    pub total_pending: Money,
    pub total_deficit: Money,
}

impl SolvencyReport {
    pub fn worst_status(&self) -> SolvencyStatus {
        self.debts
            .iter()
            .map(|d| d.status)
            .fold(SolvencyStatus::Green, |worst, s| match (worst, s) {
                (SolvencyStatus::Red, _) | (_, SolvencyStatus::Red) => SolvencyStatus::Red,
                (SolvencyStatus::Yellow, _) | (_, SolvencyStatus::Yellow) => SolvencyStatus::Yellow,
                _ => SolvencyStatus::Green,
            })
    }
}

/// Projects each pending debt against `current_balance + average × days until due`.
#[derive(Debug, Clone)]
pub struct SolvencyProjector {
    today: NaiveDate,
    current_balance: Money,
    average_daily_revenue: Money,
}

impl SolvencyProjector {
    pub fn new(today: NaiveDate, current_balance: Money, average_daily_revenue: Money) -> Self {
        Self {
            today,
            current_balance,
            average_daily_revenue,
        }
    }

    pub fn project_debt(&self, debt: &Debt) -> DebtProjection {
        let days_until_due = (debt.due_date - self.today).num_days().max(0);
        let projected_balance = self.current_balance + self.average_daily_revenue * Decimal::from(days_until_due);

        let (status, deficit) = if self.current_balance >= debt.amount {
            (SolvencyStatus::Green, Decimal::ZERO)
        } else if projected_balance >= debt.amount {
            (SolvencyStatus::Yellow, Decimal::ZERO)
        } else {
            (SolvencyStatus::Red, debt.amount - projected_balance)
        };

        let coverage_percent = if debt.amount > Decimal::ZERO {
            cap_percent(percent_of(projected_balance, debt.amount))
        } else {
            HUNDRED
        };

        DebtProjection {
            debt_id: debt.id,
            description: debt.description.clone(),
            amount: debt.amount,
            due_date: debt.due_date,
            days_until_due,
            projected_balance,
            status,
            deficit,
            coverage_percent,
        }
    }

    /// Paid debts are ignored.
    pub fn project(&self, debts: &[Debt]) -> SolvencyReport {
        let mut pending: Vec<&Debt> = debts.iter().filter(|d| d.status == DebtStatus::Pending).collect();
        pending.sort_by_key(|d| d.due_date);

        let projections: Vec<DebtProjection> = pending.iter().map(|d| self.project_debt(d)).collect();

        SolvencyReport {
            today: self.today,
            current_balance: self.current_balance,
            average_daily_revenue: self.average_daily_revenue,
            total_pending: sum(projections.iter().map(|p| p.amount)),
            total_deficit: sum(projections.iter().map(|p| p.deficit)),
            debts: projections,
        }
    }
}

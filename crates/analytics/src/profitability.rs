use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use fuelops_core::money::{percent_of, ratio_or, sum};
use fuelops_core::{DateRange, Entity, ExpenseId, GradeId, Liters, Money};

/// An operating expense (payroll, utilities, maintenance...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Expense {
    pub id: ExpenseId,
    pub date: NaiveDate,
    pub description: String,
    pub amount: Money,
}

impl Entity for Expense {
    type Id = ExpenseId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// Operational expense per liter over a period, or `default_rate` when nothing was
/// sold.
pub fn expense_per_liter(total_expenses: Money, total_liters: Liters, default_rate: Money) -> Money {
    if total_liters <= Decimal::ZERO {
        return default_rate;
    }
    ratio_or(total_expenses, total_liters, default_rate)
}

/// Per-grade inputs for one period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GradeInput {
    pub grade_id: GradeId,
    pub liters: Liters,
    pub revenue: Money,
    pub average_cost: Money,
    /// Used as the practiced price when nothing was sold.
    pub catalog_price: Money,
}

/// Unit economics of one grade over a period.
///
/// Built in one go by [`GradeProfitability::compute`]; there are no setters, so the
/// derived figures cannot drift from their inputs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GradeProfitability {
    pub grade_id: GradeId,
    pub liters: Liters,
    pub revenue: Money,
    pub average_cost: Money,
    pub expense_per_liter: Money,
    pub suggested_price: Money,
    pub practiced_price: Money,
    pub profit_per_liter: Money,
    pub margin_percent: Decimal,
    pub total_profit: Money,
    pub cost_of_goods_sold: Money,
}

impl GradeProfitability {
    pub fn compute(input: &GradeInput, expense_per_liter: Money) -> Self {
        let suggested_price = input.average_cost + expense_per_liter;
        let practiced_price = if input.liters.is_zero() {
            input.catalog_price
        } else {
            ratio_or(input.revenue, input.liters, input.catalog_price)
        };
        let profit_per_liter = practiced_price - suggested_price;

        Self {
            grade_id: input.grade_id,
            liters: input.liters,
            revenue: input.revenue,
            average_cost: input.average_cost,
            expense_per_liter,
            suggested_price,
            practiced_price,
            profit_per_liter,
            margin_percent: percent_of(profit_per_liter, practiced_price),
            total_profit: profit_per_liter * input.liters,
            cost_of_goods_sold: input.liters * input.average_cost,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProfitShare {
    pub grade_id: GradeId,
    pub profit: Money,
    pub share_percent: Decimal,
}

/// Volume and revenue of an earlier period, for comparison with the report's own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PeriodComparison {
    pub period: DateRange,
    pub volume: Liters,
    pub revenue: Money,
    /// Current against earlier, in percent; 0 when the earlier figure is 0.
    pub volume_change_percent: Decimal,
    pub revenue_change_percent: Decimal,
}

impl PeriodComparison {
    pub fn new(period: DateRange, volume: Liters, revenue: Money, current_volume: Liters, current_revenue: Money) -> Self {
        Self {
            period,
            volume,
            revenue,
            volume_change_percent: percent_of(current_volume - volume, volume),
            revenue_change_percent: percent_of(current_revenue - revenue, revenue),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProfitabilityReport {
    pub period: DateRange,
    pub expense_per_liter: Money,
    pub grades: Vec<GradeProfitability>,
    pub total_volume: Liters,
    pub total_revenue: Money,
    pub total_profit: Money,
    pub total_cost_of_goods_sold: Money,
    /// `total_profit / total_revenue * 100`.
    pub average_margin_percent: Decimal,
    pub average_profit_per_liter: Money,
    /// Grades by profit, highest first.
    pub ranking: Vec<ProfitShare>,
    pub previous_period: Option<PeriodComparison>,
}

impl ProfitabilityReport {
    /// Attach the totals of an earlier period.
    pub fn with_previous_period(mut self, period: DateRange, volume: Liters, revenue: Money) -> Self {
        self.previous_period = Some(PeriodComparison::new(
            period,
            volume,
            revenue,
            self.total_volume,
            self.total_revenue,
        ));
        self
    }
}

#[derive(Debug, Clone)]
pub struct ProfitabilityAnalyzer {
    default_expense_rate: Money,
}

impl Default for ProfitabilityAnalyzer {
    fn default() -> Self {
        Self {
            default_expense_rate: Decimal::ZERO,
        }
    }
}

impl ProfitabilityAnalyzer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_default_expense_rate(mut self, rate: Money) -> Self {
        self.default_expense_rate = rate;
        self
    }

    pub fn analyze(&self, period: DateRange, grades: &[GradeInput], total_expenses: Money) -> ProfitabilityReport {
        let total_volume = sum(grades.iter().map(|g| g.liters));
        let rate = expense_per_liter(total_expenses, total_volume, self.default_expense_rate);

        let grades: Vec<GradeProfitability> = grades
            .iter()
            .map(|input| GradeProfitability::compute(input, rate))
            .collect();

        let total_revenue = sum(grades.iter().map(|g| g.revenue));
        let total_profit = sum(grades.iter().map(|g| g.total_profit));

        let mut ranking: Vec<ProfitShare> = grades
            .iter()
            .map(|g| ProfitShare {
                grade_id: g.grade_id,
                profit: g.total_profit,
                share_percent: percent_of(g.total_profit, total_profit),
            })
            .collect();
        ranking.sort_by(|a, b| b.profit.cmp(&a.profit));

        ProfitabilityReport {
            period,
            expense_per_liter: rate,
            total_volume,
            total_revenue,
            total_profit,
            total_cost_of_goods_sold: sum(grades.iter().map(|g| g.cost_of_goods_sold)),
            average_margin_percent: percent_of(total_profit, total_revenue),
            average_profit_per_liter: ratio_or(total_profit, total_volume, Decimal::ZERO),
            ranking,
            grades,
            previous_period: None,
        }
    }
}

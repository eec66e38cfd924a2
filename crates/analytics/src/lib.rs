//! `fuelops-analytics`
//!
//! **Responsibility:** forward-looking and period reports derived from closings,
//! readings and inventory.
//!
//! Everything here is a pure calculation over already-fetched inputs:
//! - it does not touch storage or the inventory ledger;
//! - it produces report records, never domain events.

pub mod monthly;
pub mod profitability;
pub mod solvency;

pub use monthly::{consolidate, DailyFigures, MonthlyFigures, MonthlySummary};
pub use profitability::{
    expense_per_liter, Expense, GradeInput, GradeProfitability, PeriodComparison, ProfitShare,
    ProfitabilityAnalyzer, ProfitabilityReport,
};
pub use solvency::{
    average_daily_net_revenue, average_margin_per_liter, Debt, DebtProjection, DebtStatus,
    SalesGoal, SolvencyProjector, SolvencyReport, SolvencyStatus, DEFAULT_MARGIN_PER_LITER,
};

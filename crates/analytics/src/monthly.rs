//! Month roll-up of daily figures with a linear month-end projection.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use fuelops_core::money::ratio_or;
use fuelops_core::period::days_in_month;
use fuelops_core::{DateRange, DomainResult, GradeId, Liters, Money};

/// Figures for one operating day.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DailyFigures {
    pub date: NaiveDate,
    pub volume: Liters,
    pub revenue: Money,
    pub profit: Money,
    pub fees: Money,
    pub volume_by_grade: BTreeMap<GradeId, Liters>,
}

impl DailyFigures {
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date,
            ..Self::default()
        }
    }

    fn merge(&mut self, other: &DailyFigures) {
        self.volume += other.volume;
        self.revenue += other.revenue;
        self.profit += other.profit;
        self.fees += other.fees;
        for (grade_id, liters) in &other.volume_by_grade {
            *self.volume_by_grade.entry(*grade_id).or_default() += *liters;
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MonthlyFigures {
    pub volume: Liters,
    pub revenue: Money,
    pub profit: Money,
    pub fees: Money,
}

impl MonthlyFigures {
    fn add(&mut self, day: &DailyFigures) {
        self.volume += day.volume;
        self.revenue += day.revenue;
        self.profit += day.profit;
        self.fees += day.fees;
    }

    /// `(self / days_with_data) * days_in_month`.
    fn project(&self, days_with_data: u32, days_in_month: u32) -> Self {
        let divisor = Decimal::from(days_with_data.max(1));
        let factor = Decimal::from(days_in_month);
        let scale = |v: Decimal| ratio_or(v, divisor, Decimal::ZERO) * factor;
        Self {
            volume: scale(self.volume),
            revenue: scale(self.revenue),
            profit: scale(self.profit),
            fees: scale(self.fees),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthlySummary {
    pub year: i32,
    pub month: u32,
    pub range: DateRange,
    /// One entry per day with data, in date order.
    pub days: Vec<DailyFigures>,
    pub totals: MonthlyFigures,
    pub volume_by_grade: BTreeMap<GradeId, Liters>,
    pub days_with_data: u32,
    pub days_in_month: u32,
    /// Month-end projection from the average of the days with data.
    pub projection: MonthlyFigures,
}

/// Sums daily figures that fall in `year`-`month` and projects the month end.
///
/// Figures outside the month are ignored; several entries for one date are merged.
/// Days without an entry do not count towards the average, so a sparse month
/// projects from the days it has.
pub fn consolidate<I>(year: i32, month: u32, days: I) -> DomainResult<MonthlySummary>
where
    I: IntoIterator<Item = DailyFigures>,
{
    let range = DateRange::month(year, month)?;
    let days_in_month = days_in_month(year, month)?;

    let mut by_date: BTreeMap<NaiveDate, DailyFigures> = BTreeMap::new();
    for day in days.into_iter().filter(|d| range.contains(d.date)) {
        match by_date.get_mut(&day.date) {
            Some(existing) => existing.merge(&day),
            None => {
                by_date.insert(day.date, day);
            }
        }
    }

    let mut totals = MonthlyFigures::default();
    let mut volume_by_grade: BTreeMap<GradeId, Liters> = BTreeMap::new();
    for day in by_date.values() {
        totals.add(day);
        for (grade_id, liters) in &day.volume_by_grade {
            *volume_by_grade.entry(*grade_id).or_default() += *liters;
        }
    }

    let days_with_data = u32::try_from(by_date.len()).unwrap_or(u32::MAX);

    Ok(MonthlySummary {
        year,
        month,
        range,
        projection: totals.project(days_with_data, days_in_month),
        days: by_date.into_values().collect(),
        totals,
        volume_by_grade,
        days_with_data,
        days_in_month,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32, volume: i64, profit: i64) -> DailyFigures {
        DailyFigures {
            volume: Decimal::new(volume, 0),
            revenue: Decimal::new(volume * 6, 0),
            profit: Decimal::new(profit, 0),
            ..DailyFigures::new(NaiveDate::from_ymd_opt(2024, 2, d).unwrap())
        }
    }

    #[test]
    fn projects_from_days_with_data() {
        // Two days of data in February 2024 (29 days): 300 / 2 * 29 = 4350.
        let summary = consolidate(2024, 2, vec![day(1, 1000, 100), day(15, 2000, 200)]).unwrap();

        assert_eq!(summary.days_with_data, 2);
        assert_eq!(summary.days_in_month, 29);
        assert_eq!(summary.totals.profit, Decimal::new(300, 0));
        assert_eq!(summary.projection.profit, Decimal::new(4350, 0));
        assert_eq!(summary.projection.volume, Decimal::new(43_500, 0));
    }

    #[test]
    fn empty_month_projects_zero() {
        let summary = consolidate(2024, 4, Vec::new()).unwrap();
        assert_eq!(summary.days_with_data, 0);
        assert_eq!(summary.projection, MonthlyFigures::default());
    }

    #[test]
    fn merges_same_day_and_drops_other_months() {
        let grade = GradeId::new();
        let mut morning = day(3, 100, 10);
        morning.volume_by_grade.insert(grade, Decimal::new(100, 0));
        let mut evening = day(3, 50, 5);
        evening.volume_by_grade.insert(grade, Decimal::new(50, 0));
        let march = DailyFigures {
            volume: Decimal::new(999, 0),
            ..DailyFigures::new(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap())
        };

        let summary = consolidate(2024, 2, vec![morning, evening, march]).unwrap();

        assert_eq!(summary.days.len(), 1);
        assert_eq!(summary.totals.volume, Decimal::new(150, 0));
        assert_eq!(summary.volume_by_grade.get(&grade), Some(&Decimal::new(150, 0)));
    }

    #[test]
    fn invalid_month_is_rejected() {
        assert!(consolidate(2024, 13, Vec::new()).unwrap_err().is_invalid_input());
    }
}

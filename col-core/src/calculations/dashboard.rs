//! Roll-up of a user's saved relocation calculations.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::calculations::common::round_half_up;
use crate::models::SavedCalculation;

/// How many calculations [`DashboardSummary::recent`] holds at most.
pub const RECENT_LIMIT: usize = 5;

const MONTHS_PER_YEAR: Decimal = Decimal::from_parts(12, 0, 0, false, 0);

/// Condensed view of one saved calculation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalculationSummary {
    pub id: i64,
    pub name: String,
    pub origin_state: String,
    pub target_state: String,
    pub total_monthly_savings: Decimal,
    pub total_annual_savings: Decimal,
    pub is_favorite: bool,
    pub updated_at: DateTime<Utc>,
}

impl From<&SavedCalculation> for CalculationSummary {
    fn from(calc: &SavedCalculation) -> Self {
        Self {
            id: calc.id,
            name: calc.name.clone(),
            origin_state: calc.origin_state.clone(),
            target_state: calc.target_state.clone(),
            total_monthly_savings: calc.estimate.total_monthly_savings,
            total_annual_savings: calc.estimate.total_annual_savings,
            is_favorite: calc.is_favorite,
            updated_at: calc.updated_at,
        }
    }
}

fn savings(calc: &SavedCalculation) -> Decimal {
    calc.estimate.total_monthly_savings
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardSummary {
    pub total_calculations: usize,
    pub favorite_count: usize,
    pub average_monthly_savings: Decimal,
    pub average_annual_savings: Decimal,
    /// Most recently updated first.
    pub recent: Vec<CalculationSummary>,
    /// Largest monthly savings; ties go to the latest update.
    pub best: Option<CalculationSummary>,
    /// Smallest (most negative) monthly savings; ties go to the latest
    /// update.
    pub worst: Option<CalculationSummary>,
}

impl DashboardSummary {
    pub fn from_calculations(calculations: &[SavedCalculation]) -> Self {
        let total_calculations = calculations.len();
        let favorite_count = calculations.iter().filter(|c| c.is_favorite).count();

        let (average_monthly_savings, average_annual_savings) = if calculations.is_empty() {
            (round_half_up(Decimal::ZERO), round_half_up(Decimal::ZERO))
        } else {
            let sum = calculations.iter().fold(Decimal::ZERO, |acc, c| {
                acc.saturating_add(c.estimate.total_monthly_savings)
            });
            let average = sum / Decimal::from(total_calculations);
            (
                round_half_up(average),
                round_half_up(average.saturating_mul(MONTHS_PER_YEAR)),
            )
        };

        let mut by_recency: Vec<&SavedCalculation> = calculations.iter().collect();
        by_recency.sort_by(|a, b| b.updated_at.cmp(&a.updated_at).then(b.id.cmp(&a.id)));
        let recent = by_recency
            .into_iter()
            .take(RECENT_LIMIT)
            .map(CalculationSummary::from)
            .collect();

        // Ties go to the most recently updated calculation.
        let best = calculations
            .iter()
            .max_by(|a, b| {
                savings(a)
                    .cmp(&savings(b))
                    .then(a.updated_at.cmp(&b.updated_at))
                    .then(a.id.cmp(&b.id))
            })
            .map(CalculationSummary::from);
        let worst = calculations
            .iter()
            .min_by(|a, b| {
                savings(a)
                    .cmp(&savings(b))
                    .then(b.updated_at.cmp(&a.updated_at))
                    .then(b.id.cmp(&a.id))
            })
            .map(CalculationSummary::from);

        Self {
            total_calculations,
            favorite_count,
            average_monthly_savings,
            average_annual_savings,
            recent,
            best,
            worst,
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;
    use crate::models::{LineEstimate, MonthlyExpenses, RelocationEstimate};

    fn line() -> LineEstimate {
        LineEstimate {
            current_amount: dec!(0.00),
            new_amount: dec!(0.00),
        }
    }

    fn calc(
        id: i64,
        monthly_savings: Decimal,
        favorite: bool,
        day: u32,
    ) -> SavedCalculation {
        let at = Utc.with_ymd_and_hms(2025, 1, day, 12, 0, 0).unwrap();
        SavedCalculation {
            id,
            user_id: 1,
            name: format!("scenario {id}"),
            origin_state: "MA".to_string(),
            target_state: "ME".to_string(),
            expenses: MonthlyExpenses::default(),
            gross_annual_income: dec!(80000),
            military_retirement_income: dec!(0),
            disability_income: dec!(0),
            estimate: RelocationEstimate {
                origin_state: "MA".to_string(),
                target_state: "ME".to_string(),
                rent: line(),
                utilities: line(),
                groceries: line(),
                transportation: line(),
                healthcare: line(),
                entertainment: line(),
                current_total: dec!(0.00),
                target_total: dec!(0.00),
                total_monthly_savings: monthly_savings,
                total_annual_savings: monthly_savings * dec!(12),
            },
            is_favorite: favorite,
            created_at: at,
            updated_at: at,
        }
    }

    #[test]
    fn empty_dashboard_has_zero_averages() {
        let summary = DashboardSummary::from_calculations(&[]);

        assert_eq!(summary.total_calculations, 0);
        assert_eq!(summary.average_monthly_savings.to_string(), "0.00");
        assert_eq!(summary.average_annual_savings.to_string(), "0.00");
        assert!(summary.recent.is_empty());
        assert_eq!(summary.best, None);
        assert_eq!(summary.worst, None);
    }

    #[test]
    fn averages_counts_and_extremes() {
        let calcs = vec![
            calc(1, dec!(100.00), true, 1),
            calc(2, dec!(-50.00), false, 2),
            calc(3, dec!(200.01), true, 3),
        ];

        let summary = DashboardSummary::from_calculations(&calcs);

        assert_eq!(summary.total_calculations, 3);
        assert_eq!(summary.favorite_count, 2);
        // 250.01 / 3 = 83.3366..
        assert_eq!(summary.average_monthly_savings, dec!(83.34));
        assert_eq!(summary.average_annual_savings, dec!(1000.04));
        assert_eq!(summary.best.map(|b| b.id), Some(3));
        assert_eq!(summary.worst.map(|w| w.id), Some(2));
    }

    #[test]
    fn recent_is_newest_first_and_capped() {
        let calcs: Vec<_> = (1..=7).map(|i| calc(i, dec!(10), false, i as u32)).collect();

        let summary = DashboardSummary::from_calculations(&calcs);

        let ids: Vec<i64> = summary.recent.iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![7, 6, 5, 4, 3]);
    }

    #[test]
    fn extremes_tie_break_on_latest_update() {
        let calcs = vec![
            calc(1, dec!(75.00), false, 5),
            calc(2, dec!(75.00), false, 9),
            calc(3, dec!(75.00), false, 2),
        ];

        let summary = DashboardSummary::from_calculations(&calcs);

        assert_eq!(summary.best.map(|b| b.id), Some(2));
        assert_eq!(summary.worst.map(|w| w.id), Some(2));
    }

    #[test]
    fn worst_tie_ignores_input_order() {
        let calcs = vec![
            calc(4, dec!(-20.00), false, 8),
            calc(5, dec!(-20.00), false, 3),
            calc(6, dec!(10.00), false, 1),
        ];
        let reversed: Vec<_> = calcs.iter().rev().cloned().collect();

        let forward = DashboardSummary::from_calculations(&calcs);
        let backward = DashboardSummary::from_calculations(&reversed);

        assert_eq!(forward.worst.map(|w| w.id), Some(4));
        assert_eq!(backward.worst.map(|w| w.id), Some(4));
        assert_eq!(forward.best.map(|b| b.id), Some(6));
    }
}

use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::calculations::common::validate_amount;
use crate::error::EstimationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ExpenseCategory {
    Housing,
    Food,
    Utilities,
    Transport,
    Health,
    Misc,
}

impl ExpenseCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Housing => "HOUSING",
            Self::Food => "FOOD",
            Self::Utilities => "UTILITIES",
            Self::Transport => "TRANSPORT",
            Self::Health => "HEALTH",
            Self::Misc => "MISC",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "HOUSING" => Some(Self::Housing),
            "FOOD" => Some(Self::Food),
            "UTILITIES" => Some(Self::Utilities),
            "TRANSPORT" => Some(Self::Transport),
            "HEALTH" => Some(Self::Health),
            "MISC" => Some(Self::Misc),
            _ => None,
        }
    }
}

impl fmt::Display for ExpenseCategory {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One line of a flat expense profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpenseItem {
    pub category: ExpenseCategory,
    pub amount_monthly: Decimal,
    /// Whether the spend is subject to sales tax.
    #[serde(default = "default_taxable")]
    pub taxable: bool,
}

fn default_taxable() -> bool {
    true
}

impl ExpenseItem {
    /// Sum of the taxable lines, used when a caller has no separate figure
    /// for taxable monthly spend. Saturates instead of overflowing.
    pub fn taxable_total(items: &[ExpenseItem]) -> Decimal {
        items
            .iter()
            .filter(|item| item.taxable)
            .fold(Decimal::ZERO, |acc, item| acc.saturating_add(item.amount_monthly))
    }
}

/// The six named monthly expenses used by the index-based relocation estimate.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthlyExpenses {
    pub rent: Decimal,
    pub utilities: Decimal,
    pub groceries: Decimal,
    pub transportation: Decimal,
    pub healthcare: Decimal,
    pub entertainment: Decimal,
}

impl MonthlyExpenses {
    pub fn fields(&self) -> [(&'static str, Decimal); 6] {
        [
            ("rent", self.rent),
            ("utilities", self.utilities),
            ("groceries", self.groceries),
            ("transportation", self.transportation),
            ("healthcare", self.healthcare),
            ("entertainment", self.entertainment),
        ]
    }

    /// Saturating sum of the six fields.
    pub fn total(&self) -> Decimal {
        self.fields()
            .iter()
            .fold(Decimal::ZERO, |acc, (_, amount)| acc.saturating_add(*amount))
    }

    /// Rejects negative amounts and amounts above
    /// [`MAX_AMOUNT`](crate::calculations::common::MAX_AMOUNT).
    pub fn validate(&self) -> Result<(), EstimationError> {
        self.fields()
            .iter()
            .try_for_each(|(field, amount)| validate_amount(field, *amount))
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    fn expenses() -> MonthlyExpenses {
        MonthlyExpenses {
            rent: dec!(1500),
            utilities: dec!(200),
            groceries: dec!(400),
            transportation: dec!(150),
            healthcare: dec!(300),
            entertainment: dec!(200),
        }
    }

    #[test]
    fn total_sums_all_six_fields() {
        assert_eq!(expenses().total(), dec!(2750));
    }

    #[test]
    fn validate_rejects_negative_field() {
        let mut current = expenses();
        current.healthcare = dec!(-1);

        let err = current.validate().unwrap_err();

        assert!(matches!(err, EstimationError::Validation(ref msg) if msg.contains("healthcare")));
    }

    #[test]
    fn validate_rejects_amount_above_cap() {
        let mut current = expenses();
        current.rent = dec!(10000000000);

        let err = current.validate().unwrap_err();

        assert!(matches!(err, EstimationError::Validation(ref msg) if msg.contains("rent must not exceed")));
    }

    #[test]
    fn total_saturates() {
        let current = MonthlyExpenses {
            rent: Decimal::MAX,
            utilities: Decimal::MAX,
            ..MonthlyExpenses::default()
        };

        assert_eq!(current.total(), Decimal::MAX);
    }

    #[test]
    fn taxable_total_skips_untaxed_lines() {
        let items = vec![
            ExpenseItem {
                category: ExpenseCategory::Housing,
                amount_monthly: dec!(1200),
                taxable: false,
            },
            ExpenseItem {
                category: ExpenseCategory::Food,
                amount_monthly: dec!(350.25),
                taxable: true,
            },
            ExpenseItem {
                category: ExpenseCategory::Misc,
                amount_monthly: dec!(80),
                taxable: true,
            },
        ];

        assert_eq!(ExpenseItem::taxable_total(&items), dec!(430.25));
    }

    #[test]
    fn expense_item_deserializes_with_default_taxable() {
        let item: ExpenseItem =
            serde_json::from_str(r#"{"category": "FOOD", "amount_monthly": "400.00"}"#).unwrap();

        assert_eq!(item.category, ExpenseCategory::Food);
        assert_eq!(item.amount_monthly, dec!(400.00));
        assert!(item.taxable);
    }

    #[test]
    fn category_parse_accepts_lowercase() {
        assert_eq!(ExpenseCategory::parse("transport"), Some(ExpenseCategory::Transport));
        assert_eq!(ExpenseCategory::parse("rent"), None);
    }
}

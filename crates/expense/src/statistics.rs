//! Spending broken down by expense type.

use std::collections::BTreeMap;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use sharefair_core::{DomainError, DomainResult, Money};

use crate::record::ExpenseRecord;

/// Share of a project's spending that went to one expense type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpenseTypeShare {
    pub expense_type: String,
    pub total: Money,
    /// Percentage of the project total, two decimals, rounded half down.
    pub percent: Decimal,
    /// e.g. `food(62.50%)`.
    pub label: String,
}

/// Group `records` by expense type, ordered by type name.
///
/// Returns an empty list when there is nothing to divide by.
pub fn expense_type_statistics<'a, I>(records: I) -> DomainResult<Vec<ExpenseTypeShare>>
where
    I: IntoIterator<Item = &'a ExpenseRecord>,
{
    let mut by_type: BTreeMap<String, Money> = BTreeMap::new();
    for record in records {
        let amount = record.amount().ok_or_else(|| {
            DomainError::invalid_state(format!("record {} has no amount", record.id_typed()))
        })?;
        let slot = by_type
            .entry(record.expense_type().to_string())
            .or_insert(Money::ZERO);
        *slot = slot.checked_add(amount)?;
    }

    let grand_total = Money::try_sum(by_type.values().copied())?;
    if grand_total.is_zero() {
        return Ok(Vec::new());
    }

    by_type
        .into_iter()
        .map(|(expense_type, total)| {
            let percent = percent_of(total, grand_total)?;
            let label = format!("{expense_type}({percent}%)");
            Ok(ExpenseTypeShare {
                expense_type,
                total,
                percent,
                label,
            })
        })
        .collect()
}

fn percent_of(part: Money, whole: Money) -> DomainResult<Decimal> {
    let mut percent = part
        .to_decimal()
        .checked_mul(Decimal::ONE_HUNDRED)
        .and_then(|scaled| scaled.checked_div(whole.to_decimal()))
        .ok_or_else(|| DomainError::arithmetic(format!("cannot express {part} as a share of {whole}")))?
        .round_dp_with_strategy(2, RoundingStrategy::MidpointTowardZero);
    percent.rescale(2);
    Ok(percent)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal_macros::dec;
    use sharefair_core::{ProjectId, RecordId, UserId};

    use crate::member::MemberId;
    use crate::record::RecordDetails;

    fn record(amount: &str, expense_type: &str) -> ExpenseRecord {
        ExpenseRecord::new(
            RecordId::new(),
            ProjectId::new(),
            UserId::new(),
            RecordDetails {
                amount: Money::parse(amount).unwrap(),
                date: Utc::now(),
                expense_type: expense_type.to_string(),
                remark: String::new(),
                payer: MemberId::new("p").unwrap(),
                consumers: vec![MemberId::new("a").unwrap()],
            },
        )
        .unwrap()
    }

    #[test]
    fn shares_are_grouped_and_labelled() {
        let records = [record("50", "food"), record("25", "taxi"), record("25", "food")];
        let stats = expense_type_statistics(&records).unwrap();

        assert_eq!(stats.len(), 2);
        assert_eq!(stats[0].expense_type, "food");
        assert_eq!(stats[0].total, Money::parse("75").unwrap());
        assert_eq!(stats[0].percent, dec!(75.00));
        assert_eq!(stats[0].label, "food(75.00%)");
        assert_eq!(stats[1].label, "taxi(25.00%)");
    }

    #[test]
    fn percentages_round_half_down() {
        let records = [record("1", "a"), record("2", "b")];
        let stats = expense_type_statistics(&records).unwrap();
        assert_eq!(stats[0].percent, dec!(33.33));
        assert_eq!(stats[1].percent, dec!(66.67));

        // 0.00125 of the total is 0.125%: the midpoint drops toward zero.
        let records = [record("0.01", "tip"), record("7.99", "meal")];
        let stats = expense_type_statistics(&records).unwrap();
        let tip = stats.iter().find(|s| s.expense_type == "tip").unwrap();
        assert_eq!(tip.percent, dec!(0.12));
    }

    #[test]
    fn no_records_yields_no_shares() {
        let empty: [ExpenseRecord; 0] = [];
        assert!(expense_type_statistics(&empty).unwrap().is_empty());
    }
}

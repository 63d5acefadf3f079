//! Period-cap window math and usage lookup.
//!
//! A `period_cap` rule's window is anchored to calendar boundaries: a
//! one-month cap resets at the start of each calendar month, a two-week cap
//! every two ISO weeks from a fixed Monday epoch. How much the rule has
//! already allocated inside the current window is derived by summing its
//! historical allocations joined to their transactions' ledger dates. No
//! mutable "used so far" counter exists anywhere; usage is a query.

use crate::{
    entities::{Allocation, PeriodUnit, RuleType, allocation, allocation_rule, transaction},
    errors::{Error, Result},
};
use chrono::{Datelike, Duration, NaiveDate};
use sea_orm::{JoinType, QuerySelect, prelude::*};

/// Monday of ISO week 2 of 1970; week windows are counted from here so that
/// every `N`-week cap resets on the same weekday grid for all budgets.
fn week_epoch() -> Result<NaiveDate> {
    NaiveDate::from_ymd_opt(1970, 1, 5).ok_or_else(|| Error::Config {
        message: "invalid week epoch".to_string(),
    })
}

/// Computes the start of the window of length `value` x `unit` that contains
/// `as_of`.
///
/// Months and years are counted from 1970-01 and floored to multiples of
/// `value`; weeks are counted from the Monday epoch the same way. A `1
/// month` cap therefore starts on the first of the current month, and a `2
/// week` cap on the most recent even-indexed Monday.
pub fn window_start(as_of: NaiveDate, value: i32, unit: PeriodUnit) -> Result<NaiveDate> {
    let value = i64::from(value.max(1));

    match unit {
        PeriodUnit::Week => {
            let epoch = week_epoch()?;
            let days = as_of.signed_duration_since(epoch).num_days();
            let week_index = days.div_euclid(7);
            let window_index = week_index.div_euclid(value);
            epoch
                .checked_add_signed(Duration::weeks(window_index * value))
                .ok_or_else(|| Error::Config {
                    message: format!("week window out of range for {as_of}"),
                })
        }
        PeriodUnit::Month => {
            let total_months = i64::from(as_of.year() - 1970) * 12 + i64::from(as_of.month0());
            let start_months = total_months.div_euclid(value) * value;
            let year = 1970 + start_months.div_euclid(12);
            let month = start_months.rem_euclid(12) + 1;
            month_start(year, month).ok_or_else(|| Error::Config {
                message: format!("month window out of range for {as_of}"),
            })
        }
        PeriodUnit::Year => {
            let years = i64::from(as_of.year()) - 1970;
            let start_year = 1970 + years.div_euclid(value) * value;
            month_start(start_year, 1).ok_or_else(|| Error::Config {
                message: format!("year window out of range for {as_of}"),
            })
        }
    }
}

fn month_start(year: i64, month: i64) -> Option<NaiveDate> {
    let year = i32::try_from(year).ok()?;
    let month = u32::try_from(month).ok()?;
    NaiveDate::from_ymd_opt(year, month, 1)
}

/// Sums the cents a `period_cap` rule has already allocated inside its
/// current window, `[window_start, as_of]` inclusive.
///
/// The sum joins the rule's allocation rows to their owning transactions
/// and filters on the transactions' ledger dates - a scan bounded by the
/// window length, consistent with balances being derivable from the ledger
/// rather than accumulated in counters.
pub async fn period_usage<C>(
    db: &C,
    rule: &allocation_rule::Model,
    as_of: NaiveDate,
) -> Result<i64>
where
    C: ConnectionTrait,
{
    if rule.rule_type != RuleType::PeriodCap {
        return Ok(0);
    }

    let (Some(value), Some(unit)) = (rule.cap_period_value, rule.cap_period_unit) else {
        return Err(Error::InvalidRule {
            message: format!("period_cap rule {} is missing its window fields", rule.id),
        });
    };

    let start = window_start(as_of, value, unit)?;

    let rows: Vec<allocation::Model> = Allocation::find()
        .filter(allocation::Column::RuleId.eq(rule.id))
        .join(JoinType::InnerJoin, allocation::Relation::Transaction.def())
        .filter(transaction::Column::Date.between(start, as_of))
        .all(db)
        .await?;

    Ok(rows.iter().map(|row| row.amount).sum())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::core::rule::RuleDraft;
    use crate::test_utils::*;

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    #[test]
    fn test_month_window_starts_on_the_first() -> Result<()> {
        assert_eq!(
            window_start(date(2026, 3, 15), 1, PeriodUnit::Month)?,
            date(2026, 3, 1)
        );
        // The first of the month is its own window start
        assert_eq!(
            window_start(date(2026, 3, 1), 1, PeriodUnit::Month)?,
            date(2026, 3, 1)
        );
        Ok(())
    }

    #[test]
    fn test_multi_month_window_follows_the_1970_grid() -> Result<()> {
        // Three-month windows from 1970-01: Jan-Mar, Apr-Jun, ...
        assert_eq!(
            window_start(date(2026, 5, 20), 3, PeriodUnit::Month)?,
            date(2026, 4, 1)
        );
        assert_eq!(
            window_start(date(2026, 12, 31), 3, PeriodUnit::Month)?,
            date(2026, 10, 1)
        );
        Ok(())
    }

    #[test]
    fn test_week_window_starts_on_monday() -> Result<()> {
        // 2026-08-06 is a Thursday; its ISO week starts Monday 2026-08-03
        assert_eq!(
            window_start(date(2026, 8, 6), 1, PeriodUnit::Week)?,
            date(2026, 8, 3)
        );
        Ok(())
    }

    #[test]
    fn test_two_week_window_keeps_a_fixed_anchor() -> Result<()> {
        // Consecutive weeks fall into the same two-week window until the
        // grid rolls over
        let start = window_start(date(2026, 8, 6), 2, PeriodUnit::Week)?;
        assert_eq!(start.weekday(), chrono::Weekday::Mon);
        assert_eq!(window_start(start, 2, PeriodUnit::Week)?, start);
        assert_eq!(
            window_start(start + Duration::days(13), 2, PeriodUnit::Week)?,
            start
        );
        assert_ne!(
            window_start(start + Duration::days(14), 2, PeriodUnit::Week)?,
            start
        );
        Ok(())
    }

    #[test]
    fn test_year_window_starts_in_january() -> Result<()> {
        assert_eq!(
            window_start(date(2026, 8, 6), 1, PeriodUnit::Year)?,
            date(2026, 1, 1)
        );
        // Two-year windows from 1970: 2026 belongs to the 2026-2027 window
        assert_eq!(
            window_start(date(2026, 8, 6), 2, PeriodUnit::Year)?,
            date(2026, 1, 1)
        );
        assert_eq!(
            window_start(date(2027, 8, 6), 2, PeriodUnit::Year)?,
            date(2026, 1, 1)
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_period_usage_sums_only_the_current_window() -> Result<()> {
        let (db, budget, envelope) = setup_with_envelope().await?;

        let rule = crate::core::rule::create_rule(
            &db,
            budget.id,
            RuleDraft {
                envelope_id: envelope.id,
                rule_type: RuleType::PeriodCap,
                amount: 10_000,
                priority: 0,
                respect_target: false,
                cap_period_value: Some(1),
                cap_period_unit: Some(PeriodUnit::Month),
                name: None,
            },
        )
        .await?;

        // Two allocations inside March, one in February
        let inside_a = create_test_transaction(&db, budget.id, 5_000, date(2026, 3, 2)).await?;
        let inside_b = create_test_transaction(&db, budget.id, 5_000, date(2026, 3, 10)).await?;
        let outside = create_test_transaction(&db, budget.id, 5_000, date(2026, 2, 25)).await?;

        create_test_allocation(&db, inside_a.id, envelope.id, Some(rule.id), 1_200).await?;
        create_test_allocation(&db, inside_b.id, envelope.id, Some(rule.id), 800).await?;
        create_test_allocation(&db, outside.id, envelope.id, Some(rule.id), 9_999).await?;
        // A manual allocation in-window does not count toward the rule
        create_test_allocation(&db, inside_a.id, envelope.id, None, 400).await?;

        let used = period_usage(&db, &rule, date(2026, 3, 15)).await?;
        assert_eq!(used, 2_000);

        Ok(())
    }

    #[tokio::test]
    async fn test_period_usage_ignores_non_cap_rules() -> Result<()> {
        let (db, budget, envelope) = setup_with_envelope().await?;

        let rule = create_test_rule(&db, budget.id, envelope.id, RuleType::Fixed, 1_000, 0).await?;
        let used = period_usage(&db, &rule, date(2026, 3, 15)).await?;
        assert_eq!(used, 0);

        Ok(())
    }
}

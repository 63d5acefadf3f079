//! Preview/apply façade for the allocation rule engine.
//!
//! Both entry points run the same computation: fetch the budget's active
//! rules, envelope snapshots, and period-cap usage, then distribute the
//! income amount. `preview` performs no writes and is safe to call
//! repeatedly and concurrently; `apply` persists the resulting claims as
//! allocation rows and envelope balance updates inside the caller's
//! database transaction.
//!
//! Known boundary condition: two concurrent applies against the same budget
//! each read pre-allocation period usage and can jointly exceed a period
//! cap. Serializing applies per budget is the calling layer's
//! responsibility, not this engine's.

use crate::{
    core::{
        distribution::{Distribution, RuleClaim, distribute},
        envelope::EnvelopeSnapshot,
        period, rule,
    },
    entities::{Budget, RuleType, Transaction, allocation, allocation_rule, transaction},
    errors::{Error, Result},
};
use chrono::{NaiveDate, Utc};
use sea_orm::{JoinType, QuerySelect, Set, TransactionTrait, prelude::*};
use std::collections::HashMap;
use tracing::{debug, info};

/// One allocation line in a preview or apply response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllocationLine {
    /// Envelope receiving the amount
    pub envelope_id: i64,
    /// Allocated cents
    pub amount: i64,
    /// Rule that produced the line
    pub rule_id: i64,
    /// The rule's display label, if any
    pub rule_name: Option<String>,
}

/// The result of previewing (or applying) a distribution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllocationPreview {
    /// The amount that was distributed
    pub income_amount: i64,
    /// Ordered claims produced by the rules
    pub allocations: Vec<AllocationLine>,
    /// The portion left unassigned
    pub unallocated: i64,
}

/// One allocation line of a pool-level apply, including the envelope name
/// for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedLine {
    /// Envelope receiving the amount
    pub envelope_id: i64,
    /// Envelope display name
    pub envelope_name: String,
    /// Allocated cents
    pub amount: i64,
    /// Rule that produced the line
    pub rule_id: i64,
    /// The rule's display label, if any
    pub rule_name: Option<String>,
}

/// The result of applying rules to a budget's ready-to-assign pool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedAllocations {
    /// The pool before the rules ran
    pub initial_unallocated: i64,
    /// Persisted allocation lines
    pub allocations: Vec<AppliedLine>,
    /// The pool after the rules ran
    pub final_unallocated: i64,
}

/// Fetches everything the distribution needs: active rules in evaluation
/// order, snapshots of the budget's live envelopes, and per-rule period
/// usage as of the given ledger date.
async fn gather_inputs<C>(
    db: &C,
    budget_id: i64,
    as_of: NaiveDate,
) -> Result<(
    Vec<allocation_rule::Model>,
    HashMap<i64, EnvelopeSnapshot>,
    HashMap<i64, i64>,
)>
where
    C: ConnectionTrait,
{
    let rules = rule::list_active_rules(db, budget_id).await?;
    let envelopes = crate::core::envelope::get_active_envelopes(db, budget_id).await?;
    let snapshots: HashMap<i64, EnvelopeSnapshot> = envelopes
        .iter()
        .map(|envelope| (envelope.id, EnvelopeSnapshot::from(envelope)))
        .collect();

    let mut usage = HashMap::new();
    for cap_rule in rules.iter().filter(|r| r.rule_type == RuleType::PeriodCap) {
        usage.insert(cap_rule.id, period::period_usage(db, cap_rule, as_of).await?);
    }

    Ok((rules, snapshots, usage))
}

async fn compute<C>(db: &C, budget_id: i64, income_amount: i64, as_of: NaiveDate) -> Result<Distribution>
where
    C: ConnectionTrait,
{
    let (rules, snapshots, usage) = gather_inputs(db, budget_id, as_of).await?;
    debug!(
        budget_id,
        income_amount,
        rule_count = rules.len(),
        "distributing income across allocation rules"
    );
    Ok(distribute(income_amount, &rules, &snapshots, &usage))
}

fn to_lines(claims: &[RuleClaim]) -> Vec<AllocationLine> {
    claims
        .iter()
        .map(|claim| AllocationLine {
            envelope_id: claim.envelope_id,
            amount: claim.amount,
            rule_id: claim.rule_id,
            rule_name: claim.rule_name.clone(),
        })
        .collect()
}

pub(crate) async fn require_budget<C>(db: &C, budget_id: i64) -> Result<()>
where
    C: ConnectionTrait,
{
    Budget::find_by_id(budget_id)
        .one(db)
        .await?
        .map(|_| ())
        .ok_or(Error::BudgetNotFound { id: budget_id })
}

/// Previews how the budget's rules would distribute `income_amount`.
///
/// Runs the full distribution against the currently stored rules, envelope
/// balances, and period usage as of `as_of`, without writing anything.
pub async fn preview(
    db: &DatabaseConnection,
    budget_id: i64,
    income_amount: i64,
    as_of: NaiveDate,
) -> Result<AllocationPreview> {
    require_budget(db, budget_id).await?;
    let distribution = compute(db, budget_id, income_amount, as_of).await?;

    Ok(AllocationPreview {
        income_amount,
        allocations: to_lines(&distribution.claims),
        unallocated: distribution.unallocated,
    })
}

/// Persists one claim set: an allocation row per claim plus the matching
/// envelope balance updates.
async fn persist_claims<C>(db: &C, transaction_id: i64, claims: &[RuleClaim]) -> Result<()>
where
    C: ConnectionTrait,
{
    for claim in claims {
        allocation::ActiveModel {
            transaction_id: Set(transaction_id),
            envelope_id: Set(claim.envelope_id),
            rule_id: Set(Some(claim.rule_id)),
            amount: Set(claim.amount),
            memo: Set(claim.rule_name.clone()),
            ..Default::default()
        }
        .insert(db)
        .await?;

        crate::core::envelope::update_envelope_balance_atomic(db, claim.envelope_id, claim.amount)
            .await?;
    }
    Ok(())
}

/// Runs the identical computation as [`preview`] and persists the claims as
/// allocation rows on `owning_transaction`.
///
/// Must be called inside the same database transaction that owns
/// `owning_transaction`'s insert, so the transaction and its allocations
/// commit or roll back together. The engine itself never partially applies.
pub async fn apply<C>(
    db: &C,
    budget_id: i64,
    owning_transaction: &transaction::Model,
    income_amount: i64,
    as_of: NaiveDate,
) -> Result<AllocationPreview>
where
    C: ConnectionTrait,
{
    let distribution = compute(db, budget_id, income_amount, as_of).await?;
    persist_claims(db, owning_transaction.id, &distribution.claims).await?;

    info!(
        budget_id,
        transaction_id = owning_transaction.id,
        allocated = distribution.total_allocated(),
        unallocated = distribution.unallocated,
        "applied allocation rules"
    );

    Ok(AllocationPreview {
        income_amount,
        allocations: to_lines(&distribution.claims),
        unallocated: distribution.unallocated,
    })
}

/// The budget's "ready to assign" pool: transaction total minus allocation
/// total. Derived from the ledger on every call, never stored.
pub async fn ready_to_assign<C>(db: &C, budget_id: i64) -> Result<i64>
where
    C: ConnectionTrait,
{
    let transactions = Transaction::find()
        .filter(transaction::Column::BudgetId.eq(budget_id))
        .all(db)
        .await?;
    let income_total: i64 = transactions.iter().map(|t| t.amount).sum();

    let allocations = crate::entities::Allocation::find()
        .join(JoinType::InnerJoin, allocation::Relation::Transaction.def())
        .filter(transaction::Column::BudgetId.eq(budget_id))
        .all(db)
        .await?;
    let allocated_total: i64 = allocations.iter().map(|a| a.amount).sum();

    Ok(income_total - allocated_total)
}

/// Applies the budget's rules to its current ready-to-assign pool.
///
/// The persisted allocation rows need an owning transaction, so a
/// zero-amount assignment transaction is recorded to carry them; the
/// derived pool shrinks by exactly the allocated total. When the pool is
/// empty or no rule claims anything, nothing is written.
pub async fn apply_to_ready_pool(
    db: &DatabaseConnection,
    budget_id: i64,
    as_of: NaiveDate,
) -> Result<AppliedAllocations> {
    require_budget(db, budget_id).await?;

    let txn = db.begin().await?;

    let initial_unallocated = ready_to_assign(&txn, budget_id).await?;
    if initial_unallocated <= 0 {
        return Ok(AppliedAllocations {
            initial_unallocated,
            allocations: Vec::new(),
            final_unallocated: initial_unallocated,
        });
    }

    let distribution = compute(&txn, budget_id, initial_unallocated, as_of).await?;
    if distribution.claims.is_empty() {
        return Ok(AppliedAllocations {
            initial_unallocated,
            allocations: Vec::new(),
            final_unallocated: initial_unallocated,
        });
    }

    let marker = transaction::ActiveModel {
        budget_id: Set(budget_id),
        amount: Set(0),
        description: Set("Allocation rules applied".to_string()),
        date: Set(as_of),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    persist_claims(&txn, marker.id, &distribution.claims).await?;

    let mut lines = Vec::with_capacity(distribution.claims.len());
    for claim in &distribution.claims {
        let envelope = crate::core::envelope::get_envelope_by_id(&txn, claim.envelope_id)
            .await?
            .ok_or_else(|| Error::EnvelopeNotFound {
                name: claim.envelope_id.to_string(),
            })?;
        lines.push(AppliedLine {
            envelope_id: claim.envelope_id,
            envelope_name: envelope.name,
            amount: claim.amount,
            rule_id: claim.rule_id,
            rule_name: claim.rule_name.clone(),
        });
    }

    txn.commit().await?;

    info!(
        budget_id,
        initial_unallocated,
        final_unallocated = distribution.unallocated,
        "applied allocation rules to the ready-to-assign pool"
    );

    Ok(AppliedAllocations {
        initial_unallocated,
        allocations: lines,
        final_unallocated: distribution.unallocated,
    })
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::core::rule::RuleDraft;
    use crate::entities::PeriodUnit;
    use crate::test_utils::*;

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    #[tokio::test]
    async fn test_preview_unknown_budget() -> Result<()> {
        let db = setup_test_db().await?;
        let result = preview(&db, 999, 10_000, date(2026, 3, 15)).await;
        assert!(matches!(result.unwrap_err(), Error::BudgetNotFound { id: 999 }));
        Ok(())
    }

    #[tokio::test]
    async fn test_preview_writes_nothing() -> Result<()> {
        let (db, budget, envelope) = setup_with_envelope().await?;
        create_test_rule(&db, budget.id, envelope.id, RuleType::Fixed, 2_000, 0).await?;

        let first = preview(&db, budget.id, 10_000, date(2026, 3, 15)).await?;
        let second = preview(&db, budget.id, 10_000, date(2026, 3, 15)).await?;
        assert_eq!(first, second);

        // The envelope balance is untouched
        let untouched = crate::core::envelope::get_envelope_by_id(&db, envelope.id)
            .await?
            .unwrap();
        assert_eq!(untouched.current_balance, 0);

        Ok(())
    }

    #[tokio::test]
    async fn test_preview_and_apply_compute_identically() -> Result<()> {
        let (db, budget) = setup_with_budget().await?;

        let saving = create_envelope_with_target(&db, budget.id, "Saving", 50_000).await?;
        let spending = create_test_envelope(&db, budget.id, "Spending").await?;
        create_test_rule(&db, budget.id, saving.id, RuleType::Percentage, 3_000, 0).await?;
        create_test_rule(&db, budget.id, spending.id, RuleType::Remainder, 1, 10).await?;

        let previewed = preview(&db, budget.id, 10_000, date(2026, 3, 15)).await?;

        let income =
            crate::core::transaction::create_transaction(&db, budget.id, 10_000, "Payday", date(2026, 3, 15), true)
                .await?;

        let persisted =
            crate::core::transaction::get_allocations_for_transaction(&db, income.id).await?;

        assert_eq!(previewed.allocations.len(), persisted.len());
        for (line, row) in previewed.allocations.iter().zip(&persisted) {
            assert_eq!(line.envelope_id, row.envelope_id);
            assert_eq!(line.amount, row.amount);
            assert_eq!(Some(line.rule_id), row.rule_id);
        }
        assert_eq!(
            previewed.allocations.iter().map(|l| l.amount).sum::<i64>() + previewed.unallocated,
            10_000
        );

        Ok(())
    }

    #[tokio::test]
    async fn test_period_cap_never_exceeded_across_applies() -> Result<()> {
        let (db, budget, envelope) = setup_with_envelope().await?;

        crate::core::rule::create_rule(
            &db,
            budget.id,
            RuleDraft {
                envelope_id: envelope.id,
                rule_type: RuleType::PeriodCap,
                amount: 5_000,
                priority: 0,
                respect_target: false,
                cap_period_value: Some(1),
                cap_period_unit: Some(PeriodUnit::Month),
                name: Some("Fun money cap".to_string()),
            },
        )
        .await?;

        // Three incomes inside one calendar month
        for (amount, day) in [(3_000, 5), (3_000, 12), (3_000, 20)] {
            crate::core::transaction::create_transaction(
                &db,
                budget.id,
                amount,
                "Income",
                date(2026, 3, day),
                true,
            )
            .await?;
        }

        let funded = crate::core::envelope::get_envelope_by_id(&db, envelope.id)
            .await?
            .unwrap();
        // 3000 + 2000 + 0: the cap stops at 5000 for the window
        assert_eq!(funded.current_balance, 5_000);

        // A new window starts in April and the rule claims again
        crate::core::transaction::create_transaction(
            &db,
            budget.id,
            3_000,
            "Income",
            date(2026, 4, 2),
            true,
        )
        .await?;
        let refunded = crate::core::envelope::get_envelope_by_id(&db, envelope.id)
            .await?
            .unwrap();
        assert_eq!(refunded.current_balance, 8_000);

        Ok(())
    }

    #[tokio::test]
    async fn test_ready_to_assign_is_derived_from_the_ledger() -> Result<()> {
        let (db, budget, envelope) = setup_with_envelope().await?;

        assert_eq!(ready_to_assign(&db, budget.id).await?, 0);

        let income = create_test_transaction(&db, budget.id, 10_000, date(2026, 3, 1)).await?;
        assert_eq!(ready_to_assign(&db, budget.id).await?, 10_000);

        create_test_allocation(&db, income.id, envelope.id, None, 4_000).await?;
        assert_eq!(ready_to_assign(&db, budget.id).await?, 6_000);

        Ok(())
    }

    #[tokio::test]
    async fn test_apply_to_ready_pool() -> Result<()> {
        let (db, budget) = setup_with_budget().await?;

        let rent = create_envelope_with_target(&db, budget.id, "Rent", 100_000).await?;
        let spending = create_test_envelope(&db, budget.id, "Spending").await?;
        create_test_rule(&db, budget.id, rent.id, RuleType::FillToTarget, 0, 0).await?;
        create_test_rule(&db, budget.id, spending.id, RuleType::Remainder, 1, 10).await?;

        // Income without rule application builds up the pool
        create_test_transaction(&db, budget.id, 120_000, date(2026, 3, 1)).await?;

        let outcome = apply_to_ready_pool(&db, budget.id, date(2026, 3, 2)).await?;

        assert_eq!(outcome.initial_unallocated, 120_000);
        assert_eq!(outcome.final_unallocated, 0);
        assert_eq!(outcome.allocations.len(), 2);
        assert_eq!(outcome.allocations[0].envelope_name, "Rent");
        assert_eq!(outcome.allocations[0].amount, 100_000);
        assert_eq!(outcome.allocations[1].envelope_name, "Spending");
        assert_eq!(outcome.allocations[1].amount, 20_000);

        // The pool is now empty and a second apply writes nothing
        assert_eq!(ready_to_assign(&db, budget.id).await?, 0);
        let repeat = apply_to_ready_pool(&db, budget.id, date(2026, 3, 3)).await?;
        assert_eq!(repeat.initial_unallocated, 0);
        assert!(repeat.allocations.is_empty());

        Ok(())
    }

    #[tokio::test]
    async fn test_apply_to_ready_pool_without_rules_writes_nothing() -> Result<()> {
        let (db, budget) = setup_with_budget().await?;
        create_test_transaction(&db, budget.id, 10_000, date(2026, 3, 1)).await?;

        let outcome = apply_to_ready_pool(&db, budget.id, date(2026, 3, 2)).await?;
        assert_eq!(outcome.initial_unallocated, 10_000);
        assert_eq!(outcome.final_unallocated, 10_000);
        assert!(outcome.allocations.is_empty());

        // No marker transaction was recorded
        let transactions =
            crate::core::transaction::get_transactions_for_budget(&db, budget.id).await?;
        assert_eq!(transactions.len(), 1);

        Ok(())
    }
}

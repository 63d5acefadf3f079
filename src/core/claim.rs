//! Claim calculators - one pure function per allocation rule kind.
//!
//! Each calculator answers: given this rule, its envelope's snapshot, and
//! the pool still unclaimed, how many cents does the rule take? Results are
//! never negative and never exceed the remaining pool. `remainder` rules are
//! not computed here; they share the leftover pool in a single weighted pass
//! run by the distribution orchestrator.

use crate::core::envelope::EnvelopeSnapshot;
use crate::entities::{RuleType, allocation_rule};

/// Cents still needed to reach the envelope's target, if a target is set.
/// An envelope at or above its target has zero headroom.
pub fn target_headroom(snapshot: &EnvelopeSnapshot) -> Option<i64> {
    snapshot
        .target_balance
        .map(|target| (target - snapshot.current_balance).max(0))
}

/// `fill_to_target`: claim exactly what the envelope is missing.
///
/// Claims 0 when no target is set or the balance already meets it; otherwise
/// `min(target - current, pool)`.
pub fn fill_to_target_claim(snapshot: &EnvelopeSnapshot, remaining_pool: i64) -> i64 {
    match target_headroom(snapshot) {
        Some(headroom) if headroom > 0 => headroom.min(remaining_pool),
        _ => 0,
    }
}

/// `fixed`: claim a fixed number of cents, optionally capped at the target.
pub fn fixed_claim(
    amount: i64,
    respect_target: bool,
    snapshot: &EnvelopeSnapshot,
    remaining_pool: i64,
) -> i64 {
    let mut claim = amount.max(0);
    if respect_target && let Some(headroom) = target_headroom(snapshot) {
        claim = claim.min(headroom);
    }
    claim.min(remaining_pool)
}

/// `percentage`: claim a share of the pool *remaining at execution time*.
///
/// The base claim is `basis_points / 10000` of the current pool, rounded to
/// the nearest cent half-up. Because the share is pool-relative, rule order
/// changes the result: two 50% rules at different priorities take 50% and
/// then 25% of the original amount.
pub fn percentage_claim(
    basis_points: i64,
    respect_target: bool,
    snapshot: &EnvelopeSnapshot,
    remaining_pool: i64,
) -> i64 {
    let mut claim = round_half_up_basis_points(remaining_pool, basis_points);
    if respect_target && let Some(headroom) = target_headroom(snapshot) {
        claim = claim.min(headroom);
    }
    claim.clamp(0, remaining_pool)
}

/// `period_cap`: claim whatever headroom the cap leaves in the current
/// window. `already_used` is the sum of this rule's allocations inside the
/// window, derived from the ledger by the period usage lookup.
pub fn period_cap_claim(cap_amount: i64, already_used: i64, remaining_pool: i64) -> i64 {
    (cap_amount - already_used).max(0).min(remaining_pool)
}

/// Dispatches the claim calculation for one rule by its kind.
///
/// `period_usage` is only consulted for `period_cap` rules. `remainder`
/// rules claim nothing here; the orchestrator's weighted pass handles them.
pub fn claim_for_rule(
    rule: &allocation_rule::Model,
    snapshot: &EnvelopeSnapshot,
    remaining_pool: i64,
    period_usage: i64,
) -> i64 {
    match rule.rule_type {
        RuleType::FillToTarget => fill_to_target_claim(snapshot, remaining_pool),
        RuleType::Fixed => fixed_claim(rule.amount, rule.respect_target, snapshot, remaining_pool),
        RuleType::Percentage => {
            percentage_claim(rule.amount, rule.respect_target, snapshot, remaining_pool)
        }
        RuleType::PeriodCap => period_cap_claim(rule.amount, period_usage, remaining_pool),
        RuleType::Remainder => 0,
    }
}

/// `pool * basis_points / 10000`, rounded to the nearest cent half-up.
fn round_half_up_basis_points(pool: i64, basis_points: i64) -> i64 {
    let scaled = i128::from(pool) * i128::from(basis_points) + 5_000;
    i64::try_from(scaled / 10_000).unwrap_or(i64::MAX)
}

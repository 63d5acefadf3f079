//! Distribution orchestrator - walks a budget's rules over an income amount.
//!
//! A single deterministic pass: rules are sorted by `(priority, id)`,
//! non-remainder rules claim sequentially from a shrinking pool, then all
//! `remainder` rules share whatever is left in one weighted split. The
//! computation is pure; callers fetch rules, snapshots, and period usage
//! immediately before invoking it.

use crate::core::{claim, envelope::EnvelopeSnapshot};
use crate::entities::{RuleType, allocation_rule};
use std::collections::HashMap;

/// One rule's claim within a distribution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleClaim {
    /// The rule that produced the claim
    pub rule_id: i64,
    /// The rule's display label, passed through unmodified
    pub rule_name: Option<String>,
    /// The envelope receiving the amount
    pub envelope_id: i64,
    /// Claimed cents, carrying the income amount's sign
    pub amount: i64,
}

/// The outcome of distributing one income amount.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Distribution {
    /// Ordered claims; rules that claimed 0 are omitted
    pub claims: Vec<RuleClaim>,
    /// The portion of the income left unassigned
    pub unallocated: i64,
}

impl Distribution {
    /// Total cents claimed across all rules.
    pub fn total_allocated(&self) -> i64 {
        self.claims.iter().map(|c| c.amount).sum()
    }
}

/// Distributes `income_amount` across envelopes per the budget's rules.
///
/// Only positive inflows are distributed: a zero or negative amount yields
/// no claims and is returned unallocated in full. Inactive rules and rules
/// whose envelope has no snapshot (e.g. deleted) are skipped. Projected
/// envelope balances are tracked across the pass, so several rules feeding
/// one envelope see each other's claims and target caps hold for the sum.
///
/// `period_usage` maps `period_cap` rule ids to cents already allocated
/// inside their current window; missing entries count as zero usage.
pub fn distribute(
    income_amount: i64,
    rules: &[allocation_rule::Model],
    snapshots: &HashMap<i64, EnvelopeSnapshot>,
    period_usage: &HashMap<i64, i64>,
) -> Distribution {
    if income_amount <= 0 {
        return Distribution {
            claims: Vec::new(),
            unallocated: income_amount,
        };
    }

    let mut ordered: Vec<&allocation_rule::Model> = rules
        .iter()
        .filter(|rule| rule.is_active && snapshots.contains_key(&rule.envelope_id))
        .collect();
    ordered.sort_by_key(|rule| (rule.priority, rule.id));

    let (sequential, remainder): (Vec<_>, Vec<_>) = ordered
        .into_iter()
        .partition(|rule| rule.rule_type != RuleType::Remainder);

    let mut projected = snapshots.clone();
    let mut pool = income_amount;
    let mut claims = Vec::new();

    for rule in sequential {
        if pool == 0 {
            break;
        }
        let Some(snapshot) = projected.get(&rule.envelope_id).copied() else {
            continue;
        };
        let usage = period_usage.get(&rule.id).copied().unwrap_or(0);
        let claimed = claim::claim_for_rule(rule, &snapshot, pool, usage);
        if claimed > 0 {
            pool -= claimed;
            record_claim(&mut claims, &mut projected, rule, claimed);
        }
    }

    if pool > 0 && !remainder.is_empty() {
        pool = run_remainder_pass(&remainder, pool, &mut projected, &mut claims);
    }

    Distribution {
        claims,
        unallocated: pool,
    }
}

/// Splits the leftover pool across remainder rules proportionally to their
/// weights. Every rule but the last claims `floor(pool * weight / total)`;
/// the last rule takes whatever remains, absorbing all rounding slack, so
/// the pass exhausts the pool unless a target cap cuts a share short.
/// Returns the pool left after the pass.
fn run_remainder_pass(
    remainder: &[&allocation_rule::Model],
    pool_at_start: i64,
    projected: &mut HashMap<i64, EnvelopeSnapshot>,
    claims: &mut Vec<RuleClaim>,
) -> i64 {
    let total_weight: i64 = remainder.iter().map(|rule| rule.amount.max(0)).sum();
    if total_weight == 0 {
        return pool_at_start;
    }

    let mut pool = pool_at_start;
    let last_index = remainder.len() - 1;

    for (index, rule) in remainder.iter().enumerate() {
        let share = if index == last_index {
            pool
        } else {
            weighted_share(pool_at_start, rule.amount.max(0), total_weight).min(pool)
        };

        let mut claimed = share;
        if rule.respect_target
            && let Some(snapshot) = projected.get(&rule.envelope_id)
            && let Some(headroom) = claim::target_headroom(snapshot)
        {
            claimed = claimed.min(headroom);
        }

        if claimed > 0 {
            pool -= claimed;
            record_claim(claims, projected, rule, claimed);
        }
    }

    pool
}

/// `floor(pool * weight / total_weight)`.
fn weighted_share(pool: i64, weight: i64, total_weight: i64) -> i64 {
    let scaled = i128::from(pool) * i128::from(weight) / i128::from(total_weight);
    i64::try_from(scaled).unwrap_or(i64::MAX)
}

fn record_claim(
    claims: &mut Vec<RuleClaim>,
    projected: &mut HashMap<i64, EnvelopeSnapshot>,
    rule: &allocation_rule::Model,
    claimed: i64,
) {
    if let Some(snapshot) = projected.get_mut(&rule.envelope_id) {
        snapshot.current_balance += claimed;
    }
    claims.push(RuleClaim {
        rule_id: rule.id,
        rule_name: rule.name.clone(),
        envelope_id: rule.envelope_id,
        amount: claimed,
    });
}

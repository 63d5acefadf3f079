//! Allocation rule authoring - creation, validation, and listing.
//!
//! All rule validation lives here, at authoring time. The distribution
//! engine assumes every stored rule is well-formed and never re-validates
//! mid-computation: a malformed rule is a configuration error, not a runtime
//! branch.

use crate::{
    entities::{AllocationRule, Envelope, PeriodUnit, RuleType, allocation_rule},
    errors::{Error, Result},
};
use sea_orm::{QueryOrder, Set, prelude::*};

/// Field set for creating or updating an allocation rule.
///
/// `priority` is ignored for `period_cap` drafts and stored as 0: period
/// caps do not compete for priority positions at authoring time, though the
/// engine honors whatever priority ends up stored.
#[derive(Debug, Clone)]
pub struct RuleDraft {
    /// Envelope the rule feeds; must belong to the rule's budget
    pub envelope_id: i64,
    /// Which claim calculation applies
    pub rule_type: RuleType,
    /// Cents, basis points, or weight depending on `rule_type`
    pub amount: i64,
    /// Evaluation order, lower first
    pub priority: i32,
    /// Cap claims at the envelope's target balance
    pub respect_target: bool,
    /// Rolling window length multiplier (`period_cap` only)
    pub cap_period_value: Option<i32>,
    /// Rolling window calendar unit (`period_cap` only)
    pub cap_period_unit: Option<PeriodUnit>,
    /// Optional display label
    pub name: Option<String>,
}

/// Validates the pure (non-database) parts of a draft and returns the
/// normalized field values: amount, priority, and `respect_target` after
/// type-specific adjustment.
fn validate_draft_fields(draft: &RuleDraft) -> Result<(i64, i32, bool)> {
    match draft.rule_type {
        RuleType::Fixed | RuleType::PeriodCap => {
            if draft.amount < 1 {
                return Err(Error::InvalidRule {
                    message: format!("amount must be at least 1 cent, got {}", draft.amount),
                });
            }
        }
        RuleType::Percentage => {
            if !(1..=10_000).contains(&draft.amount) {
                return Err(Error::InvalidRule {
                    message: format!(
                        "percentage must be between 1 and 10000 basis points, got {}",
                        draft.amount
                    ),
                });
            }
        }
        RuleType::Remainder => {
            if draft.amount < 1 {
                return Err(Error::InvalidRule {
                    message: format!("remainder weight must be at least 1, got {}", draft.amount),
                });
            }
        }
        RuleType::FillToTarget => {}
    }

    if draft.rule_type == RuleType::PeriodCap {
        match (draft.cap_period_value, draft.cap_period_unit) {
            (Some(value), Some(_)) if value >= 1 => {}
            (Some(value), Some(_)) => {
                return Err(Error::InvalidRule {
                    message: format!("cap period value must be at least 1, got {value}"),
                });
            }
            _ => {
                return Err(Error::InvalidRule {
                    message: "period_cap rules require cap_period_value and cap_period_unit"
                        .to_string(),
                });
            }
        }
    } else if draft.cap_period_value.is_some() || draft.cap_period_unit.is_some() {
        return Err(Error::InvalidRule {
            message: format!("{:?} rules must not carry cap period fields", draft.rule_type),
        });
    }

    // fill_to_target carries no amount; period caps are bounded by the cap itself
    let amount = if draft.rule_type == RuleType::FillToTarget {
        0
    } else {
        draft.amount
    };
    let priority = if draft.rule_type == RuleType::PeriodCap {
        0
    } else {
        draft.priority
    };
    let respect_target = matches!(
        draft.rule_type,
        RuleType::Fixed | RuleType::Percentage | RuleType::Remainder
    ) && draft.respect_target;

    Ok((amount, priority, respect_target))
}

/// Validates the database-backed parts of a draft: the envelope must exist,
/// not be deleted, and belong to the rule's budget; an envelope may carry at
/// most one active `period_cap` rule.
async fn validate_draft_against_db<C>(
    db: &C,
    budget_id: i64,
    draft: &RuleDraft,
    existing_rule_id: Option<i64>,
) -> Result<()>
where
    C: ConnectionTrait,
{
    let envelope = Envelope::find_by_id(draft.envelope_id)
        .one(db)
        .await?
        .ok_or_else(|| Error::EnvelopeNotFound {
            name: draft.envelope_id.to_string(),
        })?;

    if envelope.is_deleted {
        return Err(Error::EnvelopeNotFound {
            name: draft.envelope_id.to_string(),
        });
    }

    if envelope.budget_id != budget_id {
        return Err(Error::InvalidRule {
            message: format!(
                "envelope {} belongs to budget {}, not budget {}",
                envelope.id, envelope.budget_id, budget_id
            ),
        });
    }

    if draft.rule_type == RuleType::PeriodCap {
        let mut query = AllocationRule::find()
            .filter(allocation_rule::Column::EnvelopeId.eq(draft.envelope_id))
            .filter(allocation_rule::Column::RuleType.eq(RuleType::PeriodCap))
            .filter(allocation_rule::Column::IsActive.eq(true));
        if let Some(rule_id) = existing_rule_id {
            query = query.filter(allocation_rule::Column::Id.ne(rule_id));
        }
        if query.one(db).await?.is_some() {
            return Err(Error::InvalidRule {
                message: format!(
                    "envelope {} already has an active period_cap rule",
                    draft.envelope_id
                ),
            });
        }
    }

    Ok(())
}

/// Creates a new allocation rule after full type-specific validation.
///
/// Rejected drafts never reach the database, so the distribution engine can
/// treat every stored rule as well-formed.
pub async fn create_rule<C>(
    db: &C,
    budget_id: i64,
    draft: RuleDraft,
) -> Result<allocation_rule::Model>
where
    C: ConnectionTrait,
{
    let (amount, priority, respect_target) = validate_draft_fields(&draft)?;
    validate_draft_against_db(db, budget_id, &draft, None).await?;

    let rule = allocation_rule::ActiveModel {
        budget_id: Set(budget_id),
        envelope_id: Set(draft.envelope_id),
        rule_type: Set(draft.rule_type),
        amount: Set(amount),
        priority: Set(priority),
        is_active: Set(true),
        respect_target: Set(respect_target),
        cap_period_value: Set(draft.cap_period_value),
        cap_period_unit: Set(draft.cap_period_unit),
        name: Set(draft.name.map(|n| n.trim().to_string())),
        ..Default::default()
    };

    let result = rule.insert(db).await?;
    Ok(result)
}

/// Replaces an existing rule's fields with a validated draft.
pub async fn update_rule(
    db: &DatabaseConnection,
    rule_id: i64,
    draft: RuleDraft,
) -> Result<allocation_rule::Model> {
    let existing = AllocationRule::find_by_id(rule_id)
        .one(db)
        .await?
        .ok_or_else(|| Error::InvalidRule {
            message: format!("allocation rule {rule_id} does not exist"),
        })?;

    let (amount, priority, respect_target) = validate_draft_fields(&draft)?;
    validate_draft_against_db(db, existing.budget_id, &draft, Some(rule_id)).await?;

    let mut active_model: allocation_rule::ActiveModel = existing.into();
    active_model.envelope_id = Set(draft.envelope_id);
    active_model.rule_type = Set(draft.rule_type);
    active_model.amount = Set(amount);
    active_model.priority = Set(priority);
    active_model.respect_target = Set(respect_target);
    active_model.cap_period_value = Set(draft.cap_period_value);
    active_model.cap_period_unit = Set(draft.cap_period_unit);
    active_model.name = Set(draft.name.map(|n| n.trim().to_string()));
    active_model.update(db).await.map_err(Into::into)
}

/// Deactivates a rule; the engine skips inactive rules entirely.
pub async fn deactivate_rule(
    db: &DatabaseConnection,
    rule_id: i64,
) -> Result<allocation_rule::Model> {
    let rule = AllocationRule::find_by_id(rule_id)
        .one(db)
        .await?
        .ok_or_else(|| Error::InvalidRule {
            message: format!("allocation rule {rule_id} does not exist"),
        })?;

    let mut active_model: allocation_rule::ActiveModel = rule.into();
    active_model.is_active = Set(false);
    active_model.update(db).await.map_err(Into::into)
}

/// Finds a rule by its unique ID.
pub async fn get_rule_by_id(
    db: &DatabaseConnection,
    rule_id: i64,
) -> Result<Option<allocation_rule::Model>> {
    AllocationRule::find_by_id(rule_id)
        .one(db)
        .await
        .map_err(Into::into)
}

/// Retrieves all active rules of a budget in evaluation order:
/// ascending priority, ties broken by ascending id for determinism.
pub async fn list_active_rules<C>(db: &C, budget_id: i64) -> Result<Vec<allocation_rule::Model>>
where
    C: ConnectionTrait,
{
    AllocationRule::find()
        .filter(allocation_rule::Column::BudgetId.eq(budget_id))
        .filter(allocation_rule::Column::IsActive.eq(true))
        .order_by_asc(allocation_rule::Column::Priority)
        .order_by_asc(allocation_rule::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

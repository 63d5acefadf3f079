//! Allocation rule entity - A configured policy that automatically claims
//! part of an income amount for one envelope.
//!
//! The meaning of `amount` depends on `rule_type`: cents for `fixed` and
//! `period_cap`, basis points (1/100 of a percent) for `percentage`, a
//! unit-less positive weight for `remainder`, and 0 for `fill_to_target`.
//! Rules evaluate in ascending `priority` order, ties broken by `id`.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// The five kinds of allocation rule.
///
/// This set is closed: every claim calculation dispatches over it with an
/// exhaustive `match`, and unknown kinds cannot be persisted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "snake_case")]
pub enum RuleType {
    /// Top the envelope up to its target balance
    #[sea_orm(string_value = "fill_to_target")]
    FillToTarget,
    /// Claim a fixed number of cents
    #[sea_orm(string_value = "fixed")]
    Fixed,
    /// Claim a percentage (in basis points) of the pool remaining at execution
    #[sea_orm(string_value = "percentage")]
    Percentage,
    /// Split leftover income with other remainder rules, weighted by `amount`
    #[sea_orm(string_value = "remainder")]
    Remainder,
    /// Claim up to a cents ceiling per rolling calendar window
    #[sea_orm(string_value = "period_cap")]
    PeriodCap,
}

/// Calendar unit for a `period_cap` rule's rolling window
#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(8))")]
#[serde(rename_all = "snake_case")]
pub enum PeriodUnit {
    /// ISO weeks, anchored to a fixed Monday epoch
    #[sea_orm(string_value = "week")]
    Week,
    /// Calendar months
    #[sea_orm(string_value = "month")]
    Month,
    /// Calendar years
    #[sea_orm(string_value = "year")]
    Year,
}

/// Allocation rule database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "allocation_rules")]
pub struct Model {
    /// Unique identifier for the rule
    #[sea_orm(primary_key)]
    pub id: i64,
    /// ID of the budget this rule belongs to
    pub budget_id: i64,
    /// ID of the envelope this rule feeds; must belong to the same budget
    pub envelope_id: i64,
    /// Which claim calculation applies
    pub rule_type: RuleType,
    /// Cents, basis points, weight, or 0 - semantics depend on `rule_type`
    pub amount: i64,
    /// Evaluation order; lower values run earlier, ties broken by `id`
    pub priority: i32,
    /// Inactive rules are skipped entirely by the engine
    pub is_active: bool,
    /// Cap the claim so the envelope never exceeds its target balance
    /// (only meaningful for `fixed`, `percentage`, and `remainder`)
    pub respect_target: bool,
    /// Window length multiplier for `period_cap` rules, `None` otherwise
    pub cap_period_value: Option<i32>,
    /// Window calendar unit for `period_cap` rules, `None` otherwise
    pub cap_period_unit: Option<PeriodUnit>,
    /// Optional display label, passed through into allocation results
    pub name: Option<String>,
}

/// Defines relationships between `AllocationRule` and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each rule belongs to one budget
    #[sea_orm(
        belongs_to = "super::budget::Entity",
        from = "Column::BudgetId",
        to = "super::budget::Column::Id"
    )]
    Budget,
    /// Each rule feeds one envelope
    #[sea_orm(
        belongs_to = "super::envelope::Entity",
        from = "Column::EnvelopeId",
        to = "super::envelope::Column::Id"
    )]
    Envelope,
    /// One rule produces many allocations over time
    #[sea_orm(has_many = "super::allocation::Entity")]
    Allocations,
}

impl Related<super::budget::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Budget.def()
    }
}

impl Related<super::envelope::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Envelope.def()
    }
}

impl Related<super::allocation::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Allocations.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

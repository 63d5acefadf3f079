//! Envelope entity - A budget category with its own running balance.
//!
//! Each envelope carries a current balance and an optional savings target,
//! both in integer cents. The balance is maintained alongside allocation
//! writes; the target bounds `fill_to_target` claims and `respect_target`
//! capping in the allocation rule engine.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Envelope database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "envelopes")]
pub struct Model {
    /// Unique identifier for the envelope
    #[sea_orm(primary_key)]
    pub id: i64,
    /// ID of the budget this envelope belongs to
    pub budget_id: i64,
    /// Human-readable name of the envelope (e.g., "Groceries", "Rent")
    pub name: String,
    /// Current balance in cents
    pub current_balance: i64,
    /// Optional savings target in cents; `None` means "no target"
    pub target_balance: Option<i64>,
    /// Soft delete flag - if true, envelope is hidden but data is preserved
    pub is_deleted: bool,
}

/// Defines relationships between Envelope and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each envelope belongs to one budget
    #[sea_orm(
        belongs_to = "super::budget::Entity",
        from = "Column::BudgetId",
        to = "super::budget::Column::Id"
    )]
    Budget,
    /// One envelope has many allocation rules
    #[sea_orm(has_many = "super::allocation_rule::Entity")]
    AllocationRules,
    /// One envelope has many allocations
    #[sea_orm(has_many = "super::allocation::Entity")]
    Allocations,
}

impl Related<super::budget::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Budget.def()
    }
}

impl Related<super::allocation_rule::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::AllocationRules.def()
    }
}

impl Related<super::allocation::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Allocations.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

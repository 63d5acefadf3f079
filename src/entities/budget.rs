//! Budget entity - The top-level ownership unit.
//!
//! A budget owns envelopes, allocation rules, and transactions. Its
//! "ready to assign" pool is never stored; it is derived from the ledger
//! (transaction total minus allocation total).

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Budget database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "budgets")]
pub struct Model {
    /// Unique identifier for the budget
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Human-readable name of the budget (e.g., "Household")
    pub name: String,
    /// When the budget was created
    pub created_at: DateTimeUtc,
}

/// Defines relationships between Budget and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One budget has many envelopes
    #[sea_orm(has_many = "super::envelope::Entity")]
    Envelopes,
    /// One budget has many allocation rules
    #[sea_orm(has_many = "super::allocation_rule::Entity")]
    AllocationRules,
    /// One budget has many transactions
    #[sea_orm(has_many = "super::transaction::Entity")]
    Transactions,
}

impl Related<super::envelope::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Envelopes.def()
    }
}

impl Related<super::allocation_rule::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::AllocationRules.def()
    }
}

impl Related<super::transaction::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Transactions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

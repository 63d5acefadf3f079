//! Allocation entity - Assigns part of a transaction's amount to one envelope.
//!
//! An allocation is the persisted effect of applying a rule (or a manual
//! assignment) to a transaction. `rule_id` is `None` for manual assignments.
//! Rows are immutable once created; they are removed only through the owning
//! transaction's delete path.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Allocation database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "allocations")]
pub struct Model {
    /// Unique identifier for the allocation
    #[sea_orm(primary_key)]
    pub id: i64,
    /// ID of the owning transaction
    pub transaction_id: i64,
    /// ID of the envelope receiving the amount
    pub envelope_id: i64,
    /// ID of the rule that produced this allocation, `None` for manual ones
    pub rule_id: Option<i64>,
    /// Signed amount in cents, matching the owning transaction's sign
    pub amount: i64,
    /// Optional note (rule label or manual memo)
    pub memo: Option<String>,
}

/// Defines relationships between Allocation and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each allocation belongs to one transaction
    #[sea_orm(
        belongs_to = "super::transaction::Entity",
        from = "Column::TransactionId",
        to = "super::transaction::Column::Id"
    )]
    Transaction,
    /// Each allocation targets one envelope
    #[sea_orm(
        belongs_to = "super::envelope::Entity",
        from = "Column::EnvelopeId",
        to = "super::envelope::Column::Id"
    )]
    Envelope,
    /// Each allocation may originate from one rule
    #[sea_orm(
        belongs_to = "super::allocation_rule::Entity",
        from = "Column::RuleId",
        to = "super::allocation_rule::Column::Id"
    )]
    AllocationRule,
}

impl Related<super::transaction::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Transaction.def()
    }
}

impl Related<super::envelope::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Envelope.def()
    }
}

impl Related<super::allocation_rule::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::AllocationRule.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

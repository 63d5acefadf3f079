//! Transaction entity - A budget-level ledger entry.
//!
//! Transactions carry a signed amount in cents (positive for income) and a
//! ledger `date` used for period-cap window math. Allocations assign parts
//! of a transaction's amount to envelopes and are deleted with it.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Transaction database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "transactions")]
pub struct Model {
    /// Unique identifier for the transaction
    #[sea_orm(primary_key)]
    pub id: i64,
    /// ID of the budget this transaction belongs to
    pub budget_id: i64,
    /// Signed amount in cents (positive for income, negative for spending)
    pub amount: i64,
    /// Human-readable description of the transaction
    pub description: String,
    /// Ledger date; period-cap windows are evaluated against this
    pub date: Date,
    /// When the transaction row was created
    pub created_at: DateTimeUtc,
}

/// Defines relationships between Transaction and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each transaction belongs to one budget
    #[sea_orm(
        belongs_to = "super::budget::Entity",
        from = "Column::BudgetId",
        to = "super::budget::Column::Id"
    )]
    Budget,
    /// One transaction has many allocations
    #[sea_orm(has_many = "super::allocation::Entity")]
    Allocations,
}

impl Related<super::budget::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Budget.def()
    }
}

impl Related<super::allocation::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Allocations.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

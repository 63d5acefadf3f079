//! Entity module - Contains all SeaORM entity definitions for the database.
//! These entities represent the database tables and their relationships.
//! Each entity has a Model struct for data and an Entity struct for operations.

pub mod allocation;
pub mod allocation_rule;
pub mod budget;
pub mod envelope;
pub mod transaction;

// Re-export specific types to avoid conflicts
pub use allocation::{Column as AllocationColumn, Entity as Allocation, Model as AllocationModel};
pub use allocation_rule::{
    Column as AllocationRuleColumn, Entity as AllocationRule, Model as AllocationRuleModel,
    PeriodUnit, RuleType,
};
pub use budget::{Column as BudgetColumn, Entity as Budget, Model as BudgetModel};
pub use envelope::{Column as EnvelopeColumn, Entity as Envelope, Model as EnvelopeModel};
pub use transaction::{
    Column as TransactionColumn, Entity as Transaction, Model as TransactionModel,
};

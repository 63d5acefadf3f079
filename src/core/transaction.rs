//! Transaction business logic - the persistence contract of the engine.
//!
//! Income transactions are budget-level ledger entries. When rule
//! application is requested, the resulting allocations are created
//! atomically alongside the transaction row; deleting a transaction deletes
//! its allocations and reverses their effect on envelope balances. All
//! functions are async and return Result types for proper error handling.

use crate::{
    core::allocation::apply,
    entities::{Allocation, Transaction, allocation, transaction},
    errors::{Error, Result},
};
use chrono::{NaiveDate, Utc};
use sea_orm::{QueryOrder, Set, TransactionTrait, prelude::*};

/// Creates a transaction and, when requested, applies the budget's
/// allocation rules to it in the same database transaction.
///
/// The amount must be nonzero. Rules only distribute positive inflows, so
/// `apply_rules` is ignored for negative amounts. Either the transaction
/// row and all of its allocations are committed together, or none of them
/// are.
pub async fn create_transaction(
    db: &DatabaseConnection,
    budget_id: i64,
    amount: i64,
    description: &str,
    date: NaiveDate,
    apply_rules: bool,
) -> Result<transaction::Model> {
    if amount == 0 {
        return Err(Error::InvalidAmount { amount });
    }

    crate::core::allocation::require_budget(db, budget_id).await?;

    let txn = db.begin().await?;

    let created = transaction::ActiveModel {
        budget_id: Set(budget_id),
        amount: Set(amount),
        description: Set(description.to_string()),
        date: Set(date),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    if apply_rules && amount > 0 {
        apply(&txn, budget_id, &created, amount, date).await?;
    }

    txn.commit().await?;

    Ok(created)
}

/// Retrieves a specific transaction by its unique ID.
pub async fn get_transaction_by_id(
    db: &DatabaseConnection,
    transaction_id: i64,
) -> Result<Option<transaction::Model>> {
    Transaction::find_by_id(transaction_id)
        .one(db)
        .await
        .map_err(Into::into)
}

/// Retrieves all transactions of a budget, newest ledger date first.
pub async fn get_transactions_for_budget(
    db: &DatabaseConnection,
    budget_id: i64,
) -> Result<Vec<transaction::Model>> {
    Transaction::find()
        .filter(transaction::Column::BudgetId.eq(budget_id))
        .order_by_desc(transaction::Column::Date)
        .order_by_desc(transaction::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Retrieves the allocations created for one transaction.
pub async fn get_allocations_for_transaction<C>(
    db: &C,
    transaction_id: i64,
) -> Result<Vec<allocation::Model>>
where
    C: ConnectionTrait,
{
    Allocation::find()
        .filter(allocation::Column::TransactionId.eq(transaction_id))
        .order_by_asc(allocation::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Deletes a transaction together with its allocations, reversing each
/// allocation's effect on its envelope balance.
pub async fn delete_transaction(db: &DatabaseConnection, transaction_id: i64) -> Result<()> {
    let txn = db.begin().await?;

    let transaction = Transaction::find_by_id(transaction_id)
        .one(&txn)
        .await?
        .ok_or(Error::TransactionNotFound { id: transaction_id })?;

    let allocations = get_allocations_for_transaction(&txn, transaction_id).await?;
    for row in &allocations {
        crate::core::envelope::update_envelope_balance_atomic(&txn, row.envelope_id, -row.amount)
            .await?;
    }

    Allocation::delete_many()
        .filter(allocation::Column::TransactionId.eq(transaction_id))
        .exec(&txn)
        .await?;

    transaction.delete(&txn).await?;

    txn.commit().await?;
    Ok(())
}

//! Envelope business logic - Handles all envelope-related operations.
//!
//! Provides functions for creating, retrieving, and managing envelopes, plus
//! the read-only [`EnvelopeSnapshot`] view the allocation rule engine
//! consumes. All functions are async and return Result types for error
//! handling.

use crate::{
    entities::{Budget, Envelope, envelope},
    errors::{Error, Result},
};
use sea_orm::{QueryOrder, Set, prelude::*};

/// Read-only view of an envelope as the allocation rule engine sees it.
///
/// `target_balance` being `None` means "no target": `fill_to_target` claims
/// zero and `respect_target` capping is disabled for this envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnvelopeSnapshot {
    /// Current balance in cents
    pub current_balance: i64,
    /// Savings target in cents, if one is set
    pub target_balance: Option<i64>,
}

impl From<&envelope::Model> for EnvelopeSnapshot {
    fn from(model: &envelope::Model) -> Self {
        Self {
            current_balance: model.current_balance,
            target_balance: model.target_balance,
        }
    }
}

/// Retrieves all active (non-deleted) envelopes of a budget, ordered by name.
///
/// This is the snapshot source for the allocation rule engine and the
/// standard listing for display purposes.
pub async fn get_active_envelopes<C>(db: &C, budget_id: i64) -> Result<Vec<envelope::Model>>
where
    C: ConnectionTrait,
{
    Envelope::find()
        .filter(envelope::Column::BudgetId.eq(budget_id))
        .filter(envelope::Column::IsDeleted.eq(false))
        .order_by_asc(envelope::Column::Name)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Finds an envelope by its unique ID, used for direct envelope lookups.
pub async fn get_envelope_by_id<C>(db: &C, envelope_id: i64) -> Result<Option<envelope::Model>>
where
    C: ConnectionTrait,
{
    Envelope::find_by_id(envelope_id)
        .one(db)
        .await
        .map_err(Into::into)
}

/// Finds a non-deleted envelope by name within a budget.
pub async fn get_envelope_by_name(
    db: &DatabaseConnection,
    budget_id: i64,
    name: &str,
) -> Result<Option<envelope::Model>> {
    Envelope::find()
        .filter(envelope::Column::BudgetId.eq(budget_id))
        .filter(envelope::Column::Name.eq(name))
        .filter(envelope::Column::IsDeleted.eq(false))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Creates a new envelope with the specified parameters, performing input validation.
///
/// Validates that the name is not empty, that the target balance (if any) is
/// not negative, and that the owning budget exists. The envelope starts with
/// a zero balance.
pub async fn create_envelope<C>(
    db: &C,
    budget_id: i64,
    name: String,
    target_balance: Option<i64>,
) -> Result<envelope::Model>
where
    C: ConnectionTrait,
{
    if name.trim().is_empty() {
        return Err(Error::Config {
            message: "Envelope name cannot be empty".to_string(),
        });
    }

    if let Some(target) = target_balance
        && target < 0
    {
        return Err(Error::InvalidAmount { amount: target });
    }

    Budget::find_by_id(budget_id)
        .one(db)
        .await?
        .ok_or(Error::BudgetNotFound { id: budget_id })?;

    let envelope = envelope::ActiveModel {
        budget_id: Set(budget_id),
        name: Set(name.trim().to_string()),
        current_balance: Set(0),
        target_balance: Set(target_balance),
        is_deleted: Set(false),
        ..Default::default()
    };

    let result = envelope.insert(db).await?;
    Ok(result)
}

/// Updates the balance of an existing envelope by atomically adding an amount.
///
/// This function performs an atomic database-level update to prevent race
/// conditions. Instead of reading the current balance, modifying it, and
/// writing it back (which can lose updates in concurrent scenarios), this
/// uses a single SQL UPDATE statement:
/// `UPDATE envelopes SET current_balance = current_balance + amount WHERE id = ?`
///
/// # Arguments
/// * `db` - Database connection or transaction
/// * `envelope_id` - ID of the envelope to update
/// * `amount_delta` - Cents to add to the balance (negative to subtract)
///
/// # Returns
/// The updated envelope model
pub async fn update_envelope_balance_atomic<C>(
    db: &C,
    envelope_id: i64,
    amount_delta: i64,
) -> Result<envelope::Model>
where
    C: ConnectionTrait,
{
    use sea_orm::sea_query::Expr;

    // First verify the envelope exists
    let _envelope = Envelope::find_by_id(envelope_id)
        .one(db)
        .await?
        .ok_or_else(|| Error::EnvelopeNotFound {
            name: envelope_id.to_string(),
        })?;

    Envelope::update_many()
        .col_expr(
            envelope::Column::CurrentBalance,
            Expr::col(envelope::Column::CurrentBalance).add(amount_delta),
        )
        .filter(envelope::Column::Id.eq(envelope_id))
        .exec(db)
        .await?;

    Envelope::find_by_id(envelope_id)
        .one(db)
        .await?
        .ok_or_else(|| Error::EnvelopeNotFound {
            name: envelope_id.to_string(),
        })
}

/// Sets or clears an envelope's savings target.
pub async fn set_target_balance(
    db: &DatabaseConnection,
    envelope_id: i64,
    target_balance: Option<i64>,
) -> Result<envelope::Model> {
    if let Some(target) = target_balance
        && target < 0
    {
        return Err(Error::InvalidAmount { amount: target });
    }

    let envelope = Envelope::find_by_id(envelope_id)
        .one(db)
        .await?
        .ok_or_else(|| Error::EnvelopeNotFound {
            name: envelope_id.to_string(),
        })?;

    let mut active_model: envelope::ActiveModel = envelope.into();
    active_model.target_balance = Set(target_balance);
    active_model.update(db).await.map_err(Into::into)
}

/// Soft-deletes an envelope, hiding it from listings while preserving its
/// ledger history.
pub async fn soft_delete_envelope(
    db: &DatabaseConnection,
    envelope_id: i64,
) -> Result<envelope::Model> {
    let envelope = Envelope::find_by_id(envelope_id)
        .one(db)
        .await?
        .ok_or_else(|| Error::EnvelopeNotFound {
            name: envelope_id.to_string(),
        })?;

    let mut active_model: envelope::ActiveModel = envelope.into();
    active_model.is_deleted = Set(true);
    active_model.update(db).await.map_err(Into::into)
}

//! Shared test utilities for `EnvelopeLedger`.
//!
//! This module provides common helper functions for setting up test
//! databases and creating test entities with sensible defaults.

use crate::{
    core::{envelope, rule, transaction},
    entities::{self, PeriodUnit, RuleType},
    errors::Result,
};
use chrono::{NaiveDate, Utc};
use sea_orm::{DatabaseConnection, Set, prelude::*};

/// Creates an in-memory `SQLite` database with all tables initialized.
/// This is the standard setup for all integration tests.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// Creates a test budget with the given name.
pub async fn create_test_budget(
    db: &DatabaseConnection,
    name: &str,
) -> Result<entities::budget::Model> {
    entities::budget::ActiveModel {
        name: Set(name.to_string()),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await
    .map_err(Into::into)
}

/// Creates a test envelope with no savings target and a zero balance.
pub async fn create_test_envelope(
    db: &DatabaseConnection,
    budget_id: i64,
    name: &str,
) -> Result<entities::envelope::Model> {
    envelope::create_envelope(db, budget_id, name.to_string(), None).await
}

/// Creates a test envelope with a savings target.
pub async fn create_envelope_with_target(
    db: &DatabaseConnection,
    budget_id: i64,
    name: &str,
    target_balance: i64,
) -> Result<entities::envelope::Model> {
    envelope::create_envelope(db, budget_id, name.to_string(), Some(target_balance)).await
}

/// Creates a test rule through the normal authoring path.
///
/// Window fields are left empty, so this is only suitable for rule kinds
/// other than `period_cap`; build those through `rule::create_rule` with an
/// explicit draft.
pub async fn create_test_rule(
    db: &DatabaseConnection,
    budget_id: i64,
    envelope_id: i64,
    rule_type: RuleType,
    amount: i64,
    priority: i32,
) -> Result<entities::allocation_rule::Model> {
    rule::create_rule(
        db,
        budget_id,
        rule::RuleDraft {
            envelope_id,
            rule_type,
            amount,
            priority,
            respect_target: false,
            cap_period_value: None,
            cap_period_unit: None,
            name: None,
        },
    )
    .await
}

/// Creates a test transaction without applying any allocation rules.
pub async fn create_test_transaction(
    db: &DatabaseConnection,
    budget_id: i64,
    amount: i64,
    date: NaiveDate,
) -> Result<entities::transaction::Model> {
    transaction::create_transaction(db, budget_id, amount, "Test transaction", date, false).await
}

/// Inserts a raw allocation row, bypassing the engine. Useful for building
/// ledger history fixtures (period-cap usage, ready-to-assign math).
pub async fn create_test_allocation(
    db: &DatabaseConnection,
    transaction_id: i64,
    envelope_id: i64,
    rule_id: Option<i64>,
    amount: i64,
) -> Result<entities::allocation::Model> {
    entities::allocation::ActiveModel {
        transaction_id: Set(transaction_id),
        envelope_id: Set(envelope_id),
        rule_id: Set(rule_id),
        amount: Set(amount),
        memo: Set(None),
        ..Default::default()
    }
    .insert(db)
    .await
    .map_err(Into::into)
}

/// Builds an in-memory rule model for pure engine tests (no database).
pub fn rule_model(
    id: i64,
    envelope_id: i64,
    rule_type: RuleType,
    amount: i64,
    priority: i32,
) -> entities::allocation_rule::Model {
    rule_model_with(id, envelope_id, rule_type, amount, priority, false)
}

/// Like [`rule_model`], with an explicit `respect_target` flag.
pub fn rule_model_with(
    id: i64,
    envelope_id: i64,
    rule_type: RuleType,
    amount: i64,
    priority: i32,
    respect_target: bool,
) -> entities::allocation_rule::Model {
    let (cap_period_value, cap_period_unit) = if rule_type == RuleType::PeriodCap {
        (Some(1), Some(PeriodUnit::Month))
    } else {
        (None, None)
    };
    entities::allocation_rule::Model {
        id,
        budget_id: 1,
        envelope_id,
        rule_type,
        amount,
        priority,
        is_active: true,
        respect_target,
        cap_period_value,
        cap_period_unit,
        name: None,
    }
}

/// Sets up a complete test environment with a budget.
/// Returns (db, budget) for common test scenarios.
pub async fn setup_with_budget() -> Result<(DatabaseConnection, entities::budget::Model)> {
    let db = setup_test_db().await?;
    let budget = create_test_budget(&db, "Test Budget").await?;
    Ok((db, budget))
}

/// Sets up a complete test environment with a budget and one envelope.
/// Returns (db, budget, envelope) for common test scenarios.
pub async fn setup_with_envelope() -> Result<(
    DatabaseConnection,
    entities::budget::Model,
    entities::envelope::Model,
)> {
    let db = setup_test_db().await?;
    let budget = create_test_budget(&db, "Test Budget").await?;
    let envelope = create_test_envelope(&db, budget.id, "Test Envelope").await?;
    Ok((db, budget, envelope))
}

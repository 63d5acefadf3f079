//! Database configuration module for `EnvelopeLedger`.
//!
//! This module handles `SQLite` database connection and table creation using
//! `SeaORM`. Table creation uses `Schema::create_table_from_entity`, so the
//! database schema always matches the Rust entity definitions without
//! manual SQL.

use crate::entities::{Allocation, AllocationRule, Budget, Envelope, Transaction};
use crate::errors::Result;
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, Schema};

/// Default `SQLite` location when `DATABASE_URL` is not set.
pub const DEFAULT_DATABASE_URL: &str = "sqlite://data/envelope_ledger.sqlite?mode=rwc";

/// Establishes a connection to the database at the given URL.
pub async fn create_connection(database_url: &str) -> Result<DatabaseConnection> {
    Database::connect(database_url).await.map_err(Into::into)
}

/// Creates all necessary database tables from the entity definitions.
///
/// Tables are created in dependency order (budgets before the rows that
/// reference them) and creation is idempotent, so this is safe to run on
/// every startup.
pub async fn create_tables(db: &DatabaseConnection) -> Result<()> {
    let builder = db.get_database_backend();
    let schema = Schema::new(builder);

    let mut budget_table = schema.create_table_from_entity(Budget);
    let mut envelope_table = schema.create_table_from_entity(Envelope);
    let mut rule_table = schema.create_table_from_entity(AllocationRule);
    let mut transaction_table = schema.create_table_from_entity(Transaction);
    let mut allocation_table = schema.create_table_from_entity(Allocation);

    db.execute(builder.build(budget_table.if_not_exists())).await?;
    db.execute(builder.build(envelope_table.if_not_exists())).await?;
    db.execute(builder.build(rule_table.if_not_exists())).await?;
    db.execute(builder.build(transaction_table.if_not_exists())).await?;
    db.execute(builder.build(allocation_table.if_not_exists())).await?;

    Ok(())
}

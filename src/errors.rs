//! Unified error types and result handling for `EnvelopeLedger`.
//!
//! All fallible operations in the crate return [`Result`], propagating a
//! single [`Error`] enum. Rule configuration problems are rejected at
//! authoring time and surface as [`Error::InvalidRule`]; the distribution
//! engine itself never produces configuration errors mid-computation.

use thiserror::Error;

/// Unified error type for all `EnvelopeLedger` operations
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration loading or parsing failed
    #[error("Configuration error: {message}")]
    Config {
        /// Human-readable description of what went wrong
        message: String,
    },

    /// Database operation failed
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// I/O error (config file reads, etc.)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Environment variable lookup failed
    #[error("Environment variable error: {0}")]
    EnvVar(#[from] std::env::VarError),

    /// A money amount was rejected (zero transaction, negative target, ...)
    #[error("Invalid amount: {amount}")]
    InvalidAmount {
        /// The offending amount in cents
        amount: i64,
    },

    /// An allocation rule failed authoring-time validation
    #[error("Invalid allocation rule: {message}")]
    InvalidRule {
        /// What the rule violated
        message: String,
    },

    /// The requested budget does not exist
    #[error("Budget not found: {id}")]
    BudgetNotFound {
        /// Budget primary key
        id: i64,
    },

    /// The requested envelope does not exist or is deleted
    #[error("Envelope not found: {name}")]
    EnvelopeNotFound {
        /// Envelope name or id used in the lookup
        name: String,
    },

    /// The requested transaction does not exist
    #[error("Transaction not found: {id}")]
    TransactionNotFound {
        /// Transaction primary key
        id: i64,
    },
}

// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;

//! `EnvelopeLedger` - an envelope-budgeting ledger core
//!
//! This crate implements an envelope-budgeting ledger whose centerpiece is
//! the allocation rule engine: given an income amount and a budget's
//! ordered rules, it produces a deterministic distribution across envelopes
//! with five claim kinds, partial fulfillment when money runs out, weighted
//! remainder splitting, and rolling period caps derived from the immutable
//! ledger rather than stored counters. Distributions can be previewed
//! without side effects or applied atomically alongside the owning
//! transaction.

// Deny the most critical lints that could lead to bugs or security issues
#![deny(
    unsafe_code,
    unsafe_op_in_unsafe_fn,
    unreachable_code,
    unreachable_patterns,
    unused_must_use,
    rustdoc::broken_intra_doc_links,
    rustdoc::private_intra_doc_links,
)]
// Warn on things that should be fixed but aren't necessarily bugs
#![warn(
    missing_docs,
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    clippy::clone_on_ref_ptr,
    clippy::dbg_macro,
    clippy::expect_used,
    clippy::panic,
    clippy::todo,
    clippy::unimplemented,
    clippy::unwrap_used,
    future_incompatible,
    rust_2018_idioms,
)]
// Allow some pedantic lints that are too noisy or not applicable
#![allow(
    clippy::module_name_repetitions,  // Common pattern in Rust
    clippy::missing_errors_doc,        // Will add gradually
    clippy::missing_panics_doc,        // Will add gradually
)]

/// Configuration management for database and application settings
pub mod config;
/// Core business logic - envelopes, rules, transactions, and the
/// allocation engine
pub mod core;
/// SeaORM entity definitions for database tables
pub mod entities;
/// Unified error types and result handling
pub mod errors;

#[cfg(test)]
pub mod test_utils;

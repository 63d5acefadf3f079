//! Seed configuration loading from config.toml
//!
//! This module loads the initial budget, envelope, and allocation rule
//! definitions from a TOML configuration file and seeds the database with
//! them. Envelopes are inserted when missing (matched by name); rules are
//! only seeded into a budget that has none yet, so reruns never duplicate
//! or fight with rules edited afterwards.

use crate::{
    core::rule::RuleDraft,
    entities::{AllocationRule, Budget, PeriodUnit, RuleType, allocation_rule, budget},
    errors::{Error, Result},
};
use chrono::Utc;
use sea_orm::{Set, prelude::*};
use serde::Deserialize;
use std::path::Path;
use tracing::{debug, info};

/// Configuration structure representing the entire config.toml file
#[derive(Debug, Deserialize)]
pub struct SeedConfig {
    /// Name of the budget to create or reuse
    pub budget: String,
    /// Envelopes to seed
    #[serde(default)]
    pub envelopes: Vec<EnvelopeSeed>,
    /// Allocation rules to seed (only into a budget without rules)
    #[serde(default)]
    pub rules: Vec<RuleSeed>,
}

/// Configuration for a single envelope
#[derive(Debug, Deserialize, Clone)]
pub struct EnvelopeSeed {
    /// Name of the envelope
    pub name: String,
    /// Optional savings target in cents
    #[serde(default)]
    pub target_balance: Option<i64>,
}

/// Configuration for a single allocation rule
#[derive(Debug, Deserialize, Clone)]
pub struct RuleSeed {
    /// Name of the envelope the rule feeds
    pub envelope: String,
    /// Rule kind: `fill_to_target`, `fixed`, `percentage`, `remainder`,
    /// or `period_cap`
    pub rule_type: RuleType,
    /// Cents, basis points, or weight depending on `rule_type`
    #[serde(default)]
    pub amount: i64,
    /// Evaluation order, lower first
    #[serde(default)]
    pub priority: i32,
    /// Cap claims at the envelope's target balance
    #[serde(default)]
    pub respect_target: bool,
    /// Rolling window length multiplier (`period_cap` only)
    #[serde(default)]
    pub cap_period_value: Option<i32>,
    /// Rolling window calendar unit (`period_cap` only)
    #[serde(default)]
    pub cap_period_unit: Option<PeriodUnit>,
    /// Optional display label
    #[serde(default)]
    pub name: Option<String>,
}

/// Loads seed configuration from a TOML file
///
/// # Errors
/// Returns an error if:
/// - The file cannot be read
/// - The TOML syntax is invalid
/// - Required fields are missing
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<SeedConfig> {
    let path_ref = path.as_ref();
    debug!("Attempting to load seed configuration from: {:?}", path_ref);
    let contents = std::fs::read_to_string(path_ref).map_err(|e| Error::Config {
        message: format!("Failed to read config file {path_ref:?}: {e}"),
    })?;

    toml::from_str(&contents).map_err(|e| Error::Config {
        message: format!("Failed to parse config file {path_ref:?}: {e}"),
    })
}

/// Seeds the database from a loaded configuration and returns the budget.
///
/// The budget and envelopes are created when missing, matched by name.
/// Rules go through the normal authoring validation, so a malformed seed
/// fails loudly instead of planting rules the engine would have to doubt.
pub async fn seed_database(
    db: &DatabaseConnection,
    config: &SeedConfig,
) -> Result<budget::Model> {
    let budget = match Budget::find()
        .filter(budget::Column::Name.eq(config.budget.as_str()))
        .one(db)
        .await?
    {
        Some(existing) => existing,
        None => {
            info!("Creating budget '{}'", config.budget);
            budget::ActiveModel {
                name: Set(config.budget.clone()),
                created_at: Set(Utc::now()),
                ..Default::default()
            }
            .insert(db)
            .await?
        }
    };

    for seed in &config.envelopes {
        let existing =
            crate::core::envelope::get_envelope_by_name(db, budget.id, &seed.name).await?;
        if existing.is_some() {
            debug!("Envelope '{}' already exists, skipping", seed.name);
            continue;
        }
        info!("Seeding envelope '{}'", seed.name);
        crate::core::envelope::create_envelope(
            db,
            budget.id,
            seed.name.clone(),
            seed.target_balance,
        )
        .await?;
    }

    let existing_rules = AllocationRule::find()
        .filter(allocation_rule::Column::BudgetId.eq(budget.id))
        .all(db)
        .await?;
    if !existing_rules.is_empty() {
        debug!(
            "Budget '{}' already has {} rules, skipping rule seeding",
            config.budget,
            existing_rules.len()
        );
        return Ok(budget);
    }

    for seed in &config.rules {
        let envelope = crate::core::envelope::get_envelope_by_name(db, budget.id, &seed.envelope)
            .await?
            .ok_or_else(|| Error::Config {
                message: format!("Rule references unknown envelope '{}'", seed.envelope),
            })?;

        info!(
            "Seeding {:?} rule for envelope '{}'",
            seed.rule_type, seed.envelope
        );
        crate::core::rule::create_rule(
            db,
            budget.id,
            RuleDraft {
                envelope_id: envelope.id,
                rule_type: seed.rule_type,
                amount: seed.amount,
                priority: seed.priority,
                respect_target: seed.respect_target,
                cap_period_value: seed.cap_period_value,
                cap_period_unit: seed.cap_period_unit,
                name: seed.name.clone(),
            },
        )
        .await?;
    }

    Ok(budget)
}

//! One-shot runner for the allocation rule engine.
//!
//! `envelope-ledger preview <cents>` prints how the configured budget's
//! rules would distribute an income amount; `envelope-ledger apply` applies
//! them to the budget's current ready-to-assign pool. The budget,
//! envelopes, and rules are seeded from `config.toml` on first run.

use dotenvy::dotenv;
use envelope_ledger::{
    config,
    core::allocation,
    errors::{Error, Result},
};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Initialize tracing (as early as possible)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 2. Load .env file (non-fatal, env vars can be set externally)
    dotenv().ok();

    // 3. Load the application configuration
    let app_config = config::load_app_configuration()?;

    // 4. Initialize the database
    let db = config::database::create_connection(&app_config.database_url)
        .await
        .inspect(|_| info!("Database connection established."))
        .inspect_err(|e| error!("Failed to connect to database: {}", e))?;
    config::database::create_tables(&db).await?;

    // 5. Seed the budget, envelopes, and rules from config.toml
    let seed = config::seed::load_config(&app_config.seed_path)?;
    let budget = config::seed::seed_database(&db, &seed)
        .await
        .inspect_err(|e| error!("Failed to seed database: {}", e))?;

    // 6. Run the requested operation
    let args: Vec<String> = std::env::args().skip(1).collect();
    let today = chrono::Utc::now().date_naive();

    match args.first().map(String::as_str) {
        Some("preview") => {
            let amount: i64 = args
                .get(1)
                .ok_or_else(|| Error::Config {
                    message: "preview requires an amount in cents".to_string(),
                })?
                .parse()
                .map_err(|e| Error::Config {
                    message: format!("invalid amount: {e}"),
                })?;

            let preview = allocation::preview(&db, budget.id, amount, today).await?;
            info!(
                "Previewing distribution of {} cents across {} rules",
                preview.income_amount,
                preview.allocations.len()
            );
            for line in &preview.allocations {
                info!(
                    "  envelope {} <- {} cents (rule {}{})",
                    line.envelope_id,
                    line.amount,
                    line.rule_id,
                    line.rule_name
                        .as_deref()
                        .map(|n| format!(", {n}"))
                        .unwrap_or_default()
                );
            }
            info!("  unallocated: {} cents", preview.unallocated);
        }
        Some("apply") => {
            let outcome = allocation::apply_to_ready_pool(&db, budget.id, today).await?;
            info!(
                "Applied allocation rules: pool {} -> {} cents",
                outcome.initial_unallocated, outcome.final_unallocated
            );
            for line in &outcome.allocations {
                info!("  {} <- {} cents", line.envelope_name, line.amount);
            }
        }
        _ => {
            error!("Usage: envelope-ledger <preview <cents> | apply>");
            return Err(Error::Config {
                message: "unknown or missing command".to_string(),
            });
        }
    }

    Ok(())
}

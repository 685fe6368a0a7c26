//! Bootstraps the engine's store: validates configuration, connects to the database,
//! and creates the schema.

use dotenvy::dotenv;
use marketplace_engine::{
    config::{self, database},
    core::plan::PlanCatalog,
    errors::Result,
};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // 1. Initialize tracing (as early as possible)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 2. Load .env file; env vars can also be set externally
    dotenv().ok();

    // 3. Load configuration and build the plan catalog
    let app_config = config::load_default_config()
        .inspect_err(|e| error!("Failed to load configuration: {}", e))?;
    let catalog = PlanCatalog::from_config(&app_config.plans)
        .inspect_err(|e| error!("Invalid plan configuration: {}", e))?;

    // 4. Connect and create tables
    let db = database::create_connection()
        .await
        .inspect_err(|e| error!("Failed to connect to database: {}", e))?;
    database::create_tables(&db)
        .await
        .inspect(|_| info!("Database schema ready."))
        .inspect_err(|e| error!("Failed to create tables: {}", e))?;

    for plan in catalog.plans() {
        info!(
            plan = %plan.name,
            display_name = %plan.display_name,
            product_quota = plan.product_quota,
            features = ?plan.feature_flags,
            "Plan available"
        );
    }
    info!(
        slug_suffix_length = app_config.referrals.slug_suffix_length,
        slug_attempts = app_config.referrals.slug_attempts,
        "Referral settings loaded"
    );

    Ok(())
}

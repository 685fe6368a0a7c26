//! Database configuration module.
//!
//! This module handles the database connection and table creation using `SeaORM`.
//! Tables are generated from the entity definitions with `Schema::create_table_from_entity`,
//! so the schema always matches the Rust structs. Uniqueness that the entity macros cannot
//! express (a campaign slug is unique per shop) is added as an explicit index.

use crate::entities::{
    Campaign, ClickEvent, CommissionEntry, Product, ReferralApplication, ShopAccount, campaign,
};
use crate::errors::Result;
use sea_orm::sea_query::Index;
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, EntityTrait, Schema};

const DEFAULT_DATABASE_URL: &str = "sqlite://data/marketplace.sqlite?mode=rwc";

/// Gets the database URL from environment variable or returns default `SQLite` path.
#[must_use]
pub fn get_database_url() -> String {
    std::env::var("DATABASE_URL").unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string())
}

/// Establishes a connection to the database named by `DATABASE_URL`.
///
/// Falls back to a local `SQLite` file if no environment variable is set.
pub async fn create_connection() -> Result<DatabaseConnection> {
    let database_url = get_database_url();
    tracing::debug!("Connecting to database at {database_url}");
    Database::connect(&database_url).await.map_err(Into::into)
}

/// Creates all tables and indexes if they do not exist yet.
///
/// Safe to call on every start-up.
pub async fn create_tables(db: &DatabaseConnection) -> Result<()> {
    create_table(db, ShopAccount).await?;
    create_table(db, Product).await?;
    create_table(db, Campaign).await?;
    create_table(db, ClickEvent).await?;
    create_table(db, ReferralApplication).await?;
    create_table(db, CommissionEntry).await?;

    let builder = db.get_database_backend();
    let slug_index = Index::create()
        .name("idx_campaigns_shop_slug")
        .table(Campaign)
        .col(campaign::Column::ShopId)
        .col(campaign::Column::Slug)
        .unique()
        .if_not_exists()
        .to_owned();
    db.execute(builder.build(&slug_index)).await?;

    tracing::debug!("Schema ready");
    Ok(())
}

async fn create_table<E>(db: &DatabaseConnection, entity: E) -> Result<()>
where
    E: EntityTrait,
{
    let builder = db.get_database_backend();
    let schema = Schema::new(builder);
    let mut statement = schema.create_table_from_entity(entity);
    statement.if_not_exists();
    db.execute(builder.build(&statement)).await?;
    Ok(())
}

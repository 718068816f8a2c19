use crate::config::DatabaseConfig;
use crate::error::LinksError;
use sqlx::{postgres::PgPoolOptions, PgPool};

pub async fn create_pool(config: &DatabaseConfig) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .connect(&config.url)
        .await
}

pub async fn health_check(pool: &PgPool) -> Result<String, sqlx::Error> {
    let row: (String,) = sqlx::query_as("SELECT version()").fetch_one(pool).await?;
    Ok(row.0)
}

/// Apply the embedded `link_types` / `link_groups` / `link_group_items` migrations.
pub async fn migrate(pool: &PgPool) -> Result<(), LinksError> {
    sqlx::migrate!("./migrations").run(pool).await?;
    tracing::info!("Link tables migrated");
    Ok(())
}

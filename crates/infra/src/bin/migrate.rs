//! Applies pending schema migrations to the configured database.
//!
//! Reads `DATABASE_URL` (and optionally `DATABASE_MAX_CONNECTIONS`), runs every
//! migration in one transaction and commits only if all of them succeed.

use anyhow::Context;
use sqlx::postgres::PgPoolOptions;

use forgeerp_infra::config::DatabaseConfig;
use forgeerp_infra::migration::{Migrator, PostgresSchema};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    forgeerp_observability::init();

    let config = DatabaseConfig::from_env().context("loading database configuration")?;
    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .connect(&config.url)
        .await
        .context("connecting to database")?;

    let mut schema = PostgresSchema::begin(&pool).await?;
    let outcomes = Migrator::standard().run(&mut schema).await?;
    schema.commit().await?;

    for (id, outcome) in outcomes {
        tracing::info!(migration = id, ?outcome, "applied");
    }
    pool.close().await;
    Ok(())
}

//! Versioned schema migrations.
//!
//! A [`Migration`] runs against a [`SchemaHandle`], the few schema operations
//! migrations need. [`postgres::PostgresSchema`] runs them inside one sqlx
//! transaction; [`in_memory::InMemorySchema`] backs tests.

pub mod in_memory;
pub mod postgres;
pub mod sale_line_origin;

use async_trait::async_trait;
use thiserror::Error;
use tracing::{info, instrument};

use forgeerp_core::{DomainError, InvoiceLineId, SaleLineId};

pub use in_memory::InMemorySchema;
pub use postgres::PostgresSchema;
pub use sale_line_origin::SaleLineOriginMigration;

#[derive(Debug, Error)]
pub enum MigrationError {
    #[error("database error in {operation}: {message}")]
    Database {
        operation: &'static str,
        message: String,
    },

    #[error("invalid SQL identifier '{0}'")]
    InvalidIdentifier(String),

    #[error(transparent)]
    Domain(#[from] DomainError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MigrationOutcome {
    /// Nothing to migrate.
    Skipped,
    Applied { rows: usize },
}

/// Schema operations available to migrations.
#[async_trait]
pub trait SchemaHandle: Send {
    async fn table_exists(&mut self, table: &str) -> Result<bool, MigrationError>;

    /// Rows of a legacy `(sale_line, invoice_line)` relation table.
    async fn sale_line_links(
        &mut self,
        table: &str,
    ) -> Result<Vec<(SaleLineId, InvoiceLineId)>, MigrationError>;

    /// Store `reference` as the origin of an invoice line. Returns rows updated.
    async fn set_invoice_line_origin(
        &mut self,
        line: InvoiceLineId,
        reference: &str,
    ) -> Result<u64, MigrationError>;

    async fn drop_table(&mut self, table: &str) -> Result<(), MigrationError>;
}

#[async_trait]
pub trait Migration: Send + Sync {
    /// Stable identifier, used in logs.
    fn id(&self) -> &'static str;

    async fn run(&self, schema: &mut dyn SchemaHandle) -> Result<MigrationOutcome, MigrationError>;
}

/// Ordered list of migrations.
#[derive(Default)]
pub struct Migrator {
    migrations: Vec<Box<dyn Migration>>,
}

impl Migrator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every migration this workspace ships, oldest first.
    pub fn standard() -> Self {
        Self::new().with(SaleLineOriginMigration)
    }

    pub fn with(mut self, migration: impl Migration + 'static) -> Self {
        self.migrations.push(Box::new(migration));
        self
    }

    /// Run all migrations in order, stopping at the first error.
    #[instrument(skip_all, fields(migrations = self.migrations.len()))]
    pub async fn run(
        &self,
        schema: &mut dyn SchemaHandle,
    ) -> Result<Vec<(&'static str, MigrationOutcome)>, MigrationError> {
        let mut outcomes = Vec::with_capacity(self.migrations.len());
        for migration in &self.migrations {
            let outcome = migration.run(&mut *schema).await?;
            info!(migration = migration.id(), ?outcome, "migration finished");
            outcomes.push((migration.id(), outcome));
        }
        Ok(outcomes)
    }
}

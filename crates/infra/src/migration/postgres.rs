//! Postgres schema handle.
//!
//! Every operation runs on one transaction; nothing is visible to other
//! sessions until [`PostgresSchema::commit`]. Dropping the handle without
//! committing rolls the migration back.

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Row, Transaction};
use uuid::Uuid;

use forgeerp_core::{InvoiceLineId, SaleLineId};

use super::{MigrationError, SchemaHandle};

pub struct PostgresSchema {
    tx: Transaction<'static, Postgres>,
}

impl PostgresSchema {
    pub async fn begin(pool: &PgPool) -> Result<Self, MigrationError> {
        let tx = pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin", e))?;
        Ok(Self { tx })
    }

    pub async fn commit(self) -> Result<(), MigrationError> {
        self.tx
            .commit()
            .await
            .map_err(|e| map_sqlx_error("commit", e))
    }
}

#[async_trait]
impl SchemaHandle for PostgresSchema {
    async fn table_exists(&mut self, table: &str) -> Result<bool, MigrationError> {
        sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM information_schema.tables
                WHERE table_schema = current_schema() AND table_name = $1
            )
            "#,
        )
        .bind(table)
        .fetch_one(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("table_exists", e))
    }

    async fn sale_line_links(
        &mut self,
        table: &str,
    ) -> Result<Vec<(SaleLineId, InvoiceLineId)>, MigrationError> {
        let table = checked_identifier(table)?;
        let sql = format!("SELECT sale_line, invoice_line FROM {table}");
        let rows = sqlx::query(&sql)
            .fetch_all(&mut *self.tx)
            .await
            .map_err(|e| map_sqlx_error("sale_line_links", e))?;

        rows.iter()
            .map(|row| {
                let sale_line: Uuid = row
                    .try_get("sale_line")
                    .map_err(|e| map_sqlx_error("sale_line_links", e))?;
                let invoice_line: Uuid = row
                    .try_get("invoice_line")
                    .map_err(|e| map_sqlx_error("sale_line_links", e))?;
                Ok((
                    SaleLineId::from_uuid(sale_line),
                    InvoiceLineId::from_uuid(invoice_line),
                ))
            })
            .collect()
    }

    async fn set_invoice_line_origin(
        &mut self,
        line: InvoiceLineId,
        reference: &str,
    ) -> Result<u64, MigrationError> {
        let result = sqlx::query("UPDATE account_invoice_line SET origin = $1 WHERE id = $2")
            .bind(reference)
            .bind(line.as_uuid())
            .execute(&mut *self.tx)
            .await
            .map_err(|e| map_sqlx_error("set_invoice_line_origin", e))?;
        Ok(result.rows_affected())
    }

    async fn drop_table(&mut self, table: &str) -> Result<(), MigrationError> {
        let table = checked_identifier(table)?;
        sqlx::query(&format!("DROP TABLE {table}"))
            .execute(&mut *self.tx)
            .await
            .map_err(|e| map_sqlx_error("drop_table", e))?;
        Ok(())
    }
}

/// Table names are interpolated into SQL, so only plain identifiers pass.
fn checked_identifier(name: &str) -> Result<&str, MigrationError> {
    let mut chars = name.chars();
    let valid_start = chars
        .next()
        .is_some_and(|c| c.is_ascii_lowercase() || c == '_');
    if valid_start && chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_') {
        Ok(name)
    } else {
        Err(MigrationError::InvalidIdentifier(name.to_string()))
    }
}

fn map_sqlx_error(operation: &'static str, err: sqlx::Error) -> MigrationError {
    let message = match err {
        sqlx::Error::Database(db_err) => match db_err.code() {
            Some(code) => format!("{} (code {code})", db_err.message()),
            None => db_err.message().to_string(),
        },
        sqlx::Error::PoolClosed => "connection pool closed".to_string(),
        other => other.to_string(),
    };
    MigrationError::Database { operation, message }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_identifiers_pass() {
        assert_eq!(
            checked_identifier("sale_line_invoice_lines_rel").unwrap(),
            "sale_line_invoice_lines_rel"
        );
        assert!(checked_identifier("_t2").is_ok());
    }

    #[test]
    fn anything_else_is_rejected() {
        for name in ["", "2fast", "Sale", "rel; DROP TABLE x", "a.b", "\"quoted\""] {
            assert!(
                matches!(checked_identifier(name), Err(MigrationError::InvalidIdentifier(_))),
                "{name} should be rejected"
            );
        }
    }

    #[test]
    fn pool_closed_maps_with_operation() {
        let err = map_sqlx_error("begin", sqlx::Error::PoolClosed);
        assert_eq!(err.to_string(), "database error in begin: connection pool closed");
    }
}

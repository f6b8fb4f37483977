//! Live MySQL access through sqlx.
//!
//! The connection is opened on first use and reused until
//! [`Probe::close`]. The engine is synchronous; each call drives the async
//! driver on a private current-thread runtime.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use sqlx::mysql::{MySqlConnection, MySqlRow};
use sqlx::{Column, Connection, Row, ValueRef};
use tokio::runtime::{Builder, Runtime};
use tracing::{debug, info};

use oxide_inspect_sql::ast::quote_ident;

use crate::error::{InspectError, Result};
use crate::probe::{ExecOutcome, Execution, ExplainRecord, Probe, Record};

/// A lazily opened connection and the runtime driving it.
struct Connector {
    url: String,
    runtime: Runtime,
    conn: Option<MySqlConnection>,
}

impl Connector {
    fn new(url: impl Into<String>) -> Result<Self> {
        let runtime = Builder::new_current_thread().enable_all().build()?;
        Ok(Self {
            url: url.into(),
            runtime,
            conn: None,
        })
    }

    fn fetch_all(&mut self, sql: &str, args: &[&str]) -> Result<Vec<MySqlRow>> {
        debug!(sql, "querying");
        let Self { url, runtime, conn } = self;
        runtime.block_on(async {
            if conn.is_none() {
                info!("Connecting to MySQL");
                *conn = Some(MySqlConnection::connect(url.as_str()).await?);
            }
            let conn = conn
                .as_mut()
                .ok_or_else(|| InspectError::CatalogProbe("connection unavailable".into()))?;
            let mut query = sqlx::query(sql);
            for arg in args {
                query = query.bind(*arg);
            }
            query
                .fetch_all(conn)
                .await
                .map_err(|e| InspectError::CatalogProbe(format!("{sql}: {e}")))
        })
    }

    fn execute(&mut self, statements: &[String], transactional: bool) -> Result<Vec<ExecOutcome>> {
        let Self { url, runtime, conn } = self;
        runtime.block_on(async {
            if conn.is_none() {
                info!("Connecting to MySQL");
                *conn = Some(MySqlConnection::connect(url.as_str()).await?);
            }
            let conn = conn
                .as_mut()
                .ok_or_else(|| InspectError::Execution("connection unavailable".into()))?;
            let failed = |sql: &str, e: sqlx::Error| InspectError::Execution(format!("{sql}: {e}"));
            let mut outcomes = Vec::with_capacity(statements.len());
            if transactional {
                let mut tx = conn.begin().await?;
                for sql in statements {
                    debug!(sql = %sql, "executing");
                    let done = sqlx::query(sql)
                        .execute(&mut *tx)
                        .await
                        .map_err(|e| failed(sql, e))?;
                    outcomes.push(ExecOutcome {
                        rows_affected: done.rows_affected(),
                    });
                }
                tx.commit().await?;
            } else {
                for sql in statements {
                    debug!(sql = %sql, "executing");
                    let done = sqlx::query(sql)
                        .execute(&mut *conn)
                        .await
                        .map_err(|e| failed(sql, e))?;
                    outcomes.push(ExecOutcome {
                        rows_affected: done.rows_affected(),
                    });
                }
            }
            Ok::<_, InspectError>(outcomes)
        })
    }

    fn close(&mut self) {
        if let Some(conn) = self.conn.take() {
            debug!("Closing MySQL connection");
            if let Err(e) = self.runtime.block_on(conn.close()) {
                debug!(error = %e, "closing connection failed");
            }
        }
    }
}

/// Decodes one cell as text, `None` for NULL.
fn cell(row: &MySqlRow, index: usize) -> Result<Option<String>> {
    if row.try_get_raw(index)?.is_null() {
        return Ok(None);
    }
    if let Ok(v) = row.try_get::<String, _>(index) {
        return Ok(Some(v));
    }
    if let Ok(v) = row.try_get::<i64, _>(index) {
        return Ok(Some(v.to_string()));
    }
    if let Ok(v) = row.try_get::<u64, _>(index) {
        return Ok(Some(v.to_string()));
    }
    if let Ok(v) = row.try_get::<f64, _>(index) {
        return Ok(Some(v.to_string()));
    }
    if let Ok(v) = row.try_get::<f32, _>(index) {
        return Ok(Some(v.to_string()));
    }
    if let Ok(v) = row.try_get::<NaiveDateTime, _>(index) {
        return Ok(Some(v.format("%Y-%m-%d %H:%M:%S%.f").to_string()));
    }
    if let Ok(v) = row.try_get::<NaiveDate, _>(index) {
        return Ok(Some(v.format("%Y-%m-%d").to_string()));
    }
    if let Ok(v) = row.try_get::<NaiveTime, _>(index) {
        return Ok(Some(v.format("%H:%M:%S%.f").to_string()));
    }
    if let Ok(v) = row.try_get::<Vec<u8>, _>(index) {
        return Ok(Some(String::from_utf8_lossy(&v).into_owned()));
    }
    Ok(Some(row.try_get_unchecked::<String, _>(index)?))
}

fn record(row: &MySqlRow) -> Result<Record> {
    row.columns()
        .iter()
        .map(|c| Ok((c.name().to_string(), cell(row, c.ordinal())?)))
        .collect()
}

fn first_text(rows: &[MySqlRow], index: usize, what: &str) -> Result<String> {
    let row = rows
        .first()
        .ok_or_else(|| InspectError::CatalogProbe(format!("{what}: no result")))?;
    cell(row, index)?.ok_or_else(|| InspectError::CatalogProbe(format!("{what}: NULL result")))
}

/// [`Probe`] backed by a MySQL server.
pub struct MySqlProbe {
    connector: Connector,
}

impl MySqlProbe {
    /// Creates a probe for `url`; nothing is opened until the first call.
    pub fn new(url: impl Into<String>) -> Result<Self> {
        Ok(Self {
            connector: Connector::new(url)?,
        })
    }

    fn column(&mut self, sql: &str, args: &[&str], index: usize) -> Result<Vec<String>> {
        let rows = self.connector.fetch_all(sql, args)?;
        rows.iter()
            .filter_map(|row| cell(row, index).transpose())
            .collect()
    }

    fn schema_defaults(&mut self, schema: &str) -> Result<(String, String)> {
        let rows = self.connector.fetch_all(
            "SELECT DEFAULT_CHARACTER_SET_NAME, DEFAULT_COLLATION_NAME \
             FROM information_schema.SCHEMATA WHERE SCHEMA_NAME = ?",
            &[schema],
        )?;
        let what = format!("defaults of schema {schema}");
        Ok((first_text(&rows, 0, &what)?, first_text(&rows, 1, &what)?))
    }
}

impl Probe for MySqlProbe {
    fn list_schemas(&mut self) -> Result<Vec<String>> {
        self.column("SHOW DATABASES", &[], 0)
    }

    fn list_tables(&mut self, schema: &str) -> Result<Vec<String>> {
        self.column(
            &format!("SHOW FULL TABLES FROM {} WHERE Table_type = 'BASE TABLE'", quote_ident(schema)),
            &[],
            0,
        )
    }

    fn show_create_table(&mut self, schema: &str, table: &str) -> Result<String> {
        let sql = format!(
            "SHOW CREATE TABLE {}.{}",
            quote_ident(schema),
            quote_ident(table)
        );
        let rows = self.connector.fetch_all(&sql, &[])?;
        first_text(&rows, 1, &sql)
    }

    fn table_size_mb(&mut self, schema: &str, table: &str) -> Result<f64> {
        let rows = self.connector.fetch_all(
            "SELECT ROUND((DATA_LENGTH + INDEX_LENGTH) / 1024 / 1024, 2) \
             FROM information_schema.TABLES WHERE TABLE_SCHEMA = ? AND TABLE_NAME = ?",
            &[schema, table],
        )?;
        let what = format!("size of {schema}.{table}");
        let text = first_text(&rows, 0, &what)?;
        text.parse()
            .map_err(|e| InspectError::CatalogProbe(format!("{what}: {e}")))
    }

    fn default_engine(&mut self, _schema: &str) -> Result<String> {
        let rows = self
            .connector
            .fetch_all("SELECT @@default_storage_engine", &[])?;
        first_text(&rows, 0, "default storage engine")
    }

    fn default_charset(&mut self, schema: &str) -> Result<String> {
        Ok(self.schema_defaults(schema)?.0)
    }

    fn default_collation(&mut self, schema: &str) -> Result<String> {
        Ok(self.schema_defaults(schema)?.1)
    }

    fn explain(&mut self, sql: &str) -> Result<Vec<ExplainRecord>> {
        let rows = self.connector.fetch_all(&format!("EXPLAIN {sql}"), &[])?;
        rows.iter()
            .map(|row| {
                let record = record(row)?;
                let text = |name: &str| {
                    record
                        .iter()
                        .find(|(c, _)| c.eq_ignore_ascii_case(name))
                        .and_then(|(_, v)| v.clone())
                };
                Ok(ExplainRecord {
                    id: text("id"),
                    select_type: text("select_type"),
                    table: text("table"),
                    access_type: text("type"),
                    rows: text("rows").and_then(|r| r.parse().ok()).unwrap_or(0),
                    extra: text("Extra"),
                })
            })
            .collect()
    }

    fn query_records(&mut self, sql: &str) -> Result<Vec<Record>> {
        let rows = self.connector.fetch_all(sql, &[])?;
        rows.iter().map(record).collect()
    }

    fn close(&mut self) {
        self.connector.close();
    }
}

/// [`Execution`] backed by a MySQL server.
pub struct MySqlExecution {
    connector: Connector,
}

impl MySqlExecution {
    /// Creates an executor for `url`; nothing is opened until the first call.
    pub fn new(url: impl Into<String>) -> Result<Self> {
        Ok(Self {
            connector: Connector::new(url)?,
        })
    }

    /// Closes the connection, if open.
    pub fn close(&mut self) {
        self.connector.close();
    }
}

impl Execution for MySqlExecution {
    fn exec(&mut self, sql: &str) -> Result<ExecOutcome> {
        let mut outcomes = self.connector.execute(&[sql.to_string()], false)?;
        outcomes
            .pop()
            .ok_or_else(|| InspectError::Execution(format!("{sql}: no outcome")))
    }

    fn exec_transaction(&mut self, statements: &[String]) -> Result<Vec<ExecOutcome>> {
        info!(statements = statements.len(), "Executing transaction");
        self.connector.execute(statements, true)
    }
}

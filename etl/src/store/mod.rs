//! SQLite destination for the joined table.
//!
//! A write replaces the destination table in a single transaction:
//!
//! ```text
//! BEGIN
//!   CREATE TABLE "<table>__staging_<uuid>" (...)
//!   INSERT INTO "<table>__staging_<uuid>" ...      (prepared, once per row)
//!   DROP TABLE IF EXISTS "<table>"
//!   ALTER TABLE "<table>__staging_<uuid>" RENAME TO "<table>"
//! COMMIT
//! ```
//!
//! Readers see either the previous table or the new one. On any error the
//! transaction is rolled back when it is dropped.

use rusqlite::{params_from_iter, Connection};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use uuid::Uuid;

use crate::config::DEFAULT_TABLE_NAME;
use crate::error::{WriteError, WriteResult};
use crate::models::{CellValue, ColumnType, JoinedTable};

/// Writer for one SQLite file and table.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    path: PathBuf,
    table_name: String,
}

impl SqliteStore {
    /// Store targeting the default `user_orders` table.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            table_name: DEFAULT_TABLE_NAME.to_string(),
        }
    }

    pub fn with_table(mut self, table_name: impl Into<String>) -> Self {
        self.table_name = table_name.into();
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    /// Replace the destination table with `table`. Returns rows written.
    ///
    /// The connection lives only for the duration of this call.
    pub fn replace(&self, table: &JoinedTable) -> WriteResult<usize> {
        self.ensure_parent_dir()?;

        let mut conn = Connection::open(&self.path).map_err(|source| WriteError::Open {
            path: self.path.clone(),
            source,
        })?;

        let written = replace_table(&mut conn, &self.table_name, table)?;

        info!(
            destination = %self.path.display(),
            table = %self.table_name,
            rows = written,
            "replaced destination table"
        );
        Ok(written)
    }

    fn ensure_parent_dir(&self) -> WriteResult<()> {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => {
                fs::create_dir_all(parent).map_err(|source| WriteError::CreateDir {
                    path: parent.to_path_buf(),
                    source,
                })
            }
            _ => Ok(()),
        }
    }
}

/// Write `table` into the `user_orders` table of `destination`.
pub fn write(table: &JoinedTable, destination: &Path) -> WriteResult<usize> {
    SqliteStore::new(destination).replace(table)
}

/// Staging-then-rename replacement inside one transaction.
fn replace_table(conn: &mut Connection, table_name: &str, table: &JoinedTable) -> WriteResult<usize> {
    let staging = format!("{}__staging_{}", table_name, Uuid::new_v4().simple());
    let types = column_types(table);

    let tx = conn.transaction()?;

    let columns: Vec<String> = table
        .headers
        .iter()
        .zip(&types)
        .map(|(name, ty)| format!("{} {}", quote_ident(name), ty.sql_name()))
        .collect();
    tx.execute_batch(&format!(
        "CREATE TABLE {} ({})",
        quote_ident(&staging),
        columns.join(", ")
    ))?;
    debug!(staging = %staging, "created staging table");

    let mut written = 0;
    {
        let placeholders = vec!["?"; table.headers.len()].join(", ");
        let mut stmt = tx.prepare(&format!(
            "INSERT INTO {} VALUES ({})",
            quote_ident(&staging),
            placeholders
        ))?;

        for row in &table.rows {
            let values: Vec<CellValue> = table
                .row_values(row)
                .iter()
                .zip(&types)
                .map(|(raw, ty)| CellValue::convert(raw, *ty))
                .collect();
            written += stmt.execute(params_from_iter(values.iter()))?;
        }
    }

    tx.execute_batch(&format!(
        "DROP TABLE IF EXISTS {target};
         ALTER TABLE {staging} RENAME TO {target};",
        target = quote_ident(table_name),
        staging = quote_ident(&staging),
    ))?;
    tx.commit()?;

    Ok(written)
}

/// Inferred storage type per output column. The category is always TEXT.
fn column_types(table: &JoinedTable) -> Vec<ColumnType> {
    let data_columns = table.headers.len().saturating_sub(1);
    let mut types: Vec<ColumnType> = (0..data_columns)
        .map(|idx| {
            ColumnType::infer(
                table
                    .rows
                    .iter()
                    .map(|r| r.cells.get(idx).map_or("", String::as_str)),
            )
        })
        .collect();
    if !table.headers.is_empty() {
        types.push(ColumnType::Text);
    }
    types
}

/// Quote an SQL identifier, doubling embedded quotes.
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{JoinedRow, OrderCategory};
    use rusqlite::types::Value;
    use tempfile::tempdir;

    fn sample() -> JoinedTable {
        JoinedTable {
            headers: vec![
                "user_id".into(),
                "name".into(),
                "amount".into(),
                "order_category".into(),
            ],
            rows: vec![
                JoinedRow {
                    cells: vec!["1".into(), "A".into(), "150".into()],
                    category: OrderCategory::High,
                },
                JoinedRow {
                    cells: vec!["1".into(), "A".into(), "49.5".into()],
                    category: OrderCategory::Low,
                },
            ],
        }
    }

    fn dump(path: &Path, table: &str) -> Vec<Vec<Value>> {
        let conn = Connection::open(path).unwrap();
        let mut stmt = conn
            .prepare(&format!("SELECT * FROM {} ORDER BY rowid", quote_ident(table)))
            .unwrap();
        let width = stmt.column_count();
        let rows = stmt
            .query_map([], |row| {
                (0..width)
                    .map(|i| row.get::<_, Value>(i))
                    .collect::<rusqlite::Result<Vec<Value>>>()
            })
            .unwrap();
        rows.map(Result::unwrap).collect()
    }

    fn table_names(path: &Path) -> Vec<String> {
        let conn = Connection::open(path).unwrap();
        let mut stmt = conn
            .prepare("SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name")
            .unwrap();
        let names = stmt.query_map([], |row| row.get::<_, String>(0)).unwrap();
        names.map(Result::unwrap).collect()
    }

    #[test]
    fn test_write_creates_directory_and_table() {
        let dir = tempdir().unwrap();
        let db = dir.path().join("processed/nested/out.sqlite");

        let written = write(&sample(), &db).unwrap();

        assert_eq!(written, 2);
        assert!(db.exists());
        assert_eq!(table_names(&db), vec!["user_orders"]);

        let rows = dump(&db, "user_orders");
        assert_eq!(
            rows[0],
            vec![
                Value::Integer(1),
                Value::Text("A".into()),
                Value::Real(150.0),
                Value::Text("High".into()),
            ]
        );
        assert_eq!(rows[1][2], Value::Real(49.5));
        assert_eq!(rows[1][3], Value::Text("Low".into()));
    }

    #[test]
    fn test_rewrite_replaces_instead_of_appending() {
        let dir = tempdir().unwrap();
        let db = dir.path().join("out.sqlite");

        write(&sample(), &db).unwrap();
        let first = dump(&db, "user_orders");
        write(&sample(), &db).unwrap();
        let second = dump(&db, "user_orders");

        assert_eq!(second.len(), 2);
        assert_eq!(first, second);
        assert_eq!(table_names(&db), vec!["user_orders"]);
    }

    #[test]
    fn test_replace_changes_schema() {
        let dir = tempdir().unwrap();
        let db = dir.path().join("out.sqlite");
        write(&sample(), &db).unwrap();

        let narrower = JoinedTable {
            headers: vec!["user_id".into(), "order_category".into()],
            rows: vec![JoinedRow {
                cells: vec!["9".into()],
                category: OrderCategory::Low,
            }],
        };
        assert_eq!(write(&narrower, &db).unwrap(), 1);

        let rows = dump(&db, "user_orders");
        assert_eq!(rows, vec![vec![Value::Integer(9), Value::Text("Low".into())]]);
    }

    #[test]
    fn test_failed_write_keeps_previous_table() {
        let dir = tempdir().unwrap();
        let db = dir.path().join("out.sqlite");
        write(&sample(), &db).unwrap();

        // duplicate column names make CREATE TABLE fail inside the transaction
        let broken = JoinedTable {
            headers: vec!["a".into(), "a".into(), "order_category".into()],
            rows: vec![],
        };
        let err = write(&broken, &db).unwrap_err();
        assert!(matches!(err, WriteError::Database(_)));

        assert_eq!(dump(&db, "user_orders").len(), 2);
        assert_eq!(table_names(&db), vec!["user_orders"]);
    }

    #[test]
    fn test_uncreatable_directory_is_write_error() {
        let dir = tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, "not a directory").unwrap();

        let err = write(&sample(), &blocker.join("sub/out.sqlite")).unwrap_err();
        assert!(matches!(err, WriteError::CreateDir { .. }));
    }

    #[test]
    fn test_custom_table_name_and_empty_cells() {
        let dir = tempdir().unwrap();
        let db = dir.path().join("out.sqlite");
        let table = JoinedTable {
            headers: vec!["user_id".into(), "note \"x\"".into(), "order_category".into()],
            rows: vec![JoinedRow {
                cells: vec!["1".into(), "".into()],
                category: OrderCategory::High,
            }],
        };

        let store = SqliteStore::new(&db).with_table("daily orders");
        assert_eq!(store.path(), db.as_path());
        assert_eq!(store.table_name(), "daily orders");
        assert_eq!(store.replace(&table).unwrap(), 1);

        let rows = dump(&db, "daily orders");
        assert_eq!(rows[0][1], Value::Null);
    }

    #[test]
    fn test_quote_ident() {
        assert_eq!(quote_ident("user_orders"), "\"user_orders\"");
        assert_eq!(quote_ident("a\"b"), "\"a\"\"b\"");
    }
}

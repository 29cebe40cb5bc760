//! Domain models for the orderjoin pipeline.
//!
//! - [`Table`] - raw delimited data as read (headers + string cells)
//! - [`UsersTable`] / [`OrdersTable`] - validated views with resolved columns
//! - [`JoinKey`] - normalized `user_id` used for matching
//! - [`OrderCategory`] - derived High/Low label
//! - [`JoinedTable`] - transform output
//! - [`ColumnType`] / [`CellValue`] - SQLite storage typing

use serde::{Deserialize, Serialize};

use crate::error::{SchemaError, SchemaResult};

/// Join key column shared by both inputs.
pub const KEY_COLUMN: &str = "user_id";

/// Name of the derived column.
pub const CATEGORY_COLUMN: &str = "order_category";

/// Amount at or above which an order is categorised "High".
pub const HIGH_VALUE_THRESHOLD: f64 = 100.0;

// =============================================================================
// Raw Table
// =============================================================================

/// In-memory delimited table. Every row has exactly `headers.len()` cells.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self { headers, rows }
    }

    /// Position of a column by exact name.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    fn require_column(&self, table: &str, column: &str) -> SchemaResult<usize> {
        self.column_index(column).ok_or_else(|| SchemaError::MissingColumn {
            table: table.to_string(),
            column: column.to_string(),
        })
    }

    fn reject_reserved(&self, table: &str) -> SchemaResult<()> {
        match self.column_index(CATEGORY_COLUMN) {
            Some(_) => Err(SchemaError::ReservedColumn {
                table: table.to_string(),
                column: CATEGORY_COLUMN.to_string(),
            }),
            None => Ok(()),
        }
    }
}

// =============================================================================
// Validated Views
// =============================================================================

/// Users table with its key column resolved.
#[derive(Debug, Clone)]
pub struct UsersTable {
    table: Table,
    key: usize,
}

impl UsersTable {
    pub fn new(table: Table) -> SchemaResult<Self> {
        let key = table.require_column("users", KEY_COLUMN)?;
        table.reject_reserved("users")?;
        Ok(Self { table, key })
    }

    pub fn table(&self) -> &Table {
        &self.table
    }

    pub fn key_index(&self) -> usize {
        self.key
    }

    /// Join key of a row.
    pub fn key(&self, row: &[String]) -> JoinKey {
        JoinKey::from_raw(cell(row, self.key))
    }
}

/// Orders table with key and amount columns resolved.
#[derive(Debug, Clone)]
pub struct OrdersTable {
    table: Table,
    key: usize,
    amount: usize,
    amount_column: String,
}

impl OrdersTable {
    pub fn new(table: Table, amount_column: &str) -> SchemaResult<Self> {
        let key = table.require_column("orders", KEY_COLUMN)?;
        let amount = table.require_column("orders", amount_column)?;
        table.reject_reserved("orders")?;
        Ok(Self {
            table,
            key,
            amount,
            amount_column: amount_column.to_string(),
        })
    }

    pub fn table(&self) -> &Table {
        &self.table
    }

    pub fn key_index(&self) -> usize {
        self.key
    }

    pub fn amount_column(&self) -> &str {
        &self.amount_column
    }

    pub fn key(&self, row: &[String]) -> JoinKey {
        JoinKey::from_raw(cell(row, self.key))
    }

    /// Parsed amount of the order at `row_idx`.
    ///
    /// Empty, non-numeric and non-finite cells are schema errors; they are
    /// never treated as zero.
    pub fn amount(&self, row_idx: usize) -> SchemaResult<f64> {
        let raw = self
            .table
            .rows
            .get(row_idx)
            .map_or("", |row| cell(row, self.amount))
            .trim();
        match raw.parse::<f64>() {
            Ok(v) if v.is_finite() => Ok(v),
            _ => Err(SchemaError::NonNumericAmount {
                // 1-based data row, header excluded
                row: row_idx + 1,
                column: self.amount_column.clone(),
                value: raw.to_string(),
            }),
        }
    }
}

fn cell(row: &[String], idx: usize) -> &str {
    row.get(idx).map_or("", String::as_str)
}

// =============================================================================
// Join Key
// =============================================================================

/// Normalized `user_id`.
///
/// Integer-valued keys compare numerically, so `"007"`, `"7"` and `"7.0"`
/// all match.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum JoinKey {
    Int(i64),
    Text(String),
}

impl JoinKey {
    pub fn from_raw(raw: &str) -> Self {
        let trimmed = raw.trim();
        if let Ok(v) = trimmed.parse::<i64>() {
            return JoinKey::Int(v);
        }
        match trimmed.parse::<f64>() {
            Ok(v) if v.is_finite() && v.fract() == 0.0 && v.abs() < i64::MAX as f64 => {
                JoinKey::Int(v as i64)
            }
            _ => JoinKey::Text(trimmed.to_string()),
        }
    }
}

// =============================================================================
// Order Category
// =============================================================================

/// Derived label for an order amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderCategory {
    High,
    Low,
}

impl OrderCategory {
    pub fn from_amount(amount: f64) -> Self {
        if amount >= HIGH_VALUE_THRESHOLD {
            OrderCategory::High
        } else {
            OrderCategory::Low
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderCategory::High => "High",
            OrderCategory::Low => "Low",
        }
    }
}

impl std::fmt::Display for OrderCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Joined Table
// =============================================================================

/// One joined row: source cells in output column order, plus the category.
#[derive(Debug, Clone, PartialEq)]
pub struct JoinedRow {
    pub cells: Vec<String>,
    pub category: OrderCategory,
}

/// Result of the transform step.
///
/// `headers` ends with [`CATEGORY_COLUMN`]; each row's cells cover every
/// header except that last one, which is carried by `category`.
#[derive(Debug, Clone, PartialEq)]
pub struct JoinedTable {
    pub headers: Vec<String>,
    pub rows: Vec<JoinedRow>,
}

impl JoinedTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// Cell by column name, including the derived category.
    pub fn value(&self, row: usize, column: &str) -> Option<&str> {
        let idx = self.column_index(column)?;
        let row = self.rows.get(row)?;
        if idx == row.cells.len() {
            Some(row.category.as_str())
        } else {
            row.cells.get(idx).map(String::as_str)
        }
    }

    pub fn categories(&self) -> Vec<OrderCategory> {
        self.rows.iter().map(|r| r.category).collect()
    }

    pub fn count(&self, category: OrderCategory) -> usize {
        self.rows.iter().filter(|r| r.category == category).count()
    }

    /// All cells of a row as text, category last.
    pub fn row_values(&self, row: &JoinedRow) -> Vec<String> {
        let mut out = row.cells.clone();
        out.push(row.category.as_str().to_string());
        out
    }
}

// =============================================================================
// Storage Typing
// =============================================================================

/// SQLite column affinity inferred from a column's cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Integer,
    Real,
    Text,
}

impl ColumnType {
    /// Narrowest type that fits every non-empty cell. All-empty is TEXT.
    pub fn infer<'a>(cells: impl IntoIterator<Item = &'a str>) -> Self {
        let mut seen = false;
        let mut ty = ColumnType::Integer;
        for cell in cells {
            let cell = cell.trim();
            if cell.is_empty() {
                continue;
            }
            seen = true;
            if ty == ColumnType::Integer && cell.parse::<i64>().is_err() {
                ty = ColumnType::Real;
            }
            if ty == ColumnType::Real && !cell.parse::<f64>().is_ok_and(f64::is_finite) {
                return ColumnType::Text;
            }
        }
        if seen {
            ty
        } else {
            ColumnType::Text
        }
    }

    pub fn sql_name(&self) -> &'static str {
        match self {
            ColumnType::Integer => "INTEGER",
            ColumnType::Real => "REAL",
            ColumnType::Text => "TEXT",
        }
    }
}

/// A typed cell ready for binding.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
}

impl CellValue {
    /// Convert a raw cell according to its column type.
    pub fn convert(raw: &str, ty: ColumnType) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return CellValue::Null;
        }
        match ty {
            ColumnType::Integer => trimmed
                .parse()
                .map(CellValue::Integer)
                .unwrap_or_else(|_| CellValue::Text(raw.to_string())),
            ColumnType::Real => trimmed
                .parse()
                .map(CellValue::Real)
                .unwrap_or_else(|_| CellValue::Text(raw.to_string())),
            ColumnType::Text => CellValue::Text(raw.to_string()),
        }
    }
}

impl rusqlite::ToSql for CellValue {
    fn to_sql(&self) -> rusqlite::Result<rusqlite::types::ToSqlOutput<'_>> {
        use rusqlite::types::{ToSqlOutput, ValueRef};
        Ok(match self {
            CellValue::Null => ToSqlOutput::Borrowed(ValueRef::Null),
            CellValue::Integer(v) => ToSqlOutput::Borrowed(ValueRef::Integer(*v)),
            CellValue::Real(v) => ToSqlOutput::Borrowed(ValueRef::Real(*v)),
            CellValue::Text(s) => ToSqlOutput::Borrowed(ValueRef::Text(s.as_bytes())),
        })
    }
}

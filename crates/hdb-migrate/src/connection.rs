//! Driver seam.
//!
//! The migrator never talks to a database driver directly; it goes through
//! [`Connection`], which executes bound statements and hands back rows as
//! plain [`SqlValue`]s. Driver crates implement this trait.

use async_trait::async_trait;

use crate::column_type::RawColumnType;
use crate::error::{MigrateError, Result};
use crate::value::{SqlExpr, SqlValue};

/// One result row, positionally indexed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    values: Vec<SqlValue>,
}

impl Row {
    /// Creates a row from its values.
    #[must_use]
    pub const fn new(values: Vec<SqlValue>) -> Self {
        Self { values }
    }

    fn get(&self, column: usize) -> Result<&SqlValue> {
        self.values.get(column).ok_or_else(|| MigrateError::Scan {
            column,
            message: format!("row has only {} columns", self.values.len()),
        })
    }

    /// Reads a nullable text column. Numbers are rendered as text.
    pub fn text(&self, column: usize) -> Result<Option<String>> {
        Ok(match self.get(column)? {
            SqlValue::Null => None,
            SqlValue::Text(s) => Some(s.clone()),
            SqlValue::Int(n) => Some(n.to_string()),
            SqlValue::Float(f) => Some(f.to_string()),
            SqlValue::Bool(b) => Some(if *b { "TRUE" } else { "FALSE" }.to_string()),
        })
    }

    /// Reads a nullable integer column. Numeric text is parsed.
    pub fn int(&self, column: usize) -> Result<Option<i64>> {
        match self.get(column)? {
            SqlValue::Null => Ok(None),
            SqlValue::Int(n) => Ok(Some(*n)),
            SqlValue::Text(s) => s.trim().parse().map(Some).map_err(|_| MigrateError::Scan {
                column,
                message: format!("cannot convert {s:?} to integer"),
            }),
            other => Err(MigrateError::Scan {
                column,
                message: format!("cannot convert {other:?} to integer"),
            }),
        }
    }

    /// Reads a nullable boolean column. Accepts `TRUE`/`FALSE`, `YES`/`NO`
    /// and `1`/`0`.
    pub fn bool(&self, column: usize) -> Result<Option<bool>> {
        let invalid = |value: &SqlValue| MigrateError::Scan {
            column,
            message: format!("cannot convert {value:?} to boolean"),
        };
        let value = self.get(column)?;
        match value {
            SqlValue::Null => Ok(None),
            SqlValue::Bool(b) => Ok(Some(*b)),
            SqlValue::Int(0) => Ok(Some(false)),
            SqlValue::Int(1) => Ok(Some(true)),
            SqlValue::Text(s) => match s.trim().to_ascii_uppercase().as_str() {
                "TRUE" | "YES" | "1" => Ok(Some(true)),
                "FALSE" | "NO" | "0" => Ok(Some(false)),
                _ => Err(invalid(value)),
            },
            _ => Err(invalid(value)),
        }
    }
}

impl From<Vec<SqlValue>> for Row {
    fn from(values: Vec<SqlValue>) -> Self {
        Self::new(values)
    }
}

/// Executes statements against one database session.
#[async_trait]
pub trait Connection: Send + Sync {
    /// Executes a statement, returning the number of affected rows.
    async fn execute(&self, stmt: &SqlExpr) -> Result<u64>;

    /// Runs a query and returns all rows.
    async fn query(&self, stmt: &SqlExpr) -> Result<Vec<Row>>;

    /// Runs a query and returns only its result-set column descriptors.
    async fn describe(&self, stmt: &SqlExpr) -> Result<Vec<RawColumnType>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row() -> Row {
        Row::new(vec![
            SqlValue::Text("ID".into()),
            SqlValue::Null,
            SqlValue::Text("FALSE".into()),
            SqlValue::Text("19".into()),
            SqlValue::Int(1),
            SqlValue::Float(1.5),
        ])
    }

    #[test]
    fn test_text_column() {
        let row = row();
        assert_eq!(row.text(0).unwrap().as_deref(), Some("ID"));
        assert_eq!(row.text(1).unwrap(), None);
        assert_eq!(row.text(4).unwrap().as_deref(), Some("1"));
    }

    #[test]
    fn test_int_column() {
        let row = row();
        assert_eq!(row.int(3).unwrap(), Some(19));
        assert_eq!(row.int(1).unwrap(), None);
        assert!(matches!(row.int(0), Err(MigrateError::Scan { column: 0, .. })));
        assert!(matches!(row.int(5), Err(MigrateError::Scan { column: 5, .. })));
    }

    #[test]
    fn test_bool_column() {
        let row = row();
        assert_eq!(row.bool(2).unwrap(), Some(false));
        assert_eq!(row.bool(4).unwrap(), Some(true));
        assert!(row.bool(0).is_err());
    }

    #[test]
    fn test_missing_column() {
        let row = row();
        assert!(matches!(row.text(9), Err(MigrateError::Scan { column: 9, .. })));
    }
}

//! Column catalog introspection.
//!
//! HANA exposes column metadata through the `TABLE_COLUMNS` system view.
//! This module builds the query against it and maps each result row onto a
//! [`ColumnType`].

use crate::column_type::{ColumnType, RawColumnType};
use crate::connection::Row;
use crate::dialect::Capabilities;
use crate::error::Result;
use crate::value::{SqlExpr, SqlValue};

const COLUMN_TYPES_SELECT: &str = "SELECT \
UPPER(TC.COLUMN_NAME) AS column_name, \
TC.DEFAULT_VALUE AS column_default, \
TC.IS_NULLABLE AS is_nullable, \
TC.DATA_TYPE_NAME AS data_type, \
TC.LENGTH AS character_maximum_length, \
CONCAT(TC.DATA_TYPE_NAME, CONCAT('(', CONCAT(TC.LENGTH, CONCAT(\
(CASE WHEN TC.SCALE IS NOT NULL THEN CONCAT(',', TC.SCALE) ELSE '' END), ')')))) AS column_type, \
(SELECT CASE \
WHEN MAX(C.IS_PRIMARY_KEY) = 'TRUE' THEN 'PRI' \
WHEN MAX(C.IS_UNIQUE_KEY) = 'TRUE' THEN 'UNI' \
ELSE NULL END \
FROM CONSTRAINTS C \
WHERE C.SCHEMA_NAME = TC.SCHEMA_NAME AND C.TABLE_NAME = TC.TABLE_NAME \
AND C.COLUMN_NAME = TC.COLUMN_NAME) AS column_key, \
TC.GENERATION_TYPE AS extra, \
TC.COMMENTS AS column_comment, \
TC.LENGTH AS numeric_precision, \
TC.SCALE AS numeric_scale";

const DATETIME_PRECISION_SELECT: &str = ", (CASE \
WHEN TC.DATA_TYPE_NAME = 'DATE' THEN 10 \
WHEN TC.DATA_TYPE_NAME = 'TIME' THEN 12 \
WHEN TC.DATA_TYPE_NAME = 'SECONDDATE' THEN 10 \
WHEN TC.DATA_TYPE_NAME = 'TIMESTAMP' THEN 19 \
ELSE NULL END) AS datetime_precision";

const COLUMN_TYPES_FROM: &str =
    " FROM TABLE_COLUMNS TC WHERE TC.SCHEMA_NAME = ? AND TC.TABLE_NAME = ?";

/// Key indicator for primary key columns.
pub const PRIMARY_KEY: &str = "PRI";
/// Key indicator for unique columns.
pub const UNIQUE_KEY: &str = "UNI";

// Positions of the selected columns.
const NAME: usize = 0;
const DEFAULT: usize = 1;
const NULLABLE: usize = 2;
const DATA_TYPE: usize = 3;
const LENGTH: usize = 4;
const COLUMN_TYPE: usize = 5;
const KEY: usize = 6;
const EXTRA: usize = 7;
const COMMENT: usize = 8;
const PRECISION: usize = 9;
const SCALE: usize = 10;
const DATETIME_PRECISION: usize = 11;

/// Builds the catalog query for one table.
#[must_use]
pub fn column_types_query(capabilities: Capabilities, schema: &str, table: &str) -> SqlExpr {
    let mut sql = String::from(COLUMN_TYPES_SELECT);
    if !capabilities.disable_datetime_precision {
        sql.push_str(DATETIME_PRECISION_SELECT);
    }
    sql.push_str(COLUMN_TYPES_FROM);
    SqlExpr::with_vars(sql, vec![SqlValue::from(schema), SqlValue::from(table)])
}

/// Returns true when a generation type denotes a generated key column.
#[must_use]
pub fn is_auto_increment(generation_type: &str) -> bool {
    let upper = generation_type.to_ascii_uppercase();
    upper.contains("IDENTITY") || upper.contains("AUTO_INCREMENT")
}

/// Maps one catalog row onto a [`ColumnType`].
///
/// `raw` holds the driver descriptors captured by the probe query; the one
/// whose name matches is attached to the record.
pub fn scan_column(
    row: &Row,
    capabilities: Capabilities,
    raw: &[RawColumnType],
) -> Result<ColumnType> {
    let name = row.text(NAME)?.unwrap_or_default();

    let mut default_value = row.text(DEFAULT)?;
    if capabilities.dont_support_null_as_default && default_value.as_deref() == Some("NULL") {
        default_value = None;
    }
    let default_value = default_value.map(|d| d.trim_matches('\'').to_string());

    let key = row.text(KEY)?;
    let primary_key = key.as_deref() == Some(PRIMARY_KEY);
    let unique = key.as_deref() == Some(UNIQUE_KEY);

    let auto_increment = row
        .text(EXTRA)?
        .is_some_and(|extra| is_auto_increment(&extra));

    let mut precision = row.int(PRECISION)?;
    let datetime_precision = if capabilities.disable_datetime_precision {
        None
    } else {
        row.int(DATETIME_PRECISION)?
    };
    if datetime_precision.is_some() {
        precision = datetime_precision;
    }

    let raw = raw
        .iter()
        .find(|c| c.name == name)
        .or_else(|| raw.iter().find(|c| c.name.to_uppercase() == name))
        .cloned();

    Ok(ColumnType {
        default_value,
        nullable: row.bool(NULLABLE)?,
        data_type: row.text(DATA_TYPE)?.unwrap_or_default(),
        length: row.int(LENGTH)?,
        column_type: row.text(COLUMN_TYPE)?,
        primary_key: Some(primary_key),
        unique: Some(unique),
        auto_increment: Some(auto_increment),
        comment: row.text(COMMENT)?,
        precision,
        scale: row.int(SCALE)?,
        datetime_precision,
        raw,
        name,
    })
}

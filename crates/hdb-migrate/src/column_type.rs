//! Column metadata reported by the database.

use serde::{Deserialize, Serialize};

/// Column descriptor as reported by the driver for a result set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawColumnType {
    /// Column name as returned by the driver.
    pub name: String,
    /// Driver type name (e.g. `NVARCHAR`).
    pub database_type_name: String,
    /// Nullability, when the driver knows it.
    pub nullable: Option<bool>,
    /// Declared length, when the driver knows it.
    pub length: Option<i64>,
    /// Precision and scale, when the driver knows them.
    pub decimal_size: Option<(i64, i64)>,
}

impl RawColumnType {
    /// Creates a descriptor with a name and type name.
    #[must_use]
    pub fn new(name: impl Into<String>, database_type_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            database_type_name: database_type_name.into(),
            ..Self::default()
        }
    }
}

/// Normalized metadata for one table column.
///
/// `None` means the catalog did not report the property.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnType {
    /// Column name.
    pub name: String,
    /// Default value, stripped of surrounding single quotes.
    pub default_value: Option<String>,
    /// Whether the column accepts NULL.
    pub nullable: Option<bool>,
    /// Data type name (e.g. `NVARCHAR`).
    pub data_type: String,
    /// Declared length.
    pub length: Option<i64>,
    /// Full type string, e.g. `DECIMAL(10,2)`.
    pub column_type: Option<String>,
    /// Primary key flag.
    pub primary_key: Option<bool>,
    /// Unique flag.
    pub unique: Option<bool>,
    /// Auto-increment (identity) flag.
    pub auto_increment: Option<bool>,
    /// Column comment.
    pub comment: Option<String>,
    /// Numeric precision; the datetime precision for temporal types.
    pub precision: Option<i64>,
    /// Numeric scale.
    pub scale: Option<i64>,
    /// Datetime precision derived from the type name, if requested.
    pub datetime_precision: Option<i64>,
    /// Matching driver descriptor from the probe query.
    #[serde(skip)]
    pub raw: Option<RawColumnType>,
}

impl ColumnType {
    /// Data type name, falling back to the driver's type name.
    #[must_use]
    pub fn database_type_name(&self) -> &str {
        if self.data_type.is_empty() {
            self.raw
                .as_ref()
                .map_or("", |raw| raw.database_type_name.as_str())
        } else {
            &self.data_type
        }
    }

    /// Full column type, falling back to the data type name.
    #[must_use]
    pub fn full_column_type(&self) -> &str {
        self.column_type
            .as_deref()
            .unwrap_or_else(|| self.database_type_name())
    }

    /// Precision and scale, falling back to the driver's values.
    #[must_use]
    pub fn decimal_size(&self) -> Option<(i64, i64)> {
        match self.precision {
            Some(precision) => Some((precision, self.scale.unwrap_or(0))),
            None => self.raw.as_ref().and_then(|raw| raw.decimal_size),
        }
    }

    /// Declared length, falling back to the driver's value.
    #[must_use]
    pub fn column_length(&self) -> Option<i64> {
        self.length
            .or_else(|| self.raw.as_ref().and_then(|raw| raw.length))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fallbacks_to_raw_descriptor() {
        let column = ColumnType {
            name: "CODE".into(),
            raw: Some(RawColumnType {
                name: "CODE".into(),
                database_type_name: "NVARCHAR".into(),
                nullable: Some(true),
                length: Some(20),
                decimal_size: None,
            }),
            ..ColumnType::default()
        };

        assert_eq!(column.database_type_name(), "NVARCHAR");
        assert_eq!(column.full_column_type(), "NVARCHAR");
        assert_eq!(column.column_length(), Some(20));
        assert_eq!(column.decimal_size(), None);
    }

    #[test]
    fn test_catalog_values_win() {
        let column = ColumnType {
            name: "PRICE".into(),
            data_type: "DECIMAL".into(),
            column_type: Some("DECIMAL(10,2)".into()),
            precision: Some(10),
            scale: Some(2),
            raw: Some(RawColumnType::new("PRICE", "DOUBLE")),
            ..ColumnType::default()
        };

        assert_eq!(column.database_type_name(), "DECIMAL");
        assert_eq!(column.full_column_type(), "DECIMAL(10,2)");
        assert_eq!(column.decimal_size(), Some((10, 2)));
    }
}

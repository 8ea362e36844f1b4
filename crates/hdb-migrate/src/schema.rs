//! Model schema representation.
//!
//! A [`ModelSchema`] is the reflected description of one model: the table it
//! maps to, its fields, indexes, check constraints and foreign keys. The
//! migrator only reads from it.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{MigrateError, Result};

/// Logical data type of a model field.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataType {
    /// Boolean.
    Bool,
    /// Signed integer; width comes from the field size.
    Int,
    /// Unsigned integer; width comes from the field size.
    Uint,
    /// Floating point; width comes from the field size.
    Float,
    /// Fixed-point decimal; uses precision and scale.
    Decimal,
    /// Character data; length comes from the field size.
    String,
    /// Date and time.
    Time,
    /// Binary data; length comes from the field size.
    Bytes,
    /// A database type spelled out verbatim.
    Custom(String),
}

/// Default value for a column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DefaultValue {
    /// NULL default.
    Null,
    /// Boolean default.
    Bool(bool),
    /// Integer default.
    Integer(i64),
    /// Float default.
    Float(f64),
    /// String default.
    String(String),
    /// SQL expression (e.g., "CURRENT_TIMESTAMP").
    Expression(String),
}

impl DefaultValue {
    /// Returns the SQL representation of this default value.
    #[must_use]
    pub fn to_sql(&self) -> String {
        match self {
            Self::Null => "NULL".to_string(),
            Self::Bool(b) => if *b { "TRUE" } else { "FALSE" }.to_string(),
            Self::Integer(i) => i.to_string(),
            Self::Float(f) => f.to_string(),
            Self::String(s) => format!("'{}'", s.replace('\'', "''")),
            Self::Expression(expr) => expr.clone(),
        }
    }
}

/// A model field and the column it is stored in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    /// Field name in the model.
    pub name: String,
    /// Storage (column) name. Empty means "same as `name`".
    #[serde(default)]
    pub db_name: String,
    /// Logical data type.
    pub data_type: DataType,
    /// Size in bits for numbers, length for strings and bytes.
    #[serde(default)]
    pub size: u32,
    /// Decimal precision, or fractional-second precision for time.
    #[serde(default)]
    pub precision: Option<u32>,
    /// Decimal scale.
    #[serde(default)]
    pub scale: Option<u32>,
    /// Whether this field is part of the primary key.
    #[serde(default)]
    pub primary_key: bool,
    /// Whether this column auto-increments.
    #[serde(default)]
    pub auto_increment: bool,
    /// Whether the column rejects NULL.
    #[serde(default)]
    pub not_null: bool,
    /// Whether the column has a UNIQUE constraint.
    #[serde(default)]
    pub unique: bool,
    /// Default value.
    #[serde(default)]
    pub default_value: Option<DefaultValue>,
    /// Free-form tag settings, keyed by upper-case name (e.g. `COMMENT`).
    #[serde(default)]
    pub tags: BTreeMap<String, String>,
}

impl Field {
    /// Creates a field stored under its own name.
    #[must_use]
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        let name = name.into();
        Self {
            db_name: name.clone(),
            name,
            data_type,
            size: 0,
            precision: None,
            scale: None,
            primary_key: false,
            auto_increment: false,
            not_null: false,
            unique: false,
            default_value: None,
            tags: BTreeMap::new(),
        }
    }

    /// Sets the storage name.
    #[must_use]
    pub fn db_name(mut self, db_name: impl Into<String>) -> Self {
        self.db_name = db_name.into();
        self
    }

    /// Sets the size.
    #[must_use]
    pub const fn size(mut self, size: u32) -> Self {
        self.size = size;
        self
    }

    /// Sets precision and scale.
    #[must_use]
    pub const fn precision(mut self, precision: u32, scale: u32) -> Self {
        self.precision = Some(precision);
        self.scale = Some(scale);
        self
    }

    /// Marks the field as primary key (implies NOT NULL).
    #[must_use]
    pub const fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self.not_null = true;
        self
    }

    /// Sets the field to auto-increment.
    #[must_use]
    pub const fn auto_increment(mut self) -> Self {
        self.auto_increment = true;
        self
    }

    /// Sets the field as NOT NULL.
    #[must_use]
    pub const fn not_null(mut self) -> Self {
        self.not_null = true;
        self
    }

    /// Sets the field as unique.
    #[must_use]
    pub const fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    /// Sets the default value.
    #[must_use]
    pub fn default(mut self, value: DefaultValue) -> Self {
        self.default_value = Some(value);
        self
    }

    /// Adds a tag setting. Keys are stored upper-cased.
    #[must_use]
    pub fn tag(mut self, key: &str, value: impl Into<String>) -> Self {
        self.tags.insert(key.to_ascii_uppercase(), value.into());
        self
    }

    /// Sets the `COMMENT` tag.
    #[must_use]
    pub fn comment(self, comment: impl Into<String>) -> Self {
        self.tag("COMMENT", comment)
    }

    /// Returns the `COMMENT` tag, if any.
    #[must_use]
    pub fn comment_tag(&self) -> Option<&str> {
        self.tags.get("COMMENT").map(String::as_str)
    }
}

/// One entry of an index's column list.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IndexField {
    /// Field name or storage name of the indexed column.
    pub column: String,
    /// Sort order (`ASC`/`DESC`).
    #[serde(default)]
    pub sort: Option<String>,
    /// Indexed expression, used instead of the column when present.
    #[serde(default)]
    pub expression: Option<String>,
}

impl IndexField {
    /// Creates an ascending entry for a column.
    #[must_use]
    pub fn new(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            sort: None,
            expression: None,
        }
    }

    /// Sets the sort order.
    #[must_use]
    pub fn sort(mut self, sort: impl Into<String>) -> Self {
        self.sort = Some(sort.into());
        self
    }
}

/// Schema definition for an index.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Index {
    /// Index name.
    pub name: String,
    /// Index class (e.g. `UNIQUE`); empty for a plain index.
    #[serde(default)]
    pub class: String,
    /// Index type (`USING ...`); empty for the engine default.
    #[serde(default, rename = "type")]
    pub index_type: String,
    /// Indexed columns, in order.
    pub fields: Vec<IndexField>,
}

impl Index {
    /// Creates a plain index.
    #[must_use]
    pub fn new(name: impl Into<String>, fields: Vec<IndexField>) -> Self {
        Self {
            name: name.into(),
            class: String::new(),
            index_type: String::new(),
            fields,
        }
    }

    /// Sets the index class.
    #[must_use]
    pub fn class(mut self, class: impl Into<String>) -> Self {
        self.class = class.into();
        self
    }

    /// Sets the index type.
    #[must_use]
    pub fn index_type(mut self, index_type: impl Into<String>) -> Self {
        self.index_type = index_type.into();
        self
    }
}

/// A named CHECK constraint.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CheckConstraint {
    /// Constraint name.
    pub name: String,
}

/// A named foreign key constraint.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ForeignKeyConstraint {
    /// Constraint name.
    pub name: String,
    /// Table owning the constraint; `None` means the model's own table.
    #[serde(default)]
    pub table: Option<String>,
    /// Column(s) in the referencing table.
    pub columns: Vec<String>,
    /// Referenced table name.
    pub references_table: String,
}

/// Reflected schema of one model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelSchema {
    /// Table name, optionally schema-qualified (`schema.table`).
    pub table: String,
    /// Field definitions.
    #[serde(default)]
    pub fields: Vec<Field>,
    /// Index definitions.
    #[serde(default)]
    pub indexes: Vec<Index>,
    /// Check constraints.
    #[serde(default)]
    pub checks: Vec<CheckConstraint>,
    /// Foreign keys, including those owned by join tables.
    #[serde(default)]
    pub foreign_keys: Vec<ForeignKeyConstraint>,
}

impl ModelSchema {
    /// Creates an empty model schema.
    #[must_use]
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            fields: Vec::new(),
            indexes: Vec::new(),
            checks: Vec::new(),
            foreign_keys: Vec::new(),
        }
    }

    /// Adds a field.
    #[must_use]
    pub fn field(mut self, field: Field) -> Self {
        self.fields.push(field);
        self
    }

    /// Adds an index.
    #[must_use]
    pub fn index(mut self, index: Index) -> Self {
        self.indexes.push(index);
        self
    }

    /// Adds a check constraint.
    #[must_use]
    pub fn check(mut self, name: impl Into<String>) -> Self {
        self.checks.push(CheckConstraint { name: name.into() });
        self
    }

    /// Adds a foreign key.
    #[must_use]
    pub fn foreign_key(mut self, fk: ForeignKeyConstraint) -> Self {
        self.foreign_keys.push(fk);
        self
    }

    /// Checks the schema and fills storage names left empty.
    pub fn validate(mut self) -> Result<Self> {
        if self.table.trim().is_empty() {
            return Err(MigrateError::InvalidModel("table name is empty".into()));
        }
        for field in &mut self.fields {
            if field.db_name.is_empty() {
                field.db_name.clone_from(&field.name);
            }
        }
        Ok(self)
    }

    /// Reads a JSON array of models from a file and validates each one.
    pub fn load_all(path: impl AsRef<Path>) -> Result<Vec<Self>> {
        let text = std::fs::read_to_string(path)?;
        let models: Vec<Self> = serde_json::from_str(&text)?;
        models.into_iter().map(Self::validate).collect()
    }

    /// Looks up a field by storage name, then by field name.
    #[must_use]
    pub fn look_up_field(&self, name: &str) -> Option<&Field> {
        self.fields
            .iter()
            .find(|f| f.db_name == name)
            .or_else(|| self.fields.iter().find(|f| f.name == name))
    }

    /// Looks up an index by name, then by any of its indexed columns.
    #[must_use]
    pub fn look_index(&self, name: &str) -> Option<&Index> {
        if let Some(index) = self.indexes.iter().find(|i| i.name == name) {
            return Some(index);
        }
        self.indexes.iter().find(|index| {
            index.fields.iter().any(|entry| {
                entry.column == name
                    || self
                        .look_up_field(&entry.column)
                        .is_some_and(|f| f.name == name || f.db_name == name)
            })
        })
    }

    /// Tables this model references through foreign keys it owns.
    #[must_use]
    pub fn dependencies(&self) -> Vec<&str> {
        let mut deps: Vec<&str> = Vec::new();
        for fk in &self.foreign_keys {
            let owned = fk.table.as_deref().is_none_or(|t| t == self.table);
            let target = fk.references_table.as_str();
            if owned && target != self.table && !deps.contains(&target) {
                deps.push(target);
            }
        }
        deps
    }
}

//! Database dialect support.
//!
//! A dialect knows how to quote identifiers, how to turn a statement
//! template plus arguments into a bound [`SqlExpr`], and how to spell a
//! model field's data type in its own SQL.

mod hana;

pub use hana::HanaDialect;

use serde::{Deserialize, Serialize};

use crate::schema::Field;
use crate::value::{split_placeholders, Arg, SqlExpr};

/// Native features the target engine lacks.
///
/// Each flag selects an alternative code path in the migrator; none of them
/// change after construction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Capabilities {
    /// `ALTER TABLE ... RENAME COLUMN` is unavailable; use `CHANGE`.
    pub dont_support_rename_column: bool,
    /// `ALTER TABLE ... RENAME INDEX` is unavailable; drop and recreate.
    pub dont_support_rename_index: bool,
    /// The catalog reports a literal `NULL` default that means "no default".
    pub dont_support_null_as_default: bool,
    /// Do not synthesize datetime precision when introspecting columns.
    pub disable_datetime_precision: bool,
}

/// Dialect configuration, loadable from JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DialectConfig {
    /// Capability flags.
    #[serde(flatten)]
    pub capabilities: Capabilities,
    /// Length used for string fields declared without a size.
    pub default_string_size: u32,
}

impl Default for DialectConfig {
    fn default() -> Self {
        Self {
            capabilities: Capabilities::default(),
            default_string_size: 256,
        }
    }
}

impl DialectConfig {
    /// Parses a configuration from JSON text.
    pub fn from_json(json: &str) -> crate::error::Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Trait for dialect-specific SQL generation.
pub trait Dialect: Send + Sync {
    /// Returns the column type for a model field.
    fn data_type_of(&self, field: &Field) -> String;

    /// Quotes a single identifier, doubling embedded quote characters.
    fn quote_identifier(&self, name: &str) -> String {
        format!("\"{}\"", name.replace('"', "\"\""))
    }

    /// Quotes a possibly schema-qualified table name segment by segment.
    fn quote_table(&self, name: &str) -> String {
        name.split('.')
            .map(|segment| self.quote_identifier(segment))
            .collect::<Vec<_>>()
            .join(".")
    }

    /// Fills the `?` placeholders of `template` with `args`, in order.
    ///
    /// Placeholders left over once `args` is exhausted stay in the SQL
    /// verbatim.
    fn build(&self, template: &str, args: Vec<Arg>) -> SqlExpr {
        let mut expr = SqlExpr::default();
        let mut args = args.into_iter();
        let pieces = split_placeholders(template);
        if let Some((tail, init)) = pieces.split_last() {
            for piece in init {
                expr.push_str(piece);
                match args.next() {
                    Some(Arg::Table(name)) => expr.push_str(&self.quote_table(&name)),
                    Some(Arg::Column(name)) => expr.push_str(&self.quote_identifier(&name)),
                    Some(Arg::Expr(inner)) => expr.append(inner),
                    None => expr.push_str("?"),
                }
            }
            expr.push_str(tail);
        }
        expr
    }

    /// Renders an expression with its bound values inlined, for logs and
    /// dry runs.
    fn explain(&self, expr: &SqlExpr) -> String {
        let mut out = String::with_capacity(expr.sql.len());
        let mut vars = expr.vars.iter();
        let pieces = split_placeholders(&expr.sql);
        if let Some((tail, init)) = pieces.split_last() {
            for piece in init {
                out.push_str(piece);
                match vars.next() {
                    Some(value) => out.push_str(&value.to_sql_inline()),
                    None => out.push('?'),
                }
            }
            out.push_str(tail);
        }
        out
    }
}

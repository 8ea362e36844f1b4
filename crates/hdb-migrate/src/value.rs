//! SQL values, expressions and statement arguments.
//!
//! Statements are written as templates with `?` placeholders. Each
//! placeholder is filled by an [`Arg`]: identifiers are quoted inline by the
//! dialect and nested expressions are spliced in with their bound values.
//! A `?` inside a quoted literal or identifier is text, not a placeholder.

use serde::{Deserialize, Serialize};

/// A SQL value that can be bound as a parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SqlValue {
    /// NULL value.
    Null,
    /// Boolean value.
    Bool(bool),
    /// Integer value.
    Int(i64),
    /// Float value.
    Float(f64),
    /// Text value.
    Text(String),
}

impl SqlValue {
    /// Returns the SQL representation for inline use (escaped).
    ///
    /// Only used to explain statements; execution always binds.
    #[must_use]
    pub fn to_sql_inline(&self) -> String {
        match self {
            Self::Null => String::from("NULL"),
            Self::Bool(b) => {
                if *b {
                    String::from("TRUE")
                } else {
                    String::from("FALSE")
                }
            }
            Self::Int(n) => format!("{n}"),
            Self::Float(f) => format!("{f}"),
            Self::Text(s) => {
                let escaped = s.replace('\'', "''");
                format!("'{escaped}'")
            }
        }
    }
}

impl From<&str> for SqlValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for SqlValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<i64> for SqlValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<bool> for SqlValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl<T: Into<Self>> From<Option<T>> for SqlValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

/// A SQL fragment together with the values bound to its `?` placeholders.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SqlExpr {
    /// SQL text; every `?` outside quotes is a bound parameter.
    pub sql: String,
    /// Bound values, in placeholder order.
    pub vars: Vec<SqlValue>,
}

impl SqlExpr {
    /// Creates an expression without bound values.
    #[must_use]
    pub fn new(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            vars: Vec::new(),
        }
    }

    /// Creates an expression with bound values.
    #[must_use]
    pub fn with_vars(sql: impl Into<String>, vars: Vec<SqlValue>) -> Self {
        Self {
            sql: sql.into(),
            vars,
        }
    }

    /// Appends raw SQL text.
    pub fn push_str(&mut self, sql: &str) {
        self.sql.push_str(sql);
    }

    /// Appends a bound value, writing its placeholder.
    pub fn push_bind(&mut self, value: impl Into<SqlValue>) {
        self.sql.push('?');
        self.vars.push(value.into());
    }

    /// Appends another expression, carrying its bound values along.
    pub fn append(&mut self, other: Self) {
        self.sql.push_str(&other.sql);
        self.vars.extend(other.vars);
    }
}

/// Argument substituted for one `?` of a statement template.
#[derive(Debug, Clone, PartialEq)]
pub enum Arg {
    /// A table name, quoted segment by segment.
    Table(String),
    /// A column (or index/constraint) name, quoted.
    Column(String),
    /// A nested expression, spliced in with its bound values.
    Expr(SqlExpr),
}

impl Arg {
    /// Table argument.
    pub fn table(name: impl Into<String>) -> Self {
        Self::Table(name.into())
    }

    /// Column argument.
    pub fn column(name: impl Into<String>) -> Self {
        Self::Column(name.into())
    }
}

/// Splits SQL text at its placeholders.
///
/// `n` placeholders yield `n + 1` pieces. Text inside `'...'` literals and
/// `"..."` identifiers is never split; doubled quotes inside them are
/// escapes and keep the quote open.
#[must_use]
pub fn split_placeholders(sql: &str) -> Vec<&str> {
    let mut pieces = Vec::new();
    let mut quote: Option<char> = None;
    let mut start = 0;
    for (i, ch) in sql.char_indices() {
        match quote {
            Some(open) if ch == open => quote = None,
            Some(_) => {}
            None if ch == '\'' || ch == '"' => quote = Some(ch),
            None if ch == '?' => {
                pieces.push(&sql[start..i]);
                start = i + 1;
            }
            None => {}
        }
    }
    pieces.push(&sql[start..]);
    pieces
}

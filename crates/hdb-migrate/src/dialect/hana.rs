//! SAP HANA dialect.

use crate::schema::{DataType, Field};

use super::{Capabilities, Dialect, DialectConfig};

/// Longest `NVARCHAR`/`VARBINARY` before falling back to LOB types.
const MAX_INLINE_LENGTH: u32 = 5000;

/// SAP HANA dialect.
#[derive(Debug, Clone, Default)]
pub struct HanaDialect {
    config: DialectConfig,
}

impl HanaDialect {
    /// Creates a dialect from its configuration.
    #[must_use]
    pub const fn new(config: DialectConfig) -> Self {
        Self { config }
    }

    /// Creates a dialect with default configuration and the given flags.
    #[must_use]
    pub fn with_capabilities(capabilities: Capabilities) -> Self {
        Self::new(DialectConfig {
            capabilities,
            ..DialectConfig::default()
        })
    }

    /// Returns the capability flags.
    #[must_use]
    pub const fn capabilities(&self) -> Capabilities {
        self.config.capabilities
    }

    fn integer_type(size: u32) -> &'static str {
        match size {
            1..=8 => "TINYINT",
            9..=16 => "SMALLINT",
            17..=32 => "INTEGER",
            _ => "BIGINT",
        }
    }
}

impl Dialect for HanaDialect {
    fn data_type_of(&self, field: &Field) -> String {
        match &field.data_type {
            DataType::Bool => "BOOLEAN".to_string(),
            DataType::Int | DataType::Uint => {
                let base = Self::integer_type(field.size);
                if field.auto_increment {
                    format!("{base} GENERATED BY DEFAULT AS IDENTITY")
                } else {
                    base.to_string()
                }
            }
            DataType::Float => {
                if field.size > 0 && field.size <= 32 {
                    "REAL".to_string()
                } else {
                    "DOUBLE".to_string()
                }
            }
            DataType::Decimal => match (field.precision, field.scale) {
                (Some(p), Some(s)) => format!("DECIMAL({p},{s})"),
                (Some(p), None) => format!("DECIMAL({p})"),
                _ => "DECIMAL".to_string(),
            },
            DataType::String => {
                let size = if field.size == 0 {
                    self.config.default_string_size
                } else {
                    field.size
                };
                if size > MAX_INLINE_LENGTH {
                    "NCLOB".to_string()
                } else {
                    format!("NVARCHAR({size})")
                }
            }
            DataType::Time => {
                if field.precision == Some(0) {
                    "SECONDDATE".to_string()
                } else {
                    "TIMESTAMP".to_string()
                }
            }
            DataType::Bytes => {
                if field.size > 0 && field.size <= MAX_INLINE_LENGTH {
                    format!("VARBINARY({})", field.size)
                } else {
                    "BLOB".to_string()
                }
            }
            DataType::Custom(name) => name.clone(),
        }
    }
}

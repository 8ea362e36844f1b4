//! SAP HANA dialect adapter for schema migrations.
//!
//! `hdb-migrate` teaches a generic migrator how to change schemas on HANA:
//! - DDL is emitted in the forms HANA accepts (`MODIFY COLUMN`, `CHANGE`,
//!   `DROP FOREIGN KEY`, ...)
//! - Missing native features are emulated, selected by capability flags
//! - Column metadata is read from the `TABLE_COLUMNS` catalog view
//!
//! # Architecture
//!
//! - **Dialect** - Capability flags, identifier quoting, type names
//! - **Generic migrator** - The [`generic::BaseMigrator`] capability interface
//!   and its stock implementation
//! - **HANA migrator** - [`migrator::HdbMigrator`], which overrides the
//!   operations whose SQL differs on HANA
//! - **Connection** - The driver seam; [`recorder::RecordingConnection`]
//!   records statements for dry runs and tests
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use hdb_migrate::prelude::*;
//!
//! let dialect = HanaDialect::with_capabilities(Capabilities {
//!     dont_support_rename_index: true,
//!     ..Capabilities::default()
//! });
//! let base = GenericMigrator::new(Arc::new(connection), dialect.clone(), "APP");
//! let migrator = HdbMigrator::new(base, dialect);
//!
//! let users = ModelSchema::new("users")
//!     .field(Field::new("id", DataType::Int).size(64).primary_key().auto_increment())
//!     .field(Field::new("name", DataType::String).size(50).comment("display name"));
//!
//! migrator.alter_column(&users, "name").await?;
//! for column in migrator.column_types(&users).await? {
//!     println!("{} {}", column.name, column.full_column_type());
//! }
//! ```

pub mod catalog;
pub mod column_type;
pub mod connection;
pub mod dialect;
pub mod error;
pub mod generic;
pub mod migrator;
pub mod recorder;
pub mod schema;
pub mod value;

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::column_type::{ColumnType, RawColumnType};
    pub use crate::connection::{Connection, Row};
    pub use crate::dialect::{Capabilities, Dialect, DialectConfig, HanaDialect};
    pub use crate::error::{MigrateError, Result};
    pub use crate::generic::{BaseMigrator, GenericMigrator, GuessedConstraint, Statement};
    pub use crate::migrator::HdbMigrator;
    pub use crate::recorder::RecordingConnection;
    pub use crate::schema::{
        CheckConstraint, DataType, DefaultValue, Field, ForeignKeyConstraint, Index, IndexField,
        ModelSchema,
    };
    pub use crate::value::{Arg, SqlExpr, SqlValue};
}

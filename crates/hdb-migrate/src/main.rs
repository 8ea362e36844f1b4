//! hdb-migrate CLI
//!
//! Prints the SQL the HANA migrator emits for a model, without touching a
//! database.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use hdb_migrate::prelude::*;

/// SAP HANA schema migration SQL, as a dry run.
#[derive(Parser)]
#[command(name = "hdb-migrate")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// JSON file holding an array of model schemas.
    #[arg(short, long, default_value = "models.json")]
    models: PathBuf,

    /// JSON dialect configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Current schema, used for unqualified table names.
    #[arg(short, long, env = "HDB_SCHEMA", default_value = "SYSTEM")]
    schema: String,

    /// Emulate RENAME COLUMN with CHANGE.
    #[arg(long)]
    dont_support_rename_column: bool,

    /// Emulate RENAME INDEX by dropping and recreating.
    #[arg(long)]
    dont_support_rename_index: bool,

    /// Treat a catalog default of NULL as no default.
    #[arg(long)]
    dont_support_null_as_default: bool,

    /// Leave datetime precision out of column introspection.
    #[arg(long)]
    disable_datetime_precision: bool,

    /// Enable verbose output.
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the column definition of a field.
    FullDataType {
        /// Model table name.
        model: String,
        /// Field name.
        field: String,
    },

    /// Change a column to match its field definition.
    AlterColumn {
        /// Model table name.
        model: String,
        /// Field name.
        field: String,
    },

    /// Rename a column.
    RenameColumn {
        /// Model table name.
        model: String,
        /// Current column name.
        old: String,
        /// New column name.
        new: String,
    },

    /// Rename an index.
    RenameIndex {
        /// Model table name.
        model: String,
        /// Current index name.
        old: String,
        /// New index name.
        new: String,
    },

    /// Drop tables in dependency order.
    DropTable {
        /// Model table names.
        #[arg(required = true)]
        tables: Vec<String>,
    },

    /// Drop a check or foreign key constraint.
    DropConstraint {
        /// Model table name.
        model: String,
        /// Constraint name.
        name: String,
    },

    /// Show the catalog queries used to introspect a table.
    ColumnTypes {
        /// Model table name.
        model: String,
    },

    /// Split a table name into schema and table.
    CurrentSchema {
        /// Table name, optionally schema-qualified.
        table: String,
    },
}

impl Cli {
    fn dialect_config(&self) -> anyhow::Result<DialectConfig> {
        let mut config = match &self.config {
            Some(path) => {
                let text = std::fs::read_to_string(path)
                    .with_context(|| format!("reading {}", path.display()))?;
                DialectConfig::from_json(&text)?
            }
            None => DialectConfig::default(),
        };

        let caps = &mut config.capabilities;
        caps.dont_support_rename_column |= self.dont_support_rename_column;
        caps.dont_support_rename_index |= self.dont_support_rename_index;
        caps.dont_support_null_as_default |= self.dont_support_null_as_default;
        caps.disable_datetime_precision |= self.disable_datetime_precision;
        Ok(config)
    }
}

fn find_model<'a>(models: &'a [ModelSchema], table: &str) -> anyhow::Result<&'a ModelSchema> {
    models
        .iter()
        .find(|m| m.table == table)
        .with_context(|| format!("no model for table {table}"))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let dialect = HanaDialect::new(cli.dialect_config()?);
    let connection = RecordingConnection::new().echo(true);
    let base = GenericMigrator::new(Arc::new(connection), dialect.clone(), cli.schema.clone());
    let migrator = HdbMigrator::new(base, dialect);

    if let Commands::CurrentSchema { table } = &cli.command {
        let (schema, table) = migrator.current_schema(table);
        println!("{schema}\t{table}");
        return Ok(());
    }

    let models = ModelSchema::load_all(&cli.models)
        .with_context(|| format!("loading models from {}", cli.models.display()))?;

    match &cli.command {
        Commands::FullDataType { model, field } => {
            let model = find_model(&models, model)?;
            let field = model
                .look_up_field(field)
                .ok_or_else(|| MigrateError::FieldNotFound(field.clone()))?;
            let expr = migrator.full_data_type_of(field);
            println!("{}", migrator.dialect().explain(&expr));
        }

        Commands::AlterColumn { model, field } => {
            migrator
                .alter_column(find_model(&models, model)?, field)
                .await?;
        }

        Commands::RenameColumn { model, old, new } => {
            migrator
                .rename_column(find_model(&models, model)?, old, new)
                .await?;
        }

        Commands::RenameIndex { model, old, new } => {
            migrator
                .rename_index(find_model(&models, model)?, old, new)
                .await?;
        }

        Commands::DropTable { tables } => {
            let selected = tables
                .iter()
                .map(|t| find_model(&models, t).cloned())
                .collect::<anyhow::Result<Vec<_>>>()?;
            migrator.drop_table(&selected).await?;
        }

        Commands::DropConstraint { model, name } => {
            migrator
                .drop_constraint(find_model(&models, model)?, name)
                .await?;
        }

        Commands::ColumnTypes { model } => {
            let columns = migrator.column_types(find_model(&models, model)?).await?;
            info!(count = columns.len(), "Columns reported by the catalog");
        }

        Commands::CurrentSchema { .. } => {}
    }

    Ok(())
}

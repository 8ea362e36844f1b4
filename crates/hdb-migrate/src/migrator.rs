//! HANA migrator.
//!
//! [`HdbMigrator`] wraps a [`BaseMigrator`] and replaces the operations whose
//! SQL differs on HANA. Everything else is reached through [`HdbMigrator::base`].
//!
//! Multi-statement operations are not atomic: `rename_index` and
//! `drop_table` stop at the first failing statement and leave whatever the
//! earlier statements did in place.

use tracing::{debug, info, warn};

use crate::catalog;
use crate::column_type::ColumnType;
use crate::connection::Connection;
use crate::dialect::{Capabilities, Dialect, HanaDialect};
use crate::error::{MigrateError, Result};
use crate::generic::{split_table_name, BaseMigrator};
use crate::schema::{Field, ModelSchema};
use crate::value::{Arg, SqlExpr};

/// Migrator for SAP HANA.
pub struct HdbMigrator<B: BaseMigrator> {
    base: B,
    dialect: HanaDialect,
}

impl<B: BaseMigrator> HdbMigrator<B> {
    /// Wraps a generic migrator.
    pub const fn new(base: B, dialect: HanaDialect) -> Self {
        Self { base, dialect }
    }

    /// The wrapped generic migrator.
    pub const fn base(&self) -> &B {
        &self.base
    }

    /// The dialect.
    pub const fn dialect(&self) -> &HanaDialect {
        &self.dialect
    }

    fn capabilities(&self) -> Capabilities {
        self.dialect.capabilities()
    }

    async fn exec_on(&self, conn: &dyn Connection, stmt: &SqlExpr) -> Result<()> {
        debug!(sql = %self.dialect.explain(stmt), "Executing SQL");
        conn.execute(stmt).await?;
        Ok(())
    }

    async fn exec(&self, stmt: &SqlExpr) -> Result<()> {
        self.exec_on(self.base.connection(), stmt).await
    }

    /// Column definition for a field, with its `COMMENT` tag appended as a
    /// bound value.
    pub fn full_data_type_of(&self, field: &Field) -> SqlExpr {
        let mut expr = self.base.full_data_type_of(field);
        if let Some(comment) = field.comment_tag() {
            expr.push_str(" COMMENT ");
            expr.push_bind(comment);
        }
        expr
    }

    /// Changes a column's definition to match its field.
    pub async fn alter_column(&self, model: &ModelSchema, field: &str) -> Result<()> {
        let stmt = self.base.resolve(model)?;
        let Some(field) = stmt.schema.look_up_field(field) else {
            return Err(MigrateError::FieldNotFound(field.to_string()));
        };

        let sql = self.dialect.build(
            "ALTER TABLE ? MODIFY COLUMN ? ?",
            vec![
                Arg::table(&stmt.table),
                Arg::column(&field.db_name),
                Arg::Expr(self.full_data_type_of(field)),
            ],
        );
        self.exec(&sql).await
    }

    /// Renames a column, using `CHANGE` when `RENAME COLUMN` is unavailable.
    pub async fn rename_column(
        &self,
        model: &ModelSchema,
        old_name: &str,
        new_name: &str,
    ) -> Result<()> {
        if !self.capabilities().dont_support_rename_column {
            return self.base.rename_column(model, old_name, new_name).await;
        }

        let stmt = self.base.resolve(model)?;
        let old_field = stmt.schema.look_up_field(old_name);
        let new_field = stmt.schema.look_up_field(new_name);
        let old_column = old_field.map_or(old_name, |f| f.db_name.as_str());
        let new_column = new_field.map_or(new_name, |f| f.db_name.as_str());

        let Some(field) = new_field.or(old_field) else {
            return Err(MigrateError::FieldNotFound(new_name.to_string()));
        };

        let sql = self.dialect.build(
            "ALTER TABLE ? CHANGE ? ? ?",
            vec![
                Arg::table(&stmt.table),
                Arg::column(old_column),
                Arg::column(new_column),
                Arg::Expr(self.full_data_type_of(field)),
            ],
        );
        self.exec(&sql).await
    }

    /// Renames an index, dropping and recreating it when `RENAME INDEX` is
    /// unavailable.
    ///
    /// The emulated path recreates the index from the definition found under
    /// `old_name`, or else from the model's definition for `new_name`. If
    /// neither exists the error from index creation is returned, after the
    /// old index has already been dropped.
    pub async fn rename_index(
        &self,
        model: &ModelSchema,
        old_name: &str,
        new_name: &str,
    ) -> Result<()> {
        let stmt = self.base.resolve(model)?;

        if !self.capabilities().dont_support_rename_index {
            let sql = self.dialect.build(
                "ALTER TABLE ? RENAME INDEX ? TO ?",
                vec![
                    Arg::table(&stmt.table),
                    Arg::column(old_name),
                    Arg::column(new_name),
                ],
            );
            return self.exec(&sql).await;
        }

        self.base.drop_index(model, old_name).await?;

        if self.base.has_index(model, new_name).await? {
            info!(index = %new_name, "Index already present under new name");
            return Ok(());
        }

        if let Some(index) = stmt.schema.look_index(old_name) {
            let mut template = String::from("CREATE ");
            if !index.class.is_empty() {
                template.push_str(&index.class);
                template.push(' ');
            }
            template.push_str("INDEX ? ON ??");
            if !index.index_type.is_empty() {
                template.push_str(" USING ");
                template.push_str(&index.index_type);
            }

            let options = self.base.build_index_options(&index.fields, &stmt);
            let sql = self.dialect.build(
                &template,
                vec![
                    Arg::column(new_name),
                    Arg::table(&stmt.table),
                    Arg::Expr(options),
                ],
            );
            return self.exec(&sql).await;
        }

        warn!(
            old = %old_name,
            new = %new_name,
            "No definition under old index name, creating from model"
        );
        self.base.create_index(model, new_name).await
    }

    /// Drops tables in reverse dependency order with foreign key checks
    /// switched off.
    ///
    /// If a drop fails the error is returned straight away and the checks
    /// are left switched off on the session.
    pub async fn drop_table(&self, models: &[ModelSchema]) -> Result<()> {
        let models = self.base.reorder_models(models);
        let session = self.base.session().await?;

        self.set_foreign_key_checks(session.as_ref(), false).await;
        for model in models.iter().rev() {
            let stmt = self.base.resolve(model)?;
            let sql = self.dialect.build(
                "DROP TABLE IF EXISTS ? CASCADE",
                vec![Arg::table(&stmt.table)],
            );
            self.exec_on(session.as_ref(), &sql).await?;
        }
        self.set_foreign_key_checks(session.as_ref(), true).await;

        Ok(())
    }

    async fn set_foreign_key_checks(&self, session: &dyn Connection, enabled: bool) {
        let sql = SqlExpr::new(format!("SET FOREIGN_KEY_CHECKS = {}", u8::from(enabled)));
        if let Err(err) = self.exec_on(session, &sql).await {
            warn!(error = %err, enabled, "Failed to toggle foreign key checks");
        }
    }

    /// Drops a check or foreign key constraint.
    pub async fn drop_constraint(&self, model: &ModelSchema, name: &str) -> Result<()> {
        let stmt = self.base.resolve(model)?;
        let guess = self.base.guess_constraint_and_table(&stmt, name);

        let sql = if let Some(check) = guess.check {
            self.dialect.build(
                "ALTER TABLE ? DROP CHECK ?",
                vec![Arg::table(&stmt.table), Arg::column(check.name)],
            )
        } else {
            let name = guess.foreign_key.map_or_else(|| name.to_string(), |fk| fk.name);
            self.dialect.build(
                "ALTER TABLE ? DROP FOREIGN KEY ?",
                vec![Arg::table(guess.table), Arg::column(name)],
            )
        };
        self.exec(&sql).await
    }

    /// Reads column metadata for the model's table from the catalog.
    ///
    /// Records come back in whatever order the catalog returns them.
    pub async fn column_types(&self, model: &ModelSchema) -> Result<Vec<ColumnType>> {
        let stmt = self.base.resolve(model)?;
        let (schema, table) = self.current_schema(&stmt.table);
        debug!(schema = %schema, table = %table, "Introspecting columns");

        let conn = self.base.connection();
        let probe = self.dialect.build("SELECT * FROM ? LIMIT 1", vec![Arg::table(&stmt.table)]);
        debug!(sql = %self.dialect.explain(&probe), "Probing columns");
        let raw = conn.describe(&probe).await?;

        let capabilities = self.capabilities();
        let query = catalog::column_types_query(capabilities, &schema, &table);
        debug!(sql = %self.dialect.explain(&query), "Querying catalog");
        let rows = conn.query(&query).await?;

        rows.iter()
            .map(|row| catalog::scan_column(row, capabilities, &raw))
            .collect()
    }

    /// Splits `schema.table`; unqualified names belong to the current schema.
    pub fn current_schema(&self, table: &str) -> (String, String) {
        match split_table_name(table) {
            Some((schema, name)) => (schema.to_string(), name.to_string()),
            None => (self.base.current_database(), table.to_string()),
        }
    }
}

//! Generic migrator.
//!
//! [`BaseMigrator`] is the capability interface the HANA migrator builds
//! on: statement resolution, execution, model ordering, constraint
//! guessing and index helpers. [`GenericMigrator`] is the stock
//! implementation over a [`Connection`].

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::connection::Connection;
use crate::dialect::Dialect;
use crate::error::{MigrateError, Result};
use crate::schema::{CheckConstraint, Field, ForeignKeyConstraint, IndexField, ModelSchema};
use crate::value::{Arg, SqlExpr, SqlValue};

/// A model resolved for the duration of one operation.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    /// Table the model maps to, possibly schema-qualified.
    pub table: String,
    /// The model's reflected schema.
    pub schema: ModelSchema,
}

/// Result of guessing what a constraint name refers to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuessedConstraint {
    /// Matching foreign key, if any.
    pub foreign_key: Option<ForeignKeyConstraint>,
    /// Matching check constraint, if any.
    pub check: Option<CheckConstraint>,
    /// Table owning the constraint.
    pub table: String,
}

/// Splits `schema.table` into its two segments.
#[must_use]
pub fn split_table_name(table: &str) -> Option<(&str, &str)> {
    let mut parts = table.split('.');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(schema), Some(name), None) => Some((schema, name)),
        _ => None,
    }
}

// Depth-first placement for `reorder_models`.
fn visit(
    i: usize,
    models: &[ModelSchema],
    positions: &HashMap<&str, usize>,
    marks: &mut [u8],
    order: &mut Vec<usize>,
) {
    if marks[i] != 0 {
        return;
    }
    marks[i] = 1;
    for dep in models[i].dependencies() {
        if let Some(&j) = positions.get(dep) {
            visit(j, models, positions, marks, order);
        }
    }
    marks[i] = 2;
    order.push(i);
}

/// Capability interface of a generic migrator.
#[async_trait]
pub trait BaseMigrator: Send + Sync {
    /// Name of the current schema.
    fn current_database(&self) -> String;

    /// The connection statements run on.
    fn connection(&self) -> &dyn Connection;

    /// Opens a dedicated session for session-scoped settings.
    async fn session(&self) -> Result<Arc<dyn Connection>>;

    /// Resolves a model into its statement context.
    fn resolve(&self, model: &ModelSchema) -> Result<Statement>;

    /// Column definition for a field: type plus constraints and default.
    fn full_data_type_of(&self, field: &Field) -> SqlExpr;

    /// Parenthesized, quoted column list for an index.
    fn build_index_options(&self, fields: &[IndexField], stmt: &Statement) -> SqlExpr;

    /// Orders models so that referenced tables come first.
    fn reorder_models(&self, models: &[ModelSchema]) -> Vec<ModelSchema>;

    /// Works out what constraint `name` refers to and where it lives.
    fn guess_constraint_and_table(&self, stmt: &Statement, name: &str) -> GuessedConstraint;

    /// Renames a column with `RENAME COLUMN`.
    async fn rename_column(&self, model: &ModelSchema, old_name: &str, new_name: &str)
        -> Result<()>;

    /// Checks whether the database has an index with this name on the table.
    async fn has_index(&self, model: &ModelSchema, name: &str) -> Result<bool>;

    /// Drops an index.
    async fn drop_index(&self, model: &ModelSchema, name: &str) -> Result<()>;

    /// Creates an index from its definition on the model.
    async fn create_index(&self, model: &ModelSchema, name: &str) -> Result<()>;
}

/// Stock [`BaseMigrator`] over a connection and a dialect.
pub struct GenericMigrator<D: Dialect> {
    connection: Arc<dyn Connection>,
    dialect: D,
    current_database: String,
}

impl<D: Dialect> GenericMigrator<D> {
    /// Creates a generic migrator.
    pub fn new(
        connection: Arc<dyn Connection>,
        dialect: D,
        current_database: impl Into<String>,
    ) -> Self {
        Self {
            connection,
            dialect,
            current_database: current_database.into(),
        }
    }

    /// Returns the dialect.
    #[must_use]
    pub const fn dialect(&self) -> &D {
        &self.dialect
    }

    async fn exec(&self, stmt: SqlExpr) -> Result<()> {
        debug!(sql = %self.dialect.explain(&stmt), "Executing SQL");
        self.connection.execute(&stmt).await?;
        Ok(())
    }

    fn index_create_sql(
        &self,
        stmt: &Statement,
        index_name: &str,
        definition: &str,
    ) -> Result<SqlExpr> {
        let index = stmt
            .schema
            .look_index(definition)
            .ok_or_else(|| MigrateError::IndexNotFound(definition.to_string()))?;
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
        let options = self.build_index_options(&index.fields, stmt);
        Ok(self.dialect.build(
            &template,
            vec![
                Arg::column(index_name),
                Arg::table(&stmt.table),
                Arg::Expr(options),
            ],
        ))
    }
}

#[async_trait]
impl<D: Dialect> BaseMigrator for GenericMigrator<D> {
    fn current_database(&self) -> String {
        self.current_database.clone()
    }

    fn connection(&self) -> &dyn Connection {
        self.connection.as_ref()
    }

    async fn session(&self) -> Result<Arc<dyn Connection>> {
        Ok(Arc::clone(&self.connection))
    }

    fn resolve(&self, model: &ModelSchema) -> Result<Statement> {
        let schema = model.clone().validate()?;
        Ok(Statement {
            table: schema.table.clone(),
            schema,
        })
    }

    fn full_data_type_of(&self, field: &Field) -> SqlExpr {
        let mut expr = SqlExpr::new(self.dialect.data_type_of(field));
        if field.not_null {
            expr.push_str(" NOT NULL");
        }
        if field.unique {
            expr.push_str(" UNIQUE");
        }
        if let Some(default) = &field.default_value {
            expr.push_str(" DEFAULT ");
            expr.push_str(&default.to_sql());
        }
        expr
    }

    fn build_index_options(&self, fields: &[IndexField], stmt: &Statement) -> SqlExpr {
        let columns: Vec<String> = fields
            .iter()
            .map(|entry| {
                let mut column = match &entry.expression {
                    Some(expression) => expression.clone(),
                    None => {
                        let db_name = stmt
                            .schema
                            .look_up_field(&entry.column)
                            .map_or(entry.column.as_str(), |f| f.db_name.as_str());
                        self.dialect.quote_identifier(db_name)
                    }
                };
                if let Some(sort) = &entry.sort {
                    column.push(' ');
                    column.push_str(sort);
                }
                column
            })
            .collect();
        SqlExpr::new(format!("({})", columns.join(",")))
    }

    fn reorder_models(&self, models: &[ModelSchema]) -> Vec<ModelSchema> {
        let positions: HashMap<&str, usize> = models
            .iter()
            .enumerate()
            .map(|(i, m)| (m.table.as_str(), i))
            .collect();

        // 0 = unvisited, 1 = in progress, 2 = placed
        let mut marks = vec![0_u8; models.len()];
        let mut order = Vec::with_capacity(models.len());

        for i in 0..models.len() {
            visit(i, models, &positions, &mut marks, &mut order);
        }
        order.into_iter().map(|i| models[i].clone()).collect()
    }

    fn guess_constraint_and_table(&self, stmt: &Statement, name: &str) -> GuessedConstraint {
        let schema = &stmt.schema;
        if let Some(check) = schema.checks.iter().find(|c| c.name == name) {
            return GuessedConstraint {
                foreign_key: None,
                check: Some(check.clone()),
                table: stmt.table.clone(),
            };
        }

        let by_name = schema.foreign_keys.iter().find(|fk| fk.name == name);
        let by_field = || {
            let column = schema
                .look_up_field(name)
                .map_or(name, |f| f.db_name.as_str());
            schema
                .foreign_keys
                .iter()
                .find(|fk| fk.columns.len() == 1 && fk.columns[0] == column)
        };

        match by_name.or_else(by_field) {
            Some(fk) => GuessedConstraint {
                foreign_key: Some(fk.clone()),
                check: None,
                table: fk.table.clone().unwrap_or_else(|| stmt.table.clone()),
            },
            None => GuessedConstraint {
                foreign_key: None,
                check: None,
                table: stmt.table.clone(),
            },
        }
    }

    async fn rename_column(
        &self,
        model: &ModelSchema,
        old_name: &str,
        new_name: &str,
    ) -> Result<()> {
        let stmt = self.resolve(model)?;
        let old_name = stmt
            .schema
            .look_up_field(old_name)
            .map_or(old_name, |f| f.db_name.as_str());
        let new_name = stmt
            .schema
            .look_up_field(new_name)
            .map_or(new_name, |f| f.db_name.as_str());
        let sql = self.dialect.build(
            "ALTER TABLE ? RENAME COLUMN ? TO ?",
            vec![
                Arg::table(&stmt.table),
                Arg::column(old_name),
                Arg::column(new_name),
            ],
        );
        self.exec(sql).await
    }

    async fn has_index(&self, model: &ModelSchema, name: &str) -> Result<bool> {
        let stmt = self.resolve(model)?;
        let current = self.current_database();
        let (schema, table) =
            split_table_name(&stmt.table).unwrap_or((current.as_str(), stmt.table.as_str()));
        let name = stmt.schema.look_index(name).map_or(name, |i| i.name.as_str());

        let query = SqlExpr::with_vars(
            "SELECT COUNT(*) FROM INDEXES \
             WHERE SCHEMA_NAME = ? AND TABLE_NAME = ? AND INDEX_NAME = ?",
            vec![SqlValue::from(schema), SqlValue::from(table), SqlValue::from(name)],
        );
        debug!(sql = %self.dialect.explain(&query), "Querying catalog");
        let rows = self.connection.query(&query).await?;
        let count = match rows.first() {
            Some(row) => row.int(0)?.unwrap_or(0),
            None => 0,
        };
        Ok(count > 0)
    }

    async fn drop_index(&self, model: &ModelSchema, name: &str) -> Result<()> {
        let stmt = self.resolve(model)?;
        let name = stmt.schema.look_index(name).map_or(name, |i| i.name.as_str());
        let qualified = match split_table_name(&stmt.table) {
            Some((schema, _)) => format!("{schema}.{name}"),
            None => name.to_string(),
        };
        let sql = self.dialect.build("DROP INDEX ?", vec![Arg::table(qualified)]);
        self.exec(sql).await
    }

    async fn create_index(&self, model: &ModelSchema, name: &str) -> Result<()> {
        let stmt = self.resolve(model)?;
        let index_name = stmt
            .schema
            .look_index(name)
            .map_or_else(|| name.to_string(), |i| i.name.clone());
        let sql = self.index_create_sql(&stmt, &index_name, name)?;
        self.exec(sql).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::HanaDialect;
    use crate::recorder::RecordingConnection;
    use crate::schema::{DataType, DefaultValue, Index};

    fn fk(name: &str, column: &str, target: &str) -> ForeignKeyConstraint {
        ForeignKeyConstraint {
            name: name.into(),
            table: None,
            columns: vec![column.into()],
            references_table: target.into(),
        }
    }

    fn migrator(conn: &RecordingConnection) -> GenericMigrator<HanaDialect> {
        GenericMigrator::new(Arc::new(conn.clone()), HanaDialect::default(), "APP")
    }

    fn posts() -> ModelSchema {
        ModelSchema::new("posts")
            .field(Field::new("ID", DataType::Int).db_name("id").primary_key())
            .field(Field::new("UserID", DataType::Int).db_name("user_id"))
            .field(Field::new("Title", DataType::String).db_name("title").size(120))
            .index(
                Index::new(
                    "idx_posts_title",
                    vec![IndexField::new("Title").sort("DESC"), IndexField::new("user_id")],
                )
                .class("UNIQUE")
                .index_type("CPBTREE"),
            )
            .check("chk_title")
            .foreign_key(fk("fk_posts_user", "user_id", "users"))
    }

    #[test]
    fn test_split_table_name() {
        assert_eq!(split_table_name("app.users"), Some(("app", "users")));
        assert_eq!(split_table_name("users"), None);
        assert_eq!(split_table_name("a.b.c"), None);
    }

    #[test]
    fn test_full_data_type_of() {
        let conn = RecordingConnection::new();
        let m = migrator(&conn);
        let field = Field::new("name", DataType::String)
            .size(50)
            .not_null()
            .unique()
            .default(DefaultValue::String("x".into()));

        let expr = m.full_data_type_of(&field);
        assert_eq!(expr.sql, "NVARCHAR(50) NOT NULL UNIQUE DEFAULT 'x'");
        assert!(expr.vars.is_empty());
    }

    #[test]
    fn test_build_index_options() {
        let conn = RecordingConnection::new();
        let m = migrator(&conn);
        let stmt = m.resolve(&posts()).unwrap();
        let index = stmt.schema.look_index("idx_posts_title").unwrap();

        let expr = m.build_index_options(&index.fields, &stmt);
        assert_eq!(expr.sql, r#"("title" DESC,"user_id")"#);
    }

    #[test]
    fn test_reorder_models_puts_dependencies_first() {
        let conn = RecordingConnection::new();
        let m = migrator(&conn);
        let comments = ModelSchema::new("comments")
            .foreign_key(fk("fk_comments_post", "post_id", "posts"))
            .foreign_key(fk("fk_comments_user", "user_id", "users"));
        let users = ModelSchema::new("users");

        let ordered = m.reorder_models(&[comments, posts(), users]);
        let tables: Vec<&str> = ordered.iter().map(|m| m.table.as_str()).collect();
        assert_eq!(tables, vec!["users", "posts", "comments"]);
    }

    #[test]
    fn test_reorder_models_tolerates_cycles() {
        let conn = RecordingConnection::new();
        let m = migrator(&conn);
        let a = ModelSchema::new("a").foreign_key(fk("fk_a_b", "b_id", "b"));
        let b = ModelSchema::new("b").foreign_key(fk("fk_b_a", "a_id", "a"));

        let ordered = m.reorder_models(&[a, b]);
        assert_eq!(ordered.len(), 2);
    }

    #[test]
    fn test_guess_constraint() {
        let conn = RecordingConnection::new();
        let m = migrator(&conn);
        let mut model = posts();
        model.foreign_keys.push(ForeignKeyConstraint {
            table: Some("post_tags".into()),
            ..fk("fk_post_tags_post", "post_id", "posts")
        });
        let stmt = m.resolve(&model).unwrap();

        let check = m.guess_constraint_and_table(&stmt, "chk_title");
        assert_eq!(check.check.map(|c| c.name), Some("chk_title".into()));
        assert_eq!(check.table, "posts");

        let by_field = m.guess_constraint_and_table(&stmt, "UserID");
        assert_eq!(
            by_field.foreign_key.map(|fk| fk.name),
            Some("fk_posts_user".into())
        );

        let join = m.guess_constraint_and_table(&stmt, "fk_post_tags_post");
        assert_eq!(join.table, "post_tags");

        let unknown = m.guess_constraint_and_table(&stmt, "fk_unknown");
        assert!(unknown.foreign_key.is_none() && unknown.check.is_none());
        assert_eq!(unknown.table, "posts");
    }

    #[tokio::test]
    async fn test_rename_column_native() {
        let conn = RecordingConnection::new();
        let m = migrator(&conn);
        m.rename_column(&posts(), "Title", "headline").await.unwrap();

        assert_eq!(
            conn.sql_log(),
            vec![r#"ALTER TABLE "posts" RENAME COLUMN "title" TO "headline""#]
        );
    }

    #[tokio::test]
    async fn test_create_index_from_definition() {
        let conn = RecordingConnection::new();
        let m = migrator(&conn);
        m.create_index(&posts(), "idx_posts_title").await.unwrap();

        assert_eq!(
            conn.sql_log(),
            vec![concat!(
                r#"CREATE UNIQUE INDEX "idx_posts_title" ON "posts""#,
                r#"("title" DESC,"user_id") USING CPBTREE"#
            )]
        );
    }

    #[tokio::test]
    async fn test_create_index_unknown_name_fails() {
        let conn = RecordingConnection::new();
        let m = migrator(&conn);
        let err = m.create_index(&posts(), "idx_missing").await.unwrap_err();

        assert!(matches!(&err, MigrateError::IndexNotFound(name) if name == "idx_missing"));
        assert_eq!(err.to_string(), "failed to look up index with name: idx_missing");
        assert!(conn.statements().is_empty());
    }

    #[tokio::test]
    async fn test_drop_index_qualifies_schema() {
        let conn = RecordingConnection::new();
        let m = migrator(&conn);
        let mut model = posts();
        model.table = "blog.posts".into();
        m.drop_index(&model, "idx_posts_title").await.unwrap();

        assert_eq!(conn.sql_log(), vec![r#"DROP INDEX "blog"."idx_posts_title""#]);
    }

    #[tokio::test]
    async fn test_has_index_counts_catalog_rows() {
        let conn = RecordingConnection::new().with_rows(vec![vec![SqlValue::Int(1)].into()]);
        let m = migrator(&conn);
        assert!(m.has_index(&posts(), "idx_new").await.unwrap());
        assert!(!m.has_index(&posts(), "idx_new").await.unwrap());

        let log = conn.sql_log();
        assert_eq!(
            log[0],
            "SELECT COUNT(*) FROM INDEXES \
             WHERE SCHEMA_NAME = 'APP' AND TABLE_NAME = 'posts' AND INDEX_NAME = 'idx_new'"
        );
    }
}

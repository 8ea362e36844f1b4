//! Recording connection.
//!
//! [`RecordingConnection`] executes nothing. It keeps every statement it is
//! handed, answers queries from a queue of prepared result sets, and can be
//! told to fail statements matching a pattern. The CLI uses it for dry runs,
//! printing each statement as it arrives.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;

use crate::column_type::RawColumnType;
use crate::connection::{Connection, Row};
use crate::dialect::{Dialect, HanaDialect};
use crate::error::{MigrateError, Result};
use crate::value::SqlExpr;

#[derive(Debug, Default)]
struct State {
    statements: Vec<SqlExpr>,
    results: VecDeque<Vec<Row>>,
    descriptors: Vec<RawColumnType>,
    failures: Vec<(String, String)>,
}

/// A [`Connection`] that records statements instead of running them.
///
/// Clones share the same log, so sessions opened from a recorder write to
/// the log of the recorder they came from.
#[derive(Debug, Clone, Default)]
pub struct RecordingConnection {
    state: Arc<Mutex<State>>,
    echo: bool,
}

impl RecordingConnection {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Prints every statement to stdout as it is recorded.
    #[must_use]
    pub const fn echo(mut self, enabled: bool) -> Self {
        self.echo = enabled;
        self
    }

    /// Queues a result set for the next query.
    #[must_use]
    pub fn with_rows(self, rows: Vec<Row>) -> Self {
        self.lock().results.push_back(rows);
        self
    }

    /// Sets the descriptors returned by `describe`.
    #[must_use]
    pub fn with_descriptors(self, descriptors: Vec<RawColumnType>) -> Self {
        self.lock().descriptors = descriptors;
        self
    }

    /// Fails every statement whose SQL contains `pattern`.
    #[must_use]
    pub fn fail_on(self, pattern: impl Into<String>, message: impl Into<String>) -> Self {
        self.lock().failures.push((pattern.into(), message.into()));
        self
    }

    /// Statements recorded so far.
    #[must_use]
    pub fn statements(&self) -> Vec<SqlExpr> {
        self.lock().statements.clone()
    }

    /// Recorded statements with bound values inlined.
    #[must_use]
    pub fn sql_log(&self) -> Vec<String> {
        let dialect = HanaDialect::default();
        self.lock()
            .statements
            .iter()
            .map(|stmt| dialect.explain(stmt))
            .collect()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn record(&self, stmt: &SqlExpr) -> Result<()> {
        let mut state = self.lock();
        state.statements.push(stmt.clone());
        if self.echo {
            println!("{};", HanaDialect::default().explain(stmt));
        }
        match state
            .failures
            .iter()
            .find(|(pattern, _)| stmt.sql.contains(pattern.as_str()))
        {
            Some((_, message)) => Err(MigrateError::database(message.clone())),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl Connection for RecordingConnection {
    async fn execute(&self, stmt: &SqlExpr) -> Result<u64> {
        self.record(stmt)?;
        Ok(0)
    }

    async fn query(&self, stmt: &SqlExpr) -> Result<Vec<Row>> {
        self.record(stmt)?;
        Ok(self.lock().results.pop_front().unwrap_or_default())
    }

    async fn describe(&self, stmt: &SqlExpr) -> Result<Vec<RawColumnType>> {
        self.record(stmt)?;
        Ok(self.lock().descriptors.clone())
    }
}

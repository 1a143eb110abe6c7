#![allow(dead_code)]

use std::sync::Mutex;

use tablesync::prelude::*;

pub fn cluster() -> ClusterIdentity {
    ClusterIdentity::new("analytics", "dev")
}

/// Two-column `events` table on the default cluster.
pub fn events_table() -> TableSchema {
    TableSchema::new("events", cluster())
        .column(Column::new("a", "int"))
        .column(Column::new("b", "int"))
}

pub fn statements(name: &str, old: &TableSchema, new: &TableSchema) -> Vec<String> {
    SchemaDiffer::new()
        .diff(name, old, new)
        .statements(&RedshiftDialect::new())
}

pub fn replace_reason(old: &TableSchema, new: &TableSchema) -> ReplaceReason {
    match SchemaDiffer::new().diff("events", old, new) {
        DiffResult::Replace(reason) => reason,
        other => panic!("Expected Replace, got {other:?}"),
    }
}

/// Executor that records every statement it is asked to run.
#[derive(Default)]
pub struct RecordingExecutor {
    pub executed: Mutex<Vec<String>>,
}

impl RecordingExecutor {
    pub fn executed(&self) -> Vec<String> {
        let mut executed = self.executed.lock().unwrap().clone();
        executed.sort();
        executed
    }
}

impl StatementExecutor for RecordingExecutor {
    fn execute<'a>(
        &'a self,
        statement: &'a str,
        _cluster: &'a ClusterIdentity,
    ) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            self.executed.lock().unwrap().push(statement.to_string());
            Ok(())
        })
    }
}

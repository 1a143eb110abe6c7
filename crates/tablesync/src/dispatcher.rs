//! Lifecycle dispatcher.
//!
//! Routes a [`LifecycleEvent`] to the differ and the statement dialect,
//! executes the resulting statements and returns the table's durable
//! identifier. Planning is pure and can be inspected on its own through
//! [`Dispatcher::plan`].

use tracing::{debug, info};

use crate::dialect::{RedshiftDialect, StatementDialect};
use crate::differ::{DiffResult, ReplaceReason, SchemaDiffer};
use crate::error::{Result, SyncError};
use crate::event::{EventKind, LifecycleEvent, LifecycleResponse};
use crate::executor::{StatementExecutor, execute_all};
use crate::operations::TableOperation;

/// Statements to run for one event and the identifier they lead to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Plan {
    /// Create a new table.
    Create {
        /// Physical name of the new table.
        name: String,
        /// `CREATE TABLE` statement.
        statement: String,
    },
    /// Create a replacement table under a new name.
    ///
    /// The previous table is left in place for the caller's cleanup.
    Replace {
        /// Physical name of the new table.
        name: String,
        /// Physical name of the table being replaced.
        previous: String,
        /// Why the table cannot be altered in place.
        reason: ReplaceReason,
        /// `CREATE TABLE` statement.
        statement: String,
    },
    /// Alter the existing table in place.
    Alter {
        /// Physical name of the table.
        name: String,
        /// Independent ALTER statements, possibly none.
        statements: Vec<String>,
    },
    /// Drop the table.
    Drop {
        /// Physical name of the table.
        name: String,
        /// `DROP TABLE` statement.
        statement: String,
    },
}

impl Plan {
    /// Returns the identifier reported back to the event source.
    #[must_use]
    pub fn physical_resource_id(&self) -> Option<&str> {
        match self {
            Self::Create { name, .. } | Self::Replace { name, .. } | Self::Alter { name, .. } => {
                Some(name)
            }
            Self::Drop { .. } => None,
        }
    }

    /// Returns every statement of the plan.
    #[must_use]
    pub fn statements(&self) -> Vec<&str> {
        match self {
            Self::Create { statement, .. }
            | Self::Replace { statement, .. }
            | Self::Drop { statement, .. } => vec![statement.as_str()],
            Self::Alter { statements, .. } => statements.iter().map(String::as_str).collect(),
        }
    }

    /// Builds the response payload for this plan.
    #[must_use]
    pub fn response(&self) -> LifecycleResponse {
        match self.physical_resource_id() {
            Some(id) => LifecycleResponse::with_id(id),
            None => LifecycleResponse::empty(),
        }
    }
}

/// Handles lifecycle events for declared tables.
#[derive(Debug)]
pub struct Dispatcher<E: StatementExecutor, D: StatementDialect = RedshiftDialect> {
    executor: E,
    dialect: D,
    differ: SchemaDiffer,
}

impl<E: StatementExecutor> Dispatcher<E> {
    /// Creates a dispatcher using the Redshift dialect.
    pub fn new(executor: E) -> Self {
        Self::with_dialect(executor, RedshiftDialect::new())
    }
}

impl<E: StatementExecutor, D: StatementDialect> Dispatcher<E, D> {
    /// Creates a dispatcher with a custom dialect.
    pub fn with_dialect(executor: E, dialect: D) -> Self {
        Self {
            executor,
            dialect,
            differ: SchemaDiffer::new(),
        }
    }

    /// Returns the executor.
    #[must_use]
    pub fn executor(&self) -> &E {
        &self.executor
    }

    /// Computes the statements for an event without executing anything.
    pub fn plan(&self, event: &LifecycleEvent) -> Result<Plan> {
        match event.kind {
            EventKind::Create => {
                event.desired.validate()?;
                let (name, statement) = self.create_statement(event);
                Ok(Plan::Create { name, statement })
            }
            EventKind::Delete => {
                let name = existing_name(event)?;
                let statement = self
                    .dialect
                    .generate_sql(&TableOperation::drop_table(name));
                Ok(Plan::Drop {
                    name: name.to_string(),
                    statement,
                })
            }
            EventKind::Update => {
                event.desired.validate()?;
                let name = existing_name(event)?;
                let prior = event
                    .prior
                    .as_ref()
                    .ok_or(SyncError::MissingField("OldResourceProperties"))?;

                match self.differ.diff(name, prior, &event.desired) {
                    DiffResult::Replace(reason) => {
                        let (new_name, statement) = self.create_statement(event);
                        Ok(Plan::Replace {
                            name: new_name,
                            previous: name.to_string(),
                            reason,
                            statement,
                        })
                    }
                    batch @ DiffResult::AlterBatch(_) => Ok(Plan::Alter {
                        name: name.to_string(),
                        statements: batch.statements(&self.dialect),
                    }),
                }
            }
        }
    }

    /// Physical name and `CREATE TABLE` statement for the desired schema.
    fn create_statement(&self, event: &LifecycleEvent) -> (String, String) {
        let name = event.desired.table_name.physical_name(&event.request_id);
        let statement = self.dialect.generate_sql(&TableOperation::create_table(
            name.clone(),
            event.desired.clone(),
        ));
        (name, statement)
    }

    /// Plans and executes an event, returning the response payload.
    pub async fn handle(&self, event: &LifecycleEvent) -> Result<LifecycleResponse> {
        let plan = self.plan(event)?;
        let cluster = &event.desired.cluster;

        info!(
            kind = %event.kind,
            request_id = %event.request_id,
            cluster = %cluster,
            "Handling lifecycle event"
        );

        match &plan {
            Plan::Create { name, statement } => {
                info!(table = %name, "Creating table");
                self.executor.execute(statement, cluster).await?;
            }
            Plan::Replace {
                name,
                previous,
                reason,
                statement,
            } => {
                info!(
                    table = %name,
                    previous = %previous,
                    %reason,
                    "Replacing table"
                );
                self.executor.execute(statement, cluster).await?;
            }
            Plan::Alter { name, statements } => {
                if statements.is_empty() {
                    debug!(table = %name, "Table already up to date");
                } else {
                    info!(table = %name, count = statements.len(), "Altering table");
                    execute_all(&self.executor, statements, cluster).await?;
                }
            }
            Plan::Drop { name, statement } => {
                info!(table = %name, "Dropping table");
                self.executor.execute(statement, cluster).await?;
            }
        }

        Ok(plan.response())
    }
}

fn existing_name(event: &LifecycleEvent) -> Result<&str> {
    event
        .physical_resource_id
        .as_deref()
        .ok_or(SyncError::MissingField("PhysicalResourceId"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::BoxFuture;
    use crate::schema::{ClusterIdentity, Column, DistStyle, TableSchema};
    use std::sync::Mutex;

    /// Executor recording statements, failing those containing `fail_on`.
    #[derive(Default)]
    struct RecordingExecutor {
        executed: Mutex<Vec<String>>,
        fail_on: Option<&'static str>,
    }

    impl StatementExecutor for RecordingExecutor {
        fn execute<'a>(
            &'a self,
            statement: &'a str,
            _cluster: &'a ClusterIdentity,
        ) -> BoxFuture<'a, Result<()>> {
            Box::pin(async move {
                if let Some(marker) = self.fail_on {
                    if statement.contains(marker) {
                        return Err(SyncError::execution(statement, "rejected"));
                    }
                }
                self.executed.lock().unwrap().push(statement.to_string());
                Ok(())
            })
        }
    }

    fn dispatcher() -> Dispatcher<RecordingExecutor> {
        Dispatcher::new(RecordingExecutor::default())
    }

    fn table() -> TableSchema {
        TableSchema::new("events", ClusterIdentity::new("c1", "dev"))
            .generate_suffix()
            .column(Column::new("id", "int"))
    }

    #[tokio::test]
    async fn test_create_uses_request_id_suffix() {
        let d = dispatcher();
        let event = LifecycleEvent::create("abcdef1234567890", table());

        let response = d.handle(&event).await.unwrap();

        assert_eq!(response.physical_resource_id.as_deref(), Some("eventsabcdef12"));
        assert_eq!(
            *d.executor().executed.lock().unwrap(),
            vec!["CREATE TABLE eventsabcdef12 (id int)"]
        );
    }

    #[tokio::test]
    async fn test_delete_drops_existing_table() {
        let d = dispatcher();
        let event = LifecycleEvent::delete("req-2", "eventsabcdef12", table());

        let response = d.handle(&event).await.unwrap();

        assert_eq!(response, LifecycleResponse::empty());
        assert_eq!(
            *d.executor().executed.lock().unwrap(),
            vec!["DROP TABLE eventsabcdef12"]
        );
    }

    #[tokio::test]
    async fn test_update_alters_in_place() {
        let d = dispatcher();
        let desired = table().column(Column::new("email", "varchar"));
        let event = LifecycleEvent::update("req-3", "eventsabcdef12", table(), desired);

        let response = d.handle(&event).await.unwrap();

        assert_eq!(response.physical_resource_id.as_deref(), Some("eventsabcdef12"));
        assert_eq!(
            *d.executor().executed.lock().unwrap(),
            vec!["ALTER TABLE eventsabcdef12 ADD email varchar"]
        );
    }

    #[tokio::test]
    async fn test_update_without_changes_executes_nothing() {
        let d = dispatcher();
        let event = LifecycleEvent::update("req-3", "eventsabcdef12", table(), table());

        let response = d.handle(&event).await.unwrap();

        assert_eq!(response.physical_resource_id.as_deref(), Some("eventsabcdef12"));
        assert!(d.executor().executed.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_replacement_creates_new_table() {
        let d = dispatcher();
        let desired = table().dist_style(DistStyle::Even);
        let event = LifecycleEvent::update("99887766-req", "eventsabcdef12", table(), desired);

        let plan = d.plan(&event).unwrap();
        assert!(matches!(
            plan,
            Plan::Replace {
                reason: ReplaceReason::DistStyleToggled,
                ..
            }
        ));

        let response = d.handle(&event).await.unwrap();
        assert_eq!(response.physical_resource_id.as_deref(), Some("events99887766"));
        assert_eq!(
            *d.executor().executed.lock().unwrap(),
            vec!["CREATE TABLE events99887766 (id int) DISTSTYLE EVEN"]
        );
    }

    #[tokio::test]
    async fn test_alter_failure_propagates() {
        let d = Dispatcher::new(RecordingExecutor {
            fail_on: Some("DROP COLUMN"),
            ..RecordingExecutor::default()
        });
        let prior = table().column(Column::new("legacy", "int"));
        let desired = table().column(Column::new("email", "varchar"));
        let event = LifecycleEvent::update("req-4", "eventsabcdef12", prior, desired);

        let result = d.handle(&event).await;
        assert!(matches!(
            result,
            Err(SyncError::StatementExecutionFailure { .. })
        ));
    }

    #[test]
    fn test_update_requires_physical_id() {
        let mut event = LifecycleEvent::update("req", "t", table(), table());
        event.physical_resource_id = None;

        assert!(matches!(
            dispatcher().plan(&event),
            Err(SyncError::MissingField("PhysicalResourceId"))
        ));
    }

    #[test]
    fn test_update_requires_prior_schema() {
        let mut event = LifecycleEvent::update("req", "t", table(), table());
        event.prior = None;

        assert!(matches!(
            dispatcher().plan(&event),
            Err(SyncError::MissingField("OldResourceProperties"))
        ));
    }

    #[test]
    fn test_create_rejects_malformed_schema() {
        let desired = table()
            .column(Column::new("a", "int").dist_key())
            .column(Column::new("b", "int").dist_key());
        let event = LifecycleEvent::create("req", desired);

        assert!(matches!(
            dispatcher().plan(&event),
            Err(SyncError::MalformedSchema(_))
        ));
    }

    #[test]
    fn test_update_rejects_several_dist_keys_before_rendering() {
        let prior = table().dist_style(DistStyle::Key);
        let desired = table()
            .dist_style(DistStyle::Key)
            .column(Column::new("a", "int").dist_key())
            .column(Column::new("b", "int").dist_key());
        let event = LifecycleEvent::update("req", "eventsold", prior, desired);

        match dispatcher().plan(&event) {
            Err(SyncError::MalformedSchema(message)) => assert!(message.contains("a, b")),
            other => panic!("Expected MalformedSchema, got {other:?}"),
        }
    }

    #[test]
    fn test_replacement_plan_names_new_table_from_request_id() {
        let prior = table();
        let desired = TableSchema::new("events", ClusterIdentity::new("c2", "dev"))
            .generate_suffix()
            .column(Column::new("id", "int"));
        let event = LifecycleEvent::update("0123456789", "eventsfedcba98", prior, desired);

        let plan = dispatcher().plan(&event).unwrap();
        assert_eq!(
            plan,
            Plan::Replace {
                name: "events01234567".to_string(),
                previous: "eventsfedcba98".to_string(),
                reason: ReplaceReason::ClusterChanged,
                statement: "CREATE TABLE events01234567 (id int)".to_string(),
            }
        );
    }

    #[test]
    fn test_plan_statements_and_response() {
        let plan = Plan::Alter {
            name: "t".to_string(),
            statements: vec!["ALTER TABLE t ADD a int".to_string()],
        };
        assert_eq!(plan.statements(), vec!["ALTER TABLE t ADD a int"]);
        assert_eq!(plan.response(), LifecycleResponse::with_id("t"));

        let plan = Plan::Drop {
            name: "t".to_string(),
            statement: "DROP TABLE t".to_string(),
        };
        assert_eq!(plan.physical_resource_id(), None);
    }
}

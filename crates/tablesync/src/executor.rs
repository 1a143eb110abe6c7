//! Statement executors.
//!
//! The remote SQL engine is reached through [`StatementExecutor`]. Two
//! implementations live here: [`DryRunExecutor`], which only prints what
//! would run, and [`PollingExecutor`], which submits each statement through a
//! [`StatementClient`] and polls until the engine reports a final status.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use futures::future::try_join_all;
use tracing::{debug, info, warn};

use crate::error::{Result, SyncError};
use crate::schema::ClusterIdentity;

/// A boxed future for async executor operations.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Default delay between two status checks of a submitted statement.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Runs SQL statements against a remote cluster.
///
/// Implementations must treat each call independently: the dispatcher may
/// run several calls concurrently for one ALTER batch.
pub trait StatementExecutor: Send + Sync {
    /// Executes one statement and resolves once it has completed.
    fn execute<'a>(
        &'a self,
        statement: &'a str,
        cluster: &'a ClusterIdentity,
    ) -> BoxFuture<'a, Result<()>>;
}

/// Executes all statements concurrently.
///
/// Resolves once every statement has completed, or with the first failure.
/// Statements that already completed are not rolled back.
pub async fn execute_all<E: StatementExecutor + ?Sized>(
    executor: &E,
    statements: &[String],
    cluster: &ClusterIdentity,
) -> Result<()> {
    try_join_all(
        statements
            .iter()
            .map(|statement| executor.execute(statement, cluster)),
    )
    .await?;
    Ok(())
}

/// Executor that prints statements instead of running them.
#[derive(Debug, Clone, Copy, Default)]
pub struct DryRunExecutor;

impl DryRunExecutor {
    /// Creates a new dry-run executor.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl StatementExecutor for DryRunExecutor {
    fn execute<'a>(
        &'a self,
        statement: &'a str,
        cluster: &'a ClusterIdentity,
    ) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            debug!(sql = %statement, cluster = %cluster, "Dry run, not executing");
            println!("{};", statement);
            Ok(())
        })
    }
}

/// Status of a statement submitted to the remote data API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatementStatus {
    /// Accepted, not yet scheduled.
    Submitted,
    /// Scheduled on the cluster.
    Picked,
    /// Running.
    Started,
    /// Completed successfully.
    Finished,
    /// Failed with the given message.
    Failed(String),
    /// Cancelled before completion.
    Aborted,
}

impl StatementStatus {
    /// Returns true if the statement will not change status anymore.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Finished | Self::Failed(_) | Self::Aborted)
    }
}

/// Asynchronous statement submission API of the remote engine.
pub trait StatementClient: Send + Sync {
    /// Submits a statement and returns its id.
    fn submit<'a>(
        &'a self,
        statement: &'a str,
        cluster: &'a ClusterIdentity,
    ) -> BoxFuture<'a, Result<String>>;

    /// Returns the current status of a submitted statement.
    fn describe<'a>(&'a self, statement_id: &'a str) -> BoxFuture<'a, Result<StatementStatus>>;
}

/// Configuration for [`PollingExecutor`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecutorConfig {
    /// Delay between status checks.
    pub poll_interval: Duration,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

impl ExecutorConfig {
    /// Sets the poll interval.
    #[must_use]
    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }
}

/// Executor that submits statements and waits for them to finish.
#[derive(Debug)]
pub struct PollingExecutor<C: StatementClient> {
    client: C,
    config: ExecutorConfig,
}

impl<C: StatementClient> PollingExecutor<C> {
    /// Creates a new polling executor with default configuration.
    pub fn new(client: C) -> Self {
        Self::with_config(client, ExecutorConfig::default())
    }

    /// Creates a new polling executor with custom configuration.
    pub fn with_config(client: C, config: ExecutorConfig) -> Self {
        Self { client, config }
    }

    /// Returns the underlying client.
    #[must_use]
    pub fn client(&self) -> &C {
        &self.client
    }

    async fn wait_for_completion(&self, statement: &str, statement_id: &str) -> Result<()> {
        loop {
            tokio::time::sleep(self.config.poll_interval).await;

            let status = self.client.describe(statement_id).await?;
            if !status.is_terminal() {
                debug!(id = %statement_id, ?status, "Statement still running");
                continue;
            }

            return match status {
                StatementStatus::Finished => {
                    debug!(id = %statement_id, "Statement finished");
                    Ok(())
                }
                StatementStatus::Failed(message) => {
                    warn!(id = %statement_id, error = %message, "Statement failed");
                    Err(SyncError::execution(statement, message))
                }
                _ => {
                    warn!(id = %statement_id, ?status, "Statement aborted");
                    Err(SyncError::execution(statement, "statement was aborted"))
                }
            };
        }
    }
}

impl<C: StatementClient> StatementExecutor for PollingExecutor<C> {
    fn execute<'a>(
        &'a self,
        statement: &'a str,
        cluster: &'a ClusterIdentity,
    ) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            info!(sql = %statement, cluster = %cluster, "Submitting statement");
            let statement_id = self.client.submit(statement, cluster).await?;
            self.wait_for_completion(statement, &statement_id).await
        })
    }
}

//! Declarative table reconciliation for Redshift-style clusters.
//!
//! `tablesync` keeps a remote table in line with a declared schema, driven by
//! the create/update/delete lifecycle of infrastructure-as-code custom
//! resources:
//! - **Create** renders and runs `CREATE TABLE` under a physical name derived
//!   from the declared prefix and, optionally, the request id
//! - **Delete** renders and runs `DROP TABLE`
//! - **Update** diffs the previous declaration against the new one and either
//!   alters the table in place or creates a replacement under a new name
//!
//! # Architecture
//!
//! - **Schema** - Declared columns, distribution and sort configuration
//! - **Operations** - Typed table changes (`CreateTable`, `AddColumn`, ...)
//! - **Dialect** - Renders operations to SQL text
//! - **Differ** - Decides between replacement and an ALTER batch
//! - **Dispatcher** - Routes lifecycle events and executes the plan
//! - **Executor** - Runs statements against the remote engine
//!
//! # Example
//!
//! ```rust
//! use tablesync::prelude::*;
//!
//! let cluster = ClusterIdentity::new("analytics", "dev");
//! let old = TableSchema::new("events", cluster.clone()).column(Column::new("id", "int"));
//! let new = old.clone().column(Column::new("email", "varchar"));
//!
//! let result = SchemaDiffer::new().diff("events", &old, &new);
//! assert_eq!(
//!     result.statements(&RedshiftDialect::new()),
//!     vec!["ALTER TABLE events ADD email varchar"]
//! );
//! ```
//!
//! # CLI Usage
//!
//! ```bash
//! # Print the statements a lifecycle event would run
//! tablesync plan --event event.json
//!
//! # Compare two property documents
//! tablesync diff --old old.json --new new.json --table events --request-id 4f1c2b3a
//! ```

pub mod dialect;
pub mod differ;
pub mod dispatcher;
pub mod error;
pub mod event;
pub mod executor;
pub mod operations;
pub mod schema;

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::dialect::{RedshiftDialect, StatementDialect};
    pub use crate::differ::{DiffResult, ReplaceReason, SchemaDiffer};
    pub use crate::dispatcher::{Dispatcher, Plan};
    pub use crate::error::{Result, SyncError};
    pub use crate::event::{EventKind, LifecycleEvent, LifecycleResponse, TableProperties};
    pub use crate::executor::{
        BoxFuture, DryRunExecutor, ExecutorConfig, PollingExecutor, StatementClient,
        StatementExecutor, StatementStatus,
    };
    pub use crate::operations::TableOperation;
    pub use crate::schema::{ClusterIdentity, Column, DistStyle, SortStyle, TableName, TableSchema};
}

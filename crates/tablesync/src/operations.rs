//! Table operations.
//!
//! Every statement this crate sends to the remote engine is first expressed
//! as a [`TableOperation`]; a [`StatementDialect`](crate::dialect::StatementDialect)
//! renders it to SQL text.

use serde::{Deserialize, Serialize};

use crate::schema::{Column, DistStyle, SortStyle, TableSchema};

/// A single schema change against one physical table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TableOperation {
    /// Create a table from a declared schema.
    CreateTable {
        /// Physical table name.
        name: String,
        /// Declared schema.
        schema: TableSchema,
    },

    /// Drop a table.
    DropTable {
        /// Physical table name.
        name: String,
    },

    /// Add a column.
    AddColumn {
        /// Physical table name.
        table: String,
        /// Column definition.
        column: Column,
    },

    /// Drop a column.
    DropColumn {
        /// Physical table name.
        table: String,
        /// Column name.
        column_name: String,
    },

    /// Change the distribution style.
    AlterDistStyle {
        /// Physical table name.
        table: String,
        /// New distribution style.
        style: DistStyle,
    },

    /// Change the distribution key column.
    AlterDistKey {
        /// Physical table name.
        table: String,
        /// New distribution key column.
        column_name: String,
    },

    /// Change the sort key.
    AlterSortKey {
        /// Physical table name.
        table: String,
        /// New sort style.
        style: SortStyle,
        /// Sort key columns in order (empty for AUTO).
        columns: Vec<String>,
    },
}

impl TableOperation {
    /// Creates a create-table operation.
    pub fn create_table(name: impl Into<String>, schema: TableSchema) -> Self {
        Self::CreateTable {
            name: name.into(),
            schema,
        }
    }

    /// Creates a drop-table operation.
    pub fn drop_table(name: impl Into<String>) -> Self {
        Self::DropTable { name: name.into() }
    }

    /// Creates an add-column operation.
    pub fn add_column(table: impl Into<String>, column: Column) -> Self {
        Self::AddColumn {
            table: table.into(),
            column,
        }
    }

    /// Creates a drop-column operation.
    pub fn drop_column(table: impl Into<String>, column_name: impl Into<String>) -> Self {
        Self::DropColumn {
            table: table.into(),
            column_name: column_name.into(),
        }
    }

    /// Creates an alter-distribution-style operation.
    pub fn alter_dist_style(table: impl Into<String>, style: DistStyle) -> Self {
        Self::AlterDistStyle {
            table: table.into(),
            style,
        }
    }

    /// Creates an alter-distribution-key operation.
    pub fn alter_dist_key(table: impl Into<String>, column_name: impl Into<String>) -> Self {
        Self::AlterDistKey {
            table: table.into(),
            column_name: column_name.into(),
        }
    }

    /// Creates an alter-sort-key operation.
    pub fn alter_sort_key(table: impl Into<String>, style: SortStyle, columns: Vec<String>) -> Self {
        Self::AlterSortKey {
            table: table.into(),
            style,
            columns,
        }
    }

    /// Returns the physical table this operation targets.
    #[must_use]
    pub fn table(&self) -> &str {
        match self {
            Self::CreateTable { name, .. } | Self::DropTable { name } => name,
            Self::AddColumn { table, .. }
            | Self::DropColumn { table, .. }
            | Self::AlterDistStyle { table, .. }
            | Self::AlterDistKey { table, .. }
            | Self::AlterSortKey { table, .. } => table,
        }
    }

    /// Returns a human-readable description of this operation.
    #[must_use]
    pub fn describe(&self) -> String {
        match self {
            Self::CreateTable { name, .. } => format!("Create table {}", name),
            Self::DropTable { name } => format!("Drop table {}", name),
            Self::AddColumn { table, column } => {
                format!("Add column {} to {}", column.name, table)
            }
            Self::DropColumn { table, column_name } => {
                format!("Drop column {} from {}", column_name, table)
            }
            Self::AlterDistStyle { table, style } => {
                format!("Set distribution style of {} to {}", table, style)
            }
            Self::AlterDistKey { table, column_name } => {
                format!("Set distribution key of {} to {}", table, column_name)
            }
            Self::AlterSortKey {
                table,
                style,
                columns,
            } => {
                if columns.is_empty() {
                    format!("Set {} sort key on {}", style, table)
                } else {
                    format!("Set {} sort key ({}) on {}", style, columns.join(", "), table)
                }
            }
        }
    }
}

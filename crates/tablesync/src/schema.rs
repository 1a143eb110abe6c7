//! Schema representation types.
//!
//! These types describe the declared shape of a single remote table: its
//! columns, distribution and sort configuration, and the cluster it lives in.
//! A schema is built fresh for every lifecycle event and never mutated
//! afterwards; the differ only ever compares two of them.

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SyncError};

/// Number of request id characters used as a generated table name suffix.
pub const SUFFIX_LENGTH: usize = 8;

/// Strategy controlling how rows are spread across cluster nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DistStyle {
    /// Rows are distributed round-robin.
    Even,
    /// Rows are distributed by the value of the distribution key column.
    Key,
    /// A full copy of the table lives on every node.
    All,
}

impl DistStyle {
    /// Returns the SQL keyword for this style.
    #[must_use]
    pub fn as_sql(&self) -> &'static str {
        match self {
            Self::Even => "EVEN",
            Self::Key => "KEY",
            Self::All => "ALL",
        }
    }
}

impl fmt::Display for DistStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

/// On-disk row ordering strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SortStyle {
    /// Ordered composite sort key.
    Compound,
    /// Equal-weighted multi-column sort key.
    Interleaved,
    /// Engine-managed sort key.
    #[default]
    Auto,
}

impl SortStyle {
    /// Returns the SQL keyword for this style.
    #[must_use]
    pub fn as_sql(&self) -> &'static str {
        match self {
            Self::Compound => "COMPOUND",
            Self::Interleaved => "INTERLEAVED",
            Self::Auto => "AUTO",
        }
    }
}

impl fmt::Display for SortStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

/// The cluster and database a table lives in.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClusterIdentity {
    /// Cluster name.
    pub cluster_name: String,
    /// Database name.
    pub database_name: String,
}

impl ClusterIdentity {
    /// Creates a new cluster identity.
    #[must_use]
    pub fn new(cluster_name: impl Into<String>, database_name: impl Into<String>) -> Self {
        Self {
            cluster_name: cluster_name.into(),
            database_name: database_name.into(),
        }
    }
}

impl fmt::Display for ClusterIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.cluster_name, self.database_name)
    }
}

/// Declared table name: a prefix plus an optional request-derived suffix.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TableName {
    /// Name prefix.
    pub prefix: String,
    /// Whether a suffix is derived from the request id.
    pub generate_suffix: bool,
}

impl TableName {
    /// Creates a table name without a generated suffix.
    #[must_use]
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            generate_suffix: false,
        }
    }

    /// Computes the physical table name for the given request.
    #[must_use]
    pub fn physical_name(&self, request_id: &str) -> String {
        if self.generate_suffix {
            let suffix: String = request_id.chars().take(SUFFIX_LENGTH).collect();
            format!("{}{}", self.prefix, suffix)
        } else {
            self.prefix.clone()
        }
    }
}

/// Schema definition for a column.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Column {
    /// Column name.
    pub name: String,
    /// Declared data type, opaque to this crate.
    pub data_type: String,
    /// Whether this column is the distribution key.
    pub dist_key: bool,
    /// Position within the sort key, if the column is part of it.
    pub sort_key_position: Option<u32>,
}

impl Column {
    /// Creates a new column.
    #[must_use]
    pub fn new(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into(),
            dist_key: false,
            sort_key_position: None,
        }
    }

    /// Marks the column as the distribution key.
    #[must_use]
    pub fn dist_key(mut self) -> Self {
        self.dist_key = true;
        self
    }

    /// Places the column in the sort key at the given position.
    #[must_use]
    pub fn sort_key(mut self, position: u32) -> Self {
        self.sort_key_position = Some(position);
        self
    }
}

/// Complete declared schema for a table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSchema {
    /// Declared table name.
    pub table_name: TableName,
    /// Column definitions, in declaration order.
    pub columns: Vec<Column>,
    /// Distribution style, if declared.
    pub dist_style: Option<DistStyle>,
    /// Sort key style.
    pub sort_style: SortStyle,
    /// Cluster and database hosting the table.
    pub cluster: ClusterIdentity,
}

impl TableSchema {
    /// Creates a new table schema with no columns.
    #[must_use]
    pub fn new(prefix: impl Into<String>, cluster: ClusterIdentity) -> Self {
        Self {
            table_name: TableName::new(prefix),
            columns: Vec::new(),
            dist_style: None,
            sort_style: SortStyle::default(),
            cluster,
        }
    }

    /// Enables request-derived name suffixes.
    #[must_use]
    pub fn generate_suffix(mut self) -> Self {
        self.table_name.generate_suffix = true;
        self
    }

    /// Adds a column to the table.
    #[must_use]
    pub fn column(mut self, column: Column) -> Self {
        self.columns.push(column);
        self
    }

    /// Sets the distribution style.
    #[must_use]
    pub fn dist_style(mut self, style: DistStyle) -> Self {
        self.dist_style = Some(style);
        self
    }

    /// Sets the sort style.
    #[must_use]
    pub fn sort_style(mut self, style: SortStyle) -> Self {
        self.sort_style = style;
        self
    }

    /// Returns the distribution key column, if any.
    #[must_use]
    pub fn dist_key_column(&self) -> Option<&Column> {
        self.columns.iter().find(|c| c.dist_key)
    }

    /// Returns the sort key columns ordered by position.
    ///
    /// Columns sharing a position keep their declaration order.
    #[must_use]
    pub fn sort_key_columns(&self) -> Vec<&Column> {
        let mut columns: Vec<&Column> = self
            .columns
            .iter()
            .filter(|c| c.sort_key_position.is_some())
            .collect();
        columns.sort_by_key(|c| c.sort_key_position);
        columns
    }

    /// Returns the sort key column names ordered by position.
    #[must_use]
    pub fn sort_key_names(&self) -> Vec<&str> {
        self.sort_key_columns()
            .into_iter()
            .map(|c| c.name.as_str())
            .collect()
    }

    /// Checks the table invariants the statement builder relies on.
    pub fn validate(&self) -> Result<()> {
        if self.table_name.prefix.is_empty() {
            return Err(SyncError::MalformedSchema(
                "table name prefix is empty".to_string(),
            ));
        }

        if self.columns.is_empty() {
            return Err(SyncError::MalformedSchema(format!(
                "table '{}' declares no columns",
                self.table_name.prefix
            )));
        }

        let mut names = HashSet::new();
        for column in &self.columns {
            if !names.insert(column.name.as_str()) {
                return Err(SyncError::MalformedSchema(format!(
                    "duplicate column '{}'",
                    column.name
                )));
            }
        }

        let dist_keys: Vec<&str> = self
            .columns
            .iter()
            .filter(|c| c.dist_key)
            .map(|c| c.name.as_str())
            .collect();
        if dist_keys.len() > 1 {
            return Err(SyncError::MalformedSchema(format!(
                "multiple distribution key columns: {}",
                dist_keys.join(", ")
            )));
        }

        let mut positions = HashSet::new();
        for column in &self.columns {
            if let Some(position) = column.sort_key_position {
                if !positions.insert(position) {
                    return Err(SyncError::MalformedSchema(format!(
                        "sort key position {} is used more than once",
                        position
                    )));
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cluster() -> ClusterIdentity {
        ClusterIdentity::new("analytics", "dev")
    }

    #[test]
    fn test_column_builder() {
        let col = Column::new("id", "int").dist_key().sort_key(0);

        assert_eq!(col.name, "id");
        assert_eq!(col.data_type, "int");
        assert!(col.dist_key);
        assert_eq!(col.sort_key_position, Some(0));
    }

    #[test]
    fn test_physical_name_without_suffix() {
        let name = TableName::new("events");
        assert_eq!(name.physical_name("0123456789abcdef"), "events");
    }

    #[test]
    fn test_physical_name_truncates_request_id() {
        let name = TableName {
            prefix: "events".to_string(),
            generate_suffix: true,
        };
        assert_eq!(name.physical_name("0123456789abcdef"), "events01234567");
        assert_eq!(name.physical_name("abc"), "eventsabc");
    }

    #[test]
    fn test_sort_key_columns_ordered_by_position() {
        let table = TableSchema::new("events", cluster())
            .column(Column::new("a", "int").sort_key(2))
            .column(Column::new("b", "int"))
            .column(Column::new("c", "int").sort_key(0))
            .column(Column::new("d", "int").sort_key(1));

        assert_eq!(table.sort_key_names(), vec!["c", "d", "a"]);
    }

    #[test]
    fn test_dist_key_column() {
        let table = TableSchema::new("events", cluster())
            .column(Column::new("id", "int"))
            .column(Column::new("user_id", "int").dist_key());

        assert_eq!(table.dist_key_column().map(|c| c.name.as_str()), Some("user_id"));
    }

    #[test]
    fn test_validate_accepts_well_formed_table() {
        let table = TableSchema::new("events", cluster())
            .column(Column::new("id", "int").dist_key().sort_key(0))
            .column(Column::new("ts", "timestamp").sort_key(1));

        assert!(table.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_empty_table() {
        let table = TableSchema::new("events", cluster());
        assert!(matches!(table.validate(), Err(SyncError::MalformedSchema(_))));
    }

    #[test]
    fn test_validate_rejects_duplicate_columns() {
        let table = TableSchema::new("events", cluster())
            .column(Column::new("id", "int"))
            .column(Column::new("id", "bigint"));

        assert!(matches!(table.validate(), Err(SyncError::MalformedSchema(_))));
    }

    #[test]
    fn test_validate_rejects_two_dist_keys() {
        let table = TableSchema::new("events", cluster())
            .column(Column::new("a", "int").dist_key())
            .column(Column::new("b", "int").dist_key());

        let err = table.validate().unwrap_err();
        assert!(err.to_string().contains("a, b"));
    }

    #[test]
    fn test_validate_rejects_shared_sort_position() {
        let table = TableSchema::new("events", cluster())
            .column(Column::new("a", "int").sort_key(1))
            .column(Column::new("b", "int").sort_key(1));

        assert!(matches!(table.validate(), Err(SyncError::MalformedSchema(_))));
    }

    #[test]
    fn test_style_keywords() {
        assert_eq!(DistStyle::Even.to_string(), "EVEN");
        assert_eq!(DistStyle::All.as_sql(), "ALL");
        assert_eq!(SortStyle::Interleaved.to_string(), "INTERLEAVED");
        assert_eq!(SortStyle::default(), SortStyle::Auto);
    }
}

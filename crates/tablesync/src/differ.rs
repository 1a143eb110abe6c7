//! Schema differ.
//!
//! Compares the previously applied schema of a table with the newly declared
//! one and decides whether the table can be migrated with ALTER statements or
//! has to be replaced.
//!
//! The replacement checks run in a fixed order and the first one that fires
//! wins. Reordering them changes which [`ReplaceReason`] is reported.

use std::collections::HashSet;
use std::fmt;

use tracing::debug;

use crate::dialect::StatementDialect;
use crate::operations::TableOperation;
use crate::schema::{SortStyle, TableSchema};

/// Why a table must be dropped and recreated instead of altered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReplaceReason {
    /// The cluster or database changed.
    ClusterChanged,
    /// The declared name prefix changed.
    NamePrefixChanged,
    /// A distribution style was added or removed.
    DistStyleToggled,
    /// A distribution key column was added or removed.
    DistKeyToggled,
    /// An interleaved sort key was requested with a different composition.
    InterleavedSortKeyChanged,
}

impl fmt::Display for ReplaceReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            Self::ClusterChanged => "cluster or database changed",
            Self::NamePrefixChanged => "table name prefix changed",
            Self::DistStyleToggled => "distribution style added or removed",
            Self::DistKeyToggled => "distribution key added or removed",
            Self::InterleavedSortKeyChanged => "interleaved sort key changed",
        };
        f.write_str(reason)
    }
}

/// Outcome of comparing two schemas.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiffResult {
    /// The table must be recreated under a new physical name.
    Replace(ReplaceReason),
    /// The table can be migrated in place with these operations.
    ///
    /// Each operation targets an independent aspect of the table, so they may
    /// be executed in any order, including concurrently.
    AlterBatch(Vec<TableOperation>),
}

impl DiffResult {
    /// Returns true if the table must be replaced.
    #[must_use]
    pub fn is_replace(&self) -> bool {
        matches!(self, Self::Replace(_))
    }

    /// Returns the ALTER operations, or an empty slice for a replacement.
    #[must_use]
    pub fn operations(&self) -> &[TableOperation] {
        match self {
            Self::Replace(_) => &[],
            Self::AlterBatch(operations) => operations,
        }
    }

    /// Renders the ALTER operations with the given dialect.
    #[must_use]
    pub fn statements<D: StatementDialect + ?Sized>(&self, dialect: &D) -> Vec<String> {
        dialect.generate_all(self.operations())
    }
}

/// Compares table schemas.
#[derive(Debug, Default, Clone, Copy)]
pub struct SchemaDiffer;

impl SchemaDiffer {
    /// Creates a new differ.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Compares `old` with `new` for the physical table `name`.
    #[must_use]
    pub fn diff(&self, name: &str, old: &TableSchema, new: &TableSchema) -> DiffResult {
        if let Some(reason) = self.replace_reason(old, new) {
            debug!(table = %name, %reason, "Table requires replacement");
            return DiffResult::Replace(reason);
        }

        let mut operations = Vec::new();
        operations.extend(self.diff_columns(name, old, new));
        operations.extend(self.diff_distribution(name, old, new));
        operations.extend(self.diff_sort_key(name, old, new));

        for operation in &operations {
            debug!(
                table = %operation.table(),
                op = %operation.describe(),
                "Planned alteration"
            );
        }
        debug!(
            table = %name,
            operations = operations.len(),
            "Table can be altered in place"
        );
        DiffResult::AlterBatch(operations)
    }

    /// Runs the replacement checks in order and returns the first that fires.
    fn replace_reason(&self, old: &TableSchema, new: &TableSchema) -> Option<ReplaceReason> {
        if old.cluster.cluster_name != new.cluster.cluster_name
            || old.cluster.database_name != new.cluster.database_name
        {
            return Some(ReplaceReason::ClusterChanged);
        }

        if old.table_name.prefix != new.table_name.prefix {
            return Some(ReplaceReason::NamePrefixChanged);
        }

        if old.dist_style.is_some() != new.dist_style.is_some() {
            return Some(ReplaceReason::DistStyleToggled);
        }

        if old.dist_key_column().is_some() != new.dist_key_column().is_some() {
            return Some(ReplaceReason::DistKeyToggled);
        }

        // The engine cannot add an interleaved sort key in place.
        if new.sort_style == SortStyle::Interleaved && sort_key_changed(old, new) {
            return Some(ReplaceReason::InterleavedSortKeyChanged);
        }

        None
    }

    /// Column drops by name, then column additions by (name, type).
    ///
    /// A column whose type changed is reported as an addition of the new
    /// definition without dropping the old one.
    fn diff_columns(&self, name: &str, old: &TableSchema, new: &TableSchema) -> Vec<TableOperation> {
        let mut operations = Vec::new();

        let new_names: HashSet<&str> = new.columns.iter().map(|c| c.name.as_str()).collect();
        for column in &old.columns {
            if !new_names.contains(column.name.as_str()) {
                operations.push(TableOperation::drop_column(name, column.name.clone()));
            }
        }

        let old_definitions: HashSet<(&str, &str)> = old
            .columns
            .iter()
            .map(|c| (c.name.as_str(), c.data_type.as_str()))
            .collect();
        for column in &new.columns {
            if !old_definitions.contains(&(column.name.as_str(), column.data_type.as_str())) {
                operations.push(TableOperation::add_column(name, column.clone()));
            }
        }

        operations
    }

    /// Distribution style and key value changes.
    ///
    /// Presence toggles have already been turned into replacements, so here
    /// both sides are either set or unset.
    fn diff_distribution(
        &self,
        name: &str,
        old: &TableSchema,
        new: &TableSchema,
    ) -> Vec<TableOperation> {
        let mut operations = Vec::new();

        if let (Some(old_style), Some(new_style)) = (old.dist_style, new.dist_style) {
            if old_style != new_style {
                operations.push(TableOperation::alter_dist_style(name, new_style));
            }
        }

        if let (Some(old_key), Some(new_key)) = (old.dist_key_column(), new.dist_key_column()) {
            if old_key.name != new_key.name {
                operations.push(TableOperation::alter_dist_key(name, new_key.name.clone()));
            }
        }

        operations
    }

    /// Sort key changes. A changed interleaved sort key never reaches here.
    fn diff_sort_key(&self, name: &str, old: &TableSchema, new: &TableSchema) -> Vec<TableOperation> {
        if !sort_key_changed(old, new) {
            return Vec::new();
        }

        match new.sort_style {
            SortStyle::Compound => {
                let columns = new
                    .sort_key_names()
                    .into_iter()
                    .map(str::to_string)
                    .collect();
                vec![TableOperation::alter_sort_key(
                    name,
                    SortStyle::Compound,
                    columns,
                )]
            }
            SortStyle::Auto => vec![TableOperation::alter_sort_key(
                name,
                SortStyle::Auto,
                Vec::new(),
            )],
            SortStyle::Interleaved => Vec::new(),
        }
    }
}

/// Returns true if the sort style or the ordered sort key column names differ.
fn sort_key_changed(old: &TableSchema, new: &TableSchema) -> bool {
    old.sort_style != new.sort_style || old.sort_key_names() != new.sort_key_names()
}

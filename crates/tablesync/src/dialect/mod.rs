//! Statement dialects.
//!
//! A dialect knows how to render [`TableOperation`]s as SQL text accepted by
//! a specific engine.

mod redshift;

pub use redshift::RedshiftDialect;

use crate::operations::TableOperation;
use crate::schema::{Column, DistStyle, SortStyle, TableSchema};

/// Trait for engine-specific statement rendering.
///
/// Rendering is pure string construction and never fails; callers are
/// expected to validate schemas before handing them over.
pub trait StatementDialect: Send + Sync {
    /// Returns the dialect name.
    fn name(&self) -> &'static str;

    /// Renders `CREATE TABLE` for a schema under the given physical name.
    fn create_table_sql(&self, name: &str, schema: &TableSchema) -> String;

    /// Renders `DROP TABLE`.
    fn drop_table_sql(&self, name: &str) -> String;

    /// Renders a column addition.
    fn add_column_sql(&self, table: &str, column: &Column) -> String;

    /// Renders a column removal.
    fn drop_column_sql(&self, table: &str, column_name: &str) -> String;

    /// Renders a distribution style change.
    fn alter_dist_style_sql(&self, table: &str, style: DistStyle) -> String;

    /// Renders a distribution key change.
    fn alter_dist_key_sql(&self, table: &str, column_name: &str) -> String;

    /// Renders a sort key change.
    fn alter_sort_key_sql(&self, table: &str, style: SortStyle, columns: &[String]) -> String;

    /// Generates SQL for a table operation.
    fn generate_sql(&self, operation: &TableOperation) -> String {
        match operation {
            TableOperation::CreateTable { name, schema } => self.create_table_sql(name, schema),
            TableOperation::DropTable { name } => self.drop_table_sql(name),
            TableOperation::AddColumn { table, column } => self.add_column_sql(table, column),
            TableOperation::DropColumn { table, column_name } => {
                self.drop_column_sql(table, column_name)
            }
            TableOperation::AlterDistStyle { table, style } => {
                self.alter_dist_style_sql(table, *style)
            }
            TableOperation::AlterDistKey { table, column_name } => {
                self.alter_dist_key_sql(table, column_name)
            }
            TableOperation::AlterSortKey {
                table,
                style,
                columns,
            } => self.alter_sort_key_sql(table, *style, columns),
        }
    }

    /// Generates SQL for a list of operations, preserving order.
    fn generate_all(&self, operations: &[TableOperation]) -> Vec<String> {
        operations.iter().map(|op| self.generate_sql(op)).collect()
    }
}

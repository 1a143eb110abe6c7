//! Redshift statement dialect.
//!
//! Identifiers and data types are emitted verbatim. Column and sort key lists
//! are comma-joined without spaces, matching what the provider has always
//! sent to the Data API.

use crate::schema::{Column, DistStyle, SortStyle, TableSchema};

use super::StatementDialect;

/// Redshift statement dialect.
#[derive(Debug, Clone, Copy, Default)]
pub struct RedshiftDialect;

impl RedshiftDialect {
    /// Creates a new Redshift dialect.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    fn column_list(columns: &[&Column]) -> String {
        columns
            .iter()
            .map(|c| format!("{} {}", c.name, c.data_type))
            .collect::<Vec<_>>()
            .join(",")
    }
}

impl StatementDialect for RedshiftDialect {
    fn name(&self) -> &'static str {
        "redshift"
    }

    fn create_table_sql(&self, name: &str, schema: &TableSchema) -> String {
        let columns: Vec<&Column> = schema.columns.iter().collect();
        let mut sql = format!("CREATE TABLE {} ({})", name, Self::column_list(&columns));

        if let Some(style) = schema.dist_style {
            sql.push_str(" DISTSTYLE ");
            sql.push_str(style.as_sql());
        }

        // DISTKEY is only emitted for a single marked column.
        if let [column] = schema
            .columns
            .iter()
            .filter(|c| c.dist_key)
            .collect::<Vec<_>>()
            .as_slice()
        {
            sql.push_str(&format!(" DISTKEY({})", column.name));
        }

        let sort_keys = schema.sort_key_names();
        if !sort_keys.is_empty() {
            sql.push_str(&format!(
                " {} SORTKEY({})",
                schema.sort_style.as_sql(),
                sort_keys.join(",")
            ));
        }

        sql
    }

    fn drop_table_sql(&self, name: &str) -> String {
        format!("DROP TABLE {}", name)
    }

    fn add_column_sql(&self, table: &str, column: &Column) -> String {
        format!("ALTER TABLE {} ADD {} {}", table, column.name, column.data_type)
    }

    fn drop_column_sql(&self, table: &str, column_name: &str) -> String {
        format!("ALTER TABLE {} DROP COLUMN {}", table, column_name)
    }

    fn alter_dist_style_sql(&self, table: &str, style: DistStyle) -> String {
        format!("ALTER TABLE {} ALTER DISTSTYLE {}", table, style.as_sql())
    }

    fn alter_dist_key_sql(&self, table: &str, column_name: &str) -> String {
        format!("ALTER TABLE {} ALTER DISTKEY {}", table, column_name)
    }

    fn alter_sort_key_sql(&self, table: &str, style: SortStyle, columns: &[String]) -> String {
        match style {
            SortStyle::Auto => format!("ALTER TABLE {} ALTER SORTKEY AUTO", table),
            SortStyle::Compound | SortStyle::Interleaved => format!(
                "ALTER TABLE {} ALTER {} SORTKEY({})",
                table,
                style.as_sql(),
                columns.join(",")
            ),
        }
    }
}

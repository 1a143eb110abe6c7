//! Lifecycle events.
//!
//! [`LifecycleEvent`] is the typed event the dispatcher works on. The
//! [`RawLifecycleEvent`] and [`TableProperties`] types mirror the JSON shape
//! custom resource providers deliver, where every property may arrive as a
//! string.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{Result, SyncError};
use crate::schema::{ClusterIdentity, Column, DistStyle, SortStyle, TableName, TableSchema};

/// Kind of lifecycle transition requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// Create the table.
    Create,
    /// Reconcile the table with a new declaration.
    Update,
    /// Drop the table.
    Delete,
}

impl FromStr for EventKind {
    type Err = SyncError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "Create" => Ok(Self::Create),
            "Update" => Ok(Self::Update),
            "Delete" => Ok(Self::Delete),
            other => Err(SyncError::UnrecognizedEventKind(other.to_string())),
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self {
            Self::Create => "Create",
            Self::Update => "Update",
            Self::Delete => "Delete",
        };
        f.write_str(kind)
    }
}

/// A parsed lifecycle event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LifecycleEvent {
    /// Requested transition.
    pub kind: EventKind,
    /// Unique id of this request.
    pub request_id: String,
    /// Name of the existing table (Update and Delete).
    pub physical_resource_id: Option<String>,
    /// Declared schema.
    pub desired: TableSchema,
    /// Last applied schema (Update).
    pub prior: Option<TableSchema>,
}

impl LifecycleEvent {
    /// Creates a Create event.
    pub fn create(request_id: impl Into<String>, desired: TableSchema) -> Self {
        Self {
            kind: EventKind::Create,
            request_id: request_id.into(),
            physical_resource_id: None,
            desired,
            prior: None,
        }
    }

    /// Creates an Update event.
    pub fn update(
        request_id: impl Into<String>,
        physical_resource_id: impl Into<String>,
        prior: TableSchema,
        desired: TableSchema,
    ) -> Self {
        Self {
            kind: EventKind::Update,
            request_id: request_id.into(),
            physical_resource_id: Some(physical_resource_id.into()),
            desired,
            prior: Some(prior),
        }
    }

    /// Creates a Delete event.
    pub fn delete(
        request_id: impl Into<String>,
        physical_resource_id: impl Into<String>,
        desired: TableSchema,
    ) -> Self {
        Self {
            kind: EventKind::Delete,
            request_id: request_id.into(),
            physical_resource_id: Some(physical_resource_id.into()),
            desired,
            prior: None,
        }
    }

    /// Parses an event from its JSON wire form.
    pub fn from_json(json: &str) -> Result<Self> {
        let raw: RawLifecycleEvent = serde_json::from_str(json)?;
        raw.try_into()
    }

    /// Reads and parses an event file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }
}

/// Lifecycle event as delivered on the wire.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RawLifecycleEvent {
    /// `Create`, `Update` or `Delete`.
    pub request_type: String,
    /// Unique id of this request.
    pub request_id: String,
    /// Name of the existing table.
    #[serde(default)]
    pub physical_resource_id: Option<String>,
    /// Declared table properties.
    pub resource_properties: TableProperties,
    /// Previously declared table properties.
    #[serde(default)]
    pub old_resource_properties: Option<TableProperties>,
}

impl TryFrom<RawLifecycleEvent> for LifecycleEvent {
    type Error = SyncError;

    fn try_from(raw: RawLifecycleEvent) -> Result<Self> {
        let kind: EventKind = raw.request_type.parse()?;
        Ok(Self {
            kind,
            request_id: raw.request_id,
            physical_resource_id: raw.physical_resource_id,
            desired: raw.resource_properties.into_schema(),
            prior: raw.old_resource_properties.map(TableProperties::into_schema),
        })
    }
}

/// Declared table properties.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableProperties {
    /// Table name declaration.
    pub table_name: TableNameProperties,
    /// Column declarations.
    pub table_columns: Vec<ColumnProperties>,
    /// Distribution style.
    #[serde(default)]
    pub dist_style: Option<DistStyle>,
    /// Sort style; AUTO when absent.
    #[serde(default)]
    pub sort_style: Option<SortStyle>,
    /// Cluster name.
    pub cluster_name: String,
    /// Database name.
    pub database_name: String,
}

impl TableProperties {
    /// Parses table properties from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Converts the declaration into a table schema.
    ///
    /// Boolean sort keys are ordered by declaration.
    #[must_use]
    pub fn into_schema(self) -> TableSchema {
        let columns = self
            .table_columns
            .into_iter()
            .enumerate()
            .map(|(index, column)| column.into_column(index))
            .collect();

        TableSchema {
            table_name: TableName {
                prefix: self.table_name.prefix,
                generate_suffix: self.table_name.generate_suffix,
            },
            columns,
            dist_style: self.dist_style,
            sort_style: self.sort_style.unwrap_or_default(),
            cluster: ClusterIdentity::new(self.cluster_name, self.database_name),
        }
    }
}

/// Declared table name.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableNameProperties {
    /// Name prefix.
    pub prefix: String,
    /// Whether to append part of the request id.
    #[serde(default, deserialize_with = "flexible_bool")]
    pub generate_suffix: bool,
}

/// Declared column.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnProperties {
    /// Column name.
    pub name: String,
    /// Data type.
    pub data_type: String,
    /// Whether this is the distribution key.
    #[serde(default, deserialize_with = "flexible_bool")]
    pub dist_key: bool,
    /// Sort key membership: a flag or an explicit position.
    #[serde(default)]
    pub sort_key: Option<SortKeyProperty>,
}

impl ColumnProperties {
    fn into_column(self, index: usize) -> Column {
        let sort_key_position = self.sort_key.and_then(|key| key.position(index));
        Column {
            name: self.name,
            data_type: self.data_type,
            dist_key: self.dist_key,
            sort_key_position,
        }
    }
}

/// Sort key membership as declared.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum SortKeyProperty {
    /// Member in declaration order.
    Flag(bool),
    /// Member at an explicit position.
    Position(u32),
    /// Either of the above, stringified.
    Text(String),
}

impl SortKeyProperty {
    /// Resolves the sort key position for the column declared at `index`.
    #[must_use]
    pub fn position(&self, index: usize) -> Option<u32> {
        let declared = u32::try_from(index).ok();
        match self {
            Self::Flag(true) => declared,
            Self::Flag(false) => None,
            Self::Position(position) => Some(*position),
            Self::Text(text) => match text.as_str() {
                "true" => declared,
                "false" => None,
                other => other.parse().ok(),
            },
        }
    }
}

/// Accepts `true`, `false`, `"true"` and `"false"`.
fn flexible_bool<'de, D>(deserializer: D) -> std::result::Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Text(String),
    }

    Ok(match Flag::deserialize(deserializer)? {
        Flag::Bool(value) => value,
        Flag::Text(text) => text == "true",
    })
}

/// Payload returned to the event source.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct LifecycleResponse {
    /// Durable identifier of the table; absent for Delete.
    #[serde(rename = "PhysicalResourceId", skip_serializing_if = "Option::is_none")]
    pub physical_resource_id: Option<String>,
}

impl LifecycleResponse {
    /// Response carrying a physical resource id.
    pub fn with_id(physical_resource_id: impl Into<String>) -> Self {
        Self {
            physical_resource_id: Some(physical_resource_id.into()),
        }
    }

    /// Response without payload.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }
}

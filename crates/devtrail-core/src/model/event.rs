//! Event rows: one movement / check-in tying a user, a device, and a location.

use serde::{Deserialize, Serialize};

use super::field;
use crate::grid::GridRow;

/// A row of the `events` resource.
///
/// Every field is optional: the backend decides which ones it sends, and a
/// missing field renders as an empty cell.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    #[serde(default, deserialize_with = "field::text", skip_serializing_if = "Option::is_none")]
    pub event_id: Option<String>,
    #[serde(default, deserialize_with = "field::text", skip_serializing_if = "Option::is_none")]
    pub dev_id: Option<String>,
    #[serde(default, deserialize_with = "field::text", skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(default, deserialize_with = "field::text", skip_serializing_if = "Option::is_none")]
    pub user_email: Option<String>,
    #[serde(default, deserialize_with = "field::text", skip_serializing_if = "Option::is_none")]
    pub user_name: Option<String>,
    /// UTC timestamp as stored by the backend.
    #[serde(default, deserialize_with = "field::text", skip_serializing_if = "Option::is_none")]
    pub move_time: Option<String>,
    #[serde(default, deserialize_with = "field::text", skip_serializing_if = "Option::is_none")]
    pub loc_name: Option<String>,
    #[serde(default, deserialize_with = "field::text", skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    #[serde(default, deserialize_with = "field::text", skip_serializing_if = "Option::is_none")]
    pub dev_name: Option<String>,
    #[serde(default, deserialize_with = "field::text", skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    /// Set on sub-events recorded under a parent move event.
    #[serde(default, deserialize_with = "field::text", skip_serializing_if = "Option::is_none")]
    pub parent_event_id: Option<String>,
}

impl GridRow for EventRecord {
    fn row_id(&self) -> Option<&str> {
        self.event_id.as_deref()
    }

    fn parent_id(&self) -> Option<&str> {
        self.parent_event_id.as_deref()
    }
}

/// A row of the `devices/{id}/events` resource.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceEventRecord {
    #[serde(default, deserialize_with = "field::text", skip_serializing_if = "Option::is_none")]
    pub event_id: Option<String>,
    #[serde(default, deserialize_with = "field::text", skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(default, deserialize_with = "field::text", skip_serializing_if = "Option::is_none")]
    pub move_time: Option<String>,
    #[serde(
        default,
        alias = "loc_name",
        deserialize_with = "field::text",
        skip_serializing_if = "Option::is_none"
    )]
    pub loc: Option<String>,
    #[serde(default, deserialize_with = "field::text", skip_serializing_if = "Option::is_none")]
    pub parent_event_id: Option<String>,
}

impl GridRow for DeviceEventRecord {
    fn row_id(&self) -> Option<&str> {
        self.event_id.as_deref()
    }

    fn parent_id(&self) -> Option<&str> {
        self.parent_event_id.as_deref()
    }
}

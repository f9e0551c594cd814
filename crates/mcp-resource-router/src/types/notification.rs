//! Server-to-client notifications emitted on session channels.

use serde::{Deserialize, Serialize};

use super::message::JsonRpcNotification;

/// Method name for the resource list change notification.
pub const RESOURCES_LIST_CHANGED: &str = "notifications/resources/list_changed";

/// Method name for a single resource update notification.
pub const RESOURCES_UPDATED: &str = "notifications/resources/updated";

/// Resource updated notification params (server → client).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceUpdatedParams {
    /// URI of the updated resource.
    pub uri: String,
}

/// `notifications/resources/list_changed` envelope.
pub fn resources_list_changed() -> JsonRpcNotification {
    JsonRpcNotification::new(RESOURCES_LIST_CHANGED, None)
}

/// `notifications/resources/updated` envelope for `uri`.
pub fn resource_updated(uri: &str) -> JsonRpcNotification {
    let params = ResourceUpdatedParams {
        uri: uri.to_string(),
    };
    JsonRpcNotification::new(RESOURCES_UPDATED, serde_json::to_value(params).ok())
}

//! User authorization for tool calls.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::session::SessionId;
use crate::tool_call::ToolCallUpdate;

/// Parameters of `session/request_permission`.
///
/// The agent asks before running a sensitive tool call; the client presents
/// the options and reports the user's choice.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestPermissionRequest {
    pub session_id: SessionId,
    /// The tool call the user is deciding about.
    pub tool_call: ToolCallUpdate,
    pub options: Vec<PermissionOption>,
    #[serde(default, skip_serializing_if = "Option::is_none", rename = "_meta")]
    pub meta: Option<serde_json::Value>,
}

impl RequestPermissionRequest {
    pub fn new(
        session_id: impl Into<SessionId>,
        tool_call: ToolCallUpdate,
        options: Vec<PermissionOption>,
    ) -> Self {
        RequestPermissionRequest {
            session_id: session_id.into(),
            tool_call,
            options,
            meta: None,
        }
    }
}

/// Unique identifier for a permission option.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PermissionOptionId(pub Arc<str>);

impl PermissionOptionId {
    pub fn new(id: impl Into<Arc<str>>) -> Self {
        PermissionOptionId(id.into())
    }
}

impl std::fmt::Display for PermissionOptionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for PermissionOptionId {
    fn from(id: &str) -> Self {
        PermissionOptionId::new(id)
    }
}

/// One choice offered to the user.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PermissionOption {
    #[serde(rename = "optionId")]
    pub id: PermissionOptionId,
    /// Label to display.
    pub name: String,
    pub kind: PermissionOptionKind,
    #[serde(default, skip_serializing_if = "Option::is_none", rename = "_meta")]
    pub meta: Option<serde_json::Value>,
}

impl PermissionOption {
    pub fn new(
        id: impl Into<PermissionOptionId>,
        name: impl Into<String>,
        kind: PermissionOptionKind,
    ) -> Self {
        PermissionOption {
            id: id.into(),
            name: name.into(),
            kind,
            meta: None,
        }
    }
}

/// What selecting an option means, so clients can pick icons and defaults.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PermissionOptionKind {
    AllowOnce,
    AllowAlways,
    RejectOnce,
    RejectAlways,
}

/// Response to `session/request_permission`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestPermissionResponse {
    pub outcome: RequestPermissionOutcome,
    #[serde(default, skip_serializing_if = "Option::is_none", rename = "_meta")]
    pub meta: Option<serde_json::Value>,
}

impl RequestPermissionResponse {
    pub fn new(outcome: RequestPermissionOutcome) -> Self {
        RequestPermissionResponse {
            outcome,
            meta: None,
        }
    }
}

/// How the permission request ended, discriminated by the `outcome` field.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RequestPermissionOutcome {
    /// The turn was cancelled before the user decided. Clients must answer
    /// every pending permission request this way after sending
    /// `session/cancel`.
    Cancelled,
    /// The user picked one of the options.
    Selected(SelectedPermissionOutcome),
}

/// The selected option.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectedPermissionOutcome {
    pub option_id: PermissionOptionId,
    #[serde(default, skip_serializing_if = "Option::is_none", rename = "_meta")]
    pub meta: Option<serde_json::Value>,
}

impl SelectedPermissionOutcome {
    pub fn new(option_id: impl Into<PermissionOptionId>) -> Self {
        SelectedPermissionOutcome {
            option_id: option_id.into(),
            meta: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tool_call::ToolCallUpdateFields;
    use serde_json::json;

    #[test]
    fn cancelled_outcome_is_tag_only() {
        let outcome = RequestPermissionOutcome::Cancelled;
        let value = serde_json::to_value(&outcome).unwrap();
        assert_eq!(value, json!({ "outcome": "cancelled" }));
        let decoded: RequestPermissionOutcome = serde_json::from_value(value).unwrap();
        assert_eq!(decoded, outcome);
    }

    #[test]
    fn selected_outcome_flattens_payload() {
        let outcome =
            RequestPermissionOutcome::Selected(SelectedPermissionOutcome::new("opt-1"));
        let value = serde_json::to_value(&outcome).unwrap();
        assert_eq!(value, json!({ "outcome": "selected", "optionId": "opt-1" }));
        let decoded: RequestPermissionOutcome = serde_json::from_value(value).unwrap();
        assert_eq!(decoded, outcome);
    }

    #[test]
    fn request_round_trips() {
        let request = RequestPermissionRequest::new(
            "sess-1",
            ToolCallUpdate::new("call-1", ToolCallUpdateFields::new().title("Edit main.rs")),
            vec![
                PermissionOption::new("allow", "Allow", PermissionOptionKind::AllowOnce),
                PermissionOption::new("deny", "Deny", PermissionOptionKind::RejectOnce),
            ],
        );
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(
            value,
            json!({
                "sessionId": "sess-1",
                "toolCall": { "toolCallId": "call-1", "title": "Edit main.rs" },
                "options": [
                    { "optionId": "allow", "name": "Allow", "kind": "allow_once" },
                    { "optionId": "deny", "name": "Deny", "kind": "reject_once" }
                ]
            })
        );
        let decoded: RequestPermissionRequest = serde_json::from_value(value).unwrap();
        assert_eq!(decoded, request);
    }
}

//! The `session/update` notification and its variants.

use serde::{Deserialize, Serialize};

use crate::content::ContentBlock;
use crate::maybe_undefined::MaybeUndefined;
use crate::plan::Plan;
use crate::session::{SessionConfigOption, SessionId, SessionModeId};
use crate::tool_call::{ToolCall, ToolCallUpdate};

/// One `session/update` notification from the agent.
///
/// Updates stream continuously while a prompt turn is in flight and during
/// `session/load` replay.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionNotification {
    pub session_id: SessionId,
    pub update: SessionUpdate,
    #[serde(default, skip_serializing_if = "Option::is_none", rename = "_meta")]
    pub meta: Option<serde_json::Value>,
}

impl SessionNotification {
    pub fn new(session_id: impl Into<SessionId>, update: SessionUpdate) -> Self {
        SessionNotification {
            session_id: session_id.into(),
            update,
            meta: None,
        }
    }
}

/// The payload of a session update.
///
/// Discriminated by the `sessionUpdate` field; the variant's own fields live
/// at the top level of the same object.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "sessionUpdate", rename_all = "snake_case")]
pub enum SessionUpdate {
    /// A chunk of the user's message, streamed back (e.g. during replay).
    UserMessageChunk(ContentChunk),
    /// A chunk of the agent's response.
    AgentMessageChunk(ContentChunk),
    /// A chunk of the agent's internal reasoning.
    AgentThoughtChunk(ContentChunk),
    /// A new tool call was started.
    ToolCall(ToolCall),
    /// An existing tool call changed.
    ToolCallUpdate(ToolCallUpdate),
    /// The agent's plan was created or replaced.
    Plan(Plan),
    /// The set of runnable commands changed.
    AvailableCommandsUpdate(AvailableCommandsUpdate),
    /// The agent switched modes (on its own or in response to
    /// `session/set_mode`).
    CurrentModeUpdate(CurrentModeUpdate),
    /// **UNSTABLE** Session metadata (title, timestamps) changed.
    SessionInfoUpdate(SessionInfoUpdate),
    /// **UNSTABLE** The session's configuration options changed.
    ConfigOptionsUpdate(ConfigOptionsUpdate),
}

/// A streamed piece of message content.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentChunk {
    pub content: ContentBlock,
    #[serde(default, skip_serializing_if = "Option::is_none", rename = "_meta")]
    pub meta: Option<serde_json::Value>,
}

impl ContentChunk {
    pub fn new(content: impl Into<ContentBlock>) -> Self {
        ContentChunk {
            content: content.into(),
            meta: None,
        }
    }
}

impl From<ContentBlock> for ContentChunk {
    fn from(content: ContentBlock) -> Self {
        ContentChunk::new(content)
    }
}

/// The commands the agent can currently run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailableCommandsUpdate {
    pub available_commands: Vec<AvailableCommand>,
    #[serde(default, skip_serializing_if = "Option::is_none", rename = "_meta")]
    pub meta: Option<serde_json::Value>,
}

impl AvailableCommandsUpdate {
    pub fn new(available_commands: Vec<AvailableCommand>) -> Self {
        AvailableCommandsUpdate {
            available_commands,
            meta: None,
        }
    }
}

/// A command the user can invoke through the agent.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailableCommand {
    /// Command name, e.g. `create_plan`.
    pub name: String,
    pub description: String,
    /// Input specification, when the command takes one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input: Option<AvailableCommandInput>,
    #[serde(default, skip_serializing_if = "Option::is_none", rename = "_meta")]
    pub meta: Option<serde_json::Value>,
}

impl AvailableCommand {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        AvailableCommand {
            name: name.into(),
            description: description.into(),
            input: None,
            meta: None,
        }
    }

    pub fn input(mut self, input: AvailableCommandInput) -> Self {
        self.input = Some(input);
        self
    }
}

/// How a command accepts input.
///
/// Untagged; the single current form is recognized by its `hint` key.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AvailableCommandInput {
    /// Everything typed after the command name is the input.
    Unstructured {
        /// Placeholder shown while the input is empty.
        hint: String,
    },
}

/// The session's active mode changed.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentModeUpdate {
    pub current_mode_id: SessionModeId,
    #[serde(default, skip_serializing_if = "Option::is_none", rename = "_meta")]
    pub meta: Option<serde_json::Value>,
}

impl CurrentModeUpdate {
    pub fn new(current_mode_id: impl Into<SessionModeId>) -> Self {
        CurrentModeUpdate {
            current_mode_id: current_mode_id.into(),
            meta: None,
        }
    }
}

/// **UNSTABLE** A partial update of session metadata.
///
/// Both fields are three-state: omitted means unchanged, `null` clears, and a
/// value replaces.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionInfoUpdate {
    #[serde(default, skip_serializing_if = "MaybeUndefined::is_undefined")]
    pub title: MaybeUndefined<String>,
    /// ISO 8601 timestamp of the last activity.
    #[serde(default, skip_serializing_if = "MaybeUndefined::is_undefined")]
    pub updated_at: MaybeUndefined<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", rename = "_meta")]
    pub meta: Option<serde_json::Value>,
}

impl SessionInfoUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = MaybeUndefined::Value(title.into());
        self
    }

    pub fn updated_at(mut self, updated_at: impl Into<String>) -> Self {
        self.updated_at = MaybeUndefined::Value(updated_at.into());
        self
    }
}

/// **UNSTABLE** The full, current set of configuration options.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigOptionsUpdate {
    pub config_options: Vec<SessionConfigOption>,
    #[serde(default, skip_serializing_if = "Option::is_none", rename = "_meta")]
    pub meta: Option<serde_json::Value>,
}

impl ConfigOptionsUpdate {
    pub fn new(config_options: Vec<SessionConfigOption>) -> Self {
        ConfigOptionsUpdate {
            config_options,
            meta: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tool_call::{ToolCallStatus, ToolCallUpdateFields};
    use serde_json::json;

    #[test]
    fn update_payload_is_flattened() {
        let notification = SessionNotification::new(
            "sess-1",
            SessionUpdate::AgentMessageChunk(ContentChunk::new("hi")),
        );
        assert_eq!(
            serde_json::to_value(&notification).unwrap(),
            json!({
                "sessionId": "sess-1",
                "update": {
                    "sessionUpdate": "agent_message_chunk",
                    "content": { "type": "text", "text": "hi" }
                }
            })
        );
    }

    #[test]
    fn tool_call_update_variant_round_trips() {
        let update = SessionUpdate::ToolCallUpdate(ToolCallUpdate::new(
            "call-1",
            ToolCallUpdateFields::new().status(ToolCallStatus::Completed),
        ));
        let value = serde_json::to_value(&update).unwrap();
        assert_eq!(
            value,
            json!({
                "sessionUpdate": "tool_call_update",
                "toolCallId": "call-1",
                "status": "completed"
            })
        );
        let decoded: SessionUpdate = serde_json::from_value(value).unwrap();
        assert_eq!(decoded, update);
    }

    #[test]
    fn session_info_update_three_states() {
        // set, untouched
        let update = SessionInfoUpdate::new().title("Test");
        assert_eq!(
            serde_json::to_value(&update).unwrap(),
            json!({ "title": "Test" })
        );

        // cleared, untouched
        let decoded: SessionInfoUpdate =
            serde_json::from_value(json!({ "title": null })).unwrap();
        assert!(decoded.title.is_null());
        assert!(decoded.updated_at.is_undefined());
        assert_eq!(
            serde_json::to_value(&decoded).unwrap(),
            json!({ "title": null })
        );

        // both untouched
        let decoded: SessionInfoUpdate = serde_json::from_value(json!({})).unwrap();
        assert!(decoded.title.is_undefined());
        assert!(decoded.updated_at.is_undefined());
    }

    #[test]
    fn command_input_probes_hint() {
        let command: AvailableCommand = serde_json::from_value(json!({
            "name": "research",
            "description": "Research the codebase",
            "input": { "hint": "what to research" }
        }))
        .unwrap();
        let AvailableCommandInput::Unstructured { hint } = command.input.unwrap();
        assert_eq!(hint, "what to research");
    }

    #[test]
    fn all_chunk_variants_tag_correctly() {
        for (update, tag) in [
            (
                SessionUpdate::UserMessageChunk(ContentChunk::new("u")),
                "user_message_chunk",
            ),
            (
                SessionUpdate::AgentMessageChunk(ContentChunk::new("a")),
                "agent_message_chunk",
            ),
            (
                SessionUpdate::AgentThoughtChunk(ContentChunk::new("t")),
                "agent_thought_chunk",
            ),
        ] {
            let value = serde_json::to_value(&update).unwrap();
            assert_eq!(value["sessionUpdate"], tag);
            let decoded: SessionUpdate = serde_json::from_value(value).unwrap();
            assert_eq!(decoded, update);
        }
    }
}

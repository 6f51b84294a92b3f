//! Session lifecycle payloads: creation, loading, prompting, cancellation,
//! modes, models, and configuration options.

use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::content::ContentBlock;
use crate::mcp::McpServer;

/// Unique identifier for a conversation session.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(pub Arc<str>);

impl SessionId {
    pub fn new(id: impl Into<Arc<str>>) -> Self {
        SessionId(id.into())
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for SessionId {
    fn from(id: &str) -> Self {
        SessionId::new(id)
    }
}

impl From<String> for SessionId {
    fn from(id: String) -> Self {
        SessionId::new(id)
    }
}

// Session setup

/// Parameters of `session/new`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSessionRequest {
    /// The working directory for the session. Must be absolute.
    pub cwd: PathBuf,
    /// MCP servers the agent should connect to.
    #[serde(default)]
    pub mcp_servers: Vec<McpServer>,
    #[serde(default, skip_serializing_if = "Option::is_none", rename = "_meta")]
    pub meta: Option<serde_json::Value>,
}

impl NewSessionRequest {
    pub fn new(cwd: impl Into<PathBuf>) -> Self {
        NewSessionRequest {
            cwd: cwd.into(),
            mcp_servers: Vec::new(),
            meta: None,
        }
    }

    pub fn mcp_servers(mut self, mcp_servers: Vec<McpServer>) -> Self {
        self.mcp_servers = mcp_servers;
        self
    }
}

/// Response to `session/new`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSessionResponse {
    pub session_id: SessionId,
    /// Initial mode state, when the agent supports modes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modes: Option<SessionModeState>,
    /// **UNSTABLE** Initial model state, when the agent supports model
    /// selection.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub models: Option<SessionModelState>,
    /// **UNSTABLE** Configuration options the agent exposes for this session.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub config_options: Vec<SessionConfigOption>,
    #[serde(default, skip_serializing_if = "Option::is_none", rename = "_meta")]
    pub meta: Option<serde_json::Value>,
}

impl NewSessionResponse {
    pub fn new(session_id: impl Into<SessionId>) -> Self {
        NewSessionResponse {
            session_id: session_id.into(),
            modes: None,
            models: None,
            config_options: Vec::new(),
            meta: None,
        }
    }

    pub fn modes(mut self, modes: SessionModeState) -> Self {
        self.modes = Some(modes);
        self
    }

    pub fn models(mut self, models: SessionModelState) -> Self {
        self.models = Some(models);
        self
    }

    pub fn config_options(mut self, config_options: Vec<SessionConfigOption>) -> Self {
        self.config_options = config_options;
        self
    }
}

/// Parameters of `session/load`.
///
/// Only sent when the agent advertised the `loadSession` capability. The
/// agent replays the conversation history as `session/update` notifications
/// before responding.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadSessionRequest {
    pub session_id: SessionId,
    pub cwd: PathBuf,
    #[serde(default)]
    pub mcp_servers: Vec<McpServer>,
    #[serde(default, skip_serializing_if = "Option::is_none", rename = "_meta")]
    pub meta: Option<serde_json::Value>,
}

impl LoadSessionRequest {
    pub fn new(session_id: impl Into<SessionId>, cwd: impl Into<PathBuf>) -> Self {
        LoadSessionRequest {
            session_id: session_id.into(),
            cwd: cwd.into(),
            mcp_servers: Vec::new(),
            meta: None,
        }
    }

    pub fn mcp_servers(mut self, mcp_servers: Vec<McpServer>) -> Self {
        self.mcp_servers = mcp_servers;
        self
    }
}

/// Response to `session/load`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadSessionResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modes: Option<SessionModeState>,
    /// **UNSTABLE**
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub models: Option<SessionModelState>,
    /// **UNSTABLE**
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub config_options: Vec<SessionConfigOption>,
    #[serde(default, skip_serializing_if = "Option::is_none", rename = "_meta")]
    pub meta: Option<serde_json::Value>,
}

impl LoadSessionResponse {
    pub fn new() -> Self {
        Self::default()
    }
}

// Prompting

/// Parameters of `session/prompt`: one user turn.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptRequest {
    pub session_id: SessionId,
    /// The content blocks composing the user's message. Text and resource
    /// links are always allowed; other variants require the corresponding
    /// prompt capability.
    pub prompt: Vec<ContentBlock>,
    #[serde(default, skip_serializing_if = "Option::is_none", rename = "_meta")]
    pub meta: Option<serde_json::Value>,
}

impl PromptRequest {
    pub fn new(session_id: impl Into<SessionId>, prompt: Vec<ContentBlock>) -> Self {
        PromptRequest {
            session_id: session_id.into(),
            prompt,
            meta: None,
        }
    }
}

/// Response to `session/prompt`, sent when the turn is over.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptResponse {
    pub stop_reason: StopReason,
    #[serde(default, skip_serializing_if = "Option::is_none", rename = "_meta")]
    pub meta: Option<serde_json::Value>,
}

impl PromptResponse {
    pub fn new(stop_reason: StopReason) -> Self {
        PromptResponse {
            stop_reason,
            meta: None,
        }
    }
}

/// Why a prompt turn ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// The model finished on its own.
    EndTurn,
    /// The token budget for the turn was exhausted.
    MaxTokens,
    /// The per-turn request budget was exhausted.
    MaxTurnRequests,
    /// The model refused to continue.
    Refusal,
    /// The client cancelled the turn via `session/cancel`. Agents must answer
    /// a cancelled prompt with this reason rather than an error.
    Cancelled,
}

/// The `session/cancel` notification.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CancelNotification {
    pub session_id: SessionId,
    #[serde(default, skip_serializing_if = "Option::is_none", rename = "_meta")]
    pub meta: Option<serde_json::Value>,
}

impl CancelNotification {
    pub fn new(session_id: impl Into<SessionId>) -> Self {
        CancelNotification {
            session_id: session_id.into(),
            meta: None,
        }
    }
}

// Modes

/// Unique identifier for a session mode.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionModeId(pub Arc<str>);

impl SessionModeId {
    pub fn new(id: impl Into<Arc<str>>) -> Self {
        SessionModeId(id.into())
    }
}

impl std::fmt::Display for SessionModeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for SessionModeId {
    fn from(id: &str) -> Self {
        SessionModeId::new(id)
    }
}

/// The modes an agent can operate in and the active one.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionModeState {
    pub current_mode_id: SessionModeId,
    pub available_modes: Vec<SessionMode>,
    #[serde(default, skip_serializing_if = "Option::is_none", rename = "_meta")]
    pub meta: Option<serde_json::Value>,
}

/// One agent mode (e.g. "ask", "architect", "code").
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionMode {
    pub id: SessionModeId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", rename = "_meta")]
    pub meta: Option<serde_json::Value>,
}

impl SessionMode {
    pub fn new(id: impl Into<SessionModeId>, name: impl Into<String>) -> Self {
        SessionMode {
            id: id.into(),
            name: name.into(),
            description: None,
            meta: None,
        }
    }
}

/// Parameters of `session/set_mode`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetSessionModeRequest {
    pub session_id: SessionId,
    /// One of the ids advertised in `availableModes`.
    pub mode_id: SessionModeId,
    #[serde(default, skip_serializing_if = "Option::is_none", rename = "_meta")]
    pub meta: Option<serde_json::Value>,
}

impl SetSessionModeRequest {
    pub fn new(session_id: impl Into<SessionId>, mode_id: impl Into<SessionModeId>) -> Self {
        SetSessionModeRequest {
            session_id: session_id.into(),
            mode_id: mode_id.into(),
            meta: None,
        }
    }
}

/// Response to `session/set_mode`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetSessionModeResponse {
    #[serde(default, skip_serializing_if = "Option::is_none", rename = "_meta")]
    pub meta: Option<serde_json::Value>,
}

impl SetSessionModeResponse {
    pub fn new() -> Self {
        Self::default()
    }
}

// Models

/// **UNSTABLE** Unique identifier for a model.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModelId(pub Arc<str>);

impl ModelId {
    pub fn new(id: impl Into<Arc<str>>) -> Self {
        ModelId(id.into())
    }
}

impl std::fmt::Display for ModelId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ModelId {
    fn from(id: &str) -> Self {
        ModelId::new(id)
    }
}

/// **UNSTABLE** The models an agent can use and the active one.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionModelState {
    pub current_model_id: ModelId,
    pub available_models: Vec<ModelInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none", rename = "_meta")]
    pub meta: Option<serde_json::Value>,
}

/// **UNSTABLE** A selectable model.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelInfo {
    pub model_id: ModelId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", rename = "_meta")]
    pub meta: Option<serde_json::Value>,
}

impl ModelInfo {
    pub fn new(model_id: impl Into<ModelId>, name: impl Into<String>) -> Self {
        ModelInfo {
            model_id: model_id.into(),
            name: name.into(),
            description: None,
            meta: None,
        }
    }
}

/// **UNSTABLE** Parameters of `session/set_model`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetSessionModelRequest {
    pub session_id: SessionId,
    pub model_id: ModelId,
    #[serde(default, skip_serializing_if = "Option::is_none", rename = "_meta")]
    pub meta: Option<serde_json::Value>,
}

impl SetSessionModelRequest {
    pub fn new(session_id: impl Into<SessionId>, model_id: impl Into<ModelId>) -> Self {
        SetSessionModelRequest {
            session_id: session_id.into(),
            model_id: model_id.into(),
            meta: None,
        }
    }
}

/// **UNSTABLE** Response to `session/set_model`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetSessionModelResponse {
    #[serde(default, skip_serializing_if = "Option::is_none", rename = "_meta")]
    pub meta: Option<serde_json::Value>,
}

impl SetSessionModelResponse {
    pub fn new() -> Self {
        Self::default()
    }
}

// Configuration options

/// **UNSTABLE** Unique identifier for a session configuration option.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionConfigId(pub Arc<str>);

impl SessionConfigId {
    pub fn new(id: impl Into<Arc<str>>) -> Self {
        SessionConfigId(id.into())
    }
}

impl std::fmt::Display for SessionConfigId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for SessionConfigId {
    fn from(id: &str) -> Self {
        SessionConfigId::new(id)
    }
}

/// **UNSTABLE** Unique identifier for one value of a configuration option.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionConfigValueId(pub Arc<str>);

impl SessionConfigValueId {
    pub fn new(id: impl Into<Arc<str>>) -> Self {
        SessionConfigValueId(id.into())
    }
}

impl std::fmt::Display for SessionConfigValueId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for SessionConfigValueId {
    fn from(id: &str) -> Self {
        SessionConfigValueId::new(id)
    }
}

/// **UNSTABLE** A selector the agent exposes for a session (model choice,
/// reasoning effort, and the like).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionConfigOption {
    pub id: SessionConfigId,
    /// Human-readable name to display.
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub current_value: SessionConfigValueId,
    pub options: SessionConfigSelectOptions,
    #[serde(default, skip_serializing_if = "Option::is_none", rename = "_meta")]
    pub meta: Option<serde_json::Value>,
}

impl SessionConfigOption {
    /// Creates a select-style option from a flat list of choices.
    pub fn select(
        id: impl Into<SessionConfigId>,
        name: impl Into<String>,
        current_value: impl Into<SessionConfigValueId>,
        options: Vec<SessionConfigSelectOption>,
    ) -> Self {
        SessionConfigOption {
            id: id.into(),
            name: name.into(),
            description: None,
            current_value: current_value.into(),
            options: SessionConfigSelectOptions::Ungrouped(options),
            meta: None,
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// **UNSTABLE** The choices of a configuration option, either flat or grouped.
///
/// There is no tag; a grouped list is recognized by the `group` key of its
/// first element.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SessionConfigSelectOptions {
    Ungrouped(Vec<SessionConfigSelectOption>),
    Grouped(Vec<SessionConfigSelectGroup>),
}

/// **UNSTABLE** One selectable value.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionConfigSelectOption {
    pub value: SessionConfigValueId,
    /// Human-readable name to display.
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", rename = "_meta")]
    pub meta: Option<serde_json::Value>,
}

impl SessionConfigSelectOption {
    pub fn new(value: impl Into<SessionConfigValueId>, name: impl Into<String>) -> Self {
        SessionConfigSelectOption {
            value: value.into(),
            name: name.into(),
            description: None,
            meta: None,
        }
    }
}

/// **UNSTABLE** A named group of selectable values.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionConfigSelectGroup {
    /// Group heading to display.
    pub group: String,
    pub options: Vec<SessionConfigSelectOption>,
    #[serde(default, skip_serializing_if = "Option::is_none", rename = "_meta")]
    pub meta: Option<serde_json::Value>,
}

impl SessionConfigSelectGroup {
    pub fn new(group: impl Into<String>, options: Vec<SessionConfigSelectOption>) -> Self {
        SessionConfigSelectGroup {
            group: group.into(),
            options,
            meta: None,
        }
    }
}

/// **UNSTABLE** Parameters of `session/set_config_option`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetSessionConfigOptionRequest {
    pub session_id: SessionId,
    pub config_id: SessionConfigId,
    pub value: SessionConfigValueId,
    #[serde(default, skip_serializing_if = "Option::is_none", rename = "_meta")]
    pub meta: Option<serde_json::Value>,
}

impl SetSessionConfigOptionRequest {
    pub fn new(
        session_id: impl Into<SessionId>,
        config_id: impl Into<SessionConfigId>,
        value: impl Into<SessionConfigValueId>,
    ) -> Self {
        SetSessionConfigOptionRequest {
            session_id: session_id.into(),
            config_id: config_id.into(),
            value: value.into(),
            meta: None,
        }
    }
}

/// **UNSTABLE** Response to `session/set_config_option`.
///
/// Returns the full option list because changing one option may affect
/// others.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetSessionConfigOptionResponse {
    #[serde(default)]
    pub config_options: Vec<SessionConfigOption>,
    #[serde(default, skip_serializing_if = "Option::is_none", rename = "_meta")]
    pub meta: Option<serde_json::Value>,
}

impl SetSessionConfigOptionResponse {
    pub fn new(config_options: Vec<SessionConfigOption>) -> Self {
        SetSessionConfigOptionResponse {
            config_options,
            meta: None,
        }
    }
}

// Listing, forking, resuming

/// **UNSTABLE** A session known to the agent.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionInfo {
    pub session_id: SessionId,
    /// The working directory the session was created with.
    pub cwd: PathBuf,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// ISO 8601 timestamp of the last activity.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", rename = "_meta")]
    pub meta: Option<serde_json::Value>,
}

impl SessionInfo {
    pub fn new(session_id: impl Into<SessionId>, cwd: impl Into<PathBuf>) -> Self {
        SessionInfo {
            session_id: session_id.into(),
            cwd: cwd.into(),
            title: None,
            updated_at: None,
            meta: None,
        }
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn updated_at(mut self, updated_at: impl Into<String>) -> Self {
        self.updated_at = Some(updated_at.into());
        self
    }
}

/// **UNSTABLE** Parameters of `session/list`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListSessionsRequest {
    /// Opaque pagination cursor from a previous response.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cursor: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", rename = "_meta")]
    pub meta: Option<serde_json::Value>,
}

impl ListSessionsRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cursor(mut self, cursor: impl Into<String>) -> Self {
        self.cursor = Some(cursor.into());
        self
    }
}

/// **UNSTABLE** Response to `session/list`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListSessionsResponse {
    pub sessions: Vec<SessionInfo>,
    /// Cursor for the next page, absent on the last page.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_cursor: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", rename = "_meta")]
    pub meta: Option<serde_json::Value>,
}

impl ListSessionsResponse {
    pub fn new(sessions: Vec<SessionInfo>) -> Self {
        ListSessionsResponse {
            sessions,
            next_cursor: None,
            meta: None,
        }
    }

    pub fn next_cursor(mut self, next_cursor: impl Into<String>) -> Self {
        self.next_cursor = Some(next_cursor.into());
        self
    }
}

/// **UNSTABLE** Parameters of `session/fork`: creates a new session sharing
/// the source session's conversation history.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForkSessionRequest {
    /// The session to fork.
    pub session_id: SessionId,
    /// The working directory for the forked session.
    pub cwd: PathBuf,
    #[serde(default)]
    pub mcp_servers: Vec<McpServer>,
    #[serde(default, skip_serializing_if = "Option::is_none", rename = "_meta")]
    pub meta: Option<serde_json::Value>,
}

impl ForkSessionRequest {
    pub fn new(session_id: impl Into<SessionId>, cwd: impl Into<PathBuf>) -> Self {
        ForkSessionRequest {
            session_id: session_id.into(),
            cwd: cwd.into(),
            mcp_servers: Vec::new(),
            meta: None,
        }
    }

    pub fn mcp_servers(mut self, mcp_servers: Vec<McpServer>) -> Self {
        self.mcp_servers = mcp_servers;
        self
    }
}

/// **UNSTABLE** Response to `session/fork`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForkSessionResponse {
    /// The id of the new session.
    pub session_id: SessionId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modes: Option<SessionModeState>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub models: Option<SessionModelState>,
    #[serde(default, skip_serializing_if = "Option::is_none", rename = "_meta")]
    pub meta: Option<serde_json::Value>,
}

impl ForkSessionResponse {
    pub fn new(session_id: impl Into<SessionId>) -> Self {
        ForkSessionResponse {
            session_id: session_id.into(),
            modes: None,
            models: None,
            meta: None,
        }
    }
}

/// **UNSTABLE** Parameters of `session/resume`: like `session/load` but
/// without replaying message history.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResumeSessionRequest {
    pub session_id: SessionId,
    pub cwd: PathBuf,
    #[serde(default)]
    pub mcp_servers: Vec<McpServer>,
    #[serde(default, skip_serializing_if = "Option::is_none", rename = "_meta")]
    pub meta: Option<serde_json::Value>,
}

impl ResumeSessionRequest {
    pub fn new(session_id: impl Into<SessionId>, cwd: impl Into<PathBuf>) -> Self {
        ResumeSessionRequest {
            session_id: session_id.into(),
            cwd: cwd.into(),
            mcp_servers: Vec::new(),
            meta: None,
        }
    }

    pub fn mcp_servers(mut self, mcp_servers: Vec<McpServer>) -> Self {
        self.mcp_servers = mcp_servers;
        self
    }
}

/// **UNSTABLE** Response to `session/resume`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResumeSessionResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modes: Option<SessionModeState>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub models: Option<SessionModelState>,
    #[serde(default, skip_serializing_if = "Option::is_none", rename = "_meta")]
    pub meta: Option<serde_json::Value>,
}

impl ResumeSessionResponse {
    pub fn new() -> Self {
        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn new_session_request_encodes_empty_server_list() {
        let request = NewSessionRequest::new("/work");
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({ "cwd": "/work", "mcpServers": [] })
        );
    }

    #[test]
    fn new_session_request_accepts_missing_server_list() {
        let request: NewSessionRequest = serde_json::from_value(json!({ "cwd": "/work" })).unwrap();
        assert!(request.mcp_servers.is_empty());
    }

    #[test]
    fn stop_reasons_use_snake_case() {
        assert_eq!(
            serde_json::to_value(StopReason::MaxTurnRequests).unwrap(),
            json!("max_turn_requests")
        );
    }

    #[test]
    fn config_option_list_decodes_flat() {
        let options: SessionConfigSelectOptions = serde_json::from_value(json!([
            { "value": "low", "name": "Low" },
            { "value": "high", "name": "High" }
        ]))
        .unwrap();
        assert!(matches!(
            options,
            SessionConfigSelectOptions::Ungrouped(ref list) if list.len() == 2
        ));
    }

    #[test]
    fn config_option_list_decodes_grouped() {
        let options: SessionConfigSelectOptions = serde_json::from_value(json!([
            {
                "group": "Anthropic",
                "options": [{ "value": "opus", "name": "Opus" }]
            }
        ]))
        .unwrap();
        assert!(matches!(
            options,
            SessionConfigSelectOptions::Grouped(ref groups) if groups.len() == 1
        ));
    }

    #[test]
    fn config_option_round_trips() {
        let option = SessionConfigOption::select(
            "mode",
            "Mode",
            "fast",
            vec![
                SessionConfigSelectOption::new("fast", "Fast"),
                SessionConfigSelectOption::new("careful", "Careful"),
            ],
        );
        let value = serde_json::to_value(&option).unwrap();
        assert_eq!(
            value,
            json!({
                "id": "mode",
                "name": "Mode",
                "currentValue": "fast",
                "options": [
                    { "value": "fast", "name": "Fast" },
                    { "value": "careful", "name": "Careful" }
                ]
            })
        );
        let decoded: SessionConfigOption = serde_json::from_value(value).unwrap();
        assert_eq!(decoded, option);
    }

    #[test]
    fn session_info_optionals_are_omitted() {
        let info = SessionInfo::new("sess-1", "/work");
        assert_eq!(
            serde_json::to_value(&info).unwrap(),
            json!({ "sessionId": "sess-1", "cwd": "/work" })
        );
    }
}

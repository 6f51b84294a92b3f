//! The initialization handshake: version negotiation, capability exchange,
//! and authentication.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::version::ProtocolVersion;

/// Parameters of the `initialize` request, the first message on every
/// connection.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializeRequest {
    /// The latest protocol version the client supports.
    pub protocol_version: ProtocolVersion,
    #[serde(default)]
    pub client_capabilities: ClientCapabilities,
    /// Name and version of the connecting client, for display and logs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_info: Option<Implementation>,
    #[serde(default, skip_serializing_if = "Option::is_none", rename = "_meta")]
    pub meta: Option<serde_json::Value>,
}

impl InitializeRequest {
    pub fn new(protocol_version: ProtocolVersion) -> Self {
        InitializeRequest {
            protocol_version,
            client_capabilities: ClientCapabilities::default(),
            client_info: None,
            meta: None,
        }
    }

    pub fn client_capabilities(mut self, client_capabilities: ClientCapabilities) -> Self {
        self.client_capabilities = client_capabilities;
        self
    }

    pub fn client_info(mut self, client_info: Implementation) -> Self {
        self.client_info = Some(client_info);
        self
    }
}

/// The agent's reply to `initialize`.
///
/// Carries the version the conversation will use; a client that does not
/// support it should disconnect.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializeResponse {
    /// The protocol version the agent settled on: the client's version when
    /// supported, otherwise the latest version the agent speaks.
    pub protocol_version: ProtocolVersion,
    #[serde(default)]
    pub agent_capabilities: AgentCapabilities,
    /// How the client may authenticate, when authentication is required.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub auth_methods: Vec<AuthMethod>,
    /// Name and version of the agent, for display and logs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_info: Option<Implementation>,
    #[serde(default, skip_serializing_if = "Option::is_none", rename = "_meta")]
    pub meta: Option<serde_json::Value>,
}

impl InitializeResponse {
    pub fn new(protocol_version: ProtocolVersion) -> Self {
        InitializeResponse {
            protocol_version,
            agent_capabilities: AgentCapabilities::default(),
            auth_methods: Vec::new(),
            agent_info: None,
            meta: None,
        }
    }

    pub fn agent_capabilities(mut self, agent_capabilities: AgentCapabilities) -> Self {
        self.agent_capabilities = agent_capabilities;
        self
    }

    pub fn auth_methods(mut self, auth_methods: Vec<AuthMethod>) -> Self {
        self.auth_methods = auth_methods;
        self
    }

    pub fn agent_info(mut self, agent_info: Implementation) -> Self {
        self.agent_info = Some(agent_info);
        self
    }
}

/// The name and version of a peer implementation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Implementation {
    /// Machine-readable name, also the display fallback.
    pub name: String,
    /// Human-readable display title.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub version: String,
}

impl Implementation {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Implementation {
            name: name.into(),
            title: None,
            version: version.into(),
        }
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }
}

/// Capabilities the client advertises during initialization.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientCapabilities {
    /// Which file-system methods the agent may call.
    #[serde(default)]
    pub fs: FileSystemCapability,
    /// Whether the client supports all `terminal/*` methods.
    #[serde(default)]
    pub terminal: bool,
    #[serde(default, skip_serializing_if = "Option::is_none", rename = "_meta")]
    pub meta: Option<serde_json::Value>,
}

/// File-system access the client grants the agent.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileSystemCapability {
    /// Whether `fs/read_text_file` is available.
    #[serde(default)]
    pub read_text_file: bool,
    /// Whether `fs/write_text_file` is available.
    #[serde(default)]
    pub write_text_file: bool,
    #[serde(default, skip_serializing_if = "Option::is_none", rename = "_meta")]
    pub meta: Option<serde_json::Value>,
}

/// Capabilities the agent advertises during initialization.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentCapabilities {
    /// Whether `session/load` is supported.
    #[serde(default)]
    pub load_session: bool,
    #[serde(default)]
    pub prompt_capabilities: PromptCapabilities,
    #[serde(default)]
    pub mcp_capabilities: McpCapabilities,
    /// Which of the optional session management methods are supported.
    #[serde(default)]
    pub session_capabilities: SessionCapabilities,
    #[serde(default, skip_serializing_if = "Option::is_none", rename = "_meta")]
    pub meta: Option<serde_json::Value>,
}

/// Content types the agent accepts in `session/prompt` beyond the baseline of
/// text and resource links.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptCapabilities {
    #[serde(default)]
    pub image: bool,
    #[serde(default)]
    pub audio: bool,
    /// Whether embedded resources are accepted in prompts.
    #[serde(default)]
    pub embedded_context: bool,
    #[serde(default, skip_serializing_if = "Option::is_none", rename = "_meta")]
    pub meta: Option<serde_json::Value>,
}

/// MCP transports the agent can connect to.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct McpCapabilities {
    #[serde(default)]
    pub http: bool,
    #[serde(default)]
    pub sse: bool,
    #[serde(default, skip_serializing_if = "Option::is_none", rename = "_meta")]
    pub meta: Option<serde_json::Value>,
}

/// **UNSTABLE** session management methods the agent supports.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionCapabilities {
    /// Whether `session/list` is supported.
    #[serde(default)]
    pub list: bool,
    /// Whether `session/fork` is supported.
    #[serde(default)]
    pub fork: bool,
    /// Whether `session/resume` is supported.
    #[serde(default)]
    pub resume: bool,
    #[serde(default, skip_serializing_if = "Option::is_none", rename = "_meta")]
    pub meta: Option<serde_json::Value>,
}

/// Unique identifier for an authentication method.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AuthMethodId(pub Arc<str>);

impl AuthMethodId {
    pub fn new(id: impl Into<Arc<str>>) -> Self {
        AuthMethodId(id.into())
    }
}

impl std::fmt::Display for AuthMethodId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An authentication method the agent offers.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthMethod {
    pub id: AuthMethodId,
    /// Human-readable name to display.
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", rename = "_meta")]
    pub meta: Option<serde_json::Value>,
}

impl AuthMethod {
    pub fn new(id: impl Into<AuthMethodId>, name: impl Into<String>) -> Self {
        AuthMethod {
            id: id.into(),
            name: name.into(),
            description: None,
            meta: None,
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

impl From<&str> for AuthMethodId {
    fn from(id: &str) -> Self {
        AuthMethodId::new(id)
    }
}

/// Parameters of the `authenticate` request.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticateRequest {
    /// One of the methods advertised in the initialize response.
    pub method_id: AuthMethodId,
    #[serde(default, skip_serializing_if = "Option::is_none", rename = "_meta")]
    pub meta: Option<serde_json::Value>,
}

impl AuthenticateRequest {
    pub fn new(method_id: impl Into<AuthMethodId>) -> Self {
        AuthenticateRequest {
            method_id: method_id.into(),
            meta: None,
        }
    }
}

/// Response to `authenticate`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticateResponse {
    #[serde(default, skip_serializing_if = "Option::is_none", rename = "_meta")]
    pub meta: Option<serde_json::Value>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn minimal_initialize_request_decodes_with_defaults() {
        let request: InitializeRequest =
            serde_json::from_value(json!({ "protocolVersion": 1 })).unwrap();
        assert_eq!(request.protocol_version, ProtocolVersion::V1);
        assert_eq!(request.client_capabilities, ClientCapabilities::default());
        assert!(request.client_info.is_none());
    }

    #[test]
    fn initialize_response_encodes_camel_case() {
        let response = InitializeResponse::new(ProtocolVersion::LATEST)
            .agent_info(Implementation::new("test-agent", "1.2.0").title("Test Agent"))
            .auth_methods(vec![AuthMethod::new("api-key", "API key")]);
        assert_eq!(
            serde_json::to_value(&response).unwrap(),
            json!({
                "protocolVersion": 1,
                "agentCapabilities": {
                    "loadSession": false,
                    "promptCapabilities": {
                        "image": false,
                        "audio": false,
                        "embeddedContext": false
                    },
                    "mcpCapabilities": { "http": false, "sse": false },
                    "sessionCapabilities": { "list": false, "fork": false, "resume": false }
                },
                "authMethods": [{ "id": "api-key", "name": "API key" }],
                "agentInfo": { "name": "test-agent", "title": "Test Agent", "version": "1.2.0" }
            })
        );
    }

    #[test]
    fn authenticate_response_is_empty_object() {
        assert_eq!(
            serde_json::to_value(AuthenticateResponse::default()).unwrap(),
            json!({})
        );
    }
}

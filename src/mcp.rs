//! MCP server connection descriptors.
//!
//! Sessions name the MCP (Model Context Protocol) servers the agent should
//! connect to. Three transports exist; `http` and `sse` are tagged via the
//! `type` field while the baseline stdio transport has no tag and is
//! recognized by its `command` key.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// How to reach an MCP server.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum McpServer {
    /// Streamable HTTP transport. Requires the `mcpCapabilities.http` agent
    /// capability.
    #[serde(rename_all = "camelCase")]
    Http {
        /// Human-readable server name.
        name: String,
        url: String,
        /// Headers attached to every request.
        headers: Vec<HttpHeader>,
    },
    /// SSE transport (deprecated upstream but still in the wild). Requires the
    /// `mcpCapabilities.sse` agent capability.
    #[serde(rename_all = "camelCase")]
    Sse {
        /// Human-readable server name.
        name: String,
        url: String,
        /// Headers attached to every request.
        headers: Vec<HttpHeader>,
    },
    /// Stdio transport: a subprocess speaking MCP over its stdin/stdout.
    /// Every agent must support this one.
    #[serde(untagged, rename_all = "camelCase")]
    Stdio {
        /// Human-readable server name.
        name: String,
        /// Path to the server executable.
        command: PathBuf,
        args: Vec<String>,
        /// Environment variables for the subprocess.
        env: Vec<EnvVariable>,
    },
}

/// An environment variable for a stdio MCP server.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvVariable {
    pub name: String,
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none", rename = "_meta")]
    pub meta: Option<serde_json::Value>,
}

impl EnvVariable {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        EnvVariable {
            name: name.into(),
            value: value.into(),
            meta: None,
        }
    }
}

/// An HTTP header for an `http` or `sse` MCP server.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HttpHeader {
    pub name: String,
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none", rename = "_meta")]
    pub meta: Option<serde_json::Value>,
}

impl HttpHeader {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        HttpHeader {
            name: name.into(),
            value: value.into(),
            meta: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn stdio_has_no_type_tag() {
        let server = McpServer::Stdio {
            name: "srv".to_string(),
            command: PathBuf::from("/bin/s"),
            args: vec!["-p".to_string(), "3".to_string()],
            env: vec![EnvVariable::new("K", "v")],
        };
        let value = serde_json::to_value(&server).unwrap();
        assert_eq!(
            value,
            json!({
                "name": "srv",
                "command": "/bin/s",
                "args": ["-p", "3"],
                "env": [{ "name": "K", "value": "v" }]
            })
        );
        let decoded: McpServer = serde_json::from_value(value).unwrap();
        assert_eq!(decoded, server);
    }

    #[test]
    fn http_is_tagged() {
        let server = McpServer::Http {
            name: "api".to_string(),
            url: "https://mcp.example.com".to_string(),
            headers: vec![HttpHeader::new("Authorization", "Bearer t")],
        };
        let value = serde_json::to_value(&server).unwrap();
        assert_eq!(
            value,
            json!({
                "type": "http",
                "name": "api",
                "url": "https://mcp.example.com",
                "headers": [{ "name": "Authorization", "value": "Bearer t" }]
            })
        );
        let decoded: McpServer = serde_json::from_value(value).unwrap();
        assert_eq!(decoded, server);
    }

    #[test]
    fn sse_is_tagged() {
        let server = McpServer::Sse {
            name: "events".to_string(),
            url: "https://sse.example.com".to_string(),
            headers: Vec::new(),
        };
        let value = serde_json::to_value(&server).unwrap();
        assert_eq!(value["type"], "sse");
        let decoded: McpServer = serde_json::from_value(value).unwrap();
        assert_eq!(decoded, server);
    }
}

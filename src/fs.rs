//! File-system access the agent requests from the client.
//!
//! Reading and writing through the client rather than the agent's own process
//! lets the client serve unsaved editor buffers and enforce its own access
//! policy.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::session::SessionId;

/// Parameters of `fs/write_text_file`. Requires the `fs.writeTextFile` client
/// capability.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WriteTextFileRequest {
    pub session_id: SessionId,
    /// Absolute path of the file to write.
    pub path: PathBuf,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none", rename = "_meta")]
    pub meta: Option<serde_json::Value>,
}

impl WriteTextFileRequest {
    pub fn new(
        session_id: impl Into<SessionId>,
        path: impl Into<PathBuf>,
        content: impl Into<String>,
    ) -> Self {
        WriteTextFileRequest {
            session_id: session_id.into(),
            path: path.into(),
            content: content.into(),
            meta: None,
        }
    }
}

/// Response to `fs/write_text_file`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WriteTextFileResponse {
    #[serde(default, skip_serializing_if = "Option::is_none", rename = "_meta")]
    pub meta: Option<serde_json::Value>,
}

/// Parameters of `fs/read_text_file`. Requires the `fs.readTextFile` client
/// capability.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadTextFileRequest {
    pub session_id: SessionId,
    /// Absolute path of the file to read.
    pub path: PathBuf,
    /// 1-based line to start from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<u32>,
    /// Maximum number of lines to return.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none", rename = "_meta")]
    pub meta: Option<serde_json::Value>,
}

impl ReadTextFileRequest {
    pub fn new(session_id: impl Into<SessionId>, path: impl Into<PathBuf>) -> Self {
        ReadTextFileRequest {
            session_id: session_id.into(),
            path: path.into(),
            line: None,
            limit: None,
            meta: None,
        }
    }

    pub fn line(mut self, line: u32) -> Self {
        self.line = Some(line);
        self
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// Response to `fs/read_text_file`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadTextFileResponse {
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none", rename = "_meta")]
    pub meta: Option<serde_json::Value>,
}

impl ReadTextFileResponse {
    pub fn new(content: impl Into<String>) -> Self {
        ReadTextFileResponse {
            content: content.into(),
            meta: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn read_request_omits_absent_range() {
        let request = ReadTextFileRequest::new("sess-1", "/tmp/file.txt");
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({ "sessionId": "sess-1", "path": "/tmp/file.txt" })
        );
    }

    #[test]
    fn read_request_with_range_round_trips() {
        let request = ReadTextFileRequest::new("sess-1", "/tmp/file.txt")
            .line(10)
            .limit(50);
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(
            value,
            json!({ "sessionId": "sess-1", "path": "/tmp/file.txt", "line": 10, "limit": 50 })
        );
        let decoded: ReadTextFileRequest = serde_json::from_value(value).unwrap();
        assert_eq!(decoded, request);
    }

    #[test]
    fn write_response_is_empty_object() {
        assert_eq!(
            serde_json::to_value(WriteTextFileResponse::default()).unwrap(),
            json!({})
        );
    }
}

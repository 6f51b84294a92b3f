//! The agent role: the trait an agent implements and the method table for
//! what agents receive.

use std::rc::Rc;
use std::sync::Arc;

use serde::Serialize;
use serde_json::value::RawValue;

use crate::error::{Error, Result};
use crate::ext::{ExtNotification, ExtRequest, ExtResponse};
use crate::initialize::{
    AuthenticateRequest, AuthenticateResponse, InitializeRequest, InitializeResponse,
};
use crate::rpc::{decode_params, MessageHandler, Side};
use crate::session::{
    CancelNotification, ForkSessionRequest, ForkSessionResponse, ListSessionsRequest,
    ListSessionsResponse, LoadSessionRequest, LoadSessionResponse, NewSessionRequest,
    NewSessionResponse, PromptRequest, PromptResponse, ResumeSessionRequest,
    ResumeSessionResponse, SetSessionConfigOptionRequest, SetSessionConfigOptionResponse,
    SetSessionModeRequest, SetSessionModeResponse, SetSessionModelRequest,
    SetSessionModelResponse,
};

/// The interface an ACP agent implements.
///
/// Agents are programs that drive a language model to read, plan, and modify
/// code on the user's behalf. The connection invokes these methods as
/// requests and notifications arrive from the client; the optional methods
/// default to `method_not_found` so an agent only implements what it
/// advertises.
#[async_trait::async_trait(?Send)]
pub trait Agent {
    /// Negotiates the protocol version and exchanges capabilities.
    ///
    /// Always the first request on a connection. The agent answers with the
    /// version the conversation will use and what it supports.
    async fn initialize(&self, args: InitializeRequest) -> Result<InitializeResponse>;

    /// Authenticates the client with one of the advertised methods.
    ///
    /// After success, `session/new` stops returning `auth_required`.
    async fn authenticate(&self, args: AuthenticateRequest) -> Result<AuthenticateResponse>;

    /// Creates a new conversation session.
    ///
    /// The agent sets up its context, connects to the named MCP servers, and
    /// returns a fresh session id. May fail with `auth_required`.
    async fn new_session(&self, args: NewSessionRequest) -> Result<NewSessionResponse>;

    /// Runs one prompt turn: model calls, tool calls, permission requests,
    /// and streamed updates, finishing with a stop reason.
    async fn prompt(&self, args: PromptRequest) -> Result<PromptResponse>;

    /// Cancels the session's in-flight prompt turn.
    ///
    /// The agent should stop model and tool activity, flush pending
    /// `session/update` notifications, and answer the outstanding
    /// `session/prompt` with the `cancelled` stop reason.
    async fn cancel(&self, args: CancelNotification) -> Result<()>;

    /// Restores a previous session and replays its history as
    /// `session/update` notifications.
    ///
    /// Only called when the agent advertises the `loadSession` capability.
    async fn load_session(&self, _args: LoadSessionRequest) -> Result<LoadSessionResponse> {
        Err(Error::method_not_found())
    }

    /// Switches the session to one of the advertised modes.
    async fn set_session_mode(
        &self,
        _args: SetSessionModeRequest,
    ) -> Result<SetSessionModeResponse> {
        Err(Error::method_not_found())
    }

    /// **UNSTABLE** Selects the model for a session.
    async fn set_session_model(
        &self,
        _args: SetSessionModelRequest,
    ) -> Result<SetSessionModelResponse> {
        Err(Error::method_not_found())
    }

    /// **UNSTABLE** Sets one configuration option and returns the full,
    /// possibly readjusted option list.
    async fn set_session_config_option(
        &self,
        _args: SetSessionConfigOptionRequest,
    ) -> Result<SetSessionConfigOptionResponse> {
        Err(Error::method_not_found())
    }

    /// **UNSTABLE** Lists sessions known to the agent, paged by cursor.
    ///
    /// Only called when the agent advertises `sessionCapabilities.list`.
    async fn list_sessions(&self, _args: ListSessionsRequest) -> Result<ListSessionsResponse> {
        Err(Error::method_not_found())
    }

    /// **UNSTABLE** Creates a new session sharing an existing session's
    /// history.
    ///
    /// Only called when the agent advertises `sessionCapabilities.fork`.
    async fn fork_session(&self, _args: ForkSessionRequest) -> Result<ForkSessionResponse> {
        Err(Error::method_not_found())
    }

    /// **UNSTABLE** Reattaches to an existing session without replaying
    /// history.
    ///
    /// Only called when the agent advertises `sessionCapabilities.resume`.
    async fn resume_session(&self, _args: ResumeSessionRequest) -> Result<ResumeSessionResponse> {
        Err(Error::method_not_found())
    }

    /// Handles an implementation-specific request (wire method `_<name>`).
    async fn ext_method(&self, _args: ExtRequest) -> Result<ExtResponse> {
        Ok(ExtResponse::new(RawValue::NULL.to_owned()))
    }

    /// Handles an implementation-specific notification (wire method
    /// `_<name>`).
    async fn ext_notification(&self, _args: ExtNotification) -> Result<()> {
        Ok(())
    }
}

/// A request an agent can receive, decoded and tagged by method.
#[derive(Clone, Debug, Serialize)]
#[serde(untagged)]
pub enum ClientRequest {
    Initialize(InitializeRequest),
    Authenticate(AuthenticateRequest),
    NewSession(NewSessionRequest),
    LoadSession(LoadSessionRequest),
    SetSessionMode(SetSessionModeRequest),
    Prompt(PromptRequest),
    SetSessionModel(SetSessionModelRequest),
    SetSessionConfigOption(SetSessionConfigOptionRequest),
    ListSessions(ListSessionsRequest),
    ForkSession(ForkSessionRequest),
    ResumeSession(ResumeSessionRequest),
    ExtMethod(ExtRequest),
}

/// A response an agent produces, one variant per [`ClientRequest`].
#[derive(Clone, Debug, Serialize)]
#[serde(untagged)]
pub enum AgentResponse {
    Initialize(InitializeResponse),
    Authenticate(AuthenticateResponse),
    NewSession(NewSessionResponse),
    LoadSession(LoadSessionResponse),
    SetSessionMode(SetSessionModeResponse),
    Prompt(PromptResponse),
    SetSessionModel(SetSessionModelResponse),
    SetSessionConfigOption(SetSessionConfigOptionResponse),
    ListSessions(ListSessionsResponse),
    ForkSession(ForkSessionResponse),
    ResumeSession(ResumeSessionResponse),
    ExtMethod(ExtResponse),
}

/// A notification an agent can receive.
#[derive(Clone, Debug, Serialize)]
#[serde(untagged)]
pub enum ClientNotification {
    Cancel(CancelNotification),
    Ext(ExtNotification),
}

/// Marker type for the agent role of a connection.
#[derive(Clone, Copy, Debug)]
pub struct AgentSide;

impl Side for AgentSide {
    type InRequest = ClientRequest;
    type InNotification = ClientNotification;
    type OutResponse = AgentResponse;

    fn decode_request(method: &str, params: Option<&RawValue>) -> Result<ClientRequest> {
        let names = &AGENT_METHOD_NAMES;
        match method {
            m if m == names.initialize => decode_params(params).map(ClientRequest::Initialize),
            m if m == names.authenticate => decode_params(params).map(ClientRequest::Authenticate),
            m if m == names.session_new => decode_params(params).map(ClientRequest::NewSession),
            m if m == names.session_load => decode_params(params).map(ClientRequest::LoadSession),
            m if m == names.session_set_mode => {
                decode_params(params).map(ClientRequest::SetSessionMode)
            }
            m if m == names.session_prompt => decode_params(params).map(ClientRequest::Prompt),
            m if m == names.session_set_model => {
                decode_params(params).map(ClientRequest::SetSessionModel)
            }
            m if m == names.session_set_config_option => {
                decode_params(params).map(ClientRequest::SetSessionConfigOption)
            }
            m if m == names.session_list => decode_params(params).map(ClientRequest::ListSessions),
            m if m == names.session_fork => decode_params(params).map(ClientRequest::ForkSession),
            m if m == names.session_resume => {
                decode_params(params).map(ClientRequest::ResumeSession)
            }
            _ => {
                if let Some(custom_method) = method.strip_prefix('_') {
                    let params = params.ok_or_else(Error::invalid_params)?;
                    Ok(ClientRequest::ExtMethod(ExtRequest::new(
                        custom_method,
                        params.to_owned(),
                    )))
                } else {
                    Err(Error::method_not_found())
                }
            }
        }
    }

    fn decode_notification(method: &str, params: Option<&RawValue>) -> Result<ClientNotification> {
        match method {
            m if m == AGENT_METHOD_NAMES.session_cancel => {
                decode_params(params).map(ClientNotification::Cancel)
            }
            _ => {
                if let Some(custom_method) = method.strip_prefix('_') {
                    let params = params.ok_or_else(Error::invalid_params)?;
                    Ok(ClientNotification::Ext(ExtNotification::new(
                        custom_method,
                        params.to_owned(),
                    )))
                } else {
                    Err(Error::method_not_found())
                }
            }
        }
    }
}

impl<T: Agent> MessageHandler<AgentSide> for T {
    async fn handle_request(&self, request: ClientRequest) -> Result<AgentResponse> {
        match request {
            ClientRequest::Initialize(args) => {
                self.initialize(args).await.map(AgentResponse::Initialize)
            }
            ClientRequest::Authenticate(args) => self
                .authenticate(args)
                .await
                .map(AgentResponse::Authenticate),
            ClientRequest::NewSession(args) => {
                self.new_session(args).await.map(AgentResponse::NewSession)
            }
            ClientRequest::LoadSession(args) => self
                .load_session(args)
                .await
                .map(AgentResponse::LoadSession),
            ClientRequest::SetSessionMode(args) => self
                .set_session_mode(args)
                .await
                .map(AgentResponse::SetSessionMode),
            ClientRequest::Prompt(args) => self.prompt(args).await.map(AgentResponse::Prompt),
            ClientRequest::SetSessionModel(args) => self
                .set_session_model(args)
                .await
                .map(AgentResponse::SetSessionModel),
            ClientRequest::SetSessionConfigOption(args) => self
                .set_session_config_option(args)
                .await
                .map(AgentResponse::SetSessionConfigOption),
            ClientRequest::ListSessions(args) => self
                .list_sessions(args)
                .await
                .map(AgentResponse::ListSessions),
            ClientRequest::ForkSession(args) => self
                .fork_session(args)
                .await
                .map(AgentResponse::ForkSession),
            ClientRequest::ResumeSession(args) => self
                .resume_session(args)
                .await
                .map(AgentResponse::ResumeSession),
            ClientRequest::ExtMethod(args) => {
                self.ext_method(args).await.map(AgentResponse::ExtMethod)
            }
        }
    }

    async fn handle_notification(&self, notification: ClientNotification) -> Result<()> {
        match notification {
            ClientNotification::Cancel(args) => self.cancel(args).await,
            ClientNotification::Ext(args) => self.ext_notification(args).await,
        }
    }
}

#[async_trait::async_trait(?Send)]
impl<T: Agent> Agent for Rc<T> {
    async fn initialize(&self, args: InitializeRequest) -> Result<InitializeResponse> {
        self.as_ref().initialize(args).await
    }
    async fn authenticate(&self, args: AuthenticateRequest) -> Result<AuthenticateResponse> {
        self.as_ref().authenticate(args).await
    }
    async fn new_session(&self, args: NewSessionRequest) -> Result<NewSessionResponse> {
        self.as_ref().new_session(args).await
    }
    async fn prompt(&self, args: PromptRequest) -> Result<PromptResponse> {
        self.as_ref().prompt(args).await
    }
    async fn cancel(&self, args: CancelNotification) -> Result<()> {
        self.as_ref().cancel(args).await
    }
    async fn load_session(&self, args: LoadSessionRequest) -> Result<LoadSessionResponse> {
        self.as_ref().load_session(args).await
    }
    async fn set_session_mode(
        &self,
        args: SetSessionModeRequest,
    ) -> Result<SetSessionModeResponse> {
        self.as_ref().set_session_mode(args).await
    }
    async fn set_session_model(
        &self,
        args: SetSessionModelRequest,
    ) -> Result<SetSessionModelResponse> {
        self.as_ref().set_session_model(args).await
    }
    async fn set_session_config_option(
        &self,
        args: SetSessionConfigOptionRequest,
    ) -> Result<SetSessionConfigOptionResponse> {
        self.as_ref().set_session_config_option(args).await
    }
    async fn list_sessions(&self, args: ListSessionsRequest) -> Result<ListSessionsResponse> {
        self.as_ref().list_sessions(args).await
    }
    async fn fork_session(&self, args: ForkSessionRequest) -> Result<ForkSessionResponse> {
        self.as_ref().fork_session(args).await
    }
    async fn resume_session(&self, args: ResumeSessionRequest) -> Result<ResumeSessionResponse> {
        self.as_ref().resume_session(args).await
    }
    async fn ext_method(&self, args: ExtRequest) -> Result<ExtResponse> {
        self.as_ref().ext_method(args).await
    }
    async fn ext_notification(&self, args: ExtNotification) -> Result<()> {
        self.as_ref().ext_notification(args).await
    }
}

#[async_trait::async_trait(?Send)]
impl<T: Agent> Agent for Arc<T> {
    async fn initialize(&self, args: InitializeRequest) -> Result<InitializeResponse> {
        self.as_ref().initialize(args).await
    }
    async fn authenticate(&self, args: AuthenticateRequest) -> Result<AuthenticateResponse> {
        self.as_ref().authenticate(args).await
    }
    async fn new_session(&self, args: NewSessionRequest) -> Result<NewSessionResponse> {
        self.as_ref().new_session(args).await
    }
    async fn prompt(&self, args: PromptRequest) -> Result<PromptResponse> {
        self.as_ref().prompt(args).await
    }
    async fn cancel(&self, args: CancelNotification) -> Result<()> {
        self.as_ref().cancel(args).await
    }
    async fn load_session(&self, args: LoadSessionRequest) -> Result<LoadSessionResponse> {
        self.as_ref().load_session(args).await
    }
    async fn set_session_mode(
        &self,
        args: SetSessionModeRequest,
    ) -> Result<SetSessionModeResponse> {
        self.as_ref().set_session_mode(args).await
    }
    async fn set_session_model(
        &self,
        args: SetSessionModelRequest,
    ) -> Result<SetSessionModelResponse> {
        self.as_ref().set_session_model(args).await
    }
    async fn set_session_config_option(
        &self,
        args: SetSessionConfigOptionRequest,
    ) -> Result<SetSessionConfigOptionResponse> {
        self.as_ref().set_session_config_option(args).await
    }
    async fn list_sessions(&self, args: ListSessionsRequest) -> Result<ListSessionsResponse> {
        self.as_ref().list_sessions(args).await
    }
    async fn fork_session(&self, args: ForkSessionRequest) -> Result<ForkSessionResponse> {
        self.as_ref().fork_session(args).await
    }
    async fn resume_session(&self, args: ResumeSessionRequest) -> Result<ResumeSessionResponse> {
        self.as_ref().resume_session(args).await
    }
    async fn ext_method(&self, args: ExtRequest) -> Result<ExtResponse> {
        self.as_ref().ext_method(args).await
    }
    async fn ext_notification(&self, args: ExtNotification) -> Result<()> {
        self.as_ref().ext_notification(args).await
    }
}

/// The wire names of every method an agent handles.
#[derive(Clone, Debug)]
pub struct AgentMethodNames {
    pub initialize: &'static str,
    pub authenticate: &'static str,
    pub session_new: &'static str,
    pub session_load: &'static str,
    pub session_set_mode: &'static str,
    pub session_prompt: &'static str,
    pub session_cancel: &'static str,
    pub session_set_model: &'static str,
    pub session_set_config_option: &'static str,
    pub session_list: &'static str,
    pub session_fork: &'static str,
    pub session_resume: &'static str,
}

/// The agent-side method table.
pub const AGENT_METHOD_NAMES: AgentMethodNames = AgentMethodNames {
    initialize: "initialize",
    authenticate: "authenticate",
    session_new: "session/new",
    session_load: "session/load",
    session_set_mode: "session/set_mode",
    session_prompt: "session/prompt",
    session_cancel: "session/cancel",
    session_set_model: "session/set_model",
    session_set_config_option: "session/set_config_option",
    session_list: "session/list",
    session_fork: "session/fork",
    session_resume: "session/resume",
};

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw(value: serde_json::Value) -> Box<RawValue> {
        serde_json::value::to_raw_value(&value).unwrap()
    }

    #[test]
    fn every_agent_method_decodes() {
        let cases = [
            (AGENT_METHOD_NAMES.initialize, json!({ "protocolVersion": 1 })),
            (AGENT_METHOD_NAMES.authenticate, json!({ "methodId": "m" })),
            (AGENT_METHOD_NAMES.session_new, json!({ "cwd": "/w" })),
            (
                AGENT_METHOD_NAMES.session_load,
                json!({ "sessionId": "s", "cwd": "/w" }),
            ),
            (
                AGENT_METHOD_NAMES.session_set_mode,
                json!({ "sessionId": "s", "modeId": "code" }),
            ),
            (
                AGENT_METHOD_NAMES.session_prompt,
                json!({ "sessionId": "s", "prompt": [] }),
            ),
            (
                AGENT_METHOD_NAMES.session_set_model,
                json!({ "sessionId": "s", "modelId": "m" }),
            ),
            (
                AGENT_METHOD_NAMES.session_set_config_option,
                json!({ "sessionId": "s", "configId": "c", "value": "v" }),
            ),
            (AGENT_METHOD_NAMES.session_list, json!({})),
            (
                AGENT_METHOD_NAMES.session_fork,
                json!({ "sessionId": "s", "cwd": "/w" }),
            ),
            (
                AGENT_METHOD_NAMES.session_resume,
                json!({ "sessionId": "s", "cwd": "/w" }),
            ),
        ];
        for (method, params) in cases {
            let params = raw(params);
            let decoded = AgentSide::decode_request(method, Some(&params));
            assert!(decoded.is_ok(), "{method} failed: {decoded:?}");
        }
    }

    #[test]
    fn unknown_method_is_method_not_found() {
        let err = AgentSide::decode_request("nope", Some(&raw(json!({})))).unwrap_err();
        assert_eq!(err.code, crate::ErrorCode::METHOD_NOT_FOUND);
    }

    #[test]
    fn missing_params_is_invalid_params() {
        let err = AgentSide::decode_request(AGENT_METHOD_NAMES.initialize, None).unwrap_err();
        assert_eq!(err.code, crate::ErrorCode::INVALID_PARAMS);
    }

    #[test]
    fn underscore_prefix_passes_through() {
        let request =
            AgentSide::decode_request("_example.com/op", Some(&raw(json!({ "x": 1 })))).unwrap();
        let ClientRequest::ExtMethod(ext) = request else {
            panic!("expected extension request");
        };
        assert_eq!(ext.method.as_ref(), "example.com/op");
        assert_eq!(ext.params.get(), r#"{"x":1}"#);
    }

    #[test]
    fn cancel_is_the_only_plain_notification() {
        let decoded = AgentSide::decode_notification(
            AGENT_METHOD_NAMES.session_cancel,
            Some(&raw(json!({ "sessionId": "s" }))),
        );
        assert!(matches!(decoded, Ok(ClientNotification::Cancel(_))));

        let err = AgentSide::decode_notification("session/unknown", Some(&raw(json!({}))))
            .unwrap_err();
        assert_eq!(err.code, crate::ErrorCode::METHOD_NOT_FOUND);
    }
}

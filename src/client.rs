//! The client role: the trait a client implements and the method table for
//! what clients receive.

use std::rc::Rc;
use std::sync::Arc;

use serde::Serialize;
use serde_json::value::RawValue;

use crate::error::{Error, Result};
use crate::ext::{ExtNotification, ExtRequest, ExtResponse};
use crate::fs::{
    ReadTextFileRequest, ReadTextFileResponse, WriteTextFileRequest, WriteTextFileResponse,
};
use crate::permission::{RequestPermissionRequest, RequestPermissionResponse};
use crate::rpc::{decode_params, MessageHandler, Side};
use crate::terminal::{
    CreateTerminalRequest, CreateTerminalResponse, KillTerminalCommandRequest,
    KillTerminalCommandResponse, ReleaseTerminalRequest, ReleaseTerminalResponse,
    TerminalOutputRequest, TerminalOutputResponse, WaitForTerminalExitRequest,
    WaitForTerminalExitResponse,
};
use crate::update::SessionNotification;

/// The interface an ACP client implements.
///
/// Clients host the user interface and own the file system and terminal
/// surface the agent works through. Permission requests and session updates
/// are mandatory; the file-system and terminal methods default to
/// `method_not_found` so a client only implements what it advertised in its
/// capabilities.
#[async_trait::async_trait(?Send)]
pub trait Client {
    /// Asks the user to authorize a tool call.
    ///
    /// After the client sends `session/cancel` it must answer every pending
    /// permission request with the `cancelled` outcome.
    async fn request_permission(
        &self,
        args: RequestPermissionRequest,
    ) -> Result<RequestPermissionResponse>;

    /// Receives one `session/update` notification.
    ///
    /// Updates keep arriving briefly after a cancellation, while the agent
    /// flushes its final state.
    async fn session_notification(&self, args: SessionNotification) -> Result<()>;

    /// Writes a file through the client, so unsaved buffers and access policy
    /// stay under the client's control. Requires the `fs.writeTextFile`
    /// capability.
    async fn write_text_file(&self, _args: WriteTextFileRequest) -> Result<WriteTextFileResponse> {
        Err(Error::method_not_found())
    }

    /// Reads a file through the client. Requires the `fs.readTextFile`
    /// capability.
    async fn read_text_file(&self, _args: ReadTextFileRequest) -> Result<ReadTextFileResponse> {
        Err(Error::method_not_found())
    }

    /// Runs a command in a new terminal and returns its id. Requires the
    /// `terminal` capability.
    ///
    /// The agent owns the terminal from here: it may wait, kill, embed the id
    /// in tool-call content, and must eventually release it.
    async fn create_terminal(&self, _args: CreateTerminalRequest) -> Result<CreateTerminalResponse> {
        Err(Error::method_not_found())
    }

    /// Snapshots a terminal's output without waiting for exit.
    async fn terminal_output(&self, _args: TerminalOutputRequest) -> Result<TerminalOutputResponse> {
        Err(Error::method_not_found())
    }

    /// Frees a terminal, killing its command if still running. The id stays
    /// usable inside already-sent tool-call content, nowhere else.
    async fn release_terminal(
        &self,
        _args: ReleaseTerminalRequest,
    ) -> Result<ReleaseTerminalResponse> {
        Err(Error::method_not_found())
    }

    /// Suspends until the terminal's command exits.
    async fn wait_for_terminal_exit(
        &self,
        _args: WaitForTerminalExitRequest,
    ) -> Result<WaitForTerminalExitResponse> {
        Err(Error::method_not_found())
    }

    /// Kills the terminal's command but keeps the terminal id valid, e.g. to
    /// collect final output after a command timeout.
    async fn kill_terminal_command(
        &self,
        _args: KillTerminalCommandRequest,
    ) -> Result<KillTerminalCommandResponse> {
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

/// A request a client can receive, decoded and tagged by method.
#[derive(Clone, Debug, Serialize)]
#[serde(untagged)]
pub enum AgentRequest {
    RequestPermission(RequestPermissionRequest),
    WriteTextFile(WriteTextFileRequest),
    ReadTextFile(ReadTextFileRequest),
    CreateTerminal(CreateTerminalRequest),
    TerminalOutput(TerminalOutputRequest),
    ReleaseTerminal(ReleaseTerminalRequest),
    WaitForTerminalExit(WaitForTerminalExitRequest),
    KillTerminalCommand(KillTerminalCommandRequest),
    ExtMethod(ExtRequest),
}

/// A response a client produces, one variant per [`AgentRequest`].
#[derive(Clone, Debug, Serialize)]
#[serde(untagged)]
pub enum ClientResponse {
    RequestPermission(RequestPermissionResponse),
    WriteTextFile(WriteTextFileResponse),
    ReadTextFile(ReadTextFileResponse),
    CreateTerminal(CreateTerminalResponse),
    TerminalOutput(TerminalOutputResponse),
    ReleaseTerminal(ReleaseTerminalResponse),
    WaitForTerminalExit(WaitForTerminalExitResponse),
    KillTerminalCommand(KillTerminalCommandResponse),
    ExtMethod(ExtResponse),
}

/// A notification a client can receive.
#[derive(Clone, Debug, Serialize)]
#[serde(untagged)]
pub enum AgentNotification {
    Session(SessionNotification),
    Ext(ExtNotification),
}

/// Marker type for the client role of a connection.
#[derive(Clone, Copy, Debug)]
pub struct ClientSide;

impl Side for ClientSide {
    type InRequest = AgentRequest;
    type InNotification = AgentNotification;
    type OutResponse = ClientResponse;

    fn decode_request(method: &str, params: Option<&RawValue>) -> Result<AgentRequest> {
        let names = &CLIENT_METHOD_NAMES;
        match method {
            m if m == names.session_request_permission => {
                decode_params(params).map(AgentRequest::RequestPermission)
            }
            m if m == names.fs_write_text_file => {
                decode_params(params).map(AgentRequest::WriteTextFile)
            }
            m if m == names.fs_read_text_file => {
                decode_params(params).map(AgentRequest::ReadTextFile)
            }
            m if m == names.terminal_create => {
                decode_params(params).map(AgentRequest::CreateTerminal)
            }
            m if m == names.terminal_output => {
                decode_params(params).map(AgentRequest::TerminalOutput)
            }
            m if m == names.terminal_release => {
                decode_params(params).map(AgentRequest::ReleaseTerminal)
            }
            m if m == names.terminal_wait_for_exit => {
                decode_params(params).map(AgentRequest::WaitForTerminalExit)
            }
            m if m == names.terminal_kill => {
                decode_params(params).map(AgentRequest::KillTerminalCommand)
            }
            _ => {
                if let Some(custom_method) = method.strip_prefix('_') {
                    let params = params.ok_or_else(Error::invalid_params)?;
                    Ok(AgentRequest::ExtMethod(ExtRequest::new(
                        custom_method,
                        params.to_owned(),
                    )))
                } else {
                    Err(Error::method_not_found())
                }
            }
        }
    }

    fn decode_notification(method: &str, params: Option<&RawValue>) -> Result<AgentNotification> {
        match method {
            m if m == CLIENT_METHOD_NAMES.session_update => {
                decode_params(params).map(AgentNotification::Session)
            }
            _ => {
                if let Some(custom_method) = method.strip_prefix('_') {
                    let params = params.ok_or_else(Error::invalid_params)?;
                    Ok(AgentNotification::Ext(ExtNotification::new(
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

impl<T: Client> MessageHandler<ClientSide> for T {
    async fn handle_request(&self, request: AgentRequest) -> Result<ClientResponse> {
        match request {
            AgentRequest::RequestPermission(args) => self
                .request_permission(args)
                .await
                .map(ClientResponse::RequestPermission),
            AgentRequest::WriteTextFile(args) => self
                .write_text_file(args)
                .await
                .map(ClientResponse::WriteTextFile),
            AgentRequest::ReadTextFile(args) => self
                .read_text_file(args)
                .await
                .map(ClientResponse::ReadTextFile),
            AgentRequest::CreateTerminal(args) => self
                .create_terminal(args)
                .await
                .map(ClientResponse::CreateTerminal),
            AgentRequest::TerminalOutput(args) => self
                .terminal_output(args)
                .await
                .map(ClientResponse::TerminalOutput),
            AgentRequest::ReleaseTerminal(args) => self
                .release_terminal(args)
                .await
                .map(ClientResponse::ReleaseTerminal),
            AgentRequest::WaitForTerminalExit(args) => self
                .wait_for_terminal_exit(args)
                .await
                .map(ClientResponse::WaitForTerminalExit),
            AgentRequest::KillTerminalCommand(args) => self
                .kill_terminal_command(args)
                .await
                .map(ClientResponse::KillTerminalCommand),
            AgentRequest::ExtMethod(args) => {
                self.ext_method(args).await.map(ClientResponse::ExtMethod)
            }
        }
    }

    async fn handle_notification(&self, notification: AgentNotification) -> Result<()> {
        match notification {
            AgentNotification::Session(args) => self.session_notification(args).await,
            AgentNotification::Ext(args) => self.ext_notification(args).await,
        }
    }
}

#[async_trait::async_trait(?Send)]
impl<T: Client> Client for Rc<T> {
    async fn request_permission(
        &self,
        args: RequestPermissionRequest,
    ) -> Result<RequestPermissionResponse> {
        self.as_ref().request_permission(args).await
    }
    async fn session_notification(&self, args: SessionNotification) -> Result<()> {
        self.as_ref().session_notification(args).await
    }
    async fn write_text_file(&self, args: WriteTextFileRequest) -> Result<WriteTextFileResponse> {
        self.as_ref().write_text_file(args).await
    }
    async fn read_text_file(&self, args: ReadTextFileRequest) -> Result<ReadTextFileResponse> {
        self.as_ref().read_text_file(args).await
    }
    async fn create_terminal(&self, args: CreateTerminalRequest) -> Result<CreateTerminalResponse> {
        self.as_ref().create_terminal(args).await
    }
    async fn terminal_output(&self, args: TerminalOutputRequest) -> Result<TerminalOutputResponse> {
        self.as_ref().terminal_output(args).await
    }
    async fn release_terminal(
        &self,
        args: ReleaseTerminalRequest,
    ) -> Result<ReleaseTerminalResponse> {
        self.as_ref().release_terminal(args).await
    }
    async fn wait_for_terminal_exit(
        &self,
        args: WaitForTerminalExitRequest,
    ) -> Result<WaitForTerminalExitResponse> {
        self.as_ref().wait_for_terminal_exit(args).await
    }
    async fn kill_terminal_command(
        &self,
        args: KillTerminalCommandRequest,
    ) -> Result<KillTerminalCommandResponse> {
        self.as_ref().kill_terminal_command(args).await
    }
    async fn ext_method(&self, args: ExtRequest) -> Result<ExtResponse> {
        self.as_ref().ext_method(args).await
    }
    async fn ext_notification(&self, args: ExtNotification) -> Result<()> {
        self.as_ref().ext_notification(args).await
    }
}

#[async_trait::async_trait(?Send)]
impl<T: Client> Client for Arc<T> {
    async fn request_permission(
        &self,
        args: RequestPermissionRequest,
    ) -> Result<RequestPermissionResponse> {
        self.as_ref().request_permission(args).await
    }
    async fn session_notification(&self, args: SessionNotification) -> Result<()> {
        self.as_ref().session_notification(args).await
    }
    async fn write_text_file(&self, args: WriteTextFileRequest) -> Result<WriteTextFileResponse> {
        self.as_ref().write_text_file(args).await
    }
    async fn read_text_file(&self, args: ReadTextFileRequest) -> Result<ReadTextFileResponse> {
        self.as_ref().read_text_file(args).await
    }
    async fn create_terminal(&self, args: CreateTerminalRequest) -> Result<CreateTerminalResponse> {
        self.as_ref().create_terminal(args).await
    }
    async fn terminal_output(&self, args: TerminalOutputRequest) -> Result<TerminalOutputResponse> {
        self.as_ref().terminal_output(args).await
    }
    async fn release_terminal(
        &self,
        args: ReleaseTerminalRequest,
    ) -> Result<ReleaseTerminalResponse> {
        self.as_ref().release_terminal(args).await
    }
    async fn wait_for_terminal_exit(
        &self,
        args: WaitForTerminalExitRequest,
    ) -> Result<WaitForTerminalExitResponse> {
        self.as_ref().wait_for_terminal_exit(args).await
    }
    async fn kill_terminal_command(
        &self,
        args: KillTerminalCommandRequest,
    ) -> Result<KillTerminalCommandResponse> {
        self.as_ref().kill_terminal_command(args).await
    }
    async fn ext_method(&self, args: ExtRequest) -> Result<ExtResponse> {
        self.as_ref().ext_method(args).await
    }
    async fn ext_notification(&self, args: ExtNotification) -> Result<()> {
        self.as_ref().ext_notification(args).await
    }
}

/// The wire names of every method a client handles.
#[derive(Clone, Debug)]
pub struct ClientMethodNames {
    pub session_request_permission: &'static str,
    pub session_update: &'static str,
    pub fs_write_text_file: &'static str,
    pub fs_read_text_file: &'static str,
    pub terminal_create: &'static str,
    pub terminal_output: &'static str,
    pub terminal_release: &'static str,
    pub terminal_wait_for_exit: &'static str,
    pub terminal_kill: &'static str,
}

/// The client-side method table.
pub const CLIENT_METHOD_NAMES: ClientMethodNames = ClientMethodNames {
    session_request_permission: "session/request_permission",
    session_update: "session/update",
    fs_write_text_file: "fs/write_text_file",
    fs_read_text_file: "fs/read_text_file",
    terminal_create: "terminal/create",
    terminal_output: "terminal/output",
    terminal_release: "terminal/release",
    terminal_wait_for_exit: "terminal/wait_for_exit",
    terminal_kill: "terminal/kill",
};

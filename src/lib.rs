//! A protocol engine for the Agent Client Protocol (ACP).
//!
//! ACP is a bidirectional JSON-RPC 2.0 protocol spoken between a *client*
//! (typically a code editor) and an *agent* (typically an AI coding
//! assistant) over a pair of byte streams, one JSON object per line. Both
//! peers issue requests, answer them, and emit notifications concurrently.
//!
//! This crate provides the three pieces that make the protocol work:
//!
//! - the **schema**: every request, response, notification, and update
//!   variant as plain typed data with an exact JSON encoding;
//! - the **side dispatchers**: per-role decoding of `(method, params)` into
//!   typed payloads, including `_`-prefixed extension passthrough;
//! - the **connection runtime**: a line-framed transport that multiplexes
//!   concurrent requests by id, dispatches inbound traffic to a user handler
//!   on its own tasks, and broadcasts every message to subscribed observers.
//!
//! # Wiring up
//!
//! An agent program implements [`Agent`], hands it to
//! [`AgentSideConnection::new`] along with its stdio streams and a local task
//! spawner, and spawns the returned I/O future. The connection value then
//! acts as the [`Client`] half: calling [`Client::request_permission`] on it
//! sends the request to the editor on the other end. A client program does
//! the mirror image with [`Client`] and [`ClientSideConnection`].
//!
//! The runtime is executor-agnostic: it spawns handler work through the
//! closure you pass in (`tokio::task::spawn_local` works) and only needs a
//! tokio timer context if you configure request timeouts.

use std::future::Future;
use std::time::Duration;

use futures::future::LocalBoxFuture;
use futures::{AsyncRead, AsyncWrite};

mod agent;
mod client;
mod content;
mod error;
mod ext;
mod fs;
mod initialize;
mod maybe_undefined;
mod mcp;
mod permission;
mod plan;
mod rpc;
#[cfg(test)]
mod rpc_tests;
mod session;
mod stream_broadcast;
mod terminal;
mod tool_call;
mod update;
mod version;

pub use agent::*;
pub use client::*;
pub use content::*;
pub use error::*;
pub use ext::*;
pub use fs::*;
pub use initialize::*;
pub use maybe_undefined::MaybeUndefined;
pub use mcp::*;
pub use permission::*;
pub use plan::*;
pub use rpc::{MessageHandler, RequestId, Side};
pub use session::*;
pub use stream_broadcast::{
    StreamMessage, StreamMessageContent, StreamMessageDirection, StreamReceiver,
};
pub use terminal::*;
pub use tool_call::*;
pub use update::*;
pub use version::ProtocolVersion;

use rpc::RpcConnection;

/// An agent's connection to its client.
///
/// Constructed by the *agent* program. Inbound traffic (initialize, session
/// setup, prompts) is decoded with the agent-side method table and dispatched
/// to the [`Agent`] handler; outbound traffic goes through this value's
/// [`Client`] implementation, so `conn.request_permission(...)` asks the
/// editor on the other end of the pipe.
#[derive(Debug)]
pub struct AgentSideConnection {
    conn: RpcConnection,
}

impl AgentSideConnection {
    /// Establishes the agent's half of a connection.
    ///
    /// `outgoing_bytes` and `incoming_bytes` are conventionally stdout and
    /// stdin. `spawn` runs handler tasks; the returned I/O future must itself
    /// be spawned and drives the connection until EOF, [`stop`](Self::stop),
    /// or a write failure.
    pub fn new(
        agent: impl MessageHandler<AgentSide> + 'static,
        outgoing_bytes: impl Unpin + AsyncWrite,
        incoming_bytes: impl Unpin + AsyncRead,
        spawn: impl Fn(LocalBoxFuture<'static, ()>) + 'static,
    ) -> (Self, impl Future<Output = Result<()>>) {
        let (conn, io_task) =
            RpcConnection::new(AgentSide, agent, outgoing_bytes, incoming_bytes, spawn);
        (Self { conn }, io_task)
    }

    /// Registers an observer that receives a copy of every message this
    /// connection sends and receives.
    pub fn subscribe(&self) -> StreamReceiver {
        self.conn.subscribe()
    }

    /// Applies a deadline to every subsequent outbound request.
    ///
    /// On expiry the caller gets a timeout error and a late response is
    /// dropped; the connection itself stays healthy. Requires a tokio timer
    /// context.
    pub fn set_request_timeout(&self, timeout: Option<Duration>) {
        self.conn.set_request_timeout(timeout);
    }

    /// Shuts the connection down: the I/O loop exits and every pending
    /// request fails with a connection-closed error.
    pub fn stop(&self) {
        self.conn.stop();
    }
}

#[async_trait::async_trait(?Send)]
impl Client for AgentSideConnection {
    async fn request_permission(
        &self,
        args: RequestPermissionRequest,
    ) -> Result<RequestPermissionResponse> {
        self.conn
            .request(CLIENT_METHOD_NAMES.session_request_permission, Some(&args))
            .await
    }

    async fn session_notification(&self, args: SessionNotification) -> Result<()> {
        self.conn
            .notify(CLIENT_METHOD_NAMES.session_update, Some(&args))
    }

    async fn write_text_file(&self, args: WriteTextFileRequest) -> Result<WriteTextFileResponse> {
        self.conn
            .request(CLIENT_METHOD_NAMES.fs_write_text_file, Some(&args))
            .await
            .map(|response: Option<WriteTextFileResponse>| response.unwrap_or_default())
    }

    async fn read_text_file(&self, args: ReadTextFileRequest) -> Result<ReadTextFileResponse> {
        self.conn
            .request(CLIENT_METHOD_NAMES.fs_read_text_file, Some(&args))
            .await
    }

    async fn create_terminal(&self, args: CreateTerminalRequest) -> Result<CreateTerminalResponse> {
        self.conn
            .request(CLIENT_METHOD_NAMES.terminal_create, Some(&args))
            .await
    }

    async fn terminal_output(&self, args: TerminalOutputRequest) -> Result<TerminalOutputResponse> {
        self.conn
            .request(CLIENT_METHOD_NAMES.terminal_output, Some(&args))
            .await
    }

    async fn release_terminal(
        &self,
        args: ReleaseTerminalRequest,
    ) -> Result<ReleaseTerminalResponse> {
        self.conn
            .request(CLIENT_METHOD_NAMES.terminal_release, Some(&args))
            .await
            .map(|response: Option<ReleaseTerminalResponse>| response.unwrap_or_default())
    }

    async fn wait_for_terminal_exit(
        &self,
        args: WaitForTerminalExitRequest,
    ) -> Result<WaitForTerminalExitResponse> {
        self.conn
            .request(CLIENT_METHOD_NAMES.terminal_wait_for_exit, Some(&args))
            .await
    }

    async fn kill_terminal_command(
        &self,
        args: KillTerminalCommandRequest,
    ) -> Result<KillTerminalCommandResponse> {
        self.conn
            .request(CLIENT_METHOD_NAMES.terminal_kill, Some(&args))
            .await
            .map(|response: Option<KillTerminalCommandResponse>| response.unwrap_or_default())
    }

    async fn ext_method(&self, args: ExtRequest) -> Result<ExtResponse> {
        self.conn
            .request(format!("_{}", args.method), Some(&args))
            .await
    }

    async fn ext_notification(&self, args: ExtNotification) -> Result<()> {
        self.conn.notify(format!("_{}", args.method), Some(&args))
    }
}

/// A client's connection to an agent.
///
/// Constructed by the *client* program (the editor). Inbound traffic
/// (permission requests, file access, terminals, session updates) is decoded
/// with the client-side method table and dispatched to the [`Client`]
/// handler; outbound traffic goes through this value's [`Agent`]
/// implementation, so `conn.prompt(...)` sends a prompt to the agent process.
#[derive(Debug)]
pub struct ClientSideConnection {
    conn: RpcConnection,
}

impl ClientSideConnection {
    /// Establishes the client's half of a connection.
    ///
    /// `outgoing_bytes` and `incoming_bytes` are conventionally the agent
    /// subprocess's stdin and stdout. `spawn` runs handler tasks; the
    /// returned I/O future must itself be spawned.
    pub fn new(
        client: impl MessageHandler<ClientSide> + 'static,
        outgoing_bytes: impl Unpin + AsyncWrite,
        incoming_bytes: impl Unpin + AsyncRead,
        spawn: impl Fn(LocalBoxFuture<'static, ()>) + 'static,
    ) -> (Self, impl Future<Output = Result<()>>) {
        let (conn, io_task) =
            RpcConnection::new(ClientSide, client, outgoing_bytes, incoming_bytes, spawn);
        (Self { conn }, io_task)
    }

    /// Registers an observer that receives a copy of every message this
    /// connection sends and receives.
    pub fn subscribe(&self) -> StreamReceiver {
        self.conn.subscribe()
    }

    /// Applies a deadline to every subsequent outbound request.
    ///
    /// On expiry the caller gets a timeout error and a late response is
    /// dropped; the connection itself stays healthy. Requires a tokio timer
    /// context.
    pub fn set_request_timeout(&self, timeout: Option<Duration>) {
        self.conn.set_request_timeout(timeout);
    }

    /// Shuts the connection down: the I/O loop exits and every pending
    /// request fails with a connection-closed error.
    pub fn stop(&self) {
        self.conn.stop();
    }
}

#[async_trait::async_trait(?Send)]
impl Agent for ClientSideConnection {
    async fn initialize(&self, args: InitializeRequest) -> Result<InitializeResponse> {
        self.conn
            .request(AGENT_METHOD_NAMES.initialize, Some(&args))
            .await
    }

    async fn authenticate(&self, args: AuthenticateRequest) -> Result<AuthenticateResponse> {
        self.conn
            .request(AGENT_METHOD_NAMES.authenticate, Some(&args))
            .await
            .map(|response: Option<AuthenticateResponse>| response.unwrap_or_default())
    }

    async fn new_session(&self, args: NewSessionRequest) -> Result<NewSessionResponse> {
        self.conn
            .request(AGENT_METHOD_NAMES.session_new, Some(&args))
            .await
    }

    async fn prompt(&self, args: PromptRequest) -> Result<PromptResponse> {
        self.conn
            .request(AGENT_METHOD_NAMES.session_prompt, Some(&args))
            .await
    }

    async fn cancel(&self, args: CancelNotification) -> Result<()> {
        self.conn
            .notify(AGENT_METHOD_NAMES.session_cancel, Some(&args))
    }

    async fn load_session(&self, args: LoadSessionRequest) -> Result<LoadSessionResponse> {
        self.conn
            .request(AGENT_METHOD_NAMES.session_load, Some(&args))
            .await
            .map(|response: Option<LoadSessionResponse>| response.unwrap_or_default())
    }

    async fn set_session_mode(
        &self,
        args: SetSessionModeRequest,
    ) -> Result<SetSessionModeResponse> {
        self.conn
            .request(AGENT_METHOD_NAMES.session_set_mode, Some(&args))
            .await
            .map(|response: Option<SetSessionModeResponse>| response.unwrap_or_default())
    }

    async fn set_session_model(
        &self,
        args: SetSessionModelRequest,
    ) -> Result<SetSessionModelResponse> {
        self.conn
            .request(AGENT_METHOD_NAMES.session_set_model, Some(&args))
            .await
            .map(|response: Option<SetSessionModelResponse>| response.unwrap_or_default())
    }

    async fn set_session_config_option(
        &self,
        args: SetSessionConfigOptionRequest,
    ) -> Result<SetSessionConfigOptionResponse> {
        self.conn
            .request(AGENT_METHOD_NAMES.session_set_config_option, Some(&args))
            .await
    }

    async fn list_sessions(&self, args: ListSessionsRequest) -> Result<ListSessionsResponse> {
        self.conn
            .request(AGENT_METHOD_NAMES.session_list, Some(&args))
            .await
    }

    async fn fork_session(&self, args: ForkSessionRequest) -> Result<ForkSessionResponse> {
        self.conn
            .request(AGENT_METHOD_NAMES.session_fork, Some(&args))
            .await
    }

    async fn resume_session(&self, args: ResumeSessionRequest) -> Result<ResumeSessionResponse> {
        self.conn
            .request(AGENT_METHOD_NAMES.session_resume, Some(&args))
            .await
            .map(|response: Option<ResumeSessionResponse>| response.unwrap_or_default())
    }

    async fn ext_method(&self, args: ExtRequest) -> Result<ExtResponse> {
        self.conn
            .request(format!("_{}", args.method), Some(&args))
            .await
    }

    async fn ext_notification(&self, args: ExtNotification) -> Result<()> {
        self.conn.notify(format!("_{}", args.method), Some(&args))
    }
}

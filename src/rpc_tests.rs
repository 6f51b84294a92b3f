use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures::StreamExt as _;

use crate::*;

macro_rules! raw_json {
    ($($json:tt)+) => {{
        let value = serde_json::json!($($json)+);
        serde_json::value::to_raw_value(&value).unwrap()
    }};
}

#[derive(Clone, Default)]
struct TestClient {
    permission_responses: Arc<Mutex<Vec<RequestPermissionOutcome>>>,
    file_contents: Arc<Mutex<HashMap<PathBuf, String>>>,
    written_files: Arc<Mutex<Vec<(PathBuf, String)>>>,
    session_notifications: Arc<Mutex<Vec<SessionNotification>>>,
    ext_notifications: Arc<Mutex<Vec<ExtNotification>>>,
}

impl TestClient {
    fn new() -> Self {
        Self::default()
    }

    fn queue_permission_outcome(&self, outcome: RequestPermissionOutcome) {
        self.permission_responses.lock().unwrap().push(outcome);
    }

    fn seed_file(&self, path: impl Into<PathBuf>, content: impl Into<String>) {
        self.file_contents
            .lock()
            .unwrap()
            .insert(path.into(), content.into());
    }
}

#[async_trait::async_trait(?Send)]
impl Client for TestClient {
    async fn request_permission(
        &self,
        _args: RequestPermissionRequest,
    ) -> Result<RequestPermissionResponse> {
        let outcome = self
            .permission_responses
            .lock()
            .unwrap()
            .pop()
            .unwrap_or(RequestPermissionOutcome::Cancelled);
        Ok(RequestPermissionResponse::new(outcome))
    }

    async fn session_notification(&self, args: SessionNotification) -> Result<()> {
        self.session_notifications.lock().unwrap().push(args);
        Ok(())
    }

    async fn write_text_file(&self, args: WriteTextFileRequest) -> Result<WriteTextFileResponse> {
        self.written_files
            .lock()
            .unwrap()
            .push((args.path, args.content));
        Ok(WriteTextFileResponse::default())
    }

    async fn read_text_file(&self, args: ReadTextFileRequest) -> Result<ReadTextFileResponse> {
        match self.file_contents.lock().unwrap().get(&args.path) {
            Some(content) => Ok(ReadTextFileResponse::new(content.clone())),
            None => Err(Error::resource_not_found(args.path.display().to_string())),
        }
    }

    async fn ext_method(&self, args: ExtRequest) -> Result<ExtResponse> {
        match args.method.as_ref() {
            "example.com/ping" => Ok(ExtResponse::new(raw_json!({
                "response": "pong",
                "params": args.params
            }))),
            _ => Err(Error::method_not_found()),
        }
    }

    async fn ext_notification(&self, args: ExtNotification) -> Result<()> {
        self.ext_notifications.lock().unwrap().push(args);
        Ok(())
    }
}

#[derive(Clone, Default)]
struct TestAgent {
    sessions: Arc<Mutex<HashMap<SessionId, PathBuf>>>,
    prompts_received: Arc<Mutex<Vec<(SessionId, Vec<ContentBlock>)>>>,
    cancellations: Arc<Mutex<Vec<SessionId>>>,
    ext_notifications: Arc<Mutex<Vec<ExtNotification>>>,
    next_session: Arc<Mutex<u32>>,
}

impl TestAgent {
    fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait(?Send)]
impl Agent for TestAgent {
    async fn initialize(&self, args: InitializeRequest) -> Result<InitializeResponse> {
        Ok(InitializeResponse::new(args.protocol_version)
            .agent_info(Implementation::new("test-agent", "0.0.0").title("Test Agent")))
    }

    async fn authenticate(&self, _args: AuthenticateRequest) -> Result<AuthenticateResponse> {
        Ok(AuthenticateResponse::default())
    }

    async fn new_session(&self, args: NewSessionRequest) -> Result<NewSessionResponse> {
        let mut next = self.next_session.lock().unwrap();
        *next += 1;
        let session_id = SessionId::new(format!("session-{next}"));
        self.sessions
            .lock()
            .unwrap()
            .insert(session_id.clone(), args.cwd);
        Ok(NewSessionResponse::new(session_id))
    }

    async fn prompt(&self, args: PromptRequest) -> Result<PromptResponse> {
        self.prompts_received
            .lock()
            .unwrap()
            .push((args.session_id, args.prompt));
        Ok(PromptResponse::new(StopReason::EndTurn))
    }

    async fn cancel(&self, args: CancelNotification) -> Result<()> {
        self.cancellations.lock().unwrap().push(args.session_id);
        Ok(())
    }

    async fn load_session(&self, _args: LoadSessionRequest) -> Result<LoadSessionResponse> {
        Ok(LoadSessionResponse::new())
    }

    async fn set_session_mode(
        &self,
        _args: SetSessionModeRequest,
    ) -> Result<SetSessionModeResponse> {
        Ok(SetSessionModeResponse::new())
    }

    async fn set_session_config_option(
        &self,
        args: SetSessionConfigOptionRequest,
    ) -> Result<SetSessionConfigOptionResponse> {
        Ok(SetSessionConfigOptionResponse::new(vec![
            SessionConfigOption::select(
                args.config_id,
                "Test Option",
                args.value,
                vec![
                    SessionConfigSelectOption::new("value1", "Value 1"),
                    SessionConfigSelectOption::new("value2", "Value 2"),
                ],
            ),
        ]))
    }

    async fn list_sessions(&self, _args: ListSessionsRequest) -> Result<ListSessionsResponse> {
        let sessions = self.sessions.lock().unwrap();
        let mut infos: Vec<_> = sessions
            .iter()
            .map(|(id, cwd)| SessionInfo::new(id.clone(), cwd.clone()))
            .collect();
        infos.sort_by(|a, b| a.session_id.0.cmp(&b.session_id.0));
        Ok(ListSessionsResponse::new(infos))
    }

    async fn fork_session(&self, args: ForkSessionRequest) -> Result<ForkSessionResponse> {
        let forked = SessionId::new(format!("fork-of-{}", args.session_id));
        self.sessions
            .lock()
            .unwrap()
            .insert(forked.clone(), args.cwd);
        Ok(ForkSessionResponse::new(forked))
    }

    async fn resume_session(&self, args: ResumeSessionRequest) -> Result<ResumeSessionResponse> {
        if !self.sessions.lock().unwrap().contains_key(&args.session_id) {
            return Err(Error::invalid_params());
        }
        Ok(ResumeSessionResponse::new())
    }

    async fn ext_method(&self, args: ExtRequest) -> Result<ExtResponse> {
        match args.method.as_ref() {
            "example.com/echo" => Ok(ExtResponse::new(raw_json!({ "echo": args.params }))),
            _ => Err(Error::method_not_found()),
        }
    }

    async fn ext_notification(&self, args: ExtNotification) -> Result<()> {
        self.ext_notifications.lock().unwrap().push(args);
        Ok(())
    }
}

/// An agent whose prompt never finishes, for timeout and shutdown tests.
struct StallingAgent;

#[async_trait::async_trait(?Send)]
impl Agent for StallingAgent {
    async fn initialize(&self, args: InitializeRequest) -> Result<InitializeResponse> {
        Ok(InitializeResponse::new(args.protocol_version))
    }

    async fn authenticate(&self, _args: AuthenticateRequest) -> Result<AuthenticateResponse> {
        Ok(AuthenticateResponse::default())
    }

    async fn new_session(&self, _args: NewSessionRequest) -> Result<NewSessionResponse> {
        Ok(NewSessionResponse::new("stall"))
    }

    async fn prompt(&self, _args: PromptRequest) -> Result<PromptResponse> {
        futures::future::pending().await
    }

    async fn cancel(&self, _args: CancelNotification) -> Result<()> {
        Ok(())
    }
}

/// Wires a client and an agent together over in-memory pipes.
///
/// Returns the handle each program would hold: `to_agent` for the client
/// (implements [`Agent`]) and `to_client` for the agent (implements
/// [`Client`]).
fn connect(
    client: impl MessageHandler<ClientSide> + 'static,
    agent: impl MessageHandler<AgentSide> + 'static,
) -> (ClientSideConnection, AgentSideConnection) {
    let (client_to_agent_rx, client_to_agent_tx) = piper::pipe(1024);
    let (agent_to_client_rx, agent_to_client_tx) = piper::pipe(1024);

    let (to_agent, client_io) = ClientSideConnection::new(
        client,
        client_to_agent_tx,
        agent_to_client_rx,
        |fut| {
            tokio::task::spawn_local(fut);
        },
    );
    let (to_client, agent_io) = AgentSideConnection::new(
        agent,
        agent_to_client_tx,
        client_to_agent_rx,
        |fut| {
            tokio::task::spawn_local(fut);
        },
    );

    tokio::task::spawn_local(client_io);
    tokio::task::spawn_local(agent_io);

    (to_agent, to_client)
}

async fn settle() {
    for _ in 0..10 {
        tokio::task::yield_now().await;
    }
}

#[tokio::test]
async fn initialize_handshake() {
    tokio::task::LocalSet::new()
        .run_until(async {
            let (to_agent, _to_client) = connect(TestClient::new(), TestAgent::new());

            let response = to_agent
                .initialize(
                    InitializeRequest::new(ProtocolVersion::LATEST)
                        .client_info(Implementation::new("test-client", "0.0.0")),
                )
                .await
                .expect("initialize failed");

            assert_eq!(response.protocol_version, ProtocolVersion::LATEST);
            assert_eq!(response.agent_info.unwrap().name, "test-agent");
        })
        .await;
}

#[tokio::test]
async fn prompt_turn_reaches_agent() {
    tokio::task::LocalSet::new()
        .run_until(async {
            let agent = TestAgent::new();
            let (to_agent, _to_client) = connect(TestClient::new(), agent.clone());

            let session = to_agent
                .new_session(NewSessionRequest::new("/work"))
                .await
                .expect("new_session failed");

            let response = to_agent
                .prompt(PromptRequest::new(
                    session.session_id.clone(),
                    vec!["Summarize the readme".into()],
                ))
                .await
                .expect("prompt failed");
            assert_eq!(response.stop_reason, StopReason::EndTurn);

            let prompts = agent.prompts_received.lock().unwrap();
            assert_eq!(prompts.len(), 1);
            assert_eq!(prompts[0].0, session.session_id);
        })
        .await;
}

#[tokio::test]
async fn bidirectional_file_operations() {
    tokio::task::LocalSet::new()
        .run_until(async {
            let client = TestClient::new();
            client.seed_file("/work/notes.txt", "Hello, World!");
            let (_to_agent, to_client) = connect(client.clone(), TestAgent::new());

            let session_id = SessionId::new("sess");
            let read = to_client
                .read_text_file(ReadTextFileRequest::new(session_id.clone(), "/work/notes.txt"))
                .await
                .expect("read_text_file failed");
            assert_eq!(read.content, "Hello, World!");

            to_client
                .write_text_file(WriteTextFileRequest::new(
                    session_id.clone(),
                    "/work/notes.txt",
                    "updated",
                ))
                .await
                .expect("write_text_file failed");

            let written = client.written_files.lock().unwrap();
            assert_eq!(
                written.as_slice(),
                &[(PathBuf::from("/work/notes.txt"), "updated".to_string())]
            );
        })
        .await;
}

#[tokio::test]
async fn handler_errors_come_back_typed() {
    tokio::task::LocalSet::new()
        .run_until(async {
            let (_to_agent, to_client) = connect(TestClient::new(), TestAgent::new());

            let err = to_client
                .read_text_file(ReadTextFileRequest::new("sess", "/missing.txt"))
                .await
                .unwrap_err();
            assert_eq!(err.code, ErrorCode::RESOURCE_NOT_FOUND);
            assert_eq!(
                err.data,
                Some(serde_json::json!({ "uri": "/missing.txt" }))
            );
        })
        .await;
}

#[tokio::test]
async fn concurrent_requests_all_complete() {
    tokio::task::LocalSet::new()
        .run_until(async {
            let client = TestClient::new();
            for i in 0..5 {
                client.seed_file(format!("/work/file{i}.txt"), format!("content {i}"));
            }
            let (_to_agent, to_client) = connect(client, TestAgent::new());

            let session_id = SessionId::new("sess");
            let reads = (0..5).map(|i| {
                to_client.read_text_file(ReadTextFileRequest::new(
                    session_id.clone(),
                    format!("/work/file{i}.txt"),
                ))
            });
            let results = futures::future::join_all(reads).await;

            for (i, result) in results.into_iter().enumerate() {
                assert_eq!(result.expect("read failed").content, format!("content {i}"));
            }
        })
        .await;
}

#[tokio::test]
async fn session_updates_arrive_in_order() {
    tokio::task::LocalSet::new()
        .run_until(async {
            let client = TestClient::new();
            let (_to_agent, to_client) = connect(client.clone(), TestAgent::new());

            let session_id = SessionId::new("sess");
            let tool_call_id = ToolCallId::new("call-1");
            let updates = [
                SessionUpdate::AgentMessageChunk(ContentChunk::new("Let me look. ")),
                SessionUpdate::ToolCall(
                    ToolCall::new(tool_call_id.clone(), "Reading notes")
                        .kind(ToolKind::Read)
                        .locations(vec![ToolCallLocation::new("/work/notes.txt")]),
                ),
                SessionUpdate::ToolCallUpdate(ToolCallUpdate::new(
                    tool_call_id.clone(),
                    ToolCallUpdateFields::new()
                        .status(ToolCallStatus::Completed)
                        .content(vec!["notes contents".into()]),
                )),
                SessionUpdate::Plan(Plan::new(vec![PlanEntry::new(
                    "Summarize",
                    PlanEntryPriority::High,
                    PlanEntryStatus::InProgress,
                )])),
            ];
            for update in updates.clone() {
                to_client
                    .session_notification(SessionNotification::new(session_id.clone(), update))
                    .await
                    .expect("session_notification failed");
            }
            settle().await;

            let received = client.session_notifications.lock().unwrap();
            assert_eq!(received.len(), updates.len());
            for (received, sent) in received.iter().zip(&updates) {
                assert_eq!(received.session_id, session_id);
                assert_eq!(&received.update, sent);
            }
        })
        .await;
}

#[tokio::test]
async fn permission_flow_round_trips() {
    tokio::task::LocalSet::new()
        .run_until(async {
            let client = TestClient::new();
            client.queue_permission_outcome(RequestPermissionOutcome::Selected(
                SelectedPermissionOutcome::new("allow-once"),
            ));
            let (_to_agent, to_client) = connect(client, TestAgent::new());

            let response = to_client
                .request_permission(RequestPermissionRequest::new(
                    "sess",
                    ToolCallUpdate::new(
                        "call-1",
                        ToolCallUpdateFields::new().title("Write /work/notes.txt"),
                    ),
                    vec![
                        PermissionOption::new("allow-once", "Allow", PermissionOptionKind::AllowOnce),
                        PermissionOption::new("reject-once", "Reject", PermissionOptionKind::RejectOnce),
                    ],
                ))
                .await
                .expect("request_permission failed");

            match response.outcome {
                RequestPermissionOutcome::Selected(SelectedPermissionOutcome {
                    option_id, ..
                }) => assert_eq!(option_id, PermissionOptionId::new("allow-once")),
                other => panic!("expected selected outcome, got {other:?}"),
            }
        })
        .await;
}

#[tokio::test]
async fn cancel_notification_reaches_agent() {
    tokio::task::LocalSet::new()
        .run_until(async {
            let agent = TestAgent::new();
            let (to_agent, _to_client) = connect(TestClient::new(), agent.clone());

            let session_id = SessionId::new("sess");
            to_agent
                .cancel(CancelNotification::new(session_id.clone()))
                .await
                .expect("cancel failed");
            settle().await;

            assert_eq!(agent.cancellations.lock().unwrap().as_slice(), &[session_id]);
        })
        .await;
}

#[tokio::test]
async fn extension_methods_and_notifications() {
    tokio::task::LocalSet::new()
        .run_until(async {
            let client = TestClient::new();
            let agent = TestAgent::new();
            let (to_agent, to_client) = connect(client.clone(), agent.clone());

            let response = to_client
                .ext_method(ExtRequest::new("example.com/ping", raw_json!({ "data": 7 })))
                .await
                .expect("client ext_method failed");
            assert_eq!(
                serde_json::to_value(&response).unwrap(),
                serde_json::json!({ "response": "pong", "params": { "data": 7 } })
            );

            let response = to_agent
                .ext_method(ExtRequest::new("example.com/echo", raw_json!({ "msg": "hi" })))
                .await
                .expect("agent ext_method failed");
            assert_eq!(
                serde_json::to_value(&response).unwrap(),
                serde_json::json!({ "echo": { "msg": "hi" } })
            );

            let err = to_agent
                .ext_method(ExtRequest::new("example.com/unknown", raw_json!({})))
                .await
                .unwrap_err();
            assert_eq!(err.code, ErrorCode::METHOD_NOT_FOUND);

            to_client
                .ext_notification(ExtNotification::new(
                    "example.com/notify",
                    raw_json!({ "info": "to client" }),
                ))
                .await
                .expect("ext_notification failed");
            settle().await;

            let notifications = client.ext_notifications.lock().unwrap();
            assert_eq!(notifications.len(), 1);
            assert_eq!(notifications[0].method.as_ref(), "example.com/notify");
            assert_eq!(notifications[0].params.get(), r#"{"info":"to client"}"#);
        })
        .await;
}

#[tokio::test]
async fn unstable_session_management() {
    tokio::task::LocalSet::new()
        .run_until(async {
            let (to_agent, _to_client) = connect(TestClient::new(), TestAgent::new());

            let created = to_agent
                .new_session(NewSessionRequest::new("/work"))
                .await
                .expect("new_session failed");

            let listed = to_agent
                .list_sessions(ListSessionsRequest::new())
                .await
                .expect("list_sessions failed");
            assert_eq!(listed.sessions.len(), 1);
            assert_eq!(listed.sessions[0].session_id, created.session_id);
            assert_eq!(listed.sessions[0].cwd, PathBuf::from("/work"));
            assert!(listed.next_cursor.is_none());

            let forked = to_agent
                .fork_session(ForkSessionRequest::new(created.session_id.clone(), "/work"))
                .await
                .expect("fork_session failed");
            assert_ne!(forked.session_id, created.session_id);

            let resumed = to_agent
                .resume_session(ResumeSessionRequest::new(forked.session_id, "/work"))
                .await
                .expect("resume_session failed");
            assert!(resumed.modes.is_none());

            let err = to_agent
                .resume_session(ResumeSessionRequest::new("no-such-session", "/work"))
                .await
                .unwrap_err();
            assert_eq!(err.code, ErrorCode::INVALID_PARAMS);

            let config = to_agent
                .set_session_config_option(SetSessionConfigOptionRequest::new(
                    created.session_id,
                    "mode",
                    "value2",
                ))
                .await
                .expect("set_session_config_option failed");
            assert_eq!(config.config_options.len(), 1);
            assert_eq!(config.config_options[0].id, SessionConfigId::new("mode"));
        })
        .await;
}

#[tokio::test]
async fn request_timeout_leaves_connection_usable() {
    tokio::task::LocalSet::new()
        .run_until(async {
            let (to_agent, _to_client) = connect(TestClient::new(), StallingAgent);

            to_agent.set_request_timeout(Some(Duration::from_millis(20)));
            let err = to_agent
                .prompt(PromptRequest::new("sess", vec!["hang".into()]))
                .await
                .unwrap_err();
            assert_eq!(err, Error::request_timeout());

            to_agent.set_request_timeout(None);
            let response = to_agent
                .new_session(NewSessionRequest::new("/work"))
                .await
                .expect("connection should survive a timeout");
            assert_eq!(response.session_id, SessionId::new("stall"));
        })
        .await;
}

#[tokio::test]
async fn stop_rejects_pending_requests() {
    tokio::task::LocalSet::new()
        .run_until(async {
            let (to_agent, _to_client) = connect(TestClient::new(), StallingAgent);

            let (result, _) = futures::join!(
                to_agent.prompt(PromptRequest::new("sess", vec!["hang".into()])),
                async {
                    settle().await;
                    to_agent.stop();
                }
            );
            assert_eq!(result.unwrap_err(), Error::connection_closed());

            let err = to_agent
                .new_session(NewSessionRequest::new("/work"))
                .await
                .unwrap_err();
            assert_eq!(err, Error::connection_closed());
        })
        .await;
}

#[tokio::test]
async fn peer_shutdown_rejects_pending_requests() {
    tokio::task::LocalSet::new()
        .run_until(async {
            let (to_agent, to_client) = connect(TestClient::new(), StallingAgent);

            // The agent side going away surfaces as EOF on the client side.
            let (result, _) = futures::join!(
                to_agent.prompt(PromptRequest::new("sess", vec!["hang".into()])),
                async {
                    settle().await;
                    to_client.stop();
                }
            );
            assert_eq!(result.unwrap_err(), Error::connection_closed());
        })
        .await;
}

#[tokio::test]
async fn observer_sees_both_directions() {
    tokio::task::LocalSet::new()
        .run_until(async {
            let (to_agent, _to_client) = connect(TestClient::new(), TestAgent::new());
            let mut observed = to_agent.subscribe();

            to_agent
                .initialize(InitializeRequest::new(ProtocolVersion::LATEST))
                .await
                .expect("initialize failed");

            let first = observed.next().await.unwrap();
            assert_eq!(first.direction, StreamMessageDirection::Outgoing);
            let StreamMessageContent::Request { method, id, .. } = &first.message else {
                panic!("expected a request, got {first:?}");
            };
            assert_eq!(method.as_ref(), "initialize");
            assert_eq!(*id, RequestId::Number(0));

            let second = observed.next().await.unwrap();
            assert_eq!(second.direction, StreamMessageDirection::Incoming);
            let StreamMessageContent::Response { id, result } = &second.message else {
                panic!("expected a response, got {second:?}");
            };
            assert_eq!(*id, RequestId::Number(0));
            assert!(result.is_ok());
        })
        .await;
}

#[tokio::test]
async fn observer_sees_notifications() {
    tokio::task::LocalSet::new()
        .run_until(async {
            let (_to_agent, to_client) = connect(TestClient::new(), TestAgent::new());
            let mut observed = to_client.subscribe();

            to_client
                .session_notification(SessionNotification::new(
                    "sess",
                    SessionUpdate::AgentMessageChunk(ContentChunk::new("hi")),
                ))
                .await
                .expect("session_notification failed");

            let message = observed.next().await.unwrap();
            assert_eq!(message.direction, StreamMessageDirection::Outgoing);
            let StreamMessageContent::Notification { method, params } = &message.message else {
                panic!("expected a notification, got {message:?}");
            };
            assert_eq!(method.as_ref(), "session/update");
            let params: serde_json::Value =
                serde_json::from_str(params.as_ref().unwrap().get()).unwrap();
            assert_eq!(params["update"]["sessionUpdate"], "agent_message_chunk");
        })
        .await;
}

//! The connection runtime: line-framed JSON-RPC 2.0 over a duplex byte pair.
//!
//! One I/O task owns both halves of the transport. Outbound messages are
//! serialized at the call site, queued on a channel, and written one per line
//! so concurrent senders can never interleave bytes. Inbound lines are parsed,
//! classified as request/response/notification, and either dispatched to the
//! side decoder and user handler (on their own spawned tasks, so a slow
//! handler cannot stall the reader) or correlated with a pending outbound
//! request by id.
//!
//! Protocol-level failures (bad JSON, unknown methods, malformed shapes) never
//! tear the connection down; only transport errors and [`RpcConnection::stop`]
//! do.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::rc::Rc;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures::channel::mpsc::{self, UnboundedReceiver, UnboundedSender};
use futures::channel::oneshot;
use futures::future::LocalBoxFuture;
use futures::io::BufReader;
use futures::{
    select_biased, AsyncBufReadExt as _, AsyncRead, AsyncWrite, AsyncWriteExt as _, FutureExt as _,
    StreamExt as _,
};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::value::RawValue;

use crate::error::{Error, Result};
use crate::stream_broadcast::{
    StreamBroadcast, StreamMessageContent, StreamReceiver, StreamSender,
};

/// A JSON-RPC request id.
///
/// Ids are opaque: they are only ever compared for equality to correlate
/// responses. This connection allocates integer ids counting up from 0, but
/// accepts string and null ids from the peer.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RequestId {
    Number(i64),
    Str(Arc<str>),
    Null,
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestId::Number(n) => write!(f, "{n}"),
            RequestId::Str(s) => write!(f, "{s:?}"),
            RequestId::Null => write!(f, "null"),
        }
    }
}

/// A peer role: the method table for what this peer *receives*.
///
/// The two implementations, [`AgentSide`](crate::AgentSide) and
/// [`ClientSide`](crate::ClientSide), differ only in which methods they decode
/// and into which typed payloads.
pub trait Side: 'static {
    /// Decoded requests this side receives.
    type InRequest: fmt::Debug;
    /// Decoded notifications this side receives.
    type InNotification: fmt::Debug;
    /// Typed responses this side produces.
    type OutResponse: Serialize + fmt::Debug;

    /// Decodes `(method, params)` into a typed request.
    ///
    /// Unknown methods yield `method_not_found` unless prefixed with `_`, in
    /// which case the raw params pass through as an extension request.
    fn decode_request(method: &str, params: Option<&RawValue>) -> Result<Self::InRequest>;

    /// Decodes `(method, params)` into a typed notification, with the same
    /// unknown-method and extension rules as requests.
    fn decode_notification(method: &str, params: Option<&RawValue>)
        -> Result<Self::InNotification>;
}

/// The user handler a connection dispatches decoded inbound traffic to.
///
/// Implemented for free by every [`Agent`](crate::Agent) and
/// [`Client`](crate::Client) implementation.
pub trait MessageHandler<Local: Side> {
    fn handle_request(
        &self,
        request: Local::InRequest,
    ) -> impl Future<Output = Result<Local::OutResponse>>;

    fn handle_notification(
        &self,
        notification: Local::InNotification,
    ) -> impl Future<Output = Result<()>>;
}

/// A decoded inbound message on its way to the handler.
#[derive(Debug)]
enum IncomingMessage<Local: Side> {
    Request {
        id: RequestId,
        request: Local::InRequest,
    },
    Notification {
        notification: Local::InNotification,
    },
}

/// An outbound message, with its payload already serialized.
///
/// Serializing at the call site keeps this type free of the side generics and
/// hands the observer broadcast its raw-JSON copy for free.
#[derive(Debug)]
enum OutgoingMessage {
    Request {
        id: RequestId,
        method: Arc<str>,
        params: Option<Arc<RawValue>>,
    },
    Response {
        id: RequestId,
        result: Result<Arc<RawValue>>,
    },
    Notification {
        method: Arc<str>,
        params: Option<Arc<RawValue>>,
    },
}

impl OutgoingMessage {
    fn into_stream_content(self) -> StreamMessageContent {
        match self {
            OutgoingMessage::Request { id, method, params } => {
                StreamMessageContent::Request { id, method, params }
            }
            OutgoingMessage::Response { id, result } => StreamMessageContent::Response {
                id,
                result: result.map(Some),
            },
            OutgoingMessage::Notification { method, params } => {
                StreamMessageContent::Notification { method, params }
            }
        }
    }
}

impl Serialize for OutgoingMessage {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeMap;

        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("jsonrpc", "2.0")?;
        match self {
            OutgoingMessage::Request { id, method, params } => {
                map.serialize_entry("id", id)?;
                map.serialize_entry("method", method)?;
                if let Some(params) = params {
                    map.serialize_entry("params", params)?;
                }
            }
            // Responses carry exactly one of `result`/`error`, never `method`.
            OutgoingMessage::Response { id, result } => {
                map.serialize_entry("id", id)?;
                match result {
                    Ok(value) => map.serialize_entry("result", value)?,
                    Err(error) => map.serialize_entry("error", error)?,
                }
            }
            OutgoingMessage::Notification { method, params } => {
                map.serialize_entry("method", method)?;
                if let Some(params) = params {
                    map.serialize_entry("params", params)?;
                }
            }
        }
        map.end()
    }
}

/// The borrowed view of one inbound line, before classification.
#[derive(Debug, Deserialize)]
struct RawIncomingMessage<'a> {
    #[serde(borrow)]
    jsonrpc: Option<&'a str>,
    // `Option<RequestId>` on its own would fold `"id": null` into a missing
    // id, turning a null-id request into a notification. The indirection
    // keeps "absent" and "null" apart.
    #[serde(default, deserialize_with = "deserialize_present_id")]
    id: Option<RequestId>,
    #[serde(borrow)]
    method: Option<&'a str>,
    #[serde(borrow)]
    params: Option<&'a RawValue>,
    #[serde(borrow)]
    result: Option<&'a RawValue>,
    error: Option<Error>,
}

fn deserialize_present_id<'de, D>(deserializer: D) -> Result<Option<RequestId>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    RequestId::deserialize(deserializer).map(Some)
}

/// A parked `request()` caller: where to deliver the response and how to
/// decode it.
#[derive(Debug)]
struct PendingResponse {
    deserialize: fn(&RawValue) -> Result<Box<dyn Any>>,
    respond: oneshot::Sender<Result<Box<dyn Any>>>,
}

type PendingMap = Arc<Mutex<HashMap<RequestId, PendingResponse>>>;

/// One live connection: an id allocator, the pending-response table, the
/// outbound queue, and the observer broadcast.
#[derive(Debug)]
pub(crate) struct RpcConnection {
    outgoing_tx: UnboundedSender<OutgoingMessage>,
    pending: PendingMap,
    next_id: AtomicI64,
    request_timeout: Mutex<Option<Duration>>,
    broadcast: StreamBroadcast,
}

impl RpcConnection {
    /// Builds a connection over a duplex byte pair.
    ///
    /// The `side` marker selects the method table for inbound traffic.
    /// Returns the connection and the I/O future that runs it; the caller
    /// must spawn the future. `spawn` is used for per-message handler tasks.
    pub(crate) fn new<Local, Handler>(
        _side: Local,
        handler: Handler,
        outgoing_bytes: impl Unpin + AsyncWrite,
        incoming_bytes: impl Unpin + AsyncRead,
        spawn: impl Fn(LocalBoxFuture<'static, ()>) + 'static,
    ) -> (Self, impl Future<Output = Result<()>>)
    where
        Local: Side,
        Handler: MessageHandler<Local> + 'static,
    {
        let (incoming_tx, incoming_rx) = mpsc::unbounded::<IncomingMessage<Local>>();
        let (outgoing_tx, outgoing_rx) = mpsc::unbounded();
        let pending: PendingMap = Arc::default();
        let (broadcast_tx, broadcast) = StreamBroadcast::new();

        let io_task = {
            let pending = pending.clone();
            async move {
                let result = run_io(
                    incoming_tx,
                    outgoing_rx,
                    outgoing_bytes,
                    incoming_bytes,
                    pending.clone(),
                    broadcast_tx,
                )
                .await;
                // Whether we stopped, hit EOF, or failed to write: nobody is
                // going to answer the parked callers anymore.
                for (_, waiter) in pending.lock().unwrap().drain() {
                    waiter.respond.send(Err(Error::connection_closed())).ok();
                }
                result
            }
        };

        dispatch_incoming(outgoing_tx.clone(), incoming_rx, handler, spawn);

        let this = RpcConnection {
            outgoing_tx,
            pending,
            next_id: AtomicI64::new(0),
            request_timeout: Mutex::new(None),
            broadcast,
        };

        (this, io_task)
    }

    /// Registers an observer of every sent and received message.
    pub(crate) fn subscribe(&self) -> StreamReceiver {
        self.broadcast.receiver()
    }

    /// Applies a deadline to every subsequent [`request`](Self::request).
    ///
    /// Timed requests are raced against a tokio timer, so a deadline requires
    /// a tokio runtime context; `None` (the default) does not.
    pub(crate) fn set_request_timeout(&self, timeout: Option<Duration>) {
        *self.request_timeout.lock().unwrap() = timeout;
    }

    /// Stops the connection: the I/O loop drains, every pending request fails
    /// with a connection-closed error, and further sends are rejected.
    pub(crate) fn stop(&self) {
        self.outgoing_tx.close_channel();
    }

    /// Sends a fire-and-forget notification.
    pub(crate) fn notify<P: Serialize>(
        &self,
        method: impl Into<Arc<str>>,
        params: Option<&P>,
    ) -> Result<()> {
        let params = serialize_params(params)?;
        self.outgoing_tx
            .unbounded_send(OutgoingMessage::Notification {
                method: method.into(),
                params,
            })
            .map_err(|_| Error::connection_closed())
    }

    /// Sends a request and suspends the caller until the matching response
    /// arrives, the configured timeout elapses, or the connection closes.
    ///
    /// Concurrent calls are independent; responses are matched by id, so they
    /// may arrive in any order.
    pub(crate) fn request<Out>(
        &self,
        method: impl Into<Arc<str>>,
        params: Option<&impl Serialize>,
    ) -> impl Future<Output = Result<Out>>
    where
        Out: DeserializeOwned + 'static,
    {
        let timeout = *self.request_timeout.lock().unwrap();
        let setup = self.begin_request::<Out, _>(method.into(), params);
        let pending = self.pending.clone();
        async move {
            let (id, rx) = setup?;
            let response = match timeout {
                Some(timeout) => match tokio::time::timeout(timeout, rx).await {
                    Ok(response) => response,
                    Err(_) => {
                        // Evict the waiter so a late response is dropped with
                        // a log instead of waking a dead oneshot.
                        pending.lock().unwrap().remove(&id);
                        return Err(Error::request_timeout());
                    }
                },
                None => rx.await,
            };
            let response = response.map_err(|_| Error::connection_closed())??;
            let response = response
                .downcast::<Out>()
                .map_err(|_| Error::internal_error().data("response type confusion"))?;
            Ok(*response)
        }
    }

    /// Allocates an id, parks the waiter, and queues the request.
    fn begin_request<Out, P>(
        &self,
        method: Arc<str>,
        params: Option<&P>,
    ) -> Result<(RequestId, oneshot::Receiver<Result<Box<dyn Any>>>)>
    where
        Out: DeserializeOwned + 'static,
        P: Serialize,
    {
        let params = serialize_params(params)?;
        let id = RequestId::Number(self.next_id.fetch_add(1, Ordering::SeqCst));
        let (tx, rx) = oneshot::channel();
        self.pending.lock().unwrap().insert(
            id.clone(),
            PendingResponse {
                deserialize: |value| {
                    serde_json::from_str::<Out>(value.get())
                        .map(|out| Box::new(out) as Box<dyn Any>)
                        .map_err(|err| {
                            Error::internal_error()
                                .data(format!("failed to deserialize response: {err}"))
                        })
                },
                respond: tx,
            },
        );

        let queued = self.outgoing_tx.unbounded_send(OutgoingMessage::Request {
            id: id.clone(),
            method,
            params,
        });
        if queued.is_err() {
            self.pending.lock().unwrap().remove(&id);
            return Err(Error::connection_closed());
        }
        Ok((id, rx))
    }
}

/// Decodes the params of a recognized method, which must be present.
pub(crate) fn decode_params<T: DeserializeOwned>(params: Option<&RawValue>) -> Result<T> {
    let params = params.ok_or_else(Error::invalid_params)?;
    serde_json::from_str(params.get()).map_err(Into::into)
}

fn serialize_params<P: Serialize>(params: Option<&P>) -> Result<Option<Arc<RawValue>>> {
    params
        .map(serde_json::value::to_raw_value)
        .transpose()
        .map(|params| params.map(Arc::from))
        .map_err(Error::into_internal_error)
}

/// The single I/O loop: drains the outbound queue and reads inbound lines
/// until the queue closes, the reader hits EOF, or a write fails.
async fn run_io<Local: Side>(
    incoming_tx: UnboundedSender<IncomingMessage<Local>>,
    mut outgoing_rx: UnboundedReceiver<OutgoingMessage>,
    mut outgoing_bytes: impl Unpin + AsyncWrite,
    incoming_bytes: impl Unpin + AsyncRead,
    pending: PendingMap,
    broadcast: StreamSender,
) -> Result<()> {
    let mut reader = BufReader::new(incoming_bytes);
    let mut line = String::new();
    let mut write_buf = Vec::new();
    loop {
        select_biased! {
            message = outgoing_rx.next() => {
                let Some(message) = message else { break };
                write_message(&mut outgoing_bytes, &mut write_buf, &message).await?;
                broadcast.outgoing(message.into_stream_content());
            }
            bytes_read = reader.read_line(&mut line).fuse() => {
                if bytes_read.map_err(Error::into_internal_error)? == 0 {
                    break;
                }
                process_line(
                    line.trim_end_matches(['\n', '\r']),
                    &incoming_tx,
                    &pending,
                    &mut outgoing_bytes,
                    &mut write_buf,
                    &broadcast,
                )
                .await?;
                line.clear();
            }
        }
    }
    Ok(())
}

async fn write_message(
    out: &mut (impl Unpin + AsyncWrite),
    buf: &mut Vec<u8>,
    message: &OutgoingMessage,
) -> Result<()> {
    buf.clear();
    serde_json::to_writer(&mut *buf, message).map_err(Error::into_internal_error)?;
    log::trace!("send: {}", String::from_utf8_lossy(buf));
    buf.push(b'\n');
    out.write_all(buf).await.map_err(Error::into_internal_error)
}

/// Parses and classifies one inbound line.
///
/// Only transport failures (the error-response write path) propagate;
/// everything protocol-shaped is handled or logged here.
async fn process_line<Local: Side>(
    line: &str,
    incoming_tx: &UnboundedSender<IncomingMessage<Local>>,
    pending: &Mutex<HashMap<RequestId, PendingResponse>>,
    out: &mut (impl Unpin + AsyncWrite),
    write_buf: &mut Vec<u8>,
    broadcast: &StreamSender,
) -> Result<()> {
    log::trace!("recv: {line}");

    let message: RawIncomingMessage = match serde_json::from_str(line) {
        Ok(message) => message,
        Err(err) => {
            log::error!("failed to parse incoming message: {err}. Raw: {line}");
            return Ok(());
        }
    };

    // Absent `jsonrpc` is accepted leniently; a wrong value is not.
    if let Some(version) = message.jsonrpc {
        if version != "2.0" {
            log::error!("unsupported jsonrpc version {version:?}, dropping message");
            return Ok(());
        }
    }

    match (message.id, message.method) {
        (Some(id), Some(method)) => {
            // Request. Decode failures answer immediately on the original id.
            match Local::decode_request(method, message.params) {
                Ok(request) => {
                    broadcast.incoming(StreamMessageContent::Request {
                        id: id.clone(),
                        method: method.into(),
                        params: message.params.map(|p| Arc::from(p.to_owned())),
                    });
                    incoming_tx
                        .unbounded_send(IncomingMessage::Request { id, request })
                        .ok();
                }
                Err(error) => {
                    let response = OutgoingMessage::Response {
                        id,
                        result: Err(error),
                    };
                    write_message(out, write_buf, &response).await?;
                    broadcast.outgoing(response.into_stream_content());
                }
            }
        }
        (None, Some(method)) => {
            // Notification. No response channel, so decode failures only log.
            match Local::decode_notification(method, message.params) {
                Ok(notification) => {
                    broadcast.incoming(StreamMessageContent::Notification {
                        method: method.into(),
                        params: message.params.map(|p| Arc::from(p.to_owned())),
                    });
                    incoming_tx
                        .unbounded_send(IncomingMessage::Notification { notification })
                        .ok();
                }
                Err(err) => {
                    log::error!("failed to decode notification {method}: {err}");
                }
            }
        }
        (Some(id), None) => {
            // Response. Unknown ids (timed out or never issued) are dropped.
            let Some(waiter) = pending.lock().unwrap().remove(&id) else {
                log::error!("received response for unknown request id: {id}");
                return Ok(());
            };
            let result = if let Some(value) = message.result {
                broadcast.incoming(StreamMessageContent::Response {
                    id,
                    result: Ok(Some(Arc::from(value.to_owned()))),
                });
                (waiter.deserialize)(value)
            } else if let Some(error) = message.error {
                broadcast.incoming(StreamMessageContent::Response {
                    id,
                    result: Err(error.clone()),
                });
                Err(error)
            } else {
                let error = Error::invalid_request().data("response carries neither result nor error");
                broadcast.incoming(StreamMessageContent::Response {
                    id,
                    result: Err(error.clone()),
                });
                Err(error)
            };
            waiter.respond.send(result).ok();
        }
        (None, None) => {
            log::error!("received message with neither id nor method: {line}");
        }
    }
    Ok(())
}

/// Pulls decoded messages off the inbound queue and spawns one handler task
/// per message, emitting the response when the handler finishes.
fn dispatch_incoming<Local, Handler>(
    outgoing_tx: UnboundedSender<OutgoingMessage>,
    mut incoming_rx: UnboundedReceiver<IncomingMessage<Local>>,
    handler: Handler,
    spawn: impl Fn(LocalBoxFuture<'static, ()>) + 'static,
) where
    Local: Side,
    Handler: MessageHandler<Local> + 'static,
{
    let spawn = Rc::new(spawn);
    let handler = Rc::new(handler);
    spawn.clone()(
        async move {
            while let Some(message) = incoming_rx.next().await {
                match message {
                    IncomingMessage::Request { id, request } => {
                        let outgoing_tx = outgoing_tx.clone();
                        let handler = handler.clone();
                        spawn(
                            async move {
                                let result =
                                    handler.handle_request(request).await.and_then(|response| {
                                        serde_json::value::to_raw_value(&response)
                                            .map(Arc::from)
                                            .map_err(Error::into_internal_error)
                                    });
                                outgoing_tx
                                    .unbounded_send(OutgoingMessage::Response { id, result })
                                    .ok();
                            }
                            .boxed_local(),
                        );
                    }
                    IncomingMessage::Notification { notification } => {
                        let handler = handler.clone();
                        spawn(
                            async move {
                                if let Err(err) = handler.handle_notification(notification).await {
                                    log::error!("failed to handle notification: {err:?}");
                                }
                            }
                            .boxed_local(),
                        );
                    }
                }
            }
        }
        .boxed_local(),
    );
}

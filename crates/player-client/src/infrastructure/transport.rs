//! WebSocket transport to the remote host.
//!
//! # Connection lifecycle
//!
//! ```text
//!   Idle ──connect()──► Connecting ──open──► Open ──close/error──► Closed
//!                           ▲                                        │
//!                           └──── backoff delay (unexpected close) ──┘
//! ```
//!
//! Each `connect()` spawns one connection task.  The task dials, publishes
//! `Opened`, then pumps two directions inside a `tokio::select!` loop:
//!
//! - outgoing: JSON text produced by [`MessageSink::send`] arrives over an
//!   unbounded channel and is written to the socket;
//! - incoming: text frames are decoded with [`decode_message`] and published
//!   as `Message` events.  Frames that fail to decode are logged and dropped.
//!
//! When the socket closes, the task publishes `Closed` and consults the
//! reconnect policy.  A manual [`disconnect`](SessionTransport::disconnect)
//! or a peer close with code 1000 ends the task; anything else sleeps for
//! the backoff delay and dials again, until the attempt budget is spent.
//!
//! Every task carries the generation number it was started with.  A newer
//! `connect()` or a `disconnect()` bumps the generation, and a task that finds
//! itself outdated exits without touching shared state.

use std::sync::{Arc, Mutex, MutexGuard};

use futures_util::{SinkExt, StreamExt};
use player_core::domain::connection::{
    should_reconnect, ConnectionState, ReconnectBackoff, ReconnectPolicy, TransportEvent, MANUAL_CLOSE_REASON,
    NORMAL_CLOSURE,
};
use player_core::{decode_message, encode_message, MessageSink, OutboundMessage};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::application::fanout::EventFanout;
use crate::application::session::SessionTransport;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Close code and reason of a finished connection.
type CloseInfo = (Option<u16>, String);

#[derive(Debug)]
struct Shared {
    state: ConnectionState,
    manual_close: bool,
    backoff: ReconnectBackoff,
    generation: u64,
    /// Fresh for every dial; logged with everything the socket does.
    connection_id: Option<Uuid>,
    /// Present only while a socket is open.
    writer: Option<mpsc::UnboundedSender<WsMessage>>,
}

/// What the connection task does after a close.
enum AfterClose {
    Stop,
    Retry { attempt: u32, delay: std::time::Duration },
    GiveUp { attempts: u32 },
}

#[derive(Debug)]
struct Inner {
    url: String,
    events: EventFanout<TransportEvent>,
    shared: Mutex<Shared>,
}

/// The production [`SessionTransport`].
///
/// Cheap to clone; all clones drive the same connection.
#[derive(Debug, Clone)]
pub struct WsTransport {
    inner: Arc<Inner>,
}

impl WsTransport {
    pub fn new(url: impl Into<String>, policy: ReconnectPolicy) -> Self {
        Self {
            inner: Arc::new(Inner {
                url: url.into(),
                events: EventFanout::new(),
                shared: Mutex::new(Shared {
                    state: ConnectionState::Idle,
                    manual_close: false,
                    backoff: ReconnectBackoff::new(policy),
                    generation: 0,
                    connection_id: None,
                    writer: None,
                }),
            }),
        }
    }

    /// Registers a subscriber for transport events.
    pub fn subscribe(&self) -> mpsc::UnboundedReceiver<TransportEvent> {
        self.inner.events.subscribe()
    }

    pub fn url(&self) -> &str {
        &self.inner.url
    }

    /// Identifier of the socket currently being dialed or open.
    pub fn connection_id(&self) -> Option<Uuid> {
        self.inner.lock().connection_id
    }

    /// Reconnect attempts made since the last successful open.
    pub fn reconnect_attempts(&self) -> u32 {
        self.inner.lock().backoff.attempts()
    }
}

impl MessageSink for WsTransport {
    fn send(&self, message: &OutboundMessage) -> bool {
        let shared = self.inner.lock();
        let writer = match (&shared.state, &shared.writer) {
            (ConnectionState::Open, Some(writer)) => writer,
            _ => {
                debug!(kind = message.type_name(), state = %shared.state, "send dropped: not connected");
                return false;
            }
        };
        let text = match encode_message(message) {
            Ok(text) => text,
            Err(e) => {
                warn!(kind = message.type_name(), "failed to encode outbound message: {e}");
                return false;
            }
        };
        debug!(connection_id = ?shared.connection_id, kind = message.type_name(), "sending");
        writer.send(WsMessage::Text(text)).is_ok()
    }
}

impl SessionTransport for WsTransport {
    fn connect(&self) {
        let generation = {
            let mut shared = self.inner.lock();
            // Closing: the old socket must publish its Closed first.
            if matches!(shared.state, ConnectionState::Open | ConnectionState::Connecting | ConnectionState::Closing) {
                debug!(state = %shared.state, "connect ignored: already {}", shared.state);
                return;
            }
            shared.manual_close = false;
            shared.backoff.reset();
            shared.generation += 1;
            shared.state = ConnectionState::Connecting;
            shared.generation
        };
        info!(url = %self.inner.url, "connecting");
        tokio::spawn(Arc::clone(&self.inner).run(generation));
    }

    fn disconnect(&self) {
        let (published, connection_id) = {
            let mut shared = self.inner.lock();
            shared.manual_close = true;
            match shared.writer.clone() {
                Some(writer) => {
                    shared.state = ConnectionState::Closing;
                    let frame = CloseFrame { code: CloseCode::Normal, reason: MANUAL_CLOSE_REASON.into() };
                    if writer.send(WsMessage::Close(Some(frame))).is_err() {
                        debug!("close frame not queued: connection task already gone");
                    }
                    (false, shared.connection_id)
                }
                None => {
                    // Dialing or waiting for a retry: supersede that task.
                    let was_active = !matches!(shared.state, ConnectionState::Idle | ConnectionState::Closed);
                    shared.generation += 1;
                    shared.state = ConnectionState::Closed;
                    (was_active, shared.connection_id.take())
                }
            }
        };
        info!(connection_id = ?connection_id, "disconnect requested");
        if published {
            self.inner.events.publish(TransportEvent::Closed {
                code: Some(NORMAL_CLOSURE),
                reason: MANUAL_CLOSE_REASON.to_string(),
            });
        }
    }

    fn state(&self) -> ConnectionState {
        self.inner.lock().state
    }
}

impl Inner {
    fn lock(&self) -> MutexGuard<'_, Shared> {
        self.shared.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Connection task: dial, pump, and retry per the backoff policy.
    async fn run(self: Arc<Self>, generation: u64) {
        loop {
            let connection_id = Uuid::new_v4();
            {
                let mut shared = self.lock();
                if shared.generation != generation {
                    return;
                }
                shared.connection_id = Some(connection_id);
            }
            debug!(%connection_id, url = %self.url, "dialing");

            let closed = match connect_async(self.url.as_str()).await {
                Ok((stream, _response)) => self.pump(stream, generation, connection_id).await,
                Err(e) => {
                    if self.lock().generation != generation {
                        debug!(%connection_id, "dial superseded: {e}");
                        return;
                    }
                    warn!(%connection_id, url = %self.url, "connection failed: {e}");
                    self.events.publish(TransportEvent::Error(e.to_string()));
                    Some((None, e.to_string()))
                }
            };
            let Some((code, reason)) = closed else {
                return;
            };

            let next = {
                let mut shared = self.lock();
                if shared.generation != generation {
                    return;
                }
                shared.writer = None;
                shared.state = ConnectionState::Closed;
                if should_reconnect(shared.manual_close, code) {
                    match shared.backoff.next_attempt() {
                        Some((attempt, delay)) => AfterClose::Retry { attempt, delay },
                        None => AfterClose::GiveUp { attempts: shared.backoff.attempts() },
                    }
                } else {
                    AfterClose::Stop
                }
            };

            info!(%connection_id, ?code, %reason, "connection closed");
            self.events.publish(TransportEvent::Closed { code, reason });

            match next {
                AfterClose::Stop => return,
                AfterClose::GiveUp { attempts } => {
                    error!(%connection_id, attempts, "reconnect attempts exhausted");
                    self.events.publish(TransportEvent::ReconnectExhausted { attempts });
                    return;
                }
                AfterClose::Retry { attempt, delay } => {
                    info!(%connection_id, attempt, delay_ms = delay.as_millis() as u64, "reconnect scheduled");
                    self.events.publish(TransportEvent::ReconnectScheduled { attempt, delay });
                    tokio::time::sleep(delay).await;

                    let mut shared = self.lock();
                    if shared.manual_close || shared.generation != generation {
                        debug!(attempt, "reconnect cancelled");
                        return;
                    }
                    shared.state = ConnectionState::Connecting;
                }
            }
        }
    }

    /// Drives one open socket until it closes.
    ///
    /// Returns `None` when this task was superseded before the socket was
    /// registered.
    async fn pump(&self, stream: WsStream, generation: u64, connection_id: Uuid) -> Option<CloseInfo> {
        let (mut sink, mut source) = stream.split();
        let (tx, mut rx) = mpsc::unbounded_channel::<WsMessage>();

        {
            let mut shared = self.lock();
            if shared.generation != generation {
                debug!("connection superseded before it opened");
                return None;
            }
            shared.state = ConnectionState::Open;
            shared.writer = Some(tx);
            shared.backoff.reset();
        }
        info!(%connection_id, url = %self.url, "connected");
        self.events.publish(TransportEvent::Opened);

        let mut closed: CloseInfo = (None, String::new());
        loop {
            tokio::select! {
                outgoing = rx.recv() => {
                    let Some(message) = outgoing else { break };
                    if let Err(e) = sink.send(message).await {
                        warn!(%connection_id, "write failed: {e}");
                        self.events.publish(TransportEvent::Error(e.to_string()));
                        break;
                    }
                }

                incoming = source.next() => match incoming {
                    Some(Ok(WsMessage::Text(text))) => self.on_text(&text, connection_id),
                    Some(Ok(WsMessage::Binary(data))) => {
                        debug!(len = data.len(), "ignoring binary frame");
                    }
                    Some(Ok(WsMessage::Close(frame))) => {
                        if let Some(frame) = frame {
                            closed = (Some(u16::from(frame.code)), frame.reason.into_owned());
                        }
                        break;
                    }
                    // Ping/Pong replies are handled by tungstenite.
                    Some(Ok(WsMessage::Ping(_) | WsMessage::Pong(_) | WsMessage::Frame(_))) => {}
                    Some(Err(e)) => {
                        warn!(%connection_id, "read failed: {e}");
                        self.events.publish(TransportEvent::Error(e.to_string()));
                        break;
                    }
                    None => break,
                },
            }
        }

        // Flushes the close handshake reply if one is pending.
        let _ = sink.close().await;
        Some(closed)
    }

    fn on_text(&self, text: &str, connection_id: Uuid) {
        match decode_message(text) {
            Ok(message) => {
                debug!(%connection_id, kind = message.type_name(), "received");
                self.events.publish(TransportEvent::Message(message));
            }
            Err(e) => warn!(%connection_id, "dropping malformed message: {e}"),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

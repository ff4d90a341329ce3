/// Realtime transport client
///
/// One auto-reconnecting STOMP-over-WebSocket connection per mounted view.
/// The client authenticates at connect time with the bearer credential,
/// subscribes to the per-identity topic (everything in which the identity is
/// sender or receiver — conversation scoping happens downstream in the
/// reconciler), and pushes decoded messages into an unbounded channel. On
/// connection loss it retries with a fixed delay until explicitly torn down.
use crate::chat_types::{ChatMessage, ConnectionState};
use crate::config::ChatConfig;
use crate::session::{bearer_token, current_user_id, CredentialStore};
use crate::stomp::{self, StompFrame};
use futures_util::{SinkExt, StreamExt};
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::time::sleep;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tracing::{debug, info, warn};

/// Subscription id used for the single per-identity subscription
const SUBSCRIPTION_ID: &str = "sub-0";

/// Topic the broker delivers an identity's messages on
pub fn topic_for(user_id: u64) -> String {
    format!("/topic/messages/{}", user_id)
}

/// Everything needed to establish one broker connection
#[derive(Debug, Clone)]
pub struct TransportOptions {
    pub ws_url: String,
    pub token: String,
    pub user_id: u64,
    pub reconnect_delay: Duration,
}

impl TransportOptions {
    /// Resolve options from config + credential store. Returns None when the
    /// session has no credential or no parseable identity; identity is
    /// re-resolved on every call rather than cached across the session.
    pub fn resolve(config: &ChatConfig, store: &dyn CredentialStore) -> Option<Self> {
        let token = bearer_token(store)?;
        let user_id = current_user_id(store)?;
        Some(Self {
            ws_url: config.ws_url.clone(),
            token,
            user_id,
            reconnect_delay: config.reconnect_delay,
        })
    }
}

/// Handle over a running transport task. Dropping the handle does not stop the
/// task; call `disconnect` to tear down.
pub struct TransportHandle {
    state_rx: watch::Receiver<ConnectionState>,
    shutdown_tx: watch::Sender<bool>,
}

impl TransportHandle {
    /// Current connection state
    pub fn state(&self) -> ConnectionState {
        *self.state_rx.borrow()
    }

    /// Watch receiver for state transitions (display indicator)
    pub fn watch_state(&self) -> watch::Receiver<ConnectionState> {
        self.state_rx.clone()
    }

    /// Request teardown: unsubscribe, then deactivate, then stop retrying.
    /// Idempotent and safe on an already-inactive handle.
    pub fn disconnect(&self) {
        let _ = self.shutdown_tx.send(true);
    }
}

/// Auto-reconnecting broker client
pub struct RealtimeClient;

impl RealtimeClient {
    /// Spawn the connection task. Decoded inbound messages arrive on the
    /// returned channel; lifecycle is observed through the handle.
    pub fn connect(options: TransportOptions) -> (TransportHandle, mpsc::UnboundedReceiver<ChatMessage>) {
        let (state_tx, state_rx) = watch::channel(ConnectionState::Disconnected);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();

        tokio::spawn(run(options, state_tx, inbound_tx, shutdown_rx));

        (
            TransportHandle {
                state_rx,
                shutdown_tx,
            },
            inbound_rx,
        )
    }
}

enum SessionEnd {
    /// Caller asked for teardown; no retry
    Shutdown,
    /// Socket closed or protocol error; retry after the fixed delay
    Lost,
}

async fn run(
    options: TransportOptions,
    state_tx: watch::Sender<ConnectionState>,
    inbound_tx: mpsc::UnboundedSender<ChatMessage>,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    loop {
        if *shutdown_rx.borrow() {
            break;
        }

        let _ = state_tx.send(ConnectionState::Connecting);
        match serve_connection(&options, &state_tx, &inbound_tx, &mut shutdown_rx).await {
            SessionEnd::Shutdown => break,
            SessionEnd::Lost => {
                let _ = state_tx.send(ConnectionState::Disconnected);
            }
        }

        // Fixed retry delay, interruptible by teardown
        tokio::select! {
            _ = sleep(options.reconnect_delay) => {}
            changed = shutdown_rx.changed() => {
                if changed.is_err() || *shutdown_rx.borrow() {
                    break;
                }
            }
        }
    }

    let _ = state_tx.send(ConnectionState::Disconnected);
    debug!("transport task for user {} stopped", options.user_id);
}

async fn serve_connection(
    options: &TransportOptions,
    state_tx: &watch::Sender<ConnectionState>,
    inbound_tx: &mpsc::UnboundedSender<ChatMessage>,
    shutdown_rx: &mut watch::Receiver<bool>,
) -> SessionEnd {
    let ws_stream = tokio::select! {
        result = tokio_tungstenite::connect_async(&options.ws_url) => {
            match result {
                Ok((stream, _response)) => stream,
                Err(e) => {
                    warn!("broker connection to {} failed: {}", options.ws_url, e);
                    return SessionEnd::Lost;
                }
            }
        }
        changed = shutdown_rx.changed() => {
            // A dropped handle counts as teardown
            if changed.is_err() || *shutdown_rx.borrow() {
                return SessionEnd::Shutdown;
            }
            return SessionEnd::Lost;
        }
    };

    let (mut ws_tx, mut ws_rx) = ws_stream.split();

    let connect = StompFrame::connect(&options.token).serialize();
    if let Err(e) = ws_tx.send(WsMessage::Text(connect.into())).await {
        warn!("failed to send CONNECT: {}", e);
        return SessionEnd::Lost;
    }

    loop {
        let incoming = tokio::select! {
            msg = ws_rx.next() => msg,
            changed = shutdown_rx.changed() => {
                if changed.is_ok() && !*shutdown_rx.borrow() {
                    continue;
                }
                // Unsubscribe first, then deactivate; both best-effort
                let _ = ws_tx
                    .send(WsMessage::Text(StompFrame::unsubscribe(SUBSCRIPTION_ID).serialize().into()))
                    .await;
                let _ = ws_tx
                    .send(WsMessage::Text(StompFrame::disconnect().serialize().into()))
                    .await;
                let _ = ws_tx.close().await;
                return SessionEnd::Shutdown;
            }
        };

        let text = match incoming {
            Some(Ok(WsMessage::Text(text))) => text,
            Some(Ok(WsMessage::Ping(payload))) => {
                let _ = ws_tx.send(WsMessage::Pong(payload)).await;
                continue;
            }
            Some(Ok(WsMessage::Close(_))) | None => {
                debug!("broker closed the connection");
                return SessionEnd::Lost;
            }
            Some(Ok(_)) => continue,
            Some(Err(e)) => {
                warn!("websocket error: {}", e);
                return SessionEnd::Lost;
            }
        };

        let frame = match StompFrame::parse(&text) {
            Some(frame) => frame,
            None => continue, // heartbeat or garbage
        };

        match frame.command.as_str() {
            stomp::CMD_CONNECTED => {
                let _ = state_tx.send(ConnectionState::Connected);
                let topic = topic_for(options.user_id);
                info!("broker handshake ok, subscribing to {}", topic);
                let subscribe = StompFrame::subscribe(SUBSCRIPTION_ID, &topic).serialize();
                if let Err(e) = ws_tx.send(WsMessage::Text(subscribe.into())).await {
                    warn!("failed to send SUBSCRIBE: {}", e);
                    return SessionEnd::Lost;
                }
            }
            stomp::CMD_MESSAGE => {
                // Malformed bodies are dropped; they must never disturb state
                match serde_json::from_str::<ChatMessage>(&frame.body) {
                    Ok(message) => {
                        if inbound_tx.send(message).is_err() {
                            // Receiver gone: the owning view unmounted
                            return SessionEnd::Shutdown;
                        }
                    }
                    Err(e) => debug!("dropping malformed broker frame: {}", e),
                }
            }
            stomp::CMD_ERROR => {
                warn!(
                    "broker error frame: {}",
                    frame.get_header("message").unwrap_or(&frame.body)
                );
                return SessionEnd::Lost;
            }
            other => debug!("ignoring broker frame {}", other),
        }
    }
}

//! Typed event channel to the game server.
//!
//! [`ChannelClient`] owns the single connection. It spawns background
//! reader/writer tasks over any [`Transport`] and exposes typed ends: an
//! [`mpsc::UnboundedReceiver<ServerEvent>`] for inbound events (channel
//! close signals disconnect) and a non-blocking [`send`](ChannelClient::send)
//! for outbound intents. No business logic lives here.

use tokio::sync::mpsc;
use tracing::warn;

use crate::transport::{Transport, TransportError, TransportReader, TransportWriter, WsTransport};
use holdem_core::protocol::{ClientEvent, ServerEvent};

/// Decode a raw text frame into a [`ServerEvent`].
///
/// Empty frames return `None` silently. Frames that fail to decode — unknown
/// event names, missing payload fields, malformed action tokens — are
/// skipped and logged, never fatal: the previous client state stays intact
/// and the next well-formed event reconciles the view.
pub fn parse_server_frame(frame: &str) -> Option<ServerEvent> {
    let trimmed = frame.trim();
    if trimmed.is_empty() {
        return None;
    }
    match serde_json::from_str::<ServerEvent>(trimmed) {
        Ok(event) => Some(event),
        Err(err) => {
            warn!(%err, frame = trimmed, "skipping malformed server frame");
            None
        }
    }
}

/// The client end of the event channel.
pub struct ChannelClient {
    /// Inbound events, already decoded. Channel close = disconnected.
    pub incoming: mpsc::UnboundedReceiver<ServerEvent>,
    outgoing: mpsc::UnboundedSender<ClientEvent>,
}

impl ChannelClient {
    /// Build a channel client over any [`Transport`], spawning the
    /// background I/O tasks.
    pub fn from_transport<T: Transport>(transport: T) -> Self {
        let (reader, writer) = transport.split();

        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let (intent_tx, intent_rx) = mpsc::unbounded_channel::<ClientEvent>();

        Self::spawn_reader_task(reader, event_tx);
        Self::spawn_writer_task(writer, intent_rx);

        Self {
            incoming: event_rx,
            outgoing: intent_tx,
        }
    }

    /// Connect to a WebSocket server and spawn background I/O tasks.
    pub async fn connect_ws(url: &str) -> Result<Self, TransportError> {
        let transport = WsTransport::connect(url).await?;
        Ok(Self::from_transport(transport))
    }

    /// Enqueue an intent for transmission. Fire-and-forget: there is no
    /// delivery confirmation beyond the transport's own guarantees, and a
    /// closed connection is only observed through `incoming`.
    pub fn send(&self, event: ClientEvent) {
        let _ = self.outgoing.send(event);
    }

    fn spawn_reader_task<R: TransportReader>(
        mut reader: R,
        event_tx: mpsc::UnboundedSender<ServerEvent>,
    ) {
        tokio::spawn(async move {
            while let Ok(Some(frame)) = reader.recv().await {
                if let Some(event) = parse_server_frame(&frame)
                    && event_tx.send(event).is_err()
                {
                    break;
                }
            }
            // Connection closed or errored — dropping event_tx closes the
            // incoming channel, which the controller reports as disconnect.
        });
    }

    fn spawn_writer_task<W: TransportWriter>(
        mut writer: W,
        mut intent_rx: mpsc::UnboundedReceiver<ClientEvent>,
    ) {
        tokio::spawn(async move {
            while let Some(event) = intent_rx.recv().await {
                let json = match serde_json::to_string(&event) {
                    Ok(j) => j,
                    Err(_) => continue,
                };
                if writer.send(&json).await.is_err() {
                    break;
                }
            }
        });
    }
}

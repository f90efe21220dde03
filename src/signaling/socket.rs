//! Progress channel: one WebSocket leg of the call-progress protocol.
//!
//! Each socket spawns a reader task that decodes inbound text frames and
//! forwards them, tagged with the owning leg, onto the simulation's single
//! event channel. Sending stays with the socket handle, so the driving loop
//! can react to either leg while writing to both.

use anyhow::{Context, Result};
use futures::stream::{SplitSink, StreamExt};
use futures::SinkExt;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use super::handlers::Leg;
use super::message::ProgressMessage;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Grace period for the close handshake before the reader is aborted.
const CLOSE_GRACE: Duration = Duration::from_secs(2);

/// Something that happened on one leg's channel.
#[derive(Debug)]
pub enum LegEvent {
    /// One decoded inbound progress message.
    Message(Leg, ProgressMessage),
    /// A text frame that did not decode as a progress message.
    Malformed(Leg, String),
    /// The remote end closed the channel.
    Closed(Leg),
}

/// One open progress channel. Owns the write half; the read half lives in a
/// spawned reader task until `close` reaps it.
pub struct ProgressSocket {
    leg: Leg,
    sink: SplitSink<WsStream, Message>,
    reader: tokio::task::JoinHandle<()>,
}

impl ProgressSocket {
    /// Open the channel and start forwarding inbound messages onto `events`.
    pub async fn connect(url: &str, leg: Leg, events: mpsc::Sender<LegEvent>) -> Result<Self> {
        tracing::debug!(?leg, "connecting progress channel to {}", url);
        let (stream, response) = connect_async(url)
            .await
            .with_context(|| format!("WebSocket connection to {} failed", url))?;
        tracing::debug!(?leg, "progress channel open (status={})", response.status());

        let (sink, read) = stream.split();
        let reader = tokio::spawn(read_loop(leg, read, events));

        Ok(Self { leg, sink, reader })
    }

    /// Serialize and send one message on this leg.
    pub async fn send(&mut self, msg: &ProgressMessage) -> Result<()> {
        let text = serde_json::to_string(msg).context("failed to encode progress message")?;
        tracing::debug!(leg = ?self.leg, "WS send: {}", text);
        self.sink
            .send(Message::Text(text))
            .await
            .with_context(|| format!("send on {:?} progress channel failed", self.leg))
    }

    /// Graceful close: close handshake, then reap the reader task. The reader
    /// unblocks when the close completes; if the server never answers within
    /// the grace period it is aborted so teardown stays bounded.
    pub async fn close(mut self) {
        if let Err(e) = self.sink.send(Message::Close(None)).await {
            tracing::debug!(leg = ?self.leg, "close frame not sent: {:#}", e);
        }
        if tokio::time::timeout(CLOSE_GRACE, &mut self.reader).await.is_err() {
            tracing::debug!(leg = ?self.leg, "reader did not drain in time, aborting");
            self.reader.abort();
        }
    }
}

/// Read frames until the stream ends, forwarding each as a `LegEvent`.
///
/// Stops quietly if the simulation has already dropped its receiver.
async fn read_loop(
    leg: Leg,
    mut read: futures::stream::SplitStream<WsStream>,
    events: mpsc::Sender<LegEvent>,
) {
    while let Some(frame) = read.next().await {
        let event = match frame {
            Ok(Message::Text(text)) => {
                tracing::debug!(?leg, "WS recv: {}", text);
                match serde_json::from_str::<ProgressMessage>(&text) {
                    Ok(msg) => LegEvent::Message(leg, msg),
                    Err(e) => LegEvent::Malformed(leg, format!("{}: {}", e, text)),
                }
            }
            Ok(Message::Close(frame)) => {
                tracing::debug!(?leg, "WS closed: {:?}", frame);
                LegEvent::Closed(leg)
            }
            // Control frames; tungstenite answers pings itself.
            Ok(other) => {
                tracing::trace!(?leg, "WS frame (ignored): {:?}", other);
                continue;
            }
            Err(e) => {
                tracing::debug!(?leg, "WS receive error: {:#}", e);
                LegEvent::Closed(leg)
            }
        };
        let done = matches!(event, LegEvent::Closed(_));
        if events.send(event).await.is_err() || done {
            break;
        }
    }
}

//! WebSocket transport for the session.
//!
//! Provides [`ConnectedChannel`] which handles WebSocket I/O for the event
//! channel. This is a thin layer that just sends commands and receives
//! events - protocol logic remains in the Sans-IO [`Session`].
//!
//! The channel reconnects on its own after a drop, surfacing
//! [`ChannelEvent::Disconnected`] and [`ChannelEvent::Connected`] so the
//! caller can replay them into the session. Commands issued while the
//! channel is down are dropped, matching the session's send contract.
//!
//! [`Session`]: crate::Session

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use marketchat_proto::{ClientCommand, ServerEvent};
use thiserror::Error;
use tokio::{net::TcpStream, sync::mpsc};
use tokio_tungstenite::{
    MaybeTlsStream, WebSocketStream, connect_async, tungstenite::Message as WsMessage,
};
use tracing::warn;

/// Delay between reconnection attempts.
const RECONNECT_DELAY: Duration = Duration::from_secs(3);

/// Channel capacity in each direction.
const CHANNEL_CAPACITY: usize = 32;

/// Transport errors.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Connection failed.
    #[error("connection failed: {0}")]
    Connection(String),

    /// Stream error.
    #[error("stream error: {0}")]
    Stream(String),

    /// Protocol error.
    #[error("protocol error: {0}")]
    Protocol(String),
}

/// Connectivity and server events surfaced by the transport.
///
/// Maps one-to-one onto the session's channel-driven events.
#[derive(Debug, Clone)]
pub enum ChannelEvent {
    /// The channel (re)connected.
    Connected,
    /// The channel dropped; reconnection runs in the background.
    Disconnected,
    /// A decoded server event.
    Event(ServerEvent),
}

/// Handle to a connected event channel.
///
/// Provides channels for command/event transport. Commands are sent and
/// events received via the channels, and an internal task handles the
/// WebSocket I/O including reconnection.
pub struct ConnectedChannel {
    /// Send commands to the server.
    pub to_server: mpsc::Sender<ClientCommand>,
    /// Receive connectivity and server events.
    pub from_server: mpsc::Receiver<ChannelEvent>,
    /// Abort handle to stop the channel task.
    abort_handle: tokio::task::AbortHandle,
}

impl ConnectedChannel {
    /// Stop the channel, including any in-progress reconnection.
    pub fn stop(&self) {
        self.abort_handle.abort();
    }
}

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Connect to a chat server via WebSocket.
///
/// The first connection must succeed; afterwards the channel reconnects on
/// its own. Returns a [`ConnectedChannel`] with channels for transport.
/// The initial [`ChannelEvent::Connected`] is emitted through the channel.
pub async fn connect(url: &str) -> Result<ConnectedChannel, TransportError> {
    let url = url.to_string();
    let (stream, _response) = connect_async(url.as_str())
        .await
        .map_err(|e| TransportError::Connection(format!("connect failed: {e}")))?;

    let (to_server_tx, to_server_rx) = mpsc::channel::<ClientCommand>(CHANNEL_CAPACITY);
    let (from_server_tx, from_server_rx) = mpsc::channel::<ChannelEvent>(CHANNEL_CAPACITY);

    let handle = tokio::spawn(run_channel(url, stream, to_server_rx, from_server_tx));

    Ok(ConnectedChannel {
        to_server: to_server_tx,
        from_server: from_server_rx,
        abort_handle: handle.abort_handle(),
    })
}

/// Run the channel: bridge one connection at a time, reconnecting between.
async fn run_channel(
    url: String,
    initial: WsStream,
    mut to_server: mpsc::Receiver<ClientCommand>,
    from_server: mpsc::Sender<ChannelEvent>,
) {
    let mut stream = Some(initial);

    loop {
        if let Some(stream) = stream.take() {
            if from_server.send(ChannelEvent::Connected).await.is_err() {
                return;
            }
            run_connection(stream, &mut to_server, &from_server).await;
            if from_server.send(ChannelEvent::Disconnected).await.is_err() {
                return;
            }
        }

        // Discard commands issued while down rather than queueing them; the
        // session treats them as lost and their entries stay pending.
        let delay = tokio::time::sleep(RECONNECT_DELAY);
        tokio::pin!(delay);
        loop {
            tokio::select! {
                () = &mut delay => break,
                command = to_server.recv() => match command {
                    Some(command) => {
                        warn!(?command, "dropping command while disconnected");
                    },
                    None => return,
                },
            }
        }

        match connect_async(url.as_str()).await {
            Ok((reconnected, _response)) => stream = Some(reconnected),
            Err(e) => warn!("reconnect failed, retrying: {e}"),
        }
    }
}

/// Bridge a single connection until it drops or the caller hangs up.
async fn run_connection(
    stream: WsStream,
    to_server: &mut mpsc::Receiver<ClientCommand>,
    from_server: &mpsc::Sender<ChannelEvent>,
) {
    let (mut sink, mut source) = stream.split();

    loop {
        tokio::select! {
            command = to_server.recv() => {
                let Some(command) = command else { return };
                match command.encode() {
                    Ok(text) => {
                        if let Err(e) = sink.send(WsMessage::text(text)).await {
                            warn!("send failed: {e}");
                            return;
                        }
                    },
                    Err(e) => warn!("command encode failed: {e}"),
                }
            },
            frame = source.next() => match frame {
                Some(Ok(WsMessage::Text(text))) => match ServerEvent::decode(&text) {
                    Ok(event) => {
                        if from_server.send(ChannelEvent::Event(event)).await.is_err() {
                            return;
                        }
                    },
                    Err(e) => warn!("undecodable event: {e}"),
                },
                Some(Ok(WsMessage::Close(_))) | None => return,
                // Pings and pongs are answered by the library; binary frames
                // are not part of the protocol.
                Some(Ok(_)) => {},
                Some(Err(e)) => {
                    warn!("stream error: {e}");
                    return;
                },
            },
        }
    }
}

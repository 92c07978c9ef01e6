use std::error::Error;

use futures::stream::SplitSink;
use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use uuid::Uuid;

use crate::common::{NetworkCommand, NetworkEvent};

use super::wire::{self, Frame};

type WsSink = SplitSink<WebSocketStream<MaybeTlsStream<TcpStream>>, Message>;

/// Connection lifecycle of the event channel. Strictly linear: there is no
/// automatic reconnect, a dropped connection stops delivering events until
/// the application is restarted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
}

/// Owns the websocket towards the chat relay.
///
/// Talks to the UI exclusively through the two mpsc channels, so the UI side
/// never sees the socket itself and tests can feed `NetworkEvent`s directly.
pub struct SocketClient {
    event_sender: mpsc::Sender<NetworkEvent>,
    command_receiver: mpsc::Receiver<NetworkCommand>,
    server_url: String,
    state: ConnectionState,
}

impl SocketClient {
    pub fn new(
        event_sender: mpsc::Sender<NetworkEvent>,
        command_receiver: mpsc::Receiver<NetworkCommand>,
        server_url: String,
    ) -> Self {
        Self {
            event_sender,
            command_receiver,
            server_url,
            state: ConnectionState::Disconnected,
        }
    }

    pub async fn run(mut self) -> Result<(), Box<dyn Error>> {
        // Stay idle until the UI hands us an identity. Connecting before
        // login would register an empty name with the relay.
        let user_name = loop {
            match self.command_receiver.recv().await {
                Some(NetworkCommand::Register { name }) => break name,
                Some(other) => {
                    log::warn!("Dropping command issued before registration: {other:?}");
                }
                None => return Ok(()),
            }
        };

        self.state = ConnectionState::Connecting;
        log::info!("Connecting to {}", self.server_url);

        let ws = match connect_async(self.server_url.as_str()).await {
            Ok((ws, _response)) => ws,
            Err(err) => {
                self.state = ConnectionState::Disconnected;
                let _ = self
                    .event_sender
                    .send(NetworkEvent::ConnectionError(err.to_string()))
                    .await;
                return Err(err.into());
            }
        };

        let (mut sink, mut stream) = ws.split();

        // Register exactly once per connected transition.
        self.state = ConnectionState::Connected;
        let session_id = Uuid::new_v4().to_string();
        self.send_frame(
            &mut sink,
            &Frame::Register {
                name: user_name.clone(),
                session: session_id.clone(),
            },
        )
        .await;
        let _ = self
            .event_sender
            .send(NetworkEvent::Connected { session_id })
            .await;
        log::info!("Connected and registered as {user_name}");

        loop {
            tokio::select! {
                command = self.command_receiver.recv() => {
                    match command {
                        Some(command) => self.handle_command(command, &mut sink).await,
                        None => break,
                    }
                }
                incoming = stream.next() => {
                    match incoming {
                        Some(Ok(message)) => {
                            if !self.handle_message(message).await {
                                break;
                            }
                        }
                        Some(Err(err)) => {
                            log::error!("Websocket error: {err}");
                            let _ = self
                                .event_sender
                                .send(NetworkEvent::ConnectionError(err.to_string()))
                                .await;
                            break;
                        }
                        None => {
                            let _ = self.event_sender.send(NetworkEvent::Disconnected).await;
                            break;
                        }
                    }
                }
            }
        }

        self.state = ConnectionState::Disconnected;
        Ok(())
    }

    async fn handle_command(&mut self, command: NetworkCommand, sink: &mut WsSink) {
        match command {
            NetworkCommand::Register { name } => {
                if self.state == ConnectionState::Connected {
                    log::warn!("Ignoring duplicate registration for {name}");
                }
            }
            NetworkCommand::SendMessage(msg) => {
                if self.send_frame(sink, &Frame::PrivateMessage(msg.clone())).await {
                    // Echo the sent message back to the UI so the sender sees
                    // their own copy through the same inbound path.
                    if let Err(err) = self
                        .event_sender
                        .send(NetworkEvent::MessageReceived(msg))
                        .await
                    {
                        log::warn!("Failed to notify UI about self message: {err}");
                    }
                }
            }
            NetworkCommand::SetTyping(event) => {
                self.send_frame(sink, &Frame::TypingEvent(event)).await;
            }
        }
    }

    /// Returns false when the connection should be torn down.
    async fn handle_message(&mut self, message: Message) -> bool {
        match message {
            Message::Text(text) => {
                match wire::decode(&text) {
                    Ok(frame) => self.handle_frame(frame).await,
                    Err(err) => log::warn!("Dropping undecodable frame: {err}"),
                }
                true
            }
            Message::Close(_) => {
                let _ = self.event_sender.send(NetworkEvent::Disconnected).await;
                false
            }
            // Ping/pong are answered by tungstenite itself.
            _ => true,
        }
    }

    async fn handle_frame(&mut self, frame: Frame) {
        let event = match frame {
            Frame::RegistrationSuccessful(users) => NetworkEvent::Registered { users },
            Frame::PrivateMessage(msg) => NetworkEvent::MessageReceived(msg),
            Frame::TypingEvent(event) => NetworkEvent::TypingReceived(event),
            Frame::UserConnected(name) => NetworkEvent::UserConnected(name),
            Frame::UserDisconnected(name) => NetworkEvent::UserDisconnected(name),
            Frame::Register { name, .. } => {
                log::warn!("Relay sent a client-only register frame for {name}");
                return;
            }
        };

        if let Err(err) = self.event_sender.send(event).await {
            log::warn!("UI receiver dropped: {err}");
        }
    }

    /// Encode and send one frame; returns true on success.
    async fn send_frame(&mut self, sink: &mut WsSink, frame: &Frame) -> bool {
        let json = match wire::encode(frame) {
            Ok(json) => json,
            Err(err) => {
                log::warn!("Failed to serialize frame: {err}");
                return false;
            }
        };

        if let Err(err) = sink.send(Message::Text(json.into())).await {
            log::warn!("Failed to send frame: {err}");
            return false;
        }
        true
    }
}

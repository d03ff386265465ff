use super::{ReplyPath, provider::Transport};
use crate::event::TransportEvent;
use std::{
    io::ErrorKind,
    net::TcpStream,
    sync::mpsc::{self, TryRecvError},
    thread,
    time::{Duration, Instant},
};
use tungstenite::{Message, WebSocket, stream::MaybeTlsStream};

/// How long a socket read blocks before the thread checks for outgoing frames.
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Longest a per-answer connection may wait for the runner's close frame.
/// The stream thread is blocked meanwhile.
const REPLY_CLOSE_TIMEOUT: Duration = Duration::from_millis(250);

type Socket = WebSocket<MaybeTlsStream<TcpStream>>;

enum TransportCommand {
    Send(String),
    Close,
}

/// Websocket connection to the runner, driven from a background thread.
///
/// Inbound frames and connection state changes are forwarded over `events`;
/// outgoing frames are queued to the thread over an internal channel.
pub struct WebSocketTransport {
    endpoint: String,
    reply_path: ReplyPath,
    events: mpsc::Sender<TransportEvent>,
    commands: Option<mpsc::Sender<TransportCommand>>,
}

impl WebSocketTransport {
    pub fn new(
        endpoint: impl Into<String>,
        reply_path: ReplyPath,
        events: mpsc::Sender<TransportEvent>,
    ) -> Self {
        Self {
            endpoint: endpoint.into(),
            reply_path,
            events,
            commands: None,
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl Transport for WebSocketTransport {
    fn open(&mut self) -> anyhow::Result<()> {
        if self.commands.is_some() {
            anyhow::bail!("connection to {} already opened", self.endpoint);
        }
        let (tx, rx) = mpsc::channel();
        let endpoint = self.endpoint.clone();
        let reply_path = self.reply_path;
        let events = self.events.clone();
        thread::Builder::new()
            .name("semiauto-socket".to_string())
            .spawn(move || run_socket(&endpoint, reply_path, &rx, &events))?;
        self.commands = Some(tx);
        Ok(())
    }

    fn send(&mut self, payload: String) -> anyhow::Result<()> {
        let commands = self
            .commands
            .as_ref()
            .ok_or_else(|| anyhow::anyhow!("connection to {} is not open", self.endpoint))?;
        commands
            .send(TransportCommand::Send(payload))
            .map_err(|_| anyhow::anyhow!("connection to {} has ended", self.endpoint))
    }

    fn close(&mut self) {
        if let Some(commands) = self.commands.take() {
            let _ = commands.send(TransportCommand::Close);
        }
    }
}

fn run_socket(
    endpoint: &str,
    reply_path: ReplyPath,
    commands: &mpsc::Receiver<TransportCommand>,
    events: &mpsc::Sender<TransportEvent>,
) {
    let mut socket = match tungstenite::connect(endpoint) {
        Ok((socket, _response)) => socket,
        Err(e) => {
            log::warn!("connect to {endpoint} failed: {e}");
            let _ = events.send(TransportEvent::Closed {
                reason: Some(format!("Could not connect to {endpoint}: {e}")),
            });
            return;
        }
    };
    if let MaybeTlsStream::Plain(stream) = socket.get_mut()
        && let Err(e) = stream.set_read_timeout(Some(POLL_INTERVAL))
    {
        log::warn!("could not set read timeout: {e}");
    }
    log::info!("connected to {endpoint}");
    if events.send(TransportEvent::Opened).is_err() {
        return;
    }

    let reason = 'session: loop {
        loop {
            match commands.try_recv() {
                Ok(TransportCommand::Send(payload)) => {
                    if let Err(e) = deliver(&mut socket, endpoint, reply_path, payload) {
                        break 'session Some(e.to_string());
                    }
                }
                Ok(TransportCommand::Close) | Err(TryRecvError::Disconnected) => {
                    let _ = socket.close(None);
                    let _ = socket.flush();
                    break 'session None;
                }
                Err(TryRecvError::Empty) => break,
            }
        }

        match socket.read() {
            Ok(Message::Text(text)) => {
                if events.send(TransportEvent::Message(text.as_str().to_string())).is_err() {
                    break None;
                }
            }
            Ok(Message::Close(frame)) => {
                break frame
                    .map(|f| f.reason.as_str().to_string())
                    .filter(|reason| !reason.is_empty());
            }
            Ok(Message::Binary(_)) => log::warn!("ignoring binary frame from {endpoint}"),
            Ok(_) => {}
            Err(tungstenite::Error::Io(e))
                if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => {}
            Err(tungstenite::Error::ConnectionClosed | tungstenite::Error::AlreadyClosed) => {
                break None;
            }
            Err(e) => break Some(e.to_string()),
        }
    };

    log::info!("connection to {endpoint} ended");
    let _ = events.send(TransportEvent::Closed { reason });
}

fn deliver(
    socket: &mut Socket,
    endpoint: &str,
    reply_path: ReplyPath,
    payload: String,
) -> Result<(), tungstenite::Error> {
    match reply_path {
        ReplyPath::Persistent => socket.send(Message::text(payload)),
        ReplyPath::PerAnswer => send_once(endpoint, payload),
    }
}

/// Open a fresh connection, send a single frame and close it again.
fn send_once(endpoint: &str, payload: String) -> Result<(), tungstenite::Error> {
    let (mut socket, _response) = tungstenite::connect(endpoint)?;
    if let MaybeTlsStream::Plain(stream) = socket.get_mut()
        && let Err(e) = stream.set_read_timeout(Some(POLL_INTERVAL))
    {
        log::warn!("could not set reply read timeout: {e}");
    }
    socket.send(Message::text(payload))?;
    let _ = socket.close(None);

    // The frame is already written. Give the runner a moment to finish the
    // close handshake, then drop the connection regardless.
    let deadline = Instant::now() + REPLY_CLOSE_TIMEOUT;
    while Instant::now() < deadline {
        match socket.read() {
            Ok(_) => {}
            Err(tungstenite::Error::Io(e))
                if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => {}
            Err(_) => break,
        }
    }
    Ok(())
}

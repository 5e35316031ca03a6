#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Two-player session synchronization over TCP.
//!
//! The wire protocol is newline-delimited JSON: one [`Message`] per line with
//! a `type` tag, a free-form `data` payload, the sender's player id, and a
//! wall-clock timestamp. The host listens, admits a single guest as
//! `player2`, and relays traffic; both sides republish everything they
//! receive into an `mpsc` inbox the simulation drains on its own schedule.
//! Network failures surface as [`NetworkError`] values or inbox
//! notifications, never as panics.

use std::io::{BufRead, BufReader, Write};
use std::net::{SocketAddr, TcpListener, TcpStream, ToSocketAddrs};
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Maximum number of players in a session, host included.
pub const MAX_PLAYERS: usize = 2;

/// Connection attempts made before a join is reported as failed.
pub const RECONNECT_ATTEMPTS: u32 = 5;

/// Timeout applied to each connection attempt.
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

const RETRY_DELAY: Duration = Duration::from_secs(1);

const HOST_PLAYER_ID: &str = "player1";
const GUEST_PLAYER_ID: &str = "player2";

/// Failures surfaced by the networking layer.
#[derive(Debug, Error)]
pub enum NetworkError {
    /// Connecting to the host failed after every retry.
    #[error("connection failed after {attempts} attempts")]
    ConnectFailed {
        /// Number of attempts made before giving up.
        attempts: u32,
    },
    /// A received line was not a valid message.
    #[error("malformed message: {0}")]
    Malformed(String),
    /// The underlying socket operation failed.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Wire message type tags.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    /// A peer joined the session.
    Connect,
    /// A peer is leaving the session.
    Disconnect,
    /// The sender placed a tower.
    PlaceTower,
    /// The sender started the next wave.
    StartWave,
    /// The sender upgraded a tower.
    TowerUpgrade,
    /// The sender sold a tower.
    TowerSell,
    /// Free-form chat text.
    ChatMessage,
    /// Authoritative state snapshot for late joiners.
    SyncState,
    /// Keep-alive with no payload.
    Heartbeat,
}

/// One wire message. Encoded as a single JSON line.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Message type tag.
    #[serde(rename = "type")]
    pub kind: MessageKind,
    /// Payload whose shape depends on the message kind.
    #[serde(default)]
    pub data: serde_json::Value,
    /// Identifier of the sending player.
    pub player_id: String,
    /// Seconds since the Unix epoch at send time.
    pub timestamp: f64,
}

impl Message {
    /// Creates a message stamped with the current wall-clock time.
    #[must_use]
    pub fn new(kind: MessageKind, data: serde_json::Value, player_id: &str) -> Self {
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_secs_f64())
            .unwrap_or(0.0);
        Self {
            kind,
            data,
            player_id: player_id.to_owned(),
            timestamp,
        }
    }
}

/// Encodes a message as one newline-terminated JSON line.
pub fn encode(message: &Message) -> Result<String, NetworkError> {
    let mut line = serde_json::to_string(message)
        .map_err(|error| NetworkError::Malformed(error.to_string()))?;
    line.push('\n');
    Ok(line)
}

/// Decodes a message from a single line.
pub fn decode(line: &str) -> Result<Message, NetworkError> {
    serde_json::from_str(line).map_err(|error| NetworkError::Malformed(error.to_string()))
}

/// Notifications published into the session inbox.
#[derive(Debug)]
pub enum NetworkNotification {
    /// A peer completed its TCP connection.
    PeerConnected {
        /// Identifier assigned to the peer.
        player_id: String,
    },
    /// A peer's connection closed or failed.
    PeerDisconnected {
        /// Identifier of the departed peer.
        player_id: String,
    },
    /// A message arrived from a peer.
    MessageReceived(Message),
    /// A line arrived that could not be decoded.
    Malformed(String),
}

struct PeerHandle {
    player_id: String,
    stream: TcpStream,
}

type SharedPeers = Arc<Mutex<Vec<PeerHandle>>>;

fn lock_peers(peers: &SharedPeers) -> MutexGuard<'_, Vec<PeerHandle>> {
    peers.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Live two-player session, either hosting or joined.
///
/// Reader threads run in the background and push everything they see into
/// the inbox; dropping the session closes the inbox and the readers exit on
/// the next socket event.
pub struct NetworkSession {
    local_id: String,
    peers: SharedPeers,
    inbox: Receiver<NetworkNotification>,
    local_addr: Option<SocketAddr>,
}

impl NetworkSession {
    /// Binds a listener and starts accepting a single guest.
    pub fn host<A: ToSocketAddrs>(addr: A) -> Result<Self, NetworkError> {
        let listener = TcpListener::bind(addr)?;
        let local_addr = listener.local_addr().ok();
        let peers: SharedPeers = Arc::new(Mutex::new(Vec::new()));
        let (tx, rx) = channel();

        let accept_peers = Arc::clone(&peers);
        let accept_tx = tx.clone();
        let _accept_thread = thread::spawn(move || {
            accept_loop(&listener, &accept_peers, &accept_tx);
        });

        tracing::info!(?local_addr, "session hosted");
        Ok(Self {
            local_id: HOST_PLAYER_ID.to_owned(),
            peers,
            inbox: rx,
            local_addr,
        })
    }

    /// Connects to a host, retrying up to [`RECONNECT_ATTEMPTS`] times.
    pub fn join<A: ToSocketAddrs>(addr: A) -> Result<Self, NetworkError> {
        let candidates: Vec<SocketAddr> = addr.to_socket_addrs()?.collect();
        let mut stream = None;
        for attempt in 1..=RECONNECT_ATTEMPTS {
            for candidate in &candidates {
                match TcpStream::connect_timeout(candidate, CONNECT_TIMEOUT) {
                    Ok(connected) => {
                        stream = Some(connected);
                        break;
                    }
                    Err(error) => {
                        tracing::warn!(%candidate, attempt, %error, "connection attempt failed");
                    }
                }
            }
            if stream.is_some() {
                break;
            }
            if attempt < RECONNECT_ATTEMPTS {
                thread::sleep(RETRY_DELAY);
            }
        }
        let Some(stream) = stream else {
            return Err(NetworkError::ConnectFailed {
                attempts: RECONNECT_ATTEMPTS,
            });
        };

        let peers: SharedPeers = Arc::new(Mutex::new(Vec::new()));
        let (tx, rx) = channel();
        let reader_stream = stream.try_clone()?;
        lock_peers(&peers).push(PeerHandle {
            player_id: HOST_PLAYER_ID.to_owned(),
            stream,
        });

        let reader_peers = Arc::clone(&peers);
        let _reader_thread = thread::spawn(move || {
            reader_loop(
                reader_stream,
                HOST_PLAYER_ID.to_owned(),
                &reader_peers,
                &tx,
                false,
            );
        });

        let session = Self {
            local_id: GUEST_PLAYER_ID.to_owned(),
            peers,
            inbox: rx,
            local_addr: None,
        };
        session.broadcast(&Message::new(
            MessageKind::Connect,
            serde_json::Value::Null,
            &session.local_id,
        ))?;
        tracing::info!(player_id = %session.local_id, "joined session");
        Ok(session)
    }

    /// Identifier of the local player (`player1` hosts, `player2` joins).
    #[must_use]
    pub fn local_id(&self) -> &str {
        &self.local_id
    }

    /// Address the host listener is bound to, for tests and logs.
    #[must_use]
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.local_addr
    }

    /// Sends a message to every connected peer.
    pub fn broadcast(&self, message: &Message) -> Result<(), NetworkError> {
        let line = encode(message)?;
        let mut guard = lock_peers(&self.peers);
        for peer in guard.iter_mut() {
            peer.stream.write_all(line.as_bytes())?;
            peer.stream.flush()?;
        }
        Ok(())
    }

    /// Pops the next pending notification without blocking.
    #[must_use]
    pub fn poll(&self) -> Option<NetworkNotification> {
        self.inbox.try_recv().ok()
    }

    /// Waits up to `timeout` for the next notification.
    #[must_use]
    pub fn recv_timeout(&self, timeout: Duration) -> Option<NetworkNotification> {
        self.inbox.recv_timeout(timeout).ok()
    }
}

fn accept_loop(listener: &TcpListener, peers: &SharedPeers, inbox: &Sender<NetworkNotification>) {
    for incoming in listener.incoming() {
        let stream = match incoming {
            Ok(stream) => stream,
            Err(error) => {
                tracing::warn!(%error, "accept failed");
                continue;
            }
        };

        if lock_peers(peers).len() + 1 >= MAX_PLAYERS {
            // Session full; refuse silently by dropping the connection.
            tracing::warn!("rejected connection, session full");
            continue;
        }

        let player_id = GUEST_PLAYER_ID.to_owned();
        let reader_stream = match stream.try_clone() {
            Ok(clone) => clone,
            Err(error) => {
                tracing::warn!(%error, "failed to clone peer stream");
                continue;
            }
        };
        lock_peers(peers).push(PeerHandle {
            player_id: player_id.clone(),
            stream,
        });
        if inbox
            .send(NetworkNotification::PeerConnected {
                player_id: player_id.clone(),
            })
            .is_err()
        {
            return;
        }
        tracing::info!(%player_id, "peer connected");

        let reader_peers = Arc::clone(peers);
        let reader_inbox = inbox.clone();
        let _reader_thread = thread::spawn(move || {
            reader_loop(reader_stream, player_id, &reader_peers, &reader_inbox, true);
        });
    }
}

fn reader_loop(
    stream: TcpStream,
    player_id: String,
    peers: &SharedPeers,
    inbox: &Sender<NetworkNotification>,
    relay: bool,
) {
    let reader = BufReader::new(stream);
    for line in reader.lines() {
        let Ok(line) = line else { break };
        if line.trim().is_empty() {
            continue;
        }
        match decode(&line) {
            Ok(message) => {
                if relay {
                    relay_to_others(peers, &player_id, &line);
                }
                if inbox
                    .send(NetworkNotification::MessageReceived(message))
                    .is_err()
                {
                    return;
                }
            }
            Err(error) => {
                tracing::warn!(%player_id, %error, "dropping malformed line");
                if inbox
                    .send(NetworkNotification::Malformed(error.to_string()))
                    .is_err()
                {
                    return;
                }
            }
        }
    }

    lock_peers(peers).retain(|peer| peer.player_id != player_id);
    tracing::info!(%player_id, "peer disconnected");
    let _ = inbox.send(NetworkNotification::PeerDisconnected { player_id });
}

fn relay_to_others(peers: &SharedPeers, sender: &str, line: &str) {
    let mut guard = lock_peers(peers);
    for peer in guard.iter_mut() {
        if peer.player_id == sender {
            continue;
        }
        if let Err(error) = peer
            .stream
            .write_all(line.as_bytes())
            .and_then(|()| peer.stream.write_all(b"\n"))
            .and_then(|()| peer.stream.flush())
        {
            tracing::warn!(player_id = %peer.player_id, %error, "relay failed");
        }
    }
}

//! In-process realtime server
//!
//! Speaks the same packets as the service's Socket.IO endpoint, with knobs
//! for refusing and dropping connections.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use harvest_client::notification::{ChannelConnector, ChannelTransport};
use harvest_client::{ClientError, ClientResult};
use parking_lot::Mutex;
use shared::error::{AppError, ErrorCode};
use shared::message::{ChannelEvent, Handshake, Packet};
use shared::models::Notification;
use tokio::sync::mpsc;

fn channel_error(message: impl Into<String>) -> ClientError {
    AppError::with_message(ErrorCode::ChannelDisconnected, message).into()
}


struct HubConnection {
    tx: mpsc::UnboundedSender<Packet>,
    user_id: Option<String>,
}

#[derive(Default)]
struct HubState {
    next_id: u64,
    connections: HashMap<u64, HubConnection>,
    attempts: u32,
    refuse_next: u32,
    refuse_all: bool,
}

/// In-process realtime server
#[derive(Clone, Default)]
pub struct MemoryHub {
    state: Arc<Mutex<HubState>>,
}

impl MemoryHub {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn connector(&self) -> MemoryConnector {
        MemoryConnector { hub: self.clone() }
    }

    /// Refuse the next `n` connection attempts
    pub fn refuse_connections(&self, n: u32) {
        self.state.lock().refuse_next = n;
    }

    /// Refuse every connection attempt until turned off
    pub fn refuse_all(&self, refuse: bool) {
        self.state.lock().refuse_all = refuse;
    }

    /// Connection attempts seen so far, refused ones included
    pub fn connection_attempts(&self) -> u32 {
        self.state.lock().attempts
    }

    pub fn active_connections(&self) -> usize {
        self.state.lock().connections.len()
    }

    /// Users that joined their room on a live connection
    pub fn joined_users(&self) -> Vec<String> {
        let mut users: Vec<String> = self
            .state
            .lock()
            .connections
            .values()
            .filter_map(|c| c.user_id.clone())
            .collect();
        users.sort();
        users
    }

    /// Close every live connection from the server side
    pub fn drop_all_connections(&self) {
        self.state.lock().connections.clear();
    }

    /// Ping every live connection
    pub fn ping_all(&self) {
        for c in self.state.lock().connections.values() {
            let _ = c.tx.send(Packet::Ping);
        }
    }

    /// Emit `notification` to the user's room; returns the number of receivers
    pub fn emit_to_user(&self, user_id: &str, notification: &Notification) -> usize {
        let event = match ChannelEvent::notification(notification) {
            Ok(event) => event,
            Err(e) => {
                tracing::warn!("Failed to encode notification: {}", e);
                return 0;
            }
        };
        self.state
            .lock()
            .connections
            .values()
            .filter(|c| c.user_id.as_deref() == Some(user_id))
            .filter(|c| c.tx.send(Packet::Event(event.clone())).is_ok())
            .count()
    }

    fn open(&self) -> ClientResult<MemoryTransport> {
        let mut state = self.state.lock();
        state.attempts += 1;
        if state.refuse_all || state.refuse_next > 0 {
            state.refuse_next = state.refuse_next.saturating_sub(1);
            return Err(channel_error("Connection refused"));
        }

        state.next_id += 1;
        let id = state.next_id;
        let (tx, rx) = mpsc::unbounded_channel();
        let _ = tx.send(Packet::Open(Handshake {
            sid: format!("sid-{}", id),
            upgrades: vec![],
            ping_interval: 25_000,
            ping_timeout: 20_000,
        }));
        state
            .connections
            .insert(id, HubConnection { tx, user_id: None });
        Ok(MemoryTransport {
            id,
            rx,
            hub: self.clone(),
        })
    }

    fn handle(&self, id: u64, packet: Packet) {
        let mut state = self.state.lock();
        match packet {
            Packet::Connect(_) => {
                if let Some(c) = state.connections.get(&id) {
                    let _ = c.tx.send(Packet::Connect(Some(
                        serde_json::json!({ "sid": format!("ns-{}", id) }),
                    )));
                }
            }
            Packet::Event(event) => {
                if let Some(user_id) = event.joined_user()
                    && let Some(c) = state.connections.get_mut(&id)
                {
                    c.user_id = Some(user_id.to_string());
                }
            }
            Packet::Disconnect | Packet::Close => {
                state.connections.remove(&id);
            }
            _ => {}
        }
    }
}

#[derive(Clone)]
pub struct MemoryConnector {
    hub: MemoryHub,
}

#[async_trait]
impl ChannelConnector for MemoryConnector {
    async fn connect(&self) -> ClientResult<Box<dyn ChannelTransport>> {
        Ok(Box::new(self.hub.open()?))
    }
}

pub struct MemoryTransport {
    id: u64,
    rx: mpsc::UnboundedReceiver<Packet>,
    hub: MemoryHub,
}

#[async_trait]
impl ChannelTransport for MemoryTransport {
    async fn send(&mut self, packet: Packet) -> ClientResult<()> {
        if !self.hub.state.lock().connections.contains_key(&self.id) {
            return Err(channel_error("Connection closed"));
        }
        self.hub.handle(self.id, packet);
        Ok(())
    }

    async fn recv(&mut self) -> Option<ClientResult<Packet>> {
        self.rx.recv().await.map(Ok)
    }

    async fn close(&mut self) -> ClientResult<()> {
        self.hub.state.lock().connections.remove(&self.id);
        Ok(())
    }
}

//! Notification Channel
//!
//! One realtime connection per signed-in user. After connecting the channel
//! joins the user's room and fans every `notification` event out to the
//! registered listeners. Dropped connections are retried with a fixed delay a
//! bounded number of times; after that the channel stays down until the
//! session changes.

mod listeners;
mod transport;

pub use listeners::ListenerHandle;
pub use transport::{ChannelConnector, ChannelTransport, WsConnector, WsTransport};

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use shared::message::{ChannelEvent, Packet};
use shared::models::Notification;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::config::NotificationConfig;
use crate::session::SessionContext;
use crate::ClientResult;
use listeners::ListenerSet;
use transport::channel_error;

/// Handshake must finish within this window
const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(10);

/// Connection state, observable through [`NotificationChannel::state`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelState {
    Disconnected,
    Connecting,
    Connected,
    /// Waiting before reconnection attempt `attempt` (1-based)
    Reconnecting { attempt: u32 },
    /// Attempts used up; stays here until the next connect
    Exhausted,
}

struct Running {
    user_id: String,
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

struct Inner {
    connector: Arc<dyn ChannelConnector>,
    config: NotificationConfig,
    listeners: ListenerSet,
    state_tx: watch::Sender<ChannelState>,
    /// Bumped on every connect/disconnect; stale workers stop publishing
    generation: AtomicU64,
    running: Mutex<Option<Running>>,
}

impl Inner {
    fn set_state(&self, generation: u64, state: ChannelState) {
        if self.generation.load(Ordering::Acquire) == generation {
            self.state_tx.send_replace(state);
        }
    }
}

#[derive(Clone)]
pub struct NotificationChannel {
    inner: Arc<Inner>,
}

impl NotificationChannel {
    pub fn new(connector: Arc<dyn ChannelConnector>, config: NotificationConfig) -> Self {
        let (state_tx, _) = watch::channel(ChannelState::Disconnected);
        Self {
            inner: Arc::new(Inner {
                connector,
                config,
                listeners: ListenerSet::default(),
                state_tx,
                generation: AtomicU64::new(0),
                running: Mutex::new(None),
            }),
        }
    }

    /// Register a listener for every inbound notification
    pub fn on_notification<F>(&self, listener: F) -> ListenerHandle
    where
        F: Fn(&Notification) + Send + Sync + 'static,
    {
        self.inner.listeners.add(Arc::new(listener))
    }

    /// Unregister; a dispatch in progress skips the listener unless it is already running it
    pub fn off_notification(&self, handle: ListenerHandle) -> bool {
        self.inner.listeners.remove(handle)
    }

    pub fn listener_count(&self) -> usize {
        self.inner.listeners.len()
    }

    pub fn state(&self) -> watch::Receiver<ChannelState> {
        self.inner.state_tx.subscribe()
    }

    pub fn current_state(&self) -> ChannelState {
        *self.inner.state_tx.borrow()
    }

    /// User the channel is bound to, if any
    pub fn user_id(&self) -> Option<String> {
        self.inner.running.lock().as_ref().map(|r| r.user_id.clone())
    }

    /// Bind the channel to `user_id`, replacing any previous connection
    ///
    /// Must be called within a Tokio runtime.
    pub fn connect(&self, user_id: &str) {
        let generation = self.inner.generation.fetch_add(1, Ordering::AcqRel) + 1;
        let cancel = CancellationToken::new();
        self.inner.set_state(generation, ChannelState::Connecting);

        let worker = Worker {
            inner: self.inner.clone(),
            user_id: user_id.to_string(),
            generation,
            cancel: cancel.clone(),
        };
        let handle = tokio::spawn(worker.run());

        let previous = self.inner.running.lock().replace(Running {
            user_id: user_id.to_string(),
            cancel,
            handle,
        });
        if let Some(previous) = previous {
            previous.cancel.cancel();
        }
        tracing::info!(user_id = %user_id, "Notification channel connecting");
    }

    /// Close the connection and stop reconnecting
    pub async fn disconnect(&self) {
        let generation = self.inner.generation.fetch_add(1, Ordering::AcqRel) + 1;
        let running = self.inner.running.lock().take();
        if let Some(running) = running {
            running.cancel.cancel();
            if let Err(e) = running.handle.await {
                tracing::warn!("Notification worker ended abnormally: {}", e);
            }
            tracing::info!(user_id = %running.user_id, "Notification channel disconnected");
        }
        self.inner.set_state(generation, ChannelState::Disconnected);
    }

    /// Follow the session: connect on sign-in, disconnect on sign-out
    ///
    /// The returned task ends when every handle to the session is gone.
    pub fn follow_session(&self, session: &SessionContext) -> JoinHandle<()> {
        let channel = self.clone();
        let mut users = session.watch();
        tokio::spawn(async move {
            loop {
                let user_id = users.borrow_and_update().clone();
                match user_id {
                    Some(id) => {
                        if channel.user_id().as_deref() != Some(id.as_str())
                            || channel.current_state() == ChannelState::Disconnected
                        {
                            channel.connect(&id);
                        }
                    }
                    None => channel.disconnect().await,
                }
                if users.changed().await.is_err() {
                    break;
                }
            }
            channel.disconnect().await;
        })
    }
}

/// Background connection loop for one binding
struct Worker {
    inner: Arc<Inner>,
    user_id: String,
    generation: u64,
    cancel: CancellationToken,
}

enum SessionEnd {
    Cancelled,
    Dropped,
}

impl Worker {
    async fn run(self) {
        let max_attempts = self.inner.config.max_reconnect_attempts;
        let delay = self.inner.config.reconnect_delay;
        let mut failures: u32 = 0;

        loop {
            let opened = tokio::select! {
                _ = self.cancel.cancelled() => return,
                opened = self.open() => opened,
            };

            match opened {
                Ok(mut transport) => {
                    failures = 0;
                    self.set_state(ChannelState::Connected);
                    tracing::info!(user_id = %self.user_id, "Notification channel connected");
                    match self.pump(transport.as_mut()).await {
                        SessionEnd::Cancelled => {
                            let _ = transport.send(Packet::Disconnect).await;
                            let _ = transport.close().await;
                            return;
                        }
                        SessionEnd::Dropped => {
                            tracing::warn!(user_id = %self.user_id, "Notification channel dropped");
                        }
                    }
                }
                Err(e) => {
                    tracing::warn!(
                        user_id = %self.user_id,
                        attempt = failures,
                        "Notification channel connect failed: {}",
                        e
                    );
                }
            }

            failures += 1;
            if failures > max_attempts {
                tracing::warn!(
                    user_id = %self.user_id,
                    attempts = max_attempts,
                    "Notification channel reconnection attempts exhausted"
                );
                self.set_state(ChannelState::Exhausted);
                return;
            }

            self.set_state(ChannelState::Reconnecting { attempt: failures });
            tokio::select! {
                _ = self.cancel.cancelled() => return,
                _ = tokio::time::sleep(delay) => {}
            }
        }
    }

    fn set_state(&self, state: ChannelState) {
        self.inner.set_state(self.generation, state);
    }

    /// Connect, complete the Socket.IO handshake and join the user's room
    async fn open(&self) -> ClientResult<Box<dyn ChannelTransport>> {
        let mut transport = self.inner.connector.connect().await?;
        tokio::time::timeout(HANDSHAKE_TIMEOUT, handshake(transport.as_mut()))
            .await
            .map_err(|_| channel_error("Handshake timed out"))??;
        transport
            .send(Packet::Event(ChannelEvent::join_user_room(&self.user_id)))
            .await?;
        Ok(transport)
    }

    async fn pump(&self, transport: &mut dyn ChannelTransport) -> SessionEnd {
        loop {
            let packet = tokio::select! {
                _ = self.cancel.cancelled() => return SessionEnd::Cancelled,
                packet = transport.recv() => packet,
            };
            match packet {
                None => return SessionEnd::Dropped,
                Some(Err(e)) => {
                    tracing::warn!("Notification channel error: {}", e);
                    return SessionEnd::Dropped;
                }
                Some(Ok(Packet::Event(event))) => self.deliver(&event),
                Some(Ok(Packet::Ping)) => {
                    if transport.send(Packet::Pong).await.is_err() {
                        return SessionEnd::Dropped;
                    }
                }
                Some(Ok(Packet::Disconnect | Packet::Close)) => return SessionEnd::Dropped,
                Some(Ok(_)) => {}
            }
        }
    }

    fn deliver(&self, event: &ChannelEvent) {
        match event.parse_notification() {
            Some(Ok(notification)) => {
                let delivered = self.inner.listeners.dispatch(&notification);
                tracing::debug!(
                    kind = %notification.kind,
                    listeners = delivered,
                    "Notification delivered"
                );
            }
            Some(Err(e)) => tracing::warn!("Malformed notification payload: {}", e),
            None => tracing::debug!(event = %event.name, "Ignoring channel event"),
        }
    }
}

/// Engine.IO open, then Socket.IO namespace connect
async fn handshake(transport: &mut dyn ChannelTransport) -> ClientResult<()> {
    loop {
        match transport.recv().await {
            None => return Err(channel_error("Connection closed during handshake")),
            Some(Err(e)) => return Err(e),
            Some(Ok(Packet::Open(h))) => {
                tracing::debug!(sid = %h.sid, "Engine.IO session opened");
                transport.send(Packet::Connect(None)).await?;
            }
            Some(Ok(Packet::Connect(_))) => return Ok(()),
            Some(Ok(Packet::ConnectError(body))) => {
                return Err(channel_error(format!("Connect rejected: {}", body)));
            }
            Some(Ok(Packet::Ping)) => transport.send(Packet::Pong).await?,
            Some(Ok(Packet::Close | Packet::Disconnect)) => {
                return Err(channel_error("Connection closed during handshake"));
            }
            Some(Ok(_)) => {}
        }
    }
}

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::time::Duration;

use futures::FutureExt;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::config::ListenerConfig;
use crate::metrics::ListenerMetrics;
use crate::notification::{decode, Notification, NotificationHandler};

use super::connector::{ChannelConnector, ListenerError};
use super::state::ConnectionState;

/// Delay between reconnect attempts unless configured otherwise
pub const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_secs(5);

/// Floor for the reconnect delay; zero would spin against a down datastore
pub const MIN_RECONNECT_DELAY: Duration = Duration::from_secs(1);

type HandlerList = Arc<RwLock<Vec<Arc<dyn NotificationHandler>>>>;

struct RunningLoop {
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

/// Long-lived subscription to one upstream channel.
///
/// Connects, listens, and on any failure waits a fixed delay and tries again,
/// forever, until [`stop`](Self::stop) is called. Every decoded notification
/// is handed to all registered handlers, each on its own task.
pub struct ChannelListener {
    channel: String,
    connector: Arc<dyn ChannelConnector>,
    reconnect_delay: Duration,
    handlers: HandlerList,
    state: Arc<watch::Sender<ConnectionState>>,
    running: Mutex<Option<RunningLoop>>,
}

impl ChannelListener {
    pub fn new(connector: Arc<dyn ChannelConnector>, channel: impl Into<String>) -> Self {
        let (state, _) = watch::channel(ConnectionState::Disconnected);
        Self {
            channel: channel.into(),
            connector,
            reconnect_delay: DEFAULT_RECONNECT_DELAY,
            handlers: Arc::new(RwLock::new(Vec::new())),
            state: Arc::new(state),
            running: Mutex::new(None),
        }
    }

    pub fn from_config(connector: Arc<dyn ChannelConnector>, config: &ListenerConfig) -> Self {
        Self::new(connector, config.channel.clone()).with_reconnect_delay(config.reconnect_delay())
    }

    /// Set the fixed retry delay, raised to [`MIN_RECONNECT_DELAY`] if shorter
    pub fn with_reconnect_delay(mut self, delay: Duration) -> Self {
        self.reconnect_delay = delay.max(MIN_RECONNECT_DELAY);
        self
    }

    pub fn channel(&self) -> &str {
        &self.channel
    }

    /// Add a handler to the dispatch list.
    ///
    /// Normally called before [`start`](Self::start); handlers registered
    /// later see notifications received after the call.
    pub fn register(&self, handler: Arc<dyn NotificationHandler>) {
        let name = handler.name().to_string();
        let mut handlers = self.handlers.write().unwrap_or_else(PoisonError::into_inner);
        handlers.push(handler);

        tracing::info!(handler = %name, total = handlers.len(), "Notification handler registered");
    }

    pub fn handler_count(&self) -> usize {
        self.handlers.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn state(&self) -> ConnectionState {
        *self.state.borrow()
    }

    /// Watch state transitions
    pub fn subscribe_state(&self) -> watch::Receiver<ConnectionState> {
        self.state.subscribe()
    }

    pub fn is_running(&self) -> bool {
        self.running
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(|r| !r.task.is_finished())
    }

    /// Spawn the connect/listen/reconnect loop. No-op while already running.
    ///
    /// Must be called from within a tokio runtime. Returns without waiting
    /// for the first connection.
    pub fn start(&self) {
        let mut running = self.running.lock().unwrap_or_else(PoisonError::into_inner);
        if running.as_ref().is_some_and(|r| !r.task.is_finished()) {
            tracing::debug!(channel = %self.channel, "Channel listener already running");
            return;
        }

        let cancel = CancellationToken::new();
        let listen_loop = ListenLoop {
            channel: self.channel.clone(),
            connector: self.connector.clone(),
            reconnect_delay: self.reconnect_delay,
            handlers: self.handlers.clone(),
            state: self.state.clone(),
        };

        self.state.send_replace(ConnectionState::Disconnected);
        let task = tokio::spawn(listen_loop.run(cancel.clone()));
        *running = Some(RunningLoop { cancel, task });

        tracing::info!(
            channel = %self.channel,
            reconnect_delay_secs = self.reconnect_delay.as_secs_f64(),
            "Channel listener started"
        );
    }

    /// Cancel the loop and wait for it to release its connection.
    /// No-op if not running.
    pub async fn stop(&self) {
        let running = self
            .running
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();

        let Some(RunningLoop { cancel, task }) = running else {
            return;
        };

        cancel.cancel();
        if let Err(e) = task.await {
            tracing::error!(channel = %self.channel, error = %e, "Channel listener task failed");
        }

        self.state.send_replace(ConnectionState::Stopped);
        ListenerMetrics::set_connected(false);
        tracing::info!(channel = %self.channel, "Channel listener stopped");
    }
}

impl Drop for ChannelListener {
    fn drop(&mut self) {
        let running = self.running.get_mut().unwrap_or_else(PoisonError::into_inner);
        if let Some(r) = running.take() {
            r.cancel.cancel();
        }
    }
}

/// State owned by the background task
struct ListenLoop {
    channel: String,
    connector: Arc<dyn ChannelConnector>,
    reconnect_delay: Duration,
    handlers: HandlerList,
    state: Arc<watch::Sender<ConnectionState>>,
}

impl ListenLoop {
    async fn run(self, cancel: CancellationToken) {
        loop {
            match self.listen_once(&cancel).await {
                Ok(()) => break,
                Err(e) => {
                    ListenerMetrics::set_connected(false);
                    self.set_state(ConnectionState::Reconnecting);
                    tracing::error!(
                        channel = %self.channel,
                        error = %e,
                        retry_in_secs = self.reconnect_delay.as_secs_f64(),
                        "Channel connection lost, reconnecting after delay"
                    );

                    tokio::select! {
                        biased;
                        _ = cancel.cancelled() => break,
                        _ = tokio::time::sleep(self.reconnect_delay) => {
                            ListenerMetrics::record_reconnect();
                        }
                    }
                }
            }
        }

        ListenerMetrics::set_connected(false);
        self.set_state(ConnectionState::Stopped);
        tracing::info!(channel = %self.channel, "Listener task cancelled, leaving reconnect loop");
    }

    /// One connect-and-listen cycle. `Ok(())` means cancelled.
    async fn listen_once(&self, cancel: &CancellationToken) -> Result<(), ListenerError> {
        self.set_state(ConnectionState::Connecting);

        let mut stream = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Ok(()),
            connected = self.connector.connect(&self.channel) => connected?,
        };

        self.set_state(ConnectionState::Listening);
        ListenerMetrics::set_connected(true);
        tracing::info!(channel = %self.channel, "Listening on channel");

        let outcome = loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break Ok(()),
                received = stream.recv() => match received {
                    Ok(payload) => self.dispatch(&payload),
                    Err(e) => break Err(e),
                },
            }
        };

        stream.close().await;
        outcome
    }

    fn dispatch(&self, payload: &str) {
        ListenerMetrics::record_received();

        let notification = match decode(payload) {
            Ok(n) => Arc::new(n),
            Err(e) => {
                ListenerMetrics::record_malformed();
                tracing::warn!(
                    channel = %self.channel,
                    error = %e,
                    payload = %payload,
                    "Dropping malformed notification"
                );
                return;
            }
        };

        let handlers = self
            .handlers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();

        if handlers.is_empty() {
            tracing::debug!(channel = %self.channel, "No handlers registered, notification discarded");
            return;
        }

        for handler in handlers {
            spawn_handler(handler, notification.clone());
        }
    }

    fn set_state(&self, state: ConnectionState) {
        self.state.send_replace(state);
    }
}

/// Run one handler on its own task. Errors and panics stay inside the task.
fn spawn_handler(handler: Arc<dyn NotificationHandler>, notification: Arc<Notification>) {
    tokio::spawn(async move {
        let outcome = AssertUnwindSafe(async { handler.handle(notification).await })
            .catch_unwind()
            .await;

        match outcome {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                ListenerMetrics::record_handler_error();
                tracing::warn!(handler = %handler.name(), error = %e, "Notification handler failed");
            }
            Err(panic) => {
                ListenerMetrics::record_handler_panic();
                tracing::error!(
                    handler = %handler.name(),
                    panic = %panic_message(panic.as_ref()),
                    "Notification handler panicked"
                );
            }
        }
    });
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    if let Some(s) = panic.downcast_ref::<&str>() {
        *s
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.as_str()
    } else {
        "non-string panic payload"
    }
}

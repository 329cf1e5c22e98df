use crate::core::ConnectionConfig;
use crate::error::{TransportError, TransportResult};
use crate::input::parse_message;
use crate::playback::LiveHandle;
use crate::stream::transport::{Transport, TransportStatus};
use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::Duration;
use tracing::{debug, info, warn};

/// Delay between polls when the transport has nothing pending
const POLL_INTERVAL: Duration = Duration::from_millis(5);

#[derive(Default)]
pub struct StreamStats {
    pub payloads_received: AtomicU64,
    pub frames_appended: AtomicU64,
    pub parse_failures: AtomicU64,
    pub errors: AtomicU64,
    pub start_time: Mutex<Option<DateTime<Utc>>>,
}

impl StreamStats {
    fn reset(&self) {
        self.payloads_received.store(0, Ordering::SeqCst);
        self.frames_appended.store(0, Ordering::SeqCst);
        self.parse_failures.store(0, Ordering::SeqCst);
        self.errors.store(0, Ordering::SeqCst);
    }
}

/// Feeds a live slot from a transport.
///
/// The transport is pumped on a background tokio task: every payload is
/// recorded as the slot's latest raw message, parsed, and appended to the
/// slot's [`LiveHandle`]. Errors only annotate the slot; a lost connection
/// ends the stream and leaves the buffered frames in place.
pub struct StreamManager {
    /// Current connection status
    status: Arc<Mutex<TransportStatus>>,
    stats: Arc<StreamStats>,
    /// Stop signal for background task
    stop_signal: Arc<AtomicBool>,
    task: Option<JoinHandle<()>>,
    handle: Option<LiveHandle>,
    transport_name: Option<String>,
}

impl Default for StreamManager {
    fn default() -> Self {
        Self::new()
    }
}

impl StreamManager {
    pub fn new() -> Self {
        Self {
            status: Arc::new(Mutex::new(TransportStatus::Disconnected)),
            stats: Arc::new(StreamStats::default()),
            stop_signal: Arc::new(AtomicBool::new(false)),
            task: None,
            handle: None,
            transport_name: None,
        }
    }

    /// Get current connection status
    pub async fn status(&self) -> TransportStatus {
        *self.status.lock().await
    }

    pub fn transport_name(&self) -> Option<&str> {
        self.transport_name.as_deref()
    }

    pub fn stats(&self) -> &StreamStats {
        &self.stats
    }

    /// Buffer being fed, if connected
    pub fn live_handle(&self) -> Option<&LiveHandle> {
        self.handle.as_ref()
    }

    /// Connect `transport` and start pumping it into `handle`
    pub async fn connect(
        &mut self,
        mut transport: Box<dyn Transport>,
        config: &ConnectionConfig,
        handle: LiveHandle,
    ) -> TransportResult<()> {
        if self.task.is_some() {
            self.disconnect().await;
        }

        *self.status.lock().await = TransportStatus::Connecting;
        self.stats.reset();
        *self.stats.start_time.lock().await = Some(Utc::now());
        self.stop_signal.store(false, Ordering::SeqCst);

        let name = transport.name().to_string();
        info!("Connecting {} to {}", name, config.endpoint());
        if let Err(e) = transport.connect(config).await {
            warn!("Connection failed: {}", e);
            *self.status.lock().await = TransportStatus::Error;
            handle.set_error(e.to_string());
            handle.mark_disconnected();
            return Err(e);
        }
        *self.status.lock().await = TransportStatus::Connected;

        let status = self.status.clone();
        let stats = self.stats.clone();
        let stop_signal = self.stop_signal.clone();
        let task_handle = handle.clone();
        self.task = Some(tokio::spawn(async move {
            Self::run_stream(transport, task_handle, status, stats, stop_signal).await;
        }));
        self.handle = Some(handle);
        self.transport_name = Some(name);
        Ok(())
    }

    async fn run_stream(
        mut transport: Box<dyn Transport>,
        handle: LiveHandle,
        status: Arc<Mutex<TransportStatus>>,
        stats: Arc<StreamStats>,
        stop_signal: Arc<AtomicBool>,
    ) {
        let mut has_error = false;

        loop {
            if stop_signal.load(Ordering::SeqCst) {
                break;
            }

            match transport.receive().await {
                Ok(Some(payload)) => {
                    stats.payloads_received.fetch_add(1, Ordering::SeqCst);
                    if has_error {
                        handle.clear_error();
                        has_error = false;
                    }
                    handle.record_raw(&payload);

                    match parse_message(&payload) {
                        Some(frame) => {
                            if handle.append(frame) {
                                stats.frames_appended.fetch_add(1, Ordering::SeqCst);
                            }
                        }
                        None => {
                            stats.parse_failures.fetch_add(1, Ordering::SeqCst);
                            debug!("Unparseable payload ({} bytes)", payload.len());
                        }
                    }
                }
                Ok(None) => {
                    tokio::time::sleep(POLL_INTERVAL).await;
                }
                Err(TransportError::ConnectionLost(reason)) => {
                    stats.errors.fetch_add(1, Ordering::SeqCst);
                    warn!("{}: connection lost: {}", transport.name(), reason);
                    handle.set_error(format!("Connection lost: {}", reason));
                    *status.lock().await = TransportStatus::Error;
                    break;
                }
                Err(e) => {
                    stats.errors.fetch_add(1, Ordering::SeqCst);
                    warn!("{}: receive error: {}", transport.name(), e);
                    handle.set_error(e.to_string());
                    has_error = true;
                    tokio::time::sleep(POLL_INTERVAL).await;
                }
            }
        }

        if let Err(e) = transport.disconnect().await {
            warn!("{}: disconnect failed: {}", transport.name(), e);
        }
        handle.mark_disconnected();

        let mut status = status.lock().await;
        if *status != TransportStatus::Error {
            *status = TransportStatus::Disconnected;
        }
    }

    /// Stop the stream and wait for the background task to finish
    pub async fn disconnect(&mut self) {
        self.stop_signal.store(true, Ordering::SeqCst);
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                warn!("Stream task ended abnormally: {}", e);
            }
        }
        if let Some(handle) = self.handle.take() {
            handle.mark_disconnected();
        }
        self.transport_name = None;
        *self.status.lock().await = TransportStatus::Disconnected;
    }

    /// Whether the background task is still pumping
    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }
}

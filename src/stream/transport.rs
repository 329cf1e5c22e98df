use crate::core::ConnectionConfig;
use crate::error::TransportResult;
use async_trait::async_trait;

/// Status of a stream transport
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportStatus {
    /// Transport is disconnected
    Disconnected,
    /// Transport is connecting
    Connecting,
    /// Transport is connected and delivering payloads
    Connected,
    /// Transport has an error
    Error,
}

/// Trait for live frame sources
///
/// A transport only delivers raw payloads. Parsing them into frames and
/// feeding the live buffer is the [`StreamManager`](super::StreamManager)'s
/// job, so MQTT, WebSocket or test implementations stay interchangeable.
#[async_trait]
pub trait Transport: Send {
    /// Get the name/identifier of this transport
    fn name(&self) -> &str;

    /// Get the current status of the transport
    fn status(&self) -> TransportStatus;

    /// Connect to the endpoint described by `config`
    async fn connect(&mut self, config: &ConnectionConfig) -> TransportResult<()>;

    /// Disconnect from the endpoint
    async fn disconnect(&mut self) -> TransportResult<()>;

    /// Receive the next raw payload (non-blocking, returns None if nothing is pending)
    async fn receive(&mut self) -> TransportResult<Option<String>>;
}

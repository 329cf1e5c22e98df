use crate::core::ConnectionConfig;
use crate::error::{TransportError, TransportResult};
use crate::stream::transport::{Transport, TransportStatus};
use async_trait::async_trait;
use std::collections::VecDeque;

/// Scripted receive result
#[derive(Debug)]
enum Scripted {
    Payload(String),
    Error(TransportError),
}

/// Mock transport for testing without a broker
///
/// Payloads and errors are handed out in the order they were injected.
pub struct MockTransport {
    name: String,
    status: TransportStatus,
    config: Option<ConnectionConfig>,
    rx_buffer: VecDeque<Scripted>,
    refuse_connect: bool,
    close_when_drained: bool,
}

impl MockTransport {
    /// Create a new mock transport
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            status: TransportStatus::Disconnected,
            config: None,
            rx_buffer: VecDeque::new(),
            refuse_connect: false,
            close_when_drained: false,
        }
    }

    /// Add a payload to the receive buffer
    pub fn inject_payload(&mut self, payload: impl Into<String>) {
        self.rx_buffer.push_back(Scripted::Payload(payload.into()));
    }

    /// Add multiple payloads to the receive buffer
    pub fn inject_payloads<I, S>(&mut self, payloads: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for payload in payloads {
            self.inject_payload(payload);
        }
    }

    /// Make a later `receive` fail with `error`
    pub fn inject_error(&mut self, error: TransportError) {
        self.rx_buffer.push_back(Scripted::Error(error));
    }

    /// Make `connect` fail
    pub fn set_refuse_connect(&mut self, refuse: bool) {
        self.refuse_connect = refuse;
    }

    /// Report the connection as lost once every scripted item was received
    pub fn set_close_when_drained(&mut self, close: bool) {
        self.close_when_drained = close;
    }

    /// Config passed to the last successful `connect`
    pub fn config(&self) -> Option<&ConnectionConfig> {
        self.config.as_ref()
    }

    /// Scripted items not yet received
    pub fn pending(&self) -> usize {
        self.rx_buffer.len()
    }
}

#[async_trait]
impl Transport for MockTransport {
    fn name(&self) -> &str {
        &self.name
    }

    fn status(&self) -> TransportStatus {
        self.status
    }

    async fn connect(&mut self, config: &ConnectionConfig) -> TransportResult<()> {
        if self.refuse_connect {
            self.status = TransportStatus::Error;
            return Err(TransportError::ConnectionFailed(format!(
                "{} refused",
                config.endpoint()
            )));
        }
        self.config = Some(config.clone());
        self.status = TransportStatus::Connected;
        Ok(())
    }

    async fn disconnect(&mut self) -> TransportResult<()> {
        self.status = TransportStatus::Disconnected;
        self.config = None;
        self.rx_buffer.clear();
        Ok(())
    }

    async fn receive(&mut self) -> TransportResult<Option<String>> {
        if self.status != TransportStatus::Connected {
            return Err(TransportError::NotConnected);
        }

        match self.rx_buffer.pop_front() {
            Some(Scripted::Payload(payload)) => Ok(Some(payload)),
            Some(Scripted::Error(error)) => Err(error),
            None if self.close_when_drained => {
                self.status = TransportStatus::Error;
                Err(TransportError::ConnectionLost("stream closed by peer".to_string()))
            }
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> ConnectionConfig {
        ConnectionConfig {
            protocol: "ws://".to_string(),
            url: "localhost".to_string(),
            port: Some(8080),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_mock_transport_connect() {
        let mut transport = MockTransport::new("test");
        assert_eq!(transport.status(), TransportStatus::Disconnected);

        transport.connect(&config()).await.unwrap();
        assert_eq!(transport.status(), TransportStatus::Connected);
        assert_eq!(transport.config().unwrap().endpoint(), "ws://localhost:8080");

        transport.disconnect().await.unwrap();
        assert_eq!(transport.status(), TransportStatus::Disconnected);
    }

    #[tokio::test]
    async fn test_mock_transport_receive_in_order() {
        let mut transport = MockTransport::new("test");
        transport.inject_payloads(["a", "b"]);
        transport.inject_error(TransportError::Subscription("topic".to_string()));
        transport.connect(&config()).await.unwrap();

        assert_eq!(transport.receive().await.unwrap().as_deref(), Some("a"));
        assert_eq!(transport.receive().await.unwrap().as_deref(), Some("b"));
        assert!(matches!(
            transport.receive().await,
            Err(TransportError::Subscription(_))
        ));
        assert!(transport.receive().await.unwrap().is_none());
        assert_eq!(transport.pending(), 0);
    }

    #[tokio::test]
    async fn test_mock_transport_requires_connection() {
        let mut transport = MockTransport::new("test");
        assert!(matches!(transport.receive().await, Err(TransportError::NotConnected)));

        transport.set_refuse_connect(true);
        assert!(transport.connect(&config()).await.is_err());
        assert_eq!(transport.status(), TransportStatus::Error);
    }

    #[tokio::test]
    async fn test_mock_transport_close_when_drained() {
        let mut transport = MockTransport::new("test");
        transport.inject_payload("last");
        transport.set_close_when_drained(true);
        transport.connect(&config()).await.unwrap();

        assert!(transport.receive().await.unwrap().is_some());
        assert!(matches!(
            transport.receive().await,
            Err(TransportError::ConnectionLost(_))
        ));
    }
}

pub mod manager;
pub mod mock;
pub mod transport;

pub use manager::{StreamManager, StreamStats};
pub use mock::MockTransport;
pub use transport::{Transport, TransportStatus};

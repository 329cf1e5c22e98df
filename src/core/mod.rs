pub mod frame;
pub mod sequence;
pub mod session;

pub use frame::{Frame, MotObject, NaviData};
pub use sequence::{FrameSequence, LIVE_CAPACITY};
pub use session::{ConnectionConfig, SavedSession, SourceType};

pub mod frame;
pub mod net;
pub mod replay;

pub use frame::{FrameCallback, FrameScheduler};
pub use net::{ClientConfig, InterpolationEngine, SnapshotClient};

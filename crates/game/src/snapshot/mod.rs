mod buffer;
mod state;

pub use buffer::SnapshotPair;
pub use state::{EntityId, RenderState, Snapshot, clamp_to_interior};

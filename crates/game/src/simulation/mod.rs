mod tick;
mod walker;

pub use tick::FixedTimestep;
pub use walker::Walker;

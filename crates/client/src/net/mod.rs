pub mod client;
pub mod config;
pub mod interpolation;

pub use client::{ClientStats, PhaseInfo, SnapshotClient};
pub use config::ClientConfig;
pub use interpolation::{
    InterpolationConfig, InterpolationEngine, InterpolationStats, RenderMode, RenderSample,
};

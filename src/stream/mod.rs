//! Real-time processing: frame adapter, engine and shared controls.

pub mod adapter;
pub mod controls;
pub mod engine;

pub use adapter::StreamingFrameAdapter;
pub use controls::{AtomicF32, EngineControls};
pub use engine::VocalEngine;

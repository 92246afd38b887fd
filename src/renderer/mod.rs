//! wgpu rendering
//!
//! Meshes are built once per world; each frame the command builder lists
//! which meshes to draw and where, and the frame scheduler paces recording
//! and presentation across a small ring of frame slots.

pub mod commands;
pub mod frames;
pub mod gpu;
pub mod shapes;
pub mod vertex;

pub use commands::{DrawCommand, DrawSequence, Layer, build};
pub use frames::{
    BackendError, FrameBackend, FramePhase, FrameReport, FrameScheduler, SchedulerError,
    SurfaceSize,
};
pub use gpu::WgpuBackend;
pub use shapes::{MeshId, MeshLibrary};
pub use vertex::Vertex;

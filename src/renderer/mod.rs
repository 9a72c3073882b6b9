//! Render step
//!
//! `scene::paint` draws the simulation state and effects onto any `Surface`.
//! On the web the `MeshSurface` output is uploaded through the wgpu pipeline.

pub mod effects;
pub mod mesh;
pub mod pipeline;
pub mod scene;
pub mod shapes;
pub mod surface;
pub mod vertex;

pub use effects::Effects;
pub use mesh::MeshSurface;
pub use pipeline::RenderState;
pub use scene::paint;
pub use surface::{Color, Surface};

//! Engine data structures: meshes, materials, textures and the scene graph.
//!
//! - `instance` holds node transforms and their GPU form
//! - `mesh` contains CPU-side triangle geometry
//! - `material` describes the material families and texture slots
//! - `primitives` generates boxes and spheres, with a fallback on bad input
//! - `scene_graph` enables hierarchical organization of loaded models
//! - `texture` contains the GPU texture wrapper and the point sprite generator

pub mod instance;
pub mod material;
pub mod mesh;
pub mod primitives;
pub mod scene_graph;
pub mod texture;

/// Describes how a vertex type is laid out in a GPU buffer.
pub trait Vertex {
    fn desc() -> wgpu::VertexBufferLayout<'static>;
}

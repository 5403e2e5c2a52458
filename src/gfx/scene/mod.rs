//! # Scene Management
//!
//! The scene graph of the viewer: a [`Scene`] owns the camera, the list of
//! renderable [`Object`]s, and the material library. Objects are appended by
//! the import pipeline and read by the render engine each frame.

pub mod object;
pub mod scene;
pub mod vertex;

// Re-export main types
pub use object::{DrawMesh, Mesh, Object};
pub use scene::Scene;
pub use vertex::Vertex3D;

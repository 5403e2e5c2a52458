//! # Graphics Module
//!
//! Everything the viewer needs to get a model on screen:
//!
//! - **Camera** ([`camera`]) - Orbit camera with mouse controls
//! - **Geometry math** ([`geometry`]) - Bounding boxes and centroids
//! - **Import** ([`import`]) - The OBJ/MTL model import pipeline
//! - **Rendering** ([`rendering`]) - Forward render pass and pipelines
//! - **Resources** ([`resources`]) - Materials and GPU uniform bindings
//! - **Scene** ([`scene`]) - Objects, meshes, and the scene container

pub mod camera;
pub mod geometry;
pub mod import;
pub mod rendering;
pub mod resources;
pub mod scene;

// Re-export commonly used types
pub use import::{import_model, ImportError};
pub use rendering::render_engine::RenderEngine;
pub use scene::Scene;

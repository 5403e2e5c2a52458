// src/lib.rs
//! Cairn 3D model viewer
//!
//! A minimal model viewer built on wgpu and winit: import one OBJ/MTL model,
//! orbit around it with the mouse, and render it continuously.

pub mod app;
pub mod gfx;
pub mod wgpu_utils;

// Re-export main types for convenience
pub use app::CairnApp;
pub use gfx::import::{import_model, ImportError};

/// Creates a default Cairn application instance
pub fn default() -> CairnApp {
    CairnApp::new()
}

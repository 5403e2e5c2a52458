//! Global uniform bindings for camera and lighting data.
//!
//! One uniform buffer carries the per-frame state shared by every object:
//! the camera matrices plus the ambient and directional light terms. Bound
//! to slot 0 in the render pipeline.

use cgmath::InnerSpace;

use crate::{
    gfx::camera::camera_utils::CameraUniform,
    wgpu_utils::{
        binding_builder::{BindGroupBuilder, BindGroupLayoutBuilder, BindGroupLayoutWithDesc},
        binding_types,
        uniform_buffer::UniformBuffer,
    },
};

/// Global uniform buffer content structure
///
/// MUST match the Globals struct in the shader exactly.
#[repr(C)]
#[derive(Copy, Clone, Debug)]
pub struct GlobalUBOContent {
    // Camera data (matches CameraUniform)
    view_position: [f32; 4],  // Camera position (homogeneous coordinates)
    view_proj: [[f32; 4]; 4], // Camera view-projection matrix

    // Light data
    ambient_color: [f32; 3],
    ambient_intensity: f32,
    light_direction: [f32; 3], // Unit vector from the scene toward the light
    _padding0: f32,
    light_color: [f32; 3],
    light_intensity: f32,
}
// Total: 16 + 64 + 16 + 16 + 16 = 128 bytes

unsafe impl bytemuck::Pod for GlobalUBOContent {}
unsafe impl bytemuck::Zeroable for GlobalUBOContent {}

/// Scene lighting: one ambient term plus one directional light.
#[derive(Copy, Clone, Debug)]
pub struct LightConfig {
    pub ambient_color: [f32; 3],
    pub ambient_intensity: f32,
    /// Direction from the scene toward the light; normalized on upload.
    pub direction: [f32; 3],
    pub color: [f32; 3],
    pub intensity: f32,
}

impl Default for LightConfig {
    /// A soft white ambient plus a white key light shining down from
    /// (5, 10, 7.5).
    fn default() -> Self {
        Self {
            ambient_color: [1.0, 1.0, 1.0],
            ambient_intensity: 0.5,
            direction: [5.0, 10.0, 7.5],
            color: [1.0, 1.0, 1.0],
            intensity: 1.0,
        }
    }
}

/// Type alias for the global uniform buffer
pub type GlobalUBO = UniformBuffer<GlobalUBOContent>;

/// Updates the global uniform buffer with camera and light data.
///
/// Called each frame with the current camera uniform so the shader sees
/// up-to-date view matrices.
pub fn update_global_ubo(
    ubo: &mut GlobalUBO,
    queue: &wgpu::Queue,
    camera: CameraUniform,
    light: LightConfig,
) {
    let direction = cgmath::Vector3::from(light.direction).normalize();

    let content = GlobalUBOContent {
        view_position: camera.view_position,
        view_proj: camera.view_proj,
        ambient_color: light.ambient_color,
        ambient_intensity: light.ambient_intensity,
        light_direction: direction.into(),
        _padding0: 0.0,
        light_color: light.color,
        light_intensity: light.intensity,
    };

    ubo.update_content(queue, content);
}

/// Manages the bind group layout and bind group for global uniforms.
pub struct GlobalBindings {
    bind_group_layout: BindGroupLayoutWithDesc,
    bind_group: Option<wgpu::BindGroup>,
}

impl GlobalBindings {
    pub fn new(device: &wgpu::Device) -> Self {
        let bind_group_layout = BindGroupLayoutBuilder::new()
            .next_binding_rendering(binding_types::uniform()) // Camera + light
            .create(device, "Globals Bind Group Layout");

        GlobalBindings {
            bind_group_layout,
            bind_group: None,
        }
    }

    /// Creates the bind group with the provided uniform buffer.
    ///
    /// Must be called before any rendering that uses global uniforms.
    pub fn create_bind_group(&mut self, device: &wgpu::Device, ubo: &GlobalUBO) {
        self.bind_group = Some(
            BindGroupBuilder::new(&self.bind_group_layout)
                .resource(ubo.binding_resource())
                .create(device, "Global Bind Group"),
        );
    }

    pub fn bind_group_layout(&self) -> &wgpu::BindGroupLayout {
        &self.bind_group_layout.layout
    }

    /// Returns the bind group for rendering.
    ///
    /// # Panics
    /// Panics if `create_bind_group()` hasn't been called yet
    pub fn bind_group(&self) -> &wgpu::BindGroup {
        self.bind_group
            .as_ref()
            .expect("Bind group has not been created yet!")
    }
}

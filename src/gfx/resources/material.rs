//! Material definitions and centralized management.
//!
//! Materials hold the MTL-shaped shading parameters (diffuse color, specular,
//! shininess) plus the GPU resources to bind them. They are stored centrally
//! in [`MaterialManager`] and referenced by name from mesh nodes, so one
//! parsed definition is shared read-only by every mesh that uses it.

use std::collections::HashMap;
use wgpu::Device;

use crate::wgpu_utils::{
    binding_builder::{BindGroupBuilder, BindGroupLayoutBuilder, BindGroupLayoutWithDesc},
    binding_types,
    uniform_buffer::UniformBuffer,
};

/// Material ID for referencing materials
pub type MaterialId = String;

/// GPU uniform data for materials
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct MaterialUniform {
    pub base_color: [f32; 4],
    pub specular: [f32; 3],
    pub shininess: f32,
}

type MaterialUBO = UniformBuffer<MaterialUniform>;

/// Material bind group management
pub struct MaterialBindings {
    bind_group_layout: BindGroupLayoutWithDesc,
    bind_group: Option<wgpu::BindGroup>,
}

impl MaterialBindings {
    pub fn new(device: &Device) -> Self {
        let bind_group_layout = BindGroupLayoutBuilder::new()
            .next_binding_fragment(binding_types::uniform())
            .create(device, "Material Bind Group Layout");

        MaterialBindings {
            bind_group_layout,
            bind_group: None,
        }
    }

    pub fn create_bind_group(&mut self, device: &Device, ubo: &MaterialUBO) {
        self.bind_group = Some(
            BindGroupBuilder::new(&self.bind_group_layout)
                .resource(ubo.binding_resource())
                .create(device, "Material Bind Group"),
        );
    }

    pub fn bind_group_layout(&self) -> &wgpu::BindGroupLayout {
        &self.bind_group_layout.layout
    }
}

/// A named material with MTL-style shading parameters.
pub struct Material {
    pub name: String,
    pub base_color: [f32; 4],
    pub specular: [f32; 3],
    pub shininess: f32,

    // GPU resources, shared by every mesh using this material
    material_ubo: Option<MaterialUBO>,
    material_bindings: Option<MaterialBindings>,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            name: "default".to_string(),
            base_color: [0.8, 0.8, 0.8, 1.0],
            specular: [0.2, 0.2, 0.2],
            shininess: 32.0,
            material_ubo: None,
            material_bindings: None,
        }
    }
}

impl Material {
    pub fn new(name: &str, base_color: [f32; 4], specular: [f32; 3], shininess: f32) -> Self {
        Self {
            name: name.to_string(),
            base_color,
            specular,
            shininess: shininess.max(1.0),
            material_ubo: None,
            material_bindings: None,
        }
    }

    /// Converts a parsed MTL definition into a renderable material.
    ///
    /// The MTL `Kd` becomes the base color, `d` (dissolve) the alpha, `Ks`
    /// the specular color, and `Ns` the shininess exponent. Missing fields
    /// take neutral defaults.
    pub fn from_mtl(mtl: &tobj::Material) -> Self {
        let diffuse = mtl.diffuse.unwrap_or([0.8, 0.8, 0.8]);
        Self::new(
            &mtl.name,
            [
                diffuse[0],
                diffuse[1],
                diffuse[2],
                mtl.dissolve.unwrap_or(1.0),
            ],
            mtl.specular.unwrap_or([0.2, 0.2, 0.2]),
            mtl.shininess.unwrap_or(32.0),
        )
    }

    /// Creates or refreshes the GPU resources for this material.
    pub fn update_gpu_resources(&mut self, device: &Device, queue: &wgpu::Queue) {
        if self.material_ubo.is_none() {
            self.material_ubo = Some(MaterialUBO::new(device));
        }

        if self.material_bindings.is_none() {
            let mut bindings = MaterialBindings::new(device);
            bindings.create_bind_group(device, self.material_ubo.as_ref().unwrap());
            self.material_bindings = Some(bindings);
        }

        let uniform_data = MaterialUniform {
            base_color: self.base_color,
            specular: self.specular,
            shininess: self.shininess,
        };

        if let Some(ubo) = &mut self.material_ubo {
            ubo.update_content(queue, uniform_data);
        }
    }

    /// Gets the bind group for rendering, if GPU resources exist.
    pub fn bind_group(&self) -> Option<&wgpu::BindGroup> {
        self.material_bindings
            .as_ref()
            .and_then(|bindings| bindings.bind_group.as_ref())
    }
}

/// Centralized storage for all materials in the scene.
///
/// Objects reference materials by ID rather than owning material data, so
/// GPU resources are created once per material rather than once per mesh.
pub struct MaterialManager {
    materials: HashMap<MaterialId, Material>,
    default_material_id: MaterialId,
}

impl MaterialManager {
    /// Creates a new material manager holding only the default material.
    pub fn new() -> Self {
        let mut manager = Self {
            materials: HashMap::new(),
            default_material_id: "default".to_string(),
        };

        manager
            .materials
            .insert("default".to_string(), Material::default());

        manager
    }

    /// Adds a material, replacing any existing entry with the same name.
    pub fn add(&mut self, material: Material) {
        self.materials.insert(material.name.clone(), material);
    }

    pub fn get(&self, id: &str) -> Option<&Material> {
        self.materials.get(id)
    }

    pub fn len(&self) -> usize {
        self.materials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.materials.is_empty()
    }

    /// Gets the material for a mesh, falling back to the default material
    /// when the mesh has no assignment or the assignment does not resolve.
    pub fn material_for(&self, material_id: Option<&MaterialId>) -> &Material {
        material_id
            .and_then(|id| self.materials.get(id))
            .unwrap_or_else(|| {
                self.materials
                    .get(&self.default_material_id)
                    .expect("default material always present")
            })
    }

    /// Updates GPU resources for all materials.
    ///
    /// Called once the GPU context exists, and again whenever material
    /// parameters change.
    pub fn update_all_gpu_resources(&mut self, device: &Device, queue: &wgpu::Queue) {
        for material in self.materials.values_mut() {
            material.update_gpu_resources(device, queue);
        }
    }
}

impl Default for MaterialManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_single_mtl(source: &str) -> tobj::Material {
        let (mut materials, _) =
            tobj::load_mtl_buf(&mut source.as_bytes()).expect("fixture MTL parses");
        materials.remove(0)
    }

    #[test]
    fn test_from_mtl_maps_fields() {
        let mtl = parse_single_mtl(
            "newmtl gray\nKd 0.8 0.7 0.6\nKs 0.5 0.5 0.5\nNs 64.0\nd 0.9\n",
        );

        let material = Material::from_mtl(&mtl);
        assert_eq!(material.name, "gray");
        assert_eq!(material.base_color, [0.8, 0.7, 0.6, 0.9]);
        assert_eq!(material.specular, [0.5, 0.5, 0.5]);
        assert_eq!(material.shininess, 64.0);
    }

    #[test]
    fn test_from_mtl_defaults_missing_fields() {
        let mtl = parse_single_mtl("newmtl bare\n");

        let material = Material::from_mtl(&mtl);
        assert_eq!(material.base_color, [0.8, 0.8, 0.8, 1.0]);
        assert_eq!(material.shininess, 32.0);
    }

    #[test]
    fn test_manager_resolves_and_falls_back() {
        let mut manager = MaterialManager::new();
        manager.add(Material::new("red", [1.0, 0.0, 0.0, 1.0], [0.2; 3], 32.0));

        let red = "red".to_string();
        assert_eq!(manager.material_for(Some(&red)).name, "red");

        let missing = "missing".to_string();
        assert_eq!(manager.material_for(Some(&missing)).name, "default");
        assert_eq!(manager.material_for(None).name, "default");
    }
}

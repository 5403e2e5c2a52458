//! Mesh nodes and renderable objects.
//!
//! A [`Mesh`] owns CPU-side vertex/index data plus optional GPU buffers; an
//! [`Object`] is a named group of mesh nodes sharing one transform. GPU
//! resources are created lazily once a device is available, so meshes can be
//! built and normalized without any graphics context.

use cgmath::{InnerSpace, Matrix4, SquareMatrix, Vector3, Zero};
use wgpu::util::DeviceExt;
use wgpu::Device;

use super::vertex::Vertex3D;
use crate::gfx::geometry::{self, Aabb};
use crate::gfx::resources::material::MaterialId;

/// A single mesh node: triangle geometry plus an optional material reference.
pub struct Mesh {
    name: String,
    vertices: Vec<Vertex3D>,
    indices: Vec<u32>,
    material: Option<MaterialId>,
    vertex_buffer: Option<wgpu::Buffer>,
    index_buffer: Option<wgpu::Buffer>,
    index_count: u32,
}

impl Mesh {
    /// Builds a mesh from per-vertex positions and normals.
    ///
    /// The two slices are indexed together; a missing normal falls back to
    /// +Z rather than panicking on malformed input.
    pub fn new(
        name: impl Into<String>,
        positions: Vec<[f32; 3]>,
        normals: Vec<[f32; 3]>,
        indices: Vec<u32>,
        material: Option<MaterialId>,
    ) -> Self {
        let index_count = indices.len() as u32;

        let vertices = positions
            .iter()
            .enumerate()
            .map(|(i, &position)| Vertex3D {
                position,
                normal: normals.get(i).copied().unwrap_or([0.0, 0.0, 1.0]),
            })
            .collect();

        Self {
            name: name.into(),
            vertices,
            indices,
            material,
            vertex_buffer: None,
            index_buffer: None,
            index_count,
        }
    }

    /// Computes smooth per-vertex normals from face geometry.
    ///
    /// Face normals are area weighted (unnormalized cross products) and
    /// accumulated per vertex, which gives larger triangles more influence.
    pub fn vertex_normals(positions: &[[f32; 3]], indices: &[u32]) -> Vec<[f32; 3]> {
        let mut normals = vec![Vector3::zero(); positions.len()];

        for triangle in indices.chunks_exact(3) {
            let i0 = triangle[0] as usize;
            let i1 = triangle[1] as usize;
            let i2 = triangle[2] as usize;

            let v0 = Vector3::from(positions[i0]);
            let v1 = Vector3::from(positions[i1]);
            let v2 = Vector3::from(positions[i2]);

            let face_normal = (v1 - v0).cross(v2 - v0);
            normals[i0] += face_normal;
            normals[i1] += face_normal;
            normals[i2] += face_normal;
        }

        normals
            .into_iter()
            .map(|n| {
                if n.magnitude2() > 0.0 {
                    n.normalize().into()
                } else {
                    // Degenerate or unreferenced vertex
                    [0.0, 0.0, 1.0]
                }
            })
            .collect()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Material this mesh references, if any.
    pub fn material(&self) -> Option<&MaterialId> {
        self.material.as_ref()
    }

    pub fn vertex_count(&self) -> u32 {
        self.vertices.len() as u32
    }

    pub fn triangle_count(&self) -> u32 {
        self.index_count / 3
    }

    /// Iterates over the stored vertex positions.
    pub fn positions(&self) -> impl Iterator<Item = [f32; 3]> + '_ {
        self.vertices.iter().map(|v| v.position)
    }

    /// Arithmetic mean of the stored vertex positions.
    pub fn centroid(&self) -> Vector3<f32> {
        geometry::centroid(self.positions())
    }

    /// Axis-aligned bounds of the stored vertex positions.
    pub fn bounds(&self) -> Option<Aabb> {
        Aabb::from_positions(self.positions())
    }

    /// Translates the mesh so the centroid of its vertex positions sits on
    /// the local origin. Material bindings are untouched.
    ///
    /// Returns the offset that was applied.
    pub fn recenter(&mut self) -> Vector3<f32> {
        let offset = -self.centroid();
        geometry::translate(self.vertices.iter_mut().map(|v| &mut v.position), offset);
        offset
    }

    fn init_gpu_resources(&mut self, device: &Device) {
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Vertex Buffer"),
            contents: bytemuck::cast_slice(&self.vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });

        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Index Buffer"),
            contents: bytemuck::cast_slice(&self.indices),
            usage: wgpu::BufferUsages::INDEX,
        });

        self.vertex_buffer = Some(vertex_buffer);
        self.index_buffer = Some(index_buffer);
    }
}

/// GPU resources backing an object's transform uniform.
pub struct ObjectGpuResources {
    pub transform_buffer: wgpu::Buffer,
    pub transform_bind_group: wgpu::BindGroup,
}

/// A named, renderable group of mesh nodes with a shared transform.
pub struct Object {
    pub name: String,
    pub meshes: Vec<Mesh>,
    pub transform: Matrix4<f32>,
    pub visible: bool,
    pub gpu_resources: Option<ObjectGpuResources>,
}

impl Object {
    /// Create a new object with an identity transform.
    pub fn new(name: impl Into<String>, meshes: Vec<Mesh>) -> Self {
        Self {
            name: name.into(),
            meshes,
            transform: Matrix4::identity(),
            visible: true,
            gpu_resources: None,
        }
    }

    /// Get the transform bind group for rendering
    pub fn transform_bind_group(&self) -> Option<&wgpu::BindGroup> {
        self.gpu_resources
            .as_ref()
            .map(|res| &res.transform_bind_group)
    }

    /// Uploads mesh buffers and the transform uniform to the GPU.
    pub fn init_gpu_resources(&mut self, device: &Device) {
        for mesh in self.meshes.iter_mut() {
            mesh.init_gpu_resources(device);
        }

        // cgmath matrices are column-major, which is what the GPU expects
        let transform_data: &[f32; 16] = self.transform.as_ref();

        let transform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Transform Uniform Buffer"),
            contents: bytemuck::cast_slice(transform_data),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let transform_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Transform Bind Group Layout"),
                entries: &[wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                }],
            });

        let transform_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Transform Bind Group"),
            layout: &transform_bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: transform_buffer.as_entire_binding(),
            }],
        });

        self.gpu_resources = Some(ObjectGpuResources {
            transform_buffer,
            transform_bind_group,
        });
    }
}

/// Extension trait for drawing meshes within a render pass.
pub trait DrawMesh<'a> {
    fn draw_mesh(&mut self, mesh: &'a Mesh);
}

impl<'a, 'b> DrawMesh<'b> for wgpu::RenderPass<'a>
where
    'b: 'a,
{
    fn draw_mesh(&mut self, mesh: &'b Mesh) {
        let vertex_buffer = match &mesh.vertex_buffer {
            Some(buffer) => buffer,
            None => return, // Skip drawing if not uploaded
        };
        let index_buffer = match &mesh.index_buffer {
            Some(buffer) => buffer,
            None => return,
        };

        self.set_vertex_buffer(0, vertex_buffer.slice(..));
        self.set_index_buffer(index_buffer.slice(..), wgpu::IndexFormat::Uint32);
        self.draw_indexed(0..mesh.index_count, 0, 0..1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOLERANCE: f32 = 1e-6;

    fn corner_mesh() -> Mesh {
        Mesh::new(
            "corner",
            vec![[0.0, 0.0, 0.0], [2.0, 0.0, 0.0], [0.0, 2.0, 0.0]],
            vec![[0.0, 0.0, 1.0]; 3],
            vec![0, 1, 2],
            Some("gray".to_string()),
        )
    }

    #[test]
    fn test_mesh_counts() {
        let mesh = corner_mesh();
        assert_eq!(mesh.vertex_count(), 3);
        assert_eq!(mesh.triangle_count(), 1);
        assert_eq!(mesh.material(), Some(&"gray".to_string()));
    }

    #[test]
    fn test_recenter_offsets_vertices_by_negated_centroid() {
        let mut mesh = corner_mesh();
        let offset = mesh.recenter();

        assert!((offset.x + 2.0 / 3.0).abs() < TOLERANCE);
        assert!((offset.y + 2.0 / 3.0).abs() < TOLERANCE);
        assert!(offset.z.abs() < TOLERANCE);

        let positions: Vec<[f32; 3]> = mesh.positions().collect();
        assert!((positions[0][0] + 2.0 / 3.0).abs() < TOLERANCE);
        assert!((positions[0][1] + 2.0 / 3.0).abs() < TOLERANCE);
        assert!((positions[1][0] - 4.0 / 3.0).abs() < TOLERANCE);
        assert!((positions[2][1] - 4.0 / 3.0).abs() < TOLERANCE);
    }

    #[test]
    fn test_recenter_is_idempotent() {
        let mut mesh = corner_mesh();
        mesh.recenter();
        let second = mesh.recenter();
        assert!(second.magnitude() < TOLERANCE);
    }

    #[test]
    fn test_vertex_normals_from_ccw_triangle_point_up() {
        let positions = vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]];
        let normals = Mesh::vertex_normals(&positions, &[0, 1, 2]);

        for normal in normals {
            assert!((normal[0]).abs() < TOLERANCE);
            assert!((normal[1]).abs() < TOLERANCE);
            assert!((normal[2] - 1.0).abs() < TOLERANCE);
        }
    }

    #[test]
    fn test_vertex_normals_for_degenerate_triangle_fall_back() {
        let positions = vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [2.0, 0.0, 0.0]];
        let normals = Mesh::vertex_normals(&positions, &[0, 1, 2]);
        assert_eq!(normals, vec![[0.0, 0.0, 1.0]; 3]);
    }
}

use wgpu::Device;

use crate::gfx::{
    camera::camera_utils::CameraManager,
    resources::material::{Material, MaterialId, MaterialManager},
};

use super::object::Object;

/// Main scene containing objects, materials, and camera.
///
/// The scene is an explicitly owned container: the import pipeline and the
/// render engine both receive it as a parameter, which keeps the pipeline
/// testable without any ambient global state.
pub struct Scene {
    pub camera_manager: CameraManager,
    pub objects: Vec<Object>,
    pub material_manager: MaterialManager,
}

impl Scene {
    /// Creates a new empty scene with the given camera manager
    pub fn new(camera_manager: CameraManager) -> Self {
        Self {
            camera_manager,
            objects: Vec::new(),
            material_manager: MaterialManager::new(),
        }
    }

    /// Updates the scene (camera matrices, etc.)
    pub fn update(&mut self) {
        self.camera_manager.camera.update_view_proj();
    }

    /// Appends a finished object to the scene as a single root addition.
    ///
    /// The object's name is made unique within the scene first.
    pub fn add_object(&mut self, mut object: Object) {
        object.name = self.ensure_unique_name(&object.name);
        self.objects.push(object);
    }

    /// Number of objects currently in the scene.
    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    /// Gets the material a mesh should render with.
    ///
    /// Falls back to the default material when the mesh has no material
    /// assigned or the referenced material does not exist.
    pub fn material_for(&self, material_id: Option<&MaterialId>) -> &Material {
        self.material_manager.material_for(material_id)
    }

    /// Initializes GPU resources for all objects and materials.
    ///
    /// Must be called after the GPU context is available and before rendering.
    pub fn init_gpu_resources(&mut self, device: &Device, queue: &wgpu::Queue) {
        for object in self.objects.iter_mut() {
            object.init_gpu_resources(device);
        }

        self.material_manager.update_all_gpu_resources(device, queue);
    }

    pub fn ensure_unique_name(&self, desired_name: &str) -> String {
        let mut counter = 0;
        let mut test_name = desired_name.to_string();

        while self.objects.iter().any(|obj| obj.name == test_name) {
            counter += 1;
            test_name = format!("{} ({})", desired_name, counter);
        }

        test_name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::camera::{CameraController, CameraManager, OrbitCamera};
    use cgmath::Vector3;

    fn test_scene() -> Scene {
        let camera = OrbitCamera::new(10.0, 0.4, 0.0, Vector3::new(0.0, 0.0, 0.0), 1.0);
        let controller = CameraController::new(0.005, 0.1);
        Scene::new(CameraManager::new(camera, controller))
    }

    #[test]
    fn test_add_object_increments_count_by_one() {
        let mut scene = test_scene();
        assert_eq!(scene.object_count(), 0);

        scene.add_object(Object::new("model", Vec::new()));
        assert_eq!(scene.object_count(), 1);
    }

    #[test]
    fn test_duplicate_object_names_are_made_unique() {
        let mut scene = test_scene();
        scene.add_object(Object::new("model", Vec::new()));
        scene.add_object(Object::new("model", Vec::new()));

        assert_eq!(scene.objects[0].name, "model");
        assert_eq!(scene.objects[1].name, "model (1)");
    }

    #[test]
    fn test_unknown_material_falls_back_to_default() {
        let scene = test_scene();
        let missing = "missing".to_string();
        assert_eq!(scene.material_for(Some(&missing)).name, "default");
        assert_eq!(scene.material_for(None).name, "default");
    }
}

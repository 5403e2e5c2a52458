//! Model import pipeline: OBJ/MTL loading, normalization, scene insertion.
//!
//! An import is two chained asynchronous stages: the material definitions
//! load and parse first, then the geometry loads with its material references
//! resolved against the already-parsed set. Every mesh node is then recentered
//! on its own vertex centroid before the finished object is appended to the
//! scene in a single step.
//!
//! Failures are terminal for the call and leave the scene untouched; there is
//! no retry and no partial insertion. Progress observers are advisory only.

use std::fmt;
use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::{Path, PathBuf};

use log::{debug, info, warn};
use thiserror::Error;

use super::resources::material::Material;
use super::scene::{Mesh, Object, Scene};

/// Why an asset could not be loaded.
#[derive(Debug, Error)]
pub enum AssetError {
    #[error("could not read asset")]
    Fetch(#[from] io::Error),
    #[error("could not parse asset")]
    Parse(#[from] tobj::LoadError),
}

/// Import failure taxonomy.
///
/// A material failure aborts the pipeline before any geometry is fetched; a
/// geometry failure aborts before the scene is mutated. Both carry the
/// underlying cause. Retrying is the caller's business.
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("failed to load material definitions from {}", .path.display())]
    Material {
        path: PathBuf,
        #[source]
        source: AssetError,
    },
    #[error("failed to load geometry from {}", .path.display())]
    Geometry {
        path: PathBuf,
        #[source]
        source: AssetError,
    },
}

/// Which asset of the pair a progress notification refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadStage {
    Materials,
    Geometry,
}

impl fmt::Display for LoadStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadStage::Materials => write!(f, "materials"),
            LoadStage::Geometry => write!(f, "geometry"),
        }
    }
}

/// How far a load has progressed, in bytes.
///
/// Advisory only: observers may see zero or many of these per stage, and
/// nothing about the import outcome depends on them.
#[derive(Debug, Clone, Copy)]
pub struct LoadProgress {
    pub stage: LoadStage,
    pub loaded: u64,
    pub total: u64,
}

impl LoadProgress {
    pub fn percent(&self) -> f32 {
        if self.total == 0 {
            100.0
        } else {
            self.loaded as f32 / self.total as f32 * 100.0
        }
    }
}

/// Optional callback receiving advisory load progress.
pub type ProgressObserver<'a> = &'a mut dyn FnMut(LoadProgress);

/// Ready-made observer that logs progress percentages.
pub fn log_progress(progress: LoadProgress) {
    info!("loading {}: {:.2}%", progress.stage, progress.percent());
}

/// Parsed material definitions, keyed by name.
///
/// Produced by the material stage and then shared read-only: the geometry
/// stage resolves `usemtl` references against it, and on success its entries
/// are registered with the scene's material manager.
pub struct MaterialSet {
    materials: Vec<tobj::Material>,
    by_name: std::collections::HashMap<String, usize>,
}

impl MaterialSet {
    pub fn len(&self) -> usize {
        self.materials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.materials.is_empty()
    }

    /// Looks up a material definition by name.
    pub fn get(&self, name: &str) -> Option<&tobj::Material> {
        self.by_name.get(name).map(|&index| &self.materials[index])
    }

    /// Name of the material at `index`, as referenced by a mesh node.
    ///
    /// Unnamed definitions resolve to `None` so the mesh falls back to the
    /// default material at render time.
    fn name_of(&self, index: usize) -> Option<&str> {
        self.materials
            .get(index)
            .map(|mtl| mtl.name.as_str())
            .filter(|name| !name.is_empty())
    }

    fn iter(&self) -> impl Iterator<Item = &tobj::Material> {
        self.materials.iter()
    }
}

/// Imports one model from a material-definition/geometry asset pair and
/// appends it to the scene.
///
/// The stages run strictly in order: materials load and parse first; only on
/// success does the geometry load, with its material references bound to the
/// parsed set; every mesh node is recentered on its own centroid; finally the
/// object is appended to the scene as a single root addition. On any failure
/// the scene is left exactly as it was.
pub async fn import_model(
    scene: &mut Scene,
    material_source: impl AsRef<Path>,
    geometry_source: impl AsRef<Path>,
    mut observer: Option<ProgressObserver<'_>>,
) -> Result<(), ImportError> {
    let material_source = material_source.as_ref();
    let geometry_source = geometry_source.as_ref();

    let materials = load_material_set(material_source, &mut observer).await?;
    debug!(
        "parsed {} material definition(s) from {}",
        materials.len(),
        material_source.display()
    );

    let object = load_object(geometry_source, &materials, &mut observer).await?;

    // Everything fallible has succeeded; this block is the only scene
    // mutation of the whole import.
    for mtl in materials.iter() {
        if mtl.name.is_empty() || scene.material_manager.get(&mtl.name).is_some() {
            continue;
        }
        scene.material_manager.add(Material::from_mtl(mtl));
    }
    scene.add_object(object);

    info!("imported model from {}", geometry_source.display());
    Ok(())
}

/// Stage one: fetch and parse the material definitions.
async fn load_material_set(
    path: &Path,
    observer: &mut Option<ProgressObserver<'_>>,
) -> Result<MaterialSet, ImportError> {
    let material_error = |source| ImportError::Material {
        path: path.to_path_buf(),
        source,
    };

    let bytes = read_asset(path, LoadStage::Materials, observer)
        .map_err(|e| material_error(AssetError::Fetch(e)))?;

    let (materials, name_index) = tobj::load_mtl_buf(&mut bytes.as_slice())
        .map_err(|e| material_error(AssetError::Parse(e)))?;

    let by_name = name_index
        .iter()
        .map(|(name, &index)| (name.clone(), index))
        .collect();

    Ok(MaterialSet { materials, by_name })
}

/// Stage two: fetch and parse the geometry, then normalize each mesh node.
async fn load_object(
    path: &Path,
    materials: &MaterialSet,
    observer: &mut Option<ProgressObserver<'_>>,
) -> Result<Object, ImportError> {
    let geometry_error = |source| ImportError::Geometry {
        path: path.to_path_buf(),
        source,
    };

    let bytes = read_asset(path, LoadStage::Geometry, observer)
        .map_err(|e| geometry_error(AssetError::Fetch(e)))?;

    let load_options = tobj::LoadOptions {
        triangulate: true,
        single_index: true,
        ..Default::default()
    };

    // Material references resolve against the set parsed in stage one; the
    // geometry parser never re-fetches the material asset.
    let (models, _) = tobj::load_obj_buf(&mut bytes.as_slice(), &load_options, |_mtl_path| {
        Ok((
            materials.materials.clone(),
            materials
                .by_name
                .iter()
                .map(|(name, &index)| (name.clone(), index))
                .collect(),
        ))
    })
    .map_err(|e| geometry_error(AssetError::Parse(e)))?;

    let mut meshes = Vec::with_capacity(models.len());
    for model in &models {
        let mesh = &model.mesh;

        let positions: Vec<[f32; 3]> = mesh
            .positions
            .chunks_exact(3)
            .map(|p| [p[0], p[1], p[2]])
            .collect();

        let normals: Vec<[f32; 3]> =
            if !mesh.normals.is_empty() && mesh.normals.len() == mesh.positions.len() {
                mesh.normals
                    .chunks_exact(3)
                    .map(|n| [n[0], n[1], n[2]])
                    .collect()
            } else {
                warn!(
                    "mesh '{}' has no usable normals, generating from faces",
                    model.name
                );
                Mesh::vertex_normals(&positions, &mesh.indices)
            };

        let material = mesh
            .material_id
            .and_then(|id| materials.name_of(id))
            .map(str::to_owned);

        meshes.push(Mesh::new(
            model.name.clone(),
            positions,
            normals,
            mesh.indices.clone(),
            material,
        ));
    }

    // Normalize every mesh node onto its own local origin. This is per-mesh
    // by contract: nodes that were placed relative to each other collapse
    // onto their own centroids.
    for mesh in &mut meshes {
        if let Some(bounds) = mesh.bounds() {
            let extents = bounds.extents();
            debug!(
                "mesh '{}': {} triangles, extents {:.3} x {:.3} x {:.3}",
                mesh.name(),
                mesh.triangle_count(),
                extents.x,
                extents.y,
                extents.z
            );
        }
        mesh.recenter();
    }

    let name = models
        .first()
        .map(|model| model.name.clone())
        .filter(|name| !name.is_empty())
        .or_else(|| {
            path.file_stem()
                .map(|stem| stem.to_string_lossy().into_owned())
        })
        .unwrap_or_else(|| "model".to_string());

    Ok(Object::new(name, meshes))
}

const READ_CHUNK: usize = 64 * 1024;

/// Reads an asset into memory, reporting byte progress along the way.
fn read_asset(
    path: &Path,
    stage: LoadStage,
    observer: &mut Option<ProgressObserver<'_>>,
) -> io::Result<Vec<u8>> {
    let file = File::open(path)?;
    let total = file.metadata()?.len();
    let mut reader = BufReader::new(file);

    let mut bytes = Vec::with_capacity(total as usize);
    let mut chunk = [0u8; READ_CHUNK];

    loop {
        let read = reader.read(&mut chunk)?;
        if read == 0 {
            break;
        }
        bytes.extend_from_slice(&chunk[..read]);
        notify(
            observer,
            LoadProgress {
                stage,
                loaded: bytes.len() as u64,
                total,
            },
        );
    }

    // Empty assets still announce completion once
    if bytes.is_empty() {
        notify(
            observer,
            LoadProgress {
                stage,
                loaded: 0,
                total,
            },
        );
    }

    Ok(bytes)
}

fn notify(observer: &mut Option<ProgressObserver<'_>>, progress: LoadProgress) {
    if let Some(callback) = observer.as_mut() {
        callback(progress);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::camera::{CameraController, CameraManager, OrbitCamera};
    use cgmath::Vector3;

    const TOLERANCE: f32 = 1e-6;

    const CORNER_MTL: &str = "\
newmtl gray
Kd 0.8 0.8 0.8
Ks 0.5 0.5 0.5
Ns 32.0
d 1.0
";

    const CORNER_OBJ: &str = "\
mtllib corner.mtl
o corner
v 0.0 0.0 0.0
v 2.0 0.0 0.0
v 0.0 2.0 0.0
vn 0.0 0.0 1.0
usemtl gray
f 1//1 2//1 3//1
";

    // Two triangles offset from each other; each mesh node must recenter on
    // its own centroid, not on the pair's shared center.
    const TWO_MESH_OBJ: &str = "\
mtllib corner.mtl
o first
v 0.0 0.0 0.0
v 2.0 0.0 0.0
v 0.0 2.0 0.0
vn 0.0 0.0 1.0
usemtl gray
f 1//1 2//1 3//1
o second
v 10.0 0.0 0.0
v 12.0 0.0 0.0
v 10.0 2.0 0.0
f 4//1 5//1 6//1
";

    // References a vertex index that does not exist
    const BROKEN_OBJ: &str = "\
o broken
v 0.0 0.0 0.0
v 1.0 0.0 0.0
f 1 2 9
";

    fn test_scene() -> Scene {
        let camera = OrbitCamera::new(10.0, 0.4, 0.0, Vector3::new(0.0, 0.0, 0.0), 1.0);
        let controller = CameraController::new(0.005, 0.1);
        Scene::new(CameraManager::new(camera, controller))
    }

    fn fixture(name: &str, contents: &str) -> PathBuf {
        let dir = std::env::temp_dir().join("cairn-import-tests");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join(name);
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_corner_triangle_is_recentered() {
        let mtl = fixture("corner.mtl", CORNER_MTL);
        let obj = fixture("corner.obj", CORNER_OBJ);

        let mut scene = test_scene();
        pollster::block_on(import_model(&mut scene, &mtl, &obj, None)).unwrap();

        assert_eq!(scene.object_count(), 1);
        let object = &scene.objects[0];
        assert_eq!(object.name, "corner");
        assert_eq!(object.meshes.len(), 1);

        // Original vertices shift by the negated centroid (-2/3, -2/3, 0)
        let positions: Vec<[f32; 3]> = object.meshes[0].positions().collect();
        let expected = [
            [-2.0 / 3.0, -2.0 / 3.0, 0.0],
            [4.0 / 3.0, -2.0 / 3.0, 0.0],
            [-2.0 / 3.0, 4.0 / 3.0, 0.0],
        ];
        for (position, expected) in positions.iter().zip(expected.iter()) {
            for axis in 0..3 {
                assert!((position[axis] - expected[axis]).abs() < TOLERANCE);
            }
        }
    }

    #[test]
    fn test_mesh_material_resolves_from_the_parsed_set() {
        let mtl = fixture("resolve.mtl", CORNER_MTL);
        let obj = fixture("resolve.obj", CORNER_OBJ);

        let mut scene = test_scene();
        pollster::block_on(import_model(&mut scene, &mtl, &obj, None)).unwrap();

        let mesh = &scene.objects[0].meshes[0];
        assert_eq!(mesh.material(), Some(&"gray".to_string()));

        let material = scene.material_for(mesh.material());
        assert_eq!(material.name, "gray");
        assert_eq!(material.base_color, [0.8, 0.8, 0.8, 1.0]);
        assert_eq!(material.shininess, 32.0);
    }

    #[test]
    fn test_each_mesh_recenters_on_its_own_centroid() {
        let mtl = fixture("two.mtl", CORNER_MTL);
        let obj = fixture("two.obj", TWO_MESH_OBJ);

        let mut scene = test_scene();
        pollster::block_on(import_model(&mut scene, &mtl, &obj, None)).unwrap();

        assert_eq!(scene.object_count(), 1);
        let object = &scene.objects[0];
        assert_eq!(object.meshes.len(), 2);

        // Both meshes land on their own origin even though the second sat at
        // x ~ 10 before import
        for mesh in &object.meshes {
            let centroid = mesh.centroid();
            assert!(centroid.x.abs() < TOLERANCE);
            assert!(centroid.y.abs() < TOLERANCE);
            assert!(centroid.z.abs() < TOLERANCE);
        }
    }

    #[test]
    fn test_material_failure_leaves_scene_untouched() {
        let obj = fixture("untouched.obj", CORNER_OBJ);
        let missing_mtl = std::env::temp_dir().join("cairn-import-tests/does-not-exist.mtl");

        let mut scene = test_scene();
        let mut stages = Vec::new();
        let mut observer = |progress: LoadProgress| stages.push(progress.stage);

        let result = pollster::block_on(import_model(
            &mut scene,
            &missing_mtl,
            &obj,
            Some(&mut observer),
        ));

        assert!(matches!(
            result,
            Err(ImportError::Material {
                source: AssetError::Fetch(_),
                ..
            })
        ));
        assert_eq!(scene.object_count(), 0);

        // The geometry asset was never fetched
        assert!(!stages.contains(&LoadStage::Geometry));
    }

    #[test]
    fn test_geometry_fetch_failure_leaves_scene_untouched() {
        let mtl = fixture("geo-fetch.mtl", CORNER_MTL);
        let missing_obj = std::env::temp_dir().join("cairn-import-tests/does-not-exist.obj");

        let mut scene = test_scene();
        let result = pollster::block_on(import_model(&mut scene, &mtl, &missing_obj, None));

        assert!(matches!(
            result,
            Err(ImportError::Geometry {
                source: AssetError::Fetch(_),
                ..
            })
        ));
        assert_eq!(scene.object_count(), 0);
    }

    #[test]
    fn test_geometry_parse_failure_leaves_scene_untouched() {
        let mtl = fixture("geo-parse.mtl", CORNER_MTL);
        let obj = fixture("geo-parse.obj", BROKEN_OBJ);

        let mut scene = test_scene();
        let result = pollster::block_on(import_model(&mut scene, &mtl, &obj, None));

        assert!(matches!(
            result,
            Err(ImportError::Geometry {
                source: AssetError::Parse(_),
                ..
            })
        ));
        assert_eq!(scene.object_count(), 0);
    }

    #[test]
    fn test_progress_is_advisory_only() {
        let mtl = fixture("progress.mtl", CORNER_MTL);
        let obj = fixture("progress.obj", CORNER_OBJ);

        // With an observer
        let mut scene = test_scene();
        let mut notifications = 0u32;
        let mut observer = |progress: LoadProgress| {
            notifications += 1;
            assert!(progress.loaded <= progress.total);
            assert!(progress.percent() <= 100.0);
        };
        pollster::block_on(import_model(&mut scene, &mtl, &obj, Some(&mut observer))).unwrap();
        assert!(notifications > 0);
        assert_eq!(scene.object_count(), 1);

        // Without one: identical outcome
        let mut silent_scene = test_scene();
        pollster::block_on(import_model(&mut silent_scene, &mtl, &obj, None)).unwrap();
        assert_eq!(silent_scene.object_count(), 1);

        let loud: Vec<[f32; 3]> = scene.objects[0].meshes[0].positions().collect();
        let silent: Vec<[f32; 3]> = silent_scene.objects[0].meshes[0].positions().collect();
        assert_eq!(loud, silent);
    }

    #[test]
    fn test_obj_without_normals_gets_generated_ones() {
        let mtl = fixture("no-normals.mtl", CORNER_MTL);
        let obj = fixture(
            "no-normals.obj",
            "\
mtllib no-normals.mtl
o flat
v 0.0 0.0 0.0
v 1.0 0.0 0.0
v 0.0 1.0 0.0
usemtl gray
f 1 2 3
",
        );

        let mut scene = test_scene();
        pollster::block_on(import_model(&mut scene, &mtl, &obj, None)).unwrap();

        assert_eq!(scene.object_count(), 1);
        assert_eq!(scene.objects[0].meshes[0].vertex_count(), 3);
    }
}

//! Mesh loading: the loader interface consumed by the world, plus file and
//! in-memory implementations.
//!
//! Meshes are plain triangle soups. Polygons are fan-triangulated on import so
//! consumers only ever see index triples.

mod mesh;

pub use mesh::{parse_obj, parse_off};

use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Vertex positions plus triangle index triples into them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TriangleMesh {
    pub vertices: Vec<Vec3>,
    pub faces: Vec<[u32; 3]>,
}

impl TriangleMesh {
    pub fn new(vertices: Vec<Vec3>, faces: Vec<[u32; 3]>) -> Self {
        Self { vertices, faces }
    }

    /// Axis-aligned bounds of all vertices, `None` for an empty mesh.
    pub fn bounds(&self) -> Option<(Vec3, Vec3)> {
        let first = *self.vertices.first()?;
        Some(
            self.vertices
                .iter()
                .fold((first, first), |(lo, hi), v| (lo.min(*v), hi.max(*v))),
        )
    }

    /// Check that every face index refers to an existing vertex.
    pub fn validate(&self, path: &Path) -> Result<(), AssetLoadError> {
        let vertex_count = self.vertices.len();
        for (face, tri) in self.faces.iter().enumerate() {
            if let Some(&index) = tri.iter().find(|&&i| i as usize >= vertex_count) {
                return Err(AssetLoadError::IndexOutOfRange {
                    path: path.to_path_buf(),
                    face,
                    index,
                    vertex_count,
                });
            }
        }
        Ok(())
    }
}

/// Errors from resolving or parsing a mesh asset.
#[derive(Debug, thiserror::Error)]
pub enum AssetLoadError {
    #[error("mesh not found: {0}")]
    NotFound(PathBuf),
    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{path}:{line}: {message}")]
    Parse {
        path: PathBuf,
        line: usize,
        message: String,
    },
    #[error("unsupported mesh format: {0}")]
    UnsupportedFormat(PathBuf),
    #[error("{path}: face {face} references vertex {index} but only {vertex_count} exist")]
    IndexOutOfRange {
        path: PathBuf,
        face: usize,
        index: u32,
        vertex_count: usize,
    },
}

/// Resolves a mesh path into a triangle soup.
pub trait MeshLoader {
    fn load(&self, path: &Path) -> Result<TriangleMesh, AssetLoadError>;
}

/// Loads `.off` and `.obj` files, resolving relative paths against a root.
#[derive(Debug, Clone, Default)]
pub struct FileMeshLoader {
    root: Option<PathBuf>,
}

impl FileMeshLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: Some(root.into()),
        }
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        match &self.root {
            Some(root) if path.is_relative() => root.join(path),
            _ => path.to_path_buf(),
        }
    }
}

impl MeshLoader for FileMeshLoader {
    fn load(&self, path: &Path) -> Result<TriangleMesh, AssetLoadError> {
        let full = self.resolve(path);
        let ext = full
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        let parse: fn(&str, &Path) -> Result<TriangleMesh, AssetLoadError> = match ext.as_deref() {
            Some("off") => parse_off,
            Some("obj") => parse_obj,
            _ => return Err(AssetLoadError::UnsupportedFormat(full)),
        };

        let text = std::fs::read_to_string(&full).map_err(|source| {
            if source.kind() == std::io::ErrorKind::NotFound {
                AssetLoadError::NotFound(full.clone())
            } else {
                AssetLoadError::Io {
                    path: full.clone(),
                    source,
                }
            }
        })?;

        let mesh = parse(&text, &full)?;
        mesh.validate(&full)?;
        tracing::debug!(
            path = %full.display(),
            vertices = mesh.vertices.len(),
            faces = mesh.faces.len(),
            "loaded mesh"
        );
        Ok(mesh)
    }
}

/// Serves meshes registered by path. Used for built-in shapes and tests.
#[derive(Debug, Clone, Default)]
pub struct MemoryMeshLoader {
    meshes: BTreeMap<PathBuf, TriangleMesh>,
}

impl MemoryMeshLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, path: impl Into<PathBuf>, mesh: TriangleMesh) {
        self.meshes.insert(path.into(), mesh);
    }

    pub fn len(&self) -> usize {
        self.meshes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.meshes.is_empty()
    }
}

impl MeshLoader for MemoryMeshLoader {
    fn load(&self, path: &Path) -> Result<TriangleMesh, AssetLoadError> {
        let mesh = self
            .meshes
            .get(path)
            .cloned()
            .ok_or_else(|| AssetLoadError::NotFound(path.to_path_buf()))?;
        mesh.validate(path)?;
        Ok(mesh)
    }
}

/// Unit tetrahedron, handy as a default convex mesh.
pub fn tetrahedron() -> TriangleMesh {
    TriangleMesh::new(
        vec![
            Vec3::new(1.0, 1.0, 1.0),
            Vec3::new(-1.0, -1.0, 1.0),
            Vec3::new(-1.0, 1.0, -1.0),
            Vec3::new(1.0, -1.0, -1.0),
        ],
        vec![[0, 1, 2], [0, 3, 1], [0, 2, 3], [1, 3, 2]],
    )
}

pub fn crate_info() -> &'static str {
    "arena-assets v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_temp(suffix: &str, contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn load_off_file() {
        let file = write_temp(
            ".off",
            "OFF\n4 2 0\n0 0 0\n1 0 0\n1 1 0\n0 1 0\n3 0 1 2\n3 0 2 3\n",
        );
        let mesh = FileMeshLoader::new().load(file.path()).unwrap();
        assert_eq!(mesh.vertices.len(), 4);
        assert_eq!(mesh.faces, vec![[0, 1, 2], [0, 2, 3]]);
    }

    #[test]
    fn load_obj_file_with_root() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("tri.obj"),
            "v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n",
        )
        .unwrap();
        let loader = FileMeshLoader::with_root(dir.path());
        let mesh = loader.load(Path::new("tri.obj")).unwrap();
        assert_eq!(mesh.faces, vec![[0, 1, 2]]);
    }

    #[test]
    fn missing_file_is_not_found() {
        let err = FileMeshLoader::new()
            .load(Path::new("/definitely/not/here.off"))
            .unwrap_err();
        assert!(matches!(err, AssetLoadError::NotFound(_)));
    }

    #[test]
    fn unknown_extension_rejected() {
        let file = write_temp(".stl", "solid x");
        let err = FileMeshLoader::new().load(file.path()).unwrap_err();
        assert!(matches!(err, AssetLoadError::UnsupportedFormat(_)));
    }

    #[test]
    fn out_of_range_face_rejected() {
        let file = write_temp(".off", "OFF\n3 1 0\n0 0 0\n1 0 0\n0 1 0\n3 0 1 7\n");
        let err = FileMeshLoader::new().load(file.path()).unwrap_err();
        assert!(matches!(
            err,
            AssetLoadError::IndexOutOfRange {
                face: 0,
                index: 7,
                vertex_count: 3,
                ..
            }
        ));
    }

    #[test]
    fn memory_loader_serves_registered_meshes() {
        let mut loader = MemoryMeshLoader::new();
        loader.insert("builtin/tetra", tetrahedron());
        assert_eq!(loader.len(), 1);
        let mesh = loader.load(Path::new("builtin/tetra")).unwrap();
        assert_eq!(mesh.faces.len(), 4);
        assert!(matches!(
            loader.load(Path::new("builtin/cow")),
            Err(AssetLoadError::NotFound(_))
        ));
    }

    #[test]
    fn bounds_cover_vertices() {
        let (lo, hi) = tetrahedron().bounds().unwrap();
        assert_eq!(lo, Vec3::splat(-1.0));
        assert_eq!(hi, Vec3::splat(1.0));
        assert!(TriangleMesh::default().bounds().is_none());
    }
}

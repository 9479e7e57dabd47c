//! Navigation mesh generation for viewer scenes: geometry collection, tiled
//! voxel navmesh building, the generate/delete lifecycle and GeoJSON export.

pub mod builder;
pub mod collector;
pub mod config;
pub mod context;
pub mod debug_visual;
pub mod error;
pub mod export;
pub mod lifecycle;
pub mod math;
pub mod navmesh;
pub mod scene;

pub use builder::{MeshBuilder, TiledNavMeshBuilder};
pub use collector::{CollectedMesh, collect_meshes};
pub use config::{BuildConfig, BuildRequest};
pub use context::{RedrawSurface, ViewerContext, Viewport};
pub use debug_visual::DebugVisual;
pub use error::{BuildError, ExportError, GenerateError};
pub use export::{DirectorySink, FileSink, MemorySink, export_polygons};
pub use lifecycle::{GenerateOutcome, GeneratorState, NavMeshGenerator};
pub use navmesh::NavMesh;
pub use scene::{Scene, SceneNode, TriangleMesh};

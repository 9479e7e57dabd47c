//! GeoJSON export of the debug visual.
//!
//! Every surface becomes its own single-feature document. The polygon ring is
//! the surface position buffer as-is: not closed, not deduplicated, no winding
//! fix.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, info};

use crate::debug_visual::{DebugSurface, DebugVisual};
use crate::error::ExportError;

pub const EXPORT_FILE_NAME: &str = "geometry.geojson";
pub const EXPORT_MIME_TYPE: &str = "application/json";

/// Destination for exported files
pub trait FileSink {
    fn save(&mut self, file_name: &str, mime_type: &str, contents: &[u8]) -> io::Result<()>;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolygonGeometry {
    #[serde(rename = "type")]
    pub kind: String,
    pub coordinates: Vec<Vec<[f32; 3]>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoJsonFeature {
    #[serde(rename = "type")]
    pub kind: String,
    pub geometry: PolygonGeometry,
    pub properties: Map<String, Value>,
}

pub fn surface_to_feature(surface: &DebugSurface) -> GeoJsonFeature {
    GeoJsonFeature {
        kind: "Feature".to_string(),
        geometry: PolygonGeometry {
            kind: "Polygon".to_string(),
            coordinates: vec![surface.vertices().collect()],
        },
        properties: Map::new(),
    }
}

/// Write one file per surface; returns how many files were saved
pub fn export_polygons(visual: &DebugVisual, sink: &mut dyn FileSink) -> Result<usize, ExportError> {
    let mut saved = 0;
    for surface in visual.surfaces() {
        let feature = surface_to_feature(surface);
        let contents = serde_json::to_vec(&feature)?;
        sink.save(EXPORT_FILE_NAME, EXPORT_MIME_TYPE, &contents)?;
        debug!(
            "Exported tile {:02},{:02} ({} vertices)",
            surface.tile.0,
            surface.tile.1,
            surface.vertex_count()
        );
        saved += 1;
    }
    info!("Exported {} navmesh surface(s)", saved);
    Ok(saved)
}

/// Saves into a directory; a taken name gets a ` (n)` suffix before the
/// extension, the way browsers name repeated downloads.
pub struct DirectorySink {
    dir: PathBuf,
    written: Vec<PathBuf>,
}

impl DirectorySink {
    pub fn new<P: AsRef<Path>>(dir: P) -> io::Result<Self> {
        fs::create_dir_all(dir.as_ref())?;
        Ok(Self {
            dir: dir.as_ref().to_path_buf(),
            written: Vec::new(),
        })
    }

    pub fn written(&self) -> &[PathBuf] {
        &self.written
    }

    fn free_path(&self, file_name: &str) -> PathBuf {
        let candidate = self.dir.join(file_name);
        if !candidate.exists() {
            return candidate;
        }
        let (stem, ext) = match file_name.rfind('.') {
            Some(dot) if dot > 0 => (&file_name[..dot], &file_name[dot..]),
            _ => (file_name, ""),
        };
        let mut n = 1;
        loop {
            let candidate = self.dir.join(format!("{} ({}){}", stem, n, ext));
            if !candidate.exists() {
                return candidate;
            }
            n += 1;
        }
    }
}

impl FileSink for DirectorySink {
    fn save(&mut self, file_name: &str, _mime_type: &str, contents: &[u8]) -> io::Result<()> {
        let path = self.free_path(file_name);
        fs::write(&path, contents)?;
        debug!("Wrote {}", path.display());
        self.written.push(path);
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SavedFile {
    pub name: String,
    pub mime_type: String,
    pub contents: Vec<u8>,
}

/// Keeps saved files in memory
#[derive(Debug, Default)]
pub struct MemorySink {
    pub files: Vec<SavedFile>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }
}

impl FileSink for MemorySink {
    fn save(&mut self, file_name: &str, mime_type: &str, contents: &[u8]) -> io::Result<()> {
        self.files.push(SavedFile {
            name: file_name.to_string(),
            mime_type: mime_type.to_string(),
            contents: contents.to_vec(),
        });
        Ok(())
    }
}

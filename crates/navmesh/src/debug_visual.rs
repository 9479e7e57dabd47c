//! Wireframe overlay derived from a built navmesh.

use crate::navmesh::NavMesh;

/// Triangle soup for one tile: flat `[x, y, z, x, y, z, ...]` in draw order
#[derive(Debug, Clone, PartialEq)]
pub struct DebugSurface {
    pub tile: (u32, u32),
    pub positions: Vec<f32>,
}

impl DebugSurface {
    pub fn vertex_count(&self) -> usize {
        self.positions.len() / 3
    }

    pub fn vertices(&self) -> impl Iterator<Item = [f32; 3]> + '_ {
        self.positions.chunks_exact(3).map(|p| [p[0], p[1], p[2]])
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DebugMaterial {
    pub wireframe: bool,
    pub line_width: f32,
    pub emissive: [u8; 3],
}

impl Default for DebugMaterial {
    fn default() -> Self {
        Self {
            wireframe: true,
            line_width: 0.1,
            emissive: [0, 255, 0],
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DebugVisual {
    surfaces: Vec<DebugSurface>,
    material: DebugMaterial,
    viewport: (u32, u32),
    disposed: bool,
}

impl DebugVisual {
    /// One surface per tile that has polygons, each polygon fanned from its
    /// first corner
    pub fn from_navmesh(navmesh: &NavMesh) -> Self {
        let surfaces = navmesh
            .tiles()
            .iter()
            .filter(|tile| !tile.polygons.is_empty())
            .map(|tile| {
                let mut positions = Vec::new();
                for poly in &tile.polygons {
                    let Some(first) = poly.vertices.first() else { continue };
                    for pair in poly.vertices[1..].windows(2) {
                        positions.extend_from_slice(first);
                        positions.extend_from_slice(&pair[0]);
                        positions.extend_from_slice(&pair[1]);
                    }
                }
                DebugSurface {
                    tile: (tile.x, tile.y),
                    positions,
                }
            })
            .collect();

        Self {
            surfaces,
            material: DebugMaterial::default(),
            viewport: (0, 0),
            disposed: false,
        }
    }

    pub fn surfaces(&self) -> &[DebugSurface] {
        &self.surfaces
    }

    pub fn material(&self) -> &DebugMaterial {
        &self.material
    }

    /// Line widths are in screen space, so the overlay tracks the viewport
    pub fn resize(&mut self, width: u32, height: u32) {
        self.viewport = (width, height);
    }

    pub fn viewport(&self) -> (u32, u32) {
        self.viewport
    }

    pub fn vertex_count(&self) -> usize {
        self.surfaces.iter().map(DebugSurface::vertex_count).sum()
    }

    /// Release the GPU-side buffers; the visual is unusable afterwards
    pub fn dispose(&mut self) {
        self.surfaces.clear();
        self.disposed = true;
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }
}

//! Tiled navigation mesh produced by the builder.
//!
//! Tiles sit on a regular grid anchored at `origin`. Each tile owns its
//! convex walkable polygons plus the links that cross into neighbouring
//! tiles, so consumers never have to re-derive adjacency.

use serde::Serialize;

use crate::config::BuildConfig;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NavPolygon {
    /// Corners in scene space, counter-clockwise seen from above
    pub vertices: Vec<[f32; 3]>,
}

impl NavPolygon {
    pub fn new(vertices: Vec<[f32; 3]>) -> Self {
        Self { vertices }
    }

    pub fn min_axis(&self, axis: usize) -> f32 {
        self.vertices.iter().map(|v| v[axis]).fold(f32::INFINITY, f32::min)
    }

    pub fn max_axis(&self, axis: usize) -> f32 {
        self.vertices.iter().map(|v| v[axis]).fold(f32::NEG_INFINITY, f32::max)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TileSide {
    West,
    East,
    South,
    North,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TileLink {
    pub poly: usize,
    pub side: TileSide,
    pub neighbour: (u32, u32),
    pub neighbour_poly: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NavMeshTile {
    pub x: u32,
    pub y: u32,
    pub bmin: [f32; 3],
    pub bmax: [f32; 3],
    pub polygons: Vec<NavPolygon>,
    pub links: Vec<TileLink>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NavMesh {
    pub origin: [f32; 3],
    pub tile_width: f32,
    pub tile_height: f32,
    pub tiles_x: u32,
    pub tiles_y: u32,
    pub config: BuildConfig,
    tiles: Vec<NavMeshTile>,
}

impl NavMesh {
    pub fn new(
        origin: [f32; 3],
        tile_width: f32,
        tiles_x: u32,
        tiles_y: u32,
        config: BuildConfig,
        tiles: Vec<NavMeshTile>,
    ) -> Self {
        Self {
            origin,
            tile_width,
            tile_height: tile_width,
            tiles_x,
            tiles_y,
            config,
            tiles,
        }
    }

    /// Navmesh for a scene with nothing to walk on
    pub fn empty(config: BuildConfig) -> Self {
        Self::new([0.0; 3], config.tile_world_size(), 0, 0, config, Vec::new())
    }

    /// Number of grid tiles, including tiles without polygons
    pub fn tile_count(&self) -> usize {
        self.tiles_x as usize * self.tiles_y as usize
    }

    pub fn polygon_count(&self) -> usize {
        self.tiles.iter().map(|t| t.polygons.len()).sum()
    }

    pub fn link_count(&self) -> usize {
        self.tiles.iter().map(|t| t.links.len()).sum()
    }

    pub fn tiles(&self) -> &[NavMeshTile] {
        &self.tiles
    }

    pub fn tile_at(&self, x: u32, y: u32) -> Option<&NavMeshTile> {
        self.tiles.iter().find(|t| t.x == x && t.y == y)
    }

    pub(crate) fn tile_index(&self, x: u32, y: u32) -> Option<usize> {
        self.tiles.iter().position(|t| t.x == x && t.y == y)
    }

    pub(crate) fn tiles_mut(&mut self) -> &mut [NavMeshTile] {
        &mut self.tiles
    }

    pub fn is_empty(&self) -> bool {
        self.polygon_count() == 0
    }
}

//! Tiled navmesh construction.
//!
//! Pipeline per tile: rasterize into a heightfield padded by the border,
//! filter spans, build the compact heightfield, erode by the agent radius and
//! merge the walkable core into rectangles. Tiles are stitched afterwards.
//!
//! Everything runs with Z up. Scene geometry is brought into that frame
//! according to `BuildConfig::up_axis` and the finished navmesh is mapped
//! back, so callers only ever see scene coordinates.

mod compact;
mod heightfield;
mod polygons;

use tokio::sync::OnceCell;
use tracing::{debug, info};

use crate::collector::CollectedMesh;
use crate::config::BuildConfig;
use crate::error::BuildError;
use crate::math::{Bounds, UpAxis, triangle_normal};
use crate::navmesh::{NavMesh, NavMeshTile, NavPolygon, TileLink, TileSide};

use compact::CompactHeightfield;
use heightfield::{Heightfield, SPAN_MAX_HEIGHT};
use polygons::merge_walkable_cells;

/// Largest heightfield (in columns) a single tile may allocate
const MAX_TILE_COLUMNS: usize = 1 << 22;

static VOXELIZER: OnceCell<&'static str> = OnceCell::const_new();

/// Process-wide sequencing point awaited before the first build.
///
/// The voxelizer keeps no global state, so the only work done here is
/// announcing it once. Later calls return immediately.
pub async fn init() {
    VOXELIZER
        .get_or_init(|| async {
            tokio::task::yield_now().await;
            let version = env!("CARGO_PKG_VERSION");
            info!("Voxelizer ready (navview-navmesh {})", version);
            version
        })
        .await;
}

pub fn is_initialized() -> bool {
    VOXELIZER.initialized()
}

/// Turns collected scene meshes into a navmesh
pub trait MeshBuilder {
    fn build(&self, meshes: &[CollectedMesh<'_>], config: &BuildConfig) -> Result<NavMesh, BuildError>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct TiledNavMeshBuilder;

impl MeshBuilder for TiledNavMeshBuilder {
    fn build(&self, meshes: &[CollectedMesh<'_>], config: &BuildConfig) -> Result<NavMesh, BuildError> {
        build_tiled_navmesh(meshes, config)
    }
}

struct InputTriangle {
    verts: [[f32; 3]; 3],
    walkable: bool,
}

pub fn build_tiled_navmesh(meshes: &[CollectedMesh<'_>], config: &BuildConfig) -> Result<NavMesh, BuildError> {
    config.validate()?;

    if meshes.is_empty() {
        debug!("No input meshes, returning an empty navmesh");
        return Ok(NavMesh::empty(*config));
    }

    let walkable_thr = config.walkable_slope_angle.to_radians().cos();
    let mut triangles = Vec::new();
    let mut bounds = Bounds::empty();

    for mesh in meshes {
        for t in 0..mesh.mesh.triangle_count() {
            let scene_verts = mesh.world_triangle(t).ok_or_else(|| BuildError::InvalidGeometry {
                mesh: mesh.name.to_string(),
                reason: format!("triangle {} references a vertex out of range", t),
            })?;
            if scene_verts.iter().flatten().any(|c| !c.is_finite()) {
                return Err(BuildError::InvalidGeometry {
                    mesh: mesh.name.to_string(),
                    reason: format!("triangle {} has a non-finite vertex", t),
                });
            }
            let verts = config.up_axis.to_build_triangle(scene_verts);
            for v in &verts {
                bounds.include(v);
            }
            let walkable = triangle_normal(&verts)[2] > walkable_thr;
            triangles.push(InputTriangle { verts, walkable });
        }
    }

    if triangles.is_empty() || bounds.is_empty() || bounds.extent(0) <= 0.0 || bounds.extent(1) <= 0.0 {
        return Err(BuildError::DegenerateBounds);
    }

    let tile_world = config.tile_world_size();
    let tiles_x = (bounds.extent(0) / tile_world).ceil().max(1.0) as u64;
    let tiles_y = (bounds.extent(1) / tile_world).ceil().max(1.0) as u64;
    // Float-to-int casts saturate, so a huge extent still ends up here
    let required = tiles_x.saturating_mul(tiles_y);
    if required > config.max_tiles as u64 {
        return Err(BuildError::TooManyTiles {
            required,
            limit: config.max_tiles,
        });
    }
    let (tiles_x, tiles_y) = (tiles_x as u32, tiles_y as u32);

    info!(
        "Building navmesh: {} triangles, {}x{} tiles ({} cells per tile edge)",
        triangles.len(),
        tiles_x,
        tiles_y,
        config.tile_size
    );

    let mut tiles = Vec::with_capacity(required as usize);
    for y in 0..tiles_y {
        for x in 0..tiles_x {
            tiles.push(build_tile(x, y, &bounds, &triangles, config)?);
        }
    }

    let mut navmesh = NavMesh::new(bounds.min, tile_world, tiles_x, tiles_y, *config, tiles);
    stitch_tiles(&mut navmesh);
    to_scene_frame(&mut navmesh, config.up_axis);

    info!(
        "Navmesh built: {} tiles, {} polygons, {} tile links",
        navmesh.tile_count(),
        navmesh.polygon_count(),
        navmesh.link_count()
    );
    Ok(navmesh)
}

fn build_tile(
    x: u32,
    y: u32,
    bounds: &Bounds,
    triangles: &[InputTriangle],
    config: &BuildConfig,
) -> Result<NavMeshTile, BuildError> {
    let tile_world = config.tile_world_size();
    let border = config.border_size as f32 * config.cs;

    let tile_min = [
        bounds.min[0] + x as f32 * tile_world,
        bounds.min[1] + y as f32 * tile_world,
        bounds.min[2],
    ];
    let tile_max = [
        tile_min[0] + tile_world,
        tile_min[1] + tile_world,
        bounds.max[2],
    ];

    let size = config.tile_size as usize + config.border_size as usize * 2;
    if size * size > MAX_TILE_COLUMNS {
        return Err(BuildError::Voxelization {
            x,
            y,
            reason: format!("{}x{} columns exceed the per-tile limit", size, size),
        });
    }

    // Leave headroom above the highest surface for clearance checks
    let hf_bmin = [tile_min[0] - border, tile_min[1] - border, bounds.min[2]];
    let hf_bmax = [
        tile_max[0] + border,
        tile_max[1] + border,
        bounds.max[2] + config.walkable_height as f32 * config.ch,
    ];
    let layers = ((hf_bmax[2] - hf_bmin[2]) / config.ch).ceil();
    if layers > SPAN_MAX_HEIGHT as f32 {
        return Err(BuildError::Voxelization {
            x,
            y,
            reason: format!("{} height layers exceed the span limit {}", layers, SPAN_MAX_HEIGHT),
        });
    }

    let mut hf = Heightfield::new(size, size, hf_bmin, hf_bmax, config.cs, config.ch);
    for tri in triangles {
        hf.rasterize_triangle(&tri.verts, tri.walkable, config.walkable_climb);
    }

    hf.filter_low_hanging_walkable_obstacles(config.walkable_climb);
    hf.filter_ledge_spans(config.walkable_height, config.walkable_climb);
    hf.filter_walkable_low_height_spans(config.walkable_height);

    let mut chf = CompactHeightfield::build(&hf, config.walkable_height, config.walkable_climb, config.border_size);
    chf.erode_walkable_area(config.walkable_radius);

    let polygons: Vec<NavPolygon> = merge_walkable_cells(&chf)
        .iter()
        .map(|rect| NavPolygon::new(rect.world_corners(&chf)))
        .collect();

    debug!(
        "[Tile {:02},{:02}] {} spans, {} walkable, {} polygons",
        x,
        y,
        hf.span_count(),
        chf.walkable_count(),
        polygons.len()
    );

    Ok(NavMeshTile {
        x,
        y,
        bmin: tile_min,
        bmax: tile_max,
        polygons,
        links: Vec::new(),
    })
}

/// Map a navmesh built with Z up back into scene coordinates
fn to_scene_frame(navmesh: &mut NavMesh, up: UpAxis) {
    if up == UpAxis::Z {
        return;
    }
    navmesh.origin = up.from_build(navmesh.origin);
    for tile in navmesh.tiles_mut() {
        let (a, b) = (up.from_build(tile.bmin), up.from_build(tile.bmax));
        tile.bmin = [a[0].min(b[0]), a[1].min(b[1]), a[2].min(b[2])];
        tile.bmax = [a[0].max(b[0]), a[1].max(b[1]), a[2].max(b[2])];
        for poly in &mut tile.polygons {
            poly.vertices = up.polygon_from_build(std::mem::take(&mut poly.vertices));
        }
    }
}

/// Mean floor height of a polygon still in the build frame
fn floor_height(poly: &NavPolygon) -> f32 {
    if poly.vertices.is_empty() {
        return 0.0;
    }
    poly.vertices.iter().map(|v| v[2]).sum::<f32>() / poly.vertices.len() as f32
}

/// Link polygons that share a stretch of a tile boundary at a climbable step
fn stitch_tiles(navmesh: &mut NavMesh) {
    let eps = navmesh.config.cs * 0.25;
    let max_step = navmesh.config.walkable_climb as f32 * navmesh.config.ch;

    let mut pending = Vec::new();
    for y in 0..navmesh.tiles_y {
        for x in 0..navmesh.tiles_x {
            let Some(a) = navmesh.tile_at(x, y) else { continue };
            if let Some(b) = navmesh.tile_at(x + 1, y) {
                let boundary = a.bmax[0];
                for (pa, pb) in boundary_pairs(a, b, 0, boundary, eps, max_step) {
                    pending.push(((x, y), pa, TileSide::East, (x + 1, y), pb));
                    pending.push(((x + 1, y), pb, TileSide::West, (x, y), pa));
                }
            }
            if let Some(b) = navmesh.tile_at(x, y + 1) {
                let boundary = a.bmax[1];
                for (pa, pb) in boundary_pairs(a, b, 1, boundary, eps, max_step) {
                    pending.push(((x, y), pa, TileSide::North, (x, y + 1), pb));
                    pending.push(((x, y + 1), pb, TileSide::South, (x, y), pa));
                }
            }
        }
    }

    for ((tx, ty), poly, side, neighbour, neighbour_poly) in pending {
        if let Some(idx) = navmesh.tile_index(tx, ty) {
            navmesh.tiles_mut()[idx].links.push(TileLink {
                poly,
                side,
                neighbour,
                neighbour_poly,
            });
        }
    }
}

/// Polygon pairs touching `boundary` along `axis`, `a` on the low side
fn boundary_pairs(
    a: &NavMeshTile,
    b: &NavMeshTile,
    axis: usize,
    boundary: f32,
    eps: f32,
    max_step: f32,
) -> Vec<(usize, usize)> {
    let across = 1 - axis;
    let mut pairs = Vec::new();
    for (ia, pa) in a.polygons.iter().enumerate() {
        if (pa.max_axis(axis) - boundary).abs() > eps {
            continue;
        }
        for (ib, pb) in b.polygons.iter().enumerate() {
            if (pb.min_axis(axis) - boundary).abs() > eps {
                continue;
            }
            let overlap = pa.max_axis(across).min(pb.max_axis(across)) - pa.min_axis(across).max(pb.min_axis(across));
            if overlap > eps && (floor_height(pa) - floor_height(pb)).abs() <= max_step {
                pairs.push((ia, ib));
            }
        }
    }
    pairs
}

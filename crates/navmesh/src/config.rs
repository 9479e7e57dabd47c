// config.rs - voxelization & tiling parameters
//
// Cell size/height are world units. Walkable height/climb are in cell-height
// voxels, walkable radius and border size in cell-size voxels, tile size in
// cells along each horizontal axis.

use std::ops::RangeInclusive;

use navview_shared::config::Config;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::BuildError;
use crate::math::UpAxis;

pub const DEFAULT_TILE_SIZE: u32 = 25;

/// Range offered to users for the tile-size override
pub const TILE_SIZE_RANGE: RangeInclusive<u32> = 3..=50;

/// Tile budget ceiling: 14 tile bits in a Recast polygon reference
pub const MAX_TILES_LIMIT: u32 = 1 << 14;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildConfig {
    #[serde(default = "default_cs")]
    pub cs: f32,
    #[serde(default = "default_ch")]
    pub ch: f32,
    #[serde(default = "default_walkable_height")]
    pub walkable_height: u32,
    #[serde(default = "default_walkable_climb")]
    pub walkable_climb: u32,
    #[serde(default = "default_walkable_radius")]
    pub walkable_radius: u32,
    #[serde(default = "default_walkable_slope_angle")]
    pub walkable_slope_angle: f32,
    #[serde(default = "default_border_size")]
    pub border_size: u32,
    #[serde(default = "default_tile_size")]
    pub tile_size: u32,
    #[serde(default = "default_max_tiles")]
    pub max_tiles: u32,
    #[serde(default)]
    pub up_axis: UpAxis,
}

fn default_cs() -> f32 { 0.5 }
fn default_ch() -> f32 { 1.0 }
fn default_walkable_height() -> u32 { 1 }
fn default_walkable_climb() -> u32 { 2 }
fn default_walkable_radius() -> u32 { 1 }
fn default_walkable_slope_angle() -> f32 { 45.0 }
fn default_border_size() -> u32 { 3 }
fn default_tile_size() -> u32 { DEFAULT_TILE_SIZE }
fn default_max_tiles() -> u32 { MAX_TILES_LIMIT }

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            cs: default_cs(),
            ch: default_ch(),
            walkable_height: default_walkable_height(),
            walkable_climb: default_walkable_climb(),
            walkable_radius: default_walkable_radius(),
            walkable_slope_angle: default_walkable_slope_angle(),
            border_size: default_border_size(),
            tile_size: default_tile_size(),
            max_tiles: default_max_tiles(),
            up_axis: UpAxis::default(),
        }
    }
}

impl BuildConfig {
    /// Read `NavMesh.*` keys, falling back to the defaults
    pub fn from_config(config: &Config) -> Self {
        let d = Self::default();
        Self {
            cs: config.get_float_default("NavMesh.CellSize", d.cs),
            ch: config.get_float_default("NavMesh.CellHeight", d.ch),
            walkable_height: config.get_uint_default("NavMesh.WalkableHeight", d.walkable_height),
            walkable_climb: config.get_uint_default("NavMesh.WalkableClimb", d.walkable_climb),
            walkable_radius: config.get_uint_default("NavMesh.WalkableRadius", d.walkable_radius),
            walkable_slope_angle: config
                .get_float_default("NavMesh.WalkableSlopeAngle", d.walkable_slope_angle),
            border_size: config.get_uint_default("NavMesh.BorderSize", d.border_size),
            tile_size: config.get_uint_default("NavMesh.TileSize", d.tile_size),
            max_tiles: config.get_uint_default("NavMesh.MaxTiles", d.max_tiles),
            up_axis: match config.get_string_default("NavMesh.UpAxis", "Y").parse::<UpAxis>() {
                Ok(axis) => axis,
                Err(e) => {
                    warn!("NavMesh.UpAxis: {}, using {:?}", e, d.up_axis);
                    d.up_axis
                }
            },
        }
    }

    pub fn validate(&self) -> Result<(), BuildError> {
        if !(self.cs.is_finite() && self.cs > 0.0) {
            return Err(BuildError::InvalidConfig(format!("cell size must be positive, got {}", self.cs)));
        }
        if !(self.ch.is_finite() && self.ch > 0.0) {
            return Err(BuildError::InvalidConfig(format!("cell height must be positive, got {}", self.ch)));
        }
        if self.tile_size == 0 {
            return Err(BuildError::InvalidConfig("tile size must be at least 1".into()));
        }
        if self.walkable_height == 0 {
            return Err(BuildError::InvalidConfig("walkable height must be at least 1".into()));
        }
        if !(self.walkable_slope_angle > 0.0 && self.walkable_slope_angle <= 90.0) {
            return Err(BuildError::InvalidConfig(format!(
                "walkable slope angle must be in (0, 90], got {}",
                self.walkable_slope_angle
            )));
        }
        if self.max_tiles == 0 || self.max_tiles > MAX_TILES_LIMIT {
            return Err(BuildError::InvalidConfig(format!(
                "max tiles must be in 1..={}, got {}",
                MAX_TILES_LIMIT, self.max_tiles
            )));
        }
        Ok(())
    }

    /// Edge length of one tile in world units
    pub fn tile_world_size(&self) -> f32 {
        self.tile_size as f32 * self.cs
    }
}

/// Settings for a single generate call, built fresh from the last accepted
/// configuration plus an optional tile-size override.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BuildRequest {
    pub config: BuildConfig,
    pub tile_size_override: Option<u32>,
}

impl BuildRequest {
    pub fn new(base: &BuildConfig, tile_size: Option<u32>) -> Self {
        let mut config = *base;
        if let Some(size) = tile_size {
            config.tile_size = size;
        }
        Self {
            config,
            tile_size_override: tile_size,
        }
    }

    pub fn overrides_tile_size(&self) -> bool {
        self.tile_size_override.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = BuildConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.tile_world_size(), 12.5);
    }

    #[test]
    fn test_invalid_values() {
        let bad_cs = BuildConfig { cs: 0.0, ..BuildConfig::default() };
        assert!(matches!(bad_cs.validate(), Err(BuildError::InvalidConfig(_))));
        let bad_ch = BuildConfig { ch: f32::NAN, ..BuildConfig::default() };
        assert!(bad_ch.validate().is_err());
        let bad_tile = BuildConfig { tile_size: 0, ..BuildConfig::default() };
        assert!(bad_tile.validate().is_err());
        let bad_slope = BuildConfig { walkable_slope_angle: 95.0, ..BuildConfig::default() };
        assert!(bad_slope.validate().is_err());
        let too_many = BuildConfig { max_tiles: MAX_TILES_LIMIT + 1, ..BuildConfig::default() };
        assert!(too_many.validate().is_err());
    }

    #[test]
    fn test_from_config() {
        let config = Config::from_text("NavMesh.CellSize = 0.25\nNavMesh.TileSize = 40\n", "");
        let build = BuildConfig::from_config(&config);
        assert_eq!(build.cs, 0.25);
        assert_eq!(build.tile_size, 40);
        assert_eq!(build.border_size, 3);
        assert_eq!(build.up_axis, UpAxis::Y);

        let zup = BuildConfig::from_config(&Config::from_text("NavMesh.UpAxis = Z\n", ""));
        assert_eq!(zup.up_axis, UpAxis::Z);
        let bogus = BuildConfig::from_config(&Config::from_text("NavMesh.UpAxis = sideways\n", ""));
        assert_eq!(bogus.up_axis, UpAxis::Y);
    }

    #[test]
    fn test_default_tile_budget() {
        let config = BuildConfig::default();
        assert_eq!(config.max_tiles, 16384);
        // A 1500-unit square scene at the default tile edge fits
        let per_axis = (1500.0 / config.tile_world_size()).ceil() as u32;
        assert!(per_axis * per_axis <= config.max_tiles);
    }

    #[test]
    fn test_serde_defaults() {
        let build: BuildConfig = serde_json::from_str(r#"{"cs": 0.05, "ch": 0.2}"#).unwrap();
        assert_eq!(build.cs, 0.05);
        assert_eq!(build.walkable_climb, 2);
        assert_eq!(build.tile_size, DEFAULT_TILE_SIZE);
        assert_eq!(build.up_axis, UpAxis::Y);
        let json = serde_json::to_value(build).unwrap();
        assert!(json.get("walkableHeight").is_some());
        assert_eq!(json["upAxis"], "y");

        let zup: BuildConfig = serde_json::from_str(r#"{"upAxis": "z"}"#).unwrap();
        assert_eq!(zup.up_axis, UpAxis::Z);
    }

    #[test]
    fn test_request_override() {
        let base = BuildConfig::default();
        let plain = BuildRequest::new(&base, None);
        assert_eq!(plain.config.tile_size, DEFAULT_TILE_SIZE);
        assert!(!plain.overrides_tile_size());

        let custom = BuildRequest::new(&base, Some(40));
        assert_eq!(custom.config.tile_size, 40);
        assert!(custom.overrides_tile_size());
        assert_eq!(base.tile_size, DEFAULT_TILE_SIZE);
    }
}

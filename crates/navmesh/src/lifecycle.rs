//! Navmesh lifecycle: at most one live navmesh with its debug overlay.
//!
//! The generator is either `Empty` or `Built`. A successful `generate` attaches
//! the overlay to the scene and hooks it to the redraw surface; `delete`
//! undoes all of it before another build may start.

use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{error, info};

use crate::builder::{self, MeshBuilder, TiledNavMeshBuilder};
use crate::collector::{collect_meshes, triangle_count};
use crate::config::{BuildConfig, BuildRequest};
use crate::context::{HookId, RedrawSurface, ResizeHook, ViewerContext};
use crate::debug_visual::DebugVisual;
use crate::error::{ExportError, GenerateError};
use crate::export::{FileSink, export_polygons};
use crate::navmesh::NavMesh;
use crate::scene::{HelperKind, NodeId, SceneNode};

/// Scene name of the overlay helper node
pub const DEBUG_NODE_NAME: &str = "navmesh-debug";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeneratorState {
    Empty,
    Built,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerateOutcome {
    Built { tiles: usize, polygons: usize },
    AlreadyGenerated,
}

struct LiveNavMesh {
    navmesh: NavMesh,
    visual: Arc<Mutex<DebugVisual>>,
    node: NodeId,
    hook: HookId,
}

pub struct NavMeshGenerator<B: MeshBuilder = TiledNavMeshBuilder> {
    config: BuildConfig,
    builder: B,
    live: Option<LiveNavMesh>,
}

impl NavMeshGenerator<TiledNavMeshBuilder> {
    pub fn new(config: BuildConfig) -> Self {
        Self::with_builder(config, TiledNavMeshBuilder)
    }
}

impl<B: MeshBuilder> NavMeshGenerator<B> {
    pub fn with_builder(config: BuildConfig, builder: B) -> Self {
        Self {
            config,
            builder,
            live: None,
        }
    }

    pub fn state(&self) -> GeneratorState {
        if self.live.is_some() {
            GeneratorState::Built
        } else {
            GeneratorState::Empty
        }
    }

    pub fn is_generated(&self) -> bool {
        self.live.is_some()
    }

    /// Configuration the next build starts from
    pub fn config(&self) -> &BuildConfig {
        &self.config
    }

    pub fn navmesh(&self) -> Option<&NavMesh> {
        self.live.as_ref().map(|live| &live.navmesh)
    }

    pub fn debug_visual(&self) -> Option<&Arc<Mutex<DebugVisual>>> {
        self.live.as_ref().map(|live| &live.visual)
    }

    /// Scene node carrying the overlay while built
    pub fn debug_node(&self) -> Option<NodeId> {
        self.live.as_ref().map(|live| live.node)
    }

    pub fn builder(&self) -> &B {
        &self.builder
    }

    /// Build a navmesh from the current scene.
    ///
    /// A given `tile_size` is stored and reused by later calls that pass
    /// `None`. While a navmesh is live this is a no-op.
    pub async fn generate<S: RedrawSurface>(
        &mut self,
        ctx: &mut ViewerContext<S>,
        tile_size: Option<u32>,
    ) -> Result<GenerateOutcome, GenerateError> {
        if self.live.is_some() {
            info!("Navigation already generated");
            return Ok(GenerateOutcome::AlreadyGenerated);
        }

        builder::init().await;

        ctx.release_manipulators();

        let request = BuildRequest::new(&self.config, tile_size);
        if let Err(e) = request.config.validate() {
            error!("Rejected navmesh request: {}", e);
            return Err(e.into());
        }
        if request.overrides_tile_size() {
            self.config = request.config;
        }

        let meshes = collect_meshes(ctx.scene.root());
        info!(
            "Generating navmesh from {} mesh(es), {} triangle(s), tile size {}",
            meshes.len(),
            triangle_count(&meshes),
            request.config.tile_size
        );

        let navmesh = match self.builder.build(&meshes, &request.config) {
            Ok(navmesh) => navmesh,
            Err(e) => {
                error!("Navmesh generation failed: {}", e);
                return Err(e.into());
            }
        };

        let visual = Arc::new(Mutex::new(DebugVisual::from_navmesh(&navmesh)));
        let node = ctx
            .scene
            .add(SceneNode::helper(DEBUG_NODE_NAME, HelperKind::DebugOverlay, None));

        let hook_visual = Arc::clone(&visual);
        let mut hook: ResizeHook = Box::new(move |width, height| hook_visual.lock().resize(width, height));
        let (width, height) = ctx.surface.size();
        hook(width, height);
        let hook = ctx.surface.add_resize_hook(hook);

        let outcome = GenerateOutcome::Built {
            tiles: navmesh.tile_count(),
            polygons: navmesh.polygon_count(),
        };
        self.live = Some(LiveNavMesh {
            navmesh,
            visual,
            node,
            hook,
        });
        Ok(outcome)
    }

    /// Tear down the live navmesh; false when there was none
    pub fn delete<S: RedrawSurface>(&mut self, ctx: &mut ViewerContext<S>) -> bool {
        let Some(live) = self.live.take() else {
            return false;
        };
        ctx.scene.remove(live.node);
        ctx.surface.remove_resize_hook(live.hook);
        live.visual.lock().dispose();
        info!("Navmesh deleted");
        true
    }

    pub fn export(&self, sink: &mut dyn FileSink) -> Result<usize, ExportError> {
        let live = self.live.as_ref().ok_or(ExportError::NothingToExport)?;
        let visual = live.visual.lock();
        export_polygons(&visual, sink)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Viewport;
    use crate::math::UpAxis;
    use crate::scene::{Scene, TriangleMesh};

    fn context() -> ViewerContext {
        let scene = Scene::with_nodes(vec![SceneNode::mesh(
            "floor",
            TriangleMesh::ground([0.0, 0.0], [10.0, 10.0], 0.0, UpAxis::Y),
        )]);
        ViewerContext::new(scene, Viewport::new(800, 600))
    }

    #[tokio::test]
    async fn test_generate_and_delete() {
        let mut ctx = context();
        let mut generator = NavMeshGenerator::new(BuildConfig::default());
        assert_eq!(generator.state(), GeneratorState::Empty);

        let outcome = generator.generate(&mut ctx, None).await.unwrap();
        assert!(matches!(outcome, GenerateOutcome::Built { tiles: 1, .. }));
        assert_eq!(generator.state(), GeneratorState::Built);
        assert_eq!(ctx.surface.hook_count(), 1);

        let node = generator.debug_node().unwrap();
        assert!(ctx.scene.find(node).is_some_and(SceneNode::is_helper));
        let visual = Arc::clone(generator.debug_visual().unwrap());
        assert_eq!(visual.lock().viewport(), (800, 600));
        ctx.surface.resize(1024, 768);
        assert_eq!(visual.lock().viewport(), (1024, 768));

        assert!(generator.delete(&mut ctx));
        assert!(!generator.delete(&mut ctx));
        assert!(visual.lock().is_disposed());
        assert!(ctx.scene.find(node).is_none());
        assert_eq!(ctx.surface.hook_count(), 0);
        assert!(generator.navmesh().is_none());
    }

    #[tokio::test]
    async fn test_invalid_override_is_not_stored() {
        let mut ctx = context();
        let mut generator = NavMeshGenerator::new(BuildConfig::default());
        assert!(generator.generate(&mut ctx, Some(0)).await.is_err());
        assert_eq!(generator.config().tile_size, BuildConfig::default().tile_size);
        assert_eq!(generator.state(), GeneratorState::Empty);
    }

    #[test]
    fn test_export_requires_navmesh() {
        let generator = NavMeshGenerator::new(BuildConfig::default());
        let mut sink = crate::export::MemorySink::new();
        assert!(matches!(generator.export(&mut sink), Err(ExportError::NothingToExport)));
    }
}

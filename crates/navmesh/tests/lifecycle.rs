use std::sync::atomic::{AtomicUsize, Ordering};

use navview_navmesh::collector::CollectedMesh;
use navview_navmesh::export::MemorySink;
use navview_navmesh::math::UpAxis;
use navview_navmesh::scene::HelperKind;
use navview_navmesh::{
    BuildConfig, BuildError, GenerateError, GenerateOutcome, GeneratorState, MeshBuilder, NavMesh,
    NavMeshGenerator, Scene, SceneNode, TiledNavMeshBuilder, TriangleMesh, ViewerContext, Viewport,
};

/// Wraps the real builder and records every call
#[derive(Default)]
struct CountingBuilder {
    calls: AtomicUsize,
    mesh_counts: parking_lot::Mutex<Vec<usize>>,
}

impl MeshBuilder for CountingBuilder {
    fn build(&self, meshes: &[CollectedMesh<'_>], config: &BuildConfig) -> Result<NavMesh, BuildError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.mesh_counts.lock().push(meshes.len());
        TiledNavMeshBuilder.build(meshes, config)
    }
}

struct FailingBuilder;

impl MeshBuilder for FailingBuilder {
    fn build(&self, _meshes: &[CollectedMesh<'_>], _config: &BuildConfig) -> Result<NavMesh, BuildError> {
        Err(BuildError::DegenerateBounds)
    }
}

fn floor(min: [f32; 2], max: [f32; 2]) -> SceneNode {
    SceneNode::mesh("floor", TriangleMesh::ground(min, max, 0.0, UpAxis::Y))
}

fn context(nodes: Vec<SceneNode>) -> ViewerContext {
    ViewerContext::new(Scene::with_nodes(nodes), Viewport::new(1280, 720))
}

fn overlay_count(ctx: &ViewerContext) -> usize {
    let mut count = 0;
    ctx.scene.traverse(|node| {
        if matches!(
            node.kind,
            navview_navmesh::scene::NodeKind::Helper {
                helper: HelperKind::DebugOverlay,
                ..
            }
        ) {
            count += 1;
        }
    });
    count
}

#[tokio::test]
async fn flat_floor_builds_one_tile() {
    let mut ctx = context(vec![floor([0.0, 0.0], [10.0, 10.0])]);
    let mut generator = NavMeshGenerator::new(BuildConfig::default());

    let outcome = generator.generate(&mut ctx, None).await.unwrap();
    assert!(matches!(outcome, GenerateOutcome::Built { tiles: 1, polygons } if polygons >= 1));
    let navmesh = generator.navmesh().unwrap();
    assert_eq!(navmesh.tile_count(), 1);
    // Y is up: the walkable surface sits just above the floor
    assert!(navmesh.tiles()[0].polygons.iter().flat_map(|p| &p.vertices).all(|v| v[1] == 1.0));
}

#[tokio::test]
async fn z_up_scene_follows_configured_axis() {
    let mut ctx = context(vec![SceneNode::mesh(
        "floor",
        TriangleMesh::ground([0.0, 0.0], [10.0, 10.0], 0.0, UpAxis::Z),
    )]);
    let mut generator = NavMeshGenerator::new(BuildConfig {
        up_axis: UpAxis::Z,
        ..BuildConfig::default()
    });

    let outcome = generator.generate(&mut ctx, None).await.unwrap();
    assert!(matches!(outcome, GenerateOutcome::Built { tiles: 1, polygons } if polygons >= 1));
    let poly = &generator.navmesh().unwrap().tiles()[0].polygons[0];
    assert!(poly.vertices.iter().all(|v| v[2] == 1.0));
}

#[tokio::test]
async fn huge_scene_is_rejected_before_building() {
    let mut ctx = context(vec![floor([0.0, 0.0], [1e13, 1e13])]);
    let mut generator = NavMeshGenerator::new(BuildConfig::default());

    let result = generator.generate(&mut ctx, None).await;
    assert!(matches!(result, Err(GenerateError::Build(BuildError::TooManyTiles { .. }))));
    assert_eq!(generator.state(), GeneratorState::Empty);
}

#[tokio::test]
async fn empty_scene_builds_empty_navmesh() {
    let mut ctx = context(Vec::new());
    let mut generator = NavMeshGenerator::new(BuildConfig::default());

    let outcome = generator.generate(&mut ctx, None).await.unwrap();
    assert_eq!(outcome, GenerateOutcome::Built { tiles: 0, polygons: 0 });
    assert_eq!(generator.state(), GeneratorState::Built);
    assert!(generator.navmesh().unwrap().is_empty());
}

#[tokio::test]
async fn second_generate_is_a_no_op() {
    let mut ctx = context(vec![floor([0.0, 0.0], [10.0, 10.0])]);
    let mut generator = NavMeshGenerator::with_builder(BuildConfig::default(), CountingBuilder::default());

    generator.generate(&mut ctx, None).await.unwrap();
    let outcome = generator.generate(&mut ctx, Some(40)).await.unwrap();

    assert_eq!(outcome, GenerateOutcome::AlreadyGenerated);
    assert_eq!(generator.builder().calls.load(Ordering::SeqCst), 1);
    assert_eq!(overlay_count(&ctx), 1);
    assert_eq!(ctx.surface.hook_count(), 1);
    // Ignored request must not leak its override
    assert_eq!(generator.config().tile_size, BuildConfig::default().tile_size);
}

#[tokio::test]
async fn regenerate_collects_current_scene() {
    let mut ctx = context(vec![floor([0.0, 0.0], [10.0, 10.0])]);
    let mut generator = NavMeshGenerator::with_builder(BuildConfig::default(), CountingBuilder::default());

    generator.generate(&mut ctx, None).await.unwrap();
    assert!(generator.delete(&mut ctx));
    ctx.scene.add(floor([20.0, 0.0], [30.0, 10.0]));
    generator.generate(&mut ctx, None).await.unwrap();

    assert_eq!(*generator.builder().mesh_counts.lock(), vec![1, 2]);
    assert_eq!(overlay_count(&ctx), 1);
}

#[tokio::test]
async fn tile_size_override_persists() {
    let mut ctx = context(vec![floor([0.0, 0.0], [10.0, 10.0])]);
    let mut generator = NavMeshGenerator::new(BuildConfig::default());

    generator.generate(&mut ctx, Some(40)).await.unwrap();
    assert_eq!(generator.navmesh().unwrap().config.tile_size, 40);
    generator.delete(&mut ctx);

    generator.generate(&mut ctx, None).await.unwrap();
    assert_eq!(generator.config().tile_size, 40);
    assert_eq!(generator.navmesh().unwrap().config.tile_size, 40);
}

#[tokio::test]
async fn manipulators_are_released_before_build() {
    let mut scene = Scene::new();
    let target = scene.add(floor([0.0, 0.0], [10.0, 10.0]));
    scene.add(SceneNode::helper(
        "gizmo",
        HelperKind::TransformGizmo { target },
        Some(TriangleMesh::ground([0.0, 0.0], [1.0, 1.0], 5.0, UpAxis::Y)),
    ));
    let mut ctx = ViewerContext::new(scene, Viewport::new(640, 480));
    let mut generator = NavMeshGenerator::new(BuildConfig::default());

    generator.generate(&mut ctx, None).await.unwrap();
    let mut gizmos = 0;
    ctx.scene.traverse(|node| {
        if node.is_transform_gizmo() {
            gizmos += 1;
        }
    });
    assert_eq!(gizmos, 0);
}

#[tokio::test]
async fn failed_build_leaves_scene_untouched() {
    let mut ctx = context(vec![floor([0.0, 0.0], [10.0, 10.0])]);
    let nodes_before = ctx.scene.len();
    let mut generator = NavMeshGenerator::with_builder(BuildConfig::default(), FailingBuilder);

    let result = generator.generate(&mut ctx, None).await;
    assert!(matches!(result, Err(GenerateError::Build(BuildError::DegenerateBounds))));
    assert_eq!(generator.state(), GeneratorState::Empty);
    assert_eq!(ctx.scene.len(), nodes_before);
    assert_eq!(ctx.surface.hook_count(), 0);
    assert!(generator.debug_visual().is_none());
}

#[tokio::test]
async fn export_ring_follows_surface_buffer() {
    let mut ctx = context(vec![floor([0.0, 0.0], [10.0, 10.0])]);
    let mut generator = NavMeshGenerator::new(BuildConfig::default());
    generator.generate(&mut ctx, None).await.unwrap();

    let mut sink = MemorySink::new();
    let saved = generator.export(&mut sink).unwrap();
    let visual = generator.debug_visual().unwrap().lock();
    assert_eq!(saved, visual.surfaces().len());

    for (file, surface) in sink.files.iter().zip(visual.surfaces()) {
        let doc: serde_json::Value = serde_json::from_slice(&file.contents).unwrap();
        assert_eq!(doc["type"], "Feature");
        assert_eq!(doc["geometry"]["type"], "Polygon");
        let ring: Vec<[f32; 3]> = serde_json::from_value(doc["geometry"]["coordinates"][0].clone()).unwrap();
        let expected: Vec<[f32; 3]> = surface.vertices().collect();
        assert_eq!(ring, expected);
    }
}

#[tokio::test]
async fn demo_scene_builds() {
    let scene = Scene::from_json(include_str!("../../../demos/plaza.json")).unwrap();
    let meshes = navview_navmesh::collect_meshes(scene.root());
    let names: Vec<&str> = meshes.iter().map(|m| m.name).collect();
    assert_eq!(names, vec!["ground", "terrace", "kiosk"]);

    let mut ctx = ViewerContext::new(scene, Viewport::new(1280, 720));
    let mut generator = NavMeshGenerator::new(BuildConfig::default());
    let outcome = generator.generate(&mut ctx, None).await.unwrap();
    assert!(matches!(outcome, GenerateOutcome::Built { tiles: 4, polygons } if polygons > 4));
    assert!(generator.navmesh().unwrap().link_count() > 0);
}

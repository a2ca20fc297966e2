//! Integration tests for RenderScene
//!
//! End-to-end scenarios through the public API: a world, a resource
//! manager and a spatial index wired to a scene.
//!
//! Run with: cargo test --test scene_integration_tests


use prism_render_scene::glam::{Quat, Vec3};
use prism_render_scene::prism::camera::Frustum;
use prism_render_scene::prism::culling::{LayerMask, Sphere};
use prism_render_scene::prism::scene::{ComponentKind, ModelInstanceMesh, SceneSnapshot};
use prism_render_scene::prism::resource::AssetManager;
use prism_render_scene::prism::universe::{ComponentHandle, Universe};
use scene_test_utils::{lod_desc, model_desc, scatter, TestScene};

fn all_meshes(scene: &TestScene, frustum: &Frustum) -> Vec<ModelInstanceMesh> {
    let mut meshes: Vec<ModelInstanceMesh> = scene
        .scene
        .model_instance_infos(frustum, Vec3::ZERO, LayerMask::all())
        .into_iter()
        .flatten()
        .collect();
    meshes.sort();
    meshes
}

// ============================================================================
// VISIBILITY SCENARIOS
// ============================================================================

#[test]
fn test_integration_instance_appears_when_model_ready_and_leaves_when_moved() {
    let mut test = TestScene::linear();
    let frustum = Frustum::from_box(Vec3::ZERO, 50.0);
    let entity = test.world.create_entity_at(Vec3::ZERO);
    let handle = test.scene.create_model_instance(entity);

    // No asset bound: nothing to draw
    assert!(all_meshes(&test, &frustum).is_empty());

    let model = test.ready_model("crate.msh", model_desc(2.0, &["crate.mat"]));
    test.scene.set_model_instance_model(handle, Some(model));
    assert_eq!(all_meshes(&test, &frustum), vec![ModelInstanceMesh { model_instance: handle, mesh_index: 0 }]);

    test.world.set_position(entity, Vec3::new(1000.0, 0.0, 0.0));
    test.scene.update();
    assert!(all_meshes(&test, &frustum).is_empty());
}

#[test]
fn test_integration_model_loaded_later_becomes_visible() {
    let mut test = TestScene::octree();
    let frustum = Frustum::from_box(Vec3::ZERO, 50.0);
    let entity = test.world.create_entity_at(Vec3::new(3.0, 0.0, 0.0));
    let handle = test.scene.create_model_instance(entity);
    test.scene.set_model_instance_path(handle, "tree.msh");
    test.scene.update();
    assert!(all_meshes(&test, &frustum).is_empty());

    test.resources().finish_model_load("tree.msh", model_desc(1.0, &["bark.mat", "leaves.mat"])).unwrap();
    test.scene.update();

    assert_eq!(all_meshes(&test, &frustum).len(), 2);
}

#[test]
fn test_integration_spatial_sphere_matches_entity() {
    let mut test = TestScene::octree();
    let positions = scatter(50, 300.0, 7);
    let handles: Vec<_> = positions
        .iter()
        .map(|&position| test.spawn(position, "rock.msh", model_desc(1.5, &["rock.mat"])))
        .collect();

    // Move and rescale half of them
    for (i, &(entity, _)) in handles.iter().enumerate().filter(|(i, _)| i % 2 == 0) {
        test.world.set_position(entity, positions[i] + Vec3::new(10.0, -5.0, 2.0));
        test.world.set_scale(entity, 2.0);
    }
    test.scene.update();

    for &(entity, handle) in &handles {
        let universe = test.scene.universe();
        let expected = Sphere::new(universe.position(entity), 1.5 * universe.scale(entity));
        assert_eq!(test.scene.spatial_index().sphere(handle), Some(expected));
    }
}

#[test]
fn test_integration_octree_and_linear_agree() {
    let mut linear = TestScene::linear();
    let mut octree = TestScene::octree();
    for position in scatter(200, 500.0, 42) {
        linear.spawn(position, "lod.msh", lod_desc(4.0));
        octree.spawn(position, "lod.msh", lod_desc(4.0));
    }

    let frusta = [
        Frustum::perspective(Vec3::ZERO, Quat::IDENTITY, 1.0, 1.6, 0.1, 400.0),
        Frustum::perspective(Vec3::new(100.0, 0.0, 0.0), Quat::from_rotation_y(1.3), 0.6, 1.0, 1.0, 800.0),
        Frustum::orthographic(Vec3::ZERO, Quat::IDENTITY, 120.0, 80.0, 0.0, 300.0),
        Frustum::from_box(Vec3::new(-200.0, 50.0, 0.0), 150.0),
    ];
    for frustum in &frusta {
        let a = all_meshes(&linear, frustum);
        let b = all_meshes(&octree, frustum);
        assert_eq!(a, b);
        // Queries do not mutate: asking again gives the same answer
        assert_eq!(all_meshes(&octree, frustum), b);
    }
}

#[test]
fn test_integration_lod_is_monotonic_in_distance() {
    let mut test = TestScene::linear();
    let (entity, handle) = test.spawn(Vec3::ZERO, "lod.msh", lod_desc(1.0));
    let frustum = Frustum::from_box(Vec3::ZERO, 10_000.0);

    let mut finest_allowed = 0;
    for distance in [0.0, 5.0, 9.9, 10.0, 50.0, 99.0, 100.0, 1000.0, 5000.0] {
        test.world.set_position(entity, Vec3::new(0.0, 0.0, distance));
        test.scene.update();
        let meshes = all_meshes(&test, &frustum);
        assert_eq!(meshes.len(), 1);
        assert_eq!(meshes[0].model_instance, handle);
        assert!(meshes[0].mesh_index >= finest_allowed);
        finest_allowed = meshes[0].mesh_index;
    }
    assert_eq!(finest_allowed, 2);
}

// ============================================================================
// LIGHT INFLUENCE SCENARIOS
// ============================================================================

#[test]
fn test_integration_light_influence_follows_movement() {
    let mut test = TestScene::linear();
    let light_entity = test.world.create_entity_at(Vec3::ZERO);
    let light = test.scene.create_point_light(light_entity);
    test.scene.set_point_light_range(light, 5.0);

    let (entity, handle) = test.spawn(Vec3::new(3.0, 0.0, 0.0), "crate.msh", model_desc(1.0, &["crate.mat"]));
    assert!(test.scene.influenced_geometry(light).contains(&handle));

    test.world.set_position(entity, Vec3::new(10.0, 0.0, 0.0));
    test.scene.update();
    assert!(!test.scene.influenced_geometry(light).contains(&handle));
}

#[test]
fn test_integration_influence_matches_brute_force_after_churn() {
    let mut test = TestScene::octree();
    let mut instances = Vec::new();
    for position in scatter(120, 200.0, 3) {
        instances.push(test.spawn(position, "rock.msh", model_desc(2.0, &["rock.mat"])));
    }
    let mut lights = Vec::new();
    for (i, position) in scatter(12, 200.0, 11).into_iter().enumerate() {
        let entity = test.world.create_entity_at(position);
        let light = test.scene.create_point_light(entity);
        test.scene.set_point_light_range(light, 20.0 + i as f32 * 5.0);
        lights.push(light);
    }

    // Churn: move instances, destroy some, drop a light
    for (i, &(entity, handle)) in instances.iter().enumerate() {
        match i % 3 {
            0 => test.world.set_position(entity, Vec3::new(i as f32, 0.0, -(i as f32))),
            1 => test.scene.destroy_model_instance(handle),
            _ => true,
        };
    }
    test.scene.update();
    test.scene.destroy_point_light(lights.remove(4));

    for &light in &lights {
        let light_sphere = test.scene.point_light_sphere(light).unwrap();
        let mut expected: Vec<ComponentHandle> = instances
            .iter()
            .filter_map(|&(_, handle)| test.scene.spatial_index().sphere(handle).map(|sphere| (handle, sphere)))
            .filter(|(_, sphere)| sphere.intersects(&light_sphere))
            .map(|(handle, _)| handle)
            .collect();
        let mut actual = test.scene.influenced_geometry(light).to_vec();
        expected.sort();
        actual.sort();
        assert_eq!(actual, expected);

        // Every mention names a live, indexed instance
        for handle in actual {
            assert!(test.scene.model_instance(handle).is_some());
            assert!(test.scene.spatial_index().is_added(handle));
        }
    }
}

// ============================================================================
// LIFECYCLE
// ============================================================================

#[test]
fn test_integration_destroy_leaves_no_dangling_entries() {
    let mut test = TestScene::octree();
    let light_entity = test.world.create_entity_at(Vec3::ZERO);
    let light = test.scene.create_point_light(light_entity);

    let mut spawned = Vec::new();
    for position in scatter(30, 8.0, 5) {
        spawned.push(test.spawn(position, "crate.msh", model_desc(1.0, &["crate.mat"])));
    }
    for &(entity, _) in &spawned {
        test.scene.create_component(ComponentKind::Decal, entity);
        test.scene.destroy_entity_components(entity);
        test.world.destroy_entity(entity);
    }

    assert_eq!(test.scene.model_instance_count(), 0);
    assert!(test.scene.spatial_index().is_empty());
    assert!(test.scene.influenced_geometry(light).is_empty());
    assert_eq!(test.scene.subscribed_model_count(), 0);
    let resources = test.resources();
    assert_eq!(resources.model_ref_count("crate.msh"), 0);
    assert_eq!(resources.material_ref_count("crate.mat"), 0);
}

#[test]
fn test_integration_snapshot_round_trip() {
    let mut test = TestScene::linear();
    let (entity, instance) = test.spawn(Vec3::ZERO, "crate.msh", model_desc(1.0, &["a.mat", "b.mat"]));
    test.scene.set_model_instance_material(instance, 0, "painted.mat");
    let light_entity = test.world.create_entity_at(Vec3::new(2.0, 0.0, 0.0));
    let light = test.scene.create_point_light(light_entity);
    test.scene.create_global_light(entity);
    test.scene.create_camera(entity);
    test.scene.create_component(ComponentKind::EmitterSpawnShape, light_entity);

    let json = test.scene.snapshot().to_json().unwrap();
    // Keep the model alive so it is ready again right after the restore
    let _pin = test.resources().load_model("crate.msh");
    test.scene.restore(SceneSnapshot::from_json(&json).unwrap()).unwrap();

    assert_eq!(test.scene.snapshot().to_json().unwrap(), json);
    assert_eq!(test.scene.model_instance_material(instance, 0), Some("painted.mat"));
    assert_eq!(test.scene.influenced_geometry(light), &[instance]);
    assert!(test.scene.has_component(light_entity, ComponentKind::EmitterSpawnShape));
}

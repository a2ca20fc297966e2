use glam::{Quat, Vec3};
use crate::culling::{OctreeSpatialIndex, AABB};
use crate::scene::test_utils::{model_desc, Fixture};
use super::*;

fn light(fixture: &mut Fixture, position: Vec3, range: f32) -> ComponentHandle {
    let entity = fixture.world.create_entity_at(position);
    let handle = fixture.scene.create_point_light(entity);
    fixture.scene.set_point_light_range(handle, range);
    handle
}

// ============================================================================
// Cache
// ============================================================================

#[test]
fn test_cache_mirrors_swap_remove() {
    let mut cache = LightInfluenceCache::default();
    cache.push_light();
    cache.push_light();
    cache.push_light();
    cache.set(2, vec![ComponentHandle(5)]);

    cache.swap_remove(0);

    assert_eq!(cache.len(), 2);
    assert_eq!(cache.list(0), &[ComponentHandle(5)]);
    assert!(cache.list(7).is_empty());
}

#[test]
fn test_cache_insert_unique_and_remove_everywhere() {
    let mut cache = LightInfluenceCache::default();
    cache.push_light();
    cache.push_light();
    cache.insert_unique(0, ComponentHandle(1));
    cache.insert_unique(0, ComponentHandle(1));
    cache.insert_unique(1, ComponentHandle(1));
    cache.insert_unique(1, ComponentHandle(2));

    assert_eq!(cache.list(0), &[ComponentHandle(1)]);

    cache.remove_everywhere(ComponentHandle(1));
    assert!(cache.list(0).is_empty());
    assert_eq!(cache.list(1), &[ComponentHandle(2)]);
}

// ============================================================================
// Detection
// ============================================================================

#[test]
fn test_light_created_after_geometry_detects_it() {
    let mut fixture = Fixture::new();
    let (_, inside) = fixture.spawn(Vec3::new(3.0, 0.0, 0.0), "a.msh", model_desc(1.0, &["a.mat"]));
    let (_, outside) = fixture.spawn(Vec3::new(50.0, 0.0, 0.0), "a.msh", model_desc(1.0, &["a.mat"]));

    let light = light(&mut fixture, Vec3::ZERO, 5.0);

    let influenced = fixture.scene.influenced_geometry(light);
    assert!(influenced.contains(&inside));
    assert!(!influenced.contains(&outside));
}

#[test]
fn test_box_corner_is_rejected_by_sphere_test() {
    let mut fixture = Fixture::new();
    // Inside the light's query box but outside its sphere
    let (_, corner) = fixture.spawn(Vec3::new(4.5, 4.5, 4.5), "a.msh", model_desc(0.5, &["a.mat"]));

    let light = light(&mut fixture, Vec3::ZERO, 5.0);

    assert!(!fixture.scene.influenced_geometry(light).contains(&corner));
}

#[test]
fn test_touching_spheres_do_not_influence() {
    let mut fixture = Fixture::new();
    let (_, touching) = fixture.spawn(Vec3::new(6.0, 0.0, 0.0), "a.msh", model_desc(1.0, &["a.mat"]));

    let light = light(&mut fixture, Vec3::ZERO, 5.0);

    assert!(!fixture.scene.influenced_geometry(light).contains(&touching));
}

#[test]
fn test_geometry_loaded_after_light_is_added() {
    let mut fixture = Fixture::new();
    let light = light(&mut fixture, Vec3::ZERO, 5.0);

    let (_, instance) = fixture.spawn(Vec3::new(2.0, 0.0, 0.0), "a.msh", model_desc(1.0, &["a.mat"]));

    assert_eq!(fixture.scene.influenced_geometry(light), &[instance]);
}

#[test]
fn test_moving_geometry_updates_lists() {
    let mut fixture = Fixture::new();
    let light = light(&mut fixture, Vec3::ZERO, 5.0);
    let (entity, instance) = fixture.spawn(Vec3::new(3.0, 0.0, 0.0), "a.msh", model_desc(1.0, &["a.mat"]));

    fixture.world.set_position(entity, Vec3::new(10.0, 0.0, 0.0));
    fixture.scene.update();
    assert!(fixture.scene.influenced_geometry(light).is_empty());

    fixture.world.set_position(entity, Vec3::new(0.0, 2.0, 0.0));
    fixture.scene.update();
    assert_eq!(fixture.scene.influenced_geometry(light), &[instance]);
}

#[test]
fn test_moving_light_rebuilds_its_list() {
    let mut fixture = Fixture::new();
    let (_, instance) = fixture.spawn(Vec3::new(100.0, 0.0, 0.0), "a.msh", model_desc(1.0, &["a.mat"]));
    let light = light(&mut fixture, Vec3::ZERO, 5.0);
    assert!(fixture.scene.influenced_geometry(light).is_empty());

    let entity = fixture.scene.point_light(light).unwrap().entity();
    fixture.world.set_position(entity, Vec3::new(98.0, 0.0, 0.0));
    fixture.scene.update();

    assert_eq!(fixture.scene.influenced_geometry(light), &[instance]);
}

#[test]
fn test_hidden_and_destroyed_geometry_leaves_lists() {
    let mut fixture = Fixture::new();
    let light = light(&mut fixture, Vec3::ZERO, 5.0);
    let (_, a) = fixture.spawn(Vec3::X, "a.msh", model_desc(1.0, &["a.mat"]));
    let (_, b) = fixture.spawn(Vec3::Y, "a.msh", model_desc(1.0, &["a.mat"]));

    fixture.scene.hide_model_instance(a);
    assert_eq!(fixture.scene.influenced_geometry(light), &[b]);

    fixture.scene.destroy_model_instance(b);
    assert!(fixture.scene.influenced_geometry(light).is_empty());

    fixture.scene.show_model_instance(a);
    assert_eq!(fixture.scene.influenced_geometry(light), &[a]);
}

#[test]
fn test_destroyed_light_keeps_other_lists() {
    let mut fixture = Fixture::new();
    let (_, near_a) = fixture.spawn(Vec3::ZERO, "a.msh", model_desc(1.0, &["a.mat"]));
    let (_, near_c) = fixture.spawn(Vec3::new(40.0, 0.0, 0.0), "a.msh", model_desc(1.0, &["a.mat"]));
    let a = light(&mut fixture, Vec3::ZERO, 5.0);
    let _b = light(&mut fixture, Vec3::new(20.0, 0.0, 0.0), 5.0);
    let c = light(&mut fixture, Vec3::new(40.0, 0.0, 0.0), 5.0);

    fixture.scene.destroy_point_light(a);

    assert_eq!(fixture.scene.influenced_geometry(c), &[near_c]);
    assert!(fixture.scene.influenced_geometry(a).is_empty());
    assert!(!fixture.scene.influenced_geometry(c).contains(&near_a));
}

#[test]
fn test_rebuild_matches_brute_force() {
    let mut fixture = Fixture::with_index(Box::new(OctreeSpatialIndex::new(AABB::new(Vec3::splat(-256.0), Vec3::splat(256.0)), 6)));
    let mut instances = Vec::new();
    for i in 0..40 {
        let position = Vec3::new((i % 8) as f32 * 6.0 - 24.0, 0.0, (i / 8) as f32 * 6.0 - 12.0);
        let (_, handle) = fixture.spawn(position, "a.msh", model_desc(1.5, &["a.mat"]));
        instances.push(handle);
    }
    let lights = [
        light(&mut fixture, Vec3::ZERO, 8.0),
        light(&mut fixture, Vec3::new(-20.0, 0.0, 10.0), 4.0),
        light(&mut fixture, Vec3::new(200.0, 0.0, 0.0), 50.0),
    ];

    fixture.scene.rebuild_light_influence();

    for light in lights {
        let light_sphere = fixture.scene.point_light_sphere(light).unwrap();
        let mut expected: Vec<ComponentHandle> = instances
            .iter()
            .copied()
            .filter(|&h| fixture.scene.spatial_index().sphere(h).unwrap().intersects(&light_sphere))
            .collect();
        let mut actual = fixture.scene.influenced_geometry(light).to_vec();
        expected.sort();
        actual.sort();
        assert_eq!(actual, expected);
    }
}

// ============================================================================
// Mesh lists
// ============================================================================

#[test]
fn test_influenced_meshes_cover_every_submesh() {
    let mut fixture = Fixture::new();
    let light = light(&mut fixture, Vec3::ZERO, 5.0);
    let (_, instance) = fixture.spawn(Vec3::X, "a.msh", model_desc(1.0, &["a.mat", "b.mat", "c.mat"]));

    let meshes = fixture.scene.influenced_geometry_meshes(light);

    assert_eq!(
        meshes,
        (0..3).map(|mesh_index| ModelInstanceMesh { model_instance: instance, mesh_index }).collect::<Vec<_>>()
    );
    assert!(fixture.scene.influenced_geometry_meshes(ComponentHandle(77)).is_empty());
}

#[test]
fn test_influenced_meshes_in_frustum() {
    let mut fixture = Fixture::new();
    let light = light(&mut fixture, Vec3::new(0.0, 0.0, -10.0), 10.0);
    let (_, behind_camera) = fixture.spawn(Vec3::new(0.0, 0.0, -15.0), "a.msh", model_desc(1.0, &["a.mat"]));
    let (_, in_view) = fixture.spawn(Vec3::new(0.0, 0.0, -1.0), "a.msh", model_desc(0.5, &["a.mat"]));
    assert_eq!(fixture.scene.influenced_geometry(light).len(), 2);

    // Camera at -5 looking down +Z: only the instance at -1 is visible
    let rotation = Quat::from_rotation_y(std::f32::consts::PI);
    let frustum = Frustum::perspective(Vec3::new(0.0, 0.0, -5.0), rotation, 1.0, 1.0, 0.1, 50.0);
    let meshes = fixture.scene.influenced_geometry_in_frustum(light, &frustum);

    assert_eq!(meshes, vec![ModelInstanceMesh { model_instance: in_view, mesh_index: 0 }]);
    assert!(!meshes.iter().any(|mesh| mesh.model_instance == behind_camera));
}

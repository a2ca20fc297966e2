use glam::Vec3;
use crate::culling::Sphere;
use crate::resource::AssetManager;
use crate::scene::test_utils::{model_desc, Fixture};
use super::*;

// ============================================================================
// Construction
// ============================================================================

#[test]
fn test_new_scene_is_empty() {
    let fixture = Fixture::new();
    let scene = &fixture.scene;

    assert_eq!(scene.model_instance_count(), 0);
    assert_eq!(scene.point_light_count(), 0);
    assert!(scene.spatial_index().is_empty());
    assert_eq!(scene.lod_multiplier(), 1.0);
}

#[test]
fn test_worker_pool_uses_configured_thread_count() {
    let fixture = Fixture::new();
    assert_eq!(fixture.scene.pool.current_num_threads(), 2);
}

#[test]
fn test_set_lod_multiplier() {
    let mut fixture = Fixture::new();
    fixture.scene.set_lod_multiplier(2.5);
    assert_eq!(fixture.scene.lod_multiplier(), 2.5);
    assert_eq!(fixture.scene.config().lod_multiplier, 2.5);
}

// ============================================================================
// Frame update: moved entities
// ============================================================================

#[test]
fn test_update_pushes_sphere_of_moved_entity() {
    let mut fixture = Fixture::new();
    let (entity, handle) = fixture.spawn(Vec3::ZERO, "crate.msh", model_desc(2.0, &["crate.mat"]));
    assert_eq!(fixture.scene.spatial_index().sphere(handle), Some(Sphere::new(Vec3::ZERO, 2.0)));

    fixture.world.set_position(entity, Vec3::new(5.0, 0.0, 0.0));
    fixture.scene.update();

    assert_eq!(
        fixture.scene.spatial_index().sphere(handle),
        Some(Sphere::new(Vec3::new(5.0, 0.0, 0.0), 2.0))
    );
    let matrix = fixture.scene.model_instance(handle).map(|i| *i.matrix());
    assert_eq!(matrix.map(|m| m.w_axis.truncate()), Some(Vec3::new(5.0, 0.0, 0.0)));
}

#[test]
fn test_update_scales_sphere_radius() {
    let mut fixture = Fixture::new();
    let (entity, handle) = fixture.spawn(Vec3::ZERO, "crate.msh", model_desc(2.0, &["crate.mat"]));

    fixture.world.set_scale(entity, 3.0);
    fixture.scene.update();

    assert_eq!(fixture.scene.spatial_index().sphere(handle), Some(Sphere::new(Vec3::ZERO, 6.0)));
}

#[test]
fn test_moved_entity_without_components_is_ignored() {
    let mut fixture = Fixture::new();
    let entity = fixture.world.create_entity_at(Vec3::ZERO);
    fixture.world.set_position(entity, Vec3::ONE);

    fixture.scene.update();
    fixture.scene.on_entity_moved(Entity(1000));

    assert!(fixture.scene.spatial_index().is_empty());
}

// ============================================================================
// Frame update: asset events
// ============================================================================

#[test]
fn test_update_delivers_model_ready() {
    let mut fixture = Fixture::new();
    let entity = fixture.world.create_entity_at(Vec3::ZERO);
    let handle = fixture.scene.create_model_instance(entity);
    fixture.scene.set_model_instance_path(handle, "crate.msh");
    assert!(!fixture.scene.spatial_index().is_added(handle));

    fixture.resources().finish_model_load("crate.msh", model_desc(1.0, &["crate.mat"])).unwrap();
    assert!(!fixture.scene.model_instance(handle).unwrap().is_ready(), "applied on update only");

    fixture.scene.update();

    assert!(fixture.scene.model_instance(handle).unwrap().is_ready());
    assert!(fixture.scene.spatial_index().is_added(handle));
}

#[test]
fn test_update_delivers_model_unloaded() {
    let mut fixture = Fixture::new();
    let (_, handle) = fixture.spawn(Vec3::ZERO, "crate.msh", model_desc(1.0, &["crate.mat"]));

    assert!(fixture.resources().release_model("crate.msh"));
    fixture.scene.update();

    let instance = fixture.scene.model_instance(handle).unwrap();
    assert!(!instance.is_ready());
    assert!(instance.meshes().is_empty());
    assert!(!fixture.scene.spatial_index().is_added(handle));
}

// ============================================================================
// Clear
// ============================================================================

#[test]
fn test_clear_releases_all_components_and_assets() {
    let mut fixture = Fixture::new();
    let (entity, _) = fixture.spawn(Vec3::ZERO, "crate.msh", model_desc(1.0, &["crate.mat"]));
    fixture.scene.create_point_light(entity);
    fixture.scene.create_global_light(entity);
    let decal = fixture.scene.create_decal(entity);
    fixture.scene.set_decal_material_path(decal, "decal.mat");
    fixture.scene.create_camera(entity);

    fixture.scene.clear();

    assert_eq!(fixture.scene.model_instance_count(), 0);
    assert_eq!(fixture.scene.point_light_count(), 0);
    assert_eq!(fixture.scene.global_light_count(), 0);
    assert!(fixture.scene.decal(decal).is_none());
    assert!(fixture.scene.camera_in_slot("main").is_none());
    assert!(fixture.scene.spatial_index().is_empty());

    let resources = fixture.resources();
    assert_eq!(resources.model_ref_count("crate.msh"), 0);
    assert_eq!(resources.material_ref_count("crate.mat"), 0);
    assert_eq!(resources.material_ref_count("decal.mat"), 0);
}

#[test]
fn test_scene_can_be_reused_after_clear() {
    let mut fixture = Fixture::new();
    fixture.spawn(Vec3::ZERO, "crate.msh", model_desc(1.0, &["crate.mat"]));
    fixture.scene.clear();

    let (_, handle) = fixture.spawn(Vec3::X, "crate.msh", model_desc(1.0, &["crate.mat"]));
    assert!(fixture.scene.model_instance(handle).unwrap().is_ready());
    assert_eq!(fixture.scene.model_instance_count(), 1);

    // Keep the reference manager honest: one model reference per instance
    let model = fixture.resources().load_model("crate.msh");
    assert_eq!(fixture.resources().model_ref_count("crate.msh"), 2);
    fixture.resources().unload_model(&model);
}

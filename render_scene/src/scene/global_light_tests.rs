use glam::Vec3;
use crate::scene::test_utils::Fixture;
use super::*;

#[test]
fn test_first_global_light_becomes_active() {
    let mut fixture = Fixture::new();
    let a = fixture.world.create_entity_at(Vec3::ZERO);
    let b = fixture.world.create_entity_at(Vec3::ZERO);

    let ha = fixture.scene.create_global_light(a);
    let hb = fixture.scene.create_global_light(b);

    assert_eq!(fixture.scene.active_global_light(), Some(ha));
    assert_ne!(ha, hb);
    assert_eq!(fixture.scene.global_light_count(), 2);
}

#[test]
fn test_global_light_defaults() {
    let light = GlobalLight::new(Entity(0));

    assert_eq!(light.diffuse_color, Vec3::ONE);
    assert_eq!(light.diffuse_intensity, 0.0);
    assert_eq!(light.fog_height, 10.0);
    assert_eq!(light.cascades, Vec4::new(3.0, 8.0, 100.0, 300.0));
}

#[test]
fn test_destroy_active_leaves_none_active() {
    let mut fixture = Fixture::new();
    let a = fixture.world.create_entity_at(Vec3::ZERO);
    let b = fixture.world.create_entity_at(Vec3::ZERO);
    let ha = fixture.scene.create_global_light(a);
    fixture.scene.create_global_light(b);

    assert!(fixture.scene.destroy_global_light(ha));

    assert_eq!(fixture.scene.active_global_light(), None);
    assert!(!fixture.scene.destroy_global_light(ha));
}

#[test]
fn test_set_active_global_light() {
    let mut fixture = Fixture::new();
    let a = fixture.world.create_entity_at(Vec3::ZERO);
    let b = fixture.world.create_entity_at(Vec3::ZERO);
    fixture.scene.create_global_light(a);
    let hb = fixture.scene.create_global_light(b);

    fixture.scene.set_active_global_light(Some(hb));
    assert_eq!(fixture.scene.active_global_light(), Some(hb));

    fixture.scene.set_active_global_light(Some(ComponentHandle(99)));
    assert_eq!(fixture.scene.active_global_light(), None, "unknown handles clear the active light");
}

#[test]
fn test_edit_global_light() {
    let mut fixture = Fixture::new();
    let entity = fixture.world.create_entity_at(Vec3::ZERO);
    let handle = fixture.scene.create_global_light(entity);

    fixture.scene.global_light_mut(handle).unwrap().fog_density = 0.25;

    assert_eq!(fixture.scene.global_light(handle).unwrap().fog_density, 0.25);
    assert_eq!(fixture.scene.create_global_light(entity), handle);
    assert_eq!(fixture.scene.global_light(handle).unwrap().fog_density, 0.25, "duplicate create keeps the light");
}

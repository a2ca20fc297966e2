use crate::culling::LayerMask;
use crate::resource::mesh::MeshDesc;
use super::*;

fn one_mesh(material: &str) -> ModelDesc {
    ModelDesc {
        bounding_radius: 1.0,
        bones: Vec::new(),
        meshes: vec![MeshDesc { name: "body".into(), material: material.into() }],
        lods: Vec::new(),
    }
}

// ============================================================================
// Models
// ============================================================================

#[test]
fn test_load_model_shares_handle_and_counts_refs() {
    let mut rm = ResourceManager::new();
    let a = rm.load_model("crate.msh");
    let b = rm.load_model("crate.msh");

    assert!(Arc::ptr_eq(&a, &b));
    assert_eq!(rm.model_ref_count("crate.msh"), 2);
    assert!(!a.is_ready());

    rm.unload_model(&a);
    assert_eq!(rm.model_ref_count("crate.msh"), 1);
    rm.unload_model(&b);
    assert_eq!(rm.model_ref_count("crate.msh"), 0);
    assert_eq!(rm.model_count(), 0);
}

#[test]
fn test_finish_model_load_requires_request() {
    let mut rm = ResourceManager::new();
    assert!(rm.finish_model_load("never.msh", one_mesh("a.mat")).is_err());
}

#[test]
fn test_finish_model_load_makes_ready_and_refs_materials() {
    let mut rm = ResourceManager::new();
    let model = rm.load_model("crate.msh");
    rm.finish_model_load("crate.msh", one_mesh("wood.mat")).unwrap();

    assert!(model.is_ready());
    assert_eq!(rm.material_ref_count("wood.mat"), 1);

    let data = model.data().unwrap();
    assert_eq!(data.meshes()[0].material_path(), "wood.mat");
}

#[test]
fn test_invalid_desc_releases_material_refs() {
    let mut rm = ResourceManager::new();
    let model = rm.load_model("bad.msh");
    let mut desc = one_mesh("wood.mat");
    desc.bounding_radius = -3.0;

    assert!(rm.finish_model_load("bad.msh", desc).is_err());
    assert!(!model.is_ready());
    assert_eq!(rm.material_ref_count("wood.mat"), 0);
}

#[test]
fn test_release_model_drops_data_and_materials() {
    let mut rm = ResourceManager::new();
    let model = rm.load_model("crate.msh");
    rm.finish_model_load("crate.msh", one_mesh("wood.mat")).unwrap();

    assert!(rm.release_model("crate.msh"));
    assert!(!model.is_ready());
    assert_eq!(rm.material_ref_count("wood.mat"), 0);
    assert!(!rm.release_model("crate.msh"), "already released");
}

#[test]
fn test_reload_replaces_material_refs() {
    let mut rm = ResourceManager::new();
    let _model = rm.load_model("crate.msh");
    rm.finish_model_load("crate.msh", one_mesh("wood.mat")).unwrap();
    rm.finish_model_load("crate.msh", one_mesh("metal.mat")).unwrap();

    assert_eq!(rm.material_ref_count("wood.mat"), 0);
    assert_eq!(rm.material_ref_count("metal.mat"), 1);
}

// ============================================================================
// Events
// ============================================================================

#[test]
fn test_events_only_for_subscribed_models() {
    let mut rm = ResourceManager::new();
    let watched = rm.load_model("watched.msh");
    let _ignored = rm.load_model("ignored.msh");
    rm.subscribe(&watched);

    rm.finish_model_load("watched.msh", one_mesh("a.mat")).unwrap();
    rm.finish_model_load("ignored.msh", one_mesh("a.mat")).unwrap();
    rm.release_model("watched.msh");

    let events = rm.drain_events();
    assert_eq!(events.len(), 2);
    assert!(matches!(&events[0], AssetEvent::Ready(m) if m.path() == "watched.msh"));
    assert!(matches!(&events[1], AssetEvent::Unloaded(m) if m.path() == "watched.msh"));
    assert!(rm.drain_events().is_empty());
}

#[test]
fn test_unsubscribe_stops_events() {
    let mut rm = ResourceManager::new();
    let model = rm.load_model("m.msh");
    rm.subscribe(&model);
    assert!(rm.is_subscribed("m.msh"));
    rm.unsubscribe(&model);
    assert!(!rm.is_subscribed("m.msh"));

    rm.finish_model_load("m.msh", one_mesh("a.mat")).unwrap();
    assert!(rm.drain_events().is_empty());
}

// ============================================================================
// Materials
// ============================================================================

#[test]
fn test_material_ready_once_defined() {
    let mut rm = ResourceManager::new();
    let material = rm.load_material("decal.mat");
    assert!(!material.is_ready());
    assert_eq!(material.layer_mask(), LayerMask::DEFAULT);

    let desc = MaterialDesc { layer_mask: LayerMask::layer(4), layer_count: 2 };
    rm.define_material("decal.mat", desc);

    assert!(material.is_ready());
    assert_eq!(material.layer_mask(), LayerMask::layer(4));
    assert_eq!(material.layer_count(), 2);
}

#[test]
fn test_material_defined_before_load_is_ready() {
    let mut rm = ResourceManager::new();
    rm.define_material("x.mat", MaterialDesc::default());
    assert!(rm.load_material("x.mat").is_ready());
}

#[test]
fn test_material_refcount() {
    let mut rm = ResourceManager::new();
    let material = rm.load_material("x.mat");
    rm.add_material_ref(&material);
    assert_eq!(rm.material_ref_count("x.mat"), 2);

    rm.unload_material(&material);
    rm.unload_material(&material);
    assert_eq!(rm.material_ref_count("x.mat"), 0);

    // Unknown material: logged and ignored
    rm.unload_material(&material);
    assert_eq!(rm.material_ref_count("x.mat"), 0);
}

/// AssetManager: the render scene's view of asset loading.
///
/// Loading is reference counted and asynchronous: `load_model` returns a
/// handle immediately and the model becomes ready later. State changes are
/// reported as `AssetEvent`s, but only for models somebody subscribed to.
/// The render scene keeps exactly one subscription per distinct model it
/// references.

use std::sync::Arc;
use super::material::Material;
use super::model::Model;

/// Model state change notification
#[derive(Debug, Clone)]
pub enum AssetEvent {
    /// The model finished loading (or reloaded with new data)
    Ready(Arc<Model>),
    /// The model lost its data
    Unloaded(Arc<Model>),
}

/// Reference-counted asset loading service.
pub trait AssetManager: Send {
    /// Acquire a reference to a model, creating it (not ready) if unknown.
    fn load_model(&mut self, path: &str) -> Arc<Model>;

    /// Release one reference to a model.
    fn unload_model(&mut self, model: &Arc<Model>);

    /// Acquire a reference to a material, creating it if unknown.
    fn load_material(&mut self, path: &str) -> Arc<Material>;

    /// Acquire one more reference to an already loaded material.
    fn add_material_ref(&mut self, material: &Arc<Material>);

    /// Release one reference to a material.
    fn unload_material(&mut self, material: &Arc<Material>);

    /// Start receiving state change events for a model.
    fn subscribe(&mut self, model: &Arc<Model>);

    /// Stop receiving state change events for a model.
    fn unsubscribe(&mut self, model: &Arc<Model>);

    /// Drain pending events in the order they happened.
    fn drain_events(&mut self) -> Vec<AssetEvent>;
}

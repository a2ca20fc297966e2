/// Asset subscriptions shared across model instances.
///
/// Each distinct model referenced by at least one model instance holds
/// exactly one subscription with the asset manager. The subscription is
/// taken by the first referencing instance and dropped with the last.

use std::sync::Arc;
use rustc_hash::FxHashMap;
use crate::resource::{AssetManager, Model, ModelKey};

#[derive(Default)]
pub(crate) struct AssetSubscriptions {
    ref_counts: FxHashMap<ModelKey, u32>,
}

impl AssetSubscriptions {
    pub(crate) fn acquire(&mut self, model: &Arc<Model>, assets: &mut dyn AssetManager) {
        let count = self.ref_counts.entry(model.key()).or_insert(0);
        *count += 1;
        if *count == 1 {
            assets.subscribe(model);
        }
    }

    pub(crate) fn release(&mut self, model: &Arc<Model>, assets: &mut dyn AssetManager) {
        let Some(count) = self.ref_counts.get_mut(&model.key()) else {
            return;
        };
        *count -= 1;
        if *count == 0 {
            self.ref_counts.remove(&model.key());
            assets.unsubscribe(model);
        }
    }

    /// Number of model instances referencing the model.
    pub(crate) fn ref_count(&self, key: ModelKey) -> u32 {
        self.ref_counts.get(&key).copied().unwrap_or(0)
    }

    pub(crate) fn len(&self) -> usize {
        self.ref_counts.len()
    }
}

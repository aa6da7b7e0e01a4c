use std::collections::HashMap;
use std::sync::{Arc, Weak};

use crate::blurring::domain::blur_params::BlurParams;
use crate::shared::image::{Image, ImageId};

/// Blur results indexed by normalized parameters, held through `Weak`.
///
/// The cache never keeps a result alive: once the application drops its
/// last `Arc<Image>`, the entry is dead and the next lookup evicts it and
/// reports a miss. The table is scoped to one source image identity;
/// rescoping to another image drops the whole table.
#[derive(Default)]
pub struct WeakResultCache {
    scope: Option<ImageId>,
    entries: HashMap<BlurParams, Weak<Image>>,
}

impl WeakResultCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn scope(&self) -> Option<ImageId> {
        self.scope
    }

    /// Binds the cache to `source`. A different identity discards every entry.
    pub fn rescope(&mut self, source: Option<ImageId>) {
        if self.scope != source {
            self.entries.clear();
            self.scope = source;
        }
    }

    pub fn lookup(&mut self, source: ImageId, params: BlurParams) -> Option<Arc<Image>> {
        if self.scope != Some(source) {
            return None;
        }
        let params = params.normalized();
        let weak = self.entries.get(&params)?;
        match weak.upgrade() {
            Some(image) => Some(image),
            None => {
                self.entries.remove(&params);
                None
            }
        }
    }

    /// Records `image` as the result for `params` and prunes dead entries,
    /// so the index never outgrows the set of live results plus one. Results
    /// for an image the cache is not scoped to are dropped; nothing could
    /// ever look them up.
    pub fn store(&mut self, source: ImageId, params: BlurParams, image: &Arc<Image>) {
        if self.scope != Some(source) {
            return;
        }
        self.entries.retain(|_, weak| weak.strong_count() > 0);
        self.entries
            .insert(params.normalized(), Arc::downgrade(image));
    }

    /// Discards the index. Images still held elsewhere are unaffected.
    pub fn clear(&mut self) -> usize {
        let dropped = self.entries.len();
        self.entries.clear();
        dropped
    }

    /// Entries currently indexed, including dead ones not yet evicted.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

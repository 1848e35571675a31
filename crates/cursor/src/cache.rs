//! Shared id→node lookup cache of a cursor family.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use contentnav_core::{ContentNode, ContentSource};
use tracing::trace;

/// Memoizing id→node map shared by every cursor cloned or re-rooted from
/// one original root.
///
/// The map is created once per family and only ever referenced, never
/// copied, so that all clones observe the same node instances. Not-found
/// outcomes are cached too, to avoid repeated failed lookups. Clones driven
/// from separate threads share the map; a race on the first access to an
/// identifier may call the source twice, which is tolerated because source
/// lookups are pure; the first stored entry wins and is returned to every
/// racer.
pub struct NodeCache {
    entries: RwLock<HashMap<i64, Option<Arc<dyn ContentNode>>>>,
}

impl NodeCache {
    #[must_use]
    pub fn new() -> Self {
        Self { entries: RwLock::new(HashMap::new()) }
    }

    /// Resolves `id` through the cache, consulting `source` on a miss.
    pub fn get(&self, source: &dyn ContentSource, id: i64) -> Option<Arc<dyn ContentNode>> {
        if let Some(entry) = self.entries.read().expect("cache lock poisoned").get(&id) {
            return entry.clone();
        }
        let fetched = source.get(id);
        trace!(id, found = fetched.is_some(), "content lookup cached");
        let mut entries = self.entries.write().expect("cache lock poisoned");
        entries.entry(id).or_insert(fetched).clone()
    }

    /// Number of cached lookups, hits and misses together.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.read().expect("cache lock poisoned").len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for NodeCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{TestNode, TestSource};
    use contentnav_core::{ContentType, FieldType};
    use rstest::{fixture, rstest};
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingSource {
        inner: TestSource,
        calls: AtomicUsize,
    }

    impl ContentSource for CountingSource {
        fn root(&self) -> Arc<dyn ContentNode> {
            self.inner.root()
        }

        fn get(&self, id: i64) -> Option<Arc<dyn ContentNode>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.inner.get(id)
        }

        fn last_attribute_index(&self) -> i32 {
            self.inner.last_attribute_index()
        }
    }

    #[fixture]
    fn source() -> CountingSource {
        let content_type = ContentType::new("item", vec![FieldType::new("prop")]);
        let inner = TestSource::new(-1)
            .with_node(TestNode::new(1, -1, content_type).with_children(vec![2]))
            .with_root_children(vec![1]);
        CountingSource { inner, calls: AtomicUsize::new(0) }
    }

    #[rstest]
    fn second_lookup_is_served_from_the_cache(source: CountingSource) {
        let cache = NodeCache::new();
        let first = cache.get(&source, 1).expect("node 1");
        let second = cache.get(&source, 1).expect("node 1");
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
    }

    #[rstest]
    fn not_found_outcomes_are_cached(source: CountingSource) {
        let cache = NodeCache::new();
        assert!(cache.get(&source, 99).is_none());
        assert!(cache.get(&source, 99).is_none());
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
    }
}

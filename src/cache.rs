//! Memoization of layout results keyed by a canonical input signature.
//!
//! Entries are immutable once inserted and handed out as [`Arc`]s, so a
//! cached result is the very value that was first computed. The default
//! policy never evicts, which suits one loaded document per session; the
//! LRU policy bounds memory for long-lived embedders.
//!
//! The cache is not thread-safe. A multi-request host should wrap it in a
//! mutex or keep one per session.

use crate::layout::SeedNode;
use crate::model::ProcessGraph;
use lru::LruCache;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::Hash;
use std::num::NonZeroUsize;
use std::sync::Arc;

/// Eviction policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "policy", rename_all = "snake_case")]
pub enum CachePolicy {
    #[default]
    Unbounded,
    /// Keep at most `capacity` entries, evicting the least recently used
    Lru { capacity: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub size: usize,
}

impl CacheStats {
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

pub struct LayoutCache<K: Hash + Eq, V> {
    entries: LruCache<K, Arc<V>>,
    hits: u64,
    misses: u64,
}

impl<K: Hash + Eq, V> Default for LayoutCache<K, V> {
    fn default() -> Self {
        Self::new(CachePolicy::default())
    }
}

impl<K: Hash + Eq + fmt::Debug, V> fmt::Debug for LayoutCache<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LayoutCache")
            .field("len", &self.entries.len())
            .field("hits", &self.hits)
            .field("misses", &self.misses)
            .finish()
    }
}

impl<K: Hash + Eq, V> LayoutCache<K, V> {
    /// A zero LRU capacity is treated as one.
    pub fn new(policy: CachePolicy) -> Self {
        let entries = match policy {
            CachePolicy::Unbounded => LruCache::unbounded(),
            CachePolicy::Lru { capacity } => {
                LruCache::new(NonZeroUsize::new(capacity.max(1)).unwrap_or(NonZeroUsize::MIN))
            }
        };
        Self {
            entries,
            hits: 0,
            misses: 0,
        }
    }

    pub fn get(&mut self, key: &K) -> Option<Arc<V>> {
        let found = self.entries.get(key).cloned();
        if found.is_some() {
            self.hits += 1;
        } else {
            self.misses += 1;
        }
        found
    }

    pub fn contains(&self, key: &K) -> bool {
        self.entries.contains(key)
    }

    /// Insert unless the key is already present; the first value wins.
    pub fn insert(&mut self, key: K, value: V) -> Arc<V> {
        if let Some(existing) = self.entries.get(&key) {
            return Arc::clone(existing);
        }
        let value = Arc::new(value);
        self.entries.put(key, Arc::clone(&value));
        value
    }

    /// Return the cached value or compute, store and return it.
    pub fn get_or_try_insert_with<E>(
        &mut self,
        key: K,
        compute: impl FnOnce() -> Result<V, E>,
    ) -> Result<Arc<V>, E> {
        if let Some(hit) = self.get(&key) {
            tracing::debug!("layout cache hit");
            return Ok(hit);
        }
        tracing::debug!("layout cache miss");
        let value = compute()?;
        Ok(self.insert(key, value))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits,
            misses: self.misses,
            size: self.entries.len(),
        }
    }
}

/// Overview signature: ordered `(label, x, y)` seeds after scaling, plus
/// the viewport the seeds were scaled into. Floats are keyed by their bit
/// patterns, so only bit-identical inputs share an entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OverviewSignature {
    viewport: (u64, u64),
    seeds: Vec<(String, u64, u64)>,
}

impl OverviewSignature {
    pub fn new(seeds: &[SeedNode], width: f64, height: f64) -> Self {
        Self {
            viewport: (width.to_bits(), height.to_bits()),
            seeds: seeds
                .iter()
                .map(|s| (s.id.clone(), s.x.to_bits(), s.y.to_bits()))
                .collect(),
        }
    }
}

impl fmt::Display for OverviewSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (w, h) = self.viewport;
        write!(f, "{}x{}", f64::from_bits(w), f64::from_bits(h))?;
        for (label, x, y) in &self.seeds {
            write!(f, ";{}@{},{}", label, f64::from_bits(*x), f64::from_bits(*y))?;
        }
        Ok(())
    }
}

/// Structural signature of a process graph: ordered `(id, label)` list
/// plus the ordered edge list.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GraphSignature {
    nodes: Vec<(String, String)>,
    edges: Vec<(String, String)>,
}

impl GraphSignature {
    pub fn new(graph: &ProcessGraph) -> Self {
        Self {
            nodes: graph
                .nodes
                .iter()
                .map(|n| (n.id.clone(), n.label.clone()))
                .collect(),
            edges: graph
                .edges
                .iter()
                .map(|e| (e.from.clone(), e.to.clone()))
                .collect(),
        }
    }
}

/// Process graph cache key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum GraphKey {
    /// One cached layout per cluster of the loaded document
    Cluster(String),
    /// Ad-hoc graph, keyed by structure and the width it was laid out for
    Graph(GraphSignature, u64),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Edge, Node};

    #[test]
    fn test_hit_returns_same_value() {
        let mut cache: LayoutCache<String, Vec<u32>> = LayoutCache::default();
        let mut calls = 0;
        let first = cache
            .get_or_try_insert_with("k".to_string(), || {
                calls += 1;
                Ok::<_, ()>(vec![1, 2, 3])
            })
            .unwrap();
        let second = cache
            .get_or_try_insert_with("k".to_string(), || {
                calls += 1;
                Ok::<_, ()>(vec![9])
            })
            .unwrap();

        assert_eq!(calls, 1);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.stats(), CacheStats { hits: 1, misses: 1, size: 1 });
        assert_eq!(cache.stats().hit_rate(), 0.5);
    }

    #[test]
    fn test_insert_is_first_wins() {
        let mut cache: LayoutCache<u8, &str> = LayoutCache::default();
        cache.insert(1, "first");
        let kept = cache.insert(1, "second");
        assert_eq!(*kept, "first");
    }

    #[test]
    fn test_errors_are_not_cached() {
        let mut cache: LayoutCache<u8, u8> = LayoutCache::default();
        assert!(cache.get_or_try_insert_with(1, || Err("boom")).is_err());
        assert!(cache.is_empty());
        assert_eq!(*cache.get_or_try_insert_with(1, || Ok::<_, &str>(7)).unwrap(), 7);
    }

    #[test]
    fn test_lru_evicts_oldest() {
        let mut cache: LayoutCache<u8, u8> = LayoutCache::new(CachePolicy::Lru { capacity: 2 });
        cache.insert(1, 10);
        cache.insert(2, 20);
        cache.get(&1);
        cache.insert(3, 30);
        assert!(cache.contains(&1));
        assert!(!cache.contains(&2));
        assert!(cache.contains(&3));
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_zero_capacity_is_one() {
        let mut cache: LayoutCache<u8, u8> = LayoutCache::new(CachePolicy::Lru { capacity: 0 });
        cache.insert(1, 1);
        cache.insert(2, 2);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_overview_signature_is_order_sensitive() {
        let a = SeedNode { id: "a".into(), x: 1.0, y: 2.0, radius: 25.0 };
        let b = SeedNode { id: "b".into(), x: 3.0, y: 4.0, radius: 25.0 };
        let ab = OverviewSignature::new(&[a.clone(), b.clone()], 800.0, 600.0);
        let ba = OverviewSignature::new(&[b.clone(), a.clone()], 800.0, 600.0);
        assert_ne!(ab, ba);
        assert_eq!(ab, OverviewSignature::new(&[a.clone(), b], 800.0, 600.0));
        assert_ne!(ab, OverviewSignature::new(&[a], 800.0, 600.0));
        assert_eq!(ab.to_string(), "800x600;a@1,2;b@3,4");
    }

    #[test]
    fn test_graph_signature_tracks_labels_and_edges() {
        let g = ProcessGraph::new(
            vec![Node::new("1", "A"), Node::new("2", "B")],
            vec![Edge::new("1", "2")],
        );
        let mut relabelled = g.clone();
        relabelled.nodes[1].label = "C".into();
        assert_eq!(GraphSignature::new(&g), GraphSignature::new(&g.clone()));
        assert_ne!(GraphSignature::new(&g), GraphSignature::new(&relabelled));
    }
}

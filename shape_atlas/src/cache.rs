// Copyright 2025 the Parley Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Rendition cache with a liveness list for region-granular invalidation.

use alloc::vec::Vec;
use core::fmt::{Debug, Formatter};
use hashbrown::HashMap;

use crate::atlas::{EvictionHandler, RegionId};
use crate::key::ShapeKey;
use crate::kurbo::Rect;

/// Integer texel rectangle within the shared texture.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Default)]
pub struct TextureRect {
    /// Left edge (inclusive).
    pub left: u16,
    /// Top edge (inclusive).
    pub top: u16,
    /// Right edge (exclusive).
    pub right: u16,
    /// Bottom edge (exclusive).
    pub bottom: u16,
}

impl TextureRect {
    /// Width in texels.
    #[inline]
    pub fn width(&self) -> u16 {
        self.right - self.left
    }

    /// Height in texels.
    #[inline]
    pub fn height(&self) -> u16 {
        self.bottom - self.top
    }
}

/// A cached rendition of one shape, living in one region of the shared texture.
#[derive(Copy, Clone, PartialEq, Debug)]
pub struct RenditionRecord {
    /// The key the rendition is stored under.
    pub key: ShapeKey,
    /// The atlas region backing the rendition.
    pub region: RegionId,
    /// Where the quad goes, relative to the shape.
    ///
    /// In shape space for distance fields, in device space minus the integer translation for
    /// bitmaps.
    pub local_bounds: Rect,
    /// Where the rendition lives in the shared texture.
    pub texture_rect: TextureRect,
}

/// Optional bookkeeping of how many renditions were cached and freed over the lifetime of a
/// cache. Install it with [`ShapeCache::with_tracking`].
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default)]
pub struct ShapeTracking {
    /// Number of records ever inserted.
    pub cached: u64,
    /// Number of records ever destroyed (superseded, evicted, removed, or cleared).
    pub freed: u64,
}

/// Slot of the record arena, linked into the liveness list.
struct Node {
    record: RenditionRecord,
    prev: Option<u32>,
    next: Option<u32>,
}

/// Content-addressed cache of [`RenditionRecord`]s.
///
/// Every record is stored once, in an index-stable arena slot. Two indices refer to the slot:
/// a map from [`ShapeKey`] and a doubly linked liveness list. Both are updated together by every
/// mutation. The list has no ordering meaning; it exists so that all records bound to an evicted
/// atlas region can be found without knowing their keys.
pub struct ShapeCache {
    index: HashMap<ShapeKey, u32>,
    slots: Vec<Option<Node>>,
    free_slots: Vec<u32>,
    head: Option<u32>,
    tail: Option<u32>,
    cache_hits: u64,
    cache_misses: u64,
    tracking: Option<ShapeTracking>,
}

impl ShapeCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self {
            index: HashMap::new(),
            slots: Vec::new(),
            free_slots: Vec::new(),
            head: None,
            tail: None,
            cache_hits: 0,
            cache_misses: 0,
            tracking: None,
        }
    }

    /// Creates an empty cache that counts cached and freed records.
    pub fn with_tracking() -> Self {
        Self {
            tracking: Some(ShapeTracking::default()),
            ..Self::new()
        }
    }

    /// The cached/freed counters, if tracking was enabled.
    #[inline]
    pub fn tracking(&self) -> Option<ShapeTracking> {
        self.tracking
    }

    /// Looks up the record stored under `key`.
    pub fn find(&self, key: &ShapeKey) -> Option<&RenditionRecord> {
        let slot = *self.index.get(key)?;
        self.node(slot).map(|node| &node.record)
    }

    /// Stores `record` under its key, destroying any record previously stored under that key.
    pub fn insert(&mut self, record: RenditionRecord) {
        if self.remove(&record.key).is_some() {
            log::debug!("superseded cached rendition for {:?}", record.key);
        }

        let node = Node {
            record,
            prev: self.tail,
            next: None,
        };
        let slot = match self.free_slots.pop() {
            Some(slot) => {
                self.slots[slot as usize] = Some(node);
                slot
            }
            None => {
                let slot = u32::try_from(self.slots.len()).unwrap_or(u32::MAX);
                self.slots.push(Some(node));
                slot
            }
        };

        match self.tail {
            Some(tail) => {
                if let Some(tail) = self.node_mut(tail) {
                    tail.next = Some(slot);
                }
            }
            None => self.head = Some(slot),
        }
        self.tail = Some(slot);
        self.index.insert(record.key, slot);

        if let Some(tracking) = &mut self.tracking {
            tracking.cached += 1;
        }
    }

    /// Removes and returns the record stored under `key`.
    pub fn remove(&mut self, key: &ShapeKey) -> Option<RenditionRecord> {
        let slot = self.index.remove(key)?;
        self.unlink(slot)
    }

    /// Destroys every record backed by `region`, returning how many were destroyed.
    ///
    /// This is a scan over all live records. The cursor moves to the next node before the
    /// current node is unlinked, so removal during the scan is well defined.
    pub fn remove_region(&mut self, region: RegionId) -> usize {
        let mut removed = 0;
        let mut cursor = self.head;
        while let Some(slot) = cursor {
            let Some(node) = self.node(slot) else {
                break;
            };
            cursor = node.next;
            if node.record.region == region {
                let key = node.record.key;
                self.index.remove(&key);
                self.unlink(slot);
                removed += 1;
            }
        }
        removed
    }

    /// Destroys all records. Statistics and tracking counters are kept.
    pub fn clear(&mut self) {
        let freed = self.index.len() as u64;
        self.index.clear();
        self.slots.clear();
        self.free_slots.clear();
        self.head = None;
        self.tail = None;
        if let Some(tracking) = &mut self.tracking {
            tracking.freed += freed;
        }
    }

    /// Iterates over all live records in liveness-list order.
    pub fn iter(&self) -> impl Iterator<Item = &RenditionRecord> + '_ {
        let mut cursor = self.head;
        core::iter::from_fn(move || {
            let node = self.node(cursor?)?;
            cursor = node.next;
            Some(&node.record)
        })
    }

    /// Number of live records.
    #[inline]
    pub fn len(&self) -> usize {
        self.index.len()
    }

    /// Whether there are no live records.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Number of cache hits since the last [`clear_stats`](Self::clear_stats).
    #[inline]
    pub fn cache_hits(&self) -> u64 {
        self.cache_hits
    }

    /// Number of cache misses (including stale entries) since the last
    /// [`clear_stats`](Self::clear_stats).
    #[inline]
    pub fn cache_misses(&self) -> u64 {
        self.cache_misses
    }

    /// Clear hit/miss statistics without clearing the cache itself.
    pub fn clear_stats(&mut self) {
        self.cache_hits = 0;
        self.cache_misses = 0;
    }

    pub(crate) fn note_lookup(&mut self, hit: bool) {
        if hit {
            self.cache_hits += 1;
        } else {
            self.cache_misses += 1;
        }
    }

    /// Detaches `slot` from the liveness list and frees it. The caller removes the map entry.
    fn unlink(&mut self, slot: u32) -> Option<RenditionRecord> {
        let node = self.slots.get_mut(slot as usize)?.take()?;

        match node.prev {
            Some(prev) => {
                if let Some(prev) = self.node_mut(prev) {
                    prev.next = node.next;
                }
            }
            None => self.head = node.next,
        }
        match node.next {
            Some(next) => {
                if let Some(next) = self.node_mut(next) {
                    next.prev = node.prev;
                }
            }
            None => self.tail = node.prev,
        }

        self.free_slots.push(slot);
        if let Some(tracking) = &mut self.tracking {
            tracking.freed += 1;
        }
        Some(node.record)
    }

    #[inline]
    fn node(&self, slot: u32) -> Option<&Node> {
        self.slots.get(slot as usize)?.as_ref()
    }

    #[inline]
    fn node_mut(&mut self, slot: u32) -> Option<&mut Node> {
        self.slots.get_mut(slot as usize)?.as_mut()
    }
}

impl EvictionHandler for ShapeCache {
    fn on_evict(&mut self, region: RegionId) {
        let removed = self.remove_region(region);
        log::debug!("atlas evicted {region:?}, dropped {removed} cached renditions");
    }
}

impl Default for ShapeCache {
    fn default() -> Self {
        Self::new()
    }
}

impl Debug for ShapeCache {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ShapeCache")
            .field("len", &self.index.len())
            .field("slots", &self.slots.len())
            .field("cache_hits", &self.cache_hits)
            .field("cache_misses", &self.cache_misses)
            .field("tracking", &self.tracking)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shape::ShapeId;
    use alloc::vec;

    fn record(shape: u64, dimension: u32, region: u32) -> RenditionRecord {
        RenditionRecord {
            key: ShapeKey::field(ShapeId(shape), dimension),
            region: RegionId(region),
            local_bounds: Rect::new(0.0, 0.0, 10.0, 10.0),
            texture_rect: TextureRect {
                left: region as u16 * 16,
                top: 0,
                right: region as u16 * 16 + 12,
                bottom: 12,
            },
        }
    }

    fn keys(cache: &ShapeCache) -> Vec<ShapeKey> {
        cache.iter().map(|r| r.key).collect()
    }

    #[test]
    fn insert_then_find() {
        let mut cache = ShapeCache::new();
        let r = record(1, 16, 3);
        cache.insert(r);
        let found = cache.find(&r.key).unwrap();
        assert_eq!(found.texture_rect, r.texture_rect);
        assert_eq!(found.region, r.region);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn insert_supersedes_same_key() {
        let mut cache = ShapeCache::with_tracking();
        cache.insert(record(1, 16, 3));
        cache.insert(record(1, 16, 4));
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.iter().count(), 1, "list and map must agree");
        assert_eq!(cache.find(&ShapeKey::field(ShapeId(1), 16)).unwrap().region, RegionId(4));
        assert_eq!(
            cache.tracking(),
            Some(ShapeTracking { cached: 2, freed: 1 })
        );
    }

    #[test]
    fn remove_keeps_list_consistent() {
        let mut cache = ShapeCache::new();
        for i in 0..4 {
            cache.insert(record(i, 8, 0));
        }
        assert!(cache.remove(&ShapeKey::field(ShapeId(1), 8)).is_some());
        assert!(cache.remove(&ShapeKey::field(ShapeId(1), 8)).is_none());
        assert_eq!(
            keys(&cache),
            vec![
                ShapeKey::field(ShapeId(0), 8),
                ShapeKey::field(ShapeId(2), 8),
                ShapeKey::field(ShapeId(3), 8),
            ]
        );
        // The freed slot is reused and linked at the tail.
        cache.insert(record(9, 8, 0));
        assert_eq!(keys(&cache).last(), Some(&ShapeKey::field(ShapeId(9), 8)));
        assert_eq!(cache.len(), 4);
    }

    #[test]
    fn remove_region_drops_every_member() {
        let mut cache = ShapeCache::new();
        // Interleave regions, with matches at the head, middle and tail.
        for (shape, region) in [(0, 1), (1, 2), (2, 1), (3, 2), (4, 1)] {
            cache.insert(record(shape, 8, region));
        }
        assert_eq!(cache.remove_region(RegionId(1)), 3);
        assert_eq!(cache.len(), 2);
        assert!(cache.iter().all(|r| r.region == RegionId(2)));
        for shape in [0, 2, 4] {
            assert!(cache.find(&ShapeKey::field(ShapeId(shape), 8)).is_none());
        }
        assert_eq!(cache.remove_region(RegionId(1)), 0);
    }

    #[test]
    fn eviction_handler_removes_region() {
        let mut cache = ShapeCache::new();
        cache.insert(record(0, 8, 5));
        cache.insert(record(1, 8, 6));
        cache.on_evict(RegionId(5));
        assert_eq!(keys(&cache), vec![ShapeKey::field(ShapeId(1), 8)]);
    }

    #[test]
    fn clear_counts_freed_records() {
        let mut cache = ShapeCache::with_tracking();
        cache.insert(record(0, 8, 5));
        cache.insert(record(1, 8, 6));
        cache.clear();
        assert!(cache.is_empty());
        assert_eq!(cache.iter().count(), 0);
        assert_eq!(
            cache.tracking(),
            Some(ShapeTracking { cached: 2, freed: 2 })
        );
    }

    #[test]
    fn stats_are_cleared_independently() {
        let mut cache = ShapeCache::new();
        cache.note_lookup(true);
        cache.note_lookup(false);
        cache.note_lookup(false);
        assert_eq!((cache.cache_hits(), cache.cache_misses()), (1, 2));
        cache.clear_stats();
        assert_eq!((cache.cache_hits(), cache.cache_misses()), (0, 0));
    }
}

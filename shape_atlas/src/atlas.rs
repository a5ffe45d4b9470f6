// Copyright 2025 the Parley Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The shared texture allocator contract, and the glue that keeps the cache in sync with it.

use crate::cache::{RenditionRecord, ShapeCache};
use crate::key::ShapeKey;

/// Opaque handle of a region of the shared texture.
///
/// A region may back many renditions. When the atlas reclaims it, all of them become invalid.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub struct RegionId(pub u32);

/// Monotonic token identifying a future draw, used by the atlas to order region reuse.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default)]
pub struct DrawToken(pub u64);

impl DrawToken {
    /// The token following this one.
    #[inline]
    #[must_use]
    pub fn next(self) -> Self {
        Self(self.0.wrapping_add(1))
    }
}

/// A successful allocation in the shared texture.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct AtlasAllocation {
    /// The region the pixels were placed in.
    pub region: RegionId,
    /// Left edge of the allocation in texels.
    pub x: u16,
    /// Top edge of the allocation in texels.
    pub y: u16,
}

/// Receives eviction notifications from a [`ShapeAtlas`].
pub trait EvictionHandler {
    /// Called whenever the atlas reclaims `region`.
    fn on_evict(&mut self, region: RegionId);
}

/// A fixed-size packed 8-bit texture holding many independently evicted regions.
///
/// The plot layout and the policy deciding which region to reclaim are up to the
/// implementation.
pub trait ShapeAtlas {
    /// Copies a `width` × `height` 8-bit buffer into the texture.
    ///
    /// Returns `None` if there is no space, which is not an error: the caller may flush pending
    /// draws (allowing regions to be reused) and retry. Any region reclaimed while serving the
    /// request must be reported to `evictions` before this returns.
    fn allocate(
        &mut self,
        width: u16,
        height: u16,
        pixels: &[u8],
        evictions: &mut dyn EvictionHandler,
    ) -> Option<AtlasAllocation>;

    /// Whether `region` still holds the data it was allocated with.
    fn is_resident(&self, region: RegionId) -> bool;

    /// Marks `region` as used by the draw identified by `token`.
    fn touch(&mut self, region: RegionId, token: DrawToken);
}

/// Owns a [`ShapeAtlas`] together with the [`ShapeCache`] of renditions stored in it.
///
/// This is the only place allocations are made, and it always hands the cache to the atlas as
/// the eviction handler. Records bound to a reclaimed region are therefore destroyed before the
/// allocation returns, even when the allocation was made in the middle of producing a batch.
#[derive(Debug)]
pub struct AtlasAdapter<A> {
    atlas: A,
    cache: ShapeCache,
}

impl<A: ShapeAtlas> AtlasAdapter<A> {
    /// Wraps `atlas` with an empty cache.
    pub fn new(atlas: A) -> Self {
        Self::with_cache(atlas, ShapeCache::new())
    }

    /// Wraps `atlas` with the given cache, e.g. one created by [`ShapeCache::with_tracking`].
    pub fn with_cache(atlas: A, cache: ShapeCache) -> Self {
        Self { atlas, cache }
    }

    /// Finds a usable rendition for `key`.
    ///
    /// A record whose region is no longer resident is treated as a miss and destroyed, in case
    /// an eviction notification was missed.
    pub fn lookup(&mut self, key: &ShapeKey) -> Option<RenditionRecord> {
        let found = self.cache.find(key).copied();
        match found {
            Some(record) if self.atlas.is_resident(record.region) => {
                self.cache.note_lookup(true);
                Some(record)
            }
            Some(stale) => {
                log::debug!("purging stale rendition {:?} in {:?}", stale.key, stale.region);
                self.cache.remove(key);
                self.cache.note_lookup(false);
                None
            }
            None => {
                self.cache.note_lookup(false);
                None
            }
        }
    }

    /// Copies `pixels` into the atlas, invalidating any records of regions reclaimed to make room.
    pub fn allocate(&mut self, width: u16, height: u16, pixels: &[u8]) -> Option<AtlasAllocation> {
        let Self { atlas, cache } = self;
        atlas.allocate(width, height, pixels, cache)
    }

    /// Registers a freshly produced record.
    #[inline]
    pub fn register(&mut self, record: RenditionRecord) {
        self.cache.insert(record);
    }

    /// Marks the region of `record` as used by the draw identified by `token`.
    #[inline]
    pub fn touch(&mut self, record: &RenditionRecord, token: DrawToken) {
        self.atlas.touch(record.region, token);
    }

    /// The cache of renditions.
    #[inline]
    pub fn cache(&self) -> &ShapeCache {
        &self.cache
    }

    /// Mutable access to the cache of renditions.
    #[inline]
    pub fn cache_mut(&mut self) -> &mut ShapeCache {
        &mut self.cache
    }

    /// The wrapped atlas.
    #[inline]
    pub fn atlas(&self) -> &A {
        &self.atlas
    }

    /// Mutable access to the wrapped atlas.
    ///
    /// Regions reclaimed through this reference outside of [`allocate`](Self::allocate) must be
    /// reported with [`EvictionHandler::on_evict`] on [`cache_mut`](Self::cache_mut); otherwise
    /// they are only detected lazily by [`lookup`](Self::lookup).
    #[inline]
    pub fn atlas_mut(&mut self) -> &mut A {
        &mut self.atlas
    }
}

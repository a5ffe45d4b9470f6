// Copyright 2025 the Parley Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use alloc::rc::Rc;
use alloc::vec::Vec;
use core::cell::Cell;

use crate::{AtlasAllocation, DrawToken, EvictionHandler, RegionId, ShapeAtlas};

/// An atlas of `capacity` regions holding one allocation each.
///
/// When full, it either fails or reclaims the oldest region that no pending draw uses. A region
/// is pending while it was touched with a token later than the last submitted draw, as reported
/// through [`follow_draws`](Self::follow_draws). Failures can also be scripted.
#[derive(Debug)]
pub(crate) struct FakeAtlas {
    capacity: usize,
    evict_when_full: bool,
    /// Number of upcoming allocations that fail regardless of space.
    pub(crate) fail_next: usize,
    /// Resident regions in allocation order, with the token they were last touched with.
    resident: Vec<(RegionId, DrawToken)>,
    next_region: u32,
    last_drawn: Rc<Cell<DrawToken>>,
    /// Size of every successful allocation.
    pub(crate) allocations: Vec<(u16, u16)>,
    /// Every reclaimed region, in order, with the last submitted draw at that time.
    pub(crate) evicted: Vec<(RegionId, DrawToken)>,
    pub(crate) touches: Vec<(RegionId, DrawToken)>,
}

impl FakeAtlas {
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            capacity,
            evict_when_full: false,
            fail_next: 0,
            resident: Vec::new(),
            next_region: 1,
            last_drawn: Rc::new(Cell::new(DrawToken(0))),
            allocations: Vec::new(),
            evicted: Vec::new(),
            touches: Vec::new(),
        }
    }

    pub(crate) fn evicting(capacity: usize) -> Self {
        Self {
            evict_when_full: true,
            ..Self::new(capacity)
        }
    }

    /// Shares the token of the last submitted draw with a `RecordingTarget`.
    pub(crate) fn follow_draws(&mut self, last_drawn: Rc<Cell<DrawToken>>) {
        self.last_drawn = last_drawn;
    }

    /// Drops `region` without telling anyone, like a lost eviction notification.
    pub(crate) fn forget(&mut self, region: RegionId) {
        self.resident.retain(|(r, _)| *r != region);
    }

    pub(crate) fn is_resident_region(&self, region: RegionId) -> bool {
        self.resident.iter().any(|(r, _)| *r == region)
    }

    /// Regions reclaimed so far, in order.
    pub(crate) fn evicted_regions(&self) -> Vec<RegionId> {
        self.evicted.iter().map(|(region, _)| *region).collect()
    }
}

impl ShapeAtlas for FakeAtlas {
    fn allocate(
        &mut self,
        width: u16,
        height: u16,
        pixels: &[u8],
        evictions: &mut dyn EvictionHandler,
    ) -> Option<AtlasAllocation> {
        assert_eq!(
            pixels.len(),
            usize::from(width) * usize::from(height),
            "pixel buffer doesn't match the allocation size"
        );
        if self.fail_next > 0 {
            self.fail_next -= 1;
            return None;
        }
        if self.resident.len() >= self.capacity {
            if !self.evict_when_full {
                return None;
            }
            let drawn = self.last_drawn.get();
            let victim = self.resident.iter().position(|(_, used)| *used <= drawn)?;
            let (victim, _) = self.resident.remove(victim);
            self.evicted.push((victim, drawn));
            evictions.on_evict(victim);
        }

        let region = RegionId(self.next_region);
        self.next_region += 1;
        self.resident.push((region, DrawToken(0)));
        self.allocations.push((width, height));
        let slot = u16::try_from(region.0 % 8).unwrap();
        Some(AtlasAllocation {
            region,
            x: slot * 256,
            y: 0,
        })
    }

    fn is_resident(&self, region: RegionId) -> bool {
        self.is_resident_region(region)
    }

    fn touch(&mut self, region: RegionId, token: DrawToken) {
        self.touches.push((region, token));
        if let Some((_, used)) = self.resident.iter_mut().find(|(r, _)| *r == region) {
            *used = (*used).max(token);
        }
    }
}

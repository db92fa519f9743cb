//! Tracked-marker table: per-tag liveness with fixed-length hysteresis.
//!
//! Every tag seen recently has an entry holding its last observed
//! translation and a countdown (`ttl`). A redetection resets the countdown
//! to `smoothing_frames`; each frame without a redetection decrements it by
//! one. An entry is *live* while `ttl >= 0` and is evicted as soon as the
//! countdown drops below zero, except for the reference tag, which is kept
//! so its last known position can still serve as the origin.

use std::collections::{BTreeMap, HashSet};

use nalgebra::Vector3;

use crate::detection::TagId;

/// Tracking state of one tag.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackedMarker {
    pub id: TagId,
    /// Camera-frame translation from the most recent detection.
    pub last_translation: Vector3<f64>,
    /// Remaining smoothing budget. Negative only for the retained reference tag.
    pub ttl: i32,
    /// Description rendered at the most recent detection.
    pub description: String,
}

impl TrackedMarker {
    #[inline]
    pub fn is_live(&self) -> bool {
        self.ttl >= 0
    }
}

/// Owned mapping from tag id to tracking state, iterated in id order.
#[derive(Debug, Clone)]
pub struct MarkerTable {
    entries: BTreeMap<TagId, TrackedMarker>,
    /// Ids upserted since the last aging pass.
    touched: HashSet<TagId>,
    reference_id: TagId,
    smoothing_frames: i32,
}

impl MarkerTable {
    pub fn new(reference_id: TagId, smoothing_frames: u32) -> Self {
        Self {
            entries: BTreeMap::new(),
            touched: HashSet::new(),
            reference_id,
            smoothing_frames: i32::try_from(smoothing_frames).unwrap_or(i32::MAX),
        }
    }

    pub fn reference_id(&self) -> TagId {
        self.reference_id
    }

    pub fn smoothing_frames(&self) -> i32 {
        self.smoothing_frames
    }

    /// The reference tag is exempt from eviction.
    #[inline]
    pub fn is_protected(&self, id: TagId) -> bool {
        id == self.reference_id
    }

    /// Insert or overwrite the entry for `id` and reset its countdown.
    pub fn upsert(&mut self, id: TagId, translation: Vector3<f64>, description: String) {
        let marker = self.entries.entry(id).or_insert_with(|| TrackedMarker {
            id,
            last_translation: translation,
            ttl: 0,
            description: String::new(),
        });
        marker.last_translation = translation;
        marker.ttl = self.smoothing_frames;
        marker.description = description;
        self.touched.insert(id);
    }

    /// Age every entry not upserted this frame and evict the exhausted ones.
    ///
    /// Must run exactly once per frame, after all upserts. Returns the
    /// evicted ids in ascending order.
    pub fn age_and_evict(&mut self) -> Vec<TagId> {
        for (id, marker) in self.entries.iter_mut() {
            if !self.touched.contains(id) {
                marker.ttl = marker.ttl.saturating_sub(1);
            }
        }
        self.touched.clear();

        let evicted: Vec<TagId> = self
            .entries
            .values()
            .filter(|m| !m.is_live() && !self.is_protected(m.id))
            .map(|m| m.id)
            .collect();

        for id in &evicted {
            self.entries.remove(id);
        }
        evicted
    }

    pub fn get(&self, id: TagId) -> Option<&TrackedMarker> {
        self.entries.get(&id)
    }

    pub fn is_live(&self, id: TagId) -> bool {
        self.get(id).is_some_and(TrackedMarker::is_live)
    }

    pub fn iter(&self) -> impl Iterator<Item = &TrackedMarker> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

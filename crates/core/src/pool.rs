//! Variation pool.
//!
//! Saved designs wait here, in insertion order, until they are turned into
//! products or discarded. The order matters: batch materialization chunks
//! the selection in pool order.

use crate::error::{Result, StudioError};
use crate::image_source::ImageRef;
use crate::product::MaterializationMode;
use crate::session::DesignSessionState;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use tracing::debug;
use uuid::Uuid;

/// Identifier of a saved variation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VariationId(Uuid);

impl VariationId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for VariationId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for VariationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A saved design: the rendered raster plus the state that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Variation {
    pub id: VariationId,
    /// Transparent-background render, as a PNG data URI.
    pub raster: ImageRef,
    pub label: String,
    pub created_at: DateTime<Utc>,
    pub is_favorite: bool,
    pub snapshot: DesignSessionState,
}

impl Variation {
    pub fn new(raster: ImageRef, label: impl Into<String>, snapshot: DesignSessionState) -> Self {
        Self {
            id: VariationId::new(),
            raster,
            label: label.into(),
            created_at: Utc::now(),
            is_favorite: false,
            snapshot,
        }
    }
}

/// Ordered collection of saved variations.
#[derive(Debug, Clone, Default)]
pub struct VariationPool {
    variations: Vec<Variation>,
}

impl VariationPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a variation and returns its id.
    pub fn add(&mut self, variation: Variation) -> VariationId {
        let id = variation.id;
        self.variations.push(variation);
        debug!(%id, len = self.variations.len(), "Variation added to pool");
        id
    }

    /// Removes one variation, returning it if present.
    pub fn remove(&mut self, id: VariationId) -> Option<Variation> {
        let index = self.variations.iter().position(|v| v.id == id)?;
        Some(self.variations.remove(index))
    }

    pub fn clear(&mut self) {
        debug!(dropped = self.variations.len(), "Pool cleared");
        self.variations.clear();
    }

    /// Snapshot to reload into the live session. The variation stays pooled.
    pub fn edit(&self, id: VariationId) -> Option<DesignSessionState> {
        self.get(id).map(|v| v.snapshot.clone())
    }

    pub fn get(&self, id: VariationId) -> Option<&Variation> {
        self.variations.iter().find(|v| v.id == id)
    }

    pub fn contains(&self, id: VariationId) -> bool {
        self.get(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.variations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variations.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Variation> {
        self.variations.iter()
    }

    /// Variations whose id is in `ids`, in pool order.
    pub fn selected<'a>(&'a self, ids: &HashSet<VariationId>) -> Vec<&'a Variation> {
        self.variations.iter().filter(|v| ids.contains(&v.id)).collect()
    }

    /// Removes every variation whose id is in `ids`; returns how many went.
    pub fn consume(&mut self, ids: &HashSet<VariationId>) -> usize {
        let before = self.variations.len();
        self.variations.retain(|v| !ids.contains(&v.id));
        before - self.variations.len()
    }
}

/// The user's current pick of variations for product creation.
///
/// Enforces the per-product image cap of the single-product mode as the
/// calling policy; the materializer itself never truncates.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Selection {
    ids: Vec<VariationId>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or removes `id`.
    ///
    /// # Errors
    ///
    /// Returns [`StudioError::SelectionLimit`] when adding would exceed the
    /// cap of `mode`; the selection is left unchanged.
    pub fn toggle(&mut self, id: VariationId, mode: MaterializationMode) -> Result<bool> {
        if let Some(index) = self.ids.iter().position(|s| *s == id) {
            self.ids.remove(index);
            return Ok(false);
        }
        if let Some(limit) = mode.image_limit()
            && self.ids.len() >= limit
        {
            return Err(StudioError::SelectionLimit {
                limit,
                selected: self.ids.len() + 1,
            });
        }
        self.ids.push(id);
        Ok(true)
    }

    /// Adds every id not yet selected, all or nothing.
    ///
    /// # Errors
    ///
    /// Returns [`StudioError::SelectionLimit`] when the result would exceed
    /// the cap of `mode`; the selection is left unchanged.
    pub fn extend(&mut self, ids: impl IntoIterator<Item = VariationId>, mode: MaterializationMode) -> Result<usize> {
        let mut added: Vec<VariationId> = Vec::new();
        for id in ids {
            if !self.ids.contains(&id) && !added.contains(&id) {
                added.push(id);
            }
        }
        if let Some(limit) = mode.image_limit() {
            let selected = self.ids.len() + added.len();
            if selected > limit {
                return Err(StudioError::SelectionLimit { limit, selected });
            }
        }
        let count = added.len();
        self.ids.extend(added);
        Ok(count)
    }

    /// Checks the selection against the cap of `mode`.
    pub fn check(&self, mode: MaterializationMode) -> Result<()> {
        match mode.image_limit() {
            Some(limit) if self.ids.len() > limit => Err(StudioError::SelectionLimit {
                limit,
                selected: self.ids.len(),
            }),
            _ => Ok(()),
        }
    }

    pub fn contains(&self, id: VariationId) -> bool {
        self.ids.contains(&id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn ids(&self) -> HashSet<VariationId> {
        self.ids.iter().copied().collect()
    }

    /// Drops ids that are no longer pooled.
    pub fn retain_pooled(&mut self, pool: &VariationPool) {
        self.ids.retain(|id| pool.contains(*id));
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }
}

//! Darts: the atomic incidence records of a combinatorial map.
//!
//! A dart is a directed element carrying one beta slot per dimension
//! (β₀…β_D), a word of mark bits, and one attribute slot per dimension.
//! Darts never exist on their own; they live in the map's arena and are
//! addressed by [`DartKey`]. The reserved [`DartKey::null()`] value is the
//! *null-dart* sentinel, "no dart", which is distinct from a slot being
//! *free*: a free slot stores the null key, but walks over the map propagate
//! null explicitly so "no surviving neighbor" can be told apart from "never
//! linked".

use serde::{Deserialize, Serialize};
use slotmap::{Key, new_key_type};

use crate::core::attributes::AttributeKey;
use crate::core::collections::{AttributeSlots, BetaSlots};

new_key_type! {
    /// Key type for darts in the map's arena.
    ///
    /// Keys are generation-checked: erasing a dart invalidates every copy of
    /// its key, so a stale handle can never resolve to a recycled slot.
    /// `DartKey::null()` is the null-dart sentinel.
    pub struct DartKey;
}

/// Atomic record of a combinatorial map.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Dart {
    /// βᵢ neighbor per dimension `0..=D`; null means *i-free*.
    betas: BetaSlots,
    /// Attribute record per dimension `0..=D`; null means no attribute.
    attributes: AttributeSlots,
    /// Mark bits, interpreted through the map's mark registry.
    marks: u32,
}

impl Dart {
    /// Creates a dart with every beta slot free and no attributes.
    ///
    /// `dimension` is the map dimension D; `blank_marks` is the mark word
    /// under which every reserved mark reads as unmarked.
    pub(crate) fn new(dimension: usize, blank_marks: u32) -> Self {
        Self {
            betas: BetaSlots::from_elem(DartKey::null(), dimension + 1),
            attributes: AttributeSlots::from_elem(AttributeKey::null(), dimension + 1),
            marks: blank_marks,
        }
    }

    /// The βᵢ neighbor, or null when i-free.
    #[must_use]
    pub fn beta(&self, i: usize) -> DartKey {
        self.betas[i]
    }

    /// True when the dart has no βᵢ neighbor.
    #[must_use]
    pub fn is_free(&self, i: usize) -> bool {
        self.betas[i].is_null()
    }

    pub(crate) fn set_beta(&mut self, i: usize, neighbor: DartKey) {
        self.betas[i] = neighbor;
    }

    pub(crate) fn clear_beta(&mut self, i: usize) {
        self.betas[i] = DartKey::null();
    }

    /// The attribute record of this dart's `dim`-cell, or null.
    #[must_use]
    pub fn attribute(&self, dim: usize) -> AttributeKey {
        self.attributes[dim]
    }

    pub(crate) fn set_attribute(&mut self, dim: usize, attribute: AttributeKey) {
        self.attributes[dim] = attribute;
    }

    pub(crate) fn mark_word(&self) -> u32 {
        self.marks
    }

    pub(crate) fn set_mark_word(&mut self, word: u32) {
        self.marks = word;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_dart_is_fully_free() {
        let dart = Dart::new(3, 0);
        for i in 0..=3 {
            assert!(dart.is_free(i));
            assert!(dart.beta(i).is_null());
            assert!(dart.attribute(i).is_null());
        }
    }

    #[test]
    fn beta_slots_are_independent() {
        let mut dart = Dart::new(2, 0);
        let mut arena: crate::core::collections::StorageMap<DartKey, ()> =
            crate::core::collections::StorageMap::with_key();
        let other = arena.insert(());
        dart.set_beta(1, other);
        assert!(!dart.is_free(1));
        assert!(dart.is_free(0));
        assert!(dart.is_free(2));
        dart.clear_beta(1);
        assert!(dart.is_free(1));
    }

    #[test]
    fn fresh_dart_inherits_blank_mark_word() {
        let dart = Dart::new(2, 0b1010);
        assert_eq!(dart.mark_word(), 0b1010);
    }
}

//! Cell attributes: user data shared by all darts of a cell.
//!
//! For each *enabled* dimension `k` the map keeps a layer of attribute
//! records; every dart of a k-cell points at the same record, and the record
//! points back at one *representative* dart of the cell. The modification
//! operators maintain this coherence through four primitives:
//!
//! - [`CMap::group_attribute`]: merges the records of two cells that an
//!   operator is about to fuse;
//! - [`CMap::degroup_attribute`]: splits a record across two cells that an
//!   operator has separated;
//! - [`CMap::update_dart_of_all_attributes`]: moves representatives off
//!   darts that are about to be erased;
//! - [`CMap::test_split_after_modification`]: the deferred pass over an
//!   operator's `modified_darts` worklist that detects cells which actually
//!   bifurcated and gives the split-off part a fresh record.
//!
//! Records are reference counted by the darts that point at them; a record
//! whose last dart is erased or reassigned disappears.

use serde::{Deserialize, Serialize};
use slotmap::{Key, new_key_type};
use thiserror::Error;
use uuid::Uuid;

use crate::core::collections::{FastHashSet, StorageMap};
use crate::core::combinatorial_map::CMap;
use crate::core::dart::DartKey;
use crate::core::marks::Mark;
use crate::core::traits::DataType;
use crate::core::util::make_uuid;

new_key_type! {
    /// Key type for cell-attribute records in an attribute layer.
    pub struct AttributeKey;
}

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Errors raised by the attribute layer.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum AttributeError {
    /// The requested dimension has no attribute layer.
    #[error("attributes are not enabled for dimension {dim}")]
    DimensionDisabled {
        /// The dimension that was requested.
        dim: usize,
    },
    /// The dart handle does not resolve to a live dart.
    #[error("dart {dart:?} is not a live dart of this map")]
    DeadDart {
        /// The offending dart key.
        dart: DartKey,
    },
}

// =============================================================================
// ATTRIBUTE RECORDS
// =============================================================================

/// User data attached to one k-cell.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(bound(deserialize = "A: serde::de::DeserializeOwned"))]
pub struct CellAttribute<A: DataType> {
    uuid: Uuid,
    /// Representative dart; always a live dart of the owning cell.
    dart: DartKey,
    /// Number of darts pointing at this record.
    ref_count: usize,
    data: A,
}

impl<A: DataType> CellAttribute<A> {
    fn new(dart: DartKey, data: A) -> Self {
        Self {
            uuid: make_uuid(),
            dart,
            ref_count: 0,
            data,
        }
    }

    /// Identity stamp of this attribute record.
    #[must_use]
    pub fn uuid(&self) -> Uuid {
        self.uuid
    }

    /// The representative dart of the owning cell.
    #[must_use]
    pub fn dart(&self) -> DartKey {
        self.dart
    }

    /// Number of darts sharing this record.
    #[must_use]
    pub fn ref_count(&self) -> usize {
        self.ref_count
    }

    /// The user payload.
    #[must_use]
    pub fn data(&self) -> &A {
        &self.data
    }
}

/// One enabled dimension's worth of attribute records.
pub(crate) type AttributeLayer<A> = StorageMap<AttributeKey, CellAttribute<A>>;

/// Per-dimension attribute layers; `None` means the dimension is disabled.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(bound(serialize = "A: Serialize", deserialize = "A: serde::de::DeserializeOwned"))]
pub(crate) struct AttributeStore<A: DataType> {
    layers: Vec<Option<AttributeLayer<A>>>,
}

impl<A: DataType> AttributeStore<A> {
    pub(crate) fn with_all_enabled(dimension: usize) -> Self {
        Self {
            layers: (0..=dimension).map(|_| Some(AttributeLayer::with_key())).collect(),
        }
    }

    pub(crate) fn with_enabled(dimension: usize, enabled: &[usize]) -> Self {
        Self {
            layers: (0..=dimension)
                .map(|dim| enabled.contains(&dim).then(AttributeLayer::with_key))
                .collect(),
        }
    }

    pub(crate) fn layer(&self, dim: usize) -> Option<&AttributeLayer<A>> {
        self.layers.get(dim).and_then(Option::as_ref)
    }

    pub(crate) fn layer_mut(&mut self, dim: usize) -> Option<&mut AttributeLayer<A>> {
        self.layers.get_mut(dim).and_then(Option::as_mut)
    }

    pub(crate) fn is_enabled(&self, dim: usize) -> bool {
        self.layer(dim).is_some()
    }
}

// =============================================================================
// ATTRIBUTE OPERATIONS ON THE MAP
// =============================================================================

impl<const D: usize, A: DataType> CMap<D, A> {
    /// True when dimension `dim` carries an attribute layer.
    #[must_use]
    pub fn is_attribute_enabled(&self, dim: usize) -> bool {
        self.attribute_store().is_enabled(dim)
    }

    /// The attribute record key of `dart`'s `dim`-cell, or null.
    #[must_use]
    pub fn attribute_of(&self, dart: DartKey, dim: usize) -> AttributeKey {
        self.dart_ref(dart).map_or_else(AttributeKey::null, |d| d.attribute(dim))
    }

    /// Resolves an attribute key in layer `dim`.
    #[must_use]
    pub fn attribute(&self, dim: usize, key: AttributeKey) -> Option<&CellAttribute<A>> {
        self.attribute_store().layer(dim)?.get(key)
    }

    /// Attaches `data` to the `dim`-cell of `dart`, creating a fresh record
    /// shared by every dart of the cell's orbit.
    ///
    /// # Errors
    ///
    /// Fails when `dim` has no attribute layer or `dart` is dead.
    pub fn set_attribute(
        &mut self,
        dart: DartKey,
        dim: usize,
        data: A,
    ) -> Result<AttributeKey, AttributeError> {
        if !self.is_attribute_enabled(dim) {
            return Err(AttributeError::DimensionDisabled { dim });
        }
        if !self.contains_dart(dart) {
            return Err(AttributeError::DeadDart { dart });
        }
        let record = CellAttribute::new(dart, data);
        let key = self
            .attribute_store_mut()
            .layer_mut(dim)
            .expect("layer checked enabled above")
            .insert(record);
        for d in self.cell_orbit(dart, dim) {
            self.assign_attribute(d, dim, key);
        }
        Ok(key)
    }

    /// Points `dart`'s `dim` slot at `key`, keeping reference counts exact
    /// and dropping records that lose their last referent.
    pub(crate) fn assign_attribute(&mut self, dart: DartKey, dim: usize, key: AttributeKey) {
        let old = self.attribute_of(dart, dim);
        if old == key {
            return;
        }
        if let Some(d) = self.dart_mut(dart) {
            d.set_attribute(dim, key);
        } else {
            return;
        }
        if !key.is_null() {
            if let Some(record) = self
                .attribute_store_mut()
                .layer_mut(dim)
                .and_then(|layer| layer.get_mut(key))
            {
                record.ref_count += 1;
            }
        }
        if !old.is_null() {
            self.release_attribute_ref(dim, old);
        }
    }

    /// Decrements `key`'s reference count, removing the record at zero.
    pub(crate) fn release_attribute_ref(&mut self, dim: usize, key: AttributeKey) {
        let Some(layer) = self.attribute_store_mut().layer_mut(dim) else {
            return;
        };
        let remove = match layer.get_mut(key) {
            Some(record) => {
                debug_assert!(record.ref_count > 0);
                record.ref_count -= 1;
                record.ref_count == 0
            }
            None => false,
        };
        if remove {
            layer.remove(key);
        }
    }

    /// Merges the `dim`-attributes of the cells of `a` and `b`.
    ///
    /// After the call the two cells share one record; when only one side had
    /// a record the other side adopts it, and when both had one the record
    /// of `a` wins. No structural check is made; callers merge exactly when
    /// their surgery fuses the two cells.
    pub fn group_attribute(&mut self, dim: usize, a: DartKey, b: DartKey) {
        if !self.is_attribute_enabled(dim) || a.is_null() || b.is_null() {
            return;
        }
        let ka = self.attribute_of(a, dim);
        let kb = self.attribute_of(b, dim);
        if ka == kb {
            return;
        }
        if ka.is_null() {
            for d in self.cell_orbit(a, dim) {
                self.assign_attribute(d, dim, kb);
            }
        } else {
            for d in self.cell_orbit(b, dim) {
                self.assign_attribute(d, dim, ka);
            }
        }
    }

    /// Splits the `dim`-attribute across the cells of `a` and `b`.
    ///
    /// Returns `true` when a fresh record was created for `b`'s cell. This
    /// happens when the two darts no longer share a `dim`-cell and either
    /// share a record (the split case) or `b`'s cell has none (the
    /// fresh-boundary case, used by vertex insertion where the new darts
    /// start bare).
    pub fn degroup_attribute(&mut self, dim: usize, a: DartKey, b: DartKey) -> bool {
        if !self.is_attribute_enabled(dim) || a.is_null() || b.is_null() {
            return false;
        }
        let ka = self.attribute_of(a, dim);
        if ka.is_null() {
            return false;
        }
        let kb = self.attribute_of(b, dim);
        if kb != ka && !kb.is_null() {
            return false;
        }
        let orbit_a: FastHashSet<DartKey> = self.cell_orbit(a, dim).into_iter().collect();
        if orbit_a.contains(&b) {
            return false;
        }
        let Some(data) = self.attribute(dim, ka).map(|record| *record.data()) else {
            return false;
        };
        let record = CellAttribute::new(b, data);
        let new_key = self
            .attribute_store_mut()
            .layer_mut(dim)
            .expect("layer checked enabled above")
            .insert(record);
        for d in self.cell_orbit(b, dim) {
            self.assign_attribute(d, dim, new_key);
        }
        // The old representative may have been on b's side; re-anchor it.
        let rep = self.attribute(dim, ka).map_or_else(DartKey::null, CellAttribute::dart);
        if !rep.is_null() && !orbit_a.contains(&rep) {
            if let Some(record) = self
                .attribute_store_mut()
                .layer_mut(dim)
                .and_then(|layer| layer.get_mut(ka))
            {
                record.dart = a;
            }
        }
        true
    }

    /// Makes the fresh dart `b` join the cells of `a` on every dimension of
    /// 2 and above except `except`.
    ///
    /// Used by vertex-in-edge insertion: the successor dart shares its
    /// original's facet, volume, … but starts a new vertex (dim 0 stays
    /// bare) and belongs to the half-edge the caller degroups (dim
    /// `except`).
    pub(crate) fn group_all_dart_attributes_except(
        &mut self,
        a: DartKey,
        b: DartKey,
        except: usize,
    ) {
        for dim in 2..=D {
            if dim == except {
                continue;
            }
            let key = self.attribute_of(a, dim);
            if !key.is_null() {
                self.assign_attribute(b, dim, key);
            }
        }
    }

    /// Points the record `key` in layer `dim` at a new representative dart.
    pub(crate) fn set_attribute_representative(
        &mut self,
        dim: usize,
        key: AttributeKey,
        dart: DartKey,
    ) {
        if let Some(record) = self
            .attribute_store_mut()
            .layer_mut(dim)
            .and_then(|layer| layer.get_mut(key))
        {
            record.dart = dart;
        }
    }

    /// Re-anchors the representative of every attribute owned by `dart` so
    /// that it is not among the darts marked with `mark` (the doomed set).
    ///
    /// When the whole cell is doomed the representative is left in place;
    /// the record disappears with its last dart anyway.
    pub fn update_dart_of_all_attributes(&mut self, dart: DartKey, mark: Mark) {
        for dim in 0..=D {
            if !self.is_attribute_enabled(dim) {
                continue;
            }
            let key = self.attribute_of(dart, dim);
            if key.is_null() {
                continue;
            }
            let rep = self
                .attribute(dim, key)
                .map_or_else(DartKey::null, CellAttribute::dart);
            if !rep.is_null() && !self.is_marked(rep, mark) {
                continue;
            }
            let replacement = self
                .cell_orbit(dart, dim)
                .into_iter()
                .find(|&d| !self.is_marked(d, mark));
            if let Some(new_rep) = replacement {
                if let Some(record) = self
                    .attribute_store_mut()
                    .layer_mut(dim)
                    .and_then(|layer| layer.get_mut(key))
                {
                    record.dart = new_rep;
                }
            }
        }
    }

    /// Deferred split detection over an operator's `modified_darts` worklist.
    ///
    /// For every enabled dimension, walks the `dim`-cell of each modified
    /// dart once; an orbit that shares a record with a cell it is no longer
    /// connected to (the record's representative lies outside the orbit) has
    /// split off and receives a fresh record. Unchanged cells are no-ops.
    pub(crate) fn test_split_after_modification(&mut self, modified: &[DartKey]) {
        for dim in 0..=D {
            if !self.is_attribute_enabled(dim) {
                continue;
            }
            let mut processed: FastHashSet<DartKey> = FastHashSet::default();
            for &dart in modified {
                if dart.is_null() || !self.contains_dart(dart) || processed.contains(&dart) {
                    continue;
                }
                let orbit = self.cell_orbit(dart, dim);
                processed.extend(orbit.iter().copied());
                let key = self.attribute_of(dart, dim);
                if key.is_null() {
                    continue;
                }
                let rep = self
                    .attribute(dim, key)
                    .map_or_else(DartKey::null, CellAttribute::dart);
                if orbit.contains(&rep) {
                    continue;
                }
                let Some(data) = self.attribute(dim, key).map(|record| *record.data()) else {
                    continue;
                };
                let record = CellAttribute::new(dart, data);
                let new_key = self
                    .attribute_store_mut()
                    .layer_mut(dim)
                    .expect("dimension checked enabled above")
                    .insert(record);
                for d in orbit {
                    self.assign_attribute(d, dim, new_key);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::combinatorial_map::CMap;

    #[test]
    fn set_attribute_covers_the_whole_cell() {
        let mut map: CMap<2, u32> = CMap::new();
        let face = map.make_combinatorial_polygon(4);
        let key = map.set_attribute(face, 2, 7).unwrap();
        let mut dart = face;
        for _ in 0..4 {
            assert_eq!(map.attribute_of(dart, 2), key);
            dart = map.beta(dart, 1);
        }
        let record = map.attribute(2, key).unwrap();
        assert_eq!(record.ref_count(), 4);
        assert_eq!(*record.data(), 7);
        assert_eq!(record.dart(), face);
    }

    #[test]
    fn set_attribute_requires_an_enabled_layer() {
        let mut map: CMap<2, u32> = CMap::with_enabled_attributes(&[2]);
        let edge = map.make_edge();
        assert_eq!(
            map.set_attribute(edge, 1, 3),
            Err(AttributeError::DimensionDisabled { dim: 1 })
        );
        assert!(map.set_attribute(edge, 2, 3).is_ok());
    }

    #[test]
    fn group_attribute_merges_records() {
        let mut map: CMap<2, u32> = CMap::new();
        let f1 = map.make_combinatorial_polygon(3);
        let f2 = map.make_combinatorial_polygon(3);
        let k1 = map.set_attribute(f1, 2, 1).unwrap();
        let k2 = map.set_attribute(f2, 2, 2).unwrap();
        assert_ne!(k1, k2);
        map.group_attribute(2, f1, f2);
        assert_eq!(map.attribute_of(f2, 2), k1);
        assert!(map.attribute(2, k2).is_none(), "orphaned record dropped");
        assert_eq!(map.attribute(2, k1).unwrap().ref_count(), 6);
    }

    #[test]
    fn degroup_attribute_ignores_connected_cells() {
        let mut map: CMap<2, u32> = CMap::new();
        let face = map.make_combinatorial_polygon(3);
        map.set_attribute(face, 2, 5).unwrap();
        let other = map.beta(face, 1);
        assert!(!map.degroup_attribute(2, face, other));
    }

    #[test]
    fn degroup_attribute_splits_disconnected_cells() {
        let mut map: CMap<2, u32> = CMap::new();
        let f1 = map.make_combinatorial_polygon(3);
        let f2 = map.make_combinatorial_polygon(3);
        let k1 = map.set_attribute(f1, 2, 5).unwrap();
        // Force both faces onto one record, as a merge would.
        map.group_attribute(2, f1, f2);
        assert!(map.degroup_attribute(2, f1, f2));
        let k2 = map.attribute_of(f2, 2);
        assert_ne!(k1, k2);
        assert_eq!(*map.attribute(2, k2).unwrap().data(), 5);
        assert_eq!(map.attribute(2, k1).unwrap().ref_count(), 3);
        assert_eq!(map.attribute(2, k2).unwrap().ref_count(), 3);
    }
}

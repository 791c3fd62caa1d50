//! Data and operations on d-dimensional combinatorial maps.
//!
//! This module provides the [`CMap`] struct: a set of darts linked by the
//! partial maps β₀…β_D, representing a cellular subdivision of a
//! d-dimensional space. β₀ and β₁ are mutually inverse partial permutations
//! (the facet walk); β₂…β_D are partial involutions gluing cells of
//! increasing dimension. Orbits of darts under subsets of the β functions
//! recover the cells of the subdivision.
//!
//! # Key Features
//!
//! - **Arbitrary dimension**: the map dimension `D` is a const generic; all
//!   operations are uniform in it.
//! - **Generation-checked dart handles**: darts live in a slotmap arena;
//!   erasing a dart invalidates stale keys rather than letting them resolve
//!   to recycled slots.
//! - **Cell attributes**: each enabled dimension can associate user data to
//!   its cells, kept coherent by the modification operators.
//! - **Scoped marks**: a pool of 32 boolean marks for operator-local
//!   tagging, with O(1) whole-map negation.
//! - **Validation**: [`CMap::is_valid`] audits every structural axiom and
//!   the attribute and mark bookkeeping.
//! - **Serialization**: full serde support.
//!
//! # Examples
//!
//! ```rust
//! use cmap::core::combinatorial_map::CMap;
//!
//! // A triangle in a 2-map: three darts cycled by β1.
//! let mut map: CMap<2> = CMap::new();
//! let face = map.make_combinatorial_polygon(3);
//!
//! assert_eq!(map.number_of_darts(), 3);
//! assert_eq!(map.count_cells(0), 3); // vertices
//! assert_eq!(map.count_cells(1), 3); // edges
//! assert_eq!(map.count_cells(2), 1); // the face
//! assert!(map.is_valid().is_ok());
//!
//! // Walking the facet comes back around.
//! let d = map.beta(face, 1);
//! let d = map.beta(d, 1);
//! assert_eq!(map.beta(d, 1), face);
//! ```
//!
//! A tetrahedron boundary in a 3-map:
//!
//! ```rust
//! use cmap::core::combinatorial_map::CMap;
//!
//! let mut map: CMap<3> = CMap::new();
//! let dart = map.make_combinatorial_tetrahedron();
//!
//! assert_eq!(map.number_of_darts(), 12);
//! assert_eq!(map.count_cells(0), 4);
//! assert_eq!(map.count_cells(1), 6);
//! assert_eq!(map.count_cells(2), 4);
//! assert_eq!(map.count_cells(3), 1);
//! assert!(map.is_valid().is_ok());
//! # let _ = dart;
//! ```

use serde::{Deserialize, Serialize};
use slotmap::Key;
use thiserror::Error;

use crate::core::attributes::{AttributeKey, AttributeStore};
use crate::core::collections::{DartBuffer, FastHashMap, FastHashSet, StorageMap};
use crate::core::dart::{Dart, DartKey};
use crate::core::marks::{Mark, MarkError, MarkRegistry};
use crate::core::traits::DataType;

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Errors that can occur during map validation.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum MapValidationError {
    /// A beta slot points at a dart that is no longer alive.
    #[error("dart {dart:?} has a dead β{dim} neighbor")]
    DeadNeighbor {
        /// The dart with the dangling slot.
        dart: DartKey,
        /// The offending beta dimension.
        dim: usize,
    },
    /// β₀ and β₁ are not mutually inverse at some dart.
    #[error("β0/β1 are not mutually inverse at dart {dart:?}")]
    BrokenInverse {
        /// The dart where the inverse property fails.
        dart: DartKey,
    },
    /// Some βᵢ with `i ≥ 2` is not an involution at some dart.
    #[error("β{dim} is not an involution at dart {dart:?}")]
    BrokenInvolution {
        /// The dart where the involution property fails.
        dart: DartKey,
        /// The offending beta dimension.
        dim: usize,
    },
    /// The composition βⱼ∘βᵢ fails to be an involution for `j ≥ i + 2`.
    #[error("β{j}∘β{i} is not an involution at dart {dart:?}")]
    BrokenCommutation {
        /// The dart where the composition fails to close.
        dart: DartKey,
        /// The lower dimension of the pair.
        i: usize,
        /// The higher dimension of the pair.
        j: usize,
    },
    /// Two darts of one cell disagree about their attribute record.
    #[error("darts of one {dim}-cell carry different attribute records (at dart {dart:?})")]
    AttributeMismatch {
        /// A dart of the inconsistent cell.
        dart: DartKey,
        /// The attribute dimension.
        dim: usize,
    },
    /// An attribute's representative dart is dead.
    #[error("a {dim}-attribute has a dead representative dart")]
    RepresentativeDead {
        /// The attribute dimension.
        dim: usize,
    },
    /// An attribute's representative dart lies outside the cell that carries
    /// the attribute.
    #[error("a {dim}-attribute's representative lies outside its cell (at dart {dart:?})")]
    RepresentativeOutsideCell {
        /// A dart of the cell whose record points elsewhere.
        dart: DartKey,
        /// The attribute dimension.
        dim: usize,
    },
    /// An attribute's reference count disagrees with the darts pointing at it.
    #[error("a {dim}-attribute records {recorded} referents but {actual} darts point at it")]
    RefCountMismatch {
        /// The attribute dimension.
        dim: usize,
        /// The count stored in the record.
        recorded: usize,
        /// The count recomputed from the darts.
        actual: usize,
    },
    /// A mark's marked-dart counter disagrees with the dart mark words.
    #[error("marked-dart counter for mark {index} disagrees with the dart mark bits")]
    MarkCounterMismatch {
        /// Index of the inconsistent mark.
        index: usize,
    },
}

// =============================================================================
// THE MAP
// =============================================================================

/// A d-dimensional combinatorial map with cell attributes of payload `A`.
///
/// `D` is the map dimension: darts carry beta slots β₀…β_D. `A` is the user
/// data stored in cell attributes (`Option<()>`, carrying no data, by default).
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(bound(
    serialize = "A: Serialize",
    deserialize = "A: serde::de::DeserializeOwned"
))]
pub struct CMap<const D: usize, A: DataType = Option<()>> {
    darts: StorageMap<DartKey, Dart>,
    marks: MarkRegistry,
    attributes: AttributeStore<A>,
}

impl<const D: usize, A: DataType> Default for CMap<D, A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const D: usize, A: DataType> CMap<D, A> {
    /// Creates an empty map with attributes enabled on every dimension.
    #[must_use]
    pub fn new() -> Self {
        Self {
            darts: StorageMap::with_key(),
            marks: MarkRegistry::new(),
            attributes: AttributeStore::with_all_enabled(D),
        }
    }

    /// Creates an empty map with attribute layers only on `dims`.
    #[must_use]
    pub fn with_enabled_attributes(dims: &[usize]) -> Self {
        Self {
            darts: StorageMap::with_key(),
            marks: MarkRegistry::new(),
            attributes: AttributeStore::with_enabled(D, dims),
        }
    }

    /// The map dimension D.
    #[must_use]
    pub const fn dimension(&self) -> usize {
        D
    }

    /// Number of live darts.
    #[must_use]
    pub fn number_of_darts(&self) -> usize {
        self.darts.len()
    }

    /// Iterates over all live darts.
    pub fn darts(&self) -> impl Iterator<Item = (DartKey, &Dart)> {
        self.darts.iter()
    }

    /// True when `dart` resolves to a live dart.
    #[must_use]
    pub fn contains_dart(&self, dart: DartKey) -> bool {
        self.darts.contains_key(dart)
    }

    pub(crate) fn dart_ref(&self, dart: DartKey) -> Option<&Dart> {
        self.darts.get(dart)
    }

    pub(crate) fn dart_mut(&mut self, dart: DartKey) -> Option<&mut Dart> {
        self.darts.get_mut(dart)
    }

    pub(crate) fn attribute_store(&self) -> &AttributeStore<A> {
        &self.attributes
    }

    pub(crate) fn attribute_store_mut(&mut self) -> &mut AttributeStore<A> {
        &mut self.attributes
    }

    // =========================================================================
    // DART LIFECYCLE
    // =========================================================================

    /// Creates a fresh dart: every beta slot free, no attributes, unmarked.
    pub fn create_dart(&mut self) -> DartKey {
        let blank = self.marks.blank_word();
        self.darts.insert(Dart::new(D, blank))
    }

    /// Erases a dart, releasing its attribute references.
    ///
    /// The caller must ensure no live dart still points at it; the
    /// modification operators unlink before erasing.
    pub fn erase_dart(&mut self, dart: DartKey) {
        let Some(record) = self.darts.remove(dart) else {
            return;
        };
        self.marks.note_dart_erased(record.mark_word());
        for dim in 0..=D {
            let key = record.attribute(dim);
            if !key.is_null() {
                self.release_attribute_ref(dim, key);
            }
        }
    }

    // =========================================================================
    // BETA ACCESS
    // =========================================================================

    /// The βᵢ neighbor of `dart`, or the null dart.
    ///
    /// Null propagates: `beta` of the null dart (or of a dead key) is null,
    /// so neighbor chains can be written without intermediate checks.
    #[must_use]
    pub fn beta(&self, dart: DartKey, i: usize) -> DartKey {
        debug_assert!(i <= D, "beta dimension {i} exceeds map dimension {D}");
        self.darts.get(dart).map_or_else(DartKey::null, |d| d.beta(i))
    }

    /// The inverse of βᵢ: β₀ for i = 1, β₁ for i = 0, βᵢ otherwise.
    #[must_use]
    pub fn beta_inv(&self, dart: DartKey, i: usize) -> DartKey {
        match i {
            0 => self.beta(dart, 1),
            1 => self.beta(dart, 0),
            _ => self.beta(dart, i),
        }
    }

    /// True when `dart` has no βᵢ neighbor.
    #[must_use]
    pub fn is_free(&self, dart: DartKey, i: usize) -> bool {
        self.beta(dart, i).is_null()
    }

    /// A dart incident to the other endpoint of `dart`'s edge: β₁ when
    /// present, else the first non-free βⱼ with `j ≥ 2`, else null.
    #[must_use]
    pub fn other_extremity(&self, dart: DartKey) -> DartKey {
        let next = self.beta(dart, 1);
        if !next.is_null() {
            return next;
        }
        for j in 2..=D {
            let opposite = self.beta(dart, j);
            if !opposite.is_null() {
                return opposite;
            }
        }
        DartKey::null()
    }

    // =========================================================================
    // LINKING
    // =========================================================================

    /// Structurally links `a` and `b` by βᵢ, without attribute side effects.
    ///
    /// For `i ≥ 2` this sets the involution both ways; for `i ∈ {0, 1}` it
    /// sets the β₀/β₁ inverse pair (β₁(a) = b and β₀(b) = a when `i == 1`).
    ///
    /// # Panics
    ///
    /// Panics if either dart is dead.
    pub fn basic_link_beta(&mut self, a: DartKey, b: DartKey, i: usize) {
        assert!(i <= D, "beta dimension {i} exceeds map dimension {D}");
        assert!(
            self.contains_dart(a) && self.contains_dart(b),
            "cannot link dead darts"
        );
        match i {
            0 => {
                self.darts[a].set_beta(0, b);
                self.darts[b].set_beta(1, a);
            }
            1 => {
                self.darts[a].set_beta(1, b);
                self.darts[b].set_beta(0, a);
            }
            _ => {
                self.darts[a].set_beta(i, b);
                self.darts[b].set_beta(i, a);
            }
        }
    }

    /// Unlinks `a` from its βᵢ neighbor (both directions); no-op when free.
    pub fn unlink_beta(&mut self, a: DartKey, i: usize) {
        assert!(i <= D, "beta dimension {i} exceeds map dimension {D}");
        let partner = self.beta(a, i);
        if partner.is_null() {
            return;
        }
        if let Some(dart) = self.darts.get_mut(a) {
            dart.clear_beta(i);
        }
        let back = match i {
            0 => 1,
            1 => 0,
            _ => i,
        };
        if let Some(dart) = self.darts.get_mut(partner) {
            dart.clear_beta(back);
        }
    }

    /// Attribute-aware link: merges the cell attributes the new βᵢ link
    /// fuses, then links structurally.
    ///
    /// Linking βᵢ for `i ≥ 2` puts `a` and `b` in one j-cell for every
    /// `j ≠ i, j ≥ 1`, and fuses the vertex of `b` with the target vertex of
    /// `a` (and symmetrically). Linking β₁ puts them in one j-cell for
    /// `j ≥ 2` and fuses `b`'s vertex with the target vertex of `a`.
    ///
    /// # Panics
    ///
    /// Panics if either dart is dead.
    pub fn link_beta(&mut self, a: DartKey, b: DartKey, i: usize) {
        assert!(i <= D, "beta dimension {i} exceeds map dimension {D}");
        if i == 0 {
            self.link_beta(b, a, 1);
            return;
        }
        if i == 1 {
            for j in 2..=D {
                self.group_attribute(j, a, b);
            }
            if self.is_attribute_enabled(0) {
                for j in 2..=D {
                    let side = self.beta(a, j);
                    if !side.is_null() {
                        self.group_attribute(0, side, b);
                    }
                }
            }
        } else {
            for j in 1..=D {
                if j != i {
                    self.group_attribute(j, a, b);
                }
            }
            if self.is_attribute_enabled(0) {
                let ta = self.beta(a, 1);
                if !ta.is_null() {
                    self.group_attribute(0, ta, b);
                }
                let tb = self.beta(b, 1);
                if !tb.is_null() {
                    self.group_attribute(0, tb, a);
                }
            }
        }
        self.basic_link_beta(a, b, i);
    }

    // =========================================================================
    // MARKS
    // =========================================================================

    /// Reserves a mark from the pool.
    ///
    /// # Errors
    ///
    /// Returns [`MarkError::PoolExhausted`] when all marks are reserved.
    pub fn get_new_mark(&mut self) -> Result<Mark, MarkError> {
        self.marks.acquire()
    }

    /// Returns a mark to the pool.
    ///
    /// # Errors
    ///
    /// Returns [`MarkError::NotReserved`] for a mark that is already free.
    ///
    /// # Panics
    ///
    /// Panics when darts are still marked: operators must leave every mark
    /// clean.
    pub fn free_mark(&mut self, mark: Mark) -> Result<(), MarkError> {
        self.marks.release(mark)
    }

    /// Mark acquisition for the modification operators, which treat pool
    /// exhaustion as fatal.
    pub(crate) fn reserve_mark(&mut self) -> Mark {
        match self.marks.acquire() {
            Ok(mark) => mark,
            Err(error) => panic!("{error}"),
        }
    }

    pub(crate) fn release_mark(&mut self, mark: Mark) {
        if let Err(error) = self.marks.release(mark) {
            panic!("{error}");
        }
    }

    /// Marks `dart` with `mark`; no-op on dead or null darts.
    pub fn mark(&mut self, dart: DartKey, mark: Mark) {
        if self.is_marked(dart, mark) {
            return;
        }
        let word = {
            let Some(d) = self.darts.get(dart) else { return };
            d.mark_word()
        };
        let new_word = self.marks.word_with_marked(word, mark);
        self.darts[dart].set_mark_word(new_word);
        self.marks.note_marked(mark);
    }

    /// Unmarks `dart`; no-op when not marked.
    pub fn unmark(&mut self, dart: DartKey, mark: Mark) {
        if !self.is_marked(dart, mark) {
            return;
        }
        let word = self.darts[dart].mark_word();
        let new_word = self.marks.word_with_unmarked(word, mark);
        self.darts[dart].set_mark_word(new_word);
        self.marks.note_unmarked(mark);
    }

    /// True when `dart` is live and marked with `mark`. The null dart is
    /// never marked.
    #[must_use]
    pub fn is_marked(&self, dart: DartKey, mark: Mark) -> bool {
        self.darts
            .get(dart)
            .is_some_and(|d| self.marks.is_word_marked(d.mark_word(), mark))
    }

    /// Flips the meaning of `mark` for every dart at once.
    pub fn negate_mark(&mut self, mark: Mark) {
        let total = self.darts.len();
        self.marks.negate(mark, total);
    }

    /// Number of darts currently marked with `mark`.
    #[must_use]
    pub fn number_of_marked_darts(&self, mark: Mark) -> usize {
        self.marks.marked_count(mark)
    }

    /// True when no dart is marked with `mark`.
    #[must_use]
    pub fn is_whole_map_unmarked(&self, mark: Mark) -> bool {
        self.marks.marked_count(mark) == 0
    }

    // =========================================================================
    // BASIC CREATION OPERATIONS
    // =========================================================================

    /// Creates an isolated edge: two darts linked by β₂.
    ///
    /// Returns one of the two darts.
    pub fn make_edge(&mut self) -> DartKey {
        assert!(D >= 2, "an edge with two sides needs dimension >= 2");
        let a = self.create_dart();
        let b = self.create_dart();
        self.basic_link_beta(a, b, 2);
        a
    }

    /// Creates an isolated combinatorial polygon: `n` darts cycled by β₁.
    ///
    /// Returns the first dart of the cycle.
    ///
    /// # Panics
    ///
    /// Panics when `n == 0`.
    pub fn make_combinatorial_polygon(&mut self, n: usize) -> DartKey {
        assert!(n > 0, "a polygon needs at least one edge");
        let first = self.create_dart();
        let mut prev = first;
        for _ in 1..n {
            let next = self.create_dart();
            self.basic_link_beta(prev, next, 1);
            prev = next;
        }
        self.basic_link_beta(prev, first, 1);
        first
    }

    /// Creates the boundary of a tetrahedron: four triangles glued by β₂
    /// into a closed surface with 4 vertices, 6 edges and 4 faces.
    ///
    /// Returns a dart of the first triangle.
    pub fn make_combinatorial_tetrahedron(&mut self) -> DartKey {
        assert!(D >= 2, "a tetrahedron boundary needs dimension >= 2");
        let d1 = self.make_combinatorial_polygon(3);
        let d2 = self.make_combinatorial_polygon(3);
        let d3 = self.make_combinatorial_polygon(3);
        let d4 = self.make_combinatorial_polygon(3);
        let pairs = [
            (d1, self.beta(d2, 0)),
            (self.beta(d1, 1), self.beta(d3, 0)),
            (self.beta(d1, 0), d4),
            (d2, self.beta(d4, 0)),
            (self.beta(d2, 1), d3),
            (self.beta(d3, 1), self.beta(d4, 1)),
        ];
        for (a, b) in pairs {
            self.link_beta(a, b, 2);
        }
        d1
    }

    // =========================================================================
    // SEWING
    // =========================================================================

    /// True when the i-involution orbits of `a` and `b` can be βᵢ-linked in
    /// lockstep: both orbits are isomorphic, and every paired dart is
    /// i-free.
    ///
    /// Only `2 ≤ i ≤ D` is supported.
    #[must_use]
    pub fn is_sewable(&self, i: usize, a: DartKey, b: DartKey) -> bool {
        if i < 2 || i > D || !self.contains_dart(a) || !self.contains_dart(b) {
            return false;
        }
        self.paired_involution_orbit(i, a, b)
            .is_some_and(|pairs| {
                pairs
                    .iter()
                    .all(|&(x, y)| self.is_free(x, i) && self.is_free(y, i))
            })
    }

    /// βᵢ-sews the cells of `a` and `b`: links their i-involution orbits in
    /// lockstep, merging cell attributes along the way.
    ///
    /// # Panics
    ///
    /// Panics when the sew is not possible; check with [`CMap::is_sewable`].
    pub fn sew(&mut self, i: usize, a: DartKey, b: DartKey) {
        assert!((2..=D).contains(&i), "sew supports dimensions 2..=D");
        let pairs = self
            .paired_involution_orbit(i, a, b)
            .unwrap_or_else(|| panic!("darts are not {i}-sewable"));
        for &(x, y) in &pairs {
            assert!(
                self.is_free(x, i) && self.is_free(y, i),
                "darts are not {i}-sewable: a dart is already {i}-linked"
            );
        }
        for (x, y) in pairs {
            self.link_beta(x, y, i);
        }
    }

    /// Reverses a βᵢ-sew at `a`: unlinks the whole i-involution orbit and
    /// splits the cell attributes that the separation disconnects.
    ///
    /// # Panics
    ///
    /// Panics when `a` is i-free.
    pub fn unsew(&mut self, i: usize, a: DartKey) {
        assert!((2..=D).contains(&i), "unsew supports dimensions 2..=D");
        assert!(!self.is_free(a, i), "cannot unsew an {i}-free dart");
        let orbit = self.involution_orbit(a, i);
        let mut modified = DartBuffer::new();
        for &x in &orbit {
            let partner = self.beta(x, i);
            if partner.is_null() {
                continue;
            }
            self.unlink_beta(x, i);
            modified.push(x);
            modified.push(partner);
        }
        self.test_split_after_modification(&modified);
    }

    // =========================================================================
    // COUNTING
    // =========================================================================

    /// Number of i-cells in the map.
    #[must_use]
    pub fn count_cells(&self, i: usize) -> usize {
        assert!(i <= D, "cell dimension {i} exceeds map dimension {D}");
        let mut visited: FastHashSet<DartKey> = FastHashSet::default();
        let mut count = 0;
        for (key, _) in &self.darts {
            if visited.contains(&key) {
                continue;
            }
            count += 1;
            visited.extend(self.cell_orbit(key, i));
        }
        count
    }

    // =========================================================================
    // VALIDATION
    // =========================================================================

    /// Audits every structural invariant of the map.
    ///
    /// Checks, in order: beta slot liveness and the β₀/β₁ inverse and
    /// βᵢ-involution properties; the composition axiom (βⱼ∘βᵢ is an
    /// involution for `j ≥ i + 2`); attribute coherence (one record per
    /// cell, live in-cell representatives, exact reference counts); and the
    /// mark counters.
    ///
    /// # Errors
    ///
    /// Returns the first violated invariant.
    pub fn is_valid(&self) -> Result<(), MapValidationError> {
        self.validate_beta_slots()?;
        self.validate_compositions()?;
        self.validate_attributes()?;
        self.validate_mark_counters()?;
        Ok(())
    }

    fn validate_beta_slots(&self) -> Result<(), MapValidationError> {
        for (key, dart) in &self.darts {
            for i in 0..=D {
                let neighbor = dart.beta(i);
                if neighbor.is_null() {
                    continue;
                }
                let Some(other) = self.darts.get(neighbor) else {
                    return Err(MapValidationError::DeadNeighbor { dart: key, dim: i });
                };
                match i {
                    0 => {
                        if other.beta(1) != key {
                            return Err(MapValidationError::BrokenInverse { dart: key });
                        }
                    }
                    1 => {
                        if other.beta(0) != key {
                            return Err(MapValidationError::BrokenInverse { dart: key });
                        }
                    }
                    _ => {
                        if other.beta(i) != key {
                            return Err(MapValidationError::BrokenInvolution { dart: key, dim: i });
                        }
                    }
                }
            }
        }
        Ok(())
    }

    /// Checks that βⱼ∘βᵢ is an involution for every `1 ≤ i`, `i + 2 ≤ j ≤ D`,
    /// in both composition orders, wherever the four-step chain is defined.
    fn validate_compositions(&self) -> Result<(), MapValidationError> {
        for (key, _) in &self.darts {
            for i in 1..=D {
                for j in (i + 2)..=D {
                    for order in [[i, j, i, j], [j, i, j, i]] {
                        let mut cur = key;
                        let mut complete = true;
                        for dim in order {
                            cur = self.beta(cur, dim);
                            if cur.is_null() {
                                complete = false;
                                break;
                            }
                        }
                        if complete && cur != key {
                            return Err(MapValidationError::BrokenCommutation { dart: key, i, j });
                        }
                    }
                }
            }
        }
        Ok(())
    }

    fn validate_attributes(&self) -> Result<(), MapValidationError> {
        for dim in 0..=D {
            let Some(layer) = self.attributes.layer(dim) else {
                continue;
            };
            let mut visited: FastHashSet<DartKey> = FastHashSet::default();
            let mut referents: FastHashMap<AttributeKey, usize> = FastHashMap::default();
            for (key, dart) in &self.darts {
                let attribute = dart.attribute(dim);
                if !attribute.is_null() {
                    *referents.entry(attribute).or_insert(0) += 1;
                }
                if visited.contains(&key) {
                    continue;
                }
                let orbit = self.cell_orbit(key, dim);
                visited.extend(orbit.iter().copied());
                for &other in &orbit {
                    if self.attribute_of(other, dim) != attribute {
                        return Err(MapValidationError::AttributeMismatch { dart: key, dim });
                    }
                }
                if attribute.is_null() {
                    continue;
                }
                let Some(record) = layer.get(attribute) else {
                    return Err(MapValidationError::RepresentativeDead { dim });
                };
                let representative = record.dart();
                if !self.contains_dart(representative) {
                    return Err(MapValidationError::RepresentativeDead { dim });
                }
                if !orbit.contains(&representative) {
                    return Err(MapValidationError::RepresentativeOutsideCell { dart: key, dim });
                }
            }
            for (attribute, record) in layer {
                let actual = referents.get(&attribute).copied().unwrap_or(0);
                if actual != record.ref_count() {
                    return Err(MapValidationError::RefCountMismatch {
                        dim,
                        recorded: record.ref_count(),
                        actual,
                    });
                }
            }
        }
        Ok(())
    }

    fn validate_mark_counters(&self) -> Result<(), MapValidationError> {
        self.marks
            .verify_counts(self.darts.values().map(Dart::mark_word))
            .map_err(|index| MapValidationError::MarkCounterMismatch { index })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_map_is_valid() {
        let map: CMap<3> = CMap::new();
        assert_eq!(map.number_of_darts(), 0);
        assert!(map.is_valid().is_ok());
    }

    #[test]
    fn beta_propagates_null() {
        let map: CMap<2> = CMap::new();
        assert!(map.beta(DartKey::null(), 1).is_null());
        assert!(map.is_free(DartKey::null(), 2));
    }

    #[test]
    fn basic_link_sets_the_inverse_pair() {
        let mut map: CMap<2> = CMap::new();
        let a = map.create_dart();
        let b = map.create_dart();
        map.basic_link_beta(a, b, 1);
        assert_eq!(map.beta(a, 1), b);
        assert_eq!(map.beta(b, 0), a);
        map.unlink_beta(a, 1);
        assert!(map.is_free(a, 1));
        assert!(map.is_free(b, 0));
    }

    #[test]
    fn involution_links_are_symmetric() {
        let mut map: CMap<3> = CMap::new();
        let a = map.create_dart();
        let b = map.create_dart();
        map.basic_link_beta(a, b, 3);
        assert_eq!(map.beta(a, 3), b);
        assert_eq!(map.beta(b, 3), a);
    }

    #[test]
    fn erase_dart_invalidates_the_key() {
        let mut map: CMap<2> = CMap::new();
        let a = map.create_dart();
        map.erase_dart(a);
        assert!(!map.contains_dart(a));
        assert!(map.beta(a, 0).is_null());
    }

    #[test]
    fn marks_round_trip_and_stay_clean() {
        let mut map: CMap<2> = CMap::new();
        let a = map.create_dart();
        let b = map.create_dart();
        let mark = map.get_new_mark().unwrap();
        map.mark(a, mark);
        assert!(map.is_marked(a, mark));
        assert!(!map.is_marked(b, mark));
        assert_eq!(map.number_of_marked_darts(mark), 1);
        map.negate_mark(mark);
        assert!(!map.is_marked(a, mark));
        assert!(map.is_marked(b, mark));
        map.unmark(b, mark);
        assert!(map.is_whole_map_unmarked(mark));
        map.free_mark(mark).unwrap();
        assert!(map.is_valid().is_ok());
    }

    #[test]
    fn erasing_marked_darts_keeps_counters_exact() {
        let mut map: CMap<2> = CMap::new();
        let a = map.create_dart();
        let mark = map.get_new_mark().unwrap();
        map.mark(a, mark);
        map.erase_dart(a);
        assert!(map.is_whole_map_unmarked(mark));
        map.free_mark(mark).unwrap();
    }

    #[test]
    fn polygon_is_a_closed_beta1_cycle() {
        let mut map: CMap<2> = CMap::new();
        let first = map.make_combinatorial_polygon(4);
        let mut cur = first;
        for _ in 0..4 {
            cur = map.beta(cur, 1);
        }
        assert_eq!(cur, first);
        assert!(map.is_valid().is_ok());
    }

    #[test]
    fn tetrahedron_census() {
        let mut map: CMap<3> = CMap::new();
        let dart = map.make_combinatorial_tetrahedron();
        assert!(map.contains_dart(dart));
        assert_eq!(map.number_of_darts(), 12);
        assert_eq!(map.count_cells(0), 4);
        assert_eq!(map.count_cells(1), 6);
        assert_eq!(map.count_cells(2), 4);
        assert_eq!(map.count_cells(3), 1);
        assert!(map.is_valid().is_ok());
    }

    #[test]
    fn sew3_glues_two_tetrahedra_along_a_facet() {
        let mut map: CMap<3> = CMap::new();
        let t1 = map.make_combinatorial_tetrahedron();
        let t2 = map.make_combinatorial_tetrahedron();
        assert!(map.is_sewable(3, t1, t2));
        map.sew(3, t1, t2);
        assert!(map.is_valid().is_ok());
        assert_eq!(map.number_of_darts(), 24);
        assert_eq!(map.count_cells(3), 2);
        // The two glued triangles now form one shared 2-cell: 4 + 4 - 1.
        assert_eq!(map.count_cells(2), 7);
        assert_eq!(map.count_cells(1), 9);
        assert_eq!(map.count_cells(0), 5);
        assert!(!map.is_sewable(3, t1, t2));
    }

    #[test]
    fn unsew_restores_the_census() {
        let mut map: CMap<3> = CMap::new();
        let t1 = map.make_combinatorial_tetrahedron();
        let t2 = map.make_combinatorial_tetrahedron();
        map.sew(3, t1, t2);
        map.unsew(3, t1);
        assert!(map.is_valid().is_ok());
        assert_eq!(map.count_cells(2), 8);
        assert_eq!(map.count_cells(1), 12);
        assert_eq!(map.count_cells(0), 8);
        assert_eq!(map.count_cells(3), 2);
    }

    #[test]
    fn validation_catches_a_broken_involution() {
        let mut map: CMap<2> = CMap::new();
        let a = map.create_dart();
        let b = map.create_dart();
        let c = map.create_dart();
        map.basic_link_beta(a, b, 2);
        // Overwrite one side only: b still points at a, a points at c.
        map.basic_link_beta(a, c, 2);
        assert!(matches!(
            map.is_valid(),
            Err(MapValidationError::BrokenInvolution { .. })
        ));
    }

    #[test]
    fn serde_round_trip_preserves_the_census() {
        let mut map: CMap<3> = CMap::new();
        map.make_combinatorial_tetrahedron();
        let json = serde_json::to_string(&map).unwrap();
        let restored: CMap<3> = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.number_of_darts(), 12);
        assert_eq!(restored.count_cells(2), 4);
        assert!(restored.is_valid().is_ok());
    }
}

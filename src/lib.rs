//! # cmap
//!
//! This is a library for building and modifying **d-dimensional
//! combinatorial maps**: cellular subdivisions of d-dimensional
//! piecewise-linear manifolds with boundary, inspired by
//! [CGAL](https://www.cgal.org)'s combinatorial maps package.
//!
//! A combinatorial map is a set of atomic records called *darts*, linked by
//! partial maps β₀…β_D: β₁ walks a facet (β₀ is its inverse) and each βᵢ
//! with `i ≥ 2` is an involution gluing cells of dimension i. The cells of
//! the subdivision (vertices, edges, faces, volumes, ...) are orbits of
//! darts under subsets of the β functions; nothing geometric is stored.
//!
//! # Features
//!
//! - d-dimensional maps for any const dimension `D`
//! - The topological modification operators: vertex insertion in an edge or
//!   a facet, edge insertion in a facet (including dangling edges), facet
//!   insertion in a volume along a dart path, i-cell removal and i-cell
//!   contraction, with the matching structural pre-checks
//! - Cell attributes with user data on every enabled dimension, kept
//!   coherent (grouped, degrouped, split-tested) by the operators
//! - Basic creation operations (edges, polygons, tetrahedra) and βᵢ-sewing
//! - Structural validation of every map axiom via [`CMap::is_valid`]
//! - Serialization/Deserialization with [serde](https://serde.rs)
//!
//! # Basic Usage
//!
//! ```rust
//! use cmap::core::combinatorial_map::CMap;
//!
//! // Split a square facet by a new edge, then undo it.
//! let mut map: CMap<2> = CMap::new();
//! let corner = map.make_combinatorial_polygon(4);
//! let across = map.beta(map.beta(corner, 1), 1);
//!
//! assert!(map.is_insertable_cell_1_in_cell_2(corner, across));
//! let edge = map.insert_cell_1_in_cell_2(corner, across);
//! assert_eq!(map.count_cells(2), 2);
//!
//! assert!(map.is_removable(edge, 1));
//! assert_eq!(map.remove_cell(edge, 1), 2);
//! assert_eq!(map.count_cells(2), 1);
//! assert!(map.is_valid().is_ok());
//! ```
//!
//! Splitting a volume along a facet path:
//!
//! ```rust
//! use cmap::core::combinatorial_map::CMap;
//!
//! let mut map: CMap<3> = CMap::new();
//! let dart = map.make_combinatorial_tetrahedron();
//! let path = [dart, map.beta(dart, 1), map.beta(map.beta(dart, 1), 1)];
//!
//! assert!(map.is_insertable_cell_2_in_cell_3(&path));
//! map.insert_cell_2_in_cell_3(&path);
//! assert_eq!(map.count_cells(3), 2);
//! assert!(map.is_valid().is_ok());
//! ```
//!
//! # Map Invariants
//!
//! [`CMap::is_valid`] audits the structural invariants the operators
//! preserve:
//!
//! | Invariant | Meaning |
//! |---|---|
//! | Inverse pair | β₀ and β₁ are mutually inverse partial maps |
//! | Involutions | every βᵢ with `i ≥ 2` is a partial involution |
//! | Compositions | βⱼ∘βᵢ is an involution for `j ≥ i + 2` |
//! | Liveness | every non-free slot points at a live dart |
//! | Attributes | darts of one cell share one record, whose representative is live and in the cell |
//! | Marks | per-mark counters agree with the dart mark bits |
//!
//! Operators presume their preconditions (checked by the predicates in
//! [`core::operations::predicates`]); violating one is a programming error,
//! not a recoverable failure. On success the map is valid again; the
//! operators debug-assert it.
//!
//! # References
//!
//! - Damiand, G., and Lienhardt, P. "Combinatorial Maps: Efficient Data
//!   Structures for Computer Graphics and Image Processing." CRC Press, 2014
//! - Lienhardt, P. "N-dimensional generalized combinatorial maps and
//!   cellular quasi-manifolds." International Journal of Computational
//!   Geometry & Applications 4.3 (1994): 275-324
//! - [CGAL Combinatorial Maps documentation](https://doc.cgal.org/latest/Combinatorial_map/index.html)

// Forbid unsafe code throughout the entire crate
#![forbid(unsafe_code)]

/// The `core` module contains the combinatorial map, its darts, marks,
/// attributes, orbits, and the topological modification operators.
pub mod core {
    pub mod attributes;
    /// Collection aliases tuned for dart-key workloads.
    pub mod collections;
    pub mod combinatorial_map;
    pub mod dart;
    pub mod marks;
    /// The topological modification operators and their pre-checks.
    pub mod operations {
        pub mod contract;
        pub mod insert_edge;
        pub mod insert_facet;
        pub mod insert_vertex;
        pub mod predicates;
        pub mod remove;
    }
    pub mod orbit;
    /// Trait bounds for attribute payloads.
    pub mod traits;
    pub mod util;

    // Re-export the core types.
    pub use attributes::*;
    pub use combinatorial_map::*;
    pub use dart::*;
    pub use marks::*;
    pub use traits::*;
}

/// A prelude module that re-exports the commonly used types.
pub mod prelude {
    pub use crate::core::{
        attributes::{AttributeError, AttributeKey, CellAttribute},
        collections::{DartBuffer, FastHashMap, FastHashSet, SmallBuffer},
        combinatorial_map::{CMap, MapValidationError},
        dart::{Dart, DartKey},
        marks::{Mark, MarkError, NB_MARKS},
        traits::DataType,
    };
    // `Key` gives access to `DartKey::null()` / `is_null()`.
    pub use slotmap::Key;
}

/// The function `is_normal` checks that structs implement `auto` traits.
/// Traits are checked at compile time, so this function is only used for
/// testing.
#[must_use]
pub const fn is_normal<T: Sized + Send + Sync + Unpin>() -> bool {
    true
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use crate::core::{combinatorial_map::CMap, dart::Dart};
    use crate::is_normal;

    #[test]
    fn normal_types() {
        assert!(is_normal::<Dart>());
        assert!(is_normal::<CMap<2>>());
        assert!(is_normal::<CMap<3, u32>>());
        assert!(is_normal::<CMap<4, Option<u64>>>());
    }

    #[test]
    fn prelude_exports_are_usable() {
        use crate::prelude::*;

        let mut map: CMap<2> = CMap::new();
        let dart = map.make_combinatorial_polygon(3);
        let mut buffer = DartBuffer::new();
        buffer.push(dart);
        assert_eq!(buffer.len(), 1);

        let mut seen: FastHashSet<DartKey> = FastHashSet::default();
        assert!(seen.insert(dart));
        assert!(!seen.insert(dart));

        assert!(map.is_valid().is_ok());
    }
}

//! Vertex insertion: splitting an edge, and triangulating a facet through a
//! new interior vertex.

use slotmap::Key;

use crate::core::collections::DartBuffer;
use crate::core::combinatorial_map::CMap;
use crate::core::dart::DartKey;
use crate::core::traits::DataType;

impl<const D: usize, A: DataType> CMap<D, A> {
    /// Splits the edge of `dart` by inserting a new vertex.
    ///
    /// Every dart of the 1-cell gets a successor dart carrying the second
    /// half of the edge; the higher-dimension links are rewired so each βₖ
    /// pairing crosses to the matching half on the other side. The new darts
    /// join the cells of their originals on every dimension above the edge,
    /// and the second half of the split edge receives its own 1-attribute.
    ///
    /// Returns `β₁(dart)`, a dart incident to the new vertex.
    ///
    /// # Panics
    ///
    /// Panics when `dart` is dead or the mark pool is exhausted.
    pub fn insert_cell_0_in_cell_1(&mut self, dart: DartKey) -> DartKey {
        assert!(self.contains_dart(dart), "insert_cell_0_in_cell_1 on a dead dart");

        let treated = self.reserve_mark();
        let edge_darts = self.cell_orbit(dart, 1);

        for &it in &edge_darts {
            let d1 = self.create_dart();

            let next = self.beta(it, 1);
            if !next.is_null() {
                self.basic_link_beta(d1, next, 1);
            }

            for dim in 2..=D {
                let neighbor = self.beta(it, dim);
                if !neighbor.is_null() && self.is_marked(neighbor, treated) {
                    // The neighbor's half pairs with our new dart and vice
                    // versa, so βₖ keeps crossing the new vertex correctly.
                    self.basic_link_beta(neighbor, d1, dim);
                    let neighbor_half = self.beta(neighbor, 1);
                    self.basic_link_beta(it, neighbor_half, dim);
                }
            }

            self.basic_link_beta(it, d1, 1);
            self.group_all_dart_attributes_except(it, d1, 1);

            self.mark(it, treated);
        }

        for &it in &edge_darts {
            self.unmark(it, treated);
        }
        debug_assert!(self.is_whole_map_unmarked(treated));
        self.release_mark(treated);

        let new_dart = self.beta(dart, 1);
        self.degroup_attribute(1, dart, new_dart);

        debug_assert!(self.is_valid().is_ok());
        new_dart
    }

    /// Triangulates the 2-cell of `dart` through a new interior vertex.
    ///
    /// Walks the facet (starting from its 0-free dart when open) and hangs a
    /// pair of spoke darts off every original edge, stitching consecutive
    /// spokes by β₂ so the facet becomes a fan of triangles around the new
    /// central vertex. The construction is mirrored across every non-free
    /// dimension `k ≥ 3` of the facet. Each triangle after the first is
    /// split off the original 2-attribute.
    ///
    /// Returns a dart incident to the new central vertex, or null when the
    /// facet was a single fully-free dart.
    ///
    /// # Panics
    ///
    /// Panics when `dart` is dead or the mark pool is exhausted.
    pub fn insert_cell_0_in_cell_2(&mut self, dart: DartKey) -> DartKey {
        assert!(self.contains_dart(dart), "insert_cell_0_in_cell_2 on a dead dart");

        let first = self.rewind_to_facet_start(dart);

        // Collect the facet walk up front; the surgery below rewires the
        // β0/β1 links it would otherwise follow.
        let mut facet = DartBuffer::new();
        facet.push(first);
        let mut cur = self.beta(first, 1);
        while !cur.is_null() && cur != first {
            facet.push(cur);
            cur = self.beta(cur, 1);
        }

        let treated = self.reserve_mark();
        let mut to_unmark = DartBuffer::new();
        let mut deferred_splits: Vec<(DartKey, DartKey)> = Vec::new();

        let mut prev = DartKey::null();
        let mut n1 = DartKey::null();
        let mut n2 = DartKey::null();

        for &cur in &facet {
            self.mark(cur, treated);
            to_unmark.push(cur);

            if cur != first {
                deferred_splits.push((first, cur));
            }

            n1 = if self.is_free(cur, 0) {
                DartKey::null()
            } else {
                let spoke = self.create_dart();
                self.link_beta(cur, spoke, 0);
                spoke
            };

            n2 = if self.is_free(cur, 1) {
                DartKey::null()
            } else {
                let spoke = self.create_dart();
                self.link_beta(cur, spoke, 1);
                spoke
            };

            if !n1.is_null() && !n2.is_null() {
                self.link_beta(n1, n2, 0);
            }
            if !n1.is_null() && !prev.is_null() {
                self.link_beta(prev, n1, 2);
            }

            for dim in 3..=D {
                if self.is_free(dart, dim) {
                    continue;
                }
                let mirror = self.beta(cur, dim);
                if !self.is_marked(mirror, treated) {
                    // The mirrored facet runs in the opposite orientation:
                    // the spoke roles swap between β0 and β1 sides.
                    let nn1 = if n1.is_null() {
                        DartKey::null()
                    } else {
                        let spoke = self.create_dart();
                        self.link_beta(mirror, spoke, 1);
                        self.link_beta(n1, spoke, dim);
                        spoke
                    };
                    let nn2 = if n2.is_null() {
                        DartKey::null()
                    } else {
                        let spoke = self.create_dart();
                        self.link_beta(mirror, spoke, 0);
                        self.link_beta(n2, spoke, dim);
                        spoke
                    };
                    if !nn1.is_null() && !nn2.is_null() {
                        self.basic_link_beta(nn1, nn2, 1);
                    }
                    if !nn1.is_null() && !prev.is_null() {
                        let prev_mirror = self.beta(prev, dim);
                        self.link_beta(nn1, prev_mirror, 2);
                    }
                    self.mark(mirror, treated);
                    to_unmark.push(mirror);
                } else {
                    if !n1.is_null() {
                        let counterpart = self.beta(mirror, 1);
                        self.link_beta(n1, counterpart, dim);
                    }
                    if !n2.is_null() {
                        let counterpart = self.beta(mirror, 0);
                        self.link_beta(n2, counterpart, dim);
                    }
                }
            }

            prev = n2;
        }

        // Close the wheel back onto the first spoke.
        if !n2.is_null() {
            let first_spoke = self.beta(first, 0);
            self.link_beta(first_spoke, n2, 2);
            for dim in 3..=D {
                if self.is_free(dart, dim) {
                    continue;
                }
                let a = self.beta(first_spoke, dim);
                let b = self.beta(n2, dim);
                self.link_beta(a, b, 2);
            }
        }

        for &d in &to_unmark {
            self.unmark(d, treated);
        }
        debug_assert!(self.is_whole_map_unmarked(treated));
        self.release_mark(treated);

        for (a, b) in deferred_splits {
            self.degroup_attribute(2, a, b);
        }

        debug_assert!(self.is_valid().is_ok());
        n1
    }
}

//! Cell contraction: collapsing an i-cell and merging the two incident
//! (i−1)-cells when they existed. Dual to removal.

use slotmap::Key;

use crate::core::collections::DartBuffer;
use crate::core::combinatorial_map::CMap;
use crate::core::dart::DartKey;
use crate::core::traits::DataType;

impl<const D: usize, A: DataType> CMap<D, A> {
    /// Contracts the i-cell of `dart`, `1 ≤ i ≤ D`, merging the two
    /// incident (i−1)-cells when they existed.
    ///
    /// The cell must satisfy [`CMap::is_contractible`]. Returns the number
    /// of deleted darts, the size of the i-cell orbit.
    ///
    /// # Panics
    ///
    /// Panics when `i == 0`, `i > D`, `dart` is dead, or the mark pool is
    /// exhausted.
    pub fn contract_cell(&mut self, dart: DartKey, i: usize) -> usize {
        assert!((1..=D).contains(&i), "contractible dimensions are 1..=D");
        assert!(self.contains_dart(dart), "contract_cell on a dead dart");
        if i == 1 {
            self.contract_edge(dart)
        } else {
            self.contract_cell_general(dart, i)
        }
    }

    /// General case, `2 ≤ i ≤ D`: the two incident (i−1)-cells merge.
    fn contract_cell_general(&mut self, dart: DartKey, i: usize) -> usize {
        debug_assert!(self.is_contractible(dart, i));

        let doomed = self.reserve_mark();
        let modified_mark = self.reserve_mark();

        let imuinv = if i == 2 { 0 } else { i - 1 };

        let mut dg1 = DartKey::null();
        let mut dg2 = DartKey::null();
        let to_erase = self.cell_orbit(dart, i);
        for &y in &to_erase {
            if dg1.is_null() && !self.is_free(y, i - 1) {
                dg1 = y;
                dg2 = self.beta(y, i - 1);
            }
            self.mark(y, doomed);
        }
        let deleted = to_erase.len();

        // Merge the two incident (i-1)-cells, when both sides exist.
        if !dg1.is_null() {
            self.group_attribute(i - 1, dg1, dg2);
        }

        for &y in &to_erase {
            self.update_dart_of_all_attributes(y, doomed);
        }

        let mut modified = DartBuffer::new();

        for &y in &to_erase {
            // Left survivor: hop out of the doomed cell along β_{i-1}⁻¹.
            let mut d1 = self.beta(y, i);
            while !d1.is_null() && self.is_marked(d1, doomed) {
                d1 = self.beta(self.beta(d1, imuinv), i);
                if d1 == self.beta(y, i) {
                    d1 = DartKey::null();
                }
            }

            if !self.is_marked(d1, modified_mark) {
                let mut d2 = self.beta(self.beta(y, i - 1), i);
                while !d2.is_null() && self.is_marked(d2, doomed) {
                    d2 = self.beta(self.beta(d2, i - 1), i);
                    if d2 == self.beta(self.beta(y, i - 1), i) {
                        d2 = DartKey::null();
                    }
                }

                if !self.is_marked(d2, modified_mark) {
                    if !d1.is_null() {
                        if !d2.is_null() && d1 != d2 {
                            self.basic_link_beta(d1, d2, i);
                            self.mark(d1, modified_mark);
                            self.mark(d2, modified_mark);
                            modified.push(d1);
                            modified.push(d2);
                        } else if !self.is_free(d1, i) {
                            self.unlink_beta(d1, i);
                            debug_assert!(!self.is_marked(d1, modified_mark));
                            self.mark(d1, modified_mark);
                            modified.push(d1);
                        }
                    } else if !d2.is_null() && !self.is_free(d2, i) {
                        self.unlink_beta(d2, i);
                        debug_assert!(!self.is_marked(d2, modified_mark));
                        self.mark(d2, modified_mark);
                        modified.push(d2);
                    }
                }
            }

            // A dangling (i-1)-free dart still i-linked to a survivor.
            if self.is_free(y, i - 1) && !self.is_free(y, i) {
                let partner = self.beta(y, i);
                if !self.is_free(partner, i) {
                    self.unlink_beta(partner, i);
                    debug_assert!(!self.is_marked(partner, modified_mark));
                    self.mark(partner, modified_mark);
                    modified.push(partner);
                }
            }
        }

        self.test_split_after_modification(&modified);

        for &y in &to_erase {
            self.erase_dart(y);
        }
        debug_assert!(self.is_whole_map_unmarked(doomed));
        self.release_mark(doomed);

        for &d in &modified {
            self.unmark(d, modified_mark);
        }
        debug_assert!(self.is_whole_map_unmarked(modified_mark));
        self.release_mark(modified_mark);

        debug_assert!(self.is_valid().is_ok());
        deleted
    }

    /// Edge contraction, `i == 1`: the two endpoint vertices merge.
    fn contract_edge(&mut self, dart: DartKey) -> usize {
        let doomed = self.reserve_mark();

        let mut dg1 = DartKey::null();
        let mut dg2 = DartKey::null();
        let to_erase = self.cell_orbit(dart, 1);
        for &y in &to_erase {
            if dg1.is_null() {
                let other = self.other_extremity(y);
                if !other.is_null() {
                    dg1 = y;
                    dg2 = other;
                }
            }
            self.mark(y, doomed);
        }
        let deleted = to_erase.len();

        for &y in &to_erase {
            self.update_dart_of_all_attributes(y, doomed);
        }

        // Merge the two endpoint vertices, when the edge had two. When the
        // whole doomed vertex lies inside the edge, the merged record is
        // still anchored there; move it onto the surviving extremity.
        if !dg1.is_null() {
            self.group_attribute(0, dg1, dg2);
            let merged = self.attribute_of(dg2, 0);
            if !merged.is_null() {
                let rep = self
                    .attribute(0, merged)
                    .map_or_else(DartKey::null, |record| record.dart());
                if rep.is_null() || self.is_marked(rep, doomed) {
                    self.set_attribute_representative(0, merged, dg2);
                }
            }
        }

        let mut modified = DartBuffer::new();

        for &y in &to_erase {
            if !self.is_free(y, 0) {
                let behind = self.beta(y, 0);
                if !self.is_free(y, 1) && behind != y {
                    let ahead = self.beta(y, 1);
                    self.basic_link_beta(behind, ahead, 1);
                    modified.push(behind);
                    modified.push(ahead);
                } else {
                    // Self-loop or open end: unlink rather than relink.
                    self.unlink_beta(behind, 1);
                    modified.push(behind);
                }
            } else if !self.is_free(y, 1) {
                let ahead = self.beta(y, 1);
                self.unlink_beta(ahead, 0);
                modified.push(ahead);
            }
        }

        self.test_split_after_modification(&modified);

        for &y in &to_erase {
            self.erase_dart(y);
        }
        debug_assert!(self.is_whole_map_unmarked(doomed));
        self.release_mark(doomed);

        debug_assert!(self.is_valid().is_ok());
        deleted
    }
}

//! Cell removal: deleting an i-cell and merging the two incident
//! (i+1)-cells when they existed.

use slotmap::Key;

use crate::core::collections::DartBuffer;
use crate::core::combinatorial_map::CMap;
use crate::core::dart::DartKey;
use crate::core::traits::DataType;

impl<const D: usize, A: DataType> CMap<D, A> {
    /// Removes the i-cell of `dart`, `0 ≤ i ≤ D`, merging the two incident
    /// (i+1)-cells when they existed.
    ///
    /// The cell must satisfy [`CMap::is_removable`]. Returns the number of
    /// deleted darts, the size of the i-cell orbit.
    ///
    /// # Panics
    ///
    /// Panics when `i > D`, `dart` is dead, or the mark pool is exhausted.
    pub fn remove_cell(&mut self, dart: DartKey, i: usize) -> usize {
        assert!(i <= D, "cell dimension {i} exceeds map dimension {D}");
        assert!(self.contains_dart(dart), "remove_cell on a dead dart");
        if i == D {
            self.remove_cell_topmost(dart)
        } else if i == 0 {
            self.remove_vertex(dart)
        } else {
            self.remove_cell_general(dart, i)
        }
    }

    /// General case, `1 ≤ i < D`: the two incident (i+1)-cells merge.
    fn remove_cell_general(&mut self, dart: DartKey, i: usize) -> usize {
        debug_assert!(self.is_removable(dart, i));

        let doomed = self.reserve_mark();
        let modified_mark = self.reserve_mark();

        let iinv = if i == 1 { 0 } else { i };

        let mut dg1 = DartKey::null();
        let mut dg2 = DartKey::null();
        let to_erase = self.cell_orbit(dart, i);
        for &y in &to_erase {
            if dg1.is_null() && !self.is_free(y, i + 1) {
                dg1 = y;
                dg2 = self.beta(y, i + 1);
            }
            self.mark(y, doomed);
        }
        let deleted = to_erase.len();

        for &y in &to_erase {
            self.update_dart_of_all_attributes(y, doomed);
        }

        // Merge the two incident (i+1)-cells, when both sides exist.
        if !dg1.is_null() {
            self.group_attribute(i + 1, dg1, dg2);
        }

        let mut modified = DartBuffer::new();

        for &y in &to_erase {
            // Left survivor: hop through the doomed cell along β_{i+1}
            // until a live neighbor appears; null when the walk closes on
            // itself.
            let mut d1 = self.beta(y, iinv);
            while !d1.is_null() && self.is_marked(d1, doomed) {
                d1 = self.beta(self.beta(d1, i + 1), iinv);
                if d1 == self.beta(y, iinv) {
                    d1 = DartKey::null();
                }
            }

            if !self.is_marked(d1, modified_mark) {
                let start2 = self.beta(self.beta(y, i + 1), i);
                let mut d2 = start2;
                while !d2.is_null() && self.is_marked(d2, doomed) {
                    d2 = self.beta(self.beta(d2, i + 1), i);
                    if d2 == self.beta(self.beta(y, i + 1), i) {
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
                    } else if !d2.is_null() && !self.is_free(d2, iinv) {
                        self.unlink_beta(d2, iinv);
                        debug_assert!(!self.is_marked(d2, modified_mark));
                        self.mark(d2, modified_mark);
                        modified.push(d2);
                    }
                }
            }

            // A dangling i-side with no (i+1)-neighbor: detach the partner.
            if self.is_free(y, i + 1) && !self.is_free(y, i) {
                let partner = self.beta(y, i);
                if !self.is_free(partner, iinv) {
                    self.unlink_beta(partner, iinv);
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

    /// Top dimension, `i == D`: no merge, only β_D unlinking.
    fn remove_cell_topmost(&mut self, dart: DartKey) -> usize {
        let doomed = self.reserve_mark();

        let to_erase = self.cell_orbit(dart, D);
        for &y in &to_erase {
            self.mark(y, doomed);
        }
        let deleted = to_erase.len();

        for &y in &to_erase {
            self.update_dart_of_all_attributes(y, doomed);
        }

        let mut modified = DartBuffer::new();
        for &y in &to_erase {
            let neighbor = self.beta(y, D);
            if !neighbor.is_null() && !self.is_marked(neighbor, doomed) {
                modified.push(neighbor);
                self.unlink_beta(y, D);
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

    /// Vertex removal, `i == 0`: the incident edges merge.
    fn remove_vertex(&mut self, dart: DartKey) -> usize {
        debug_assert!(self.is_removable(dart, 0));

        let doomed = self.reserve_mark();

        let mut dg1 = DartKey::null();
        let mut dg2 = DartKey::null();
        let to_erase = self.cell_orbit(dart, 0);
        for &y in &to_erase {
            if dg1.is_null() && !self.is_free(y, 0) {
                dg1 = y;
                dg2 = self.beta(y, 0);
            }
            self.mark(y, doomed);
        }
        let deleted = to_erase.len();

        for &y in &to_erase {
            self.update_dart_of_all_attributes(y, doomed);
        }

        // Merge the two incident edges, when there were two. When the
        // absorbed edge lay wholly inside the doomed vertex, the merged
        // record is still anchored there; move it onto the survivor.
        if !dg1.is_null() {
            self.group_attribute(1, dg1, dg2);
            let merged = self.attribute_of(dg2, 1);
            if !merged.is_null() {
                let rep = self
                    .attribute(1, merged)
                    .map_or_else(DartKey::null, |record| record.dart());
                if rep.is_null() || self.is_marked(rep, doomed) {
                    self.set_attribute_representative(1, merged, dg2);
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
                    self.unlink_beta(behind, 1);
                    modified.push(behind);
                }

                for j in 2..=D {
                    if !self.is_free(y, j) {
                        let across = self.beta(y, j);
                        self.basic_link_beta(behind, across, j);
                        modified.push(behind);
                        modified.push(across);
                    }
                }
            } else {
                if !self.is_free(y, 1) {
                    let ahead = self.beta(y, 1);
                    self.unlink_beta(ahead, 0);
                    modified.push(ahead);
                }

                for j in 2..=D {
                    if !self.is_free(y, j) {
                        let across = self.beta(y, j);
                        self.unlink_beta(y, j);
                        modified.push(across);
                    }
                }
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

//! Facet insertion: splitting a 3-cell by a 2-cell along a closed dart path.

use slotmap::Key;

use crate::core::collections::FastHashMap;
use crate::core::combinatorial_map::CMap;
use crate::core::dart::DartKey;
use crate::core::traits::DataType;

impl<const D: usize, A: DataType> CMap<D, A> {
    /// Inserts a 2-cell in the 3-cell of the path's darts, whose boundary
    /// follows `path`.
    ///
    /// The path must satisfy [`CMap::is_insertable_cell_2_in_cell_3`]. A new
    /// ring of darts is β₂-grafted onto the path; when any path dart has a
    /// β₂ neighbor the facet is built two-sided (a β₃-mirrored ring), the
    /// volume is actually split, and the 3-attribute is degrouped across the
    /// two sides. For every dimension `k ∈ [4, D]` on which the path is
    /// glued to a mirror volume, the whole ring is replicated there and
    /// cross-linked by β_k so the composition axioms keep holding.
    ///
    /// Returns the first new dart.
    ///
    /// # Panics
    ///
    /// Panics when the path contains a dead dart.
    pub fn insert_cell_2_in_cell_3(&mut self, path: &[DartKey]) -> DartKey {
        debug_assert!(self.is_insertable_cell_2_in_cell_3(path));

        let with_mirror = path.iter().any(|&p| !self.is_free(p, 2));

        let mut prec = DartKey::null();
        let mut first = DartKey::null();

        for &p in path {
            let d = self.create_dart();
            let mut dd = DartKey::null();
            if with_mirror {
                dd = self.create_dart();
                self.basic_link_beta(d, dd, 3);
            }

            if prec.is_null() {
                first = d;
            } else {
                self.link_beta(prec, d, 0);
                if with_mirror {
                    let prec_mirror = self.beta(prec, 3);
                    self.link_beta(prec_mirror, dd, 1);
                }
            }

            let old_neighbor = self.beta(p, 2);
            if !old_neighbor.is_null() {
                self.link_beta(old_neighbor, dd, 2);
            }
            self.link_beta(p, d, 2);

            prec = d;
        }

        self.link_beta(prec, first, 0);
        if with_mirror {
            let last_mirror = self.beta(prec, 3);
            let first_mirror = self.beta(first, 3);
            self.link_beta(last_mirror, first_mirror, 1);
        }

        // Replicate the ring in every higher-dimensional mirror volume.
        for k in 4..=D {
            self.replicate_facet_ring(first, k, with_mirror);
        }

        if with_mirror {
            let mirror = self.beta(first, 3);
            self.degroup_attribute(3, first, mirror);
        }

        debug_assert!(self.is_valid().is_ok());
        first
    }

    /// Copies the new facet ring starting at `first` into the volume glued
    /// at dimension `k`, when there is one.
    ///
    /// Each copy dart is β_k-linked to its primary, β₂-grafted onto the
    /// mirror path, and the copy rings are stitched with β₀/β₁ swapped
    /// relative to the primary, which is what the involution axioms
    /// (βₖ∘β₀ and βₖ∘β₁) require of an orientation-reversing gluing.
    fn replicate_facet_ring(&mut self, first: DartKey, k: usize, with_mirror: bool) {
        let first_path_dart = self.beta(first, 2);
        if self.is_free(first_path_dart, k) {
            return;
        }

        let ring = self.beta1_orbit(first);
        let mut copies: FastHashMap<DartKey, DartKey> = FastHashMap::default();
        let mut mirror_copies: FastHashMap<DartKey, DartKey> = FastHashMap::default();

        for &r in &ring {
            let p = self.beta(r, 2);
            let pk = self.beta(p, k);

            let d = self.create_dart();
            self.basic_link_beta(r, d, k);
            copies.insert(r, d);

            let mut dd = DartKey::null();
            if with_mirror {
                dd = self.create_dart();
                self.basic_link_beta(d, dd, 3);
                let rr = self.beta(r, 3);
                self.basic_link_beta(rr, dd, k);
                mirror_copies.insert(r, dd);
            }

            if !pk.is_null() {
                if with_mirror {
                    let old_neighbor = self.beta(pk, 2);
                    if !old_neighbor.is_null() {
                        self.link_beta(old_neighbor, dd, 2);
                    }
                }
                self.link_beta(pk, d, 2);
            }
        }

        // Stitch the copies along the primary ring's adjacency, with the
        // walk direction reversed.
        for &r in &ring {
            let next = self.beta(r, 1);
            let copy = copies[&r];
            let copy_next = copies[&next];
            self.link_beta(copy, copy_next, 0);
            if with_mirror {
                let mirror = mirror_copies[&r];
                let mirror_next = mirror_copies[&next];
                self.link_beta(mirror, mirror_next, 1);
            }
        }

        if with_mirror {
            // The copy facet splits the mirror volume too.
            let copy_first = copies[&first];
            let copy_mirror = mirror_copies[&first];
            self.degroup_attribute(3, copy_first, copy_mirror);
        }
    }
}

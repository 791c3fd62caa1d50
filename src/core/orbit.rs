//! Orbit walks: the cells and involution classes of a combinatorial map.
//!
//! An orbit is the set of darts reachable from a start dart by repeatedly
//! applying a fixed subset of the β functions (and their inverses). The
//! walks here are breadth-first, deterministic (generators applied in
//! ascending dimension order), and pure reads: they use visited sets, not
//! dart marks, so the precondition predicates built on top of them never
//! mutate the map.
//!
//! The cell orbits follow the usual combinatorial-map definitions:
//!
//! - the **i-cell** of a dart, `1 ≤ i ≤ D`, is its orbit under every βⱼ with
//!   `j ≠ i` (β₀ serves as the inverse of β₁);
//! - the **0-cell** (vertex) is the orbit under the source-preserving
//!   compositions `β₁∘βⱼ` for `2 ≤ j ≤ D` and their inverses `βⱼ∘β₀`;
//! - the **i-involution orbit** is the orbit under every βⱼ with
//!   `|j − i| ≥ 2`, the dimensions whose links must be mirrored when a new
//!   i-cell is stitched in.

use slotmap::Key;

use crate::core::collections::{DartBuffer, DartPairBuffer, FastHashMap, FastHashSet};
use crate::core::combinatorial_map::CMap;
use crate::core::dart::DartKey;
use crate::core::traits::DataType;

impl<const D: usize, A: DataType> CMap<D, A> {
    /// Darts of the i-cell of `dart`, in deterministic breadth-first order.
    ///
    /// `i == 0` yields the vertex orbit; `i == D` the top-cell orbit.
    ///
    /// # Panics
    ///
    /// Panics if `i > D` or `dart` is not a live dart.
    #[must_use]
    pub fn cell_orbit(&self, dart: DartKey, i: usize) -> DartBuffer {
        assert!(i <= D, "cell dimension {i} exceeds map dimension {D}");
        assert!(self.contains_dart(dart), "cell_orbit of a dead dart");
        if i == 0 {
            return self.vertex_orbit_bounded(dart, D);
        }
        self.collect_orbit(dart, |map, x, out| {
            for j in 1..=D {
                if j == i {
                    continue;
                }
                out.push(map.beta(x, j));
                if j == 1 {
                    out.push(map.beta(x, 0));
                }
            }
        })
    }

    /// Darts of the vertex of `dart`, using only β₁…β_max_dim.
    ///
    /// With `max_dim == D` this is the 0-cell orbit; with `max_dim == 2` it
    /// is the vertex of the volume containing `dart`, the orbit the
    /// facet-insertion path pre-check compares against.
    #[must_use]
    pub fn vertex_orbit_bounded(&self, dart: DartKey, max_dim: usize) -> DartBuffer {
        assert!(self.contains_dart(dart), "vertex orbit of a dead dart");
        self.collect_orbit(dart, |map, x, out| {
            for j in 2..=max_dim {
                let turned = map.beta(map.beta(x, j), 1);
                out.push(turned);
                let back = map.beta(map.beta(x, 0), j);
                out.push(back);
            }
        })
    }

    /// Darts of the i-involution orbit of `dart`: the orbit under every βⱼ
    /// with `|j − i| ≥ 2`.
    ///
    /// For `i == 1` in a 3-map this is ⟨β₃⟩: the copies of `dart` in every
    /// volume glued along its facet.
    #[must_use]
    pub fn involution_orbit(&self, dart: DartKey, i: usize) -> DartBuffer {
        assert!(self.contains_dart(dart), "involution orbit of a dead dart");
        self.collect_orbit(dart, |map, x, out| {
            for j in 1..=D {
                if j.abs_diff(i) < 2 {
                    continue;
                }
                out.push(map.beta(x, j));
                if j == 1 {
                    out.push(map.beta(x, 0));
                }
            }
        })
    }

    /// Darts of the ⟨β₁⟩ orbit of `dart` (the facet walk), covering both
    /// directions when the facet is open.
    #[must_use]
    pub fn beta1_orbit(&self, dart: DartKey) -> DartBuffer {
        assert!(self.contains_dart(dart), "beta1 orbit of a dead dart");
        let mut orbit = DartBuffer::new();
        orbit.push(dart);
        let mut cur = self.beta(dart, 1);
        while !cur.is_null() && cur != dart {
            orbit.push(cur);
            cur = self.beta(cur, 1);
        }
        if cur.is_null() {
            // Open facet: pick up the darts behind the start.
            let mut back = self.beta(dart, 0);
            while !back.is_null() && back != dart {
                orbit.push(back);
                back = self.beta(back, 0);
            }
        }
        orbit
    }

    /// Rewinds `dart` along β₀ to the facet's 0-free dart, or back to
    /// `dart` itself when the facet is closed.
    #[must_use]
    pub(crate) fn rewind_to_facet_start(&self, dart: DartKey) -> DartKey {
        let mut first = dart;
        while !self.is_free(first, 0) && self.beta(first, 0) != dart {
            first = self.beta(first, 0);
        }
        first
    }

    /// True when `a` and `b` lie in the same i-cell.
    #[must_use]
    pub fn belong_to_same_cell(&self, a: DartKey, b: DartKey, i: usize) -> bool {
        self.cell_orbit(a, i).contains(&b)
    }

    /// Walks the i-involution orbits of `a` and `b` in lockstep, pairing the
    /// darts that a βᵢ-sew would link.
    ///
    /// The second side mirrors orientation: a β₁ step on the first side is a
    /// β₀ step on the second. Returns `None` when the two orbits are not
    /// structurally isomorphic (different free patterns, conflicting
    /// pairings, or a dart paired with itself), i.e. when the sew is not
    /// possible.
    pub(crate) fn paired_involution_orbit(
        &self,
        i: usize,
        a: DartKey,
        b: DartKey,
    ) -> Option<DartPairBuffer> {
        let mut pairs = DartPairBuffer::new();
        let mut partner: FastHashMap<DartKey, DartKey> = FastHashMap::default();
        let mut queue: std::collections::VecDeque<(DartKey, DartKey)> =
            std::collections::VecDeque::new();
        partner.insert(a, b);
        queue.push_back((a, b));
        while let Some((x1, x2)) = queue.pop_front() {
            if x1 == x2 {
                return None;
            }
            pairs.push((x1, x2));
            for j in 1..=D {
                if j.abs_diff(i) < 2 {
                    continue;
                }
                let steps: [(DartKey, DartKey); 2] = if j == 1 {
                    [
                        (self.beta(x1, 1), self.beta(x2, 0)),
                        (self.beta(x1, 0), self.beta(x2, 1)),
                    ]
                } else {
                    [
                        (self.beta(x1, j), self.beta(x2, j)),
                        (DartKey::null(), DartKey::null()),
                    ]
                };
                for (n1, n2) in steps {
                    if n1.is_null() && n2.is_null() {
                        continue;
                    }
                    if n1.is_null() || n2.is_null() {
                        return None;
                    }
                    match partner.get(&n1) {
                        Some(&seen) => {
                            if seen != n2 {
                                return None;
                            }
                        }
                        None => {
                            partner.insert(n1, n2);
                            queue.push_back((n1, n2));
                        }
                    }
                }
            }
        }
        Some(pairs)
    }

    /// Breadth-first orbit collection; `neighbors` pushes the (possibly
    /// null) successors of a dart, in a deterministic order.
    fn collect_orbit<F>(&self, start: DartKey, neighbors: F) -> DartBuffer
    where
        F: Fn(&Self, DartKey, &mut DartBuffer),
    {
        let mut orbit = DartBuffer::new();
        let mut visited: FastHashSet<DartKey> = FastHashSet::default();
        let mut queue: std::collections::VecDeque<DartKey> = std::collections::VecDeque::new();
        visited.insert(start);
        queue.push_back(start);
        let mut scratch = DartBuffer::new();
        while let Some(x) = queue.pop_front() {
            orbit.push(x);
            scratch.clear();
            neighbors(self, x, &mut scratch);
            for &next in &scratch {
                if !next.is_null() && visited.insert(next) {
                    queue.push_back(next);
                }
            }
        }
        orbit
    }
}

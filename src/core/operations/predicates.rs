//! Structural pre-checks for the modification operators.
//!
//! Every operator in this crate presumes its precondition; these predicates
//! are how callers establish them. All four are pure reads: they walk
//! orbits with visited sets and never touch marks or links, so running one
//! twice returns the same answer and leaves the map untouched.

use slotmap::Key;

use crate::core::combinatorial_map::CMap;
use crate::core::dart::DartKey;
use crate::core::traits::DataType;

impl<const D: usize, A: DataType> CMap<D, A> {
    /// True when the i-cell of `dart` can be removed.
    ///
    /// An i-cell is removable when `i == D`, when `i == D - 1`, or when at
    /// most two (i+1)-cells are incident to it, which holds exactly when
    /// `β_{i+1}(β_{i+2}(y)) = β_{i+2}(β_{i+1}⁻¹(y))` for every dart `y` of
    /// the cell.
    ///
    /// # Panics
    ///
    /// Panics if `i > D` or `dart` is dead.
    #[must_use]
    pub fn is_removable(&self, dart: DartKey, i: usize) -> bool {
        assert!(i <= D, "cell dimension {i} exceeds map dimension {D}");
        assert!(self.contains_dart(dart), "is_removable of a dead dart");
        if i == D || i + 1 == D {
            return true;
        }
        self.cell_orbit(dart, i).into_iter().all(|y| {
            self.beta(self.beta(y, i + 2), i + 1) == self.beta(self.beta_inv(y, i + 1), i + 2)
        })
    }

    /// True when the i-cell of `dart` can be contracted.
    ///
    /// A 0-cell is never contractible and a 1-cell always is; otherwise at
    /// most two (i−1)-cells may be incident to the cell, which holds exactly
    /// when `β_{i-1}(β_{i-2}(y)) = β_{i-1}(β_{i-2}⁻¹(y))` for every dart `y`
    /// of the cell.
    ///
    /// # Panics
    ///
    /// Panics if `i > D` or `dart` is dead.
    #[must_use]
    pub fn is_contractible(&self, dart: DartKey, i: usize) -> bool {
        assert!(i <= D, "cell dimension {i} exceeds map dimension {D}");
        assert!(self.contains_dart(dart), "is_contractible of a dead dart");
        if i == 0 {
            return false;
        }
        if i == 1 {
            return true;
        }
        self.cell_orbit(dart, i).into_iter().all(|y| {
            self.beta(self.beta(y, i - 2), i - 1) == self.beta(self.beta_inv(y, i - 2), i - 1)
        })
    }

    /// True when an edge can be inserted in a 2-cell between `adart1` and
    /// `adart2`: the darts are distinct and lie on the same ⟨β₁⟩ orbit.
    #[must_use]
    pub fn is_insertable_cell_1_in_cell_2(&self, adart1: DartKey, adart2: DartKey) -> bool {
        if adart1 == adart2 || !self.contains_dart(adart1) || !self.contains_dart(adart2) {
            return false;
        }
        self.beta1_orbit(adart1).contains(&adart2)
    }

    /// True when a 2-cell can be inserted in a 3-cell along `path`.
    ///
    /// The path must be non-empty, contain only live darts, be connected
    /// (the other extremity of each dart shares a vertex of the volume,
    /// the 0-cell restricted to β₁ and β₂, with the next dart), and close
    /// back onto its first dart. Requires `D ≥ 3`.
    #[must_use]
    pub fn is_insertable_cell_2_in_cell_3(&self, path: &[DartKey]) -> bool {
        if D < 3 || path.is_empty() {
            return false;
        }
        for &dart in path {
            if dart.is_null() || !self.contains_dart(dart) {
                return false;
            }
        }
        for window in path.windows(2) {
            let extremity = self.other_extremity(window[0]);
            if extremity.is_null() {
                return false;
            }
            if !self.vertex_orbit_bounded(extremity, 2).contains(&window[1]) {
                return false;
            }
        }
        let last = path[path.len() - 1];
        let extremity = self.other_extremity(last);
        if extremity.is_null() {
            return false;
        }
        self.vertex_orbit_bounded(extremity, 2).contains(&path[0])
    }
}

//! Collection aliases tuned for combinatorial-map workloads.
//!
//! Orbit walks and the modification operators spend their time hashing dart
//! keys and shuffling short per-dart slot arrays, so the whole crate funnels
//! its container choices through this module: `FxHash`-based maps and sets
//! for key-heavy hot paths, and inline `SmallVec` buffers for collections
//! whose length is bounded by the map dimension.

use rustc_hash::{FxHashMap, FxHashSet};
use slotmap::SlotMap;
use smallvec::SmallVec;

use crate::core::attributes::AttributeKey;
use crate::core::dart::DartKey;

// =============================================================================
// STORAGE BACKEND
// =============================================================================

/// Internal storage backend for darts and attributes.
///
/// The alias hides the concrete arena implementation so public signatures
/// never commit to it. `SlotMap` provides generation-checked keys: erasing a
/// dart invalidates every stale copy of its key, which is what makes dart
/// handles safe to hold across modification operators.
pub type StorageMap<K, V> = SlotMap<K, V>;

// =============================================================================
// CORE OPTIMIZED TYPES
// =============================================================================

/// Hash map keyed by small `Copy` keys (dart keys, attribute keys).
///
/// Uses `FxHash`, which is substantially faster than SipHash for the short
/// fixed-width keys this crate hashes; orbit walks are not exposed to
/// untrusted input, so HashDoS resistance is not needed here.
pub type FastHashMap<K, V> = FxHashMap<K, V>;

/// Hash set counterpart of [`FastHashMap`]; used for orbit visited sets.
pub type FastHashSet<K> = FxHashSet<K>;

/// Small vector with inline storage for up to `N` elements.
pub type SmallBuffer<T, const N: usize> = SmallVec<[T; N]>;

// =============================================================================
// DIMENSION-BOUNDED BUFFERS
// =============================================================================

/// Maximum map dimension the inline buffers are sized for.
///
/// Combinatorial maps beyond dimension 8 are far outside practical use; maps
/// of higher dimension still work, their per-dart slot arrays merely spill to
/// the heap.
pub const MAX_PRACTICAL_DIMENSION_SIZE: usize = 8;

/// One slot per beta index 0..=D.
pub const BETA_SLOT_COUNT: usize = MAX_PRACTICAL_DIMENSION_SIZE + 1;

/// Per-dart beta slots: `betas[i]` is the βᵢ neighbor, null when *i-free*.
pub type BetaSlots = SmallBuffer<DartKey, BETA_SLOT_COUNT>;

/// Per-dart attribute slots, one per dimension, null when unset.
pub type AttributeSlots = SmallBuffer<AttributeKey, BETA_SLOT_COUNT>;

/// Working buffer of dart keys for orbit collection and operator worklists.
///
/// 32 inline slots cover the cell orbits the modification operators touch in
/// typical low-dimensional meshes (a vertex of degree ≤ 10 in a 3-map, a
/// facet of ≤ 16 edges) without heap traffic.
pub type DartBuffer = SmallBuffer<DartKey, 32>;

/// Buffer of dart pairs, used by the lockstep walks (sewing, edge insertion).
pub type DartPairBuffer = SmallBuffer<(DartKey, DartKey), 32>;

#[cfg(test)]
mod tests {
    use super::*;
    use slotmap::Key;

    #[test]
    fn beta_slots_stay_inline_for_practical_dimensions() {
        let slots: BetaSlots = BetaSlots::from_elem(DartKey::null(), BETA_SLOT_COUNT);
        assert!(!slots.spilled());
        assert_eq!(slots.len(), MAX_PRACTICAL_DIMENSION_SIZE + 1);
    }

    #[test]
    fn dart_buffer_spills_gracefully() {
        let mut buffer = DartBuffer::new();
        for _ in 0..100 {
            buffer.push(DartKey::null());
        }
        assert_eq!(buffer.len(), 100);
        assert!(buffer.spilled());
    }

    #[test]
    fn fast_hash_set_deduplicates_keys() {
        let mut set: FastHashSet<u64> = FastHashSet::default();
        assert!(set.insert(42));
        assert!(!set.insert(42));
        assert_eq!(set.len(), 1);
    }
}

//! Scoped boolean marks on darts.
//!
//! Every modification operator tags darts while it works (doomed darts,
//! already-treated darts, re-linked survivors). Marks come from a fixed pool
//! of [`NB_MARKS`] indices owned by the map; an operator acquires the marks
//! it needs on entry and must release them, clean, before it returns.
//! Releasing a mark that still has marked darts is a bug and panics.
//!
//! The registry keeps a per-mark *inversion flag* so that flipping the
//! meaning of a mark for every dart at once (`negate_mark`) is O(1): a dart
//! is marked when its stored bit differs from the inversion flag. The flag
//! survives release/reacquire cycles, which is what keeps darts created
//! under one tenant of a mark index correctly unmarked for the next.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::collections::SmallBuffer;

/// Number of mark indices in the pool.
pub const NB_MARKS: usize = 32;

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Errors raised by the mark pool.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum MarkError {
    /// All [`NB_MARKS`] marks are currently reserved.
    #[error("mark pool exhausted: all {NB_MARKS} marks are reserved")]
    PoolExhausted,
    /// The mark is not currently reserved.
    #[error("mark {index} is not reserved")]
    NotReserved {
        /// Index of the offending mark.
        index: u8,
    },
}

// =============================================================================
// MARK HANDLE
// =============================================================================

/// Handle to a reserved mark index.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Mark(u8);

impl Mark {
    /// Index of this mark in `0..NB_MARKS`.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// Single-bit word for this mark's position.
    #[must_use]
    pub(crate) const fn bit(self) -> u32 {
        1 << self.0
    }
}

// =============================================================================
// MARK REGISTRY
// =============================================================================

/// Pool of mark indices plus the per-mark bookkeeping shared by all darts.
///
/// The per-dart bit words live in the darts themselves; the registry owns
/// the free list, the inversion flags, and the marked-dart counters that
/// make `is_whole_map_unmarked` O(1).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MarkRegistry {
    /// Stack of free mark indices; popping yields the lowest index first.
    free: SmallBuffer<u8, NB_MARKS>,
    /// Bitmask of currently reserved marks.
    reserved: u32,
    /// Bitmask of inverted marks; a dart is marked when its stored bit
    /// differs from this flag.
    inverted: u32,
    /// Number of currently marked darts per mark index.
    marked_counts: [usize; NB_MARKS],
}

impl Default for MarkRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl MarkRegistry {
    /// Creates a registry with all marks free and no inversions.
    #[must_use]
    pub fn new() -> Self {
        let mut free = SmallBuffer::new();
        // Reverse order so `acquire` hands out index 0 first.
        for index in (0..NB_MARKS).rev() {
            free.push(u8::try_from(index).unwrap_or(u8::MAX));
        }
        Self {
            free,
            reserved: 0,
            inverted: 0,
            marked_counts: [0; NB_MARKS],
        }
    }

    /// Reserves a mark from the pool.
    ///
    /// # Errors
    ///
    /// Returns [`MarkError::PoolExhausted`] when every mark is reserved.
    pub fn acquire(&mut self) -> Result<Mark, MarkError> {
        let index = self.free.pop().ok_or(MarkError::PoolExhausted)?;
        let mark = Mark(index);
        self.reserved |= mark.bit();
        debug_assert_eq!(self.marked_counts[mark.index()], 0);
        Ok(mark)
    }

    /// Returns a mark to the pool.
    ///
    /// # Errors
    ///
    /// Returns [`MarkError::NotReserved`] if the mark is already free.
    ///
    /// # Panics
    ///
    /// Panics if darts are still marked with `mark`; operators must unmark
    /// everything they marked before releasing.
    pub fn release(&mut self, mark: Mark) -> Result<(), MarkError> {
        if !self.is_reserved(mark) {
            return Err(MarkError::NotReserved { index: mark.0 });
        }
        assert_eq!(
            self.marked_counts[mark.index()],
            0,
            "released mark {} with {} darts still marked",
            mark.index(),
            self.marked_counts[mark.index()],
        );
        self.reserved &= !mark.bit();
        self.free.push(mark.0);
        Ok(())
    }

    /// True when `mark` is currently reserved.
    #[must_use]
    pub fn is_reserved(&self, mark: Mark) -> bool {
        self.reserved & mark.bit() != 0
    }

    /// Number of marks still available.
    #[must_use]
    pub fn available(&self) -> usize {
        self.free.len()
    }

    /// The word newly created darts must carry so that every mark reads as
    /// unmarked on them.
    #[must_use]
    pub(crate) fn blank_word(&self) -> u32 {
        self.inverted
    }

    /// Whether the stored bit word marks `mark` as set.
    #[must_use]
    pub(crate) fn is_word_marked(&self, word: u32, mark: Mark) -> bool {
        (word ^ self.inverted) & mark.bit() != 0
    }

    /// Updates `word` so `mark` reads as marked; returns the new word.
    /// Count bookkeeping is the caller's job via [`Self::note_marked`].
    #[must_use]
    pub(crate) fn word_with_marked(&self, word: u32, mark: Mark) -> u32 {
        (word & !mark.bit()) | (!self.inverted & mark.bit())
    }

    /// Updates `word` so `mark` reads as unmarked; returns the new word.
    #[must_use]
    pub(crate) fn word_with_unmarked(&self, word: u32, mark: Mark) -> u32 {
        (word & !mark.bit()) | (self.inverted & mark.bit())
    }

    pub(crate) fn note_marked(&mut self, mark: Mark) {
        self.marked_counts[mark.index()] += 1;
    }

    pub(crate) fn note_unmarked(&mut self, mark: Mark) {
        debug_assert!(self.marked_counts[mark.index()] > 0);
        self.marked_counts[mark.index()] -= 1;
    }

    /// Number of darts currently marked with `mark`.
    #[must_use]
    pub fn marked_count(&self, mark: Mark) -> usize {
        self.marked_counts[mark.index()]
    }

    /// Flips the meaning of `mark` for every dart in O(1).
    pub(crate) fn negate(&mut self, mark: Mark, total_darts: usize) {
        self.inverted ^= mark.bit();
        self.marked_counts[mark.index()] = total_darts - self.marked_counts[mark.index()];
    }

    /// Recomputes per-mark counts from the given dart mark words and checks
    /// them against the tracked counters. Returns the index of the first
    /// mismatching reserved mark.
    pub(crate) fn verify_counts<I>(&self, words: I) -> Result<(), usize>
    where
        I: Iterator<Item = u32>,
    {
        let mut recounted = [0_usize; NB_MARKS];
        for word in words {
            let mut effective = (word ^ self.inverted) & self.reserved;
            while effective != 0 {
                let index = effective.trailing_zeros() as usize;
                recounted[index] += 1;
                effective &= effective - 1;
            }
        }
        for index in 0..NB_MARKS {
            if self.reserved & (1 << index) != 0 && recounted[index] != self.marked_counts[index] {
                return Err(index);
            }
        }
        Ok(())
    }

    /// Adjusts counters for a dart that is about to be erased while carrying
    /// `word` as its mark bits.
    pub(crate) fn note_dart_erased(&mut self, word: u32) {
        let mut effective = (word ^ self.inverted) & self.reserved;
        while effective != 0 {
            let index = effective.trailing_zeros() as usize;
            debug_assert!(self.marked_counts[index] > 0);
            self.marked_counts[index] -= 1;
            effective &= effective - 1;
        }
    }
}

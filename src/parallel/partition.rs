//! Row partition planner.
//!
//! Splits `n` matrix rows over `p` ranks into contiguous blocks whose sizes differ
//! by at most one; the first `n % p` ranks take the extra row. The table is pure
//! integer arithmetic on `(n, p)`, so every rank that computes it locally obtains
//! exactly the same offsets. The same table drives both the scatter of row blocks
//! and the gather of partial results.

use crate::error::MvError;
use std::ops::Range;

/// Per-rank `(row_offset, row_count)` table.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RowAssignment {
    offsets: Vec<usize>,
    counts: Vec<usize>,
}

impl RowAssignment {
    /// Plan the row distribution of `n` rows over `p` ranks.
    ///
    /// Ranks beyond `n` receive empty blocks. `n == 0` and `p == 0` are rejected.
    pub fn plan(n: usize, p: usize) -> Result<Self, MvError> {
        if n == 0 {
            return Err(MvError::InvalidDimension(n));
        }
        if p == 0 {
            return Err(MvError::InsufficientRanks { ranks: 0, required: 1 });
        }
        let base = n / p;
        let extra = n % p;
        let mut offsets = Vec::with_capacity(p);
        let mut counts = Vec::with_capacity(p);
        let mut offset = 0;
        for r in 0..p {
            let count = base + usize::from(r < extra);
            offsets.push(offset);
            counts.push(count);
            offset += count;
        }
        debug_assert_eq!(offset, n);
        Ok(RowAssignment { offsets, counts })
    }

    /// Number of ranks in the table.
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// First global row owned by `rank`.
    pub fn offset(&self, rank: usize) -> usize {
        self.offsets[rank]
    }

    /// Number of rows owned by `rank` (possibly zero).
    pub fn count(&self, rank: usize) -> usize {
        self.counts[rank]
    }

    /// Global rows owned by `rank`.
    pub fn range(&self, rank: usize) -> Range<usize> {
        self.offsets[rank]..self.offsets[rank] + self.counts[rank]
    }

    pub fn offsets(&self) -> &[usize] {
        &self.offsets
    }

    pub fn counts(&self) -> &[usize] {
        &self.counts
    }

    /// Total rows covered by the table.
    pub fn total_rows(&self) -> usize {
        self.counts.iter().sum()
    }

    /// Iterate `(rank, offset, count)` triples in rank order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize, usize)> + '_ {
        self.offsets
            .iter()
            .zip(&self.counts)
            .enumerate()
            .map(|(r, (&o, &c))| (r, o, c))
    }

    /// Element-level `(counts, displacements)` for rows of length `row_len`.
    ///
    /// This is the layout used to scatter row blocks of a row-major matrix.
    pub fn element_layout(&self, row_len: usize) -> (Vec<usize>, Vec<usize>) {
        let counts = self.counts.iter().map(|&c| c * row_len).collect();
        let displs = self.offsets.iter().map(|&o| o * row_len).collect();
        (counts, displs)
    }
}

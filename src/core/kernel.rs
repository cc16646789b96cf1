//! Local compute kernel: dense row block × vector.
//!
//! Each output entry is accumulated left to right over the row starting from
//! zero, `y[i] = ((0 + a[i][0]·x[0]) + a[i][1]·x[1]) + …`. The sequential
//! baseline sums its rows with the same `row_dot`, so a row yields a
//! bit-identical value whichever rank computes it.
//!
//! A rank computes its rows on its own thread. The opt-in `rayon` feature
//! spreads the rows of [`multiply_rows`] over the thread pool (the order within
//! a row is unchanged); [`sequential_rows`] never does.

use crate::error::{MvError, try_zeroed};
use num_traits::Float;

#[cfg(test)]
thread_local! {
    /// Rows summed on the current thread.
    pub(crate) static ROWS_ON_THREAD: std::cell::Cell<usize> = const { std::cell::Cell::new(0) };
}

#[inline]
pub(crate) fn row_dot<T: Float>(row: &[T], x: &[T]) -> T {
    #[cfg(test)]
    ROWS_ON_THREAD.with(|c| c.set(c.get() + 1));
    row.iter().zip(x).fold(T::zero(), |acc, (&a, &b)| acc + a * b)
}

fn check_shapes<T>(block: &[T], row_len: usize, x: &[T], out: &[T]) -> Result<(), MvError> {
    if x.len() != row_len {
        return Err(MvError::ShapeMismatch { expected: row_len, found: x.len() });
    }
    if block.len() != out.len() * row_len {
        return Err(MvError::ShapeMismatch {
            expected: out.len() * row_len,
            found: block.len(),
        });
    }
    Ok(())
}

/// Compute `out = block · x` for a row-major block of rows of length `row_len`.
pub fn multiply_rows<T>(
    block: &[T],
    row_len: usize,
    x: &[T],
    out: &mut [T],
) -> Result<(), MvError>
where
    T: Float + Send + Sync,
{
    check_shapes(block, row_len, x, out)?;
    if row_len == 0 {
        out.fill(T::zero());
        return Ok(());
    }
    #[cfg(feature = "rayon")]
    {
        use rayon::prelude::*;
        out.par_iter_mut()
            .zip(block.par_chunks_exact(row_len))
            .for_each(|(yi, row)| *yi = row_dot(row, x));
    }
    #[cfg(not(feature = "rayon"))]
    {
        for (yi, row) in out.iter_mut().zip(block.chunks_exact(row_len)) {
            *yi = row_dot(row, x);
        }
    }
    Ok(())
}

/// Same product as [`multiply_rows`], always on the calling thread.
pub fn sequential_rows<T: Float>(
    block: &[T],
    row_len: usize,
    x: &[T],
    out: &mut [T],
) -> Result<(), MvError> {
    check_shapes(block, row_len, x, out)?;
    if row_len == 0 {
        out.fill(T::zero());
        return Ok(());
    }
    for (yi, row) in out.iter_mut().zip(block.chunks_exact(row_len)) {
        *yi = row_dot(row, x);
    }
    Ok(())
}

/// Allocate the local result and compute `block · x` into it.
///
/// An empty block is valid and yields an empty result.
pub fn multiply_block<T>(block: &[T], row_len: usize, x: &[T]) -> Result<Vec<T>, MvError>
where
    T: Float + Default + Send + Sync,
{
    let rows = match row_len {
        0 => 0,
        _ if block.len() % row_len != 0 => {
            return Err(MvError::ShapeMismatch {
                expected: (block.len() / row_len + 1) * row_len,
                found: block.len(),
            });
        }
        _ => block.len() / row_len,
    };
    let mut out = try_zeroed("local result", rows)?;
    multiply_rows(block, row_len, x, &mut out)?;
    Ok(out)
}

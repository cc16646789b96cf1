//! Tests for the dense local kernel: row-block products against manual sums and faer.
//!
//! These tests run the block kernel and the single-threaded baseline on random
//! data, and cross-check the product with faer's own dense multiplication.

use approx::assert_abs_diff_eq;
use faer::Mat;
use rand::Rng;
use scatmv::core::{multiply_block, multiply_rows, sequential_rows};
use scatmv::matrix::DenseMatrix;

/// Test matrix-vector multiplication for a small random dense matrix.
///
/// Builds a random 5x5 row-major matrix and a random vector, computes the product
/// with the single-threaded kernel, and checks every entry against a manual sum.
#[test]
fn matvec_random_small() {
    let n = 5;
    let mut rng = rand::thread_rng();
    let vals: Vec<f64> = (0..n * n).map(|_| rng.r#gen()).collect();
    let a = DenseMatrix::from_row_major(n, vals.clone()).unwrap();
    let x: Vec<f64> = (0..n).map(|_| rng.r#gen()).collect();
    let mut y = vec![0.0; n];
    sequential_rows(a.as_slice(), n, &x, &mut y).unwrap();

    // check y[i] == sum_j A[i,j]*x[j]
    for i in 0..n {
        let expected = (0..n).map(|j| vals[i * n + j] * x[j]).sum::<f64>();
        assert_abs_diff_eq!(y[i], expected, epsilon = 1e-12);
    }
}

/// Cross-check the row-major product with faer's dense matrix multiplication.
#[test]
fn matvec_matches_faer() {
    let n = 40;
    let mut rng = rand::thread_rng();
    let a = DenseMatrix::from_fn(n, |_, _| rng.r#gen::<f64>() - 0.5).unwrap();
    let x: Vec<f64> = (0..n).map(|_| rng.r#gen()).collect();
    let y = multiply_block(a.as_slice(), n, &x).unwrap();

    let xm = Mat::from_fn(n, 1, |i, _| x[i]);
    let ym = &a.to_faer() * &xm;
    for i in 0..n {
        assert_abs_diff_eq!(y[i], ym[(i, 0)], epsilon = 1e-12);
    }
}

/// A block of rows gives exactly the matching slice of the full product.
#[test]
fn row_block_equals_slice_of_full_product() {
    let n = 9;
    let mut rng = rand::thread_rng();
    let a = DenseMatrix::from_fn(n, |_, _| rng.r#gen()).unwrap();
    let x: Vec<f64> = (0..n).map(|_| rng.r#gen()).collect();
    let mut full = vec![0.0; n];
    multiply_rows(a.as_slice(), n, &x, &mut full).unwrap();

    for (start, end) in [(0, 3), (3, 7), (7, 9), (4, 4)] {
        let part = multiply_block(a.rows(start..end), n, &x).unwrap();
        assert_eq!(part.as_slice(), &full[start..end]);
    }
}

/// The kernel is generic over the float type.
#[test]
fn single_precision_block() {
    let block = [1.0f32, 2.0, 3.0, 4.0];
    let y = multiply_block(&block, 2, &[0.5f32, 0.25]).unwrap();
    assert_eq!(y, vec![1.0, 2.5]);
}

//! Binary matrix rank test.

use crate::error::{Error, Result};
use crate::result::Measurement;
use crate::sequence::BitSequence;

const ROWS: usize = 32;
const COLS: usize = 32;
const BITS_PER_MATRIX: usize = ROWS * COLS;

/// Asymptotic proportions of 32×32 matrices with rank 32, 31 and ≤ 30.
const P_FULL: f64 = 0.2888;
const P_FULL_MINUS_ONE: f64 = 0.5776;
const P_REST: f64 = 0.1336;

/// Rank over GF(2) of a matrix whose rows are packed MSB-first into the low
/// `cols` bits of each `u64` (`cols ≤ 64`).
///
/// Forward elimination brings the matrix to row-echelon form (pivot search,
/// swap, XOR below), backward elimination clears above each pivot, and the
/// rank is the number of non-zero rows left.
pub fn gf2_rank(rows: &[u64], cols: usize) -> usize {
    let cols = cols.min(64);
    let mut m = rows.to_vec();
    let n_rows = m.len();
    let mut pivots = Vec::with_capacity(n_rows.min(cols));

    let mut next = 0;
    for col in 0..cols {
        if next == n_rows {
            break;
        }
        let bit = 1u64 << (cols - 1 - col);
        let Some(pivot) = (next..n_rows).find(|&r| m[r] & bit != 0) else {
            continue;
        };
        m.swap(next, pivot);
        let pivot_row = m[next];
        for row in m.iter_mut().skip(next + 1) {
            if *row & bit != 0 {
                *row ^= pivot_row;
            }
        }
        pivots.push((next, bit));
        next += 1;
    }

    for &(row, bit) in pivots.iter().rev() {
        let pivot_row = m[row];
        for above in m.iter_mut().take(row) {
            if *above & bit != 0 {
                *above ^= pivot_row;
            }
        }
    }

    m.iter().filter(|&&r| r != 0).count()
}

/// Pack `rows × cols` bits, row-major, into one `u64` per row.
fn pack_rows(bits: &[u8], cols: usize) -> Vec<u64> {
    bits.chunks_exact(cols)
        .map(|row| row.iter().fold(0u64, |acc, &b| (acc << 1) | b as u64))
        .collect()
}

/// Binary matrix rank test on disjoint 32×32 matrices.
pub fn binary_matrix_rank(seq: &BitSequence) -> Result<Measurement> {
    let name = "Binary Matrix Rank";
    let n = seq.len();
    let num_matrices = n / BITS_PER_MATRIX;
    if num_matrices == 0 {
        return Err(Error::InvalidInput(format!(
            "matrix rank test needs at least {BITS_PER_MATRIX} bits, got {n}"
        )));
    }

    let mut full_rank = 0u64;
    let mut rank_m1 = 0u64;
    for matrix in seq.as_slice().chunks_exact(BITS_PER_MATRIX) {
        match gf2_rank(&pack_rows(matrix, COLS), COLS) {
            r if r == ROWS => full_rank += 1,
            r if r == ROWS - 1 => rank_m1 += 1,
            _ => {}
        }
    }
    let rest = num_matrices as u64 - full_rank - rank_m1;
    let n_f = num_matrices as f64;

    let chi2 = (full_rank as f64 - n_f * P_FULL).powi(2) / (n_f * P_FULL)
        + (rank_m1 as f64 - n_f * P_FULL_MINUS_ONE).powi(2) / (n_f * P_FULL_MINUS_ONE)
        + (rest as f64 - n_f * P_REST).powi(2) / (n_f * P_REST);
    let p = (-chi2 / 2.0).exp();
    Ok(Measurement::single(
        name,
        chi2,
        p,
        format!("N={num_matrices}, full={full_rank}, full-1={rank_m1}, other={rest}"),
    ))
}

//! Runs and longest-run-of-ones tests.

use crate::error::{Error, Result};
use crate::result::Measurement;
use crate::sequence::BitSequence;
use crate::special::{erfc, igamc};

/// Runs test: total number of uninterrupted runs of identical bits.
///
/// Only meaningful when the sequence already passes the frequency
/// prerequisite `|π − ½| < 2/√n`; otherwise [`Error::PreconditionNotMet`].
pub fn runs(seq: &BitSequence) -> Result<Measurement> {
    let name = "Runs";
    let bits = seq.as_slice();
    let n = bits.len();
    if n < 2 {
        return Err(Error::InvalidInput(format!("runs test needs n ≥ 2, got {n}")));
    }
    let nf = n as f64;
    let prop = seq.ones() as f64 / nf;
    let tau = 2.0 / nf.sqrt();
    if (prop - 0.5).abs() >= tau {
        return Err(Error::PreconditionNotMet(format!(
            "frequency prerequisite failed: |π − 0.5| = {:.6} ≥ τ = {tau:.6}",
            (prop - 0.5).abs()
        )));
    }

    let transitions = bits.windows(2).filter(|w| w[0] != w[1]).count();
    let v_obs = transitions as f64 + 1.0;
    let spread = prop * (1.0 - prop);
    let z = (v_obs - 2.0 * nf * spread).abs() / (2.0 * (2.0 * nf).sqrt() * spread);
    let p = erfc(z);
    Ok(Measurement::single(
        name,
        v_obs,
        p,
        format!("V_n={v_obs}, π={prop:.6}"),
    ))
}

/// Category layout of one block size: the longest run is clamped into
/// `[low, low + K]` and shifted to a class index.
struct RunTable {
    block_size: usize,
    low: usize,
    probs: &'static [f64],
}

const RUN_TABLES: [RunTable; 5] = [
    RunTable {
        block_size: 8,
        low: 1,
        probs: &[0.2148, 0.3672, 0.2305, 0.1875],
    },
    RunTable {
        block_size: 128,
        low: 4,
        probs: &[0.1174, 0.2430, 0.2493, 0.1752, 0.1027, 0.1124],
    },
    RunTable {
        block_size: 512,
        low: 6,
        probs: &[0.1170, 0.2460, 0.2523, 0.1755, 0.1027, 0.1124],
    },
    RunTable {
        block_size: 1000,
        low: 7,
        probs: &[0.1307, 0.2437, 0.2452, 0.1714, 0.1002, 0.1088],
    },
    RunTable {
        block_size: 10000,
        low: 10,
        probs: &[0.0882, 0.2092, 0.2483, 0.1933, 0.1208, 0.0675, 0.0727],
    },
];

/// Minimum sequence length for the longest-run test.
pub const LONGEST_RUN_MIN_LEN: usize = 128;

/// Block size the NIST reference picks for a sequence of length `n`.
pub fn recommended_run_block(n: usize) -> Result<usize> {
    match n {
        n if n < LONGEST_RUN_MIN_LEN => Err(Error::InvalidInput(format!(
            "longest-run test needs n ≥ {LONGEST_RUN_MIN_LEN}, got {n}"
        ))),
        n if n < 6272 => Ok(8),
        n if n < 750_000 => Ok(128),
        _ => Ok(10_000),
    }
}

/// Longest run of ones within a block, with the block size chosen from `n`.
pub fn longest_run_of_ones(seq: &BitSequence) -> Result<Measurement> {
    let block = recommended_run_block(seq.len())?;
    longest_run_of_ones_with_block(seq, block)
}

/// Longest run of ones with an explicit block size
/// (one of 8, 128, 512, 1000, 10000).
pub fn longest_run_of_ones_with_block(seq: &BitSequence, block_size: usize) -> Result<Measurement> {
    let name = "Longest Run of Ones";
    let table = RUN_TABLES
        .iter()
        .find(|t| t.block_size == block_size)
        .ok_or_else(|| {
            Error::InvalidInput(format!(
                "no reference probabilities for block size {block_size}"
            ))
        })?;
    let n = seq.len();
    let num_blocks = n / block_size;
    if n < LONGEST_RUN_MIN_LEN || num_blocks == 0 {
        return Err(Error::InvalidInput(format!(
            "longest-run test with M={block_size} needs at least {} bits, got {n}",
            block_size.max(LONGEST_RUN_MIN_LEN)
        )));
    }

    let k = table.probs.len() - 1;
    let mut observed = vec![0u64; k + 1];
    for block in seq.as_slice().chunks_exact(block_size) {
        let mut max_run = 0usize;
        let mut current_run = 0usize;
        for &bit in block {
            if bit == 1 {
                current_run += 1;
                max_run = max_run.max(current_run);
            } else {
                current_run = 0;
            }
        }
        let class = max_run.clamp(table.low, table.low + k) - table.low;
        observed[class] += 1;
    }

    let n_f = num_blocks as f64;
    let chi2: f64 = observed
        .iter()
        .zip(table.probs)
        .map(|(&v, &pi)| {
            let expected = n_f * pi;
            (v as f64 - expected).powi(2) / expected
        })
        .sum();
    let p = igamc(k as f64 / 2.0, chi2 / 2.0)?;
    Ok(Measurement::single(
        name,
        chi2,
        p,
        format!("blocks={num_blocks}, M={block_size}, K={k}, ν={observed:?}"),
    ))
}

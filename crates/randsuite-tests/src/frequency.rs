//! Frequency (monobit) and frequency-within-a-block tests.

use crate::error::{Error, Result};
use crate::result::Measurement;
use crate::sequence::BitSequence;
use crate::special::{erfc, igamc};

/// Monobit frequency: the proportion of ones should be close to ½.
///
/// Maps bits to ±1, sums them, and compares `|S_n| / √n` against a
/// half-normal distribution. Non-binary input cannot reach this function:
/// [`BitSequence::new`] rejects it with [`Error::InvalidInput`].
pub fn frequency(seq: &BitSequence) -> Result<Measurement> {
    let name = "Frequency";
    let n = seq.len();
    if n == 0 {
        return Err(Error::InvalidInput("frequency test needs n ≥ 1".into()));
    }
    let s: i64 = seq
        .as_slice()
        .iter()
        .map(|&b| if b == 1 { 1i64 } else { -1i64 })
        .sum();
    let s_obs = (s as f64).abs() / (n as f64).sqrt();
    let p = erfc(s_obs / std::f64::consts::SQRT_2);
    Ok(Measurement::single(name, s_obs, p, format!("S_n={s}, n={n}")))
}

/// Frequency within `block_size`-bit blocks; the trailing partial block is
/// discarded.
///
/// NIST recommends `M ≥ 20`, `M > 0.01·n` and `N < 100`; choosing such an
/// `M` is the caller's job. Only `M ≥ 1` and at least one full block are
/// enforced here.
pub fn block_frequency(seq: &BitSequence, block_size: usize) -> Result<Measurement> {
    let name = "Block Frequency";
    let n = seq.len();
    if block_size == 0 {
        return Err(Error::InvalidInput("block size must be positive".into()));
    }
    let num_blocks = n / block_size;
    if num_blocks == 0 {
        return Err(Error::InvalidInput(format!(
            "block size {block_size} exceeds sequence length {n}"
        )));
    }

    let bits = seq.as_slice();
    let mut sum = 0.0;
    for block in bits.chunks_exact(block_size) {
        let ones: usize = block.iter().map(|&b| b as usize).sum();
        let proportion = ones as f64 / block_size as f64;
        sum += (proportion - 0.5) * (proportion - 0.5);
    }
    let chi2 = 4.0 * block_size as f64 * sum;
    let p = igamc(num_blocks as f64 / 2.0, chi2 / 2.0)?;
    Ok(Measurement::single(
        name,
        chi2,
        p,
        format!("blocks={num_blocks}, M={block_size}"),
    ))
}

/// Smallest `M ≥ 20` with `M > ⌊0.01·n⌋` and fewer than 100 blocks.
pub fn recommended_block_size(n: usize) -> usize {
    let floor = n / 100;
    let mut m = 20usize.max(floor + 1);
    while n / m >= 100 {
        m += 1;
    }
    m
}

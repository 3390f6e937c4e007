//! Linear complexity test.

use crate::error::{Error, Result};
use crate::result::Measurement;
use crate::sequence::BitSequence;
use crate::special::igamc;

/// Probabilities of the seven `T_i` classes
/// `(-∞,-2.5], (-2.5,-1.5], .., (1.5,2.5], (2.5,∞)`.
const CLASS_PROBS: [f64; 7] = [0.010417, 0.03125, 0.125, 0.5, 0.25, 0.0625, 0.020833];

/// Upper class boundaries; anything above the last lands in the final class.
const CLASS_BOUNDS: [f64; 6] = [-2.5, -1.5, -0.5, 0.5, 1.5, 2.5];

/// Length of the shortest LFSR generating `bits` (Berlekamp–Massey over
/// GF(2)).
pub fn berlekamp_massey(bits: &[u8]) -> usize {
    let n = bits.len();
    if n == 0 {
        return 0;
    }
    let mut c = vec![0u8; n];
    let mut b = vec![0u8; n];
    c[0] = 1;
    b[0] = 1;
    let mut l: usize = 0;
    let mut m: isize = -1;

    for ni in 0..n {
        let mut d = bits[ni];
        for i in 1..=l {
            d ^= c[i] & bits[ni - i];
        }
        if d == 1 {
            let t = c.clone();
            let shift = (ni as isize - m) as usize;
            for i in shift..n {
                c[i] ^= b[i - shift];
            }
            if l <= ni / 2 {
                l = ni + 1 - l;
                m = ni as isize;
                b = t;
            }
        }
    }
    l
}

/// Expected linear complexity of a random `M`-bit block.
fn expected_complexity(block_size: usize) -> f64 {
    let m = block_size as f64;
    let sign = if block_size % 2 == 0 { -1.0 } else { 1.0 };
    m / 2.0 + (9.0 + sign) / 36.0 - (m / 3.0 + 2.0 / 9.0) / 2f64.powf(m)
}

fn class_of(t: f64) -> usize {
    CLASS_BOUNDS
        .iter()
        .position(|&bound| t <= bound)
        .unwrap_or(CLASS_BOUNDS.len())
}

fn class_chi_square(observed: &[u64; 7], num_blocks: usize) -> f64 {
    let n_f = num_blocks as f64;
    observed
        .iter()
        .zip(CLASS_PROBS)
        .map(|(&v, pi)| (v as f64 - n_f * pi).powi(2) / (n_f * pi))
        .sum()
}

/// Linear complexity test over `⌊n/M⌋` independent `M`-bit blocks.
///
/// NIST recommends `500 ≤ M ≤ 5000` and at least 200 blocks; only `M ≥ 1`
/// and one full block are enforced.
pub fn linear_complexity(seq: &BitSequence, block_size: usize) -> Result<Measurement> {
    let name = "Linear Complexity";
    let n = seq.len();
    if block_size == 0 {
        return Err(Error::InvalidInput("block size must be positive".into()));
    }
    let num_blocks = n / block_size;
    if num_blocks == 0 {
        return Err(Error::InvalidInput(format!(
            "linear complexity with M={block_size} needs at least {block_size} bits, got {n}"
        )));
    }

    let mu = expected_complexity(block_size);
    let parity = if block_size % 2 == 0 { 1.0 } else { -1.0 };
    let mut observed = [0u64; 7];
    for block in seq.as_slice().chunks_exact(block_size) {
        let l = berlekamp_massey(block) as f64;
        let t = parity * (l - mu) + 2.0 / 9.0;
        observed[class_of(t)] += 1;
    }

    let chi2 = class_chi_square(&observed, num_blocks);
    let p = igamc(3.0, chi2 / 2.0)?;
    Ok(Measurement::single(
        name,
        chi2,
        p,
        format!("N={num_blocks}, M={block_size}, μ={mu:.6}, ν={observed:?}"),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{bits, close, pseudo_random};

    #[test]
    fn test_berlekamp_massey_worked_example() {
        let seq = bits("1101011110001");
        assert_eq!(berlekamp_massey(seq.as_slice()), 4);
    }

    #[test]
    fn test_berlekamp_massey_known_complexities() {
        assert_eq!(berlekamp_massey(&[]), 0);
        assert_eq!(berlekamp_massey(&[0; 16]), 0);
        assert_eq!(berlekamp_massey(&[1; 16]), 1);
        assert_eq!(berlekamp_massey(&[0, 0, 0, 1]), 4);
        let alternating: Vec<u8> = (0..32).map(|i| (i % 2) as u8).collect();
        assert_eq!(berlekamp_massey(&alternating), 2);
    }

    #[test]
    fn test_expected_complexity() {
        assert!(close(expected_complexity(1000), 500.222_222, 1e-6));
        assert!(close(expected_complexity(500), 250.222_222, 1e-6));
    }

    #[test]
    fn test_class_boundaries() {
        assert_eq!(class_of(-3.0), 0);
        assert_eq!(class_of(-2.5), 0);
        assert_eq!(class_of(-2.0), 1);
        assert_eq!(class_of(0.0), 3);
        assert_eq!(class_of(0.5), 3);
        assert_eq!(class_of(2.6), 6);
    }

    #[test]
    fn test_chi_square_from_reference_counts() {
        let observed = [11, 31, 116, 501, 258, 57, 26];
        let chi2 = class_chi_square(&observed, 1000);
        assert!(close(chi2, 2.706_147, 1e-5));
        assert!(close(igamc(3.0, chi2 / 2.0).unwrap(), 0.844_721, 1e-5));
    }

    #[test]
    fn test_class_probabilities_sum_to_one() {
        let s: f64 = CLASS_PROBS.iter().sum();
        assert!(close(s, 1.0, 1e-5));
    }

    #[test]
    fn test_linear_complexity_pseudo_random() {
        let seq = pseudo_random(20 * 500 / 8);
        let r = linear_complexity(&seq, 500).unwrap();
        assert!(r.details.starts_with("N=20, M=500"));
        let p = r.p_values()[0];
        assert!((0.0..=1.0).contains(&p));
    }

    #[test]
    fn test_linear_complexity_rejects_bad_block() {
        let seq = pseudo_random(100);
        assert!(linear_complexity(&seq, 0).is_err());
        assert!(linear_complexity(&seq, 801).is_err());
    }
}

//! Serial and approximate entropy tests.
//!
//! Both count every overlapping `b`-bit pattern over the sequence extended
//! cyclically with its own first `b − 1` bits, so each of the `n` start
//! positions contributes exactly one pattern.

use crate::error::{Error, Result};
use crate::result::{Measurement, Statistic};
use crate::sequence::BitSequence;
use crate::special::igamc;

/// Largest pattern length whose frequency table is materialised.
pub const MAX_PATTERN_LEN: usize = 20;

fn cyclic_pattern_counts(seq: &BitSequence, pattern_len: usize) -> Vec<u64> {
    let mut counts = vec![0u64; 1 << pattern_len];
    if pattern_len == 0 {
        counts[0] = seq.len() as u64;
        return counts;
    }
    let mask = (1usize << pattern_len) - 1;
    let mut value = 0usize;
    for (i, &bit) in seq.wrapped(pattern_len - 1).iter().enumerate() {
        value = ((value << 1) | bit as usize) & mask;
        if i + 1 >= pattern_len {
            counts[value] += 1;
        }
    }
    counts
}

fn check_pattern_len(seq: &BitSequence, pattern_len: usize, what: &str) -> Result<()> {
    let n = seq.len();
    if pattern_len == 0 || pattern_len > MAX_PATTERN_LEN {
        return Err(Error::InvalidInput(format!(
            "{what} block length must be in 1..={MAX_PATTERN_LEN}, got {pattern_len}"
        )));
    }
    if n < pattern_len {
        return Err(Error::InvalidInput(format!(
            "{what} with m={pattern_len} needs at least {pattern_len} bits, got {n}"
        )));
    }
    Ok(())
}

/// `ψ²_b = 2^b/n · Σ ν² − n`; zero for `b = 0`.
fn psi_squared(seq: &BitSequence, pattern_len: usize) -> f64 {
    if pattern_len == 0 {
        return 0.0;
    }
    let n = seq.len() as f64;
    let sum_sq: f64 = cyclic_pattern_counts(seq, pattern_len)
        .iter()
        .map(|&c| (c as f64) * (c as f64))
        .sum();
    2f64.powi(pattern_len as i32) / n * sum_sq - n
}

/// Serial test: uniformity of all `2^m` overlapping `m`-bit patterns.
///
/// Reports two outcomes, `∇ψ²` and `∇²ψ²`. With `m = 1` the first one is
/// the frequency test.
pub fn serial(seq: &BitSequence, block_len: usize) -> Result<Measurement> {
    let name = "Serial";
    check_pattern_len(seq, block_len, "serial test")?;
    let m = block_len;

    let psi_m = psi_squared(seq, m);
    let psi_m1 = psi_squared(seq, m - 1);
    let psi_m2 = psi_squared(seq, m.saturating_sub(2));
    let del1 = psi_m - psi_m1;
    let del2 = psi_m - 2.0 * psi_m1 + psi_m2;

    let exp = m as i32;
    let p1 = igamc(2f64.powi(exp - 2), del1 / 2.0)?;
    let p2 = igamc(2f64.powi(exp - 3), del2 / 2.0)?;
    Ok(Measurement::multi(
        name,
        vec![Statistic::new("∇ψ²", del1, p1), Statistic::new("∇²ψ²", del2, p2)],
        format!("m={m}, ψ²=[{psi_m:.6}, {psi_m1:.6}, {psi_m2:.6}]"),
    ))
}

/// `φ_b = Σ π_i ln π_i` over the non-zero pattern frequencies.
fn phi(seq: &BitSequence, pattern_len: usize) -> f64 {
    if pattern_len == 0 {
        return 0.0;
    }
    let n = seq.len() as f64;
    cyclic_pattern_counts(seq, pattern_len)
        .iter()
        .filter(|&&c| c > 0)
        .map(|&c| {
            let pi = c as f64 / n;
            pi * pi.ln()
        })
        .sum()
}

/// Approximate entropy: compares `m`- and `(m+1)`-bit pattern frequencies
/// against what a random sequence would give.
pub fn approximate_entropy(seq: &BitSequence, block_len: usize) -> Result<Measurement> {
    let name = "Approximate Entropy";
    check_pattern_len(seq, block_len + 1, "approximate entropy test")?;
    let m = block_len;
    if m == 0 {
        return Err(Error::InvalidInput(
            "approximate entropy block length must be positive".into(),
        ));
    }

    let n = seq.len() as f64;
    let ap_en = phi(seq, m) - phi(seq, m + 1);
    let chi2 = 2.0 * n * (std::f64::consts::LN_2 - ap_en);
    let p = igamc(2f64.powi(m as i32 - 1), chi2 / 2.0)?;
    Ok(Measurement::single(
        name,
        chi2,
        p,
        format!("m={m}, ApEn={ap_en:.6}"),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{PI_100, bits, close, pseudo_random};

    #[test]
    fn test_cyclic_counts() {
        // 0011011101 + 00: 001 011 110 101 011 111 110 101 010 100
        let counts = cyclic_pattern_counts(&bits("0011011101"), 3);
        assert_eq!(counts, vec![0, 1, 1, 2, 1, 2, 2, 1]);
        assert_eq!(counts.iter().sum::<u64>(), 10);
    }

    #[test]
    fn test_serial_worked_example() {
        let r = serial(&bits("0011011101"), 3).unwrap();
        assert!(close(r.statistics[0].value, 1.6, 1e-9));
        assert!(close(r.statistics[1].value, 0.8, 1e-9));
        assert!(close(r.p_values()[0], 0.808_792, 1e-6));
        assert!(close(r.p_values()[1], 0.670_320, 1e-6));
    }

    #[test]
    fn test_serial_m1_is_frequency() {
        let r = serial(&bits(PI_100), 1).unwrap();
        let f = crate::frequency::frequency(&bits(PI_100)).unwrap();
        assert!(close(r.p_values()[0], f.p_values()[0], 1e-9));
    }

    #[test]
    fn test_serial_pi_digits() {
        let r = serial(&bits(PI_100), 2).unwrap();
        assert!(close(r.p_values()[0], 0.256_661, 1e-6));
        assert!(close(r.p_values()[1], 0.689_157, 1e-6));
    }

    #[test]
    fn test_serial_rejects_bad_block_len() {
        let seq = bits("0011011101");
        assert!(serial(&seq, 0).is_err());
        assert!(serial(&seq, 11).is_err());
        assert!(serial(&pseudo_random(1_000), MAX_PATTERN_LEN + 1).is_err());
    }

    #[test]
    fn test_approximate_entropy_worked_example() {
        let r = approximate_entropy(&bits("0100110101"), 3).unwrap();
        assert!(close(r.statistics[0].value, 10.043_859, 1e-5));
        assert!(close(r.p_values()[0], 0.261_961, 1e-6));
    }

    #[test]
    fn test_approximate_entropy_pi_digits() {
        let r = approximate_entropy(&bits(PI_100), 2).unwrap();
        assert!(close(r.statistics[0].value, 5.550_792, 1e-5));
        assert!(close(r.p_values()[0], 0.235_301, 1e-6));
    }

    #[test]
    fn test_approximate_entropy_periodic_fails() {
        let alternating = |n: usize| BitSequence::new((0..n).map(|i| (i % 2) as u8).collect());
        let r = approximate_entropy(&alternating(100).unwrap(), 2).unwrap();
        assert!(r.p_values()[0] < 1e-10);
        // far enough in the tail the p-value is reported as an underflow
        assert!(matches!(
            approximate_entropy(&alternating(10_000).unwrap(), 4),
            Err(Error::Underflow { .. })
        ));
    }

    #[test]
    fn test_approximate_entropy_rejects_zero() {
        assert!(approximate_entropy(&bits(PI_100), 0).is_err());
    }
}

//! Worked examples from NIST SP 800-22 Rev. 1a shared by unit tests.

use crate::sequence::{BitOrder, BitSequence};

/// First 100 binary digits of the expansion of π used throughout the
/// publication's examples.
pub const PI_100: &str = "1100100100001111110110101010001000100001011010001100001000110100110001001100011001100010100010111000";

pub fn bits(text: &str) -> BitSequence {
    BitSequence::from_ascii(text, BitOrder::AsGiven).unwrap()
}

pub fn close(actual: f64, expected: f64, tol: f64) -> bool {
    (actual - expected).abs() <= tol
}

/// Deterministic LCG bytes, good enough for smoke tests that only need a
/// sequence without obvious structure.
pub fn pseudo_random(n_bytes: usize) -> BitSequence {
    let mut data = Vec::with_capacity(n_bytes);
    let mut state: u64 = 0xDEAD_BEEF_CAFE_BABE;
    for _ in 0..n_bytes {
        state = state
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        data.push((state >> 33) as u8);
    }
    BitSequence::from_bytes(&data)
}

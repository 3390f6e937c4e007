//! The sequence under test and the significance level every test is judged against.
//!
//! Both values are immutable once built. Tests borrow a [`BitSequence`] and
//! never modify it; tests that need a wrapped or truncated view build a local
//! copy.
//!
//! # Bit order
//!
//! Every test reads bits in index order `0..n`. Byte input is unpacked
//! most-significant-bit first, so bit 0 is the MSB of the first byte. Text
//! input keeps its order unless [`BitOrder::Reversed`] is requested. Several
//! tests (Runs, Cumulative Sums, the template tests) are order-sensitive.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Default NIST significance level.
pub const DEFAULT_LEVEL: f64 = 0.01;

/// Ordered sequence of binary digits, each exactly 0 or 1.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BitSequence {
    bits: Vec<u8>,
}

/// How text input maps to sequence order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BitOrder {
    /// First character becomes bit 0.
    #[default]
    AsGiven,
    /// Last character becomes bit 0.
    Reversed,
}

impl BitSequence {
    /// Wrap a vector of 0/1 values, rejecting anything else.
    pub fn new(bits: Vec<u8>) -> Result<Self> {
        if let Some(pos) = bits.iter().position(|&b| b > 1) {
            return Err(Error::InvalidInput(format!(
                "bit at index {pos} is {}, expected 0 or 1",
                bits[pos]
            )));
        }
        Ok(Self { bits })
    }

    /// Unpack a byte slice into individual bits (MSB first per byte).
    pub fn from_bytes(data: &[u8]) -> Self {
        let mut bits = Vec::with_capacity(data.len() * 8);
        for &byte in data {
            for shift in (0..8).rev() {
                bits.push((byte >> shift) & 1);
            }
        }
        Self { bits }
    }

    /// Parse `'0'`/`'1'` characters, skipping ASCII whitespace.
    pub fn from_ascii(text: &str, order: BitOrder) -> Result<Self> {
        let mut bits = Vec::with_capacity(text.len());
        for (i, c) in text.char_indices() {
            match c {
                '0' => bits.push(0),
                '1' => bits.push(1),
                c if c.is_ascii_whitespace() => {}
                other => {
                    return Err(Error::InvalidInput(format!(
                        "unexpected character {other:?} at byte offset {i}"
                    )));
                }
            }
        }
        if order == BitOrder::Reversed {
            bits.reverse();
        }
        Ok(Self { bits })
    }

    /// Number of bits `n`.
    pub fn len(&self) -> usize {
        self.bits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.bits
    }

    /// Number of ones in the sequence.
    pub fn ones(&self) -> usize {
        self.bits.iter().filter(|&&b| b == 1).count()
    }

    /// Copy of the leading `len` bits (the whole sequence if shorter).
    pub fn prefix(&self, len: usize) -> Self {
        let len = len.min(self.bits.len());
        Self {
            bits: self.bits[..len].to_vec(),
        }
    }

    /// Copy of the sequence with its first `extra` bits appended to the tail,
    /// used by the tests that count patterns cyclically.
    pub(crate) fn wrapped(&self, extra: usize) -> Vec<u8> {
        let extra = extra.min(self.bits.len());
        let mut out = Vec::with_capacity(self.bits.len() + extra);
        out.extend_from_slice(&self.bits);
        out.extend_from_slice(&self.bits[..extra]);
        out
    }

    /// Partial sums of the ±1 random walk `S_k = Σ (2ε_j − 1)`.
    pub(crate) fn partial_sums(&self) -> Vec<i64> {
        let mut s = 0i64;
        self.bits
            .iter()
            .map(|&b| {
                s += if b == 1 { 1 } else { -1 };
                s
            })
            .collect()
    }
}

impl AsRef<[u8]> for BitSequence {
    fn as_ref(&self) -> &[u8] {
        &self.bits
    }
}

impl TryFrom<Vec<u8>> for BitSequence {
    type Error = Error;

    fn try_from(bits: Vec<u8>) -> Result<Self> {
        Self::new(bits)
    }
}

/// Pass/fail threshold `α` for p-values, strictly between 0 and 1.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize)]
pub struct SignificanceLevel(f64);

impl SignificanceLevel {
    pub fn new(alpha: f64) -> Result<Self> {
        // NaN fails both comparisons.
        if alpha > 0.0 && alpha < 1.0 {
            Ok(Self(alpha))
        } else {
            Err(Error::Configuration(format!(
                "significance level must satisfy 0 < α < 1, got {alpha}"
            )))
        }
    }

    pub fn value(self) -> f64 {
        self.0
    }

    /// Decision rule: `p ≥ α` means the sequence looks random.
    pub fn is_random(self, p_value: f64) -> bool {
        p_value >= self.0
    }
}

impl Default for SignificanceLevel {
    fn default() -> Self {
        Self(DEFAULT_LEVEL)
    }
}

//! The NIST SP 800-22 Rev. 1a statistical test battery for random bit
//! sequences.
//!
//! Every test is a pure function from a [`BitSequence`] (plus its
//! parameters) to a [`Measurement`] holding one or more p-values. A
//! [`Battery`] binds a sequence to a [`SignificanceLevel`], runs tests with
//! NIST-recommended parameters, and judges each p-value with the rule
//! `p ≥ α`.
//!
//! ```
//! use randsuite_tests::{Battery, BitSequence, SignificanceLevel, TestKind};
//!
//! let seq = BitSequence::from_bytes(&[0xA5; 128]);
//! let battery = Battery::new(seq, SignificanceLevel::default());
//! let result = battery.run(TestKind::Frequency)?;
//! assert!(result.passed());
//! # Ok::<(), randsuite_tests::Error>(())
//! ```
//!
//! Tests that produce several statistics (Serial, Cumulative Sums, the
//! template and excursion tests) report every p-value; the headline verdict
//! is a strict majority vote, never an average.

pub mod battery;
pub mod complexity;
pub mod error;
pub mod frequency;
pub mod matrix;
pub mod result;
pub mod runs;
pub mod sequence;
pub mod serial;
pub mod special;
pub mod spectral;
pub mod template;
pub mod universal;
pub mod walk;

#[cfg(test)]
mod fixtures;

pub use battery::{Battery, BatteryConfig, BatteryEntry, BatteryReport, TestCase, TestKind};
pub use complexity::{berlekamp_massey, linear_complexity};
pub use error::{Error, Result};
pub use frequency::{block_frequency, frequency, recommended_block_size};
pub use matrix::{binary_matrix_rank, gf2_rank};
pub use result::{Measurement, Outcome, Statistic, TestResult};
pub use runs::{longest_run_of_ones, longest_run_of_ones_with_block, recommended_run_block, runs};
pub use sequence::{BitOrder, BitSequence, DEFAULT_LEVEL, SignificanceLevel};
pub use serial::{approximate_entropy, serial};
pub use special::{erfc, igam, igamc, normal_cdf};
pub use spectral::discrete_fourier_transform;
pub use template::{
    aperiodic_templates, non_overlapping_template_matching, non_overlapping_template_suite,
    overlapping_class_probabilities, overlapping_template_matching,
};
pub use universal::{
    UniversalParams, recommended_universal_params, universal, universal_with_params,
};
pub use walk::{
    CusumMode, cumulative_sums, cumulative_sums_both, random_excursions, random_excursions_variant,
};

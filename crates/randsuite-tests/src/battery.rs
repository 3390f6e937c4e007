//! Battery orchestration: the fifteen tests in NIST order, their default
//! parameters, and the combined report.

use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::complexity::linear_complexity;
use crate::error::{Error, Result};
use crate::frequency::{block_frequency, frequency, recommended_block_size};
use crate::matrix::binary_matrix_rank;
use crate::result::{Measurement, TestResult};
use crate::runs::{longest_run_of_ones_with_block, recommended_run_block, runs};
use crate::sequence::{BitSequence, SignificanceLevel};
use crate::serial::{approximate_entropy, serial};
use crate::spectral::discrete_fourier_transform;
use crate::template::{
    non_overlapping_template_matching, non_overlapping_template_suite,
    overlapping_template_matching,
};
use crate::universal::{UniversalParams, recommended_universal_params, universal_with_params};
use crate::walk::{
    CusumMode, cumulative_sums, cumulative_sums_both, random_excursions, random_excursions_variant,
};

/// The fifteen SP 800-22 tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TestKind {
    Frequency,
    BlockFrequency,
    Runs,
    LongestRun,
    MatrixRank,
    Spectral,
    NonOverlappingTemplate,
    OverlappingTemplate,
    Universal,
    LinearComplexity,
    Serial,
    ApproximateEntropy,
    CumulativeSums,
    RandomExcursions,
    RandomExcursionsVariant,
}

impl TestKind {
    /// Every test, in the order the battery runs them.
    pub const ALL: [TestKind; 15] = [
        TestKind::Frequency,
        TestKind::BlockFrequency,
        TestKind::Runs,
        TestKind::LongestRun,
        TestKind::MatrixRank,
        TestKind::Spectral,
        TestKind::NonOverlappingTemplate,
        TestKind::OverlappingTemplate,
        TestKind::Universal,
        TestKind::LinearComplexity,
        TestKind::Serial,
        TestKind::ApproximateEntropy,
        TestKind::CumulativeSums,
        TestKind::RandomExcursions,
        TestKind::RandomExcursionsVariant,
    ];

    /// Stable machine name, e.g. `"random-excursions-variant"`.
    pub fn name(self) -> &'static str {
        match self {
            TestKind::Frequency => "frequency",
            TestKind::BlockFrequency => "block-frequency",
            TestKind::Runs => "runs",
            TestKind::LongestRun => "longest-run",
            TestKind::MatrixRank => "matrix-rank",
            TestKind::Spectral => "spectral",
            TestKind::NonOverlappingTemplate => "non-overlapping-template",
            TestKind::OverlappingTemplate => "overlapping-template",
            TestKind::Universal => "universal",
            TestKind::LinearComplexity => "linear-complexity",
            TestKind::Serial => "serial",
            TestKind::ApproximateEntropy => "approximate-entropy",
            TestKind::CumulativeSums => "cumulative-sums",
            TestKind::RandomExcursions => "random-excursions",
            TestKind::RandomExcursionsVariant => "random-excursions-variant",
        }
    }

    /// Human-readable title used in reports.
    pub fn title(self) -> &'static str {
        match self {
            TestKind::Frequency => "Frequency (Monobit)",
            TestKind::BlockFrequency => "Frequency within a Block",
            TestKind::Runs => "Runs",
            TestKind::LongestRun => "Longest Run of Ones in a Block",
            TestKind::MatrixRank => "Binary Matrix Rank",
            TestKind::Spectral => "Discrete Fourier Transform (Spectral)",
            TestKind::NonOverlappingTemplate => "Non-overlapping Template Matching",
            TestKind::OverlappingTemplate => "Overlapping Template Matching",
            TestKind::Universal => "Maurer's Universal Statistical",
            TestKind::LinearComplexity => "Linear Complexity",
            TestKind::Serial => "Serial",
            TestKind::ApproximateEntropy => "Approximate Entropy",
            TestKind::CumulativeSums => "Cumulative Sums",
            TestKind::RandomExcursions => "Random Excursions",
            TestKind::RandomExcursionsVariant => "Random Excursions Variant",
        }
    }
}

impl fmt::Display for TestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for TestKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().to_ascii_lowercase().replace('_', "-");
        TestKind::ALL
            .into_iter()
            .find(|k| k.name() == wanted)
            .ok_or_else(|| Error::Configuration(format!("unknown test '{s}'")))
    }
}

/// A test together with every parameter it needs.
#[derive(Debug, Clone, PartialEq)]
pub enum TestCase {
    Frequency,
    BlockFrequency { block_size: usize },
    Runs,
    LongestRun { block_size: usize },
    MatrixRank,
    Spectral,
    NonOverlappingTemplate { template: Vec<u8>, block_size: usize },
    NonOverlappingTemplateSuite { template_len: usize, block_size: usize },
    OverlappingTemplate { template: Vec<u8>, block_size: usize },
    Universal(UniversalParams),
    LinearComplexity { block_size: usize },
    Serial { block_len: usize },
    ApproximateEntropy { block_len: usize },
    /// `None` runs both directions.
    CumulativeSums { mode: Option<CusumMode> },
    RandomExcursions,
    RandomExcursionsVariant,
}

impl TestCase {
    pub fn kind(&self) -> TestKind {
        match self {
            TestCase::Frequency => TestKind::Frequency,
            TestCase::BlockFrequency { .. } => TestKind::BlockFrequency,
            TestCase::Runs => TestKind::Runs,
            TestCase::LongestRun { .. } => TestKind::LongestRun,
            TestCase::MatrixRank => TestKind::MatrixRank,
            TestCase::Spectral => TestKind::Spectral,
            TestCase::NonOverlappingTemplate { .. }
            | TestCase::NonOverlappingTemplateSuite { .. } => TestKind::NonOverlappingTemplate,
            TestCase::OverlappingTemplate { .. } => TestKind::OverlappingTemplate,
            TestCase::Universal(_) => TestKind::Universal,
            TestCase::LinearComplexity { .. } => TestKind::LinearComplexity,
            TestCase::Serial { .. } => TestKind::Serial,
            TestCase::ApproximateEntropy { .. } => TestKind::ApproximateEntropy,
            TestCase::CumulativeSums { .. } => TestKind::CumulativeSums,
            TestCase::RandomExcursions => TestKind::RandomExcursions,
            TestCase::RandomExcursionsVariant => TestKind::RandomExcursionsVariant,
        }
    }

    /// Run the test on `seq` without judging it.
    pub fn evaluate(&self, seq: &BitSequence) -> Result<Measurement> {
        match self {
            TestCase::Frequency => frequency(seq),
            TestCase::BlockFrequency { block_size } => block_frequency(seq, *block_size),
            TestCase::Runs => runs(seq),
            TestCase::LongestRun { block_size } => longest_run_of_ones_with_block(seq, *block_size),
            TestCase::MatrixRank => binary_matrix_rank(seq),
            TestCase::Spectral => discrete_fourier_transform(seq),
            TestCase::NonOverlappingTemplate {
                template,
                block_size,
            } => non_overlapping_template_matching(seq, template, *block_size),
            TestCase::NonOverlappingTemplateSuite {
                template_len,
                block_size,
            } => non_overlapping_template_suite(seq, *template_len, *block_size),
            TestCase::OverlappingTemplate {
                template,
                block_size,
            } => overlapping_template_matching(seq, template, *block_size),
            TestCase::Universal(params) => universal_with_params(seq, *params),
            TestCase::LinearComplexity { block_size } => linear_complexity(seq, *block_size),
            TestCase::Serial { block_len } => serial(seq, *block_len),
            TestCase::ApproximateEntropy { block_len } => approximate_entropy(seq, *block_len),
            TestCase::CumulativeSums { mode: Some(mode) } => cumulative_sums(seq, *mode),
            TestCase::CumulativeSums { mode: None } => cumulative_sums_both(seq),
            TestCase::RandomExcursions => random_excursions(seq),
            TestCase::RandomExcursionsVariant => random_excursions_variant(seq),
        }
    }
}

/// Per-test parameters for battery runs. `None` derives the NIST
/// recommendation from the sequence length.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatteryConfig {
    pub block_frequency_block_size: Option<usize>,
    pub longest_run_block_size: Option<usize>,
    pub non_overlapping_template_len: usize,
    /// Number of blocks `N`; the battery uses the leading `N·⌊n/N⌋` bits.
    pub non_overlapping_blocks: usize,
    pub overlapping_template: Vec<u8>,
    pub overlapping_block_size: usize,
    pub universal_params: Option<UniversalParams>,
    pub linear_complexity_block_size: usize,
    pub serial_block_len: Option<usize>,
    pub approximate_entropy_block_len: Option<usize>,
}

impl Default for BatteryConfig {
    fn default() -> Self {
        Self {
            block_frequency_block_size: None,
            longest_run_block_size: None,
            non_overlapping_template_len: 9,
            non_overlapping_blocks: 8,
            overlapping_template: vec![1; 9],
            overlapping_block_size: 1032,
            universal_params: None,
            linear_complexity_block_size: 500,
            serial_block_len: None,
            approximate_entropy_block_len: None,
        }
    }
}

fn floor_log2(n: usize) -> usize {
    n.checked_ilog2().unwrap_or(0) as usize
}

impl BatteryConfig {
    /// Reject settings that would make a test unusable regardless of input.
    pub fn validate(&self) -> Result<()> {
        if self.non_overlapping_blocks == 0 {
            return Err(Error::Configuration(
                "non_overlapping_blocks must be positive".into(),
            ));
        }
        if self.overlapping_template.is_empty() || self.overlapping_template.iter().any(|&b| b > 1)
        {
            return Err(Error::Configuration(
                "overlapping_template must be a non-empty list of 0/1 values".into(),
            ));
        }
        Ok(())
    }

    /// The concrete case `kind` runs as for an `n`-bit sequence, plus the
    /// number of leading bits it is evaluated on.
    pub fn case_for(&self, kind: TestKind, n: usize) -> Result<(TestCase, usize)> {
        let case = match kind {
            TestKind::Frequency => TestCase::Frequency,
            TestKind::BlockFrequency => TestCase::BlockFrequency {
                block_size: self
                    .block_frequency_block_size
                    .unwrap_or_else(|| recommended_block_size(n)),
            },
            TestKind::Runs => TestCase::Runs,
            TestKind::LongestRun => TestCase::LongestRun {
                block_size: match self.longest_run_block_size {
                    Some(m) => m,
                    None => recommended_run_block(n)?,
                },
            },
            TestKind::MatrixRank => TestCase::MatrixRank,
            TestKind::Spectral => TestCase::Spectral,
            TestKind::NonOverlappingTemplate => {
                let blocks = self.non_overlapping_blocks.max(1);
                let block_size = n / blocks;
                return Ok((
                    TestCase::NonOverlappingTemplateSuite {
                        template_len: self.non_overlapping_template_len,
                        block_size,
                    },
                    blocks * block_size,
                ));
            }
            TestKind::OverlappingTemplate => TestCase::OverlappingTemplate {
                template: self.overlapping_template.clone(),
                block_size: self.overlapping_block_size,
            },
            TestKind::Universal => TestCase::Universal(match self.universal_params {
                Some(p) => p,
                None => recommended_universal_params(n)?,
            }),
            TestKind::LinearComplexity => TestCase::LinearComplexity {
                block_size: self.linear_complexity_block_size,
            },
            TestKind::Serial => TestCase::Serial {
                block_len: self
                    .serial_block_len
                    .unwrap_or_else(|| floor_log2(n).saturating_sub(3).clamp(1, 16)),
            },
            TestKind::ApproximateEntropy => TestCase::ApproximateEntropy {
                block_len: self
                    .approximate_entropy_block_len
                    .unwrap_or_else(|| floor_log2(n).saturating_sub(6).clamp(1, 10)),
            },
            TestKind::CumulativeSums => TestCase::CumulativeSums { mode: None },
            TestKind::RandomExcursions => TestCase::RandomExcursions,
            TestKind::RandomExcursionsVariant => TestCase::RandomExcursionsVariant,
        };
        Ok((case, n))
    }
}

/// One line of a battery report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatteryEntry {
    pub kind: TestKind,
    pub outcome: std::result::Result<TestResult, Error>,
}

impl BatteryEntry {
    pub fn passed(&self) -> bool {
        self.outcome.as_ref().is_ok_and(TestResult::passed)
    }
}

/// Results of a full battery run, in NIST order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatteryReport {
    pub bits: usize,
    pub level: f64,
    pub entries: Vec<BatteryEntry>,
}

impl BatteryReport {
    pub fn passed_count(&self) -> usize {
        self.entries.iter().filter(|e| e.passed()).count()
    }

    pub fn error_count(&self) -> usize {
        self.entries.iter().filter(|e| e.outcome.is_err()).count()
    }

    pub fn get(&self, kind: TestKind) -> Option<&BatteryEntry> {
        self.entries.iter().find(|e| e.kind == kind)
    }
}

/// The active sequence, significance level and per-test parameters.
///
/// Tests borrow the battery immutably; [`Battery::set_sequence`] and
/// [`Battery::set_level`] need `&mut self`, so the configuration cannot
/// change while a run is in progress.
#[derive(Debug, Clone)]
pub struct Battery {
    sequence: BitSequence,
    level: SignificanceLevel,
    config: BatteryConfig,
}

impl Battery {
    pub fn new(sequence: BitSequence, level: SignificanceLevel) -> Self {
        Self {
            sequence,
            level,
            config: BatteryConfig::default(),
        }
    }

    /// Build a battery from raw 0/1 values and a significance level.
    /// Any problem with either is a [`Error::Configuration`].
    pub fn configure(bits: Vec<u8>, level: f64) -> Result<Self> {
        let sequence = BitSequence::new(bits).map_err(|e| match e {
            Error::InvalidInput(msg) => Error::Configuration(msg),
            other => other,
        })?;
        let level = SignificanceLevel::new(level)?;
        Ok(Self::new(sequence, level))
    }

    pub fn with_config(mut self, config: BatteryConfig) -> Result<Self> {
        config.validate()?;
        self.config = config;
        Ok(self)
    }

    pub fn set_sequence(&mut self, sequence: BitSequence) {
        self.sequence = sequence;
    }

    pub fn set_level(&mut self, alpha: f64) -> Result<()> {
        self.level = SignificanceLevel::new(alpha)?;
        Ok(())
    }

    pub fn sequence(&self) -> &BitSequence {
        &self.sequence
    }

    pub fn level(&self) -> SignificanceLevel {
        self.level
    }

    pub fn config(&self) -> &BatteryConfig {
        &self.config
    }

    /// Length `n` of the active sequence.
    pub fn len(&self) -> usize {
        self.sequence.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sequence.is_empty()
    }

    /// Run one test with its configured or recommended parameters.
    pub fn run(&self, kind: TestKind) -> Result<TestResult> {
        let (case, bits) = self.config.case_for(kind, self.len())?;
        let view = if bits < self.len() {
            Cow::Owned(self.sequence.prefix(bits))
        } else {
            Cow::Borrowed(&self.sequence)
        };
        self.judge(&case, &view)
    }

    /// Run one test with fully explicit parameters on the whole sequence.
    pub fn run_case(&self, case: &TestCase) -> Result<TestResult> {
        self.judge(case, &self.sequence)
    }

    fn judge(&self, case: &TestCase, seq: &BitSequence) -> Result<TestResult> {
        let kind = case.kind();
        log::debug!("{kind}: running on {} bits", seq.len());
        let result = case.evaluate(seq)?.judge(self.level);
        log::debug!(
            "{kind}: {}/{} outcomes random, p = {:?}",
            result.pass_count(),
            result.outcomes.len(),
            result.p_values()
        );
        Ok(result)
    }

    /// Run all fifteen tests. A failing test is recorded in its entry and
    /// never stops the others.
    pub fn run_all(&self) -> BatteryReport {
        let entries = TestKind::ALL
            .into_iter()
            .map(|kind| {
                let outcome = self.run(kind);
                if let Err(e) = &outcome {
                    log::warn!("{kind}: {e}");
                }
                BatteryEntry { kind, outcome }
            })
            .collect();
        BatteryReport {
            bits: self.len(),
            level: self.level.value(),
            entries,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{PI_100, bits, pseudo_random};

    #[test]
    fn test_kind_names_round_trip() {
        for kind in TestKind::ALL {
            assert_eq!(kind.name().parse::<TestKind>().unwrap(), kind);
        }
        assert_eq!(
            "Random_Excursions_Variant".parse::<TestKind>().unwrap(),
            TestKind::RandomExcursionsVariant
        );
        assert!(matches!(
            "entropy".parse::<TestKind>(),
            Err(Error::Configuration(_))
        ));
    }

    #[test]
    fn test_configure_validates() {
        assert!(Battery::configure(vec![0, 1, 1], 0.01).is_ok());
        assert!(matches!(
            Battery::configure(vec![0, 1, 2], 0.01),
            Err(Error::Configuration(_))
        ));
        for bad in [0.0, 1.0, -0.5, f64::NAN] {
            assert!(matches!(
                Battery::configure(vec![0, 1], bad),
                Err(Error::Configuration(_))
            ));
        }
    }

    #[test]
    fn test_set_level_keeps_old_value_on_error() {
        let mut battery = Battery::configure(vec![0, 1], 0.05).unwrap();
        assert!(battery.set_level(2.0).is_err());
        assert_eq!(battery.level().value(), 0.05);
        battery.set_level(0.001).unwrap();
        assert_eq!(battery.level().value(), 0.001);
    }

    #[test]
    fn test_default_parameters() {
        let config = BatteryConfig::default();
        let (case, bits) = config.case_for(TestKind::Serial, 1_000_000).unwrap();
        assert_eq!(case, TestCase::Serial { block_len: 16 });
        assert_eq!(bits, 1_000_000);
        let (case, _) = config
            .case_for(TestKind::ApproximateEntropy, 1_000_000)
            .unwrap();
        assert_eq!(case, TestCase::ApproximateEntropy { block_len: 10 });
        let (case, _) = config.case_for(TestKind::Serial, 100).unwrap();
        assert_eq!(case, TestCase::Serial { block_len: 3 });

        let (case, bits) = config
            .case_for(TestKind::NonOverlappingTemplate, 1_000_003)
            .unwrap();
        assert_eq!(
            case,
            TestCase::NonOverlappingTemplateSuite {
                template_len: 9,
                block_size: 125_000
            }
        );
        assert_eq!(bits, 1_000_000);

        assert!(config.case_for(TestKind::LongestRun, 100).is_err());
        assert!(config.case_for(TestKind::Universal, 100).is_err());
    }

    #[test]
    fn test_run_single_test() {
        let battery = Battery::new(bits(PI_100), SignificanceLevel::default());
        let r = battery.run(TestKind::Frequency).unwrap();
        assert!(r.passed());
        let r = battery
            .run_case(&TestCase::BlockFrequency { block_size: 10 })
            .unwrap();
        assert_eq!(r.outcomes.len(), 1);
        let r = battery
            .run_case(&TestCase::CumulativeSums {
                mode: Some(CusumMode::Backward),
            })
            .unwrap();
        assert_eq!(r.outcomes[0].label, "backward");
    }

    #[test]
    fn test_run_all_continues_after_errors() {
        let battery = Battery::new(bits(PI_100), SignificanceLevel::default());
        let report = battery.run_all();
        assert_eq!(report.entries.len(), 15);
        let kinds: Vec<_> = report.entries.iter().map(|e| e.kind).collect();
        assert_eq!(kinds, TestKind::ALL.to_vec());
        // 100 bits is too short for these
        for kind in [
            TestKind::LongestRun,
            TestKind::MatrixRank,
            TestKind::Universal,
            TestKind::OverlappingTemplate,
        ] {
            assert!(report.get(kind).unwrap().outcome.is_err(), "{kind}");
        }
        assert!(report.get(TestKind::Frequency).unwrap().outcome.is_ok());
        assert!(report.get(TestKind::CumulativeSums).unwrap().outcome.is_ok());
        assert!(report.error_count() >= 4);
    }

    #[test]
    fn test_config_validation() {
        let battery = Battery::new(pseudo_random(10), SignificanceLevel::default());
        let config = BatteryConfig {
            overlapping_template: vec![1, 2],
            ..BatteryConfig::default()
        };
        assert!(battery.clone().with_config(config).is_err());
        let config = BatteryConfig {
            non_overlapping_blocks: 0,
            ..BatteryConfig::default()
        };
        assert!(battery.with_config(config).is_err());
    }
}

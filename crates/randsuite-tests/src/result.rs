//! Test outputs before and after the significance level is applied.

use serde::Serialize;

use crate::sequence::SignificanceLevel;

/// One computed statistic and its p-value, not yet judged.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Statistic {
    pub label: String,
    pub value: f64,
    pub p_value: f64,
}

impl Statistic {
    pub fn new(label: impl Into<String>, value: f64, p_value: f64) -> Self {
        Self {
            label: label.into(),
            value,
            p_value,
        }
    }
}

/// Raw output of a test function: one or more statistics plus a short
/// human-readable summary of the intermediate counts.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Measurement {
    pub name: String,
    pub statistics: Vec<Statistic>,
    pub details: String,
}

impl Measurement {
    pub fn single(name: &str, statistic: f64, p_value: f64, details: String) -> Self {
        Self {
            name: name.to_string(),
            statistics: vec![Statistic::new(name, statistic, p_value)],
            details,
        }
    }

    pub fn multi(name: &str, statistics: Vec<Statistic>, details: String) -> Self {
        Self {
            name: name.to_string(),
            statistics,
            details,
        }
    }

    /// P-values in reporting order.
    pub fn p_values(&self) -> Vec<f64> {
        self.statistics.iter().map(|s| s.p_value).collect()
    }

    /// Apply the decision rule to every statistic.
    pub fn judge(self, level: SignificanceLevel) -> TestResult {
        let outcomes = self
            .statistics
            .into_iter()
            .map(|s| Outcome {
                random: level.is_random(s.p_value),
                label: s.label,
                statistic: s.value,
                p_value: s.p_value,
            })
            .collect();
        TestResult {
            name: self.name,
            level: level.value(),
            outcomes,
            details: self.details,
        }
    }
}

/// A single (p-value, verdict) pair.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Outcome {
    pub label: String,
    pub statistic: f64,
    pub p_value: f64,
    /// `p_value >= level`.
    pub random: bool,
}

/// Result of a single randomness test.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TestResult {
    pub name: String,
    pub level: f64,
    pub outcomes: Vec<Outcome>,
    pub details: String,
}

impl TestResult {
    /// Headline verdict.
    ///
    /// A single outcome decides directly. Several outcomes are put to a
    /// majority vote: more "random" than "non-random" verdicts passes, a tie
    /// fails. P-values are never averaged.
    pub fn passed(&self) -> bool {
        match self.outcomes.as_slice() {
            [] => false,
            [only] => only.random,
            many => {
                let random = many.iter().filter(|o| o.random).count();
                random > many.len() - random
            }
        }
    }

    /// The p-value of a single-outcome test.
    pub fn p_value(&self) -> Option<f64> {
        match self.outcomes.as_slice() {
            [only] => Some(only.p_value),
            _ => None,
        }
    }

    pub fn p_values(&self) -> Vec<f64> {
        self.outcomes.iter().map(|o| o.p_value).collect()
    }

    /// Number of outcomes judged random.
    pub fn pass_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.random).count()
    }

    pub fn is_multi(&self) -> bool {
        self.outcomes.len() > 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn measurement(ps: &[f64]) -> Measurement {
        Measurement::multi(
            "t",
            ps.iter()
                .enumerate()
                .map(|(i, &p)| Statistic::new(format!("#{i}"), 0.0, p))
                .collect(),
            String::new(),
        )
    }

    #[test]
    fn test_single_outcome_verdict() {
        let level = SignificanceLevel::new(0.01).unwrap();
        let r = Measurement::single("x", 1.0, 0.2, String::new()).judge(level);
        assert!(r.passed());
        assert_eq!(r.p_value(), Some(0.2));

        let r = Measurement::single("x", 1.0, 0.001, String::new()).judge(level);
        assert!(!r.passed());
    }

    #[test]
    fn test_majority_vote() {
        let level = SignificanceLevel::new(0.01).unwrap();
        let r = measurement(&[0.5, 0.001, 0.3]).judge(level);
        assert!(r.passed());
        assert_eq!(r.pass_count(), 2);
        assert_eq!(r.p_value(), None);
        // individual values survive aggregation
        assert_eq!(r.p_values(), vec![0.5, 0.001, 0.3]);

        let r = measurement(&[0.5, 0.001]).judge(level);
        assert!(!r.passed(), "a tie is non-random");
    }

    #[test]
    fn test_majority_is_not_average() {
        // Mean p-value is well above α but most sub-tests fail.
        let level = SignificanceLevel::new(0.01).unwrap();
        let r = measurement(&[0.99, 0.005, 0.005]).judge(level);
        assert!(!r.passed());
    }

    #[test]
    fn test_empty_result_fails() {
        let level = SignificanceLevel::default();
        assert!(!measurement(&[]).judge(level).passed());
    }
}

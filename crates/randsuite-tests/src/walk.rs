//! Random-walk tests: cumulative sums, random excursions and the
//! random excursions variant.
//!
//! All three look at the partial sums `S_k = Σ (2ε_j − 1)`. The excursion
//! tests pad the walk to `S' = [0, S_1, .., S_n, 0]` and split it into the
//! `J` cycles between consecutive zeros, `J` being the number of zeros in
//! `S'` minus one. A walk that already ends at the origin closes with an
//! empty cycle.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::result::{Measurement, Statistic};
use crate::sequence::BitSequence;
use crate::special::{erfc, igamc, normal_cdf};

/// Direction in which the cumulative sums test walks the sequence.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CusumMode {
    #[default]
    Forward,
    Backward,
}

impl fmt::Display for CusumMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CusumMode::Forward => write!(f, "forward"),
            CusumMode::Backward => write!(f, "backward"),
        }
    }
}

/// States tracked per cycle by the random excursions test.
pub const EXCURSION_STATES: [i64; 8] = [-4, -3, -2, -1, 1, 2, 3, 4];

/// Largest `|x|` tracked by the variant test (states `±1 ..= ±9`).
pub const VARIANT_MAX_STATE: i64 = 9;

fn max_excursion(seq: &BitSequence, mode: CusumMode) -> i64 {
    let mut s = 0i64;
    let mut z = 0i64;
    let mut step = |&b: &u8| {
        s += if b == 1 { 1 } else { -1 };
        z = z.max(s.abs());
    };
    match mode {
        CusumMode::Forward => seq.as_slice().iter().for_each(&mut step),
        CusumMode::Backward => seq.as_slice().iter().rev().for_each(&mut step),
    }
    z
}

/// P-value of the maximal excursion `z` of an `n`-step walk, from the
/// truncated NIST series.
fn cusum_p_value(n: usize, z: i64) -> f64 {
    let nf = n as f64;
    let zf = z as f64;
    let sqrt_n = nf.sqrt();
    let upper = ((nf / zf - 1.0) / 4.0).floor() as i64;

    let lower = ((-nf / zf + 1.0) / 4.0).ceil() as i64;
    let sum1: f64 = (lower..=upper)
        .map(|k| {
            let k = k as f64;
            normal_cdf((4.0 * k + 1.0) * zf / sqrt_n) - normal_cdf((4.0 * k - 1.0) * zf / sqrt_n)
        })
        .sum();

    let lower = ((-nf / zf - 3.0) / 4.0).ceil() as i64;
    let sum2: f64 = (lower..=upper)
        .map(|k| {
            let k = k as f64;
            normal_cdf((4.0 * k + 3.0) * zf / sqrt_n) - normal_cdf((4.0 * k + 1.0) * zf / sqrt_n)
        })
        .sum();

    1.0 - sum1 + sum2
}

fn cusum_statistic(seq: &BitSequence, mode: CusumMode) -> Result<Statistic> {
    let n = seq.len();
    if n == 0 {
        return Err(Error::InvalidInput("cumulative sums test needs n ≥ 1".into()));
    }
    let z = max_excursion(seq, mode);
    Ok(Statistic::new(mode.to_string(), z as f64, cusum_p_value(n, z)))
}

/// Cumulative sums in a single direction.
pub fn cumulative_sums(seq: &BitSequence, mode: CusumMode) -> Result<Measurement> {
    let stat = cusum_statistic(seq, mode)?;
    let details = format!("z={}", stat.value);
    Ok(Measurement::multi("Cumulative Sums", vec![stat], details))
}

/// Cumulative sums forward and backward, two outcomes.
pub fn cumulative_sums_both(seq: &BitSequence) -> Result<Measurement> {
    let forward = cusum_statistic(seq, CusumMode::Forward)?;
    let backward = cusum_statistic(seq, CusumMode::Backward)?;
    let details = format!("z_forward={}, z_backward={}", forward.value, backward.value);
    Ok(Measurement::multi(
        "Cumulative Sums",
        vec![forward, backward],
        details,
    ))
}

/// `S' = [0, S_1, .., S_n, 0]`.
fn padded_walk(seq: &BitSequence) -> Vec<i64> {
    let mut walk = Vec::with_capacity(seq.len() + 2);
    walk.push(0);
    walk.extend(seq.partial_sums());
    walk.push(0);
    walk
}

/// Number of cycles `J`: zeros after the starting one. A walk with no steps
/// has no cycle to examine.
fn cycle_count(walk: &[i64], test: &str) -> Result<usize> {
    if walk.len() <= 2 {
        return Err(Error::PreconditionNotMet(format!(
            "{test} needs at least one cycle, the sequence is empty"
        )));
    }
    Ok(walk.iter().skip(1).filter(|&&s| s == 0).count())
}

fn excursion_index(state: i64) -> Option<usize> {
    match state {
        -4..=-1 => Some((state + 4) as usize),
        1..=4 => Some((state + 3) as usize),
        _ => None,
    }
}

/// `π_k(x)`: probability that a cycle visits `x` exactly `k` times
/// (`k = 5` meaning five or more).
fn excursion_probabilities(state: i64) -> [f64; 6] {
    let a = 1.0 / (2.0 * state.abs() as f64);
    let mut pi = [0.0; 6];
    pi[0] = 1.0 - a;
    for (k, slot) in pi.iter_mut().enumerate().take(5).skip(1) {
        *slot = a * a * (1.0 - a).powi(k as i32 - 1);
    }
    pi[5] = a * (1.0 - a).powi(4);
    pi
}

fn state_label(state: i64) -> String {
    format!("x = {state:+}")
}

/// Random excursions: for each state `x ∈ {±1..±4}`, how many cycles visit
/// it exactly `k` times. Eight outcomes.
pub fn random_excursions(seq: &BitSequence) -> Result<Measurement> {
    let name = "Random Excursions";
    let walk = padded_walk(seq);
    let j = cycle_count(&walk, "random excursions test")?;

    let mut visits = [[0u64; 6]; EXCURSION_STATES.len()];
    let mut in_cycle = [0usize; EXCURSION_STATES.len()];
    for &s in &walk[1..] {
        if s == 0 {
            for (row, count) in visits.iter_mut().zip(in_cycle.iter_mut()) {
                row[(*count).min(5)] += 1;
                *count = 0;
            }
        } else if let Some(idx) = excursion_index(s) {
            in_cycle[idx] += 1;
        }
    }

    let j_f = j as f64;
    let statistics = EXCURSION_STATES
        .iter()
        .zip(&visits)
        .map(|(&x, row)| {
            let chi2: f64 = row
                .iter()
                .zip(excursion_probabilities(x))
                .map(|(&v, pi)| (v as f64 - j_f * pi).powi(2) / (j_f * pi))
                .sum();
            igamc(2.5, chi2 / 2.0).map(|p| Statistic::new(state_label(x), chi2, p))
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(Measurement::multi(name, statistics, format!("J={j}")))
}

/// Random excursions variant: total visits `ξ(x)` to each state
/// `x ∈ {±1..±9}` across all cycles. Eighteen outcomes.
pub fn random_excursions_variant(seq: &BitSequence) -> Result<Measurement> {
    let name = "Random Excursions Variant";
    let walk = padded_walk(seq);
    let j = cycle_count(&walk, "random excursions variant test")?;

    let width = (2 * VARIANT_MAX_STATE + 1) as usize;
    let mut xi = vec![0u64; width];
    for &s in &walk {
        if s != 0 && s.abs() <= VARIANT_MAX_STATE {
            xi[(s + VARIANT_MAX_STATE) as usize] += 1;
        }
    }

    let j_f = j as f64;
    let statistics = (-VARIANT_MAX_STATE..=VARIANT_MAX_STATE)
        .filter(|&x| x != 0)
        .map(|x| {
            let count = xi[(x + VARIANT_MAX_STATE) as usize] as f64;
            let p = erfc((count - j_f).abs() / (2.0 * j_f * (4.0 * x.abs() as f64 - 2.0)).sqrt());
            Statistic::new(state_label(x), count, p)
        })
        .collect();
    Ok(Measurement::multi(name, statistics, format!("J={j}")))
}

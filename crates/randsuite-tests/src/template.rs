//! Non-overlapping and overlapping template matching tests.
//!
//! Both tests slide an `m`-bit window over each block and compare it with a
//! template. Windows are packed into integers once per sequence so that
//! running hundreds of templates stays linear in `n` per template.

use crate::error::{Error, Result};
use crate::result::{Measurement, Statistic};
use crate::sequence::BitSequence;
use crate::special::{igamc, lgamma};

/// Longest template the packed window representation supports.
pub const MAX_TEMPLATE_LEN: usize = 24;

/// Occurrence classes `0, 1, 2, 3, 4` and `≥ 5` of the overlapping test.
const OVERLAPPING_CLASSES: usize = 6;

/// All odd `m`-bit patterns, most significant bit first, in increasing
/// numeric order.
pub fn aperiodic_templates(template_len: usize) -> Result<Vec<Vec<u8>>> {
    if template_len == 0 || template_len > MAX_TEMPLATE_LEN {
        return Err(Error::InvalidInput(format!(
            "template length must be in 1..={MAX_TEMPLATE_LEN}, got {template_len}"
        )));
    }
    Ok((1u32..1 << template_len)
        .step_by(2)
        .map(|value| unpack(value, template_len))
        .collect())
}

fn unpack(value: u32, len: usize) -> Vec<u8> {
    (0..len)
        .map(|i| ((value >> (len - 1 - i)) & 1) as u8)
        .collect()
}

fn pack(bits: &[u8]) -> u32 {
    bits.iter().fold(0u32, |acc, &b| (acc << 1) | b as u32)
}

fn template_label(template: &[u8]) -> String {
    let digits: String = template.iter().map(|&b| char::from(b'0' + b)).collect();
    format!("template {digits}")
}

fn check_template(template: &[u8], block_size: usize) -> Result<()> {
    let m = template.len();
    if m == 0 || m > MAX_TEMPLATE_LEN {
        return Err(Error::InvalidInput(format!(
            "template length must be in 1..={MAX_TEMPLATE_LEN}, got {m}"
        )));
    }
    if let Some(pos) = template.iter().position(|&b| b > 1) {
        return Err(Error::InvalidInput(format!(
            "template bit at index {pos} is {}, expected 0 or 1",
            template[pos]
        )));
    }
    if block_size < m {
        return Err(Error::InvalidInput(format!(
            "block size {block_size} is shorter than the {m}-bit template"
        )));
    }
    Ok(())
}

/// Packed value of every `m`-bit window: `windows[i]` holds bits `i..i+m`.
fn window_values(bits: &[u8], m: usize) -> Vec<u32> {
    if bits.len() < m {
        return Vec::new();
    }
    let mask = (1u32 << m) - 1;
    let mut value = pack(&bits[..m - 1]);
    bits[m - 1..]
        .iter()
        .map(|&b| {
            value = ((value << 1) | b as u32) & mask;
            value
        })
        .collect()
}

/// Per-block counts of non-overlapping occurrences; on a hit the search
/// resumes right after the matched pattern.
fn non_overlapping_counts(
    windows: &[u32],
    target: u32,
    m: usize,
    block_size: usize,
    num_blocks: usize,
) -> Vec<u64> {
    (0..num_blocks)
        .map(|j| {
            let start = j * block_size;
            let last = start + block_size - m;
            let mut count = 0u64;
            let mut pos = start;
            while pos <= last {
                if windows[pos] == target {
                    count += 1;
                    pos += m;
                } else {
                    pos += 1;
                }
            }
            count
        })
        .collect()
}

/// Theoretical mean and variance of the per-block hit count.
fn non_overlapping_moments(m: usize, block_size: usize) -> (f64, f64) {
    let two_m = 2f64.powi(m as i32);
    let mu = (block_size - m + 1) as f64 / two_m;
    let sigma2 = block_size as f64 * (1.0 / two_m - (2 * m - 1) as f64 / (two_m * two_m));
    (mu, sigma2)
}

fn non_overlapping_statistic(
    windows: &[u32],
    template: &[u8],
    block_size: usize,
    num_blocks: usize,
) -> Result<(Statistic, Vec<u64>)> {
    let m = template.len();
    let counts = non_overlapping_counts(windows, pack(template), m, block_size, num_blocks);
    let (mu, sigma2) = non_overlapping_moments(m, block_size);
    let chi2: f64 = counts
        .iter()
        .map(|&w| (w as f64 - mu).powi(2) / sigma2)
        .sum();
    let p = igamc(num_blocks as f64 / 2.0, chi2 / 2.0)?;
    Ok((Statistic::new(template_label(template), chi2, p), counts))
}

fn non_overlapping_blocks(n: usize, block_size: usize) -> Result<usize> {
    if block_size == 0 || n % block_size != 0 {
        return Err(Error::InvalidInput(format!(
            "block size {block_size} does not divide sequence length {n}"
        )));
    }
    let num_blocks = n / block_size;
    if num_blocks == 0 {
        return Err(Error::InvalidInput("sequence is empty".into()));
    }
    Ok(num_blocks)
}

/// Non-overlapping template matching for a single template.
///
/// `block_size` must divide the sequence length evenly.
pub fn non_overlapping_template_matching(
    seq: &BitSequence,
    template: &[u8],
    block_size: usize,
) -> Result<Measurement> {
    let name = "Non-overlapping Template";
    check_template(template, block_size)?;
    let num_blocks = non_overlapping_blocks(seq.len(), block_size)?;
    let windows = window_values(seq.as_slice(), template.len());
    let (stat, counts) = non_overlapping_statistic(&windows, template, block_size, num_blocks)?;
    Ok(Measurement::multi(
        name,
        vec![stat],
        format!("N={num_blocks}, M={block_size}, W={counts:?}"),
    ))
}

/// Non-overlapping template matching for every odd template of
/// `template_len` bits; one statistic per template, in enumeration order.
pub fn non_overlapping_template_suite(
    seq: &BitSequence,
    template_len: usize,
    block_size: usize,
) -> Result<Measurement> {
    let name = "Non-overlapping Template";
    let templates = aperiodic_templates(template_len)?;
    if block_size < template_len {
        return Err(Error::InvalidInput(format!(
            "block size {block_size} is shorter than the {template_len}-bit template"
        )));
    }
    let num_blocks = non_overlapping_blocks(seq.len(), block_size)?;
    let windows = window_values(seq.as_slice(), template_len);

    let statistics = templates
        .iter()
        .map(|t| non_overlapping_statistic(&windows, t, block_size, num_blocks).map(|(s, _)| s))
        .collect::<Result<Vec<_>>>()?;
    Ok(Measurement::multi(
        name,
        statistics,
        format!(
            "templates={}, m={template_len}, N={num_blocks}, M={block_size}",
            templates.len()
        ),
    ))
}

/// Probability that an `m`-bit template occurs exactly `u` times in an
/// `M`-bit block, with `η = (M − m + 1) / 2^(m+1)`.
///
/// Summed in log space so large `u` does not overflow the gamma terms.
fn occurrence_probability(u: usize, eta: f64) -> f64 {
    if u == 0 {
        return (-eta).exp();
    }
    let uf = u as f64;
    (1..=u)
        .map(|l| {
            let lf = l as f64;
            (-eta - uf * std::f64::consts::LN_2 + lf * eta.ln() - lgamma(lf + 1.0) + lgamma(uf)
                - lgamma(lf)
                - lgamma(uf - lf + 1.0))
            .exp()
        })
        .sum()
}

/// Class probabilities `π_0 .. π_5` for the overlapping test.
pub fn overlapping_class_probabilities(template_len: usize, block_size: usize) -> [f64; 6] {
    let lambda = (block_size as f64 - template_len as f64 + 1.0) / 2f64.powi(template_len as i32);
    let eta = lambda / 2.0;
    let mut pi = [0.0; OVERLAPPING_CLASSES];
    for (u, slot) in pi.iter_mut().enumerate().take(OVERLAPPING_CLASSES - 1) {
        *slot = occurrence_probability(u, eta);
    }
    pi[OVERLAPPING_CLASSES - 1] = 1.0 - pi[..OVERLAPPING_CLASSES - 1].iter().sum::<f64>();
    pi
}

/// Overlapping template matching: the window advances one bit after a hit
/// as well as after a miss. Trailing bits beyond `⌊n/M⌋·M` are discarded.
pub fn overlapping_template_matching(
    seq: &BitSequence,
    template: &[u8],
    block_size: usize,
) -> Result<Measurement> {
    let name = "Overlapping Template";
    check_template(template, block_size)?;
    let m = template.len();
    let n = seq.len();
    let num_blocks = n / block_size;
    if num_blocks == 0 {
        return Err(Error::InvalidInput(format!(
            "overlapping template test with M={block_size} needs at least {block_size} bits, got {n}"
        )));
    }

    let target = pack(template);
    let mut observed = [0u64; OVERLAPPING_CLASSES];
    for block in seq.as_slice().chunks_exact(block_size) {
        let hits = window_values(block, m)
            .into_iter()
            .filter(|&w| w == target)
            .count();
        observed[hits.min(OVERLAPPING_CLASSES - 1)] += 1;
    }

    let pi = overlapping_class_probabilities(m, block_size);
    let n_f = num_blocks as f64;
    let expected = pi.map(|p| n_f * p);
    if let Some(class) = expected.iter().position(|&e| !(e > 0.0)) {
        return Err(Error::InvalidInput(format!(
            "overlapping template test with m={m}, M={block_size} expects no blocks in class {class}"
        )));
    }
    let chi2: f64 = observed
        .iter()
        .zip(expected)
        .map(|(&v, e)| (v as f64 - e).powi(2) / e)
        .sum();
    let p = igamc((OVERLAPPING_CLASSES - 1) as f64 / 2.0, chi2 / 2.0)?;
    Ok(Measurement::single(
        name,
        chi2,
        p,
        format!("N={num_blocks}, M={block_size}, m={m}, ν={observed:?}"),
    ))
}

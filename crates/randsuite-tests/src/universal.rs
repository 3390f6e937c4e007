//! Maurer's "universal statistical" test.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::result::Measurement;
use crate::sequence::BitSequence;
use crate::special::erfc;

/// Block length `L` and number of initialisation blocks `Q`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UniversalParams {
    pub block_len: usize,
    pub init_blocks: usize,
}

/// Expected value of `f_n` for `L = 1..=16`.
const EXPECTED: [f64; 16] = [
    0.732_649_5,
    1.537_438_3,
    2.401_606_8,
    3.311_224_7,
    4.253_426_6,
    5.217_705_2,
    6.196_250_7,
    7.183_665_6,
    8.176_424_8,
    9.172_324_3,
    10.170_032,
    11.168_765,
    12.168_070,
    13.167_693,
    14.167_488,
    15.167_379,
];

/// Variance of a single `log2` distance for `L = 1..=16`.
const VARIANCE: [f64; 16] = [
    0.690, 1.338, 1.901, 2.358, 2.705, 2.954, 3.125, 3.238, 3.311, 3.356, 3.384, 3.401, 3.410,
    3.416, 3.419, 3.421,
];

/// Minimum length `n` at which each `(L, Q)` pair becomes the recommended
/// choice, largest first.
const RECOMMENDED: [(usize, UniversalParams); 11] = [
    (1_059_061_760, params(16, 655_360)),
    (496_435_200, params(15, 327_680)),
    (231_669_760, params(14, 163_840)),
    (107_560_960, params(13, 81_920)),
    (49_643_520, params(12, 40_960)),
    (22_753_280, params(11, 20_480)),
    (10_342_400, params(10, 10_240)),
    (4_654_080, params(9, 5_120)),
    (2_068_480, params(8, 2_560)),
    (904_960, params(7, 1_280)),
    (387_840, params(6, 640)),
];

const fn params(block_len: usize, init_blocks: usize) -> UniversalParams {
    UniversalParams {
        block_len,
        init_blocks,
    }
}

/// Shortest sequence the automatic parameter table accepts.
pub const UNIVERSAL_MIN_LEN: usize = 387_840;

/// `(L, Q)` recommended for a sequence of `n` bits.
pub fn recommended_universal_params(n: usize) -> Result<UniversalParams> {
    RECOMMENDED
        .iter()
        .find(|(min_len, _)| n >= *min_len)
        .map(|&(_, p)| p)
        .ok_or_else(|| {
            Error::InvalidInput(format!(
                "universal test needs n ≥ {UNIVERSAL_MIN_LEN}, got {n}"
            ))
        })
}

/// Universal test with `(L, Q)` chosen from the sequence length.
pub fn universal(seq: &BitSequence) -> Result<Measurement> {
    let p = recommended_universal_params(seq.len())?;
    universal_with_params(seq, p)
}

/// Universal test with explicit parameters.
///
/// The first `Q` blocks of `L` bits seed a table with the last index at
/// which each pattern was seen; each of the remaining `K = ⌊n/L⌋ − Q`
/// blocks adds `log2` of the distance to its previous occurrence. The
/// mean is compared with its expected value using the finite-`K`
/// corrected standard deviation.
pub fn universal_with_params(seq: &BitSequence, params: UniversalParams) -> Result<Measurement> {
    let name = "Universal";
    let UniversalParams {
        block_len: l,
        init_blocks: q,
    } = params;
    if !(1..=16).contains(&l) {
        return Err(Error::InvalidInput(format!(
            "universal block length must be in 1..=16, got {l}"
        )));
    }
    if q == 0 {
        return Err(Error::InvalidInput(
            "universal test needs at least one initialisation block".into(),
        ));
    }
    let total_blocks = seq.len() / l;
    if total_blocks <= q {
        return Err(Error::InvalidInput(format!(
            "universal test with L={l}, Q={q} needs more than {} bits, got {}",
            q * l,
            seq.len()
        )));
    }
    let k = total_blocks - q;

    let mut last_seen = vec![0usize; 1 << l];
    let mut sum = 0.0;
    for (idx, block) in seq.as_slice().chunks_exact(l).take(total_blocks).enumerate() {
        let i = idx + 1;
        let value = block.iter().fold(0usize, |acc, &b| (acc << 1) | b as usize);
        if i > q {
            sum += ((i - last_seen[value]) as f64).log2();
        }
        last_seen[value] = i;
    }

    let lf = l as f64;
    let kf = k as f64;
    let f_n = sum / kf;
    let expected = EXPECTED[l - 1];
    let c = 0.7 - 0.8 / lf + (4.0 + 32.0 / lf) * kf.powf(-3.0 / lf) / 15.0;
    let sigma = c * (VARIANCE[l - 1] / kf).sqrt();
    let p = erfc((f_n - expected).abs() / (std::f64::consts::SQRT_2 * sigma));
    Ok(Measurement::single(
        name,
        f_n,
        p,
        format!("L={l}, Q={q}, K={k}, expected={expected}, σ={sigma:.6}"),
    ))
}

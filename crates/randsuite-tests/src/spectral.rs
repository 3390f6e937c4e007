//! Discrete Fourier transform (spectral) test.

use rustfft::{FftPlanner, num_complex::Complex};

use crate::error::{Error, Result};
use crate::result::Measurement;
use crate::sequence::BitSequence;
use crate::special::erfc;

/// `ln(1 / 0.05)`: 95% of the peak heights should lie below `√(ln 20 · n)`.
const LN_TWENTY: f64 = 2.995732274;

/// Spectral test: counts how many of the first `n/2` Fourier moduli fall
/// below the 95% threshold and compares that count with `0.95·n/2`.
pub fn discrete_fourier_transform(seq: &BitSequence) -> Result<Measurement> {
    let name = "Discrete Fourier Transform";
    let n = seq.len();
    if n < 2 {
        return Err(Error::InvalidInput(format!(
            "spectral test needs n ≥ 2, got {n}"
        )));
    }

    let mut buffer: Vec<Complex<f64>> = seq
        .as_slice()
        .iter()
        .map(|&b| Complex {
            re: if b == 1 { 1.0 } else { -1.0 },
            im: 0.0,
        })
        .collect();

    let mut planner = FftPlanner::new();
    let fft = planner.plan_fft_forward(n);
    fft.process(&mut buffer);

    let nf = n as f64;
    let half = n / 2;
    let threshold = (LN_TWENTY * nf).sqrt();
    let n0 = 0.95 * nf / 2.0;
    let n1 = buffer[..half]
        .iter()
        .filter(|c| c.norm() < threshold)
        .count();
    let d = (n1 as f64 - n0) / (nf * 0.95 * 0.05 / 4.0).sqrt();
    let p = erfc(d.abs() / std::f64::consts::SQRT_2);
    Ok(Measurement::single(
        name,
        d,
        p,
        format!("T={threshold:.6}, N0={n0}, N1={n1}"),
    ))
}

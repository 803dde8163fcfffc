//! # Pitch Detection Module
//!
//! Autocorrelation-based fundamental frequency estimation for plucked
//! strings. One estimate runs: gate on RMS, trim loud partial cycles off
//! the window edges, correlate, skip the zero-lag peak, refine the best
//! lag to sub-sample precision, convert to Hz and band-filter the result.
//!
//! Every degenerate input (silence, noise, a window too short to trim, a
//! flat correlation top) yields `frequency: None`. The absence of a clean
//! periodic signal is an expected, common condition, not a fault.

use rustfft::{FftPlanner, num_complex::Complex};
use serde::Serialize;

use crate::config::TunerConfig;

/// Outcome of analysing one sample window.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct PitchEstimate {
    /// Detected fundamental in Hz, `None` when the window holds no usable
    /// periodic signal.
    pub frequency: Option<f32>,
    /// Root-mean-square amplitude of the full window, reported even when
    /// no pitch is detected.
    pub rms: f32,
}

impl PitchEstimate {
    fn unpitched(rms: f32) -> Self {
        Self {
            frequency: None,
            rms,
        }
    }
}

/// Estimates the fundamental frequency of a sample window.
///
/// # Arguments
/// * `window` - Time-domain samples on a [-1, 1] amplitude scale
/// * `sample_rate` - Sampling rate of the window in Hz
/// * `config` - Gate, trim and band parameters
///
/// # Returns
/// A [`PitchEstimate`] carrying the window RMS and, when a periodic signal
/// inside the configured band was found, its frequency.
pub fn estimate(window: &[f32], sample_rate: u32, config: &TunerConfig) -> PitchEstimate {
    let rms = root_mean_square(window);
    if rms < config.noise_gate {
        return PitchEstimate::unpitched(rms);
    }

    // Partial cycles at the window boundary bias the correlation, so the
    // analysis runs on the span between the first and last quiet samples.
    let trimmed = trim_edges(window, config.trim_threshold);
    if trimmed.len() <= 2 {
        return PitchEstimate::unpitched(rms);
    }

    let corr = autocorrelate(trimmed);

    // Walk down the zero-lag peak; the fundamental is the strongest peak
    // past the first local minimum.
    let mut lag = 0;
    while lag + 1 < corr.len() && corr[lag] > corr[lag + 1] {
        lag += 1;
    }
    if lag == 0 || lag + 1 >= corr.len() {
        return PitchEstimate::unpitched(rms);
    }

    let mut best_lag = 0;
    let mut best_value = f32::MIN;
    for (i, &value) in corr.iter().enumerate().skip(lag) {
        if value > best_value {
            best_value = value;
            best_lag = i;
        }
    }
    // A winner on the correlation boundary has no neighbours to refine
    // against and no credible period either.
    if best_lag == 0 || best_lag + 1 >= corr.len() {
        return PitchEstimate::unpitched(rms);
    }

    let Some(period) = refine_peak(&corr, best_lag) else {
        return PitchEstimate::unpitched(rms);
    };

    let frequency = sample_rate as f32 / period;
    if frequency > config.min_frequency && frequency < config.max_frequency {
        PitchEstimate {
            frequency: Some(frequency),
            rms,
        }
    } else {
        PitchEstimate::unpitched(rms)
    }
}

/// RMS amplitude of the window; the loudness proxy used for gating.
fn root_mean_square(window: &[f32]) -> f32 {
    if window.is_empty() {
        return 0.0;
    }
    (window.iter().map(|&s| s * s).sum::<f32>() / window.len() as f32).sqrt()
}

/// Trims the window to the span between the first quiet sample from the
/// front and the first quiet sample from the back, scanning at most half
/// the window from either side.
fn trim_edges(window: &[f32], threshold: f32) -> &[f32] {
    let len = window.len();
    if len < 2 {
        return window;
    }
    let half = len / 2;

    let mut start = 0;
    for i in 0..half {
        if window[i].abs() < threshold {
            start = i;
            break;
        }
    }
    let mut end = len - 1;
    for i in 1..half {
        if window[len - i].abs() < threshold {
            end = len - i;
            break;
        }
    }
    &window[start..=end]
}

/// Autocorrelation of `samples` for every lag in `0..len`.
///
/// Computed in the frequency domain: zero-pad to twice the length, forward
/// FFT, power spectrum, inverse FFT. With the padding this equals the
/// direct shrinking-overlap sum `C[lag] = sum(x[i] * x[i + lag])` over the
/// valid indices. RustFFT does not normalize, so the round trip is scaled
/// by the padded length once at the end.
fn autocorrelate(samples: &[f32]) -> Vec<f32> {
    let len = samples.len();
    let padded = len * 2;

    let mut planner = FftPlanner::new();
    let forward = planner.plan_fft_forward(padded);
    let inverse = planner.plan_fft_inverse(padded);

    let mut spectrum: Vec<Complex<f32>> =
        samples.iter().map(|&s| Complex::new(s, 0.0)).collect();
    spectrum.resize(padded, Complex::new(0.0, 0.0));

    forward.process(&mut spectrum);
    for bin in spectrum.iter_mut() {
        *bin = Complex::new(bin.norm_sqr(), 0.0);
    }
    inverse.process(&mut spectrum);

    let scale = 1.0 / padded as f32;
    spectrum[..len].iter().map(|bin| bin.re * scale).collect()
}

/// Parabolic interpolation through a peak and its two neighbours.
///
/// Returns the sub-sample lag of the fitted vertex, or `None` when the
/// three points are collinear or the vertex lands at a non-positive lag.
fn refine_peak(corr: &[f32], peak: usize) -> Option<f32> {
    let left = corr[peak - 1];
    let mid = corr[peak];
    let right = corr[peak + 1];

    let denominator = left + right - 2.0 * mid;
    if denominator == 0.0 {
        return None;
    }
    let offset = (left - right) / (2.0 * denominator);
    let lag = peak as f32 + offset;
    (lag > 0.0).then_some(lag)
}

use serde::{Deserialize, Serialize};

/// Tuning knobs for the analysis pipeline.
///
/// The gate and trim thresholds are empirical values carried over from
/// field use; they are fields rather than constants so a frontend can
/// adjust them for unusually noisy or quiet rooms.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TunerConfig {
    /// Samples per analysis window.
    pub window_size: usize,
    /// RMS level below which a window is treated as silence.
    pub noise_gate: f32,
    /// Amplitude bound used to trim loud partial cycles off the window edges.
    pub trim_threshold: f32,
    /// Lower edge of the reportable pitch band in Hz.
    pub min_frequency: f32,
    /// Upper edge of the reportable pitch band in Hz.
    pub max_frequency: f32,
    /// Absolute cents deviation still considered in tune.
    pub in_tune_cents: f32,
    /// Capture rate requested from the input device.
    pub target_sample_rate: u32,
}

impl Default for TunerConfig {
    fn default() -> Self {
        Self {
            window_size: 2048,
            noise_gate: 0.005,
            trim_threshold: 0.2,
            min_frequency: 70.0,
            max_frequency: 1200.0,
            in_tune_cents: 4.0,
            target_sample_rate: 44_100,
        }
    }
}

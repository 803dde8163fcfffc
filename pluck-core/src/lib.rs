// pluck-core/src/lib.rs

//! The core logic for the guitar tuner.
//! This crate is responsible for audio capture, pitch detection and
//! tuning-state derivation. It is completely headless and contains
//! no terminal or GUI code.

pub mod audio;
pub mod config;
pub mod engine;
pub mod pitch;
pub mod runner;
pub mod state;
pub mod tuning;

pub use audio::{CaptureError, MicSource, SampleSource};
pub use config::TunerConfig;
pub use engine::Engine;
pub use pitch::PitchEstimate;
pub use runner::RunnerHandle;
pub use state::TuningStatus;
pub use tuning::NoteReading;

use serde::Serialize;

/// The result of a single engine tick, published whole to the frontend.
///
/// Every field is recomputed each tick; a snapshot is never patched in
/// place. `frequency` and `note` are `None` whenever the last window held
/// no detectable pitch, while `rms` is always reported so the frontend can
/// show signal strength even in silence.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Snapshot {
    /// Discrete tuner state derived from this tick.
    pub status: TuningStatus,
    /// The detected fundamental frequency in Hz.
    pub frequency: Option<f32>,
    /// The nearest tempered semitone and the deviation from it.
    pub note: Option<NoteReading>,
    /// Root-mean-square amplitude of the analysis window.
    pub rms: f32,
}

//! The tuner engine.
//!
//! One [`Engine`] instance exclusively owns one capture source, the
//! configuration and the published [`Snapshot`], with an explicit
//! start/stop lifecycle. Each tick flows strictly downward: latest window,
//! pitch estimate, note reading, status, snapshot.

use crate::Snapshot;
use crate::audio::{CaptureError, MicSource, SampleSource};
use crate::config::TunerConfig;
use crate::pitch::{self, PitchEstimate};
use crate::state::TuningStatus;
use crate::tuning;

/// Continuous tuner pipeline over a capture source.
pub struct Engine {
    config: TunerConfig,
    source: Option<Box<dyn SampleSource>>,
    snapshot: Snapshot,
}

impl Engine {
    pub fn new(config: TunerConfig) -> Self {
        Self {
            config,
            source: None,
            snapshot: Snapshot::default(),
        }
    }

    /// Begins a capture session on the default microphone.
    ///
    /// On failure the engine stays idle and the error says why; whether to
    /// ask the user and try again is the caller's decision.
    pub fn start(&mut self) -> Result<(), CaptureError> {
        let source = MicSource::open(&self.config)?;
        self.start_with_source(Box::new(source));
        Ok(())
    }

    /// Begins a session on an arbitrary source.
    ///
    /// An already-running session is released first; the engine drives at
    /// most one capture session at a time.
    pub fn start_with_source(&mut self, source: Box<dyn SampleSource>) {
        if self.source.is_some() {
            self.stop();
        }
        log::debug!("capture session started");
        self.source = Some(source);
        self.snapshot = Snapshot {
            status: TuningStatus::Listening,
            ..Snapshot::default()
        };
    }

    /// Ends the session, releases the device and resets the snapshot.
    ///
    /// Safe to call at any time, including when already stopped.
    pub fn stop(&mut self) {
        if let Some(mut source) = self.source.take() {
            source.close();
            log::debug!("capture session stopped");
        }
        self.snapshot = Snapshot::default();
    }

    /// Whether a capture session is currently active.
    pub fn is_active(&self) -> bool {
        self.source.is_some()
    }

    /// Runs one analysis pass and republishes the snapshot.
    ///
    /// A tick on a stopped engine is a no-op returning the idle snapshot,
    /// which is what makes a tick scheduled just before `stop()` harmless.
    pub fn tick(&mut self) -> &Snapshot {
        let Some(source) = self.source.as_mut() else {
            return &self.snapshot;
        };

        let sample_rate = source.sample_rate();
        let estimate = match source.latest_window() {
            Some(window) => pitch::estimate(window, sample_rate, &self.config),
            // Nothing captured yet this session.
            None => PitchEstimate {
                frequency: None,
                rms: 0.0,
            },
        };

        let note = estimate.frequency.map(tuning::map_frequency);
        let status = TuningStatus::resolve(note, self.config.in_tune_cents);

        self.snapshot = Snapshot {
            status,
            frequency: estimate.frequency,
            note,
            rms: estimate.rms,
        };
        &self.snapshot
    }

    /// The most recently published snapshot.
    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    pub fn config(&self) -> &TunerConfig {
        &self.config
    }
}

//! End-to-end pipeline tests against synthetic sample windows.
//!
//! No audio hardware is involved: a scripted source stands in for the
//! microphone and feeds pre-built windows through the full
//! window -> estimate -> note -> status -> snapshot path.

use std::collections::VecDeque;
use std::time::Duration;

use pluck_core::audio::SampleSource;
use pluck_core::{Engine, TunerConfig, TuningStatus, runner};

const SAMPLE_RATE: u32 = 48_000;
const WINDOW: usize = 2048;
// Low strings need more periods in view for an accurate correlation peak.
const LONG_WINDOW: usize = 8192;

/// Feeds pre-built windows to the engine; after the script runs out, the
/// last window keeps repeating, like a held note.
struct ScriptedSource {
    windows: VecDeque<Vec<f32>>,
    current: Vec<f32>,
    filled: bool,
}

impl ScriptedSource {
    fn new(windows: Vec<Vec<f32>>) -> Self {
        Self {
            windows: windows.into(),
            current: Vec::new(),
            filled: false,
        }
    }
}

impl SampleSource for ScriptedSource {
    fn sample_rate(&self) -> u32 {
        SAMPLE_RATE
    }

    fn latest_window(&mut self) -> Option<&[f32]> {
        if let Some(next) = self.windows.pop_front() {
            self.current = next;
            self.filled = true;
        }
        self.filled.then(|| self.current.as_slice())
    }
}

fn sine(freq: f32, amplitude: f32, len: usize) -> Vec<f32> {
    let step = 2.0 * std::f32::consts::PI * freq / SAMPLE_RATE as f32;
    (0..len).map(|i| amplitude * (step * i as f32).sin()).collect()
}

/// A decaying pluck: loud attack, exponential decay, still periodic.
fn pluck(freq: f32, len: usize) -> Vec<f32> {
    let step = 2.0 * std::f32::consts::PI * freq / SAMPLE_RATE as f32;
    (0..len)
        .map(|i| {
            let t = i as f32 / SAMPLE_RATE as f32;
            0.8 * (-t * 8.0).exp() * (step * i as f32).sin()
        })
        .collect()
}

fn engine_with(windows: Vec<Vec<f32>>) -> Engine {
    let mut engine = Engine::new(TunerConfig::default());
    engine.start_with_source(Box::new(ScriptedSource::new(windows)));
    engine
}

#[test]
fn open_string_frequencies_are_recovered_within_one_percent() {
    let strings = [
        (82.407_f32, LONG_WINDOW),
        (110.0, LONG_WINDOW),
        (146.83, LONG_WINDOW),
        (196.0, WINDOW),
        (246.94, WINDOW),
        (329.63, WINDOW),
    ];
    for (freq, len) in strings {
        let mut engine = engine_with(vec![sine(freq, 0.8, len)]);
        let snapshot = engine.tick();
        let detected = snapshot.frequency.expect("pitch expected");
        assert!(
            (detected - freq).abs() / freq < 0.01,
            "{freq} Hz detected as {detected} Hz"
        );
    }
}

#[test]
fn a_decaying_pluck_still_resolves() {
    let mut engine = engine_with(vec![pluck(110.0, LONG_WINDOW)]);
    let snapshot = engine.tick();
    let detected = snapshot.frequency.expect("pitch expected");
    assert!((detected - 110.0).abs() / 110.0 < 0.01);
    assert_ne!(snapshot.status, TuningStatus::Listening);
}

#[test]
fn silence_reports_listening_and_nothing_else() {
    let mut engine = engine_with(vec![vec![0.0; WINDOW]]);
    let snapshot = engine.tick();
    assert_eq!(snapshot.status, TuningStatus::Listening);
    assert_eq!(snapshot.frequency, None);
    assert_eq!(snapshot.note, None);
    assert_eq!(snapshot.rms, 0.0);
}

#[test]
fn faint_input_stays_listening() {
    let mut engine = engine_with(vec![sine(440.0, 0.004, WINDOW)]);
    let snapshot = engine.tick();
    assert_eq!(snapshot.status, TuningStatus::Listening);
    assert_eq!(snapshot.frequency, None);
    assert!(snapshot.rms > 0.0);
}

#[test]
fn a440_reads_in_tune_on_the_a_pitch_class() {
    let mut engine = engine_with(vec![sine(440.0, 0.8, WINDOW)]);
    let snapshot = engine.tick();
    assert_eq!(snapshot.status, TuningStatus::InTune);
    let note = snapshot.note.expect("note expected");
    assert_eq!(note.name(), "A");
    assert!(note.cents.abs() < 4.0);
}

#[test]
fn a_sharp_4_reads_its_own_pitch_class() {
    let mut engine = engine_with(vec![sine(466.164, 0.8, WINDOW)]);
    let snapshot = engine.tick();
    let note = snapshot.note.expect("note expected");
    assert_eq!(note.name(), "A#");
    assert_eq!(snapshot.status, TuningStatus::InTune);
}

#[test]
fn sharp_of_a_reads_sharp() {
    let mut engine = engine_with(vec![sine(450.0, 0.8, WINDOW)]);
    let snapshot = engine.tick();
    let note = snapshot.note.expect("note expected");
    assert_eq!(note.name(), "A");
    assert!(note.cents > 0.0);
    assert_eq!(snapshot.status, TuningStatus::Sharp);
}

#[test]
fn flat_of_a_reads_flat() {
    let mut engine = engine_with(vec![sine(436.0, 0.8, WINDOW)]);
    let snapshot = engine.tick();
    let note = snapshot.note.expect("note expected");
    assert_eq!(note.name(), "A");
    assert!(note.cents < 0.0);
    assert_eq!(snapshot.status, TuningStatus::Flat);
}

#[test]
fn strong_out_of_band_signals_are_rejected() {
    for freq in [50.0_f32, 1500.0] {
        let mut engine = engine_with(vec![sine(freq, 0.8, WINDOW)]);
        let snapshot = engine.tick();
        assert_eq!(snapshot.frequency, None, "{freq} Hz should be rejected");
        assert_eq!(snapshot.status, TuningStatus::Listening);
    }
}

#[test]
fn signal_loss_reverts_to_listening_on_the_next_tick() {
    let mut engine = engine_with(vec![sine(440.0, 0.8, WINDOW), vec![0.0; WINDOW]]);

    let first = engine.tick().clone();
    assert_eq!(first.status, TuningStatus::InTune);

    let second = engine.tick();
    assert_eq!(second.status, TuningStatus::Listening);
    assert_eq!(second.frequency, None);
    assert_eq!(second.note, None);
}

#[test]
fn stop_is_idempotent() {
    let mut engine = engine_with(vec![sine(440.0, 0.8, WINDOW)]);
    engine.tick();

    engine.stop();
    assert_eq!(engine.snapshot().status, TuningStatus::Idle);
    assert!(!engine.is_active());

    engine.stop();
    assert_eq!(engine.snapshot().status, TuningStatus::Idle);
    assert!(!engine.is_active());
}

#[test]
fn a_tick_after_stop_is_a_noop() {
    let mut engine = engine_with(vec![sine(440.0, 0.8, WINDOW)]);
    engine.tick();
    engine.stop();

    let snapshot = engine.tick();
    assert_eq!(snapshot.status, TuningStatus::Idle);
    assert_eq!(snapshot.frequency, None);
}

#[test]
fn restarting_leaves_no_residue_from_the_previous_session() {
    let mut engine = engine_with(vec![sine(440.0, 0.8, WINDOW)]);
    engine.tick();
    assert_eq!(engine.snapshot().status, TuningStatus::InTune);

    engine.stop();
    assert_eq!(engine.snapshot().frequency, None);

    engine.start_with_source(Box::new(ScriptedSource::new(vec![vec![0.0; WINDOW]])));
    assert_eq!(engine.snapshot().status, TuningStatus::Listening);
    assert_eq!(engine.snapshot().frequency, None);
    assert_eq!(engine.snapshot().note, None);

    let snapshot = engine.tick();
    assert_eq!(snapshot.status, TuningStatus::Listening);
    assert_eq!(snapshot.frequency, None);
}

#[test]
fn the_runner_streams_snapshots_and_stops_cleanly() {
    let windows = vec![sine(440.0, 0.8, WINDOW)];
    let handle = runner::spawn_with_source(
        TunerConfig::default(),
        Duration::from_millis(2),
        move || Ok(Box::new(ScriptedSource::new(windows)) as Box<dyn SampleSource>),
    )
    .expect("runner should start");

    for _ in 0..3 {
        let snapshot = handle
            .snapshots()
            .recv_timeout(Duration::from_secs(2))
            .expect("a snapshot per tick");
        assert_eq!(snapshot.status, TuningStatus::InTune);
    }

    handle.stop();
}

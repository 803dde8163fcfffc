//! Tuning status derivation.
//!
//! The status is a pure function of the latest pitch estimate; nothing but
//! the idle/active distinction outlives a tick, so the tuner can never be
//! stuck showing a stale in-tune state after the signal disappears.

use serde::Serialize;

use crate::tuning::NoteReading;

/// Discrete tuner state shown to the user.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TuningStatus {
    /// No capture session is active.
    #[default]
    Idle,
    /// Capturing, but the last window held no detectable pitch.
    Listening,
    /// Within the in-tune window of the nearest semitone.
    InTune,
    /// Below the nearest semitone; the string should be tightened.
    Flat,
    /// Above the nearest semitone; the string should be slackened.
    Sharp,
}

impl TuningStatus {
    /// Derives the status for one tick of an active session.
    ///
    /// `reading` is `None` when no pitch was detected this tick, the
    /// ordinary low-signal outcome.
    pub fn resolve(reading: Option<NoteReading>, in_tune_cents: f32) -> Self {
        match reading {
            None => TuningStatus::Listening,
            Some(note) if note.cents.abs() < in_tune_cents => TuningStatus::InTune,
            Some(note) if note.cents < 0.0 => TuningStatus::Flat,
            Some(_) => TuningStatus::Sharp,
        }
    }

    /// True for every state except [`TuningStatus::Idle`].
    pub fn is_active(self) -> bool {
        self != TuningStatus::Idle
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reading(cents: f32) -> Option<NoteReading> {
        Some(NoteReading {
            note_index: 9,
            cents,
        })
    }

    #[test]
    fn no_pitch_means_listening() {
        assert_eq!(TuningStatus::resolve(None, 4.0), TuningStatus::Listening);
    }

    #[test]
    fn small_deviations_read_in_tune() {
        assert_eq!(TuningStatus::resolve(reading(0.0), 4.0), TuningStatus::InTune);
        assert_eq!(TuningStatus::resolve(reading(3.9), 4.0), TuningStatus::InTune);
        assert_eq!(TuningStatus::resolve(reading(-3.9), 4.0), TuningStatus::InTune);
    }

    #[test]
    fn deviations_at_the_window_edge_are_out_of_tune() {
        assert_eq!(TuningStatus::resolve(reading(4.0), 4.0), TuningStatus::Sharp);
        assert_eq!(TuningStatus::resolve(reading(-4.0), 4.0), TuningStatus::Flat);
    }

    #[test]
    fn sign_picks_the_direction() {
        assert_eq!(TuningStatus::resolve(reading(-20.0), 4.0), TuningStatus::Flat);
        assert_eq!(TuningStatus::resolve(reading(20.0), 4.0), TuningStatus::Sharp);
    }

    #[test]
    fn only_idle_is_inactive() {
        assert!(!TuningStatus::Idle.is_active());
        assert!(TuningStatus::Listening.is_active());
        assert!(TuningStatus::InTune.is_active());
    }
}

//! # Musical Tuning Module
//!
//! Note mapping and cents math for equal temperament with A4 = 440 Hz,
//! plus the standard-tuning string table used for display hints.
//!
//! ## Features
//! - Frequency to nearest-semitone mapping through the fractional MIDI scale
//! - Signed cents deviation, zero at exact pitch
//! - Cent distance to an explicit target frequency
//! - Standard guitar tuning (E2 A2 D3 G3 B3 E4) with nearest-string lookup

use once_cell::sync::Lazy;
use serde::Serialize;

/// Chromatic pitch-class names, index 0 = C.
pub const NOTE_NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

/// Reference pitch for A4 in Hz.
pub const A4_HZ: f32 = 440.0;

/// MIDI note number of A4.
const A4_MIDI: f32 = 69.0;

/// A detected frequency mapped onto the nearest tempered semitone.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct NoteReading {
    /// Pitch class of the nearest semitone, 0 = C through 11 = B.
    pub note_index: u8,
    /// Signed distance to that semitone in cents. Negative means the input
    /// sits flat of the semitone.
    pub cents: f32,
}

impl NoteReading {
    /// Display name of the pitch class.
    pub fn name(&self) -> &'static str {
        NOTE_NAMES[self.note_index as usize]
    }
}

/// Maps a frequency onto the nearest tempered semitone.
///
/// Works through the fractional MIDI note number
/// `n = 12 * log2(f / 440) + 69`; rounding gives the nearest semitone, the
/// remainder scaled by 100 gives the cents deviation.
pub fn map_frequency(frequency: f32) -> NoteReading {
    let n = 12.0 * (frequency / A4_HZ).log2() + A4_MIDI;
    let nearest = n.round();
    let note_index = (nearest as i32).rem_euclid(12) as u8;
    let cents = (n - nearest) * 100.0;
    NoteReading { note_index, cents }
}

/// Deviation of `frequency` from an explicit target frequency in cents.
///
/// Cents are logarithmic: 100 cents to the semitone, 1200 to the octave.
/// Positive values mean sharp, negative values mean flat.
pub fn cents_from(frequency: f32, target: f32) -> f32 {
    1200.0 * (frequency / target).log2()
}

/// One string of the instrument in standard tuning.
#[derive(Debug, Clone)]
pub struct GuitarString {
    /// Display name with octave, e.g. "E2".
    pub name: &'static str,
    /// Equal temperament target frequency in Hz.
    pub frequency: f32,
}

/// Standard tuning, low to high: E2 A2 D3 G3 B3 E4.
///
/// Frequencies are derived from A4 with `f = 440 * 2^((n - 69) / 12)`
/// rather than written out, the same construction as any tempered note.
pub static STANDARD_TUNING: Lazy<Vec<GuitarString>> = Lazy::new(|| {
    const STRINGS: [(&str, i32); 6] = [
        ("E2", 40),
        ("A2", 45),
        ("D3", 50),
        ("G3", 55),
        ("B3", 59),
        ("E4", 64),
    ];
    STRINGS
        .iter()
        .map(|&(name, midi)| GuitarString {
            name,
            frequency: A4_HZ * 2.0_f32.powf((midi as f32 - A4_MIDI) / 12.0),
        })
        .collect()
});

/// The string whose target frequency lies closest to `frequency`.
pub fn nearest_string(frequency: f32) -> &'static GuitarString {
    STANDARD_TUNING
        .iter()
        .min_by(|a, b| {
            let diff_a = (a.frequency - frequency).abs();
            let diff_b = (b.frequency - frequency).abs();
            diff_a.partial_cmp(&diff_b).unwrap()
        })
        .unwrap() // This is safe as STANDARD_TUNING is never empty.
}

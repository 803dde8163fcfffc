//! # Audio Capture Module
//!
//! This module handles real-time microphone capture using CPAL
//! (Cross-Platform Audio Library). The device sits behind the small
//! [`SampleSource`] capability so that everything downstream of capture can
//! run against synthetic windows instead of hardware.
//!
//! ## Features
//! - Automatic input device selection
//! - Mono f32 stream as close to the requested sample rate as the device allows
//! - Fixed-size analysis windows streamed over a bounded channel
//! - A session-fatal error taxonomy the frontend can match on

use cpal::SupportedStreamConfigRange;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use crossbeam_channel::{Receiver, TrySendError};
use thiserror::Error;

use crate::config::TunerConfig;

/// Errors that end a capture session before it produces a single window.
///
/// Both variants are fatal to the current session: the engine stays idle
/// and nothing is retried until the user starts it again.
#[derive(Debug, Error)]
pub enum CaptureError {
    /// The user or environment refused microphone access.
    #[error("microphone access denied: {0}")]
    PermissionDenied(String),
    /// No capture device exists, or the device cannot provide a usable stream.
    #[error("capture device unavailable: {0}")]
    DeviceUnavailable(String),
}

impl CaptureError {
    /// Classifies a backend error message into the session taxonomy.
    ///
    /// CPAL surfaces permission problems as backend-specific strings rather
    /// than a dedicated variant, so the split has to go by message content.
    fn from_backend(message: String) -> Self {
        let lower = message.to_lowercase();
        if lower.contains("denied") || lower.contains("permission") || lower.contains("not allowed")
        {
            CaptureError::PermissionDenied(message)
        } else {
            CaptureError::DeviceUnavailable(message)
        }
    }
}

/// Capability interface over a capture device.
///
/// The engine only ever reads the rate and the most recent window; device
/// ownership, buffering and teardown stay on this side of the seam.
pub trait SampleSource {
    /// Sampling rate of the delivered windows in Hz.
    fn sample_rate(&self) -> u32;

    /// The most recent full window of time-domain samples, or `None` until
    /// the first window has been captured this session.
    fn latest_window(&mut self) -> Option<&[f32]>;

    /// Releases the device. Safe to call more than once.
    fn close(&mut self) {}
}

/// Microphone-backed [`SampleSource`].
///
/// The CPAL callback chops the incoming stream into windows of
/// `window_size` samples and forwards them over a bounded channel; polling
/// drains the channel and keeps only the newest window, since anything
/// older is stale by definition.
pub struct MicSource {
    stream: cpal::Stream,
    frames: Receiver<Vec<f32>>,
    window: Vec<f32>,
    filled: bool,
    sample_rate: u32,
}

impl MicSource {
    /// Opens the default input device and starts streaming analysis windows.
    ///
    /// # Arguments
    /// * `config` - Window size and preferred sample rate
    ///
    /// # Errors
    /// * [`CaptureError::PermissionDenied`] if the backend refuses access
    /// * [`CaptureError::DeviceUnavailable`] if there is no device or no
    ///   usable mono f32 configuration
    pub fn open(config: &TunerConfig) -> Result<Self, CaptureError> {
        let host = cpal::default_host();
        let device = host
            .default_input_device()
            .ok_or_else(|| CaptureError::DeviceUnavailable("no input device available".into()))?;

        let device_name = device.name().unwrap_or_else(|_| "<unknown>".into());

        let configs = device
            .supported_input_configs()
            .map_err(|e| CaptureError::from_backend(e.to_string()))?
            .collect::<Vec<_>>();
        let supported = find_supported_config(configs, config.target_sample_rate).ok_or_else(
            || CaptureError::DeviceUnavailable("no suitable mono f32 input format found".into()),
        )?;

        // The preferred rate may fall outside what the device offers; take
        // the nearest rate inside the supported range.
        let sample_rate = config
            .target_sample_rate
            .clamp(supported.min_sample_rate().0, supported.max_sample_rate().0);
        let stream_config: cpal::StreamConfig = supported
            .with_sample_rate(cpal::SampleRate(sample_rate))
            .into();

        log::info!("capturing from {device_name} at {sample_rate} Hz");

        let window_size = config.window_size;
        let (frame_tx, frame_rx) = crossbeam_channel::bounded::<Vec<f32>>(8);

        // This buffer accumulates audio data from the callback.
        let mut pending: Vec<f32> = Vec::with_capacity(window_size * 2);

        let err_fn = |err| log::warn!("input stream error: {err}");

        let stream = device
            .build_input_stream(
                &stream_config,
                move |data: &[f32], _: &cpal::InputCallbackInfo| {
                    pending.extend_from_slice(data);

                    // While we have enough data for a full window, forward it.
                    while pending.len() >= window_size {
                        let frame = pending[..window_size].to_vec();
                        match frame_tx.try_send(frame) {
                            // A full channel means the consumer is behind;
                            // dropping the window is fine, a fresher one is
                            // already on the way.
                            Ok(()) | Err(TrySendError::Full(_)) => {}
                            Err(TrySendError::Disconnected(_)) => return,
                        }
                        pending.drain(..window_size);
                    }
                },
                err_fn,
                None,
            )
            .map_err(map_build_error)?;

        stream
            .play()
            .map_err(|e| CaptureError::from_backend(e.to_string()))?;

        Ok(Self {
            stream,
            frames: frame_rx,
            window: Vec::new(),
            filled: false,
            sample_rate,
        })
    }
}

impl SampleSource for MicSource {
    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn latest_window(&mut self) -> Option<&[f32]> {
        while let Ok(frame) = self.frames.try_recv() {
            self.window = frame;
            self.filled = true;
        }
        self.filled.then(|| self.window.as_slice())
    }

    fn close(&mut self) {
        if let Err(e) = self.stream.pause() {
            log::debug!("pausing input stream failed: {e}");
        }
    }
}

fn map_build_error(err: cpal::BuildStreamError) -> CaptureError {
    match err {
        cpal::BuildStreamError::DeviceNotAvailable => {
            CaptureError::DeviceUnavailable("device disappeared while opening the stream".into())
        }
        other => CaptureError::from_backend(other.to_string()),
    }
}

/// Finds the best supported audio configuration for the target sample rate.
///
/// Filters for mono 32-bit float input and picks the configuration whose
/// supported rate range lies closest to the target.
fn find_supported_config(
    configs: Vec<SupportedStreamConfigRange>,
    target_rate: u32,
) -> Option<SupportedStreamConfigRange> {
    configs
        .into_iter()
        .filter(|c| c.channels() == 1 && c.sample_format() == cpal::SampleFormat::F32)
        .min_by_key(|c| {
            let min_diff = (c.min_sample_rate().0 as i32 - target_rate as i32).abs();
            let max_diff = (c.max_sample_rate().0 as i32 - target_rate as i32).abs();
            min_diff.min(max_diff)
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_messages_classify_into_the_session_taxonomy() {
        assert!(matches!(
            CaptureError::from_backend("Access denied by the user".into()),
            CaptureError::PermissionDenied(_)
        ));
        assert!(matches!(
            CaptureError::from_backend("recording permission has not been granted".into()),
            CaptureError::PermissionDenied(_)
        ));
        assert!(matches!(
            CaptureError::from_backend("ALSA function call failed".into()),
            CaptureError::DeviceUnavailable(_)
        ));
    }
}

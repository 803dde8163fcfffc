//! Cancellable repeating-tick task around an [`Engine`].
//!
//! The engine lives on a dedicated thread. CPAL streams are not `Send`, so
//! the capture source is opened on the same thread that ticks it; startup
//! errors travel back over a ready channel and `spawn` fails exactly like
//! a direct [`Engine::start`] call. Shutdown is a message: the loop drains
//! it between ticks, stops the engine and releases the device before the
//! thread exits, so stopping never races an in-flight tick.

use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{Receiver, Sender, bounded, unbounded};

use crate::Snapshot;
use crate::audio::{CaptureError, MicSource, SampleSource};
use crate::config::TunerConfig;
use crate::engine::Engine;

/// Handle to a running engine thread. Dropping it stops the engine.
pub struct RunnerHandle {
    shutdown_tx: Sender<()>,
    thread: Option<JoinHandle<()>>,
    snapshots: Receiver<Snapshot>,
}

impl RunnerHandle {
    /// One [`Snapshot`] arrives here per tick.
    pub fn snapshots(&self) -> &Receiver<Snapshot> {
        &self.snapshots
    }

    /// Stops the tick loop and waits until the device has been released.
    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        let _ = self.shutdown_tx.send(());
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                log::warn!("engine thread panicked during shutdown");
            }
        }
    }
}

impl Drop for RunnerHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Spawns the engine on its own thread, ticking every `interval` against
/// the default microphone.
pub fn spawn(config: TunerConfig, interval: Duration) -> Result<RunnerHandle, CaptureError> {
    let mic_config = config.clone();
    spawn_with_source(config, interval, move || {
        MicSource::open(&mic_config).map(|source| Box::new(source) as Box<dyn SampleSource>)
    })
}

/// Spawns the tick loop over any source.
///
/// The factory runs on the engine thread, which is what lets non-`Send`
/// capture handles work; the factory itself only carries plain data in.
pub fn spawn_with_source<F>(
    config: TunerConfig,
    interval: Duration,
    open_source: F,
) -> Result<RunnerHandle, CaptureError>
where
    F: FnOnce() -> Result<Box<dyn SampleSource>, CaptureError> + Send + 'static,
{
    let (shutdown_tx, shutdown_rx) = bounded(1);
    let (snapshot_tx, snapshot_rx) = unbounded();
    let (ready_tx, ready_rx) = bounded(1);

    let thread = thread::spawn(move || {
        let mut engine = Engine::new(config);
        match open_source() {
            Ok(source) => {
                engine.start_with_source(source);
                if ready_tx.send(Ok(())).is_err() {
                    engine.stop();
                    return;
                }
            }
            Err(err) => {
                let _ = ready_tx.send(Err(err));
                return;
            }
        }

        let ticker = crossbeam_channel::tick(interval);
        loop {
            crossbeam_channel::select! {
                recv(ticker) -> _ => {
                    let snapshot = engine.tick().clone();
                    if snapshot_tx.send(snapshot).is_err() {
                        // The listener went away; nothing left to publish for.
                        break;
                    }
                }
                recv(shutdown_rx) -> _ => break,
            }
        }
        engine.stop();
    });

    match ready_rx.recv() {
        Ok(Ok(())) => Ok(RunnerHandle {
            shutdown_tx,
            thread: Some(thread),
            snapshots: snapshot_rx,
        }),
        Ok(Err(err)) => {
            let _ = thread.join();
            Err(err)
        }
        Err(_) => {
            let _ = thread.join();
            Err(CaptureError::DeviceUnavailable(
                "capture thread exited during startup".into(),
            ))
        }
    }
}

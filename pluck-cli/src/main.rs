//! # Pluck - terminal guitar tuner
//!
//! Thin frontend over `pluck-core`: starts the engine on its own thread,
//! drains the snapshot channel and renders one status line per tick (or
//! one JSON object per tick for machine consumption). Runs until Enter.

use std::io::{self, BufRead, Write};
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use pluck_core::{Snapshot, TunerConfig, TuningStatus, runner, tuning};

#[derive(Parser, Debug)]
#[command(author, version, about = "Microphone guitar tuner for the terminal", long_about = None)]
struct Cli {
    /// Emit one JSON object per tick instead of the live status line.
    #[arg(long)]
    json: bool,

    /// RMS level treated as silence, on a 0..1 amplitude scale.
    #[arg(long)]
    gate: Option<f32>,

    /// Edge-trim amplitude threshold for the analysis window.
    #[arg(long)]
    trim: Option<f32>,

    /// Milliseconds between analysis ticks.
    #[arg(long, default_value_t = 16)]
    interval_ms: u64,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let mut config = TunerConfig::default();
    if let Some(gate) = cli.gate {
        config.noise_gate = gate;
    }
    if let Some(trim) = cli.trim {
        config.trim_threshold = trim;
    }

    let handle = runner::spawn(config, Duration::from_millis(cli.interval_ms))
        .context("could not start the tuner")?;
    log::info!("engine running, one tick every {} ms", cli.interval_ms);

    eprintln!("listening; press Enter to stop");

    // Enter on stdin ends the session.
    let (stdin_tx, stdin_rx) = crossbeam_channel::bounded(1);
    std::thread::spawn(move || {
        let mut line = String::new();
        let _ = io::stdin().lock().read_line(&mut line);
        let _ = stdin_tx.send(());
    });

    let snapshots = handle.snapshots().clone();
    loop {
        crossbeam_channel::select! {
            recv(snapshots) -> msg => match msg {
                Ok(snapshot) => render(&snapshot, cli.json)?,
                Err(_) => break,
            },
            recv(stdin_rx) -> _ => break,
        }
    }

    handle.stop();
    println!();
    Ok(())
}

fn render(snapshot: &Snapshot, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string(snapshot)?);
        return Ok(());
    }

    let line = match (snapshot.status, snapshot.frequency, snapshot.note) {
        (TuningStatus::Idle, ..) => "idle".to_string(),
        (status, Some(frequency), Some(note)) => {
            let string = tuning::nearest_string(frequency);
            format!(
                "{:<9} {:<2} {:+6.1}c  {:7.1} Hz  [string {} {:+5.0}c]  rms {:.4}",
                label(status),
                note.name(),
                note.cents,
                frequency,
                string.name,
                tuning::cents_from(frequency, string.frequency),
                snapshot.rms,
            )
        }
        _ => format!("listening  rms {:.4}", snapshot.rms),
    };

    // Rewrite the same terminal line each tick.
    print!("\r{line}\x1b[K");
    io::stdout().flush()?;
    Ok(())
}

fn label(status: TuningStatus) -> &'static str {
    match status {
        TuningStatus::Idle => "idle",
        TuningStatus::Listening => "listening",
        TuningStatus::InTune => "in tune",
        TuningStatus::Flat => "flat",
        TuningStatus::Sharp => "sharp",
    }
}

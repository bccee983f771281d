//! Command implementations

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::adapters::{CompressorConfig, TomlConfigAdapter};
use crate::cli::args::{CompressArgs, ProbeArgs};
use crate::domain::model::MediaMetadata;
use crate::domain::rules::StrategyAvailability;
use crate::engine::{
    ConsoleProgressSink, JobOutcome, JsonProgressSink, ProgressSink, TranscodeEngine,
};
use crate::output::verifier::OutputReport;
use crate::utils::{format_duration, format_file_size};

/// Execute the probe command
pub async fn probe(args: ProbeArgs, config: &CompressorConfig) -> Result<()> {
    info!("Input: {}", args.input.display());

    let engine = TranscodeEngine::new(config.engine_config(), &args.input)?;
    let metadata = engine
        .probe()
        .await
        .context("Failed to inspect input file")?;
    let strategies: Vec<&str> = StrategyAvailability::strategies_for(engine.kind())
        .iter()
        .map(|s| s.as_str())
        .collect();

    if args.json {
        let document = serde_json::json!({
            "path": args.input.display().to_string(),
            "kind": engine.kind().to_string(),
            "metadata": metadata,
            "strategies": strategies,
        });
        println!("{}", serde_json::to_string_pretty(&document)?);
    } else {
        println!("File: {}", args.input.display());
        println!("Kind: {}", engine.kind());
        print_metadata(&metadata);
        println!("Strategies: {}", strategies.join(", "));
    }
    Ok(())
}

fn print_metadata(metadata: &MediaMetadata) {
    println!("Size: {}", format_file_size(metadata.size_bytes));
    if let Some(duration) = metadata.duration {
        println!("Duration: {}", format_duration(duration));
    }
    if let Some(resolution) = metadata.resolution {
        println!("Resolution: {}", resolution);
    }
    if let Some(fps) = metadata.frame_rate {
        println!("Frame rate: {} fps", fps);
    }
    if let Some(kbps) = metadata.video_bitrate_kbps {
        println!("Video bitrate: {} kb/s", kbps);
    }
    if let Some(kbps) = metadata.audio_bitrate_kbps {
        println!("Audio bitrate: {} kb/s", kbps);
    }
    if let Some(hz) = metadata.audio_sample_rate_hz {
        println!("Sample rate: {} Hz", hz);
    }
}

/// Execute the compress command
pub async fn compress(args: CompressArgs, config: &CompressorConfig) -> Result<()> {
    info!("Input: {}", args.input.display());

    let strategy = args.strategy.into_strategy();
    info!("Strategy: {}", strategy.kind());

    let engine = Arc::new(TranscodeEngine::new(config.engine_config(), &args.input)?);
    let sink: Box<dyn ProgressSink> = if args.json {
        Box::new(JsonProgressSink)
    } else {
        Box::new(ConsoleProgressSink::new())
    };

    let controls = spawn_controls(Arc::clone(&engine), args.interactive);
    let outcome = engine.run_strategy(strategy, sink.as_ref()).await;
    controls.abort();

    match outcome.context("Compression failed")? {
        JobOutcome::Completed(report) => print_report(&report, args.json)?,
        JobOutcome::Cancelled => {
            if args.json {
                println!(
                    "{}",
                    serde_json::json!({
                        "event": "cancelled",
                        "timestamp": chrono::Utc::now().to_rfc3339()
                    })
                );
            } else {
                println!();
                println!("Compression cancelled");
            }
        }
    }
    Ok(())
}

/// Execute the config command
pub fn show_config(config: &CompressorConfig) -> Result<()> {
    print!("{}", TomlConfigAdapter::render(config)?);
    Ok(())
}

fn print_report(report: &OutputReport, json: bool) -> Result<()> {
    if json {
        let mut event = serde_json::to_value(report)?;
        event["event"] = "completed".into();
        event["saved_bytes"] = report.saved_bytes().into();
        event["timestamp"] = chrono::Utc::now().to_rfc3339().into();
        println!("{}", event);
        return Ok(());
    }

    println!("Output: {}", report.output_path.display());
    println!(
        "Size: {} -> {} ({:.1}% of the original)",
        format_file_size(report.source_size),
        format_file_size(report.output_size),
        report.ratio * 100.0
    );
    let saved = report.saved_bytes();
    if saved >= 0 {
        println!("Saved: {}", format_file_size(saved.unsigned_abs()));
    } else {
        println!("Grew by: {}", format_file_size(saved.unsigned_abs()));
    }
    Ok(())
}

enum Control {
    Interrupt,
    Line(Option<String>),
}

async fn next_command(commands: &mut Option<Lines<BufReader<Stdin>>>) -> Option<String> {
    match commands {
        Some(lines) => lines.next_line().await.ok().flatten(),
        None => std::future::pending().await,
    }
}

/// Forward Ctrl-C and, when interactive, stdin commands to the engine
fn spawn_controls(engine: Arc<TranscodeEngine>, interactive: bool) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut commands = interactive.then(|| BufReader::new(tokio::io::stdin()).lines());
        if interactive {
            eprintln!("Commands: pause, resume, cancel");
        }

        loop {
            let control = tokio::select! {
                _ = tokio::signal::ctrl_c() => Control::Interrupt,
                line = next_command(&mut commands) => Control::Line(line),
            };

            let result = match control {
                Control::Interrupt => {
                    warn!("Interrupted, cancelling compression");
                    if let Err(e) = engine.cancel().await {
                        warn!("Cancel failed: {}", e);
                    }
                    break;
                }
                // stdin closed
                Control::Line(None) => {
                    commands = None;
                    continue;
                }
                Control::Line(Some(line)) => match line.trim().to_ascii_lowercase().as_str() {
                    "" => continue,
                    "pause" => engine.pause(),
                    "resume" => engine.resume(),
                    "cancel" => engine.cancel().await,
                    other => {
                        eprintln!("Unknown command: {}", other);
                        continue;
                    }
                },
            };

            if let Err(e) = result {
                warn!("Control command failed: {}", e);
            }
        }
    })
}

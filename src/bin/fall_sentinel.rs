//! fall_sentinel - offline fall-decision replay over recorded pose streams
//!
//! Reads newline-delimited JSON operations produced by a pose model and a
//! tracker, and writes one JSON report per frame:
//!
//! ```text
//! {"op":"frame","timestamp":12.4,"detections":[{"id":0,"keypoints":[[x,y,c], ...]}]}
//! {"op":"reset","object_id":0}
//! {"op":"reset"}
//! ```
//!
//! Thresholds come from `FALL_CONFIG` and the usual environment overrides.

use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use serde::Deserialize;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, IsTerminal, Write};
use std::path::PathBuf;

use fall_sentinel::{FallConfig, FallDetector, FrameRequest, TrackId};

#[path = "../ui.rs"]
mod ui;

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Config file (JSON, or TOML with a .toml extension). Overrides FALL_CONFIG.
    #[arg(long, global = true, value_name = "PATH")]
    config_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Replay a recorded pose stream through the decision engine.
    Replay {
        /// Input stream of JSON operations ("-" for stdin).
        #[arg(long, default_value = "-")]
        input: String,
        /// Output stream of frame reports ("-" for stdout).
        #[arg(long, default_value = "-")]
        output: String,
        /// UI mode for stderr progress (auto|plain|pretty)
        #[arg(long, default_value = "auto", value_name = "MODE")]
        ui: String,
    },
    /// Print the effective detector configuration.
    Config,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
enum ReplayOp {
    Frame(FrameRequest),
    Reset {
        #[serde(default)]
        object_id: Option<TrackId>,
    },
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let config = match &args.config_file {
        Some(path) => FallConfig::load_from(path)?,
        None => FallConfig::load()?,
    };

    match args.command {
        Command::Config => {
            let detector = FallDetector::new(config)?;
            println!("{}", serde_json::to_string_pretty(&detector.config_snapshot())?);
            Ok(())
        }
        Command::Replay { input, output, ui } => {
            let ui = ui::Ui::new(
                ui::UiMode::parse(&ui),
                std::io::stderr().is_terminal(),
                output == "-" && std::io::stdout().is_terminal(),
            );
            let detector = FallDetector::new(config)?;
            log::info!(
                "fall_sentinel replay: profile={} threshold={} history={}",
                detector.config().profile.as_str(),
                detector.config().fall_threshold,
                detector.config().history_length
            );
            let reader = open_input(&input)?;
            let writer = open_output(&output)?;
            replay(&detector, reader, writer, &ui)
        }
    }
}

fn replay<R: BufRead, W: Write>(
    detector: &FallDetector,
    reader: R,
    mut writer: W,
    ui: &ui::Ui,
) -> Result<()> {
    let mut counter = ui.frames();
    for (index, line) in reader.lines().enumerate() {
        let line_no = index + 1;
        let line = line.map_err(|e| anyhow!("failed to read line {}: {}", line_no, e))?;
        if line.trim().is_empty() {
            continue;
        }
        let op: ReplayOp = serde_json::from_str(&line)
            .map_err(|e| anyhow!("invalid operation on line {}: {}", line_no, e))?;
        match op {
            ReplayOp::Frame(request) => {
                let report = detector.process_frame(&request);
                if report.fall_detected {
                    let ids: Vec<TrackId> = report
                        .detections
                        .iter()
                        .filter(|d| d.is_fall)
                        .map(|d| d.id)
                        .collect();
                    log::warn!("fall detected at t={:.3} objects={:?}", report.timestamp, ids);
                }
                serde_json::to_writer(&mut writer, &report)?;
                writer.write_all(b"\n")?;
                counter.record(report.fall_detected);
            }
            ReplayOp::Reset { object_id } => {
                detector.reset(object_id);
                counter.record_reset();
            }
        }
    }
    writer.flush()?;
    counter.finish();
    Ok(())
}

fn open_input(path: &str) -> Result<Box<dyn BufRead>> {
    if path == "-" {
        return Ok(Box::new(BufReader::new(std::io::stdin())));
    }
    let file =
        File::open(path).map_err(|e| anyhow!("failed to open input {}: {}", path, e))?;
    Ok(Box::new(BufReader::new(file)))
}

fn open_output(path: &str) -> Result<Box<dyn Write>> {
    if path == "-" {
        return Ok(Box::new(BufWriter::new(std::io::stdout())));
    }
    let file =
        File::create(path).map_err(|e| anyhow!("failed to create output {}: {}", path, e))?;
    Ok(Box::new(BufWriter::new(file)))
}

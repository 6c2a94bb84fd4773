//! SVL CLI
//!
//! Validate, summarize, replay, and play algorithm traces.

#![warn(missing_docs)]
#![warn(clippy::all)]

use clap::{Parser, Subcommand};
use color_eyre::eyre::{eyre, Result, WrapErr};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::path::{Path, PathBuf};
use svl_core::Trace;
use svl_replay::{Engine, EngineEvent, SkippedOp, Snapshot, TraceDigest};
use svl_runtime::{PlaybackConfig, PlaybackController, PlaybackState};
use tokio::sync::broadcast::error::RecvError;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "svl")]
#[command(about = "SVL - step through recorded algorithm traces", long_about = None)]
struct Cli {
    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check that a trace loads
    Validate {
        /// Path to trace file
        file: PathBuf,
    },
    /// Apply deltas without delay and print the resulting frame
    Replay {
        /// Path to trace file
        file: PathBuf,
        /// Stop after this many deltas
        #[arg(short, long)]
        frame: Option<usize>,
        /// Pretty-print the JSON
        #[arg(long)]
        pretty: bool,
    },
    /// Summarize a trace without applying it
    Digest {
        /// Path to trace file
        file: PathBuf,
        /// Pretty-print the JSON
        #[arg(long)]
        pretty: bool,
    },
    /// Play a trace on a timer
    Play {
        /// Path to trace file
        file: PathBuf,
        /// Speed factor
        #[arg(short, long)]
        speed: Option<f64>,
        /// Playback config file
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

#[derive(Debug, Serialize)]
struct SkipRecord {
    delta: usize,
    #[serde(flatten)]
    op: SkippedOp,
}

#[derive(Debug, Serialize)]
struct ReplayOutput {
    algorithm: String,
    total_frames: usize,
    #[serde(flatten)]
    snapshot: Snapshot,
    skipped: Vec<SkipRecord>,
    unknown: Vec<String>,
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("svl=info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn load(path: &Path) -> Result<Trace> {
    Trace::from_path(path).wrap_err_with(|| format!("failed to load {}", path.display()))
}

fn describe(trace: &Trace) -> String {
    let operations: usize = trace.deltas.iter().map(|d| d.op_count()).sum();
    format!(
        "{} ({}, {} deltas, {} operations)",
        trace.algorithm.name,
        trace.kind(),
        trace.len(),
        operations
    )
}

fn replay(trace: Trace, frame: Option<usize>) -> Result<ReplayOutput> {
    let algorithm = trace.algorithm.name.clone();
    let total_frames = trace.len();
    let target = frame.unwrap_or(total_frames).min(total_frames);

    let mut engine = Engine::default();
    engine.load_trace(trace);

    let mut skipped = Vec::new();
    let mut unknown = Vec::new();
    while engine.current_frame() < target {
        let Some(report) = engine.step() else {
            break;
        };
        skipped.extend(report.skipped.into_iter().map(|op| SkipRecord {
            delta: report.delta,
            op,
        }));
        unknown.extend(report.unknown);
    }

    let snapshot = engine.snapshot().ok_or_else(|| eyre!("no trace loaded"))?;
    Ok(ReplayOutput {
        algorithm,
        total_frames,
        snapshot,
        skipped,
        unknown,
    })
}

fn render<T: Serialize>(value: &T, pretty: bool) -> Result<String> {
    let text = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    Ok(text)
}

fn playback_config(path: Option<&Path>, speed: Option<f64>) -> Result<PlaybackConfig> {
    let mut config = match path {
        Some(path) => PlaybackConfig::from_path(path)
            .wrap_err_with(|| format!("bad playback config {}", path.display()))?,
        None => PlaybackConfig::default(),
    };
    if let Some(speed) = speed {
        config.speed = config.clamp_speed(speed);
    }
    Ok(config)
}

fn show_event(bar: &ProgressBar, event: Result<EngineEvent, RecvError>) {
    match event {
        Ok(EngineEvent::FrameAdvanced { index, .. }) => bar.set_position(index as u64),
        Ok(EngineEvent::CodeHighlightChanged { line: Some(line) }) => {
            bar.set_message(format!("line {line}"));
        }
        Ok(EngineEvent::OperationSkipped { delta, name, reason }) => {
            bar.println(format!(
                "{} delta {delta}: {name}: {reason}",
                style("skipped").yellow()
            ));
        }
        Ok(_) => {}
        Err(RecvError::Lagged(missed)) => tracing::warn!(missed, "event stream lagged"),
        Err(RecvError::Closed) => {}
    }
}

async fn play(trace: Trace, config: PlaybackConfig) -> Result<()> {
    let total = trace.len() as u64;
    let mut engine = Engine::default();
    engine.load_trace(trace);

    let mut controller = PlaybackController::new(engine, config)?;
    let mut events = controller.subscribe_events().await;

    let bar = ProgressBar::new(total);
    bar.set_style(ProgressStyle::with_template(
        "{spinner} [{bar:40.cyan/blue}] {pos}/{len} {msg}",
    )?);

    if !controller.play().await {
        bar.finish_with_message("nothing to play");
        return Ok(());
    }

    let interrupted = {
        let finished = controller.wait_until_finished();
        tokio::pin!(finished);
        loop {
            tokio::select! {
                _ = &mut finished => break false,
                _ = tokio::signal::ctrl_c() => break true,
                event = events.recv() => show_event(&bar, event),
            }
        }
    };
    if interrupted {
        controller.pause().await;
    }
    while let Ok(event) = events.try_recv() {
        show_event(&bar, Ok(event));
    }

    match controller.state() {
        PlaybackState::Ended => bar.finish_with_message(style("done").green().to_string()),
        _ => bar.abandon_with_message(style("paused").yellow().to_string()),
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    init_tracing(cli.log_json);

    match cli.command {
        Commands::Validate { file } => {
            let trace = load(&file)?;
            println!("{} {}", style("valid").green().bold(), describe(&trace));
            Ok(())
        }
        Commands::Replay { file, frame, pretty } => {
            let trace = load(&file)?;
            println!("{}", render(&replay(trace, frame)?, pretty)?);
            Ok(())
        }
        Commands::Digest { file, pretty } => {
            let trace = load(&file)?;
            println!("{}", render(&TraceDigest::from_trace(&trace), pretty)?);
            Ok(())
        }
        Commands::Play { file, speed, config } => {
            let trace = load(&file)?;
            let config = playback_config(config.as_deref(), speed)?;
            play(trace, config).await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use std::io::Write;

    const SORT_TRACE: &str = r#"{
        "algorithm": {"name": "bubble"},
        "initial_frame": {
            "data_state": {"type": "array", "structure": [{"value": 2}, {"value": 1}]}
        },
        "deltas": [
            {"code_highlight": 1, "operations": [
                {"op": "updateStyle", "params": {"indices": [0, 1], "styleKey": "compare"}}
            ]},
            {"code_highlight": 2, "operations": [
                {"op": "moveElements", "params": {"pairs": [{"fromIndex": 0, "toIndex": 1}, {"fromIndex": 1, "toIndex": 0}]}},
                {"op": "removeBoundary", "params": {"type": "window"}}
            ]},
            {"operations": [
                {"op": "sparkle", "params": {}}
            ]}
        ]
    }"#;

    fn trace_file(text: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(text.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_play_args() {
        let cli = Cli::try_parse_from(["svl", "--log-json", "play", "t.json", "--speed", "2"]).unwrap();
        assert!(cli.log_json);
        let Commands::Play { file, speed, config } = cli.command else {
            panic!("expected play");
        };
        assert_eq!(file, PathBuf::from("t.json"));
        assert_eq!(speed, Some(2.0));
        assert!(config.is_none());
    }

    #[test]
    fn test_load_and_describe() {
        let file = trace_file(SORT_TRACE);
        let trace = load(file.path()).unwrap();
        assert_eq!(describe(&trace), "bubble (array, 3 deltas, 4 operations)");
    }

    #[test]
    fn test_load_reports_path() {
        let file = trace_file(r#"{"initial_frame": {}, "deltas": []}"#);
        let err = load(file.path()).unwrap_err();
        assert!(err.to_string().contains("failed to load"));
    }

    #[test]
    fn test_replay_to_frame() {
        let trace = Trace::from_json_str(SORT_TRACE).unwrap();
        let output = replay(trace, Some(2)).unwrap();
        assert_eq!(output.snapshot.frame_index, 2);
        assert_eq!(output.total_frames, 3);
        assert_eq!(output.snapshot.frame.code_highlight, Some(2));
        assert_eq!(output.skipped.len(), 1);
        assert_eq!(output.skipped[0].delta, 1);
        assert!(output.unknown.is_empty());

        let json: serde_json::Value = serde_json::from_str(&render(&output, false).unwrap()).unwrap();
        assert_eq!(json["frame_index"], 2);
        assert_eq!(json["frame"]["data_state"]["structure"][0]["value"], 1);
    }

    #[test]
    fn test_replay_clamps_past_end() {
        let trace = Trace::from_json_str(SORT_TRACE).unwrap();
        let output = replay(trace, Some(50)).unwrap();
        assert_eq!(output.snapshot.frame_index, 3);
        assert_eq!(output.unknown, vec!["sparkle".to_string()]);
    }

    #[test]
    fn test_playback_config_speed_override() {
        let config = playback_config(None, Some(20.0)).unwrap();
        assert_eq!(config.speed, 8.0);

        let file = trace_file(r#"{"base_interval_ms": 100, "max_speed": 2.0}"#);
        let config = playback_config(Some(file.path()), Some(3.0)).unwrap();
        assert_eq!(config.base_interval_ms, 100);
        assert_eq!(config.speed, 2.0);
    }
}

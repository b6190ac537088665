//! Presence Monitor CLI
//!
//! Replays landmark recordings and analyses still images.

use anyhow::{bail, Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use presence_monitor::{
    annotate,
    config::Config,
    core::{FrameAnalyzer, FrameMetrics, SessionSummary},
    decode_frame,
    landmarks::{Detection, LandmarkProvider, NoopProvider, RecordedFrame, StaticProvider},
    TransparencyLog, PRIVACY_DECLARATION, VERSION,
};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "presence-monitor")]
#[command(version = VERSION)]
#[command(about = "Interview presence feedback from camera landmarks", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay a landmark recording (one JSON frame per line)
    Replay {
        /// Recording to replay
        #[arg(long, short)]
        input: PathBuf,

        /// Print metrics every N frames (0 prints none)
        #[arg(long, default_value = "10")]
        print_every: usize,

        /// Do not write session summaries to the export directory
        #[arg(long)]
        no_export: bool,
    },

    /// Analyse a single encoded image (raw bytes or a base64 data URL)
    AnalyzeImage {
        /// Image file to analyse
        #[arg(long)]
        image: PathBuf,

        /// Detection JSON to use as the landmarks for this image
        #[arg(long)]
        landmarks: Option<PathBuf>,

        /// Write an annotated PNG here
        #[arg(long)]
        annotate: Option<PathBuf>,
    },

    /// Show processing statistics
    Status,

    /// Display privacy declaration
    Privacy,

    /// Combine exported session summaries into one file
    Export {
        /// Directory holding session files
        #[arg(long, short)]
        output: Option<PathBuf>,

        /// Export format (json or jsonl)
        #[arg(long, default_value = "json")]
        format: String,
    },

    /// Show configuration
    Config,
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Replay {
            input,
            print_every,
            no_export,
        } => cmd_replay(&input, print_every, no_export),
        Commands::AnalyzeImage {
            image,
            landmarks,
            annotate,
        } => cmd_analyze_image(&image, landmarks.as_deref(), annotate.as_deref()),
        Commands::Status => cmd_status(),
        Commands::Privacy => {
            println!("{PRIVACY_DECLARATION}");
            Ok(())
        }
        Commands::Export { output, format } => cmd_export(output, &format),
        Commands::Config => cmd_config(),
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("presence_monitor=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn transparency_log(config: &Config) -> TransparencyLog {
    TransparencyLog::with_persistence(config.data_path.join("transparency.json"))
}

fn cmd_replay(input: &Path, print_every: usize, no_export: bool) -> Result<()> {
    let config = Config::load().context("loading configuration")?;
    if let Err(e) = config.ensure_directories() {
        tracing::warn!("could not create directories: {}", e);
    }

    let file = File::open(input).with_context(|| format!("opening {}", input.display()))?;
    let log = transparency_log(&config);

    println!("Presence Monitor v{VERSION}");
    println!("Replaying {}", input.display());
    println!();

    let mut analyzer: Option<FrameAnalyzer<NoopProvider>> = None;
    let mut summaries: Vec<SessionSummary> = Vec::new();
    let mut last_timestamp = 0.0;
    let mut frames = 0usize;

    for (line_no, line) in BufReader::new(file).lines().enumerate() {
        let line = line.with_context(|| format!("reading {}", input.display()))?;
        if line.trim().is_empty() {
            continue;
        }

        let frame: RecordedFrame = match serde_json::from_str(&line) {
            Ok(frame) => frame,
            Err(e) => {
                tracing::warn!(line = line_no + 1, "skipping malformed frame: {}", e);
                continue;
            }
        };

        let analyzer = analyzer.get_or_insert_with(|| {
            FrameAnalyzer::starting_at(NoopProvider::new(), config.analyzer.clone(), frame.timestamp)
        });

        let metrics =
            analyzer.analyze_detection(&frame.detection, frame.width, frame.height, frame.timestamp);
        log.record_detection(&frame.detection);
        frames += 1;
        last_timestamp = frame.timestamp;

        for event in analyzer.take_events() {
            println!("[{:>8.2}s] ** {}", event.timestamp(), event.description());
        }
        if print_every > 0 && frames % print_every == 0 {
            print_metrics(&metrics, config.analyzer.feedback_display_limit);
        }
        for summary in analyzer.take_summaries() {
            println!("[{:>8.2}s] summary: {}", summary.timestamp, summary.log_line());
            summaries.push(summary);
        }
    }

    let Some(analyzer) = analyzer else {
        println!("No frames found in {}", input.display());
        return Ok(());
    };

    let closing = analyzer.summary(last_timestamp);
    println!();
    println!("Session {}", analyzer.session_id());
    println!("  Frames: {frames}");
    println!("  Final: {}", closing.log_line());
    summaries.push(closing);

    if !no_export {
        let export_path = config.export_path.join(format!(
            "session_{}.json",
            Utc::now().format("%Y%m%d_%H%M%S")
        ));
        if let Some(parent) = export_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }

        let json = serde_json::to_string_pretty(&summaries)?;
        std::fs::write(&export_path, json)
            .with_context(|| format!("writing {}", export_path.display()))?;
        log.record_summaries_exported(summaries.len() as u64);
        println!(
            "Exported {} summaries to {}",
            summaries.len(),
            export_path.display()
        );
    }

    if let Err(e) = log.save() {
        tracing::warn!("could not save transparency log: {}", e);
    }

    println!();
    println!("{}", log.summary());
    Ok(())
}

fn print_metrics(metrics: &FrameMetrics, feedback_limit: usize) {
    println!(
        "[{:>8.2}s] score {:>3} | eye {:<8} | slouch {:>5.1}° | {}",
        metrics.timestamp,
        metrics.confidence_score,
        metrics.eye_contact.as_str(),
        metrics.posture.slouch_angle_deg,
        metrics.display_feedback(feedback_limit).join("; ")
    );
}

fn cmd_analyze_image(
    image: &Path,
    landmarks: Option<&Path>,
    annotate_path: Option<&Path>,
) -> Result<()> {
    let config = Config::load().context("loading configuration")?;
    let data = std::fs::read(image).with_context(|| format!("reading {}", image.display()))?;
    let log = transparency_log(&config);

    let metrics = match landmarks {
        Some(path) => {
            let json = std::fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()))?;
            let detection: Detection = serde_json::from_str(&json)
                .with_context(|| format!("parsing landmarks in {}", path.display()))?;
            let metrics =
                analyze_once(StaticProvider::new(detection.clone()), &config, &data, &log)?;
            log.record_detection(&detection);
            metrics
        }
        None => {
            let metrics = analyze_once(NoopProvider::new(), &config, &data, &log)?;
            log.record_detection(&Detection::empty());
            metrics
        }
    };

    println!("{}", serde_json::to_string_pretty(&metrics)?);

    if let Some(out) = annotate_path {
        let frame = decode_frame(&data)?;
        annotate(&frame, &metrics, config.analyzer.feedback_display_limit)
            .save(out)
            .with_context(|| format!("writing {}", out.display()))?;
        println!("Annotated image written to {}", out.display());
    }

    if let Err(e) = log.save() {
        tracing::warn!("could not save transparency log: {}", e);
    }
    Ok(())
}

fn analyze_once<P: LandmarkProvider>(
    provider: P,
    config: &Config,
    data: &[u8],
    log: &TransparencyLog,
) -> Result<FrameMetrics> {
    let mut analyzer = FrameAnalyzer::new(provider, config.analyzer.clone());
    match analyzer.process_encoded_image(data) {
        Ok(metrics) => Ok(metrics),
        Err(e) => {
            log.record_decode_failure();
            if let Err(save_err) = log.save() {
                tracing::warn!("could not save transparency log: {}", save_err);
            }
            Err(e).context("decoding image")
        }
    }
}

fn cmd_status() -> Result<()> {
    let config = Config::load().context("loading configuration")?;

    println!("Presence Monitor Status");
    println!("=======================");
    println!();

    println!("Configuration:");
    println!("  Smoothing window: {} frames", config.analyzer.window_capacity);
    println!(
        "  Look-away grace: {:.1}s",
        config.analyzer.look_away_grace_secs
    );
    println!("  Absence grace: {:.1}s", config.analyzer.absence_grace_secs);
    println!(
        "  Summary interval: {}s",
        config.analyzer.summary_interval.as_secs()
    );
    println!();

    let stats_path = config.data_path.join("transparency.json");
    if !stats_path.exists() {
        println!("No previous session data found.");
        return Ok(());
    }

    let stats = TransparencyLog::with_persistence(stats_path).stats();
    println!("Cumulative Statistics:");
    println!("  Frames analyzed: {}", stats.frames_analyzed);
    println!("  Frames with a face: {}", stats.faces_detected);
    println!("  Frames with a body: {}", stats.bodies_detected);
    println!("  Undecodable frames: {}", stats.decode_failures);
    println!("  Summaries exported: {}", stats.summaries_exported);
    Ok(())
}

fn cmd_export(output: Option<PathBuf>, format: &str) -> Result<()> {
    if format != "json" && format != "jsonl" {
        bail!("unknown export format {format:?} (expected json or jsonl)");
    }

    let config = Config::load().context("loading configuration")?;
    let export_dir = output.unwrap_or(config.export_path);

    let session_files: Vec<PathBuf> = std::fs::read_dir(&export_dir)
        .map(|entries| {
            entries
                .filter_map(|e| e.ok())
                .map(|e| e.path())
                .filter(|p| {
                    p.extension().map(|e| e == "json").unwrap_or(false)
                        && p.file_name()
                            .and_then(|n| n.to_str())
                            .map(|n| n.starts_with("session_"))
                            .unwrap_or(false)
                })
                .collect()
        })
        .unwrap_or_default();

    if session_files.is_empty() {
        println!("No session data found in {}", export_dir.display());
        println!("Run 'presence-monitor replay' to produce session summaries.");
        return Ok(());
    }

    println!(
        "Found {} session file(s) in {}",
        session_files.len(),
        export_dir.display()
    );

    let mut all_summaries: Vec<SessionSummary> = Vec::new();
    for file in &session_files {
        let content = match std::fs::read_to_string(file) {
            Ok(content) => content,
            Err(e) => {
                tracing::warn!("skipping {}: {}", file.display(), e);
                continue;
            }
        };
        match serde_json::from_str::<Vec<SessionSummary>>(&content) {
            Ok(summaries) => all_summaries.extend(summaries),
            Err(e) => tracing::warn!("skipping {}: {}", file.display(), e),
        }
    }
    all_summaries.sort_by(|a, b| a.recorded_at.cmp(&b.recorded_at));

    println!("Total summaries: {}", all_summaries.len());

    let output_path = export_dir.join(format!(
        "export_{}.{}",
        Utc::now().format("%Y%m%d_%H%M%S"),
        format
    ));

    let body = if format == "jsonl" {
        all_summaries
            .iter()
            .map(serde_json::to_string)
            .collect::<Result<Vec<_>, _>>()?
            .join("\n")
    } else {
        serde_json::to_string_pretty(&all_summaries)?
    };

    std::fs::write(&output_path, body)
        .with_context(|| format!("writing {}", output_path.display()))?;
    println!("Exported to {}", output_path.display());
    Ok(())
}

fn cmd_config() -> Result<()> {
    let config = Config::load().context("loading configuration")?;

    println!("Configuration");
    println!("=============");
    println!();
    println!("Config file: {}", Config::config_path().display());
    println!();
    println!("{}", serde_json::to_string_pretty(&config)?);
    Ok(())
}

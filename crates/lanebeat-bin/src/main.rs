// lanebeat: headless beatmap tool.
//
// Validates and normalizes beatmaps, plays them through the engine against a
// simulated track, and records new ones from input logs.

mod driver;

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use lanebeat_model::Beatmap;
use lanebeat_play::autoplay::autoplay_inputs;
use lanebeat_play::{EditorConfig, InputEvent, InputLogger, KeyInputLog, PlayConfig};
use log::{LevelFilter, info, warn};

use driver::{simulate_play, simulate_record};

#[derive(Parser, Debug)]
#[command(name = "lanebeat", about = "Lane rhythm game beatmap tool")]
struct Args {
    /// Enable debug logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to play config JSON file. Missing file means defaults.
    #[arg(long, global = true, default_value = "lanebeat.json", env = "LANEBEAT_CONFIG")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Validate a beatmap and print its stats.
    Check { beatmap: PathBuf },

    /// Cap notes per timestamp and write the result.
    Normalize {
        input: PathBuf,
        output: PathBuf,
        /// Overrides the configured cap.
        #[arg(long)]
        cap: Option<usize>,
    },

    /// Play a beatmap headlessly and report the result.
    Play {
        beatmap: PathBuf,
        /// Input log to play with.
        #[arg(long, conflicts_with = "autoplay")]
        inputs: Option<PathBuf>,
        /// Press every note perfectly.
        #[arg(long)]
        autoplay: bool,
        /// Write the inputs used to this path.
        #[arg(long)]
        save_inputs: Option<PathBuf>,
    },

    /// Record a beatmap from an input log.
    Record {
        inputs: PathBuf,
        output: PathBuf,
        /// Music asset id stored in the exported beatmap.
        #[arg(long)]
        music: String,
        /// Presses shorter than this become taps.
        #[arg(long, default_value_t = 200.0)]
        tap_threshold_ms: f64,
    },

    /// Write the default play config.
    InitConfig { output: PathBuf },
}

fn main() -> Result<()> {
    let args = Args::parse();

    env_logger::Builder::from_default_env()
        .filter_level(if args.verbose {
            LevelFilter::Debug
        } else {
            LevelFilter::Info
        })
        .init();

    let config = PlayConfig::load_from(&args.config)
        .with_context(|| format!("Failed to load config {}", args.config.display()))?;

    match args.command {
        Command::Check { beatmap } => check(&beatmap, &config),
        Command::Normalize { input, output, cap } => normalize(&input, &output, cap, &config),
        Command::Play {
            beatmap,
            inputs,
            autoplay,
            save_inputs,
        } => play(&beatmap, inputs.as_deref(), autoplay, save_inputs.as_deref(), config),
        Command::Record {
            inputs,
            output,
            music,
            tap_threshold_ms,
        } => record(&inputs, &output, &music, tap_threshold_ms, &config),
        Command::InitConfig { output } => {
            PlayConfig::default()
                .save_to(&output)
                .with_context(|| format!("Failed to write {}", output.display()))?;
            info!("Wrote default config to {}", output.display());
            Ok(())
        }
    }
}

fn load_beatmap(path: &Path, config: &PlayConfig) -> Result<Beatmap> {
    Beatmap::load_from(path, config.lane_count)
        .with_context(|| format!("Failed to load beatmap {}", path.display()))
}

fn check(path: &Path, config: &PlayConfig) -> Result<()> {
    let beatmap = load_beatmap(path, config)?;
    let holds = beatmap.notes().iter().filter(|n| n.is_hold()).count();
    println!("music:     {}", beatmap.music());
    println!("notes:     {} ({} taps, {} holds)", beatmap.len(), beatmap.len() - holds, holds);
    println!("length:    {}ms", beatmap.duration_ms());
    println!("max/time:  {}", beatmap.max_notes_per_timestamp());
    if let Some(cap) = config.combo_cap_per_timestamp
        && beatmap.max_notes_per_timestamp() > cap
    {
        warn!(
            "{} notes would be dropped by the cap of {}",
            beatmap.len() - beatmap.normalize(cap).len(),
            cap
        );
    }
    Ok(())
}

fn normalize(input: &Path, output: &Path, cap: Option<usize>, config: &PlayConfig) -> Result<()> {
    let beatmap = load_beatmap(input, config)?;
    let normalized = match cap.or(config.combo_cap_per_timestamp) {
        Some(0) => bail!("cap must be at least 1"),
        Some(cap) => beatmap.normalize(cap),
        None => beatmap,
    };
    normalized
        .save_to(output)
        .with_context(|| format!("Failed to write {}", output.display()))?;
    info!("Wrote {} notes to {}", normalized.len(), output.display());
    Ok(())
}

fn read_inputs(path: &Path, config: &PlayConfig) -> Result<Vec<InputEvent>> {
    let content =
        fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let logs: Vec<KeyInputLog> = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse input log {}", path.display()))?;

    let mut events: Vec<InputEvent> = logs
        .iter()
        .filter_map(|log| match log.to_event(&config.lane_map, config.lane_count) {
            Ok(event) => Some(event),
            Err(e) => {
                warn!("Skipping input: {}", e);
                None
            }
        })
        .collect();
    events.sort_by(|a, b| a.time_ms.total_cmp(&b.time_ms));
    Ok(events)
}

fn write_inputs(path: &Path, events: &[InputEvent]) -> Result<()> {
    let mut logger = InputLogger::new();
    for event in events {
        logger.record(*event);
    }
    let json = serde_json::to_string_pretty(logger.logs())?;
    fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))?;
    info!("Wrote {} input events to {}", logger.len(), path.display());
    Ok(())
}

fn play(
    path: &Path,
    inputs: Option<&Path>,
    autoplay: bool,
    save_inputs: Option<&Path>,
    config: PlayConfig,
) -> Result<()> {
    let beatmap = load_beatmap(path, &config)?;
    let events = match (inputs, autoplay) {
        (Some(log), _) => read_inputs(log, &config)?,
        (None, true) => autoplay_inputs(beatmap.notes()),
        (None, false) => Vec::new(),
    };
    if let Some(out) = save_inputs {
        write_inputs(out, &events)?;
    }

    let report = simulate_play(beatmap, config, &events)?;
    let summary = report.summary;
    println!(
        "{}",
        if report.cleared {
            "CLEARED"
        } else if report.game_over.is_some() {
            "GAME OVER"
        } else {
            "INCOMPLETE"
        }
    );
    if let Some(reason) = report.game_over {
        println!("reason:    {:?} at {:.0}ms", reason, report.end_position_ms);
    }
    println!("hits:      {}/{}", summary.hits, summary.total_notes);
    println!("misses:    {}", summary.misses);
    println!("streak:    {}", summary.best_streak);
    println!(
        "timing:    {} early / {} late",
        summary.timing.early_count, summary.timing.late_count
    );
    Ok(())
}

fn record(
    inputs: &Path,
    output: &Path,
    music: &str,
    tap_threshold_ms: f64,
    config: &PlayConfig,
) -> Result<()> {
    let editor = EditorConfig {
        lane_count: config.lane_count,
        tap_threshold_ms,
        ..Default::default()
    };
    let events = read_inputs(inputs, config)?;
    let beatmap = simulate_record(&events, music, editor)?;
    beatmap
        .save_to(output)
        .with_context(|| format!("Failed to write {}", output.display()))?;
    info!("Wrote {} notes to {}", beatmap.len(), output.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use lanebeat_model::{LaneMap, Note};
    use tempfile::tempdir;

    #[test]
    fn args_parse() {
        let args = Args::try_parse_from([
            "lanebeat", "-v", "play", "map.json", "--autoplay", "--save-inputs", "out.json",
        ])
        .unwrap();
        assert!(args.verbose);
        assert!(matches!(args.command, Command::Play { autoplay: true, .. }));

        assert!(
            Args::try_parse_from(["lanebeat", "play", "m.json", "--autoplay", "--inputs", "i.json"])
                .is_err()
        );
    }

    #[test]
    fn input_log_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("inputs.json");
        let events = vec![InputEvent::down(0, 100.0), InputEvent::up(0, 400.0)];
        write_inputs(&path, &events).unwrap();
        assert_eq!(read_inputs(&path, &PlayConfig::default()).unwrap(), events);
    }

    #[test]
    fn read_inputs_skips_bad_lanes_and_sorts() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("inputs.json");
        fs::write(
            &path,
            r#"[{"time_ms": 300, "lane": 1, "pressed": true},
                {"time_ms": 100, "lane": 9, "pressed": true},
                {"time_ms": 200, "lane": 0, "pressed": true}]"#,
        )
        .unwrap();
        let events = read_inputs(&path, &PlayConfig::default()).unwrap();
        assert_eq!(events, vec![InputEvent::down(0, 200.0), InputEvent::down(1, 300.0)]);
    }

    #[test]
    fn read_inputs_maps_key_names() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("inputs.json");
        fs::write(
            &path,
            r#"[{"time_ms": 100, "key": "j", "pressed": true},
                {"time_ms": 150, "key": "A", "pressed": true},
                {"time_ms": 200, "key": "j", "pressed": false}]"#,
        )
        .unwrap();
        let config = PlayConfig {
            lane_map: LaneMap::with_keys(&["F", "G", "H", "J"]),
            ..Default::default()
        };
        let events = read_inputs(&path, &config).unwrap();
        assert_eq!(events, vec![InputEvent::down(3, 100.0), InputEvent::up(3, 200.0)]);
    }

    #[test]
    fn record_then_normalize() {
        let dir = tempdir().unwrap();
        let inputs = dir.path().join("inputs.json");
        let recorded = dir.path().join("recorded.json");
        let normalized = dir.path().join("normalized.json");
        write_inputs(
            &inputs,
            &[
                InputEvent::down(0, 500.0),
                InputEvent::down(1, 500.0),
                InputEvent::down(2, 500.0),
                InputEvent::up(0, 550.0),
                InputEvent::up(1, 550.0),
                InputEvent::up(2, 900.0),
            ],
        )
        .unwrap();

        let config = PlayConfig::default();
        record(&inputs, &recorded, "song.ogg", 200.0, &config).unwrap();
        normalize(&recorded, &normalized, None, &config).unwrap();

        let beatmap = Beatmap::load_from(&normalized, 4).unwrap();
        assert_eq!(beatmap.music(), "song.ogg");
        assert_eq!(beatmap.notes(), &[Note::tap(0, 500), Note::tap(1, 500)]);
    }
}

//! Storyboard Timeline
//!
//! Headless previewer for storyboard timelines: inspect shot timecodes,
//! convert between time formats, and play a storyboard in real time with
//! an optional simulated audio track.

use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use storyboard_timeline::core::audio::{AudioSource, WallClockAudio};
use storyboard_timeline::core::grid::{
    format_time, grid_points_to_seconds, seconds_to_grid_points, smpte_to_grid_points,
};
use storyboard_timeline::core::sequence::{calculate_accumulated_time_to_scene, sequence_duration};
use storyboard_timeline::core::ticker::run_until_stopped;
use storyboard_timeline::state::EndBehavior;
use storyboard_timeline::utils::{parse_f64_input, parse_time_input};
use storyboard_timeline::{
    PlaybackListener, ShotCursor, StoryboardSnapshot, TickOutcome, TimeFormat, TimelineSession,
};

/// Storyboard Timeline - timeline grid and playback previewer
#[derive(Parser, Debug)]
#[command(name = "storyboard-timeline")]
#[command(about = "Inspect, convert and preview storyboard timelines")]
#[command(version)]
struct Args {
    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print every shot's global start and end timecode
    Inspect {
        /// Storyboard JSON file
        file: PathBuf,

        /// Override the project frame rate
        #[arg(long)]
        fps: Option<f64>,
    },

    /// Play a scene in real time, logging shot changes
    Play {
        /// Storyboard JSON file
        file: PathBuf,

        /// Scene to start from
        #[arg(long, default_value = "0")]
        scene: usize,

        /// Start position inside the scene (seconds or HH:MM:SS:FF)
        #[arg(long)]
        start: Option<String>,

        /// Simulate an audio track of this length and sync to it
        #[arg(long)]
        audio_duration: Option<f64>,

        /// Wrap around instead of stopping after the last shot
        #[arg(long = "loop")]
        looping: bool,

        /// Override the project frame rate
        #[arg(long)]
        fps: Option<f64>,
    },

    /// Convert a time (seconds or HH:MM:SS:FF) into every display format
    Convert {
        value: String,

        #[arg(long, default_value = "24")]
        fps: f64,
    },
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}

fn load_snapshot(file: &Path, fps: Option<f64>) -> Result<StoryboardSnapshot> {
    let mut snapshot = StoryboardSnapshot::load(file)
        .with_context(|| format!("failed to load storyboard {}", file.display()))?;
    if let Some(fps) = fps {
        snapshot.settings.fps = fps;
    }
    Ok(snapshot)
}

fn inspect(file: &Path, fps: Option<f64>) -> Result<()> {
    let snapshot = load_snapshot(file, fps)?;
    let fps = snapshot.settings.fps;
    let name = snapshot.name.clone();
    let session = TimelineSession::from_snapshot(snapshot);

    println!("{}", if name.is_empty() { "Untitled storyboard" } else { name.as_str() });
    for (index, scene) in session.scenes().iter().enumerate() {
        let heading = scene.name.as_deref().unwrap_or("(untitled)");
        println!(
            "scene {:>3}  {:<24} {:>3} shots  {}",
            index,
            heading,
            scene.images.len(),
            format_time(sequence_duration(&scene.images), TimeFormat::Smpte, fps)
        );
    }

    let timecodes = session.timecodes();
    for timed in &timecodes.shots {
        println!(
            "  {:>3}.{:<3} {} - {}  {}",
            timed.scene_index,
            timed.image_index,
            format_time(timed.start_time, TimeFormat::Smpte, fps),
            format_time(timed.end_time, TimeFormat::Smpte, fps),
            timed.shot.label.as_deref().unwrap_or("")
        );
    }
    println!(
        "total {} ({} frames)",
        format_time(timecodes.total_duration, TimeFormat::Smpte, fps),
        format_time(timecodes.total_duration, TimeFormat::Frames, fps)
    );
    Ok(())
}

fn convert(value: &str, fps: f64) -> Result<()> {
    let seconds = if value.contains(':') {
        grid_points_to_seconds(smpte_to_grid_points(value, fps)?)
    } else {
        let seconds = parse_f64_input(value, f64::NAN);
        if !seconds.is_finite() || seconds < 0.0 {
            bail!("`{}` is not a time in seconds or HH:MM:SS:FF", value);
        }
        seconds
    };

    println!("grid points  {}", seconds_to_grid_points(seconds));
    for format in TimeFormat::ALL {
        println!("{:<12} {}", format.label(), format_time(seconds, format, fps));
    }
    Ok(())
}

struct LogListener {
    fps: f64,
    scene_starts: Vec<f64>,
}

impl PlaybackListener for LogListener {
    fn on_active_shot_changed(&mut self, cursor: ShotCursor) {
        let scene_start = self.scene_starts.get(cursor.scene_index).copied().unwrap_or(0.0);
        info!(
            scene = cursor.scene_index,
            shot = cursor.image_index,
            scene_start = %format_time(scene_start, TimeFormat::Smpte, self.fps),
            "active shot"
        );
    }
}

struct PlayOptions {
    scene: usize,
    start: Option<String>,
    audio_duration: Option<f64>,
    looping: bool,
    fps: Option<f64>,
}

async fn play(file: &Path, options: PlayOptions) -> Result<()> {
    let mut snapshot = load_snapshot(file, options.fps)?;
    if options.looping {
        snapshot.settings.playback.end_behavior = EndBehavior::Loop;
    }
    let fps = snapshot.settings.fps;
    let mut session = TimelineSession::from_snapshot(snapshot);
    if options.scene >= session.scenes().len() {
        bail!(
            "scene {} out of range (storyboard has {} scenes)",
            options.scene,
            session.scenes().len()
        );
    }

    let scene_starts = (0..session.scenes().len())
        .map(|index| calculate_accumulated_time_to_scene(session.scenes(), index))
        .collect();
    let mut listener = LogListener { fps, scene_starts };

    let mut audio = options.audio_duration.map(|d| WallClockAudio::new(Some(d)));
    if let Some(duration) = audio.as_ref().and_then(|a| a.duration()) {
        session.attach_audio(duration);
    }

    let now = Instant::now();
    session.select_scene(options.scene, now, &mut listener);
    if let Some(start) = options.start.as_deref() {
        let time = parse_time_input(start, fps, 0.0);
        let outcome = session.seek_time(time, now, &mut listener);
        if let (Some(source), Some(audio_time)) = (audio.as_mut(), outcome.audio_time) {
            source.seek(audio_time);
        }
    }

    if !session.play(Instant::now()) {
        bail!("nothing to play in scene {}", options.scene);
    }
    if let Some(source) = audio.as_mut() {
        source.play();
    }
    info!(
        scene = options.scene,
        duration = %format_time(session.total_duration(), TimeFormat::Smpte, fps),
        audio = ?options.audio_duration,
        "playing"
    );

    let outcome = {
        let audio_source = audio.as_mut().map(|a| a as &mut dyn AudioSource);
        tokio::select! {
            outcome = run_until_stopped(&mut session, audio_source, &mut listener) => outcome,
            _ = tokio::signal::ctrl_c() => {
                info!("interrupted");
                TickOutcome::Idle
            }
        }
    };
    session.stop(Instant::now());

    info!(
        ?outcome,
        position = %session.format_master_time(TimeFormat::Smpte),
        progress = %format!("{:.1}%", session.global_progress()),
        "playback ended"
    );
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(&args.log_level);

    match args.command {
        Command::Inspect { file, fps } => inspect(&file, fps),
        Command::Convert { value, fps } => convert(&value, fps),
        Command::Play {
            file,
            scene,
            start,
            audio_duration,
            looping,
            fps,
        } => {
            play(
                &file,
                PlayOptions {
                    scene,
                    start,
                    audio_duration,
                    looping,
                    fps,
                },
            )
            .await
        }
    }
}

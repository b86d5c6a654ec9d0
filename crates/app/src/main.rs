use std::{
    path::{Path, PathBuf},
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    thread,
    time::Duration,
};

use clap::{Parser, Subcommand};
use scatter_visualiser_core::{
    AppConfig, AudioEngine, ChannelSource, FrameScheduler, ParameterHandle, Pipeline, RenderGraph,
    ToneGenerator, VisualiserError,
};
use tracing_subscriber::EnvFilter;

const TONE_LEFT_HZ: f32 = 220.0;
const TONE_RIGHT_HZ: f32 = 330.0;
const TONE_AMPLITUDE: f32 = 0.8;
const FEED_BLOCK: usize = 512;

fn main() -> scatter_visualiser_core::Result<()> {
    init_tracing();

    let cli = Cli::parse();

    match cli.command {
        Commands::Live {
            preset,
            frames,
            seed,
        } => run_live(preset.as_deref(), frames, seed),
        Commands::Snapshot {
            preset,
            seed,
            output,
        } => run_snapshot(preset.as_deref(), seed, &output),
    }
}

fn run_live(
    preset: Option<&Path>,
    frames: Option<u64>,
    seed: Option<u64>,
) -> scatter_visualiser_core::Result<()> {
    let config = load_config(preset)?;
    tracing::info!(?preset, ?frames, "starting live mode");

    let audio = AudioEngine::new(config.audio.frame_len);
    let source = audio.handle();
    let parameters = ParameterHandle::new(config.parameters)?;
    let mut scheduler = FrameScheduler::new(
        &config.scheduler,
        source,
        RenderGraph::new(),
        parameters,
        build_pipeline(&config, seed),
    )?;

    let feeding = Arc::new(AtomicBool::new(true));
    let feeder = {
        let feeding = feeding.clone();
        let sample_rate = config.audio.sample_rate;
        thread::spawn(move || feed_tone(&audio, sample_rate, &feeding))
    };

    let stats = scheduler.run(frames);
    feeding.store(false, Ordering::Relaxed);
    feeder
        .join()
        .map_err(|_| VisualiserError::msg("audio feeder thread panicked"))??;

    if let Some(output) = scheduler.sink().last_output() {
        tracing::info!(
            passes = stats.passes,
            late = stats.late_ticks,
            regular = output.regular.len(),
            quantized = output.quantized.len(),
            reaction = output.background.audio_reaction,
            "live mode finished"
        );
    }
    Ok(())
}

fn run_snapshot(
    preset: Option<&Path>,
    seed: Option<u64>,
    output: &Path,
) -> scatter_visualiser_core::Result<()> {
    let config = load_config(preset)?;
    tracing::info!(?preset, ?output, "rendering single pass snapshot");

    let audio = AudioEngine::new(config.audio.frame_len);
    let mut tone = ToneGenerator::new(
        TONE_LEFT_HZ,
        TONE_RIGHT_HZ,
        TONE_AMPLITUDE,
        config.audio.sample_rate,
    );
    let (left, right) = tone.next_block(config.audio.frame_len);
    audio.push_stereo(&left, &right)?;

    let frame = audio.handle().frame()?;
    let pass = build_pipeline(&config, seed).run_pass(&frame, &config.parameters, 0.0);
    std::fs::write(output, serde_json::to_string_pretty(&pass)?)?;

    tracing::info!(
        regular = pass.regular.len(),
        quantized = pass.quantized.len(),
        "snapshot written"
    );
    Ok(())
}

/// Stands in for a decoder: pushes the demo tone in real time until told
/// to stop.
fn feed_tone(
    audio: &AudioEngine,
    sample_rate: u32,
    feeding: &AtomicBool,
) -> scatter_visualiser_core::Result<()> {
    let mut tone = ToneGenerator::new(TONE_LEFT_HZ, TONE_RIGHT_HZ, TONE_AMPLITUDE, sample_rate);
    let block_duration = Duration::from_secs_f64(FEED_BLOCK as f64 / f64::from(sample_rate.max(1)));

    while feeding.load(Ordering::Relaxed) {
        let (left, right) = tone.next_block(FEED_BLOCK);
        audio.push_stereo(&left, &right)?;
        thread::sleep(block_duration);
    }
    Ok(())
}

fn load_config(preset: Option<&Path>) -> scatter_visualiser_core::Result<AppConfig> {
    match preset {
        Some(path) => AppConfig::load(path),
        None => Ok(AppConfig::live_defaults()),
    }
}

fn build_pipeline(config: &AppConfig, seed: Option<u64>) -> Pipeline {
    match seed {
        Some(seed) => Pipeline::seeded(config, seed),
        None => Pipeline::new(config),
    }
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .try_init();
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Audio-reactive stereo point-cloud visualiser", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Drive the frame scheduler against a generated stereo tone.
    Live {
        /// Optional JSON preset file to load on startup.
        #[arg(short, long)]
        preset: Option<PathBuf>,
        /// Stop after this many frames instead of running until interrupted.
        #[arg(short, long)]
        frames: Option<u64>,
        /// Seed for the point routing draws.
        #[arg(short, long)]
        seed: Option<u64>,
    },
    /// Run a single pass and write the resulting point lists as JSON.
    Snapshot {
        /// Optional JSON preset file to load on startup.
        #[arg(short, long)]
        preset: Option<PathBuf>,
        /// Seed for the point routing draws.
        #[arg(short, long)]
        seed: Option<u64>,
        /// Output path for the pass snapshot.
        output: PathBuf,
    },
}

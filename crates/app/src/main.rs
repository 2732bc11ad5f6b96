mod host;

use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use codefreq_core::{
    parse_feed, AppConfig, FrameScheduler, FrameSource, LaunchPlan, Renderer, SimulatedFrames,
};
use host::{ConsoleRenderer, FileLoader, PacedFrames};
use tracing_subscriber::EnvFilter;

fn main() -> codefreq_core::Result<()> {
    init_tracing();

    let cli = Cli::parse();

    match cli.command {
        Commands::Play { feed, run } => run_play(feed, &run),
        Commands::Simulate { feed, run } => run_simulate(feed, &run),
        Commands::Plan {
            feed,
            output,
            config,
        } => run_plan(&feed, &output, config.as_deref()),
    }
}

fn run_play(feed: PathBuf, run: &RunArgs) -> codefreq_core::Result<()> {
    let config = run.config()?;
    tracing::info!(feed = %feed.display(), fps = config.launch.fps, "starting playback");
    let mut frames = PacedFrames::new(config.launch.fps, run.frames);
    drive(config, feed, &mut frames, run)
}

fn run_simulate(feed: PathBuf, run: &RunArgs) -> codefreq_core::Result<()> {
    let config = run.config()?;
    tracing::info!(feed = %feed.display(), "simulating headless");
    let mut frames = SimulatedFrames::new(config.launch.fps);
    if let Some(limit) = run.frames {
        frames = frames.limit(limit);
    }
    drive(config, feed, &mut frames, run)
}

fn drive<S: FrameSource>(
    config: AppConfig,
    feed: PathBuf,
    frames: &mut S,
    run: &RunArgs,
) -> codefreq_core::Result<()> {
    let renderer = ConsoleRenderer::new(run.log_every);
    let mut scheduler = FrameScheduler::new(config, Box::new(FileLoader::new(feed)), renderer);

    while let Some(timestamp) = frames.next_frame() {
        scheduler.tick(timestamp)?;
        if !run.hold && scheduler.sequence_finished() {
            break;
        }
    }

    summarize(&scheduler);
    Ok(())
}

fn summarize<R: Renderer>(scheduler: &FrameScheduler<R>) {
    let tally = scheduler.machine().tally();
    tracing::info!(
        frames = scheduler.frames(),
        seconds = scheduler.elapsed() / 1000.0,
        periods = scheduler.machine().periods_revealed(),
        plus_sum = tally.plus_sum,
        minus_sum = tally.minus_sum,
        phase = ?scheduler.phase(),
        "finished"
    );
}

fn run_plan(feed: &Path, output: &Path, config: Option<&Path>) -> codefreq_core::Result<()> {
    let config = load_config(config)?;
    tracing::info!(feed = %feed.display(), output = %output.display(), "writing launch plan");

    let points = parse_feed(&std::fs::read_to_string(feed)?)?;
    let launch = &config.launch;
    let periods = points
        .iter()
        .map(|point| -> codefreq_core::Result<serde_json::Value> {
            let plan = LaunchPlan::for_point(point, launch.density(), launch.window_ms);
            Ok(serde_json::json!({
                "date": point.date_label()?,
                "additions": point.additions,
                "deletions": point.deletions,
                "plan": plan,
            }))
        })
        .collect::<codefreq_core::Result<Vec<_>>>()?;

    let file = std::fs::File::create(output)?;
    serde_json::to_writer_pretty(file, &periods)?;
    Ok(())
}

fn load_config(path: Option<&Path>) -> codefreq_core::Result<AppConfig> {
    match path {
        Some(path) => AppConfig::load(path),
        None => Ok(AppConfig::default()),
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
#[command(author, version, about = "Replays a repository's code frequency as particles", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Play the animation in real time.
    Play {
        /// JSON file of `[timestamp, additions, deletions]` rows.
        feed: PathBuf,
        #[command(flatten)]
        run: RunArgs,
    },
    /// Run the animation as fast as possible on a fixed frame step.
    Simulate {
        /// JSON file of `[timestamp, additions, deletions]` rows.
        feed: PathBuf,
        #[command(flatten)]
        run: RunArgs,
    },
    /// Write the per-period particle counts without animating.
    Plan {
        /// JSON file of `[timestamp, additions, deletions]` rows.
        feed: PathBuf,
        /// Where to write the plan.
        output: PathBuf,
        /// TOML configuration file.
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

#[derive(Args, Debug)]
struct RunArgs {
    /// TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Stop after this many frames.
    #[arg(short, long)]
    frames: Option<u64>,
    /// Seed for particle placement, overriding the configuration.
    #[arg(long)]
    seed: Option<u64>,
    /// Log a scene summary every N frames.
    #[arg(long, default_value_t = 60)]
    log_every: u64,
    /// Keep running after the last period has played out.
    #[arg(long)]
    hold: bool,
}

impl RunArgs {
    fn config(&self) -> codefreq_core::Result<AppConfig> {
        let mut config = load_config(self.config.as_deref())?;
        if self.seed.is_some() {
            config.seed = self.seed;
        }
        Ok(config)
    }
}

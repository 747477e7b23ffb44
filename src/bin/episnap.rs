use std::{
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
    thread,
};

use clap::{Args, CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use colored::Colorize;
use episnap::{
    AspectRatio, BatchSummary, CancellationToken, ContainerTagMetadata, EpisodeIdentity,
    GradientOptions, MetadataSource, OperationType, OverlayConfig, ProgressCallback, ProgressInfo,
    ScreenshotConfig, ScreenshotMaker, Settings, list_fonts, parse_timecode, plan_timestamps,
    process_directory,
};
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::json;

const CLI_AFTER_HELP: &str = "Examples:\n  episnap run ./source --count 5 --season-label --gradient\n  episnap run ./source --aspect 4:3 --no-titles --no-overwrite --progress\n  episnap plan 00:42:10 --count 4\n  episnap identify Show.S01E02.Title.mkv --json\n  episnap completions zsh > _episnap";

#[derive(Debug, Parser)]
#[command(
    name = "episnap",
    version,
    about = "Capture titled screenshots from episode video files",
    after_help = CLI_AFTER_HELP
)]
struct Cli {
    #[command(flatten)]
    global: GlobalOptions,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Args, Clone)]
struct GlobalOptions {
    /// Settings file (JSON). A missing file means defaults.
    #[arg(long, global = true, default_value = "episnap.json")]
    config: PathBuf,

    /// Show debug logging output.
    #[arg(long, global = true)]
    verbose: bool,

    /// Show a progress bar per video.
    #[arg(long, global = true)]
    progress: bool,
}

#[derive(Debug, Args)]
struct RunArgs {
    /// Directory scanned recursively for videos.
    #[arg(default_value = "./source")]
    source: PathBuf,

    /// Screenshots per video.
    #[arg(long, default_value_t = 3, value_parser = clap::value_parser!(u32).range(1..))]
    count: u32,

    /// Output aspect ratio (16:9 or 4:3). Overrides the settings file.
    #[arg(long)]
    aspect: Option<String>,

    /// Leave existing screenshots untouched.
    #[arg(long)]
    no_overwrite: bool,

    /// Skip contrast / color / brightness / sharpness enhancement.
    #[arg(long)]
    no_enhance: bool,

    /// Skip letterbox removal.
    #[arg(long)]
    no_letterbox: bool,

    /// Do not draw episode titles.
    #[arg(long)]
    no_titles: bool,

    /// Font file for the title (defaults to the first font in --fonts-dir).
    #[arg(long)]
    title_font: Option<String>,

    /// Font file for the season/episode label (defaults to the title font).
    #[arg(long)]
    season_font: Option<String>,

    /// Draw "Season NN – Episode NN" above the title.
    #[arg(long)]
    season_label: bool,

    /// Composite a bottom gradient behind the text.
    #[arg(long)]
    gradient: bool,

    /// Use the strong gradient variant (implies --gradient).
    #[arg(long)]
    strong_gradient: bool,

    /// Directory holding font files.
    #[arg(long, default_value = "./fonts")]
    fonts_dir: PathBuf,

    /// Directory holding gradient images.
    #[arg(long, default_value = "./gradients")]
    gradients_dir: PathBuf,

    /// Directory under which output/<show>/Season <NN>/ is created.
    #[arg(long, default_value = ".")]
    output_root: PathBuf,

    /// Video file extension to look for.
    #[arg(long, default_value = "mkv")]
    extension: String,

    /// Read durations in-process through libav instead of ffprobe.
    #[cfg(feature = "libav")]
    #[arg(long)]
    libav_probe: bool,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Screenshot every video under a directory.
    #[command(
        about = "Capture screenshots for a directory of videos",
        after_help = "Examples:\n  episnap run\n  episnap run ./source --count 5 --title-font Roboto-Bold.ttf --season-label"
    )]
    Run(RunArgs),

    /// Print the timestamps that would be captured.
    #[command(
        about = "Print a timestamp plan",
        after_help = "Examples:\n  episnap plan 600\n  episnap plan 00:42:10 --count 5"
    )]
    Plan {
        /// Duration in seconds, MM:SS or HH:MM:SS.
        duration: String,
        /// Screenshots per video.
        #[arg(long, default_value_t = 3, value_parser = clap::value_parser!(u32).range(1..))]
        count: u32,
    },

    /// List the fonts available for titles.
    #[command(about = "List available fonts")]
    Fonts {
        /// Directory holding font files.
        #[arg(long, default_value = "./fonts")]
        fonts_dir: PathBuf,
    },

    /// Print the episode identity resolved for a video.
    #[command(
        about = "Print episode metadata",
        after_help = "Examples:\n  episnap identify Show.S01E02.Title.mkv\n  episnap identify episode.mkv --json"
    )]
    Identify {
        /// Video file.
        input: PathBuf,
        /// Output metadata as machine-readable JSON.
        #[arg(long)]
        json: bool,
    },

    /// Generate shell completion scripts.
    #[command(about = "Generate shell completions")]
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Prints a header per video and, optionally, a progress bar.
struct TerminalProgress {
    show_bar: bool,
    bar: Mutex<Option<ProgressBar>>,
}

impl TerminalProgress {
    fn new(show_bar: bool) -> Self {
        Self {
            show_bar,
            bar: Mutex::new(None),
        }
    }
}

impl ProgressCallback for TerminalProgress {
    fn on_episode_start(&self, _video: &Path, identity: &EpisodeIdentity, aspect: AspectRatio) {
        println!(
            "\n{} {}",
            "Taking screenshots for:".green().bold(),
            identity.show_name.yellow()
        );
        println!("{} {}", "Season:".green().bold(), identity.season_number.yellow());
        println!("{} {}", "Episode:".green().bold(), identity.episode_number.yellow());
        println!("{} {}", "Title:".green().bold(), identity.episode_title.yellow());
        println!("{} {}", "Aspect Ratio:".green().bold(), aspect.to_string().yellow());
    }

    fn on_progress(&self, info: &ProgressInfo) {
        if !self.show_bar || info.operation != OperationType::ScreenshotCapture {
            return;
        }
        let Ok(mut slot) = self.bar.lock() else {
            return;
        };

        let bar = slot.get_or_insert_with(|| {
            let bar = ProgressBar::new(info.total.unwrap_or(0));
            if let Ok(style) =
                ProgressStyle::with_template("{spinner:.green} {bar:40.cyan/blue} {pos}/{len} {msg}")
            {
                bar.set_style(style.progress_chars("##-"));
            }
            bar.set_message("Taking screenshots...");
            bar
        });
        bar.set_position(info.current);

        if info.total.is_some_and(|total| info.current >= total) {
            bar.finish_with_message("done");
            *slot = None;
        }
    }
}

fn init_logging(verbose: bool, settings: &Settings) {
    let filter = if verbose {
        "debug".to_string()
    } else {
        settings.logging.level.clone()
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(filter)).init();
}

/// Cancel `token` on the first Ctrl-C; exit on the second.
fn install_interrupt_handler(token: CancellationToken) {
    thread::spawn(move || {
        let runtime = match tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
        {
            Ok(runtime) => runtime,
            Err(error) => {
                log::warn!("Ctrl-C handling unavailable: {error}");
                return;
            }
        };
        runtime.block_on(async move {
            if tokio::signal::ctrl_c().await.is_err() {
                return;
            }
            eprintln!(
                "\n{} {}",
                "interrupted:".red().bold(),
                "finishing the current screenshot, press Ctrl-C again to quit".red()
            );
            token.cancel();

            if tokio::signal::ctrl_c().await.is_ok() {
                eprintln!("{}", "Process interrupted by user. Goodbye.".red().bold());
                std::process::exit(130);
            }
        });
    });
}

/// First line green, failure details red.
fn print_summary(summary: &BatchSummary) {
    let text = summary.to_string();
    let mut lines = text.lines();
    if let Some(headline) = lines.next() {
        println!("\n{}", headline.green().bold());
    }
    for line in lines {
        println!("{}", line.red());
    }
}

fn parse_aspect(value: &str) -> Result<AspectRatio, Box<dyn std::error::Error>> {
    Ok(value.parse::<AspectRatio>()?)
}

fn resolve_title_font(args: &RunArgs) -> Result<String, Box<dyn std::error::Error>> {
    if let Some(font) = &args.title_font {
        return Ok(font.clone());
    }
    let fonts = list_fonts(&args.fonts_dir).unwrap_or_default();
    fonts.into_iter().next().ok_or_else(|| {
        format!(
            "No fonts available in '{}'. Add font files, pass --title-font, or use --no-titles.",
            args.fonts_dir.display()
        )
        .into()
    })
}

fn build_config(
    args: &RunArgs,
    settings: &Settings,
) -> Result<ScreenshotConfig, Box<dyn std::error::Error>> {
    let mut config = ScreenshotConfig::new()
        .with_count(args.count)
        .with_overwrite(!args.no_overwrite)
        .with_enhance(!args.no_enhance)
        .with_letterbox_removal(!args.no_letterbox)
        .with_output_root(&args.output_root);

    if !args.no_titles {
        let title_font = resolve_title_font(args)?;
        let season_font = args.season_font.clone().unwrap_or_else(|| title_font.clone());
        let mut overlay = OverlayConfig::new(title_font)
            .with_fonts_directory(&args.fonts_dir)
            .with_gradient(GradientOptions {
                enabled: false,
                strong: false,
                directory: args.gradients_dir.clone(),
            });
        if args.season_label {
            overlay = overlay.with_season_label(season_font);
        }
        config = config.with_overlay(overlay);
    }

    // File values first, flags on top.
    config = settings.apply_to(config);

    if let Some(aspect) = &args.aspect {
        config = config.with_aspect_ratio(parse_aspect(aspect)?);
    }
    if let Some(overlay) = config.overlay().cloned() {
        let mut overlay = overlay;
        if args.gradient || args.strong_gradient {
            overlay.gradient.enabled = true;
        }
        if args.strong_gradient {
            overlay.gradient.strong = true;
        }
        config = config.with_overlay(overlay);
    }

    Ok(config)
}

#[cfg_attr(not(feature = "libav"), allow(unused_variables))]
fn build_maker(args: &RunArgs, config: ScreenshotConfig, settings: &Settings) -> ScreenshotMaker {
    #[cfg(feature = "libav")]
    if args.libav_probe {
        let mut context =
            episnap::RunContext::from_tools(&settings.tools).with_probe(episnap::LibavProbe::new());
        if let Some(overlay) = config.overlay() {
            context = context.with_fonts(overlay.font_directory());
        }
        return ScreenshotMaker::with_context(config, context);
    }
    ScreenshotMaker::with_tools(config, &settings.tools)
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let settings = Settings::load(&cli.global.config)?;
    init_logging(cli.global.verbose, &settings);

    match cli.command {
        Commands::Run(args) => {
            let token = CancellationToken::new();
            install_interrupt_handler(token.clone());

            let config = build_config(&args, &settings)?
                .with_progress(Arc::new(TerminalProgress::new(cli.global.progress)))
                .with_cancellation(token);
            let maker = build_maker(&args, config, &settings);

            let summary = process_directory(&maker, &args.source, &args.extension)?;
            print_summary(&summary);
        }
        Commands::Plan { duration, count } => {
            let seconds = parse_timecode(&duration)?;
            for (index, timestamp) in plan_timestamps(seconds, count)?.iter().enumerate() {
                println!("{:>3}  {timestamp}", index + 1);
            }
        }
        Commands::Fonts { fonts_dir } => {
            let fonts = list_fonts(&fonts_dir)?;
            if fonts.is_empty() {
                eprintln!(
                    "{} {}",
                    "warning:".yellow().bold(),
                    format!("no fonts found in {}", fonts_dir.display()).yellow()
                );
            }
            for font in fonts {
                println!("{font}");
            }
        }
        Commands::Identify { input, json } => {
            let identity = ContainerTagMetadata::new()
                .with_program(&settings.tools.ffprobe)
                .identify(&input)?;
            if json {
                let payload = json!({
                    "show": identity.show_name,
                    "season": identity.season_number,
                    "episode": identity.episode_number,
                    "title": identity.episode_title,
                    "code": identity.episode_code(),
                });
                println!("{}", serde_json::to_string_pretty(&payload)?);
            } else {
                println!("Show: {}", identity.show_name);
                println!("Season: {}", identity.padded_season());
                println!("Episode: {}", identity.padded_episode());
                println!("Title: {}", identity.episode_title);
            }
        }
        Commands::Completions { shell } => {
            let mut command = Cli::command();
            clap_complete::generate(shell, &mut command, "episnap", &mut std::io::stdout());
        }
    }

    Ok(())
}

fn main() {
    if let Err(error) = run() {
        eprintln!("{} {error}", "error:".red().bold());
        std::process::exit(1);
    }
}

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Parser, Debug)]
#[command(name = "etchwork", version, about = "Render seeded etched-line sketches")]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace). `RUST_LOG` takes precedence.
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render a single frame as a PNG.
    Frame(FrameArgs),
    /// Render a frame range as a numbered PNG sequence.
    Export(ExportArgs),
    /// Print a built-in sketch config as JSON.
    Preset(PresetArgs),
}

#[derive(Args, Debug)]
struct SourceArgs {
    /// Sketch config JSON. Defaults to the built-in preset.
    #[arg(long = "in")]
    in_path: Option<PathBuf>,

    /// Built-in preset used when `--in` is not given.
    #[arg(long, value_enum, default_value_t = PresetChoice::HolidayCard)]
    preset: PresetChoice,

    /// Directory overlay images and fonts are resolved against.
    /// Defaults to the config's directory, or the working directory for presets.
    #[arg(long)]
    assets: Option<PathBuf>,

    /// Draw green layout guides over every frame.
    #[arg(long)]
    debug_guides: bool,

    /// Override motion-blur sub-samples (0 disables).
    #[arg(long)]
    motion_blur: Option<u32>,
}

#[derive(Args, Debug)]
struct FrameArgs {
    #[command(flatten)]
    source: SourceArgs,

    /// Frame index (0-based).
    #[arg(long, default_value_t = 0)]
    frame: u64,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,

    /// Print how many font faces were available for text overlays.
    #[arg(long)]
    dump_fonts: bool,
}

#[derive(Args, Debug)]
struct ExportArgs {
    #[command(flatten)]
    source: SourceArgs,

    /// Output directory for `frameNNN.png` files.
    #[arg(long)]
    out_dir: PathBuf,

    /// First frame (inclusive).
    #[arg(long, default_value_t = 0)]
    start: u64,

    /// Last frame (exclusive). Defaults to one full loop.
    #[arg(long)]
    end: Option<u64>,

    /// Render frames on a rayon pool.
    #[arg(long, default_value_t = false)]
    parallel: bool,

    /// Override rayon worker threads (parallel mode only).
    #[arg(long)]
    threads: Option<usize>,
}

#[derive(Args, Debug)]
struct PresetArgs {
    #[arg(value_enum, default_value_t = PresetChoice::HolidayCard)]
    name: PresetChoice,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum PresetChoice {
    /// Three bands with dripping beads.
    HolidayCard,
    /// Same card, with beads kept out of the title area.
    HolidayCardExclusion,
}

impl PresetChoice {
    fn config(self) -> etchwork::SketchConfig {
        match self {
            Self::HolidayCard => etchwork::presets::holiday_card(),
            Self::HolidayCardExclusion => etchwork::presets::holiday_card_exclusion_zone(),
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    match cli.cmd {
        Command::Frame(args) => cmd_frame(args),
        Command::Export(args) => cmd_export(args),
        Command::Preset(args) => cmd_preset(args),
    }
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "etchwork=debug",
        _ => "etchwork=trace",
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Config plus the directory its assets resolve against.
fn load_source(args: &SourceArgs) -> anyhow::Result<(etchwork::SketchConfig, PathBuf)> {
    let (mut config, default_root) = match &args.in_path {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("read config '{}'", path.display()))?;
            let config = etchwork::SketchConfig::from_json(&text)
                .with_context(|| format!("parse config '{}'", path.display()))?;
            let root = path
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| PathBuf::from("."));
            (config, root)
        }
        None => (args.preset.config(), PathBuf::from(".")),
    };

    if args.debug_guides {
        config.debug_guides = true;
    }
    if let Some(samples) = args.motion_blur {
        config.motion_blur.samples = samples;
    }
    config.validate().context("validate config")?;

    let root = args.assets.clone().unwrap_or(default_root);
    Ok((config, root))
}

fn cmd_frame(args: FrameArgs) -> anyhow::Result<()> {
    let (config, root) = load_source(&args.source)?;
    let assets = etchwork::AssetStore::prepare(&config, &root)?;
    if args.dump_fonts {
        eprintln!("font faces: {}", assets.font_faces());
        eprintln!("prepared overlays: {}/{}", assets.len(), config.overlays.len());
    }

    let mut backend =
        etchwork::create_backend(etchwork::BackendKind::Cpu, &etchwork::RenderSettings::default());
    let frame = etchwork::render_frame(
        &config,
        etchwork::FrameIndex(args.frame),
        backend.as_mut(),
        &assets,
    )?;

    if let Some(parent) = args.out.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    etchwork::write_png(&args.out, &frame)?;

    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn cmd_export(args: ExportArgs) -> anyhow::Result<()> {
    let (config, root) = load_source(&args.source)?;
    let assets = etchwork::AssetStore::prepare(&config, &root)?;

    let end = args.end.unwrap_or(config.total_steps);
    let opts = etchwork::ExportOpts {
        range: etchwork::FrameRange::new(
            etchwork::FrameIndex(args.start),
            etchwork::FrameIndex(end),
        )?,
        threading: etchwork::RenderThreading {
            parallel: args.parallel,
            threads: args.threads,
        },
        ..etchwork::ExportOpts::default()
    };

    let mut backend =
        etchwork::create_backend(etchwork::BackendKind::Cpu, &etchwork::RenderSettings::default());
    let stats =
        etchwork::export_png_sequence(&config, &args.out_dir, &opts, backend.as_mut(), &assets)?;

    eprintln!(
        "wrote {} frames to {}",
        stats.frames_written,
        args.out_dir.display()
    );
    Ok(())
}

fn cmd_preset(args: PresetArgs) -> anyhow::Result<()> {
    let json = args.name.config().to_json_pretty()?;
    println!("{json}");
    Ok(())
}

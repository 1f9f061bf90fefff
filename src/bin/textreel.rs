use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context as _;
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use textreel::{
    BackgroundStyle, CaptureSettings, EncoderBackend, FfmpegBackend, FrameScheduler,
    InMemoryBackend, PREFERRED_FORMATS, RealtimeScheduler, RecordingConfig, RenderConfig,
    ResolutionPreset, SceneRenderer, SessionConfig, SessionController, SessionEvent,
    SimulatedScheduler, Surface, TimelineConfig,
};

#[derive(Parser, Debug)]
#[command(name = "textreel", version)]
struct Cli {
    /// Extra directory to load fonts from (repeatable).
    #[arg(long = "fonts-dir", global = true)]
    fonts_dirs: Vec<PathBuf>,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render the scene at one instant as a PNG.
    Frame(FrameArgs),
    /// Print the draw plan for one instant as JSON.
    Plan(PlanArgs),
    /// Record the animation into a video file.
    Record(RecordArgs),
    /// List output formats and whether the encoder backend supports them.
    Formats(FormatsArgs),
}

#[derive(Parser, Debug)]
struct SceneArgs {
    /// Title text. Empty shows the placeholder.
    #[arg(long, default_value = "")]
    title: String,

    /// Optional subtitle text.
    #[arg(long, default_value = "")]
    subtitle: String,

    /// Background style: aurora, particles or waves.
    #[arg(long, default_value_t = BackgroundStyle::Aurora)]
    background: BackgroundStyle,

    /// Resolution preset: 480p, 720p, 1080p or square.
    #[arg(long, default_value = "720p")]
    resolution: ResolutionPreset,
}

impl SceneArgs {
    fn render_config(&self) -> anyhow::Result<RenderConfig> {
        let cfg = RenderConfig::new(
            self.title.clone(),
            self.subtitle.clone(),
            self.background,
            self.resolution,
        );
        cfg.validate()?;
        Ok(cfg)
    }
}

#[derive(Parser, Debug)]
struct FrameArgs {
    #[command(flatten)]
    scene: SceneArgs,

    /// Animation time in milliseconds.
    #[arg(long, default_value_t = 0.0)]
    time_ms: f64,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,
}

#[derive(Parser, Debug)]
struct PlanArgs {
    #[command(flatten)]
    scene: SceneArgs,

    /// Animation time in milliseconds.
    #[arg(long, default_value_t = 0.0)]
    time_ms: f64,
}

#[derive(Parser, Debug)]
struct RecordArgs {
    /// Recording config JSON. Overrides the scene and timing flags.
    #[arg(long)]
    config: Option<PathBuf>,

    #[command(flatten)]
    scene: SceneArgs,

    /// Duration in seconds (1-30).
    #[arg(long, default_value_t = 5)]
    duration: u32,

    /// Frames per second (10-60).
    #[arg(long, default_value_t = 30)]
    fps: u32,

    /// Target bitrate in bits per second.
    #[arg(long)]
    bitrate: Option<u32>,

    /// Encoder backend.
    #[arg(long, value_enum, default_value_t = EncoderChoice::Ffmpeg)]
    encoder: EncoderChoice,

    /// Drive the clock with simulated time instead of the wall clock.
    #[arg(long)]
    fast: bool,

    /// Stop the recording early after this many wall-clock milliseconds.
    #[arg(long)]
    stop_after: Option<u64>,

    /// Output directory for the recorded file.
    #[arg(long, default_value = ".")]
    out: PathBuf,
}

#[derive(Parser, Debug)]
struct FormatsArgs {
    #[arg(long, value_enum, default_value_t = EncoderChoice::Ffmpeg)]
    encoder: EncoderChoice,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum EncoderChoice {
    /// Pipe frames through `ffmpeg` (must be on PATH).
    Ffmpeg,
    /// In-process digest stream; no real video, useful for dry runs.
    Memory,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let font_dirs: Vec<&Path> = cli.fonts_dirs.iter().map(PathBuf::as_path).collect();
    match cli.cmd {
        Command::Frame(args) => cmd_frame(args, &font_dirs),
        Command::Plan(args) => cmd_plan(args),
        Command::Record(args) => cmd_record(args, &font_dirs),
        Command::Formats(args) => cmd_formats(args),
    }
}

fn make_backend(choice: EncoderChoice) -> anyhow::Result<Box<dyn EncoderBackend>> {
    Ok(match choice {
        EncoderChoice::Ffmpeg => Box::new(
            FfmpegBackend::probe().context("probe ffmpeg (is it installed and on PATH?)")?,
        ),
        EncoderChoice::Memory => Box::new(InMemoryBackend::new()),
    })
}

fn cmd_frame(args: FrameArgs, font_dirs: &[&Path]) -> anyhow::Result<()> {
    let cfg = args.scene.render_config()?;
    let mut renderer = SceneRenderer::with_font_dirs(font_dirs);
    let mut surface = Surface::new(cfg.canvas())?;
    renderer.render(&mut surface, args.time_ms, &cfg)?;

    let rgba = surface.to_opaque_rgba8([0, 0, 0, 255])?;
    if let Some(parent) = args.out.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    image::save_buffer_with_format(
        &args.out,
        &rgba,
        surface.width(),
        surface.height(),
        image::ColorType::Rgba8,
        image::ImageFormat::Png,
    )
    .with_context(|| format!("write png '{}'", args.out.display()))?;

    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn cmd_plan(args: PlanArgs) -> anyhow::Result<()> {
    let cfg = args.scene.render_config()?;
    let plan = textreel::compose_scene(args.time_ms, &cfg);
    println!("{}", plan.to_json_pretty()?);
    Ok(())
}

fn session_config(args: &RecordArgs) -> anyhow::Result<SessionConfig> {
    if let Some(path) = &args.config {
        let rc = RecordingConfig::from_path(path)?;
        return Ok(SessionConfig::try_from(rc)?);
    }
    let capture = match args.bitrate {
        Some(bitrate_bps) => CaptureSettings { bitrate_bps },
        None => CaptureSettings::default(),
    };
    let cfg = SessionConfig {
        render: args.scene.render_config()?,
        timeline: TimelineConfig::new(args.duration, args.fps)?,
        capture,
    };
    cfg.validate()?;
    Ok(cfg)
}

fn cmd_record(args: RecordArgs, font_dirs: &[&Path]) -> anyhow::Result<()> {
    let cfg = session_config(&args)?;
    let fps = cfg.timeline.frames_per_second;
    let scheduler: Box<dyn FrameScheduler> = if args.fast {
        Box::new(SimulatedScheduler::at_fps(fps))
    } else {
        Box::new(RealtimeScheduler::new())
    };
    let backend = make_backend(args.encoder)?;

    let mut session = SessionController::new(cfg, scheduler, backend)?
        .with_renderer(SceneRenderer::with_font_dirs(font_dirs));

    let mut last_decile = 0u32;
    session.set_observer(move |ev| match ev {
        SessionEvent::Progress { fraction, .. } => {
            let decile = (fraction * 10.0).floor() as u32;
            if decile > last_decile {
                last_decile = decile;
                eprintln!("recording {:>3.0}%", fraction * 100.0);
            }
        }
        SessionEvent::Error { message } => eprintln!("error: {message}"),
        _ => {}
    });

    if !session.start()? {
        anyhow::bail!("session could not start");
    }

    if let Some(ms) = args.stop_after {
        let signal = session.stop_signal();
        std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(ms));
            signal.raise();
        });
    }

    let artifact = session
        .run_until_complete()?
        .cloned()
        .context("recording finished without an artifact")?;
    let path = session.save_artifact(&args.out)?;
    if !artifact.is_clean() {
        eprintln!(
            "warning: the encoder reported errors, {} may be truncated",
            path.display()
        );
    }

    eprintln!(
        "wrote {} ({}, {}, {} frames)",
        path.display(),
        artifact.mime_type,
        human_size(artifact.size_bytes),
        session.frames_rendered()
    );
    Ok(())
}

fn cmd_formats(args: FormatsArgs) -> anyhow::Result<()> {
    let backend = make_backend(args.encoder)?;
    println!("backend: {}", backend.name());
    for format in PREFERRED_FORMATS {
        let mark = if backend.supports(&format) { "yes" } else { "no" };
        println!("  {:<28} .{:<5} {mark}", format.mime_type, format.extension);
    }
    Ok(())
}

fn human_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KiB", "MiB", "GiB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit + 1 < UNITS.len() {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{bytes} B")
    } else {
        format!("{value:.1} {}", UNITS[unit])
    }
}

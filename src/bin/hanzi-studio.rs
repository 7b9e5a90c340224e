use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Parser, Subcommand, ValueEnum};

use hanzi_studio::export::batch::TracingObserver;
use hanzi_studio::render::svg::step_sheet_svg;
use hanzi_studio::{
    Container, FailurePolicy, FfmpegBackend, FfmpegTranscoder, GlyphDataSource, GridMode,
    Orientation, PageSize, PdfRequest, SourceMode, StageParams, StageRenderer, StageState,
    StudioConfig, Transcoder, VideoBlob,
};

#[derive(Parser, Debug)]
#[command(name = "hanzi-studio", version)]
struct Cli {
    /// JSON configuration file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log filter, overriding the configuration (e.g. `debug`).
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render the stage as a PNG at a point of the animation.
    Frame(FrameArgs),
    /// Write an SVG sheet of cumulative stroke thumbnails.
    Steps(StepsArgs),
    /// Export the stroke animation as a video (requires `ffmpeg` on PATH).
    Video(VideoArgs),
    /// Export the stroke animation as a looping GIF.
    Gif(GifArgs),
    /// Export one video per character into a zip archive.
    Batch(BatchArgs),
    /// Generate a printable practice worksheet.
    Pdf(PdfArgs),
}

#[derive(Parser, Debug)]
struct FrameArgs {
    /// Character to draw.
    #[arg(long = "char")]
    character: String,

    /// Animation time in milliseconds; omitted renders the resting stage.
    #[arg(long)]
    at_ms: Option<f64>,

    /// Stage size in pixels.
    #[arg(long)]
    size: Option<u32>,

    /// Grid mode (3x3, 2x2, mi, zhong, hui).
    #[arg(long)]
    grid: Option<String>,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,
}

#[derive(Parser, Debug)]
struct StepsArgs {
    #[arg(long = "char")]
    character: String,

    /// Thumbnail side in pixels.
    #[arg(long, default_value_t = 80.0)]
    thumb: f64,

    #[arg(long, default_value_t = 8)]
    per_row: usize,

    #[arg(long, default_value_t = 6.0)]
    gap: f64,

    /// Output SVG path.
    #[arg(long)]
    out: PathBuf,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ContainerChoice {
    Mp4,
    Webm,
}

impl From<ContainerChoice> for Container {
    fn from(c: ContainerChoice) -> Self {
        match c {
            ContainerChoice::Mp4 => Container::Mp4,
            ContainerChoice::Webm => Container::Webm,
        }
    }
}

#[derive(Parser, Debug)]
struct VideoArgs {
    #[arg(long = "char")]
    character: String,

    #[arg(long, value_enum)]
    container: Option<ContainerChoice>,

    /// Output file, or a directory to write `<generated name>.<ext>` into.
    #[arg(long)]
    out: PathBuf,
}

#[derive(Parser, Debug)]
struct GifArgs {
    #[arg(long = "char")]
    character: String,

    /// Output file, or a directory.
    #[arg(long)]
    out: PathBuf,
}

#[derive(Parser, Debug)]
struct BatchArgs {
    /// Characters to export; whitespace and duplicates are ignored.
    #[arg(long)]
    chars: String,

    /// Leave out characters that fail instead of aborting.
    #[arg(long)]
    skip_failed: bool,

    /// Convert non-MP4 clips to MP4 before archiving.
    #[arg(long)]
    transcode: bool,

    /// Output directory for the archive.
    #[arg(long)]
    out: PathBuf,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum PdfLayoutChoice {
    /// One worksheet for the whole request.
    Single,
    /// One single-character sheet per character in one document.
    Combined,
    /// One single-character PDF per character, zipped.
    Zip,
}

#[derive(Parser, Debug)]
struct PdfArgs {
    #[arg(long)]
    chars: String,

    /// Cell source: `selected` repeats the first character, `sequence` walks the input.
    #[arg(long)]
    mode: Option<String>,

    #[arg(long, value_enum, default_value_t = PdfLayoutChoice::Single)]
    layout: PdfLayoutChoice,

    /// `A4` or `Letter`.
    #[arg(long)]
    page: Option<String>,

    #[arg(long)]
    landscape: bool,

    #[arg(long)]
    columns: Option<u32>,

    #[arg(long)]
    title: Option<String>,

    /// TrueType/OpenType font for non-Latin footer text.
    #[arg(long)]
    font: Option<PathBuf>,

    /// Output directory.
    #[arg(long)]
    out: PathBuf,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mut cfg = StudioConfig::load_or_default(cli.config.as_deref())?;
    if let Some(level) = cli.log_level {
        cfg.logging.level = level;
    }
    hanzi_studio::logging::init_logging(&cfg.logging);

    let mut source = GlyphDataSource::from_config(&cfg.glyphs)?;
    match cli.cmd {
        Command::Frame(args) => cmd_frame(args, &cfg, &mut source),
        Command::Steps(args) => cmd_steps(args, &cfg, &mut source),
        Command::Video(args) => cmd_video(args, &cfg, &mut source),
        Command::Gif(args) => cmd_gif(args, &cfg, &mut source),
        Command::Batch(args) => cmd_batch(args, &cfg, &mut source),
        Command::Pdf(args) => cmd_pdf(args, &cfg, &mut source),
    }
}

fn write_output(path: &Path, bytes: &[u8]) -> anyhow::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    std::fs::write(path, bytes).with_context(|| format!("write '{}'", path.display()))?;
    eprintln!("wrote {}", path.display());
    Ok(())
}

/// `out` itself, or `out/<name>` when `out` is an existing directory.
fn resolve_out(out: &Path, name: &str) -> PathBuf {
    if out.is_dir() {
        out.join(name)
    } else {
        out.to_path_buf()
    }
}

fn cmd_frame(args: FrameArgs, cfg: &StudioConfig, source: &mut GlyphDataSource) -> anyhow::Result<()> {
    let mut params = StageParams {
        character: args.character,
        ..cfg.stage.clone()
    };
    if let Some(size) = args.size {
        params.size_px = size;
    }
    if let Some(mode) = args.grid.as_deref() {
        params.grid.mode = GridMode::parse_lenient(mode);
    }

    let mut stage = StageRenderer::new();
    stage.configure(params, source)?;
    if let StageState::Failed(msg) = stage.state() {
        anyhow::bail!("stage failed: {msg}");
    }
    if let Some(at) = args.at_ms {
        stage.animate()?;
        stage.advance(at);
    }
    let frame = stage.render_frame()?;
    write_output(&args.out, &frame.encode_png()?)
}

fn cmd_steps(args: StepsArgs, cfg: &StudioConfig, source: &mut GlyphDataSource) -> anyhow::Result<()> {
    let glyph = source.fetch_glyph(&args.character)?;
    let svg = step_sheet_svg(
        &glyph,
        args.thumb,
        args.per_row,
        args.gap,
        &cfg.stage.grid,
        cfg.stage.style.stroke_color,
    );
    write_output(&args.out, svg.as_bytes())
}

fn write_blob(out: &Path, blob: &VideoBlob) -> anyhow::Result<()> {
    let ext = hanzi_studio::encode::ffmpeg::mime_extension(&blob.mime);
    let path = resolve_out(out, &format!("{}.{ext}", blob.filename_base));
    write_output(&path, &blob.bytes)
}

fn cmd_video(args: VideoArgs, cfg: &StudioConfig, source: &mut GlyphDataSource) -> anyhow::Result<()> {
    let mut export = cfg.export.clone();
    if let Some(c) = args.container {
        export.container = c.into();
    }
    let bg = export.grid.colors.background;
    let backend = FfmpegBackend::probe()?.with_background([bg.r, bg.g, bg.b]);
    let blob = hanzi_studio::export_character_to_video(&args.character, &export, source, &backend)?;
    write_blob(&args.out, &blob)
}

fn cmd_gif(args: GifArgs, cfg: &StudioConfig, source: &mut GlyphDataSource) -> anyhow::Result<()> {
    let blob = hanzi_studio::export_character_to_gif(&args.character, &cfg.export, source)?;
    write_blob(&args.out, &blob)
}

fn cmd_batch(args: BatchArgs, cfg: &StudioConfig, source: &mut GlyphDataSource) -> anyhow::Result<()> {
    let chars = hanzi_studio::parse_character_input(
        &args.chars,
        hanzi_studio::assets::source::MAX_INPUT_CHARACTERS,
    );
    anyhow::ensure!(!chars.is_empty(), "no characters given");

    let mut opts = cfg.batch.clone();
    if args.skip_failed {
        opts.failure_policy = FailurePolicy::Skip;
    }
    let bg = cfg.export.grid.colors.background;
    let backend = FfmpegBackend::probe()?.with_background([bg.r, bg.g, bg.b]);
    let transcoder = FfmpegTranscoder::new();
    let transcoder: Option<&dyn Transcoder> = args.transcode.then_some(&transcoder as &dyn Transcoder);

    let outcome = hanzi_studio::export_many(
        &chars,
        &cfg.export,
        &opts,
        source,
        &backend,
        transcoder,
        &mut TracingObserver,
    )?;
    for failure in &outcome.failures {
        eprintln!("skipped '{}': {}", failure.character, failure.error);
    }
    std::fs::create_dir_all(&args.out)
        .with_context(|| format!("create output dir '{}'", args.out.display()))?;
    write_output(&args.out.join(&outcome.archive_name), &outcome.archive)
}

fn cmd_pdf(args: PdfArgs, cfg: &StudioConfig, source: &mut GlyphDataSource) -> anyhow::Result<()> {
    let mut opts = cfg.pdf.clone();
    if let Some(mode) = args.mode.as_deref() {
        opts.source_mode = match mode.to_ascii_lowercase().as_str() {
            "selected" => SourceMode::Selected,
            "sequence" => SourceMode::Sequence,
            other => anyhow::bail!("unknown mode '{other}' (expected selected or sequence)"),
        };
    }
    if let Some(page) = args.page.as_deref() {
        opts.page_size = match page.to_ascii_lowercase().as_str() {
            "a4" => PageSize::A4,
            "letter" => PageSize::Letter,
            other => anyhow::bail!("unknown page size '{other}' (expected A4 or Letter)"),
        };
    }
    if args.landscape {
        opts.orientation = Orientation::Landscape;
    }
    if let Some(columns) = args.columns {
        opts.columns = columns;
    }
    if args.title.is_some() {
        opts.title = args.title;
    }
    if args.font.is_some() {
        opts.font_path = args.font;
    }

    let mut req = match args.layout {
        PdfLayoutChoice::Single => PdfRequest::from_text(&args.chars, opts),
        _ => PdfRequest::new(
            hanzi_studio::parse_character_input(
                &args.chars,
                hanzi_studio::assets::source::MAX_INPUT_CHARACTERS,
            ),
            opts,
        ),
    };
    if let Some(path) = req.options.font_path.clone() {
        let bytes =
            std::fs::read(&path).with_context(|| format!("read font '{}'", path.display()))?;
        req = req.with_font_bytes(bytes);
    }

    std::fs::create_dir_all(&args.out)
        .with_context(|| format!("create output dir '{}'", args.out.display()))?;
    match args.layout {
        PdfLayoutChoice::Single => {
            let out = hanzi_studio::generate_worksheet(&req, source)?;
            for w in &out.warnings {
                eprintln!("warning: {w}");
            }
            eprintln!("{}", out.info);
            write_output(&args.out.join(&out.filename), &out.document_bytes)
        }
        PdfLayoutChoice::Combined | PdfLayoutChoice::Zip => {
            let out = if matches!(args.layout, PdfLayoutChoice::Zip) {
                hanzi_studio::generate_worksheet_zip(&req, source)?
            } else {
                hanzi_studio::generate_combined_worksheet(&req, source)?
            };
            if !out.skipped.is_empty() {
                eprintln!("skipped (no data): {}", out.skipped.join(" "));
            }
            write_output(&args.out.join(&out.filename), &out.bytes)
        }
    }
}

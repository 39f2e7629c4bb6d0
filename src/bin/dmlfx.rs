use std::{
    collections::BTreeSet,
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::Context as _;
use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser, Debug)]
#[command(name = "dmlfx", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Convert a JSON request into fragments plus metafile resources.
    Convert(ConvertArgs),
    /// Import paths and clip paths from an SVG file and convert them.
    Svg(SvgArgs),
    /// Write one pattern-library metafile.
    Pattern(PatternArgs),
}

#[derive(Parser, Debug)]
struct ConvertArgs {
    /// Input request JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Output directory for `fragments.json` and `.emf` resources.
    #[arg(long)]
    out: PathBuf,

    /// Worker threads (default: rayon's global pool).
    #[arg(long)]
    threads: Option<usize>,
}

#[derive(Parser, Debug)]
struct SvgArgs {
    /// Input SVG file.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Output directory for `fragments.json` and `.emf` resources.
    #[arg(long)]
    out: PathBuf,

    /// Options JSON; defaults apply when omitted.
    #[arg(long)]
    options: Option<PathBuf>,

    /// Budget preset, used when no options file is given.
    #[arg(long, value_enum, default_value_t = PresetChoice::Balanced)]
    preset: PresetChoice,
}

#[derive(Parser, Debug)]
struct PatternArgs {
    #[arg(long, value_enum, default_value_t = KindChoice::Hatch)]
    kind: KindChoice,

    #[arg(long, value_enum, default_value_t = DensityChoice::Medium)]
    density: DensityChoice,

    #[arg(long, default_value_t = 1.0)]
    scale: f64,

    /// Rotation in degrees.
    #[arg(long, default_value_t = 0.0)]
    rotation: f64,

    /// Pattern color as `#rrggbb` or `#rrggbbaa`.
    #[arg(long, default_value = "#000000")]
    color: String,

    /// Output EMF path.
    #[arg(long)]
    out: PathBuf,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum PresetChoice {
    Speed,
    Balanced,
    Quality,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum KindChoice {
    Hatch,
    Crosshatch,
    Diagonal,
    Dot,
    Grid,
    Brick,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum DensityChoice {
    Sparse,
    Medium,
    Dense,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Convert(args) => cmd_convert(args),
        Command::Svg(args) => cmd_svg(args),
        Command::Pattern(args) => cmd_pattern(args),
    }
}

fn read_request_json(path: &Path) -> anyhow::Result<dmlfx::ConversionRequest> {
    let f = File::open(path).with_context(|| format!("open request '{}'", path.display()))?;
    let r = BufReader::new(f);
    let req: dmlfx::ConversionRequest =
        serde_json::from_reader(r).with_context(|| "parse request JSON")?;
    req.validate()?;
    Ok(req)
}

fn cmd_convert(args: ConvertArgs) -> anyhow::Result<()> {
    let req = read_request_json(&args.in_path)?;
    let mut dispatcher =
        dmlfx::Dispatcher::new(req.options.clone(), Arc::new(dmlfx::PatternCache::new()))?;
    if let Some(n) = args.threads {
        dispatcher = dispatcher.with_threads(n)?;
    }
    let outputs = dispatcher.convert_all(&req.elements, &req.clips)?;
    write_outputs(&args.out, &outputs)
}

fn cmd_svg(args: SvgArgs) -> anyhow::Result<()> {
    let data = std::fs::read(&args.in_path)
        .with_context(|| format!("read svg '{}'", args.in_path.display()))?;
    let options = match &args.options {
        Some(path) => {
            let s = std::fs::read_to_string(path)
                .with_context(|| format!("read options '{}'", path.display()))?;
            dmlfx::ConvertOptions::from_json_str(&s)?
        }
        None => dmlfx::ConvertOptions::preset(match args.preset {
            PresetChoice::Speed => dmlfx::Preset::Speed,
            PresetChoice::Balanced => dmlfx::Preset::Balanced,
            PresetChoice::Quality => dmlfx::Preset::Quality,
        }),
    };
    let imported = dmlfx::import::import_svg(&data)?;
    if imported.skipped_filters > 0 {
        eprintln!(
            "note: {} filtered group(s) imported without their filters",
            imported.skipped_filters
        );
    }
    let req = imported.into_request(options);
    let outputs = req.run(Arc::new(dmlfx::PatternCache::new()))?;
    write_outputs(&args.out, &outputs)
}

fn cmd_pattern(args: PatternArgs) -> anyhow::Result<()> {
    let kind = match args.kind {
        KindChoice::Hatch => dmlfx::PatternKind::Hatch,
        KindChoice::Crosshatch => dmlfx::PatternKind::Crosshatch,
        KindChoice::Diagonal => dmlfx::PatternKind::Diagonal,
        KindChoice::Dot => dmlfx::PatternKind::Dot,
        KindChoice::Grid => dmlfx::PatternKind::Grid,
        KindChoice::Brick => dmlfx::PatternKind::Brick,
    };
    let density = match args.density {
        DensityChoice::Sparse => dmlfx::Density::Sparse,
        DensityChoice::Medium => dmlfx::Density::Medium,
        DensityChoice::Dense => dmlfx::Density::Dense,
    };
    let color = dmlfx::Rgba8::from_hex(&args.color)?;
    let params = dmlfx::PatternParams::new(kind, density)
        .with_scale(args.scale)
        .with_rotation(args.rotation)
        .with_color(color);
    let entry = dmlfx::PatternCache::new().get_or_create_pattern(&params);
    write_file(&args.out, &entry.document.to_bytes())?;
    eprintln!("wrote {}", args.out.display());
    Ok(())
}

// Resources are named by content fingerprint, so shared pattern documents are written once.
fn write_outputs(dir: &Path, outputs: &[dmlfx::ElementOutput]) -> anyhow::Result<()> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("create output dir '{}'", dir.display()))?;
    let mut written = BTreeSet::new();
    let mut reports = Vec::with_capacity(outputs.len());
    for out in outputs {
        let resources = out
            .as_drawn()
            .map(|r| r.embedded_resources.as_slice())
            .unwrap_or_default();
        let names: Vec<String> = resources
            .iter()
            .map(|doc| format!("{}.emf", doc.fingerprint()))
            .collect();
        for (doc, name) in resources.iter().zip(&names) {
            if written.insert(name.clone()) {
                write_file(&dir.join(name), &doc.to_bytes())?;
            }
        }
        for d in out.diagnostics() {
            eprintln!("{}: {:?}: {}", out.id(), d.kind, d.message);
        }
        reports.push(dmlfx::ElementReport::new(out, |i| names[i].clone()));
    }
    let json = serde_json::to_vec_pretty(&reports).context("serialize fragments")?;
    let path = dir.join("fragments.json");
    write_file(&path, &json)?;
    eprintln!(
        "wrote {} ({} element(s), {} resource(s))",
        path.display(),
        reports.len(),
        written.len()
    );
    Ok(())
}

fn write_file(path: &Path, bytes: &[u8]) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    std::fs::write(path, bytes).with_context(|| format!("write '{}'", path.display()))
}

//! ringfit CLI: render templates and score them against JSON sky images.

use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};

use ringfit::{rasterize, ExtractionSpec, FilterSpec, SkyImage};

type CliError = Box<dyn std::error::Error>;
type CliResult<T> = Result<T, CliError>;

#[derive(Parser)]
#[command(name = "ringfit")]
#[command(about = "Render ring and blob templates and score them against images")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the parameter layout of an extraction config.
    Inspect {
        /// Path to the extraction config (JSON).
        #[arg(long)]
        config: PathBuf,
    },

    /// Rasterise a filter onto a square grid and write it as a sky image.
    Render(CliRenderArgs),

    /// Evaluate the divergence of an extraction config at its initial guess.
    Score {
        /// Path to the extraction config (JSON).
        #[arg(long)]
        config: PathBuf,

        /// Path to the observed sky image (JSON).
        #[arg(long)]
        image: PathBuf,
    },
}

#[derive(Debug, Clone, Args)]
struct CliRenderArgs {
    /// Path to the filter spec (JSON).
    #[arg(long)]
    filter: PathBuf,

    /// Pixels per side.
    #[arg(long, default_value = "64")]
    npix: usize,

    /// Field of view per side; the grid spans [-fov/2, fov/2].
    #[arg(long, default_value = "120.0")]
    fov: f64,

    /// Path to write the sky image (JSON).
    #[arg(long)]
    out: PathBuf,
}

fn main() -> CliResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Inspect { config } => run_inspect(&config),
        Commands::Render(args) => run_render(&args),
        Commands::Score { config, image } => run_score(&config, &image),
    }
}

fn load_image(path: &Path) -> CliResult<SkyImage> {
    tracing::info!("Loading image: {}", path.display());
    let data = std::fs::read_to_string(path)
        .map_err(|e| -> CliError { format!("Failed to read {}: {}", path.display(), e).into() })?;
    let image: SkyImage = serde_json::from_str(&data)?;
    tracing::info!("Image size: {}x{}", image.nx(), image.ny());
    Ok(image)
}

// ── inspect ────────────────────────────────────────────────────────────

fn run_inspect(config: &Path) -> CliResult<()> {
    let spec = ExtractionSpec::from_json_file(config)?;
    let names = spec.shape.param_names();

    println!("shape:      {}", spec.shape);
    println!("divergence: {:?}", spec.divergence);
    println!("parameters: {}", spec.shape.size());
    for (k, name) in names.iter().enumerate() {
        let bound = |v: &[f64]| v.get(k).map_or("-".to_string(), |x| format!("{x}"));
        println!(
            "  [{k:>2}] {name:<16} lower={:<10} initial={:<10} upper={}",
            bound(&spec.lower),
            bound(&spec.initial),
            bound(&spec.upper),
        );
    }
    Ok(())
}

// ── render ─────────────────────────────────────────────────────────────

fn run_render(args: &CliRenderArgs) -> CliResult<()> {
    let spec = FilterSpec::from_json_file(&args.filter)?;
    let filter = spec.build()?;
    let half = 0.5 * args.fov;
    let image = rasterize(&filter, args.npix, [-half, half], [-half, half])?;
    tracing::info!(
        "Rendered {} on {}x{} pixels over fov {}",
        spec.shape,
        args.npix,
        args.npix,
        args.fov
    );

    let json = serde_json::to_string_pretty(&image)?;
    std::fs::write(&args.out, &json)?;
    tracing::info!("Image written to {}", args.out.display());
    Ok(())
}

// ── score ──────────────────────────────────────────────────────────────

fn run_score(config: &Path, image: &Path) -> CliResult<()> {
    let spec = ExtractionSpec::from_json_file(config)?;
    let image = load_image(image)?;
    let ctx = spec.into_context(&image)?;
    let filter = ctx.reconstruct(ctx.initial())?;
    let score = ctx.divergence().score(&filter)?;
    let objective = ctx.objective(ctx.initial())?;

    println!("divergence: {:?}", ctx.divergence().kind());
    println!("score:      {score:.8}");
    println!("objective:  {objective:.8e}");
    Ok(())
}

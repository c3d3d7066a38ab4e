use anyhow::Context as _;
use clap::{Parser, ValueEnum};

#[derive(Parser, Debug)]
#[command(
    name = "herogif",
    version,
    about = "Render the git worktrees blog hero as a looping GIF"
)]
struct Cli {
    /// Rasterizer used to turn each SVG frame into a PNG.
    #[arg(long, value_enum, default_value_t = RasterizerChoice::Resvg)]
    rasterizer: RasterizerChoice,

    /// Log every frame at debug level.
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum RasterizerChoice {
    /// In-process resvg.
    Resvg,
    /// External `rsvg-convert` (must be on PATH).
    RsvgConvert,
}

fn make_rasterizer(choice: RasterizerChoice) -> Box<dyn herogif::Rasterizer> {
    match choice {
        RasterizerChoice::Resvg => Box::new(herogif::ResvgRasterizer::new()),
        RasterizerChoice::RsvgConvert => {
            if !herogif::raster::is_program_on_path(herogif::raster::RSVG_CONVERT) {
                tracing::warn!("rsvg-convert was not found on PATH; the first frame will fail");
            }
            Box::new(herogif::CommandRasterizer::rsvg_convert())
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_max_level(if cli.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        })
        .with_writer(std::io::stderr)
        .init();

    let cfg = herogif::GeneratorConfig::hero();
    let template = herogif::SceneTemplate::hero().context("load hero scene")?;
    let rasterizer = make_rasterizer(cli.rasterizer);

    let artifact = herogif::generate(&cfg, &template, rasterizer.as_ref())?;

    println!(
        "GIF saved to {} ({:.1} KB)",
        artifact.path.display(),
        artifact.size_kb()
    );
    Ok(())
}

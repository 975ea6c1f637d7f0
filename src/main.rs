use anyhow::Context;
use clap::Parser;
use raymarch::output::{write_all, OutputFormat};
use raymarch::{render, Primitive, SceneConfig};
use std::path::PathBuf;
use std::time::Instant;
use tracing::info;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// TOML scene file; flags below override it.
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[arg(long)]
    width: Option<u32>,

    #[arg(long)]
    height: Option<u32>,

    #[arg(long)]
    fov_degrees: Option<f64>,

    #[arg(short, long, value_enum)]
    primitive: Option<Primitive>,

    /// Worker threads, 0 for one per core.
    #[arg(short, long, default_value_t = 0)]
    threads: usize,

    #[arg(short, long, default_value = ".")]
    out_dir: PathBuf,

    #[arg(long, default_value = "out")]
    name: String,

    #[arg(short, long, value_enum, value_delimiter = ',', default_values = ["ppm", "png"])]
    formats: Vec<OutputFormat>,

    #[arg(long, default_value = "info")]
    log_level: tracing::Level,
}

fn scene_from_args(args: &Args) -> anyhow::Result<SceneConfig> {
    let mut scene = match &args.config {
        Some(path) => SceneConfig::from_toml_file(path)
            .with_context(|| format!("reading scene config {}", path.display()))?,
        None => SceneConfig::default(),
    };
    if let Some(w) = args.width {
        scene.width = w;
    }
    if let Some(h) = args.height {
        scene.height = h;
    }
    if let Some(deg) = args.fov_degrees {
        scene.fov = deg.to_radians();
    }
    if let Some(p) = args.primitive {
        scene.primitive = p;
    }
    Ok(scene)
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    tracing_subscriber::fmt()
        .with_max_level(args.log_level)
        .init();

    let scene = scene_from_args(&args)?;
    let start = Instant::now();
    let fb = render(&scene, args.threads).context("rendering frame")?;
    info!("render took {} s", start.elapsed().as_secs_f32());

    let written = write_all(&fb, &args.out_dir, &args.name, &args.formats)
        .context("writing images")?;
    for path in written {
        info!("wrote {}", path.display());
    }
    Ok(())
}

//! modeltool - load meshes, voxelize them and place them into a world file

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use glam::Vec3;
use model::io::load_file;
use model::palette::{candidates_from_csv, candidates_from_textures};
use model::{Argb, MemoryWorld, ModelConfig, Palette, Session, ScaleMode, WorldState};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Parser)]
#[command(name = "modeltool")]
#[command(about = "Mesh import, voxelization and placement tool", long_about = None)]
struct Cli {
    /// Config file (defaults to $MODEL_TOOLS_CONFIG, then model_tools.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print format, triangle count, bounds and materials of a mesh
    Inspect {
        /// Mesh file (.obj or .stl)
        file: PathBuf,
    },

    /// Voxelize a mesh and summarize (or export) its footprint
    Voxelize {
        /// Mesh file (.obj or .stl)
        file: PathBuf,

        #[command(flatten)]
        transform: TransformArgs,

        /// Write the footprint as `x,y,z,symbol` CSV
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Place a voxelized mesh into a world file
    Place {
        /// Mesh file (.obj or .stl)
        file: PathBuf,

        /// World file; created when missing
        #[arg(short, long)]
        world: PathBuf,

        /// World position of the model center
        #[arg(long, num_args = 3, value_names = ["X", "Y", "Z"], allow_negative_numbers = true)]
        at: Option<Vec<f32>>,

        #[command(flatten)]
        transform: TransformArgs,
    },

    /// Undo the last placement recorded in a world file
    Undo {
        /// World file
        #[arg(short, long)]
        world: PathBuf,
    },

    /// Build or query the color palette
    Palette {
        #[command(subcommand)]
        command: PaletteCommands,
    },
}

#[derive(Subcommand)]
enum PaletteCommands {
    /// Build a palette table from candidate colors
    Build {
        /// CSV of candidates with a `symbol,r,g,b` header
        #[arg(long, conflicts_with = "textures", required_unless_present = "textures")]
        colors: Option<PathBuf>,

        /// Directory of textures; each image's average color becomes a candidate
        #[arg(long)]
        textures: Option<PathBuf>,

        /// Output table path
        #[arg(short, long)]
        output: PathBuf,

        /// Quantization bucket size (defaults to the configured one)
        #[arg(long)]
        bucket: Option<u8>,
    },

    /// Look up the symbol for a color in the configured palette
    Lookup {
        r: u8,
        g: u8,
        b: u8,

        /// Alpha; anything but 255 resolves to empty
        #[arg(long, default_value_t = 255)]
        alpha: u8,
    },
}

#[derive(Args)]
struct TransformArgs {
    /// Rotation in degrees about X, Y, Z (e.g. `0,90,0`)
    #[arg(long, value_parser = parse_vec3, allow_hyphen_values = true)]
    rotate: Option<Vec3>,

    /// Uniform (`2`) or per-axis (`1,2,1`) scale
    #[arg(long, value_parser = parse_scale, allow_hyphen_values = true)]
    scale: Option<Vec3>,
}

fn parse_vec3(s: &str) -> Result<Vec3, String> {
    let parts: Vec<f32> = s
        .split(',')
        .map(|p| p.trim().parse::<f32>().map_err(|e| format!("'{p}': {e}")))
        .collect::<Result<_, _>>()?;
    match parts.as_slice() {
        [x, y, z] => Ok(Vec3::new(*x, *y, *z)),
        _ => Err(format!("expected three comma-separated numbers, got '{s}'")),
    }
}

fn parse_scale(s: &str) -> Result<Vec3, String> {
    if s.contains(',') {
        parse_vec3(s)
    } else {
        s.trim()
            .parse::<f32>()
            .map(Vec3::splat)
            .map_err(|e| format!("'{s}': {e}"))
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => ModelConfig::load(path),
        None => ModelConfig::from_env(),
    }
    .context("failed to load config")?;

    match cli.command {
        Commands::Inspect { file } => inspect(&config, &file),
        Commands::Voxelize {
            file,
            transform,
            output,
        } => voxelize(config, &file, &transform, output.as_deref()),
        Commands::Place {
            file,
            world,
            at,
            transform,
        } => place(config, &file, &world, at, &transform),
        Commands::Undo { world } => undo(&world),
        Commands::Palette { command } => match command {
            PaletteCommands::Build {
                colors,
                textures,
                output,
                bucket,
            } => build_palette(&config, colors, textures, &output, bucket),
            PaletteCommands::Lookup { r, g, b, alpha } => lookup(&config, Argb::new(alpha, r, g, b)),
        },
    }
}

fn inspect(config: &ModelConfig, file: &Path) -> Result<()> {
    let path = config.resolve_model_path(file);
    let (mesh, materials) = load_file(&path, &config.texture_roots())
        .with_context(|| format!("failed to load {}", path.display()))?;

    println!("File: {}", path.display());
    println!("Format: {}", mesh.format.name());
    println!("Triangles: {}", mesh.triangle_count());
    println!("Bounds: {} .. {}", mesh.bounds.min, mesh.bounds.max);
    println!("Size: {}", mesh.bounds.size());
    println!();
    println!("Groups:");
    for group in &mesh.groups {
        println!("  {:<24} {} triangles", group.material, group.triangles.len());
    }
    println!();
    println!("Materials:");
    for material in materials.iter() {
        let texture = match (&material.texture_path, &material.texture) {
            (Some(path), Some(texture)) => {
                format!("{} ({}x{})", path.display(), texture.width(), texture.height())
            }
            (Some(path), None) => format!("{} (not decoded)", path.display()),
            (None, _) => "-".to_string(),
        };
        let color = material
            .base_color
            .map_or_else(|| "-".to_string(), |c| c.to_string());
        println!("  {:<24} texture: {}  color: {}", material.name, texture, color);
    }
    Ok(())
}

/// Load `file` into a fresh session and apply the transform flags
fn prepared_session(config: ModelConfig, file: &Path, transform: &TransformArgs) -> Result<Session> {
    let mut session = Session::new(config);
    check(session.load(file))?;
    if let Some(degrees) = transform.rotate {
        check(session.set_rotation(degrees.x, degrees.y, degrees.z))?;
    }
    if let Some(scale) = transform.scale {
        check(session.scale(ScaleMode::Set, scale.x, scale.y, scale.z))?;
    }
    Ok(session)
}

fn check(status: model::CommandStatus) -> Result<()> {
    if !status.success {
        bail!("{}", status.message);
    }
    info!("{}", status.message);
    Ok(())
}

fn voxelize(
    config: ModelConfig,
    file: &Path,
    transform: &TransformArgs,
    output: Option<&Path>,
) -> Result<()> {
    let session = prepared_session(config, file, transform)?;
    let Some(model) = session.model() else {
        bail!("No model is loaded.");
    };
    let footprint = model.footprint(session.palette());

    let mut census: BTreeMap<&str, usize> = BTreeMap::new();
    for (_, symbol) in footprint.iter() {
        *census.entry(symbol.map_or("(empty)", |s| s.as_str())).or_default() += 1;
    }

    let bounds = model.transformed_bounds();
    println!("Voxels: {}", footprint.len());
    println!("Transformed bounds: {} .. {}", bounds.min, bounds.max);
    for (symbol, count) in &census {
        println!("  {:<24} {}", symbol, count);
    }

    if let Some(output) = output {
        let mut writer = csv::Writer::from_path(output)
            .with_context(|| format!("failed to create {}", output.display()))?;
        writer.write_record(["x", "y", "z", "symbol"])?;
        for (coordinate, symbol) in footprint.sorted() {
            writer.write_record([
                coordinate.x.to_string(),
                coordinate.y.to_string(),
                coordinate.z.to_string(),
                symbol.map_or_else(String::new, |s| s.to_string()),
            ])?;
        }
        writer.flush()?;
        println!("Wrote {}", output.display());
    }
    Ok(())
}

fn place(
    config: ModelConfig,
    file: &Path,
    world_path: &Path,
    at: Option<Vec<f32>>,
    transform: &TransformArgs,
) -> Result<()> {
    let mut session = prepared_session(config, file, transform)?;
    if let Some(at) = at {
        let [x, y, z] = at.as_slice() else {
            bail!("--at takes exactly three numbers");
        };
        let target = Vec3::new(*x, *y, *z);
        let current = session.model().map(|m| m.transform().position()).unwrap_or_default();
        let delta = target - current;
        if delta != Vec3::ZERO {
            check(session.move_vector(delta, delta.length()))?;
        }
    }

    let mut state = WorldState::load_or_default(world_path)
        .with_context(|| format!("failed to open world {}", world_path.display()))?;
    let status = session.place(&mut state.world);
    if let Some(model) = session.model() {
        state.ledger = model.ledger().clone();
    }
    state
        .save(world_path)
        .with_context(|| format!("failed to save world {}", world_path.display()))?;

    println!("{}", status.message);
    print_census(&state.world);
    if !status.success {
        bail!("placement was incomplete");
    }
    Ok(())
}

fn undo(world_path: &Path) -> Result<()> {
    let mut state = WorldState::load(world_path)
        .with_context(|| format!("failed to open world {}", world_path.display()))?;
    if state.ledger.is_empty() {
        println!("Nothing to undo.");
        return Ok(());
    }
    let report = state.ledger.undo(&mut state.world);
    state
        .save(world_path)
        .with_context(|| format!("failed to save world {}", world_path.display()))?;
    println!("Restored {} voxels.", report.written);
    print_census(&state.world);
    if !report.is_complete() {
        bail!("{} writes failed", report.failed);
    }
    Ok(())
}

fn print_census(world: &MemoryWorld) {
    println!("World holds {} voxels", world.len());
    for (symbol, count) in world.census() {
        println!("  {:<24} {}", symbol, count);
    }
}

fn build_palette(
    config: &ModelConfig,
    colors: Option<PathBuf>,
    textures: Option<PathBuf>,
    output: &Path,
    bucket: Option<u8>,
) -> Result<()> {
    let bucket = bucket.unwrap_or(config.bucket_size);
    let candidates = match (colors, textures) {
        (Some(csv), _) => candidates_from_csv(&csv)
            .with_context(|| format!("failed to read {}", csv.display()))?,
        (None, Some(dir)) => candidates_from_textures(&dir)
            .with_context(|| format!("failed to scan {}", dir.display()))?,
        (None, None) => bail!("either --colors or --textures is required"),
    };
    if candidates.is_empty() {
        bail!("no candidate colors found");
    }
    info!("Building palette from {} candidates", candidates.len());

    let palette = Palette::build(&candidates, bucket, config.default_symbol.as_str())?;
    palette
        .save(output)
        .with_context(|| format!("failed to write {}", output.display()))?;
    println!("Wrote {} entries to {}", palette.len(), output.display());
    Ok(())
}

fn lookup(config: &ModelConfig, color: Argb) -> Result<()> {
    let palette = config
        .load_palette()
        .with_context(|| format!("failed to load palette {}", config.palette_path.display()))?;
    let quantized = palette.quantize(color);
    match palette.lookup(color) {
        Some(symbol) => println!("{} -> {} -> {}", color, quantized, symbol),
        None => println!("{} -> empty", color),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_transform_values() {
        assert_eq!(parse_vec3("0, 90,-45"), Ok(Vec3::new(0.0, 90.0, -45.0)));
        assert!(parse_vec3("1,2").is_err());
        assert_eq!(parse_scale("2"), Ok(Vec3::splat(2.0)));
        assert_eq!(parse_scale("1,2,3"), Ok(Vec3::new(1.0, 2.0, 3.0)));
        assert!(parse_scale("big").is_err());
    }

    #[test]
    fn test_parse_place_command() {
        let cli = Cli::try_parse_from([
            "modeltool", "place", "cube.obj", "--world", "w.bin", "--at", "1", "-2", "3",
            "--rotate", "0,-90,0",
        ])
        .expect("valid arguments");
        match cli.command {
            Commands::Place { at, transform, .. } => {
                assert_eq!(at, Some(vec![1.0, -2.0, 3.0]));
                assert_eq!(transform.rotate, Some(Vec3::new(0.0, -90.0, 0.0)));
            }
            _ => panic!("expected place"),
        }
    }

    #[test]
    fn test_palette_build_requires_one_source() {
        assert!(Cli::try_parse_from(["modeltool", "palette", "build", "-o", "p.txt"]).is_err());
        assert!(Cli::try_parse_from([
            "modeltool", "palette", "build", "--colors", "c.csv", "--textures", "t", "-o", "p.txt",
        ])
        .is_err());
    }
}

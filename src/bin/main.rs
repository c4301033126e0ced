//! Meshforge CLI
//!
//! Convert decoded legacy game mesh records into self-contained glTF
//! assets.

use clap::{Parser, Subcommand};
use meshforge::{
    normalize_name, AnimationLibrary, AnimationRecord, ConvertContext, Converter,
    MeshGltfConverter, MeshRecord, ResolvedTexture, TextureFormat,
};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "meshforge")]
#[command(author, version, about = "Convert decoded mesh records to glTF", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert a decoded mesh record to a glTF artifact
    Convert {
        /// Decoded mesh record (JSON)
        #[arg(short, long)]
        input: PathBuf,

        /// Directory containing the record's textures (PNG or BMP)
        #[arg(short, long)]
        textures: PathBuf,

        /// Directory containing decoded animation records (JSON)
        #[arg(short, long)]
        animations: Option<PathBuf>,

        /// Output directory
        #[arg(short, long)]
        output: PathBuf,

        /// Skip animation lookup and emit a static mesh
        #[arg(long)]
        r#static: bool,
    },

    /// Show information about a decoded mesh record
    Info {
        /// Decoded mesh record (JSON)
        #[arg(short, long)]
        input: PathBuf,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Convert {
            input,
            textures,
            animations,
            output,
            r#static,
        } => {
            convert_mesh(&input, &textures, animations.as_deref(), &output, r#static)?;
        }
        Commands::Info { input } => {
            show_record_info(&input)?;
        }
    }

    Ok(())
}

fn convert_mesh(
    input_path: &Path,
    textures_dir: &Path,
    animations_dir: Option<&Path>,
    output_dir: &Path,
    static_only: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let converter = MeshGltfConverter::new();

    println!("Loading mesh record from {:?}...", input_path);
    let record = converter.decode(&fs::read(input_path)?)?;
    println!(
        "  {} vertices, {} polygons, {} declared textures",
        record.vertex_count(),
        record.polygon_count(),
        record.texture_names.len()
    );

    println!("Resolving textures from {:?}...", textures_dir);
    let textures = load_textures(&record, textures_dir)?;
    println!("  Resolved {} textures", textures.len());

    let animations = match animations_dir {
        Some(dir) if !static_only => {
            let library = load_animation_library(dir)?;
            println!("  Loaded {} animation records", library.len());
            library
        }
        _ => AnimationLibrary::new(),
    };

    let ctx = ConvertContext {
        textures: &textures,
        animations: &animations,
        include_animation: !static_only,
    };

    let paths = converter.convert(&record, &ctx, output_dir)?;
    for path in paths {
        println!("Exported glTF to {:?}", path);
    }

    Ok(())
}

fn show_record_info(input_path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let converter = MeshGltfConverter::new();
    let record = converter.decode(&fs::read(input_path)?)?;

    println!("\nMesh Record Info:");
    println!("  Name: {}", record.name);
    println!("  Vertices: {}", record.vertex_count());
    println!("  Polygons: {}", record.polygon_count());
    println!("  Declared textures:");
    for (slot, name) in record.texture_names.iter().enumerate() {
        let faces = record
            .polygons
            .iter()
            .filter(|p| p.texture_slot as usize == slot)
            .count();
        println!("    [{}] {} ({} faces)", slot, name, faces);
    }

    Ok(())
}

/// Simple filesystem texture provider: looks each declared texture name
/// up in the directory, preferring a PNG over a legacy bitmap with the
/// same stem. Names with no matching file are skipped; the resolver
/// treats that as expected legacy variance.
fn load_textures(
    record: &MeshRecord,
    dir: &Path,
) -> Result<Vec<ResolvedTexture>, Box<dyn std::error::Error>> {
    let mut by_name: HashMap<String, PathBuf> = HashMap::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if let Some(file_name) = path.file_name().and_then(|n| n.to_str()) {
            by_name.insert(normalize_name(file_name), path.clone());
        }
    }

    let mut textures = Vec::new();
    for name in &record.texture_names {
        let normalized = normalize_name(name);
        let stem = normalized
            .rsplit_once('.')
            .map(|(stem, _)| stem.to_string())
            .unwrap_or_else(|| normalized.clone());
        let candidates = [
            format!("{stem}.png"),
            normalized.clone(),
            format!("{stem}.bmp"),
        ];

        match candidates.iter().find_map(|c| by_name.get(c)) {
            Some(path) => textures.push(load_texture(name, path)?),
            None => println!("  Warning: no texture file for '{}'", name),
        }
    }

    Ok(textures)
}

fn load_texture(name: &str, path: &Path) -> Result<ResolvedTexture, Box<dyn std::error::Error>> {
    let data = fs::read(path)?;
    let format = match path.extension().and_then(|e| e.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("png") => TextureFormat::Png,
        _ => TextureFormat::Bmp,
    };

    // Decode once to learn whether any pixel is non-opaque.
    let decoded = image::load_from_memory(&data)?;
    let has_alpha = decoded.to_rgba8().pixels().any(|pixel| pixel.0[3] < 255);

    Ok(ResolvedTexture::new(name, data, format, has_alpha))
}

/// Load every decoded animation record (JSON) in a directory.
fn load_animation_library(dir: &Path) -> Result<AnimationLibrary, Box<dyn std::error::Error>> {
    let mut records: Vec<AnimationRecord> = Vec::new();
    let mut paths: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| {
            path.extension()
                .and_then(|e| e.to_str())
                .is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
        })
        .collect();
    paths.sort();

    for path in paths {
        let contents = fs::read(&path)?;
        match serde_json::from_slice::<AnimationRecord>(&contents) {
            Ok(record) => records.push(record),
            Err(e) => println!("  Warning: skipping animation {:?}: {}", path, e),
        }
    }

    Ok(AnimationLibrary::from_records(records))
}

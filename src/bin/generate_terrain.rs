//! Terrain generator binary: builds a terrain and reports mesh statistics.
//!
//! Usage: cargo run --release --bin generate_terrain -- [OPTIONS]
//!
//! Options:
//!   --config <PATH>        Load a JSON TerrainConfig (flags below override it)
//!   --chunks <N>           Chunks per axis (default: 3)
//!   --voxels <N>           Voxels per chunk edge (default: 8)
//!   --res <RES>            low | med | high | insane (default: low)
//!   --mode <MODE>          volumetric | heightmap | half_full (default: heightmap)
//!   --seed <SEED>          Noise seed (default: 0)
//!   --surface <LEVEL>      Surface level in [0, 1] (default: 0.6)
//!   --no-smooth            Snap vertices to edge midpoints
//!   --dig                  Dig once at the centre of the grid and report the rebuild
//!   --save-config <PATH>   Write the resolved config as JSON
//!   --jobs <N>             Worker threads (default: rayon's choice)

use std::path::PathBuf;
use std::time::Instant;

use serde_json::json;

use isoforge::core::Result;
use isoforge::terrain::{GenerationMode, Resolution, Terrain, TerrainConfig};

fn main() {
    isoforge::core::logging::builder()
        .format_timestamp_millis()
        .init();

    let args: Vec<String> = std::env::args().collect();
    if let Err(e) = run(&args) {
        log::error!("{}", e);
        std::process::exit(1);
    }
}

fn run(args: &[String]) -> Result<()> {
    if let Some(jobs) = parse_usize_arg(args, "--jobs") {
        if let Err(e) = rayon::ThreadPoolBuilder::new().num_threads(jobs).build_global() {
            log::warn!("Could not configure thread pool: {}", e);
        }
    }

    let config = resolve_config(args)?;
    if let Some(path) = parse_str_arg(args, "--save-config") {
        config.save(&PathBuf::from(&path))?;
        log::info!("Wrote config to {}", path);
    }

    let start = Instant::now();
    let mut terrain = Terrain::initialize(config)?;
    log::info!("Initialized in {:.1}ms", start.elapsed().as_secs_f64() * 1000.0);

    for chunk in terrain.chunks() {
        log::debug!(
            "Chunk {:?}: {} vertices, {} triangles, bounds {:?}..{:?}",
            chunk.coord,
            chunk.mesh.vertices.len(),
            chunk.mesh.triangle_count(),
            chunk.world_bounds().min,
            chunk.world_bounds().max,
        );
    }

    let mut rebuilt = Vec::new();
    if args.iter().any(|a| a == "--dig") {
        let layout = terrain.layout();
        let centre = layout.chunk_counts().as_vec3() * layout.chunk_world_length() * 0.5;
        let start = Instant::now();
        let mut coords: Vec<_> = terrain.edit_with_default_brush(centre, true)?.into_iter().collect();
        coords.sort();
        log::info!(
            "Dig at {:?} rebuilt {} chunks in {:.2}ms",
            centre,
            coords.len(),
            start.elapsed().as_secs_f64() * 1000.0
        );
        rebuilt = coords.iter().map(|c| [c.x, c.y, c.z]).collect();
    }

    let stats = terrain.stats();
    let (min, max) = terrain.field().min_max();
    let report = json!({
        "field": terrain.layout().field_dims().to_array(),
        "field_range": [min, max],
        "stats": stats,
        "dig_rebuilt": rebuilt,
    });
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn resolve_config(args: &[String]) -> Result<TerrainConfig> {
    let mut config = match parse_str_arg(args, "--config") {
        Some(path) => TerrainConfig::load(&PathBuf::from(path))?,
        None => TerrainConfig::default(),
    };

    if let Some(n) = parse_u32_arg(args, "--chunks") {
        config.chunk_counts = [n; 3];
    }
    if let Some(n) = parse_u32_arg(args, "--voxels") {
        config.chunk_voxels = n;
    }
    if let Some(seed) = parse_u32_arg(args, "--seed") {
        config.noise.seed = seed;
    }
    if let Some(level) = parse_f32_arg(args, "--surface") {
        config.surface_level = level;
    }
    if args.iter().any(|a| a == "--no-smooth") {
        config.smoothing = false;
    }
    if let Some(res) = parse_str_arg(args, "--res") {
        config.resolution = match res.as_str() {
            "low" => Resolution::Low,
            "med" => Resolution::Med,
            "high" => Resolution::High,
            "insane" => Resolution::Insane,
            other => return Err(isoforge::core::Error::invalid(format!("unknown resolution '{}'", other))),
        };
    }
    if let Some(mode) = parse_str_arg(args, "--mode") {
        config.mode = match mode.as_str() {
            "volumetric" => GenerationMode::Volumetric,
            "heightmap" => GenerationMode::default(),
            "half_full" => GenerationMode::HalfFull,
            other => return Err(isoforge::core::Error::invalid(format!("unknown mode '{}'", other))),
        };
    }

    config.validate()?;
    Ok(config)
}

fn parse_f32_arg(args: &[String], flag: &str) -> Option<f32> {
    args.iter().position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .and_then(|s| s.parse().ok())
}

fn parse_u32_arg(args: &[String], flag: &str) -> Option<u32> {
    args.iter().position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .and_then(|s| s.parse().ok())
}

fn parse_usize_arg(args: &[String], flag: &str) -> Option<usize> {
    args.iter().position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .and_then(|s| s.parse().ok())
}

fn parse_str_arg(args: &[String], flag: &str) -> Option<String> {
    args.iter().position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .cloned()
}

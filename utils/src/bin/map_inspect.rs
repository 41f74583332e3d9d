use std::env;
use std::path::PathBuf;
use std::process;
use std::sync::Arc;

use anyhow::{Context, Result, anyhow};
use image::ImageFormat;
use terrain_core::constants::MAPS_DIR;
use terrain_core::{
    DirectoryResolver, HeadlessBackend, ManifestRegistry, Map, MapManifest, MapServices,
    TerrainConfig, Vec2,
};

#[derive(Debug, Default)]
struct Args {
    map: Option<String>,
    data_dir: Option<PathBuf>,
    manifests: Option<PathBuf>,
    out: Option<PathBuf>,
    log_file: Option<PathBuf>,
    probes: Vec<Vec2>,
}

fn usage() -> &'static str {
    "usage: map_inspect [--data-dir <dir>] [--manifests <dir>] [--out <overview.png>] \
     [--log-file <path>] [--probe <x,y>]... <map>"
}

fn parse_probe(value: &str) -> Result<Vec2> {
    let (x, y) = value
        .split_once(',')
        .ok_or_else(|| anyhow!("probe must look like x,y: {value}"))?;
    let x: f32 = x.trim().parse().with_context(|| format!("bad probe x: {x}"))?;
    let y: f32 = y.trim().parse().with_context(|| format!("bad probe y: {y}"))?;
    Ok(Vec2::new(x, y))
}

fn parse_args() -> Result<Args> {
    let mut parsed = Args::default();

    let mut args = env::args().skip(1);
    while let Some(arg) = args.next() {
        let mut value = |flag: &str| {
            args.next()
                .ok_or_else(|| anyhow!("missing value for {flag}"))
        };

        match arg.as_str() {
            "--help" | "-h" => {
                println!("{}", usage());
                process::exit(0);
            }
            "--data-dir" => parsed.data_dir = Some(PathBuf::from(value("--data-dir")?)),
            "--manifests" => parsed.manifests = Some(PathBuf::from(value("--manifests")?)),
            "--out" => parsed.out = Some(PathBuf::from(value("--out")?)),
            "--log-file" => parsed.log_file = Some(PathBuf::from(value("--log-file")?)),
            "--probe" => parsed.probes.push(parse_probe(&value("--probe")?)?),
            other if other.starts_with('-') => {
                return Err(anyhow!("unknown argument: {other}\n{}", usage()));
            }
            name => {
                if parsed.map.replace(name.to_string()).is_some() {
                    return Err(anyhow!("only one map can be inspected at a time"));
                }
            }
        }
    }

    Ok(parsed)
}

fn load_manifests(args: &Args, config: &TerrainConfig, name: &str) -> Result<ManifestRegistry> {
    let mut registry = ManifestRegistry::new();

    let dir = args
        .manifests
        .clone()
        .unwrap_or_else(|| config.data_dir.join(MAPS_DIR));
    if dir.is_dir() {
        registry.load_dir(&dir)?;
    } else if args.manifests.is_some() {
        return Err(anyhow!("manifest directory does not exist: {}", dir.display()));
    }

    if registry.get(name).is_none() {
        log::warn!("No manifest for \"{}\", using defaults", name);
        registry.register(MapManifest::named(name));
    }

    Ok(registry)
}

fn run(args: Args, config: TerrainConfig) -> Result<()> {
    let name = args
        .map
        .clone()
        .ok_or_else(|| anyhow!("no map given\n{}", usage()))?;

    let manifests = load_manifests(&args, &config, &name)?;
    let backend = Arc::new(HeadlessBackend::new());
    let services = MapServices::new(
        Arc::new(DirectoryResolver::new(config.data_dir.clone())),
        backend.clone(),
        Arc::new(manifests),
    );

    let map = Map::load(&name, &config, &services)?;

    println!("map: {}", map.name());
    if !map.manifest().description.is_empty() {
        println!("description: {}", map.manifest().description);
    }
    println!("modes: {:?}", map.manifest().modes());
    println!(
        "chunks: {} ({} meshes)",
        map.chunks().len(),
        map.chunk_models().count()
    );
    println!("heights: {}..={}", map.min_height(), map.max_height());
    println!("tile textures: {}", map.texture_indices().len());
    println!("spawns: {}", map.spawns().len());
    for spawn in map.spawns() {
        println!(
            "  {:<16} at {:?} team {}",
            spawn.class_name(),
            spawn.position,
            spawn.team
        );
    }

    for probe in &args.probes {
        match map.tile_at(*probe) {
            Some(tile) => println!(
                "probe ({}, {}): {} flags {:?} height {:.2}",
                probe.x,
                probe.y,
                tile.tile_type.name(),
                tile.flags,
                map.height_at(*probe)
            ),
            None => println!("probe ({}, {}): off the map", probe.x, probe.y),
        }
    }

    if let Some(out) = &args.out {
        let image = map
            .overview_texture()
            .and_then(|handle| backend.texture_image(handle))
            .ok_or_else(|| anyhow!("map has no overview"))?;
        image
            .save_with_format(out, ImageFormat::Png)
            .with_context(|| format!("failed to write {}", out.display()))?;
        println!("overview written to {}", out.display());
    }

    Ok(())
}

fn main() {
    dotenvy::dotenv().ok();

    let args = match parse_args() {
        Ok(args) => args,
        Err(err) => {
            eprintln!("{err:#}");
            process::exit(2);
        }
    };

    let mut config = TerrainConfig::from_env();
    if let Some(dir) = &args.data_dir {
        config.data_dir = dir.clone();
    }

    if let Err(err) = terrain_core::initialize_logger(config.log_level, args.log_file.as_deref()) {
        eprintln!("{err:#}");
        process::exit(1);
    }

    if let Err(err) = run(args, config) {
        log::error!("{err:#}");
        process::exit(1);
    }
}

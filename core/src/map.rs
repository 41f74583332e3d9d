//! Map lifecycle: load order, ownership of derived resources, release order.
//!
//! A [`Map`] only exists fully loaded. Loading walks
//! `Uninitialized -> TilesLoaded -> SpawnsLoaded -> OverviewReady -> Ready`;
//! any error moves to `Failed` and the partially built resources are
//! released before the error is returned.

use std::collections::BTreeSet;
use std::fmt;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use std::sync::Arc;

use crate::config::TerrainConfig;
use crate::constants::{MAPS_DIR, SPAWN_STREAM_EXTENSION, TILE_STREAM_EXTENSION};
use crate::decoder::{decode_spawns, decode_tiles};
use crate::error::{MapError, MapResult};
use crate::grid::ChunkGrid;
use crate::manifest::MapManifest;
use crate::overview;
use crate::services::{
    MapServices, MeshHandle, ModelHandle, Owned, PathResolver, RenderBackend, TextureHandle,
};
use crate::types::{MapChunk, MapSpawn, MapTile, Vec2};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MapState {
    Uninitialized,
    TilesLoaded,
    SpawnsLoaded,
    OverviewReady,
    Ready,
    Failed,
}

/// Logical name of one of a map's streams, e.g. `maps/estu/estu.pmg`.
pub fn stream_name(map_name: &str, extension: &str) -> String {
    format!("{MAPS_DIR}/{map_name}/{map_name}.{extension}")
}

pub struct Map {
    // Released in declaration order by `Drop`.
    chunk_models: Vec<Owned<MeshHandle>>,
    overview: Option<Owned<TextureHandle>>,
    sky_textures: Vec<Owned<TextureHandle>>,
    sky_model: Option<Owned<ModelHandle>>,

    manifest: MapManifest,
    grid: ChunkGrid,
    spawns: Vec<MapSpawn>,
    texture_indices: Vec<u32>,
    state: MapState,
}

/// Resources acquired so far during a load. Dropping it releases them.
struct MapLoader<'a> {
    chunk_models: Vec<Owned<MeshHandle>>,
    overview: Option<Owned<TextureHandle>>,
    sky_textures: Vec<Owned<TextureHandle>>,
    sky_model: Option<Owned<ModelHandle>>,

    manifest: MapManifest,
    config: &'a TerrainConfig,
    paths: &'a dyn PathResolver,
    backend: Arc<dyn RenderBackend>,
    grid: Option<ChunkGrid>,
    spawns: Vec<MapSpawn>,
    texture_indices: Vec<u32>,
    state: MapState,
}

impl Map {
    /// Loads the map called `name` through `services`.
    ///
    /// Looks up the manifest, then reads `maps/<name>/<name>.pmg` and
    /// `maps/<name>/<name>.pog` via the path resolver.
    ///
    /// # Returns
    /// * A `Ready` map, or the first error hit. No resources created by a
    ///   failed load outlive this call.
    pub fn load(name: &str, config: &TerrainConfig, services: &MapServices) -> MapResult<Self> {
        log::debug!("Loading map, {}...", name);

        let manifest = services
            .manifests
            .get(name)
            .cloned()
            .ok_or_else(|| MapError::NotFound {
                what: "map descriptor",
                name: name.to_string(),
            })?;

        let tile_path = resolve(services.paths.as_ref(), &stream_name(name, TILE_STREAM_EXTENSION))?;
        let spawn_path =
            resolve(services.paths.as_ref(), &stream_name(name, SPAWN_STREAM_EXTENSION))?;

        let tile_reader = open(&tile_path)?;
        let spawn_reader = open(&spawn_path)?;

        Self::load_from_streams(
            manifest,
            BufReader::new(tile_reader),
            &tile_path.display().to_string(),
            BufReader::new(spawn_reader),
            &spawn_path.display().to_string(),
            config,
            services,
        )
    }

    /// Loads a map from already opened streams.
    ///
    /// `tile_source` and `spawn_source` only label error messages.
    pub fn load_from_streams<T: Read, S: Read>(
        manifest: MapManifest,
        mut tiles: T,
        tile_source: &str,
        mut spawns: S,
        spawn_source: &str,
        config: &TerrainConfig,
        services: &MapServices,
    ) -> MapResult<Self> {
        let mut loader = MapLoader::new(manifest, config, services);
        match loader.run(&mut tiles, tile_source, &mut spawns, spawn_source) {
            Ok(()) => loader.finish(),
            // dropping the loader releases whatever was created
            Err(err) => Err(loader.fail(err)),
        }
    }

    pub fn name(&self) -> &str {
        &self.manifest.name
    }

    pub fn manifest(&self) -> &MapManifest {
        &self.manifest
    }

    pub fn state(&self) -> MapState {
        self.state
    }

    pub fn grid(&self) -> &ChunkGrid {
        &self.grid
    }

    pub fn chunks(&self) -> &[MapChunk] {
        self.grid.chunks()
    }

    pub fn chunk(&self, x: usize, y: usize) -> Option<&MapChunk> {
        self.grid.chunk(x, y)
    }

    pub fn chunk_at(&self, pos: Vec2) -> Option<&MapChunk> {
        self.grid.chunk_at(pos)
    }

    pub fn tile_at(&self, pos: Vec2) -> Option<&MapTile> {
        self.grid.tile_at(pos)
    }

    pub fn height_at(&self, pos: Vec2) -> f32 {
        self.grid.height_at(pos)
    }

    pub fn min_height(&self) -> i16 {
        self.grid.min_height()
    }

    pub fn max_height(&self) -> i16 {
        self.grid.max_height()
    }

    pub fn spawns(&self) -> &[MapSpawn] {
        &self.spawns
    }

    /// Distinct texture atlas indices referenced by the map's tiles.
    pub fn texture_indices(&self) -> &[u32] {
        &self.texture_indices
    }

    /// Renderable chunk meshes, in chunk order.
    pub fn chunk_models(&self) -> impl Iterator<Item = MeshHandle> + '_ {
        self.chunk_models.iter().map(Owned::handle)
    }

    pub fn overview_texture(&self) -> Option<TextureHandle> {
        self.overview.as_ref().map(Owned::handle)
    }

    pub fn sky_textures(&self) -> impl Iterator<Item = TextureHandle> + '_ {
        self.sky_textures.iter().map(Owned::handle)
    }

    pub fn sky_model(&self) -> Option<ModelHandle> {
        self.sky_model.as_ref().map(Owned::handle)
    }
}

impl fmt::Debug for Map {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Map")
            .field("name", &self.manifest.name)
            .field("state", &self.state)
            .field("chunks", &self.grid.chunks().len())
            .field("spawns", &self.spawns.len())
            .field("overview", &self.overview)
            .field("sky_model", &self.sky_model)
            .finish_non_exhaustive()
    }
}

impl Drop for Map {
    fn drop(&mut self) {
        log::debug!("Releasing map \"{}\"...", self.manifest.name);
        self.chunk_models.clear();
        self.overview = None;
        self.sky_textures.clear();
        self.sky_model = None;
    }
}

impl<'a> MapLoader<'a> {
    fn new(manifest: MapManifest, config: &'a TerrainConfig, services: &'a MapServices) -> Self {
        Self {
            chunk_models: Vec::new(),
            overview: None,
            sky_textures: Vec::new(),
            sky_model: None,
            manifest,
            config,
            paths: services.paths.as_ref(),
            backend: services.backend.clone(),
            grid: None,
            spawns: Vec::new(),
            texture_indices: Vec::new(),
            state: MapState::Uninitialized,
        }
    }

    fn fail(&mut self, err: MapError) -> MapError {
        self.advance(MapState::Failed);
        log::error!("Failed to load map \"{}\": {}", self.manifest.name, err);
        err
    }

    fn advance(&mut self, next: MapState) {
        log::debug!("Map \"{}\": {:?} -> {:?}", self.manifest.name, self.state, next);
        self.state = next;
    }

    fn run(
        &mut self,
        tiles: &mut dyn Read,
        tile_source: &str,
        spawns: &mut dyn Read,
        spawn_source: &str,
    ) -> MapResult<()> {
        self.load_tiles(tiles, tile_source)?;
        self.advance(MapState::TilesLoaded);

        self.load_spawns(spawns, spawn_source)?;
        self.advance(MapState::SpawnsLoaded);

        self.load_textures();
        self.load_sky()?;

        self.generate_overview()?;
        self.advance(MapState::OverviewReady);

        Ok(())
    }

    fn load_tiles(&mut self, reader: &mut dyn Read, source: &str) -> MapResult<()> {
        let dims = self.config.dimensions;
        let decoded = decode_tiles(reader, &dims, source)?;
        let grid = ChunkGrid::new(dims, decoded)?;

        self.chunk_models.reserve(grid.chunks().len());
        for chunk in grid.chunks() {
            let mesh_name = format!("map_chunk_{}_{}", chunk.x, chunk.y);
            let handle = self
                .backend
                .create_mesh(&mesh_name, &chunk.mesh)
                .map_err(|detail| MapError::resource(&mesh_name, detail))?;
            self.chunk_models
                .push(Owned::new(handle, self.backend.clone()));
        }

        self.grid = Some(grid);
        Ok(())
    }

    fn load_spawns(&mut self, reader: &mut dyn Read, source: &str) -> MapResult<()> {
        self.spawns = decode_spawns(reader, self.config.max_spawns, source)?;
        Ok(())
    }

    /// Collects the texture atlas indices the renderer will need. Images
    /// themselves are bound by the rendering side.
    fn load_textures(&mut self) {
        let Some(grid) = &self.grid else {
            return;
        };

        let indices: BTreeSet<u32> = grid
            .chunks()
            .iter()
            .flat_map(|chunk| chunk.tiles.iter().map(|tile| tile.tex))
            .collect();
        self.texture_indices = indices.into_iter().collect();
        log::debug!(
            "Map \"{}\" references {} tile textures",
            self.manifest.name,
            self.texture_indices.len()
        );
    }

    fn load_sky(&mut self) -> MapResult<()> {
        for texture in self.manifest.sky_textures.clone() {
            let path = resolve(self.paths, &texture)?;
            let handle = self
                .backend
                .load_texture(&path)
                .map_err(|detail| MapError::resource(format!("sky texture {texture}"), detail))?;
            self.sky_textures
                .push(Owned::new(handle, self.backend.clone()));
        }

        let model = self
            .manifest
            .sky
            .clone()
            .unwrap_or_else(|| self.config.sky_model.clone());
        match self.backend.load_model(&model) {
            Some(handle) => self.sky_model = Some(Owned::new(handle, self.backend.clone())),
            None => log::warn!("Failed to load sky model \"{}\", continuing without", model),
        }

        Ok(())
    }

    fn generate_overview(&mut self) -> MapResult<()> {
        let grid = self
            .grid
            .as_ref()
            .ok_or_else(|| MapError::corrupt("overview", "no tiles loaded"))?;
        let image = overview::generate(grid)?;

        // the image moves into the backend and is not kept here
        let handle = self
            .backend
            .upload_texture("overview", image)
            .map_err(|detail| MapError::resource("overview texture", detail))?;
        self.overview = Some(Owned::new(handle, self.backend.clone()));
        Ok(())
    }

    fn finish(mut self) -> MapResult<Map> {
        let grid = self
            .grid
            .take()
            .ok_or_else(|| MapError::corrupt("chunk grid", "no tiles loaded"))?;
        self.advance(MapState::Ready);

        log::info!(
            "Loaded map \"{}\": {} chunks, {} spawns, heights {}..={}",
            self.manifest.name,
            grid.chunks().len(),
            self.spawns.len(),
            grid.min_height(),
            grid.max_height()
        );

        Ok(Map {
            chunk_models: std::mem::take(&mut self.chunk_models),
            overview: self.overview.take(),
            sky_textures: std::mem::take(&mut self.sky_textures),
            sky_model: self.sky_model.take(),
            manifest: self.manifest.clone(),
            grid,
            spawns: std::mem::take(&mut self.spawns),
            texture_indices: std::mem::take(&mut self.texture_indices),
            state: self.state,
        })
    }
}

impl Drop for MapLoader<'_> {
    fn drop(&mut self) {
        self.chunk_models.clear();
        self.overview = None;
        self.sky_textures.clear();
        self.sky_model = None;
    }
}

fn resolve(paths: &dyn PathResolver, logical: &str) -> MapResult<std::path::PathBuf> {
    paths.resolve(logical).ok_or_else(|| MapError::NotFound {
        what: "asset",
        name: logical.to_string(),
    })
}

fn open(path: &Path) -> MapResult<File> {
    File::open(path).map_err(|source| MapError::Open {
        path: path.to_path_buf(),
        source,
    })
}

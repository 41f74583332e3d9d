//! Map descriptors and the registry that looks them up by name.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::error::{MapError, MapResult};

bitflags! {
    /// Game modes a map can be played in
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
    pub struct MapModes: u32 {
        const SINGLEPLAYER = 1 << 0;
        const DEATHMATCH = 1 << 1;
        const SURVIVAL_NOVICE = 1 << 2;
        const SURVIVAL_EXPERT = 1 << 3;
        const SURVIVAL_STRATEGY = 1 << 4;
        /// procedurally generated terrain
        const GENERATED = 1 << 5;
        const EDITOR = 1 << 6;
    }
}

/// Serialized spelling of a single [`MapModes`] bit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MapMode {
    Singleplayer,
    Deathmatch,
    SurvivalNovice,
    SurvivalExpert,
    SurvivalStrategy,
    Generated,
    Editor,
}

impl From<MapMode> for MapModes {
    fn from(mode: MapMode) -> Self {
        match mode {
            MapMode::Singleplayer => MapModes::SINGLEPLAYER,
            MapMode::Deathmatch => MapModes::DEATHMATCH,
            MapMode::SurvivalNovice => MapModes::SURVIVAL_NOVICE,
            MapMode::SurvivalExpert => MapModes::SURVIVAL_EXPERT,
            MapMode::SurvivalStrategy => MapModes::SURVIVAL_STRATEGY,
            MapMode::Generated => MapModes::GENERATED,
            MapMode::Editor => MapModes::EDITOR,
        }
    }
}

/// Descriptor for one map, read from `<name>.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapManifest {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub modes: Vec<MapMode>,
    /// sky backdrop model; the configured default when absent
    #[serde(default)]
    pub sky: Option<String>,
    /// logical names of sky textures, loaded in order
    #[serde(default)]
    pub sky_textures: Vec<String>,
}

impl MapManifest {
    /// A bare descriptor with no modes, sky overrides or description.
    pub fn named(name: &str) -> Self {
        Self {
            name: name.to_string(),
            description: String::new(),
            modes: Vec::new(),
            sky: None,
            sky_textures: Vec::new(),
        }
    }

    pub fn modes(&self) -> MapModes {
        self.modes
            .iter()
            .fold(MapModes::empty(), |acc, &mode| acc | MapModes::from(mode))
    }

    pub fn supports(&self, modes: MapModes) -> bool {
        self.modes().intersects(modes)
    }
}

/// Known maps, keyed by name.
#[derive(Debug, Clone, Default)]
pub struct ManifestRegistry {
    manifests: BTreeMap<String, MapManifest>,
}

impl ManifestRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a manifest, returning the one it replaced.
    pub fn register(&mut self, manifest: MapManifest) -> Option<MapManifest> {
        self.manifests.insert(manifest.name.clone(), manifest)
    }

    pub fn get(&self, name: &str) -> Option<&MapManifest> {
        self.manifests.get(name)
    }

    pub fn len(&self) -> usize {
        self.manifests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.manifests.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.manifests.keys().map(String::as_str)
    }

    pub fn register_json(&mut self, json: &str, source: &str) -> MapResult<&MapManifest> {
        let manifest: MapManifest = serde_json::from_str(json)
            .map_err(|e| MapError::corrupt("map manifest", format!("{source}: {e}")))?;
        let name = manifest.name.clone();
        self.register(manifest);
        self.manifests
            .get(&name)
            .ok_or_else(|| MapError::corrupt("map manifest", format!("{source}: not registered")))
    }

    /// Registers every `*.json` file in `dir`.
    ///
    /// # Returns
    /// * The number of manifests read.
    pub fn load_dir(&mut self, dir: &Path) -> MapResult<usize> {
        let entries = fs::read_dir(dir).map_err(|source| MapError::Open {
            path: dir.to_path_buf(),
            source,
        })?;

        let mut paths = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|source| MapError::Open {
                path: dir.to_path_buf(),
                source,
            })?;
            let path = entry.path();
            let is_json = path
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
            if is_json && path.is_file() {
                paths.push(path);
            }
        }
        paths.sort();

        for path in &paths {
            let json = fs::read_to_string(path).map_err(|source| MapError::Open {
                path: path.clone(),
                source,
            })?;
            let manifest = self.register_json(&json, &path.display().to_string())?;
            log::debug!("Registered map manifest \"{}\"", manifest.name);
        }

        log::info!("Loaded {} map manifests from {}", paths.len(), dir.display());
        Ok(paths.len())
    }
}

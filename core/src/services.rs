//! Collaborators the map lifecycle depends on.
//!
//! The core never talks to a graphics API or the filesystem layout directly.
//! A [`PathResolver`] turns logical asset names into paths and a
//! [`RenderBackend`] turns geometry and images into opaque handles. Both are
//! constructed by the caller and passed in through [`MapServices`].

use std::collections::HashMap;
use std::fmt;
use std::path::{Component, Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use image::RgbImage;

use crate::manifest::ManifestRegistry;
use crate::mesh::ChunkMesh;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MeshHandle(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureHandle(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ModelHandle(pub u32);

/// Maps a logical asset name such as `maps/estu/estu.pmg` to a file.
pub trait PathResolver: Send + Sync {
    /// Returns `None` when no such asset exists.
    fn resolve(&self, logical: &str) -> Option<PathBuf>;
}

/// Resolves logical names relative to a base directory.
#[derive(Debug, Clone)]
pub struct DirectoryResolver {
    base: PathBuf,
}

impl DirectoryResolver {
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self { base: base.into() }
    }

    pub fn base(&self) -> &Path {
        &self.base
    }
}

impl PathResolver for DirectoryResolver {
    /// Only relative names without `..` resolve; anything that could leave
    /// the base directory is treated as missing.
    fn resolve(&self, logical: &str) -> Option<PathBuf> {
        let relative = Path::new(logical);
        let contained = relative
            .components()
            .all(|c| matches!(c, Component::Normal(_) | Component::CurDir));
        if !contained {
            log::warn!("Refusing to resolve \"{}\" outside {}", logical, self.base.display());
            return None;
        }

        let path = self.base.join(relative);
        if path.is_file() { Some(path) } else { None }
    }
}

/// Mesh, texture and model creation on the rendering side.
///
/// Every handle returned must eventually be passed back to the matching
/// `delete_*` call; [`Owned`] does that automatically.
pub trait RenderBackend: Send + Sync {
    fn create_mesh(&self, name: &str, mesh: &ChunkMesh) -> Result<MeshHandle, String>;
    fn delete_mesh(&self, handle: MeshHandle);

    /// Uploads an RGB image. The image is consumed; the core keeps no copy.
    fn upload_texture(&self, name: &str, image: RgbImage) -> Result<TextureHandle, String>;
    fn load_texture(&self, path: &Path) -> Result<TextureHandle, String>;
    fn delete_texture(&self, handle: TextureHandle);

    /// Returns `None` if the model is unavailable.
    fn load_model(&self, name: &str) -> Option<ModelHandle>;
    fn delete_model(&self, handle: ModelHandle);
}

/// A handle that knows how to give itself back to the backend.
pub trait BackendHandle: Copy + fmt::Debug {
    fn release(self, backend: &dyn RenderBackend);
}

impl BackendHandle for MeshHandle {
    fn release(self, backend: &dyn RenderBackend) {
        backend.delete_mesh(self);
    }
}

impl BackendHandle for TextureHandle {
    fn release(self, backend: &dyn RenderBackend) {
        backend.delete_texture(self);
    }
}

impl BackendHandle for ModelHandle {
    fn release(self, backend: &dyn RenderBackend) {
        backend.delete_model(self);
    }
}

/// Owns one backend resource and releases it on drop.
pub struct Owned<H: BackendHandle> {
    handle: H,
    backend: Arc<dyn RenderBackend>,
}

impl<H: BackendHandle> Owned<H> {
    pub fn new(handle: H, backend: Arc<dyn RenderBackend>) -> Self {
        Self { handle, backend }
    }

    pub fn handle(&self) -> H {
        self.handle
    }
}

impl<H: BackendHandle> fmt::Debug for Owned<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Owned").field(&self.handle).finish()
    }
}

impl<H: BackendHandle> Drop for Owned<H> {
    fn drop(&mut self) {
        self.handle.release(self.backend.as_ref());
    }
}

/// Everything a map load needs from the outside world.
#[derive(Clone)]
pub struct MapServices {
    pub paths: Arc<dyn PathResolver>,
    pub backend: Arc<dyn RenderBackend>,
    pub manifests: Arc<ManifestRegistry>,
}

impl MapServices {
    pub fn new(
        paths: Arc<dyn PathResolver>,
        backend: Arc<dyn RenderBackend>,
        manifests: Arc<ManifestRegistry>,
    ) -> Self {
        Self {
            paths,
            backend,
            manifests,
        }
    }
}

// =============================================================================
// Headless backend
// =============================================================================

/// One call made against a [`HeadlessBackend`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendEvent {
    CreateMesh(MeshHandle, String),
    DeleteMesh(MeshHandle),
    UploadTexture(TextureHandle, String),
    LoadTexture(TextureHandle, PathBuf),
    DeleteTexture(TextureHandle),
    LoadModel(ModelHandle, String),
    DeleteModel(ModelHandle),
}

#[derive(Default)]
struct HeadlessState {
    next_id: u32,
    meshes: HashMap<MeshHandle, ChunkMesh>,
    textures: HashMap<TextureHandle, Option<RgbImage>>,
    models: HashMap<ModelHandle, String>,
    events: Vec<BackendEvent>,
}

impl HeadlessState {
    fn next(&mut self) -> u32 {
        self.next_id += 1;
        self.next_id
    }
}

/// A renderer stand-in for dedicated servers and tools.
///
/// Keeps uploaded geometry and images in memory, records every call, and can
/// be told to refuse mesh creation after a number of meshes or to report
/// models as missing.
#[derive(Default)]
pub struct HeadlessBackend {
    state: Mutex<HeadlessState>,
    mesh_budget: Option<usize>,
    known_models: Option<Vec<String>>,
}

impl HeadlessBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fails every `create_mesh` call after `budget` successful ones.
    pub fn with_mesh_budget(mut self, budget: usize) -> Self {
        self.mesh_budget = Some(budget);
        self
    }

    /// Only the listed models load; everything else reports missing.
    pub fn with_models(mut self, models: &[&str]) -> Self {
        self.known_models = Some(models.iter().map(|m| m.to_string()).collect());
        self
    }

    fn lock(&self) -> MutexGuard<'_, HeadlessState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn events(&self) -> Vec<BackendEvent> {
        self.lock().events.clone()
    }

    pub fn live_meshes(&self) -> usize {
        self.lock().meshes.len()
    }

    pub fn live_textures(&self) -> usize {
        self.lock().textures.len()
    }

    pub fn live_models(&self) -> usize {
        self.lock().models.len()
    }

    pub fn mesh(&self, handle: MeshHandle) -> Option<ChunkMesh> {
        self.lock().meshes.get(&handle).cloned()
    }

    /// Image behind an uploaded texture, if it is still alive.
    pub fn texture_image(&self, handle: TextureHandle) -> Option<RgbImage> {
        self.lock().textures.get(&handle).cloned().flatten()
    }
}

impl RenderBackend for HeadlessBackend {
    fn create_mesh(&self, name: &str, mesh: &ChunkMesh) -> Result<MeshHandle, String> {
        let mut state = self.lock();
        if let Some(budget) = self.mesh_budget {
            let created = state
                .events
                .iter()
                .filter(|e| matches!(e, BackendEvent::CreateMesh(..)))
                .count();
            if created >= budget {
                return Err(format!("mesh budget of {budget} exhausted"));
            }
        }

        let handle = MeshHandle(state.next());
        state.meshes.insert(handle, mesh.clone());
        state
            .events
            .push(BackendEvent::CreateMesh(handle, name.to_string()));
        Ok(handle)
    }

    fn delete_mesh(&self, handle: MeshHandle) {
        let mut state = self.lock();
        if state.meshes.remove(&handle).is_none() {
            log::warn!("Deleting unknown mesh {:?}", handle);
        }
        state.events.push(BackendEvent::DeleteMesh(handle));
    }

    fn upload_texture(&self, name: &str, image: RgbImage) -> Result<TextureHandle, String> {
        if image.width() == 0 || image.height() == 0 {
            return Err(format!("texture \"{name}\" has no pixels"));
        }

        let mut state = self.lock();
        let handle = TextureHandle(state.next());
        state.textures.insert(handle, Some(image));
        state
            .events
            .push(BackendEvent::UploadTexture(handle, name.to_string()));
        Ok(handle)
    }

    fn load_texture(&self, path: &Path) -> Result<TextureHandle, String> {
        if !path.is_file() {
            return Err(format!("texture \"{}\" doesn't exist", path.display()));
        }

        let mut state = self.lock();
        let handle = TextureHandle(state.next());
        state.textures.insert(handle, None);
        state
            .events
            .push(BackendEvent::LoadTexture(handle, path.to_path_buf()));
        Ok(handle)
    }

    fn delete_texture(&self, handle: TextureHandle) {
        let mut state = self.lock();
        if state.textures.remove(&handle).is_none() {
            log::warn!("Deleting unknown texture {:?}", handle);
        }
        state.events.push(BackendEvent::DeleteTexture(handle));
    }

    fn load_model(&self, name: &str) -> Option<ModelHandle> {
        if let Some(known) = &self.known_models {
            if !known.iter().any(|m| m == name) {
                return None;
            }
        }

        let mut state = self.lock();
        let handle = ModelHandle(state.next());
        state.models.insert(handle, name.to_string());
        state
            .events
            .push(BackendEvent::LoadModel(handle, name.to_string()));
        Some(handle)
    }

    fn delete_model(&self, handle: ModelHandle) {
        let mut state = self.lock();
        if state.models.remove(&handle).is_none() {
            log::warn!("Deleting unknown model {:?}", handle);
        }
        state.events.push(BackendEvent::DeleteModel(handle));
    }
}

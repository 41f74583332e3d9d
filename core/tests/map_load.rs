use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use terrain_core::constants::{
    CHUNK_RESERVED_SIZE, CHUNK_TILES, CHUNK_VERTICES, OVERVIEW_MINE_COLOUR, SPAWN_RECORD_SIZE,
    TILE_RECORD_SIZE, TileFlags,
};
use terrain_core::services::BackendEvent;
use terrain_core::{
    DirectoryResolver, ErrorKind, HeadlessBackend, ManifestRegistry, Map, MapManifest,
    MapServices, MapState, TerrainConfig, TileType, Vec2,
};

fn unique_temp_dir(prefix: &str) -> PathBuf {
    let pid = std::process::id();
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    std::env::temp_dir().join(format!("{prefix}_{pid}_{nanos}"))
}

/// Vertex `i` of chunk `(cx, cy)` sits at height `cx + cy * 16 + i`.
fn vertex_height(cx: usize, cy: usize, i: usize) -> i16 {
    (cx + cy * 16 + i) as i16
}

/// A full 16x16 chunk tile stream. Tile `t` of every chunk has type
/// `t % 12`; the very first tile also carries a mine.
fn tile_stream() -> Vec<u8> {
    let mut bytes = Vec::new();
    for cy in 0..16 {
        for cx in 0..16 {
            for v in [cx as u16, cy as u16, 0, 0] {
                bytes.extend_from_slice(&v.to_le_bytes());
            }
            for i in 0..CHUNK_VERTICES {
                bytes.extend_from_slice(&vertex_height(cx, cy, i).to_le_bytes());
                bytes.extend_from_slice(&0u16.to_le_bytes());
            }
            bytes.extend_from_slice(&[0; CHUNK_RESERVED_SIZE]);
            for t in 0..CHUNK_TILES {
                let mut tile = [0u8; TILE_RECORD_SIZE];
                tile[6] = (t % 12) as u8;
                if cx == 0 && cy == 0 && t == 0 {
                    tile[6] |= TileFlags::MINE.bits();
                }
                tile[11..15].copy_from_slice(&(t as u32).to_le_bytes());
                bytes.extend_from_slice(&tile);
            }
        }
    }
    bytes
}

fn spawn_stream(names: &[&str]) -> Vec<u8> {
    let mut bytes = (names.len() as u16).to_le_bytes().to_vec();
    for (i, name) in names.iter().enumerate() {
        let mut record = [0u8; SPAWN_RECORD_SIZE];
        record[..name.len()].copy_from_slice(name.as_bytes());
        // name, 16 reserved bytes, then position
        record[32..34].copy_from_slice(&(i as i16 * 512).to_le_bytes());
        bytes.extend_from_slice(&record);
    }
    bytes
}

struct Fixture {
    dir: PathBuf,
    backend: Arc<HeadlessBackend>,
    services: MapServices,
}

impl Fixture {
    fn new(prefix: &str, backend: HeadlessBackend, manifests: ManifestRegistry) -> Self {
        let dir = unique_temp_dir(prefix);
        fs::create_dir_all(&dir).unwrap();
        let backend = Arc::new(backend);
        let services = MapServices::new(
            Arc::new(DirectoryResolver::new(&dir)),
            backend.clone(),
            Arc::new(manifests),
        );
        Self {
            dir,
            backend,
            services,
        }
    }

    fn write(&self, logical: &str, bytes: &[u8]) {
        let path = self.dir.join(logical);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, bytes).unwrap();
    }

    fn write_map(&self, name: &str, tiles: &[u8], spawns: &[u8]) {
        self.write(&format!("maps/{name}/{name}.pmg"), tiles);
        self.write(&format!("maps/{name}/{name}.pog"), spawns);
    }

    fn config(&self) -> TerrainConfig {
        TerrainConfig {
            data_dir: self.dir.clone(),
            ..Default::default()
        }
    }

    fn load(&self, name: &str) -> terrain_core::MapResult<Map> {
        Map::load(name, &self.config(), &self.services)
    }
}

impl Drop for Fixture {
    fn drop(&mut self) {
        let _ = fs::remove_dir_all(&self.dir);
    }
}

fn registry_with(manifest: MapManifest) -> ManifestRegistry {
    let mut registry = ManifestRegistry::new();
    registry.register(manifest);
    registry
}

fn is_under(path: &Path, dir: &Path) -> bool {
    path.starts_with(dir)
}

#[test]
fn loads_full_map_from_disk() {
    let fixture = Fixture::new(
        "terrain_full",
        HeadlessBackend::new(),
        registry_with(MapManifest::named("estu")),
    );
    fixture.write_map("estu", &tile_stream(), &spawn_stream(&["gr_ME", "crate1"]));

    let map = fixture.load("estu").unwrap();

    assert_eq!(map.state(), MapState::Ready);
    assert_eq!(map.chunks().len(), 256);
    assert_eq!(map.chunk_models().count(), 256);
    assert_eq!(map.min_height(), 0);
    assert_eq!(map.max_height(), vertex_height(15, 15, 24));
    assert_eq!(map.texture_indices(), (0..16).collect::<Vec<u32>>().as_slice());

    assert_eq!(map.spawns().len(), 2);
    assert_eq!(map.spawns()[0].class_name(), "gr_ME");
    assert_eq!(map.spawns()[1].class_name(), "crate1");
    assert_eq!(map.spawns()[1].position, [512, 0, 0]);
    assert_eq!(map.spawns()[0].raw.len(), SPAWN_RECORD_SIZE);

    let chunk = map.chunk(3, 2).unwrap();
    assert_eq!((chunk.x, chunk.y), (3, 2));
    assert_eq!(chunk.offset[0], 3);

    // chunk (1, 0), tile 0, top-left corner
    assert_eq!(map.height_at(Vec2::new(2048.0, 0.0)), 1.0);
    // centre of chunk (0, 0) tile 0: corners 0, 1, 5, 6
    assert_eq!(map.height_at(Vec2::new(256.0, 256.0)), 3.0);
    assert_eq!(map.height_at(Vec2::new(-1.0, 0.0)), 0.0);

    let tile = map.tile_at(Vec2::new(512.0 * 5.0, 0.0)).unwrap();
    assert_eq!(tile.tile_type, TileType::from_u8(1).unwrap());
    assert!(map.tile_at(Vec2::new(0.0, 0.0)).unwrap().has_mine());
}

#[test]
fn chunk_meshes_carry_vertex_heights() {
    let fixture = Fixture::new(
        "terrain_meshes",
        HeadlessBackend::new(),
        registry_with(MapManifest::named("estu")),
    );
    fixture.write_map("estu", &tile_stream(), &spawn_stream(&[]));
    let map = fixture.load("estu").unwrap();

    let handles: Vec<_> = map.chunk_models().collect();
    let mesh = fixture.backend.mesh(handles[17]).unwrap();
    // chunk 17 is (1, 1)
    for i in 0..CHUNK_VERTICES {
        assert_eq!(mesh.positions[i][1], vertex_height(1, 1, i) as f32);
    }
    assert_eq!(mesh.translation, [2048.0, 0.0, 2048.0]);
    assert_eq!(mesh.world_position(24), [4096.0, vertex_height(1, 1, 24) as f32, 4096.0]);
}

#[test]
fn mined_tile_is_red_on_overview() {
    let fixture = Fixture::new(
        "terrain_overview",
        HeadlessBackend::new(),
        registry_with(MapManifest::named("estu")),
    );
    fixture.write_map("estu", &tile_stream(), &spawn_stream(&[]));
    let map = fixture.load("estu").unwrap();

    let overview = map
        .overview_texture()
        .and_then(|handle| fixture.backend.texture_image(handle))
        .unwrap();
    assert_eq!(overview.dimensions(), (64, 64));
    assert_eq!(overview.get_pixel(0, 0).0, OVERVIEW_MINE_COLOUR);
    assert_ne!(overview.get_pixel(1, 0).0, OVERVIEW_MINE_COLOUR);
}

#[test]
fn drop_releases_in_order() {
    let mut manifest = MapManifest::named("estu");
    manifest.sky_textures = vec!["skys/estu0.tim".to_string()];
    let fixture = Fixture::new(
        "terrain_release",
        HeadlessBackend::new(),
        registry_with(manifest),
    );
    fixture.write_map("estu", &tile_stream(), &spawn_stream(&[]));
    fixture.write("skys/estu0.tim", b"TIM");

    let map = fixture.load("estu").unwrap();
    let overview = map.overview_texture().unwrap();
    let sky_texture = map.sky_textures().next().unwrap();
    let sky_model = map.sky_model().unwrap();
    let loaded = fixture.backend.events().len();

    let sky_path = fixture
        .backend
        .events()
        .iter()
        .find_map(|e| match e {
            BackendEvent::LoadTexture(_, path) => Some(path.clone()),
            _ => None,
        })
        .unwrap();
    assert!(is_under(&sky_path, &fixture.dir));

    drop(map);

    let released = fixture.backend.events().split_off(loaded);
    assert_eq!(released.len(), 256 + 3);
    assert!(
        released[..256]
            .iter()
            .all(|e| matches!(e, BackendEvent::DeleteMesh(_)))
    );
    assert_eq!(released[256], BackendEvent::DeleteTexture(overview));
    assert_eq!(released[257], BackendEvent::DeleteTexture(sky_texture));
    assert_eq!(released[258], BackendEvent::DeleteModel(sky_model));

    assert_eq!(fixture.backend.live_meshes(), 0);
    assert_eq!(fixture.backend.live_textures(), 0);
    assert_eq!(fixture.backend.live_models(), 0);
}

#[test]
fn corrupt_tile_type_fails_without_leaks() {
    let fixture = Fixture::new(
        "terrain_corrupt",
        HeadlessBackend::new(),
        registry_with(MapManifest::named("estu")),
    );
    let mut tiles = tile_stream();
    // type byte of the first tile in the last chunk
    let last_chunk = tiles.len() - CHUNK_TILES * TILE_RECORD_SIZE;
    tiles[last_chunk + 6] = 0xFF;
    fixture.write_map("estu", &tiles, &spawn_stream(&[]));

    let err = fixture.load("estu").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Corruption);
    assert!(err.to_string().contains("estu.pmg"));
    assert_eq!(fixture.backend.live_meshes(), 0);
    assert_eq!(fixture.backend.live_textures(), 0);
}

#[test]
fn mesh_creation_failure_releases_created_meshes() {
    let fixture = Fixture::new(
        "terrain_budget",
        HeadlessBackend::new().with_mesh_budget(10),
        registry_with(MapManifest::named("estu")),
    );
    fixture.write_map("estu", &tile_stream(), &spawn_stream(&[]));

    let err = fixture.load("estu").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Resource);
    assert!(err.to_string().contains("map_chunk_10_0"));

    let deleted = fixture
        .backend
        .events()
        .iter()
        .filter(|e| matches!(e, BackendEvent::DeleteMesh(_)))
        .count();
    assert_eq!(deleted, 10);
    assert_eq!(fixture.backend.live_meshes(), 0);
}

#[test]
fn truncated_tile_stream_is_truncation() {
    let fixture = Fixture::new(
        "terrain_short_pmg",
        HeadlessBackend::new(),
        registry_with(MapManifest::named("estu")),
    );
    let tiles = tile_stream();
    fixture.write_map("estu", &tiles[..tiles.len() - 1], &spawn_stream(&[]));

    let err = fixture.load("estu").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Truncation);
    assert_eq!(fixture.backend.live_meshes(), 0);
}

#[test]
fn truncated_spawn_stream_is_truncation() {
    let fixture = Fixture::new(
        "terrain_short_pog",
        HeadlessBackend::new(),
        registry_with(MapManifest::named("estu")),
    );
    let mut spawns = spawn_stream(&["gr_ME", "gr_ME"]);
    spawns.truncate(spawns.len() - 1);
    fixture.write_map("estu", &tile_stream(), &spawns);

    let err = fixture.load("estu").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Truncation);
    assert_eq!(fixture.backend.live_meshes(), 0);
}

#[test]
fn missing_descriptor_is_reported() {
    let fixture = Fixture::new("terrain_no_manifest", HeadlessBackend::new(), ManifestRegistry::new());
    fixture.write_map("estu", &tile_stream(), &spawn_stream(&[]));

    let err = fixture.load("estu").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Io);
    assert!(err.to_string().contains("map descriptor"));
    assert!(fixture.backend.events().is_empty());
}

#[test]
fn missing_spawn_stream_is_io() {
    let fixture = Fixture::new(
        "terrain_no_pog",
        HeadlessBackend::new(),
        registry_with(MapManifest::named("estu")),
    );
    fixture.write("maps/estu/estu.pmg", &tile_stream());

    let err = fixture.load("estu").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Io);
    assert!(err.to_string().contains("estu.pog"));
    assert!(fixture.backend.events().is_empty());
}

#[test]
fn manifests_load_from_directory() {
    let fixture = Fixture::new("terrain_manifests", HeadlessBackend::new(), ManifestRegistry::new());
    fixture.write(
        "maps/estu.json",
        br#"{ "name": "estu", "description": "Estuary", "modes": ["singleplayer"] }"#,
    );
    fixture.write("maps/readme.txt", b"not a manifest");

    let mut registry = ManifestRegistry::new();
    assert_eq!(registry.load_dir(&fixture.dir.join("maps")).unwrap(), 1);
    assert_eq!(registry.get("estu").unwrap().description, "Estuary");
}

#[test]
fn maps_can_be_queried_from_many_threads() {
    let fixture = Fixture::new(
        "terrain_threads",
        HeadlessBackend::new(),
        registry_with(MapManifest::named("estu")),
    );
    fixture.write_map("estu", &tile_stream(), &spawn_stream(&[]));
    let map = fixture.load("estu").unwrap();
    let expected = map.height_at(Vec2::new(10_000.5, 20_000.25));

    std::thread::scope(|scope| {
        for _ in 0..4 {
            scope.spawn(|| {
                for _ in 0..100 {
                    assert_eq!(map.height_at(Vec2::new(10_000.5, 20_000.25)), expected);
                }
            });
        }
    });
}

#[test]
fn sky_texture_outside_data_dir_is_not_loaded() {
    let mut manifest = MapManifest::named("estu");
    manifest.sky_textures = vec!["../estu_sky.tim".to_string()];
    let fixture = Fixture::new(
        "terrain_escape",
        HeadlessBackend::new(),
        registry_with(manifest),
    );
    fixture.write_map("estu", &tile_stream(), &spawn_stream(&[]));
    let outside = fixture.dir.with_file_name("estu_sky.tim");
    fs::write(&outside, b"TIM").unwrap();

    let result = fixture.load("estu");
    let _ = fs::remove_file(&outside);

    let err = result.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Io);
    assert!(err.to_string().contains("../estu_sky.tim"));
    assert!(
        !fixture
            .backend
            .events()
            .iter()
            .any(|e| matches!(e, BackendEvent::LoadTexture(..)))
    );
    assert_eq!(fixture.backend.live_meshes(), 0);
}

//! Decoders for the tile (`.pmg`) and spawn (`.pog`) streams.
//!
//! Both streams are scanned strictly in order: there is no index, every
//! record starts where the previous one ended.

use std::io::Read;

use crate::byte_operations::read_record;
use crate::constants::{
    CHUNK_HEADER_SIZE, CHUNK_RESERVED_SIZE, CHUNK_ROW_TILES, CHUNK_TILES, CHUNK_VERTICES,
    MAX_TILE_TYPES, SPAWN_COUNT_SIZE, SPAWN_RECORD_SIZE, TILE_RECORD_SIZE, VERTEX_RECORD_SIZE,
};
use crate::error::{MapError, MapResult};
use crate::mesh::ChunkMesh;
use crate::types::{
    MapChunk, MapDimensions, MapSpawn, MapTile, MapVertex, TileType, tile_corner_indices,
    unpack_type_byte,
};

/// Chunk header: three u16 offsets and a reserved u16.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct ChunkHeader {
    x: u16,
    y: u16,
    z: u16,
}

impl ChunkHeader {
    fn from_bytes(bytes: &[u8; CHUNK_HEADER_SIZE]) -> Self {
        let mut offset: usize = 0;
        let header = Self {
            x: read_u16!(bytes, offset),
            y: read_u16!(bytes, offset),
            z: read_u16!(bytes, offset),
        };
        skip_bytes!(offset, 2);
        debug_assert_eq!(offset, CHUNK_HEADER_SIZE);
        header
    }
}

/// Splits the 25 vertex records of a chunk, row-major.
fn decode_vertices(
    bytes: &[u8; CHUNK_VERTICES * VERTEX_RECORD_SIZE],
) -> [MapVertex; CHUNK_VERTICES] {
    let mut offset: usize = 0;
    let mut vertices = [MapVertex::default(); CHUNK_VERTICES];
    for vertex in vertices.iter_mut() {
        vertex.height = read_i16!(bytes, offset);
        vertex.lighting = read_u16!(bytes, offset);
    }
    debug_assert_eq!(offset, bytes.len());
    vertices
}

/// The fields of a tile record that carry data; the rest is reserved.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct TileRecord {
    packed_type: u8,
    slip: u8,
    rotation: u8,
    texture: u32,
}

impl TileRecord {
    fn from_bytes(bytes: &[u8; TILE_RECORD_SIZE]) -> Self {
        let mut offset: usize = 0;

        skip_bytes!(offset, 6);
        let packed_type = read_u8!(bytes, offset);
        let slip = read_u8!(bytes, offset);
        skip_bytes!(offset, 2);
        let rotation = read_u8!(bytes, offset);
        let texture = read_u32!(bytes, offset);
        skip_bytes!(offset, 1);
        debug_assert_eq!(offset, TILE_RECORD_SIZE);

        Self {
            packed_type,
            slip,
            rotation,
            texture,
        }
    }
}

/// Result of scanning a tile stream.
#[derive(Debug, Clone)]
pub struct DecodedTiles {
    /// row-major, x fastest
    pub chunks: Vec<MapChunk>,
    pub min_height: i16,
    pub max_height: i16,
}

/// Decodes `dims.chunk_count()` chunk records from a tile stream.
///
/// # Arguments
/// * `reader` - Stream positioned at the first chunk record.
/// * `dims` - Grid size; decides how many chunks are read.
/// * `source` - Path of the stream, used in error messages.
///
/// # Returns
/// * The chunks in row-major order and the height extremes over every vertex
///   read, or the first truncation/corruption encountered.
pub fn decode_tiles<R: Read + ?Sized>(
    reader: &mut R,
    dims: &MapDimensions,
    source: &str,
) -> MapResult<DecodedTiles> {
    let mut chunks = Vec::with_capacity(dims.chunk_count());
    let mut min_height = i16::MAX;
    let mut max_height = i16::MIN;

    for chunk_y in 0..dims.chunk_row {
        for chunk_x in 0..dims.chunk_row {
            let chunk = decode_chunk(reader, chunk_x, chunk_y, dims, source)?;

            let (lo, hi) = chunk.height_range();
            min_height = min_height.min(lo);
            max_height = max_height.max(hi);

            chunks.push(chunk);
        }
    }

    log::debug!(
        "Decoded {} chunks from {} (heights {}..={})",
        chunks.len(),
        source,
        min_height,
        max_height
    );

    Ok(DecodedTiles {
        chunks,
        min_height,
        max_height,
    })
}

fn decode_chunk<R: Read + ?Sized>(
    reader: &mut R,
    chunk_x: usize,
    chunk_y: usize,
    dims: &MapDimensions,
    source: &str,
) -> MapResult<MapChunk> {
    let mut header_bytes = [0u8; CHUNK_HEADER_SIZE];
    read_record(reader, &mut header_bytes, "chunk header", source)?;
    let header = ChunkHeader::from_bytes(&header_bytes);

    let mut vertex_bytes = [0u8; CHUNK_VERTICES * VERTEX_RECORD_SIZE];
    read_record(reader, &mut vertex_bytes, "vertex records", source)?;
    let vertices = decode_vertices(&vertex_bytes);

    let mut reserved = [0u8; CHUNK_RESERVED_SIZE];
    read_record(reader, &mut reserved, "chunk padding", source)?;

    let mut tiles = [MapTile::default(); CHUNK_TILES];
    for tile_y in 0..CHUNK_ROW_TILES {
        for tile_x in 0..CHUNK_ROW_TILES {
            let mut tile_bytes = [0u8; TILE_RECORD_SIZE];
            read_record(reader, &mut tile_bytes, "tile record", source)?;
            let record = TileRecord::from_bytes(&tile_bytes);

            let (raw_type, flags) = unpack_type_byte(record.packed_type);
            let tile_type = TileType::from_u8(raw_type).ok_or_else(|| {
                MapError::corrupt(
                    "tile record",
                    format!(
                        "invalid tile type {} (max {}) at chunk ({}, {}) tile ({}, {}) in {}",
                        raw_type,
                        MAX_TILE_TYPES - 1,
                        chunk_x,
                        chunk_y,
                        tile_x,
                        tile_y,
                        source
                    ),
                )
            })?;

            let corners = tile_corner_indices(tile_x, tile_y);
            tiles[tile_x + tile_y * CHUNK_ROW_TILES] = MapTile {
                tile_type,
                flags,
                flip: record.rotation,
                // TODO: derive slip once its encoding in the packed record is known
                slip: 0,
                tex: record.texture,
                height: corners.map(|idx| vertices[idx].height),
            };

            if record.slip != 0 {
                log::trace!(
                    "Ignoring slip byte {} at chunk ({}, {}) tile ({}, {})",
                    record.slip,
                    chunk_x,
                    chunk_y,
                    tile_x,
                    tile_y
                );
            }
        }
    }

    let mesh = ChunkMesh::build(chunk_x, chunk_y, &vertices, dims);

    Ok(MapChunk {
        x: chunk_x,
        y: chunk_y,
        offset: [header.x, header.y, header.z],
        vertices,
        tiles,
        mesh,
    })
}

/// Decodes the spawn stream: a u16 count followed by that many records.
///
/// # Arguments
/// * `reader` - Stream positioned at the count field.
/// * `max_spawns` - Configured capacity; a larger count is treated as corruption.
/// * `source` - Path of the stream, used in error messages.
pub fn decode_spawns<R: Read + ?Sized>(
    reader: &mut R,
    max_spawns: usize,
    source: &str,
) -> MapResult<Vec<MapSpawn>> {
    let mut count_bytes = [0u8; SPAWN_COUNT_SIZE];
    read_record(reader, &mut count_bytes, "spawn count", source)?;
    let count = u16::from_le_bytes(count_bytes) as usize;

    if count > max_spawns {
        return Err(MapError::corrupt(
            "spawn count",
            format!("{} has {} spawns, limit is {}", source, count, max_spawns),
        ));
    }

    let mut spawns = Vec::with_capacity(count);
    let mut record = [0u8; SPAWN_RECORD_SIZE];
    for _ in 0..count {
        read_record(reader, &mut record, "spawn records", source)?;
        let spawn = MapSpawn::from_bytes(&record)
            .ok_or_else(|| MapError::corrupt("spawn records", "short spawn record"))?;
        spawns.push(spawn);
    }

    log::debug!("Decoded {} spawns from {}", spawns.len(), source);

    Ok(spawns)
}

//! Constants module - terrain geometry, record layouts and tile classification

use bitflags::bitflags;

// =============================================================================
// Chunk Geometry
// =============================================================================

/// Tiles along one edge of a chunk
pub const CHUNK_ROW_TILES: usize = 4;
/// Tiles per chunk
pub const CHUNK_TILES: usize = CHUNK_ROW_TILES * CHUNK_ROW_TILES;
/// Height vertices along one edge of a chunk (one more than tiles, corners are shared)
pub const CHUNK_ROW_VERTICES: usize = CHUNK_ROW_TILES + 1;
/// Height vertices per chunk
pub const CHUNK_VERTICES: usize = CHUNK_ROW_VERTICES * CHUNK_ROW_VERTICES;
/// Triangles per chunk mesh, two per tile quad
pub const CHUNK_TRIANGLES: usize = CHUNK_TILES * 2;
/// Indices per chunk mesh
pub const CHUNK_INDICES: usize = CHUNK_TRIANGLES * 3;

// =============================================================================
// Map Geometry
// =============================================================================

/// Chunks along one edge of a standard map
pub const MAP_CHUNK_ROW: usize = 16;
/// Chunks in a standard map
pub const MAP_CHUNKS: usize = MAP_CHUNK_ROW * MAP_CHUNK_ROW;
/// Width of a single tile in map units
pub const MAP_TILE_PIXEL_WIDTH: u32 = 512;
/// Width of a single chunk in map units
pub const MAP_CHUNK_PIXEL_WIDTH: u32 = MAP_TILE_PIXEL_WIDTH * CHUNK_ROW_TILES as u32;
/// Width of a standard map in map units
pub const MAP_PIXEL_WIDTH: u32 = MAP_CHUNK_PIXEL_WIDTH * MAP_CHUNK_ROW as u32;

// =============================================================================
// Record Layouts (.pmg / .pog)
// =============================================================================

/// x, y, z offsets plus one reserved u16
pub const CHUNK_HEADER_SIZE: usize = 8;
/// i16 height, u16 lighting
pub const VERTEX_RECORD_SIZE: usize = 4;
/// Reserved gap between the vertex block and the tile block of a chunk
pub const CHUNK_RESERVED_SIZE: usize = 4;
/// 6 reserved, u8 type/flags, u8 slip, i16 reserved, u8 rotation, u32 texture, u8 reserved
pub const TILE_RECORD_SIZE: usize = 16;
/// Size of one chunk record in the tile stream
pub const CHUNK_RECORD_SIZE: usize = CHUNK_HEADER_SIZE
    + CHUNK_VERTICES * VERTEX_RECORD_SIZE
    + CHUNK_RESERVED_SIZE
    + CHUNK_TILES * TILE_RECORD_SIZE;

/// Leading u16 record count of the spawn stream
pub const SPAWN_COUNT_SIZE: usize = 2;
/// Size of one spawn record
pub const SPAWN_RECORD_SIZE: usize = 94;
/// Static object capacity of the game, used as the default spawn limit
pub const MAX_SPAWNS: usize = 1024;

// =============================================================================
// Tile Classification
// =============================================================================

/// Number of known tile materials
pub const MAX_TILE_TYPES: u8 = 12;
/// The packed type byte keeps the material in its low five bits
pub const TILE_TYPE_MASK: u8 = 31;

bitflags! {
    /// Tile flags - the upper bits of the packed type byte
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
    pub struct TileFlags: u8 {
        const WATERY = 32;
        /// a mine is buried here
        const MINE = 64;
        const WALL = 128;
    }
}

// =============================================================================
// Overview
// =============================================================================

/// Width and height of the overview raster in pixels
pub const OVERVIEW_SIZE: u32 = 64;
/// Colour used for any tile carrying a mine
pub const OVERVIEW_MINE_COLOUR: [u8; 3] = [255, 0, 0];
/// Base colours are divided by this before the height modifier is applied
pub const OVERVIEW_COLOUR_DIVISOR: i32 = 9;

// =============================================================================
// Assets
// =============================================================================

pub const MAPS_DIR: &str = "maps";
pub const TILE_STREAM_EXTENSION: &str = "pmg";
pub const SPAWN_STREAM_EXTENSION: &str = "pog";
pub const DEFAULT_SKY_MODEL: &str = "skys/skydome";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_map_dimensions() {
        assert_eq!(MAP_CHUNK_PIXEL_WIDTH, 2048);
        assert_eq!(MAP_PIXEL_WIDTH, 32768);
        assert_eq!(MAP_CHUNKS, 256);
        assert_eq!(CHUNK_INDICES, 96);
    }

    #[test]
    fn chunk_record_size_matches_layout() {
        assert_eq!(CHUNK_RECORD_SIZE, 8 + 100 + 4 + 256);
    }

    #[test]
    fn flags_do_not_overlap_type_bits() {
        assert_eq!(TileFlags::all().bits() & TILE_TYPE_MASK, 0);
        assert!(MAX_TILE_TYPES <= TILE_TYPE_MASK);
    }
}

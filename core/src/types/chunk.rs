use crate::constants::{CHUNK_ROW_TILES, CHUNK_ROW_VERTICES, CHUNK_TILES, CHUNK_VERTICES};
use crate::mesh::ChunkMesh;

use super::MapTile;

/// Height sample at one corner of the chunk's 5x5 vertex grid.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MapVertex {
    pub height: i16,
    pub lighting: u16,
}

/// A 4x4 tile square of terrain and its render geometry.
#[derive(Debug, Clone, PartialEq)]
pub struct MapChunk {
    /// chunk column in the map grid
    pub x: usize,
    /// chunk row in the map grid
    pub y: usize,
    /// origin as stored in the chunk header
    pub offset: [u16; 3],
    /// row-major 5x5 height grid shared by the tiles
    pub vertices: [MapVertex; CHUNK_VERTICES],
    /// row-major 4x4 tiles, index `tile_x + tile_y * 4`
    pub tiles: [MapTile; CHUNK_TILES],
    pub mesh: ChunkMesh,
}

impl MapChunk {
    #[inline]
    pub fn vertex(&self, vx: usize, vz: usize) -> &MapVertex {
        &self.vertices[vx + vz * CHUNK_ROW_VERTICES]
    }

    pub fn tile(&self, tile_x: usize, tile_y: usize) -> Option<&MapTile> {
        if tile_x >= CHUNK_ROW_TILES || tile_y >= CHUNK_ROW_TILES {
            return None;
        }
        self.tiles.get(tile_x + tile_y * CHUNK_ROW_TILES)
    }

    /// Lowest and highest vertex of this chunk.
    pub fn height_range(&self) -> (i16, i16) {
        self.vertices
            .iter()
            .fold((i16::MAX, i16::MIN), |(lo, hi), v| {
                (lo.min(v.height), hi.max(v.height))
            })
    }
}

/// Vertex indices bounding a tile, in `MapTile::height` order.
#[inline]
pub fn tile_corner_indices(tile_x: usize, tile_y: usize) -> [usize; 4] {
    let top = tile_y * CHUNK_ROW_VERTICES + tile_x;
    let bottom = (tile_y + 1) * CHUNK_ROW_VERTICES + tile_x;
    [top, top + 1, bottom, bottom + 1]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn corner_indices_bound_the_tile() {
        assert_eq!(tile_corner_indices(0, 0), [0, 1, 5, 6]);
        assert_eq!(tile_corner_indices(3, 3), [18, 19, 23, 24]);
        assert_eq!(tile_corner_indices(2, 1), [7, 8, 12, 13]);
    }
}

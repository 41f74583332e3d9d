//! Chunk render geometry.
//!
//! Every chunk is a 5x5 vertex grid triangulated the same way, so the index
//! list is a single static table shared by all chunks. Only vertex positions
//! and the chunk translation differ.

use crate::constants::{CHUNK_INDICES, CHUNK_ROW_VERTICES, CHUNK_VERTICES};
use crate::types::{MapDimensions, MapVertex};

/// Two triangles per quad, quads walked row by row over the 5x5 grid.
pub const CHUNK_INDEX_PATTERN: [u16; CHUNK_INDICES] = [
    0, 5, 1, 1, 5, 6, //
    1, 6, 2, 2, 6, 7, //
    2, 7, 3, 3, 7, 8, //
    3, 8, 4, 4, 8, 9, //
    5, 10, 6, 6, 10, 11, //
    6, 11, 7, 7, 11, 12, //
    7, 12, 8, 8, 12, 13, //
    8, 13, 9, 9, 13, 14, //
    10, 15, 11, 11, 15, 16, //
    11, 16, 12, 12, 16, 17, //
    12, 17, 13, 13, 17, 18, //
    13, 18, 14, 14, 18, 19, //
    15, 20, 16, 16, 20, 21, //
    16, 21, 17, 17, 21, 22, //
    17, 22, 18, 18, 22, 23, //
    18, 23, 19, 19, 23, 24, //
];

/// Vertex positions of one chunk, local to the chunk, plus its world offset.
#[derive(Debug, Clone, PartialEq)]
pub struct ChunkMesh {
    /// `(vx * tile_width, height, vz * tile_width)` at index `vz * 5 + vx`
    pub positions: [[f32; 3]; CHUNK_VERTICES],
    /// `(chunk_x * chunk_width, 0, chunk_y * chunk_width)`
    pub translation: [f32; 3],
}

impl ChunkMesh {
    pub fn build(
        chunk_x: usize,
        chunk_y: usize,
        vertices: &[MapVertex; CHUNK_VERTICES],
        dims: &MapDimensions,
    ) -> Self {
        let tile_width = dims.tile_pixel_width as f32;
        let chunk_width = dims.chunk_pixel_width() as f32;

        let mut positions = [[0.0f32; 3]; CHUNK_VERTICES];
        for vz in 0..CHUNK_ROW_VERTICES {
            for vx in 0..CHUNK_ROW_VERTICES {
                let idx = vz * CHUNK_ROW_VERTICES + vx;
                positions[idx] = [
                    vx as f32 * tile_width,
                    vertices[idx].height as f32,
                    vz as f32 * tile_width,
                ];
            }
        }

        Self {
            positions,
            translation: [chunk_x as f32 * chunk_width, 0.0, chunk_y as f32 * chunk_width],
        }
    }

    pub fn indices(&self) -> &'static [u16; CHUNK_INDICES] {
        &CHUNK_INDEX_PATTERN
    }

    pub fn triangle_count(&self) -> usize {
        CHUNK_INDICES / 3
    }

    /// Vertex position with the chunk translation applied.
    pub fn world_position(&self, idx: usize) -> [f32; 3] {
        let [x, y, z] = self.positions[idx];
        [
            x + self.translation[0],
            y + self.translation[1],
            z + self.translation[2],
        ]
    }
}

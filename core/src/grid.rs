//! The decoded chunk grid and the read-only queries answered against it.
//!
//! A [`ChunkGrid`] never changes after it is built, so shared references can
//! be handed to any number of threads.

use crate::decoder::DecodedTiles;
use crate::error::{MapError, MapResult};
use crate::height::bilinear;
use crate::spatial::{chunk_index, locate, tile_fraction};
use crate::types::{MapChunk, MapDimensions, MapTile, Vec2};

#[derive(Debug, Clone)]
pub struct ChunkGrid {
    dims: MapDimensions,
    chunks: Vec<MapChunk>,
    min_height: i16,
    max_height: i16,
}

impl ChunkGrid {
    pub fn new(dims: MapDimensions, decoded: DecodedTiles) -> MapResult<Self> {
        if decoded.chunks.len() != dims.chunk_count() {
            return Err(MapError::corrupt(
                "chunk grid",
                format!(
                    "expected {} chunks, got {}",
                    dims.chunk_count(),
                    decoded.chunks.len()
                ),
            ));
        }

        Ok(Self {
            dims,
            chunks: decoded.chunks,
            min_height: decoded.min_height,
            max_height: decoded.max_height,
        })
    }

    pub fn dimensions(&self) -> &MapDimensions {
        &self.dims
    }

    pub fn chunks(&self) -> &[MapChunk] {
        &self.chunks
    }

    /// Chunk by grid column/row.
    pub fn chunk(&self, x: usize, y: usize) -> Option<&MapChunk> {
        if x >= self.dims.chunk_row || y >= self.dims.chunk_row {
            return None;
        }
        self.chunks.get(x + y * self.dims.chunk_row)
    }

    pub fn min_height(&self) -> i16 {
        self.min_height
    }

    pub fn max_height(&self) -> i16 {
        self.max_height
    }

    pub fn height_range(&self) -> (i16, i16) {
        (self.min_height, self.max_height)
    }

    pub fn chunk_at(&self, pos: Vec2) -> Option<&MapChunk> {
        chunk_index(pos, &self.dims).and_then(|idx| self.chunks.get(idx))
    }

    pub fn tile_at(&self, pos: Vec2) -> Option<&MapTile> {
        let location = locate(pos, &self.dims)?;
        self.chunks
            .get(location.chunk)
            .and_then(|chunk| chunk.tiles.get(location.tile))
    }

    /// Interpolated terrain height at `pos`, or `0.0` off the map.
    pub fn height_at(&self, pos: Vec2) -> f32 {
        let Some(tile) = self.tile_at(pos) else {
            return 0.0;
        };

        let (frac_x, frac_y) = tile_fraction(pos, &self.dims);
        bilinear(&tile.height, frac_x, frac_y)
    }
}

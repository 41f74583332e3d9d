use crate::constants::{CHUNK_ROW_TILES, MAP_CHUNK_ROW, MAP_TILE_PIXEL_WIDTH};
use crate::error::{MapError, MapResult};

/// Size of the chunk grid and of a tile in map units.
///
/// Standard maps are 16x16 chunks of 512 unit tiles; smaller grids are used
/// for synthetic maps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MapDimensions {
    /// chunks along one edge of the map
    pub chunk_row: usize,
    /// width of one tile in map units
    pub tile_pixel_width: u32,
}

impl Default for MapDimensions {
    fn default() -> Self {
        Self {
            chunk_row: MAP_CHUNK_ROW,
            tile_pixel_width: MAP_TILE_PIXEL_WIDTH,
        }
    }
}

impl MapDimensions {
    pub fn new(chunk_row: usize, tile_pixel_width: u32) -> MapResult<Self> {
        if chunk_row == 0 || tile_pixel_width == 0 {
            return Err(MapError::corrupt(
                "map dimensions",
                format!("{chunk_row} chunks per row of {tile_pixel_width} unit tiles"),
            ));
        }

        Ok(Self {
            chunk_row,
            tile_pixel_width,
        })
    }

    #[inline]
    pub fn chunk_count(&self) -> usize {
        self.chunk_row * self.chunk_row
    }

    #[inline]
    pub fn chunk_pixel_width(&self) -> u32 {
        self.tile_pixel_width * CHUNK_ROW_TILES as u32
    }

    #[inline]
    pub fn map_pixel_width(&self) -> u32 {
        self.chunk_pixel_width() * self.chunk_row as u32
    }

    /// Tiles along one edge of the whole map.
    #[inline]
    pub fn tile_row(&self) -> usize {
        self.chunk_row * CHUNK_ROW_TILES
    }
}

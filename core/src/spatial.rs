//! World position to chunk/tile index conversion.
//!
//! Everything here is pure arithmetic over [`MapDimensions`]; positions
//! outside the map are a normal `None`, not an error.

use crate::constants::{CHUNK_ROW_TILES, CHUNK_TILES};
use crate::types::{MapDimensions, Vec2};

/// Index pair addressing one tile of a chunk grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TileLocation {
    /// index into the row-major chunk array
    pub chunk: usize,
    /// index into the chunk's row-major tile array
    pub tile: usize,
}

/// Checks that `floor(v)` lies in `[0, map_pixel_width)` on both axes.
///
/// NaN coordinates are rejected.
#[inline]
pub fn is_inside(pos: Vec2, dims: &MapDimensions) -> bool {
    let width = dims.map_pixel_width() as f32;
    let axis_ok = |v: f32| v >= 0.0 && v.floor() < width;
    axis_ok(pos.x) && axis_ok(pos.y)
}

/// Index of the chunk containing `pos`.
pub fn chunk_index(pos: Vec2, dims: &MapDimensions) -> Option<usize> {
    if !is_inside(pos, dims) {
        log::trace!(
            "Position ({}, {}) is outside the {}x{} map",
            pos.x,
            pos.y,
            dims.map_pixel_width(),
            dims.map_pixel_width()
        );
        return None;
    }

    let chunk_width = dims.chunk_pixel_width();
    let idx = (pos.x as u32 / chunk_width) as usize
        + (pos.y as u32 / chunk_width) as usize * dims.chunk_row;
    if idx >= dims.chunk_count() {
        log::warn!("Attempted to get an out of bounds chunk index {}", idx);
        return None;
    }

    Some(idx)
}

/// Index of the tile containing `pos` within its chunk.
///
/// Only meaningful for positions accepted by [`chunk_index`].
#[inline]
pub fn tile_index(pos: Vec2, dims: &MapDimensions) -> usize {
    let tile_width = dims.tile_pixel_width;
    let row = CHUNK_ROW_TILES as u32;
    let idx = ((pos.x as u32 / tile_width) % row) + ((pos.y as u32 / tile_width) % row) * row;
    idx as usize
}

pub fn locate(pos: Vec2, dims: &MapDimensions) -> Option<TileLocation> {
    let chunk = chunk_index(pos, dims)?;
    let tile = tile_index(pos, dims);
    if tile >= CHUNK_TILES {
        log::warn!("Attempted to get an out of bounds tile index {}", tile);
        return None;
    }
    Some(TileLocation { chunk, tile })
}

/// Offset of `pos` inside its tile, each axis in `[0, 1)`.
#[inline]
pub fn tile_fraction(pos: Vec2, dims: &MapDimensions) -> (f32, f32) {
    let tile_width = dims.tile_pixel_width as f32;
    ((pos.x / tile_width).fract(), (pos.y / tile_width).fract())
}

//! The 64x64 minimap raster.
//!
//! One sample per output pixel: the tile under the pixel's world position
//! supplies a base colour, the interpolated height supplies a brightness
//! step, and mined tiles are painted solid red.

use image::{Rgb, RgbImage};

use crate::constants::{OVERVIEW_COLOUR_DIVISOR, OVERVIEW_MINE_COLOUR, OVERVIEW_SIZE};
use crate::error::{MapError, MapResult};
use crate::grid::ChunkGrid;
use crate::types::{MapTile, Vec2};

/// Brightness step for a sample height.
///
/// `(height + (max + min) / 2) / 255`, truncated toward zero.
#[inline]
pub fn brightness(height: f32, min_height: i16, max_height: i16) -> i32 {
    let midpoint = (max_height as f32 + min_height as f32) / 2.0;
    ((height + midpoint) / 255.0) as i32
}

/// Colour of one overview pixel.
pub fn shade(tile: &MapTile, brightness: i32) -> [u8; 3] {
    if tile.has_mine() {
        return OVERVIEW_MINE_COLOUR;
    }

    tile.tile_type
        .overview_colour()
        .map(|c| ((c as i32 / OVERVIEW_COLOUR_DIVISOR) * brightness).clamp(0, 255) as u8)
}

/// Rasterizes the whole grid into an RGB image.
///
/// # Returns
/// * A `64x64` image, or a corruption error if a sample point fails to
///   resolve to a tile.
pub fn generate(grid: &ChunkGrid) -> MapResult<RgbImage> {
    let step = grid.dimensions().map_pixel_width() / OVERVIEW_SIZE;
    let (min_height, max_height) = grid.height_range();

    let mut image = RgbImage::new(OVERVIEW_SIZE, OVERVIEW_SIZE);
    for y in 0..OVERVIEW_SIZE {
        for x in 0..OVERVIEW_SIZE {
            let position = Vec2::new((x * step) as f32, (y * step) as f32);
            let tile = grid.tile_at(position).ok_or_else(|| {
                MapError::corrupt(
                    "overview",
                    format!("hit an invalid tile at ({}, {})", position.x, position.y),
                )
            })?;

            let modifier = brightness(grid.height_at(position), min_height, max_height);
            image.put_pixel(x, y, Rgb(shade(tile, modifier)));
        }
    }

    Ok(image)
}

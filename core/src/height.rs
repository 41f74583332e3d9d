//! Bilinear height interpolation over a tile's four corners.

/// Interpolates corner heights at `(frac_x, frac_y)`.
///
/// The top edge (`height[0]..height[1]`) and bottom edge
/// (`height[2]..height[3]`) are interpolated along x first, then the two
/// results along y. Physics relies on this exact order for non-planar tiles.
#[inline]
pub fn bilinear(height: &[i16; 4], frac_x: f32, frac_y: f32) -> f32 {
    let [h0, h1, h2, h3] = height.map(f32::from);

    let top = h0 + (h1 - h0) * frac_x;
    let bottom = h2 + (h3 - h2) * frac_x;
    top + (bottom - top) * frac_y
}

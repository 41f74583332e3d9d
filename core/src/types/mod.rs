//! Data types module - terrain records as decoded from the legacy map streams

mod chunk;
mod dimensions;
mod position;
mod spawn;
mod tile;

pub use chunk::{MapChunk, MapVertex, tile_corner_indices};
pub use dimensions::MapDimensions;
pub use position::Vec2;
pub use spawn::MapSpawn;
pub use tile::{MapTile, TileType, unpack_type_byte};

use crate::constants::{MAX_TILE_TYPES, TILE_TYPE_MASK, TileFlags};

/// Surface material of a tile.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum TileType {
    #[default]
    Mud = 0,
    Grass = 1,
    Metal = 2,
    Wood = 3,
    Water = 4,
    Stone = 5,
    Rock = 6,
    Sand = 7,
    Ice = 8,
    Snow = 9,
    Quagmire = 10,
    Lava = 11,
}

impl TileType {
    pub const ALL: [TileType; MAX_TILE_TYPES as usize] = [
        TileType::Mud,
        TileType::Grass,
        TileType::Metal,
        TileType::Wood,
        TileType::Water,
        TileType::Stone,
        TileType::Rock,
        TileType::Sand,
        TileType::Ice,
        TileType::Snow,
        TileType::Quagmire,
        TileType::Lava,
    ];

    /// Converts a raw material value into a [`TileType`].
    ///
    /// # Returns
    /// * `Some(TileType)` for values below [`MAX_TILE_TYPES`], `None` otherwise.
    pub fn from_u8(value: u8) -> Option<Self> {
        Self::ALL.get(value as usize).copied()
    }

    pub fn name(self) -> &'static str {
        match self {
            TileType::Mud => "mud",
            TileType::Grass => "grass",
            TileType::Metal => "metal",
            TileType::Wood => "wood",
            TileType::Water => "water",
            TileType::Stone => "stone",
            TileType::Rock => "rock",
            TileType::Sand => "sand",
            TileType::Ice => "ice",
            TileType::Snow => "snow",
            TileType::Quagmire => "quagmire",
            TileType::Lava => "lava",
        }
    }

    /// Base colour of the material on the overview map.
    pub fn overview_colour(self) -> [u8; 3] {
        match self {
            TileType::Mud => [60, 50, 40],
            TileType::Grass => [40, 70, 40],
            TileType::Metal => [128, 128, 128],
            TileType::Wood => [153, 94, 34],
            TileType::Water => [90, 90, 150],
            TileType::Stone => [50, 50, 50],
            TileType::Rock => [50, 50, 50],
            TileType::Sand => [100, 80, 30],
            TileType::Ice => [180, 240, 240],
            TileType::Snow => [100, 100, 100],
            TileType::Quagmire => [60, 50, 40],
            // lava and poison share a slot
            TileType::Lava => [100, 240, 53],
        }
    }
}

/// Splits the packed type byte of a tile record.
///
/// # Returns
/// * `(raw_type, flags)` where `raw_type` is the low five bits. The raw type is
///   returned unvalidated so the caller can report it.
#[inline]
pub fn unpack_type_byte(packed: u8) -> (u8, TileFlags) {
    (
        packed & TILE_TYPE_MASK,
        TileFlags::from_bits_retain(packed & !TILE_TYPE_MASK),
    )
}

/// One cell of terrain.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MapTile {
    pub tile_type: TileType,
    pub flags: TileFlags,
    /// texture rotation
    pub flip: u8,
    /// traversal modifier, never populated by the decoder
    pub slip: u8,
    /// texture atlas index
    pub tex: u32,
    /// corner heights: top-left, top-right, bottom-left, bottom-right
    pub height: [i16; 4],
}

impl MapTile {
    pub fn is_watery(&self) -> bool {
        self.flags.contains(TileFlags::WATERY)
    }

    pub fn has_mine(&self) -> bool {
        self.flags.contains(TileFlags::MINE)
    }

    pub fn is_wall(&self) -> bool {
        self.flags.contains(TileFlags::WALL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_u8_rejects_unknown_types() {
        assert_eq!(TileType::from_u8(0), Some(TileType::Mud));
        assert_eq!(TileType::from_u8(11), Some(TileType::Lava));
        assert_eq!(TileType::from_u8(MAX_TILE_TYPES), None);
        assert_eq!(TileType::from_u8(31), None);
    }

    #[test]
    fn discriminants_match_table_order() {
        for (i, tile_type) in TileType::ALL.iter().enumerate() {
            assert_eq!(*tile_type as usize, i);
        }
    }

    #[test]
    fn unpack_splits_type_and_flags() {
        let (raw, flags) = unpack_type_byte(0x41);
        assert_eq!(raw, 1);
        assert_eq!(flags, TileFlags::MINE);

        let (raw, flags) = unpack_type_byte(0xFF);
        assert_eq!(raw, 31);
        assert_eq!(flags, TileFlags::all());
    }

    #[test]
    fn flag_accessors() {
        let tile = MapTile {
            flags: TileFlags::WATERY | TileFlags::WALL,
            ..Default::default()
        };
        assert!(tile.is_watery());
        assert!(tile.is_wall());
        assert!(!tile.has_mine());
    }
}

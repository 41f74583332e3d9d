use crate::constants::SPAWN_RECORD_SIZE;
use crate::string_operations::c_string_to_str;

/// Initial placement of an actor or object, as stored in the `.pog` stream.
///
/// The record is kept byte-for-byte in `raw`; the other fields are decoded
/// views for gameplay code. Nothing here is validated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MapSpawn {
    pub raw: [u8; SPAWN_RECORD_SIZE],

    /// actor class name, NUL padded
    pub name: [u8; 16],
    pub position: [i16; 3],
    pub index: u16,
    pub angles: [i16; 3],
    pub spawn_type: u16,
    pub bounds: [i16; 3],
    pub bounds_type: u16,
    pub energy: i16,
    pub appearance: u8,
    pub team: u8,
    pub objective: u16,
    pub objective_actor_id: u8,
    pub objective_extra: [u8; 2],
    pub fallback_position: [i16; 3],
    pub extra: i16,
    pub attached_actor_num: i16,
}

impl Default for MapSpawn {
    fn default() -> Self {
        Self {
            raw: [0; SPAWN_RECORD_SIZE],
            name: [0; 16],
            position: [0; 3],
            index: 0,
            angles: [0; 3],
            spawn_type: 0,
            bounds: [0; 3],
            bounds_type: 0,
            energy: 0,
            appearance: 0,
            team: 0,
            objective: 0,
            objective_actor_id: 0,
            objective_extra: [0; 2],
            fallback_position: [0; 3],
            extra: 0,
            attached_actor_num: 0,
        }
    }
}

impl MapSpawn {
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        if bytes.len() < SPAWN_RECORD_SIZE {
            return None;
        }

        let mut raw = [0u8; SPAWN_RECORD_SIZE];
        raw.copy_from_slice(&bytes[..SPAWN_RECORD_SIZE]);

        let mut offset: usize = 0;

        let name = read_bytes!(raw, offset, 16);
        skip_bytes!(offset, 16);
        let position = [
            read_i16!(raw, offset),
            read_i16!(raw, offset),
            read_i16!(raw, offset),
        ];
        let index = read_u16!(raw, offset);
        let angles = [
            read_i16!(raw, offset),
            read_i16!(raw, offset),
            read_i16!(raw, offset),
        ];
        let spawn_type = read_u16!(raw, offset);
        let bounds = [
            read_i16!(raw, offset),
            read_i16!(raw, offset),
            read_i16!(raw, offset),
        ];
        let bounds_type = read_u16!(raw, offset);
        let energy = read_i16!(raw, offset);
        let appearance = read_u8!(raw, offset);
        let team = read_u8!(raw, offset);
        let objective = read_u16!(raw, offset);
        let objective_actor_id = read_u8!(raw, offset);
        let objective_extra = read_bytes!(raw, offset, 2);
        // one reserved byte, then eight reserved u16s
        skip_bytes!(offset, 1 + 16);
        let fallback_position = [
            read_i16!(raw, offset),
            read_i16!(raw, offset),
            read_i16!(raw, offset),
        ];
        let extra = read_i16!(raw, offset);
        let attached_actor_num = read_i16!(raw, offset);
        // trailing reserved i16
        skip_bytes!(offset, 2);
        debug_assert_eq!(offset, SPAWN_RECORD_SIZE);

        Some(Self {
            raw,
            name,
            position,
            index,
            angles,
            spawn_type,
            bounds,
            bounds_type,
            energy,
            appearance,
            team,
            objective,
            objective_actor_id,
            objective_extra,
            fallback_position,
            extra,
            attached_actor_num,
        })
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        self.raw.to_vec()
    }

    pub fn class_name(&self) -> &str {
        c_string_to_str(&self.name)
    }
}

use serde::{Deserialize, Serialize};

pub type Result<T> = std::result::Result<T, crate::error::SchemError>;

/// Integer block coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct BlockPos {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl BlockPos {
    pub const ZERO: BlockPos = BlockPos { x: 0, y: 0, z: 0 };

    pub fn new(x: i32, y: i32, z: i32) -> Self {
        BlockPos { x, y, z }
    }

    pub fn add(self, other: BlockPos) -> BlockPos {
        BlockPos::new(self.x + other.x, self.y + other.y, self.z + other.z)
    }

    /// `None` when any component leaves the i32 range.
    pub fn checked_add(self, other: BlockPos) -> Option<BlockPos> {
        Some(BlockPos::new(
            self.x.checked_add(other.x)?,
            self.y.checked_add(other.y)?,
            self.z.checked_add(other.z)?,
        ))
    }

    pub fn sub(self, other: BlockPos) -> BlockPos {
        BlockPos::new(self.x - other.x, self.y - other.y, self.z - other.z)
    }

    pub fn min(self, other: BlockPos) -> BlockPos {
        BlockPos::new(
            self.x.min(other.x),
            self.y.min(other.y),
            self.z.min(other.z),
        )
    }

    pub fn max(self, other: BlockPos) -> BlockPos {
        BlockPos::new(
            self.x.max(other.x),
            self.y.max(other.y),
            self.z.max(other.z),
        )
    }

    pub fn to_array(self) -> [i32; 3] {
        [self.x, self.y, self.z]
    }
}

impl From<[i32; 3]> for BlockPos {
    fn from(v: [i32; 3]) -> Self {
        BlockPos::new(v[0], v[1], v[2])
    }
}

/// Width (x), height (y) and length (z) of a region. All three are positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: u16,
    pub height: u16,
    pub length: u16,
}

impl Dimensions {
    pub fn new(width: u16, height: u16, length: u16) -> Self {
        Dimensions {
            width,
            height,
            length,
        }
    }

    pub fn volume(&self) -> usize {
        self.width as usize * self.height as usize * self.length as usize
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0 || self.length == 0
    }

    /// Flat index with x innermost, then z, then y.
    pub fn index_of(&self, x: usize, y: usize, z: usize) -> usize {
        x + z * self.width as usize + y * self.width as usize * self.length as usize
    }

    pub fn contains(&self, x: i32, y: i32, z: i32) -> bool {
        x >= 0
            && y >= 0
            && z >= 0
            && x < self.width as i32
            && y < self.height as i32
            && z < self.length as i32
    }

    /// Same region seen after a quarter turn: width and length trade places.
    pub fn swapped(&self) -> Dimensions {
        Dimensions::new(self.length, self.height, self.width)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_volume_and_index() {
        let dims = Dimensions::new(3, 2, 4);
        assert_eq!(dims.volume(), 24);
        assert_eq!(dims.index_of(0, 0, 0), 0);
        assert_eq!(dims.index_of(1, 0, 0), 1);
        assert_eq!(dims.index_of(0, 0, 1), 3);
        assert_eq!(dims.index_of(0, 1, 0), 12);
        assert_eq!(dims.index_of(2, 1, 3), 23);
    }

    #[test]
    fn test_checked_add() {
        let pos = BlockPos::new(1, -2, 3);
        assert_eq!(pos.checked_add(BlockPos::new(1, 1, 1)), Some(BlockPos::new(2, -1, 4)));
        assert_eq!(BlockPos::new(0, i32::MAX, 0).checked_add(BlockPos::new(0, 1, 0)), None);
        assert_eq!(BlockPos::new(i32::MIN, 0, 0).checked_add(BlockPos::new(-1, 0, 0)), None);
    }

    #[test]
    fn test_contains() {
        let dims = Dimensions::new(2, 2, 2);
        assert!(dims.contains(1, 1, 1));
        assert!(!dims.contains(2, 0, 0));
        assert!(!dims.contains(0, -1, 0));
    }

    #[test]
    fn test_block_pos_math() {
        let a = BlockPos::new(1, -2, 3);
        let b = BlockPos::new(-4, 5, 0);
        assert_eq!(a.add(b), BlockPos::new(-3, 3, 3));
        assert_eq!(a.sub(b), BlockPos::new(5, -7, 3));
        assert_eq!(a.min(b), BlockPos::new(-4, -2, 0));
        assert_eq!(a.max(b), BlockPos::new(1, 5, 3));
    }

    #[test]
    fn test_serde_round_trip() {
        let pos = BlockPos::new(1, 2, 3);
        let json = serde_json::to_string(&pos).unwrap();
        assert_eq!(json, r#"{"x":1,"y":2,"z":3}"#);
        let back: BlockPos = serde_json::from_str(&json).unwrap();
        assert_eq!(back, pos);
    }
}

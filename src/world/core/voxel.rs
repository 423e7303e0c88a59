use std::fmt;

/// One cell of the world: a block type plus one byte of auxiliary data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Voxel {
    pub block: u8,
    pub data: u8,
}

impl Voxel {
    pub const AIR: Voxel = Voxel::new(0, 0);
    pub const STONE: Voxel = Voxel::new(1, 0);
    pub const GRASS: Voxel = Voxel::new(2, 0);
    pub const DIRT: Voxel = Voxel::new(3, 0);
    pub const BEDROCK: Voxel = Voxel::new(7, 0);
    pub const WOOL: Voxel = Voxel::new(35, 0);

    /// Block id the world uses to fence off the playable area. The origin
    /// probe walks outward until it reads this id.
    pub const BORDER_BLOCK: u8 = 95;

    pub const fn new(block: u8, data: u8) -> Self {
        Voxel { block, data }
    }
}

impl fmt::Display for Voxel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.block {
            0 => write!(f, "Air"),
            1 => write!(f, "Stone"),
            2 => write!(f, "Grass"),
            3 => write!(f, "Dirt"),
            7 => write!(f, "Bedrock"),
            35 => write!(f, "Wool"),
            Voxel::BORDER_BLOCK => write!(f, "Border"),
            id => write!(f, "Block({}:{})", id, self.data),
        }
    }
}

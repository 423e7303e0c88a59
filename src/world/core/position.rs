use std::fmt;
use std::ops::{Add, Sub};

use crate::constants::chunk::CHUNK_SIZE;

/// Integer voxel position.
///
/// The same type is used for both "real" (world) and "relative" (storage /
/// remote) coordinates; [`WorldOffset`] translates between the two spaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct VoxelPos {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl VoxelPos {
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        VoxelPos { x, y, z }
    }

    /// Component-wise floor division by the chunk edge length.
    pub fn chunk(self) -> (i32, i32) {
        (
            self.x.div_euclid(CHUNK_SIZE as i32),
            self.z.div_euclid(CHUNK_SIZE as i32),
        )
    }

    /// Fractional chunk coordinates, used by the prefetch bands.
    pub fn chunk_fractional(self) -> (f64, f64) {
        (
            self.x as f64 / CHUNK_SIZE as f64,
            self.z as f64 / CHUNK_SIZE as f64,
        )
    }
}

impl Add for VoxelPos {
    type Output = VoxelPos;

    fn add(self, rhs: VoxelPos) -> VoxelPos {
        VoxelPos::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Sub for VoxelPos {
    type Output = VoxelPos;

    fn sub(self, rhs: VoxelPos) -> VoxelPos {
        VoxelPos::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl fmt::Display for VoxelPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

/// Absolute address of a 64-aligned terrain column, in chunk units.
///
/// Raw storage space never goes negative; the sentinel [`TerrainPos::UNSET`]
/// marks a window slot that has never been populated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TerrainPos {
    pub x: i32,
    pub z: i32,
}

impl TerrainPos {
    /// Sentinel for a window slot that has never been populated. Outside the
    /// reachable coordinate range, so it can never collide with a real
    /// terrain address.
    pub const UNSET: TerrainPos = TerrainPos::new(i32::MIN, i32::MIN);

    pub const fn new(x: i32, z: i32) -> Self {
        TerrainPos { x, z }
    }

    pub fn offset(self, dx: i32, dz: i32) -> Self {
        TerrainPos::new(self.x + dx, self.z + dz)
    }

    /// Voxel position of this chunk's low corner, in relative space.
    pub fn base(self) -> VoxelPos {
        VoxelPos::new(self.x * CHUNK_SIZE as i32, 0, self.z * CHUNK_SIZE as i32)
    }
}

impl fmt::Display for TerrainPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}; {}]", self.x, self.z)
    }
}

/// One cell of the resident window grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SlotPos {
    pub col: usize,
    pub row: usize,
}

impl SlotPos {
    pub const fn new(col: usize, row: usize) -> Self {
        SlotPos { col, row }
    }
}

impl fmt::Display for SlotPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.col, self.row)
    }
}

/// Translation between real (world) and relative (storage/remote) space.
///
/// Produced once at startup by the border probe and shared read-only after
/// that.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorldOffset(pub VoxelPos);

impl WorldOffset {
    pub fn to_relative(self, real: VoxelPos) -> VoxelPos {
        real + self.0
    }

    pub fn to_real(self, relative: VoxelPos) -> VoxelPos {
        relative - self.0
    }
}

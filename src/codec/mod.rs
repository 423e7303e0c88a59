//! Recursive octree codec for cubic voxel regions.
//!
//! [`encode`] compresses a dense power-of-two cube into a compact byte
//! stream; [`decode`] reconstructs the stream into a minimal sequence of
//! axis-aligned fill commands. Both walk octants in the same fixed
//! x-then-y-then-z order, which is what keeps the single forward-only decode
//! cursor aligned with what the encoder produced.
//!
//! The wire format has three node forms:
//! - a 2-byte leaf `(block, data)` for a 1×1×1 cell or a uniform region,
//! - [`MARKER_BRANCH`] (91) followed by the 8 octant encodings,
//! - [`MARKER_SKIP`] (93) for a zero-sized split, meaning "leave this region
//!   untouched".

mod decode;
mod encode;

pub use decode::{decode, decode_to_vec, FillIter};
pub use encode::encode;

pub use crate::constants::codec::{MARKER_BRANCH, MARKER_SKIP};

use crate::world::core::{Voxel, VoxelPos};

/// Instruction to set every cell of an axis-aligned cuboid to one voxel
/// value. Produced by [`decode`], consumed exactly once by a pool worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FillCommand {
    pub min: VoxelPos,
    pub max: VoxelPos,
    pub voxel: Voxel,
}

impl FillCommand {
    /// Number of cells this command covers.
    pub fn volume(&self) -> u64 {
        let d = self.max - self.min;
        (d.x as u64 + 1) * (d.y as u64 + 1) * (d.z as u64 + 1)
    }
}

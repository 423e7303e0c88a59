//! Dense voxel storage for freshly generated or decoded chunk columns.
//!
//! A [`ChunkColumn`] lives only for the duration of one build: the generator
//! fills it, the codec encodes its two cubic halves, and it is dropped. The
//! y-major layout keeps each 64³ half contiguous so the halves can be handed
//! to the encoder as plain borrowed views.

use crate::constants::chunk::{CHUNK_SIZE, COLUMN_HEIGHT, VOXELS_PER_COLUMN, VOXELS_PER_CUBE};
use crate::world::core::Voxel;

/// Dense 64×128×64 column of voxels, y-major.
#[derive(Clone)]
pub struct ChunkColumn {
    blocks: Vec<u8>,
    data: Vec<u8>,
}

impl ChunkColumn {
    pub fn new() -> Self {
        ChunkColumn {
            blocks: vec![0; VOXELS_PER_COLUMN],
            data: vec![0; VOXELS_PER_COLUMN],
        }
    }

    #[inline]
    fn index(x: usize, y: usize, z: usize) -> usize {
        debug_assert!(x < CHUNK_SIZE && y < COLUMN_HEIGHT && z < CHUNK_SIZE);
        y * CHUNK_SIZE * CHUNK_SIZE + x * CHUNK_SIZE + z
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize, z: usize) -> Voxel {
        let i = Self::index(x, y, z);
        Voxel::new(self.blocks[i], self.data[i])
    }

    #[inline]
    pub fn set(&mut self, x: usize, y: usize, z: usize, voxel: Voxel) {
        let i = Self::index(x, y, z);
        self.blocks[i] = voxel.block;
        self.data[i] = voxel.data;
    }

    /// Borrow the bottom and top cubic halves, in that order.
    pub fn split(&self) -> (CubeView<'_>, CubeView<'_>) {
        let (bottom_blocks, top_blocks) = self.blocks.split_at(VOXELS_PER_CUBE);
        let (bottom_data, top_data) = self.data.split_at(VOXELS_PER_CUBE);
        (
            CubeView::from_parts(bottom_blocks, bottom_data, CHUNK_SIZE),
            CubeView::from_parts(top_blocks, top_data, CHUNK_SIZE),
        )
    }
}

impl Default for ChunkColumn {
    fn default() -> Self {
        Self::new()
    }
}

/// Borrowed cubic region of voxels with a power-of-two edge, y-major.
#[derive(Clone, Copy)]
pub struct CubeView<'a> {
    blocks: &'a [u8],
    data: &'a [u8],
    edge: usize,
}

impl<'a> CubeView<'a> {
    /// Wrap raw y-major block/data planes. Both slices must hold `edge³`
    /// bytes.
    pub fn from_parts(blocks: &'a [u8], data: &'a [u8], edge: usize) -> Self {
        assert_eq!(blocks.len(), edge * edge * edge);
        assert_eq!(data.len(), edge * edge * edge);
        CubeView { blocks, data, edge }
    }

    #[inline]
    pub fn edge(&self) -> usize {
        self.edge
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize, z: usize) -> Voxel {
        let i = y * self.edge * self.edge + x * self.edge + z;
        Voxel::new(self.blocks[i], self.data[i])
    }
}

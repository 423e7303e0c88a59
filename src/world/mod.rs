//! World data types, storage, and generation.
//!
//! - **Core**: fundamental voxel and coordinate types
//! - **Storage**: the dense chunk column and its cubic halves
//! - **Generation**: the pluggable terrain generator contract

pub mod core;
pub mod generation;
pub mod storage;

pub use self::core::{Half, SlotPos, TerrainPos, Voxel, VoxelPos, WorldOffset};
pub use self::generation::{PerlinTerrainGenerator, TerrainGenerator};
pub use self::storage::{ChunkColumn, CubeView};

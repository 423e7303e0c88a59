//! Terrain generation contract and the default noise-based generator.
//!
//! The streamer treats generation as an external collaborator: anything
//! implementing [`TerrainGenerator`] can be plugged in. Implementations must
//! be safe to invoke concurrently from independent build threads.

use noise::{Fbm, MultiFractal, NoiseFn, Perlin};

use crate::constants::chunk::{CHUNK_SIZE, COLUMN_HEIGHT};
use crate::world::core::{TerrainPos, Voxel};
use crate::world::storage::ChunkColumn;

/// Errors a generator may raise; opaque to the streamer, which only logs and
/// propagates them.
pub type GeneratorError = Box<dyn std::error::Error + Send + Sync>;

/// Produces a full-height voxel column for a terrain coordinate.
pub trait TerrainGenerator: Send + Sync {
    fn generate(&self, pos: TerrainPos) -> Result<ChunkColumn, GeneratorError>;
}

/// Default rolling-hills generator: fractal Perlin heightmap with a bedrock
/// floor. Surface sits near y = 96 in column space (y = 32 above the
/// bottom-half midpoint).
pub struct PerlinTerrainGenerator {
    heightmap: Fbm<Perlin>,
}

impl PerlinTerrainGenerator {
    const HORIZONTAL_SCALE: f64 = 100.21;
    const BASE_HEIGHT: f64 = 32.0;
    const AMPLITUDE: f64 = 30.0;

    pub fn new(seed: u32) -> Self {
        PerlinTerrainGenerator {
            heightmap: Fbm::<Perlin>::new(seed).set_octaves(5),
        }
    }

    fn surface_height(&self, world_x: f64, world_z: f64) -> usize {
        let sample = self.heightmap.get([
            world_x / Self::HORIZONTAL_SCALE,
            world_z / Self::HORIZONTAL_SCALE,
        ]);
        let height = Self::BASE_HEIGHT + Self::AMPLITUDE * sample;
        (height as i64).clamp(1, COLUMN_HEIGHT as i64 - 1) as usize
    }
}

impl TerrainGenerator for PerlinTerrainGenerator {
    fn generate(&self, pos: TerrainPos) -> Result<ChunkColumn, GeneratorError> {
        let mut column = ChunkColumn::new();
        let base = pos.base();

        for x in 0..CHUNK_SIZE {
            for z in 0..CHUNK_SIZE {
                let world_x = (base.x + x as i32) as f64;
                let world_z = (base.z + z as i32) as f64;
                let height = self.surface_height(world_x, world_z);

                column.set(x, 0, z, Voxel::BEDROCK);
                for y in 1..height {
                    column.set(x, y, z, Voxel::STONE);
                }
            }
        }

        Ok(column)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generator_is_deterministic_per_coordinate() {
        let gen = PerlinTerrainGenerator::new(4);
        let a = gen.generate(TerrainPos::new(2, 3)).expect("generate");
        let b = gen.generate(TerrainPos::new(2, 3)).expect("generate");

        for x in (0..CHUNK_SIZE).step_by(17) {
            for z in (0..CHUNK_SIZE).step_by(13) {
                for y in (0..COLUMN_HEIGHT).step_by(11) {
                    assert_eq!(a.get(x, y, z), b.get(x, y, z));
                }
            }
        }
    }

    #[test]
    fn generator_keeps_bedrock_floor() {
        let gen = PerlinTerrainGenerator::new(4);
        let column = gen.generate(TerrainPos::new(0, 0)).expect("generate");
        assert_eq!(column.get(0, 0, 0), Voxel::BEDROCK);
        assert_eq!(column.get(0, COLUMN_HEIGHT - 1, 0), Voxel::AIR);
    }
}

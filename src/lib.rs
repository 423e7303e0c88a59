//! quadstream: a bounded, scrollable window over an infinite voxel world.
//!
//! Block data is generated (or loaded from the on-disk cache), compressed
//! with a recursive octree codec, and streamed as cuboid fill commands to a
//! remote consumer while a sliding-window coordinator follows the viewer.
//!
//! The crate is organized the way the data flows:
//!
//! - [`world`]: voxel and coordinate types, dense chunk storage, generation
//! - [`codec`]: octree encode/decode between cubes and fill commands
//! - [`persistence`]: the keyed chunk store and the build drain barrier
//! - [`network`]: the remote-consumer contract and the fill worker pool
//! - [`streaming`]: the sliding-window coordinator and the origin probe

pub mod codec;
pub mod constants;
pub mod error;
pub mod network;
pub mod persistence;
pub mod streaming;
pub mod world;

use std::path::{Path, PathBuf};

use serde::Deserialize;

pub use codec::{decode, decode_to_vec, encode, FillCommand};
pub use error::{StreamError, StreamResult};
pub use network::{FillDispatcher, FillSink};
pub use persistence::{ChunkStore, GenerationTracker};
pub use streaming::{locate_world_offset, TerrainStreamer, Viewer, WindowMap, WorldProbe};
pub use world::core::{Half, SlotPos, TerrainPos, Voxel, VoxelPos, WorldOffset};
pub use world::generation::{PerlinTerrainGenerator, TerrainGenerator};
pub use world::storage::{ChunkColumn, CubeView};

/// Top-level streamer configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StreamerConfig {
    /// Width and height of the resident window, in chunks.
    pub window_size: usize,
    /// Fill-dispatcher pool size.
    pub worker_threads: usize,
    /// Directory holding the encoded chunk records.
    pub cache_dir: PathBuf,
    /// Seed for the default terrain generator.
    pub generator_seed: u32,
}

impl Default for StreamerConfig {
    fn default() -> Self {
        StreamerConfig {
            window_size: constants::window::WINDOW_SIZE,
            worker_threads: num_cpus::get(),
            cache_dir: PathBuf::from("world"),
            generator_seed: 4,
        }
    }
}

impl StreamerConfig {
    /// Load and validate a configuration from a TOML file.
    pub fn from_toml_path<P: AsRef<Path>>(path: P) -> StreamResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| StreamError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        let config: StreamerConfig =
            toml::from_str(&text).map_err(|source| StreamError::ConfigParse {
                path: path.to_path_buf(),
                source,
            })?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration parameters.
    pub fn validate(&self) -> StreamResult<()> {
        if self.window_size < 4 || self.window_size % 2 != 0 {
            return Err(StreamError::InvalidConfig {
                field: "window_size",
                reason: format!("{} (must be even and at least 4)", self.window_size),
            });
        }
        if self.worker_threads == 0 {
            return Err(StreamError::InvalidConfig {
                field: "worker_threads",
                reason: "cannot be 0".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        StreamerConfig::default().validate().expect("valid");
    }

    #[test]
    fn odd_window_size_is_rejected() {
        let config = StreamerConfig {
            window_size: 5,
            ..StreamerConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(StreamError::InvalidConfig { field: "window_size", .. })
        ));
    }

    #[test]
    fn config_parses_from_toml() {
        let config: StreamerConfig =
            toml::from_str("window_size = 6\nworker_threads = 8").expect("parse");
        assert_eq!(config.window_size, 6);
        assert_eq!(config.worker_threads, 8);
        assert_eq!(config.generator_seed, 4);
    }

    #[test]
    fn config_loads_and_validates_from_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("streamer.toml");

        std::fs::write(&path, "window_size = 3").expect("write");
        assert!(matches!(
            StreamerConfig::from_toml_path(&path),
            Err(StreamError::InvalidConfig { .. })
        ));

        std::fs::write(&path, "cache_dir = \"cache\"\ngenerator_seed = 11").expect("write");
        let config = StreamerConfig::from_toml_path(&path).expect("load");
        assert_eq!(config.cache_dir, PathBuf::from("cache"));
        assert_eq!(config.generator_seed, 11);
    }
}

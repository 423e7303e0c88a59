//! Sliding-window terrain streaming.
//!
//! The [`TerrainStreamer`] owns the slot → terrain map and decides, as the
//! viewer moves, which world region occupies which window slot: full window
//! shifts at the edges, predictive prefetch just inside them, and wraparound
//! reuse of whatever the chunk store already holds.

mod probe;
mod streamer;
mod window;

pub use probe::{locate_world_offset, WorldProbe};
pub use streamer::TerrainStreamer;
pub use window::{SlotUpdate, WindowMap};

use crate::error::StreamResult;
use crate::world::core::VoxelPos;

/// The viewer the window follows, an external collaborator. Positions are
/// in absolute remote space.
pub trait Viewer {
    fn position(&mut self) -> StreamResult<VoxelPos>;

    fn set_position(&mut self, pos: VoxelPos) -> StreamResult<()>;
}

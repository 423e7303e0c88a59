use std::sync::Arc;
use std::thread;

use crossbeam_channel::Sender;

use crate::codec::{self, FillCommand};
use crate::constants::chunk::CHUNK_SIZE;
use crate::constants::window::PREFETCH_MARGIN;
use crate::error::{StreamError, StreamResult};
use crate::persistence::{ChunkStore, GenerationTracker};
use crate::world::core::{SlotPos, TerrainPos, VoxelPos, WorldOffset};
use crate::world::generation::TerrainGenerator;

use super::window::{SlotUpdate, WindowMap};
use super::Viewer;

/// Horizontal scroll axis. The scroll step runs the same routine for both.
#[derive(Debug, Clone, Copy)]
enum Axis {
    X,
    Z,
}

impl Axis {
    fn name(self) -> &'static str {
        match self {
            Axis::X => "x",
            Axis::Z => "z",
        }
    }

    fn voxel_delta(self, amount: i32) -> VoxelPos {
        match self {
            Axis::X => VoxelPos::new(amount, 0, 0),
            Axis::Z => VoxelPos::new(0, 0, amount),
        }
    }

    fn offset_terrain(self, coord: TerrainPos, steps: i32) -> TerrainPos {
        match self {
            Axis::X => coord.offset(steps, 0),
            Axis::Z => coord.offset(0, steps),
        }
    }

    /// Slot at position `main` along this axis and `cross` along the other.
    fn slot(self, main: usize, cross: usize) -> SlotPos {
        match self {
            Axis::X => SlotPos::new(main, cross),
            Axis::Z => SlotPos::new(cross, main),
        }
    }
}

/// Coordinates the resident window: decides which terrain occupies which
/// slot, drives the chunk store and the fill queue, and keeps the viewer
/// centered by shifting the window under it.
pub struct TerrainStreamer {
    window: Arc<WindowMap>,
    store: Arc<ChunkStore>,
    generator: Arc<dyn TerrainGenerator>,
    tracker: Arc<GenerationTracker>,
    queue: Sender<FillCommand>,
    offset: WorldOffset,
}

impl TerrainStreamer {
    pub fn new(
        window_size: usize,
        offset: WorldOffset,
        store: Arc<ChunkStore>,
        generator: Arc<dyn TerrainGenerator>,
        queue: Sender<FillCommand>,
    ) -> Self {
        TerrainStreamer {
            window: Arc::new(WindowMap::new(window_size)),
            store,
            generator,
            tracker: GenerationTracker::new(),
            queue,
            offset,
        }
    }

    pub fn window(&self) -> &WindowMap {
        &self.window
    }

    /// Fill commands currently waiting for a worker.
    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    /// Builds currently in flight.
    pub fn in_flight(&self) -> usize {
        self.tracker.in_flight()
    }

    /// Block until every started build has enqueued all of its fills.
    pub fn wait_idle(&self) {
        self.tracker.wait_idle();
    }

    /// Map `slot` to `coord`, rebuilding and restreaming its region unless
    /// the slot already holds that coordinate.
    ///
    /// The mapping is updated optimistically before the build runs on its
    /// own thread; a failed build rolls the slot back to its previous
    /// mapping, which stays authoritative.
    pub fn set_slot(&self, slot: SlotPos, coord: TerrainPos) {
        let previous = match self.window.compare_and_set(slot, coord) {
            SlotUpdate::Unchanged => return,
            SlotUpdate::Updated { previous } => previous,
        };

        // Register with the tracker before the thread exists so a
        // wait_idle() racing this call cannot miss the build.
        let guard = self.tracker.begin();
        let window = Arc::clone(&self.window);
        let store = Arc::clone(&self.store);
        let generator = Arc::clone(&self.generator);
        let queue = self.queue.clone();
        let offset = self.offset;

        let spawned = thread::Builder::new()
            .name(format!("chunk-build-{}_{}", coord.x, coord.z))
            .spawn(move || {
                let _guard = guard;
                if let Err(e) =
                    build_and_enqueue(&store, generator.as_ref(), &queue, offset, slot, coord)
                {
                    log::error!(
                        "[TerrainStreamer::set_slot] build failed for {} in slot {}: {}",
                        coord,
                        slot,
                        e
                    );
                    window.rollback(slot, coord, previous);
                }
            });

        if let Err(e) = spawned {
            log::error!(
                "[TerrainStreamer::set_slot] could not spawn build for {}: {}",
                coord,
                e
            );
            self.window.rollback(slot, coord, previous);
        }
    }

    /// Populate the whole window with its starting terrain region, wait for
    /// it to stream out, and center the viewer in it.
    pub fn initial_fill<V: Viewer>(&self, viewer: &mut V) -> StreamResult<()> {
        let n = self.window.size();
        log::info!("[TerrainStreamer::initial_fill] populating {}x{} window", n, n);

        for col in 0..n {
            for row in 0..n {
                self.set_slot(SlotPos::new(col, row), TerrainPos::new(col as i32, row as i32));
            }
        }
        self.tracker.wait_idle();

        let center = (n as i32 / 2) * CHUNK_SIZE as i32;
        viewer.set_position(
            self.offset
                .to_relative(VoxelPos::new(center, center, center)),
        )?;
        log::info!("[TerrainStreamer::initial_fill] initial terrain resident");
        Ok(())
    }

    /// One scroll step: handle the x axis, then the z axis.
    pub fn step<V: Viewer>(&self, viewer: &mut V) -> StreamResult<()> {
        self.step_axis(viewer, Axis::X)?;
        self.step_axis(viewer, Axis::Z)
    }

    fn step_axis<V: Viewer>(&self, viewer: &mut V, axis: Axis) -> StreamResult<()> {
        let n = self.window.size();
        let half = (n / 2) as i32;

        let position = viewer.position()?;
        let real = self.offset.to_real(position);
        let (chunk_x, chunk_z) = real.chunk();
        let (frac_x, frac_z) = real.chunk_fractional();
        let (chunk, frac) = match axis {
            Axis::X => (chunk_x, frac_x),
            Axis::Z => (chunk_z, frac_z),
        };

        if chunk == 0 {
            log::info!(
                "[TerrainStreamer::step] viewer on {}- edge, shifting window",
                axis.name()
            );
            self.shift_low(axis);
            self.tracker.wait_idle();
            viewer.set_position(position + axis.voxel_delta(half * CHUNK_SIZE as i32))?;
        } else if chunk == n as i32 - 1 {
            log::info!(
                "[TerrainStreamer::step] viewer on {}+ edge, shifting window",
                axis.name()
            );
            self.shift_high(axis);
            self.tracker.wait_idle();
            viewer.set_position(position - axis.voxel_delta(half * CHUNK_SIZE as i32))?;
        } else {
            // Strictly inside the quarter bands next to the window center:
            // populate the half-row one step ahead of the viewer without
            // shifting, hiding generation latency before a full shift.
            let center = half as f64;
            if frac > center - PREFETCH_MARGIN && frac < center {
                self.prefetch(axis, half as usize - 1);
            } else if frac > center && frac < center + PREFETCH_MARGIN {
                self.prefetch(axis, half as usize);
            }
        }
        Ok(())
    }

    /// Viewer reached the low edge: re-tag the high half of the window with
    /// the low half's terrain, then expose fresh terrain on the low half.
    /// New coordinates derive from previously-held ones, never from the
    /// viewer's absolute position.
    fn shift_low(&self, axis: Axis) {
        let n = self.window.size();
        let half = n / 2;
        for cross in 0..n {
            for m in 0..half {
                let src = axis.slot(m, cross);
                self.set_slot(axis.slot(m + half, cross), self.window.coord_of(src));
            }
            for m in 0..half {
                let src = axis.slot(m + half, cross);
                let fresh = axis.offset_terrain(self.window.coord_of(src), -(half as i32));
                self.set_slot(axis.slot(m, cross), fresh);
            }
        }
    }

    fn shift_high(&self, axis: Axis) {
        let n = self.window.size();
        let half = n / 2;
        for cross in 0..n {
            for m in 0..half {
                let src = axis.slot(m + half, cross);
                self.set_slot(axis.slot(m, cross), self.window.coord_of(src));
            }
            for m in 0..half {
                let src = axis.slot(m, cross);
                let fresh = axis.offset_terrain(self.window.coord_of(src), half as i32);
                self.set_slot(axis.slot(m + half, cross), fresh);
            }
        }
    }

    /// Populate the neighbors of the slot the viewer is leaving, one chunk
    /// ahead on each side. Idempotent when the window is already contiguous.
    fn prefetch(&self, axis: Axis, mid: usize) {
        let n = self.window.size();
        for cross in 0..n {
            let anchor = self.window.coord_of(axis.slot(mid, cross));
            if anchor == TerrainPos::UNSET {
                continue;
            }
            self.set_slot(axis.slot(mid - 1, cross), axis.offset_terrain(anchor, -1));
            self.set_slot(axis.slot(mid + 1, cross), axis.offset_terrain(anchor, 1));
        }
    }
}

/// The build pipeline for one slot: load or generate the encoded pair,
/// decode both halves at the slot's position in remote space, and enqueue
/// every fill. Runs on its own thread; the caller holds the tracker guard.
fn build_and_enqueue(
    store: &ChunkStore,
    generator: &dyn TerrainGenerator,
    queue: &Sender<FillCommand>,
    offset: WorldOffset,
    slot: SlotPos,
    coord: TerrainPos,
) -> StreamResult<()> {
    let (bottom, top) = store.get_or_build(coord, generator)?;

    let slot_base = VoxelPos::new(
        (slot.col * CHUNK_SIZE) as i32,
        0,
        (slot.row * CHUNK_SIZE) as i32,
    );
    let base = offset.to_relative(slot_base);
    let lift = VoxelPos::new(0, CHUNK_SIZE as i32, 0);

    for (stream, origin) in [(&bottom, base), (&top, base + lift)] {
        if let Err(e) = enqueue_stream(stream, origin, queue) {
            // A misaligned or truncated stream means this chunk's records
            // are not trustworthy; drop them so the next touch regenerates.
            if matches!(
                e,
                StreamError::TruncatedStream { .. } | StreamError::TrailingBytes { .. }
            ) {
                store.delete(coord)?;
            }
            return Err(e);
        }
    }
    Ok(())
}

fn enqueue_stream(
    stream: &[u8],
    origin: VoxelPos,
    queue: &Sender<FillCommand>,
) -> StreamResult<()> {
    let edge = CHUNK_SIZE as u32;
    let mut fills = codec::decode(stream, origin, [edge, edge, edge]);
    for fill in &mut fills {
        queue
            .send(fill?)
            .map_err(|_| StreamError::DeliveryFailed("fill queue closed".into()))?;
    }
    let remaining = fills.remaining();
    if remaining != 0 {
        return Err(StreamError::TrailingBytes { remaining });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::generation::GeneratorError;
    use crate::world::storage::ChunkColumn;

    /// All-air generator: each half encodes to one 2-byte leaf, so every
    /// build enqueues exactly two fills.
    struct FlatGenerator;

    impl TerrainGenerator for FlatGenerator {
        fn generate(&self, _pos: TerrainPos) -> Result<ChunkColumn, GeneratorError> {
            Ok(ChunkColumn::new())
        }
    }

    struct FailingGenerator;

    impl TerrainGenerator for FailingGenerator {
        fn generate(&self, _pos: TerrainPos) -> Result<ChunkColumn, GeneratorError> {
            Err("generator offline".into())
        }
    }

    fn streamer_with(
        generator: Arc<dyn TerrainGenerator>,
        dir: &std::path::Path,
    ) -> (TerrainStreamer, crossbeam_channel::Receiver<FillCommand>) {
        let (tx, rx) = crossbeam_channel::unbounded();
        let store = Arc::new(ChunkStore::open(dir).expect("store"));
        let offset = WorldOffset(VoxelPos::new(100, -64, 200));
        (
            TerrainStreamer::new(4, offset, store, generator, tx),
            rx,
        )
    }

    #[test]
    fn repeated_set_slot_enqueues_only_once() {
        let dir = tempfile::tempdir().expect("tempdir");
        let (streamer, rx) = streamer_with(Arc::new(FlatGenerator), dir.path());
        let slot = SlotPos::new(1, 1);
        let coord = TerrainPos::new(7, 7);

        streamer.set_slot(slot, coord);
        streamer.wait_idle();
        assert_eq!(rx.len(), 2);

        streamer.set_slot(slot, coord);
        streamer.wait_idle();
        assert_eq!(rx.len(), 2);
    }

    #[test]
    fn fills_land_at_the_slot_origin_in_remote_space() {
        let dir = tempfile::tempdir().expect("tempdir");
        let (streamer, rx) = streamer_with(Arc::new(FlatGenerator), dir.path());

        streamer.set_slot(SlotPos::new(2, 1), TerrainPos::new(0, 0));
        streamer.wait_idle();

        let mut fills: Vec<FillCommand> = rx.try_iter().collect();
        fills.sort_by_key(|f| f.min.y);
        assert_eq!(fills.len(), 2);

        // Slot (2, 1) with offset (100, -64, 200).
        let base = VoxelPos::new(100 + 128, -64, 200 + 64);
        assert_eq!(fills[0].min, base);
        assert_eq!(fills[0].max, base + VoxelPos::new(63, 63, 63));
        assert_eq!(fills[1].min, base + VoxelPos::new(0, 64, 0));
    }

    #[test]
    fn failed_build_rolls_the_slot_back() {
        let dir = tempfile::tempdir().expect("tempdir");
        let (streamer, _rx) = streamer_with(Arc::new(FailingGenerator), dir.path());
        let slot = SlotPos::new(0, 3);

        streamer.set_slot(slot, TerrainPos::new(2, 2));
        streamer.wait_idle();

        assert_eq!(streamer.window().coord_of(slot), TerrainPos::UNSET);
    }

    #[test]
    fn corrupt_cached_stream_is_dropped_for_regeneration() {
        let dir = tempfile::tempdir().expect("tempdir");
        // Non-empty records that pass the store's read check but decode as
        // a truncated octree: a lone branch marker.
        std::fs::write(dir.path().join("c7_8.bottom.oct"), [91u8]).expect("write");
        std::fs::write(dir.path().join("c7_8.top.oct"), [0u8, 0u8]).expect("write");

        let (streamer, _rx) = streamer_with(Arc::new(FlatGenerator), dir.path());
        let slot = SlotPos::new(2, 2);
        streamer.set_slot(slot, TerrainPos::new(7, 8));
        streamer.wait_idle();

        assert_eq!(streamer.window().coord_of(slot), TerrainPos::UNSET);
        assert!(!dir.path().join("c7_8.bottom.oct").exists());
        assert!(!dir.path().join("c7_8.top.oct").exists());
    }
}

//! End-to-end tests for the sliding window: store, codec, dispatcher, and
//! coordinator working together against in-memory collaborators.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use parking_lot::Mutex;

use quadstream::world::generation::GeneratorError;
use quadstream::{
    ChunkColumn, ChunkStore, FillCommand, FillDispatcher, FillSink, SlotPos, StreamResult,
    TerrainGenerator, TerrainPos, TerrainStreamer, Viewer, Voxel, VoxelPos, WorldOffset,
};

const CHUNK: i32 = 64;

/// All-air world: every half encodes to a single 2-byte leaf.
struct FlatGenerator;

impl TerrainGenerator for FlatGenerator {
    fn generate(&self, _pos: TerrainPos) -> Result<ChunkColumn, GeneratorError> {
        Ok(ChunkColumn::new())
    }
}

/// Flat generator that takes a while, for exercising the drain barrier.
struct SlowGenerator;

impl TerrainGenerator for SlowGenerator {
    fn generate(&self, _pos: TerrainPos) -> Result<ChunkColumn, GeneratorError> {
        thread::sleep(Duration::from_millis(30));
        Ok(ChunkColumn::new())
    }
}

struct FakeViewer {
    pos: VoxelPos,
}

impl Viewer for FakeViewer {
    fn position(&mut self) -> StreamResult<VoxelPos> {
        Ok(self.pos)
    }

    fn set_position(&mut self, pos: VoxelPos) -> StreamResult<()> {
        self.pos = pos;
        Ok(())
    }
}

fn make_streamer(
    dir: &std::path::Path,
    generator: Arc<dyn TerrainGenerator>,
) -> (
    TerrainStreamer,
    crossbeam_channel::Receiver<FillCommand>,
    WorldOffset,
) {
    let (tx, rx) = crossbeam_channel::unbounded();
    let store = Arc::new(ChunkStore::open(dir).expect("store"));
    let offset = WorldOffset(VoxelPos::new(50, -64, 75));
    (
        TerrainStreamer::new(4, offset, store, generator, tx),
        rx,
        offset,
    )
}

/// Assert the window covers a gapless, duplicate-free rectangle and return
/// its low corner.
fn assert_contiguous(streamer: &TerrainStreamer) -> TerrainPos {
    let snapshot = streamer.window().snapshot();
    let base = streamer.window().coord_of(SlotPos::new(0, 0));
    for (slot, coord) in snapshot {
        assert_eq!(
            coord,
            base.offset(slot.col as i32, slot.row as i32),
            "slot {} breaks contiguity from base {}",
            slot,
            base
        );
    }
    base
}

#[test]
fn window_stays_contiguous_across_shifts() {
    let dir = tempfile::tempdir().expect("tempdir");
    let (streamer, rx, offset) = make_streamer(dir.path(), Arc::new(FlatGenerator));
    let mut viewer = FakeViewer {
        pos: VoxelPos::default(),
    };

    streamer.initial_fill(&mut viewer).expect("initial fill");
    assert_eq!(assert_contiguous(&streamer), TerrainPos::new(0, 0));
    assert_eq!(
        viewer.pos,
        offset.to_relative(VoxelPos::new(2 * CHUNK, 2 * CHUNK, 2 * CHUNK))
    );

    // Walk to the low x edge: the window shifts down by half its width and
    // the viewer is carried back toward the center.
    viewer.pos = offset.to_relative(VoxelPos::new(10, 70, 130));
    streamer.step(&mut viewer).expect("step");
    assert_eq!(assert_contiguous(&streamer), TerrainPos::new(-2, 0));
    assert_eq!(viewer.pos, offset.to_relative(VoxelPos::new(138, 70, 130)));

    // Now the high z edge.
    viewer.pos = offset.to_relative(VoxelPos::new(130, 70, 3 * CHUNK + 5));
    streamer.step(&mut viewer).expect("step");
    assert_eq!(assert_contiguous(&streamer), TerrainPos::new(-2, 2));
    assert_eq!(
        viewer.pos,
        offset.to_relative(VoxelPos::new(130, 70, CHUNK + 5))
    );

    // And back across the low z edge.
    viewer.pos = offset.to_relative(VoxelPos::new(130, 70, 12));
    streamer.step(&mut viewer).expect("step");
    assert_eq!(assert_contiguous(&streamer), TerrainPos::new(-2, 0));

    drop(rx);
}

#[test]
fn prefetch_band_neither_shifts_nor_moves_the_viewer() {
    let dir = tempfile::tempdir().expect("tempdir");
    let (streamer, rx, offset) = make_streamer(dir.path(), Arc::new(FlatGenerator));
    let mut viewer = FakeViewer {
        pos: VoxelPos::default(),
    };

    streamer.initial_fill(&mut viewer).expect("initial fill");
    let fills_before = rx.len();

    // 96 / 64 = 1.5 chunk units on both axes: inside the low prefetch band.
    let parked = offset.to_relative(VoxelPos::new(96, 70, 96));
    viewer.pos = parked;
    streamer.step(&mut viewer).expect("step");
    streamer.wait_idle();

    assert_eq!(assert_contiguous(&streamer), TerrainPos::new(0, 0));
    assert_eq!(viewer.pos, parked);
    // Window already contiguous, so prefetch re-tags are all no-ops.
    assert_eq!(rx.len(), fills_before);
}

#[test]
fn drain_barrier_covers_every_started_build() {
    let dir = tempfile::tempdir().expect("tempdir");
    let (streamer, rx, _offset) = make_streamer(dir.path(), Arc::new(SlowGenerator));

    for i in 0..6 {
        streamer.set_slot(SlotPos::new(i % 4, i / 4), TerrainPos::new(i as i32, 0));
    }
    streamer.wait_idle();

    // Two fills per build must already be enqueued once the barrier opens.
    assert_eq!(streamer.in_flight(), 0);
    assert_eq!(rx.len(), 12);
}

#[derive(Default)]
struct SinkLog {
    fills: Vec<FillCommand>,
    closed: usize,
}

struct RecordingSink {
    log: Arc<Mutex<SinkLog>>,
}

impl FillSink for RecordingSink {
    fn fill(&mut self, command: &FillCommand) -> StreamResult<()> {
        self.log.lock().fills.push(*command);
        Ok(())
    }

    fn close(&mut self) {
        self.log.lock().closed += 1;
    }
}

#[test]
fn initial_fill_streams_the_whole_window_to_the_sink() {
    let dir = tempfile::tempdir().expect("tempdir");
    let log = Arc::new(Mutex::new(SinkLog::default()));

    let dispatcher = {
        let log = Arc::clone(&log);
        FillDispatcher::spawn(4, move |_| {
            Ok(RecordingSink {
                log: Arc::clone(&log),
            })
        })
        .expect("dispatcher")
    };

    let store = Arc::new(ChunkStore::open(dir.path()).expect("store"));
    let offset = WorldOffset(VoxelPos::new(0, -64, 0));
    let streamer = TerrainStreamer::new(
        4,
        offset,
        store,
        Arc::new(FlatGenerator),
        dispatcher.sender(),
    );

    let mut viewer = FakeViewer {
        pos: VoxelPos::default(),
    };
    streamer.initial_fill(&mut viewer).expect("initial fill");
    streamer.wait_idle();
    dispatcher.shutdown();

    let log = log.lock();
    assert_eq!(log.closed, 4);
    // 16 slots, two cubic fills each.
    assert_eq!(log.fills.len(), 32);
    assert!(log.fills.iter().all(|f| f.voxel == Voxel::AIR));

    // Every slot's bottom-half fill lands at its window position.
    let mut bottoms: Vec<VoxelPos> = log
        .fills
        .iter()
        .filter(|f| f.min.y == -64)
        .map(|f| f.min)
        .collect();
    bottoms.sort_by_key(|p| (p.x, p.z));
    let mut expected: Vec<VoxelPos> = (0..4)
        .flat_map(|col| (0..4).map(move |row| VoxelPos::new(col * CHUNK, -64, row * CHUNK)))
        .collect();
    expected.sort_by_key(|p| (p.x, p.z));
    assert_eq!(bottoms, expected);
}

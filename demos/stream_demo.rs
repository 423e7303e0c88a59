//! End-to-end demo: probe a fenced in-memory world for its origin, stream
//! the initial window through the dispatcher, then walk the viewer east
//! across a window edge and watch the window follow.
//!
//! Run with `cargo run --example stream_demo`.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use anyhow::Result;

use quadstream::{
    locate_world_offset, ChunkStore, FillCommand, FillDispatcher, FillSink,
    PerlinTerrainGenerator, StreamResult, StreamerConfig, TerrainStreamer, Viewer, Voxel,
    VoxelPos, WorldProbe,
};

/// Stand-in for the remote consumer: counts fills instead of applying them.
struct CountingSink {
    fills: Arc<AtomicU64>,
    cells: Arc<AtomicU64>,
}

impl FillSink for CountingSink {
    fn fill(&mut self, command: &FillCommand) -> StreamResult<()> {
        self.fills.fetch_add(1, Ordering::Relaxed);
        self.cells.fetch_add(command.volume(), Ordering::Relaxed);
        Ok(())
    }

    fn close(&mut self) {}
}

/// Stand-in for the remote world during the origin probe: border blocks
/// everywhere below the (0, 0) corner.
struct FencedWorld;

impl WorldProbe for FencedWorld {
    fn block_at(&mut self, pos: VoxelPos) -> StreamResult<u8> {
        if pos.x < 0 || pos.z < 0 {
            Ok(Voxel::BORDER_BLOCK)
        } else {
            Ok(0)
        }
    }
}

struct DemoViewer {
    pos: VoxelPos,
}

impl Viewer for DemoViewer {
    fn position(&mut self) -> StreamResult<VoxelPos> {
        Ok(self.pos)
    }

    fn set_position(&mut self, pos: VoxelPos) -> StreamResult<()> {
        self.pos = pos;
        Ok(())
    }
}

fn main() -> Result<()> {
    env_logger::init();

    let config = StreamerConfig {
        cache_dir: std::env::temp_dir().join("quadstream-demo"),
        ..StreamerConfig::default()
    };
    config.validate()?;

    let offset = locate_world_offset(&mut FencedWorld, VoxelPos::new(40, 70, 40))?;
    log::info!("world offset resolved to {}", offset.0);

    let fills = Arc::new(AtomicU64::new(0));
    let cells = Arc::new(AtomicU64::new(0));
    let dispatcher = {
        let fills = Arc::clone(&fills);
        let cells = Arc::clone(&cells);
        FillDispatcher::spawn(config.worker_threads, move |_| {
            Ok(CountingSink {
                fills: Arc::clone(&fills),
                cells: Arc::clone(&cells),
            })
        })?
    };

    let store = Arc::new(ChunkStore::open(&config.cache_dir)?);
    let generator = Arc::new(PerlinTerrainGenerator::new(config.generator_seed));
    let streamer = TerrainStreamer::new(
        config.window_size,
        offset,
        store,
        generator,
        dispatcher.sender(),
    );

    let mut viewer = DemoViewer {
        pos: VoxelPos::default(),
    };
    streamer.initial_fill(&mut viewer)?;
    println!(
        "initial terrain resident, queue: {}, fills so far: {}",
        streamer.queue_len(),
        fills.load(Ordering::Relaxed)
    );

    // Walk east; the streamer prefetches ahead and shifts the window under
    // the viewer when the edge is reached.
    for tick in 0..24 {
        viewer.pos = viewer.pos + VoxelPos::new(16, 0, 0);
        streamer.step(&mut viewer)?;
        if tick % 6 == 0 {
            println!(
                "tick {:2}: viewer at {}, queue {}, builds in flight {}",
                tick,
                viewer.pos,
                streamer.queue_len(),
                streamer.in_flight()
            );
        }
    }

    streamer.wait_idle();
    dispatcher.shutdown();
    println!(
        "done: {} fill commands covering {} cells",
        fills.load(Ordering::Relaxed),
        cells.load(Ordering::Relaxed)
    );
    Ok(())
}

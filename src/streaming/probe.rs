use crate::error::{StreamError, StreamResult};
use crate::world::core::{Voxel, VoxelPos, WorldOffset};

/// Read access to the remote world, used only by the one-time startup probe.
pub trait WorldProbe {
    fn block_at(&mut self, pos: VoxelPos) -> StreamResult<u8>;
}

/// How far the probe walks along an axis before giving up.
const MAX_PROBE_STEPS: i32 = 1 << 16;

/// Locate the storage-area origin by walking from `start` toward negative x
/// and then negative z until the distinguished border block is hit, stepping
/// back inside it on each axis. The y component is pinned at -64, the
/// storage-space floor.
///
/// The resulting [`WorldOffset`] is the process-wide translation between
/// relative (storage/remote) and real (logical) coordinates.
pub fn locate_world_offset<P: WorldProbe>(
    probe: &mut P,
    start: VoxelPos,
) -> StreamResult<WorldOffset> {
    let mut offset = VoxelPos::new(start.x, -64, start.z);

    offset.x = walk_to_border(probe, offset, ProbeAxis::X)?;
    log::info!("[locate_world_offset] x offset: {}", offset.x);

    offset.z = walk_to_border(probe, offset, ProbeAxis::Z)?;
    log::info!("[locate_world_offset] z offset: {}", offset.z);

    Ok(WorldOffset(offset))
}

#[derive(Clone, Copy)]
enum ProbeAxis {
    X,
    Z,
}

fn walk_to_border<P: WorldProbe>(
    probe: &mut P,
    from: VoxelPos,
    axis: ProbeAxis,
) -> StreamResult<i32> {
    let mut pos = from;
    for _ in 0..MAX_PROBE_STEPS {
        if probe.block_at(pos)? == Voxel::BORDER_BLOCK {
            // Step back inside the playable area.
            return Ok(match axis {
                ProbeAxis::X => pos.x + 1,
                ProbeAxis::Z => pos.z + 1,
            });
        }
        match axis {
            ProbeAxis::X => pos.x -= 1,
            ProbeAxis::Z => pos.z -= 1,
        }
    }
    Err(StreamError::BorderNotFound { start: from })
}

use crate::constants::codec::{MARKER_BRANCH, MARKER_SKIP};
use crate::world::core::Voxel;
use crate::world::storage::CubeView;

/// Encode a cube into the octree wire format.
///
/// The cube edge must be a power of two; recursion depth is log2(edge).
pub fn encode(cube: &CubeView<'_>) -> Vec<u8> {
    let edge = cube.edge();
    debug_assert!(edge.is_power_of_two());

    let mut out = Vec::new();
    encode_region(cube, [0, 0, 0], [edge, edge, edge], &mut out);
    out
}

fn encode_region(cube: &CubeView<'_>, origin: [usize; 3], size: [usize; 3], out: &mut Vec<u8>) {
    if size == [1, 1, 1] {
        let voxel = cube.get(origin[0], origin[1], origin[2]);
        out.push(voxel.block);
        out.push(voxel.data);
        return;
    }

    // Zero-sized splits only appear when a non-cubic top-level shape halves
    // down to nothing along one axis; the region carries no cells.
    if size[0] == 0 || size[1] == 0 || size[2] == 0 {
        out.push(MARKER_SKIP);
        return;
    }

    if let Some(voxel) = uniform_value(cube, origin, size) {
        out.push(voxel.block);
        out.push(voxel.data);
        return;
    }

    out.push(MARKER_BRANCH);
    let half = [size[0] / 2, size[1] / 2, size[2] / 2];
    for x in 0..2usize {
        for y in 0..2usize {
            for z in 0..2usize {
                let octant = [x, y, z];
                let mut sub_origin = origin;
                let mut sub_size = half;
                for axis in 0..3 {
                    if octant[axis] == 1 {
                        sub_origin[axis] += half[axis];
                        sub_size[axis] = size[axis] - half[axis];
                    }
                }
                encode_region(cube, sub_origin, sub_size, out);
            }
        }
    }
}

/// Full value-equality scan: `Some(v)` iff every cell in the region holds the
/// identical (block, data) pair.
fn uniform_value(cube: &CubeView<'_>, origin: [usize; 3], size: [usize; 3]) -> Option<Voxel> {
    let first = cube.get(origin[0], origin[1], origin[2]);
    for x in origin[0]..origin[0] + size[0] {
        for y in origin[1]..origin[1] + size[1] {
            for z in origin[2]..origin[2] + size[2] {
                if cube.get(x, y, z) != first {
                    return None;
                }
            }
        }
    }
    Some(first)
}

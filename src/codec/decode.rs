use crate::constants::codec::{MARKER_BRANCH, MARKER_SKIP};
use crate::error::{StreamError, StreamResult};
use crate::world::core::{Voxel, VoxelPos};

use super::FillCommand;

/// Pending region of the octree walk.
#[derive(Debug, Clone, Copy)]
struct Frame {
    origin: VoxelPos,
    size: [u32; 3],
}

/// Lazy decoder over one encoded stream.
///
/// Owns its cursor and an explicit work stack, so a decode is an ordinary
/// value tied to no thread and no shared state; two streams decode with two
/// independent iterators. Regions are visited in exactly the order the
/// encoder emitted them, which is what keeps the cursor aligned.
pub struct FillIter<'a> {
    stream: &'a [u8],
    cursor: usize,
    stack: Vec<Frame>,
    failed: bool,
}

/// Begin decoding `stream` as a region of the given size anchored at
/// `origin` (in the consumer's coordinate space).
pub fn decode(stream: &[u8], origin: VoxelPos, size: [u32; 3]) -> FillIter<'_> {
    FillIter {
        stream,
        cursor: 0,
        stack: vec![Frame { origin, size }],
        failed: false,
    }
}

/// Decode an entire stream eagerly, additionally rejecting streams that
/// leave unconsumed bytes behind.
pub fn decode_to_vec(
    stream: &[u8],
    origin: VoxelPos,
    size: [u32; 3],
) -> StreamResult<Vec<FillCommand>> {
    let mut iter = decode(stream, origin, size);
    let mut fills = Vec::new();
    for fill in &mut iter {
        fills.push(fill?);
    }
    let remaining = iter.remaining();
    if remaining != 0 {
        return Err(StreamError::TrailingBytes { remaining });
    }
    Ok(fills)
}

impl<'a> FillIter<'a> {
    /// Bytes not yet consumed. Zero after a clean full decode.
    pub fn remaining(&self) -> usize {
        self.stream.len() - self.cursor
    }

    fn read_byte(&mut self) -> StreamResult<u8> {
        match self.stream.get(self.cursor) {
            Some(&byte) => {
                self.cursor += 1;
                Ok(byte)
            }
            None => Err(StreamError::TruncatedStream {
                offset: self.cursor,
            }),
        }
    }

    fn push_octants(&mut self, frame: Frame) {
        let half = [frame.size[0] / 2, frame.size[1] / 2, frame.size[2] / 2];
        // Reverse encode order, so popping walks octants forward.
        for x in (0..2u32).rev() {
            for y in (0..2u32).rev() {
                for z in (0..2u32).rev() {
                    let octant = [x, y, z];
                    let mut origin = frame.origin;
                    let mut size = half;
                    for axis in 0..3 {
                        if octant[axis] == 1 {
                            size[axis] = frame.size[axis] - half[axis];
                        }
                    }
                    if octant[0] == 1 {
                        origin.x += half[0] as i32;
                    }
                    if octant[1] == 1 {
                        origin.y += half[1] as i32;
                    }
                    if octant[2] == 1 {
                        origin.z += half[2] as i32;
                    }
                    self.stack.push(Frame { origin, size });
                }
            }
        }
    }
}

impl<'a> Iterator for FillIter<'a> {
    type Item = StreamResult<FillCommand>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        loop {
            let frame = self.stack.pop()?;

            let marker = match self.read_byte() {
                Ok(byte) => byte,
                Err(e) => {
                    self.failed = true;
                    return Some(Err(e));
                }
            };

            match marker {
                MARKER_BRANCH => {
                    self.push_octants(frame);
                }
                MARKER_SKIP => {
                    // Region is already correct; consume nothing further.
                }
                block => {
                    let data = match self.read_byte() {
                        Ok(byte) => byte,
                        Err(e) => {
                            self.failed = true;
                            return Some(Err(e));
                        }
                    };
                    // A leaf for a zero-sized split carries no cells; the
                    // bytes are consumed either way to stay aligned.
                    if frame.size[0] == 0 || frame.size[1] == 0 || frame.size[2] == 0 {
                        continue;
                    }
                    let extent = VoxelPos::new(
                        frame.size[0] as i32 - 1,
                        frame.size[1] as i32 - 1,
                        frame.size[2] as i32 - 1,
                    );
                    return Some(Ok(FillCommand {
                        min: frame.origin,
                        max: frame.origin + extent,
                        voxel: Voxel::new(block, data),
                    }));
                }
            }
        }
    }
}

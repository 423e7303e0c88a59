//! Central constants for chunk geometry, the codec wire markers, and the
//! sliding-window tuning values.

/// Chunk geometry.
pub mod chunk {
    /// Horizontal extent of a terrain chunk in voxels (x and z).
    pub const CHUNK_SIZE: usize = 64;

    /// Full column height in voxels. Split into two cubic halves for storage.
    pub const COLUMN_HEIGHT: usize = 2 * CHUNK_SIZE;

    /// Voxels in one cubic half of a column.
    pub const VOXELS_PER_CUBE: usize = CHUNK_SIZE * CHUNK_SIZE * CHUNK_SIZE;

    /// Voxels in a full column.
    pub const VOXELS_PER_COLUMN: usize = CHUNK_SIZE * COLUMN_HEIGHT * CHUNK_SIZE;
}

/// Octree codec wire format.
pub mod codec {
    /// Marks a subdivided region: the 8 octant encodings follow. ASCII `[`.
    pub const MARKER_BRANCH: u8 = 91;

    /// Marks a region that must be left untouched. Emitted only for
    /// zero-sized splits. ASCII `]`.
    pub const MARKER_SKIP: u8 = 93;
}

/// Sliding-window tuning.
pub mod window {
    /// Width and height of the resident window, in chunks.
    pub const WINDOW_SIZE: usize = 4;

    /// How far (in window units) the predictive prefetch bands extend from
    /// the window center toward each edge. With a 4-wide window this yields
    /// the 1.25..2.00 and 2.00..2.75 bands.
    pub const PREFETCH_MARGIN: f64 = 0.75;

    /// How long an idle dispatcher worker sleeps on its queue before
    /// re-checking the stop flag.
    pub const WORKER_POLL_MS: u64 = 10;
}

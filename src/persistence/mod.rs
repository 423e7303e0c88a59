//! Disk-backed store of encoded chunk streams.
//!
//! Two records per terrain coordinate, one per cubic half, holding the raw
//! octree-encoded bytes. Records are immutable once written; an empty record
//! is treated as corrupt and triggers delete-and-regenerate. Writes go
//! through a temp file and a rename so a crash can never leave a partial
//! record behind.

mod tracker;

pub use tracker::{BuildGuard, GenerationTracker};

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use tempfile::NamedTempFile;

use crate::codec;
use crate::error::{StreamError, StreamResult};
use crate::world::core::{Half, TerrainPos};
use crate::world::generation::TerrainGenerator;

/// Keyed persistence for encoded chunk halves.
pub struct ChunkStore {
    dir: PathBuf,
    /// One lock per key: at most one generation runs per coordinate, and
    /// concurrent callers for the same key wait for the in-flight result.
    locks: Mutex<FxHashMap<TerrainPos, Arc<Mutex<()>>>>,
}

impl ChunkStore {
    /// Open (creating if needed) a store rooted at `dir`.
    pub fn open<P: AsRef<Path>>(dir: P) -> StreamResult<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        log::info!("[ChunkStore::open] cache directory {}", dir.display());
        Ok(ChunkStore {
            dir,
            locks: Mutex::new(FxHashMap::default()),
        })
    }

    fn record_path(&self, pos: TerrainPos, half: Half) -> PathBuf {
        self.dir
            .join(format!("c{}_{}.{}.oct", pos.x, pos.z, half.tag()))
    }

    fn key_lock(&self, pos: TerrainPos) -> Arc<Mutex<()>> {
        Arc::clone(self.locks.lock().entry(pos).or_default())
    }

    /// Return the encoded (bottom, top) streams for `pos`, generating and
    /// persisting them on a miss or after corruption.
    pub fn get_or_build(
        &self,
        pos: TerrainPos,
        generator: &dyn TerrainGenerator,
    ) -> StreamResult<(Vec<u8>, Vec<u8>)> {
        let lock = self.key_lock(pos);
        let _guard = lock.lock();

        match self.read_pair(pos)? {
            CachedPair::Hit(bottom, top) => return Ok((bottom, top)),
            CachedPair::Corrupt => {
                log::warn!("[ChunkStore::get_or_build] empty record for {}, deleting", pos);
                self.delete(pos)?;
            }
            CachedPair::Miss => {}
        }

        log::info!("[ChunkStore::get_or_build] generating chunk {}", pos);
        let column = generator
            .generate(pos)
            .map_err(|e| StreamError::GeneratorFailed { pos, source: e })?;

        let (bottom_view, top_view) = column.split();
        let bottom = codec::encode(&bottom_view);
        let top = codec::encode(&top_view);

        self.write_record(pos, Half::Bottom, &bottom)?;
        self.write_record(pos, Half::Top, &top)?;
        Ok((bottom, top))
    }

    /// Remove both records for `pos`. Missing records are not an error.
    pub fn delete(&self, pos: TerrainPos) -> StreamResult<()> {
        for half in [Half::Bottom, Half::Top] {
            match fs::remove_file(self.record_path(pos, half)) {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }
        Ok(())
    }

    fn read_pair(&self, pos: TerrainPos) -> StreamResult<CachedPair> {
        let bottom = self.read_record(pos, Half::Bottom)?;
        let top = self.read_record(pos, Half::Top)?;
        Ok(match (bottom, top) {
            (Some(b), Some(t)) if !b.is_empty() && !t.is_empty() => CachedPair::Hit(b, t),
            (None, None) => CachedPair::Miss,
            // Empty record, or a record missing its sibling: corrupt either way.
            _ => CachedPair::Corrupt,
        })
    }

    fn read_record(&self, pos: TerrainPos, half: Half) -> StreamResult<Option<Vec<u8>>> {
        match fs::read(self.record_path(pos, half)) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn write_record(&self, pos: TerrainPos, half: Half, bytes: &[u8]) -> StreamResult<()> {
        let mut tmp = NamedTempFile::new_in(&self.dir)?;
        tmp.write_all(bytes)?;
        tmp.persist(self.record_path(pos, half))
            .map_err(|e| StreamError::Io(e.error))?;
        Ok(())
    }
}

enum CachedPair {
    Hit(Vec<u8>, Vec<u8>),
    Corrupt,
    Miss,
}

use parking_lot::Mutex;

use crate::world::core::{SlotPos, TerrainPos};

/// Result of an atomic slot update attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotUpdate {
    /// The slot already held the target coordinate; nothing to do.
    Unchanged,
    /// The mapping was updated; `previous` is what the slot held before.
    Updated { previous: TerrainPos },
}

/// The slot → terrain-coordinate map for the resident window.
///
/// This mapping is the single source of truth for "what is currently loaded
/// where". Each entry carries its own lock, so concurrent updates to one
/// slot serialize while different slots never contend.
pub struct WindowMap {
    size: usize,
    slots: Vec<Mutex<TerrainPos>>,
}

impl WindowMap {
    pub fn new(size: usize) -> Self {
        WindowMap {
            size,
            slots: (0..size * size)
                .map(|_| Mutex::new(TerrainPos::UNSET))
                .collect(),
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    fn entry(&self, slot: SlotPos) -> &Mutex<TerrainPos> {
        assert!(slot.col < self.size && slot.row < self.size);
        &self.slots[slot.row * self.size + slot.col]
    }

    pub fn coord_of(&self, slot: SlotPos) -> TerrainPos {
        *self.entry(slot).lock()
    }

    /// Atomically check-then-update one slot.
    pub fn compare_and_set(&self, slot: SlotPos, coord: TerrainPos) -> SlotUpdate {
        let mut current = self.entry(slot).lock();
        if *current == coord {
            SlotUpdate::Unchanged
        } else {
            let previous = *current;
            *current = coord;
            SlotUpdate::Updated { previous }
        }
    }

    /// Undo a failed optimistic update: restore `previous` only if the slot
    /// still holds `coord` (a later update wins otherwise).
    pub fn rollback(&self, slot: SlotPos, coord: TerrainPos, previous: TerrainPos) {
        let mut current = self.entry(slot).lock();
        if *current == coord {
            *current = previous;
        }
    }

    /// Copy of the whole mapping, row-major.
    pub fn snapshot(&self) -> Vec<(SlotPos, TerrainPos)> {
        let mut out = Vec::with_capacity(self.size * self.size);
        for row in 0..self.size {
            for col in 0..self.size {
                let slot = SlotPos::new(col, row);
                out.push((slot, self.coord_of(slot)));
            }
        }
        out
    }
}

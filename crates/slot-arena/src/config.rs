//! Arena geometry.

use crate::error::{InitArenaError, InitArenaErrorKind};

/// Slot geometry of a [`SlotArena`](crate::SlotArena).
///
/// Both values are immutable once an arena has been built from the
/// configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ArenaConfig {
    /// Size of a single slot in bytes. Every allocation is a whole multiple
    /// of this value.
    pub slot_size: usize,
    /// Number of slots carved out of the backing store.
    pub slot_count: usize,
}

impl ArenaConfig {
    /// Default slot size in bytes.
    pub const DEFAULT_SLOT_SIZE: usize = 256;

    /// Default number of slots.
    pub const DEFAULT_SLOT_COUNT: usize = 32;

    /// Creates a configuration with the given geometry.
    ///
    /// The values are not checked until [`validate`](Self::validate) or
    /// [`SlotArena::new`](crate::SlotArena::new) is called.
    #[must_use]
    pub const fn new(slot_size: usize, slot_count: usize) -> Self {
        Self {
            slot_size,
            slot_count,
        }
    }

    /// Returns the exact number of bytes the backing store must have.
    #[track_caller]
    pub fn backing_len(&self) -> Result<usize, InitArenaError> {
        self.validate()?;
        self.slot_size
            .checked_mul(self.slot_count)
            .ok_or_else(|| {
                InitArenaError::new(InitArenaErrorKind::CapacityOverflow {
                    slot_size: self.slot_size,
                    slot_count: self.slot_count,
                })
            })
    }

    /// Checks that both slot size and slot count are non-zero.
    #[track_caller]
    pub fn validate(&self) -> Result<(), InitArenaError> {
        ensure!(self.slot_size > 0, InitArenaErrorKind::ZeroSlotSize);
        ensure!(self.slot_count > 0, InitArenaErrorKind::ZeroSlotCount);
        Ok(())
    }
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self::new(Self::DEFAULT_SLOT_SIZE, Self::DEFAULT_SLOT_COUNT)
    }
}

//! Error types returned by the slot arena.
//!
//! Every failure family has a `*Kind` enum describing what went wrong and a
//! wrapper struct that additionally records where the error was created.

/// The kinds of errors that can occur when initializing a slot arena.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
#[non_exhaustive]
pub enum InitArenaErrorKind {
    #[display("slot size must be greater than zero")]
    ZeroSlotSize,
    #[display("slot count must be greater than zero")]
    ZeroSlotCount,
    #[display("arena capacity overflows usize: slot_size={slot_size}, slot_count={slot_count}")]
    CapacityOverflow { slot_size: usize, slot_count: usize },
    #[display("backing store length mismatch: expected={expected}, actual={actual}")]
    BackingLengthMismatch { expected: usize, actual: usize },
}

define_error!(
    /// The error type returned when a slot arena cannot be initialized.
    pub struct InitArenaError {
        kind: InitArenaErrorKind,
    }
);

/// The kinds of errors that can occur when allocating from a slot arena.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
#[non_exhaustive]
pub enum AllocateErrorKind {
    #[display("allocation size must be greater than zero")]
    ZeroSize,
    /// No contiguous free run of sufficient length exists.
    #[display(
        "out of arena memory: requested={requested}, slots_needed={slots_needed}, \
         free_slots={free_slots}, largest_run={largest_run}"
    )]
    OutOfArenaMemory {
        requested: usize,
        slots_needed: usize,
        free_slots: usize,
        largest_run: usize,
    },
}

define_error!(
    /// The error type returned when an allocation request cannot be satisfied.
    pub struct AllocateError {
        kind: AllocateErrorKind,
    }
);

impl AllocateError {
    /// Returns `true` if the arena had no contiguous run large enough.
    #[must_use]
    pub fn is_out_of_memory(&self) -> bool {
        matches!(self.kind, AllocateErrorKind::OutOfArenaMemory { .. })
    }
}

/// The kinds of errors that can occur when returning a region to the arena.
///
/// All of these indicate a caller bug.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
#[non_exhaustive]
pub enum InvalidFreeErrorKind {
    #[display("empty buffer descriptor freed")]
    EmptyDescriptor,
    #[display("region out of bounds: offset={offset}, max={max}, capacity={capacity}")]
    OutOfBounds {
        offset: usize,
        max: usize,
        capacity: usize,
    },
    #[display("region offset is not slot aligned: offset={offset}, slot_size={slot_size}")]
    UnalignedOffset { offset: usize, slot_size: usize },
    #[display("region size is not a positive multiple of the slot size: max={max}, slot_size={slot_size}")]
    InvalidCapacity { max: usize, slot_size: usize },
    #[display("slot is not allocated: slot={slot}")]
    SlotNotAllocated { slot: usize },
}

define_error!(
    /// The error type returned when a region handed back to the arena is
    /// invalid.
    pub struct InvalidFreeError {
        kind: InvalidFreeErrorKind,
    }
);

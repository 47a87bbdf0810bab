//! Per-slot bookkeeping.
//!
//! Each slot of the backing store is tracked by a [`Slot`] entry. A free slot
//! carries a [`SlotHeader`] linking it into the free list; an allocated slot
//! carries nothing, because its bytes belong to the caller.

/// Metadata of a slot that is currently on the free list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotHeader {
    /// Index of the next free slot, or `None` if this is the tail.
    pub next: Option<usize>,
    /// Size of the slot in bytes. Always the arena's slot size.
    pub size: usize,
}

impl SlotHeader {
    /// Creates an unlinked header for a slot of `size` bytes.
    #[must_use]
    pub const fn new(size: usize) -> Self {
        Self { next: None, size }
    }
}

/// State of a single slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    /// The slot is on the free list.
    Free(SlotHeader),
    /// The slot is part of a region owned by a caller.
    Allocated,
}

impl Slot {
    /// Returns the header if the slot is free.
    #[must_use]
    pub fn header(&self) -> Option<&SlotHeader> {
        match self {
            Self::Free(header) => Some(header),
            Self::Allocated => None,
        }
    }

    /// Returns the header mutably if the slot is free.
    #[must_use]
    pub fn header_mut(&mut self) -> Option<&mut SlotHeader> {
        match self {
            Self::Free(header) => Some(header),
            Self::Allocated => None,
        }
    }

    #[must_use]
    pub fn is_free(&self) -> bool {
        matches!(self, Self::Free(_))
    }
}

/// Returns the number of slots needed to hold `requested_size` bytes.
///
/// The result is `ceil(requested_size / slot_size)`, and never less than one.
///
/// # Panics
///
/// Panics if `slot_size` is zero.
///
/// # Examples
///
/// ```
/// use slot_arena::slots_needed;
///
/// assert_eq!(slots_needed(10, 256), 1);
/// assert_eq!(slots_needed(256, 256), 1);
/// assert_eq!(slots_needed(345, 256), 2);
/// assert_eq!(slots_needed(1024, 256), 4);
/// ```
#[must_use]
pub fn slots_needed(requested_size: usize, slot_size: usize) -> usize {
    assert!(slot_size > 0, "slot size must be greater than zero");
    requested_size.div_ceil(slot_size).max(1)
}

#[cfg_attr(coverage_nightly, coverage(off))]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slots_needed_rounds_up() {
        assert_eq!(slots_needed(1, 256), 1);
        assert_eq!(slots_needed(257, 256), 2);
        assert_eq!(slots_needed(512, 256), 2);
        assert_eq!(slots_needed(513, 256), 3);
    }

    #[test]
    fn slots_needed_minimum_is_one() {
        assert_eq!(slots_needed(0, 256), 1);
    }

    #[test]
    #[should_panic = "slot size must be greater than zero"]
    fn slots_needed_zero_slot_size() {
        let _ = slots_needed(1, 0);
    }

    #[test]
    fn header_only_for_free_slots() {
        let mut slot = Slot::Free(SlotHeader::new(64));
        assert!(slot.is_free());
        slot.header_mut().unwrap().next = Some(3);
        assert_eq!(
            slot.header(),
            Some(&SlotHeader {
                next: Some(3),
                size: 64
            })
        );

        let slot = Slot::Allocated;
        assert!(!slot.is_free());
        assert!(slot.header().is_none());
    }
}

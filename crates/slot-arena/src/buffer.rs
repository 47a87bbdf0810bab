//! Caller-facing handle over an arena-granted region.

use core::ops::Range;

/// A view over a region of the arena's backing store.
///
/// The arena sets the offset and capacity when the region is granted and
/// clears both when it is returned. The length is managed by the caller and
/// never interpreted by the arena, except that [`SlotArena::reallocate`]
/// copies the first `len()` bytes.
///
/// The default value is the empty descriptor: no region, zero length and
/// zero capacity. The type is deliberately neither `Clone` nor `Copy`, so a
/// region can only be returned to the arena through the one descriptor that
/// owns it.
///
/// [`SlotArena::reallocate`]: crate::SlotArena::reallocate
#[derive(Debug, Default, PartialEq, Eq, Hash)]
pub struct BufferDescriptor {
    offset: Option<usize>,
    length: usize,
    max: usize,
}

impl BufferDescriptor {
    pub(crate) fn granted(offset: usize, max: usize) -> Self {
        Self {
            offset: Some(offset),
            length: 0,
            max,
        }
    }

    /// Returns the empty descriptor.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            offset: None,
            length: 0,
            max: 0,
        }
    }

    /// Resets the descriptor to the empty state.
    pub(crate) fn clear(&mut self) {
        *self = Self::empty();
    }

    /// Byte offset of the region in the backing store, or `None` for the
    /// empty descriptor.
    #[must_use]
    pub fn offset(&self) -> Option<usize> {
        self.offset
    }

    /// Number of bytes in use, as set by the caller.
    #[must_use]
    pub fn len(&self) -> usize {
        self.length
    }

    /// Returns `true` if no bytes are in use.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// Sets the number of bytes in use.
    ///
    /// # Panics
    ///
    /// Panics if `length` exceeds the capacity.
    pub fn set_len(&mut self, length: usize) {
        assert!(
            length <= self.max,
            "length {length} exceeds buffer capacity {}",
            self.max
        );
        self.length = length;
    }

    /// Capacity of the region in bytes. Always a whole multiple of the slot
    /// size of the arena that granted it.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.max
    }

    /// Returns `true` if the descriptor currently refers to a region.
    #[must_use]
    pub fn is_allocated(&self) -> bool {
        self.offset.is_some()
    }

    /// Returns the byte range of the whole region.
    pub(crate) fn byte_range(&self) -> Option<Range<usize>> {
        let offset = self.offset?;
        Some(offset..offset + self.max)
    }

    /// Returns the indices of the slots the region covers, for an arena with
    /// the given slot size.
    ///
    /// Empty for the empty descriptor.
    #[must_use]
    pub fn slot_range(&self, slot_size: usize) -> Range<usize> {
        match self.offset {
            Some(offset) => offset / slot_size..(offset + self.max) / slot_size,
            None => 0..0,
        }
    }
}

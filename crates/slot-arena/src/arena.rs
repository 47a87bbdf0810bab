//! The slot arena.
//!
//! [`SlotArena`] partitions a single backing buffer into equally sized slots
//! and services variable-sized requests by handing out runs of contiguous
//! slots.
//!
//! # Algorithm
//!
//! - **Allocation**: the request is rounded up to whole slots. The free list
//!   is walked from the head and, for every node, the length of the
//!   contiguous run starting there is measured. The first node whose run is
//!   long enough is the allocation site (first-fit, lowest address). Exactly
//!   the needed slots are spliced out and zero-filled.
//! - **Free**: the region is carved back into slots, and each slot is
//!   inserted into the free list in address order. Adjacent free slots are
//!   never merged into one record; contiguity is rediscovered by traversal.
//! - **Reallocation**: always allocate-new, copy, free-old. There is no
//!   in-place growth or shrink.
//!
//! # Performance Characteristics
//!
//! - **Allocation**: O(n) run measurements where n is the number of free
//!   slots, each proportional to the run length walked
//! - **Free**: O(n) per freed slot, with consecutive slots of one region
//!   continuing from the previous insertion point
//! - **Reallocation**: one allocation, one copy of `len()` bytes, one free

use alloc::{boxed::Box, vec};
use core::{fmt, ops::Range};

use crate::{
    buffer::BufferDescriptor,
    config::ArenaConfig,
    error::{
        AllocateError, AllocateErrorKind, InitArenaError, InitArenaErrorKind, InvalidFreeError,
        InvalidFreeErrorKind,
    },
    free_list::{ContiguousRun, FreeList},
    slot::{Slot, slots_needed},
};

/// A fixed-slot memory arena.
///
/// The arena exclusively owns its backing store for its whole lifetime and
/// never grows, compacts, or falls back to another allocator.
///
/// # Thread Safety
///
/// The arena is `Send` but all operations take `&mut self`; callers sharing
/// one arena between threads must serialize access externally.
pub struct SlotArena {
    memory: Box<[u8]>,
    config: ArenaConfig,
    free_list: FreeList,
}

impl fmt::Debug for SlotArena {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SlotArena")
            .field("config", &self.config)
            .field("head", &self.free_list.head())
            .field("free_slots", &self.free_slot_count())
            .finish_non_exhaustive()
    }
}

impl SlotArena {
    /// Builds an arena over an externally acquired backing store.
    ///
    /// The store must be exactly `slot_size * slot_count` bytes long. Every
    /// slot starts out free, linked in address order with the head at offset
    /// zero.
    ///
    /// # Examples
    ///
    /// ```
    /// use slot_arena::{ArenaConfig, SlotArena};
    ///
    /// let memory = vec![0u8; 1024].into_boxed_slice();
    /// let arena = SlotArena::new(memory, ArenaConfig::new(256, 4)).unwrap();
    /// assert_eq!(arena.free_slot_count(), 4);
    /// assert_eq!(arena.contiguous_free_from_head(), 4);
    /// ```
    #[track_caller]
    pub fn new(memory: Box<[u8]>, config: ArenaConfig) -> Result<Self, InitArenaError> {
        let expected = config.backing_len()?;
        ensure!(
            memory.len() == expected,
            InitArenaErrorKind::BackingLengthMismatch {
                expected,
                actual: memory.len(),
            }
        );

        #[cfg(feature = "tracing")]
        tracing::debug!(
            slot_size = config.slot_size,
            slot_count = config.slot_count,
            "initialized slot arena"
        );

        Ok(Self {
            memory,
            config,
            free_list: FreeList::new(config.slot_count, config.slot_size),
        })
    }

    /// Builds an arena over a freshly acquired, zeroed backing store.
    #[track_caller]
    pub fn with_config(config: ArenaConfig) -> Result<Self, InitArenaError> {
        let len = config.backing_len()?;
        Self::new(vec![0; len].into_boxed_slice(), config)
    }

    /// Tears the arena down and hands the backing store back.
    #[must_use]
    pub fn into_memory(self) -> Box<[u8]> {
        self.memory
    }

    #[must_use]
    pub fn config(&self) -> ArenaConfig {
        self.config
    }

    #[must_use]
    pub fn slot_size(&self) -> usize {
        self.config.slot_size
    }

    #[must_use]
    pub fn slot_count(&self) -> usize {
        self.config.slot_count
    }

    /// Total size of the backing store in bytes.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.memory.len()
    }

    /// Allocates a zero-filled region of at least `size` bytes.
    ///
    /// The returned descriptor has a capacity of `size` rounded up to whole
    /// slots and a length of zero.
    ///
    /// # Examples
    ///
    /// ```
    /// use slot_arena::{ArenaConfig, SlotArena};
    ///
    /// let mut arena = SlotArena::with_config(ArenaConfig::new(256, 4)).unwrap();
    /// let mut buf = arena.allocate(300).unwrap();
    /// assert_eq!(buf.capacity(), 512);
    /// assert!(arena.bytes_mut(&buf).iter().all(|&b| b == 0));
    ///
    /// assert!(arena.allocate(1024).unwrap_err().is_out_of_memory());
    /// arena.free(&mut buf);
    /// ```
    #[track_caller]
    pub fn allocate(&mut self, size: usize) -> Result<BufferDescriptor, AllocateError> {
        let region = self.allocate_region(size)?;
        Ok(BufferDescriptor::granted(region.start, region.len()))
    }

    #[track_caller]
    fn allocate_region(&mut self, size: usize) -> Result<Range<usize>, AllocateError> {
        ensure!(size > 0, AllocateErrorKind::ZeroSize);

        let slot_size = self.slot_size();
        let count = slots_needed(size, slot_size);
        let Some((prev, start)) = self.free_list.find_run(count) else {
            let free_slots = self.free_slot_count();
            let largest_run = self.free_runs().map(|run| run.count).max().unwrap_or(0);
            #[cfg(feature = "tracing")]
            tracing::debug!(
                requested = size,
                slots_needed = count,
                free_slots,
                largest_run,
                "arena allocation failed"
            );
            bail!(AllocateErrorKind::OutOfArenaMemory {
                requested: size,
                slots_needed: count,
                free_slots,
                largest_run,
            });
        };

        self.free_list.take_run(prev, start, count);
        let region = start * slot_size..(start + count) * slot_size;
        self.memory[region.clone()].fill(0);

        #[cfg(feature = "tracing")]
        tracing::debug!(
            requested = size,
            offset = region.start,
            max = region.len(),
            "allocated from arena"
        );
        Ok(region)
    }

    /// Returns a region to the arena and clears the descriptor.
    ///
    /// Nothing is modified if the descriptor is rejected.
    #[track_caller]
    pub fn try_free(&mut self, buffer: &mut BufferDescriptor) -> Result<(), InvalidFreeError> {
        let slots = self.validate_region(buffer)?;
        #[cfg(feature = "tracing")]
        let (offset, count) = (slots.start * self.slot_size(), slots.len());

        let mut hint = None;
        for slot in slots {
            self.free_list.insert_from(slot, hint);
            hint = Some(slot);
        }

        #[cfg(feature = "tracing")]
        tracing::debug!(offset, slots = count, "freed to arena");
        buffer.clear();
        Ok(())
    }

    /// Returns a region to the arena and clears the descriptor.
    ///
    /// # Panics
    ///
    /// Panics if the descriptor is empty, does not describe a slot-aligned
    /// region inside this arena, or covers a slot that is already free. The
    /// check is performed in every build profile.
    #[track_caller]
    pub fn free(&mut self, buffer: &mut BufferDescriptor) {
        if let Err(err) = self.try_free(buffer) {
            panic!("invalid free: {err}");
        }
    }

    /// Moves the contents of `buffer` into a fresh region of at least
    /// `new_size` bytes.
    ///
    /// A new region is allocated first, then `min(len, new capacity)` bytes
    /// are copied and the old region is freed, for growth and shrink alike.
    /// The new descriptor's length is the number of bytes copied. An empty
    /// descriptor is simply allocated.
    ///
    /// If no sufficient run exists the old region is still freed, `buffer` is
    /// cleared to the empty descriptor and the error is returned.
    ///
    /// # Panics
    ///
    /// Panics if `buffer` is neither empty nor a valid region of this arena.
    ///
    /// # Examples
    ///
    /// ```
    /// use slot_arena::{ArenaConfig, SlotArena};
    ///
    /// let mut arena = SlotArena::with_config(ArenaConfig::new(16, 8)).unwrap();
    /// let mut buf = arena.allocate(10).unwrap();
    /// arena.bytes_mut(&buf)[..5].copy_from_slice(b"hello");
    /// buf.set_len(5);
    ///
    /// arena.reallocate(&mut buf, 40).unwrap();
    /// assert_eq!(buf.capacity(), 48);
    /// assert_eq!(arena.bytes(&buf), b"hello");
    /// ```
    #[track_caller]
    pub fn reallocate(
        &mut self,
        buffer: &mut BufferDescriptor,
        new_size: usize,
    ) -> Result<(), AllocateError> {
        let old_region = match self.validate_region(buffer) {
            Ok(_) => buffer.byte_range(),
            Err(err) if *err.kind() == InvalidFreeErrorKind::EmptyDescriptor => None,
            Err(err) => panic!("invalid reallocation: {err}"),
        };

        let new_region = match self.allocate_region(new_size) {
            Ok(region) => region,
            Err(err) => {
                if old_region.is_some() {
                    self.free(buffer);
                }
                return Err(err);
            }
        };
        let mut new_buffer = BufferDescriptor::granted(new_region.start, new_region.len());

        if let Some(old_region) = old_region {
            let copy_len = buffer.len().min(new_region.len());
            self.memory
                .copy_within(old_region.start..old_region.start + copy_len, new_region.start);
            new_buffer.set_len(copy_len);
            self.free(buffer);

            #[cfg(feature = "tracing")]
            tracing::debug!(
                from = old_region.start,
                to = new_region.start,
                copied = copy_len,
                "reallocated in arena"
            );
        }

        *buffer = new_buffer;
        Ok(())
    }

    /// Checks that `buffer` describes allocated slots of this arena and
    /// returns their indices.
    #[track_caller]
    fn validate_region(&self, buffer: &BufferDescriptor) -> Result<Range<usize>, InvalidFreeError> {
        let slot_size = self.slot_size();
        let capacity = self.capacity();
        let Some(offset) = buffer.offset() else {
            bail!(InvalidFreeErrorKind::EmptyDescriptor);
        };
        let max = buffer.capacity();

        ensure!(
            max > 0 && max.is_multiple_of(slot_size),
            InvalidFreeErrorKind::InvalidCapacity { max, slot_size }
        );
        ensure!(
            offset < capacity && max <= capacity - offset,
            InvalidFreeErrorKind::OutOfBounds {
                offset,
                max,
                capacity,
            }
        );
        ensure!(
            offset.is_multiple_of(slot_size),
            InvalidFreeErrorKind::UnalignedOffset { offset, slot_size }
        );

        let slots = buffer.slot_range(slot_size);
        if let Some(slot) = slots
            .clone()
            .find(|&slot| self.free_list.slot(slot).is_some_and(Slot::is_free))
        {
            bail!(InvalidFreeErrorKind::SlotNotAllocated { slot });
        }
        Ok(slots)
    }

    /// Returns the bytes in use (`len()` bytes) of a granted region.
    ///
    /// Returns an empty slice for the empty descriptor.
    ///
    /// # Panics
    ///
    /// Panics if the descriptor does not describe a live region of this
    /// arena.
    #[track_caller]
    #[must_use]
    pub fn bytes(&self, buffer: &BufferDescriptor) -> &[u8] {
        let region = self.checked_byte_range(buffer);
        &self.memory[region.start..region.start + buffer.len()]
    }

    /// Returns the whole `capacity()`-byte region of a granted descriptor.
    ///
    /// Returns an empty slice for the empty descriptor.
    ///
    /// # Panics
    ///
    /// Panics if the descriptor does not describe a live region of this
    /// arena.
    #[track_caller]
    #[must_use]
    pub fn bytes_mut(&mut self, buffer: &BufferDescriptor) -> &mut [u8] {
        let region = self.checked_byte_range(buffer);
        &mut self.memory[region]
    }

    #[track_caller]
    fn checked_byte_range(&self, buffer: &BufferDescriptor) -> Range<usize> {
        match self.validate_region(buffer) {
            Ok(slots) => slots.start * self.slot_size()..slots.end * self.slot_size(),
            Err(err) if *err.kind() == InvalidFreeErrorKind::EmptyDescriptor => 0..0,
            Err(err) => panic!("buffer descriptor does not belong to this arena: {err}"),
        }
    }

    /// Returns the state of a slot, or `None` if the index is out of range.
    #[must_use]
    pub fn slot(&self, index: usize) -> Option<&Slot> {
        self.free_list.slot(index)
    }

    /// Byte offset of the free list head, or `None` when every slot is
    /// allocated.
    #[must_use]
    pub fn head_offset(&self) -> Option<usize> {
        self.free_list.head().map(|head| head * self.slot_size())
    }

    /// Iterates over free slot indices in list order.
    pub fn free_list(&self) -> impl Iterator<Item = usize> + '_ {
        self.free_list.iter()
    }

    /// Iterates over the maximal runs of contiguous free slots in address
    /// order.
    pub fn free_runs(&self) -> impl Iterator<Item = ContiguousRun> + '_ {
        self.free_list.runs()
    }

    /// Length of the contiguous run starting at the free list head, or zero
    /// when the list is empty.
    #[must_use]
    pub fn contiguous_free_from_head(&self) -> usize {
        self.free_list
            .head()
            .map_or(0, |head| self.free_list.contiguous_run(head).count)
    }

    /// Follows `offset` free list links starting at free slot `start`.
    ///
    /// Returns `None` if `start` is not a free slot or the list ends first.
    #[must_use]
    pub fn slot_at_offset(&self, start: usize, offset: usize) -> Option<usize> {
        if !self.free_list.slot(start).is_some_and(Slot::is_free) {
            return None;
        }
        self.free_list.node_at_offset(start, offset)
    }

    /// Number of slots on the free list.
    #[must_use]
    pub fn free_slot_count(&self) -> usize {
        self.free_list.iter().count()
    }

    /// Number of slots currently owned by callers.
    #[must_use]
    pub fn allocated_slot_count(&self) -> usize {
        self.free_list.slot_count() - self.free_slot_count()
    }

    /// Returns `true` if no region is outstanding.
    #[must_use]
    pub fn is_fully_free(&self) -> bool {
        self.free_slot_count() == self.slot_count()
    }
}

//! Fixed-slot memory arena for variable-sized byte buffers.
//!
//! A [`SlotArena`] takes ownership of a single pre-reserved block of memory,
//! partitions it into `slot_count` slots of `slot_size` bytes, and services
//! byte-buffer requests of any size by granting runs of contiguous slots. It
//! never consults a general-purpose allocator after initialization.
//!
//! # Components
//!
//! - [`ArenaConfig`]: slot geometry.
//! - [`Slot`] / [`SlotHeader`]: per-slot state. A free slot carries a header
//!   linking it into the free list; an allocated slot carries nothing.
//! - Free list: singly linked chain of free slots kept in ascending address
//!   order. Runs of back-to-back free slots ([`ContiguousRun`]) are
//!   discovered by walking the list, never stored.
//! - [`BufferDescriptor`]: the caller's handle over a granted region
//!   (offset, length, capacity).
//!
//! # Usage Example
//!
//! ```rust
//! use slot_arena::{ArenaConfig, SlotArena};
//!
//! // 4 slots × 256 bytes
//! let mut arena = SlotArena::with_config(ArenaConfig::new(256, 4)).unwrap();
//!
//! let mut a = arena.allocate(300).unwrap();
//! assert_eq!(a.capacity(), 512);
//! let mut b = arena.allocate(100).unwrap();
//! assert_eq!(b.capacity(), 256);
//!
//! arena.free(&mut a);
//! assert_eq!(arena.free_slot_count(), 3);
//! let runs: Vec<_> = arena.free_runs().map(|run| run.slots()).collect();
//! assert_eq!(runs, [0..2, 3..4]);
//!
//! // first fit: reuses the region `a` used to occupy
//! let mut c = arena.allocate(512).unwrap();
//! assert_eq!(c.offset(), Some(0));
//!
//! arena.free(&mut b);
//! arena.free(&mut c);
//! assert_eq!(arena.contiguous_free_from_head(), 4);
//! assert_eq!(arena.head_offset(), Some(0));
//! ```
//!
//! # Error Handling
//!
//! Running out of contiguous slots is an expected outcome reported as
//! [`AllocateError`]. Returning a region that does not belong to the arena
//! is a caller bug: [`SlotArena::try_free`] reports it as
//! [`InvalidFreeError`], and [`SlotArena::free`] panics in every build
//! profile.
//!
//! # Thread Safety
//!
//! The arena performs no locking. It is `Send`, and every operation takes
//! `&mut self`, so sharing one arena across threads requires external
//! synchronization (e.g. a mutex around all arena calls), or one arena per
//! worker.
//!
//! # Features
//!
//! - `tracing`: emit `tracing` events for allocation, free, and
//!   reallocation outcomes.

#![cfg_attr(not(test), no_std)]
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

extern crate alloc;

#[macro_use]
mod macros;

pub mod arena;
pub mod buffer;
pub mod config;
pub mod error;
pub mod free_list;
pub mod slot;

pub use self::{
    arena::SlotArena,
    buffer::BufferDescriptor,
    config::ArenaConfig,
    error::{
        AllocateError, AllocateErrorKind, InitArenaError, InitArenaErrorKind, InvalidFreeError,
        InvalidFreeErrorKind,
    },
    free_list::ContiguousRun,
    slot::{Slot, SlotHeader, slots_needed},
};

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![cfg_attr(coverage_nightly, coverage(off))]
#![cfg(test)]

use std::ops::Range;

use slot_arena::{
    AllocateErrorKind, ArenaConfig, BufferDescriptor, InvalidFreeErrorKind, SlotArena,
};

fn runs(arena: &SlotArena) -> Vec<Range<usize>> {
    arena.free_runs().map(|run| run.slots()).collect()
}

#[test]
fn first_fit_reuses_freed_region() {
    let mut arena = SlotArena::with_config(ArenaConfig::new(256, 4)).unwrap();
    let initial_head = arena.head_offset();

    let mut a = arena.allocate(300).unwrap();
    assert_eq!(a.capacity(), 512);
    let mut b = arena.allocate(100).unwrap();
    assert_eq!(b.capacity(), 256);

    arena.free(&mut a);
    assert_eq!(runs(&arena), [0..2, 3..4]);
    assert_eq!(arena.free_runs().map(|run| run.count).sum::<usize>(), 3);

    let mut c = arena.allocate(512).unwrap();
    assert_eq!(c.offset(), Some(0));
    assert_eq!(c.capacity(), 512);

    arena.free(&mut b);
    arena.free(&mut c);
    assert_eq!(runs(&arena), [0..4]);
    assert_eq!(arena.contiguous_free_from_head(), 4);
    assert_eq!(arena.head_offset(), initial_head);
}

#[test]
fn request_beyond_capacity_fails() {
    let mut arena = SlotArena::with_config(ArenaConfig::new(256, 4)).unwrap();
    let err = arena.allocate(256 * 4 + 1).unwrap_err();
    assert!(matches!(
        err.kind(),
        AllocateErrorKind::OutOfArenaMemory { slots_needed: 5, .. }
    ));
    assert_eq!(runs(&arena), [0..4]);
}

#[test]
fn allocate_and_free_restores_initial_state() {
    let mut arena = SlotArena::with_config(ArenaConfig::default()).unwrap();
    let before = arena.contiguous_free_from_head();
    assert_eq!(before, 32);

    let mut a = arena.allocate(10).unwrap();
    let mut b = arena.allocate(345).unwrap();
    arena.free(&mut a);
    arena.free(&mut b);
    assert_eq!(arena.contiguous_free_from_head(), before);

    // [free][used][free][free]...
    let mut a = arena.allocate(256).unwrap();
    let mut b = arena.allocate(256).unwrap();
    arena.free(&mut a);
    assert_eq!(arena.contiguous_free_from_head(), 1);
    let mut c = arena.allocate(512).unwrap();
    assert_eq!(c.offset(), Some(512));

    arena.free(&mut b);
    arena.free(&mut c);
    assert!(arena.is_fully_free());
    assert_eq!(arena.contiguous_free_from_head(), before);
}

#[test]
fn repeated_reallocation_keeps_text() {
    let mut arena = SlotArena::with_config(ArenaConfig::default()).unwrap();
    let mut text = arena.allocate(10).unwrap();
    let alphabet: Vec<u8> = (0..256).map(|i| b'A' + (i % 26) as u8).collect();

    let max = text.capacity();
    arena.bytes_mut(&text).copy_from_slice(&alphabet[..max]);
    text.set_len(max);

    arena.reallocate(&mut text, 20).unwrap();
    assert_eq!(text.capacity(), 256);
    assert_eq!(arena.bytes(&text), &alphabet[..256]);

    arena.reallocate(&mut text, 700).unwrap();
    assert_eq!(text.capacity(), 768);
    assert_eq!(text.len(), 256);
    assert_eq!(arena.bytes(&text), &alphabet[..256]);

    arena.reallocate(&mut text, 10).unwrap();
    assert_eq!(text.capacity(), 256);
    assert_eq!(arena.bytes(&text), &alphabet[..256]);

    arena.free(&mut text);
    assert!(arena.is_fully_free());
}

#[test]
fn stale_descriptor_is_rejected() {
    let mut arena = SlotArena::with_config(ArenaConfig::new(64, 4)).unwrap();
    let mut other = SlotArena::with_config(ArenaConfig::new(64, 4)).unwrap();

    let mut mine = arena.allocate(64).unwrap();
    let mut theirs = other.allocate(64).unwrap();
    arena.free(&mut mine);

    // same geometry, but the slot it names is free here
    let err = arena.try_free(&mut theirs).unwrap_err();
    assert_eq!(err.kind(), &InvalidFreeErrorKind::SlotNotAllocated { slot: 0 });
    assert!(theirs.is_allocated());
    assert_eq!(mine, BufferDescriptor::empty());
}

#[test]
#[should_panic = "buffer descriptor does not belong to this arena"]
fn foreign_descriptor_access_panics() {
    let arena = SlotArena::with_config(ArenaConfig::new(64, 2)).unwrap();
    let mut other = SlotArena::with_config(ArenaConfig::new(64, 8)).unwrap();
    let _pad = other.allocate(256).unwrap();
    let theirs = other.allocate(64).unwrap();
    let _ = arena.bytes(&theirs);
}

//! Address-ordered free list of slots.
//!
//! The free list is a singly linked chain threaded through the [`Slot`]
//! table. Links are slot indices rather than pointers, so the "address" of a
//! node is its index and its byte offset is `index * slot_size`.
//!
//! # Invariants
//!
//! - Nodes appear in strictly ascending index order from head to tail.
//! - Every node on the list is a [`Slot::Free`] entry whose header size equals
//!   the slot size, and every [`Slot::Free`] entry is on the list.
//!
//! Contiguity is never stored. Two nodes `a` and `b` are contiguous iff
//! `offset(b) == offset(a) + a.size`, and runs of contiguous free slots are
//! rediscovered by walking the list.
//!
//! ```text
//! slots:  [F]->[F]->[F]  [A]  [A]  [F]->[F]  [A]
//! index:   0    1    2    3    4    5    6    7
//! runs:   {0..3}                   {5..7}
//! ```

use alloc::boxed::Box;
use core::iter;

use crate::slot::{Slot, SlotHeader};

/// A maximal-or-prefix sequence of contiguous free slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContiguousRun {
    /// Index of the first slot of the run.
    pub start: usize,
    /// Number of slots in the run.
    pub count: usize,
    /// Index of the last slot of the run.
    pub last: usize,
}

impl ContiguousRun {
    /// Returns the slot indices covered by the run.
    #[must_use]
    pub fn slots(&self) -> core::ops::Range<usize> {
        self.start..self.start + self.count
    }
}

/// Index-linked free list over a fixed table of slots.
#[derive(Debug, Clone)]
pub(crate) struct FreeList {
    slots: Box<[Slot]>,
    head: Option<usize>,
    slot_size: usize,
}

impl FreeList {
    /// Creates a list in which every slot is free, linked in ascending order
    /// with the head at slot 0.
    pub(crate) fn new(slot_count: usize, slot_size: usize) -> Self {
        assert!(slot_size > 0, "slot size must be greater than zero");
        let slots = (0..slot_count)
            .map(|index| {
                let next = (index + 1 < slot_count).then_some(index + 1);
                Slot::Free(SlotHeader {
                    next,
                    size: slot_size,
                })
            })
            .collect();
        Self {
            slots,
            head: (slot_count > 0).then_some(0),
            slot_size,
        }
    }

    pub(crate) fn head(&self) -> Option<usize> {
        self.head
    }

    pub(crate) fn slot_count(&self) -> usize {
        self.slots.len()
    }

    pub(crate) fn slot(&self, index: usize) -> Option<&Slot> {
        self.slots.get(index)
    }

    /// Returns the header of a node that is on the list.
    fn header(&self, index: usize) -> &SlotHeader {
        match &self.slots[index] {
            Slot::Free(header) => header,
            Slot::Allocated => panic!("slot {index} is linked but not free"),
        }
    }

    fn header_mut(&mut self, index: usize) -> &mut SlotHeader {
        match &mut self.slots[index] {
            Slot::Free(header) => header,
            Slot::Allocated => panic!("slot {index} is linked but not free"),
        }
    }

    fn offset(&self, index: usize) -> usize {
        index * self.slot_size
    }

    /// Returns the successor of a node.
    pub(crate) fn next(&self, index: usize) -> Option<usize> {
        self.header(index).next
    }

    /// Iterates over node indices from head to tail.
    pub(crate) fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        iter::successors(self.head, |&index| self.next(index))
    }

    /// Returns `true` if `second` starts exactly where `first` ends.
    pub(crate) fn are_contiguous(&self, first: usize, second: usize) -> bool {
        self.offset(first) + self.header(first).size == self.offset(second)
    }

    /// Counts the nodes forming an unbroken contiguous chain starting at
    /// `start`.
    ///
    /// Only the run itself is walked, not the rest of the list.
    pub(crate) fn contiguous_run(&self, start: usize) -> ContiguousRun {
        let mut count = 1;
        let mut last = start;
        while let Some(next) = self.next(last) {
            if !self.are_contiguous(last, next) {
                break;
            }
            count += 1;
            last = next;
        }
        ContiguousRun { start, count, last }
    }

    /// Iterates over the maximal contiguous runs of the list in address order.
    pub(crate) fn runs(&self) -> impl Iterator<Item = ContiguousRun> + '_ {
        iter::successors(self.head.map(|head| self.contiguous_run(head)), |run| {
            self.next(run.last).map(|next| self.contiguous_run(next))
        })
    }

    /// Follows `offset` links from `start`.
    ///
    /// Returns `None` if the list ends first.
    pub(crate) fn node_at_offset(&self, start: usize, offset: usize) -> Option<usize> {
        let mut node = Some(start);
        for _ in 0..offset {
            node = self.next(node?);
        }
        node
    }

    /// Finds the first node whose contiguous run holds at least `count`
    /// slots.
    ///
    /// Returns the node's predecessor on the list (if any) and the node.
    pub(crate) fn find_run(&self, count: usize) -> Option<(Option<usize>, usize)> {
        assert!(count > 0, "run length must be greater than zero");
        let mut prev = None;
        let mut current = self.head;
        while let Some(node) = current {
            if self.contiguous_run(node).count >= count {
                return Some((prev, node));
            }
            prev = Some(node);
            current = self.next(node);
        }
        None
    }

    /// Splices `count` nodes starting at `start` out of the list and marks
    /// them allocated.
    ///
    /// `prev` must be the predecessor of `start`, or `None` if `start` is the
    /// head, and the nodes must form a contiguous run.
    pub(crate) fn take_run(&mut self, prev: Option<usize>, start: usize, count: usize) {
        assert!(count > 0, "run length must be greater than zero");
        assert_eq!(
            prev.map_or(self.head, |prev| self.next(prev)),
            Some(start),
            "predecessor does not link to the run start"
        );
        let run = self.contiguous_run(start);
        assert!(run.count >= count, "run is shorter than requested");

        let successor = self.node_at_offset(start, count);
        match prev {
            Some(prev) => self.header_mut(prev).next = successor,
            None => self.head = successor,
        }
        for slot in &mut self.slots[start..start + count] {
            *slot = Slot::Allocated;
        }
    }

    /// Turns an allocated slot back into a free node, inserting it in address
    /// order.
    ///
    /// The scan starts at `hint` when it is a node preceding `index`, which
    /// lets a caller freeing ascending slots continue where the previous
    /// insertion left off.
    ///
    /// # Panics
    ///
    /// Panics if the slot is already free.
    pub(crate) fn insert_from(&mut self, index: usize, hint: Option<usize>) {
        assert!(
            matches!(self.slots[index], Slot::Allocated),
            "slot {index} is already free"
        );
        self.slots[index] = Slot::Free(SlotHeader::new(self.slot_size));

        let Some(head) = self.head else {
            self.head = Some(index);
            return;
        };

        if index < head {
            self.header_mut(index).next = Some(head);
            self.head = Some(index);
            #[cfg(feature = "tracing")]
            tracing::trace!(slot = index, "inserted free slot at head");
            return;
        }

        let mut prev = match hint {
            Some(hint) if hint < index && self.slots[hint].is_free() => hint,
            _ => head,
        };
        while let Some(next) = self.next(prev) {
            if next > index {
                break;
            }
            prev = next;
        }

        let next = self.next(prev);
        self.header_mut(index).next = next;
        self.header_mut(prev).next = Some(index);
        #[cfg(feature = "tracing")]
        tracing::trace!(slot = index, after = prev, "inserted free slot");
    }
}

#[cfg_attr(coverage_nightly, coverage(off))]
#[cfg(test)]
mod tests {
    use alloc::vec::Vec;

    use super::*;

    fn list_with_allocated(slot_count: usize, allocated: &[usize]) -> FreeList {
        let mut list = FreeList::new(slot_count, 16);
        for &slot in allocated {
            let prev = list.iter().take_while(|&node| node < slot).last();
            list.take_run(prev, slot, 1);
        }
        list
    }

    fn nodes(list: &FreeList) -> Vec<usize> {
        list.iter().collect()
    }

    #[test]
    fn new_list_is_one_run() {
        let list = FreeList::new(8, 16);
        assert_eq!(list.head(), Some(0));
        assert_eq!(nodes(&list), (0..8).collect::<Vec<_>>());
        assert_eq!(
            list.contiguous_run(0),
            ContiguousRun {
                start: 0,
                count: 8,
                last: 7
            }
        );
        assert!(list.are_contiguous(0, 1));
        assert!(!list.are_contiguous(0, 2));
        assert!(!list.are_contiguous(2, 0));
    }

    #[test]
    fn contiguous_run_stops_at_gap() {
        let list = list_with_allocated(8, &[3, 4]);
        assert_eq!(nodes(&list), [0, 1, 2, 5, 6, 7]);
        assert_eq!(list.contiguous_run(0).count, 3);
        assert_eq!(list.contiguous_run(0).last, 2);
        assert_eq!(list.contiguous_run(1).count, 2);
        assert_eq!(list.contiguous_run(5).count, 3);

        let runs: Vec<_> = list.runs().map(|run| run.slots()).collect();
        assert_eq!(runs, [0..3, 5..8]);
    }

    #[test]
    fn node_at_offset_follows_links() {
        let list = list_with_allocated(8, &[2]);
        assert_eq!(list.node_at_offset(0, 0), Some(0));
        assert_eq!(list.node_at_offset(0, 2), Some(3));
        assert_eq!(list.node_at_offset(0, 6), Some(7));
        assert_eq!(list.node_at_offset(0, 7), None);
        assert_eq!(list.node_at_offset(0, 20), None);
    }

    #[test]
    fn find_run_is_first_fit() {
        let list = list_with_allocated(8, &[1, 4]);
        // runs: {0}, {2..4}, {5..8}
        assert_eq!(list.find_run(1), Some((None, 0)));
        assert_eq!(list.find_run(2), Some((Some(0), 2)));
        assert_eq!(list.find_run(3), Some((Some(3), 5)));
        assert_eq!(list.find_run(4), None);
    }

    #[test]
    fn take_run_from_head_and_middle() {
        let mut list = FreeList::new(6, 16);
        list.take_run(None, 0, 2);
        assert_eq!(list.head(), Some(2));
        assert_eq!(nodes(&list), [2, 3, 4, 5]);

        list.take_run(Some(2), 3, 2);
        assert_eq!(nodes(&list), [2, 5]);
        assert!(!list.slot(3).unwrap().is_free());
        assert!(!list.slot(4).unwrap().is_free());

        list.take_run(Some(2), 5, 1);
        assert_eq!(nodes(&list), [2]);
        list.take_run(None, 2, 1);
        assert_eq!(list.head(), None);
        assert_eq!(list.runs().count(), 0);
    }

    #[test]
    #[should_panic = "run is shorter than requested"]
    fn take_run_across_gap_panics() {
        let mut list = list_with_allocated(4, &[2]);
        list.take_run(None, 0, 3);
    }

    #[test]
    fn insert_keeps_address_order() {
        let mut list = FreeList::new(6, 16);
        list.take_run(None, 0, 6);
        assert_eq!(list.head(), None);

        list.insert_from(3, None);
        assert_eq!(nodes(&list), [3]);
        list.insert_from(1, None);
        assert_eq!(nodes(&list), [1, 3]);
        list.insert_from(5, None);
        assert_eq!(nodes(&list), [1, 3, 5]);
        list.insert_from(4, None);
        assert_eq!(nodes(&list), [1, 3, 4, 5]);
        list.insert_from(0, None);
        list.insert_from(2, None);
        assert_eq!(nodes(&list), [0, 1, 2, 3, 4, 5]);
        assert_eq!(list.contiguous_run(0).count, 6);
    }

    #[test]
    fn insert_from_hint_matches_insert_from_head() {
        let mut hinted = list_with_allocated(8, &[1, 2, 3, 6]);
        let mut plain = hinted.clone();

        let mut hint = None;
        for slot in 1..4 {
            hinted.insert_from(slot, hint);
            hint = Some(slot);
        }
        for slot in 1..4 {
            plain.insert_from(slot, None);
        }
        assert_eq!(nodes(&hinted), nodes(&plain));
        assert_eq!(nodes(&hinted), [0, 1, 2, 3, 4, 5, 7]);
    }

    #[test]
    #[should_panic = "slot 2 is already free"]
    fn insert_free_slot_panics() {
        let mut list = FreeList::new(4, 16);
        list.insert_from(2, None);
    }
}

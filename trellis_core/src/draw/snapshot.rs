// Copyright 2026 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Cross-thread frame hand-off.
//!
//! The channel has three frame slots behind `RwLock`s and one atomically
//! published slot index:
//!
//! ```text
//!   logic thread                         render thread
//!   ────────────                         ─────────────
//!   begin():   write-lock a slot that
//!              is not published
//!   push()...  fill it
//!   publish(): unlock, swap index ──►    acquire(): load index,
//!                                                  try-read-lock that slot,
//!                                                  reload if reclaimed
//!                                        ...draw from the guard...
//!                                        drop guard
//! ```
//!
//! With a single reader the writer never waits: of the two unpublished
//! slots, at most one can be held by the reader. The reader never waits
//! either: a slot the writer has locked is one it reclaimed after a newer
//! publication, so the reader reloads the index instead. A reader only ever
//! sees a slot whose frame was completely written.

use core::ops::Deref;
use core::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard, TryLockError};

use kurbo::Size;
use tracing::trace;

use super::node::{DrawNode, Frame};

const SLOT_COUNT: usize = 3;

/// Published-index value before the first frame.
const NONE_PUBLISHED: usize = usize::MAX;

#[derive(Debug)]
struct Shared {
    slots: [RwLock<Frame>; SLOT_COUNT],
    published: AtomicUsize,
}

/// Creates a connected writer/reader pair.
#[must_use]
pub fn snapshot_channel() -> (SnapshotWriter, SnapshotReader) {
    let shared = Arc::new(Shared {
        slots: core::array::from_fn(|_| RwLock::new(Frame::default())),
        published: AtomicUsize::new(NONE_PUBLISHED),
    });
    (
        SnapshotWriter {
            shared: Arc::clone(&shared),
            next_sequence: 1,
        },
        SnapshotReader { shared },
    )
}

/// Logic-thread end of the channel.
#[derive(Debug)]
pub struct SnapshotWriter {
    shared: Arc<Shared>,
    next_sequence: u64,
}

impl SnapshotWriter {
    /// Starts a new frame in a slot no reader can be directed to.
    ///
    /// Dropping the returned guard without
    /// [`publish`](FrameWriter::publish) discards the frame.
    pub fn begin(&mut self) -> FrameWriter<'_> {
        let shared = &*self.shared;
        let published = shared.published.load(Ordering::Acquire);
        let candidates = (0..SLOT_COUNT).filter(|&slot| slot != published);

        let mut acquired = None;
        for slot in candidates.clone() {
            match shared.slots[slot].try_write() {
                Ok(guard) => acquired = Some((slot, guard)),
                Err(TryLockError::Poisoned(poisoned)) => {
                    acquired = Some((slot, poisoned.into_inner()));
                }
                Err(TryLockError::WouldBlock) => continue,
            }
            break;
        }
        // Only reachable with several readers holding every free slot.
        let (slot, mut guard) = match acquired {
            Some(found) => found,
            None => {
                let slot = candidates.min().unwrap_or(0);
                let guard = shared.slots[slot]
                    .write()
                    .unwrap_or_else(PoisonError::into_inner);
                (slot, guard)
            }
        };

        let sequence = self.next_sequence;
        self.next_sequence += 1;
        guard.reset(sequence);
        FrameWriter {
            guard,
            shared,
            slot,
        }
    }

    /// Sequence number the next [`begin`](Self::begin) will assign.
    #[must_use]
    pub fn next_sequence(&self) -> u64 {
        self.next_sequence
    }
}

/// A frame being written. Publish it with [`publish`](Self::publish).
#[derive(Debug)]
pub struct FrameWriter<'a> {
    guard: RwLockWriteGuard<'a, Frame>,
    shared: &'a Shared,
    slot: usize,
}

impl FrameWriter<'_> {
    /// Sequence number of this frame.
    #[must_use]
    pub fn sequence(&self) -> u64 {
        self.guard.sequence
    }

    /// Records the viewport size.
    pub fn set_viewport(&mut self, viewport: Size) {
        self.guard.viewport = viewport;
    }

    /// Appends a draw record.
    pub fn push(&mut self, node: DrawNode) {
        self.guard.nodes.push(node);
    }

    /// Number of records written so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.guard.nodes.len()
    }

    /// Returns whether no records have been written.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.guard.nodes.is_empty()
    }

    /// Completes the frame and makes it the one readers acquire.
    ///
    /// Returns the frame's sequence number.
    pub fn publish(self) -> u64 {
        let Self {
            mut guard,
            shared,
            slot,
        } = self;
        guard.complete = true;
        let sequence = guard.sequence;
        let count = guard.nodes.len();
        drop(guard);
        shared.published.swap(slot, Ordering::AcqRel);
        trace!(sequence, slot, count, "published frame");
        sequence
    }
}

/// Render-thread end of the channel. Cloneable; each clone reads
/// independently.
#[derive(Clone, Debug)]
pub struct SnapshotReader {
    shared: Arc<Shared>,
}

impl SnapshotReader {
    /// Locks the latest published frame for reading.
    ///
    /// Returns `None` before the first publication. Hold the guard for the
    /// duration of one render frame only.
    #[must_use]
    pub fn acquire(&self) -> Option<FrameGuard<'_>> {
        loop {
            let slot = self.shared.published.load(Ordering::Acquire);
            if slot == NONE_PUBLISHED {
                return None;
            }
            // The writer may have reclaimed the slot between the load and
            // the lock; a newer frame has been published since.
            if let Some(frame) = self.try_slot(slot) {
                return Some(frame);
            }
            core::hint::spin_loop();
        }
    }

    /// Read-locks `slot` if it holds a complete frame and no writer has it.
    fn try_slot(&self, slot: usize) -> Option<FrameGuard<'_>> {
        let guard = match self.shared.slots[slot].try_read() {
            Ok(guard) => guard,
            Err(TryLockError::Poisoned(poisoned)) => poisoned.into_inner(),
            Err(TryLockError::WouldBlock) => return None,
        };
        guard.complete.then_some(FrameGuard { guard })
    }

    /// Sequence number of the latest published frame, if any.
    #[must_use]
    pub fn latest_sequence(&self) -> Option<u64> {
        self.acquire().map(|frame| frame.sequence)
    }
}

/// Read access to a published [`Frame`].
#[derive(Debug)]
pub struct FrameGuard<'a> {
    guard: RwLockReadGuard<'a, Frame>,
}

impl Deref for FrameGuard<'_> {
    type Target = Frame;

    fn deref(&self) -> &Frame {
        &self.guard
    }
}

//! Request id allocation and reply correlation.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use parking_lot::Mutex;
use tokio::sync::mpsc;
use tracing::trace;

struct Slot<T> {
    tx: mpsc::Sender<T>,
    remaining: usize,
}

/// Maps outstanding request ids to the channel their replies are delivered on.
///
/// A slot expects a fixed number of replies. It is removed, and its channel
/// closed, when the last one arrives or when it is cancelled. After
/// [`close_all`](Self::close_all) new slots are born closed.
pub struct CompletionSlots<T> {
    next_id: AtomicU64,
    slots: Mutex<HashMap<u64, Slot<T>>>,
    closed: AtomicBool,
}

impl<T> std::fmt::Debug for CompletionSlots<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompletionSlots")
            .field("next_id", &self.next_id.load(Ordering::Relaxed))
            .field("outstanding", &self.len())
            .finish()
    }
}

impl<T> Default for CompletionSlots<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> CompletionSlots<T> {
    /// Create an empty registry. The first id handed out is 1.
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            slots: Mutex::new(HashMap::new()),
            closed: AtomicBool::new(false),
        }
    }

    /// Allocate an id whose slot completes after `uses` replies (at least one).
    ///
    /// Once the registry is closed the returned receiver is already at
    /// end-of-stream.
    pub fn register(&self, uses: usize) -> (u64, mpsc::Receiver<T>) {
        let uses = uses.max(1);
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = mpsc::channel(uses);

        let mut slots = self.slots.lock();
        if self.closed.load(Ordering::Acquire) {
            trace!(id, "Registry closed, slot not kept");
        } else {
            slots.insert(id, Slot { tx, remaining: uses });
        }
        (id, rx)
    }

    /// Deliver one reply for `id`. Returns `false` when no slot is waiting.
    pub fn deliver(&self, id: u64, item: T) -> bool {
        let tx = {
            let mut slots = self.slots.lock();
            let Some(slot) = slots.get_mut(&id) else {
                trace!(id, "No completion slot for reply");
                return false;
            };
            slot.remaining -= 1;
            if slot.remaining == 0 {
                slots.remove(&id).map(|slot| slot.tx)
            } else {
                Some(slot.tx.clone())
            }
        };

        // Capacity equals the expected uses, so this never fails for lack of room.
        if let Some(tx) = tx {
            if tx.try_send(item).is_err() {
                trace!(id, "Completion slot receiver dropped");
            }
        }
        true
    }

    /// Drop the slot for `id` regardless of remaining uses.
    pub fn cancel(&self, id: u64) -> bool {
        self.slots.lock().remove(&id).is_some()
    }

    /// Drop every slot, closing all waiting receivers, and refuse new ones.
    pub fn close_all(&self) {
        let drained: Vec<_> = {
            let mut slots = self.slots.lock();
            self.closed.store(true, Ordering::Release);
            slots.drain().collect()
        };
        if !drained.is_empty() {
            trace!(count = drained.len(), "Closed outstanding completion slots");
        }
    }

    /// Whether [`close_all`](Self::close_all) has run.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Number of outstanding slots.
    pub fn len(&self) -> usize {
        self.slots.lock().len()
    }

    /// Whether no slot is outstanding.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

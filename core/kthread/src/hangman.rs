//! Deadlock-trace hooks.
//!
//! Diagnostic bookkeeping for sleeping locks: each thread records which lock
//! it is blocked on and which locks it holds, and every transition is
//! emitted as a `trace` event. Nothing here affects correctness; the data
//! exists so a hung system can be read.

use std::cell::{Cell, RefCell};
use std::sync::atomic::{AtomicU64, Ordering};

use crate::current;

static NEXT_TOKEN: AtomicU64 = AtomicU64::new(1);

/// Per-lock token registered with the tracer.
pub struct Lockable {
    token: u64,
    name: String,
}

impl Lockable {
    /// Registers a lock under `name`.
    pub fn new(name: &str) -> Self {
        Self {
            token: NEXT_TOKEN.fetch_add(1, Ordering::Relaxed),
            name: name.to_owned(),
        }
    }

    /// The registered name.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }
}

thread_local! {
    static HELD: RefCell<Vec<u64>> = const { RefCell::new(Vec::new()) };
    static WAITING: Cell<Option<u64>> = const { Cell::new(None) };
}

/// Records that the calling thread is about to block on `lock`.
pub fn wait(lock: &Lockable) {
    WAITING.with(|w| w.set(Some(lock.token)));
    trace!("{} waiting for {}", current().id_name(), lock.name);
}

/// Records that the calling thread now holds `lock`.
pub fn acquire(lock: &Lockable) {
    WAITING.with(|w| w.set(None));
    HELD.with(|h| h.borrow_mut().push(lock.token));
    trace!("{} acquired {}", current().id_name(), lock.name);
}

/// Records that the calling thread gave `lock` up.
pub fn release(lock: &Lockable) {
    HELD.with(|h| {
        let mut held = h.borrow_mut();
        if let Some(pos) = held.iter().rposition(|&t| t == lock.token) {
            held.remove(pos);
        }
    });
    trace!("{} released {}", current().id_name(), lock.name);
}

/// How many traced locks the calling thread holds.
pub fn held_count() -> usize {
    HELD.with(|h| h.borrow().len())
}

#[cfg(test)]
mod tests {
    use super::{Lockable, acquire, held_count, release, wait};

    #[test]
    fn held_set_tracks_acquire_release() {
        let a = Lockable::new("lock a");
        let b = Lockable::new("lock b");
        assert_eq!(held_count(), 0);

        wait(&a);
        acquire(&a);
        acquire(&b);
        assert_eq!(held_count(), 2);

        release(&a);
        assert_eq!(held_count(), 1);
        release(&b);
        assert_eq!(held_count(), 0);
    }
}

//! A Mesa-style condition variable.

use kthread::{Spinlock, WaitChannel, current};

use crate::Mutex;

/// A condition variable keyed by an external [`Mutex`].
///
/// Carries no predicate of its own. Wakes are Mesa-style: a signalled thread
/// competes for the mutex on equal footing with newcomers, and spurious
/// wakes are permitted, so sleepers re-test their condition in a loop.
pub struct Condvar {
    name: String,
    guard: Spinlock<()>,
    wchan: WaitChannel,
}

impl Condvar {
    /// Creates a condition variable.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            guard: Spinlock::new(()),
            wchan: WaitChannel::new(name),
        }
    }

    /// The condition variable's name.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Atomically releases `mutex` and sleeps; re-acquires `mutex` before
    /// returning.
    ///
    /// # Panics
    ///
    /// Panics unless the caller holds `mutex`.
    pub fn wait(&self, mutex: &Mutex) {
        assert!(
            mutex.held_by_me(),
            "{} waited on {} without holding {}",
            current().id_name(),
            self.name,
            mutex.name()
        );

        let held = self.guard.lock();
        mutex.release();
        drop(self.wchan.sleep(&self.guard, held));
        mutex.acquire();
    }

    /// As [`wait`](Condvar::wait), but does not take `mutex` back after
    /// waking.
    ///
    /// For hand-off protocols where the waker retires the mutex right after
    /// its broadcast: the woken thread must not touch `mutex` again, which
    /// leaves the waker in sole control of its lifetime.
    pub fn loose_wait(&self, mutex: &Mutex) {
        assert!(
            mutex.held_by_me(),
            "{} waited on {} without holding {}",
            current().id_name(),
            self.name,
            mutex.name()
        );

        let held = self.guard.lock();
        mutex.release();
        self.wchan.loose_sleep(held);
    }

    /// Wakes at most one sleeper.
    ///
    /// # Panics
    ///
    /// Panics unless the caller holds `mutex`.
    pub fn signal(&self, mutex: &Mutex) {
        assert!(
            mutex.held_by_me(),
            "{} signalled {} without holding {}",
            current().id_name(),
            self.name,
            mutex.name()
        );

        let held = self.guard.lock();
        self.wchan.wake_one(&held);
    }

    /// Wakes every sleeper.
    ///
    /// # Panics
    ///
    /// Panics unless the caller holds `mutex`.
    pub fn broadcast(&self, mutex: &Mutex) {
        assert!(
            mutex.held_by_me(),
            "{} broadcast on {} without holding {}",
            current().id_name(),
            self.name,
            mutex.name()
        );

        let held = self.guard.lock();
        self.wchan.wake_all(&held);
    }
}

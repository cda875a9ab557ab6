//! A blocking mutual-exclusion lock.

use kthread::{Spinlock, ThreadId, WaitChannel, current, hangman, in_interrupt};

/// A sleeping lock with a tracked owner.
///
/// Unlike a guard-based mutex this lock protects a critical *section*, not a
/// value: [`acquire`](Mutex::acquire) and [`release`](Mutex::release) are
/// explicit calls, the holder is recorded by thread identity, and misuse
/// (re-acquiring, releasing somebody else's lock) is fatal rather than
/// type-prevented. Acquisition order is not FIFO.
pub struct Mutex {
    name: String,
    holder: Spinlock<Option<ThreadId>>,
    wchan: WaitChannel,
    hangman: hangman::Lockable,
}

impl Mutex {
    /// Creates an unheld lock.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            holder: Spinlock::new(None),
            wchan: WaitChannel::new(name),
            hangman: hangman::Lockable::new(name),
        }
    }

    /// The lock's name.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Blocks until the lock is free, then takes it.
    ///
    /// # Panics
    ///
    /// Panics if the caller already holds the lock, or is in interrupt
    /// context; the latter is checked up front even when the acquire would
    /// complete without blocking.
    pub fn acquire(&self) {
        assert!(
            !self.held_by_me(),
            "{} tried to acquire lock {} it already holds",
            current().id_name(),
            self.name
        );
        assert!(
            !in_interrupt(),
            "{} acquired lock {} in interrupt context",
            current().id_name(),
            self.name
        );

        let me = current().id();
        let mut holder = self.holder.lock();
        hangman::wait(&self.hangman);
        while holder.is_some() {
            holder = self.wchan.sleep(&self.holder, holder);
        }
        *holder = Some(me);
        hangman::acquire(&self.hangman);
    }

    /// Releases the lock and wakes one sleeper.
    ///
    /// # Panics
    ///
    /// Panics unless the caller is the current holder.
    pub fn release(&self) {
        assert!(
            self.held_by_me(),
            "{} released lock {} it does not hold",
            current().id_name(),
            self.name
        );

        let mut holder = self.holder.lock();
        *holder = None;
        self.wchan.wake_one(&holder);
        hangman::release(&self.hangman);
    }

    /// Whether the calling thread holds the lock.
    ///
    /// Best-effort read: a thread can only observe its own identity, so the
    /// answer is stable for the caller without external synchronization.
    #[inline]
    pub fn held_by_me(&self) -> bool {
        *self.holder.lock() == Some(current().id())
    }

    /// Whether any thread holds the lock. Diagnostic read.
    #[inline]
    pub fn is_held(&self) -> bool {
        self.holder.lock().is_some()
    }
}

impl Drop for Mutex {
    fn drop(&mut self) {
        assert!(
            self.holder.get_mut().is_none(),
            "lock {} destroyed while held",
            self.name
        );
    }
}

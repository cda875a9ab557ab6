//! A counting semaphore implementation.

use kthread::{Spinlock, WaitChannel, current, in_interrupt};

/// A counting semaphore.
///
/// [`down`](Semaphore::down) blocks while the count is zero and then takes a
/// unit; [`up`](Semaphore::up) adds one and wakes a sleeper. No fairness is
/// promised: a thread calling `down` concurrently with a wake may take the
/// unit ahead of longer-waiting sleepers.
pub struct Semaphore {
    name: String,
    count: Spinlock<usize>,
    wchan: WaitChannel,
}

impl Semaphore {
    /// Creates a semaphore holding `initial` units.
    pub fn new(name: &str, initial: usize) -> Self {
        Self {
            name: name.to_owned(),
            count: Spinlock::new(initial),
            wchan: WaitChannel::new(name),
        }
    }

    /// The semaphore's name.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current unit count. Diagnostic read; stale as soon as it returns.
    #[inline]
    pub fn count(&self) -> usize {
        *self.count.lock()
    }

    /// The P operation: waits for a unit and takes it.
    ///
    /// # Panics
    ///
    /// Panics when called in interrupt context, checked up front even when
    /// the down would complete without blocking.
    pub fn down(&self) {
        assert!(
            !in_interrupt(),
            "{} called down on semaphore {} in interrupt context",
            current().id_name(),
            self.name
        );

        let mut count = self.count.lock();
        while *count == 0 {
            count = self.wchan.sleep(&self.count, count);
        }
        *count -= 1;
    }

    /// The V operation: adds a unit and wakes one sleeper.
    ///
    /// # Panics
    ///
    /// Panics if the count would overflow.
    pub fn up(&self) {
        let mut count = self.count.lock();
        assert!(
            *count < usize::MAX,
            "semaphore {} count overflow",
            self.name
        );
        *count += 1;
        self.wchan.wake_one(&count);
    }
}

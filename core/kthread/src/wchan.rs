//! Wait channels.

use std::sync::atomic::{AtomicUsize, Ordering};

use event_listener::{Event, IntoNotification, Listener};

use crate::{Spinlock, SpinlockGuard, current, in_interrupt};

/// A named channel that threads sleep on and are woken through.
///
/// Every channel is paired with a caller-owned [`Spinlock`] guarding the
/// state the sleep decision was made from. [`sleep`](WaitChannel::sleep)
/// registers the caller on the channel before giving the guard up, so a wake
/// issued by any thread that takes the spinlock afterwards cannot be lost.
/// Wakes may still be spurious; sleepers re-test their condition in a loop.
pub struct WaitChannel {
    name: String,
    event: Event,
    sleepers: AtomicUsize,
}

impl WaitChannel {
    /// Creates a channel, keeping its own copy of `name`.
    pub fn new(name: &str) -> Self {
        trace!("wait channel {name} created");
        Self {
            name: name.to_owned(),
            event: Event::new(),
            sleepers: AtomicUsize::new(0),
        }
    }

    /// The channel's name.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of threads currently sleeping here. Diagnostic read.
    #[inline]
    pub fn sleeper_count(&self) -> usize {
        self.sleepers.load(Ordering::Acquire)
    }

    /// Gives up `guard` and blocks until woken, then re-acquires `lock` and
    /// returns the fresh guard.
    ///
    /// # Panics
    ///
    /// Panics when called in interrupt context.
    pub fn sleep<'a, T>(
        &self,
        lock: &'a Spinlock<T>,
        guard: SpinlockGuard<'a, T>,
    ) -> SpinlockGuard<'a, T> {
        self.begin_sleep(guard).wait();
        self.sleepers.fetch_sub(1, Ordering::AcqRel);
        lock.lock()
    }

    /// As [`sleep`](WaitChannel::sleep), but does not take the spinlock back
    /// after waking. The woken thread must not touch the protected state
    /// again.
    pub fn loose_sleep<T>(&self, guard: SpinlockGuard<'_, T>) {
        self.begin_sleep(guard).wait();
        self.sleepers.fetch_sub(1, Ordering::AcqRel);
    }

    fn begin_sleep<T>(&self, guard: SpinlockGuard<'_, T>) -> event_listener::EventListener {
        assert!(
            !in_interrupt(),
            "{} slept on {} in interrupt context",
            current().id_name(),
            self.name
        );
        let listener = self.event.listen();
        self.sleepers.fetch_add(1, Ordering::AcqRel);
        drop(guard);
        listener
    }

    /// Wakes one sleeper, if any. The guard witnesses that the caller holds
    /// the channel's associated spinlock.
    pub fn wake_one<T>(&self, _guard: &SpinlockGuard<'_, T>) {
        self.event.notify(1.additional());
    }

    /// Wakes every sleeper. The guard witnesses that the caller holds the
    /// channel's associated spinlock.
    pub fn wake_all<T>(&self, _guard: &SpinlockGuard<'_, T>) {
        self.event.notify(usize::MAX);
    }
}

impl Drop for WaitChannel {
    fn drop(&mut self) {
        assert_eq!(
            self.sleepers.load(Ordering::Acquire),
            0,
            "wait channel {} destroyed with sleepers",
            self.name
        );
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::WaitChannel;
    use crate::{InterruptContext, Spinlock, spawn};

    #[test]
    fn sleep_until_woken() {
        let chan = Arc::new(WaitChannel::new("test chan"));
        let flag = Arc::new(Spinlock::new(false));

        let (c, f) = (chan.clone(), flag.clone());
        let sleeper = spawn("sleeper", move || {
            let mut ready = f.lock();
            while !*ready {
                ready = c.sleep(&f, ready);
            }
        });

        {
            let mut ready = flag.lock();
            *ready = true;
            chan.wake_one(&ready);
        }
        sleeper.join();
        assert_eq!(chan.sleeper_count(), 0);
    }

    #[test]
    fn wake_all_releases_every_sleeper() {
        let chan = Arc::new(WaitChannel::new("herd chan"));
        let open = Arc::new(Spinlock::new(false));

        let mut handles = vec![];
        for i in 0..4 {
            let (c, o) = (chan.clone(), open.clone());
            handles.push(spawn(&format!("sleeper {i}"), move || {
                let mut gate = o.lock();
                while !*gate {
                    gate = c.sleep(&o, gate);
                }
            }));
        }

        {
            let mut gate = open.lock();
            *gate = true;
            chan.wake_all(&gate);
        }
        for h in handles {
            h.join();
        }
    }

    #[test]
    #[should_panic(expected = "interrupt context")]
    fn sleep_in_interrupt_context_panics() {
        let chan = Box::leak(Box::new(WaitChannel::new("irq chan")));
        let lock = Box::leak(Box::new(Spinlock::new(())));
        let _irq = InterruptContext::enter();
        let guard = lock.lock();
        chan.sleep(lock, guard);
    }
}

// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 KylinSoft Co., Ltd. <https://www.kylinos.cn/>
// See LICENSES for license details.

//! Host substrate for the blocking synchronization crates.
//!
//! This crate hosts a kernel-shaped thread interface on `std` threads:
//!
//! - Thread identity: [`current`], [`ThreadId`], named [`spawn`].
//! - A simulated interrupt-context flag ([`in_interrupt`],
//!   [`InterruptContext`]) so blocking operations can enforce that they are
//!   never called from interrupt context.
//! - [`WaitChannel`]: the sleep/wake primitive everything above blocks on.
//!   A channel is paired with a caller-owned [`Spinlock`]; going to sleep
//!   consumes the spinlock guard after registering on the channel, so a wake
//!   issued by any thread that takes the spinlock afterwards is never lost.
//! - [`hangman`]: diagnostic deadlock-trace hooks.
//!
//! Spinlocks come from the `spin` crate and are re-exported as [`Spinlock`]
//! and [`SpinlockGuard`]; they are never held across a suspension point.

#[macro_use]
extern crate log;

pub mod hangman;
mod wchan;

pub use spin::{Mutex as Spinlock, MutexGuard as SpinlockGuard};
pub use wchan::WaitChannel;

use std::cell::Cell;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread;

/// Stable numeric identity of a thread. Id 0 is never assigned, so it can
/// stand for "no thread" in holder fields.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ThreadId(u64);

impl ThreadId {
    /// The raw id value.
    #[inline]
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

struct ThreadSlot {
    id: ThreadId,
    name: String,
    in_interrupt: Cell<bool>,
}

thread_local! {
    static TLS: ThreadSlot = {
        let id = ThreadId(NEXT_ID.fetch_add(1, Ordering::Relaxed));
        let name = thread::current()
            .name()
            .map(str::to_owned)
            .unwrap_or_else(|| format!("thread-{}", id.0));
        ThreadSlot {
            id,
            name,
            in_interrupt: Cell::new(false),
        }
    };
}

/// A snapshot of the calling thread's identity.
pub struct CurrentThread {
    id: ThreadId,
    name: String,
}

impl CurrentThread {
    /// This thread's id.
    #[inline]
    pub fn id(&self) -> ThreadId {
        self.id
    }

    /// This thread's name.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Display form used in diagnostics: `name(#id)`.
    pub fn id_name(&self) -> String {
        format!("{}(#{})", self.name, self.id.0)
    }

    /// Whether this thread is currently in interrupt context. Reads the live
    /// flag, not the snapshot.
    #[inline]
    pub fn in_interrupt(&self) -> bool {
        in_interrupt()
    }
}

/// Identity of the calling thread. Threads not created through [`spawn`]
/// (the test main thread, for one) are registered lazily on first use.
pub fn current() -> CurrentThread {
    TLS.with(|t| CurrentThread {
        id: t.id,
        name: t.name.clone(),
    })
}

/// Whether the calling thread is in interrupt context.
#[inline]
pub fn in_interrupt() -> bool {
    TLS.with(|t| t.in_interrupt.get())
}

/// RAII marker putting the calling thread into (simulated) interrupt
/// context; the previous state is restored on drop.
pub struct InterruptContext {
    prev: bool,
    // tied to the thread whose flag it saved
    _not_send: PhantomData<*mut ()>,
}

impl InterruptContext {
    /// Enters interrupt context.
    pub fn enter() -> Self {
        let prev = TLS.with(|t| t.in_interrupt.replace(true));
        Self {
            prev,
            _not_send: PhantomData,
        }
    }
}

impl Drop for InterruptContext {
    fn drop(&mut self) {
        let prev = self.prev;
        TLS.with(|t| t.in_interrupt.set(prev));
    }
}

/// Handle to a thread created with [`spawn`].
pub struct JoinHandle<T> {
    inner: thread::JoinHandle<T>,
}

impl<T> JoinHandle<T> {
    /// Waits for the thread to finish and returns its value, re-raising the
    /// thread's panic if it had one.
    pub fn join(self) -> T {
        match self.inner.join() {
            Ok(value) => value,
            Err(payload) => std::panic::resume_unwind(payload),
        }
    }
}

/// Creates a named thread running `f`.
pub fn spawn<F, T>(name: &str, f: F) -> JoinHandle<T>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    let inner = thread::Builder::new()
        .name(name.to_owned())
        .spawn(f)
        .expect("thread spawn failed");
    JoinHandle { inner }
}

/// Gives up the rest of this thread's time slice.
#[inline]
pub fn yield_now() {
    thread::yield_now();
}

// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 KylinSoft Co., Ltd. <https://www.kylinos.cn/>
// See LICENSES for license details.

//! Blocking synchronization primitives.
//!
//! This crate provides the classical sleeping primitives, built on the wait
//! channels and spinlocks of [`kthread`]:
//!
//! - [`Semaphore`]: counting semaphore with blocking `down` / waking `up`
//! - [`Mutex`]: single-owner lock with holder tracking
//! - [`Condvar`]: Mesa-style condition variable keyed by an external mutex
//! - [`RwLock`]: fair reader-writer lock with a FIFO request queue
//!
//! Every primitive carries an owned name used in its diagnostics. Misuse
//! (re-acquiring a held lock, releasing somebody else's, blocking from
//! interrupt context, tearing an object down while threads sleep on it) is
//! a programmer error and panics with a message naming the object and the
//! calling thread.
//!
//! # Examples
//!
//! ```no_run
//! use ksynch::{Mutex, Semaphore};
//!
//! let pool = Semaphore::new("pool", 3);
//! pool.down();
//! // ... use one of the three units ...
//! pool.up();
//!
//! let lock = Mutex::new("state lock");
//! lock.acquire();
//! // ... critical section ...
//! lock.release();
//! ```

mod condvar;
mod mutex;
mod rwlock;
mod semaphore;

pub use self::{condvar::Condvar, mutex::Mutex, rwlock::RwLock, semaphore::Semaphore};

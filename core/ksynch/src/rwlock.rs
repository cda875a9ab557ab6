//! A fair reader-writer lock with a FIFO request queue.

use std::cell::UnsafeCell;
use std::collections::VecDeque;
use std::sync::Arc;

use kthread::{ThreadId, current};

use crate::{Condvar, Mutex};

/// Phase the lock is in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum RwMode {
    Free,
    Read,
    Write,
}

/// One queued request: a batch of readers that will run together, or a
/// single writer.
enum PendingKind {
    Readers(Vec<ThreadId>),
    Writer(ThreadId),
}

/// A queue entry. Its sleepers all block through `cv` under `lock`; both are
/// shared with the sleepers so the entry can be retired by whoever promotes
/// it while the last sleeper is still on its way out.
struct Pending {
    kind: PendingKind,
    cv: Arc<Condvar>,
    lock: Arc<Mutex>,
}

struct RwState {
    mode: RwMode,
    /// Active writer plus queued writer entries.
    writers_known: usize,
    active_readers: Vec<ThreadId>,
    active_writer: Option<ThreadId>,
    queue: VecDeque<Pending>,
    naming_counter: u64,
}

/// A reader-writer lock serving mixed readers and writers without starving
/// either class.
///
/// Pending requests form a single FIFO of reader batches and single-writer
/// entries. A newcomer either joins the active phase (readers only, and
/// only while no writer is active or queued) or goes to the back of the
/// queue, where consecutive readers coalesce into one batch. Every release
/// advances the queue by at most one entry, so a stream of readers cannot
/// starve a writer, and reader batches still run concurrently.
pub struct RwLock {
    name: String,
    guard: Mutex,
    state: UnsafeCell<RwState>,
}

// The state cell is only ever touched while `guard` is held.
unsafe impl Send for RwLock {}
unsafe impl Sync for RwLock {}

impl RwLock {
    /// Creates a free lock.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            guard: Mutex::new(&format!("{name} guard")),
            state: UnsafeCell::new(RwState {
                mode: RwMode::Free,
                writers_known: 0,
                active_readers: Vec::new(),
                active_writer: None,
                queue: VecDeque::new(),
                naming_counter: 0,
            }),
        }
    }

    /// The lock's name.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Exclusive view of the state. Caller must hold `self.guard` and must
    /// not use the borrow after letting it go.
    #[allow(clippy::mut_from_ref)]
    fn state(&self) -> &mut RwState {
        debug_assert!(self.guard.held_by_me());
        unsafe { &mut *self.state.get() }
    }

    /// Takes the lock for reading. Blocks while a writer is active or
    /// queued ahead; readers arriving behind a writer run together once it
    /// is their turn.
    ///
    /// # Panics
    ///
    /// Panics if the caller is already an active reader.
    pub fn acquire_read(&self) {
        let me = current().id();
        self.guard.acquire();
        let st = self.state();

        assert!(
            !st.active_readers.contains(&me),
            "{} tried to re-acquire rwlock {} for reading",
            current().id_name(),
            self.name
        );

        if st.writers_known == 0 {
            // No writer anywhere: join (or open) the active read phase.
            match st.mode {
                RwMode::Free => {
                    debug_assert!(st.active_readers.is_empty());
                    debug_assert!(st.active_writer.is_none());
                    st.mode = RwMode::Read;
                    st.active_readers.push(me);
                }
                RwMode::Read => {
                    debug_assert!(st.queue.is_empty());
                    st.active_readers.push(me);
                }
                RwMode::Write => unreachable!(
                    "rwlock {} in write phase with no writers known",
                    self.name
                ),
            }
            self.guard.release();
            return;
        }

        // A writer is active or queued, so this reader goes behind it: into
        // the trailing reader batch when there is one, else a fresh batch.
        if let Some(Pending {
            kind: PendingKind::Readers(batch),
            cv,
            lock,
        }) = st.queue.back_mut()
        {
            let cv = Arc::clone(cv);
            let lock = Arc::clone(lock);
            lock.acquire();
            batch.push(me);
            self.guard.release();
            cv.loose_wait(&lock);
            // woken as part of the promoted batch; already an active reader
            return;
        }

        self.enqueue_and_wait(st, PendingKind::Readers(vec![me]));
    }

    /// Takes the lock for writing. Blocks until every earlier request has
    /// drained.
    ///
    /// # Panics
    ///
    /// Panics if the caller is already the active writer.
    pub fn acquire_write(&self) {
        let me = current().id();
        self.guard.acquire();
        let st = self.state();

        assert!(
            st.active_writer != Some(me),
            "{} tried to re-acquire rwlock {} for writing",
            current().id_name(),
            self.name
        );

        if st.mode == RwMode::Free {
            debug_assert!(st.active_readers.is_empty());
            debug_assert!(st.active_writer.is_none());
            st.mode = RwMode::Write;
            st.active_writer = Some(me);
            st.writers_known += 1;
            self.guard.release();
            return;
        }

        self.enqueue_and_wait(st, PendingKind::Writer(me));
    }

    /// Gives up a read hold; the last reader out promotes the queue head.
    ///
    /// # Panics
    ///
    /// Panics unless the caller is an active reader.
    pub fn release_read(&self) {
        let me = current().id();
        self.guard.acquire();
        let st = self.state();

        assert!(
            st.mode == RwMode::Read,
            "{} released rwlock {} for reading while not in read phase",
            current().id_name(),
            self.name
        );
        let pos = st
            .active_readers
            .iter()
            .position(|&t| t == me)
            .unwrap_or_else(|| {
                panic!(
                    "{} released rwlock {} without holding it for reading",
                    current().id_name(),
                    self.name
                )
            });
        st.active_readers.swap_remove(pos);

        if !st.active_readers.is_empty() {
            self.guard.release();
            return;
        }

        match st.queue.pop_front() {
            None => {
                debug_assert_eq!(st.writers_known, 0);
                st.mode = RwMode::Free;
                self.guard.release();
            }
            Some(pending) => self.promote(st, pending),
        }
    }

    /// Gives up the write hold and promotes the queue head.
    ///
    /// # Panics
    ///
    /// Panics unless the caller is the active writer.
    pub fn release_write(&self) {
        let me = current().id();
        self.guard.acquire();
        let st = self.state();

        assert!(
            st.active_writer == Some(me),
            "{} released rwlock {} without holding it for writing",
            current().id_name(),
            self.name
        );
        debug_assert_eq!(st.mode, RwMode::Write);

        st.writers_known -= 1;
        st.active_writer = None;

        match st.queue.pop_front() {
            None => {
                debug_assert_eq!(st.writers_known, 0);
                st.mode = RwMode::Free;
                self.guard.release();
            }
            Some(pending) => self.promote(st, pending),
        }
    }

    /// Appends a fresh entry for the calling thread, releases the guard and
    /// sleeps until the entry is promoted. Called with the guard held;
    /// returns with it released.
    fn enqueue_and_wait(&self, st: &mut RwState, kind: PendingKind) {
        st.naming_counter += 1;
        let cv = Arc::new(Condvar::new(&format!(
            "{} request cv {}",
            self.name, st.naming_counter
        )));
        let lock = Arc::new(Mutex::new(&format!(
            "{} request lock {}",
            self.name, st.naming_counter
        )));

        lock.acquire();
        if let PendingKind::Writer(_) = kind {
            st.writers_known += 1;
        }
        st.queue.push_back(Pending {
            kind,
            cv: Arc::clone(&cv),
            lock: Arc::clone(&lock),
        });

        self.guard.release();
        cv.loose_wait(&lock);
    }

    /// Moves a popped queue head into the active phase and wakes its
    /// sleepers. Called with the guard held; returns with it released.
    fn promote(&self, st: &mut RwState, pending: Pending) {
        let Pending { kind, cv, lock } = pending;
        match kind {
            PendingKind::Readers(batch) => {
                st.mode = RwMode::Read;
                st.active_readers = batch;
            }
            PendingKind::Writer(thread) => {
                st.mode = RwMode::Write;
                st.active_writer = Some(thread);
            }
        }

        // Wake the whole entry, then retire its condvar and mutex by
        // dropping our handles: the sleepers went down with `loose_wait`
        // and will not touch the mutex again, and their own handles keep
        // the pair alive until the last of them has left the channel.
        lock.acquire();
        cv.broadcast(&lock);
        lock.release();

        self.guard.release();
    }
}

impl Drop for RwLock {
    fn drop(&mut self) {
        let st = self.state.get_mut();
        assert!(
            st.mode == RwMode::Free && st.writers_known == 0 && st.queue.is_empty(),
            "rwlock {} destroyed while in use",
            self.name
        );
    }
}

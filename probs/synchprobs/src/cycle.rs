//! Round-robin admission across four peer directions.

use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};

use ksynch::{Condvar, Mutex};

/// Number of peer directions in the cycle.
pub const NUM_DIRECTIONS: usize = 4;

struct Node {
    /// Cars registered in this direction. Read by peers under *their* node
    /// mutex, hence atomic.
    cars: AtomicU32,
    cv: Condvar,
    lock: Mutex,
}

/// A round-robin admission token over four peer queues.
///
/// One direction at a time owns the token. Threads of the other directions
/// register on their own node and sleep until the token reaches them; the
/// token only ever advances past directions with nobody registered, so a
/// direction with waiters is never skipped and every occupied direction is
/// eventually served.
pub struct DirectionCycle {
    nodes: [Node; NUM_DIRECTIONS],
    /// Index of the direction holding the token. Advanced under whichever
    /// node mutex the accessor holds, so it has to be atomic; the CAS in
    /// [`advance_past_empty`](Self::advance_past_empty) keeps concurrent
    /// advances from skipping an occupied node.
    current: AtomicUsize,
}

impl DirectionCycle {
    /// Creates a cycle with the token at direction 0.
    pub fn new(name: &str) -> Self {
        Self {
            nodes: std::array::from_fn(|i| Node {
                cars: AtomicU32::new(0),
                cv: Condvar::new(&format!("{name} cv {i}")),
                lock: Mutex::new(&format!("{name} lock {i}")),
            }),
            current: AtomicUsize::new(0),
        }
    }

    fn node(&self, direction: u32) -> &Node {
        assert!(
            (direction as usize) < NUM_DIRECTIONS,
            "direction {direction} out of range"
        );
        &self.nodes[direction as usize]
    }

    /// Moves the token forward past directions with no registered cars.
    /// Only called while the caller's own direction is registered, so the
    /// walk always terminates. Emptiness is monotonic for the purpose of
    /// this walk: sleepers re-test after every wake, so an advance that
    /// lands wrong for a moment is corrected by the waiter loop.
    fn advance_past_empty(&self) {
        loop {
            let cur = self.current.load(Ordering::Acquire);
            if self.nodes[cur].cars.load(Ordering::Acquire) != 0 {
                return;
            }
            let next = (cur + 1) % NUM_DIRECTIONS;
            let _ = self
                .current
                .compare_exchange(cur, next, Ordering::AcqRel, Ordering::Acquire);
        }
    }

    /// Registers one car for `direction` and waits for the token to reach
    /// it. The caller must later hand the token on with
    /// [`signal`](Self::signal).
    pub fn wait(&self, direction: u32) {
        let me = self.node(direction);
        me.lock.acquire();
        me.cars.fetch_add(1, Ordering::AcqRel);
        self.advance_past_empty();
        while self.current.load(Ordering::Acquire) != direction as usize {
            me.cv.wait(&me.lock);
            self.advance_past_empty();
        }
        me.lock.release();
    }

    /// Deregisters one car and wakes the next direction with cars waiting,
    /// coming full circle back to this one if no other has any. Returns the
    /// direction that was woken.
    ///
    /// The two node mutexes involved are never held at the same time.
    pub fn signal(&self, direction: u32) -> u32 {
        let me = self.node(direction);
        me.lock.acquire();
        me.cars.fetch_sub(1, Ordering::AcqRel);
        let mut next = (direction as usize + 1) % NUM_DIRECTIONS;
        while next != direction as usize && self.nodes[next].cars.load(Ordering::Acquire) == 0 {
            next = (next + 1) % NUM_DIRECTIONS;
        }
        me.lock.release();

        let peer = &self.nodes[next];
        peer.lock.acquire();
        peer.cv.broadcast(&peer.lock);
        peer.lock.release();

        next as u32
    }
}

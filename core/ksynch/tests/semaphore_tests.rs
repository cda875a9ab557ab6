use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use ksynch::Semaphore;
use kthread::{InterruptContext, spawn, yield_now};

#[test]
fn semaphore_counts_units() {
    let sem = Semaphore::new("counting", 2);
    assert_eq!(sem.count(), 2);

    sem.down();
    sem.down();
    assert_eq!(sem.count(), 0);

    sem.up();
    sem.up();
    assert_eq!(sem.count(), 2);
    assert_eq!(sem.name(), "counting");
}

#[test]
fn semaphore_pairs_downs_with_ups() {
    const CONSUMERS: u32 = 100;

    let sem = Arc::new(Semaphore::new("pairing", 0));
    let served = Arc::new(AtomicU32::new(0));

    let mut handles = vec![];
    for i in 0..CONSUMERS {
        let sem = sem.clone();
        let served = served.clone();
        handles.push(spawn(&format!("consumer {i}"), move || {
            sem.down();
            served.fetch_add(1, Ordering::SeqCst);
        }));
    }

    for _ in 0..CONSUMERS {
        sem.up();
        if fastrand::u8(0..4) == 0 {
            yield_now();
        }
    }

    for h in handles {
        h.join();
    }
    assert_eq!(served.load(Ordering::SeqCst), CONSUMERS);
    assert_eq!(sem.count(), 0);
}

#[test]
fn semaphore_starting_empty_blocks_until_released() {
    const WAITERS: u32 = 4;

    let sem = Arc::new(Semaphore::new("gate", 0));
    let passed = Arc::new(AtomicU32::new(0));

    let mut handles = vec![];
    for i in 0..WAITERS {
        let sem = sem.clone();
        let passed = passed.clone();
        handles.push(spawn(&format!("waiter {i}"), move || {
            sem.down();
            passed.fetch_add(1, Ordering::SeqCst);
        }));
    }

    for _ in 0..WAITERS {
        sem.up();
    }
    for h in handles {
        h.join();
    }
    assert_eq!(passed.load(Ordering::SeqCst), WAITERS);
}

#[test]
#[should_panic(expected = "interrupt context")]
fn down_in_interrupt_context_panics() {
    let sem = Box::leak(Box::new(Semaphore::new("irq sem", 1)));
    let _irq = InterruptContext::enter();
    sem.down();
}

#[test]
#[should_panic(expected = "count overflow")]
fn up_past_the_counter_range_panics() {
    let sem = Box::leak(Box::new(Semaphore::new("saturated", usize::MAX)));
    sem.up();
}

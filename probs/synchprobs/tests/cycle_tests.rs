use std::sync::{Arc, Mutex};
use std::time::Duration;

use kthread::spawn;
use synchprobs::DirectionCycle;

#[test]
fn lone_direction_passes_immediately() {
    let cycle = DirectionCycle::new("solo");
    cycle.wait(0);
    // full circle back to itself
    assert_eq!(cycle.signal(0), 0);
}

#[test]
fn token_reaches_every_direction() {
    let cycle = Arc::new(DirectionCycle::new("all"));

    let mut handles = vec![];
    for d in 0..4u32 {
        let c = cycle.clone();
        handles.push(spawn(&format!("dir {d}"), move || {
            c.wait(d);
            c.signal(d);
        }));
    }
    for h in handles {
        h.join();
    }
}

#[test]
fn later_direction_waits_for_the_token() {
    let cycle = Arc::new(DirectionCycle::new("ordered"));
    let order = Arc::new(Mutex::new(Vec::new()));

    // main takes the token for direction 0
    cycle.wait(0);

    let (c, o) = (cycle.clone(), order.clone());
    let waiter = spawn("dir 2", move || {
        c.wait(2);
        o.lock().unwrap().push("two acquired");
        c.signal(2);
    });

    // direction 2 cannot pass while direction 0 still has a car registered
    order.lock().unwrap().push("zero signalling");
    cycle.signal(0);
    waiter.join();

    assert_eq!(*order.lock().unwrap(), ["zero signalling", "two acquired"]);
}

#[test]
fn token_advances_in_cycle_order() {
    let cycle = Arc::new(DirectionCycle::new("round"));
    let order = Arc::new(Mutex::new(Vec::new()));

    // hold direction 0 so the others all queue behind the token
    cycle.wait(0);

    let mut handles = vec![];
    for d in [3u32, 1, 2] {
        let (c, o) = (cycle.clone(), order.clone());
        handles.push(spawn(&format!("dir {d}"), move || {
            c.wait(d);
            o.lock().unwrap().push(d);
            c.signal(d);
        }));
    }

    // let all three register, then hand the token on
    std::thread::sleep(Duration::from_millis(200));
    cycle.signal(0);

    for h in handles {
        h.join();
    }
    assert_eq!(*order.lock().unwrap(), [1, 2, 3]);
}

#[test]
#[should_panic(expected = "out of range")]
fn bogus_direction_panics() {
    let cycle = Box::leak(Box::new(DirectionCycle::new("bogus")));
    cycle.wait(7);
}

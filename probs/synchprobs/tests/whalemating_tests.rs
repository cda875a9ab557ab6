use std::sync::{Arc, Mutex};

use kthread::spawn;
use ktestlib::{Outcome, Reporter};
use synchprobs::{Whalemating, WhalematingDriver};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Event {
    MaleStart,
    MaleEnd,
    FemaleStart,
    FemaleEnd,
    MatchStart,
    MatchEnd,
}

struct RecordingDriver {
    events: Mutex<Vec<Event>>,
}

impl RecordingDriver {
    fn new() -> Self {
        Self {
            events: Mutex::new(Vec::new()),
        }
    }

    fn push(&self, event: Event) {
        self.events.lock().unwrap().push(event);
    }
}

impl WhalematingDriver for RecordingDriver {
    fn male_start(&self, _index: u32) {
        self.push(Event::MaleStart);
    }

    fn male_end(&self, _index: u32) {
        self.push(Event::MaleEnd);
    }

    fn female_start(&self, _index: u32) {
        self.push(Event::FemaleStart);
    }

    fn female_end(&self, _index: u32) {
        self.push(Event::FemaleEnd);
    }

    fn matchmaker_start(&self, _index: u32) {
        self.push(Event::MatchStart);
    }

    fn matchmaker_end(&self, _index: u32) {
        self.push(Event::MatchEnd);
    }
}

#[test]
fn one_triple_completes() {
    let pod = Arc::new(Whalemating::new());
    let driver = Arc::new(RecordingDriver::new());

    let mut handles = vec![];
    let (p, d) = (pod.clone(), driver.clone());
    handles.push(spawn("male", move || p.male(0, &*d)));
    let (p, d) = (pod.clone(), driver.clone());
    handles.push(spawn("female", move || p.female(0, &*d)));
    let (p, d) = (pod.clone(), driver.clone());
    handles.push(spawn("matchmaker", move || p.matchmaker(0, &*d)));

    for h in handles {
        h.join();
    }
    assert_eq!(driver.events.lock().unwrap().len(), 6);
}

#[test]
fn rendezvous_binds_triples() {
    const PODS: u32 = 10;

    let pod = Arc::new(Whalemating::new());
    let driver = Arc::new(RecordingDriver::new());

    let mut handles = vec![];
    for i in 0..PODS {
        let (p, d) = (pod.clone(), driver.clone());
        handles.push(spawn(&format!("male {i}"), move || p.male(i, &*d)));
        let (p, d) = (pod.clone(), driver.clone());
        handles.push(spawn(&format!("female {i}"), move || p.female(i, &*d)));
        let (p, d) = (pod.clone(), driver.clone());
        handles.push(spawn(&format!("matchmaker {i}"), move || {
            p.matchmaker(i, &*d)
        }));
    }
    for h in handles {
        h.join();
    }

    let events = driver.events.lock().unwrap();
    let count = |e: Event| events.iter().filter(|&&x| x == e).count() as u32;
    for e in [
        Event::MaleStart,
        Event::MaleEnd,
        Event::FemaleStart,
        Event::FemaleEnd,
        Event::MatchStart,
        Event::MatchEnd,
    ] {
        assert_eq!(count(e), PODS, "wrong number of {e:?} events");
    }

    // Prefix invariants: a matchmaker only starts after whales of both
    // kinds announced themselves, and no whale finishes before its
    // matchmaker has finished the match.
    let (mut ms, mut fs, mut mms, mut mme, mut me, mut fe) = (0u32, 0u32, 0u32, 0u32, 0u32, 0u32);
    for event in events.iter() {
        match event {
            Event::MaleStart => ms += 1,
            Event::FemaleStart => fs += 1,
            Event::MatchStart => {
                mms += 1;
                assert!(mms <= ms, "matchmaker started before enough males");
                assert!(mms <= fs, "matchmaker started before enough females");
            }
            Event::MatchEnd => mme += 1,
            Event::MaleEnd => {
                me += 1;
                assert!(me <= mme, "a male finished before his matchmaker did");
            }
            Event::FemaleEnd => {
                fe += 1;
                assert!(fe <= mme, "a female finished before her matchmaker did");
            }
        }
    }

    Reporter::new().success(Outcome::Success, "whalemating");
}

//! The three-role rendezvous.
//!
//! A male, a female and a matchmaker bind into one triple: each whale
//! announces itself, a matchmaker collects one announcement of each kind,
//! runs the match while both parties are known ready, and only then lets
//! each party finish. Six zero-initialized semaphores carry the protocol;
//! every `up` pairs with exactly one `down`, so triples cannot share
//! members and all three roles leave together.

use ksynch::Semaphore;

/// Driver hooks marking role progress.
pub trait WhalematingDriver {
    fn male_start(&self, index: u32);
    fn male_end(&self, index: u32);
    fn female_start(&self, index: u32);
    fn female_end(&self, index: u32);
    fn matchmaker_start(&self, index: u32);
    fn matchmaker_end(&self, index: u32);
}

/// Shared state of the rendezvous.
pub struct Whalemating {
    male_ready: Semaphore,
    female_ready: Semaphore,
    gate_male: Semaphore,
    gate_female: Semaphore,
    male_done: Semaphore,
    female_done: Semaphore,
}

impl Whalemating {
    /// Creates the rendezvous state.
    pub fn new() -> Self {
        Self {
            male_ready: Semaphore::new("male ready", 0),
            female_ready: Semaphore::new("female ready", 0),
            gate_male: Semaphore::new("matchmaker gate male", 0),
            gate_female: Semaphore::new("matchmaker gate female", 0),
            male_done: Semaphore::new("male done", 0),
            female_done: Semaphore::new("female done", 0),
        }
    }

    /// Runs one male whale to completion.
    pub fn male(&self, index: u32, driver: &impl WhalematingDriver) {
        driver.male_start(index);
        self.male_ready.up();
        self.gate_male.up();
        self.male_done.down();
        driver.male_end(index);
    }

    /// Runs one female whale to completion.
    pub fn female(&self, index: u32, driver: &impl WhalematingDriver) {
        driver.female_start(index);
        self.female_ready.up();
        self.gate_female.up();
        self.female_done.down();
        driver.female_end(index);
    }

    /// Runs one matchmaker: claims one whale of each kind, then releases
    /// both once the match is made.
    pub fn matchmaker(&self, index: u32, driver: &impl WhalematingDriver) {
        self.gate_male.down();
        self.gate_female.down();
        driver.matchmaker_start(index);
        self.male_ready.down();
        self.female_ready.down();
        driver.matchmaker_end(index);
        self.male_done.up();
        self.female_done.up();
    }
}

impl Default for Whalemating {
    fn default() -> Self {
        Self::new()
    }
}

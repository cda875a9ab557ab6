//! The four-quadrant intersection.
//!
//! Quadrants are laid out clockwise and a car entering from direction `d`
//! enters quadrant `d` first:
//!
//! - right turn: quadrant `d` only
//! - straight: quadrants `d`, `d-1`
//! - left turn: quadrants `d`, `d-1`, `d-2`   (all mod 4)
//!
//! Admission is two-staged. The [`DirectionCycle`] serializes by approach
//! direction so no direction starves, and a capacity semaphore keeps at most
//! three cars inside: four cars, one per direction, could rotate into a
//! cycle of quadrant waits, so three is the deadlock-avoidance bound.
//! Inside, a car claims quadrants hand over hand (the next quadrant is
//! entered before the previous one is let go) and the exit callback runs
//! while the final quadrant is still held.

use ksynch::Semaphore;

use crate::cycle::{DirectionCycle, NUM_DIRECTIONS};

/// Most cars allowed inside the intersection at once.
const CAPACITY: usize = 3;

/// Driver hooks recording a car's progress. `in_quadrant` is called once
/// the car occupies the named quadrant (implicitly leaving its previous
/// one); `leave_intersection` while it still occupies its final quadrant.
pub trait StoplightDriver {
    fn in_quadrant(&self, quadrant: u32, car: u32);
    fn leave_intersection(&self, car: u32);
}

/// The intersection controller.
pub struct Stoplight {
    quadrants: [Semaphore; NUM_DIRECTIONS],
    capacity: Semaphore,
    cycle: DirectionCycle,
}

impl Stoplight {
    /// Creates an empty intersection.
    pub fn new() -> Self {
        Self {
            quadrants: std::array::from_fn(|i| Semaphore::new(&format!("quadrant {i}"), 1)),
            capacity: Semaphore::new("intersection capacity", CAPACITY),
            cycle: DirectionCycle::new("approach"),
        }
    }

    fn quadrant(&self, q: u32) -> &Semaphore {
        assert!((q as usize) < NUM_DIRECTIONS, "quadrant {q} out of range");
        &self.quadrants[q as usize]
    }

    /// Drives `car` through a right turn from `direction`: one quadrant.
    pub fn turn_right(&self, direction: u32, car: u32, driver: &impl StoplightDriver) {
        self.cycle.wait(direction);
        self.capacity.down();

        self.quadrant(direction).down();
        driver.in_quadrant(direction, car);
        driver.leave_intersection(car);
        self.quadrant(direction).up();

        self.cycle.signal(direction);
        self.capacity.up();
    }

    /// Drives `car` straight through from `direction`: two quadrants, hand
    /// over hand.
    pub fn go_straight(&self, direction: u32, car: u32, driver: &impl StoplightDriver) {
        let second = prev(direction);

        self.cycle.wait(direction);
        self.capacity.down();

        self.quadrant(direction).down();
        driver.in_quadrant(direction, car);
        self.quadrant(second).down();
        driver.in_quadrant(second, car);
        self.quadrant(direction).up();
        driver.leave_intersection(car);
        self.quadrant(second).up();

        self.cycle.signal(direction);
        self.capacity.up();
    }

    /// Drives `car` through a left turn from `direction`: three quadrants,
    /// hand over hand.
    pub fn turn_left(&self, direction: u32, car: u32, driver: &impl StoplightDriver) {
        let second = prev(direction);
        let third = prev(second);

        self.cycle.wait(direction);
        self.capacity.down();

        self.quadrant(direction).down();
        driver.in_quadrant(direction, car);
        self.quadrant(second).down();
        driver.in_quadrant(second, car);
        self.quadrant(direction).up();
        self.quadrant(third).down();
        driver.in_quadrant(third, car);
        self.quadrant(second).up();
        driver.leave_intersection(car);
        self.quadrant(third).up();

        self.cycle.signal(direction);
        self.capacity.up();
    }
}

impl Default for Stoplight {
    fn default() -> Self {
        Self::new()
    }
}

/// The quadrant counterclockwise of `q`.
fn prev(q: u32) -> u32 {
    (q + NUM_DIRECTIONS as u32 - 1) % NUM_DIRECTIONS as u32
}

#[cfg(test)]
mod tests {
    use super::prev;

    #[test]
    fn quadrant_routes_wrap() {
        assert_eq!(prev(0), 3);
        assert_eq!(prev(1), 0);
        assert_eq!(prev(2), 1);
        assert_eq!(prev(3), 2);
    }
}

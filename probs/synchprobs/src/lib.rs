// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 KylinSoft Co., Ltd. <https://www.kylinos.cn/>
// See LICENSES for license details.

//! Coordination puzzles built on the `ksynch` primitives.
//!
//! - [`Whalemating`]: a three-role rendezvous binding one male, one female
//!   and one matchmaker into a triple.
//! - [`Stoplight`]: a four-quadrant intersection admitting cars without
//!   collisions, deadlock, or starvation of any approach direction.
//! - [`DirectionCycle`]: the round-robin admission token [`Stoplight`] is
//!   built on, usable on its own.
//!
//! The puzzle types compose semaphores, mutexes and condition variables
//! only; they hold no raw spinlocks of their own.

mod cycle;
mod stoplight;
mod whalemating;

pub use self::{
    cycle::{DirectionCycle, NUM_DIRECTIONS},
    stoplight::{Stoplight, StoplightDriver},
    whalemating::{Whalemating, WhalematingDriver},
};

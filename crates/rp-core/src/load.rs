//! Occupancy counters.
//!
//! A [`Load`] is what a ride puts into a vehicle: its passengers, how many of
//! them need an accessible (ADA) seat, and the ride itself.  ADA seats are a
//! sub-count of passengers, so an ADA rider counts once in `passengers` and
//! once in `ada`.  A [`Capacity`] bounds each counter independently.

use std::ops::{Add, AddAssign};

/// Occupancy contributed by one or more rides.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Load {
    pub passengers: u32,
    pub ada:        u32,
    pub rides:      u32,
}

impl Load {
    pub const ZERO: Load = Load { passengers: 0, ada: 0, rides: 0 };

    /// Load of a single ride with `passengers` occupants.
    pub fn ride(passengers: u32, ada: bool) -> Load {
        Load { passengers, ada: u32::from(ada), rides: 1 }
    }

    pub fn is_empty(self) -> bool {
        self == Load::ZERO
    }

    /// `true` if every counter is within `cap`.
    #[inline]
    pub fn fits(self, cap: Capacity) -> bool {
        self.passengers <= cap.passengers && self.ada <= cap.ada && self.rides <= cap.rides
    }

    /// Component-wise subtraction, `None` if any counter would go negative.
    pub fn checked_sub(self, rhs: Load) -> Option<Load> {
        Some(Load {
            passengers: self.passengers.checked_sub(rhs.passengers)?,
            ada:        self.ada.checked_sub(rhs.ada)?,
            rides:      self.rides.checked_sub(rhs.rides)?,
        })
    }

    pub fn saturating_sub(self, rhs: Load) -> Load {
        Load {
            passengers: self.passengers.saturating_sub(rhs.passengers),
            ada:        self.ada.saturating_sub(rhs.ada),
            rides:      self.rides.saturating_sub(rhs.rides),
        }
    }
}

impl Add for Load {
    type Output = Load;
    fn add(self, rhs: Load) -> Load {
        Load {
            passengers: self.passengers + rhs.passengers,
            ada:        self.ada + rhs.ada,
            rides:      self.rides + rhs.rides,
        }
    }
}

impl AddAssign for Load {
    fn add_assign(&mut self, rhs: Load) {
        *self = *self + rhs;
    }
}

/// Upper bound on each [`Load`] counter.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Capacity {
    pub passengers: u32,
    pub ada:        u32,
    pub rides:      u32,
}

impl Capacity {
    pub fn new(passengers: u32, ada: u32, rides: u32) -> Self {
        Self { passengers, ada, rides }
    }

    /// Component-wise minimum.
    pub fn min(self, other: Capacity) -> Capacity {
        Capacity {
            passengers: self.passengers.min(other.passengers),
            ada:        self.ada.min(other.ada),
            rides:      self.rides.min(other.rides),
        }
    }

    /// Capacity left after `load` is permanently aboard (e.g. a hailed
    /// ride).  Saturates at zero.
    pub fn reduced_by(self, load: Load) -> Capacity {
        Capacity {
            passengers: self.passengers.saturating_sub(load.passengers),
            ada:        self.ada.saturating_sub(load.ada),
            rides:      self.rides.saturating_sub(load.rides),
        }
    }
}

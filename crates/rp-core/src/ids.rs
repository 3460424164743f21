//! Strongly typed identifier wrappers.
//!
//! All ids are `Copy + Ord + Hash` so they can key maps and sort candidate
//! lists without ceremony.  Ordering by id is also the final tie-break the
//! dispatcher uses when two drivers offer the same plan cost.

use std::fmt;

/// Generate a typed id wrapper around a primitive integer.
macro_rules! typed_id {
    ($(#[$attr:meta])* $vis:vis struct $name:ident($inner:ty);) => {
        $(#[$attr])*
        #[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
        $vis struct $name(pub $inner);

        impl $name {
            /// Sentinel meaning "no valid id".
            pub const INVALID: $name = $name(<$inner>::MAX);

            #[inline(always)]
            pub fn index(self) -> usize {
                self.0 as usize
            }

            #[inline(always)]
            pub fn is_valid(self) -> bool {
                self != Self::INVALID
            }
        }

        impl Default for $name {
            #[inline(always)]
            fn default() -> Self {
                Self::INVALID
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }

        impl TryFrom<usize> for $name {
            type Error = std::num::TryFromIntError;
            fn try_from(n: usize) -> Result<$name, Self::Error> {
                <$inner>::try_from(n).map($name)
            }
        }
    };
}

typed_id! {
    /// A driver (and, one-to-one, their vehicle and active route).
    pub struct DriverId(u32);
}

typed_id! {
    /// A ride request submitted by a rider.
    pub struct RequestId(u32);
}

typed_id! {
    /// A ride created at match time, or directly for a hailed ride.
    pub struct RideId(u32);
}

typed_id! {
    /// The rider who booked a request.  Hailed rides carry no rider.
    pub struct RiderId(u32);
}

typed_id! {
    /// A service location (operating area with its own limits).
    pub struct LocationId(u16);
}

typed_id! {
    /// A matching zone inside a location.
    pub struct ZoneId(u16);
}

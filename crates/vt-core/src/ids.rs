//! Strongly typed identifiers.
//!
//! `VehicleId` indexes a vehicle within a fleet run and seeds its RNG; the
//! string identities carried on telemetry (VIN, device id, simulation id) come
//! from the caller and are kept as plain `String`s.

use std::fmt;

use crate::RandomSource;

/// Generate a typed ID wrapper around a primitive integer.
macro_rules! typed_id {
    ($(#[$attr:meta])* $vis:vis struct $name:ident($inner:ty);) => {
        $(#[$attr])*
        #[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
        $vis struct $name(pub $inner);

        impl $name {
            /// Cast to `usize` for direct use as a `Vec` index.
            #[inline(always)]
            pub fn index(self) -> usize {
                self.0 as usize
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }

        impl From<$name> for usize {
            #[inline(always)]
            fn from(id: $name) -> usize {
                id.0 as usize
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
    /// Index of a simulated vehicle within a fleet run.
    pub struct VehicleId(u32);
}

/// URL-safe alphabet used for trip ids.
const TRIP_ID_ALPHABET: &[u8] =
    b"0123456789abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ_-";

/// Length of generated trip ids.
pub const TRIP_ID_LEN: usize = 10;

/// Draw a short, URL-safe trip id from `rng`.
///
/// Drawn from the per-vehicle source so a seeded replay reproduces the id too.
pub fn generate_trip_id(rng: &mut dyn RandomSource) -> String {
    (0..TRIP_ID_LEN)
        .map(|_| TRIP_ID_ALPHABET[rng.below(TRIP_ID_ALPHABET.len())] as char)
        .collect()
}

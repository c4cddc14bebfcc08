//! Vehicle state enums shared across the dynamics and aggregation crates.

/// Automatic-transmission gear position.  `Neutral` is `0`, `Sixth` is `6`.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum Gear {
    #[default]
    Neutral = 0,
    First   = 1,
    Second  = 2,
    Third   = 3,
    Fourth  = 4,
    Fifth   = 5,
    Sixth   = 6,
}

impl Gear {
    pub const ALL: [Gear; 7] = [
        Gear::Neutral,
        Gear::First,
        Gear::Second,
        Gear::Third,
        Gear::Fourth,
        Gear::Fifth,
        Gear::Sixth,
    ];

    /// Numeric position, `0..=6`.
    #[inline]
    pub fn number(self) -> u8 {
        self as u8
    }

    /// Gear for a numeric position.  Out-of-range values saturate at `Sixth`.
    #[inline]
    pub fn from_number(n: u8) -> Gear {
        Gear::ALL[(n as usize).min(6)]
    }

    /// One gear higher, saturating at `Sixth`.
    #[inline]
    pub fn up(self) -> Gear {
        Gear::from_number(self.number() + 1)
    }

    /// One gear lower, saturating at `Neutral`.
    #[inline]
    pub fn down(self) -> Gear {
        Gear::from_number(self.number().saturating_sub(1))
    }

    #[inline]
    pub fn is_neutral(self) -> bool {
        self == Gear::Neutral
    }
}

impl std::fmt::Display for Gear {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.number())
    }
}

/// Ignition key position.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum IgnitionStatus {
    Run,
    #[default]
    Off,
}

impl IgnitionStatus {
    /// Label used on the wire by downstream consumers.
    pub fn as_str(self) -> &'static str {
        match self {
            IgnitionStatus::Run => "run",
            IgnitionStatus::Off => "off",
        }
    }
}

impl std::fmt::Display for IgnitionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

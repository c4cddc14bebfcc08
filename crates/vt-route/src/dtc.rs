//! Diagnostic trouble code table.
//!
//! A read-only table of generic OBD-II powertrain, chassis, body and network
//! codes.  `dtc` triggers pick one uniformly.

use vt_core::RandomSource;

pub static DIAGNOSTIC_TROUBLE_CODES: &[&str] = &[
    // Fuel and air metering
    "P0100", "P0101", "P0102", "P0103", "P0110", "P0115", "P0116", "P0117",
    "P0118", "P0120", "P0121", "P0122", "P0130", "P0131", "P0133", "P0135",
    "P0171", "P0172", "P0174", "P0175",
    // Ignition system / misfire
    "P0300", "P0301", "P0302", "P0303", "P0304", "P0305", "P0306", "P0325",
    "P0335", "P0340",
    // Emission controls
    "P0400", "P0401", "P0402", "P0420", "P0430", "P0440", "P0442", "P0446",
    "P0455", "P0456",
    // Speed, idle control, auxiliary inputs
    "P0500", "P0505", "P0506", "P0507", "P0520", "P0522", "P0562", "P0563",
    // Transmission
    "P0700", "P0705", "P0715", "P0720", "P0730", "P0740", "P0750", "P0755",
    // Chassis, body, network
    "C0035", "C0040", "C0045", "C0050", "B0001", "B0100", "U0100", "U0101",
    "U0121", "U0140",
];

/// Pick a code uniformly from [`DIAGNOSTIC_TROUBLE_CODES`].
pub fn random_dtc(rng: &mut dyn RandomSource) -> &'static str {
    DIAGNOSTIC_TROUBLE_CODES[rng.below(DIAGNOSTIC_TROUBLE_CODES.len())]
}

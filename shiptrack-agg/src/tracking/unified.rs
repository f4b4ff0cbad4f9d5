//! Cross-modal identifier heuristics
//!
//! When a caller supplies no modality, the identifier's shape picks one.
//! Priority order is part of the contract: flight-number shapes first, then
//! MMSI (exactly nine digits), then ground as the catch-all default. Flight
//! numbers and MMSIs are distinctively shaped; generic parcel numbers are
//! variable-length digit strings and must come last or they would shadow
//! everything.

use once_cell::sync::Lazy;
use regex::Regex;
use shiptrack_common::Modality;

static FLIGHT_SHAPE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Z]{2,3}\s?\d{1,4}[A-Z]?$").expect("valid flight pattern"));

static MMSI_SHAPE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{9}$").expect("valid MMSI pattern"));

/// The flight-number heuristic, shared with shape description
pub(crate) fn flight_shape() -> &'static Regex {
    &FLIGHT_SHAPE
}

/// Pick a modality from the identifier's shape
///
/// Never returns [`Modality::Auto`]; unmatched identifiers default to
/// [`Modality::Ground`].
pub fn detect_modality(identifier: &str) -> Modality {
    let normalized = identifier.trim().to_uppercase();

    if FLIGHT_SHAPE.is_match(&normalized) {
        Modality::Aviation
    } else if MMSI_SHAPE.is_match(&normalized) {
        Modality::Maritime
    } else {
        Modality::Ground
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flight_number_detected_first() {
        assert_eq!(detect_modality("AF1234"), Modality::Aviation);
        assert_eq!(detect_modality("DL 42"), Modality::Aviation);
        assert_eq!(detect_modality("baw123a"), Modality::Aviation);
    }

    #[test]
    fn test_nine_digits_is_maritime() {
        assert_eq!(detect_modality("123456789"), Modality::Maritime);
        assert_eq!(detect_modality("  228337600  "), Modality::Maritime);
    }

    #[test]
    fn test_everything_else_is_ground() {
        assert_eq!(detect_modality("MAEU1234567"), Modality::Ground);
        assert_eq!(detect_modality("1Z999AA10123456784"), Modality::Ground);
        assert_eq!(detect_modality("1234567890"), Modality::Ground); // 10 digits, not MMSI
        assert_eq!(detect_modality("12345678"), Modality::Ground); // 8 digits, not MMSI
        assert_eq!(detect_modality("garbage-id-###"), Modality::Ground);
        assert_eq!(detect_modality(""), Modality::Ground);
    }

    #[test]
    fn test_never_returns_auto() {
        for id in ["AF1234", "123456789", "anything", ""] {
            assert_ne!(detect_modality(id), Modality::Auto);
        }
    }
}

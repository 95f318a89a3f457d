//! Mobile number utilities

use once_cell::sync::Lazy;
use regex::Regex;

// Indian mobile numbers: ten digits, leading digit 6-9
static MOBILE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[6-9][0-9]{9}$").unwrap()
});

/// Length of a mobile number without country code
pub const MOBILE_LENGTH: usize = 10;

/// Normalize a mobile number by removing common formatting characters
pub fn normalize_mobile_number(phone: &str) -> String {
    phone.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// Check if a mobile number is valid.
///
/// The raw value is checked as typed; formatting characters make it invalid.
pub fn is_valid_mobile(phone: &str) -> bool {
    MOBILE_REGEX.is_match(phone)
}

/// Mask a mobile number for logging (e.g., 987****3210)
pub fn mask_phone_number(phone: &str) -> String {
    let normalized = normalize_mobile_number(phone);
    if normalized.len() >= 7 {
        format!(
            "{}****{}",
            &normalized[0..3],
            &normalized[normalized.len() - 4..]
        )
    } else {
        "****".to_string()
    }
}

//! Phone number validation
//!
//! Kenyan mobile numbers are accepted in local (`07XXXXXXXX`), bare
//! (`7XXXXXXXX`) or international (`2547XXXXXXXX`, `+2547XXXXXXXX`) form and
//! always normalized to the 12-digit international form.

use once_cell::sync::Lazy;
use regex::Regex;

/// Longest input accepted once non-digits are stripped
pub const MAX_PHONE_DIGITS: usize = 12;

/// International prefix every normalized number starts with
pub const COUNTRY_PREFIX: &str = "254";

static KENYAN_MOBILE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:254|\+254|0)?(7\d{8})$").expect("valid phone pattern"));

/// Keep only the digits of user input
pub fn sanitize(input: &str) -> String {
    input.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// Normalize a phone number to `2547XXXXXXXX`
///
/// Returns `None` when the number does not match the accepted pattern.
pub fn normalize(input: &str) -> Option<String> {
    let digits = sanitize(input);
    if digits.len() > MAX_PHONE_DIGITS {
        return None;
    }
    let captures = KENYAN_MOBILE.captures(&digits)?;
    Some(format!("{}{}", COUNTRY_PREFIX, &captures[1]))
}

pub fn is_valid(input: &str) -> bool {
    normalize(input).is_some()
}

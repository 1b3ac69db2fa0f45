//! Pull CIDR-shaped substrings out of free text

use once_cell::sync::Lazy;
use regex::Regex;

// IPv4 dotted quad followed by a decimal prefix. IPv6 text is never matched here.
static CIDR_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:[0-9]{1,3}\.){3}[0-9]{1,3}/[0-9]+").expect("constant CIDR pattern compiles")
});

/// Return every CIDR-looking substring of `text`, in order of appearance
///
/// Matches are neither deduplicated nor validated beyond their shape.
pub fn extract_cidrs(text: &str) -> Vec<String> {
    CIDR_PATTERN
        .find_iter(text)
        .map(|m| m.as_str().to_string())
        .collect()
}

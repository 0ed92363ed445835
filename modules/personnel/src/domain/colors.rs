use once_cell::sync::Lazy;
use regex::Regex;

/// Color used when the input is not a usable hex code.
pub const FALLBACK_COLOR: &str = "#999999";

static HEX6: Lazy<Regex> = Lazy::new(|| Regex::new(r"^#[0-9a-fA-F]{6}$").expect("valid regex"));
static HEX3: Lazy<Regex> = Lazy::new(|| Regex::new(r"^#[0-9a-fA-F]{3}$").expect("valid regex"));

/// Canonical `#RRGGBB` form of a department color, and whether the input
/// was valid. Invalid or empty input yields [`FALLBACK_COLOR`].
pub fn normalize_hex(input: &str) -> (String, bool) {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return (FALLBACK_COLOR.to_string(), false);
    }
    let s = if trimmed.starts_with('#') {
        trimmed.to_string()
    } else {
        format!("#{trimmed}")
    };

    if HEX6.is_match(&s) {
        return (s.to_ascii_uppercase(), true);
    }
    if HEX3.is_match(&s) {
        let expanded: String = s[1..].chars().flat_map(|c| [c, c]).collect();
        return (format!("#{}", expanded.to_ascii_uppercase()), true);
    }
    (FALLBACK_COLOR.to_string(), false)
}

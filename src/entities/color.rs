//! Color string checking shared by all color-typed attributes.
//!
//! Accepted forms:
//! - `#rgb`, `#rgba`, `#rrggbb`, `#rrggbbaa`
//! - `rgb(r, g, b)` and `rgba(r, g, b, a)` with 0-255 channels, alpha 0-1
//! - CSS color names (case-insensitive)
//!
//! Values are kept as written; only their form is checked here.

use regex::Regex;
use std::sync::LazyLock;

static RGB_FN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^rgba?\(\s*(\d{1,3})\s*,\s*(\d{1,3})\s*,\s*(\d{1,3})\s*(?:,\s*([0-9]*\.?[0-9]+)\s*)?\)$")
        .unwrap_or_else(|e| panic!("invalid rgb() pattern: {e}"))
});

/// Named colors, lower case.
const NAMED: &[&str] = &[
    "black", "white", "red", "green", "lime", "blue", "yellow", "cyan", "aqua", "magenta",
    "fuchsia", "orange", "purple", "pink", "brown", "gray", "grey", "silver", "maroon", "navy",
    "olive", "teal", "gold", "indigo", "violet", "coral", "salmon", "tomato", "crimson", "khaki",
    "turquoise", "transparent",
];

/// True if `s` is a color in one of the accepted forms.
pub fn is_color(s: &str) -> bool {
    let s = s.trim();
    if let Some(hex) = s.strip_prefix('#') {
        return is_hex(hex);
    }
    if let Some(caps) = RGB_FN.captures(s) {
        let channels_ok = (1..=3).all(|i| {
            caps.get(i)
                .and_then(|m| m.as_str().parse::<u16>().ok())
                .is_some_and(|v| v <= 255)
        });
        let alpha_ok = caps.get(4).is_none_or(|m| {
            m.as_str()
                .parse::<f32>()
                .is_ok_and(|a| (0.0..=1.0).contains(&a))
        });
        return channels_ok && alpha_ok;
    }
    NAMED.iter().any(|name| name.eq_ignore_ascii_case(s))
}

fn is_hex(hex: &str) -> bool {
    matches!(hex.len(), 3 | 4 | 6 | 8) && hex.chars().all(|c| c.is_ascii_hexdigit())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_forms() {
        for ok in ["#f48a42", "#F80", "#f808", "#36B37E80"] {
            assert!(is_color(ok), "{ok}");
        }
        assert!(!is_color("#12345"));
        assert!(!is_color("#gggggg"));
        assert!(!is_color("#"));
    }

    #[test]
    fn test_rgb_functions() {
        assert!(is_color("rgb(10, 20, 30)"));
        assert!(is_color("RGBA(10,20,30,0.5)"));
        assert!(!is_color("rgb(256, 0, 0)"));
        assert!(!is_color("rgba(0, 0, 0, 1.5)"));
        assert!(!is_color("rgb(1, 2)"));
    }

    #[test]
    fn test_named_colors() {
        assert!(is_color("Orange"));
        assert!(is_color(" transparent "));
        assert!(!is_color("notacolor"));
        assert!(!is_color(""));
    }
}

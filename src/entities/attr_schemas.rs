//! Static attribute schemas for all tag types.
//!
//! Each schema lists the markup attributes a tag accepts, their types and
//! declared defaults. Tag modules wrap these tables in a capability bundle.

use super::attrs::{AttrDef, AttrType, FLAG_REFERENCE, FLAG_REQUIRED, FLAG_STYLE};
use super::keys::*;

// Shorthand flag combos
const REQ: u8 = FLAG_REQUIRED;
const REF: u8 = FLAG_REFERENCE;
const REQ_REF: u8 = FLAG_REQUIRED | FLAG_REFERENCE;
const STYLE: u8 = FLAG_STYLE;

// ============================================================================
// Ellipse Schema
// ============================================================================

pub const ELLIPSE_DEFS: &[AttrDef] = &[
    // Identity
    AttrDef::new(A_NAME, AttrType::Identifier, REQ),
    AttrDef::new(A_TO_NAME, AttrType::Reference, REF),
    // Appearance, copied to the drawing tool
    AttrDef::with_default(A_OPACITY, AttrType::UNIT, STYLE, "1"),
    AttrDef::with_default(A_FILL_COLOR, AttrType::Color, STYLE, "#f48a42"),
    AttrDef::with_default(A_STROKE_WIDTH, AttrType::Number, STYLE, "1"),
    AttrDef::with_default(A_STROKE_COLOR, AttrType::Color, STYLE, "#f48a42"),
    AttrDef::with_default(A_FILL_OPACITY, AttrType::UNIT, STYLE, "0.2"),
    AttrDef::with_default(A_CAN_ROTATE, AttrType::Bool, STYLE, "true"),
];

// ============================================================================
// Image Schema
// ============================================================================

pub const IMAGE_DEFS: &[AttrDef] = &[
    AttrDef::new(A_NAME, AttrType::Identifier, REQ),
    // Data key, e.g. `$image`
    AttrDef::new(A_VALUE, AttrType::Text, REQ),
    AttrDef::with_default(A_WIDTH, AttrType::Text, 0, "100%"),
    AttrDef::with_default(A_ZOOM, AttrType::Bool, 0, "true"),
];

// ============================================================================
// Labels / Label Schemas
// ============================================================================

pub const LABELS_DEFS: &[AttrDef] = &[
    AttrDef::new(A_NAME, AttrType::Identifier, REQ),
    AttrDef::new(A_TO_NAME, AttrType::Reference, REQ_REF),
    AttrDef::with_default(A_CHOICE, AttrType::Text, 0, "single"),
    AttrDef::with_default(A_OPACITY, AttrType::UNIT, STYLE, "0.6"),
];

pub const LABEL_DEFS: &[AttrDef] = &[
    AttrDef::new(A_VALUE, AttrType::Text, REQ),
    AttrDef::with_default(A_BACKGROUND, AttrType::Color, STYLE, "#36B37E"),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_default_coerces() {
        let tables = [
            ("Ellipse", ELLIPSE_DEFS),
            ("Image", IMAGE_DEFS),
            ("Labels", LABELS_DEFS),
            ("Label", LABEL_DEFS),
        ];
        for (tag, defs) in tables {
            for def in defs {
                if let Some(default) = def.default_value() {
                    assert!(default.is_ok(), "{}.{}", tag, def.name);
                }
            }
        }
    }

    #[test]
    fn test_keys_are_lower_case() {
        for def in ELLIPSE_DEFS.iter().chain(IMAGE_DEFS).chain(LABELS_DEFS).chain(LABEL_DEFS) {
            assert_eq!(def.name, def.name.to_ascii_lowercase());
        }
    }
}

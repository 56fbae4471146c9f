//! Attribute storage and declarative attribute schemas.
//!
//! A tag declares its accepted markup attributes as a static list of
//! [`AttrDef`]s. [`AttrSchema::validate`] turns the raw strings read from markup
//! into a typed [`Attrs`] record:
//! - names match case-insensitively, unknown names are ignored
//! - absent fields take their declared default, coerced through the same path
//! - bad values fail with a [`ValidationError`] or fall back to the default,
//!   depending on [`ValidationPolicy`] (applied uniformly to every field)

use indexmap::IndexMap;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;

use super::color;
use crate::error::ValidationError;

/// Raw attribute strings as read from markup, in document order.
pub type RawAttrs = IndexMap<String, String>;

// Attribute flags
/// Must be supplied (or defaulted) and non-empty
pub const FLAG_REQUIRED: u8 = 1 << 0;
/// Holds the name of another tag in the same document
pub const FLAG_REFERENCE: u8 = 1 << 1;
/// Visual styling, forwarded to tools
pub const FLAG_STYLE: u8 = 1 << 2;

/// Typed attribute value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttrValue {
    Bool(bool),
    Float(f32),
    Str(String),
}

/// Attribute container: key → typed value, insertion ordered.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Attrs {
    #[serde(default, flatten)]
    map: IndexMap<String, AttrValue>,
}

impl Attrs {
    pub fn new() -> Self {
        Self {
            map: IndexMap::new(),
        }
    }

    pub fn set(&mut self, key: impl Into<String>, value: AttrValue) {
        self.map.insert(key.into(), value);
    }

    pub fn get(&self, key: &str) -> Option<&AttrValue> {
        self.map.get(key)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        match self.map.get(key) {
            Some(AttrValue::Str(s)) => Some(s),
            _ => None,
        }
    }

    pub fn get_float(&self, key: &str) -> Option<f32> {
        match self.map.get(key) {
            Some(AttrValue::Float(v)) => Some(*v),
            _ => None,
        }
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        match self.map.get(key) {
            Some(AttrValue::Bool(v)) => Some(*v),
            _ => None,
        }
    }

    /// Get float value with custom default
    pub fn get_float_or(&self, key: &str, default: f32) -> f32 {
        self.get_float(key).unwrap_or(default)
    }

    /// Get bool value with custom default
    pub fn get_bool_or(&self, key: &str, default: bool) -> bool {
        self.get_bool(key).unwrap_or(default)
    }

    /// Iterate over all attributes (key, value)
    pub fn iter(&self) -> impl Iterator<Item = (&String, &AttrValue)> {
        self.map.iter()
    }

    /// Check if attribute exists
    pub fn contains(&self, key: &str) -> bool {
        self.map.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Copy of the attributes whose keys are listed, in listed order.
    pub fn subset<'a>(&self, keys: impl IntoIterator<Item = &'a str>) -> Attrs {
        let mut out = Attrs::new();
        for key in keys {
            if let Some(v) = self.map.get(key) {
                out.set(key, v.clone());
            }
        }
        out
    }
}

/// What to do with a value that fails coercion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationPolicy {
    /// Surface the first error to the caller
    #[default]
    Strict,
    /// Log and use the declared default; fields without one still fail
    Substitute,
}

/// Declared attribute type. Every type is read from a markup string.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AttrType {
    /// Document-unique name of this tag
    Identifier,
    /// Free-form string
    Text,
    /// Name of another tag; resolved by the host document
    Reference,
    /// Non-negative number kept in its string form
    Number,
    /// Float constrained to `min..=max`
    Range { min: f32, max: f32 },
    /// Color string (hex, rgb()/rgba(), CSS name)
    Color,
    Bool,
}

impl AttrType {
    /// Range type over 0..=1, the common case for opacities.
    pub const UNIT: AttrType = AttrType::Range { min: 0.0, max: 1.0 };
}

/// Attribute definition (static metadata).
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AttrDef {
    /// Lower-case storage key; markup names match it case-insensitively
    pub name: &'static str,
    pub attr_type: AttrType,
    pub flags: u8,
    /// Markup-form default, coerced like a supplied value
    pub default: Option<&'static str>,
}

impl AttrDef {
    pub const fn new(name: &'static str, attr_type: AttrType, flags: u8) -> Self {
        Self {
            name,
            attr_type,
            flags,
            default: None,
        }
    }

    pub const fn with_default(
        name: &'static str,
        attr_type: AttrType,
        flags: u8,
        default: &'static str,
    ) -> Self {
        Self {
            name,
            attr_type,
            flags,
            default: Some(default),
        }
    }

    #[inline]
    pub fn is_required(&self) -> bool {
        (self.flags & FLAG_REQUIRED) != 0
    }

    #[inline]
    pub fn is_reference(&self) -> bool {
        (self.flags & FLAG_REFERENCE) != 0
    }

    #[inline]
    pub fn is_style(&self) -> bool {
        (self.flags & FLAG_STYLE) != 0
    }

    /// Coerce a markup string into this attribute's typed value.
    pub fn coerce(&self, raw: &str) -> Result<AttrValue, ValidationError> {
        let value = raw.trim();
        match self.attr_type {
            AttrType::Identifier => {
                if value.is_empty() {
                    return Err(ValidationError::Missing {
                        field: self.name.to_string(),
                    });
                }
                Ok(AttrValue::Str(value.to_string()))
            }
            AttrType::Text | AttrType::Reference => {
                if value.is_empty() && self.is_required() {
                    return Err(ValidationError::Missing {
                        field: self.name.to_string(),
                    });
                }
                Ok(AttrValue::Str(value.to_string()))
            }
            AttrType::Number => match value.parse::<f32>() {
                Ok(n) if n.is_finite() && n >= 0.0 => Ok(AttrValue::Str(value.to_string())),
                _ => Err(ValidationError::InvalidNumber {
                    field: self.name.to_string(),
                    value: raw.to_string(),
                }),
            },
            AttrType::Range { min, max } => {
                let n = value
                    .parse::<f32>()
                    .ok()
                    .filter(|n| n.is_finite())
                    .ok_or_else(|| ValidationError::InvalidNumber {
                        field: self.name.to_string(),
                        value: raw.to_string(),
                    })?;
                if n < min || n > max {
                    return Err(ValidationError::OutOfRange {
                        field: self.name.to_string(),
                        value: raw.to_string(),
                        min,
                        max,
                    });
                }
                Ok(AttrValue::Float(n))
            }
            AttrType::Color => {
                if !color::is_color(value) {
                    return Err(ValidationError::InvalidColor {
                        field: self.name.to_string(),
                        value: raw.to_string(),
                    });
                }
                Ok(AttrValue::Str(value.to_string()))
            }
            AttrType::Bool => {
                if value.eq_ignore_ascii_case("true") {
                    Ok(AttrValue::Bool(true))
                } else if value.eq_ignore_ascii_case("false") {
                    Ok(AttrValue::Bool(false))
                } else {
                    Err(ValidationError::InvalidBool {
                        field: self.name.to_string(),
                        value: raw.to_string(),
                    })
                }
            }
        }
    }

    /// Declared default in typed form, if any.
    pub fn default_value(&self) -> Option<Result<AttrValue, ValidationError>> {
        self.default.map(|d| self.coerce(d))
    }
}

/// Attribute schema: named list of definitions.
///
/// Tags declare theirs as `static` slices; the composer builds owned ones.
#[derive(Debug, Clone, PartialEq)]
pub struct AttrSchema {
    pub name: Cow<'static, str>,
    defs: Cow<'static, [AttrDef]>,
}

impl AttrSchema {
    pub const fn new(name: &'static str, defs: &'static [AttrDef]) -> Self {
        Self {
            name: Cow::Borrowed(name),
            defs: Cow::Borrowed(defs),
        }
    }

    pub fn from_defs(name: impl Into<String>, defs: Vec<AttrDef>) -> Self {
        Self {
            name: Cow::Owned(name.into()),
            defs: Cow::Owned(defs),
        }
    }

    pub fn defs(&self) -> &[AttrDef] {
        &self.defs
    }

    /// Look up a definition by key (case-insensitive).
    pub fn get(&self, key: &str) -> Option<&AttrDef> {
        self.defs.iter().find(|d| d.name.eq_ignore_ascii_case(key))
    }

    pub fn len(&self) -> usize {
        self.defs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.defs.is_empty()
    }

    /// Validate raw markup attributes into a typed, defaulted record.
    pub fn validate(
        &self,
        raw: &RawAttrs,
        policy: ValidationPolicy,
    ) -> Result<Attrs, ValidationError> {
        for key in raw.keys() {
            if self.get(key).is_none() {
                debug!("{}: ignoring unknown attribute `{}`", self.name, key);
            }
        }

        let mut attrs = Attrs::new();
        for def in self.defs.iter() {
            let supplied = raw
                .iter()
                .find(|(k, _)| k.eq_ignore_ascii_case(def.name))
                .map(|(_, v)| v.as_str());

            match supplied {
                Some(value) => match def.coerce(value) {
                    Ok(v) => attrs.set(def.name, v),
                    Err(err) => match (policy, def.default_value()) {
                        (ValidationPolicy::Substitute, Some(Ok(fallback))) => {
                            warn!("{}: {}, using default {:?}", self.name, err, def.default);
                            attrs.set(def.name, fallback);
                        }
                        _ => return Err(err),
                    },
                },
                None => match def.default_value() {
                    Some(default) => attrs.set(def.name, default?),
                    None if def.is_required() => {
                        return Err(ValidationError::Missing {
                            field: def.name.to_string(),
                        });
                    }
                    None => {}
                },
            }
        }
        Ok(attrs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DEFS: &[AttrDef] = &[
        AttrDef::new("name", AttrType::Identifier, FLAG_REQUIRED),
        AttrDef::new("toname", AttrType::Reference, FLAG_REFERENCE),
        AttrDef::with_default("opacity", AttrType::UNIT, FLAG_STYLE, "1"),
        AttrDef::with_default("fillcolor", AttrType::Color, FLAG_STYLE, "#f48a42"),
        AttrDef::with_default("strokewidth", AttrType::Number, FLAG_STYLE, "1"),
        AttrDef::with_default("canrotate", AttrType::Bool, 0, "true"),
    ];
    static SCHEMA: AttrSchema = AttrSchema::new("Test", DEFS);

    fn raw(pairs: &[(&str, &str)]) -> RawAttrs {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_defaults_fill_absent_fields() {
        let attrs = SCHEMA.validate(&raw(&[("name", "e1")]), ValidationPolicy::Strict).unwrap();

        assert_eq!(attrs.get_str("name"), Some("e1"));
        assert_eq!(attrs.get_float("opacity"), Some(1.0));
        assert_eq!(attrs.get_str("fillcolor"), Some("#f48a42"));
        assert_eq!(attrs.get_str("strokewidth"), Some("1"));
        assert_eq!(attrs.get_bool("canrotate"), Some(true));
        // Nullable reference without default stays absent
        assert!(!attrs.contains("toname"));
    }

    #[test]
    fn test_names_match_case_insensitively() {
        let attrs = SCHEMA
            .validate(
                &raw(&[("Name", "e1"), ("toName", "img"), ("canRotate", "FALSE")]),
                ValidationPolicy::Strict,
            )
            .unwrap();
        assert_eq!(attrs.get_str("toname"), Some("img"));
        assert_eq!(attrs.get_bool("canrotate"), Some(false));
    }

    #[test]
    fn test_unknown_attributes_ignored() {
        let attrs = SCHEMA
            .validate(&raw(&[("name", "e1"), ("hotkey", "e")]), ValidationPolicy::Strict)
            .unwrap();
        assert!(!attrs.contains("hotkey"));
    }

    #[test]
    fn test_out_of_range_names_field_and_range() {
        let err = SCHEMA
            .validate(&raw(&[("name", "e1"), ("opacity", "1.5")]), ValidationPolicy::Strict)
            .unwrap_err();
        assert_eq!(err.field(), "opacity");
        assert!(matches!(
            err,
            ValidationError::OutOfRange { min, max, .. } if min == 0.0 && max == 1.0
        ));
        assert!(err.to_string().contains("0..=1"));
    }

    #[test]
    fn test_substitute_policy_uses_default() {
        let attrs = SCHEMA
            .validate(
                &raw(&[("name", "e1"), ("opacity", "7"), ("fillcolor", "notacolor")]),
                ValidationPolicy::Substitute,
            )
            .unwrap();
        assert_eq!(attrs.get_float("opacity"), Some(1.0));
        assert_eq!(attrs.get_str("fillcolor"), Some("#f48a42"));
    }

    #[test]
    fn test_substitute_cannot_invent_required_name() {
        let err = SCHEMA
            .validate(&raw(&[("name", "  ")]), ValidationPolicy::Substitute)
            .unwrap_err();
        assert_eq!(err, ValidationError::Missing { field: "name".into() });

        let err = SCHEMA.validate(&raw(&[]), ValidationPolicy::Substitute).unwrap_err();
        assert_eq!(err.field(), "name");
    }

    #[test]
    fn test_invalid_values() {
        let cases = [
            ("fillcolor", "#12345"),
            ("strokewidth", "-2"),
            ("strokewidth", "wide"),
            ("canrotate", "yes"),
            ("opacity", "NaN"),
        ];
        for (field, value) in cases {
            let err = SCHEMA
                .validate(&raw(&[("name", "e1"), (field, value)]), ValidationPolicy::Strict)
                .unwrap_err();
            assert_eq!(err.field(), field, "{field}={value}");
        }
    }

    #[test]
    fn test_attrs_subset_keeps_order() {
        let mut attrs = Attrs::new();
        attrs.set("a", AttrValue::Float(1.0));
        attrs.set("b", AttrValue::Bool(true));
        attrs.set("c", AttrValue::Str("x".into()));

        let sub = attrs.subset(["c", "a", "missing"]);
        let keys: Vec<&String> = sub.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, ["c", "a"]);
        assert_eq!(sub.get_bool_or("b", false), false);
        assert_eq!(sub.get_float_or("a", 0.0), 1.0);
    }
}

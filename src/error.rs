//! Error taxonomy for tag composition, validation and registration.
//!
//! - `ValidationError`: one bad attribute value, raised per document parse.
//! - `TagError`: composition, registry and lifecycle failures.
//! - `DocumentError`: host-side failures while turning markup into entities.
//!
//! `Composition`, `DuplicateTag` and `RegistryClosed` are startup-time
//! programming errors. `InvariantViolation` is fatal to the entity being built.

use thiserror::Error;

/// A single attribute failed coercion against its declared type.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("attribute `{field}` is required")]
    Missing { field: String },

    #[error("attribute `{field}` = {value:?} is outside the accepted range {min}..={max}")]
    OutOfRange {
        field: String,
        value: String,
        min: f32,
        max: f32,
    },

    #[error("attribute `{field}` = {value:?} is not a number")]
    InvalidNumber { field: String, value: String },

    #[error("attribute `{field}` = {value:?} is not a boolean (expected true|false)")]
    InvalidBool { field: String, value: String },

    #[error("attribute `{field}` = {value:?} is not a recognized color")]
    InvalidColor { field: String, value: String },
}

impl ValidationError {
    /// Name of the offending attribute.
    pub fn field(&self) -> &str {
        match self {
            ValidationError::Missing { field }
            | ValidationError::OutOfRange { field, .. }
            | ValidationError::InvalidNumber { field, .. }
            | ValidationError::InvalidBool { field, .. }
            | ValidationError::InvalidColor { field, .. } => field,
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum TagError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("cannot compose `{type_name}`: {reason}")]
    Composition { type_name: String, reason: String },

    #[error("tag `{0}` is already registered")]
    DuplicateTag(String),

    #[error("tag `{0}` is not registered")]
    NotFound(String),

    #[error("tag registry is sealed, cannot register `{0}`")]
    RegistryClosed(String),

    #[error("invariant violated on `{entity}`: {reason}")]
    InvariantViolation { entity: String, reason: String },

    #[error("`{type_name}` has no member `{member}`")]
    UnknownMember { type_name: String, member: String },
}

impl TagError {
    pub(crate) fn composition(type_name: &str, reason: impl Into<String>) -> Self {
        TagError::Composition {
            type_name: type_name.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn invariant(entity: &str, reason: impl Into<String>) -> Self {
        TagError::InvariantViolation {
            entity: entity.to_string(),
            reason: reason.into(),
        }
    }
}

/// Failures while reading a markup document into live entities.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DocumentError {
    #[error("markup error at byte {offset}: {message}")]
    Markup { offset: usize, message: String },

    #[error("unknown tag <{0}>")]
    UnresolvedTag(String),

    #[error("name `{0}` is used by more than one tag")]
    DuplicateName(String),

    #[error("`{from}` refers to `{to}` via `{field}`, but no tag has that name")]
    UnresolvedReference {
        from: String,
        field: String,
        to: String,
    },

    /// `tag` is lower-cased, like the tag in `UnresolvedTag`
    #[error("<{tag}>: {source}")]
    Tag {
        tag: String,
        #[source]
        source: TagError,
    },
}

impl DocumentError {
    pub(crate) fn tag(tag: &str, source: TagError) -> Self {
        DocumentError::Tag {
            tag: tag.to_ascii_lowercase(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, TagError>;

//! Error types.
//!
//! Only structural mistakes surface as errors: duplicate registrations,
//! invalid tag names and bindings whose shape cannot work (a reference that
//! is not an element, an empty expression, a malformed directive argument).
//! Resolution misses are not errors; the binding waits for the value.

use thiserror::Error;

/// Errors raised by registration and binding construction.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    #[error("selector `{0}` is already registered")]
    DuplicateSelector(String),

    #[error("`{0}` is not a valid custom element name")]
    InvalidTagName(String),

    #[error("custom element `{0}` is already defined")]
    AlreadyDefined(String),

    #[error("reference `{reference}` is a {kind} node, not an element")]
    NotAnElement { reference: String, kind: &'static str },

    #[error("binding expression in `{context}` is empty")]
    EmptyExpression { context: String },

    #[error("directive `{selector}` cannot use argument `{argument}`")]
    InvalidDirectiveArgument { selector: String, argument: String },

    #[error("no component is registered for `{0}`")]
    UnknownComponent(String),

    #[error("view for this element has been released")]
    ViewReleased,

    #[error("invalid manifest: {0}")]
    Manifest(String),
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Manifest(err.to_string())
    }
}

/// Result alias used across the crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;

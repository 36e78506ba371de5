use std::fmt;

use parambind_core::{DecodeError, Shape};

/// An error that occurred while binding values into a record.
///
/// Binding stops at the first error. Fields bound before it keep their new
/// values.
#[derive(Debug)]
pub struct BindError {
    /// Rust field names from the outermost record to the field that failed.
    ///
    /// Empty when the error is not tied to a field, e.g. a usage error or a
    /// parameter store failure.
    pub path: Vec<&'static str>,

    /// What went wrong.
    pub kind: BindErrorKind,
}

/// The specific error behind a [`BindError`].
#[derive(Debug)]
#[non_exhaustive]
pub enum BindErrorKind {
    /// The bind target is not a record.
    NotARecord {
        /// Shape of the offending target
        shape: &'static Shape,
    },

    /// A required key was absent, or the store reported it invalid.
    MissingValue {
        /// The absolute key
        key: String,
    },

    /// A value could not be converted to the field's type.
    ///
    /// The raw value is deliberately not part of this error.
    Conversion {
        /// The absolute key
        key: String,
        /// Shape of the field that was being set
        shape: &'static Shape,
        /// Why the conversion failed
        source: DecodeError,
    },

    /// The field's type cannot be bound from a string.
    UnsupportedType {
        /// The absolute key
        key: String,
        /// Shape of the unsupported field
        shape: &'static Shape,
    },

    /// A value did not have the type its shape claimed.
    ///
    /// Only a hand-written `Bindable` impl whose shape disagrees with its
    /// type can cause this.
    ShapeMismatch {
        /// The shape that was expected
        shape: &'static Shape,
    },

    /// The parameter store failed.
    Store(StoreError),
}

impl BindError {
    /// Creates an error that is not (yet) tied to a field.
    pub fn new(kind: BindErrorKind) -> Self {
        Self {
            path: Vec::new(),
            kind,
        }
    }

    /// Prepends the name of the field the error bubbled out of.
    pub(crate) fn in_field(mut self, field: &'static str) -> Self {
        self.path.insert(0, field);
        self
    }

    /// Returns the absolute key involved, if any.
    pub fn key(&self) -> Option<&str> {
        match &self.kind {
            BindErrorKind::MissingValue { key }
            | BindErrorKind::Conversion { key, .. }
            | BindErrorKind::UnsupportedType { key, .. } => Some(key),
            _ => None,
        }
    }
}

impl From<BindErrorKind> for BindError {
    fn from(kind: BindErrorKind) -> Self {
        Self::new(kind)
    }
}

impl From<StoreError> for BindError {
    fn from(err: StoreError) -> Self {
        Self::new(BindErrorKind::Store(err))
    }
}

impl fmt::Display for BindErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BindErrorKind::NotARecord { shape } => {
                write!(
                    f,
                    "bind target must be a struct with named fields, got {shape}"
                )
            }
            BindErrorKind::MissingValue { key } => write!(f, "{key} is required"),
            BindErrorKind::Conversion { key, shape, source } => {
                write!(f, "could not decode {key} into {shape}: {source}")
            }
            BindErrorKind::UnsupportedType { key, shape } => {
                write!(f, "cannot bind {key}: unsupported type {shape}")
            }
            BindErrorKind::ShapeMismatch { shape } => {
                write!(f, "value does not match its shape {shape}")
            }
            BindErrorKind::Store(err) => write!(f, "could not get parameters: {err}"),
        }
    }
}

impl fmt::Display for BindError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_empty() {
            write!(f, "{}", self.kind)
        } else {
            write!(
                f,
                "error setting field {}: {}",
                self.path.join("."),
                self.kind
            )
        }
    }
}

impl core::error::Error for BindError {
    fn source(&self) -> Option<&(dyn core::error::Error + 'static)> {
        match &self.kind {
            BindErrorKind::Conversion { source, .. } => Some(&**source),
            BindErrorKind::Store(err) => Some(err),
            _ => None,
        }
    }
}

/// An error reported by a [`ParameterStore`](crate::ParameterStore).
///
/// Stores wrap whatever their transport reports; the binder only needs to
/// surface it.
#[derive(Debug)]
pub struct StoreError {
    message: String,
    source: Option<Box<dyn core::error::Error + Send + Sync + 'static>>,
}

impl StoreError {
    /// Creates a store error from a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    /// Creates a store error that wraps an underlying cause.
    pub fn with_source(
        message: impl Into<String>,
        source: impl Into<Box<dyn core::error::Error + Send + Sync + 'static>>,
    ) -> Self {
        Self {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// The message this error was created with.
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.source {
            Some(source) => write!(f, "{}: {source}", self.message),
            None => f.write_str(&self.message),
        }
    }
}

impl core::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn core::error::Error + 'static)> {
        self.source
            .as_deref()
            .map(|source| source as &(dyn core::error::Error + 'static))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Bindable;

    #[parambind_testhelpers::test]
    fn nested_paths_are_dotted() {
        let err = BindError::new(BindErrorKind::MissingValue {
            key: "/svc/db/password".into(),
        })
        .in_field("password")
        .in_field("db");

        assert_eq!(err.path, ["db", "password"]);
        assert_eq!(err.key(), Some("/svc/db/password"));
        insta::assert_snapshot!(err, @"error setting field db.password: /svc/db/password is required");
    }

    #[parambind_testhelpers::test]
    fn conversion_errors_expose_their_source() {
        let source = "x".parse::<u16>().unwrap_err();
        let err = BindError::new(BindErrorKind::Conversion {
            key: "/svc/port".into(),
            shape: u16::SHAPE,
            source: Box::new(source),
        })
        .in_field("port");

        insta::assert_snapshot!(err, @"error setting field port: could not decode /svc/port into u16: invalid digit found in string");
        let source = core::error::Error::source(&err).unwrap();
        assert_eq!(source.to_string(), "invalid digit found in string");
    }

    #[parambind_testhelpers::test]
    fn store_errors_chain() {
        let err = BindError::from(StoreError::with_source("throttled", "rate exceeded"));
        assert!(err.path.is_empty());
        assert_eq!(err.key(), None);
        insta::assert_snapshot!(err, @"could not get parameters: throttled: rate exceeded");
    }
}

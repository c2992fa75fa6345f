//! Error types for schema construction and argument binding.
//!
//! Binding never stops at the first problem: [`ParseErrors`] carries every
//! [`ParseError`] found during a single call, in the order the schema was
//! walked. [`SchemaError`] covers mistakes made while *declaring* a schema.

use std::fmt;

use thiserror::Error;

/// A single problem found while binding arguments.
///
/// Field-scoped variants carry the declared identifier of the field (see
/// [`ParseError::field`]); the others describe the token stream or command
/// selection as a whole.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// A field without a default had no matching flag.
    #[error("No value for '{field}' found in args")]
    MissingRequiredField { field: String },

    /// The field's converter rejected the raw value.
    #[error("A parse error occurred for field '{field}': {message}")]
    FieldConversionFailure { field: String, message: String },

    /// A record constructor asked for a value its schema does not hold.
    ///
    /// Only happens when a [`Field`](crate::Field) handle issued by one
    /// builder is used with another schema, or the same handle is taken twice.
    #[error("value for field '{field}' is not available to this constructor")]
    FieldUnavailable { field: String },

    /// Flags that no field of the bound record consumed.
    #[error("arguments {} were provided but not understood", .flags.join(", "))]
    UnrecognizedArguments { flags: Vec<String> },

    /// A variant schema was bound against an empty argument vector.
    #[error("no command specified; the first argument must select one of: {}", .options.join(", "))]
    NoCommandSpecified { options: Vec<String> },

    /// The leading token names none of the declared variants.
    #[error("the command specified does not match any known types that could be parsed into: '{token}'")]
    UnknownCommand { token: String, options: Vec<String> },

    /// A bare value appeared without a flag in front of it.
    #[error("value '{token}' has no preceding flag")]
    MalformedTokenStream { token: String },
}

impl ParseError {
    /// Creates a field-scoped conversion failure.
    ///
    /// Record constructors use this to reject cross-field combinations with
    /// the same message shape as converter failures.
    pub fn invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::FieldConversionFailure {
            field: field.into(),
            message: message.into(),
        }
    }

    /// The field this error is scoped to, or `None` for structural errors.
    pub fn field(&self) -> Option<&str> {
        match self {
            Self::MissingRequiredField { field }
            | Self::FieldConversionFailure { field, .. }
            | Self::FieldUnavailable { field } => Some(field),
            Self::UnrecognizedArguments { .. }
            | Self::NoCommandSpecified { .. }
            | Self::UnknownCommand { .. }
            | Self::MalformedTokenStream { .. } => None,
        }
    }

    /// Whether this error describes the argument vector as a whole.
    pub fn is_structural(&self) -> bool {
        self.field().is_none()
    }
}

/// Every error produced by one bind call.
///
/// Never empty when returned from the binder. The `Display` impl joins the
/// individual messages with newlines, which is the aggregated message the
/// reporting facade surfaces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseErrors(Vec<ParseError>);

impl ParseErrors {
    pub(crate) fn new(errors: Vec<ParseError>) -> Self {
        debug_assert!(!errors.is_empty());
        Self(errors)
    }

    /// The individual errors, in detection order.
    pub fn errors(&self) -> &[ParseError] {
        &self.0
    }

    /// Number of errors.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always `false` for values returned by the binder.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Every error message, in order.
    pub fn messages(&self) -> Vec<String> {
        self.0.iter().map(ToString::to_string).collect()
    }

    /// Consumes the list and returns the underlying errors.
    pub fn into_vec(self) -> Vec<ParseError> {
        self.0
    }
}

impl From<ParseError> for ParseErrors {
    fn from(error: ParseError) -> Self {
        Self(vec![error])
    }
}

impl fmt::Display for ParseErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, error) in self.0.iter().enumerate() {
            if idx > 0 {
                f.write_str("\n")?;
            }
            write!(f, "{error}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ParseErrors {}

impl IntoIterator for ParseErrors {
    type Item = ParseError;
    type IntoIter = std::vec::IntoIter<ParseError>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a ParseErrors {
    type Item = &'a ParseError;
    type IntoIter = std::slice::Iter<'a, ParseError>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Mistakes in a schema declaration, reported by the builders.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    /// A field or variant was declared with an empty name.
    #[error("identifier cannot be empty")]
    EmptyIdentifier,
    /// Two fields map to the same flag spelling.
    #[error("fields '{first}' and '{second}' both map to {flag}")]
    DuplicateField {
        first: String,
        second: String,
        flag: String,
    },
    /// Two alternatives share a discriminator.
    #[error("duplicate variant name: {0}")]
    DuplicateVariant(String),
    /// A variant schema needs at least one alternative.
    #[error("variant schema must declare at least one alternative")]
    EmptyVariantSet,
    /// No parser is registered for the field's value type.
    #[error("no parser registered for field '{field}' of type {type_name}")]
    NoParser { field: String, type_name: String },
}

/// Convenience alias for builder results.
pub type SchemaResult<T> = std::result::Result<T, SchemaError>;

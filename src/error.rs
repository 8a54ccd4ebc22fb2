//! Error taxonomy: schema construction failures and per-line parse failures.

use std::fmt;

/// Identifies a field within a line schema for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldRef {
    /// 0-based index among the line's fields (the tag is not counted).
    pub index: usize,
    pub name: Option<String>,
}

impl fmt::Display for FieldRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            Some(name) => write!(f, "#{} `{}`", self.index, name),
            None => write!(f, "#{}", self.index),
        }
    }
}

/// Schema construction failure. A schema that fails here is never produced.
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    #[error("delimiter must be exactly one character, got {0:?}")]
    InvalidDelimiter(String),
    #[error("quote must be exactly one character, got {0:?}")]
    InvalidQuote(String),
    #[error("delimiter and quote are both {0:?}")]
    QuoteIsDelimiter(char),
    #[error("schema declares no lines")]
    NoLines,
    #[error("line {index} has an empty tag")]
    EmptyTag { index: usize },
    #[error("duplicate line tag `{0}`")]
    DuplicateTag(String),
    #[error("line `{tag}`, field {field}: {reason}")]
    InvalidField {
        tag: String,
        field: FieldRef,
        reason: String,
    },
    #[error("Syntax: {0}")]
    Syntax(String),
    #[error("JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("IO: {0}")]
    Io(#[from] std::io::Error),
}

/// Structural failure while splitting a line into tokens.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TokenizeError {
    #[error("unterminated quoted field starting at byte {offset}")]
    UnterminatedQuote { offset: usize },
    #[error("unexpected {found:?} after closing quote at byte {offset}")]
    TextAfterQuote { offset: usize, found: char },
    #[error("line does not end with trailing delimiter {delimiter:?}")]
    MissingTrailingDelimiter { delimiter: char },
}

/// A declared constraint failed on a successfully converted value.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConstraintViolation {
    #[error("{value} is below the minimum {min}")]
    BelowMin { value: String, min: String },
    #[error("{value} is above the maximum {max}")]
    AboveMax { value: String, max: String },
    #[error("length {len} is below the minimum {min}")]
    TooShort { len: usize, min: usize },
    #[error("length {len} is above the maximum {max}")]
    TooLong { len: usize, max: usize },
    #[error("character {0:?} is not allowed")]
    DisallowedChar(char),
    #[error("{places} decimal places exceed the maximum of {max}")]
    TooManyDecimalPlaces { places: u32, max: u32 },
}

/// Failure of a single field, before the line schema attaches its location.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FieldError {
    #[error("required field is empty")]
    Empty,
    #[error("{0}")]
    Malformed(String),
    #[error(transparent)]
    Constraint(#[from] ConstraintViolation),
}

/// Failure to parse one line. Processing stops at the first error.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ParseError {
    #[error("Tokenize: {0}")]
    Tokenize(#[from] TokenizeError),
    #[error("empty line")]
    EmptyLine,
    #[error("no line schema matches tag `{0}`")]
    UnknownTag(String),
    #[error("line `{tag}` expects {expected} field(s) after the tag, found {found}")]
    FieldCount {
        tag: String,
        expected: usize,
        found: usize,
    },
    #[error("line `{tag}`, field {field}: cannot parse `{token}`: {reason}")]
    FieldParse {
        tag: String,
        field: FieldRef,
        token: String,
        reason: String,
    },
    #[error("line `{tag}`, field {field}: `{token}` violates constraint: {violation}")]
    Constraint {
        tag: String,
        field: FieldRef,
        token: String,
        violation: ConstraintViolation,
    },
}

impl ParseError {
    /// Attach line/field location to a field-local failure.
    pub(crate) fn from_field(tag: &str, field: FieldRef, token: &str, err: FieldError) -> Self {
        match err {
            FieldError::Constraint(violation) => ParseError::Constraint {
                tag: tag.to_string(),
                field,
                token: token.to_string(),
                violation,
            },
            other => ParseError::FieldParse {
                tag: tag.to_string(),
                field,
                token: token.to_string(),
                reason: other.to_string(),
            },
        }
    }

    /// Empty line or unknown tag: no line schema was selected.
    pub fn is_dispatch(&self) -> bool {
        matches!(self, ParseError::EmptyLine | ParseError::UnknownTag(_))
    }

    pub fn is_constraint(&self) -> bool {
        matches!(self, ParseError::Constraint { .. })
    }

    /// Location of the failing field, for field-level errors.
    pub fn field(&self) -> Option<&FieldRef> {
        match self {
            ParseError::FieldParse { field, .. } | ParseError::Constraint { field, .. } => Some(field),
            _ => None,
        }
    }
}

use serde::Serialize;
use thiserror::Error;

/// Problems in the declaration block at the top of a template, tag or layout.
#[derive(Clone, Debug, Error, PartialEq, Eq, Serialize)]
pub enum HeaderError {
    #[error("Missing '@param' declaration: a template declares exactly one model parameter")]
    MissingParam,

    #[error("Duplicate '@param' at position {position}: a template declares exactly one model parameter")]
    DuplicateParam { position: usize },

    #[error("Malformed '@param' at position {position}: {reason}")]
    MalformedParam { position: usize, reason: String },

    #[error("Empty '@import' at position {position}")]
    EmptyImport { position: usize },
}

/// Structural problems in a template body.
#[derive(Clone, Debug, Error, PartialEq, Eq, Serialize)]
pub enum ParseError {
    #[error("Unexpected '{directive}' at position {position}: {reason}")]
    UnexpectedDirective {
        directive: String,
        position: usize,
        reason: String,
    },

    #[error("Unclosed '{directive}' at position {opener}: expected '{expected_closer}'")]
    UnclosedTag {
        directive: String,
        opener: usize,
        expected_closer: String,
    },

    #[error("Unterminated {construct} at position {position}")]
    Unterminated { construct: String, position: usize },

    #[error("Missing condition in '{tag}' at position {position}")]
    MissingCondition { tag: String, position: usize },

    #[error("Missing iterator in '@for' at position {position}")]
    MissingIterator { position: usize },

    #[error("Empty {construct} at position {position}")]
    EmptyCode { construct: String, position: usize },

    #[error("Malformed call at position {position}: {reason}")]
    MalformedCall { position: usize, reason: String },

    #[error("Malformed '@section' at position {position}: {reason}")]
    MalformedSection { position: usize, reason: String },

    #[error("Duplicate section '{name}' at position {position}")]
    DuplicateSection { name: String, position: usize },

    #[error("Unexpected content at position {position}: only '@section' blocks may appear inside a '@layout' call")]
    ContentOutsideSection { position: usize },

    #[error("'@section' at position {position} must be inside a '@layout' call or a layout")]
    SectionOutsideLayout { position: usize },
}

#[derive(Clone, Debug, Error, PartialEq, Eq, Serialize)]
pub enum TemplateError {
    #[error(transparent)]
    Header(#[from] HeaderError),

    #[error(transparent)]
    Parse(#[from] ParseError),
}

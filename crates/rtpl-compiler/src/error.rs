use std::io;

use camino::Utf8PathBuf;
use rtpl_templates::HeaderError;
use rtpl_templates::ParseError;
use thiserror::Error;

use crate::names::Namespace;
use crate::unit::NameCollision;

#[derive(Debug, Error)]
pub enum CompileError {
    #[error("Template '{name}' not found")]
    NotFound { name: String },

    #[error("Malformed header in '{name}': {source}")]
    MalformedHeader { name: String, source: HeaderError },

    #[error("Invalid structure in '{name}': {source}")]
    Structure { name: String, source: ParseError },

    #[error("Unresolved {kind} '{name}' referenced from '{referrer}' at position {position}")]
    UnresolvedReference {
        kind: Namespace,
        name: String,
        referrer: String,
        position: usize,
    },

    #[error("'{existing}' and '{incoming}' both generate unit '{name}'")]
    NameCollision {
        name: String,
        existing: String,
        incoming: String,
    },

    #[error(transparent)]
    Build(#[from] BuildError),
}

impl From<NameCollision> for CompileError {
    fn from(collision: NameCollision) -> Self {
        CompileError::NameCollision {
            name: collision.name.to_string(),
            existing: collision.existing,
            incoming: collision.incoming,
        }
    }
}

/// Failures reported by a build backend or the source-tree emitter.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("I/O error at {path}: {source}")]
    Io { path: Utf8PathBuf, source: io::Error },

    #[error("Build rejected: {0}")]
    Rejected(String),

    #[error("No compiled unit named '{0}'")]
    MissingUnit(String),
}

impl BuildError {
    pub(crate) fn io(path: impl Into<Utf8PathBuf>, source: io::Error) -> Self {
        BuildError::Io {
            path: path.into(),
            source,
        }
    }
}

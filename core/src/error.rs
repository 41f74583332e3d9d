//! Error type shared by every stage of a map load.

use std::io;
use std::path::PathBuf;

/// Broad classification of a [`MapError`].
///
/// All four are fatal to the map load that raised them; the distinction only
/// exists so callers can word their diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// A stream or descriptor could not be found or opened.
    Io,
    /// Fewer bytes were available than a record requires.
    Truncation,
    /// A decoded value violates a structural invariant.
    Corruption,
    /// The rendering collaborator failed to create a mesh, texture or image.
    Resource,
}

#[derive(thiserror::Error, Debug)]
pub enum MapError {
    #[error("{what} \"{name}\" doesn't exist")]
    NotFound { what: &'static str, name: String },

    #[error("failed to open \"{}\": {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to read {stage} from \"{source_name}\": {source}")]
    Read {
        stage: &'static str,
        source_name: String,
        #[source]
        source: io::Error,
    },

    #[error("unexpected end of file in \"{source_name}\" while reading {stage} ({needed} bytes)")]
    Truncated {
        stage: &'static str,
        source_name: String,
        needed: usize,
    },

    #[error("corrupt {stage}: {detail}")]
    Corrupt { stage: &'static str, detail: String },

    #[error("unable to create {what}: {detail}")]
    Resource { what: String, detail: String },
}

impl MapError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            MapError::NotFound { .. } | MapError::Open { .. } | MapError::Read { .. } => {
                ErrorKind::Io
            }
            MapError::Truncated { .. } => ErrorKind::Truncation,
            MapError::Corrupt { .. } => ErrorKind::Corruption,
            MapError::Resource { .. } => ErrorKind::Resource,
        }
    }

    pub fn corrupt<T: ToString>(stage: &'static str, detail: T) -> Self {
        MapError::Corrupt {
            stage,
            detail: detail.to_string(),
        }
    }

    pub fn resource<W: ToString, T: ToString>(what: W, detail: T) -> Self {
        MapError::Resource {
            what: what.to_string(),
            detail: detail.to_string(),
        }
    }
}

pub type MapResult<T> = Result<T, MapError>;

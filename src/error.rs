use thiserror::Error;

/// Broad category of a [`FormatError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatErrorKind {
    Parse,
}

/// Malformed timecode text.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FormatError {
    #[error("timecode `{input}` must have 4 fields (HH:MM:SS:FF), found {found}")]
    FieldCount { input: String, found: usize },

    #[error("timecode field `{field}` in `{input}` is not a non-negative integer")]
    InvalidField { input: String, field: String },

    #[error("timecode `{input}` is too large")]
    OutOfRange { input: String },
}

impl FormatError {
    pub fn kind(&self) -> FormatErrorKind {
        match self {
            Self::FieldCount { .. } | Self::InvalidField { .. } | Self::OutOfRange { .. } => {
                FormatErrorKind::Parse
            }
        }
    }
}

/// Failure reading a storyboard snapshot handed in by a collaborator.
#[derive(Error, Debug)]
pub enum SnapshotError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid storyboard JSON: {0}")]
    Json(#[from] serde_json::Error),
}

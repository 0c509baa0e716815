use thiserror::Error;

/// Every failure the codec can report. Each entry point returns exactly one of these.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SchemError {
    /// Malformed tree structure, truncated buffer or broken compression stream
    #[error("corrupt data at byte {offset}: {reason}")]
    CorruptData { offset: u64, reason: String },

    /// No parser signature matched, or the declared version is not handled
    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),

    /// A tag had a different variant than the schema expects
    #[error("type mismatch at '{path}': expected {expected}, found {found}")]
    TypeMismatch {
        path: String,
        expected: &'static str,
        found: &'static str,
    },

    /// A required compound key is absent
    #[error("missing key '{path}'")]
    MissingKey { path: String },

    /// The palette does not fit in the selected packing width
    #[error("palette of {palette_len} entries does not fit in {bits} bits")]
    PaletteOverflow { palette_len: usize, bits: u8 },

    /// A present, well-typed value is out of range
    #[error("invalid value at '{path}': {reason}")]
    InvalidValue { path: String, reason: String },

    /// The underlying writer failed
    #[error("I/O error: {0}")]
    Io(String),
}

impl SchemError {
    pub fn corrupt(offset: u64, reason: impl Into<String>) -> Self {
        SchemError::CorruptData {
            offset,
            reason: reason.into(),
        }
    }

    pub fn unsupported(reason: impl Into<String>) -> Self {
        SchemError::UnsupportedFormat(reason.into())
    }

    pub fn missing(path: impl Into<String>) -> Self {
        SchemError::MissingKey { path: path.into() }
    }

    pub fn invalid(path: impl Into<String>, reason: impl Into<String>) -> Self {
        SchemError::InvalidValue {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Prefixes the tag path (or the corruption reason) with the enclosing section name.
    pub fn within(self, parent: &str) -> Self {
        match self {
            SchemError::TypeMismatch {
                path,
                expected,
                found,
            } => SchemError::TypeMismatch {
                path: join_path(parent, &path),
                expected,
                found,
            },
            SchemError::MissingKey { path } => SchemError::MissingKey {
                path: join_path(parent, &path),
            },
            SchemError::InvalidValue { path, reason } => SchemError::InvalidValue {
                path: join_path(parent, &path),
                reason,
            },
            SchemError::CorruptData { offset, reason } => SchemError::CorruptData {
                offset,
                reason: format!("{}: {}", parent, reason),
            },
            other => other,
        }
    }
}

fn join_path(parent: &str, path: &str) -> String {
    if path.is_empty() {
        parent.to_owned()
    } else if parent.is_empty() {
        path.to_owned()
    } else {
        format!("{}.{}", parent, path)
    }
}

impl From<std::io::Error> for SchemError {
    fn from(err: std::io::Error) -> Self {
        SchemError::Io(err.to_string())
    }
}

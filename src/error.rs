use serde::Serialize;
use std::path::PathBuf;

/// All errors that can occur while converting a scene into a Rojo project.
#[derive(Debug, thiserror::Error)]
pub enum ConvertError {
    #[error("{0}")]
    Format(String),

    #[error("Failed to parse scene XML: {0}")]
    Parse(#[from] quick_xml::Error),

    #[error("Malformed scene XML: {0}")]
    Malformed(String),

    #[error("Scene nests elements deeper than {limit} levels")]
    TooDeep { limit: usize },

    #[error("Scene contains no Item elements with a class and referent")]
    NoRoot,

    #[error("Property \"{name}\" has invalid {kind} value \"{value}\"")]
    InvalidProperty {
        name: String,
        kind: &'static str,
        value: String,
    },

    #[error("Filesystem error at {}: {source}", .path.display())]
    Filesystem {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Config error: {0}")]
    Config(#[from] serde_json::Error),

    #[error("{0}")]
    Custom(String),
}

impl ConvertError {
    /// Wraps an IO failure with the path it happened at.
    pub fn fs(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ConvertError::Filesystem {
            path: path.into(),
            source,
        }
    }
}

// UI layers transport errors as plain strings.
impl Serialize for ConvertError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ConvertError>;

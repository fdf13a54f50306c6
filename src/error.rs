use std::path::PathBuf;

/// Errors raised while fetching, decoding, aggregating or rendering issues.
#[derive(Debug, thiserror::Error)]
pub enum BurndownError {
    /// Aggregation was asked to work on zero issues
    #[error("no issues to aggregate")]
    EmptyInput,

    /// A record is missing a required field or carries an unparsable one
    #[error("issue #{id}: invalid `{field}`: {reason}")]
    MalformedRecord {
        id: u64,
        field: &'static str,
        reason: String,
    },

    /// The issue listing call failed
    #[error("request to {url} failed: {source}")]
    RemoteFetch {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// Required configuration is absent after merging file and overrides
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The JSON issue cache could not be read or written
    #[error("issue cache {path}: {source}")]
    Cache {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Opening, reading or writing a local file failed
    #[error("io error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The chart backend failed to draw or encode
    #[error("chart rendering failed: {0}")]
    Render(String),
}

impl BurndownError {
    pub fn malformed(id: u64, field: &'static str, reason: impl Into<String>) -> Self {
        Self::MalformedRecord {
            id,
            field,
            reason: reason.into(),
        }
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T, E = BurndownError> = std::result::Result<T, E>;

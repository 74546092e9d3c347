use thiserror::Error;

/// Errors produced by the tag and release lifecycle operations
#[derive(Error, Debug)]
pub enum ReleaseError {
    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Invalid regular expression '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("Invalid semantic version range '{range}': {reason}")]
    InvalidRange { range: String, reason: String },

    #[error("Tag '{tag}' is not a semantic version: {source}")]
    InvalidVersion {
        tag: String,
        #[source]
        source: semver::Error,
    },

    #[error("No release found for '{tag}' in {repo}")]
    NotFound { repo: String, tag: String },

    #[error("Tag '{tag}' already exists in {repo}")]
    Conflict { repo: String, tag: String },

    #[error("GitHub request failed ({context}): {message}")]
    Remote {
        context: String,
        status: Option<u16>,
        message: String,
    },
}

/// Convenience type alias for Results in tagwarden
pub type Result<T> = std::result::Result<T, ReleaseError>;

impl ReleaseError {
    /// Create a remote error with context
    pub fn remote(context: impl Into<String>, status: Option<u16>, message: impl Into<String>) -> Self {
        ReleaseError::Remote {
            context: context.into(),
            status,
            message: message.into(),
        }
    }

    /// The release or tag is absent on the remote side
    pub fn is_not_found(&self) -> bool {
        matches!(self, ReleaseError::NotFound { .. })
    }

    /// The service rejected a creation because the tag name is taken
    pub fn is_conflict(&self) -> bool {
        matches!(self, ReleaseError::Conflict { .. })
    }

    /// HTTP 422 that is not a recognised conflict
    pub fn is_unprocessable(&self) -> bool {
        matches!(self, ReleaseError::Remote { status: Some(422), .. })
    }

    /// HTTP status reported by the service, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            ReleaseError::Remote { status, .. } => *status,
            ReleaseError::NotFound { .. } => Some(404),
            ReleaseError::Conflict { .. } => Some(422),
            _ => None,
        }
    }
}

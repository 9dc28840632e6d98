use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Message produced by the database driver or shell, kept verbatim.
    #[error("{0}")]
    Driver(String),
    #[error("server did not report a version")]
    VersionUnavailable,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProvisionError {
    #[error("Unknown mongo version: {0}")]
    UnsupportedVersion(String),
    #[error("invalid credentials: {0}")]
    InvalidCredentials(&'static str),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ProvisionError {
    /// The raw version string when the run stopped on an unrecognized server.
    pub fn unsupported_version(&self) -> Option<&str> {
        match self {
            Self::UnsupportedVersion(version) => Some(version),
            _ => None,
        }
    }
}

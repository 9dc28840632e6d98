use serde::{Deserialize, Serialize};
use std::fmt;

/// Major and minor components of a MongoDB server version.
///
/// Only the first two dot-separated components take part in classification;
/// patch levels and pre-release suffixes are ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ServerVersion {
    pub major: u32,
    pub minor: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VersionParseError {
    #[error("missing major component")]
    MissingMajor,
    #[error("missing minor component")]
    MissingMinor,
    #[error("non-numeric {component} component: {value:?}")]
    NonNumeric {
        component: &'static str,
        value: String,
    },
}

impl ServerVersion {
    #[must_use]
    pub const fn new(major: u32, minor: u32) -> Self {
        Self { major, minor }
    }

    pub fn parse(raw: &str) -> Result<Self, VersionParseError> {
        let mut parts = raw.trim().splitn(3, '.');
        let major = match parts.next() {
            Some(value) if !value.is_empty() => parse_component("major", value)?,
            _ => return Err(VersionParseError::MissingMajor),
        };
        let minor = match parts.next() {
            Some(value) if !value.is_empty() => parse_component("minor", value)?,
            _ => return Err(VersionParseError::MissingMinor),
        };
        Ok(Self { major, minor })
    }
}

fn parse_component(component: &'static str, value: &str) -> Result<u32, VersionParseError> {
    // u32::from_str accepts a leading '+', which no server version carries.
    if !value.bytes().all(|byte| byte.is_ascii_digit()) {
        return Err(VersionParseError::NonNumeric {
            component,
            value: value.to_string(),
        });
    }
    value
        .parse::<u32>()
        .map_err(|_| VersionParseError::NonNumeric {
            component,
            value: value.to_string(),
        })
}

impl fmt::Display for ServerVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

/// Which user-creation sequence a server version needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VersionBucket {
    /// Two-argument `addUser`; the user implicitly gets read and write.
    LegacyReadWrite,
    /// `addUser` with a roles document.
    RolesNoCreateUser,
    /// `createUser` with a roles document.
    RolesWithCreateUser,
    /// `createUser` for an admin account first, then the application user.
    V3WithAdminBootstrap,
    Unknown,
}

impl VersionBucket {
    pub const ALL: [Self; 5] = [
        Self::LegacyReadWrite,
        Self::RolesNoCreateUser,
        Self::RolesWithCreateUser,
        Self::V3WithAdminBootstrap,
        Self::Unknown,
    ];

    /// Classifies a raw version string. Unparseable input lands in `Unknown`.
    pub fn classify(raw: &str) -> Self {
        match ServerVersion::parse(raw) {
            Ok(version) => Self::for_version(version),
            Err(err) => {
                tracing::debug!(event = "version_unparseable", version = raw, error = %err);
                Self::Unknown
            }
        }
    }

    pub const fn for_version(version: ServerVersion) -> Self {
        match (version.major, version.minor) {
            (0 | 1, _) | (2, 0..=2) => Self::LegacyReadWrite,
            (2, 3 | 4) => Self::RolesNoCreateUser,
            (2, _) => Self::RolesWithCreateUser,
            (3, _) => Self::V3WithAdminBootstrap,
            _ => Self::Unknown,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::LegacyReadWrite => "legacy_read_write",
            Self::RolesNoCreateUser => "roles_no_create_user",
            Self::RolesWithCreateUser => "roles_with_create_user",
            Self::V3WithAdminBootstrap => "v3_with_admin_bootstrap",
            Self::Unknown => "unknown",
        }
    }

    pub const fn is_supported(self) -> bool {
        !matches!(self, Self::Unknown)
    }
}

impl fmt::Display for VersionBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

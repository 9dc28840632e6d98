use std::fmt;

use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::ProvisionError;

/// Username and password of the account being provisioned.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct Credentials {
    username: String,
    password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Builds credentials and checks them in one step.
    pub fn validated(
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Result<Self, ProvisionError> {
        let creds = Self::new(username, password);
        creds.validate()?;
        Ok(creds)
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn password(&self) -> &str {
        &self.password
    }

    pub fn validate(&self) -> Result<(), ProvisionError> {
        validate_username(&self.username)?;
        validate_password(&self.password)
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"REDACTED")
            .finish()
    }
}

pub fn validate_username(username: &str) -> Result<(), ProvisionError> {
    if username.trim().is_empty() {
        return Err(ProvisionError::InvalidCredentials("username_empty"));
    }
    if username.chars().any(char::is_whitespace) {
        return Err(ProvisionError::InvalidCredentials("username_whitespace"));
    }
    // '$' would be read back as a placeholder by the script renderer.
    if username.contains('$') {
        return Err(ProvisionError::InvalidCredentials("username_dollar"));
    }
    Ok(())
}

pub fn validate_password(password: &str) -> Result<(), ProvisionError> {
    if password.is_empty() {
        return Err(ProvisionError::InvalidCredentials("password_empty"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_redacts_password() {
        let creds = Credentials::new("agent", "hunter2");
        let rendered = format!("{creds:?}");
        assert!(rendered.contains("agent"));
        assert!(!rendered.contains("hunter2"));
    }

    #[test]
    fn validation_rejects_bad_usernames() {
        for (username, reason) in [
            ("", "username_empty"),
            ("   ", "username_empty"),
            ("thermo stat", "username_whitespace"),
            ("$USERNAME", "username_dollar"),
        ] {
            let err = Credentials::validated(username, "secret").expect_err("invalid");
            assert!(
                matches!(err, ProvisionError::InvalidCredentials(r) if r == reason),
                "{username:?} -> {err:?}"
            );
        }
    }

    #[test]
    fn validation_rejects_empty_password() {
        let err = Credentials::validated("agent", "").expect_err("invalid");
        assert!(matches!(
            err,
            ProvisionError::InvalidCredentials("password_empty")
        ));
    }

    #[test]
    fn validation_accepts_plain_credentials() {
        let creds = Credentials::validated("thermostat-agent", "p@ss w0rd").expect("valid");
        assert_eq!(creds.username(), "thermostat-agent");
        assert_eq!(creds.password(), "p@ss w0rd");
    }
}

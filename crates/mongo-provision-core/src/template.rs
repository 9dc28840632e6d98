//! Shell-script rendering for operators who drive the `mongo` shell directly.

use crate::credentials::Credentials;
use crate::error::ProvisionError;

pub const USERNAME_PLACEHOLDER: &str = "$USERNAME";
pub const PASSWORD_PLACEHOLDER: &str = "$PASSWORD";

/// `create-user.js`, shipped with the binary.
pub const CREATE_USER_SCRIPT: &str = include_str!("../templates/create-user.js");

/// Substitutes every placeholder in `template`.
///
/// Values end up inside double-quoted JavaScript literals, so quotes,
/// backslashes and line breaks are refused rather than escaped.
pub fn render(template: &str, creds: &Credentials) -> Result<String, ProvisionError> {
    creds.validate()?;
    ensure_literal_safe(creds.username(), "username_not_literal_safe")?;
    ensure_literal_safe(creds.password(), "password_not_literal_safe")?;
    Ok(template
        .replace(USERNAME_PLACEHOLDER, creds.username())
        .replace(PASSWORD_PLACEHOLDER, creds.password()))
}

pub fn render_create_user_script(creds: &Credentials) -> Result<String, ProvisionError> {
    render(CREATE_USER_SCRIPT, creds)
}

fn ensure_literal_safe(value: &str, reason: &'static str) -> Result<(), ProvisionError> {
    if value.contains(['"', '\\', '\n', '\r']) {
        return Err(ProvisionError::InvalidCredentials(reason));
    }
    Ok(())
}

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::StoreError;

/// The logical database a user-management call applies to.
///
/// Obtained from [`UserStore::select_database`] and passed to every call
/// instead of being held as mutable state on the connection.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Namespace(String);

impl Namespace {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn name(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Older and newer names of the roles-document primitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoleApi {
    /// `addUser({user, pwd, roles})`, understood by 2.3 and 2.4.
    AddUser,
    /// `createUser({user, pwd, roles})`, 2.5 onwards.
    CreateUser,
}

impl RoleApi {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::AddUser => "addUser",
            Self::CreateUser => "createUser",
        }
    }
}

pub struct UserDocument<'a> {
    pub user: &'a str,
    pub pwd: &'a str,
    pub roles: &'a [&'a str],
}

impl fmt::Debug for UserDocument<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserDocument")
            .field("user", &self.user)
            .field("pwd", &"REDACTED")
            .field("roles", &self.roles)
            .finish()
    }
}

/// Connection to a database server that can manage users.
#[async_trait]
pub trait UserStore: Send + Sync {
    fn select_database(&self, name: &str) -> Namespace {
        Namespace::new(name)
    }

    async fn current_version_string(&self) -> Result<String, StoreError>;

    /// Two-argument creation; the server grants read and write implicitly.
    async fn create_user_legacy(
        &self,
        namespace: &Namespace,
        user: &str,
        pwd: &str,
    ) -> Result<(), StoreError>;

    async fn create_user_with_roles(
        &self,
        namespace: &Namespace,
        api: RoleApi,
        doc: &UserDocument<'_>,
    ) -> Result<(), StoreError>;

    /// Authenticates against `namespace`; later calls run as that user.
    async fn authenticate(
        &mut self,
        namespace: &Namespace,
        user: &str,
        pwd: &str,
    ) -> Result<bool, StoreError>;

    /// Runs once after the last step. Stores that queue calls send them here.
    async fn finish(&mut self) -> Result<(), StoreError> {
        Ok(())
    }
}

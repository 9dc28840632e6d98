use serde::Serialize;

use crate::constants::{roles, ADMIN_DATABASE, ADMIN_USERNAME, DEFAULT_TARGET_DATABASE};
use crate::credentials::{validate_username, Credentials};
use crate::error::ProvisionError;
use crate::store::{Namespace, RoleApi, UserDocument, UserStore};
use crate::version::VersionBucket;

/// Where the application user goes and which account bootstraps it on 3.x.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisionTarget {
    pub database: String,
    pub admin_database: String,
    pub admin_username: String,
}

impl Default for ProvisionTarget {
    fn default() -> Self {
        Self {
            database: DEFAULT_TARGET_DATABASE.to_string(),
            admin_database: ADMIN_DATABASE.to_string(),
            admin_username: ADMIN_USERNAME.to_string(),
        }
    }
}

impl ProvisionTarget {
    pub fn with_database(database: impl Into<String>) -> Self {
        Self {
            database: database.into(),
            ..Self::default()
        }
    }
}

/// One collaborator call. Steps never carry a password; the application
/// password is supplied when the plan runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum ProvisionStep {
    SelectDatabase {
        name: String,
    },
    AddUserLegacy {
        user: String,
    },
    CreateUserWithRoles {
        api: RoleApi,
        user: String,
        roles: Vec<&'static str>,
    },
    Authenticate {
        user: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProvisionPlan {
    pub version: String,
    pub bucket: VersionBucket,
    /// Namespace active before the first step.
    pub database: String,
    pub steps: Vec<ProvisionStep>,
}

impl ProvisionPlan {
    pub fn user_creation_count(&self) -> usize {
        self.steps
            .iter()
            .filter(|step| {
                matches!(
                    step,
                    ProvisionStep::AddUserLegacy { .. }
                        | ProvisionStep::CreateUserWithRoles { .. }
                )
            })
            .count()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreatedUser {
    pub namespace: Namespace,
    pub user: String,
    pub roles: Vec<&'static str>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProvisionReport {
    pub version: String,
    pub bucket: VersionBucket,
    pub users: Vec<CreatedUser>,
}

/// Computes the calls needed to create `username` on a server reporting `version`.
pub fn plan(
    version: &str,
    username: &str,
    target: &ProvisionTarget,
) -> Result<ProvisionPlan, ProvisionError> {
    validate_username(username)?;
    let bucket = VersionBucket::classify(version);
    let user = username.to_string();
    let steps = match bucket {
        VersionBucket::LegacyReadWrite => vec![ProvisionStep::AddUserLegacy { user }],
        VersionBucket::RolesNoCreateUser => vec![ProvisionStep::CreateUserWithRoles {
            api: RoleApi::AddUser,
            user,
            roles: vec![roles::READ_WRITE],
        }],
        VersionBucket::RolesWithCreateUser => vec![ProvisionStep::CreateUserWithRoles {
            api: RoleApi::CreateUser,
            user,
            roles: vec![roles::READ_WRITE],
        }],
        VersionBucket::V3WithAdminBootstrap => vec![
            ProvisionStep::SelectDatabase {
                name: target.admin_database.clone(),
            },
            ProvisionStep::CreateUserWithRoles {
                api: RoleApi::CreateUser,
                user: target.admin_username.clone(),
                roles: vec![roles::DB_OWNER, roles::USER_ADMIN_ANY_DATABASE],
            },
            ProvisionStep::Authenticate {
                user: target.admin_username.clone(),
            },
            ProvisionStep::SelectDatabase {
                name: target.database.clone(),
            },
            ProvisionStep::CreateUserWithRoles {
                api: RoleApi::CreateUser,
                user,
                roles: vec![roles::READ_WRITE],
            },
        ],
        VersionBucket::Unknown => {
            return Err(ProvisionError::UnsupportedVersion(version.to_string()));
        }
    };
    Ok(ProvisionPlan {
        version: version.to_string(),
        bucket,
        database: target.database.clone(),
        steps,
    })
}

/// Creates the application user with whatever API the server understands.
#[derive(Debug, Clone, Default)]
pub struct Provisioner {
    target: ProvisionTarget,
}

impl Provisioner {
    pub fn new(target: ProvisionTarget) -> Self {
        Self { target }
    }

    pub fn target(&self) -> &ProvisionTarget {
        &self.target
    }

    /// Asks the server for its version, then provisions.
    pub async fn provision<S>(
        &self,
        store: &mut S,
        creds: &Credentials,
    ) -> Result<ProvisionReport, ProvisionError>
    where
        S: UserStore + ?Sized,
    {
        creds.validate()?;
        let version = store.current_version_string().await?;
        self.provision_with_version(store, &version, creds).await
    }

    pub async fn provision_with_version<S>(
        &self,
        store: &mut S,
        version: &str,
        creds: &Credentials,
    ) -> Result<ProvisionReport, ProvisionError>
    where
        S: UserStore + ?Sized,
    {
        creds.validate()?;
        let plan = match plan(version, creds.username(), &self.target) {
            Ok(plan) => plan,
            Err(err) => {
                if let Some(version) = err.unsupported_version() {
                    tracing::error!(event = "version_unsupported", version);
                }
                return Err(err);
            }
        };
        tracing::info!(
            event = "provision_started",
            version = %plan.version,
            bucket = %plan.bucket,
            database = %plan.database,
            user = creds.username()
        );
        let users = execute(store, &plan, creds).await?;
        tracing::info!(
            event = "provision_completed",
            bucket = %plan.bucket,
            users_created = users.len()
        );
        Ok(ProvisionReport {
            version: plan.version,
            bucket: plan.bucket,
            users,
        })
    }
}

async fn execute<S>(
    store: &mut S,
    plan: &ProvisionPlan,
    creds: &Credentials,
) -> Result<Vec<CreatedUser>, ProvisionError>
where
    S: UserStore + ?Sized,
{
    let mut namespace = store.select_database(&plan.database);
    let mut created = Vec::with_capacity(plan.user_creation_count());
    for step in &plan.steps {
        match step {
            ProvisionStep::SelectDatabase { name } => {
                namespace = store.select_database(name);
                tracing::debug!(event = "namespace_selected", namespace = %namespace);
            }
            ProvisionStep::AddUserLegacy { user } => {
                store
                    .create_user_legacy(&namespace, user, creds.password())
                    .await?;
                tracing::debug!(
                    event = "user_created",
                    api = "addUser",
                    namespace = %namespace,
                    user = %user
                );
                created.push(CreatedUser {
                    namespace: namespace.clone(),
                    user: user.clone(),
                    roles: Vec::new(),
                });
            }
            ProvisionStep::CreateUserWithRoles { api, user, roles } => {
                let doc = UserDocument {
                    user,
                    pwd: creds.password(),
                    roles,
                };
                store.create_user_with_roles(&namespace, *api, &doc).await?;
                tracing::debug!(
                    event = "user_created",
                    api = api.as_str(),
                    namespace = %namespace,
                    user = %user,
                    roles = ?roles
                );
                created.push(CreatedUser {
                    namespace: namespace.clone(),
                    user: user.clone(),
                    roles: roles.clone(),
                });
            }
            ProvisionStep::Authenticate { user } => {
                let accepted = store
                    .authenticate(&namespace, user, creds.password())
                    .await?;
                if accepted {
                    tracing::debug!(
                        event = "authenticated",
                        namespace = %namespace,
                        user = %user
                    );
                } else {
                    tracing::warn!(
                        event = "authentication_rejected",
                        namespace = %namespace,
                        user = %user,
                        "continuing; the next call runs unauthenticated"
                    );
                }
            }
        }
    }
    store.finish().await?;
    Ok(created)
}

use async_trait::async_trait;
use mongodb::bson::{doc, Document};
use mongodb::error::ErrorKind;
use mongodb::options::{ClientOptions, Credential};
use mongodb::Client;

use mongo_provision_core::constants::ADMIN_DATABASE;
use mongo_provision_core::{Namespace, RoleApi, StoreError, UserDocument, UserStore};

const SYSTEM_USERS: &str = "system.users";
const AUTHENTICATION_FAILED: i32 = 18;

/// [`UserStore`] backed by the official driver.
///
/// The driver refuses servers older than MongoDB 4.4, so this store only
/// reaches deployments the shell backend cannot.
pub struct MongoUserStore {
    options: ClientOptions,
    client: Client,
}

impl MongoUserStore {
    pub async fn connect(url: &str, app_name: Option<&str>) -> Result<Self, StoreError> {
        let mut options = ClientOptions::parse(url).await.map_err(driver_error)?;
        options.app_name = Some(app_name.unwrap_or("mongo-provision").to_string());
        let client = Client::with_options(options.clone()).map_err(driver_error)?;
        tracing::debug!(event = "storage_client_created", hosts = ?options.hosts);
        Ok(Self { options, client })
    }

    async fn insert_privilege_document(
        &self,
        namespace: &Namespace,
        document: Document,
    ) -> Result<(), StoreError> {
        self.client
            .database(namespace.name())
            .collection::<Document>(SYSTEM_USERS)
            .insert_one(document)
            .await
            .map_err(driver_error)?;
        Ok(())
    }
}

#[async_trait]
impl UserStore for MongoUserStore {
    async fn current_version_string(&self) -> Result<String, StoreError> {
        let info = self
            .client
            .database(ADMIN_DATABASE)
            .run_command(doc! { "buildInfo": 1 })
            .await
            .map_err(driver_error)?;
        info.get_str("version")
            .map(str::to_string)
            .map_err(|_| StoreError::VersionUnavailable)
    }

    async fn create_user_legacy(
        &self,
        namespace: &Namespace,
        user: &str,
        pwd: &str,
    ) -> Result<(), StoreError> {
        self.insert_privilege_document(
            namespace,
            doc! {
                "user": user,
                "readOnly": false,
                "pwd": legacy_password_digest(user, pwd),
            },
        )
        .await
    }

    async fn create_user_with_roles(
        &self,
        namespace: &Namespace,
        api: RoleApi,
        document: &UserDocument<'_>,
    ) -> Result<(), StoreError> {
        match api {
            RoleApi::AddUser => {
                self.insert_privilege_document(
                    namespace,
                    doc! {
                        "user": document.user,
                        "pwd": legacy_password_digest(document.user, document.pwd),
                        "roles": document.roles,
                    },
                )
                .await
            }
            RoleApi::CreateUser => {
                self.client
                    .database(namespace.name())
                    .run_command(doc! {
                        "createUser": document.user,
                        "pwd": document.pwd,
                        "roles": document.roles,
                    })
                    .await
                    .map_err(driver_error)?;
                Ok(())
            }
        }
    }

    async fn authenticate(
        &mut self,
        namespace: &Namespace,
        user: &str,
        pwd: &str,
    ) -> Result<bool, StoreError> {
        let mut options = self.options.clone();
        options.credential = Some(
            Credential::builder()
                .username(user.to_string())
                .password(pwd.to_string())
                .source(namespace.name().to_string())
                .build(),
        );
        let client = Client::with_options(options.clone()).map_err(driver_error)?;
        match client
            .database(namespace.name())
            .run_command(doc! { "ping": 1 })
            .await
        {
            Ok(_) => {
                self.options = options;
                self.client = client;
                Ok(true)
            }
            Err(err) if is_authentication_failure(&err) => {
                tracing::debug!(
                    event = "authentication_failed",
                    namespace = %namespace,
                    error = %err
                );
                Ok(false)
            }
            Err(err) => Err(driver_error(err)),
        }
    }
}

/// Digest stored by the pre-2.6 `addUser` helper: `md5("<user>:mongo:<pwd>")`.
pub(crate) fn legacy_password_digest(user: &str, pwd: &str) -> String {
    format!("{:x}", md5::compute(format!("{user}:mongo:{pwd}")))
}

fn is_authentication_failure(err: &mongodb::error::Error) -> bool {
    match err.kind.as_ref() {
        ErrorKind::Authentication { .. } => true,
        ErrorKind::Command(command) => command.code == AUTHENTICATION_FAILED,
        _ => false,
    }
}

fn driver_error(err: mongodb::error::Error) -> StoreError {
    StoreError::Driver(err.to_string())
}

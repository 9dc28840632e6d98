/// Namespace the application user is created in unless configured otherwise.
pub const DEFAULT_TARGET_DATABASE: &str = "thermostat";

pub const ADMIN_DATABASE: &str = "admin";

/// Bootstrap account created on 3.x servers before the application user.
pub const ADMIN_USERNAME: &str = "thermostat-admin";

pub mod roles {
    pub const READ_WRITE: &str = "readWrite";
    pub const DB_OWNER: &str = "dbOwner";
    pub const USER_ADMIN_ANY_DATABASE: &str = "userAdminAnyDatabase";
}

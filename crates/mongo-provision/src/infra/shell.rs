use std::io::ErrorKind;
use std::process::Stdio;
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use zeroize::{Zeroize, Zeroizing};

use mongo_provision_core::{Namespace, RoleApi, StoreError, UserDocument, UserStore};

/// [`UserStore`] that drives the `mongo` shell.
///
/// User-management calls are queued as shell statements and piped into one
/// shell session by [`UserStore::finish`], so an authentication made by an
/// earlier statement still applies to the later ones. Credentials only ever
/// travel over stdin.
pub struct MongoShellStore {
    program: String,
    address: String,
    statements: Mutex<Zeroizing<String>>,
}

impl MongoShellStore {
    pub fn new(program: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            address: address.into(),
            statements: Mutex::new(Zeroizing::new(String::new())),
        }
    }

    /// Builds a store for `url`, connecting the shell to `database`.
    pub fn for_url(program: impl Into<String>, url: &str, database: &str) -> Self {
        Self::new(program, shell_address(url, database))
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    fn queue(&self, statement: &str) {
        let mut statements = self
            .statements
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        statements.push_str("    ");
        statements.push_str(statement);
        statements.push('\n');
    }

    fn take_script(&self) -> Option<Zeroizing<String>> {
        let mut statements = self
            .statements
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if statements.is_empty() {
            return None;
        }
        let script = Zeroizing::new(format!(
            concat!(
                "try {{\n{}}} catch (e) {{\n",
                "    print(\"mongo-provision: \" + e);\n",
                "    quit(1);\n",
                "}}\n"
            ),
            statements.as_str()
        ));
        statements.zeroize();
        Some(script)
    }

    async fn run(&self, args: &[&str], stdin: Option<&str>) -> Result<String, StoreError> {
        let mut cmd = Command::new(&self.program);
        cmd.arg("--quiet")
            .arg(&self.address)
            .args(args)
            .stdin(if stdin.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        tracing::debug!(
            event = "shell_started",
            program = %self.program,
            address = %self.address,
            args = ?args
        );

        let mut child = cmd.spawn().map_err(|err| {
            if err.kind() == ErrorKind::NotFound {
                StoreError::Driver(format!("{} not found in PATH", self.program))
            } else {
                StoreError::Driver(format!("{} failed to start: {err}", self.program))
            }
        })?;
        if let (Some(input), Some(mut pipe)) = (stdin, child.stdin.take()) {
            pipe.write_all(input.as_bytes())
                .await
                .map_err(|err| StoreError::Driver(format!("shell stdin write failed: {err}")))?;
            // Closing stdin ends the shell session.
            drop(pipe);
        }
        let output = child
            .wait_with_output()
            .await
            .map_err(|err| StoreError::Driver(format!("shell wait failed: {err}")))?;

        let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if output.status.success() {
            return Ok(stdout);
        }
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        let message = match (stderr.is_empty(), stdout.is_empty()) {
            (false, _) => stderr,
            (true, false) => stdout,
            (true, true) => format!("{} exited with {}", self.program, output.status),
        };
        Err(StoreError::Driver(message))
    }
}

#[async_trait]
impl UserStore for MongoShellStore {
    async fn current_version_string(&self) -> Result<String, StoreError> {
        let stdout = self.run(&["--eval", "print(db.version())"], None).await?;
        stdout
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .last()
            .map(str::to_string)
            .ok_or(StoreError::VersionUnavailable)
    }

    async fn create_user_legacy(
        &self,
        namespace: &Namespace,
        user: &str,
        pwd: &str,
    ) -> Result<(), StoreError> {
        self.queue(&format!(
            "{}.addUser({}, {});",
            sibling_db(namespace),
            js_string(user),
            js_string(pwd)
        ));
        Ok(())
    }

    async fn create_user_with_roles(
        &self,
        namespace: &Namespace,
        api: RoleApi,
        document: &UserDocument<'_>,
    ) -> Result<(), StoreError> {
        let roles: Vec<String> = document.roles.iter().map(|role| js_string(role)).collect();
        self.queue(&format!(
            "{}.{}({{ user: {}, pwd: {}, roles: [ {} ] }});",
            sibling_db(namespace),
            api.as_str(),
            js_string(document.user),
            js_string(document.pwd),
            roles.join(", ")
        ));
        Ok(())
    }

    /// Queued like the other calls; a rejected login is printed by the shell
    /// and the session carries on.
    async fn authenticate(
        &mut self,
        namespace: &Namespace,
        user: &str,
        pwd: &str,
    ) -> Result<bool, StoreError> {
        let user = js_string(user);
        self.queue(&format!(
            "if (!{}.auth({user}, {})) {{ print(\"authentication rejected for \" + {user}); }}",
            sibling_db(namespace),
            js_string(pwd)
        ));
        Ok(true)
    }

    async fn finish(&mut self) -> Result<(), StoreError> {
        let Some(script) = self.take_script() else {
            return Ok(());
        };
        let stdout = self.run(&[], Some(script.as_str())).await?;
        tracing::debug!(event = "shell_finished", address = %self.address, output = %stdout);
        Ok(())
    }
}

/// Shell connection string: `host:port/database`, credentials dropped.
///
/// SRV URLs are passed through because only URI-aware shells can use them.
pub(crate) fn shell_address(url: &str, database: &str) -> String {
    let url = url.trim();
    let Some(rest) = url.strip_prefix("mongodb://") else {
        return url.to_string();
    };
    let authority = rest.split(['/', '?']).next().unwrap_or_default();
    let hosts = authority
        .rsplit_once('@')
        .map_or(authority, |(_, hosts)| hosts);
    format!("{hosts}/{database}")
}

fn sibling_db(namespace: &Namespace) -> String {
    format!("db.getSiblingDB({})", js_string(namespace.name()))
}

/// Quoted JavaScript string literal.
fn js_string(value: &str) -> String {
    serde_json::Value::String(value.to_string()).to_string()
}

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::Local;

pub const PROGRAM_NAME: &str = "mongo-provision";
pub const USER_DONE_STAMP: &str = "mongodb-user-done.stamp";
pub const SETUP_COMPLETE_STAMP: &str = "setup-complete.stamp";

const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S %Z";

/// Marker files in the data directory recording how far setup got.
#[derive(Debug, Clone)]
pub struct StampFiles {
    data_dir: PathBuf,
}

impl StampFiles {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    pub fn user_done_path(&self) -> PathBuf {
        self.data_dir.join(USER_DONE_STAMP)
    }

    pub fn setup_complete_path(&self) -> PathBuf {
        self.data_dir.join(SETUP_COMPLETE_STAMP)
    }

    pub fn user_done_exists(&self) -> bool {
        self.user_done_path().exists()
    }

    pub fn create_user_done(&self) -> io::Result<()> {
        self.write(&self.user_done_path(), "")
    }

    /// Marks setup as in progress so other tools see storage as unlocked.
    pub fn unlock(&self) -> io::Result<()> {
        let content = format!(
            "Temporarily unlocked thermostat via '{PROGRAM_NAME}' on {}\n",
            now()
        );
        self.write(&self.setup_complete_path(), &content)
    }

    pub fn complete(&self) -> io::Result<()> {
        let content = format!("Created by '{PROGRAM_NAME}' on {}\n", now());
        self.write(&self.setup_complete_path(), &content)
    }

    /// Removes both stamps after a failed run. Missing files are fine.
    pub fn clear(&self) -> io::Result<()> {
        let setup_complete = remove_if_exists(&self.setup_complete_path());
        let user_done = remove_if_exists(&self.user_done_path());
        setup_complete.and(user_done)
    }

    fn write(&self, path: &Path, content: &str) -> io::Result<()> {
        fs::create_dir_all(&self.data_dir)?;
        fs::write(path, content)
    }
}

fn remove_if_exists(path: &Path) -> io::Result<()> {
    match fs::remove_file(path) {
        Err(err) if err.kind() != io::ErrorKind::NotFound => Err(err),
        _ => Ok(()),
    }
}

fn now() -> String {
    Local::now().format(DATE_FORMAT).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lifecycle_creates_and_clears_stamps() {
        let dir = tempfile::tempdir().expect("tempdir");
        let stamps = StampFiles::new(dir.path().join("data"));
        assert!(!stamps.user_done_exists());

        stamps.unlock().expect("unlock");
        let unlocked = fs::read_to_string(stamps.setup_complete_path()).expect("read");
        assert!(unlocked.starts_with("Temporarily unlocked thermostat via 'mongo-provision' on "));

        stamps.create_user_done().expect("user done");
        stamps.complete().expect("complete");
        assert!(stamps.user_done_exists());
        let complete = fs::read_to_string(stamps.setup_complete_path()).expect("read");
        assert!(complete.starts_with("Created by 'mongo-provision' on "));

        stamps.clear().expect("clear");
        assert!(!stamps.user_done_exists());
        assert!(!stamps.setup_complete_path().exists());
    }

    #[test]
    fn clear_tolerates_missing_files() {
        let dir = tempfile::tempdir().expect("tempdir");
        let stamps = StampFiles::new(dir.path());
        stamps.clear().expect("clear");
    }
}

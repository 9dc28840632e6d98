pub mod credentials_file;
pub mod mongo;
pub mod shell;
pub mod stamps;

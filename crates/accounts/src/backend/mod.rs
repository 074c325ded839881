//! Backend abstraction for account database operations.
//!
//! The [`Backend`] trait defines the interface for reading and changing OS
//! accounts, allowing for different implementations (real commands, an
//! in-memory fake for testing).

pub mod cli;

use crate::error::Result;
use crate::types::{Account, AccountSpec};

/// Backend trait for account operations.
pub trait Backend {
    /// Look up an account by name; `None` if it does not exist.
    fn lookup(&self, username: &str) -> Result<Option<Account>>;

    /// All groups the user belongs to, primary group included.
    fn groups(&self, username: &str) -> Result<Vec<String>>;

    /// Every account in the passwd database.
    fn list(&self) -> Result<Vec<Account>>;

    /// Resolve a numeric group id to its name.
    fn group_name(&self, gid: u32) -> Result<Option<String>>;

    /// Create an account.
    fn create(&self, username: &str, spec: &AccountSpec) -> Result<()>;

    /// Modify an existing account. Returns `false` if there was nothing to do.
    fn modify(&self, username: &str, spec: &AccountSpec) -> Result<bool>;

    /// Delete an account.
    fn delete(&self, username: &str) -> Result<()>;

    /// Set the account password. Implementations must never log `password`.
    fn set_password(&self, username: &str, password: &str) -> Result<()>;
}

/// Get the default backend (shadow-utils commands).
pub fn default_backend() -> cli::CommandBackend {
    cli::CommandBackend::new()
}

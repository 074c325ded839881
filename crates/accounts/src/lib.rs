//! # Accounts
//!
//! Linux account database access for the user resource provider.
//!
//! Reads go through `id` and `getent`, changes through `adduser`, `usermod`,
//! `userdel` and `chpasswd`. The [`Backend`] trait lets callers substitute an
//! in-memory implementation in tests.

pub mod backend;
pub mod error;
pub mod types;

pub use backend::{Backend, cli::CommandBackend, default_backend};
pub use error::{Error, MASK, Result, redact};
pub use types::{Account, AccountSpec, Group, memberships, validate_username};

//! Error types for account operations.
//!
//! Command failures carry the captured stderr so callers can surface it.
//! Any secret that was passed to a command is masked before the error is
//! constructed; see [`redact`].

use thiserror::Error;

/// Placeholder that replaces secrets in messages
pub const MASK: &str = "********";

/// Errors that can occur during account operations.
#[derive(Debug, Error)]
pub enum Error {
    /// The command could not be spawned at all
    #[error("failed to execute {command}: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// The command ran and exited unsuccessfully
    #[error("{command} failed (exit code {code}): {stderr}")]
    CommandFailed {
        command: String,
        code: i32,
        stderr: String,
    },

    /// A numeric group id has no entry in the group database
    #[error("group ID {0} does not exist")]
    GroupNotFound(u32),

    /// Username is empty or contains characters the tools reject
    #[error("invalid username '{0}'")]
    InvalidUsername(String),
}

impl Error {
    /// Captured stderr of a failed command, if any
    pub fn stderr(&self) -> Option<&str> {
        match self {
            Self::CommandFailed { stderr, .. } => Some(stderr),
            _ => None,
        }
    }

    /// Mask `secret` everywhere in the error text
    pub fn redacted(self, secret: &str) -> Self {
        match self {
            Self::CommandFailed {
                command,
                code,
                stderr,
            } => Self::CommandFailed {
                command,
                code,
                stderr: redact(&stderr, secret),
            },
            other => other,
        }
    }
}

/// Replace every occurrence of `secret` in `text` with [`MASK`]
pub fn redact(text: &str, secret: &str) -> String {
    if secret.is_empty() {
        return text.to_string();
    }
    text.replace(secret, MASK)
}

/// Result type for account operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redact_masks_every_occurrence() {
        assert_eq!(
            redact("bad password hunter2 for hunter2", "hunter2"),
            "bad password ******** for ********"
        );
    }

    #[test]
    fn test_redact_empty_secret_is_identity() {
        assert_eq!(redact("nothing to hide", ""), "nothing to hide");
    }

    #[test]
    fn test_redacted_command_failure() {
        let err = Error::CommandFailed {
            command: "chpasswd".into(),
            code: 1,
            stderr: "chpasswd: line 1: alice:s3cret rejected".into(),
        }
        .redacted("s3cret");
        assert!(!err.to_string().contains("s3cret"));
        assert_eq!(err.stderr(), Some("chpasswd: line 1: alice:******** rejected"));
    }
}

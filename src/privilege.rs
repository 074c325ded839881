//! Root privilege check for account changes
//!
//! Reads never need root. `set` and `delete` on users refuse to start
//! without it rather than fail halfway through a multi-step change.

use anyhow::{Result, bail};

/// Whether the process runs with effective uid 0
#[cfg(unix)]
pub fn is_root() -> bool {
    // SAFETY: geteuid has no preconditions and cannot fail
    unsafe { libc::geteuid() == 0 }
}

#[cfg(not(unix))]
pub fn is_root() -> bool {
    false
}

/// Fail unless running as root
pub fn require_root(operation: &str) -> Result<()> {
    if !is_root() {
        bail!("'{operation}' requires root privileges; re-run with sudo");
    }
    log::debug!(target: "user", "Running as root");
    Ok(())
}

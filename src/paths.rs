//! Settings file path resolution
//!
//! Each scope maps to one `config.json` inside a `tstoy` directory.
//!
//! # Environment Variables
//!
//! - `TSTOY_MACHINE_CONFIG_DIR` - Override the machine-scope directory
//! - `TSTOY_USER_CONFIG_DIR` - Override the user-scope directory
//!
//! # Path Resolution Priority
//!
//! For the machine scope:
//! 1. `TSTOY_MACHINE_CONFIG_DIR`
//! 2. Platform default:
//!    - Windows: `%PROGRAMDATA%\tstoy`
//!    - macOS/Linux: `/etc/tstoy`
//!
//! For the user scope:
//! 1. `TSTOY_USER_CONFIG_DIR`
//! 2. `XDG_CONFIG_HOME/tstoy` (if set)
//! 3. Platform default:
//!    - Windows: `%APPDATA%\tstoy`
//!    - macOS/Linux: `~/.config/tstoy`

use anyhow::{Context, Result};
use std::path::PathBuf;

use crate::resource::settings::Scope;

/// Environment variable for machine config directory override
pub const ENV_MACHINE_CONFIG_DIR: &str = "TSTOY_MACHINE_CONFIG_DIR";

/// Environment variable for user config directory override
pub const ENV_USER_CONFIG_DIR: &str = "TSTOY_USER_CONFIG_DIR";

/// Application directory name under the platform config root
pub const APP_DIR: &str = "tstoy";

/// Settings file name inside the application directory
pub const CONFIG_FILE: &str = "config.json";

/// Full path of the settings file for a scope
pub fn config_file(scope: Scope) -> Result<PathBuf> {
    let dir = match scope {
        Scope::Machine => machine_config_dir()?,
        Scope::User => user_config_dir()?,
    };
    Ok(dir.join(CONFIG_FILE))
}

/// Get the machine-wide tstoy config directory
pub fn machine_config_dir() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var(ENV_MACHINE_CONFIG_DIR) {
        let path = expand(&dir);
        log::debug!(
            target: "settings",
            "Using machine config dir from {}: {}",
            ENV_MACHINE_CONFIG_DIR,
            path.display()
        );
        return Ok(path);
    }

    #[cfg(windows)]
    {
        let program_data =
            std::env::var("PROGRAMDATA").unwrap_or_else(|_| "C:\\ProgramData".to_string());
        return Ok(PathBuf::from(program_data).join(APP_DIR));
    }

    #[cfg(not(windows))]
    Ok(PathBuf::from("/etc").join(APP_DIR))
}

/// Get the per-user tstoy config directory
pub fn user_config_dir() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var(ENV_USER_CONFIG_DIR) {
        let path = expand(&dir);
        log::debug!(
            target: "settings",
            "Using user config dir from {}: {}",
            ENV_USER_CONFIG_DIR,
            path.display()
        );
        return Ok(path);
    }

    if let Ok(xdg_config) = std::env::var("XDG_CONFIG_HOME")
        && !xdg_config.is_empty()
    {
        return Ok(PathBuf::from(xdg_config).join(APP_DIR));
    }

    #[cfg(windows)]
    {
        if let Some(app_data) = dirs::config_dir() {
            return Ok(app_data.join(APP_DIR));
        }
    }

    let home = dirs::home_dir().context("Could not determine home directory")?;
    Ok(home.join(".config").join(APP_DIR))
}

/// Expand ~ and environment variables in a path string.
pub fn expand(path: &str) -> PathBuf {
    let expanded = shellexpand::full(path).unwrap_or(std::borrow::Cow::Borrowed(path));
    PathBuf::from(expanded.as_ref())
}

// ============================================================================
// Tests
// ============================================================================

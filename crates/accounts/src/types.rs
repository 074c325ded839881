//! Account types and parsers for the passwd/group databases.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// An entry from the passwd database
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub username: String,
    pub uid: u32,
    pub gid: u32,
    pub gecos: String,
    pub home: String,
    pub shell: String,
}

impl Account {
    /// Parse one `name:passwd:uid:gid:gecos:home:shell` line
    pub fn from_passwd_line(line: &str) -> Option<Self> {
        let fields: Vec<&str> = line.trim_end_matches(['\n', '\r']).split(':').collect();
        if fields.len() != 7 || fields[0].is_empty() {
            return None;
        }

        Some(Self {
            username: fields[0].to_string(),
            uid: fields[2].parse().ok()?,
            gid: fields[3].parse().ok()?,
            gecos: fields[4].to_string(),
            home: fields[5].to_string(),
            shell: fields[6].to_string(),
        })
    }
}

/// Parse a whole passwd database, skipping malformed lines
pub fn parse_passwd(content: &str) -> Vec<Account> {
    content
        .lines()
        .filter(|line| !line.trim().is_empty() && !line.starts_with('#'))
        .filter_map(Account::from_passwd_line)
        .collect()
}

/// An entry from the group database
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Group {
    pub name: String,
    pub gid: u32,
    pub members: Vec<String>,
}

impl Group {
    /// Parse one `name:passwd:gid:member,member` line
    pub fn from_group_line(line: &str) -> Option<Self> {
        let fields: Vec<&str> = line.trim_end_matches(['\n', '\r']).split(':').collect();
        if fields.len() != 4 || fields[0].is_empty() {
            return None;
        }

        Some(Self {
            name: fields[0].to_string(),
            gid: fields[2].parse().ok()?,
            members: fields[3]
                .split(',')
                .map(str::trim)
                .filter(|m| !m.is_empty())
                .map(str::to_string)
                .collect(),
        })
    }
}

/// Group names a user belongs to, derived from the group database
///
/// The primary group is always included, even when the group file does not
/// list the user as a member of it.
pub fn memberships(groups: &[Group], username: &str, primary_gid: u32) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();

    if let Some(primary) = groups.iter().find(|g| g.gid == primary_gid) {
        names.push(primary.name.clone());
    }

    for group in groups {
        if group.members.iter().any(|m| m == username) && !names.contains(&group.name) {
            names.push(group.name.clone());
        }
    }

    names
}

/// Parse the output of `id -Gn <user>`
pub fn parse_group_names(output: &str) -> Vec<String> {
    output.split_whitespace().map(str::to_string).collect()
}

/// Account properties to set on create or modify
///
/// `None` leaves the property to the system default (create) or unchanged
/// (modify).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccountSpec {
    pub uid: Option<u32>,
    pub gid: Option<u32>,
    pub home: Option<String>,
    pub shell: Option<String>,
}

impl AccountSpec {
    pub fn is_empty(&self) -> bool {
        self.uid.is_none() && self.gid.is_none() && self.home.is_none() && self.shell.is_none()
    }
}

/// Reject names that the account tools would misparse
pub fn validate_username(username: &str) -> Result<()> {
    let invalid = username.is_empty()
        || username.starts_with('-')
        || username
            .chars()
            .any(|c| c == ':' || c == ',' || c.is_whitespace() || c.is_control());

    if invalid {
        return Err(Error::InvalidUsername(username.to_string()));
    }
    Ok(())
}

/// Arguments for `adduser` creating `username`
///
/// `group` is the name of the primary group resolved from `spec.gid`.
pub fn adduser_args(username: &str, spec: &AccountSpec, group: Option<&str>) -> Vec<String> {
    let mut args = vec![
        "--quiet".to_string(),
        "--disabled-password".to_string(),
        "--gecos".to_string(),
        String::new(),
    ];

    if let Some(home) = spec.home.as_deref().filter(|h| !h.is_empty()) {
        args.extend(["--home".to_string(), home.to_string()]);
    }
    if let Some(shell) = spec.shell.as_deref().filter(|s| !s.is_empty()) {
        args.extend(["--shell".to_string(), shell.to_string()]);
    }
    if let Some(uid) = spec.uid {
        args.extend(["--uid".to_string(), uid.to_string()]);
    }
    if let Some(group) = group {
        args.extend(["--ingroup".to_string(), group.to_string()]);
    }

    args.push(username.to_string());
    args
}

/// Arguments for `usermod` updating `username`, or `None` if nothing changes
pub fn usermod_args(username: &str, spec: &AccountSpec) -> Option<Vec<String>> {
    let mut args = Vec::new();

    if let Some(uid) = spec.uid {
        args.extend(["-u".to_string(), uid.to_string()]);
    }
    if let Some(gid) = spec.gid {
        args.extend(["-g".to_string(), gid.to_string()]);
    }
    if let Some(home) = spec.home.as_deref().filter(|h| !h.is_empty()) {
        args.extend(["-d".to_string(), home.to_string(), "-m".to_string()]);
    }
    if let Some(shell) = spec.shell.as_deref().filter(|s| !s.is_empty()) {
        args.extend(["-s".to_string(), shell.to_string()]);
    }

    if args.is_empty() {
        return None;
    }

    args.push(username.to_string());
    Some(args)
}

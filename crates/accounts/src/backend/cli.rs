//! Backend that drives the standard account commands.
//!
//! Lookups go through `getent` and `id -Gn`; changes through `adduser`,
//! `usermod`, `userdel` and `chpasswd`. Every command runs with stdin
//! redirected from `/dev/null` unless input is piped to it, so a tool that
//! unexpectedly prompts fails instead of hanging.

use crate::backend::Backend;
use crate::error::{Error, Result, redact};
use crate::types::{
    Account, AccountSpec, Group, adduser_args, memberships, parse_group_names, parse_passwd,
    usermod_args, validate_username,
};
use std::io::Write;
use std::process::{Command, Output, Stdio};

/// Backend that executes real account commands.
#[derive(Debug, Clone)]
pub struct CommandBackend {
    adduser: String,
    usermod: String,
    userdel: String,
    chpasswd: String,
}

impl Default for CommandBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandBackend {
    pub fn new() -> Self {
        Self {
            adduser: "adduser".to_string(),
            usermod: "usermod".to_string(),
            userdel: "userdel".to_string(),
            chpasswd: "chpasswd".to_string(),
        }
    }

    /// Run a command with stdin from `/dev/null` and capture its output.
    fn run(&self, program: &str, args: &[String]) -> Result<Output> {
        log::trace!(target: "accounts", "Running {} {}", program, args.join(" "));
        Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .output()
            .map_err(|source| Error::Spawn {
                command: program.to_string(),
                source,
            })
    }

    /// Run a command and fail on non-zero exit.
    fn run_checked(&self, program: &str, args: &[String]) -> Result<String> {
        let output = self.run(program, args)?;
        check(program, &output)?;
        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }

    /// Run a command feeding `input` on stdin.
    fn run_with_input(&self, program: &str, input: &str) -> Result<Output> {
        let mut child = Command::new(program)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| Error::Spawn {
                command: program.to_string(),
                source,
            })?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(input.as_bytes())
                .map_err(|source| Error::Spawn {
                    command: program.to_string(),
                    source,
                })?;
        }

        child.wait_with_output().map_err(|source| Error::Spawn {
            command: program.to_string(),
            source,
        })
    }

    fn group_database(&self) -> Result<Vec<Group>> {
        let stdout = self.run_checked("getent", &["group".to_string()])?;
        Ok(stdout.lines().filter_map(Group::from_group_line).collect())
    }
}

/// `getent` exit status for a key that is not in the database
const GETENT_NOT_FOUND: i32 = 2;

fn is_numeric(name: &str) -> bool {
    !name.is_empty() && name.chars().all(|c| c.is_ascii_digit())
}

/// The entry named exactly `username`, ignoring entries matched by uid
fn find_account(passwd: &str, username: &str) -> Option<Account> {
    find_account_in(parse_passwd(passwd), username)
}

fn find_account_in(accounts: Vec<Account>, username: &str) -> Option<Account> {
    accounts.into_iter().find(|a| a.username == username)
}

fn check(program: &str, output: &Output) -> Result<()> {
    if output.status.success() {
        return Ok(());
    }
    Err(Error::CommandFailed {
        command: program.to_string(),
        code: output.status.code().unwrap_or(-1),
        stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
    })
}

impl Backend for CommandBackend {
    fn lookup(&self, username: &str) -> Result<Option<Account>> {
        validate_username(username)?;

        let output = self.run("getent", &["passwd".to_string(), username.to_string()])?;
        if output.status.code() == Some(GETENT_NOT_FOUND) {
            log::debug!(target: "accounts", username = username; "User not found");
            return Ok(None);
        }
        check("getent passwd", &output)?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        if let Some(account) = find_account(&stdout, username) {
            return Ok(Some(account));
        }

        // getent resolves an all-digit key as a uid
        if is_numeric(username) {
            log::debug!(
                target: "accounts",
                username = username;
                "Numeric name matched by uid, scanning the passwd database"
            );
            return Ok(find_account_in(self.list()?, username));
        }

        log::debug!(target: "accounts", username = username; "User not found");
        Ok(None)
    }

    fn groups(&self, username: &str) -> Result<Vec<String>> {
        validate_username(username)?;

        // id would also resolve an all-digit name as a uid
        if !is_numeric(username) {
            let output = self.run("id", &["-Gn".to_string(), username.to_string()])?;
            if output.status.success() {
                return Ok(parse_group_names(&String::from_utf8_lossy(&output.stdout)));
            }
        }

        log::debug!(
            target: "accounts",
            username = username;
            "Reading memberships from the group database"
        );
        let primary = self
            .lookup(username)?
            .map(|a| a.gid)
            .ok_or_else(|| Error::InvalidUsername(username.to_string()))?;
        Ok(memberships(&self.group_database()?, username, primary))
    }

    fn list(&self) -> Result<Vec<Account>> {
        let stdout = self.run_checked("getent", &["passwd".to_string()])?;
        Ok(parse_passwd(&stdout))
    }

    fn group_name(&self, gid: u32) -> Result<Option<String>> {
        let output = self.run("getent", &["group".to_string(), gid.to_string()])?;
        if !output.status.success() {
            return Ok(None);
        }
        Ok(String::from_utf8_lossy(&output.stdout)
            .lines()
            .find_map(Group::from_group_line)
            .map(|g| g.name))
    }

    fn create(&self, username: &str, spec: &AccountSpec) -> Result<()> {
        validate_username(username)?;

        let group = match spec.gid {
            Some(gid) => Some(self.group_name(gid)?.ok_or(Error::GroupNotFound(gid))?),
            None => None,
        };

        log::info!(target: "accounts", username = username, command = "adduser"; "Creating user");
        self.run_checked(&self.adduser, &adduser_args(username, spec, group.as_deref()))?;
        Ok(())
    }

    fn modify(&self, username: &str, spec: &AccountSpec) -> Result<bool> {
        validate_username(username)?;

        let Some(args) = usermod_args(username, spec) else {
            log::debug!(target: "accounts", username = username; "No changes specified for user");
            return Ok(false);
        };

        log::info!(target: "accounts", username = username, command = "usermod"; "Updating user");
        self.run_checked(&self.usermod, &args)?;
        Ok(true)
    }

    fn delete(&self, username: &str) -> Result<()> {
        validate_username(username)?;

        log::info!(target: "accounts", username = username, command = "userdel"; "Deleting user");
        self.run_checked(&self.userdel, &[username.to_string()])?;
        Ok(())
    }

    fn set_password(&self, username: &str, password: &str) -> Result<()> {
        validate_username(username)?;

        log::info!(target: "accounts", username = username; "Setting password for user");
        let output = self
            .run_with_input(&self.chpasswd, &format!("{username}:{password}\n"))
            .map_err(|e| e.redacted(password))?;

        check(&self.chpasswd, &output).map_err(|e| e.redacted(password))?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        if !stdout.trim().is_empty() {
            log::debug!(target: "accounts", "chpasswd: {}", redact(stdout.trim(), password));
        }
        Ok(())
    }
}

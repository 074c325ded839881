//! Linux user account resource
//!
//! Reads and changes go through an [`accounts::Backend`]. The password is
//! write-only: it is applied on every `set` that supplies it, never compared
//! and never printed.

use accounts::{Account, AccountSpec, Backend};
use declarative::{
    Action, ApplyResult, CurrentState, Error, MatchReport, Observation, ProvidedProperties,
    Resource, Result, compare,
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeSet;
use std::fmt;

const UNOBSERVABLE: &[&str] = &["password"];

/// Desired account, parsed from schema-validated input
#[derive(Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UserRequest {
    pub username: String,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub uid: Option<u32>,
    #[serde(default)]
    pub gid: Option<u32>,
    #[serde(default)]
    pub home: Option<String>,
    #[serde(default)]
    pub shell: Option<String>,
    #[serde(default)]
    pub groups: Option<Vec<String>>,
    #[serde(rename = "_exist", default)]
    pub exist: Option<bool>,
}

impl fmt::Debug for UserRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserRequest")
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| accounts::MASK))
            .field("uid", &self.uid)
            .field("gid", &self.gid)
            .field("home", &self.home)
            .field("shell", &self.shell)
            .field("groups", &self.groups)
            .field("exist", &self.exist)
            .finish()
    }
}

impl UserRequest {
    /// A request for deleting `username`
    pub fn absent(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: None,
            uid: None,
            gid: None,
            home: None,
            shell: None,
            groups: None,
            exist: Some(false),
        }
    }

    pub fn from_input(input: &Map<String, Value>) -> Result<Self> {
        serde_json::from_value(Value::Object(input.clone()))
            .map_err(|e| Error::Validation(e.to_string()))
    }

    /// Reject properties `set` cannot change
    pub fn ensure_writable(&self) -> Result<()> {
        if self.groups.is_some() {
            return Err(Error::Validation(
                "property 'groups' is read-only and cannot be set".into(),
            ));
        }
        Ok(())
    }

    fn spec(&self) -> AccountSpec {
        AccountSpec {
            uid: self.uid,
            gid: self.gid,
            home: self.home.clone(),
            shell: self.shell.clone(),
        }
    }

    /// Only the properties that differ from `current`
    fn changes(&self, current: &Account) -> AccountSpec {
        AccountSpec {
            uid: self.uid.filter(|uid| *uid != current.uid),
            gid: self.gid.filter(|gid| *gid != current.gid),
            home: self.home.clone().filter(|home| *home != current.home),
            shell: self.shell.clone().filter(|shell| *shell != current.shell),
        }
    }
}

/// Observed account state
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UserState {
    pub account: Option<Account>,
    pub groups: Vec<String>,
}

impl CurrentState for UserState {
    fn exists(&self) -> bool {
        self.account.is_some()
    }
}

/// The record printed for a user observation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uid: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gid: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub home: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shell: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub groups: Option<Vec<String>>,
    #[serde(rename = "_exist")]
    pub exist: bool,
}

impl UserRecord {
    fn present(account: &Account, groups: &[String], exist: bool) -> Self {
        Self {
            username: account.username.clone(),
            uid: Some(account.uid),
            gid: Some(account.gid),
            home: Some(account.home.clone()),
            shell: Some(account.shell.clone()),
            groups: Some(groups.to_vec()),
            exist,
        }
    }

    pub fn from_observation(username: &str, observation: &Observation<UserState>) -> Self {
        match observation.current().and_then(|s| s.account.as_ref().map(|a| (a, s))) {
            Some((account, state)) => {
                Self::present(account, &state.groups, observation.in_desired_state())
            }
            None => Self {
                username: username.to_string(),
                uid: None,
                gid: None,
                home: None,
                shell: None,
                groups: None,
                exist: false,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WhatIfMetadata {
    #[serde(rename = "whatIf")]
    pub what_if: Vec<String>,
}

/// What `set`/`delete --what-if` prints instead of changing anything
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WhatIfRecord {
    pub username: String,
    #[serde(rename = "_metadata")]
    pub metadata: WhatIfMetadata,
}

impl WhatIfRecord {
    pub fn new(username: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            metadata: WhatIfMetadata {
                what_if: vec![message.into()],
            },
        }
    }
}

/// User resource: one request against the account database
#[derive(Debug)]
pub struct User<B> {
    request: UserRequest,
    provided: ProvidedProperties,
    backend: B,
}

impl<B: Backend + fmt::Debug> User<B> {
    pub fn new(request: UserRequest, provided: ProvidedProperties, backend: B) -> Self {
        Self {
            request,
            provided,
            backend,
        }
    }

    pub fn username(&self) -> &str {
        &self.request.username
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    fn failed(&self, action: Action, e: accounts::Error) -> Error {
        let e = match &self.request.password {
            Some(password) => e.redacted(password),
            None => e,
        };
        Error::mutation(self.id(), action.verb(), e)
    }

    fn apply_password(&self, action: Action) -> Result<bool> {
        let Some(password) = &self.request.password else {
            return Ok(false);
        };
        self.backend
            .set_password(&self.request.username, password)
            .map_err(|e| self.failed(action, e))?;
        Ok(true)
    }
}

impl<B: Backend + fmt::Debug> Resource for User<B> {
    type State = UserState;

    fn id(&self) -> String {
        format!("User '{}'", self.request.username)
    }

    fn resource_type(&self) -> &'static str {
        "user"
    }

    fn identity_key(&self) -> &'static str {
        "username"
    }

    fn unobservable(&self) -> &'static [&'static str] {
        UNOBSERVABLE
    }

    fn provided(&self) -> &ProvidedProperties {
        &self.provided
    }

    fn desired_exist(&self) -> bool {
        self.request.exist.unwrap_or(true)
    }

    fn probe(&self) -> Result<UserState> {
        let username = &self.request.username;
        let probe_failed = |e: accounts::Error| Error::probe(self.id(), e);

        let Some(account) = self.backend.lookup(username).map_err(probe_failed)? else {
            return Ok(UserState::default());
        };
        let groups = self.backend.groups(username).map_err(probe_failed)?;

        log::debug!(
            target: "user",
            username = username.as_str(),
            uid = account.uid,
            gid = account.gid;
            "Found user"
        );
        Ok(UserState {
            account: Some(account),
            groups,
        })
    }

    fn compare(&self, current: &UserState) -> MatchReport {
        let mut report = MatchReport::new();
        let account = current.account.as_ref();
        let request = &self.request;

        for name in self.provided.requested(self.identity_key(), self.unobservable()) {
            let check = match name {
                "uid" => request
                    .uid
                    .map(|uid| compare(name, &uid, account.map(|a| &a.uid))),
                "gid" => request
                    .gid
                    .map(|gid| compare(name, &gid, account.map(|a| &a.gid))),
                "home" => request
                    .home
                    .as_ref()
                    .map(|home| compare(name, home, account.map(|a| &a.home))),
                "shell" => request
                    .shell
                    .as_ref()
                    .map(|shell| compare(name, shell, account.map(|a| &a.shell))),
                "groups" => request.groups.as_ref().map(|groups| {
                    let requested: BTreeSet<&str> = groups.iter().map(String::as_str).collect();
                    let actual: BTreeSet<&str> =
                        current.groups.iter().map(String::as_str).collect();
                    compare(name, &requested, Some(&actual))
                }),
                other => {
                    log::debug!(target: "user", "Ignoring unknown property {other}");
                    None
                }
            };

            if let Some(check) = check {
                report.push(check);
            }
        }

        report
    }

    fn apply(&self, action: Action, current: &UserState) -> Result<ApplyResult> {
        let username = &self.request.username;

        match action {
            Action::None => Ok(ApplyResult::NoChange),
            Action::Remove => {
                self.backend
                    .delete(username)
                    .map_err(|e| self.failed(action, e))?;
                Ok(ApplyResult::Removed)
            }
            Action::Create => {
                self.backend
                    .create(username, &self.request.spec())
                    .map_err(|e| self.failed(action, e))?;
                self.apply_password(action)?;
                Ok(ApplyResult::Created)
            }
            Action::Update => {
                let changes = match &current.account {
                    Some(account) => self.request.changes(account),
                    None => self.request.spec(),
                };

                let modified = !changes.is_empty()
                    && self
                        .backend
                        .modify(username, &changes)
                        .map_err(|e| self.failed(action, e))?;
                let password = self.apply_password(action)?;

                Ok(if modified || password {
                    ApplyResult::Modified
                } else {
                    ApplyResult::NoChange
                })
            }
        }
    }
}

/// Every account in the passwd database, each reported as present
pub fn export<B: Backend>(backend: &B) -> Result<Vec<UserRecord>> {
    let accounts = backend
        .list()
        .map_err(|e| Error::probe("account database", e))?;

    accounts
        .iter()
        .map(|account| {
            let groups = backend
                .groups(&account.username)
                .map_err(|e| Error::probe(format!("User '{}'", account.username), e))?;
            Ok(UserRecord::present(account, &groups, true))
        })
        .collect()
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::cell::RefCell;
    use std::collections::BTreeMap;

    /// In-memory account database recording every change
    #[derive(Debug, Default)]
    pub struct FakeBackend {
        pub accounts: RefCell<BTreeMap<String, Account>>,
        pub groups: RefCell<BTreeMap<String, Vec<String>>>,
        pub passwords: RefCell<BTreeMap<String, String>>,
        pub calls: RefCell<Vec<String>>,
        pub fail_with: Option<String>,
    }

    impl FakeBackend {
        pub fn with_user(self, username: &str, uid: u32, gid: u32, groups: &[&str]) -> Self {
            self.accounts.borrow_mut().insert(
                username.to_string(),
                Account {
                    username: username.to_string(),
                    uid,
                    gid,
                    gecos: String::new(),
                    home: format!("/home/{username}"),
                    shell: "/bin/bash".to_string(),
                },
            );
            self.groups.borrow_mut().insert(
                username.to_string(),
                groups.iter().map(|g| g.to_string()).collect(),
            );
            self
        }

        pub fn failing(mut self, stderr: &str) -> Self {
            self.fail_with = Some(stderr.to_string());
            self
        }

        pub fn calls(&self) -> Vec<String> {
            self.calls.borrow().clone()
        }

        fn record(&self, call: String) -> accounts::Result<()> {
            self.calls.borrow_mut().push(call.clone());
            match &self.fail_with {
                Some(stderr) => Err(accounts::Error::CommandFailed {
                    command: call,
                    code: 1,
                    stderr: stderr.clone(),
                }),
                None => Ok(()),
            }
        }
    }

    impl Backend for FakeBackend {
        fn lookup(&self, username: &str) -> accounts::Result<Option<Account>> {
            Ok(self.accounts.borrow().get(username).cloned())
        }

        fn groups(&self, username: &str) -> accounts::Result<Vec<String>> {
            Ok(self
                .groups
                .borrow()
                .get(username)
                .cloned()
                .unwrap_or_default())
        }

        fn list(&self) -> accounts::Result<Vec<Account>> {
            Ok(self.accounts.borrow().values().cloned().collect())
        }

        fn group_name(&self, gid: u32) -> accounts::Result<Option<String>> {
            Ok(Some(format!("group{gid}")))
        }

        fn create(&self, username: &str, spec: &AccountSpec) -> accounts::Result<()> {
            self.record(format!("create {username}"))?;
            let uid = spec.uid.unwrap_or(1000);
            self.accounts.borrow_mut().insert(
                username.to_string(),
                Account {
                    username: username.to_string(),
                    uid,
                    gid: spec.gid.unwrap_or(uid),
                    gecos: String::new(),
                    home: spec
                        .home
                        .clone()
                        .unwrap_or_else(|| format!("/home/{username}")),
                    shell: spec.shell.clone().unwrap_or_else(|| "/bin/sh".to_string()),
                },
            );
            self.groups
                .borrow_mut()
                .insert(username.to_string(), vec![username.to_string()]);
            Ok(())
        }

        fn modify(&self, username: &str, spec: &AccountSpec) -> accounts::Result<bool> {
            self.record(format!("modify {username} {spec:?}"))?;
            let mut accounts = self.accounts.borrow_mut();
            let Some(account) = accounts.get_mut(username) else {
                return Ok(false);
            };
            if let Some(uid) = spec.uid {
                account.uid = uid;
            }
            if let Some(gid) = spec.gid {
                account.gid = gid;
            }
            if let Some(home) = &spec.home {
                account.home = home.clone();
            }
            if let Some(shell) = &spec.shell {
                account.shell = shell.clone();
            }
            Ok(true)
        }

        fn delete(&self, username: &str) -> accounts::Result<()> {
            self.record(format!("delete {username}"))?;
            self.accounts.borrow_mut().remove(username);
            self.groups.borrow_mut().remove(username);
            Ok(())
        }

        fn set_password(&self, username: &str, password: &str) -> accounts::Result<()> {
            self.calls.borrow_mut().push(format!("set_password {username}"));
            if let Some(stderr) = &self.fail_with {
                return Err(accounts::Error::CommandFailed {
                    command: "chpasswd".to_string(),
                    code: 1,
                    stderr: format!("{stderr}: {password}"),
                });
            }
            self.passwords
                .borrow_mut()
                .insert(username.to_string(), password.to_string());
            Ok(())
        }
    }
}

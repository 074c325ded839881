//! `user-dsc` command handlers

use accounts::Backend;
use anyhow::Result;
use declarative::{ApplyResult, ProvidedProperties, reconcile};
use serde_json::{Map, Value};
use std::fmt;
use std::io::Write;

use crate::cli::UserCommand;
use crate::input::{self, Policy, Resolved, Sources};
use crate::output;
use crate::privilege;
use crate::resource::user;
use crate::resource::{User, UserRecord, UserRequest, WhatIfRecord};
use crate::schema;

pub fn run(command: UserCommand) -> Result<()> {
    let backend = accounts::default_backend();
    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    match command {
        UserCommand::Get(args) => {
            let resolved = resolve(args.input.clone(), args.flags())?;
            report(&build(resolved, backend)?, &mut out)
        }
        UserCommand::Set(args) => {
            let resolved = resolve(args.user.input.clone(), args.user.flags())?;
            let user = build_for_set(resolved, backend)?;
            privilege::require_root("set")?;
            converge(&user, args.what_if, &mut out)
        }
        UserCommand::Delete(args) => {
            let resolved = resolve(args.input.clone(), args.flags())?;
            let user = build_for_delete(resolved, backend)?;
            privilege::require_root("delete")?;
            converge(&user, args.what_if, &mut out)
        }
        UserCommand::Export => output::write_record(&mut out, &user::export(&backend)?),
        UserCommand::Schema => output::write_record(&mut out, &schema::user().document()),
    }
}

fn resolve(input: Option<String>, flags: Map<String, Value>) -> Result<Resolved> {
    let sources = Sources::gather(input, flags)?;
    Ok(input::resolve(Policy::User, sources)?)
}

fn build<B: Backend + fmt::Debug>(resolved: Resolved, backend: B) -> Result<User<B>> {
    let values = schema::user().validate(&resolved.values)?;
    let request = UserRequest::from_input(&values)?;
    Ok(User::new(request, resolved.provided, backend))
}

fn build_for_set<B: Backend + fmt::Debug>(resolved: Resolved, backend: B) -> Result<User<B>> {
    let values = schema::user().validate(&resolved.values)?;
    let request = UserRequest::from_input(&values)?;
    request.ensure_writable()?;
    Ok(User::new(request, resolved.provided, backend))
}

/// Only the username of the input matters for deletion
fn build_for_delete<B: Backend + fmt::Debug>(resolved: Resolved, backend: B) -> Result<User<B>> {
    let values = schema::user().validate(&resolved.values)?;
    let username = UserRequest::from_input(&values)?.username;
    Ok(User::new(
        UserRequest::absent(username),
        ProvidedProperties::from_iter(["username"]),
        backend,
    ))
}

/// Print whether the account is in the desired state
fn report<B: Backend + fmt::Debug, W: Write>(user: &User<B>, out: &mut W) -> Result<()> {
    let observation = reconcile::observe(user)?;
    output::write_record(out, &UserRecord::from_observation(user.username(), &observation))
}

/// Converge the account and print the re-probed outcome, or only describe
/// the change under what-if
fn converge<B: Backend + fmt::Debug, W: Write>(
    user: &User<B>,
    what_if: bool,
    out: &mut W,
) -> Result<()> {
    let enforcement = reconcile::enforce(user, what_if)?;

    match &enforcement.result {
        ApplyResult::Skipped { reason } => {
            log::info!(target: "user", username = user.username(); "What-if: {reason}");
            return output::write_record(out, &WhatIfRecord::new(user.username(), reason.as_str()));
        }
        ApplyResult::NoChange => {
            log::info!(target: "user", username = user.username(); "No changes needed")
        }
        result => log::info!(
            target: "user",
            username = user.username(),
            action = enforcement.plan.action.verb();
            "{result:?}"
        ),
    }

    report(user, out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::user::testing::FakeBackend;
    use serde_json::json;

    fn resolved(input: Value) -> Resolved {
        input::resolve(
            Policy::User,
            Sources {
                flags: input.as_object().unwrap().clone(),
                ..Default::default()
            },
        )
        .unwrap()
    }

    fn output(buf: Vec<u8>) -> Value {
        serde_json::from_slice(&buf).unwrap()
    }

    fn alice() -> FakeBackend {
        FakeBackend::default().with_user("alice", 1000, 1000, &["alice"])
    }

    #[test]
    fn test_get_requires_username() {
        let err = build(resolved(json!({"uid": 1})), FakeBackend::default()).unwrap_err();
        assert!(err.to_string().contains("username"), "{err}");
    }

    #[test]
    fn test_get_mismatch_prints_current() {
        let user = build(resolved(json!({"username": "alice", "uid": 2000})), alice()).unwrap();
        let mut out = Vec::new();
        report(&user, &mut out).unwrap();

        let record = output(out);
        assert_eq!(record["uid"], json!(1000));
        assert_eq!(record["_exist"], json!(false));
    }

    #[test]
    fn test_set_rejects_groups() {
        let err = build_for_set(
            resolved(json!({"username": "alice", "groups": ["sudo"]})),
            alice(),
        )
        .unwrap_err();
        assert!(err.to_string().contains("read-only"), "{err}");
    }

    #[test]
    fn test_set_prints_converged_state() {
        let user = build_for_set(
            resolved(json!({"username": "carol", "shell": "/bin/zsh", "password": "pw"})),
            FakeBackend::default(),
        )
        .unwrap();
        let mut out = Vec::new();
        converge(&user, false, &mut out).unwrap();

        let record = output(out);
        assert_eq!(record["_exist"], json!(true));
        assert_eq!(record["shell"], json!("/bin/zsh"));
        assert!(record.get("password").is_none());
    }

    #[test]
    fn test_set_what_if_prints_metadata() {
        let user = build_for_set(resolved(json!({"username": "dave"})), FakeBackend::default())
            .unwrap();
        let mut out = Vec::new();
        converge(&user, true, &mut out).unwrap();

        assert_eq!(
            output(out),
            json!({
                "username": "dave",
                "_metadata": {"whatIf": ["User 'dave' does not exist and will be created."]}
            })
        );
        assert!(user.backend().calls().is_empty());
    }

    #[test]
    fn test_delete_ignores_other_properties() {
        let user = build_for_delete(
            resolved(json!({"username": "alice", "uid": 1000, "_exist": true})),
            alice(),
        )
        .unwrap();
        let mut out = Vec::new();
        converge(&user, false, &mut out).unwrap();

        assert_eq!(output(out), json!({"username": "alice", "_exist": false}));
        assert_eq!(user.backend().calls(), vec!["delete alice"]);
    }

    #[test]
    fn test_delete_what_if() {
        let user = build_for_delete(resolved(json!({"username": "alice"})), alice()).unwrap();
        let mut out = Vec::new();
        converge(&user, true, &mut out).unwrap();

        assert_eq!(
            output(out)["_metadata"]["whatIf"],
            json!(["User 'alice' exists and will be deleted."])
        );
        assert!(user.backend().calls().is_empty());
    }
}

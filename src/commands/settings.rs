//! `tstoy-dsc` command handlers

use anyhow::{Context, Result};
use declarative::{ApplyResult, ProvidedProperties, reconcile};
use std::io::Write;
use std::path::PathBuf;

use crate::cli::{SettingsArgs, SettingsCommand};
use crate::input::{self, Policy, Resolved, Sources};
use crate::output;
use crate::paths;
use crate::resource::{Scope, Settings, SettingsFile, SettingsRecord, SettingsRequest};
use crate::schema;

pub fn run(command: SettingsCommand) -> Result<()> {
    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    match command {
        SettingsCommand::Get(args) => report(&load(&args)?, &mut out),
        SettingsCommand::Set(args) => converge(&load(&args)?, &mut out),
        SettingsCommand::Export => export(&mut out),
        SettingsCommand::Schema => output::write_record(&mut out, &schema::settings().document()),
    }
}

/// Resolve, validate and locate the settings named by `args`
fn load(args: &SettingsArgs) -> Result<Settings> {
    let sources = Sources::gather(args.input.clone(), args.flags())?;
    let resolved = input::resolve(Policy::Settings, sources)?;
    build(resolved, paths::config_file)
}

fn build(resolved: Resolved, locate: impl Fn(Scope) -> Result<PathBuf>) -> Result<Settings> {
    let values = schema::settings().validate(&resolved.values)?;
    let request = SettingsRequest::from_input(&values)?;
    let path = locate(request.scope)
        .with_context(|| format!("Failed to locate {} settings", request.scope))?;

    log::debug!(target: "settings", "Using config file {}", path.display());
    Ok(Settings::new(
        request,
        resolved.provided,
        SettingsFile::new(path),
    ))
}

/// Print whether `settings` is in the desired state
fn report<W: Write>(settings: &Settings, out: &mut W) -> Result<()> {
    let observation = reconcile::observe(settings)?;
    output::write_record(
        out,
        &SettingsRecord::from_observation(settings.scope(), &observation),
    )
}

/// Converge `settings`, then print the re-probed outcome
fn converge<W: Write>(settings: &Settings, out: &mut W) -> Result<()> {
    let enforcement = reconcile::enforce(settings, false)?;

    match &enforcement.result {
        ApplyResult::NoChange => {
            log::info!(target: "settings", "{}: no changes needed", enforcement.plan.resource_id)
        }
        result => log::info!(
            target: "settings",
            action = enforcement.plan.action.verb();
            "{}: {:?}",
            enforcement.plan.resource_id,
            result
        ),
    }

    report(settings, out)
}

fn export<W: Write>(out: &mut W) -> Result<()> {
    export_with(out, paths::config_file)
}

fn export_with<W: Write>(out: &mut W, locate: impl Fn(Scope) -> Result<PathBuf>) -> Result<()> {
    for scope in Scope::ALL {
        let settings = Settings::new(
            SettingsRequest::for_scope(scope),
            ProvidedProperties::from_iter(["scope"]),
            SettingsFile::new(locate(scope)?),
        );
        report(&settings, out)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};
    use std::fs;
    use tempfile::TempDir;

    fn resolved(input: Value) -> Resolved {
        input::resolve(
            Policy::Settings,
            Sources {
                input: Some(input.to_string()),
                ..Default::default()
            },
        )
        .unwrap()
    }

    fn locate_in(dir: &TempDir) -> impl Fn(Scope) -> Result<PathBuf> + '_ {
        move |scope| Ok(dir.path().join(scope.as_str()).join("config.json"))
    }

    fn lines(buf: Vec<u8>) -> Vec<Value> {
        String::from_utf8(buf)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect()
    }

    #[test]
    fn test_build_rejects_unknown_property() {
        let dir = TempDir::new().unwrap();
        let err = build(resolved(json!({"scope": "user", "bogus": 1})), locate_in(&dir))
            .unwrap_err();
        assert!(err.to_string().contains("bogus"), "{err}");
    }

    #[test]
    fn test_set_then_get_prints_same_record() {
        let dir = TempDir::new().unwrap();
        let request = json!({"scope": "user", "updateFrequency": 30});

        let mut first = Vec::new();
        converge(&build(resolved(request.clone()), locate_in(&dir)).unwrap(), &mut first).unwrap();
        let mut second = Vec::new();
        converge(&build(resolved(request), locate_in(&dir)).unwrap(), &mut second).unwrap();

        assert_eq!(first, second);
        assert_eq!(
            lines(first),
            vec![json!({
                "_exist": true,
                "scope": "user",
                "updateAutomatically": false,
                "updateFrequency": 30
            })]
        );
    }

    #[test]
    fn test_integral_float_frequency_is_an_integer() {
        let dir = TempDir::new().unwrap();
        let mut out = Vec::new();
        converge(
            &build(
                resolved(json!({"scope": "user", "updateFrequency": 30.0})),
                locate_in(&dir),
            )
            .unwrap(),
            &mut out,
        )
        .unwrap();
        assert_eq!(lines(out)[0]["updateFrequency"], json!(30));
    }

    #[test]
    fn test_set_exist_false_reports_absent() {
        let dir = TempDir::new().unwrap();
        let mut out = Vec::new();
        converge(
            &build(resolved(json!({"scope": "machine", "_exist": false})), locate_in(&dir))
                .unwrap(),
            &mut out,
        )
        .unwrap();
        assert_eq!(lines(out), vec![json!({"_exist": false, "scope": "machine"})]);
    }

    #[test]
    fn test_export_user_then_machine() {
        let dir = TempDir::new().unwrap();
        let machine = dir.path().join("machine").join("config.json");
        fs::create_dir_all(machine.parent().unwrap()).unwrap();
        fs::write(&machine, r#"{"updates": {"updateFrequency": 90}}"#).unwrap();

        let mut out = Vec::new();
        export_with(&mut out, locate_in(&dir)).unwrap();

        assert_eq!(
            lines(out),
            vec![
                json!({"_exist": false, "scope": "user"}),
                json!({"_exist": true, "scope": "machine", "updateFrequency": 90}),
            ]
        );
    }
}

//! Structured diagnostics on stderr
//!
//! Every record becomes one JSON line:
//! `{"timestamp":…,"level":"INFO","fields":{"message":…},"target":"settings"}`.
//! Key-value pairs attached to a record land in `fields` next to the message.
//! Standard output is reserved for the resource state.

use chrono::{SecondsFormat, Utc};
use log::kv::{Error as KvError, Key, Source, Value as KvValue, VisitSource};
use serde_json::{Map, Value, json};
use std::io::Write;

/// Environment variable that overrides the verbosity flags (env_logger syntax)
pub const ENV_LOG: &str = "DSC_LOG";

/// Map `-v`/`-q` to a level filter
pub fn level_for(verbose: u8, quiet: bool) -> log::LevelFilter {
    if quiet {
        return log::LevelFilter::Error;
    }
    match verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    }
}

/// Install the JSON logger. Called once at startup.
pub fn init(verbose: u8, quiet: bool) {
    let mut builder = env_logger::Builder::new();
    builder
        .filter_level(level_for(verbose, quiet))
        .target(env_logger::Target::Stderr)
        .format(|buf, record| writeln!(buf, "{}", render(record)));

    if let Ok(filters) = std::env::var(ENV_LOG) {
        builder.parse_filters(&filters);
    }

    // A second init (e.g. from tests) keeps the first logger
    let _ = builder.try_init();
}

/// Render one record as a JSON line
pub fn render(record: &log::Record<'_>) -> String {
    let mut fields = Map::new();
    fields.insert("message".into(), json!(record.args().to_string()));

    let mut collector = FieldCollector(&mut fields);
    if let Err(e) = record.key_values().visit(&mut collector) {
        fields.insert("kvError".into(), json!(e.to_string()));
    }

    json!({
        "timestamp": Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true),
        "level": record.level().as_str(),
        "fields": fields,
        "target": record.target(),
    })
    .to_string()
}

struct FieldCollector<'a>(&'a mut Map<String, Value>);

impl<'kvs> VisitSource<'kvs> for FieldCollector<'_> {
    fn visit_pair(&mut self, key: Key<'kvs>, value: KvValue<'kvs>) -> Result<(), KvError> {
        let value = if let Some(b) = value.to_bool() {
            json!(b)
        } else if let Some(n) = value.to_i64() {
            json!(n)
        } else if let Some(n) = value.to_u64() {
            json!(n)
        } else {
            json!(value.to_string())
        };
        self.0.insert(key.as_str().to_string(), value);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(line: &str) -> Value {
        serde_json::from_str(line).unwrap()
    }

    #[test]
    fn test_level_for_flags() {
        assert_eq!(level_for(0, false), log::LevelFilter::Warn);
        assert_eq!(level_for(1, false), log::LevelFilter::Info);
        assert_eq!(level_for(2, false), log::LevelFilter::Debug);
        assert_eq!(level_for(5, false), log::LevelFilter::Trace);
        assert_eq!(level_for(3, true), log::LevelFilter::Error);
    }

    #[test]
    fn test_render_shape() {
        let line = render(
            &log::Record::builder()
                .args(format_args!("Config file not found"))
                .level(log::Level::Info)
                .target("settings")
                .build(),
        );
        let value = parse(&line);
        assert_eq!(value["level"], "INFO");
        assert_eq!(value["target"], "settings");
        assert_eq!(value["fields"]["message"], "Config file not found");
        assert!(value["timestamp"].as_str().unwrap().ends_with('Z'));
        assert!(!line.contains('\n'));
    }

    #[test]
    fn test_render_includes_key_values() {
        let kvs: [(&str, KvValue<'_>); 2] = [
            ("username", KvValue::from("alice")),
            ("uid", KvValue::from(1000u32)),
        ];
        let line = render(
            &log::Record::builder()
                .args(format_args!("Creating user"))
                .level(log::Level::Warn)
                .target("user")
                .key_values(&kvs)
                .build(),
        );
        let value = parse(&line);
        assert_eq!(value["level"], "WARN");
        assert_eq!(value["fields"]["username"], "alice");
        assert_eq!(value["fields"]["uid"], 1000);
    }

    struct Unreadable;

    impl Source for Unreadable {
        fn visit<'kvs>(&'kvs self, _visitor: &mut dyn VisitSource<'kvs>) -> Result<(), KvError> {
            Err(KvError::msg("source unavailable"))
        }
    }

    #[test]
    fn test_render_reports_key_value_failure() {
        let line = render(
            &log::Record::builder()
                .args(format_args!("Probing"))
                .level(log::Level::Info)
                .target("user")
                .key_values(&Unreadable)
                .build(),
        );
        let value = parse(&line);
        assert_eq!(value["fields"]["message"], "Probing");
        assert_eq!(value["fields"]["kvError"], "source unavailable");
    }
}

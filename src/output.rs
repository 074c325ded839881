//! Presenter: one compact JSON line per record on stdout
//!
//! Stdout carries only records. Diagnostics go through `log` to stderr.

use anyhow::{Context, Result};
use serde::Serialize;
use std::io::{self, Write};

/// Write `record` as a single JSON line
pub fn write_record<W: Write, T: Serialize + ?Sized>(out: &mut W, record: &T) -> Result<()> {
    serde_json::to_writer(&mut *out, record).context("Failed to serialize output")?;
    out.write_all(b"\n").context("Failed to write output")?;
    out.flush().context("Failed to flush output")?;
    Ok(())
}

/// Write `record` to stdout
pub fn emit<T: Serialize + ?Sized>(record: &T) -> Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    write_record(&mut out, record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_single_compact_line() {
        let mut buf = Vec::new();
        write_record(&mut buf, &json!({"_exist": false, "scope": "user"})).unwrap();
        assert_eq!(
            String::from_utf8(buf).unwrap(),
            "{\"_exist\":false,\"scope\":\"user\"}\n"
        );
    }

    #[test]
    fn test_arrays_stay_on_one_line() {
        let mut buf = Vec::new();
        write_record(&mut buf, &[json!({"username": "a"}), json!({"username": "b"})]).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert_eq!(text.lines().count(), 1);
        assert!(text.starts_with('['));
    }
}

use anyhow::{bail, Context, Result};
use serde_json::Value;
use std::path::Path;
use std::process::Command;

const DATE_ENCODED_KEYS: &[&str] = &["MediaCreateDate", "CreateDate"];

/// Asks an external `exiftool` for the encoded-date property of a media file.
pub fn query_date_encoded(program: &str, path: &Path) -> Result<Option<String>> {
    let output = Command::new(program)
        .arg("-j")
        .arg("-api")
        .arg("QuickTimeUTC")
        .args(DATE_ENCODED_KEYS.iter().map(|key| format!("-{key}")))
        .arg(path)
        .output()
        .with_context(|| format!("{program} を起動できませんでした"))?;

    if !output.status.success() {
        bail!(
            "{program} が失敗しました ({}): {}",
            output.status,
            String::from_utf8_lossy(&output.stderr).trim()
        );
    }

    date_encoded_from_json(&output.stdout)
}

pub fn date_encoded_from_json(stdout: &[u8]) -> Result<Option<String>> {
    let entries: Vec<Value> =
        serde_json::from_slice(stdout).context("exiftoolの出力を解析できませんでした")?;
    let Some(entry) = entries.into_iter().next() else {
        return Ok(None);
    };

    Ok(DATE_ENCODED_KEYS.iter().find_map(|key| {
        entry
            .get(*key)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|v| !v.is_empty() && !v.starts_with("0000"))
            .map(str::to_string)
    }))
}

//! npm packages described by `package.json`.

use anyhow::{Context, Result, bail};
use serde_json::Value;
use std::path::{Path, PathBuf};

use crate::runtime::Runtime;

pub const PACKAGE_JSON: &str = "package.json";
pub const PACKAGE_LOCK_JSON: &str = "package-lock.json";

pub fn package_json_path(dir: &Path) -> PathBuf {
    dir.join(PACKAGE_JSON)
}

/// Parsed `package.json`, key order preserved.
pub fn read_package_json<R: Runtime>(runtime: &R, dir: &Path) -> Result<Value> {
    let path = package_json_path(dir);
    let content = runtime
        .read_to_string(&path)
        .with_context(|| format!("Could not read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("Invalid JSON in {}", path.display()))
}

fn string_field<R: Runtime>(runtime: &R, dir: &Path, field: &str) -> Result<String> {
    match read_package_json(runtime, dir)?.get(field).and_then(Value::as_str) {
        Some(value) => Ok(value.to_string()),
        None => bail!("No \"{}\" field in {}", field, package_json_path(dir).display()),
    }
}

pub fn package_version<R: Runtime>(runtime: &R, dir: &Path) -> Result<String> {
    string_field(runtime, dir, "version")
}

pub fn product_name<R: Runtime>(runtime: &R, dir: &Path) -> Result<String> {
    string_field(runtime, dir, "name")
}

/// Set `version` in `package.json` (and `package-lock.json` if present) like
/// `npm version --no-git-tag-version` would.
#[tracing::instrument(skip(runtime))]
pub fn set_package_version<R: Runtime>(runtime: &R, dir: &Path, version: &str) -> Result<()> {
    set_version_in(runtime, &package_json_path(dir), version)?;

    let lock_path = dir.join(PACKAGE_LOCK_JSON);
    if runtime.exists(&lock_path) {
        set_version_in(runtime, &lock_path, version)?;
    }
    Ok(())
}

fn set_version_in<R: Runtime>(runtime: &R, path: &Path, version: &str) -> Result<()> {
    let content = runtime
        .read_to_string(path)
        .with_context(|| format!("Could not read {}", path.display()))?;
    let mut json: Value = serde_json::from_str(&content)
        .with_context(|| format!("Invalid JSON in {}", path.display()))?;

    let Some(object) = json.as_object_mut() else {
        bail!("{} does not contain a JSON object", path.display());
    };
    object.insert("version".to_string(), Value::String(version.to_string()));

    let mut output = serde_json::to_string_pretty(&json)?;
    output.push('\n');
    runtime.write(path, output.as_bytes())
}

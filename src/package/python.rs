//! Python packages described by a setuptools `setup.py`.
//!
//! The manifest is parsed statically: string literals passed as keyword arguments to
//! `setup(...)` are extracted without running a Python interpreter. The long description is
//! the text of `README.md` next to `setup.py`, exactly as setuptools would embed it.

use anyhow::{Context, Result};
use log::{debug, warn};
use regex::Regex;
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use thiserror::Error;

use crate::runtime::Runtime;

pub const SETUP_FILE_NAME: &str = "setup.py";
pub const README_FILE_NAME: &str = "README.md";

static STRING_LITERAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"'([^']*)'|"([^"]*)""#).expect("valid literal regex"));

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("Setup file not found: {}", .0.display())]
    SetupFileNotFound(PathBuf),

    #[error("README file not found: {}", .0.display())]
    ReadmeNotFound(PathBuf),

    #[error("Unable to parse {0} from setup file. Please ensure {0} is set.")]
    MissingField(&'static str),
}

/// Package metadata declared in `setup.py`.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct SetupManifest {
    pub name: String,
    pub version: String,
    pub author: Option<String>,
    pub author_email: Option<String>,
    pub description: Option<String>,
    pub long_description: String,
    pub long_description_content_type: Option<String>,
    pub keywords: Option<String>,
    pub url: Option<String>,
    pub packages: Vec<String>,
    pub classifiers: Vec<String>,
}

impl SetupManifest {
    /// Load `setup.py` and `README.md` from `dir`.
    ///
    /// Fails with [`ManifestError::ReadmeNotFound`] if the README is missing, the same way
    /// running the setup script would.
    #[tracing::instrument(skip(runtime))]
    pub fn load<R: Runtime>(runtime: &R, dir: &Path) -> Result<Self> {
        let setup_path = dir.join(SETUP_FILE_NAME);
        let source = read_setup_file(runtime, &setup_path)?;

        let long_description = read_readme(runtime, dir)?;

        let packages = match literal_list(&strip_comments(&source), "packages") {
            Some(packages) => packages,
            None => find_packages(runtime, dir)?,
        };

        let manifest = Self::parse(&source, long_description, packages)?;

        if semver::Version::parse(&manifest.version).is_err() {
            warn!(
                "Version '{}' of {} may not be accepted by the packaging tool",
                manifest.version, manifest.name
            );
        }

        Ok(manifest)
    }

    /// Build the manifest from the source of `setup.py`.
    pub fn parse(source: &str, long_description: String, packages: Vec<String>) -> Result<Self> {
        let source = strip_comments(source);

        Ok(Self {
            name: string_field(&source, "name").ok_or(ManifestError::MissingField("name"))?,
            version: string_field(&source, "version")
                .ok_or(ManifestError::MissingField("version"))?,
            author: string_field(&source, "author"),
            author_email: string_field(&source, "author_email"),
            description: string_field(&source, "description"),
            long_description,
            long_description_content_type: string_field(&source, "long_description_content_type"),
            keywords: string_field(&source, "keywords"),
            url: string_field(&source, "url"),
            packages,
            classifiers: literal_list(&source, "classifiers").unwrap_or_default(),
        })
    }
}

impl fmt::Display for SetupManifest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn opt(value: &Option<String>) -> &str {
            value.as_deref().unwrap_or("-")
        }

        writeln!(f, "name: {}", self.name)?;
        writeln!(f, "version: {}", self.version)?;
        writeln!(f, "author: {}", opt(&self.author))?;
        writeln!(f, "author_email: {}", opt(&self.author_email))?;
        writeln!(f, "description: {}", opt(&self.description))?;
        writeln!(
            f,
            "long_description: {} bytes ({})",
            self.long_description.len(),
            opt(&self.long_description_content_type)
        )?;
        writeln!(f, "keywords: {}", opt(&self.keywords))?;
        writeln!(f, "url: {}", opt(&self.url))?;
        writeln!(f, "packages:")?;
        for package in &self.packages {
            writeln!(f, "  {}", package)?;
        }
        writeln!(f, "classifiers:")?;
        for classifier in &self.classifiers {
            writeln!(f, "  {}", classifier)?;
        }
        Ok(())
    }
}

fn read_setup_file<R: Runtime>(runtime: &R, path: &Path) -> Result<String> {
    if !runtime.exists(path) {
        return Err(ManifestError::SetupFileNotFound(path.to_path_buf()).into());
    }
    runtime
        .read_to_string(path)
        .with_context(|| format!("Could not read setup file: {}", path.display()))
}

/// `setup.py` opens `README.md` for the long description, so reading the manifest fails
/// without it.
fn read_readme<R: Runtime>(runtime: &R, dir: &Path) -> Result<String> {
    let readme_path = dir.join(README_FILE_NAME);
    if !runtime.exists(&readme_path) {
        return Err(ManifestError::ReadmeNotFound(readme_path).into());
    }
    runtime
        .read_to_string(&readme_path)
        .map_err(|_| ManifestError::ReadmeNotFound(readme_path).into())
}

/// Byte offset of the `#` starting a comment on `line`, ignoring `#` inside string literals.
fn comment_start(line: &str) -> Option<usize> {
    let mut quote = None;
    let mut escaped = false;

    for (i, c) in line.char_indices() {
        match quote {
            Some(_) if escaped => escaped = false,
            Some(_) if c == '\\' => escaped = true,
            Some(q) if c == q => quote = None,
            Some(_) => {}
            None if c == '\'' || c == '"' => quote = Some(c),
            None if c == '#' => return Some(i),
            None => {}
        }
    }
    None
}

fn strip_comments(source: &str) -> String {
    source
        .lines()
        .map(|line| &line[..comment_start(line).unwrap_or(line.len())])
        .collect::<Vec<_>>()
        .join("\n")
}

fn field_regex(field: &str) -> Regex {
    // `field='value'`, `field="value"` or `field=some.call('value')`
    Regex::new(&format!(
        r#"\b{}\s*=\s*(?:[A-Za-z_][\w.]*\(\s*)?(?:'([^']*)'|"([^"]*)")"#,
        regex::escape(field)
    ))
    .expect("valid field regex")
}

fn literal_value(captures: &regex::Captures<'_>) -> Option<(usize, usize, String)> {
    captures
        .get(1)
        .or_else(|| captures.get(2))
        .map(|m| (m.start(), m.end(), m.as_str().to_string()))
}

/// The string literal passed as keyword argument `field`.
fn string_field(source: &str, field: &str) -> Option<String> {
    let captures = field_regex(field).captures(source)?;
    literal_value(&captures).map(|(_, _, value)| value)
}

/// The string literals of a list passed as keyword argument `field`, e.g. `classifiers=[...]`.
fn literal_list(source: &str, field: &str) -> Option<Vec<String>> {
    let list = Regex::new(&format!(r"(?s)\b{}\s*=\s*\[(.*?)\]", regex::escape(field)))
        .expect("valid list regex");
    let body = list.captures(source)?.get(1)?.as_str().to_string();

    Some(
        STRING_LITERAL
            .captures_iter(&body)
            .filter_map(|c| literal_value(&c).map(|(_, _, value)| value))
            .collect(),
    )
}

/// Directories below `dir` that are Python packages, as dotted names.
///
/// A directory is a package if it contains `__init__.py` and every directory between it and
/// `dir` is a package as well.
#[tracing::instrument(skip(runtime))]
pub fn find_packages<R: Runtime>(runtime: &R, dir: &Path) -> Result<Vec<String>> {
    let pattern = format!(
        "{}/**/__init__.py",
        glob::Pattern::escape(&dir.to_string_lossy())
    );
    let mut packages = Vec::new();

    for init_file in runtime.glob(&pattern)? {
        let Some(package_dir) = init_file.parent() else {
            continue;
        };
        let Ok(relative) = package_dir.strip_prefix(dir) else {
            continue;
        };
        if relative.as_os_str().is_empty() {
            continue;
        }

        let parts: Vec<String> = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy().to_string())
            .collect();

        // setuptools only considers directories that are valid module names
        if parts.iter().any(|part| part.contains('.')) {
            debug!("Skipping {:?}, not an importable name", relative);
            continue;
        }

        let ancestors_are_packages = (1..parts.len()).all(|depth| {
            let ancestor = parts[..depth]
                .iter()
                .fold(dir.to_path_buf(), |path, part| path.join(part));
            runtime.exists(&ancestor.join("__init__.py"))
        });

        if ancestors_are_packages {
            packages.push(parts.join("."));
        } else {
            debug!("Skipping {:?}, parent is not a package", relative);
        }
    }

    packages.sort();
    Ok(packages)
}

/// A required field of `dir/setup.py`, read under the same conditions as
/// [`SetupManifest::load`].
fn required_field<R: Runtime>(runtime: &R, dir: &Path, field: &'static str) -> Result<String> {
    let source = read_setup_file(runtime, &dir.join(SETUP_FILE_NAME))?;
    read_readme(runtime, dir)?;
    string_field(&strip_comments(&source), field)
        .ok_or_else(|| ManifestError::MissingField(field).into())
}

/// The version declared in `dir/setup.py`.
pub fn package_version<R: Runtime>(runtime: &R, dir: &Path) -> Result<String> {
    required_field(runtime, dir, "version")
}

/// The distribution name declared in `dir/setup.py`.
pub fn product_name<R: Runtime>(runtime: &R, dir: &Path) -> Result<String> {
    required_field(runtime, dir, "name")
}

/// Rewrite the version literal of the `version=` argument in `dir/setup.py`.
///
/// setuptools has no command to set the version, so the file is edited in place. Everything
/// around the literal, including a `setuptools.sic(...)` wrapper, is kept.
#[tracing::instrument(skip(runtime))]
pub fn set_package_version<R: Runtime>(runtime: &R, dir: &Path, version: &str) -> Result<()> {
    let path = dir.join(SETUP_FILE_NAME);
    let source = read_setup_file(runtime, &path)?;

    let (start, end) = field_regex("version")
        .captures_iter(&source)
        .filter(|c| !is_in_comment(&source, c.get(0).map_or(0, |m| m.start())))
        .find_map(|c| literal_value(&c).map(|(start, end, _)| (start, end)))
        .ok_or(ManifestError::MissingField("version"))?;

    let updated = format!("{}{}{}", &source[..start], version, &source[end..]);
    runtime.write(&path, updated.as_bytes())
}

fn is_in_comment(source: &str, offset: usize) -> bool {
    let line_start = source[..offset].rfind('\n').map_or(0, |i| i + 1);
    let line = source[line_start..].lines().next().unwrap_or_default();
    comment_start(line).is_some_and(|start| line_start + start < offset)
}

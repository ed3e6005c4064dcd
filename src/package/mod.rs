//! Package manifests of the supported ecosystems.
//!
//! Every mode knows where its version lives and how to rewrite it:
//!
//! - `node` - `package.json` (and `package-lock.json`)
//! - `python` - `setup.py`, see [`SetupManifest`]
//! - `dotnet` - the single `*.csproj` of the directory

pub mod dotnet;
pub mod node;
pub mod python;

use anyhow::{Context, Result};
use std::fmt;
use std::path::{Path, PathBuf};

use crate::runtime::Runtime;
use crate::version::version_tag;

pub use python::{ManifestError, SetupManifest, find_packages};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum PackageMode {
    Dotnet,
    #[default]
    Node,
    Python,
}

impl fmt::Display for PackageMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PackageMode::Dotnet => "dotnet",
            PackageMode::Node => "node",
            PackageMode::Python => "python",
        };
        write!(f, "{}", name)
    }
}

/// The package in a directory, as seen through one [`PackageMode`].
#[derive(Debug, Clone)]
pub struct Package {
    pub mode: PackageMode,
    pub dir: PathBuf,
    /// Explicit project file for `dotnet`, otherwise the only `*.csproj` in `dir` is used.
    pub csproj: Option<PathBuf>,
}

impl Package {
    pub fn new(mode: PackageMode, dir: &Path) -> Self {
        Self {
            mode,
            dir: dir.to_path_buf(),
            csproj: None,
        }
    }

    pub fn with_csproj(mut self, csproj: Option<PathBuf>) -> Self {
        self.csproj = csproj;
        self
    }

    fn csproj<R: Runtime>(&self, runtime: &R) -> Result<PathBuf> {
        match &self.csproj {
            Some(path) if path.is_absolute() => Ok(path.clone()),
            Some(path) => Ok(self.dir.join(path)),
            None => dotnet::find_csproj(runtime, &self.dir),
        }
    }

    #[tracing::instrument(skip(runtime))]
    pub fn version<R: Runtime>(&self, runtime: &R) -> Result<String> {
        let version = match self.mode {
            PackageMode::Node => node::package_version(runtime, &self.dir),
            PackageMode::Python => python::package_version(runtime, &self.dir),
            PackageMode::Dotnet => dotnet::package_version(runtime, &self.csproj(runtime)?),
        }?;
        Ok(version.trim().to_string())
    }

    /// First numeric component of the version: `2.1.0-beta.1` -> `2`.
    pub fn major_version<R: Runtime>(&self, runtime: &R) -> Result<u64> {
        let version = self.version(runtime)?;
        major_version(&version)
            .with_context(|| format!("Could not read major version from '{}'", version))
    }

    pub fn version_tag<R: Runtime>(&self, runtime: &R) -> Result<String> {
        Ok(version_tag(&self.version(runtime)?))
    }

    #[tracing::instrument(skip(runtime))]
    pub fn set_version<R: Runtime>(&self, runtime: &R, version: &str) -> Result<()> {
        match self.mode {
            PackageMode::Node => node::set_package_version(runtime, &self.dir, version),
            PackageMode::Python => python::set_package_version(runtime, &self.dir, version),
            PackageMode::Dotnet => {
                dotnet::set_package_version(runtime, &self.csproj(runtime)?, version)
            }
        }
    }

    pub fn product_name<R: Runtime>(&self, runtime: &R) -> Result<String> {
        match self.mode {
            PackageMode::Node => node::product_name(runtime, &self.dir),
            PackageMode::Python => python::product_name(runtime, &self.dir),
            PackageMode::Dotnet => dotnet::product_name(runtime, &self.csproj(runtime)?),
        }
    }

    /// Files a version bump touches, relative to `dir`, for committing.
    pub fn version_files<R: Runtime>(&self, runtime: &R) -> Result<Vec<String>> {
        let files = match self.mode {
            PackageMode::Node => {
                let mut files = vec![node::PACKAGE_JSON.to_string()];
                if runtime.exists(&self.dir.join(node::PACKAGE_LOCK_JSON)) {
                    files.push(node::PACKAGE_LOCK_JSON.to_string());
                }
                files
            }
            PackageMode::Python => vec![python::SETUP_FILE_NAME.to_string()],
            PackageMode::Dotnet => {
                let csproj = self.csproj(runtime)?;
                let relative = csproj.strip_prefix(&self.dir).unwrap_or(&csproj);
                vec![relative.display().to_string()]
            }
        };
        Ok(files)
    }
}

pub fn major_version(version: &str) -> Option<u64> {
    let version = version.trim();
    let version = version.strip_prefix('v').unwrap_or(version);
    version.split('.').next()?.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::MockRuntime;

    #[test]
    fn test_major_version() {
        assert_eq!(major_version("2.1.0-beta.1"), Some(2));
        assert_eq!(major_version("v10.0.0"), Some(10));
        assert_eq!(major_version("latest"), None);
    }

    #[test]
    fn test_package_mode_display() {
        assert_eq!(PackageMode::default(), PackageMode::Node);
        assert_eq!(PackageMode::Python.to_string(), "python");
    }

    #[test]
    fn test_node_package_version_tag() {
        let mut runtime = MockRuntime::new();
        runtime
            .expect_read_to_string()
            .returning(|_| Ok(r#"{"name": "x", "version": "3.0.0-alpha.1"}"#.to_string()));

        let package = Package::new(PackageMode::Node, Path::new("/work"));
        assert_eq!(package.version_tag(&runtime).unwrap(), "v3.0.0-alpha.1");
        assert_eq!(package.major_version(&runtime).unwrap(), 3);
    }

    #[test]
    fn test_explicit_csproj_is_relative_to_dir() {
        let mut runtime = MockRuntime::new();
        runtime
            .expect_read_to_string()
            .withf(|path| path == Path::new("/work/src/App.csproj"))
            .returning(|_| Ok("<Version>1.0.0</Version>".to_string()));

        let package = Package::new(PackageMode::Dotnet, Path::new("/work"))
            .with_csproj(Some(PathBuf::from("src/App.csproj")));
        assert_eq!(package.version(&runtime).unwrap(), "1.0.0");
        assert_eq!(package.version_files(&runtime).unwrap(), vec!["src/App.csproj"]);
    }

    #[test]
    fn test_node_version_files_with_lock() {
        let mut runtime = MockRuntime::new();
        runtime.expect_exists().returning(|_| true);

        let package = Package::new(PackageMode::Node, Path::new("/work"));
        assert_eq!(
            package.version_files(&runtime).unwrap(),
            vec!["package.json", "package-lock.json"]
        );
    }
}

//! File system operations (read, write, glob).

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use super::RealRuntime;

impl RealRuntime {
    #[tracing::instrument(skip(self))]
    pub(crate) fn read_to_string_impl(&self, path: &Path) -> Result<String> {
        fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
    }

    #[tracing::instrument(skip(self, contents))]
    pub(crate) fn write_impl(&self, path: &Path, contents: &[u8]) -> Result<()> {
        fs::write(path, contents).with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    pub(crate) fn exists_impl(&self, path: &Path) -> bool {
        path.exists()
    }

    #[tracing::instrument(skip(self))]
    pub(crate) fn is_dir_impl(&self, path: &Path) -> bool {
        path.is_dir()
    }

    #[tracing::instrument(skip(self))]
    pub(crate) fn glob_impl(&self, pattern: &str) -> Result<Vec<PathBuf>> {
        let mut paths = glob::glob(pattern)
            .with_context(|| format!("Invalid glob pattern: {}", pattern))?
            .collect::<Result<Vec<_>, _>>()
            .context("Failed to read glob match")?;
        paths.sort();
        Ok(paths)
    }
}

#[cfg(test)]
mod tests {
    use crate::runtime::{RealRuntime, Runtime};
    use tempfile::tempdir;

    #[test]
    fn test_real_runtime_file_ops() {
        let runtime = RealRuntime;
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("package.json");

        runtime.write(&file_path, b"{}").unwrap();
        assert!(runtime.exists(&file_path));
        assert!(!runtime.is_dir(&file_path));
        assert!(runtime.is_dir(dir.path()));

        let content = runtime.read_to_string(&file_path).unwrap();
        assert_eq!(content, "{}");
    }

    #[test]
    fn test_real_runtime_glob() {
        let runtime = RealRuntime;
        let dir = tempdir().unwrap();
        runtime.write(&dir.path().join("b.csproj"), b"").unwrap();
        runtime.write(&dir.path().join("a.csproj"), b"").unwrap();
        runtime.write(&dir.path().join("README.md"), b"").unwrap();

        let pattern = format!("{}/*.csproj", dir.path().display());
        let paths = runtime.glob(&pattern).unwrap();

        assert_eq!(paths.len(), 2);
        assert!(paths[0].ends_with("a.csproj"));
        assert!(paths[1].ends_with("b.csproj"));
    }

    #[test]
    fn test_real_runtime_errors() {
        let runtime = RealRuntime;

        let result = runtime.read_to_string(std::path::Path::new("/nonexistent/path/setup.py"));
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("setup.py"));

        assert!(runtime.glob("[").is_err());
    }
}

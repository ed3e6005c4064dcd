//! Runtime abstraction for system operations.
//!
//! This module provides a trait-based abstraction over system operations,
//! enabling dependency injection and testability.
//!
//! # Structure
//!
//! - `env` - Environment variables, working directory and clock
//! - `fs` - File system operations (read, write, glob)
//! - `process` - Running external programs (git, npm)

mod env;
mod fs;
mod process;

use anyhow::Result;
use chrono::{DateTime, Utc};
use std::env as std_env;
use std::path::{Path, PathBuf};

pub use process::CommandOutput;

#[cfg_attr(test, mockall::automock)]
pub trait Runtime: Send + Sync {
    // Environment
    fn env_var(&self, key: &str) -> Result<String, std_env::VarError>;
    fn current_dir(&self) -> Result<PathBuf>;
    fn now(&self) -> DateTime<Utc>;

    // File System
    fn read_to_string(&self, path: &Path) -> Result<String>;
    fn write(&self, path: &Path, contents: &[u8]) -> Result<()>;
    fn exists(&self, path: &Path) -> bool;
    fn is_dir(&self, path: &Path) -> bool;

    /// Expand a glob pattern into the matching paths, sorted.
    fn glob(&self, pattern: &str) -> Result<Vec<PathBuf>>;

    // Processes
    /// Run `program` with `args` inside `dir` and capture its output.
    /// A non-zero exit status is reported through [`CommandOutput::success`], not as an error.
    fn run(&self, program: &str, args: &[String], dir: &Path) -> Result<CommandOutput>;
}

pub struct RealRuntime;

impl Runtime for RealRuntime {
    fn env_var(&self, key: &str) -> Result<String, std_env::VarError> {
        self.env_var_impl(key)
    }

    fn current_dir(&self) -> Result<PathBuf> {
        self.current_dir_impl()
    }

    fn now(&self) -> DateTime<Utc> {
        self.now_impl()
    }

    fn read_to_string(&self, path: &Path) -> Result<String> {
        self.read_to_string_impl(path)
    }

    fn write(&self, path: &Path, contents: &[u8]) -> Result<()> {
        self.write_impl(path, contents)
    }

    fn exists(&self, path: &Path) -> bool {
        self.exists_impl(path)
    }

    fn is_dir(&self, path: &Path) -> bool {
        self.is_dir_impl(path)
    }

    fn glob(&self, pattern: &str) -> Result<Vec<PathBuf>> {
        self.glob_impl(pattern)
    }

    fn run(&self, program: &str, args: &[String], dir: &Path) -> Result<CommandOutput> {
        self.run_impl(program, args, dir)
    }
}

/// Returns true if the environment variable is set to exactly `"true"`.
pub fn env_flag<R: Runtime + ?Sized>(runtime: &R, key: &str) -> bool {
    runtime.env_var(key).map(|v| v == "true").unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockall::predicate::eq;

    #[test]
    fn test_env_flag() {
        let mut runtime = MockRuntime::new();
        runtime
            .expect_env_var()
            .with(eq("CI_TOOLS_FORCE_PUBLISH"))
            .returning(|_| Ok("true".to_string()));
        runtime
            .expect_env_var()
            .with(eq("OTHER"))
            .returning(|_| Ok("1".to_string()));
        runtime
            .expect_env_var()
            .with(eq("MISSING"))
            .returning(|_| Err(std::env::VarError::NotPresent));

        assert!(env_flag(&runtime, "CI_TOOLS_FORCE_PUBLISH"));
        assert!(!env_flag(&runtime, "OTHER"));
        assert!(!env_flag(&runtime, "MISSING"));
    }
}

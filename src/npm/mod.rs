//! npm helpers: dist-tags, dependency lists and the `npm` command line.

mod dependency;
mod tag;

use anyhow::{Result, bail};
use std::path::{Path, PathBuf};

use crate::runtime::{CommandOutput, Runtime};

pub use dependency::{Dependency, all_dependencies, to_dependencies};
pub use tag::npm_tag;

/// Runs `npm` in a package directory.
pub struct Npm<'a, R: Runtime> {
    runtime: &'a R,
    dir: PathBuf,
}

impl<'a, R: Runtime> Npm<'a, R> {
    pub fn new(runtime: &'a R, dir: &Path) -> Self {
        Self {
            runtime,
            dir: dir.to_path_buf(),
        }
    }

    /// Run npm with `args`, failing on a non-zero exit status.
    #[tracing::instrument(skip(self))]
    pub fn run(&self, args: &[String]) -> Result<CommandOutput> {
        let output = self.runtime.run("npm", args, &self.dir)?;
        if !output.success {
            bail!("npm {} failed:\n{}", args.join(" "), output.combined().trim());
        }
        Ok(output)
    }

    /// Versions of `package` known to the registry, from `npm view <package> versions --json`.
    pub fn published_versions(&self, package: &str) -> Result<Vec<String>> {
        let args = ["view", package, "versions", "--json"].map(String::from);
        let output = self.run(&args)?;
        parse_versions(&output.stdout)
    }
}

/// The arguments of `npm publish`.
pub fn publish_args(dry_run: bool, tag: Option<&str>) -> Vec<String> {
    let mut args = vec!["publish".to_string()];
    if dry_run {
        args.push("--dry-run".to_string());
    }
    if let Some(tag) = tag {
        args.push("--tag".to_string());
        args.push(tag.to_string());
    }
    args
}

/// `npm view --json` prints a plain string instead of an array for a single version.
fn parse_versions(json: &str) -> Result<Vec<String>> {
    let value: serde_json::Value = serde_json::from_str(json.trim())?;
    Ok(match value {
        serde_json::Value::String(version) => vec![version],
        serde_json::Value::Array(items) => items
            .into_iter()
            .filter_map(|v| v.as_str().map(String::from))
            .collect(),
        _ => Vec::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::MockRuntime;

    #[test]
    fn test_publish_args() {
        assert_eq!(publish_args(false, None), vec!["publish"]);
        assert_eq!(
            publish_args(true, Some("alpha")),
            vec!["publish", "--dry-run", "--tag", "alpha"]
        );
    }

    #[test]
    fn test_parse_versions() {
        assert_eq!(parse_versions("\"1.0.0\"\n").unwrap(), vec!["1.0.0"]);
        assert_eq!(
            parse_versions("[\"1.0.0\", \"1.1.0-alpha.1\"]").unwrap(),
            vec!["1.0.0", "1.1.0-alpha.1"]
        );
        assert!(parse_versions("not json").is_err());
    }

    #[test]
    fn test_published_versions() {
        let mut runtime = MockRuntime::new();
        runtime
            .expect_run()
            .withf(|program, args, _| {
                program.to_string() == "npm" && args.join(" ") == "view @scope/pkg versions --json"
            })
            .returning(|_, _, _| Ok(CommandOutput::ok("[\"2.0.0\"]")));

        let npm = Npm::new(&runtime, Path::new("/work"));
        assert_eq!(npm.published_versions("@scope/pkg").unwrap(), vec!["2.0.0"]);
    }

    #[test]
    fn test_failing_npm_is_an_error() {
        let mut runtime = MockRuntime::new();
        runtime
            .expect_run()
            .returning(|_, _, _| Ok(CommandOutput::failed("E404 Not Found")));

        let npm = Npm::new(&runtime, Path::new("/work"));
        let err = npm.run(&["install".to_string()]).unwrap_err();
        assert!(err.to_string().contains("E404"));
    }
}

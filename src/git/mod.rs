//! Git plumbing on top of the [`Runtime`] process abstraction.

mod refs;

use anyhow::{Result, bail};
use log::debug;
use std::path::{Path, PathBuf};

use crate::runtime::{CommandOutput, Runtime};

pub use refs::{branch_from_ref, branch_from_ref_tag, parse_current_branch};

/// Subject and body of a commit or annotated tag message.
#[derive(Debug, Clone, PartialEq)]
pub struct CommitMessage {
    pub subject: String,
    pub body: String,
}

impl CommitMessage {
    /// Split `git show -s --format=%B` output into subject and body.
    pub fn parse(raw: &str) -> Self {
        let mut lines = raw.lines();
        let subject = lines.next().unwrap_or_default().trim().to_string();
        let body = lines.collect::<Vec<_>>().join("\n").trim().to_string();
        Self { subject, body }
    }
}

/// Git operations for the working copy at `dir`.
pub struct Git<'a, R: Runtime> {
    runtime: &'a R,
    dir: PathBuf,
}

impl<'a, R: Runtime> Git<'a, R> {
    pub fn new(runtime: &'a R, dir: &Path) -> Self {
        Self {
            runtime,
            dir: dir.to_path_buf(),
        }
    }

    fn exec(&self, args: &[&str]) -> Result<CommandOutput> {
        let args: Vec<String> = args.iter().map(|a| a.to_string()).collect();
        self.runtime.run("git", &args, &self.dir)
    }

    /// Run git and return stdout, failing on a non-zero exit status.
    fn git(&self, args: &[&str]) -> Result<String> {
        let output = self.exec(args)?;
        if !output.success {
            bail!("git {} failed: {}", args.join(" "), output.combined().trim());
        }
        Ok(output.stdout)
    }

    /// All tags, newest first, one per line.
    #[tracing::instrument(skip(self))]
    pub fn tag_list(&self) -> Result<String> {
        Ok(self.git(&["tag", "--sort=-creatordate"])?.trim().to_string())
    }

    pub fn is_existing_tag(&self, name: &str) -> Result<bool> {
        Ok(self.tag_list()?.lines().any(|line| line.trim() == name))
    }

    /// Author date of the commit a tag points at.
    pub fn tag_date(&self, tag: &str) -> Result<String> {
        Ok(self.git(&["log", "-1", "--format=%ai", tag])?.trim().to_string())
    }

    pub fn commit_sha(&self, reference: &str) -> Result<String> {
        Ok(self.git(&["rev-parse", reference])?.trim().to_string())
    }

    /// Like [`Git::commit_sha`], but an unknown ref yields `None`.
    pub fn try_commit_sha(&self, reference: &str) -> Result<Option<String>> {
        let output = self.exec(&["rev-parse", "--verify", "--quiet", reference])?;
        Ok(output
            .success
            .then(|| output.stdout.trim().to_string())
            .filter(|sha| !sha.is_empty()))
    }

    pub fn tags_pointing_at(&self, reference: &str) -> Result<Vec<String>> {
        Ok(self
            .git(&["tag", "-l", "--points-at", reference])?
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(String::from)
            .collect())
    }

    pub fn full_commit_message(&self, reference: &str) -> Result<CommitMessage> {
        let raw = self.git(&["show", "-s", "--format=%B", reference])?;
        Ok(CommitMessage::parse(&raw))
    }

    /// The current branch.
    ///
    /// `GIT_BRANCH` and `GITHUB_REF` take precedence over the working copy, since CI systems
    /// usually check out a detached HEAD.
    #[tracing::instrument(skip(self))]
    pub fn branch(&self) -> Result<String> {
        let git_ref = self
            .runtime
            .env_var("GIT_BRANCH")
            .or_else(|_| self.runtime.env_var("GITHUB_REF"))
            .ok()
            .filter(|r| !r.is_empty());

        if let Some(git_ref) = git_ref {
            debug!("Branch from environment: {}", git_ref);
            return match branch_from_ref(&git_ref) {
                Some(branch) => Ok(branch),
                None => bail!("Could not determine branch from ref '{}'", git_ref),
            };
        }

        let output = self.git(&["branch"])?;
        match parse_current_branch(&output) {
            Some(branch) => Ok(branch),
            None => bail!("Could not determine current git branch"),
        }
    }

    pub fn status_porcelain(&self, pathspec: &[&str]) -> Result<String> {
        let mut args = vec!["status", "--porcelain", "--untracked-files=no"];
        args.extend_from_slice(pathspec);
        Ok(self.git(&args)?.trim().to_string())
    }

    /// Whether tracked files have uncommitted changes.
    pub fn is_dirty(&self, pathspec: &[&str]) -> Result<bool> {
        Ok(!self.status_porcelain(pathspec)?.is_empty())
    }

    pub fn config_value(&self, key: &str) -> Result<String> {
        Ok(self.exec(&["config", key])?.stdout.trim().to_string())
    }

    pub fn checkout(&self, branch: &str) -> Result<String> {
        self.git(&["checkout", branch])
    }

    pub fn add(&self, files: &[&str]) -> Result<String> {
        let mut args = vec!["add"];
        args.extend_from_slice(files);
        self.git(&args)
    }

    pub fn commit(&self, message: &str) -> Result<String> {
        self.git(&["commit", "--allow-empty", "-m", message])
    }

    pub fn tag(&self, name: &str) -> Result<String> {
        self.git(&["tag", name])
    }

    pub fn push(&self, remote: &str, branch: &str) -> Result<String> {
        let output = self.exec(&["push", remote, branch])?;
        if !output.success {
            bail!("git push {} {} failed: {}", remote, branch, output.combined().trim());
        }
        Ok(output.combined().trim().to_string())
    }

    pub fn push_tags(&self) -> Result<String> {
        let output = self.exec(&["push", "--tags"])?;
        if !output.success {
            bail!("git push --tags failed: {}", output.combined().trim());
        }
        Ok(output.combined().trim().to_string())
    }

    pub fn remote_url(&self, remote: &str) -> Result<String> {
        Ok(self.git(&["remote", "get-url", remote])?.trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::MockRuntime;
    use mockall::predicate::eq;

    fn expect_git(runtime: &mut MockRuntime, args: &'static [&'static str], output: CommandOutput) {
        runtime
            .expect_run()
            .withf(move |program, a, _| {
                program.to_string() == "git" && a.iter().map(|s| s.as_str()).eq(args.iter().copied())
            })
            .returning(move |_, _, _| Ok(output.clone()));
    }

    fn no_branch_env(runtime: &mut MockRuntime) {
        runtime
            .expect_env_var()
            .with(eq("GIT_BRANCH"))
            .returning(|_| Err(std::env::VarError::NotPresent));
        runtime
            .expect_env_var()
            .with(eq("GITHUB_REF"))
            .returning(|_| Err(std::env::VarError::NotPresent));
    }

    #[test]
    fn test_tag_list_and_existing_tag() {
        let mut runtime = MockRuntime::new();
        expect_git(
            &mut runtime,
            &["tag", "--sort=-creatordate"],
            CommandOutput::ok("v1.1.0\nv1.0.0\n"),
        );

        let git = Git::new(&runtime, Path::new("/repo"));
        assert_eq!(git.tag_list().unwrap(), "v1.1.0\nv1.0.0");
        assert!(git.is_existing_tag("v1.0.0").unwrap());
        assert!(!git.is_existing_tag("v1.0").unwrap());
    }

    #[test]
    fn test_branch_from_git_branch_output() {
        let mut runtime = MockRuntime::new();
        no_branch_env(&mut runtime);
        expect_git(
            &mut runtime,
            &["branch"],
            CommandOutput::ok("  develop\n* feature/foo\n  master\n"),
        );

        let git = Git::new(&runtime, Path::new("/repo"));
        assert_eq!(git.branch().unwrap(), "feature/foo");
    }

    #[test]
    fn test_branch_from_environment() {
        let mut runtime = MockRuntime::new();
        runtime
            .expect_env_var()
            .with(eq("GIT_BRANCH"))
            .returning(|_| Err(std::env::VarError::NotPresent));
        runtime
            .expect_env_var()
            .with(eq("GITHUB_REF"))
            .returning(|_| Ok("refs/tags/v1.0.0-beta.3".to_string()));

        let git = Git::new(&runtime, Path::new("/repo"));
        assert_eq!(git.branch().unwrap(), "beta");
    }

    #[test]
    fn test_git_branch_env_wins() {
        let mut runtime = MockRuntime::new();
        runtime
            .expect_env_var()
            .with(eq("GIT_BRANCH"))
            .returning(|_| Ok("refs/heads/develop".to_string()));

        let git = Git::new(&runtime, Path::new("/repo"));
        assert_eq!(git.branch().unwrap(), "develop");
    }

    #[test]
    fn test_is_dirty() {
        let mut runtime = MockRuntime::new();
        expect_git(
            &mut runtime,
            &["status", "--porcelain", "--untracked-files=no"],
            CommandOutput::ok(" M package.json\n"),
        );
        expect_git(
            &mut runtime,
            &["status", "--porcelain", "--untracked-files=no", "setup.py"],
            CommandOutput::ok(""),
        );

        let git = Git::new(&runtime, Path::new("/repo"));
        assert!(git.is_dirty(&[]).unwrap());
        assert!(!git.is_dirty(&["setup.py"]).unwrap());
    }

    #[test]
    fn test_failing_git_command_is_an_error() {
        let mut runtime = MockRuntime::new();
        expect_git(
            &mut runtime,
            &["tag", "v1.0.0"],
            CommandOutput::failed("fatal: tag 'v1.0.0' already exists"),
        );

        let git = Git::new(&runtime, Path::new("/repo"));
        let err = git.tag("v1.0.0").unwrap_err();
        assert!(err.to_string().contains("already exists"));
    }

    #[test]
    fn test_try_commit_sha_unknown_ref() {
        let mut runtime = MockRuntime::new();
        expect_git(
            &mut runtime,
            &["rev-parse", "--verify", "--quiet", "v9.9.9^"],
            CommandOutput::failed(""),
        );

        let git = Git::new(&runtime, Path::new("/repo"));
        assert_eq!(git.try_commit_sha("v9.9.9^").unwrap(), None);
    }

    #[test]
    fn test_full_commit_message() {
        let mut runtime = MockRuntime::new();
        expect_git(
            &mut runtime,
            &["show", "-s", "--format=%B", "v1.0.0"],
            CommandOutput::ok("Release v1.0.0\n\n# Changelog\n\n[skip ci]\n\n"),
        );

        let git = Git::new(&runtime, Path::new("/repo"));
        let message = git.full_commit_message("v1.0.0").unwrap();
        assert_eq!(message.subject, "Release v1.0.0");
        assert_eq!(message.body, "# Changelog\n\n[skip ci]");
    }
}

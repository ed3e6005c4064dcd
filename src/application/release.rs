//! Release state of the working copy.
//!
//! Combines:
//! - the package version from the manifest
//! - the current branch and the tag list from git
//!
//! into the next version and the retry-run checks shared by the release commands.

use anyhow::Result;
use log::debug;

use crate::git::Git;
use crate::package::Package;
use crate::runtime::Runtime;
use crate::version::{
    expected_latest_version, increment_version, pre_version_for_commit, pre_version_name,
    previous_stable_version, version_tag,
};

pub struct ReleaseContext<'a, R: Runtime> {
    runtime: &'a R,
    package: Package,
    git: Git<'a, R>,
}

impl<'a, R: Runtime> ReleaseContext<'a, R> {
    pub fn new(runtime: &'a R, package: Package) -> Self {
        let git = Git::new(runtime, &package.dir);
        Self {
            runtime,
            package,
            git,
        }
    }

    pub fn git(&self) -> &Git<'a, R> {
        &self.git
    }

    pub fn package(&self) -> &Package {
        &self.package
    }

    pub fn package_version(&self) -> Result<String> {
        self.package.version(self.runtime)
    }

    pub fn package_version_tag(&self) -> Result<String> {
        self.package.version_tag(self.runtime)
    }

    pub fn branch(&self) -> Result<String> {
        self.git.branch()
    }

    pub fn tag_list(&self) -> Result<String> {
        self.git.tag_list()
    }

    /// The version the next build releases.
    ///
    /// On primary branches the pre-version is incremented; anywhere else a unique version
    /// is derived from the branch, the commit and the clock.
    #[tracing::instrument(skip(self))]
    pub fn next_version(&self) -> Result<String> {
        let package_version = self.package_version()?;
        let branch = self.branch()?;
        let tag_list = self.tag_list()?;

        if let Some(version) = increment_version(&package_version, &branch, &tag_list) {
            return Ok(version);
        }

        let sha = self.git.commit_sha("HEAD")?;
        let millis = u64::try_from(self.runtime.now().timestamp_millis()).unwrap_or_default();
        Ok(pre_version_for_commit(&package_version, &branch, &sha, millis))
    }

    pub fn next_version_tag(&self) -> Result<String> {
        Ok(version_tag(&self.next_version()?))
    }

    /// Tag of the stable release preceding the package version, if there is one.
    pub fn prev_version_tag(&self) -> Result<Option<String>> {
        let package_version = self.package_version()?;
        let tag_list = self.tag_list()?;
        Ok(previous_stable_version(&package_version, &tag_list).map(|v| version_tag(&v)))
    }

    /// `HEAD` already carries the package version tag and the next version would stay in
    /// the same release channel: the push that triggered this build was the release commit
    /// itself.
    #[tracing::instrument(skip(self))]
    pub fn is_redundant_run(&self) -> Result<bool> {
        let current_tag = self.package_version_tag()?;
        if !self.git.tags_pointing_at("HEAD")?.contains(&current_tag) {
            return Ok(false);
        }

        let next_version = self.next_version()?;
        let same_channel = pre_version_name(&current_tag) == pre_version_name(&next_version);
        debug!(
            "HEAD is tagged {}, next version {}, same channel: {}",
            current_tag, next_version, same_channel
        );
        Ok(same_channel)
    }

    /// The version a previous, partially successful build of this commit already tagged.
    ///
    /// That build committed the version bump and tagged it, so `HEAD` is the parent of the
    /// tagged commit.
    #[tracing::instrument(skip(self))]
    pub fn partially_successful_build_version(&self) -> Result<Option<String>> {
        let package_version = self.package_version()?;
        let branch = self.branch()?;
        let tag_list = self.tag_list()?;

        let Some(latest) = expected_latest_version(&package_version, &branch, &tag_list) else {
            return Ok(None);
        };
        let latest_tag = version_tag(&latest);

        if !self.git.is_existing_tag(&latest_tag)? {
            return Ok(None);
        }

        let head = self.git.commit_sha("HEAD")?;
        let tag_parent = self.git.try_commit_sha(&format!("{}^", latest_tag))?;

        Ok((tag_parent.as_deref() == Some(head.as_str())).then_some(latest))
    }

    pub fn is_retry_run_for_partially_successful_build(&self) -> Result<bool> {
        Ok(self.partially_successful_build_version()?.is_some())
    }
}

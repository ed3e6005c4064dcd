use anyhow::Result;
use std::path::Path;

use crate::git::Git;
use crate::runtime::{Runtime, env_flag};

mod badge;
mod branch_guard;
mod changelog;
mod commit_and_tag;
pub mod config;
mod github_release;
mod inspect_setup;
mod npm;
mod prepare_version;
mod subpackage;
mod version;

pub use badge::Badge;
pub use branch_guard::BranchGuard;
pub use changelog::create_changelog;
pub use commit_and_tag::{CommitOptions, SKIP_CI_MESSAGE, commit_and_tag_version, release_commit_message};
pub use github_release::{ReleaseOptions, update_github_release};
pub use inspect_setup::inspect_setup;
pub use npm::{
    PublishOptions, fail_on_pre_version_dependencies, matching_dependencies, npm_install_only,
    publish_npm_package,
};
pub use prepare_version::{PrepareOptions, PrepareOutcome, prepare_version};
pub use subpackage::{SubpackageOptions, copy_and_commit_version_for_subpackage};
pub use version::{get_version, set_version};

/// Setting this to `true` has the same effect as passing `--force`.
pub const FORCE_PUBLISH_ENV: &str = "CI_TOOLS_FORCE_PUBLISH";

pub fn is_forced<R: Runtime>(runtime: &R, force_flag: bool) -> bool {
    force_flag || env_flag(runtime, FORCE_PUBLISH_ENV)
}

/// Whether the command may run on the current branch.
///
/// Only asks git for the branch if the guard restricts anything.
pub fn branch_allowed<R: Runtime>(
    runtime: &R,
    dir: &Path,
    guard: BranchGuard,
    badge: Badge,
) -> Result<bool> {
    if !guard.needs_branch() {
        return Ok(true);
    }
    let branch = Git::new(runtime, dir).branch()?;
    Ok(guard.check(badge, &branch))
}

//! Pre-version incrementing.
//!
//! The "base" of a version is never changed, only its pre-version suffix:
//!
//! ```text
//! 1.2.0-alpha.14   develop
//! 1.2.0-beta.2     beta
//! 1.2.0            master
//! ^^^^^ base version
//! ```
//!
//! The suffix number is derived from the tags that already exist for the base version, so
//! subsequent builds on the same branch count up.

use super::parse::ReleaseChannel;

/// Branches that produce releases.
pub const PRIMARY_BRANCHES: [&str; 3] = ["develop", "beta", "master"];

pub fn is_primary_branch(branch: &str) -> bool {
    PRIMARY_BRANCHES.contains(&branch)
}

/// Strips any pre-version suffix and a leading `v`: `v1.2.0-alpha.3` -> `1.2.0`.
pub fn target_version(version: &str) -> String {
    let base = version.split('-').next().unwrap_or(version);
    let base = base.trim();
    base.strip_prefix('v').unwrap_or(base).to_string()
}

fn pre_version_channel(branch: &str) -> Option<ReleaseChannel> {
    ReleaseChannel::from_branch(branch).filter(|c| *c != ReleaseChannel::Stable)
}

/// Existing suffix numbers for `v{target}-{channel}` in the newline-separated tag list.
fn existing_suffix_numbers(target: &str, channel: ReleaseChannel, tag_list: &str) -> Vec<u32> {
    let prefix = format!("v{}-{}", target, channel);

    tag_list
        .lines()
        .map(str::trim)
        .filter(|tag| tag.starts_with(&prefix))
        .filter_map(trailing_number)
        .collect()
}

fn trailing_number(tag: &str) -> Option<u32> {
    let digits: String = tag
        .chars()
        .rev()
        .take_while(|c| c.is_ascii_digit())
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect();
    digits.parse().ok()
}

/// The suffix number the next pre-version of `base_version` on `branch` gets.
///
/// Returns `None` for branches without a pre-version suffix (`master` and non-primary branches).
pub fn find_next_suffix_number(base_version: &str, branch: &str, tag_list: &str) -> Option<u32> {
    let channel = pre_version_channel(branch)?;
    let target = target_version(base_version);

    let highest = existing_suffix_numbers(&target, channel, tag_list)
        .into_iter()
        .max();

    Some(highest.map_or(1, |n| n + 1))
}

/// The version the next build on `branch` should carry, or `None` outside the primary branches.
pub fn increment_version(package_version: &str, branch: &str, tag_list: &str) -> Option<String> {
    let target = target_version(package_version);

    match ReleaseChannel::from_branch(branch)? {
        ReleaseChannel::Stable => Some(target),
        channel => {
            let number = find_next_suffix_number(package_version, branch, tag_list)?;
            Some(format!("{}-{}.{}", target, channel, number))
        }
    }
}

/// The newest version already tagged for `branch`, i.e. what the previous build of this
/// branch released.
pub fn expected_latest_version(
    package_version: &str,
    branch: &str,
    tag_list: &str,
) -> Option<String> {
    let target = target_version(package_version);

    match ReleaseChannel::from_branch(branch)? {
        ReleaseChannel::Stable => Some(target),
        channel => existing_suffix_numbers(&target, channel, tag_list)
            .into_iter()
            .max()
            .map(|n| format!("{}-{}.{}", target, channel, n)),
    }
}

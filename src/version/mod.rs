//! Version arithmetic for release builds.
//!
//! Everything in here is pure: inputs are version strings, branch names and the
//! newline-separated output of `git tag`.

mod increment;
mod parse;
mod previous;

pub use increment::{
    PRIMARY_BRANCHES, expected_latest_version, find_next_suffix_number, increment_version,
    is_primary_branch, target_version,
};
pub use parse::{ParsedVersion, ReleaseChannel, parse_version};
pub use previous::{compare_versions, previous_stable_version, sorted_versions};

/// The git tag for a version: `1.2.0` -> `v1.2.0`.
pub fn version_tag(version: &str) -> String {
    format!("v{}", version)
}

/// A unique pre-version for builds outside the primary branches:
/// `{base}-{branch prefix}-{short sha}-{timestamp}`.
///
/// The branch prefix is the part before the first `/` (`feature/foo` -> `feature`).
pub fn pre_version_for_commit(
    package_version: &str,
    branch: &str,
    sha: &str,
    timestamp_millis: u64,
) -> String {
    let base = package_version.split('-').next().unwrap_or(package_version);
    let branch_prefix = branch.split('/').next().unwrap_or(branch);
    let short_sha: String = sha.chars().take(6).collect();

    format!(
        "{}-{}-{}-{}",
        base,
        branch_prefix,
        short_sha,
        to_base36(timestamp_millis)
    )
}

fn to_base36(mut value: u64) -> String {
    const DIGITS: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

    if value == 0 {
        return "0".to_string();
    }

    let mut out = Vec::new();
    while value > 0 {
        out.push(DIGITS[(value % 36) as usize]);
        value /= 36;
    }
    out.reverse();
    String::from_utf8(out).unwrap_or_default()
}

/// The release channel a version tag or version belongs to, as written in the version:
/// `v1.2.0-alpha.3` -> `alpha`, `1.2.0` -> `None`.
pub fn pre_version_name(tag_or_version: &str) -> Option<String> {
    let version = tag_or_version.strip_prefix('v').unwrap_or(tag_or_version);
    let (_, suffix) = version.split_once('-')?;
    let name = suffix.split('.').next().unwrap_or(suffix);
    let name = name.trim_end_matches(|c: char| c.is_ascii_digit());
    (!name.is_empty()).then(|| name.to_string())
}

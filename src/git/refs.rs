use crate::version::parse_version;

const TAG_REF_PREFIX: &str = "refs/tags/";
const HEAD_REF_PREFIX: &str = "refs/heads/";
const CURRENT_BRANCH_MARKER: &str = "* ";

/// The primary branch a release tag was built from, e.g. `refs/tags/v1.0.0-beta.18` -> `beta`.
///
/// Tags that are not release versions yield `None`.
pub fn branch_from_ref_tag(git_ref: &str) -> Option<String> {
    let tag = git_ref.strip_prefix(TAG_REF_PREFIX).unwrap_or(git_ref);
    let version = tag.strip_prefix('v').unwrap_or(tag);

    parse_version(version).map(|parsed| parsed.channel.branch().to_string())
}

/// Branch name for a ref from the CI environment (`GIT_BRANCH`/`GITHUB_REF`).
pub fn branch_from_ref(git_ref: &str) -> Option<String> {
    if git_ref.starts_with(TAG_REF_PREFIX) {
        return branch_from_ref_tag(git_ref);
    }

    Some(
        git_ref
            .strip_prefix(HEAD_REF_PREFIX)
            .unwrap_or(git_ref)
            .to_string(),
    )
}

/// Picks the line marked with `*` from `git branch` output.
pub fn parse_current_branch(output: &str) -> Option<String> {
    output
        .lines()
        .find_map(|line| line.trim_end().strip_prefix(CURRENT_BRANCH_MARKER))
        .map(|branch| branch.trim().to_string())
}

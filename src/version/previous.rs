use semver::Version;
use std::cmp::Ordering;

fn strip_v(tag: &str) -> &str {
    let tag = tag.trim();
    tag.strip_prefix('v').unwrap_or(tag)
}

/// Compare two version strings by semantic-version precedence. A leading `v` is ignored.
///
/// Versions that are not valid semver sort before all valid ones.
pub fn compare_versions(a: &str, b: &str) -> Ordering {
    match (Version::parse(strip_v(a)), Version::parse(strip_v(b))) {
        (Ok(va), Ok(vb)) => va.cmp(&vb),
        (Ok(_), Err(_)) => Ordering::Greater,
        (Err(_), Ok(_)) => Ordering::Less,
        (Err(_), Err(_)) => a.cmp(b),
    }
}

/// All versions found in a newline-separated tag list, without `v` prefix, ascending.
///
/// Lines that are not versions (e.g. free-form tags) are skipped.
pub fn sorted_versions(tag_list: &str) -> Vec<String> {
    let mut versions: Vec<String> = tag_list
        .lines()
        .map(strip_v)
        .filter(|v| Version::parse(v).is_ok())
        .map(String::from)
        .collect();
    versions.sort_by(|a, b| compare_versions(a, b));
    versions
}

fn is_pre_version(version: &str) -> bool {
    version.contains('-')
}

/// The stable version released right before `current`.
///
/// `current` is placed among the stable tags of `tag_list` and its predecessor is returned.
pub fn previous_stable_version(current: &str, tag_list: &str) -> Option<String> {
    let current = strip_v(current).to_string();

    let mut candidates: Vec<String> = sorted_versions(tag_list)
        .into_iter()
        .filter(|v| !is_pre_version(v))
        .collect();
    candidates.push(current.clone());
    candidates.sort_by(|a, b| compare_versions(a, b));

    let index = candidates.iter().position(|v| *v == current)?;
    index.checked_sub(1).map(|i| candidates[i].clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    const GIT_TAG_LIST: &str = "v1.2.0
v1.2.1-alpha10
v1.2.1-alpha7
v1.2.1-alpha8
v1.2.1-alpha9
v2.0.0-alpha1
v2.0.0-alpha2
v2.0.0-alpha3
v2.0.1
v2.1.0-beta1
v3.2.0";

    #[test]
    fn test_previous_for_first_alpha_of_new_version() {
        assert_eq!(previous_stable_version("3.2.1", GIT_TAG_LIST).as_deref(), Some("3.2.0"));
    }

    #[test]
    fn test_previous_for_unknown_pre_version_suffix() {
        assert_eq!(
            previous_stable_version("3.2.1-asdf5", GIT_TAG_LIST).as_deref(),
            Some("3.2.0")
        );
    }

    #[test]
    fn test_previous_for_subsequent_alpha() {
        assert_eq!(
            previous_stable_version("1.2.1-alpha7", GIT_TAG_LIST).as_deref(),
            Some("1.2.0")
        );
    }

    #[test]
    fn test_previous_for_subsequent_beta() {
        assert_eq!(
            previous_stable_version("2.1.0-beta3", GIT_TAG_LIST).as_deref(),
            Some("2.0.1")
        );
    }

    #[test]
    fn test_previous_for_alpha_of_next_minor() {
        assert_eq!(
            previous_stable_version("3.3.0-alpha42", GIT_TAG_LIST).as_deref(),
            Some("3.2.0")
        );
        assert_eq!(
            previous_stable_version("2.0.0-alpha4", GIT_TAG_LIST).as_deref(),
            Some("1.2.0")
        );
    }

    #[test]
    fn test_previous_with_v_prefix_and_no_predecessor() {
        assert_eq!(previous_stable_version("v3.2.1", GIT_TAG_LIST).as_deref(), Some("3.2.0"));
        assert_eq!(previous_stable_version("1.0.0", GIT_TAG_LIST), None);
        assert_eq!(previous_stable_version("1.0.0", ""), None);
    }

    #[test]
    fn test_sorted_versions_skips_free_form_tags() {
        let versions = sorted_versions("v2.0.0\nmy-tag\nv1.0.0\n\nv1.0.0-alpha.1");
        assert_eq!(versions, vec!["1.0.0-alpha.1", "1.0.0", "2.0.0"]);
    }

    #[test]
    fn test_compare_versions() {
        assert_eq!(compare_versions("v1.2.0", "1.10.0"), Ordering::Less);
        assert_eq!(compare_versions("1.2.0-beta.1", "1.2.0"), Ordering::Less);
        assert_eq!(compare_versions("1.2.0-beta.1", "1.2.0-alpha.9"), Ordering::Greater);
        assert_eq!(compare_versions("garbage", "1.0.0"), Ordering::Less);
    }
}

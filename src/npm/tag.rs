/// The npm dist-tag a build of `branch` is published under.
///
/// `master` publishes without a tag (npm's `latest`); other non-primary branches get their
/// name with `/` replaced by `~`, since dist-tags may not contain slashes.
pub fn npm_tag(branch: &str) -> Option<String> {
    match branch {
        "develop" => Some("alpha".to_string()),
        "beta" => Some("beta".to_string()),
        "master" => None,
        other => Some(other.replace('/', "~")),
    }
}

use regex::Regex;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

static VERSION_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d+\.\d+\.\d+)(?:-(alpha|beta)\.?(\d+))?$").expect("valid version regex")
});

/// Release channel of a version. Each channel belongs to exactly one primary branch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReleaseChannel {
    Alpha,
    Beta,
    Stable,
}

impl ReleaseChannel {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReleaseChannel::Alpha => "alpha",
            ReleaseChannel::Beta => "beta",
            ReleaseChannel::Stable => "stable",
        }
    }

    /// The git branch releases of this channel are built from.
    pub fn branch(&self) -> &'static str {
        match self {
            ReleaseChannel::Alpha => "develop",
            ReleaseChannel::Beta => "beta",
            ReleaseChannel::Stable => "master",
        }
    }

    pub fn from_branch(branch: &str) -> Option<Self> {
        match branch {
            "develop" => Some(ReleaseChannel::Alpha),
            "beta" => Some(ReleaseChannel::Beta),
            "master" => Some(ReleaseChannel::Stable),
            _ => None,
        }
    }
}

impl fmt::Display for ReleaseChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReleaseChannel {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "alpha" => Ok(ReleaseChannel::Alpha),
            "beta" => Ok(ReleaseChannel::Beta),
            "stable" => Ok(ReleaseChannel::Stable),
            _ => anyhow::bail!("Unknown release channel: {}", s),
        }
    }
}

/// A version split into its base and release channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedVersion {
    /// `major.minor.patch`
    pub base: String,
    pub channel: ReleaseChannel,
    /// Pre-release counter; `None` for stable versions.
    pub number: Option<u32>,
}

/// Parse `X.Y.Z`, `X.Y.Z-alpha.N` or `X.Y.Z-beta.N` (the dot before `N` is optional).
///
/// Dist-tags like `alpha` and unknown pre-version suffixes yield `None`.
pub fn parse_version(version: &str) -> Option<ParsedVersion> {
    let captures = VERSION_REGEX.captures(version.trim())?;
    let base = captures.get(1)?.as_str().to_string();

    match (captures.get(2), captures.get(3)) {
        (Some(channel), Some(number)) => Some(ParsedVersion {
            base,
            channel: channel.as_str().parse().ok()?,
            number: number.as_str().parse().ok(),
        }),
        _ => Some(ParsedVersion {
            base,
            channel: ReleaseChannel::Stable,
            number: None,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_version_dist_tag() {
        assert_eq!(parse_version("alpha"), None);
    }

    #[test]
    fn test_parse_version_stable() {
        assert_eq!(
            parse_version("2.2.0"),
            Some(ParsedVersion {
                base: "2.2.0".to_string(),
                channel: ReleaseChannel::Stable,
                number: None,
            })
        );
    }

    #[test]
    fn test_parse_version_alpha() {
        assert_eq!(
            parse_version("2.2.0-alpha.5"),
            Some(ParsedVersion {
                base: "2.2.0".to_string(),
                channel: ReleaseChannel::Alpha,
                number: Some(5),
            })
        );
    }

    #[test]
    fn test_parse_version_beta() {
        assert_eq!(
            parse_version("0.2.0-beta.8"),
            Some(ParsedVersion {
                base: "0.2.0".to_string(),
                channel: ReleaseChannel::Beta,
                number: Some(8),
            })
        );
    }

    #[test]
    fn test_parse_version_without_dot() {
        let parsed = parse_version("1.2.1-alpha10").unwrap();
        assert_eq!(parsed.channel, ReleaseChannel::Alpha);
        assert_eq!(parsed.number, Some(10));
    }

    #[test]
    fn test_parse_version_unknown_suffix() {
        assert_eq!(parse_version("3.2.1-asdf5"), None);
        assert_eq!(parse_version("1dd.0.0-alpha.18"), None);
    }

    #[test]
    fn test_channel_branch_mapping() {
        assert_eq!(ReleaseChannel::Alpha.branch(), "develop");
        assert_eq!(ReleaseChannel::Beta.branch(), "beta");
        assert_eq!(ReleaseChannel::Stable.branch(), "master");
        assert_eq!(ReleaseChannel::from_branch("develop"), Some(ReleaseChannel::Alpha));
        assert_eq!(ReleaseChannel::from_branch("feature/foo"), None);
        assert!("channel".parse::<ReleaseChannel>().is_err());
    }
}

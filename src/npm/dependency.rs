use serde_json::{Map, Value};
use std::fmt;

/// A dependency entry of `package.json`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dependency {
    pub name: String,
    pub version: String,
}

impl Dependency {
    pub fn new(name: &str, version: &str) -> Self {
        Self {
            name: name.to_string(),
            version: version.to_string(),
        }
    }

    /// Requirement on a pre-release, e.g. `1.2.3-beta.1`.
    pub fn is_pre_version(&self) -> bool {
        self.version.contains('-')
    }

    /// Pinned requirement, i.e. not a `^` or `~` range.
    pub fn is_strict(&self) -> bool {
        !(self.version.starts_with('^') || self.version.starts_with('~'))
    }

    /// Whether the package name starts with any of `patterns`.
    pub fn matches_any(&self, patterns: &[String]) -> bool {
        patterns.iter().any(|p| self.name.starts_with(p.as_str()))
    }
}

impl fmt::Display for Dependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.name, self.version)
    }
}

/// Entries of a `dependencies`-style object, in file order. Non-string versions are skipped.
pub fn to_dependencies(map: &Map<String, Value>) -> Vec<Dependency> {
    map.iter()
        .filter_map(|(name, version)| version.as_str().map(|v| Dependency::new(name, v)))
        .collect()
}

/// `dependencies` followed by `devDependencies` of a parsed `package.json`.
pub fn all_dependencies(package_json: &Value) -> Vec<Dependency> {
    ["dependencies", "devDependencies"]
        .iter()
        .filter_map(|key| package_json.get(*key).and_then(Value::as_object))
        .flat_map(to_dependencies)
        .collect()
}

use anyhow::{Result, bail};

use crate::version::{PRIMARY_BRANCHES, is_primary_branch};

use super::Badge;

/// Restriction from `--only-on-primary-branches` / `--except-on-primary-branches`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BranchGuard {
    Any,
    OnlyPrimary,
    ExceptPrimary,
}

impl BranchGuard {
    pub fn from_flags(only_on_primary: bool, except_on_primary: bool) -> Result<Self> {
        match (only_on_primary, except_on_primary) {
            (true, true) => bail!(
                "Both --only-on-primary-branches and --except-on-primary-branches given. This can not work!"
            ),
            (true, false) => Ok(BranchGuard::OnlyPrimary),
            (false, true) => Ok(BranchGuard::ExceptPrimary),
            (false, false) => Ok(BranchGuard::Any),
        }
    }

    pub fn needs_branch(&self) -> bool {
        *self != BranchGuard::Any
    }

    pub fn allows(&self, branch: &str) -> bool {
        match self {
            BranchGuard::Any => true,
            BranchGuard::OnlyPrimary => is_primary_branch(branch),
            BranchGuard::ExceptPrimary => !is_primary_branch(branch),
        }
    }

    /// Check `branch`, printing why the command is skipped if it is not allowed.
    pub fn check(&self, badge: Badge, branch: &str) -> bool {
        if self.allows(branch) {
            return true;
        }

        let flag = match self {
            BranchGuard::OnlyPrimary => "--only-on-primary-branches",
            _ => "--except-on-primary-branches",
        };
        badge.line(format!("{} given.", flag));
        badge.line(format!(
            "Current branch is '{}' (primary branches are {}).",
            branch,
            PRIMARY_BRANCHES.join(", ")
        ));
        badge.line("Nothing to do here. Exiting.");
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_both_flags_is_an_error() {
        assert!(BranchGuard::from_flags(true, true).is_err());
    }

    #[test]
    fn test_only_on_primary() {
        let guard = BranchGuard::from_flags(true, false).unwrap();
        assert!(guard.needs_branch());
        assert!(guard.allows("develop"));
        assert!(guard.allows("master"));
        assert!(!guard.allows("feature/x"));
    }

    #[test]
    fn test_except_on_primary() {
        let guard = BranchGuard::from_flags(false, true).unwrap();
        assert!(!guard.allows("beta"));
        assert!(guard.allows("feature/x"));
    }

    #[test]
    fn test_any() {
        let guard = BranchGuard::from_flags(false, false).unwrap();
        assert!(!guard.needs_branch());
        assert!(guard.check(Badge("test"), "whatever"));
    }
}

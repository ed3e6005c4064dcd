//! Application layer - release state derived from the package manifest and git.
//!
//! Commands ask a [`ReleaseContext`] what the next version is and whether the current build
//! is a retry, and act on the answer.

mod release;

pub use release::ReleaseContext;

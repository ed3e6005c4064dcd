pub mod application;
pub mod changelog;
pub mod commands;
pub mod git;
pub mod github;
pub mod npm;
pub mod package;
pub mod retry;
pub mod runtime;
pub mod version;

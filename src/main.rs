use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;

use ci_tools::commands::{
    self, Badge, BranchGuard, CommitOptions, PrepareOptions, PublishOptions, ReleaseOptions,
    SubpackageOptions, config::Config,
};
use ci_tools::package::{Package, PackageMode};
use ci_tools::runtime::RealRuntime;

/// ci_tools - release tooling for CI pipelines
///
/// Computes pre-versions from branch and tags, writes them into npm, python and .NET
/// packages, commits, tags and publishes them.
///
/// If the GH_TOKEN environment variable is set, it is used to authenticate against the
/// GitHub API.
///
/// Examples:
///   ci_tools prepare-version --allow-dirty-workdir
///   ci_tools commit-and-tag-version --only-on-primary-branches
#[derive(Parser, Debug)]
#[command(author, version = env!("CI_TOOLS_VERSION"), about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Package directory (defaults to the current directory)
    #[arg(long = "dir", value_name = "PATH", global = true)]
    pub dir: Option<PathBuf>,

    /// GitHub API URL (defaults to https://api.github.com)
    #[arg(
        long = "api-url",
        env = "CI_TOOLS_GITHUB_API_URL",
        value_name = "URL",
        global = true
    )]
    pub api_url: Option<String>,

    /// Only run on develop, beta and master
    #[arg(long, global = true)]
    pub only_on_primary_branches: bool,

    /// Do not run on develop, beta and master
    #[arg(long, global = true)]
    pub except_on_primary_branches: bool,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Print the package version
    GetVersion(GetVersionArgs),

    /// Write a version into the package manifest
    SetVersion(SetVersionArgs),

    /// Compute the next version and write it into the package manifest
    PrepareVersion(PrepareVersionArgs),

    /// Commit the version bump, tag it and push
    CommitAndTagVersion(CommitAndTagArgs),

    /// Copy the package version into an npm subpackage, commit and push
    CopyAndCommitVersionForSubpackage(SubpackageArgs),

    /// Fail if package.json requires pre-versions of any dependency
    FailOnPreVersionDependencies,

    /// Install only the dependencies whose names start with the given patterns
    NpmInstallOnly(NpmInstallOnlyArgs),

    /// Publish the npm package and verify the registry lists it
    PublishNpmPackage(PublishArgs),

    /// Create or update the GitHub release for a version tag
    UpdateGithubRelease(UpdateGithubReleaseArgs),

    /// Print the changelog for the next version
    CreateChangelog(CreateChangelogArgs),

    /// Print the python package manifest read from setup.py
    InspectSetup(InspectSetupArgs),
}

impl Commands {
    fn badge(&self) -> Badge {
        Badge(match self {
            Commands::GetVersion(_) => "get-version",
            Commands::SetVersion(_) => "set-version",
            Commands::PrepareVersion(_) => "prepare-version",
            Commands::CommitAndTagVersion(_) => "commit-and-tag-version",
            Commands::CopyAndCommitVersionForSubpackage(_) => {
                "copy-and-commit-version-for-subpackage"
            }
            Commands::FailOnPreVersionDependencies => "fail-on-pre-version-dependencies",
            Commands::NpmInstallOnly(_) => "npm-install-only",
            Commands::PublishNpmPackage(_) => "publish-npm-package",
            Commands::UpdateGithubRelease(_) => "update-github-release",
            Commands::CreateChangelog(_) => "create-changelog",
            Commands::InspectSetup(_) => "inspect-setup",
        })
    }
}

#[derive(clap::Args, Debug)]
pub struct PackageArgs {
    /// Package type
    #[arg(long, value_enum, default_value_t = PackageMode::Node)]
    pub mode: PackageMode,

    /// The .csproj file to use when there is more than one (dotnet mode)
    #[arg(long = "csproj-path", value_name = "PATH")]
    pub csproj_path: Option<PathBuf>,
}

impl PackageArgs {
    fn package(self, dir: &std::path::Path) -> Package {
        Package::new(self.mode, dir).with_csproj(self.csproj_path)
    }
}

#[derive(clap::Args, Debug)]
pub struct GetVersionArgs {
    #[command(flatten)]
    pub package: PackageArgs,

    /// Print only the major version
    #[arg(long)]
    pub major: bool,
}

#[derive(clap::Args, Debug)]
pub struct SetVersionArgs {
    #[command(flatten)]
    pub package: PackageArgs,

    /// The version to write
    #[arg(long = "version", value_name = "VERSION")]
    pub new_version: String,
}

#[derive(clap::Args, Debug)]
pub struct PrepareVersionArgs {
    #[command(flatten)]
    pub package: PackageArgs,

    /// Proceed even if tracked files have uncommitted changes
    #[arg(long)]
    pub allow_dirty_workdir: bool,

    #[arg(long)]
    pub dry: bool,

    /// Also implied by CI_TOOLS_FORCE_PUBLISH=true
    #[arg(long)]
    pub force: bool,
}

#[derive(clap::Args, Debug)]
pub struct CommitAndTagArgs {
    #[command(flatten)]
    pub package: PackageArgs,

    #[arg(long)]
    pub dry: bool,

    /// Also implied by CI_TOOLS_FORCE_PUBLISH=true
    #[arg(long)]
    pub force: bool,
}

#[derive(clap::Args, Debug)]
pub struct SubpackageArgs {
    /// Location of the subpackage, relative to the package directory
    #[arg(value_name = "DIR")]
    pub subpackage: PathBuf,

    #[command(flatten)]
    pub package: PackageArgs,

    #[arg(long)]
    pub dry: bool,

    /// Also implied by CI_TOOLS_FORCE_PUBLISH=true
    #[arg(long)]
    pub force: bool,
}

#[derive(clap::Args, Debug)]
pub struct NpmInstallOnlyArgs {
    /// Package name prefixes, e.g. "@process-engine/"
    #[arg(value_name = "PATTERN", required = true)]
    pub patterns: Vec<String>,

    #[arg(long)]
    pub dry: bool,
}

#[derive(clap::Args, Debug)]
pub struct PublishArgs {
    #[arg(long)]
    pub dry: bool,

    /// Publish with a dist-tag derived from the branch name
    #[arg(long)]
    pub create_tag_from_branch_name: bool,
}

#[derive(clap::Args, Debug)]
pub struct UpdateGithubReleaseArgs {
    #[command(flatten)]
    pub package: PackageArgs,

    /// Defaults to the tag of the package version
    #[arg(long, value_name = "TAG")]
    pub version_tag: Option<String>,

    #[arg(long)]
    pub title: Option<String>,

    #[arg(long)]
    pub text: Option<String>,

    /// Take title and text from the message of the version tag's commit
    #[arg(long)]
    pub use_title_and_text_from_git_tag: bool,

    #[arg(long)]
    pub dry: bool,
}

#[derive(clap::Args, Debug)]
pub struct CreateChangelogArgs {
    /// Defaults to the previous stable release
    #[arg(value_name = "START_REF")]
    pub start_ref: Option<String>,

    #[command(flatten)]
    pub package: PackageArgs,
}

#[derive(clap::Args, Debug)]
pub struct InspectSetupArgs {
    /// Print the manifest as JSON
    #[arg(long)]
    pub json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();

    let guard = BranchGuard::from_flags(cli.only_on_primary_branches, cli.except_on_primary_branches)?;
    let config = Config::new(RealRuntime, cli.dir, cli.api_url)?;
    let runtime = &config.runtime;
    let dir = config.dir.clone();

    if !commands::branch_allowed(runtime, &dir, guard, cli.command.badge())? {
        return Ok(());
    }

    match cli.command {
        Commands::GetVersion(args) => {
            commands::get_version(runtime, &args.package.package(&dir), args.major)?
        }
        Commands::SetVersion(args) => {
            commands::set_version(runtime, &args.package.package(&dir), &args.new_version)?
        }
        Commands::PrepareVersion(args) => {
            let options = PrepareOptions {
                allow_dirty_workdir: args.allow_dirty_workdir,
                dry: args.dry,
                force: commands::is_forced(runtime, args.force),
            };
            commands::prepare_version(runtime, args.package.package(&dir), options)?;
        }
        Commands::CommitAndTagVersion(args) => {
            let options = CommitOptions {
                dry: args.dry,
                force: commands::is_forced(runtime, args.force),
            };
            commands::commit_and_tag_version(&config, args.package.package(&dir), options).await?
        }
        Commands::CopyAndCommitVersionForSubpackage(args) => {
            let options = SubpackageOptions {
                dry: args.dry,
                force: commands::is_forced(runtime, args.force),
            };
            commands::copy_and_commit_version_for_subpackage(
                runtime,
                args.package.package(&dir),
                &args.subpackage,
                options,
            )?
        }
        Commands::FailOnPreVersionDependencies => {
            commands::fail_on_pre_version_dependencies(runtime, &dir)?
        }
        Commands::NpmInstallOnly(args) => {
            commands::npm_install_only(runtime, &dir, &args.patterns, args.dry)?
        }
        Commands::PublishNpmPackage(args) => {
            let options = PublishOptions {
                dry: args.dry,
                create_tag_from_branch_name: args.create_tag_from_branch_name,
            };
            commands::publish_npm_package(runtime, &dir, options)?
        }
        Commands::UpdateGithubRelease(args) => {
            let options = ReleaseOptions {
                version_tag: args.version_tag,
                title: args.title,
                text: args.text,
                use_title_and_text_from_git_tag: args.use_title_and_text_from_git_tag,
                dry: args.dry,
            };
            commands::update_github_release(&config, args.package.package(&dir), options).await?
        }
        Commands::CreateChangelog(args) => {
            commands::create_changelog(&config, args.package.package(&dir), args.start_ref).await?
        }
        Commands::InspectSetup(args) => commands::inspect_setup(runtime, &dir, args.json)?,
    }
    Ok(())
}

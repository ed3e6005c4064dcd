//! .NET projects described by a single `*.csproj` file.

use anyhow::{Context, Result, bail};
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use crate::runtime::Runtime;

static VERSION_ELEMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<Version>\s*([^<]+?)\s*</Version>").expect("valid regex"));
static PRODUCT_ELEMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<Product>\s*([^<]+?)\s*</Product>").expect("valid regex"));
static ASSEMBLY_NAME_ELEMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<AssemblyName>\s*([^<]+?)\s*</AssemblyName>").expect("valid regex")
});

/// The only `*.csproj` file in `dir`.
pub fn find_csproj<R: Runtime>(runtime: &R, dir: &Path) -> Result<PathBuf> {
    let pattern = format!("{}/*.csproj", dir.display());
    let mut candidates = runtime.glob(&pattern)?;

    match candidates.len() {
        0 => bail!("No .csproj file found in {}", dir.display()),
        1 => Ok(candidates.remove(0)),
        _ => bail!(
            "More than one .csproj file found, please specify one:\n{}",
            candidates
                .iter()
                .map(|p| format!("  {}", p.display()))
                .collect::<Vec<_>>()
                .join("\n")
        ),
    }
}

fn read_csproj<R: Runtime>(runtime: &R, path: &Path) -> Result<String> {
    runtime
        .read_to_string(path)
        .with_context(|| format!("Could not read {}", path.display()))
}

fn element(regex: &Regex, content: &str) -> Option<String> {
    regex
        .captures(content)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

pub fn package_version<R: Runtime>(runtime: &R, csproj: &Path) -> Result<String> {
    match element(&VERSION_ELEMENT, &read_csproj(runtime, csproj)?) {
        Some(version) => Ok(version),
        None => bail!("No <Version> element in {}", csproj.display()),
    }
}

/// `<Product>`, falling back to `<AssemblyName>`.
pub fn product_name<R: Runtime>(runtime: &R, csproj: &Path) -> Result<String> {
    let content = read_csproj(runtime, csproj)?;
    match element(&PRODUCT_ELEMENT, &content).or_else(|| element(&ASSEMBLY_NAME_ELEMENT, &content)) {
        Some(name) => Ok(name),
        None => bail!(
            "Neither <Product> nor <AssemblyName> found in {}",
            csproj.display()
        ),
    }
}

#[tracing::instrument(skip(runtime))]
pub fn set_package_version<R: Runtime>(runtime: &R, csproj: &Path, version: &str) -> Result<()> {
    let content = read_csproj(runtime, csproj)?;
    if VERSION_ELEMENT.find(&content).is_none() {
        bail!("No <Version> element in {}", csproj.display());
    }

    let replacement = format!("<Version>{}</Version>", version);
    let updated = VERSION_ELEMENT.replace(&content, regex::NoExpand(&replacement));
    runtime.write(csproj, updated.as_bytes())
}

use anyhow::Result;
use std::path::Path;

use crate::package::SetupManifest;
use crate::runtime::Runtime;

/// Load `setup.py` and `README.md` from `dir` and print the resulting manifest.
#[tracing::instrument(skip(runtime))]
pub fn inspect_setup<R: Runtime>(runtime: &R, dir: &Path, json: bool) -> Result<()> {
    let manifest = SetupManifest::load(runtime, dir)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&manifest)?);
    } else {
        print!("{}", manifest);
    }
    Ok(())
}

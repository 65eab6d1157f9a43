//! `reposync --init-config [--config <path>]`

use std::path::Path;

use anyhow::{Context, Result};
use colored::Colorize;

use reposync_core::write_template_at;

pub fn run(path: &Path) -> Result<()> {
    write_template_at(path)
        .with_context(|| format!("failed to write config template '{}'", path.display()))?;
    println!("{} Wrote config template to {}", "✓".green(), path.display());
    println!("  Edit repository.url (and token, if needed) before the first run.");
    Ok(())
}

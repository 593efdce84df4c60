// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use std::path::PathBuf;

use crate::config::{resolve_state_dir, Config};
use crate::error::{Error, Result};

/// Print the effective configuration as TOML.
pub fn show(state_dir: Option<PathBuf>) -> Result<()> {
    let state_dir = resolve_state_dir(state_dir)?;
    let config = Config::load(&state_dir)?;
    println!("# {}", state_dir.join("config.toml").display());
    print!("{}", toml::to_string_pretty(&config).map_err(|e| Error::Config(e.to_string()))?);
    Ok(())
}

/// Write a default config.toml, refusing to overwrite an existing one.
pub fn init(state_dir: Option<PathBuf>, url: Option<String>) -> Result<()> {
    let state_dir = resolve_state_dir(state_dir)?;
    let path = state_dir.join("config.toml");
    if path.exists() {
        return Err(Error::Config(format!(
            "{} already exists\n  hint: edit it directly",
            path.display()
        )));
    }

    let mut config = Config::default();
    if let Some(url) = url {
        config.remote.url = url;
    }
    config.validate()?;
    config.save(&state_dir)?;
    println!("Wrote {}", path.display());
    Ok(())
}

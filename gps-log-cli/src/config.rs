//! Profile file loading
//!
//! An optional TOML profile holds the same options as the command line;
//! explicit flags win over the profile, the profile wins over defaults.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Options loadable from a TOML profile (all optional)
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Profile {
    pub offset_bytes: Option<u64>,
    pub max_duration_seconds: Option<f64>,
    pub frequency_hz: Option<f64>,
    pub raw_while_seeking: Option<bool>,
    pub output_dir: Option<PathBuf>,
}

/// Load a profile from a TOML file
pub fn load_profile(path: &Path) -> Result<Profile> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read profile: {:?}", path))?;

    let profile: Profile = toml::from_str(&content)
        .with_context(|| format!("Failed to parse profile: {:?}", path))?;

    Ok(profile)
}

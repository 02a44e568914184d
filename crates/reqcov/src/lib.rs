//! reqcov - requirements coverage of source and test code
//!
//! The binary is a thin shell around [`reqcov_core::pipeline`]: it loads the
//! YAML config, builds the configured requirement source, runs the pipeline
//! and renders the result.

pub mod config;
pub mod output;

use eyre::{Result, WrapErr};
use std::path::{Path, PathBuf};

/// Config location relative to the project root
pub const CONFIG_PATH: &str = ".config/reqcov/config.yaml";

/// Walk up from the current directory to the first directory holding a
/// reqcov config, a `.git` directory or a `Cargo.toml`.
pub fn find_project_root() -> Result<PathBuf> {
    let cwd = std::env::current_dir().wrap_err("Failed to get current directory")?;
    Ok(project_root_from(&cwd))
}

/// Project root owning a config file.
///
/// A config at the conventional [`CONFIG_PATH`] belongs to the directory
/// above `.config`; any other config file belongs to its own directory.
pub fn project_root_for_config(config_path: &Path) -> PathBuf {
    let mut root = config_path.to_path_buf();
    if config_path.ends_with(CONFIG_PATH) {
        for _ in Path::new(CONFIG_PATH).components() {
            root.pop();
        }
        return root;
    }
    root.pop();
    root
}

pub fn project_root_from(start: &Path) -> PathBuf {
    let mut current = start.to_path_buf();

    loop {
        if current.join(CONFIG_PATH).exists()
            || current.join(".git").exists()
            || current.join("Cargo.toml").exists()
        {
            return current;
        }

        if !current.pop() {
            // Nothing found, use the starting directory
            return start.to_path_buf();
        }
    }
}

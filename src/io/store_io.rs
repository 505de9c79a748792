use std::fs;
use std::path::{Path, PathBuf};

use crate::model::config::Config;

/// Name of the directory holding a smartdo store.
pub const STORE_DIR_NAME: &str = ".smartdo";

/// Default config written by `sd init`.
pub const CONFIG_TEMPLATE: &str = include_str!("../templates/config.toml");

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("no smartdo store found (run `sd init` first)")]
    NotAStore,
    #[error("a smartdo store already exists at {0} (use --force to reinitialize)")]
    AlreadyExists(PathBuf),
    #[error("could not read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not parse config.toml: {0}")]
    ConfigParse(#[from] toml::de::Error),
    #[error("invalid config.toml: {0}")]
    InvalidConfig(String),
    #[error("could not edit config.toml: {0}")]
    ConfigEdit(#[from] toml_edit::TomlError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Walk up from `start` looking for a `.smartdo/` directory.
/// Returns the store directory itself.
pub fn discover_store(start: &Path) -> Result<PathBuf, StoreError> {
    let mut current = start.to_path_buf();
    loop {
        let candidate = current.join(STORE_DIR_NAME);
        if candidate.is_dir() {
            return Ok(candidate);
        }
        if !current.pop() {
            return Err(StoreError::NotAStore);
        }
    }
}

/// Create `<root>/.smartdo/` with a default config. Existing task data is
/// left alone when `force` is set; only the config is rewritten.
pub fn init_store(root: &Path, force: bool) -> Result<PathBuf, StoreError> {
    let store_dir = root.join(STORE_DIR_NAME);
    if store_dir.exists() && !force {
        return Err(StoreError::AlreadyExists(store_dir));
    }
    fs::create_dir_all(&store_dir)?;
    fs::write(config_path(&store_dir), CONFIG_TEMPLATE)?;
    Ok(store_dir)
}

pub fn config_path(store_dir: &Path) -> PathBuf {
    store_dir.join("config.toml")
}

/// Load config.toml. A missing file means defaults.
pub fn load_config(store_dir: &Path) -> Result<Config, StoreError> {
    let path = config_path(store_dir);
    match fs::read_to_string(&path) {
        Ok(text) => {
            let config: Config = toml::from_str(&text)?;
            config.validate().map_err(StoreError::InvalidConfig)?;
            Ok(config)
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Config::default()),
        Err(source) => Err(StoreError::Read { path, source }),
    }
}

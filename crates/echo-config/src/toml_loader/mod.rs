//! Reading `config.toml`, and writing a commented one on first run.

mod template;


use std::io;
use std::path::{Path, PathBuf};

use echo_common::ConfigError;
use tracing::{debug, info};

use crate::schema::BridgeConfig;

pub use template::default_config_toml;

const APP_DIR: &str = "echo-bridge";
const FILE_NAME: &str = "config.toml";

/// `<platform config dir>/echo-bridge/config.toml`, e.g.
/// `~/.config/echo-bridge/config.toml` on Linux.
pub fn default_config_path() -> Result<PathBuf, ConfigError> {
    dirs::config_dir()
        .map(|dir| dir.join(APP_DIR).join(FILE_NAME))
        .ok_or_else(|| ConfigError::ParseError("no platform config directory".into()))
}

/// Parse the file at `path`. Fields it leaves out keep their defaults.
/// Values are not validated here; see [`crate::load_config`].
pub fn load_from_path(path: &Path) -> Result<BridgeConfig, ConfigError> {
    let text = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Err(ConfigError::FileNotFound(path.to_path_buf()));
        }
        Err(e) => {
            return Err(ConfigError::ParseError(format!(
                "cannot read {}: {e}",
                path.display()
            )));
        }
    };

    let config = parse(&text)?;
    debug!(path = %path.display(), "Config loaded");
    Ok(config)
}

pub fn parse(text: &str) -> Result<BridgeConfig, ConfigError> {
    toml::from_str(text).map_err(|e| ConfigError::ParseError(e.to_string()))
}

/// Load from [`default_config_path`]. A missing file is created from the
/// template and the defaults are returned.
pub fn load_default() -> Result<BridgeConfig, ConfigError> {
    let path = default_config_path()?;
    match load_from_path(&path) {
        Err(ConfigError::FileNotFound(_)) => {
            write_template(&path)?;
            info!(path = %path.display(), "No config found, wrote a default one");
            Ok(BridgeConfig::default())
        }
        other => other,
    }
}

/// Write the commented default config to `path`, creating parent
/// directories.
pub fn write_template(path: &Path) -> Result<(), ConfigError> {
    let write = || -> io::Result<()> {
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        std::fs::write(path, default_config_toml())
    };
    write().map_err(|e| ConfigError::ParseError(format!("cannot write {}: {e}", path.display())))
}

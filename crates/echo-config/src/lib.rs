//! echo-bridge configuration.
//!
//! TOML-based, with serde defaults on every section so a partial file (or no
//! file at all) still produces a usable config. The binding's `address` and
//! `identity` are deliberately optional: leaving them out is how a
//! controller says "not set up yet".

pub mod schema;
pub mod toml_loader;
pub mod validation;

pub use schema::{BindingConfig, BridgeConfig, LoggingConfig, RelayServerConfig};
pub use toml_loader::{default_config_path, load_default, load_from_path, write_template};

use echo_common::ConfigError;

/// Load from an explicit path if one is given, otherwise from the platform
/// default location, then validate.
pub fn load_config(path: Option<&std::path::Path>) -> Result<BridgeConfig, ConfigError> {
    let config = match path {
        Some(path) => load_from_path(path)?,
        None => load_default()?,
    };
    validation::validate(&config)?;
    Ok(config)
}

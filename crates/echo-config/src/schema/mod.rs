//! Configuration schema types.
//!
//! All structs use `serde(default)` so partial configs work correctly.

mod binding;
mod logging;
mod relay;

pub use binding::*;
pub use logging::*;
pub use relay::*;

use serde::{Deserialize, Serialize};

/// Root configuration shared by the relay and the binding binaries. Each
/// process only reads the sections it needs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    pub binding: BindingConfig,
    pub relay: RelayServerConfig,
    pub logging: LoggingConfig,
}

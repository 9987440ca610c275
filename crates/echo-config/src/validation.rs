//! Config validation. Collects every problem into one `ConfigError`.

use echo_common::ConfigError;

use crate::schema::BridgeConfig;

pub fn validate(config: &BridgeConfig) -> Result<(), ConfigError> {
    let mut errors: Vec<String> = Vec::new();

    validate_binding(&mut errors, config);
    validate_relay(&mut errors, config);
    validate_logging(&mut errors, config);

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::ValidationError(errors.join("; ")))
    }
}

fn validate_binding(errors: &mut Vec<String>, config: &BridgeConfig) {
    let binding = &config.binding;
    if binding.keepalive_interval_secs == 0 {
        errors.push("binding.keepalive_interval_secs must be greater than 0".into());
    }
    // An absent address is fine (configuration pending); a wrong one is not.
    if let Some(address) = binding.address.as_deref().map(str::trim) {
        if !address.is_empty() && !(address.starts_with("ws://") || address.starts_with("wss://")) {
            errors.push(format!(
                "binding.address = {address:?} must start with ws:// or wss://"
            ));
        }
    }
}

fn validate_relay(errors: &mut Vec<String>, config: &BridgeConfig) {
    let relay = &config.relay;
    if relay.port == 0 {
        errors.push("relay.port must be non-zero".into());
    }
    if !relay.path.starts_with('/') {
        errors.push(format!("relay.path = {:?} must start with '/'", relay.path));
    }
    if relay.session_buffer == 0 {
        errors.push("relay.session_buffer must be greater than 0".into());
    }
    if relay.host.trim().is_empty() {
        errors.push("relay.host must not be empty".into());
    }
}

fn validate_logging(errors: &mut Vec<String>, config: &BridgeConfig) {
    const LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];
    let level = config.logging.level.to_ascii_lowercase();
    if !LEVELS.contains(&level.as_str()) {
        errors.push(format!(
            "logging.level = {:?} must be one of {}",
            config.logging.level,
            LEVELS.join(", ")
        ));
    }
}

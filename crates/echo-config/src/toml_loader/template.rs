//! The config file written on first run.

pub fn default_config_toml() -> &'static str {
    r##"# echo-bridge configuration
# Only override what you want to change -- missing fields use defaults.

[binding]
# Both values are required before the binding will connect.
# address = "wss://skill.example.com/qiviconWebsocket"
# identity = "amzn1.ask.account.XXXX"
# keepalive_interval_secs = 30

[relay]
# host = "0.0.0.0"
# port = 8080
# path = "/qiviconWebsocket"
# session_buffer = 64

[logging]
# level = "info"         # trace, debug, info, warn, error
"##
}

//! Connector lifecycle state as seen from outside.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectorState {
    #[default]
    Disconnected,
    Connecting,
    Online,
    Reconnecting,
}

impl fmt::Display for ConnectorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ConnectorState::Disconnected => "disconnected",
            ConnectorState::Connecting => "connecting",
            ConnectorState::Online => "online",
            ConnectorState::Reconnecting => "reconnecting",
        })
    }
}

/// Why the connector is where it is, when that is worth telling the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusDetail {
    #[default]
    None,
    /// Address or identity missing; nothing will happen until configured.
    ConfigurationPending,
    /// The last connection attempt failed.
    CommunicationError,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ConnectorStatus {
    pub state: ConnectorState,
    pub detail: StatusDetail,
}

impl ConnectorStatus {
    pub fn new(state: ConnectorState, detail: StatusDetail) -> Self {
        Self { state, detail }
    }

    pub fn is_online(&self) -> bool {
        self.state == ConnectorState::Online
    }
}

impl fmt::Display for ConnectorStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.detail {
            StatusDetail::None => write!(f, "{}", self.state),
            StatusDetail::ConfigurationPending => write!(f, "{} (configuration pending)", self.state),
            StatusDetail::CommunicationError => write!(f, "{} (communication error)", self.state),
        }
    }
}

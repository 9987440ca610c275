use std::fmt;

/// Connection-local id handed out when the relay accepts a transport.
///
/// It only lives as long as the connection; identities survive reconnects,
/// session ids never do.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionId(String);

impl SessionId {
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn reconnect_gets_a_fresh_session_id() {
        let first = SessionId::new();
        let second = SessionId::new();
        assert_ne!(first, second);
        assert_eq!(first.to_string(), first.as_str());
    }

    #[test]
    fn clone_finds_the_same_registry_entry() {
        let id = SessionId::new();
        let mut sessions = HashMap::new();
        sessions.insert(id.clone(), "live");
        assert_eq!(sessions.get(&id), Some(&"live"));
        assert_eq!(sessions.get(&SessionId::new()), None);
    }
}

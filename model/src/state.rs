use serde::{Deserialize, Serialize};

/// Lifecycle of one ingestion session.
///
/// `Stalled` and `Disconnected` are never left automatically towards
/// `Connecting`; a new session has to be started for that.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ConnectionState {
    #[default]
    Connecting,
    Connected,
    /// The connection is open but nothing was decoded within the liveness window.
    Stalled,
    Disconnected,
}

impl ConnectionState {
    pub fn label(&self) -> &'static str {
        match self {
            ConnectionState::Connecting => "Connecting",
            ConnectionState::Connected => "Connected",
            ConnectionState::Stalled => "Stalled",
            ConnectionState::Disconnected => "Disconnected",
        }
    }

    /// Whether a frontend should offer the reconnect action.
    pub fn offers_reconnect(&self) -> bool {
        matches!(self, ConnectionState::Stalled | ConnectionState::Disconnected)
    }

    /// Whether the session can still deliver readings.
    pub fn is_open(&self) -> bool {
        matches!(self, ConnectionState::Connected | ConnectionState::Stalled)
    }
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

#[test]
fn test_reconnect_is_offered_after_failures_only() {
    assert!(!ConnectionState::Connecting.offers_reconnect());
    assert!(!ConnectionState::Connected.offers_reconnect());
    assert!(ConnectionState::Stalled.offers_reconnect());
    assert!(ConnectionState::Disconnected.offers_reconnect());

    assert_eq!(ConnectionState::default(), ConnectionState::Connecting);
    assert_eq!(ConnectionState::Stalled.to_string(), "Stalled");
}

use chrono::{DateTime, Utc};

/// What a [`Message`] carries, and therefore which worker-side handler applies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKind {
    /// Order-entry message in the `tag=value|` wire format
    Fix,
    /// Market data payload
    MarketData,
    /// Control/administrative payload
    Control,
}

impl MessageKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Fix => "FIX",
            Self::MarketData => "MARKET_DATA",
            Self::Control => "CONTROL",
        }
    }
}

impl std::fmt::Display for MessageKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Typed, timestamped envelope around one raw wire message.
///
/// Immutable once constructed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    kind: MessageKind,
    payload: String,
    timestamp: DateTime<Utc>,
}

impl Message {
    /// Wrap a payload, stamping it with the current time
    pub fn new(kind: MessageKind, payload: impl Into<String>) -> Self {
        Self::new_with_time(kind, payload, Utc::now())
    }

    /// Wrap a payload with an explicit creation instant
    pub fn new_with_time(
        kind: MessageKind,
        payload: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            kind,
            payload: payload.into(),
            timestamp,
        }
    }

    pub fn fix(payload: impl Into<String>) -> Self {
        Self::new(MessageKind::Fix, payload)
    }

    pub fn market_data(payload: impl Into<String>) -> Self {
        Self::new(MessageKind::MarketData, payload)
    }

    pub fn control(payload: impl Into<String>) -> Self {
        Self::new(MessageKind::Control, payload)
    }

    pub fn kind(&self) -> MessageKind {
        self.kind
    }

    pub fn payload(&self) -> &str {
        &self.payload
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}

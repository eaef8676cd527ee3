use std::fmt;

/// Sonos speaker identifier in `RINCON_xxx` form
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SpeakerId(String);

impl SpeakerId {
    /// Create a SpeakerId from a UUID or UDN string
    ///
    /// Accepts `RINCON_xxx`, `uuid:RINCON_xxx` and `uuid:RINCON_xxx::1`.
    pub fn new(id: &str) -> Self {
        let id = id.strip_prefix("uuid:").unwrap_or(id);
        let id = id.split("::").next().unwrap_or(id);
        SpeakerId(id.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SpeakerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Speaker {
    pub id: SpeakerId,
    pub name: String,
    pub model_name: String,
    pub ip_address: String,
    pub port: u16,
}

impl Speaker {
    pub fn base_url(&self) -> String {
        format!("http://{}:{}", self.ip_address, self.port)
    }
}

/// Transport state as reported by `GetTransportInfo`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportState {
    Playing,
    Paused,
    Stopped,
    Transitioning,
    Unknown,
}

impl TransportState {
    pub fn from_transport_state(state: &str) -> Self {
        match state.trim() {
            "PLAYING" => TransportState::Playing,
            "PAUSED_PLAYBACK" | "PAUSED" => TransportState::Paused,
            "STOPPED" | "NO_MEDIA_PRESENT" => TransportState::Stopped,
            "TRANSITIONING" => TransportState::Transitioning,
            _ => TransportState::Unknown,
        }
    }

    /// A session is active when something is playing or paused mid-stream
    pub fn is_active(&self) -> bool {
        matches!(self, TransportState::Playing | TransportState::Paused)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrackInfo {
    pub title: String,
    pub artist: String,
    pub album: String,
    pub album_art: String,
    pub uri: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Favorite {
    pub title: String,
    pub uri: String,
    pub metadata: String,
    pub album_art: Option<String>,
}

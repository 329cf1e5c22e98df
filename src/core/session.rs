use crate::core::{Frame, FrameSequence};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Where a session's frames come from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SourceType {
    Log,
    Mqtt,
    Websocket,
}

impl SourceType {
    pub fn is_stream(&self) -> bool {
        !matches!(self, SourceType::Log)
    }
}

/// Connection parameters handed to the transport for stream sessions
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConnectionConfig {
    /// Scheme prefix, e.g. `wss://`
    #[serde(default)]
    pub protocol: String,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

impl ConnectionConfig {
    /// Full endpoint address with any scheme the user typed into the host removed
    pub fn endpoint(&self) -> String {
        let host = self.url.trim();
        let host = ["ws://", "wss://", "mqtt://", "mqtts://"]
            .iter()
            .find_map(|prefix| host.strip_prefix(prefix))
            .unwrap_or(host);

        match self.port {
            Some(port) => format!("{}{}:{}", self.protocol, host, port),
            None => format!("{}{}", self.protocol, host),
        }
    }
}

/// A named session as stored by the persistence layer.
///
/// Log sessions carry their frames; stream sessions carry only the
/// connection config needed to reconnect.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedSession {
    pub id: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub frame_count: usize,
    #[serde(default)]
    pub frames: Vec<Frame>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vin: Option<String>,
    pub source_type: SourceType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connection_config: Option<ConnectionConfig>,
}

impl SavedSession {
    /// Snapshot a replay sequence as a log session
    pub fn from_log(id: &str, name: &str, sequence: &FrameSequence) -> Self {
        Self {
            id: id.to_string(),
            name: session_name(name),
            created_at: Utc::now(),
            frame_count: sequence.len(),
            vin: sequence.first().map(|f| f.vin.clone().unwrap_or_else(|| "N/A".to_string())),
            frames: sequence.to_vec(),
            source_type: SourceType::Log,
            connection_config: None,
        }
    }

    /// Describe a stream session. No frames are kept.
    pub fn from_stream(id: &str, name: &str, source_type: SourceType, config: ConnectionConfig) -> Self {
        Self {
            id: id.to_string(),
            name: session_name(name),
            created_at: Utc::now(),
            frame_count: 0,
            frames: Vec::new(),
            vin: None,
            source_type,
            connection_config: Some(config),
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    /// Rebuild the replay sequence. Stored frames may have been edited by
    /// hand, so the sort and dedup are applied again.
    pub fn into_sequence(self) -> FrameSequence {
        FrameSequence::replay(self.frames)
    }
}

fn session_name(name: &str) -> String {
    if name.trim().is_empty() {
        format!("Session {}", Utc::now().format("%H:%M:%S"))
    } else {
        name.to_string()
    }
}

// ── Attack events ──
//
// What the sensor publishes. Field names are the feed's wire names; the
// downstream consumers key on `sensor`, `SrcIp`, `agave_username`, etc.

use serde::{Deserialize, Serialize};

use super::snapshot::RequestSnapshot;

/// An HTTP request that matched (or was simply caught by) the sensor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct HttpAttack {
    pub protocol: String,
    pub app: String,
    pub channel: String,
    #[serde(rename = "sensor")]
    pub sensor_guid: String,
    pub dest_port: u16,
    pub dest_ip: String,
    pub src_port: u16,
    pub src_ip: String,
    /// Detection rule / signature name supplied by the caller.
    pub signature: String,
    /// Source IP had already been recorded when this event was built.
    pub prev_seen: bool,
    pub request: RequestSnapshot,
}

/// A username/password pair harvested from a fake login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CredentialAttack {
    pub protocol: String,
    pub app: String,
    pub channel: String,
    #[serde(rename = "sensor")]
    pub sensor_guid: String,
    pub dest_port: u16,
    pub dest_ip: String,
    pub src_port: u16,
    pub src_ip: String,
    #[serde(rename = "agave_username")]
    pub username: String,
    #[serde(rename = "agave_password")]
    pub password: String,
}

/// Either event kind, serialized without a tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttackEvent {
    Http(Box<HttpAttack>),
    Credential(CredentialAttack),
}

impl AttackEvent {
    pub fn src_ip(&self) -> &str {
        match self {
            Self::Http(e) => &e.src_ip,
            Self::Credential(e) => &e.src_ip,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Http(_) => "http",
            Self::Credential(_) => "credential",
        }
    }

    /// JSON bytes as published on the feed.
    pub fn to_json(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }
}

impl From<HttpAttack> for AttackEvent {
    fn from(event: HttpAttack) -> Self {
        Self::Http(Box::new(event))
    }
}

impl From<CredentialAttack> for AttackEvent {
    fn from(event: CredentialAttack) -> Self {
        Self::Credential(event)
    }
}

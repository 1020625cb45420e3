// ── Sensor ──
//
// Turns inbound requests into attack events stamped with this sensor's
// identity, and tracks which sources have been reported before.

use std::sync::Arc;

use tracing::debug;

use crate::addr::split_host_port;
use crate::cache::SeenIpCache;
use crate::config::SensorConfig;
use crate::error::CoreError;
use crate::model::{CredentialAttack, HttpAttack, RequestSnapshot};
use crate::request::InboundRequest;

/// Event builder for one sensor.
///
/// Cloning is cheap; clones share the seen-IP cache.
#[derive(Debug, Clone)]
pub struct Sensor {
    config: Arc<SensorConfig>,
    seen: Arc<SeenIpCache>,
}

impl Sensor {
    pub fn new(config: SensorConfig) -> Self {
        Self::with_cache(config, Arc::new(SeenIpCache::new()))
    }

    /// Build on an existing cache, e.g. one shared by several sensors.
    pub fn with_cache(config: SensorConfig, seen: Arc<SeenIpCache>) -> Self {
        Self {
            config: Arc::new(config),
            seen,
        }
    }

    pub fn config(&self) -> &SensorConfig {
        &self.config
    }

    pub fn cache(&self) -> &Arc<SeenIpCache> {
        &self.seen
    }

    /// Build an HTTP attack event, draining the request body.
    ///
    /// The remote address is validated before the body is read, so a
    /// malformed peer address never costs a body read. `PrevSeen` reflects
    /// the cache at build time; nothing is recorded here.
    pub async fn http_attack(
        &self,
        signature: impl Into<String>,
        request: InboundRequest,
    ) -> Result<HttpAttack, CoreError> {
        let (src_ip, src_port) = split_host_port(&request.remote_addr)?;
        let (head, body) = request.into_parts().await?;
        let prev_seen = self.seen.has_seen(&src_ip);
        let signature = signature.into();

        debug!(
            src = %src_ip,
            src_port,
            method = %head.method,
            target = %head.target,
            body_len = body.len(),
            signature = %signature,
            prev_seen,
            "built http attack event"
        );

        let snapshot = RequestSnapshot::capture(head, body);
        Ok(HttpAttack {
            protocol: snapshot.proto.clone(),
            app: self.config.app.clone(),
            channel: self.config.channel.clone(),
            sensor_guid: self.config.guid.clone(),
            dest_port: self.config.port,
            dest_ip: self.config.ip.clone(),
            src_port,
            src_ip,
            signature,
            prev_seen,
            request: snapshot,
        })
    }

    /// Build a credential event. The request body is left untouched; the
    /// caller usually extracted the credentials from it already.
    pub fn credential_attack(
        &self,
        request: &InboundRequest,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Result<CredentialAttack, CoreError> {
        let (src_ip, src_port) = split_host_port(&request.remote_addr)?;
        let username = username.into();

        debug!(src = %src_ip, src_port, username = %username, "built credential event");

        Ok(CredentialAttack {
            protocol: request.version.to_string(),
            app: self.config.app.clone(),
            channel: self.config.channel.clone(),
            sensor_guid: self.config.guid.clone(),
            dest_port: self.config.port,
            dest_ip: self.config.ip.clone(),
            src_port,
            src_ip,
            username,
            password: password.into(),
        })
    }

    /// Mark `ip` as reported.
    pub fn save_ip(&self, ip: &str) {
        self.seen.record(ip);
    }

    pub fn seen_ip(&self, ip: &str) -> bool {
        self.seen.has_seen(ip)
    }
}

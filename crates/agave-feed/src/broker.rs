// Broker capability and connection parameters.
//
// The wire protocol (framing, auth handshake) lives in whichever transport
// implements `Broker`; the writer only needs connect / publish / a
// disconnect notification.

use std::fmt;
use std::future::Future;

use bytes::Bytes;
use secrecy::SecretString;

use crate::error::ConnectionError;

/// Where and as whom to connect.
#[derive(Debug, Clone)]
pub struct Endpoint {
    pub host: String,
    pub port: u16,
    /// Broker identity the sensor authenticates as.
    pub ident: String,
    pub secret: SecretString,
}

impl Endpoint {
    pub fn new(
        host: impl Into<String>,
        port: u16,
        ident: impl Into<String>,
        secret: SecretString,
    ) -> Self {
        Self {
            host: host.into(),
            port,
            ident: ident.into(),
            secret,
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}:{}", self.ident, self.host, self.port)
    }
}

/// A pub/sub broker session the [`PublishWriter`](crate::PublishWriter)
/// can drive.
///
/// The writer owns the implementation exclusively and calls it from a
/// single task, so `connect` and `publish` never run concurrently.
pub trait Broker: Send + Sync + 'static {
    /// Open (or re-open) the session, replacing any previous one.
    fn connect(
        &self,
        endpoint: &Endpoint,
    ) -> impl Future<Output = Result<(), ConnectionError>> + Send;

    /// Send one payload to `channel` over the live session.
    fn publish(
        &self,
        channel: &str,
        payload: Bytes,
    ) -> impl Future<Output = Result<(), ConnectionError>> + Send;

    /// Resolves once the current session drops.
    ///
    /// Must be cancel-safe: the writer re-creates this future on every
    /// loop iteration, and a drop that happened while no future was being
    /// polled must still be reported by the next one.
    fn disconnected(&self) -> impl Future<Output = ()> + Send;
}

#[cfg(test)]
mod tests {
    use secrecy::ExposeSecret;

    use super::*;

    #[test]
    fn display_hides_secret() {
        let endpoint = Endpoint::new(
            "hpfeeds.example.net",
            10000,
            "sensor-1",
            SecretString::from("hunter2".to_string()),
        );
        assert_eq!(endpoint.to_string(), "sensor-1@hpfeeds.example.net:10000");
        assert!(!format!("{endpoint:?}").contains("hunter2"));
        assert_eq!(endpoint.secret.expose_secret(), "hunter2");
    }
}

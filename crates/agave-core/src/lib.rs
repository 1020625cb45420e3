// agave-core: attack events, seen-IP tracking and feed reporting.

pub mod addr;
pub mod cache;
pub mod config;
pub mod error;
pub mod model;
pub mod reporter;
pub mod request;
pub mod sensor;

// ── Primary re-exports ──────────────────────────────────────────────
pub use addr::split_host_port;
pub use cache::SeenIpCache;
pub use config::SensorConfig;
pub use error::CoreError;
pub use model::{AttackEvent, CredentialAttack, FormValues, HttpAttack, RequestSnapshot, RequestTarget};
pub use reporter::Reporter;
pub use request::{BodyStream, HeaderMap, HttpVersion, InboundRequest};
pub use sensor::Sensor;

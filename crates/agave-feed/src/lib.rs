// agave-feed: resilient publish writer for sensor event feeds

pub mod broker;
pub mod error;
pub mod last_error;
pub mod writer;

pub use broker::{Broker, Endpoint};
pub use error::{ConnectionError, ConstructionError, WriteError};
pub use last_error::LastError;
pub use writer::{ConnectionState, MAX_PUBLISH_ATTEMPTS, PublishWriter, RECONNECT_DELAY};

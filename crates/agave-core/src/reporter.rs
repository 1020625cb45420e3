// ── Reporter ──
//
// Glue between the event builder and the feed writer: build, serialize,
// remember the source, publish.

use agave_feed::PublishWriter;

use crate::error::CoreError;
use crate::model::AttackEvent;
use crate::request::InboundRequest;
use crate::sensor::Sensor;

/// Publishes attack events for one sensor over one feed writer.
#[derive(Debug, Clone)]
pub struct Reporter {
    sensor: Sensor,
    writer: PublishWriter,
}

impl Reporter {
    pub fn new(sensor: Sensor, writer: PublishWriter) -> Self {
        Self { sensor, writer }
    }

    pub fn sensor(&self) -> &Sensor {
        &self.sensor
    }

    pub fn writer(&self) -> &PublishWriter {
        &self.writer
    }

    /// Build and publish an HTTP attack event.
    ///
    /// The source IP is recorded once the event is built, before the write,
    /// so a later request from the same source is flagged `PrevSeen` even
    /// while this one is still waiting for the feed. Returns the number of
    /// bytes queued.
    pub async fn report_http(
        &self,
        signature: impl Into<String>,
        request: InboundRequest,
    ) -> Result<usize, CoreError> {
        let event = self.sensor.http_attack(signature, request).await?;
        self.publish(&AttackEvent::from(event)).await
    }

    /// Build and publish a credential event.
    pub async fn report_credentials(
        &self,
        request: &InboundRequest,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Result<usize, CoreError> {
        let event = self.sensor.credential_attack(request, username, password)?;
        self.publish(&AttackEvent::from(event)).await
    }

    /// Serialize an already-built event, record its source and write it.
    pub async fn publish(&self, event: &AttackEvent) -> Result<usize, CoreError> {
        let payload = event.to_json()?;
        self.sensor.save_ip(event.src_ip());

        match self.writer.write(payload).await {
            Ok(queued) => {
                tracing::debug!(
                    kind = event.kind(),
                    src = event.src_ip(),
                    queued,
                    channel = self.writer.channel(),
                    "Event published"
                );
                Ok(queued)
            }
            Err(err) => {
                tracing::warn!(
                    kind = event.kind(),
                    src = event.src_ip(),
                    queued = err.queued(),
                    error = %err,
                    "Event publish degraded"
                );
                Err(err.into())
            }
        }
    }
}

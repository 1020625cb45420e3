// ── Sensor identity ──
//
// Describes the sensor that stamps every event. Built by the config crate
// (or by hand in tests) -- core never reads files.

/// Identity and listening address of the reporting sensor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SensorConfig {
    /// Application tag, e.g. `"agave"` or the honeypot flavour.
    pub app: String,
    /// Feed channel tag stamped on each event.
    pub channel: String,
    /// Sensor GUID.
    pub guid: String,
    /// Address the sensor listens on (event destination).
    pub ip: String,
    pub port: u16,
}

impl SensorConfig {
    pub fn new(
        app: impl Into<String>,
        channel: impl Into<String>,
        guid: impl Into<String>,
        ip: impl Into<String>,
        port: u16,
    ) -> Self {
        Self {
            app: app.into(),
            channel: channel.into(),
            guid: guid.into(),
            ip: ip.into(),
            port,
        }
    }
}

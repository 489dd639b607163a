use std::time::Duration;

use derive_builder::Builder;

/// Runtime configuration.
#[derive(Debug, Clone, Builder)]
pub struct RuntimeConfig {
    /// Interval at which the logical clock catches up with real time.
    #[builder(default = "Duration::from_millis(16)")]
    pub(crate) tick: Duration,
}

impl RuntimeConfig {
    /// Creates a new builder for the runtime configuration.
    pub fn builder() -> RuntimeConfigBuilder {
        RuntimeConfigBuilder::default()
    }

    /// Returns the tick interval.
    pub fn tick(&self) -> Duration {
        self.tick
    }
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        RuntimeConfigBuilder::default().build().unwrap()
    }
}

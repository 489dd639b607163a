use std::time::Duration;

use derive_builder::Builder;
use gatesim_circuits::template::DEFAULT_MAX_DEPTH;

/// What [`Simulation::connect`](crate::Simulation::connect) does when the input
/// already has a connection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ConnectPolicy {
    /// Fail with [`ErrorKind::InputAlreadyConnected`](crate::ErrorKind::InputAlreadyConnected).
    #[default]
    Reject,
    /// Disconnect the existing connection first.
    Replace,
}

/// Simulation configuration.
#[derive(Debug, Clone, Builder)]
pub struct SimulationConfig {
    /// Delay applied to every cascade hop.
    #[builder(default = "Duration::from_millis(100)")]
    pub(crate) clock_speed: Duration,
    /// Behavior when connecting an input which is already connected.
    #[builder(default)]
    pub(crate) connect_policy: ConnectPolicy,
    /// Maximum nesting depth of templates.
    #[builder(default = "DEFAULT_MAX_DEPTH")]
    pub(crate) max_template_depth: usize,
}

impl SimulationConfig {
    /// Creates a new builder for the simulation configuration.
    pub fn builder() -> SimulationConfigBuilder {
        SimulationConfigBuilder::default()
    }

    /// Returns the delay applied to every cascade hop.
    pub fn clock_speed(&self) -> Duration {
        self.clock_speed
    }

    /// Returns the connect policy.
    pub fn connect_policy(&self) -> ConnectPolicy {
        self.connect_policy
    }

    /// Returns the maximum nesting depth of templates.
    pub fn max_template_depth(&self) -> usize {
        self.max_template_depth
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        SimulationConfigBuilder::default().build().unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SimulationConfig::default();

        assert_eq!(config.clock_speed(), Duration::from_millis(100));
        assert_eq!(config.connect_policy(), ConnectPolicy::Reject);
        assert_eq!(config.max_template_depth(), DEFAULT_MAX_DEPTH);
    }

    #[test]
    fn test_builder() {
        let config = SimulationConfig::builder()
            .clock_speed(Duration::from_millis(5))
            .connect_policy(ConnectPolicy::Replace)
            .build()
            .unwrap();

        assert_eq!(config.clock_speed(), Duration::from_millis(5));
        assert_eq!(config.connect_policy(), ConnectPolicy::Replace);
    }
}

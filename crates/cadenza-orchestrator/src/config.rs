use std::time::Duration;

use cadenza_abr::{BANDWIDTH_VARIANCE, BufferOptions};
use cadenza_events::EventBus;
use derivative::Derivative;
use derive_setters::Setters;

/// Orchestrator tuning knobs.
#[derive(Clone, Debug, Derivative, Setters)]
#[derivative(Default)]
#[setters(prefix = "with_", strip_option)]
pub struct OrchestratorConfig {
    /// Goal buffer and low-water line ramps.
    pub buffer: BufferOptions,
    /// Exclusion applied when a fault carries no duration. Default: 300 s.
    #[derivative(Default(value = "Duration::from_secs(300)"))]
    pub exclusion_duration: Duration,
    /// Exclusion applied after an early abort. Default: 120 s.
    #[derivative(Default(value = "Duration::from_secs(120)"))]
    pub early_abort_exclusion: Duration,
    /// Tolerance, in seconds, for "caught up with the playlist end". Default: 0.1.
    #[derivative(Default(value = "0.1"))]
    pub stall_epsilon: f64,
    /// Request timeout as a multiple of the target segment duration. Default: 1.5.
    #[derivative(Default(value = "1.5"))]
    pub request_timeout_factor: f64,
    /// Bandwidth headroom used by the default selector. Default: 1.2.
    #[derivative(Default(value = "BANDWIDTH_VARIANCE"))]
    pub bandwidth_variance: f64,
    /// Inbound events handled per `pump` before yielding. Default: 256.
    #[derivative(Default(value = "256"))]
    pub max_events_per_drain: usize,
    /// Capacity of the event bus created when `bus` is unset. Default: 64.
    #[derivative(Default(value = "64"))]
    pub events_channel_capacity: usize,
    /// Shared bus to publish on instead of a private one.
    pub bus: Option<EventBus>,
}

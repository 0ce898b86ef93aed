/// Forward-buffer targets as functions of elapsed playback time.
///
/// Both targets ramp linearly from their base value and saturate at
/// `max(base, max)`. Nothing is cached; callers evaluate them with the
/// current playback time whenever they need a value.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BufferOptions {
    /// Goal buffer length at `t = 0`, seconds.
    pub goal_buffer_secs: f64,
    /// Seconds of goal added per second of playback.
    pub goal_buffer_rate: f64,
    /// Upper bound of the goal buffer length, seconds.
    pub max_goal_buffer_secs: f64,
    /// Low-water line at `t = 0`, seconds.
    pub low_water_secs: f64,
    /// Seconds of low-water line added per second of playback.
    pub low_water_rate: f64,
    /// Upper bound of the low-water line, seconds.
    pub max_low_water_secs: f64,
}

impl Default for BufferOptions {
    fn default() -> Self {
        Self {
            goal_buffer_secs: 30.0,
            goal_buffer_rate: 1.0,
            max_goal_buffer_secs: 60.0,
            low_water_secs: 0.0,
            low_water_rate: 1.0,
            max_low_water_secs: 30.0,
        }
    }
}

impl BufferOptions {
    /// Forward buffer the main loader tries to keep at playback time `t`.
    #[must_use]
    pub fn goal(&self, t: f64) -> f64 {
        ramp(
            self.goal_buffer_secs,
            self.goal_buffer_rate,
            self.max_goal_buffer_secs,
            t,
        )
    }

    /// Forward buffer required before an upswitch is allowed at time `t`.
    #[must_use]
    pub fn low_water(&self, t: f64) -> f64 {
        ramp(
            self.low_water_secs,
            self.low_water_rate,
            self.max_low_water_secs,
            t,
        )
    }
}

fn ramp(base: f64, rate: f64, max: f64, t: f64) -> f64 {
    // f64::max drops NaN, so a NaN clock reads as t = 0.
    let t = t.max(0.0);
    (base + t * rate).min(base.max(max))
}

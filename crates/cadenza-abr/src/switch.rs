use crate::Candidate;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SwitchReason {
    /// Proposal is the active rendition.
    AlreadyOptimal,
    /// Lower bandwidth; always applied.
    DownSwitch,
    /// Open-ended manifest; applied regardless of buffer.
    LiveUpSwitch,
    /// Complete manifest shorter than the low-water maximum.
    ShortVodUpSwitch,
    /// Forward buffer reached the low-water line.
    UpSwitch,
    /// Held: forward buffer under the low-water line.
    BufferTooLowForUpSwitch,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct SwitchDecision {
    pub target: Candidate,
    pub reason: SwitchReason,
    pub changed: bool,
}

/// Playback facts the upswitch guard looks at.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SwitchContext {
    pub is_live: bool,
    /// Total presentation duration, seconds.
    pub duration_secs: f64,
    pub forward_buffer_secs: f64,
    /// `low_water(t)` at the current playback time.
    pub low_water_secs: f64,
    /// Configured low-water maximum.
    pub max_low_water_secs: f64,
}

/// Decide whether a bandwidth-driven proposal replaces the active rendition.
///
/// Downgrades always go through. Anything else waits for enough forward
/// buffer unless the manifest is live or shorter than the low-water maximum.
#[must_use]
pub fn guard_switch(current: Candidate, next: Candidate, ctx: &SwitchContext) -> SwitchDecision {
    let hold = |reason| SwitchDecision {
        target: current,
        reason,
        changed: false,
    };
    let apply = |reason| SwitchDecision {
        target: next,
        reason,
        changed: true,
    };

    if next.id == current.id {
        return hold(SwitchReason::AlreadyOptimal);
    }

    let current_bw = current.bandwidth_bps.unwrap_or(u64::MAX);
    let next_bw = next.bandwidth_bps.unwrap_or(u64::MAX);

    let decision = if next_bw < current_bw {
        apply(SwitchReason::DownSwitch)
    } else if ctx.is_live {
        apply(SwitchReason::LiveUpSwitch)
    } else if ctx.duration_secs < ctx.max_low_water_secs {
        apply(SwitchReason::ShortVodUpSwitch)
    } else if ctx.forward_buffer_secs >= ctx.low_water_secs {
        apply(SwitchReason::UpSwitch)
    } else {
        hold(SwitchReason::BufferTooLowForUpSwitch)
    };

    tracing::debug!(
        current = current.id.0,
        next = next.id.0,
        current_bw,
        next_bw,
        forward_buffer = ctx.forward_buffer_secs,
        low_water = ctx.low_water_secs,
        reason = ?decision.reason,
        "upswitch guard"
    );
    decision
}

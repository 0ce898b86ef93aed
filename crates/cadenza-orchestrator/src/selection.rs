//! Rendition selection, upswitch gating and fault isolation.

use std::time::Duration;

use cadenza_abr::{Candidate, SelectionContext, SwitchContext, guard_switch};
use cadenza_events::{Fault, PlaybackEvent, SelectionEvent, SwitchCause};
use cadenza_manifest::{Exclusion, ExclusionSpan, RenditionId, translate_legacy_avc};
use tracing::{debug, warn};
use web_time::Instant;

use crate::{
    EndOfStreamError, FaultOutcome, Orchestrator, RequestOptions, SourceLayout,
    layout::{buffer_configs, incompatible_renditions},
};

/// Request timeout for a rendition with the given target segment duration.
///
/// The lowest eligible rendition has nothing to fall back to, so its
/// requests never time out.
pub(crate) fn request_timeout(target: Duration, factor: f64, lowest: bool) -> RequestOptions {
    if lowest {
        return RequestOptions { timeout: None };
    }
    RequestOptions {
        timeout: Duration::try_from_secs_f64(target.as_secs_f64() * factor).ok(),
    }
}

impl Orchestrator {
    /// Ask the strategy for a rendition among those eligible at `now`.
    pub(crate) fn select_now(&self, now: Instant) -> Option<RenditionId> {
        let ctx = SelectionContext::from_manifest(
            &self.manifest,
            now,
            self.bandwidth_bps,
            self.selection.rendition,
        );
        let chosen = self.strategy.select(&ctx)?;
        if ctx.candidate(chosen).is_none() {
            warn!(rendition = chosen.0, "strategy chose an ineligible rendition");
            return None;
        }
        Some(chosen)
    }

    pub(crate) fn compute_request_options(&self, now: Instant) -> RequestOptions {
        let Some(id) = self.selection.rendition else {
            return RequestOptions::default();
        };
        let target = self
            .manifest
            .rendition(id)
            .and_then(|r| r.playlist.as_ref())
            .map(|p| p.target_duration)
            .unwrap_or_default();
        let lowest = self.manifest.is_lowest_eligible(id, now);
        let options = request_timeout(target, self.config.request_timeout_factor, lowest);
        debug!(
            rendition = id.0,
            lowest,
            timeout_ms = options.timeout_ms(),
            "request timeout"
        );
        options
    }

    /// Bandwidth sample from the main loader: reselect, then let the
    /// upswitch guard decide whether to apply it.
    pub(crate) fn on_bandwidth_update(&mut self, bandwidth_bps: u64, now: Instant) {
        self.bandwidth_bps = Some(bandwidth_bps);
        self.apply_bandwidth_selection(now);
        self.publish(PlaybackEvent::BandwidthUpdate { bandwidth_bps });
    }

    fn apply_bandwidth_selection(&mut self, now: Instant) {
        let Some(current) = self.media() else {
            return;
        };
        let Some(next_id) = self.select_now(now) else {
            return;
        };
        let Some(next) = self.manifest.rendition(next_id) else {
            return;
        };

        let t = self.clock.current_time();
        let forward_buffer_secs = self
            .clock
            .buffered()
            .last()
            .map_or(0.0, |range| range.end - t);
        let ctx = SwitchContext {
            is_live: current.is_live().unwrap_or(false),
            duration_secs: self.duration(),
            forward_buffer_secs,
            low_water_secs: self.config.buffer.low_water(t),
            max_low_water_secs: self.config.buffer.max_low_water_secs,
        };
        let decision = guard_switch(
            Candidate {
                id: current.id,
                bandwidth_bps: current.bandwidth,
            },
            Candidate {
                id: next.id,
                bandwidth_bps: next.bandwidth,
            },
            &ctx,
        );
        if decision.changed {
            self.switch_to(decision.target.id, SwitchCause::Bandwidth(decision.reason));
        }
    }

    /// Route a fault through fault isolation.
    ///
    /// The target is the fault's own target, else the active rendition. The
    /// last viable rendition is never excluded; the manifest is reloaded
    /// instead. `override_span` beats the fault's own exclusion span, which
    /// beats the configured default.
    pub(crate) fn isolate_fault(
        &mut self,
        fault: Fault,
        override_span: Option<ExclusionSpan>,
        now: Instant,
    ) -> FaultOutcome {
        if fault.is_terminal() {
            self.fail_decode(fault.to_string());
            return FaultOutcome::Fatal;
        }
        let target = fault
            .target
            .or(self.selection.rendition)
            .filter(|id| self.manifest.rendition(*id).is_some());
        let Some(target) = target else {
            return self.fail_fatal(&fault.to_string());
        };

        if self.manifest.eligible_count(now) <= 1 {
            warn!(
                rendition = target.0,
                %fault,
                "final rendition failed, reloading instead of excluding"
            );
            self.publish(SelectionEvent::RetryingFinal {
                rendition: target,
                message: fault.message,
            });
            self.directory.load();
            return FaultOutcome::RetryingFinal;
        }

        let span = override_span
            .or(fault.exclusion)
            .unwrap_or(ExclusionSpan::For(self.config.exclusion_duration));
        let until = span.starting_at(now);
        if let Err(err) = self.manifest.exclude(target, until) {
            warn!(%err, "exclusion failed");
            return self.fail_fatal(&fault.to_string());
        }
        warn!(rendition = target.0, ?span, %fault, "rendition excluded");
        self.publish(SelectionEvent::Excluded {
            rendition: target,
            kind: fault.kind,
            message: fault.message.clone(),
            until,
        });

        match self.select_now(now) {
            Some(next) if Some(next) != self.selection.rendition => {
                self.switch_to(next, SwitchCause::FaultIsolation);
            }
            Some(_) => {}
            None => return self.fail_fatal("no eligible rendition after exclusion"),
        }
        FaultOutcome::Excluded
    }

    /// Report a fault from outside the collaborator event flow.
    pub fn report_fault(&mut self, fault: Fault, now: Instant) -> FaultOutcome {
        self.isolate_fault(fault, None, now)
    }

    /// Nothing left to act on: signal a network failure to the sink, or
    /// tell the host directly when even that fails.
    pub(crate) fn fail_fatal(&mut self, message: &str) -> FaultOutcome {
        warn!(message, "unrecoverable playback failure");
        if let Err(err) = self.sink.end_of_stream(Some(EndOfStreamError::Network)) {
            warn!(%err, "sink rejected the network failure signal");
            self.publish(PlaybackEvent::Error {
                message: message.to_string(),
                fatal: true,
            });
        }
        FaultOutcome::Fatal
    }

    /// Permanently exclude renditions whose codecs the host cannot decode.
    pub(crate) fn exclude_unsupported_variants(&mut self) {
        self.unsupported_filtered = true;
        let rejected: Vec<RenditionId> = self
            .manifest
            .renditions()
            .iter()
            .filter(|r| {
                r.codecs.as_deref().is_some_and(|codecs| {
                    let mime = format!("video/mp4; codecs=\"{}\"", translate_legacy_avc(codecs));
                    !self.codecs.is_type_supported(&mime)
                })
            })
            .map(|r| r.id)
            .collect();
        for id in rejected {
            debug!(rendition = id.0, "excluding rendition with unsupported codecs");
            if let Err(err) = self.manifest.exclude(id, Exclusion::Permanent) {
                warn!(%err, "exclusion failed");
            }
        }
    }

    /// Commit the sink layout once metadata is loaded and the sink is open.
    pub(crate) fn try_commit_layout(&mut self) {
        if self.layout.is_some() || !self.sink_open || !self.metadata_loaded {
            return;
        }
        let Some(rendition) = self.media() else {
            return;
        };
        let uri = rendition.uri.clone();
        let codecs = rendition.codec_set();
        let configs = buffer_configs(&self.manifest, rendition);

        let Some(layout) = SourceLayout::from_configs(configs) else {
            self.fail_decode(format!(
                "no compatible buffer configuration for the variant stream: {uri}"
            ));
            return;
        };
        if let Err(err) = self.sink.create_buffers(&layout) {
            self.fail_decode(format!("sink configuration failed: {err}"));
            return;
        }
        debug!(?layout, "sink layout committed");
        self.layout = Some(layout);
        self.committed_codecs = Some(codecs);
        self.exclude_incompatible_variants();
    }

    /// Permanently exclude renditions that cannot share the committed
    /// buffers. No-op until a layout is committed.
    pub(crate) fn exclude_incompatible_variants(&mut self) {
        let Some(layout) = self.committed_codecs.as_ref() else {
            return;
        };
        for id in incompatible_renditions(&self.manifest, layout) {
            debug!(rendition = id.0, "excluding rendition with incompatible codec layout");
            if let Err(err) = self.manifest.exclude(id, Exclusion::Permanent) {
                warn!(%err, "exclusion failed");
            }
        }
    }

    /// Terminal decode failure.
    fn fail_decode(&mut self, message: String) {
        warn!(%message, "terminal decode failure");
        if let Err(err) = self.sink.end_of_stream(Some(EndOfStreamError::Decode)) {
            warn!(%err, "sink rejected the decode failure signal");
        }
        self.publish(PlaybackEvent::Error {
            message,
            fatal: true,
        });
    }
}

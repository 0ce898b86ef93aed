use cadenza_manifest::{Manifest, RenditionId};
use web_time::Instant;

/// Bandwidth estimate assumed before the first sample arrives, bits/s.
pub const INITIAL_BANDWIDTH_BPS: u64 = 4_194_304;

/// Headroom a rendition needs over its advertised bandwidth.
pub const BANDWIDTH_VARIANCE: f64 = 1.2;

/// Immutable view of one eligible rendition.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Candidate {
    pub id: RenditionId,
    pub bandwidth_bps: Option<u64>,
}

/// Snapshot handed to a [`SelectionStrategy`].
///
/// Excluded renditions never appear in `candidates`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SelectionContext {
    pub candidates: Vec<Candidate>,
    /// Latest throughput estimate, `None` before the first sample.
    pub bandwidth_bps: Option<u64>,
    pub current: Option<RenditionId>,
}

impl SelectionContext {
    /// Snapshot the renditions of `manifest` eligible at `now`.
    #[must_use]
    pub fn from_manifest(
        manifest: &Manifest,
        now: Instant,
        bandwidth_bps: Option<u64>,
        current: Option<RenditionId>,
    ) -> Self {
        let candidates = manifest
            .eligible(now)
            .map(|r| Candidate {
                id: r.id,
                bandwidth_bps: r.bandwidth,
            })
            .collect();
        Self {
            candidates,
            bandwidth_bps,
            current,
        }
    }

    #[must_use]
    pub fn candidate(&self, id: RenditionId) -> Option<Candidate> {
        self.candidates.iter().copied().find(|c| c.id == id)
    }
}

/// Pluggable rendition-selection policy.
///
/// Returning an id that is not among the candidates is treated by callers
/// as "no selection".
pub trait SelectionStrategy: Send + Sync {
    fn select(&self, ctx: &SelectionContext) -> Option<RenditionId>;
}

impl<F> SelectionStrategy for F
where
    F: Fn(&SelectionContext) -> Option<RenditionId> + Send + Sync,
{
    fn select(&self, ctx: &SelectionContext) -> Option<RenditionId> {
        self(ctx)
    }
}

/// Picks the highest rendition whose bandwidth, scaled by `variance`, stays
/// under the estimate; otherwise the lowest one.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BandwidthSelector {
    pub variance: f64,
    pub initial_bandwidth_bps: u64,
}

impl Default for BandwidthSelector {
    fn default() -> Self {
        Self {
            variance: BANDWIDTH_VARIANCE,
            initial_bandwidth_bps: INITIAL_BANDWIDTH_BPS,
        }
    }
}

impl SelectionStrategy for BandwidthSelector {
    fn select(&self, ctx: &SelectionContext) -> Option<RenditionId> {
        let estimate_bps = ctx.bandwidth_bps.unwrap_or(self.initial_bandwidth_bps);

        // Unknown bandwidth sorts last and never fits.
        let mut sorted: Vec<(RenditionId, u64)> = ctx
            .candidates
            .iter()
            .map(|c| (c.id, c.bandwidth_bps.unwrap_or(u64::MAX)))
            .collect();
        sorted.sort_by_key(|&(id, bw)| (bw, id));

        #[expect(clippy::cast_precision_loss)] // bitrate precision loss is negligible for ABR
        let best_under = sorted
            .iter()
            .rev()
            .find(|&&(_, bw)| (bw as f64) * self.variance < estimate_bps as f64);
        let chosen = best_under.or_else(|| sorted.first()).map(|&(id, _)| id);

        tracing::trace!(
            estimate_bps,
            candidates = sorted.len(),
            chosen = ?chosen,
            "bandwidth selector"
        );
        chosen
    }
}

/// Closed time interval in seconds on the presentation timeline.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TimeRange {
    pub start: f64,
    pub end: f64,
}

impl TimeRange {
    #[must_use]
    pub fn new(start: f64, end: f64) -> Self {
        Self { start, end }
    }

    #[must_use]
    pub fn len(&self) -> f64 {
        self.end - self.start
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    #[must_use]
    pub fn contains(&self, time: f64) -> bool {
        time >= self.start && time <= self.end
    }

    /// Two ranges overlap unless one starts after the other ends.
    #[must_use]
    pub fn overlaps(&self, other: &Self) -> bool {
        !(other.start > self.end || self.start > other.end)
    }

    /// `[max(starts), min(ends)]`, or `None` for disjoint ranges.
    #[must_use]
    pub fn intersection(&self, other: &Self) -> Option<Self> {
        self.overlaps(other).then(|| {
            Self::new(self.start.max(other.start), self.end.min(other.end))
        })
    }
}

use cadenza_manifest::TimeRange;

/// Combine the main and alternate-audio seekable windows.
///
/// Overlapping windows intersect. Disjoint windows, or no audio window at
/// all, fall back to the main one.
#[must_use]
pub fn reconcile(main: TimeRange, audio: Option<TimeRange>) -> TimeRange {
    audio
        .and_then(|audio| main.intersection(&audio))
        .unwrap_or(main)
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case((10.0, 50.0), Some((20.0, 40.0)), (20.0, 40.0))]
    #[case((10.0, 20.0), Some((100.0, 120.0)), (10.0, 20.0))]
    #[case((0.0, 30.0), Some((15.0, 45.0)), (15.0, 30.0))]
    #[case((100.0, 120.0), Some((10.0, 20.0)), (100.0, 120.0))]
    #[case((5.0, 25.0), None, (5.0, 25.0))]
    fn reconciles(
        #[case] main: (f64, f64),
        #[case] audio: Option<(f64, f64)>,
        #[case] expected: (f64, f64),
    ) {
        let range = |(s, e): (f64, f64)| TimeRange::new(s, e);
        assert_eq!(reconcile(range(main), audio.map(range)), range(expected));
    }
}

use std::{
    iter::Sum,
    ops::{Add, AddAssign},
    time::Duration,
};

/// Transfer counters reported by a track loader.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LoaderStats {
    pub requests: u64,
    pub aborted: u64,
    pub timed_out: u64,
    pub errored: u64,
    pub bytes_transferred: u64,
    pub transfer_duration: Duration,
}

impl Add for LoaderStats {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self {
            requests: self.requests.saturating_add(rhs.requests),
            aborted: self.aborted.saturating_add(rhs.aborted),
            timed_out: self.timed_out.saturating_add(rhs.timed_out),
            errored: self.errored.saturating_add(rhs.errored),
            bytes_transferred: self.bytes_transferred.saturating_add(rhs.bytes_transferred),
            transfer_duration: self.transfer_duration.saturating_add(rhs.transfer_duration),
        }
    }
}

impl AddAssign for LoaderStats {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl Sum for LoaderStats {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), Add::add)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sums_field_by_field() {
        let a = LoaderStats {
            requests: 3,
            aborted: 1,
            bytes_transferred: 1_000,
            transfer_duration: Duration::from_millis(250),
            ..LoaderStats::default()
        };
        let b = LoaderStats {
            requests: 2,
            timed_out: 1,
            errored: 1,
            bytes_transferred: 500,
            transfer_duration: Duration::from_millis(750),
            ..LoaderStats::default()
        };
        let total: LoaderStats = [a, b].into_iter().sum();
        assert_eq!(total.requests, 5);
        assert_eq!(total.aborted, 1);
        assert_eq!(total.timed_out, 1);
        assert_eq!(total.errored, 1);
        assert_eq!(total.bytes_transferred, 1_500);
        assert_eq!(total.transfer_duration, Duration::from_secs(1));
    }
}

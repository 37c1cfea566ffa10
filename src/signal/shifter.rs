//! Pulse placement along a time grid.
//!
//! A mesh event happens every `time_shift` seconds. The shifter walks a
//! running time cursor across the grid and records, for every event, the
//! sample nearest to it. Those centers drive both the pulse train and the
//! per-event index bounds used to bucket torque per tooth.

use super::SignalError;

/// Places copies of a prototype at successive `time_shift` offsets.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SignalShifter {
    time_shift: f64,
}

impl SignalShifter {
    pub fn new(time_shift: f64) -> Self {
        Self { time_shift }
    }

    pub fn time_shift(&self) -> f64 {
        self.time_shift
    }

    /// Center sample index of every event on `time`, starting at sample 0.
    ///
    /// Events continue until the cursor passes the end of the grid by one
    /// shift, so the final event may sit on the last sample. A trailing
    /// duplicate center is dropped.
    pub fn centers(&self, time: &[f64]) -> Vec<usize> {
        let Some(&t_max) = time.last() else {
            return Vec::new();
        };
        if !(self.time_shift > 0.0) {
            return vec![0];
        }

        let mut centers = Vec::with_capacity((t_max / self.time_shift) as usize + 2);
        let mut cursor = 0usize;
        let mut tv = 0.0;
        while tv < t_max + self.time_shift {
            centers.push(cursor);
            tv += self.time_shift;
            // nearest sample; ties resolve to the earlier one
            while cursor + 1 < time.len() && (time[cursor + 1] - tv).abs() < (time[cursor] - tv).abs() {
                cursor += 1;
            }
        }

        let n = centers.len();
        if n >= 2 && centers[n - 1] == centers[n - 2] {
            centers.pop();
        }
        centers
    }

    /// Per-event `[lower, upper)` sample bounds on `time`.
    pub fn event_bounds(&self, time: &[f64]) -> Result<MeshEventBounds, SignalError> {
        let centers = self.centers(time);
        MeshEventBounds::from_centers(&centers)
    }
}

/// Half-open sample ranges, one per mesh event, contiguous after sanitizing.
///
/// Bounds may start below zero or end past the grid; callers clip.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MeshEventBounds {
    bounds: Vec<(i64, i64)>,
}

impl MeshEventBounds {
    /// Derive bounds from event centers: each event spans half the
    /// distance to its neighbours on either side.
    pub fn from_centers(centers: &[usize]) -> Result<Self, SignalError> {
        if centers.len() < 3 {
            return Err(SignalError::GridTooShort {
                needed: 3,
                got: centers.len(),
            });
        }

        let c: Vec<i64> = centers.iter().map(|&v| v as i64).collect();
        let m = c.len();
        let inner: Vec<i64> = (1..m - 1).map(|i| (c[i] - c[i - 1]).abs()).collect();
        let min = inner.iter().copied().min().unwrap_or(0);
        let max = inner.iter().copied().max().unwrap_or(0);

        let mut dist = Vec::with_capacity(m);
        dist.push(min);
        dist.extend_from_slice(&inner);
        dist.push(max);

        let mut bounds: Vec<(i64, i64)> = c
            .iter()
            .zip(&dist)
            .map(|(&center, &d)| {
                let half = d as f64 / 2.0;
                let low = (center as f64 - half).floor() as i64;
                let up = (center as f64 + half).floor() as i64;
                (low, up)
            })
            .collect();

        // adjacent events must meet exactly
        for idx in 1..bounds.len() {
            let previous_upper = bounds[idx - 1].1;
            let lower = bounds[idx].0;
            let gap = lower - previous_upper;
            if gap == 0 {
                continue;
            }
            let is_tail = idx == bounds.len() - 1;
            if is_tail && gap < 0 {
                // the last center is clamped to the grid end
                bounds[idx].0 = previous_upper;
                continue;
            }
            if gap.abs() > 1 {
                return Err(SignalError::BoundsDeviation {
                    event: idx,
                    lower,
                    previous_upper,
                    gap,
                });
            }
            // truncated midpoint
            let meet = ((lower + previous_upper) as f64 / 2.0).trunc() as i64;
            bounds[idx].0 = meet;
            bounds[idx - 1].1 = meet;
        }

        Ok(Self { bounds })
    }

    pub fn len(&self) -> usize {
        self.bounds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bounds.is_empty()
    }

    pub fn get(&self, event: usize) -> Option<(i64, i64)> {
        self.bounds.get(event).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (i64, i64)> + '_ {
        self.bounds.iter().copied()
    }

    /// The first `events` bounds.
    pub fn truncated(&self, events: usize) -> Self {
        Self {
            bounds: self.bounds[..events.min(self.bounds.len())].to_vec(),
        }
    }

    /// Bounds of `event` clipped to `[0, len)`, or `None` if nothing remains.
    pub fn clipped(&self, event: usize, len: usize) -> Option<std::ops::Range<usize>> {
        let (low, up) = self.get(event)?;
        let low = low.max(0) as usize;
        let up = up.clamp(0, len as i64) as usize;
        (low < up).then_some(low..up)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signal::arange;

    #[test]
    fn test_centers_follow_shift() {
        let time = arange(0.0, 0.01, 0.001);
        let centers = SignalShifter::new(0.002).centers(&time);
        assert_eq!(centers, vec![0, 2, 4, 6, 8, 9]);
    }

    #[test]
    fn test_trailing_duplicate_dropped() {
        // 0.00894 and 0.01192 both land on the last sample
        let time = arange(0.0, 0.01, 0.001);
        let centers = SignalShifter::new(0.00298).centers(&time);
        assert_eq!(centers, vec![0, 3, 6, 9]);
        let n = centers.len();
        assert_ne!(centers[n - 1], centers[n - 2]);
    }

    #[test]
    fn test_bounds_are_contiguous() {
        let time = arange(0.0, 1.0, 1.0 / 1000.0);
        let shifter = SignalShifter::new(1.0 / 420.0);
        let bounds = shifter.event_bounds(&time).unwrap();
        assert_eq!(bounds.len(), shifter.centers(&time).len());
        let all: Vec<(i64, i64)> = bounds.iter().collect();
        for pair in all.windows(2) {
            assert_eq!(pair[0].1, pair[1].0, "Bounds must meet: {pair:?}");
        }
        assert!(all[0].0 <= 0, "First event reaches before the grid start");
    }

    #[test]
    fn test_bounds_split_half_distance() {
        let bounds = MeshEventBounds::from_centers(&[0, 10, 20, 30]).unwrap();
        let all: Vec<(i64, i64)> = bounds.iter().collect();
        assert_eq!(all, vec![(-5, 5), (5, 15), (15, 25), (25, 35)]);
    }

    #[test]
    fn test_clamped_tail_event_is_shortened() {
        let bounds = MeshEventBounds::from_centers(&[0, 3, 6, 9, 10]).unwrap();
        let all: Vec<(i64, i64)> = bounds.iter().collect();
        assert_eq!(all[3], (7, 10));
        assert_eq!(all[4], (10, 11));
    }

    #[test]
    fn test_bounds_reject_large_gaps() {
        let err = MeshEventBounds::from_centers(&[0, 2, 20, 22]).unwrap_err();
        assert!(matches!(err, SignalError::BoundsDeviation { .. }));
    }

    #[test]
    fn test_clipped_range() {
        let bounds = MeshEventBounds::from_centers(&[0, 10, 20, 30]).unwrap();
        assert_eq!(bounds.clipped(0, 100), Some(0..5));
        assert_eq!(bounds.clipped(3, 28), Some(25..28));
        assert_eq!(bounds.clipped(3, 20), None);
    }
}

//! Window boundary lookup over timestamp-ordered samples

use super::Sample;

/// Find the most recent sample with `timestamp <= cutoff`.
///
/// `samples` must be sorted by non-decreasing timestamp. Returns `None` for an
/// empty slice or when every sample is newer than `cutoff`. Runs in O(log n).
pub fn find_latest_at_or_before(samples: &[Sample], cutoff: i64) -> Option<&Sample> {
    // first index whose timestamp is past the cutoff
    let idx = samples.partition_point(|sample| sample.timestamp() <= cutoff);
    if idx == 0 {
        return None;
    }
    samples.get(idx - 1)
}

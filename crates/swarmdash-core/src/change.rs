//! The adopt/keep decision policy.
//!
//! The upstream store returns a full window of historical data on every
//! poll, so a successful fetch does not by itself mean progress. Only a
//! strictly newer epoch is worth adopting; everything else keeps the
//! cached snapshot and triggers no broadcast, sparing every connected
//! viewer a redundant re-render.

/// Outcome of comparing a candidate snapshot against the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Replace the cached snapshot and broadcast the candidate.
    Adopt,
    /// Discard the candidate and keep serving the cached snapshot.
    Keep,
}

/// Decide whether a freshly fetched candidate replaces the cache.
///
/// Policy:
///
/// - An empty cache always adopts: the first successful fetch must
///   populate the cache even when no epoch could be extracted, so late
///   joiners have something to replay.
/// - A candidate without an extractable epoch never replaces an
///   existing snapshot; the previous version stays current (there is
///   no sentinel value that could look "newer").
/// - The first extractable epoch after a versionless snapshot counts
///   as progress.
/// - Otherwise, adopt only on a strictly greater epoch. Equal or older
///   epochs keep the cache.
pub const fn decide(
    candidate_epoch: Option<u64>,
    last_epoch: Option<u64>,
    cache_empty: bool,
) -> Decision {
    if cache_empty {
        return Decision::Adopt;
    }
    match (candidate_epoch, last_epoch) {
        (None, _) => Decision::Keep,
        (Some(_), None) => Decision::Adopt,
        (Some(candidate), Some(last)) => {
            if candidate > last {
                Decision::Adopt
            } else {
                Decision::Keep
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_cache_adopts_any_candidate() {
        assert_eq!(decide(Some(1), None, true), Decision::Adopt);
        assert_eq!(decide(None, None, true), Decision::Adopt);
    }

    #[test]
    fn strictly_newer_epoch_adopts() {
        assert_eq!(decide(Some(2), Some(1), false), Decision::Adopt);
        assert_eq!(decide(Some(100), Some(99), false), Decision::Adopt);
    }

    #[test]
    fn equal_epoch_keeps() {
        assert_eq!(decide(Some(5), Some(5), false), Decision::Keep);
    }

    #[test]
    fn older_epoch_keeps() {
        assert_eq!(decide(Some(3), Some(5), false), Decision::Keep);
    }

    #[test]
    fn versionless_candidate_keeps_populated_cache() {
        assert_eq!(decide(None, Some(5), false), Decision::Keep);
        // Also when the cached snapshot itself had no version: a
        // versionless candidate is never progress.
        assert_eq!(decide(None, None, false), Decision::Keep);
    }

    #[test]
    fn first_extractable_epoch_after_versionless_snapshot_adopts() {
        assert_eq!(decide(Some(1), None, false), Decision::Adopt);
    }
}

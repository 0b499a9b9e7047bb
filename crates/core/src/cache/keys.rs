//! Cache key scheme: `kind::season[::subject]`.
//!
//! Every key is namespaced by the entity kind and the season. The full
//! record set of a kind lives under `kind::season`; per-subject sets live
//! under `kind::season::{subject}`. Subject keys are additionally tracked
//! in a backend-side set under `kind::season::_keys` so pattern deletion
//! never needs a keyspace scan.

use crate::record::{Season, SubjectId};

const SEPARATOR: &str = "::";

/// Returns the cache key for the full record set of an entity kind.
pub fn record_set_key(kind: &str, season: &Season) -> String {
    format!("{kind}{SEPARATOR}{season}")
}

/// Returns the cache key for one subject's record set.
pub fn subject_set_key(kind: &str, season: &Season, subject: SubjectId) -> String {
    format!("{kind}{SEPARATOR}{season}{SEPARATOR}{subject}")
}

/// Returns the tracking-set key holding all live subject keys of a kind.
pub fn tracking_key(kind: &str, season: &Season) -> String {
    format!("{kind}{SEPARATOR}{season}{SEPARATOR}_keys")
}

/// Returns the glob pattern matching every subject key of a kind.
pub fn subject_keys_pattern(kind: &str, season: &Season) -> String {
    format!("{kind}{SEPARATOR}{season}{SEPARATOR}*")
}

/// Checks whether a cache key addresses one subject's record set (as
/// opposed to a kind's full set). Subject keys are the ones tracked for
/// pattern deletion.
pub fn is_subject_key(key: &str) -> bool {
    let mut parts = key.split(SEPARATOR);
    let third = parts.nth(2);
    matches!(third, Some(part) if !part.is_empty() && part != "_keys")
}

/// Extracts the `(kind, season)` namespace from a cache key or pattern,
/// if it has one.
///
/// Returns `None` when either component is missing, empty or a wildcard.
pub fn key_namespace(key: &str) -> Option<(&str, &str)> {
    let mut parts = key.split(SEPARATOR);
    let kind = parts.next()?;
    let season = parts.next()?;
    if kind.is_empty() || season.is_empty() || kind.contains('*') || season.contains('*') {
        return None;
    }
    Some((kind, season))
}

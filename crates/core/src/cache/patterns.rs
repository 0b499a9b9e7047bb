//! Glob matching for cache key patterns.
//!
//! Patterns support `*` as a wildcard matching any sequence of characters,
//! including the empty one. This is the matching the cache backends apply
//! against their tracking sets when deleting by pattern.

/// Checks whether a cache key matches a glob pattern.
///
/// # Examples
///
/// ```
/// use leaguesync_core::cache::pattern_matches;
///
/// assert!(pattern_matches("gw_points::2425::*", "gw_points::2425::1042"));
/// assert!(pattern_matches("*::2425", "standing::2425"));
/// assert!(!pattern_matches("gw_points::2425::*", "standing::2425::1042"));
/// ```
pub fn pattern_matches(pattern: &str, key: &str) -> bool {
    match_bytes(pattern.as_bytes(), key.as_bytes())
}

fn match_bytes(pattern: &[u8], key: &[u8]) -> bool {
    match pattern.split_first() {
        None => key.is_empty(),
        Some((b'*', rest)) => {
            // A run of stars is one star.
            let rest = strip_stars(rest);
            if rest.is_empty() {
                return true;
            }
            (0..=key.len()).any(|skip| match_bytes(rest, &key[skip..]))
        }
        Some((ch, rest)) => match key.split_first() {
            Some((first, key_rest)) if first == ch => match_bytes(rest, key_rest),
            _ => false,
        },
    }
}

fn strip_stars(pattern: &[u8]) -> &[u8] {
    let skip = pattern.iter().take_while(|b| **b == b'*').count();
    &pattern[skip..]
}

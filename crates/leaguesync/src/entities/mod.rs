//! Concrete entity kinds synced from the upstream API.
//!
//! One module per kind, each pairing the canonical record type with its
//! fail-closed mapper. The two kinds deliberately exercise the two write
//! policies: gameweek points are append-only history, standings are a
//! "last known" snapshot that gets overwritten.

mod entry_standing;
mod gameweek_points;

pub use entry_standing::{EntryStanding, EntryStandingMapper};
pub use gameweek_points::{GameweekPoints, GameweekPointsMapper};

use leaguesync_core::upstream::MappingError;

/// Narrows an upstream integer to `i32`, failing the record instead of
/// truncating when the value is out of range.
fn to_i32(value: i64, field: &'static str) -> Result<i32, MappingError> {
    i32::try_from(value).map_err(|_| MappingError::InvalidValue {
        field,
        reason: format!("out of range: {value}"),
    })
}

/// Narrows an upstream integer to `u32`, failing the record instead of
/// truncating when the value is out of range.
fn to_u32(value: u64, field: &'static str) -> Result<u32, MappingError> {
    u32::try_from(value).map_err(|_| MappingError::InvalidValue {
        field,
        reason: format!("out of range: {value}"),
    })
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use leaguesync_core::record::{SecondaryKey, SubjectId, SyncRecord, WritePolicy};
use leaguesync_core::upstream::{Mapper, MappingError, RawRecord};

use super::{to_i32, to_u32};

/// One entry's score for one gameweek. Append-only history: once a
/// (entry, event) pair is synced it is never rewritten.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameweekPoints {
    pub entry: SubjectId,
    pub event: u32,
    pub points: i32,
    pub total_points: i32,
    pub event_rank: Option<u64>,
    pub fetched_at: DateTime<Utc>,
}

impl SyncRecord for GameweekPoints {
    const KIND: &'static str = "gw_points";
    const WRITE_POLICY: WritePolicy = WritePolicy::SkipIfExists;

    fn subject_id(&self) -> SubjectId {
        self.entry
    }

    fn secondary_key(&self) -> Option<SecondaryKey> {
        Some(SecondaryKey::from(self.event))
    }
}

/// Maps the upstream's per-event points payload into [`GameweekPoints`].
///
/// Key components (`entry`, `event`) and the score are required; a payload
/// missing any of them fails mapping for that one input.
pub struct GameweekPointsMapper;

impl Mapper<GameweekPoints> for GameweekPointsMapper {
    fn map(&self, raw: &RawRecord) -> Result<GameweekPoints, MappingError> {
        let entry = raw
            .field("entry")
            .and_then(|v| v.as_i64())
            .ok_or(MappingError::MissingField { field: "entry" })?;
        let event = raw
            .field("event")
            .and_then(|v| v.as_u64())
            .ok_or(MappingError::MissingField { field: "event" })?;
        let event = to_u32(event, "event")?;
        if event == 0 {
            return Err(MappingError::InvalidValue {
                field: "event",
                reason: "out of range: 0".to_string(),
            });
        }
        let points = raw
            .field("points")
            .and_then(|v| v.as_i64())
            .ok_or(MappingError::MissingField { field: "points" })?;
        let points = to_i32(points, "points")?;
        let total_points = match raw.field("total_points").and_then(|v| v.as_i64()) {
            Some(total) => to_i32(total, "total_points")?,
            None => points,
        };
        let event_rank = raw.field("rank").and_then(|v| v.as_u64());

        Ok(GameweekPoints {
            entry: SubjectId(entry),
            event,
            points,
            total_points,
            event_rank,
            fetched_at: Utc::now(),
        })
    }
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use leaguesync_core::record::{SecondaryKey, SubjectId, SyncRecord, WritePolicy};
use leaguesync_core::upstream::{Mapper, MappingError, RawRecord};

use super::{to_i32, to_u32};

/// The last known overall standing of one entry. A snapshot, explicitly
/// overwritten on every sync rather than appended to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntryStanding {
    pub entry: SubjectId,
    pub overall_rank: u64,
    pub total_points: i32,
    pub last_event: u32,
    pub updated_at: DateTime<Utc>,
}

impl SyncRecord for EntryStanding {
    const KIND: &'static str = "standing";
    const WRITE_POLICY: WritePolicy = WritePolicy::Overwrite;

    fn subject_id(&self) -> SubjectId {
        self.entry
    }

    fn secondary_key(&self) -> Option<SecondaryKey> {
        None
    }
}

/// Maps the upstream's entry summary payload into [`EntryStanding`].
pub struct EntryStandingMapper;

impl Mapper<EntryStanding> for EntryStandingMapper {
    fn map(&self, raw: &RawRecord) -> Result<EntryStanding, MappingError> {
        let entry = raw
            .field("entry")
            .and_then(|v| v.as_i64())
            .ok_or(MappingError::MissingField { field: "entry" })?;
        let overall_rank = raw
            .field("overall_rank")
            .and_then(|v| v.as_u64())
            .ok_or(MappingError::MissingField { field: "overall_rank" })?;
        let total_points = raw
            .field("total_points")
            .and_then(|v| v.as_i64())
            .ok_or(MappingError::MissingField { field: "total_points" })?;
        let total_points = to_i32(total_points, "total_points")?;
        let last_event = match raw.field("current_event").and_then(|v| v.as_u64()) {
            Some(event) => to_u32(event, "current_event")?,
            None => 0,
        };

        Ok(EntryStanding {
            entry: SubjectId(entry),
            overall_rank,
            total_points,
            last_event,
            updated_at: Utc::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_maps_summary_payload() {
        let raw = RawRecord::new(json!({
            "entry": 1042,
            "overall_rank": 95_000,
            "total_points": 612,
            "current_event": 10
        }));

        let record = EntryStandingMapper.map(&raw).unwrap();
        assert_eq!(record.entry, SubjectId(1042));
        assert_eq!(record.overall_rank, 95_000);
        assert_eq!(record.total_points, 612);
        assert_eq!(record.last_event, 10);
        assert_eq!(record.natural_key().to_string(), "1042");
    }

    #[test]
    fn test_standing_has_no_secondary_key() {
        let raw = RawRecord::new(json!({
            "entry": 1,
            "overall_rank": 1,
            "total_points": 1
        }));
        let record = EntryStandingMapper.map(&raw).unwrap();
        assert_eq!(record.secondary_key(), None);
    }

    #[test]
    fn test_out_of_range_fields_fail_closed() {
        let raw = RawRecord::new(json!({
            "entry": 1042,
            "overall_rank": 95_000,
            "total_points": 5_000_000_000_i64,
            "current_event": 10
        }));
        assert!(matches!(
            EntryStandingMapper.map(&raw),
            Err(MappingError::InvalidValue { field: "total_points", .. })
        ));

        let raw = RawRecord::new(json!({
            "entry": 1042,
            "overall_rank": 95_000,
            "total_points": 612,
            "current_event": 5_000_000_000_u64
        }));
        assert!(matches!(
            EntryStandingMapper.map(&raw),
            Err(MappingError::InvalidValue { field: "current_event", .. })
        ));
    }

    #[test]
    fn test_missing_rank_fails_closed() {
        let raw = RawRecord::new(json!({"entry": 1042, "total_points": 612}));
        assert_eq!(
            EntryStandingMapper.map(&raw),
            Err(MappingError::MissingField { field: "overall_rank" })
        );
    }
}

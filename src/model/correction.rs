use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use utoipa::ToSchema;

/// Lifecycle of a correction request: pending until an admin resolves it.
#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, Display, EnumString, ToSchema,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum CorrectionStatus {
    Pending,
    Approved,
    Rejected,
}

impl CorrectionStatus {
    /// Only the most-recently-submitted request governs the lock: a day
    /// whose latest request is still pending accepts no further edits or
    /// correction submissions until resolved.
    pub fn locks_day(latest: Option<CorrectionStatus>) -> bool {
        matches!(latest, Some(CorrectionStatus::Pending))
    }
}

/// One proposed break interval inside a correction request's snapshot,
/// stored as a JSON list on the request row.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ProposedBreak {
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pending_latest_request_locks_the_day() {
        assert!(CorrectionStatus::locks_day(Some(CorrectionStatus::Pending)));
    }

    #[test]
    fn resolved_or_absent_latest_request_leaves_the_day_editable() {
        assert!(!CorrectionStatus::locks_day(None));
        assert!(!CorrectionStatus::locks_day(Some(
            CorrectionStatus::Approved
        )));
        assert!(!CorrectionStatus::locks_day(Some(
            CorrectionStatus::Rejected
        )));
    }

    #[test]
    fn status_string_round_trip() {
        use std::str::FromStr;
        assert_eq!(CorrectionStatus::Pending.to_string(), "pending");
        assert_eq!(
            CorrectionStatus::from_str("approved").unwrap(),
            CorrectionStatus::Approved
        );
    }
}

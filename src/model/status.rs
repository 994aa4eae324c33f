use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use utoipa::ToSchema;

/// Work status of one attendance day. Persisted on the day row and updated
/// atomically with every clock transition, so it survives across requests
/// without any session-scoped state.
#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, Display, EnumString, ToSchema,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum WorkStatus {
    BeforeWork,
    Working,
    OnBreak,
    AfterWork,
}

impl WorkStatus {
    /// Resolves the display status, first match wins:
    /// a stored status hint is returned verbatim; otherwise the status is
    /// reconstructed from the shift times alone. The fallback cannot tell
    /// "on break" apart from "working" (an open break carries no closing
    /// timestamp), so it conservatively reports working.
    pub fn resolve(
        hint: Option<WorkStatus>,
        start: Option<NaiveTime>,
        end: Option<NaiveTime>,
    ) -> WorkStatus {
        if let Some(status) = hint {
            return status;
        }
        if start.is_none() {
            return WorkStatus::BeforeWork;
        }
        if end.is_some() {
            return WorkStatus::AfterWork;
        }
        WorkStatus::Working
    }

    /// Status implied by the shift times only, used when an edit path
    /// rewrites the times out from under the stored status.
    pub fn from_shift(start: Option<NaiveTime>, end: Option<NaiveTime>) -> WorkStatus {
        Self::resolve(None, start, end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn hint_wins_over_shift_times() {
        // shift alone would say "working"
        let resolved = WorkStatus::resolve(Some(WorkStatus::OnBreak), Some(t(9, 0)), None);
        assert_eq!(resolved, WorkStatus::OnBreak);
    }

    #[test]
    fn no_start_means_before_work() {
        assert_eq!(
            WorkStatus::resolve(None, None, None),
            WorkStatus::BeforeWork
        );
    }

    #[test]
    fn end_set_means_after_work() {
        assert_eq!(
            WorkStatus::resolve(None, Some(t(9, 0)), Some(t(18, 0))),
            WorkStatus::AfterWork
        );
    }

    #[test]
    fn open_shift_falls_back_to_working() {
        assert_eq!(
            WorkStatus::resolve(None, Some(t(9, 0)), None),
            WorkStatus::Working
        );
    }

    #[test]
    fn snake_case_round_trip() {
        assert_eq!(WorkStatus::OnBreak.to_string(), "on_break");
        assert_eq!(
            WorkStatus::from_str("after_work").unwrap(),
            WorkStatus::AfterWork
        );
    }
}

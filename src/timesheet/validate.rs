use chrono::NaiveTime;
use serde::Serialize;
use std::collections::BTreeMap;

/// Field-scoped validation errors, serialized as
/// `{"errors": {"start_time": ["..."], "breaks[0].end_time": ["..."]}}`.
#[derive(Debug, Default, Serialize)]
pub struct FieldErrors {
    pub errors: BTreeMap<String, Vec<String>>,
}

impl FieldErrors {
    pub fn push(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors
            .entry(field.into())
            .or_default()
            .push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn into_result(self) -> Result<(), FieldErrors> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

/// One break interval as submitted on an edit or correction form.
#[derive(Debug, Clone, Copy)]
pub struct BreakTimes {
    pub start: Option<NaiveTime>,
    pub end: Option<NaiveTime>,
}

/// Temporal ordering rules shared by the employee correction-submission path
/// and the admin direct-edit path:
/// - shift start must be strictly earlier than shift end;
/// - each break start must fall within [shift start, shift end];
/// - each break end must not exceed shift end;
/// - at most one break may be left open (start set, end absent);
/// - note is required and non-empty.
/// Boundary equality (break start == shift start, break end == shift end) is
/// valid; only strict exceedance is an error. All violations are collected
/// and the whole submission is rejected, nothing is mutated.
pub fn validate_day_times(
    start: Option<NaiveTime>,
    end: Option<NaiveTime>,
    breaks: &[BreakTimes],
    note: &str,
) -> Result<(), FieldErrors> {
    let mut errors = FieldErrors::default();

    if note.trim().is_empty() {
        errors.push("note", "Note is required");
    }

    if let (Some(s), Some(e)) = (start, end) {
        if s >= e {
            errors.push("start_time", "Start time must be earlier than end time");
        }
    }

    let mut open_seen = false;
    for (i, b) in breaks.iter().enumerate() {
        // a day carries at most one open break row
        if b.start.is_some() && b.end.is_none() {
            if open_seen {
                errors.push(
                    format!("breaks[{i}].end_time"),
                    "At most one break may be left open",
                );
            }
            open_seen = true;
        }
        if let Some(bs) = b.start {
            if let Some(s) = start {
                if bs < s {
                    errors.push(
                        format!("breaks[{i}].start_time"),
                        "Break start must not be earlier than shift start",
                    );
                }
            }
            if let Some(e) = end {
                if bs > e {
                    errors.push(
                        format!("breaks[{i}].start_time"),
                        "Break start must not be later than shift end",
                    );
                }
            }
        }
        if let (Some(be), Some(e)) = (b.end, end) {
            if be > e {
                errors.push(
                    format!("breaks[{i}].end_time"),
                    "Break end must not be later than shift end",
                );
            }
        }
    }

    errors.into_result()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn brk(start: Option<NaiveTime>, end: Option<NaiveTime>) -> BreakTimes {
        BreakTimes { start, end }
    }

    #[test]
    fn valid_day_passes() {
        let breaks = [brk(Some(t(12, 0)), Some(t(13, 0)))];
        assert!(validate_day_times(Some(t(9, 0)), Some(t(18, 0)), &breaks, "worked").is_ok());
    }

    #[test]
    fn inverted_shift_lands_on_start_field() {
        let err = validate_day_times(Some(t(18, 0)), Some(t(9, 0)), &[], "note").unwrap_err();
        assert!(err.errors.contains_key("start_time"));
    }

    #[test]
    fn equal_start_and_end_is_rejected() {
        let err = validate_day_times(Some(t(9, 0)), Some(t(9, 0)), &[], "note").unwrap_err();
        assert!(err.errors.contains_key("start_time"));
    }

    #[test]
    fn break_before_shift_start_lands_on_break_start_field() {
        let breaks = [brk(Some(t(8, 0)), Some(t(8, 30)))];
        let err =
            validate_day_times(Some(t(9, 0)), Some(t(18, 0)), &breaks, "note").unwrap_err();
        assert!(err.errors.contains_key("breaks[0].start_time"));
    }

    #[test]
    fn break_end_past_shift_end_lands_on_break_end_field() {
        let breaks = [brk(Some(t(17, 0)), Some(t(19, 0)))];
        let err =
            validate_day_times(Some(t(9, 0)), Some(t(18, 0)), &breaks, "note").unwrap_err();
        assert!(err.errors.contains_key("breaks[0].end_time"));
    }

    #[test]
    fn boundary_equality_is_valid() {
        // break start == shift start and break end == shift end
        let breaks = [brk(Some(t(9, 0)), Some(t(18, 0)))];
        assert!(validate_day_times(Some(t(9, 0)), Some(t(18, 0)), &breaks, "note").is_ok());
    }

    #[test]
    fn single_open_break_is_valid() {
        let breaks = [brk(Some(t(12, 0)), None)];
        assert!(validate_day_times(Some(t(9, 0)), None, &breaks, "note").is_ok());
    }

    #[test]
    fn second_open_break_lands_on_its_end_field() {
        let breaks = [brk(Some(t(12, 0)), None), brk(Some(t(14, 0)), None)];
        let err = validate_day_times(Some(t(9, 0)), None, &breaks, "note").unwrap_err();
        assert!(err.errors.contains_key("breaks[1].end_time"));
        assert!(!err.errors.contains_key("breaks[0].end_time"));
    }

    #[test]
    fn empty_note_is_rejected_on_every_mutating_path() {
        let err = validate_day_times(Some(t(9, 0)), Some(t(18, 0)), &[], "  ").unwrap_err();
        assert!(err.errors.contains_key("note"));
    }

    #[test]
    fn all_violations_are_collected() {
        let breaks = [brk(Some(t(6, 0)), Some(t(23, 0)))];
        let err = validate_day_times(Some(t(18, 0)), Some(t(9, 0)), &breaks, "").unwrap_err();
        assert_eq!(err.errors.len(), 4);
    }
}

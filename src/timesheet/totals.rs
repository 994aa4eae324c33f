use chrono::NaiveTime;

/// Whole minutes from start to end, floored at zero.
pub fn minutes_between(start: NaiveTime, end: NaiveTime) -> i64 {
    (end - start).num_minutes().max(0)
}

/// Minutes of one break interval: max(0, end - start) when both times are
/// present, else 0.
pub fn break_minutes(start: Option<NaiveTime>, end: Option<NaiveTime>) -> i64 {
    match (start, end) {
        (Some(s), Some(e)) => minutes_between(s, e),
        _ => 0,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayTotals {
    pub break_minutes: i64,
    pub worked_minutes: i64,
}

/// Net worked minutes for a day:
/// worked = max(0, minutes(start, end) - max(0, sum of break minutes)).
/// A shift inconsistent with its recorded breaks floors at zero rather than
/// producing a negative total.
pub fn compute_day_totals(
    start: Option<NaiveTime>,
    end: Option<NaiveTime>,
    breaks: impl IntoIterator<Item = i64>,
) -> DayTotals {
    let shift_minutes = match (start, end) {
        (Some(s), Some(e)) => minutes_between(s, e),
        _ => 0,
    };
    let break_total: i64 = breaks.into_iter().map(|m| m.max(0)).sum::<i64>().max(0);

    DayTotals {
        break_minutes: break_total,
        worked_minutes: (shift_minutes - break_total).max(0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn nine_to_six_with_ninety_minutes_break() {
        let totals = compute_day_totals(Some(t(9, 0)), Some(t(18, 0)), [60, 30]);
        assert_eq!(totals.break_minutes, 90);
        assert_eq!(totals.worked_minutes, 450); // 7:30
    }

    #[test]
    fn breaks_exceeding_shift_floor_at_zero() {
        let totals = compute_day_totals(Some(t(9, 0)), Some(t(10, 0)), [120]);
        assert_eq!(totals.break_minutes, 120);
        assert_eq!(totals.worked_minutes, 0);
    }

    #[test]
    fn inverted_shift_counts_as_zero() {
        let totals = compute_day_totals(Some(t(18, 0)), Some(t(9, 0)), []);
        assert_eq!(totals.worked_minutes, 0);
    }

    #[test]
    fn missing_end_means_no_worked_minutes() {
        let totals = compute_day_totals(Some(t(9, 0)), None, [15]);
        assert_eq!(totals.break_minutes, 15);
        assert_eq!(totals.worked_minutes, 0);
    }

    #[test]
    fn negative_break_entries_are_clamped_out() {
        let totals = compute_day_totals(Some(t(9, 0)), Some(t(17, 0)), [-30, 60]);
        assert_eq!(totals.break_minutes, 60);
        assert_eq!(totals.worked_minutes, 420);
    }

    #[test]
    fn open_break_contributes_no_minutes() {
        assert_eq!(break_minutes(Some(t(12, 0)), None), 0);
        assert_eq!(break_minutes(None, None), 0);
    }

    #[test]
    fn inverted_break_clamps_to_zero() {
        assert_eq!(break_minutes(Some(t(13, 0)), Some(t(12, 0))), 0);
    }
}

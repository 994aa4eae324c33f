use chrono::{NaiveDateTime, NaiveTime};

/// Parses a free-form time-of-day string. Tries "H:M", then "H:M:S", then a
/// generic date-time as a last resort. Unparseable input is absent, never an
/// error; callers handle the `None` explicitly.
pub fn parse_time_of_day(input: &str) -> Option<NaiveTime> {
    let s = input.trim();
    if s.is_empty() {
        return None;
    }

    NaiveTime::parse_from_str(s, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M:%S"))
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
                .ok()
                .map(|dt| dt.time())
        })
}

/// Storage form, second precision: "09:00:00".
pub fn fmt_storage(t: NaiveTime) -> String {
    t.format("%H:%M:%S").to_string()
}

/// Display form: "09:00".
pub fn fmt_display(t: NaiveTime) -> String {
    t.format("%H:%M").to_string()
}

/// Formats a minute count as "H:MM" for reports, e.g. 450 -> "7:30".
pub fn fmt_h_mm(minutes: i64) -> String {
    let minutes = minutes.max(0);
    format!("{}:{:02}", minutes / 60, minutes % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_hours_and_minutes() {
        assert_eq!(
            parse_time_of_day("09:00"),
            NaiveTime::from_hms_opt(9, 0, 0)
        );
    }

    #[test]
    fn parses_seconds_form() {
        assert_eq!(
            parse_time_of_day("09:00:30"),
            NaiveTime::from_hms_opt(9, 0, 30)
        );
    }

    #[test]
    fn falls_back_to_generic_date_time() {
        assert_eq!(
            parse_time_of_day("2026-08-01 13:45:00"),
            NaiveTime::from_hms_opt(13, 45, 0)
        );
    }

    #[test]
    fn garbage_and_empty_are_absent() {
        assert_eq!(parse_time_of_day(""), None);
        assert_eq!(parse_time_of_day("   "), None);
        assert_eq!(parse_time_of_day("not a time"), None);
        assert_eq!(parse_time_of_day("25:99"), None);
    }

    #[test]
    fn storage_display_round_trip() {
        let t = parse_time_of_day("09:00:00").unwrap();
        assert_eq!(fmt_storage(t), "09:00:00");
        assert_eq!(fmt_display(t), "09:00");
        assert_eq!(parse_time_of_day(&fmt_storage(t)), Some(t));
    }

    #[test]
    fn minutes_render_as_h_mm() {
        assert_eq!(fmt_h_mm(450), "7:30");
        assert_eq!(fmt_h_mm(60), "1:00");
        assert_eq!(fmt_h_mm(5), "0:05");
        assert_eq!(fmt_h_mm(-10), "0:00");
    }
}

use chrono::NaiveTime;
use thiserror::Error;

/// The four clock actions an employee can issue against today's record.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ClockAction {
    ClockIn,
    ClockOut,
    BreakIn,
    BreakOut,
}

/// Outcome of a permitted clock action. `NoOp` marks the idempotent cases
/// (double break-in, break-out with nothing open) that succeed without
/// touching stored minutes.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ClockOutcome {
    Proceed,
    NoOp,
}

/// Precondition violations on clock actions. Surfaced as user-facing
/// messages, never as transport-level faults.
#[derive(Debug, Error, Eq, PartialEq)]
pub enum ClockDenied {
    #[error("Already clocked in today")]
    AlreadyClockedIn,
    #[error("Not clocked in yet")]
    NotClockedIn,
    #[error("Already clocked out today")]
    AlreadyClockedOut,
    #[error("Shift already finished")]
    ShiftFinished,
}

/// Checks a clock action against the day's shift times and open-break state.
/// Pure; the caller holds the day row lock and applies the effect.
pub fn check_clock_action(
    action: ClockAction,
    start: Option<NaiveTime>,
    end: Option<NaiveTime>,
    has_open_break: bool,
) -> Result<ClockOutcome, ClockDenied> {
    match action {
        ClockAction::ClockIn => {
            if start.is_some() {
                return Err(ClockDenied::AlreadyClockedIn);
            }
            Ok(ClockOutcome::Proceed)
        }
        ClockAction::ClockOut => {
            if start.is_none() {
                return Err(ClockDenied::NotClockedIn);
            }
            if end.is_some() {
                return Err(ClockDenied::AlreadyClockedOut);
            }
            Ok(ClockOutcome::Proceed)
        }
        ClockAction::BreakIn => {
            if start.is_none() {
                return Err(ClockDenied::NotClockedIn);
            }
            if end.is_some() {
                return Err(ClockDenied::ShiftFinished);
            }
            if has_open_break {
                // double break-in leaves the single open break untouched
                return Ok(ClockOutcome::NoOp);
            }
            Ok(ClockOutcome::Proceed)
        }
        ClockAction::BreakOut => {
            if start.is_none() {
                return Err(ClockDenied::NotClockedIn);
            }
            if end.is_some() {
                return Err(ClockDenied::ShiftFinished);
            }
            if !has_open_break {
                // nothing to close; status simply resets to working
                return Ok(ClockOutcome::NoOp);
            }
            Ok(ClockOutcome::Proceed)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn clock_in_twice_is_denied() {
        assert_eq!(
            check_clock_action(ClockAction::ClockIn, Some(t(9, 0)), None, false),
            Err(ClockDenied::AlreadyClockedIn)
        );
    }

    #[test]
    fn clock_out_requires_clock_in() {
        assert_eq!(
            check_clock_action(ClockAction::ClockOut, None, None, false),
            Err(ClockDenied::NotClockedIn)
        );
    }

    #[test]
    fn clock_out_twice_is_denied() {
        assert_eq!(
            check_clock_action(ClockAction::ClockOut, Some(t(9, 0)), Some(t(18, 0)), false),
            Err(ClockDenied::AlreadyClockedOut)
        );
    }

    #[test]
    fn break_in_after_clock_out_is_denied() {
        assert_eq!(
            check_clock_action(ClockAction::BreakIn, Some(t(9, 0)), Some(t(18, 0)), false),
            Err(ClockDenied::ShiftFinished)
        );
    }

    #[test]
    fn double_break_in_is_an_idempotent_no_op() {
        assert_eq!(
            check_clock_action(ClockAction::BreakIn, Some(t(9, 0)), None, true),
            Ok(ClockOutcome::NoOp)
        );
    }

    #[test]
    fn break_out_without_open_break_is_a_no_op() {
        assert_eq!(
            check_clock_action(ClockAction::BreakOut, Some(t(9, 0)), None, false),
            Ok(ClockOutcome::NoOp)
        );
    }

    #[test]
    fn normal_break_cycle_proceeds() {
        assert_eq!(
            check_clock_action(ClockAction::BreakIn, Some(t(9, 0)), None, false),
            Ok(ClockOutcome::Proceed)
        );
        assert_eq!(
            check_clock_action(ClockAction::BreakOut, Some(t(9, 0)), None, true),
            Ok(ClockOutcome::Proceed)
        );
    }
}

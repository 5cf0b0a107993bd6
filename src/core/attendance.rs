use chrono::NaiveTime;
use serde::Serialize;
use strum_macros::Display;

use crate::model::time_record::{AttendanceStatus, TimeRecord};

/// Punch action the clock endpoint should perform next.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum PunchAction {
    Entry,
    Exit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PunchError {
    /// Both entry and exit already recorded for the date.
    AlreadyCompleted,
    /// The employee was marked absent for the date.
    AlreadyAbsent,
}

/// Decide the next punch action from today's record, if any.
///
/// A record only ever moves forward: no entry, entry only, entry + exit.
/// Absences block punching until an administrator clears them.
pub fn next_punch(existing: Option<&TimeRecord>) -> Result<PunchAction, PunchError> {
    let record = match existing {
        None => return Ok(PunchAction::Entry),
        Some(r) => r,
    };

    if record.status == AttendanceStatus::Absent {
        return Err(PunchError::AlreadyAbsent);
    }

    match (record.entry_time, record.exit_time) {
        (Some(_), None) => Ok(PunchAction::Exit),
        (Some(_), Some(_)) => Err(PunchError::AlreadyCompleted),
        // Entry was cleared by an administrative edit; the next punch fills it again.
        (None, _) => Ok(PunchAction::Entry),
    }
}

/// Punch times an administrative override leaves on an existing record.
///
/// An ABSENT record never carries punch times, so marking a day ABSENT
/// wipes whatever was recorded. Any other status keeps the recorded times.
pub fn override_punch_times(
    existing: &TimeRecord,
    status: AttendanceStatus,
) -> (Option<NaiveTime>, Option<NaiveTime>) {
    match status {
        AttendanceStatus::Absent => (None, None),
        _ => (existing.entry_time, existing.exit_time),
    }
}

/// Minutes between entry and exit, if both are present and the shift does
/// not cross midnight. Cross-midnight pairs are treated as incomplete.
pub fn worked_minutes(entry: Option<NaiveTime>, exit: Option<NaiveTime>) -> Option<i64> {
    let diff = exit?.signed_duration_since(entry?).num_minutes();
    (diff >= 0).then_some(diff)
}

/// Formats a worked duration as "9h" or "8h 30min".
pub fn format_duration(minutes: i64) -> String {
    let hours = minutes / 60;
    let rest = minutes % 60;
    if rest > 0 {
        format!("{}h {}min", hours, rest)
    } else {
        format!("{}h", hours)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::time_record::ShiftType;
    use chrono::NaiveDate;

    fn record(entry: Option<&str>, exit: Option<&str>, status: AttendanceStatus) -> TimeRecord {
        let t = |s: &str| NaiveTime::parse_from_str(s, "%H:%M").unwrap();
        TimeRecord {
            id: 1,
            employee_id: 7,
            date: NaiveDate::from_ymd_opt(2025, 6, 2).unwrap(),
            entry_time: entry.map(t),
            exit_time: exit.map(t),
            status,
            shift: ShiftType::FullDay,
            observations: None,
            created_at: None,
        }
    }

    #[test]
    fn first_punch_of_the_day_is_an_entry() {
        assert_eq!(next_punch(None), Ok(PunchAction::Entry));
    }

    #[test]
    fn second_punch_performs_the_exit() {
        let open = record(Some("08:00"), None, AttendanceStatus::Present);
        assert_eq!(next_punch(Some(&open)), Ok(PunchAction::Exit));
    }

    #[test]
    fn third_punch_is_rejected() {
        let done = record(Some("08:00"), Some("17:00"), AttendanceStatus::Present);
        assert_eq!(next_punch(Some(&done)), Err(PunchError::AlreadyCompleted));
    }

    #[test]
    fn absent_record_blocks_punching() {
        let absent = record(None, None, AttendanceStatus::Absent);
        assert_eq!(next_punch(Some(&absent)), Err(PunchError::AlreadyAbsent));
    }

    #[test]
    fn marking_a_worked_day_absent_clears_both_punches() {
        let worked = record(Some("08:00"), Some("17:00"), AttendanceStatus::Present);
        assert_eq!(
            override_punch_times(&worked, AttendanceStatus::Absent),
            (None, None)
        );

        let half_open = record(Some("08:00"), None, AttendanceStatus::Present);
        assert_eq!(
            override_punch_times(&half_open, AttendanceStatus::Absent),
            (None, None)
        );
    }

    #[test]
    fn present_override_keeps_recorded_punches() {
        let t = |s: &str| NaiveTime::parse_from_str(s, "%H:%M").unwrap();
        let worked = record(Some("08:00"), Some("17:00"), AttendanceStatus::Present);
        assert_eq!(
            override_punch_times(&worked, AttendanceStatus::Present),
            (Some(t("08:00")), Some(t("17:00")))
        );

        // clearing an absence leaves the (empty) punches untouched
        let absent = record(None, None, AttendanceStatus::Absent);
        assert_eq!(
            override_punch_times(&absent, AttendanceStatus::Present),
            (None, None)
        );
    }

    #[test]
    fn worked_minutes_requires_both_punches() {
        let t = |s: &str| NaiveTime::parse_from_str(s, "%H:%M").unwrap();
        assert_eq!(worked_minutes(Some(t("08:00")), Some(t("17:00"))), Some(540));
        assert_eq!(worked_minutes(Some(t("08:00")), None), None);
        assert_eq!(worked_minutes(None, Some(t("17:00"))), None);
        // cross-midnight pair is not a valid duration
        assert_eq!(worked_minutes(Some(t("22:00")), Some(t("06:00"))), None);
    }

    #[test]
    fn duration_formatting_omits_zero_minutes() {
        assert_eq!(format_duration(540), "9h");
        assert_eq!(format_duration(510), "8h 30min");
        assert_eq!(format_duration(45), "0h 45min");
        assert_eq!(format_duration(0), "0h");
    }
}

use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use utoipa::ToSchema;

/// Weekday labels as stored in the employee work-day set.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, ToSchema,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum WeekDay {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl WeekDay {
    pub fn from_date(date: NaiveDate) -> Self {
        match date.weekday() {
            Weekday::Mon => WeekDay::Monday,
            Weekday::Tue => WeekDay::Tuesday,
            Weekday::Wed => WeekDay::Wednesday,
            Weekday::Thu => WeekDay::Thursday,
            Weekday::Fri => WeekDay::Friday,
            Weekday::Sat => WeekDay::Saturday,
            Weekday::Sun => WeekDay::Sunday,
        }
    }

    /// Short label used on the export sheets.
    pub fn label_pt(&self) -> &'static str {
        match self {
            WeekDay::Monday => "Segunda",
            WeekDay::Tuesday => "Terça",
            WeekDay::Wednesday => "Quarta",
            WeekDay::Thursday => "Quinta",
            WeekDay::Friday => "Sexta",
            WeekDay::Saturday => "Sábado",
            WeekDay::Sunday => "Domingo",
        }
    }
}

/// True iff the weekday of `date` is in the employee's work-day set.
pub fn is_scheduled(work_days: &[WeekDay], date: NaiveDate) -> bool {
    work_days.contains(&WeekDay::from_date(date))
}

/// Number of dates in the inclusive range on which the work-day set applies.
pub fn scheduled_days_in_range(work_days: &[WeekDay], start: NaiveDate, end: NaiveDate) -> u32 {
    if start > end {
        return 0;
    }
    start
        .iter_days()
        .take_while(|d| *d <= end)
        .filter(|d| is_scheduled(work_days, *d))
        .count() as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn scheduled_iff_weekday_in_set() {
        let work_days = vec![WeekDay::Monday, WeekDay::Wednesday, WeekDay::Friday];
        // 2025-06-02 is a Monday
        assert!(is_scheduled(&work_days, date(2025, 6, 2)));
        assert!(!is_scheduled(&work_days, date(2025, 6, 3))); // Tuesday
        assert!(is_scheduled(&work_days, date(2025, 6, 4))); // Wednesday
        assert!(!is_scheduled(&work_days, date(2025, 6, 5))); // Thursday
        assert!(is_scheduled(&work_days, date(2025, 6, 6))); // Friday
        assert!(!is_scheduled(&[], date(2025, 6, 2)));
    }

    #[test]
    fn counts_scheduled_days_in_inclusive_range() {
        let work_days = vec![WeekDay::Monday, WeekDay::Wednesday, WeekDay::Friday];
        // Mon 2025-06-02 .. Sun 2025-06-08 -> Mon, Wed, Fri
        assert_eq!(
            scheduled_days_in_range(&work_days, date(2025, 6, 2), date(2025, 6, 8)),
            3
        );
        // Single-day range on a scheduled day
        assert_eq!(
            scheduled_days_in_range(&work_days, date(2025, 6, 2), date(2025, 6, 2)),
            1
        );
        // Empty set on any range
        assert_eq!(scheduled_days_in_range(&[], date(2025, 6, 2), date(2025, 6, 30)), 0);
        // Inverted range
        assert_eq!(
            scheduled_days_in_range(&work_days, date(2025, 6, 8), date(2025, 6, 2)),
            0
        );
    }

    #[test]
    fn weekday_string_forms_match_storage_labels() {
        assert_eq!(WeekDay::Monday.to_string(), "monday");
        assert_eq!("sunday".parse::<WeekDay>().unwrap(), WeekDay::Sunday);
        assert_eq!(
            serde_json::to_string(&WeekDay::Wednesday).unwrap(),
            "\"wednesday\""
        );
    }
}

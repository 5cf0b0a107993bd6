use chrono::NaiveDate;
use serde::Serialize;
use utoipa::ToSchema;

use crate::core::schedule::scheduled_days_in_range;
use crate::model::employee::Employee;
use crate::model::time_record::{AttendanceStatus, TimeRecord};

/// One aggregate per employee over the reporting range.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AttendanceReportEntry {
    pub employee: Employee,
    /// Days in range on which the employee was scheduled.
    pub total_days: u32,
    pub present: u32,
    pub absent: u32,
    #[schema(example = 66.7)]
    pub present_percentage: f64,
    #[schema(example = 33.3)]
    pub absent_percentage: f64,
    /// Chronological records for the employee within the range.
    pub records: Vec<TimeRecord>,
}

fn percentage(part: u32, total: u32) -> f64 {
    if total == 0 {
        return 0.0;
    }
    // one decimal place
    (part as f64 / total as f64 * 1000.0).round() / 10.0
}

/// Aggregates per-employee attendance over an inclusive date range.
///
/// `records` must already be restricted to the range and sorted by date;
/// the handler's query does both. A scheduled day with no record counts
/// in neither tally until the absence generator has run for that date.
pub fn build_report(
    employees: &[Employee],
    records: &[TimeRecord],
    start: NaiveDate,
    end: NaiveDate,
) -> Vec<AttendanceReportEntry> {
    employees
        .iter()
        .map(|employee| {
            let own: Vec<TimeRecord> = records
                .iter()
                .filter(|r| r.employee_id == employee.id)
                .cloned()
                .collect();

            let total_days = scheduled_days_in_range(&employee.work_days, start, end);
            let present = own
                .iter()
                .filter(|r| r.status == AttendanceStatus::Present)
                .count() as u32;
            let absent = own
                .iter()
                .filter(|r| r.status == AttendanceStatus::Absent)
                .count() as u32;

            AttendanceReportEntry {
                employee: employee.clone(),
                total_days,
                present,
                absent,
                present_percentage: percentage(present, total_days),
                absent_percentage: percentage(absent, total_days),
                records: own,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::schedule::WeekDay;
    use crate::model::time_record::ShiftType;
    use chrono::NaiveTime;
    use sqlx::types::Json;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn employee(id: u64, work_days: Vec<WeekDay>) -> Employee {
        Employee {
            id,
            name: format!("Employee {id}"),
            position: "Vigia".into(),
            registration: format!("EMP-{id:03}"),
            work_days: Json(work_days),
            created_at: None,
        }
    }

    fn record(id: u64, employee_id: u64, d: NaiveDate, status: AttendanceStatus) -> TimeRecord {
        let present = status == AttendanceStatus::Present;
        TimeRecord {
            id,
            employee_id,
            date: d,
            entry_time: present.then(|| NaiveTime::from_hms_opt(8, 0, 0).unwrap()),
            exit_time: present.then(|| NaiveTime::from_hms_opt(17, 0, 0).unwrap()),
            status,
            shift: ShiftType::FullDay,
            observations: None,
            created_at: None,
        }
    }

    #[test]
    fn totals_and_percentages_over_a_week() {
        // Mon/Wed/Fri schedule over Mon 2025-06-02 .. Sun 2025-06-08
        let employees = vec![employee(
            1,
            vec![WeekDay::Monday, WeekDay::Wednesday, WeekDay::Friday],
        )];
        let records = vec![
            record(1, 1, date(2025, 6, 2), AttendanceStatus::Present),
            record(2, 1, date(2025, 6, 4), AttendanceStatus::Absent),
        ];

        let report = build_report(&employees, &records, date(2025, 6, 2), date(2025, 6, 8));
        assert_eq!(report.len(), 1);
        let entry = &report[0];
        assert_eq!(entry.total_days, 3);
        assert_eq!(entry.present, 1);
        assert_eq!(entry.absent, 1);
        assert!(entry.present + entry.absent <= entry.total_days);
        assert_eq!(entry.present_percentage, 33.3);
        assert_eq!(entry.absent_percentage, 33.3);
        assert_eq!(entry.records.len(), 2);
        // Friday was scheduled but has no record: in neither tally.
    }

    #[test]
    fn zero_scheduled_days_yields_zero_percentages() {
        let employees = vec![employee(1, vec![])];
        let report = build_report(&employees, &[], date(2025, 6, 2), date(2025, 6, 8));
        assert_eq!(report[0].total_days, 0);
        assert_eq!(report[0].present_percentage, 0.0);
        assert_eq!(report[0].absent_percentage, 0.0);
    }

    #[test]
    fn single_monday_in_range_counts_one_present() {
        let employees = vec![employee(
            1,
            vec![WeekDay::Monday, WeekDay::Wednesday, WeekDay::Friday],
        )];
        let records = vec![record(1, 1, date(2025, 6, 2), AttendanceStatus::Present)];

        // Range covers only that Monday.
        let report = build_report(&employees, &records, date(2025, 6, 2), date(2025, 6, 2));
        assert_eq!(report[0].total_days, 1);
        assert_eq!(report[0].present, 1);
        assert_eq!(report[0].present_percentage, 100.0);
    }

    #[test]
    fn records_are_kept_per_employee_in_query_order() {
        let employees = vec![
            employee(1, vec![WeekDay::Monday]),
            employee(2, vec![WeekDay::Monday]),
        ];
        let records = vec![
            record(1, 2, date(2025, 6, 2), AttendanceStatus::Present),
            record(2, 1, date(2025, 6, 2), AttendanceStatus::Present),
            record(3, 1, date(2025, 6, 9), AttendanceStatus::Absent),
        ];

        let report = build_report(&employees, &records, date(2025, 6, 2), date(2025, 6, 9));
        assert_eq!(report[0].records.iter().map(|r| r.id).collect::<Vec<_>>(), vec![2, 3]);
        assert_eq!(report[1].records.iter().map(|r| r.id).collect::<Vec<_>>(), vec![1]);
    }
}

use std::collections::HashSet;

use chrono::NaiveDate;

use crate::core::schedule::is_scheduled;
use crate::model::employee::Employee;

/// Observation text stamped on automatically generated absence records.
pub const AUTO_ABSENCE_NOTE: &str = "Falta gerada automaticamente pelo sistema";

/// Employees scheduled on `date` that have no record for it yet.
///
/// Existing records are never touched, so feeding the result of one run
/// back as `existing` makes a second run a no-op.
pub fn candidates<'a>(
    employees: &'a [Employee],
    existing: &HashSet<u64>,
    date: NaiveDate,
) -> Vec<&'a Employee> {
    employees
        .iter()
        .filter(|e| is_scheduled(&e.work_days, date) && !existing.contains(&e.id))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::schedule::WeekDay;
    use sqlx::types::Json;

    fn employee(id: u64, work_days: Vec<WeekDay>) -> Employee {
        Employee {
            id,
            name: format!("Employee {id}"),
            position: "Auxiliar".into(),
            registration: format!("EMP-{id:03}"),
            work_days: Json(work_days),
            created_at: None,
        }
    }

    #[test]
    fn only_scheduled_employees_without_records_are_selected() {
        // 2025-06-04 is a Wednesday
        let date = NaiveDate::from_ymd_opt(2025, 6, 4).unwrap();
        let employees = vec![
            employee(1, vec![WeekDay::Monday, WeekDay::Wednesday]),
            employee(2, vec![WeekDay::Tuesday]),
            employee(3, vec![WeekDay::Wednesday]),
        ];
        let existing = HashSet::from([3]);

        let picked = candidates(&employees, &existing, date);
        let ids: Vec<u64> = picked.iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![1]);
    }

    #[test]
    fn second_run_is_idempotent() {
        let date = NaiveDate::from_ymd_opt(2025, 6, 4).unwrap();
        let employees = vec![
            employee(1, vec![WeekDay::Wednesday]),
            employee(2, vec![WeekDay::Wednesday]),
        ];

        let mut existing = HashSet::new();
        let first = candidates(&employees, &existing, date);
        assert_eq!(first.len(), 2);

        // Materialize the first run's records, then run again.
        existing.extend(first.iter().map(|e| e.id));
        assert!(candidates(&employees, &existing, date).is_empty());
    }

    #[test]
    fn no_scheduled_employees_yields_empty_set() {
        let date = NaiveDate::from_ymd_opt(2025, 6, 4).unwrap();
        let employees = vec![employee(1, vec![WeekDay::Sunday])];
        assert!(candidates(&employees, &HashSet::new(), date).is_empty());
    }
}

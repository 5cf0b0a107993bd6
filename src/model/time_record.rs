use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use utoipa::ToSchema;

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    sqlx::Type,
    ToSchema,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AttendanceStatus {
    Present,
    Absent,
}

impl AttendanceStatus {
    /// Display label used on exports.
    pub fn label_pt(&self) -> &'static str {
        match self {
            AttendanceStatus::Present => "Presente",
            AttendanceStatus::Absent => "Faltou",
        }
    }
}

/// Which portion of a scheduled day an absence covers.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    sqlx::Type,
    ToSchema,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ShiftType {
    Morning,
    Afternoon,
    FullDay,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[schema(example = json!({
    "id": 1,
    "employee_id": 7,
    "date": "2025-06-02",
    "entry_time": "08:00:00",
    "exit_time": "17:00:00",
    "status": "PRESENT",
    "shift": "FULL_DAY",
    "observations": null,
    "created_at": "2025-06-02T08:00:00Z"
}))]
pub struct TimeRecord {
    pub id: u64,
    pub employee_id: u64,
    #[schema(example = "2025-06-02", value_type = String, format = "date")]
    pub date: NaiveDate,
    #[schema(example = "08:00:00", value_type = String, nullable = true)]
    pub entry_time: Option<NaiveTime>,
    #[schema(example = "17:00:00", value_type = String, nullable = true)]
    pub exit_time: Option<NaiveTime>,
    pub status: AttendanceStatus,
    pub shift: ShiftType,
    pub observations: Option<String>,
    #[schema(value_type = String, format = "date-time", nullable = true)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Record row joined with the owning employee, as returned by the
/// today listing and the flat exports.
#[derive(Debug, Clone, Serialize, sqlx::FromRow, ToSchema)]
pub struct TimeRecordWithEmployee {
    pub id: u64,
    pub employee_id: u64,
    #[schema(value_type = String, format = "date")]
    pub date: NaiveDate,
    #[schema(value_type = String, nullable = true)]
    pub entry_time: Option<NaiveTime>,
    #[schema(value_type = String, nullable = true)]
    pub exit_time: Option<NaiveTime>,
    pub status: AttendanceStatus,
    pub shift: ShiftType,
    pub observations: Option<String>,
    pub name: String,
    pub registration: String,
    pub position: String,
}

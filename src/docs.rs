use crate::api::employee::{CreateEmployee, UpdateEmployee};
use crate::api::time_record::{
    ClockRequest, GenerateAbsencesRequest, MarkAbsenceRequest, ReportQuery,
};
use crate::core::report::AttendanceReportEntry;
use crate::model::employee::Employee;
use crate::model::time_record::{
    AttendanceStatus, ShiftType, TimeRecord, TimeRecordWithEmployee,
};
use crate::models::{ChangePasswordDto, LoginReqDto};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi, openapi};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Ponto API",
        version = "1.0.0",
        description = r#"
## Employee Time-Clock Tracker

This API powers an internal **time-clock** system for one organization's staff.

### 🔹 Key Features
- **Employee Management**
  - Register employees with positions and weekly work-day schedules
- **Time Records**
  - Clock-in/clock-out punches, manual absence marking, automatic absence
    detection for scheduled employees without a punch
- **Reports**
  - Per-employee attendance aggregates over a date range, exportable as a
    multi-sheet spreadsheet or CSV

### 🔐 Security
Endpoints are protected using **JWT Bearer authentication**. Employee
mutations and reports require the **Admin** or **Manager** role.

---
Built with **Rust**, **Actix Web**, **SQLx**, and **Utoipa**.
"#,
    ),
    paths(
        crate::api::employee::create_employee,
        crate::api::employee::list_employees,
        crate::api::employee::get_employee,
        crate::api::employee::update_employee,
        crate::api::employee::delete_employee,
        crate::api::employee::scheduled_today,

        crate::api::time_record::list_records,
        crate::api::time_record::today_records,
        crate::api::time_record::clock,
        crate::api::time_record::mark_absence,
        crate::api::time_record::generate_absences,
        crate::api::time_record::attendance_report,
        crate::api::time_record::export_attendance_report,
        crate::api::time_record::export_records,
        crate::api::time_record::delete_record,
    ),
    components(
        schemas(
            Employee,
            CreateEmployee,
            UpdateEmployee,
            TimeRecord,
            TimeRecordWithEmployee,
            AttendanceStatus,
            ShiftType,
            AttendanceReportEntry,
            ClockRequest,
            MarkAbsenceRequest,
            GenerateAbsencesRequest,
            ReportQuery,
            LoginReqDto,
            ChangePasswordDto
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Employee", description = "Employee management APIs"),
        (name = "TimeRecord", description = "Punch, absence and report APIs"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

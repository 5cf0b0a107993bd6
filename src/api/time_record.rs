use std::collections::HashSet;

use crate::{
    auth::auth::AuthUser,
    core::{
        absence::{AUTO_ABSENCE_NOTE, candidates},
        attendance::{PunchAction, PunchError, next_punch, override_punch_times},
        export::{attendance_report_workbook, records_csv, simple_records_workbook},
        report::{AttendanceReportEntry, build_report},
    },
    error::{ApiError, is_duplicate_key},
    model::{
        employee::Employee,
        time_record::{AttendanceStatus, ShiftType, TimeRecord, TimeRecordWithEmployee},
    },
};
use actix_web::{HttpResponse, Responder, web};
use chrono::{Local, NaiveDate, NaiveTime, Timelike};
use serde::Deserialize;
use serde_json::json;
use sqlx::{MySqlExecutor, MySqlPool};
use tracing::{error, info};
use utoipa::{IntoParams, ToSchema};

const XLSX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct RecordsQuery {
    /// Filter by employee ID
    pub employee_id: Option<u64>,
    /// Inclusive range start (YYYY-MM-DD)
    #[param(value_type = Option<String>, example = "2025-06-02")]
    pub start_date: Option<NaiveDate>,
    /// Inclusive range end (YYYY-MM-DD)
    #[param(value_type = Option<String>, example = "2025-06-08")]
    pub end_date: Option<NaiveDate>,
}

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct ReportQuery {
    #[param(value_type = String, example = "2025-06-02")]
    pub start_date: NaiveDate,
    #[param(value_type = String, example = "2025-06-08")]
    pub end_date: NaiveDate,
    pub employee_id: Option<u64>,
}

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct ExportQuery {
    #[param(value_type = String, example = "2025-06-02")]
    pub start_date: NaiveDate,
    #[param(value_type = String, example = "2025-06-08")]
    pub end_date: NaiveDate,
    pub employee_id: Option<u64>,
    /// "xlsx" (default) or "csv"
    pub format: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct ClockRequest {
    #[schema(example = 7)]
    pub employee_id: u64,
}

#[derive(Deserialize, ToSchema)]
pub struct MarkAbsenceRequest {
    pub employee_id: u64,
    #[schema(value_type = String, example = "2025-06-04")]
    pub date: NaiveDate,
    /// Defaults to ABSENT
    pub status: Option<AttendanceStatus>,
    /// Defaults to FULL_DAY
    pub shift: Option<ShiftType>,
    #[schema(example = "Atestado médico")]
    pub observations: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct GenerateAbsencesRequest {
    #[schema(value_type = String, example = "2025-06-04")]
    pub date: NaiveDate,
}

/// Current local time truncated to minute granularity.
fn punch_time() -> NaiveTime {
    let now = Local::now().time();
    now.with_second(0)
        .and_then(|t| t.with_nanosecond(0))
        .unwrap_or(now)
}

async fn ensure_employee_exists(
    executor: impl MySqlExecutor<'_>,
    employee_id: u64,
) -> Result<(), ApiError> {
    let exists = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM employees WHERE id = ?")
        .bind(employee_id)
        .fetch_one(executor)
        .await?;
    if exists == 0 {
        return Err(ApiError::NotFound("Employee not found".into()));
    }
    Ok(())
}

async fn fetch_record_for_date(
    executor: impl MySqlExecutor<'_>,
    employee_id: u64,
    date: NaiveDate,
) -> Result<TimeRecord, ApiError> {
    sqlx::query_as::<_, TimeRecord>(
        "SELECT * FROM time_records WHERE employee_id = ? AND date = ?",
    )
    .bind(employee_id)
    .bind(date)
    .fetch_optional(executor)
    .await?
    .ok_or(ApiError::Internal)
}

/// Filtered record list
#[utoipa::path(
    get,
    path = "/api/time-records",
    params(RecordsQuery),
    responses(
        (status = 200, description = "Time records, newest first", body = Vec<TimeRecord>),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "TimeRecord"
)]
pub async fn list_records(
    pool: web::Data<MySqlPool>,
    query: web::Query<RecordsQuery>,
) -> Result<impl Responder, ApiError> {
    // ---------- build WHERE clause dynamically ----------
    let mut conditions: Vec<&str> = Vec::new();
    if query.employee_id.is_some() {
        conditions.push("employee_id = ?");
    }
    if query.start_date.is_some() {
        conditions.push("date >= ?");
    }
    if query.end_date.is_some() {
        conditions.push("date <= ?");
    }

    let where_clause = if conditions.is_empty() {
        String::new()
    } else {
        format!("WHERE {}", conditions.join(" AND "))
    };
    let sql = format!(
        "SELECT * FROM time_records {} ORDER BY date DESC, id DESC",
        where_clause
    );

    let mut data_query = sqlx::query_as::<_, TimeRecord>(&sql);
    if let Some(employee_id) = query.employee_id {
        data_query = data_query.bind(employee_id);
    }
    if let Some(start_date) = query.start_date {
        data_query = data_query.bind(start_date);
    }
    if let Some(end_date) = query.end_date {
        data_query = data_query.bind(end_date);
    }

    let records = data_query.fetch_all(pool.get_ref()).await?;
    Ok(HttpResponse::Ok().json(records))
}

async fn fetch_joined_records(
    pool: &MySqlPool,
    start: NaiveDate,
    end: NaiveDate,
    employee_id: Option<u64>,
) -> Result<Vec<TimeRecordWithEmployee>, ApiError> {
    let mut sql = String::from(
        r#"
        SELECT t.id, t.employee_id, t.date, t.entry_time, t.exit_time,
               t.status, t.shift, t.observations,
               e.name, e.registration, e.position
        FROM time_records t
        JOIN employees e ON e.id = t.employee_id
        WHERE t.date BETWEEN ? AND ?
        "#,
    );
    if employee_id.is_some() {
        sql.push_str(" AND t.employee_id = ?");
    }
    sql.push_str(" ORDER BY t.date, t.id");

    let mut query = sqlx::query_as::<_, TimeRecordWithEmployee>(&sql)
        .bind(start)
        .bind(end);
    if let Some(id) = employee_id {
        query = query.bind(id);
    }

    Ok(query.fetch_all(pool).await?)
}

/// Today's records across all employees
#[utoipa::path(
    get,
    path = "/api/time-records/today",
    responses(
        (status = 200, description = "Today's records with employee info", body = Vec<TimeRecordWithEmployee>),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "TimeRecord"
)]
pub async fn today_records(pool: web::Data<MySqlPool>) -> Result<impl Responder, ApiError> {
    let today = Local::now().date_naive();
    let records = fetch_joined_records(pool.get_ref(), today, today, None).await?;
    Ok(HttpResponse::Ok().json(records))
}

/// Clock in/out
///
/// First punch of the day records the entry; the second records the exit.
/// Any further punch, or a punch against an absence, is rejected.
#[utoipa::path(
    post,
    path = "/api/time-records/clock",
    request_body = ClockRequest,
    responses(
        (status = 200, description = "Punch recorded", body = Object, example = json!({
            "message": "Entry recorded successfully",
            "action": "entry",
            "record": {}
        })),
        (status = 404, description = "Employee not found"),
        (status = 409, description = "Punch not allowed for today's record state"),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "TimeRecord"
)]
pub async fn clock(
    pool: web::Data<MySqlPool>,
    payload: web::Json<ClockRequest>,
) -> Result<impl Responder, ApiError> {
    let employee_id = payload.employee_id;
    let now = Local::now();
    let today = now.date_naive();
    let time = punch_time();

    let mut tx = pool.begin().await?;

    ensure_employee_exists(&mut *tx, employee_id).await?;

    // Serialize concurrent punches for the same (employee, date).
    let existing = sqlx::query_as::<_, TimeRecord>(
        "SELECT * FROM time_records WHERE employee_id = ? AND date = ? FOR UPDATE",
    )
    .bind(employee_id)
    .bind(today)
    .fetch_optional(&mut *tx)
    .await?;

    let action = next_punch(existing.as_ref()).map_err(|e| match e {
        PunchError::AlreadyCompleted => {
            ApiError::Conflict("Entry and exit already recorded for today".into())
        }
        PunchError::AlreadyAbsent => {
            ApiError::Conflict("Employee is marked absent for today".into())
        }
    })?;

    match (action, &existing) {
        (PunchAction::Entry, None) => {
            let result = sqlx::query(
                r#"
                INSERT INTO time_records (employee_id, date, entry_time, status, shift)
                VALUES (?, ?, ?, 'PRESENT', 'FULL_DAY')
                "#,
            )
            .bind(employee_id)
            .bind(today)
            .bind(time)
            .execute(&mut *tx)
            .await;

            if let Err(e) = result {
                if is_duplicate_key(&e) {
                    // lost a race with a concurrent punch
                    return Err(ApiError::Conflict("Duplicate punch detected".into()));
                }
                error!(error = %e, employee_id, "Clock-in failed");
                return Err(ApiError::Internal);
            }
        }
        (PunchAction::Entry, Some(record)) => {
            // entry cleared by an administrative edit; refill it
            sqlx::query("UPDATE time_records SET entry_time = ?, status = 'PRESENT' WHERE id = ?")
                .bind(time)
                .bind(record.id)
                .execute(&mut *tx)
                .await?;
        }
        (PunchAction::Exit, Some(record)) => {
            sqlx::query("UPDATE time_records SET exit_time = ? WHERE id = ?")
                .bind(time)
                .bind(record.id)
                .execute(&mut *tx)
                .await?;
        }
        (PunchAction::Exit, None) => return Err(ApiError::Internal),
    }

    let record = fetch_record_for_date(&mut *tx, employee_id, today).await?;
    tx.commit().await?;

    let message = match action {
        PunchAction::Entry => "Entry recorded successfully",
        PunchAction::Exit => "Exit recorded successfully",
    };
    info!(employee_id, action = %action, "Punch recorded");

    Ok(HttpResponse::Ok().json(json!({
        "message": message,
        "action": action,
        "record": record,
    })))
}

/// Manually mark an absence (administrative override)
///
/// Unlike the batch generator, this endpoint overwrites an existing record
/// for the date, including a PRESENT one.
#[utoipa::path(
    post,
    path = "/api/time-records/mark-absence",
    request_body = MarkAbsenceRequest,
    responses(
        (status = 200, description = "Record written", body = TimeRecord),
        (status = 404, description = "Employee not found"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "TimeRecord"
)]
pub async fn mark_absence(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<MarkAbsenceRequest>,
) -> Result<impl Responder, ApiError> {
    auth.require_manager_or_admin()?;

    let payload = payload.into_inner();
    let status = payload.status.unwrap_or(AttendanceStatus::Absent);
    let shift = payload.shift.unwrap_or(ShiftType::FullDay);

    let mut tx = pool.begin().await?;

    ensure_employee_exists(&mut *tx, payload.employee_id).await?;

    let existing = sqlx::query_as::<_, TimeRecord>(
        "SELECT * FROM time_records WHERE employee_id = ? AND date = ? FOR UPDATE",
    )
    .bind(payload.employee_id)
    .bind(payload.date)
    .fetch_optional(&mut *tx)
    .await?;

    match existing {
        Some(record) => {
            let (entry_time, exit_time) = override_punch_times(&record, status);
            sqlx::query(
                r#"
                UPDATE time_records
                SET status = ?, shift = ?, observations = ?,
                    entry_time = ?, exit_time = ?
                WHERE id = ?
                "#,
            )
            .bind(status)
            .bind(shift)
            .bind(&payload.observations)
            .bind(entry_time)
            .bind(exit_time)
            .bind(record.id)
            .execute(&mut *tx)
            .await?;
        }
        None => {
            let result = sqlx::query(
                r#"
                INSERT INTO time_records (employee_id, date, status, shift, observations)
                VALUES (?, ?, ?, ?, ?)
                "#,
            )
            .bind(payload.employee_id)
            .bind(payload.date)
            .bind(status)
            .bind(shift)
            .bind(&payload.observations)
            .execute(&mut *tx)
            .await;

            if let Err(e) = result {
                if is_duplicate_key(&e) {
                    return Err(ApiError::Conflict("Record already being written".into()));
                }
                error!(error = %e, employee_id = payload.employee_id, "Mark-absence failed");
                return Err(ApiError::Internal);
            }
        }
    }

    let record = fetch_record_for_date(&mut *tx, payload.employee_id, payload.date).await?;
    tx.commit().await?;

    info!(
        employee_id = payload.employee_id,
        date = %payload.date,
        status = %status,
        "Record marked manually"
    );
    Ok(HttpResponse::Ok().json(record))
}

/// Generate absence records for a date
///
/// Every employee scheduled on the date's weekday without a record gets an
/// ABSENT/FULL_DAY record. Existing records are never overwritten, so the
/// operation is idempotent.
#[utoipa::path(
    post,
    path = "/api/time-records/generate-absences",
    request_body = GenerateAbsencesRequest,
    responses(
        (status = 200, description = "Absences created", body = Object, example = json!({
            "message": "Absence generation completed",
            "created": 2,
            "records": []
        })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "TimeRecord"
)]
pub async fn generate_absences(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<GenerateAbsencesRequest>,
) -> Result<impl Responder, ApiError> {
    auth.require_manager_or_admin()?;

    let date = payload.date;

    let employees = sqlx::query_as::<_, Employee>("SELECT * FROM employees")
        .fetch_all(pool.get_ref())
        .await?;

    let existing: HashSet<u64> =
        sqlx::query_scalar::<_, u64>("SELECT employee_id FROM time_records WHERE date = ?")
            .bind(date)
            .fetch_all(pool.get_ref())
            .await?
            .into_iter()
            .collect();

    let mut created = Vec::new();
    for employee in candidates(&employees, &existing, date) {
        let result = sqlx::query(
            r#"
            INSERT INTO time_records (employee_id, date, status, shift, observations)
            VALUES (?, ?, 'ABSENT', 'FULL_DAY', ?)
            "#,
        )
        .bind(employee.id)
        .bind(date)
        .bind(AUTO_ABSENCE_NOTE)
        .execute(pool.get_ref())
        .await;

        match result {
            Ok(_) => {
                let record = fetch_record_for_date(pool.get_ref(), employee.id, date).await?;
                created.push(record);
            }
            // a record appeared since the scan; skip, never overwrite
            Err(e) if is_duplicate_key(&e) => continue,
            Err(e) => {
                error!(error = %e, employee_id = employee.id, "Absence insert failed");
                return Err(ApiError::Internal);
            }
        }
    }

    info!(date = %date, created = created.len(), "Absence generation completed");
    Ok(HttpResponse::Ok().json(json!({
        "message": "Absence generation completed",
        "created": created.len(),
        "records": created,
    })))
}

async fn load_report(
    pool: &MySqlPool,
    query: &ReportQuery,
) -> Result<Vec<AttendanceReportEntry>, ApiError> {
    if query.start_date > query.end_date {
        return Err(ApiError::Validation(
            "start_date cannot be after end_date".into(),
        ));
    }

    let employees = match query.employee_id {
        Some(id) => {
            let employee = sqlx::query_as::<_, Employee>("SELECT * FROM employees WHERE id = ?")
                .bind(id)
                .fetch_optional(pool)
                .await?
                .ok_or_else(|| ApiError::NotFound("Employee not found".into()))?;
            vec![employee]
        }
        None => {
            sqlx::query_as::<_, Employee>("SELECT * FROM employees ORDER BY name")
                .fetch_all(pool)
                .await?
        }
    };

    let mut sql =
        String::from("SELECT * FROM time_records WHERE date BETWEEN ? AND ?");
    if query.employee_id.is_some() {
        sql.push_str(" AND employee_id = ?");
    }
    sql.push_str(" ORDER BY date, id");

    let mut records_query = sqlx::query_as::<_, TimeRecord>(&sql)
        .bind(query.start_date)
        .bind(query.end_date);
    if let Some(id) = query.employee_id {
        records_query = records_query.bind(id);
    }
    let records = records_query.fetch_all(pool).await?;

    Ok(build_report(
        &employees,
        &records,
        query.start_date,
        query.end_date,
    ))
}

/// Attendance report over a date range
#[utoipa::path(
    get,
    path = "/api/time-records/attendance-report",
    params(ReportQuery),
    responses(
        (status = 200, description = "Per-employee aggregates", body = Vec<AttendanceReportEntry>),
        (status = 400, description = "Invalid range"),
        (status = 404, description = "Employee not found"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "TimeRecord"
)]
pub async fn attendance_report(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<ReportQuery>,
) -> Result<impl Responder, ApiError> {
    auth.require_manager_or_admin()?;

    let report = load_report(pool.get_ref(), &query).await?;
    Ok(HttpResponse::Ok().json(report))
}

/// Download the attendance report as a multi-sheet xlsx workbook
#[utoipa::path(
    get,
    path = "/api/time-records/attendance-report/export",
    params(ReportQuery),
    responses(
        (status = 200, description = "xlsx file download"),
        (status = 400, description = "Invalid range"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "TimeRecord"
)]
pub async fn export_attendance_report(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<ReportQuery>,
) -> Result<impl Responder, ApiError> {
    auth.require_manager_or_admin()?;

    let report = load_report(pool.get_ref(), &query).await?;
    let bytes =
        attendance_report_workbook(&report, query.start_date, query.end_date).map_err(|e| {
            error!(error = %e, "Report workbook rendering failed");
            ApiError::Internal
        })?;

    let filename = format!(
        "relatorio_frequencia_{}_{}.xlsx",
        query.start_date, query.end_date
    );
    Ok(HttpResponse::Ok()
        .content_type(XLSX_CONTENT_TYPE)
        .insert_header((
            "Content-Disposition",
            format!("attachment; filename=\"{filename}\""),
        ))
        .body(bytes))
}

/// Download a flat record export (xlsx or csv)
#[utoipa::path(
    get,
    path = "/api/time-records/export",
    params(ExportQuery),
    responses(
        (status = 200, description = "Export file"),
        (status = 400, description = "Invalid range"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "TimeRecord"
)]
pub async fn export_records(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<ExportQuery>,
) -> Result<impl Responder, ApiError> {
    auth.require_manager_or_admin()?;

    if query.start_date > query.end_date {
        return Err(ApiError::Validation(
            "start_date cannot be after end_date".into(),
        ));
    }

    let rows = fetch_joined_records(
        pool.get_ref(),
        query.start_date,
        query.end_date,
        query.employee_id,
    )
    .await?;

    match query.format.as_deref() {
        Some("csv") => {
            let bytes = records_csv(&rows).map_err(|e| {
                error!(error = %e, "CSV rendering failed");
                ApiError::Internal
            })?;
            let filename = format!(
                "registros_ponto_{}_{}.csv",
                query.start_date, query.end_date
            );
            Ok(HttpResponse::Ok()
                .content_type("text/csv; charset=utf-8")
                .insert_header((
                    "Content-Disposition",
                    format!("attachment; filename=\"{filename}\""),
                ))
                .body(bytes))
        }
        Some("xlsx") | None => {
            let bytes = simple_records_workbook(&rows).map_err(|e| {
                error!(error = %e, "Workbook rendering failed");
                ApiError::Internal
            })?;
            let filename = format!(
                "registros_ponto_{}_{}.xlsx",
                query.start_date, query.end_date
            );
            Ok(HttpResponse::Ok()
                .content_type(XLSX_CONTENT_TYPE)
                .insert_header((
                    "Content-Disposition",
                    format!("attachment; filename=\"{filename}\""),
                ))
                .body(bytes))
        }
        Some(other) => Err(ApiError::Validation(format!(
            "Unknown export format: {other}"
        ))),
    }
}

/// Delete a time record
#[utoipa::path(
    delete,
    path = "/api/time-records/{id}",
    params(("id", Path, description = "Record ID")),
    responses(
        (status = 200, description = "Successfully deleted"),
        (status = 404, description = "Record not found"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "TimeRecord"
)]
pub async fn delete_record(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> Result<impl Responder, ApiError> {
    auth.require_manager_or_admin()?;

    let record_id = path.into_inner();

    let result = sqlx::query("DELETE FROM time_records WHERE id = ?")
        .bind(record_id)
        .execute(pool.get_ref())
        .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::NotFound("Record not found".into()));
    }

    info!(record_id, "Time record deleted");
    Ok(HttpResponse::Ok().json(json!({
        "message": "Successfully deleted"
    })))
}

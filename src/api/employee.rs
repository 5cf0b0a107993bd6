use crate::{
    auth::auth::AuthUser,
    core::schedule::{WeekDay, is_scheduled},
    error::{ApiError, is_duplicate_key},
    model::employee::Employee,
};
use actix_web::{HttpResponse, Responder, web};
use chrono::Local;
use serde::Deserialize;
use serde_json::json;
use sqlx::{MySqlPool, types::Json};
use tracing::{error, info};
use utoipa::ToSchema;

#[derive(Deserialize, ToSchema)]
pub struct CreateEmployee {
    #[schema(example = "Maria Souza")]
    pub name: String,
    #[schema(example = "Recepcionista")]
    pub position: String,
    #[schema(example = "EMP-001")]
    pub registration: String,
    #[schema(value_type = Vec<String>, example = json!(["monday", "wednesday", "friday"]))]
    pub work_days: Vec<WeekDay>,
}

#[derive(Deserialize, ToSchema)]
pub struct UpdateEmployee {
    pub name: Option<String>,
    pub position: Option<String>,
    pub registration: Option<String>,
    #[schema(value_type = Option<Vec<String>>)]
    pub work_days: Option<Vec<WeekDay>>,
}

async fn fetch_employee(pool: &MySqlPool, id: u64) -> Result<Employee, ApiError> {
    sqlx::query_as::<_, Employee>("SELECT * FROM employees WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| ApiError::NotFound("Employee not found".into()))
}

/// Create Employee
#[utoipa::path(
    post,
    path = "/api/employees",
    request_body = CreateEmployee,
    responses(
        (status = 201, description = "Employee created", body = Employee),
        (status = 400, description = "Validation error"),
        (status = 409, description = "Registration already exists"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Employee"
)]
pub async fn create_employee(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<CreateEmployee>,
) -> Result<impl Responder, ApiError> {
    auth.require_manager_or_admin()?;

    let payload = payload.into_inner();
    if payload.name.trim().is_empty()
        || payload.position.trim().is_empty()
        || payload.registration.trim().is_empty()
    {
        return Err(ApiError::Validation(
            "Name, position and registration are required".into(),
        ));
    }
    if payload.work_days.is_empty() {
        return Err(ApiError::Validation(
            "At least one work day must be selected".into(),
        ));
    }

    let result = sqlx::query(
        r#"
        INSERT INTO employees (name, position, registration, work_days)
        VALUES (?, ?, ?, ?)
        "#,
    )
    .bind(payload.name.trim())
    .bind(payload.position.trim())
    .bind(payload.registration.trim())
    .bind(Json(&payload.work_days))
    .execute(pool.get_ref())
    .await;

    let result = match result {
        Ok(r) => r,
        Err(e) if is_duplicate_key(&e) => {
            return Err(ApiError::Conflict("Registration already exists".into()));
        }
        Err(e) => {
            error!(error = %e, "Failed to create employee");
            return Err(ApiError::Internal);
        }
    };

    let employee = fetch_employee(pool.get_ref(), result.last_insert_id()).await?;

    info!(employee_id = employee.id, "Employee created");
    Ok(HttpResponse::Created().json(employee))
}

/// List all employees
#[utoipa::path(
    get,
    path = "/api/employees",
    responses(
        (status = 200, description = "Employee list", body = Vec<Employee>),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Employee"
)]
pub async fn list_employees(pool: web::Data<MySqlPool>) -> Result<impl Responder, ApiError> {
    let employees = sqlx::query_as::<_, Employee>("SELECT * FROM employees ORDER BY name")
        .fetch_all(pool.get_ref())
        .await?;

    Ok(HttpResponse::Ok().json(employees))
}

/// Get Employee by ID
#[utoipa::path(
    get,
    path = "/api/employees/{id}",
    params(("id", Path, description = "Employee ID")),
    responses(
        (status = 200, description = "Employee found", body = Employee),
        (status = 404, description = "Employee not found"),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Employee"
)]
pub async fn get_employee(
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> Result<impl Responder, ApiError> {
    let employee = fetch_employee(pool.get_ref(), path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(employee))
}

/// Partial update of an employee
#[utoipa::path(
    put,
    path = "/api/employees/{id}",
    params(("id", Path, description = "Employee ID")),
    request_body = UpdateEmployee,
    responses(
        (status = 200, description = "Employee updated", body = Employee),
        (status = 400, description = "Validation error"),
        (status = 404, description = "Employee not found"),
        (status = 409, description = "Registration already exists"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Employee"
)]
pub async fn update_employee(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    payload: web::Json<UpdateEmployee>,
) -> Result<impl Responder, ApiError> {
    auth.require_manager_or_admin()?;

    let employee_id = path.into_inner();
    let payload = payload.into_inner();

    // ---------- build SET clause dynamically ----------
    let mut clauses: Vec<&str> = Vec::new();
    if payload.name.is_some() {
        clauses.push("name = ?");
    }
    if payload.position.is_some() {
        clauses.push("position = ?");
    }
    if payload.registration.is_some() {
        clauses.push("registration = ?");
    }
    if payload.work_days.is_some() {
        clauses.push("work_days = ?");
    }
    if clauses.is_empty() {
        return Err(ApiError::Validation("No fields provided for update".into()));
    }

    if let Some(name) = &payload.name {
        if name.trim().is_empty() {
            return Err(ApiError::Validation("Name must not be empty".into()));
        }
    }
    if let Some(work_days) = &payload.work_days {
        if work_days.is_empty() {
            return Err(ApiError::Validation(
                "At least one work day must be selected".into(),
            ));
        }
    }

    let sql = format!("UPDATE employees SET {} WHERE id = ?", clauses.join(", "));
    let mut query = sqlx::query(&sql);
    if let Some(name) = &payload.name {
        query = query.bind(name.trim());
    }
    if let Some(position) = &payload.position {
        query = query.bind(position.trim());
    }
    if let Some(registration) = &payload.registration {
        query = query.bind(registration.trim());
    }
    if let Some(work_days) = &payload.work_days {
        query = query.bind(Json(work_days));
    }
    query = query.bind(employee_id);

    match query.execute(pool.get_ref()).await {
        Ok(_) => {}
        Err(e) if is_duplicate_key(&e) => {
            return Err(ApiError::Conflict("Registration already exists".into()));
        }
        Err(e) => {
            error!(error = %e, employee_id, "Failed to update employee");
            return Err(ApiError::Internal);
        }
    }

    // rows_affected is 0 both for a missing row and a no-op update;
    // the fetch settles which one this was
    let employee = fetch_employee(pool.get_ref(), employee_id).await?;

    Ok(HttpResponse::Ok().json(employee))
}

/// Delete Employee and cascade its time records
#[utoipa::path(
    delete,
    path = "/api/employees/{id}",
    params(("id", Path, description = "Employee ID")),
    responses(
        (status = 200, description = "Successfully deleted"),
        (status = 404, description = "Employee not found"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Employee"
)]
pub async fn delete_employee(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> Result<impl Responder, ApiError> {
    auth.require_manager_or_admin()?;

    let employee_id = path.into_inner();

    let mut tx = pool.begin().await?;

    // records first: the FK would reject deleting the employee otherwise
    sqlx::query("DELETE FROM time_records WHERE employee_id = ?")
        .bind(employee_id)
        .execute(&mut *tx)
        .await?;

    let result = sqlx::query("DELETE FROM employees WHERE id = ?")
        .bind(employee_id)
        .execute(&mut *tx)
        .await?;

    if result.rows_affected() == 0 {
        tx.rollback().await?;
        return Err(ApiError::NotFound("Employee not found".into()));
    }

    tx.commit().await?;

    info!(employee_id, "Employee deleted");
    Ok(HttpResponse::Ok().json(json!({
        "message": "Successfully deleted"
    })))
}

/// Employees scheduled to work today
#[utoipa::path(
    get,
    path = "/api/employees/scheduled-today",
    responses(
        (status = 200, description = "Employees whose work days include today", body = Vec<Employee>),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Employee"
)]
pub async fn scheduled_today(pool: web::Data<MySqlPool>) -> Result<impl Responder, ApiError> {
    let today = Local::now().date_naive();

    let employees = sqlx::query_as::<_, Employee>("SELECT * FROM employees ORDER BY name")
        .fetch_all(pool.get_ref())
        .await?;

    let scheduled: Vec<Employee> = employees
        .into_iter()
        .filter(|e| is_scheduled(&e.work_days, today))
        .collect();

    Ok(HttpResponse::Ok().json(scheduled))
}

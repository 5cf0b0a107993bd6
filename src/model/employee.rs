use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use utoipa::ToSchema;

use crate::core::schedule::WeekDay;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[schema(
    example = json!({
        "id": 1,
        "name": "Maria Souza",
        "position": "Recepcionista",
        "registration": "EMP-001",
        "work_days": ["monday", "wednesday", "friday"],
        "created_at": "2025-01-10T09:00:00Z"
    })
)]
pub struct Employee {
    #[schema(example = 1)]
    pub id: u64,

    #[schema(example = "Maria Souza")]
    pub name: String,

    #[schema(example = "Recepcionista")]
    pub position: String,

    #[schema(example = "EMP-001")]
    pub registration: String,

    /// Weekday labels on which the employee is expected to work.
    #[schema(value_type = Vec<String>, example = json!(["monday", "wednesday", "friday"]))]
    pub work_days: Json<Vec<WeekDay>>,

    #[schema(value_type = String, format = "date-time", nullable = true)]
    pub created_at: Option<DateTime<Utc>>,
}

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct User {
    pub id: u64,
    pub username: String,
    pub email: String,
    pub name: Option<String>,
    pub role_id: u8,
    #[schema(example = "2024-01-01", format = "date", value_type = String)]
    pub hire_date: Option<NaiveDate>,
    /// Daily work window; NULL means the company default applies.
    #[schema(example = "08:00:00", value_type = String)]
    pub work_start: Option<NaiveTime>,
    #[schema(example = "18:00:00", value_type = String)]
    pub work_end: Option<NaiveTime>,
}

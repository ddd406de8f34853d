use crate::auth::auth::AuthUser;
use crate::config::Config;
use crate::model::punch::{PunchRecord, PunchType};
use crate::model::role::Capability;
use crate::notify::{self, Notification, Template};
use actix_web::{HttpResponse, Responder, web};
use chrono::{DateTime, Duration, FixedOffset, Timelike, Utc};
use serde::{Deserialize, Serialize};
use sqlx::MySqlPool;
use utoipa::{IntoParams, ToSchema};

#[derive(Deserialize, ToSchema)]
pub struct PunchReq {
    #[schema(example = "in")]
    pub punch_type: PunchType,
}

#[derive(Deserialize, ToSchema)]
pub struct EditPunch {
    /// New local wall-clock time, e.g. "2026-03-02T08:55"
    #[schema(example = "2026-03-02T08:55")]
    pub new_time: String,
}

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct PunchHistoryQuery {
    /// Pagination page number (start with 1)
    #[schema(example = 1)]
    pub page: Option<u64>,
    /// Pagination per page number
    #[schema(example = 20)]
    pub per_page: Option<u64>,
}

#[derive(Serialize, ToSchema)]
pub struct PunchHistoryResponse {
    pub data: Vec<PunchRecord>,
    #[schema(example = 1)]
    pub page: u32,
    #[schema(example = 20)]
    pub per_page: u32,
    #[schema(example = 42)]
    pub total: i64,
}

/// UTC bounds of the local calendar day containing `now_local`.
fn local_day_bounds(now_local: DateTime<FixedOffset>) -> (DateTime<Utc>, DateTime<Utc>) {
    let midnight = now_local
        .date_naive()
        .and_hms_opt(0, 0, 0)
        .expect("midnight is a valid time")
        .and_local_timezone(*now_local.offset())
        .single()
        .expect("fixed offset mapping is unambiguous");
    (
        midnight.with_timezone(&Utc),
        (midnight + Duration::days(1)).with_timezone(&Utc),
    )
}

/// Lunchtime step-out rules carried from the paper process: step-out
/// punches happen inside the break, return punches by its end.
fn punch_time_allowed(punch_type: PunchType, now_local: DateTime<FixedOffset>) -> bool {
    match punch_type {
        PunchType::Leave => (12..14).contains(&now_local.hour()),
        PunchType::Return => (12..=14).contains(&now_local.hour()),
        PunchType::In | PunchType::Out => true,
    }
}

/// Record a punch
#[utoipa::path(
    post,
    path = "/api/v1/punch",
    request_body = PunchReq,
    responses(
        (status = 200, description = "Punch recorded", body = Object, example = json!({
            "message": "Punch recorded",
            "punch_type": "in"
        })),
        (status = 400, description = "Already punched or outside the allowed window"),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Punch"
)]
pub async fn punch(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    payload: web::Json<PunchReq>,
) -> actix_web::Result<impl Responder> {
    let punch_type = payload.punch_type;
    let now = Utc::now();
    let now_local = now.with_timezone(&config.tz());

    if !punch_time_allowed(punch_type, now_local) {
        return Ok(HttpResponse::BadRequest().json(serde_json::json!({
            "message": format!("{}打卡只能在中午休息時段進行", punch_type.label())
        })));
    }

    // One punch per (user, type, local calendar day)
    let (day_start, day_end) = local_day_bounds(now_local);
    let already = sqlx::query_scalar::<_, bool>(
        r#"
        SELECT EXISTS(
            SELECT 1 FROM punch_records
            WHERE user_id = ? AND punch_type = ? AND punch_time >= ? AND punch_time < ?
        )
        "#,
    )
    .bind(auth.user_id)
    .bind(punch_type.to_string())
    .bind(day_start)
    .bind(day_end)
    .fetch_one(pool.get_ref())
    .await
    .map_err(|e| {
        tracing::error!(error = %e, user_id = auth.user_id, "Punch dedup check failed");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    if already {
        return Ok(HttpResponse::BadRequest().json(serde_json::json!({
            "message": format!("您今天已經打過{}卡了，一天只能打一次", punch_type.label())
        })));
    }

    sqlx::query(
        r#"
        INSERT INTO punch_records (user_id, punch_type, punch_time)
        VALUES (?, ?, ?)
        "#,
    )
    .bind(auth.user_id)
    .bind(punch_type.to_string())
    .bind(now)
    .execute(pool.get_ref())
    .await
    .map_err(|e| {
        tracing::error!(error = %e, user_id = auth.user_id, "Punch insert failed");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    // Recipient lookup is best-effort; the punch stands either way
    let email = sqlx::query_scalar::<_, String>("SELECT email FROM users WHERE id = ?")
        .bind(auth.user_id)
        .fetch_optional(pool.get_ref())
        .await
        .ok()
        .flatten();
    if let Some(email) = email {
        notify::dispatch(vec![Notification::new(
            email,
            Template::PunchRecorded,
            serde_json::json!({
                "punch_type": punch_type.to_string(),
                "punch_label": punch_type.label(),
                "punch_time": now_local.to_rfc3339(),
            }),
        )]);
    }

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Punch recorded",
        "punch_type": punch_type.to_string(),
        "punch_label": punch_type.label(),
    })))
}

/// Caller's punch history, newest first
#[utoipa::path(
    get,
    path = "/api/v1/punch/history",
    params(PunchHistoryQuery),
    responses(
        (status = 200, description = "Paginated punch history", body = PunchHistoryResponse),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Punch"
)]
pub async fn punch_history(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<PunchHistoryQuery>,
) -> actix_web::Result<impl Responder> {
    let per_page = query.per_page.unwrap_or(20).min(100);
    let page = query.page.unwrap_or(1).max(1);
    let offset = (page - 1) * per_page;

    let total = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM punch_records WHERE user_id = ?",
    )
    .bind(auth.user_id)
    .fetch_one(pool.get_ref())
    .await
    .map_err(|e| {
        tracing::error!(error = %e, "Failed to count punch records");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    let data = sqlx::query_as::<_, PunchRecord>(
        r#"
        SELECT id, user_id, punch_type, punch_time
        FROM punch_records
        WHERE user_id = ?
        ORDER BY punch_time DESC
        LIMIT ? OFFSET ?
        "#,
    )
    .bind(auth.user_id)
    .bind(per_page)
    .bind(offset)
    .fetch_all(pool.get_ref())
    .await
    .map_err(|e| {
        tracing::error!(error = %e, "Failed to fetch punch history");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    Ok(HttpResponse::Ok().json(PunchHistoryResponse {
        data,
        page: page as u32,
        per_page: per_page as u32,
        total,
    }))
}

/// Edit a punch record's time (HR/Admin)
#[utoipa::path(
    put,
    path = "/api/v1/punch/{id}",
    params(
        ("id" = u64, Path, description = "ID of the punch record to edit")
    ),
    request_body = EditPunch,
    responses(
        (status = 200, description = "Record updated"),
        (status = 400, description = "Unparseable time or record not found"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Punch"
)]
pub async fn edit_punch(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    path: web::Path<u64>,
    payload: web::Json<EditPunch>,
) -> actix_web::Result<impl Responder> {
    auth.require(Capability::EditPunchRecord)?;

    let record_id = path.into_inner();

    let new_time = match super::parse_local_datetime(&payload.new_time, config.tz()) {
        Some(t) => t.with_timezone(&Utc),
        None => {
            return Ok(HttpResponse::BadRequest().json(serde_json::json!({
                "message": "new_time must be an ISO-8601 local date-time"
            })));
        }
    };

    let result = sqlx::query("UPDATE punch_records SET punch_time = ? WHERE id = ?")
        .bind(new_time)
        .bind(record_id)
        .execute(pool.get_ref())
        .await
        .map_err(|e| {
            tracing::error!(error = %e, record_id, "Punch edit failed");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

    if result.rows_affected() == 0 {
        return Ok(HttpResponse::BadRequest().json(serde_json::json!({
            "message": "Punch record not found"
        })));
    }

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Punch record updated"
    })))
}

/// Delete a punch record (HR/Admin/Manager)
#[utoipa::path(
    delete,
    path = "/api/v1/punch/{id}",
    params(
        ("id" = u64, Path, description = "ID of the punch record to delete")
    ),
    responses(
        (status = 200, description = "Record deleted"),
        (status = 400, description = "Record not found"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Punch"
)]
pub async fn delete_punch(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    auth.require(Capability::DeletePunchRecord)?;

    let record_id = path.into_inner();

    let result = sqlx::query("DELETE FROM punch_records WHERE id = ?")
        .bind(record_id)
        .execute(pool.get_ref())
        .await
        .map_err(|e| {
            tracing::error!(error = %e, record_id, "Punch delete failed");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

    if result.rows_affected() == 0 {
        return Ok(HttpResponse::BadRequest().json(serde_json::json!({
            "message": "Punch record not found"
        })));
    }

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Punch record deleted"
    })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn local(h: u32, m: u32) -> DateTime<FixedOffset> {
        NaiveDate::from_ymd_opt(2026, 3, 2)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
            .and_local_timezone(FixedOffset::east_opt(8 * 3600).unwrap())
            .unwrap()
    }

    #[test]
    fn step_out_only_during_lunch() {
        assert!(!punch_time_allowed(PunchType::Leave, local(11, 59)));
        assert!(punch_time_allowed(PunchType::Leave, local(12, 0)));
        assert!(punch_time_allowed(PunchType::Leave, local(13, 59)));
        assert!(!punch_time_allowed(PunchType::Leave, local(14, 0)));
    }

    #[test]
    fn return_allowed_through_fourteen(){
        assert!(!punch_time_allowed(PunchType::Return, local(11, 0)));
        assert!(punch_time_allowed(PunchType::Return, local(14, 30)));
        assert!(!punch_time_allowed(PunchType::Return, local(15, 0)));
    }

    #[test]
    fn in_and_out_unrestricted() {
        assert!(punch_time_allowed(PunchType::In, local(6, 0)));
        assert!(punch_time_allowed(PunchType::Out, local(23, 0)));
    }

    #[test]
    fn day_bounds_cover_the_local_day() {
        let (start, end) = local_day_bounds(local(9, 30));
        assert_eq!(end - start, Duration::days(1));
        // Local midnight +08:00 is 16:00 UTC the previous day.
        assert_eq!(start.to_rfc3339(), "2026-03-01T16:00:00+00:00");
    }
}

use crate::auth::auth::AuthUser;
use crate::config::Config;
use crate::leave::duration::{self, WorkWindow};
use crate::model::leave_request::{
    ApprovalState, Decision, LeaveRequest, LeaveStatus, LeaveType, apply_decision,
};
use crate::model::role::{Capability, Role};
use crate::notify::{self, Notification, Template};
use actix_web::{HttpResponse, Responder, web};
use chrono::{DateTime, Duration, FixedOffset, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::MySqlPool;
use std::str::FromStr;
use utoipa::{IntoParams, ToSchema};

#[derive(Deserialize, ToSchema)]
pub struct CreateLeave {
    #[schema(example = "sick")]
    pub leave_type: LeaveType,
    /// Local wall-clock start, e.g. "2026-03-02T09:00"
    #[schema(example = "2026-03-02T09:00")]
    pub start_datetime: String,
    /// Local wall-clock end, e.g. "2026-03-02T11:00"
    #[schema(example = "2026-03-02T11:00")]
    pub end_datetime: String,
    pub reason: Option<String>,
    /// Stand-in staff member who must confirm the handover
    #[schema(example = 7)]
    pub deputy_id: Option<u64>,
    pub handover_notes: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct DecisionReq {
    #[schema(example = "approve")]
    pub decision: Decision,
}

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct LeaveFilter {
    /// Filter by requesting user
    #[schema(example = 123)]
    pub user_id: Option<u64>,
    /// Filter by derived status (pending/approved/rejected)
    #[schema(example = "pending")]
    pub status: Option<String>,
    /// Filter by leave type tag
    #[schema(example = "sick")]
    pub leave_type: Option<String>,
    /// Keep requests overlapping this local date or later
    #[schema(example = "2026-03-01", format = "date", value_type = String)]
    pub start_date: Option<NaiveDate>,
    /// Keep requests overlapping this local date or earlier
    #[schema(example = "2026-03-31", format = "date", value_type = String)]
    pub end_date: Option<NaiveDate>,
    /// Pagination page number (start with 1)
    #[schema(example = 1)]
    pub page: Option<u64>,
    /// Pagination per page number
    #[schema(example = 10)]
    pub per_page: Option<u64>,
}

// Helper enum for typed SQLx binding
enum FilterValue<'a> {
    U64(u64),
    Str(&'a str),
    Instant(DateTime<Utc>),
}

fn local_midnight(date: NaiveDate, tz: FixedOffset) -> DateTime<Utc> {
    date.and_hms_opt(0, 0, 0)
        .expect("midnight is a valid time")
        .and_local_timezone(tz)
        .single()
        .expect("fixed offset mapping is unambiguous")
        .with_timezone(&Utc)
}

/// Dynamic WHERE clause for the list endpoint. Date bounds keep any
/// request whose range overlaps the inclusive local-date window.
fn build_filter<'a>(query: &'a LeaveFilter, tz: FixedOffset) -> (String, Vec<FilterValue<'a>>) {
    let mut where_sql = String::from(" WHERE 1=1");
    let mut args: Vec<FilterValue> = Vec::new();

    if let Some(user_id) = query.user_id {
        where_sql.push_str(" AND user_id = ?");
        args.push(FilterValue::U64(user_id));
    }

    if let Some(leave_type) = query.leave_type.as_deref() {
        where_sql.push_str(" AND leave_type = ?");
        args.push(FilterValue::Str(leave_type));
    }

    // The stored fields are the two approvals; the derived status maps
    // onto them without binds.
    match query.status.as_deref() {
        Some("approved") => where_sql.push_str(" AND hr_approval = 1 AND manager_approval = 1"),
        Some("rejected") => where_sql.push_str(" AND (hr_approval = 2 OR manager_approval = 2)"),
        Some("pending") => where_sql.push_str(
            " AND NOT (hr_approval = 1 AND manager_approval = 1) \
              AND hr_approval <> 2 AND manager_approval <> 2",
        ),
        _ => {}
    }

    if let Some(date) = query.start_date {
        where_sql.push_str(" AND end_at >= ?");
        args.push(FilterValue::Instant(local_midnight(date, tz)));
    }
    if let Some(date) = query.end_date {
        where_sql.push_str(" AND start_at < ?");
        args.push(FilterValue::Instant(local_midnight(
            date + Duration::days(1),
            tz,
        )));
    }

    (where_sql, args)
}

/// Read-side view of one request: the stored row plus the derived status
/// and display label.
#[derive(Serialize, ToSchema)]
pub struct LeaveDetails {
    pub id: u64,
    pub user_id: u64,
    pub leave_type: String,
    pub leave_type_label: String,
    #[schema(example = "2026-03-02T01:00:00Z", format = "date-time", value_type = String)]
    pub start_at: DateTime<Utc>,
    #[schema(example = "2026-03-02T07:00:00Z", format = "date-time", value_type = String)]
    pub end_at: DateTime<Utc>,
    pub reason: Option<String>,
    pub hr_approval: u8,
    pub manager_approval: u8,
    pub status: LeaveStatus,
    pub duration_hours: f64,
    pub duration_days: f64,
    pub duration_label: String,
    pub deputy_id: Option<u64>,
    pub handover_notes: Option<String>,
    pub deputy_confirmation: bool,
    #[schema(example = "2026-03-01T00:00:00Z", format = "date-time", value_type = String)]
    pub created_at: Option<DateTime<Utc>>,
}

impl From<LeaveRequest> for LeaveDetails {
    fn from(r: LeaveRequest) -> Self {
        let status = r.status();
        let label = LeaveType::from_str(&r.leave_type)
            .map(|lt| lt.label().to_string())
            .unwrap_or_else(|_| r.leave_type.clone());
        Self {
            id: r.id,
            user_id: r.user_id,
            leave_type: r.leave_type,
            leave_type_label: label,
            start_at: r.start_at,
            end_at: r.end_at,
            reason: r.reason,
            hr_approval: r.hr_approval,
            manager_approval: r.manager_approval,
            status,
            duration_hours: r.duration_hours,
            duration_days: r.duration_days,
            duration_label: r.duration_label,
            deputy_id: r.deputy_id,
            handover_notes: r.handover_notes,
            deputy_confirmation: r.deputy_confirmation,
            created_at: r.created_at,
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct LeaveListResponse {
    pub data: Vec<LeaveDetails>,
    #[schema(example = 1)]
    pub page: u32,
    #[schema(example = 10)]
    pub per_page: u32,
    #[schema(example = 1)]
    pub total: i64,
}

const SELECT_LEAVE: &str = r#"
    SELECT id, user_id, leave_type, start_at, end_at, reason,
           hr_approval, manager_approval,
           duration_hours, duration_days, duration_label,
           deputy_id, handover_notes, deputy_confirmation, created_at
    FROM leave_requests
"#;

async fn fetch_leave(pool: &MySqlPool, leave_id: u64) -> Result<Option<LeaveRequest>, sqlx::Error> {
    sqlx::query_as::<_, LeaveRequest>(&format!("{SELECT_LEAVE} WHERE id = ?"))
        .bind(leave_id)
        .fetch_optional(pool)
        .await
}

/// Emails of everyone holding the given role.
async fn role_holder_emails(pool: &MySqlPool, role: Role) -> Vec<String> {
    sqlx::query_scalar::<_, String>("SELECT email FROM users WHERE role_id = ?")
        .bind(role.id())
        .fetch_all(pool)
        .await
        .unwrap_or_else(|e| {
            // Notification recipients are best-effort, never fatal
            tracing::warn!(error = %e, role = ?role, "Failed to fetch role holder emails");
            Vec::new()
        })
}

/* =========================
Submit leave request
========================= */
/// Swagger doc for create_leave endpoint
#[utoipa::path(
    post,
    path = "/api/v1/leave",
    request_body(
        content = CreateLeave,
        description = "Leave request payload",
        content_type = "application/json"
    ),
    responses(
        (status = 200, description = "Leave request submitted", body = Object, example = json!({
            "message": "Leave request submitted",
            "id": 1,
            "status": "pending",
            "duration_label": "2.0小時"
        })),
        (status = 400, description = "Unparseable instants or end not after start"),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn create_leave(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    payload: web::Json<CreateLeave>,
) -> actix_web::Result<impl Responder> {
    let tz = config.tz();

    // 1️⃣ parse instants; malformed input never reaches the calculator
    let start = match super::parse_local_datetime(&payload.start_datetime, tz) {
        Some(t) => t,
        None => {
            return Ok(HttpResponse::BadRequest().json(serde_json::json!({
                "message": "start_datetime is not a valid local date-time"
            })));
        }
    };
    let end = match super::parse_local_datetime(&payload.end_datetime, tz) {
        Some(t) => t,
        None => {
            return Ok(HttpResponse::BadRequest().json(serde_json::json!({
                "message": "end_datetime is not a valid local date-time"
            })));
        }
    };

    // 2️⃣ requester's work window, falling back to the company default
    let row = sqlx::query_as::<_, (Option<NaiveTime>, Option<NaiveTime>, String)>(
        "SELECT work_start, work_end, email FROM users WHERE id = ?",
    )
    .bind(auth.user_id)
    .fetch_optional(pool.get_ref())
    .await
    .map_err(|e| {
        tracing::error!(error = %e, user_id = auth.user_id, "Failed to load requester");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    let (work_start, work_end, requester_email) = match row {
        Some(r) => r,
        None => {
            return Ok(HttpResponse::BadRequest().json(serde_json::json!({
                "message": "Requesting user not found"
            })));
        }
    };
    let window = WorkWindow::resolve(work_start, work_end, config.default_work_window());

    // 3️⃣ compute the duration exactly once; it is stored and never
    // recomputed afterwards
    let computed = match duration::calculate(payload.leave_type, start, end, &window) {
        Ok(d) => d,
        Err(e) => {
            return Ok(HttpResponse::BadRequest().json(serde_json::json!({
                "message": e.to_string()
            })));
        }
    };

    // 4️⃣ deputy must exist when named
    let deputy_email = match payload.deputy_id {
        Some(deputy_id) => {
            let email =
                sqlx::query_scalar::<_, String>("SELECT email FROM users WHERE id = ?")
                    .bind(deputy_id)
                    .fetch_optional(pool.get_ref())
                    .await
                    .map_err(|e| {
                        tracing::error!(error = %e, deputy_id, "Failed to load deputy");
                        actix_web::error::ErrorInternalServerError("Internal Server Error")
                    })?;
            match email {
                Some(e) => Some(e),
                None => {
                    return Ok(HttpResponse::BadRequest().json(serde_json::json!({
                        "message": "Deputy user not found"
                    })));
                }
            }
        }
        None => None,
    };

    // 5️⃣ persist with both approvals pending
    let result = sqlx::query(
        r#"
        INSERT INTO leave_requests
            (user_id, leave_type, start_at, end_at, reason,
             hr_approval, manager_approval,
             duration_hours, duration_days, duration_label,
             deputy_id, handover_notes, deputy_confirmation)
        VALUES (?, ?, ?, ?, ?, 0, 0, ?, ?, ?, ?, ?, FALSE)
        "#,
    )
    .bind(auth.user_id)
    .bind(payload.leave_type.to_string())
    .bind(start.with_timezone(&Utc))
    .bind(end.with_timezone(&Utc))
    .bind(&payload.reason)
    .bind(computed.hours)
    .bind(computed.days)
    .bind(&computed.label)
    .bind(payload.deputy_id)
    .bind(&payload.handover_notes)
    .execute(pool.get_ref())
    .await
    .map_err(|e| {
        tracing::error!(error = %e, user_id = auth.user_id, "Failed to create leave request");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    let leave_id = result.last_insert_id();

    // 6️⃣ fire-and-forget notifications
    let context = serde_json::json!({
        "leave_id": leave_id,
        "requester": auth.username,
        "leave_type": payload.leave_type.to_string(),
        "leave_type_label": payload.leave_type.label(),
        "duration_label": computed.label,
    });

    let mut notifications = vec![Notification::new(
        requester_email,
        Template::LeaveSubmitted,
        context.clone(),
    )];
    for email in role_holder_emails(pool.get_ref(), Role::Hr).await {
        notifications.push(Notification::new(email, Template::LeaveSubmitted, context.clone()));
    }
    for email in role_holder_emails(pool.get_ref(), Role::Manager).await {
        notifications.push(Notification::new(email, Template::LeaveSubmitted, context.clone()));
    }
    if let Some(email) = deputy_email {
        notifications.push(Notification::new(email, Template::DeputyAssigned, context.clone()));
    }
    notify::dispatch(notifications);

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Leave request submitted",
        "id": leave_id,
        "status": "pending",
        "duration_hours": computed.hours,
        "duration_label": computed.label,
    })))
}

fn approver_capability(approver: &str) -> Option<Capability> {
    match approver {
        "hr" => Some(Capability::ApproveAsHr),
        "manager" => Some(Capability::ApproveAsManager),
        _ => None,
    }
}

/// Column touched by a one-sided sign-off. `approver` is pre-validated.
fn approval_column(approver: &str) -> &'static str {
    if approver == "hr" { "hr_approval" } else { "manager_approval" }
}

async fn record_approval(
    auth: &AuthUser,
    pool: &MySqlPool,
    leave_id: u64,
    approver: &str,
    state: ApprovalState,
) -> actix_web::Result<HttpResponse> {
    let cap = match approver_capability(approver) {
        Some(c) => c,
        None => {
            return Ok(HttpResponse::BadRequest().json(serde_json::json!({
                "message": "Approver must be 'hr' or 'manager'"
            })));
        }
    };
    auth.require(cap)?;

    let column = approval_column(approver);
    let sql = format!(
        "UPDATE leave_requests SET {column} = ? WHERE id = ? AND {column} = 0"
    );
    let result = sqlx::query(&sql)
        .bind(state.code())
        .bind(leave_id)
        .execute(pool)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, leave_id, "Approval update failed");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

    if result.rows_affected() == 0 {
        return Ok(HttpResponse::BadRequest().json(serde_json::json!({
            "message": "Leave request not found or already processed"
        })));
    }

    notify_if_settled(pool, leave_id).await;

    let message = match state {
        ApprovalState::Approved => "Leave approved",
        _ => "Leave rejected",
    };
    Ok(HttpResponse::Ok().json(serde_json::json!({ "message": message })))
}

/// Tells the requester once the two-party sign-off reaches a final state.
async fn notify_if_settled(pool: &MySqlPool, leave_id: u64) {
    let row = match fetch_leave(pool, leave_id).await {
        Ok(Some(r)) => r,
        Ok(None) => return,
        Err(e) => {
            tracing::warn!(error = %e, leave_id, "Failed to re-read leave for notification");
            return;
        }
    };

    let template = match row.status() {
        LeaveStatus::Approved => Template::LeaveApproved,
        LeaveStatus::Rejected => Template::LeaveRejected,
        LeaveStatus::Pending => return,
    };

    let email = sqlx::query_scalar::<_, String>("SELECT email FROM users WHERE id = ?")
        .bind(row.user_id)
        .fetch_optional(pool)
        .await
        .ok()
        .flatten();

    if let Some(email) = email {
        notify::dispatch(vec![Notification::new(
            email,
            template,
            serde_json::json!({
                "leave_id": row.id,
                "leave_type": row.leave_type,
                "duration_label": row.duration_label,
            }),
        )]);
    }
}

/* =========================
One-sided approve / reject
========================= */
/// Swagger doc for approve_leave endpoint
#[utoipa::path(
    put,
    path = "/api/v1/leave/{leave_id}/approve/{approver}",
    params(
        ("leave_id" = u64, Path, description = "ID of the leave request"),
        ("approver" = String, Path, description = "Which side signs off: hr or manager")
    ),
    responses(
        (status = 200, description = "Leave approved", body = Object, example = json!({
            "message": "Leave approved"
        })),
        (status = 400, description = "Not found or already processed"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn approve_leave(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<(u64, String)>,
) -> actix_web::Result<impl Responder> {
    let (leave_id, approver) = path.into_inner();
    record_approval(&auth, pool.get_ref(), leave_id, &approver, ApprovalState::Approved).await
}

/// Swagger doc for reject_leave endpoint
#[utoipa::path(
    put,
    path = "/api/v1/leave/{leave_id}/reject/{approver}",
    params(
        ("leave_id" = u64, Path, description = "ID of the leave request"),
        ("approver" = String, Path, description = "Which side signs off: hr or manager")
    ),
    responses(
        (status = 200, description = "Leave rejected", body = Object, example = json!({
            "message": "Leave rejected"
        })),
        (status = 400, description = "Not found or already processed"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn reject_leave(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<(u64, String)>,
) -> actix_web::Result<impl Responder> {
    let (leave_id, approver) = path.into_inner();
    record_approval(&auth, pool.get_ref(), leave_id, &approver, ApprovalState::Rejected).await
}

/* =========================
Whole-request decision (Admin)
========================= */
/// Admin shortcut that fans out to BOTH approval fields
#[utoipa::path(
    put,
    path = "/api/v1/leave/{leave_id}/decision",
    params(
        ("leave_id" = u64, Path, description = "ID of the leave request")
    ),
    request_body = DecisionReq,
    responses(
        (status = 200, description = "Decision recorded", body = Object, example = json!({
            "message": "Decision recorded"
        })),
        (status = 400, description = "Leave request not found"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn decide_leave(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    payload: web::Json<DecisionReq>,
) -> actix_web::Result<impl Responder> {
    auth.require(Capability::DecideWholeRequest)?;

    let leave_id = path.into_inner();
    let (hr, manager) = apply_decision(payload.decision);

    let result = sqlx::query(
        "UPDATE leave_requests SET hr_approval = ?, manager_approval = ? WHERE id = ?",
    )
    .bind(hr.code())
    .bind(manager.code())
    .bind(leave_id)
    .execute(pool.get_ref())
    .await
    .map_err(|e| {
        tracing::error!(error = %e, leave_id, "Decision update failed");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    if result.rows_affected() == 0 {
        return Ok(HttpResponse::BadRequest().json(serde_json::json!({
            "message": "Leave request not found"
        })));
    }

    notify_if_settled(pool.get_ref(), leave_id).await;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Decision recorded"
    })))
}

/* =========================
Reads
========================= */
/// for getting a leave application details endpoint
#[utoipa::path(
    get,
    path = "/api/v1/leave/{leave_id}",
    params(
        ("leave_id" = u64, Path, description = "ID of the leave request to fetch")
    ),
    responses(
        (status = 200, description = "Leave request found", body = LeaveDetails),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Leave request not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn get_leave(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let leave_id = path.into_inner();

    let leave = fetch_leave(pool.get_ref(), leave_id).await.map_err(|e| {
        tracing::error!(error = %e, leave_id, "Failed to fetch leave request");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    match leave {
        // Owners and deputies see their own requests; otherwise the
        // viewer needs the records capability.
        Some(row) => {
            if row.user_id != auth.user_id && row.deputy_id != Some(auth.user_id) {
                auth.require(Capability::ViewAllRecords)?;
            }
            Ok(HttpResponse::Ok().json(LeaveDetails::from(row)))
        }
        None => Ok(HttpResponse::NotFound().json(serde_json::json!({
            "message": "Leave request not found"
        }))),
    }
}

/// for getting leave applications endpoint
#[utoipa::path(
    get,
    path = "/api/v1/leave",
    params(LeaveFilter),
    responses(
        (status = 200, description = "Paginated leave list", body = LeaveListResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn leave_list(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    query: web::Query<LeaveFilter>,
) -> actix_web::Result<impl Responder> {
    auth.require(Capability::ViewAllRecords)?;

    // -------------------------
    // Pagination
    // -------------------------
    let per_page = query.per_page.unwrap_or(10).min(100);
    let page = query.page.unwrap_or(1).max(1);
    let offset = (page - 1) * per_page;

    // -------------------------
    // WHERE clause
    // -------------------------
    let (where_sql, args) = build_filter(&query, config.tz());

    // -------------------------
    // COUNT query
    // -------------------------
    let count_sql = format!("SELECT COUNT(*) FROM leave_requests{}", where_sql);

    let mut count_q = sqlx::query_scalar::<_, i64>(&count_sql);
    for arg in &args {
        count_q = match arg {
            FilterValue::U64(v) => count_q.bind(*v),
            FilterValue::Str(s) => count_q.bind(*s),
            FilterValue::Instant(t) => count_q.bind(*t),
        };
    }

    let total = count_q.fetch_one(pool.get_ref()).await.map_err(|e| {
        tracing::error!(error=%e, "Failed to count leave requests");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    // -------------------------
    // DATA query
    // -------------------------
    let data_sql = format!(
        "{SELECT_LEAVE} {where_sql} ORDER BY created_at DESC LIMIT ? OFFSET ?"
    );

    let mut data_q = sqlx::query_as::<_, LeaveRequest>(&data_sql);
    for arg in args {
        data_q = match arg {
            FilterValue::U64(v) => data_q.bind(v),
            FilterValue::Str(s) => data_q.bind(s),
            FilterValue::Instant(t) => data_q.bind(t),
        };
    }

    let rows = data_q
        .bind(per_page)
        .bind(offset)
        .fetch_all(pool.get_ref())
        .await
        .map_err(|e| {
            tracing::error!(error=%e, "Failed to fetch leave list");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

    let response = LeaveListResponse {
        data: rows.into_iter().map(LeaveDetails::from).collect(),
        page: page as u32,
        per_page: per_page as u32,
        total,
    };

    Ok(HttpResponse::Ok().json(response))
}

/// Caller's own leave history, newest first
#[utoipa::path(
    get,
    path = "/api/v1/leave/history",
    responses(
        (status = 200, description = "Caller's leave requests", body = [LeaveDetails]),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn leave_history(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
) -> actix_web::Result<impl Responder> {
    let rows = sqlx::query_as::<_, LeaveRequest>(&format!(
        "{SELECT_LEAVE} WHERE user_id = ? ORDER BY created_at DESC"
    ))
    .bind(auth.user_id)
    .fetch_all(pool.get_ref())
    .await
    .map_err(|e| {
        tracing::error!(error = %e, "Failed to fetch leave history");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    let details: Vec<LeaveDetails> = rows.into_iter().map(LeaveDetails::from).collect();
    Ok(HttpResponse::Ok().json(details))
}

/* =========================
Deputy handover
========================= */
/// Requests still awaiting the caller's handover confirmation
#[utoipa::path(
    get,
    path = "/api/v1/leave/deputy",
    responses(
        (status = 200, description = "Requests naming the caller as deputy", body = [LeaveDetails]),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn deputy_pending(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
) -> actix_web::Result<impl Responder> {
    let rows = sqlx::query_as::<_, LeaveRequest>(&format!(
        "{SELECT_LEAVE} WHERE deputy_id = ? AND deputy_confirmation = FALSE ORDER BY created_at DESC"
    ))
    .bind(auth.user_id)
    .fetch_all(pool.get_ref())
    .await
    .map_err(|e| {
        tracing::error!(error = %e, "Failed to fetch deputy requests");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    let details: Vec<LeaveDetails> = rows.into_iter().map(LeaveDetails::from).collect();
    Ok(HttpResponse::Ok().json(details))
}

/// Confirm a handover; only the named deputy may do so
#[utoipa::path(
    put,
    path = "/api/v1/leave/{leave_id}/deputy-confirm",
    params(
        ("leave_id" = u64, Path, description = "ID of the leave request")
    ),
    responses(
        (status = 200, description = "Handover confirmed", body = Object, example = json!({
            "message": "Handover confirmed"
        })),
        (status = 400, description = "Not found or caller is not the deputy"),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn confirm_deputy(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let leave_id = path.into_inner();

    let result = sqlx::query(
        "UPDATE leave_requests SET deputy_confirmation = TRUE WHERE id = ? AND deputy_id = ?",
    )
    .bind(leave_id)
    .bind(auth.user_id)
    .execute(pool.get_ref())
    .await
    .map_err(|e| {
        tracing::error!(error = %e, leave_id, "Deputy confirmation failed");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    if result.rows_affected() == 0 {
        return Ok(HttpResponse::BadRequest().json(serde_json::json!({
            "message": "Leave request not found or you are not its deputy"
        })));
    }

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Handover confirmed"
    })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn approver_tags_map_to_capabilities() {
        assert_eq!(approver_capability("hr"), Some(Capability::ApproveAsHr));
        assert_eq!(
            approver_capability("manager"),
            Some(Capability::ApproveAsManager)
        );
        assert_eq!(approver_capability("admin"), None);
        assert_eq!(approver_capability("人事"), None);
    }

    #[test]
    fn approval_columns() {
        assert_eq!(approval_column("hr"), "hr_approval");
        assert_eq!(approval_column("manager"), "manager_approval");
    }

    fn filter(start_date: Option<NaiveDate>, end_date: Option<NaiveDate>) -> LeaveFilter {
        LeaveFilter {
            user_id: Some(7),
            status: Some("pending".into()),
            leave_type: None,
            start_date,
            end_date,
            page: None,
            per_page: None,
        }
    }

    #[test]
    fn list_filter_binds_date_range() {
        let tz = FixedOffset::east_opt(8 * 3600).unwrap();
        let from = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
        let to = NaiveDate::from_ymd_opt(2026, 3, 31).unwrap();

        let filter = filter(Some(from), Some(to));
        let (where_sql, args) = build_filter(&filter, tz);
        assert!(where_sql.contains(" AND user_id = ?"));
        assert!(where_sql.contains(" AND end_at >= ?"));
        assert!(where_sql.contains(" AND start_at < ?"));
        assert_eq!(args.len(), 3);

        // Bounds are local midnights converted to UTC; the upper bound
        // is exclusive of the day after end_date.
        match (&args[1], &args[2]) {
            (FilterValue::Instant(lo), FilterValue::Instant(hi)) => {
                assert_eq!(lo.to_rfc3339(), "2026-02-28T16:00:00+00:00");
                assert_eq!(hi.to_rfc3339(), "2026-03-31T16:00:00+00:00");
            }
            _ => panic!("date bounds must bind as instants"),
        }
    }

    #[test]
    fn list_filter_dates_are_optional() {
        let tz = FixedOffset::east_opt(8 * 3600).unwrap();
        let filter = filter(None, None);
        let (where_sql, args) = build_filter(&filter, tz);
        assert!(!where_sql.contains("end_at"));
        assert!(!where_sql.contains("start_at"));
        assert_eq!(args.len(), 1);
    }
}

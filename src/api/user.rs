use crate::auth::auth::AuthUser;
use crate::auth::handlers::{is_company_email, is_email_available};
use crate::auth::password::hash_password;
use crate::config::Config;
use crate::model::role::{Capability, Role};
use crate::model::user::User;
use crate::utils::{email_cache, email_filter};
use actix_web::{HttpResponse, Responder, web};
use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use sqlx::MySqlPool;
use tracing::error;
use utoipa::{IntoParams, ToSchema};

#[derive(Deserialize, ToSchema)]
pub struct CreateUser {
    #[schema(example = "alice")]
    pub username: String,
    #[schema(example = "alice@starkorrnell.org", format = "email", value_type = String)]
    pub email: String,
    pub password: String,
    #[schema(example = "Alice Chen")]
    pub name: Option<String>,
    #[schema(example = 4)]
    pub role_id: u8,
    #[schema(example = "2024-01-01", format = "date", value_type = String)]
    pub hire_date: Option<NaiveDate>,
    /// Daily work window start, "HH:MM"; omit for the company default
    #[schema(example = "08:00")]
    pub work_start: Option<String>,
    /// Daily work window end, "HH:MM"
    #[schema(example = "18:00")]
    pub work_end: Option<String>,
}

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct UserQuery {
    #[schema(example = 1)]
    pub page: Option<u64>,
    #[schema(example = 20)]
    pub per_page: Option<u64>,
}

#[derive(Serialize, ToSchema)]
pub struct UserListResponse {
    pub data: Vec<User>,
    #[schema(example = 1)]
    pub page: u32,
    #[schema(example = 20)]
    pub per_page: u32,
    #[schema(example = 7)]
    pub total: i64,
}

fn parse_window_time(s: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(s, "%H:%M").ok()
}

/// Create a user with an explicit role and work window (HR/Admin)
#[utoipa::path(
    post,
    path = "/api/v1/users",
    request_body = CreateUser,
    responses(
        (status = 201, description = "User created", body = Object, example = json!({
            "message": "User created"
        })),
        (status = 400, description = "Invalid role, email domain or work window"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 409, description = "Email or username already exists")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Users"
)]
pub async fn create_user(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    payload: web::Json<CreateUser>,
) -> actix_web::Result<impl Responder> {
    auth.require(Capability::ManageUsers)?;

    let username = payload.username.trim();
    let email = payload.email.trim();

    if username.is_empty() || email.is_empty() || payload.password.is_empty() {
        return Ok(HttpResponse::BadRequest().json(serde_json::json!({
            "message": "Username, email and password must not be empty"
        })));
    }

    if Role::from_id(payload.role_id).is_none() {
        return Ok(HttpResponse::BadRequest().json(serde_json::json!({
            "message": "Invalid role id"
        })));
    }

    if !is_company_email(email, &config.email_domain) {
        return Ok(HttpResponse::BadRequest().json(serde_json::json!({
            "message": format!("Email must belong to the {} domain", config.email_domain)
        })));
    }

    let work_start = match payload.work_start.as_deref().map(parse_window_time) {
        Some(None) => {
            return Ok(HttpResponse::BadRequest().json(serde_json::json!({
                "message": "work_start must be HH:MM"
            })));
        }
        Some(Some(t)) => Some(t),
        None => None,
    };
    let work_end = match payload.work_end.as_deref().map(parse_window_time) {
        Some(None) => {
            return Ok(HttpResponse::BadRequest().json(serde_json::json!({
                "message": "work_end must be HH:MM"
            })));
        }
        Some(Some(t)) => Some(t),
        None => None,
    };

    if !is_email_available(email, pool.get_ref()).await {
        return Ok(HttpResponse::Conflict().json(serde_json::json!({
            "message": "Email already taken"
        })));
    }

    let hashed = hash_password(&payload.password).map_err(|e| {
        error!(error = %e, "Password hashing failed");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    let result = sqlx::query(
        r#"
        INSERT INTO users (username, email, password, name, role_id, hire_date, work_start, work_end)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(username)
    .bind(email)
    .bind(&hashed)
    .bind(&payload.name)
    .bind(payload.role_id)
    .bind(payload.hire_date)
    .bind(work_start)
    .bind(work_end)
    .execute(pool.get_ref())
    .await;

    match result {
        Ok(_) => {
            email_filter::insert(email);
            email_cache::mark_taken(email).await;
            Ok(HttpResponse::Created().json(serde_json::json!({
                "message": "User created"
            })))
        }
        Err(e) => {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.code().as_deref() == Some("23000") {
                    return Ok(HttpResponse::Conflict().json(serde_json::json!({
                        "message": "Email or username already exists"
                    })));
                }
            }
            error!(error = %e, "User insert failed");
            Err(actix_web::error::ErrorInternalServerError(
                "Internal Server Error",
            ))
        }
    }
}

/// List users (Admin/HR/Manager)
#[utoipa::path(
    get,
    path = "/api/v1/users",
    params(UserQuery),
    responses(
        (status = 200, description = "Paginated user list", body = UserListResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Users"
)]
pub async fn list_users(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<UserQuery>,
) -> actix_web::Result<impl Responder> {
    auth.require(Capability::ViewAllRecords)?;

    let per_page = query.per_page.unwrap_or(20).min(100);
    let page = query.page.unwrap_or(1).max(1);
    let offset = (page - 1) * per_page;

    let total = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users")
        .fetch_one(pool.get_ref())
        .await
        .map_err(|e| {
            error!(error = %e, "Failed to count users");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

    let data = sqlx::query_as::<_, User>(
        r#"
        SELECT id, username, email, name, role_id, hire_date, work_start, work_end
        FROM users
        ORDER BY id
        LIMIT ? OFFSET ?
        "#,
    )
    .bind(per_page)
    .bind(offset)
    .fetch_all(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, "Failed to fetch users");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    Ok(HttpResponse::Ok().json(UserListResponse {
        data,
        page: page as u32,
        per_page: per_page as u32,
        total,
    }))
}

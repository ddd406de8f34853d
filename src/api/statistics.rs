use crate::auth::auth::AuthUser;
use crate::config::Config;
use crate::leave::duration::{self, WorkWindow};
use crate::model::leave_request::LeaveType;
use crate::model::role::Capability;
use actix_web::{HttpResponse, Responder, web};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::MySqlPool;
use std::collections::BTreeMap;
use std::str::FromStr;
use strum::IntoEnumIterator;
use utoipa::{IntoParams, ToSchema};

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct StatisticsQuery {
    /// Range start date (inclusive), e.g. "2026-03-01"
    #[schema(example = "2026-03-01", format = "date", value_type = String)]
    pub start_date: NaiveDate,
    /// Range end date (inclusive), e.g. "2026-03-31"
    #[schema(example = "2026-03-31", format = "date", value_type = String)]
    pub end_date: NaiveDate,
    /// Restrict to one leave type tag
    #[schema(example = "sick")]
    pub leave_type: Option<String>,
    /// Restrict to one user (privileged callers only)
    #[schema(example = 123)]
    pub user_id: Option<u64>,
}

#[derive(Serialize, ToSchema)]
pub struct UserStatistics {
    pub user_id: u64,
    pub name: String,
    /// Approved hours per leave type tag
    pub hours_by_type: BTreeMap<String, f64>,
}

#[derive(Serialize, ToSchema)]
pub struct StatisticsResponse {
    pub data: Vec<UserStatistics>,
}

/// Every leave type tag at zero, so consumers always see the full set.
fn zeroed_type_totals() -> BTreeMap<String, f64> {
    LeaveType::iter().map(|lt| (lt.to_string(), 0.0)).collect()
}

#[derive(sqlx::FromRow)]
struct ApprovedLeaveRow {
    user_id: u64,
    name: Option<String>,
    leave_type: String,
    start_at: DateTime<Utc>,
    end_at: DateTime<Utc>,
    work_start: Option<NaiveTime>,
    work_end: Option<NaiveTime>,
}

/// Aggregate approved leave hours per (user, leave type).
///
/// There is exactly one duration engine in this service; totals here come
/// from re-running it per stored row, never from a parallel SQL formula,
/// so per-request figures and aggregates cannot drift apart.
#[utoipa::path(
    get,
    path = "/api/v1/leave/statistics",
    params(StatisticsQuery),
    responses(
        (status = 200, description = "Approved hours per user and leave type", body = StatisticsResponse),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Statistics"
)]
pub async fn leave_statistics(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    query: web::Query<StatisticsQuery>,
) -> actix_web::Result<impl Responder> {
    let tz = config.tz();

    // Inclusive local-date range → UTC instants
    let range_start = query
        .start_date
        .and_hms_opt(0, 0, 0)
        .expect("midnight is a valid time")
        .and_local_timezone(tz)
        .single()
        .expect("fixed offset mapping is unambiguous")
        .with_timezone(&Utc);
    let range_end = (query.end_date + chrono::Duration::days(1))
        .and_hms_opt(0, 0, 0)
        .expect("midnight is a valid time")
        .and_local_timezone(tz)
        .single()
        .expect("fixed offset mapping is unambiguous")
        .with_timezone(&Utc);

    // Non-privileged callers only ever see themselves
    let scoped_user = if auth.role.allows(Capability::ViewAllRecords) {
        query.user_id
    } else {
        Some(auth.user_id)
    };

    let mut sql = String::from(
        r#"
        SELECT lr.user_id, u.name, lr.leave_type, lr.start_at, lr.end_at,
               u.work_start, u.work_end
        FROM leave_requests lr
        JOIN users u ON u.id = lr.user_id
        WHERE lr.hr_approval = 1 AND lr.manager_approval = 1
          AND lr.start_at >= ? AND lr.end_at <= ?
        "#,
    );
    if scoped_user.is_some() {
        sql.push_str(" AND lr.user_id = ?");
    }
    if query.leave_type.is_some() {
        sql.push_str(" AND lr.leave_type = ?");
    }

    let mut q = sqlx::query_as::<_, ApprovedLeaveRow>(&sql)
        .bind(range_start)
        .bind(range_end);
    if let Some(user_id) = scoped_user {
        q = q.bind(user_id);
    }
    if let Some(leave_type) = query.leave_type.as_deref() {
        q = q.bind(leave_type);
    }

    let rows = q.fetch_all(pool.get_ref()).await.map_err(|e| {
        tracing::error!(error = %e, "Failed to fetch approved leave rows");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    let default_window = config.default_work_window();
    let mut per_user: BTreeMap<u64, UserStatistics> = BTreeMap::new();

    for row in rows {
        let leave_type = match LeaveType::from_str(&row.leave_type) {
            Ok(lt) => lt,
            Err(_) => {
                tracing::warn!(tag = %row.leave_type, "Skipping row with unknown leave type");
                continue;
            }
        };
        let window = WorkWindow::resolve(row.work_start, row.work_end, default_window);
        let hours = duration::sum_hours([(
            leave_type,
            row.start_at.with_timezone(&tz),
            row.end_at.with_timezone(&tz),
            window,
        )]);

        let entry = per_user.entry(row.user_id).or_insert_with(|| UserStatistics {
            user_id: row.user_id,
            name: row.name.unwrap_or_else(|| format!("使用者 {}", row.user_id)),
            hours_by_type: zeroed_type_totals(),
        });
        *entry
            .hours_by_type
            .entry(row.leave_type)
            .or_insert(0.0) += hours;
    }

    Ok(HttpResponse::Ok().json(StatisticsResponse {
        data: per_user.into_values().collect(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn type_totals_start_with_every_tag_at_zero() {
        let totals = zeroed_type_totals();
        assert_eq!(totals.len(), 6);
        for tag in ["sick", "personal", "compensatory", "annual", "overtime", "parental"] {
            assert_eq!(totals.get(tag), Some(&0.0));
        }
    }
}

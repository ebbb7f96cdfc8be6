use crate::model::attendance::{AttendanceRecord, AttendanceStatus};
use crate::utils::db_utils::SqlValue;
use crate::utils::demo_data::seed_demo_records;
use actix_web::{HttpResponse, Responder, error::ErrorInternalServerError, web};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::SqlitePool;
use tracing::{debug, error};
use utoipa::ToSchema;

#[derive(Debug, Deserialize, ToSchema)]
pub struct RecordQuery {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    pub user_id: Option<i64>,
    pub status: Option<AttendanceStatus>,
    #[schema(example = "2026-01-01", format = "date", value_type = Option<String>)]
    pub from: Option<NaiveDate>,
    #[schema(example = "2026-01-31", format = "date", value_type = Option<String>)]
    pub to: Option<NaiveDate>,
}

#[derive(Serialize, ToSchema)]
pub struct RecordListResponse {
    pub data: Vec<AttendanceRecord>,
    #[schema(example = 1)]
    pub page: u32,
    #[schema(example = 20)]
    pub per_page: u32,
    #[schema(example = 42)]
    pub total: i64,
}

#[derive(Deserialize, ToSchema)]
pub struct SeedRequest {
    /// Defaults to the first registered user
    pub username: Option<String>,
    /// Calendar days to backfill, default 30
    pub days: Option<u32>,
}

/// List attendance records across users
#[utoipa::path(
    get,
    path = "/api/v1/admin/records",
    params(
        ("page" = Option<u32>, Query, description = "Page number"),
        ("per_page" = Option<u32>, Query, description = "Items per page"),
        ("user_id" = Option<i64>, Query, description = "Filter by user"),
        ("status" = Option<String>, Query, description = "Filter by status: full_day, half_day or no_attendance"),
        ("from" = Option<String>, Query, description = "Earliest date, inclusive"),
        ("to" = Option<String>, Query, description = "Latest date, inclusive")
    ),
    responses(
        (status = 200, description = "Paginated attendance records", body = RecordListResponse)
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Admin"
)]
pub async fn list_records(
    pool: web::Data<SqlitePool>,
    query: web::Query<RecordQuery>,
) -> actix_web::Result<impl Responder<Body = actix_web::body::BoxBody>> {
    let page = query.page.unwrap_or(1).max(1);
    let per_page = query.per_page.unwrap_or(20).clamp(1, 100);
    let offset = (page - 1) * per_page;

    // ---------- build WHERE clause dynamically ----------
    let mut conditions = Vec::new();
    let mut bindings: Vec<SqlValue> = Vec::new();

    if let Some(user_id) = query.user_id {
        conditions.push("user_id = ?");
        bindings.push(user_id.into());
    }

    if let Some(status) = query.status {
        conditions.push("status = ?");
        bindings.push(status.as_str().to_string().into());
    }

    if let Some(from) = query.from {
        conditions.push("date >= ?");
        bindings.push(from.into());
    }

    if let Some(to) = query.to {
        conditions.push("date <= ?");
        bindings.push(to.into());
    }

    let where_clause = if conditions.is_empty() {
        "".to_string()
    } else {
        format!("WHERE {}", conditions.join(" AND "))
    };

    // ---------- total count ----------
    let count_sql = format!(
        "SELECT COUNT(*) as total FROM attendance_records {}",
        where_clause
    );
    debug!(sql = %count_sql, bindings = ?bindings, "Counting attendance records");

    let mut count_query = sqlx::query_scalar::<_, i64>(&count_sql);
    for b in &bindings {
        count_query = match b {
            SqlValue::Text(v) => count_query.bind(v.clone()),
            SqlValue::Int(v) => count_query.bind(*v),
            SqlValue::Date(v) => count_query.bind(*v),
        };
    }

    let total = count_query.fetch_one(pool.get_ref()).await.map_err(|e| {
        error!(error = %e, sql = %count_sql, "Failed to count attendance records");
        ErrorInternalServerError("Database error")
    })?;

    // ---------- data query ----------
    let data_sql = format!(
        "SELECT id, user_id, date, check_in_time, check_out_time, total_hours, status \
         FROM attendance_records {} \
         ORDER BY date DESC, check_in_time DESC LIMIT ? OFFSET ?",
        where_clause
    );
    debug!(sql = %data_sql, bindings = ?bindings, page, per_page, offset, "Fetching attendance records");

    let mut data_query = sqlx::query_as::<_, AttendanceRecord>(&data_sql);
    for b in &bindings {
        data_query = match b {
            SqlValue::Text(v) => data_query.bind(v.clone()),
            SqlValue::Int(v) => data_query.bind(*v),
            SqlValue::Date(v) => data_query.bind(*v),
        };
    }
    data_query = data_query.bind(per_page as i64).bind(offset as i64);

    let records = data_query.fetch_all(pool.get_ref()).await.map_err(|e| {
        error!(error = %e, sql = %data_sql, "Failed to fetch attendance records");
        ErrorInternalServerError("Database error")
    })?;

    Ok(HttpResponse::Ok().json(RecordListResponse {
        data: records,
        page,
        per_page,
        total,
    }))
}

/// Backfill demo attendance data
#[utoipa::path(
    post,
    path = "/api/v1/admin/seed",
    request_body = SeedRequest,
    responses(
        (status = 200, description = "Demo data created", body = Object, example = json!({
            "message": "Demo data created",
            "created": 22
        })),
        (status = 404, description = "User not found", body = Object, example = json!({
            "message": "User not found"
        })),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Admin"
)]
pub async fn seed_demo(
    pool: web::Data<SqlitePool>,
    payload: web::Json<SeedRequest>,
) -> actix_web::Result<impl Responder<Body = actix_web::body::BoxBody>> {
    let days = payload.days.unwrap_or(30);

    let user_id: Option<i64> = match &payload.username {
        Some(name) => sqlx::query_scalar("SELECT id FROM users WHERE username = ?")
            .bind(name)
            .fetch_optional(pool.get_ref())
            .await
            .map_err(|e| {
                error!(error = %e, "Failed to look up user for seeding");
                ErrorInternalServerError("Database error")
            })?,
        None => sqlx::query_scalar("SELECT id FROM users ORDER BY id LIMIT 1")
            .fetch_optional(pool.get_ref())
            .await
            .map_err(|e| {
                error!(error = %e, "Failed to pick a user for seeding");
                ErrorInternalServerError("Database error")
            })?,
    };

    let Some(user_id) = user_id else {
        return Ok(HttpResponse::NotFound().json(json!({
            "message": "User not found"
        })));
    };

    let created = seed_demo_records(pool.get_ref(), user_id, days)
        .await
        .map_err(|e| {
            error!(error = %e, user_id, "Demo data seeding failed");
            ErrorInternalServerError("Database error")
        })?;

    Ok(HttpResponse::Ok().json(json!({
        "message": "Demo data created",
        "created": created
    })))
}

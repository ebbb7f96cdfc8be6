use crate::auth::auth::AuthUser;
use crate::model::attendance::{AttendanceRecord, Progress, compute_hours_and_status, round2};
use actix_web::{HttpResponse, web};
use chrono::{Datelike, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::SqlitePool;
use utoipa::ToSchema;

const RECORD_COLUMNS: &str =
    "id, user_id, date, check_in_time, check_out_time, total_hours, status";

#[derive(Debug, Clone, Copy, Default, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum HistoryFilter {
    #[default]
    All,
    Week,
    Month,
    Year,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct DashboardQuery {
    pub filter: Option<HistoryFilter>,
}

#[derive(Serialize, ToSchema)]
pub struct DashboardResponse {
    pub today_record: AttendanceRecord,
    pub attendance_history: Vec<AttendanceRecord>,
    pub is_checked_in: bool,
}

#[derive(Serialize, ToSchema)]
pub struct CheckInResponse {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(example = "09:00:00")]
    pub check_in_time: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct CheckOutResponse {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(example = "17:30:00")]
    pub check_out_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(example = 8.5)]
    pub total_hours: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(example = "Full Day")]
    pub attendance_status: Option<String>,
}

/// Structured failure per the external contract: HTTP 200, success=false.
fn failure(message: &str) -> HttpResponse {
    HttpResponse::Ok().json(json!({ "success": false, "message": message }))
}

async fn fetch_today(
    pool: &SqlitePool,
    user_id: i64,
    today: NaiveDate,
) -> Result<Option<AttendanceRecord>, sqlx::Error> {
    sqlx::query_as::<_, AttendanceRecord>(&format!(
        "SELECT {RECORD_COLUMNS} FROM attendance_records WHERE user_id = ? AND date = ?"
    ))
    .bind(user_id)
    .bind(today)
    .fetch_optional(pool)
    .await
}

/// Inclusive date range selected by a history filter, `None` meaning
/// unbounded. Week runs Monday to Sunday.
fn history_range(filter: HistoryFilter, today: NaiveDate) -> Option<(NaiveDate, NaiveDate)> {
    match filter {
        HistoryFilter::All => None,
        HistoryFilter::Week => {
            let monday = today - Duration::days(today.weekday().num_days_from_monday() as i64);
            Some((monday, monday + Duration::days(6)))
        }
        HistoryFilter::Month => {
            let first = today.with_day(1).expect("first of month is always valid");
            let next_month = if today.month() == 12 {
                NaiveDate::from_ymd_opt(today.year() + 1, 1, 1)
            } else {
                NaiveDate::from_ymd_opt(today.year(), today.month() + 1, 1)
            }
            .expect("first of next month is always valid");
            Some((first, next_month - Duration::days(1)))
        }
        HistoryFilter::Year => {
            let first = NaiveDate::from_ymd_opt(today.year(), 1, 1).expect("jan 1 is valid");
            let last = NaiveDate::from_ymd_opt(today.year(), 12, 31).expect("dec 31 is valid");
            Some((first, last))
        }
    }
}

/// Dashboard: today's record (created lazily) plus filtered history
#[utoipa::path(
    get,
    path = "/api/v1/attendance/dashboard",
    params(
        ("filter" = Option<String>, Query, description = "History filter: all, week, month or year")
    ),
    responses(
        (status = 200, description = "Today's record, filtered history and checked-in flag", body = DashboardResponse),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn dashboard(
    auth: AuthUser,
    pool: web::Data<SqlitePool>,
    query: web::Query<DashboardQuery>,
) -> HttpResponse {
    let today = Utc::now().date_naive();

    let today_record = match fetch_today(pool.get_ref(), auth.user_id, today).await {
        Ok(Some(rec)) => rec,
        Ok(None) => {
            // First view of the day creates the empty record. OR IGNORE covers
            // a concurrent check-in racing us to the unique (user, date) slot.
            let created = sqlx::query(
                "INSERT OR IGNORE INTO attendance_records (user_id, date) VALUES (?, ?)",
            )
            .bind(auth.user_id)
            .bind(today)
            .execute(pool.get_ref())
            .await;

            if let Err(e) = created {
                tracing::error!(error = %e, user_id = auth.user_id, "Failed to create today's record");
                return failure("Could not load today's attendance");
            }

            match fetch_today(pool.get_ref(), auth.user_id, today).await {
                Ok(Some(rec)) => rec,
                Ok(None) | Err(_) => {
                    tracing::error!(user_id = auth.user_id, "Today's record missing after insert");
                    return failure("Could not load today's attendance");
                }
            }
        }
        Err(e) => {
            tracing::error!(error = %e, user_id = auth.user_id, "Failed to load today's record");
            return failure("Could not load today's attendance");
        }
    };

    let filter = query.filter.unwrap_or_default();
    let history = match history_range(filter, today) {
        Some((from, to)) => {
            sqlx::query_as::<_, AttendanceRecord>(&format!(
                "SELECT {RECORD_COLUMNS} FROM attendance_records \
                 WHERE user_id = ? AND date BETWEEN ? AND ? \
                 ORDER BY date DESC, check_in_time DESC"
            ))
            .bind(auth.user_id)
            .bind(from)
            .bind(to)
            .fetch_all(pool.get_ref())
            .await
        }
        None => {
            sqlx::query_as::<_, AttendanceRecord>(&format!(
                "SELECT {RECORD_COLUMNS} FROM attendance_records \
                 WHERE user_id = ? ORDER BY date DESC, check_in_time DESC"
            ))
            .bind(auth.user_id)
            .fetch_all(pool.get_ref())
            .await
        }
    };

    let attendance_history = match history {
        Ok(records) => records,
        Err(e) => {
            tracing::error!(error = %e, user_id = auth.user_id, "Failed to load history");
            return failure("Could not load attendance history");
        }
    };

    let is_checked_in = today_record.is_checked_in();
    HttpResponse::Ok().json(DashboardResponse {
        today_record,
        attendance_history,
        is_checked_in,
    })
}

/// Check-in endpoint
#[utoipa::path(
    post,
    path = "/api/v1/attendance/check-in",
    responses(
        (status = 200, description = "Checked in, or structured failure", body = CheckInResponse, example = json!({
            "success": true,
            "message": "Checked in successfully",
            "check_in_time": "09:00:00"
        })),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn check_in(auth: AuthUser, pool: web::Data<SqlitePool>) -> HttpResponse {
    let now = Utc::now().naive_utc();
    let today = now.date();

    let existing = match fetch_today(pool.get_ref(), auth.user_id, today).await {
        Ok(rec) => rec,
        Err(e) => {
            tracing::error!(error = %e, user_id = auth.user_id, "Check-in lookup failed");
            return failure("Could not record check-in");
        }
    };

    match existing {
        Some(rec) if rec.check_in_time.is_some() => {
            return failure("Already checked in today");
        }
        Some(mut rec) => {
            // Record created by an earlier dashboard view; fill it in.
            rec.check_in_time = Some(now);
            rec.recompute();

            let result = sqlx::query(
                "UPDATE attendance_records \
                 SET check_in_time = ?, total_hours = ?, status = ? WHERE id = ?",
            )
            .bind(rec.check_in_time)
            .bind(rec.total_hours)
            .bind(rec.status)
            .bind(rec.id)
            .execute(pool.get_ref())
            .await;

            if let Err(e) = result {
                tracing::error!(error = %e, user_id = auth.user_id, "Check-in update failed");
                return failure("Could not record check-in");
            }
        }
        None => {
            let (hours, status) = compute_hours_and_status(Some(now), None);
            let result = sqlx::query(
                "INSERT INTO attendance_records (user_id, date, check_in_time, total_hours, status) \
                 VALUES (?, ?, ?, ?, ?)",
            )
            .bind(auth.user_id)
            .bind(today)
            .bind(now)
            .bind(hours)
            .bind(status)
            .execute(pool.get_ref())
            .await;

            if let Err(e) = result {
                // Lost a race for the (user, date) slot: someone checked in first.
                if let sqlx::Error::Database(db_err) = &e {
                    if db_err.is_unique_violation() {
                        return failure("Already checked in today");
                    }
                }
                tracing::error!(error = %e, user_id = auth.user_id, "Check-in insert failed");
                return failure("Could not record check-in");
            }
        }
    }

    HttpResponse::Ok().json(CheckInResponse {
        success: true,
        message: "Checked in successfully".to_string(),
        check_in_time: Some(now.format("%H:%M:%S").to_string()),
    })
}

/// Check-out endpoint
#[utoipa::path(
    post,
    path = "/api/v1/attendance/check-out",
    responses(
        (status = 200, description = "Checked out, or structured failure", body = CheckOutResponse, example = json!({
            "success": true,
            "message": "Checked out successfully",
            "check_out_time": "17:30:00",
            "total_hours": 8.5,
            "attendance_status": "Full Day"
        })),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn check_out(auth: AuthUser, pool: web::Data<SqlitePool>) -> HttpResponse {
    let now = Utc::now().naive_utc();
    let today = now.date();

    let record = match fetch_today(pool.get_ref(), auth.user_id, today).await {
        Ok(rec) => rec,
        Err(e) => {
            tracing::error!(error = %e, user_id = auth.user_id, "Check-out lookup failed");
            return failure("Could not record check-out");
        }
    };

    let mut record = match record {
        None => return failure("Please check in first"),
        Some(rec) if rec.check_in_time.is_none() => return failure("Please check in first"),
        Some(rec) if rec.check_out_time.is_some() => return failure("Already checked out today"),
        Some(rec) => rec,
    };

    record.check_out_time = Some(now);
    record.recompute();

    let result = sqlx::query(
        "UPDATE attendance_records \
         SET check_out_time = ?, total_hours = ?, status = ? WHERE id = ?",
    )
    .bind(record.check_out_time)
    .bind(record.total_hours)
    .bind(record.status)
    .bind(record.id)
    .execute(pool.get_ref())
    .await;

    if let Err(e) = result {
        tracing::error!(error = %e, user_id = auth.user_id, "Check-out update failed");
        return failure("Could not record check-out");
    }

    HttpResponse::Ok().json(CheckOutResponse {
        success: true,
        message: "Checked out successfully".to_string(),
        check_out_time: Some(now.format("%H:%M:%S").to_string()),
        total_hours: Some(round2(record.total_hours)),
        attendance_status: Some(record.status.to_string()),
    })
}

/// Elapsed hours and threshold progress for the open day
#[utoipa::path(
    get,
    path = "/api/v1/attendance/current-hours",
    responses(
        (status = 200, description = "Progress against the half/full day thresholds", body = Progress),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn current_hours(auth: AuthUser, pool: web::Data<SqlitePool>) -> HttpResponse {
    let now = Utc::now().naive_utc();

    let record = match fetch_today(pool.get_ref(), auth.user_id, now.date()).await {
        Ok(rec) => rec,
        Err(e) => {
            tracing::error!(error = %e, user_id = auth.user_id, "Progress lookup failed");
            return HttpResponse::Ok().json(Progress::idle());
        }
    };

    // No record yet means no activity yet, not an error.
    let mut progress = match record {
        Some(rec) => Progress::at(&rec, now),
        None => Progress::idle(),
    };
    progress.current_hours = round2(progress.current_hours);
    progress.hours_for_half_day = round2(progress.hours_for_half_day);
    progress.hours_for_full_day = round2(progress.hours_for_full_day);

    HttpResponse::Ok().json(progress)
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::to_bytes;
    use serde_json::Value;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn test_pool() -> web::Data<SqlitePool> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        crate::db::create_schema(&pool).await.unwrap();
        sqlx::query("INSERT INTO users (username, password) VALUES ('tester', 'x')")
            .execute(&pool)
            .await
            .unwrap();
        web::Data::new(pool)
    }

    fn tester() -> AuthUser {
        AuthUser {
            user_id: 1,
            username: "tester".to_string(),
        }
    }

    async fn body_json(resp: HttpResponse) -> Value {
        let bytes = to_bytes(resp.into_body()).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    async fn record_count(pool: &SqlitePool) -> i64 {
        sqlx::query_scalar("SELECT COUNT(*) FROM attendance_records")
            .fetch_one(pool)
            .await
            .unwrap()
    }

    #[actix_web::test]
    async fn duplicate_check_in_is_rejected() {
        let pool = test_pool().await;

        let first = body_json(check_in(tester(), pool.clone()).await).await;
        assert_eq!(first["success"], true);
        assert!(first["check_in_time"].as_str().unwrap().len() == 8);

        let second = body_json(check_in(tester(), pool.clone()).await).await;
        assert_eq!(second["success"], false);
        assert_eq!(second["message"], "Already checked in today");

        assert_eq!(record_count(pool.get_ref()).await, 1);
    }

    #[actix_web::test]
    async fn check_out_requires_check_in() {
        let pool = test_pool().await;

        let resp = body_json(check_out(tester(), pool.clone()).await).await;
        assert_eq!(resp["success"], false);
        assert_eq!(resp["message"], "Please check in first");
    }

    #[actix_web::test]
    async fn check_in_then_out_closes_the_day() {
        let pool = test_pool().await;

        body_json(check_in(tester(), pool.clone()).await).await;
        let out = body_json(check_out(tester(), pool.clone()).await).await;
        assert_eq!(out["success"], true);
        // An immediate check-out has worked no meaningful time.
        assert_eq!(out["total_hours"], 0.0);
        assert_eq!(out["attendance_status"], "No Attendance");

        let again = body_json(check_out(tester(), pool.clone()).await).await;
        assert_eq!(again["success"], false);
        assert_eq!(again["message"], "Already checked out today");

        assert_eq!(record_count(pool.get_ref()).await, 1);
    }

    #[actix_web::test]
    async fn dashboard_creates_todays_record_once() {
        let pool = test_pool().await;
        let query = || web::Query(DashboardQuery { filter: None });

        let first = body_json(dashboard(tester(), pool.clone(), query()).await).await;
        assert_eq!(first["is_checked_in"], false);
        assert!(first["today_record"]["check_in_time"].is_null());
        assert_eq!(first["attendance_history"].as_array().unwrap().len(), 1);

        // A second view reuses the row instead of creating another.
        body_json(dashboard(tester(), pool.clone(), query()).await).await;
        assert_eq!(record_count(pool.get_ref()).await, 1);

        body_json(check_in(tester(), pool.clone()).await).await;
        let after = body_json(dashboard(tester(), pool.clone(), query()).await).await;
        assert_eq!(after["is_checked_in"], true);
        assert_eq!(record_count(pool.get_ref()).await, 1);
    }

    #[actix_web::test]
    async fn week_filter_hides_older_records() {
        let pool = test_pool().await;
        let old_date = Utc::now().date_naive() - Duration::days(30);
        sqlx::query(
            "INSERT INTO attendance_records (user_id, date, total_hours, status) \
             VALUES (1, ?, 8.0, 'full_day')",
        )
        .bind(old_date)
        .execute(pool.get_ref())
        .await
        .unwrap();

        let all = body_json(
            dashboard(tester(), pool.clone(), web::Query(DashboardQuery { filter: None })).await,
        )
        .await;
        assert_eq!(all["attendance_history"].as_array().unwrap().len(), 2);

        let week = body_json(
            dashboard(
                tester(),
                pool.clone(),
                web::Query(DashboardQuery {
                    filter: Some(HistoryFilter::Week),
                }),
            )
            .await,
        )
        .await;
        assert_eq!(week["attendance_history"].as_array().unwrap().len(), 1);
    }

    #[actix_web::test]
    async fn progress_defaults_when_not_checked_in() {
        let pool = test_pool().await;

        let idle = body_json(current_hours(tester(), pool.clone()).await).await;
        assert_eq!(idle["current_hours"], 0.0);
        assert_eq!(idle["can_leave"], true);

        body_json(check_in(tester(), pool.clone()).await).await;
        let open = body_json(current_hours(tester(), pool.clone()).await).await;
        assert_eq!(open["can_leave"], false);
        assert_eq!(open["hours_for_full_day"], 8.0);
    }

    #[test]
    fn history_ranges() {
        // 2026-03-04 is a Wednesday
        let today = NaiveDate::from_ymd_opt(2026, 3, 4).unwrap();

        assert!(history_range(HistoryFilter::All, today).is_none());

        let (from, to) = history_range(HistoryFilter::Week, today).unwrap();
        assert_eq!(from, NaiveDate::from_ymd_opt(2026, 3, 2).unwrap());
        assert_eq!(to, NaiveDate::from_ymd_opt(2026, 3, 8).unwrap());

        let (from, to) = history_range(HistoryFilter::Month, today).unwrap();
        assert_eq!(from, NaiveDate::from_ymd_opt(2026, 3, 1).unwrap());
        assert_eq!(to, NaiveDate::from_ymd_opt(2026, 3, 31).unwrap());

        // December rolls the year for the month upper bound
        let dec = NaiveDate::from_ymd_opt(2026, 12, 15).unwrap();
        let (_, to) = history_range(HistoryFilter::Month, dec).unwrap();
        assert_eq!(to, NaiveDate::from_ymd_opt(2026, 12, 31).unwrap());

        let (from, to) = history_range(HistoryFilter::Year, today).unwrap();
        assert_eq!(from, NaiveDate::from_ymd_opt(2026, 1, 1).unwrap());
        assert_eq!(to, NaiveDate::from_ymd_opt(2026, 12, 31).unwrap());
    }
}

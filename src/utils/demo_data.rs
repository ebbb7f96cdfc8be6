use crate::model::attendance::compute_hours_and_status;
use chrono::{Datelike, Duration, NaiveDate, Utc, Weekday};
use rand::Rng;
use sqlx::SqlitePool;
use tracing::info;

/// A plausible shape for one worked day.
struct WorkPattern {
    min_hours: f64,
    max_hours: f64,
    check_in_start: u32,
    check_in_end: u32,
}

// Regular, early-bird and late-starter full days
const FULL_DAY_PATTERNS: [WorkPattern; 3] = [
    WorkPattern { min_hours: 8.0, max_hours: 9.0, check_in_start: 8, check_in_end: 9 },
    WorkPattern { min_hours: 8.5, max_hours: 9.5, check_in_start: 7, check_in_end: 8 },
    WorkPattern { min_hours: 7.5, max_hours: 8.5, check_in_start: 9, check_in_end: 10 },
];

const HALF_DAY_PATTERN: WorkPattern =
    WorkPattern { min_hours: 4.0, max_hours: 5.0, check_in_start: 8, check_in_end: 9 };

fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// Backfills demo attendance for the `days` calendar days before today,
/// skipping weekends and days that already have a record. Roughly 90% of
/// generated days are full days. Returns the number of rows created.
pub async fn seed_demo_records(
    pool: &SqlitePool,
    user_id: i64,
    days: u32,
) -> Result<u32, sqlx::Error> {
    let today = Utc::now().date_naive();
    let mut rng = rand::thread_rng();
    let mut created = 0u32;

    for offset in 1..=days {
        let date = today - Duration::days(offset as i64);

        if is_weekend(date) {
            continue;
        }

        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM attendance_records WHERE user_id = ? AND date = ?)",
        )
        .bind(user_id)
        .bind(date)
        .fetch_one(pool)
        .await?;

        if exists {
            continue;
        }

        let pattern = if rng.gen_bool(0.9) {
            &FULL_DAY_PATTERNS[rng.gen_range(0..FULL_DAY_PATTERNS.len())]
        } else {
            &HALF_DAY_PATTERN
        };

        let check_in_hour = rng.gen_range(pattern.check_in_start..=pattern.check_in_end);
        let check_in_minute = rng.gen_range(0..60);
        let check_in = date
            .and_hms_opt(check_in_hour, check_in_minute, 0)
            .expect("generated clock time is valid");

        let worked_hours = rng.gen_range(pattern.min_hours..pattern.max_hours);
        let check_out = check_in + Duration::seconds((worked_hours * 3600.0) as i64);

        let (total_hours, status) = compute_hours_and_status(Some(check_in), Some(check_out));

        sqlx::query(
            "INSERT INTO attendance_records \
             (user_id, date, check_in_time, check_out_time, total_hours, status) \
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(user_id)
        .bind(date)
        .bind(check_in)
        .bind(check_out)
        .bind(total_hours)
        .bind(status)
        .execute(pool)
        .await?;

        created += 1;
    }

    info!(user_id, created, "Seeded demo attendance records");
    Ok(created)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::attendance::{AttendanceRecord, HALF_DAY_HOURS};
    use sqlx::sqlite::SqlitePoolOptions;

    async fn test_pool() -> SqlitePool {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        crate::db::create_schema(&pool).await.unwrap();
        sqlx::query("INSERT INTO users (username, password) VALUES ('demo', 'x')")
            .execute(&pool)
            .await
            .unwrap();
        pool
    }

    #[actix_web::test]
    async fn seeds_weekdays_with_consistent_records() {
        let pool = test_pool().await;

        let created = seed_demo_records(&pool, 1, 14).await.unwrap();
        // 14 calendar days always contain exactly 10 weekdays.
        assert_eq!(created, 10);

        let records = sqlx::query_as::<_, AttendanceRecord>(
            "SELECT id, user_id, date, check_in_time, check_out_time, total_hours, status \
             FROM attendance_records ORDER BY date DESC",
        )
        .fetch_all(&pool)
        .await
        .unwrap();
        assert_eq!(records.len(), 10);

        for rec in &records {
            assert!(!is_weekend(rec.date));
            let check_in = rec.check_in_time.unwrap();
            let check_out = rec.check_out_time.unwrap();
            assert!(check_out > check_in);
            assert!(rec.total_hours >= HALF_DAY_HOURS);

            let (hours, status) = compute_hours_and_status(Some(check_in), Some(check_out));
            assert_eq!(rec.total_hours, hours);
            assert_eq!(rec.status, status);
        }
    }

    #[actix_web::test]
    async fn reseeding_skips_existing_days() {
        let pool = test_pool().await;

        seed_demo_records(&pool, 1, 14).await.unwrap();
        let second_run = seed_demo_records(&pool, 1, 14).await.unwrap();
        assert_eq!(second_run, 0);
    }
}

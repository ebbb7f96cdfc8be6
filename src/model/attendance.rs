use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use strum_macros::Display;
use utoipa::ToSchema;

/// Hours required before a day counts as a half day.
pub const HALF_DAY_HOURS: f64 = 4.0;
/// Hours required before a day counts as a full day.
pub const FULL_DAY_HOURS: f64 = 8.0;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, Display, ToSchema,
)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum AttendanceStatus {
    #[strum(serialize = "Full Day")]
    FullDay,
    #[strum(serialize = "Half Day")]
    HalfDay,
    #[strum(serialize = "No Attendance")]
    NoAttendance,
}

impl AttendanceStatus {
    /// Stored (and wire) form, as opposed to the `Display` label.
    pub fn as_str(&self) -> &'static str {
        match self {
            AttendanceStatus::FullDay => "full_day",
            AttendanceStatus::HalfDay => "half_day",
            AttendanceStatus::NoAttendance => "no_attendance",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct AttendanceRecord {
    pub id: i64,
    pub user_id: i64,
    #[schema(example = "2026-01-01", format = "date", value_type = String)]
    pub date: NaiveDate,
    #[schema(example = "2026-01-01T09:00:00", value_type = Option<String>)]
    pub check_in_time: Option<NaiveDateTime>,
    #[schema(example = "2026-01-01T17:30:00", value_type = Option<String>)]
    pub check_out_time: Option<NaiveDateTime>,
    pub total_hours: f64,
    pub status: AttendanceStatus,
}

/// Worked hours and day classification for a pair of timestamps.
///
/// Both timestamps must be present for any hours to count; an incomplete
/// record is always `(0.0, NoAttendance)`.
pub fn compute_hours_and_status(
    check_in: Option<NaiveDateTime>,
    check_out: Option<NaiveDateTime>,
) -> (f64, AttendanceStatus) {
    match (check_in, check_out) {
        (Some(start), Some(end)) => {
            let hours = (end - start).num_seconds() as f64 / 3600.0;
            let status = if hours >= FULL_DAY_HOURS {
                AttendanceStatus::FullDay
            } else if hours >= HALF_DAY_HOURS {
                AttendanceStatus::HalfDay
            } else {
                AttendanceStatus::NoAttendance
            };
            (hours, status)
        }
        _ => (0.0, AttendanceStatus::NoAttendance),
    }
}

impl AttendanceRecord {
    /// Re-runs the status engine. Callers must do this before every persist.
    pub fn recompute(&mut self) {
        let (hours, status) = compute_hours_and_status(self.check_in_time, self.check_out_time);
        self.total_hours = hours;
        self.status = status;
    }

    pub fn is_checked_in(&self) -> bool {
        self.check_in_time.is_some() && self.check_out_time.is_none()
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct Progress {
    #[schema(example = 5.25)]
    pub current_hours: f64,
    #[schema(example = 0.0)]
    pub hours_for_half_day: f64,
    #[schema(example = 2.75)]
    pub hours_for_full_day: f64,
    pub can_leave: bool,
}

impl Progress {
    /// State of an open day that has not started yet (or is already closed).
    pub fn idle() -> Self {
        Self {
            current_hours: 0.0,
            hours_for_half_day: HALF_DAY_HOURS,
            hours_for_full_day: FULL_DAY_HOURS,
            can_leave: true,
        }
    }

    /// Progress against the half/full day thresholds as of `now`.
    /// Only meaningful while the record is checked in and not checked out.
    pub fn at(record: &AttendanceRecord, now: NaiveDateTime) -> Self {
        let Some(check_in) = record.check_in_time else {
            return Self::idle();
        };
        if record.check_out_time.is_some() {
            return Self::idle();
        }

        let elapsed = (now - check_in).num_seconds() as f64 / 3600.0;
        Self {
            current_hours: elapsed,
            hours_for_half_day: (HALF_DAY_HOURS - elapsed).max(0.0),
            hours_for_full_day: (FULL_DAY_HOURS - elapsed).max(0.0),
            can_leave: elapsed >= HALF_DAY_HOURS,
        }
    }
}

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 3, 2)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    fn record(check_in: Option<NaiveDateTime>, check_out: Option<NaiveDateTime>) -> AttendanceRecord {
        let mut rec = AttendanceRecord {
            id: 1,
            user_id: 1,
            date: NaiveDate::from_ymd_opt(2026, 3, 2).unwrap(),
            check_in_time: check_in,
            check_out_time: check_out,
            total_hours: 0.0,
            status: AttendanceStatus::NoAttendance,
        };
        rec.recompute();
        rec
    }

    #[test]
    fn eight_and_a_half_hours_is_a_full_day() {
        let (hours, status) = compute_hours_and_status(Some(at(9, 0)), Some(at(17, 30)));
        assert_eq!(hours, 8.5);
        assert_eq!(status, AttendanceStatus::FullDay);
    }

    #[test]
    fn three_hours_is_no_attendance() {
        let (hours, status) = compute_hours_and_status(Some(at(9, 0)), Some(at(12, 0)));
        assert_eq!(hours, 3.0);
        assert_eq!(status, AttendanceStatus::NoAttendance);
    }

    #[test]
    fn threshold_boundaries() {
        let (hours, status) = compute_hours_and_status(Some(at(9, 0)), Some(at(13, 0)));
        assert_eq!(hours, 4.0);
        assert_eq!(status, AttendanceStatus::HalfDay);

        let (hours, status) = compute_hours_and_status(Some(at(9, 0)), Some(at(17, 0)));
        assert_eq!(hours, 8.0);
        assert_eq!(status, AttendanceStatus::FullDay);

        let (_, status) = compute_hours_and_status(Some(at(9, 0)), Some(at(16, 59)));
        assert_eq!(status, AttendanceStatus::HalfDay);
    }

    #[test]
    fn incomplete_record_has_zero_hours() {
        assert_eq!(
            compute_hours_and_status(Some(at(9, 0)), None),
            (0.0, AttendanceStatus::NoAttendance)
        );
        assert_eq!(
            compute_hours_and_status(None, None),
            (0.0, AttendanceStatus::NoAttendance)
        );
    }

    #[test]
    fn recompute_runs_on_every_save() {
        let mut rec = record(Some(at(8, 0)), Some(at(17, 0)));
        assert_eq!(rec.status, AttendanceStatus::FullDay);

        // Clearing a timestamp must reset hours on the next recompute.
        rec.check_out_time = None;
        rec.recompute();
        assert_eq!(rec.total_hours, 0.0);
        assert_eq!(rec.status, AttendanceStatus::NoAttendance);
    }

    #[test]
    fn status_labels() {
        assert_eq!(AttendanceStatus::FullDay.to_string(), "Full Day");
        assert_eq!(AttendanceStatus::HalfDay.to_string(), "Half Day");
        assert_eq!(AttendanceStatus::NoAttendance.to_string(), "No Attendance");
    }

    #[test]
    fn progress_mid_morning() {
        let rec = record(Some(at(9, 0)), None);
        let p = Progress::at(&rec, at(11, 0));
        assert_eq!(p.current_hours, 2.0);
        assert_eq!(p.hours_for_half_day, 2.0);
        assert_eq!(p.hours_for_full_day, 6.0);
        assert!(!p.can_leave);
    }

    #[test]
    fn progress_remainders_floor_at_zero() {
        let rec = record(Some(at(7, 0)), None);
        let p = Progress::at(&rec, at(16, 30));
        assert_eq!(p.current_hours, 9.5);
        assert_eq!(p.hours_for_half_day, 0.0);
        assert_eq!(p.hours_for_full_day, 0.0);
        assert!(p.can_leave);
    }

    #[test]
    fn progress_is_idle_outside_an_open_day() {
        let not_started = record(None, None);
        let p = Progress::at(&not_started, at(10, 0));
        assert_eq!(p.current_hours, 0.0);
        assert!(p.can_leave);

        let closed = record(Some(at(9, 0)), Some(at(17, 0)));
        let p = Progress::at(&closed, at(18, 0));
        assert_eq!(p.current_hours, 0.0);
        assert_eq!(p.hours_for_half_day, HALF_DAY_HOURS);
        assert_eq!(p.hours_for_full_day, FULL_DAY_HOURS);
        assert!(p.can_leave);
    }

    #[test]
    fn rounds_to_two_decimals() {
        assert_eq!(round2(8.50417), 8.5);
        assert_eq!(round2(1.2345), 1.23);
        assert_eq!(round2(7.999), 8.0);
    }
}

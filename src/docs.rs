use crate::api::admin::{RecordListResponse, RecordQuery, SeedRequest};
use crate::api::attendance::{
    CheckInResponse, CheckOutResponse, DashboardQuery, DashboardResponse, HistoryFilter,
};
use crate::model::attendance::{AttendanceRecord, AttendanceStatus, Progress};
use utoipa::Modify;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{OpenApi, openapi};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Attendance Tracker API",
        version = "1.0.0",
        description = r#"
## Attendance Tracker

Single-user daily attendance tracking: one check-in and one check-out per day,
with worked hours and a day classification computed on every save.

### 🔹 Key Features
- **Check-in / Check-out**
  - Once per day each, with structured `success`/`message` results
- **Progress**
  - Elapsed hours and remaining time to the half-day (4h) and full-day (8h) thresholds
- **Dashboard**
  - Today's record plus history filtered by week, month or year
- **Admin**
  - Cross-user record listing and demo-data backfill

### 🔐 Security
Attendance and admin endpoints are protected with **JWT Bearer authentication**.

### 📦 Response Format
- JSON-based RESTful responses
- Attendance failures are reported as `success: false` with a readable message

---
Built with **Rust**, **Actix Web**, **SQLx**, and **Utoipa**.
"#,
    ),
    paths(
        crate::api::attendance::dashboard,
        crate::api::attendance::check_in,
        crate::api::attendance::check_out,
        crate::api::attendance::current_hours,

        crate::api::admin::list_records,
        crate::api::admin::seed_demo
    ),
    components(
        schemas(
            AttendanceRecord,
            AttendanceStatus,
            Progress,
            HistoryFilter,
            DashboardQuery,
            DashboardResponse,
            CheckInResponse,
            CheckOutResponse,
            RecordQuery,
            RecordListResponse,
            SeedRequest
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Attendance", description = "Attendance tracking APIs"),
        (name = "Admin", description = "Record administration APIs"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

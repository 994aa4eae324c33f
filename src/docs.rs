use crate::api::attendance::{
    AdminMonthQuery, AttendanceDayView, BreakFieldReq, DailyQuery, DailyStaffView, MonthQuery,
    MonthResponse, UpdateDayReq,
};
use crate::api::clock::ClockStatusResponse;
use crate::api::correction::{
    CorrectionFilter, CorrectionListResponse, CorrectionResponse, CreateCorrection,
};
use crate::api::employee::{EmployeeListResponse, EmployeeQuery};
use crate::model::correction::{CorrectionStatus, ProposedBreak};
use crate::model::employee::Employee;
use crate::model::status::WorkStatus;
use utoipa::Modify;
use utoipa::OpenApi;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Timeclock API",
        version = "1.0.0",
        description = r#"
## Attendance Tracking System

This API powers an employee attendance-tracking system.

### Key Features
- **Clock actions**
  - Clock in/out and break in/out with idempotent duplicate handling
- **Attendance views**
  - Personal monthly attendance, all-staff daily view (admin)
- **Correction requests**
  - Submit, approve, and reject corrections with a pending-lock on the day
- **Reports**
  - Monthly CSV export per employee (admin)

### Security
Protected endpoints use **JWT Bearer authentication**.
Admin-only operations require an admin account.

---
Built with **Rust**, **Actix Web**, **SQLx**, and **Utoipa**.
"#,
    ),
    paths(
        crate::api::clock::clock_in,
        crate::api::clock::clock_out,
        crate::api::clock::break_in,
        crate::api::clock::break_out,
        crate::api::clock::clock_status,

        crate::api::attendance::my_month,
        crate::api::attendance::admin_month,
        crate::api::attendance::admin_daily,
        crate::api::attendance::update_day,

        crate::api::correction::create_correction,
        crate::api::correction::correction_list,
        crate::api::correction::get_correction,
        crate::api::correction::approve_correction,
        crate::api::correction::reject_correction,

        crate::api::report::monthly_csv,

        crate::api::employee::list_employees,
        crate::api::employee::get_employee
    ),
    components(
        schemas(
            WorkStatus,
            CorrectionStatus,
            ProposedBreak,
            ClockStatusResponse,
            AttendanceDayView,
            MonthResponse,
            MonthQuery,
            AdminMonthQuery,
            DailyQuery,
            DailyStaffView,
            BreakFieldReq,
            UpdateDayReq,
            CreateCorrection,
            CorrectionFilter,
            CorrectionResponse,
            CorrectionListResponse,
            Employee,
            EmployeeQuery,
            EmployeeListResponse
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Clock", description = "Clock in/out and break tracking APIs"),
        (name = "Attendance", description = "Attendance view and edit APIs"),
        (name = "Correction", description = "Correction request workflow APIs"),
        (name = "Report", description = "CSV report APIs"),
        (name = "Employee", description = "Staff directory APIs"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
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

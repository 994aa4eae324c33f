use crate::api::attendance::{AdminMonthQuery, month_view};
use crate::auth::auth::AuthUser;
use crate::timesheet::time::fmt_h_mm;
use crate::utils::name_cache;
use actix_web::{HttpResponse, Responder, web};
use chrono::Datelike;
use sqlx::MySqlPool;

const WEEKDAYS: [&str; 7] = ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"];

/// Monthly attendance report for one employee as CSV (admin)
#[utoipa::path(
    get,
    path = "/api/v1/reports/attendance.csv",
    params(AdminMonthQuery),
    responses(
        (status = 200, description = "CSV report", content_type = "text/csv"),
        (status = 400, description = "Invalid month"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 500, description = "Internal server error")
    ),
    security(("bearer_auth" = [])),
    tag = "Report"
)]
pub async fn monthly_csv(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<AdminMonthQuery>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let month = month_view(pool.get_ref(), query.employee_id, &query.month).await?;
    let employee_name = name_cache::display_name(pool.get_ref(), query.employee_id).await;

    let mut writer = csv::Writer::from_writer(Vec::new());

    writer
        .write_record(["Employee", "Date", "Weekday", "Clock In", "Clock Out", "Break", "Total", "Note"])
        .map_err(csv_error)?;

    for day in &month.days {
        let weekday = WEEKDAYS[day.date.weekday().num_days_from_monday() as usize];
        writer
            .write_record([
                employee_name.as_str(),
                &day.date.to_string(),
                weekday,
                day.start_time.as_deref().unwrap_or(""),
                day.end_time.as_deref().unwrap_or(""),
                &fmt_h_mm(day.break_minutes),
                &fmt_h_mm(day.worked_minutes),
                &day.note,
            ])
            .map_err(csv_error)?;
    }

    writer
        .write_record([
            "",
            "",
            "",
            "",
            "Total",
            &fmt_h_mm(month.total_break_minutes),
            &fmt_h_mm(month.total_worked_minutes),
            "",
        ])
        .map_err(csv_error)?;

    let bytes = writer
        .into_inner()
        .map_err(|e| actix_web::error::ErrorInternalServerError(e.to_string()))?;

    let filename = format!("attendance-{}-{}.csv", query.employee_id, query.month);

    Ok(HttpResponse::Ok()
        .content_type("text/csv; charset=utf-8")
        .insert_header((
            "Content-Disposition",
            format!("attachment; filename=\"{filename}\""),
        ))
        .body(bytes))
}

fn csv_error(e: csv::Error) -> actix_web::Error {
    tracing::error!(error = %e, "CSV write failed");
    actix_web::error::ErrorInternalServerError("Internal Server Error")
}

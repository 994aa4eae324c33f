use crate::api::store;
use crate::auth::auth::AuthUser;
use crate::model::correction::CorrectionStatus;
use crate::model::status::WorkStatus;
use crate::timesheet::time::{fmt_display, parse_time_of_day};
use crate::timesheet::validate::{BreakTimes, validate_day_times};
use actix_web::{HttpResponse, Responder, web};
use chrono::{Months, NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use sqlx::MySqlPool;
use std::str::FromStr;
use utoipa::{IntoParams, ToSchema};

fn db_error(e: sqlx::Error) -> actix_web::Error {
    tracing::error!(error = %e, "Database error");
    actix_web::error::ErrorInternalServerError("Internal Server Error")
}

/// First and last date of a "YYYY-MM" month string.
fn month_bounds(month: &str) -> Option<(NaiveDate, NaiveDate)> {
    let first = NaiveDate::parse_from_str(&format!("{month}-01"), "%Y-%m-%d").ok()?;
    let last = first
        .checked_add_months(Months::new(1))
        .and_then(|d| d.pred_opt())?;
    Some((first, last))
}

#[derive(sqlx::FromRow)]
struct MonthRowSql {
    id: u64,
    work_date: NaiveDate,
    note: String,
    status: String,
    start_time: Option<NaiveTime>,
    end_time: Option<NaiveTime>,
    break_minutes: Option<i64>,
    worked_minutes: Option<i64>,
    latest_request_status: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct AttendanceDayView {
    pub day_id: u64,
    #[schema(example = "2026-08-03", value_type = String, format = "date")]
    pub date: NaiveDate,
    #[schema(example = "after_work")]
    pub status: WorkStatus,
    #[schema(example = "09:00", value_type = Option<String>)]
    pub start_time: Option<String>,
    #[schema(example = "18:00", value_type = Option<String>)]
    pub end_time: Option<String>,
    pub break_minutes: i64,
    pub worked_minutes: i64,
    pub note: String,
    /// True while the day's latest correction request is still pending
    pub locked: bool,
}

impl From<MonthRowSql> for AttendanceDayView {
    fn from(row: MonthRowSql) -> Self {
        let hint = WorkStatus::from_str(&row.status).ok();
        let locked = CorrectionStatus::locks_day(
            row.latest_request_status
                .as_deref()
                .and_then(|s| CorrectionStatus::from_str(s).ok()),
        );
        AttendanceDayView {
            day_id: row.id,
            date: row.work_date,
            status: WorkStatus::resolve(hint, row.start_time, row.end_time),
            start_time: row.start_time.map(fmt_display),
            end_time: row.end_time.map(fmt_display),
            break_minutes: row.break_minutes.unwrap_or(0),
            worked_minutes: row.worked_minutes.unwrap_or(0),
            note: row.note,
            locked,
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct MonthResponse {
    pub employee_id: u64,
    #[schema(example = "2026-08")]
    pub month: String,
    pub days: Vec<AttendanceDayView>,
    pub total_break_minutes: i64,
    pub total_worked_minutes: i64,
}

pub(crate) async fn month_view(
    pool: &MySqlPool,
    employee_id: u64,
    month: &str,
) -> actix_web::Result<MonthResponse> {
    let Some((first, last)) = month_bounds(month) else {
        return Err(actix_web::error::ErrorBadRequest(
            "month must be in YYYY-MM format",
        ));
    };

    let rows = sqlx::query_as::<_, MonthRowSql>(
        r#"
        SELECT d.id, d.work_date, d.note, d.status,
               s.start_time, s.end_time,
               t.break_minutes, t.worked_minutes,
               (SELECT c.status FROM correction_requests c
                 WHERE c.attendance_day_id = d.id
                 ORDER BY c.created_at DESC, c.id DESC
                 LIMIT 1) AS latest_request_status
        FROM attendance_days d
        LEFT JOIN shift_times s ON s.attendance_day_id = d.id
        LEFT JOIN daily_totals t ON t.attendance_day_id = d.id
        WHERE d.employee_id = ? AND d.work_date BETWEEN ? AND ?
        ORDER BY d.work_date
        "#,
    )
    .bind(employee_id)
    .bind(first)
    .bind(last)
    .fetch_all(pool)
    .await
    .map_err(db_error)?;

    let days: Vec<AttendanceDayView> = rows.into_iter().map(Into::into).collect();
    let total_break_minutes = days.iter().map(|d| d.break_minutes).sum();
    let total_worked_minutes = days.iter().map(|d| d.worked_minutes).sum();

    Ok(MonthResponse {
        employee_id,
        month: month.to_string(),
        days,
        total_break_minutes,
        total_worked_minutes,
    })
}

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct MonthQuery {
    /// Month to list, "YYYY-MM"
    #[schema(example = "2026-08")]
    pub month: String,
}

/// Caller's own monthly attendance
#[utoipa::path(
    get,
    path = "/api/v1/attendance",
    params(MonthQuery),
    responses(
        (status = 200, description = "Caller's month", body = MonthResponse),
        (status = 400, description = "Invalid month"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn my_month(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<MonthQuery>,
) -> actix_web::Result<impl Responder> {
    let employee_id = auth.require_employee_id()?;
    let response = month_view(pool.get_ref(), employee_id, &query.month).await?;
    Ok(HttpResponse::Ok().json(response))
}

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct AdminMonthQuery {
    #[schema(example = 1001)]
    pub employee_id: u64,
    #[schema(example = "2026-08")]
    pub month: String,
}

/// One employee's month (admin)
#[utoipa::path(
    get,
    path = "/api/v1/attendance/monthly",
    params(AdminMonthQuery),
    responses(
        (status = 200, description = "Employee's month", body = MonthResponse),
        (status = 400, description = "Invalid month"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn admin_month(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<AdminMonthQuery>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;
    let response = month_view(pool.get_ref(), query.employee_id, &query.month).await?;
    Ok(HttpResponse::Ok().json(response))
}

#[derive(sqlx::FromRow)]
struct DailyRowSql {
    id: u64,
    employee_id: u64,
    first_name: String,
    last_name: Option<String>,
    note: String,
    status: String,
    start_time: Option<NaiveTime>,
    end_time: Option<NaiveTime>,
    break_minutes: Option<i64>,
    worked_minutes: Option<i64>,
}

#[derive(Serialize, ToSchema)]
pub struct DailyStaffView {
    pub day_id: u64,
    pub employee_id: u64,
    #[schema(example = "John Doe")]
    pub employee_name: String,
    pub status: WorkStatus,
    #[schema(example = "09:00", value_type = Option<String>)]
    pub start_time: Option<String>,
    #[schema(example = "18:00", value_type = Option<String>)]
    pub end_time: Option<String>,
    pub break_minutes: i64,
    pub worked_minutes: i64,
    pub note: String,
}

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct DailyQuery {
    /// Date to list, "YYYY-MM-DD"
    #[schema(example = "2026-08-29", format = "date", value_type = String)]
    pub date: NaiveDate,
}

/// All staff attendance for one date (admin)
#[utoipa::path(
    get,
    path = "/api/v1/attendance/daily",
    params(DailyQuery),
    responses(
        (status = 200, description = "All staff for the date", body = [DailyStaffView]),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn admin_daily(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<DailyQuery>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let rows = sqlx::query_as::<_, DailyRowSql>(
        r#"
        SELECT d.id, d.employee_id, e.first_name, e.last_name, d.note, d.status,
               s.start_time, s.end_time,
               t.break_minutes, t.worked_minutes
        FROM attendance_days d
        JOIN employees e ON e.id = d.employee_id
        LEFT JOIN shift_times s ON s.attendance_day_id = d.id
        LEFT JOIN daily_totals t ON t.attendance_day_id = d.id
        WHERE d.work_date = ?
        ORDER BY d.employee_id
        "#,
    )
    .bind(query.date)
    .fetch_all(pool.get_ref())
    .await
    .map_err(db_error)?;

    let staff: Vec<DailyStaffView> = rows
        .into_iter()
        .map(|row| {
            let hint = WorkStatus::from_str(&row.status).ok();
            let employee_name = match &row.last_name {
                Some(last) => format!("{} {}", row.first_name, last),
                None => row.first_name.clone(),
            };
            DailyStaffView {
                day_id: row.id,
                employee_id: row.employee_id,
                employee_name,
                status: WorkStatus::resolve(hint, row.start_time, row.end_time),
                start_time: row.start_time.map(fmt_display),
                end_time: row.end_time.map(fmt_display),
                break_minutes: row.break_minutes.unwrap_or(0),
                worked_minutes: row.worked_minutes.unwrap_or(0),
                note: row.note,
            }
        })
        .collect();

    Ok(HttpResponse::Ok().json(staff))
}

#[derive(Deserialize, ToSchema)]
pub struct BreakFieldReq {
    #[schema(example = "12:00", value_type = Option<String>)]
    pub start_time: Option<String>,
    #[schema(example = "13:00", value_type = Option<String>)]
    pub end_time: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct UpdateDayReq {
    #[schema(example = "09:00", value_type = Option<String>)]
    pub start_time: Option<String>,
    #[schema(example = "18:00", value_type = Option<String>)]
    pub end_time: Option<String>,
    /// Ordered break list, replaces the day's stored breaks
    #[serde(default)]
    pub breaks: Vec<BreakFieldReq>,
    #[schema(example = "Forgot to clock out")]
    pub note: String,
}

#[derive(Debug)]
pub(crate) struct ParsedDayEdit {
    pub start: Option<NaiveTime>,
    pub end: Option<NaiveTime>,
    pub breaks: Vec<BreakTimes>,
}

/// Parses the submitted time fields (unparseable input is absent, per the
/// time normalizer contract) and applies the shared ordering rules.
pub(crate) fn parse_and_validate(
    start_time: Option<&str>,
    end_time: Option<&str>,
    breaks: &[BreakFieldReq],
    note: &str,
) -> Result<ParsedDayEdit, crate::timesheet::validate::FieldErrors> {
    let start = start_time.and_then(parse_time_of_day);
    let end = end_time.and_then(parse_time_of_day);

    let parsed_breaks: Vec<BreakTimes> = breaks
        .iter()
        .map(|b| BreakTimes {
            start: b.start_time.as_deref().and_then(parse_time_of_day),
            end: b.end_time.as_deref().and_then(parse_time_of_day),
        })
        .filter(|b| b.start.is_some() || b.end.is_some())
        .collect();

    let mut errors = match validate_day_times(start, end, &parsed_breaks, note) {
        Ok(()) => Default::default(),
        Err(e) => e,
    };

    // end without start never occurs through the clock flow; keep the edit
    // paths from creating it
    if end.is_some() && start.is_none() {
        errors.push("end_time", "End time requires a start time");
    }

    errors.into_result().map(|_| ParsedDayEdit {
        start,
        end,
        breaks: parsed_breaks,
    })
}

/// Admin direct edit: overwrites the day's times, breaks and note, then
/// recomputes totals, all in one transaction. Rejected while a correction
/// request is pending on the day.
#[utoipa::path(
    put,
    path = "/api/v1/attendance/days/{day_id}",
    params(("day_id" = u64, Path, description = "Attendance day ID")),
    request_body = UpdateDayReq,
    responses(
        (status = 200, description = "Day updated", body = Object, example = json!({
            "message": "Attendance updated",
            "break_minutes": 60,
            "worked_minutes": 480
        })),
        (status = 404, description = "Day not found"),
        (status = 409, description = "Day locked by a pending correction request", body = Object, example = json!({
            "message": "Day is locked by a pending correction request"
        })),
        (status = 422, description = "Validation errors", body = Object, example = json!({
            "errors": { "start_time": ["Start time must be earlier than end time"] }
        })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn update_day(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    body: web::Json<UpdateDayReq>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let day_id = path.into_inner();

    let parsed = match parse_and_validate(
        body.start_time.as_deref(),
        body.end_time.as_deref(),
        &body.breaks,
        &body.note,
    ) {
        Ok(p) => p,
        Err(errors) => return Ok(HttpResponse::UnprocessableEntity().json(errors)),
    };

    let mut tx = pool.begin().await.map_err(db_error)?;

    let day = match store::lock_day_by_id(&mut tx, day_id).await.map_err(db_error)? {
        Some(day) => day,
        None => {
            return Ok(HttpResponse::NotFound().json(serde_json::json!({
                "message": "Attendance day not found"
            })));
        }
    };

    let latest = store::latest_request_status(&mut tx, day.id)
        .await
        .map_err(db_error)?;
    if CorrectionStatus::locks_day(latest) {
        return Ok(HttpResponse::Conflict().json(serde_json::json!({
            "message": "Day is locked by a pending correction request"
        })));
    }

    store::upsert_shift(&mut tx, day.id, parsed.start, parsed.end)
        .await
        .map_err(db_error)?;

    store::delete_breaks(&mut tx, day.id).await.map_err(db_error)?;
    for (i, b) in parsed.breaks.iter().enumerate() {
        store::insert_break(&mut tx, day.id, (i + 1) as u32, b.start, b.end)
            .await
            .map_err(db_error)?;
    }

    store::set_day_note(&mut tx, day.id, body.note.trim())
        .await
        .map_err(db_error)?;

    let totals = store::recompute_totals(&mut tx, day.id)
        .await
        .map_err(db_error)?;

    // stored status follows the rewritten times
    store::set_day_status(&mut tx, day.id, WorkStatus::from_shift(parsed.start, parsed.end))
        .await
        .map_err(db_error)?;

    tx.commit().await.map_err(db_error)?;

    tracing::info!(day_id, employee_id = day.employee_id, "Attendance day edited");

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Attendance updated",
        "break_minutes": totals.break_minutes,
        "worked_minutes": totals.worked_minutes
    })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn month_bounds_cover_the_whole_month() {
        let (first, last) = month_bounds("2026-08").unwrap();
        assert_eq!(first, NaiveDate::from_ymd_opt(2026, 8, 1).unwrap());
        assert_eq!(last, NaiveDate::from_ymd_opt(2026, 8, 31).unwrap());

        let (first, last) = month_bounds("2026-02").unwrap();
        assert_eq!(first, NaiveDate::from_ymd_opt(2026, 2, 1).unwrap());
        assert_eq!(last, NaiveDate::from_ymd_opt(2026, 2, 28).unwrap());
    }

    #[test]
    fn month_bounds_reject_garbage() {
        assert!(month_bounds("2026-13").is_none());
        assert!(month_bounds("garbage").is_none());
    }

    #[test]
    fn unparseable_times_are_treated_as_absent() {
        let parsed = parse_and_validate(Some("not a time"), None, &[], "note").unwrap();
        assert!(parsed.start.is_none());
        assert!(parsed.end.is_none());
    }

    #[test]
    fn end_without_start_is_rejected() {
        let err = parse_and_validate(None, Some("18:00"), &[], "note").unwrap_err();
        assert!(err.errors.contains_key("end_time"));
    }

    #[test]
    fn two_breaks_without_ends_are_rejected() {
        let breaks = vec![
            BreakFieldReq {
                start_time: Some("12:00".into()),
                end_time: None,
            },
            BreakFieldReq {
                start_time: Some("14:00".into()),
                end_time: None,
            },
        ];
        let err = parse_and_validate(Some("09:00"), Some("18:00"), &breaks, "note").unwrap_err();
        assert!(err.errors.contains_key("breaks[1].end_time"));
    }

    #[test]
    fn empty_break_rows_are_dropped() {
        let breaks = vec![
            BreakFieldReq {
                start_time: None,
                end_time: None,
            },
            BreakFieldReq {
                start_time: Some("12:00".into()),
                end_time: Some("13:00".into()),
            },
        ];
        let parsed =
            parse_and_validate(Some("09:00"), Some("18:00"), &breaks, "note").unwrap();
        assert_eq!(parsed.breaks.len(), 1);
    }
}

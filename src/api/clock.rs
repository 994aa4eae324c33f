use crate::api::store;
use crate::auth::auth::AuthUser;
use crate::model::status::WorkStatus;
use crate::timesheet::rules::{ClockAction, ClockOutcome, check_clock_action};
use crate::timesheet::time::fmt_display;
use actix_web::{HttpResponse, Responder, web};
use chrono::{Local, NaiveTime, Timelike};
use serde::Serialize;
use sqlx::MySqlPool;
use utoipa::ToSchema;

fn db_error(e: sqlx::Error) -> actix_web::Error {
    tracing::error!(error = %e, "Database error");
    actix_web::error::ErrorInternalServerError("Internal Server Error")
}

fn now_time() -> NaiveTime {
    let now = Local::now().time();
    now.with_nanosecond(0).unwrap_or(now)
}

#[derive(Serialize, ToSchema)]
pub struct ClockStatusResponse {
    #[schema(example = "2026-08-29", value_type = String, format = "date")]
    pub date: chrono::NaiveDate,
    #[schema(example = "working")]
    pub status: WorkStatus,
    #[schema(example = "09:00", value_type = Option<String>)]
    pub start_time: Option<String>,
    #[schema(example = "18:00", value_type = Option<String>)]
    pub end_time: Option<String>,
    #[schema(example = 60)]
    pub break_minutes: i64,
    pub note: String,
}

/// Clock-in endpoint
#[utoipa::path(
    post,
    path = "/api/v1/clock/in",
    responses(
        (status = 200, description = "Clocked in successfully", body = Object, example = json!({
            "message": "Clocked in",
            "status": "working"
        })),
        (status = 400, description = "Already clocked in today", body = Object, example = json!({
            "message": "Already clocked in today"
        })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 500, description = "Internal server error")
    ),
    security(("bearer_auth" = [])),
    tag = "Clock"
)]
pub async fn clock_in(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
) -> actix_web::Result<impl Responder> {
    let employee_id = auth.require_employee_id()?;
    let today = Local::now().date_naive();
    let now = now_time();

    let mut tx = pool.begin().await.map_err(db_error)?;

    let day = store::lock_day(&mut tx, employee_id, today)
        .await
        .map_err(db_error)?;

    let shift = match &day {
        Some(day) => store::shift_times(&mut tx, day.id).await.map_err(db_error)?,
        None => None,
    };
    let start = shift.as_ref().and_then(|s| s.start_time);
    let end = shift.as_ref().and_then(|s| s.end_time);

    if let Err(denied) = check_clock_action(ClockAction::ClockIn, start, end, false) {
        return Ok(HttpResponse::BadRequest().json(serde_json::json!({
            "message": denied.to_string()
        })));
    }

    let day_id = match day {
        Some(day) => {
            store::set_day_status(&mut tx, day.id, WorkStatus::Working)
                .await
                .map_err(db_error)?;
            day.id
        }
        None => store::insert_day(&mut tx, employee_id, today, WorkStatus::Working)
            .await
            .map_err(db_error)?,
    };

    store::upsert_shift(&mut tx, day_id, Some(now), end)
        .await
        .map_err(db_error)?;

    tx.commit().await.map_err(db_error)?;

    tracing::info!(employee_id, %today, "Clocked in");

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Clocked in",
        "status": WorkStatus::Working
    })))
}

/// Clock-out endpoint. Auto-closes an open break, then recomputes the day's
/// totals within the same transaction.
#[utoipa::path(
    post,
    path = "/api/v1/clock/out",
    responses(
        (status = 200, description = "Clocked out successfully", body = Object, example = json!({
            "message": "Clocked out",
            "status": "after_work",
            "break_minutes": 60,
            "worked_minutes": 480
        })),
        (status = 400, description = "Not clocked in yet", body = Object, example = json!({
            "message": "Not clocked in yet"
        })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 500, description = "Internal server error")
    ),
    security(("bearer_auth" = [])),
    tag = "Clock"
)]
pub async fn clock_out(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
) -> actix_web::Result<impl Responder> {
    let employee_id = auth.require_employee_id()?;
    let today = Local::now().date_naive();
    let now = now_time();

    let mut tx = pool.begin().await.map_err(db_error)?;

    let day = store::lock_day(&mut tx, employee_id, today)
        .await
        .map_err(db_error)?;

    let shift = match &day {
        Some(day) => store::shift_times(&mut tx, day.id).await.map_err(db_error)?,
        None => None,
    };
    let start = shift.as_ref().and_then(|s| s.start_time);
    let end = shift.as_ref().and_then(|s| s.end_time);

    if let Err(denied) = check_clock_action(ClockAction::ClockOut, start, end, false) {
        return Ok(HttpResponse::BadRequest().json(serde_json::json!({
            "message": denied.to_string()
        })));
    }

    // the check above guarantees the day exists once start is present
    let day_id = match &day {
        Some(day) => day.id,
        None => {
            return Ok(HttpResponse::BadRequest().json(serde_json::json!({
                "message": "Not clocked in yet"
            })));
        }
    };

    // a break still open at clock-out closes at the clock-out time
    if let Some(open) = store::lock_open_break(&mut tx, day_id).await.map_err(db_error)? {
        store::close_break(&mut tx, open.id, open.start_time, now)
            .await
            .map_err(db_error)?;
    }

    store::set_shift_end(&mut tx, day_id, now)
        .await
        .map_err(db_error)?;

    let totals = store::recompute_totals(&mut tx, day_id)
        .await
        .map_err(db_error)?;

    store::set_day_status(&mut tx, day_id, WorkStatus::AfterWork)
        .await
        .map_err(db_error)?;

    tx.commit().await.map_err(db_error)?;

    tracing::info!(
        employee_id,
        %today,
        worked_minutes = totals.worked_minutes,
        "Clocked out"
    );

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Clocked out",
        "status": WorkStatus::AfterWork,
        "break_minutes": totals.break_minutes,
        "worked_minutes": totals.worked_minutes
    })))
}

/// Break-in endpoint. Opening a break twice is an idempotent no-op.
#[utoipa::path(
    post,
    path = "/api/v1/clock/break-in",
    responses(
        (status = 200, description = "Break opened (or already open)", body = Object, example = json!({
            "message": "Break started",
            "status": "on_break"
        })),
        (status = 400, description = "Not clocked in or shift already finished"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 500, description = "Internal server error")
    ),
    security(("bearer_auth" = [])),
    tag = "Clock"
)]
pub async fn break_in(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
) -> actix_web::Result<impl Responder> {
    let employee_id = auth.require_employee_id()?;
    let today = Local::now().date_naive();
    let now = now_time();

    let mut tx = pool.begin().await.map_err(db_error)?;

    let day = store::lock_day(&mut tx, employee_id, today)
        .await
        .map_err(db_error)?;

    let (day_id, shift) = match &day {
        Some(day) => (
            day.id,
            store::shift_times(&mut tx, day.id).await.map_err(db_error)?,
        ),
        None => {
            return Ok(HttpResponse::BadRequest().json(serde_json::json!({
                "message": "Not clocked in yet"
            })));
        }
    };
    let start = shift.as_ref().and_then(|s| s.start_time);
    let end = shift.as_ref().and_then(|s| s.end_time);

    let open = store::lock_open_break(&mut tx, day_id).await.map_err(db_error)?;

    match check_clock_action(ClockAction::BreakIn, start, end, open.is_some()) {
        Err(denied) => Ok(HttpResponse::BadRequest().json(serde_json::json!({
            "message": denied.to_string()
        }))),
        Ok(ClockOutcome::NoOp) => {
            tx.commit().await.map_err(db_error)?;
            Ok(HttpResponse::Ok().json(serde_json::json!({
                "message": "Break already open",
                "status": WorkStatus::OnBreak
            })))
        }
        Ok(ClockOutcome::Proceed) => {
            let break_no = store::next_break_no(&mut tx, day_id).await.map_err(db_error)?;
            store::insert_break(&mut tx, day_id, break_no, Some(now), None)
                .await
                .map_err(db_error)?;
            store::set_day_status(&mut tx, day_id, WorkStatus::OnBreak)
                .await
                .map_err(db_error)?;
            tx.commit().await.map_err(db_error)?;

            tracing::info!(employee_id, %today, break_no, "Break started");

            Ok(HttpResponse::Ok().json(serde_json::json!({
                "message": "Break started",
                "status": WorkStatus::OnBreak
            })))
        }
    }
}

/// Break-out endpoint. With no open break this is a no-op that resets the
/// status to working without touching stored minutes.
#[utoipa::path(
    post,
    path = "/api/v1/clock/break-out",
    responses(
        (status = 200, description = "Break closed (or nothing to close)", body = Object, example = json!({
            "message": "Break ended",
            "status": "working"
        })),
        (status = 400, description = "Not clocked in or shift already finished"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 500, description = "Internal server error")
    ),
    security(("bearer_auth" = [])),
    tag = "Clock"
)]
pub async fn break_out(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
) -> actix_web::Result<impl Responder> {
    let employee_id = auth.require_employee_id()?;
    let today = Local::now().date_naive();
    let now = now_time();

    let mut tx = pool.begin().await.map_err(db_error)?;

    let day = store::lock_day(&mut tx, employee_id, today)
        .await
        .map_err(db_error)?;

    let (day_id, shift) = match &day {
        Some(day) => (
            day.id,
            store::shift_times(&mut tx, day.id).await.map_err(db_error)?,
        ),
        None => {
            return Ok(HttpResponse::BadRequest().json(serde_json::json!({
                "message": "Not clocked in yet"
            })));
        }
    };
    let start = shift.as_ref().and_then(|s| s.start_time);
    let end = shift.as_ref().and_then(|s| s.end_time);

    let open = store::lock_open_break(&mut tx, day_id).await.map_err(db_error)?;

    match check_clock_action(ClockAction::BreakOut, start, end, open.is_some()) {
        Err(denied) => Ok(HttpResponse::BadRequest().json(serde_json::json!({
            "message": denied.to_string()
        }))),
        Ok(ClockOutcome::NoOp) => {
            store::set_day_status(&mut tx, day_id, WorkStatus::Working)
                .await
                .map_err(db_error)?;
            tx.commit().await.map_err(db_error)?;
            Ok(HttpResponse::Ok().json(serde_json::json!({
                "message": "No open break",
                "status": WorkStatus::Working
            })))
        }
        Ok(ClockOutcome::Proceed) => {
            let Some(open) = open else {
                // Proceed is only returned with an open break present
                return Err(actix_web::error::ErrorInternalServerError(
                    "Internal Server Error",
                ));
            };
            store::close_break(&mut tx, open.id, open.start_time, now)
                .await
                .map_err(db_error)?;
            store::set_day_status(&mut tx, day_id, WorkStatus::Working)
                .await
                .map_err(db_error)?;
            tx.commit().await.map_err(db_error)?;

            tracing::info!(employee_id, %today, "Break ended");

            Ok(HttpResponse::Ok().json(serde_json::json!({
                "message": "Break ended",
                "status": WorkStatus::Working
            })))
        }
    }
}

/// Today's resolved status and times for the caller
#[utoipa::path(
    get,
    path = "/api/v1/clock/status",
    responses(
        (status = 200, description = "Current day state", body = ClockStatusResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 500, description = "Internal server error")
    ),
    security(("bearer_auth" = [])),
    tag = "Clock"
)]
pub async fn clock_status(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
) -> actix_web::Result<impl Responder> {
    let employee_id = auth.require_employee_id()?;
    let today = Local::now().date_naive();

    let mut tx = pool.begin().await.map_err(db_error)?;

    let day = store::find_day(&mut tx, employee_id, today)
        .await
        .map_err(db_error)?;

    let response = match &day {
        None => ClockStatusResponse {
            date: today,
            status: WorkStatus::BeforeWork,
            start_time: None,
            end_time: None,
            break_minutes: 0,
            note: String::new(),
        },
        Some(day) => {
            let shift = store::shift_times(&mut tx, day.id).await.map_err(db_error)?;
            let start = shift.as_ref().and_then(|s| s.start_time);
            let end = shift.as_ref().and_then(|s| s.end_time);
            let break_minutes: i64 = store::break_minute_list(&mut tx, day.id)
                .await
                .map_err(db_error)?
                .into_iter()
                .sum();

            ClockStatusResponse {
                date: today,
                status: WorkStatus::resolve(day.status_hint(), start, end),
                start_time: start.map(fmt_display),
                end_time: end.map(fmt_display),
                break_minutes,
                note: day.note.clone(),
            }
        }
    };

    tx.commit().await.map_err(db_error)?;

    Ok(HttpResponse::Ok().json(response))
}

use crate::api::attendance::{BreakFieldReq, parse_and_validate};
use crate::api::store;
use crate::auth::auth::AuthUser;
use crate::model::correction::{CorrectionStatus, ProposedBreak};
use actix_web::{HttpResponse, Responder, web};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::MySqlPool;
use std::str::FromStr;
use utoipa::{IntoParams, ToSchema};

fn db_error(e: sqlx::Error) -> actix_web::Error {
    tracing::error!(error = %e, "Database error");
    actix_web::error::ErrorInternalServerError("Internal Server Error")
}

#[derive(Deserialize, ToSchema)]
pub struct CreateCorrection {
    #[schema(example = "2026-08-03", value_type = String, format = "date")]
    pub date: NaiveDate,
    #[schema(example = "09:00", value_type = Option<String>)]
    pub start_time: Option<String>,
    #[schema(example = "18:00", value_type = Option<String>)]
    pub end_time: Option<String>,
    /// Proposed break list, full snapshot
    #[serde(default)]
    pub breaks: Vec<BreakFieldReq>,
    #[schema(example = "Customer visit ran late")]
    pub note: String,
    #[schema(example = "Forgot to clock out on site")]
    #[serde(default)]
    pub reason: String,
}

#[derive(sqlx::FromRow)]
struct CorrectionRow {
    id: u64,
    attendance_day_id: u64,
    employee_id: u64,
    work_date: NaiveDate,
    proposed_start: Option<NaiveTime>,
    proposed_end: Option<NaiveTime>,
    proposed_breaks: String,
    proposed_note: String,
    reason: String,
    status: String,
    created_at: Option<DateTime<Utc>>,
}

#[derive(Serialize, ToSchema)]
pub struct CorrectionResponse {
    pub id: u64,
    pub attendance_day_id: u64,
    pub employee_id: u64,
    #[schema(example = "2026-08-03", value_type = String, format = "date")]
    pub work_date: NaiveDate,
    #[schema(value_type = Option<String>)]
    pub proposed_start: Option<NaiveTime>,
    #[schema(value_type = Option<String>)]
    pub proposed_end: Option<NaiveTime>,
    pub proposed_breaks: Vec<ProposedBreak>,
    pub proposed_note: String,
    pub reason: String,
    #[schema(example = "pending")]
    pub status: String,
    #[schema(example = "2026-08-04T09:12:00Z", value_type = Option<String>, format = "date-time")]
    pub created_at: Option<DateTime<Utc>>,
}

impl From<CorrectionRow> for CorrectionResponse {
    fn from(row: CorrectionRow) -> Self {
        CorrectionResponse {
            id: row.id,
            attendance_day_id: row.attendance_day_id,
            employee_id: row.employee_id,
            work_date: row.work_date,
            proposed_start: row.proposed_start,
            proposed_end: row.proposed_end,
            proposed_breaks: serde_json::from_str(&row.proposed_breaks).unwrap_or_default(),
            proposed_note: row.proposed_note,
            reason: row.reason,
            status: row.status,
            created_at: row.created_at,
        }
    }
}

/* =========================
Submit correction request
========================= */
#[utoipa::path(
    post,
    path = "/api/v1/corrections",
    request_body(
        content = CreateCorrection,
        description = "Full proposed snapshot for one attendance day",
        content_type = "application/json"
    ),
    responses(
        (status = 200, description = "Correction request submitted", body = Object, example = json!({
            "message": "Correction request submitted",
            "status": "pending"
        })),
        (status = 404, description = "No attendance record for that date"),
        (status = 409, description = "Day locked by a pending correction request", body = Object, example = json!({
            "message": "Day is locked by a pending correction request"
        })),
        (status = 422, description = "Validation errors"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Correction"
)]
pub async fn create_correction(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<CreateCorrection>,
) -> actix_web::Result<impl Responder> {
    let employee_id = auth.require_employee_id()?;

    let parsed = match parse_and_validate(
        payload.start_time.as_deref(),
        payload.end_time.as_deref(),
        &payload.breaks,
        &payload.note,
    ) {
        Ok(p) => p,
        Err(errors) => return Ok(HttpResponse::UnprocessableEntity().json(errors)),
    };

    let mut tx = pool.begin().await.map_err(db_error)?;

    // the day row lock serializes concurrent submissions against the same day
    let day = match store::lock_day(&mut tx, employee_id, payload.date)
        .await
        .map_err(db_error)?
    {
        Some(day) => day,
        None => {
            return Ok(HttpResponse::NotFound().json(serde_json::json!({
                "message": "No attendance record for that date"
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

    let proposed_breaks: Vec<ProposedBreak> = parsed
        .breaks
        .iter()
        .map(|b| ProposedBreak {
            start_time: b.start,
            end_time: b.end,
        })
        .collect();
    let proposed_breaks_json = serde_json::to_string(&proposed_breaks)
        .map_err(actix_web::error::ErrorInternalServerError)?;

    sqlx::query(
        r#"
        INSERT INTO correction_requests
            (attendance_day_id, employee_id, work_date,
             proposed_start, proposed_end, proposed_breaks, proposed_note, reason, status)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, 'pending')
        "#,
    )
    .bind(day.id)
    .bind(employee_id)
    .bind(payload.date)
    .bind(parsed.start)
    .bind(parsed.end)
    .bind(&proposed_breaks_json)
    .bind(payload.note.trim())
    .bind(payload.reason.trim())
    .execute(&mut *tx)
    .await
    .map_err(db_error)?;

    tx.commit().await.map_err(db_error)?;

    tracing::info!(employee_id, date = %payload.date, "Correction request submitted");

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Correction request submitted",
        "status": CorrectionStatus::Pending
    })))
}

/* =========================
List correction requests (admin)
========================= */
#[derive(Deserialize, IntoParams, ToSchema)]
pub struct CorrectionFilter {
    /// Filter by employee ID
    #[schema(example = 1001)]
    pub employee_id: Option<u64>,
    /// Filter by request status
    #[schema(example = "pending")]
    pub status: Option<String>,
    /// Pagination page number (starts at 1)
    pub page: Option<u64>,
    /// Items per page
    pub per_page: Option<u64>,
}

#[derive(Serialize, ToSchema)]
pub struct CorrectionListResponse {
    pub data: Vec<CorrectionResponse>,
    pub page: u32,
    pub per_page: u32,
    pub total: i64,
}

// Helper enum for typed SQLx binding
enum FilterValue<'a> {
    U64(u64),
    Str(&'a str),
}

#[utoipa::path(
    get,
    path = "/api/v1/corrections",
    params(CorrectionFilter),
    responses(
        (status = 200, description = "Paginated correction request list", body = CorrectionListResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Correction"
)]
pub async fn correction_list(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<CorrectionFilter>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let per_page = query.per_page.unwrap_or(10).min(100);
    let page = query.page.unwrap_or(1).max(1);
    let offset = (page - 1) * per_page;

    let mut where_sql = String::from(" WHERE 1=1");
    let mut args: Vec<FilterValue> = Vec::new();

    if let Some(emp_id) = query.employee_id {
        where_sql.push_str(" AND employee_id = ?");
        args.push(FilterValue::U64(emp_id));
    }

    if let Some(status) = query.status.as_deref() {
        where_sql.push_str(" AND status = ?");
        args.push(FilterValue::Str(status));
    }

    let count_sql = format!("SELECT COUNT(*) FROM correction_requests{}", where_sql);

    let mut count_q = sqlx::query_scalar::<_, i64>(&count_sql);
    for arg in &args {
        count_q = match arg {
            FilterValue::U64(v) => count_q.bind(*v),
            FilterValue::Str(s) => count_q.bind(*s),
        };
    }

    let total = count_q.fetch_one(pool.get_ref()).await.map_err(|e| {
        tracing::error!(error = %e, "Failed to count correction requests");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    let data_sql = format!(
        r#"
        SELECT id, attendance_day_id, employee_id, work_date,
               proposed_start, proposed_end, proposed_breaks, proposed_note,
               reason, status, created_at
        FROM correction_requests
        {}
        ORDER BY created_at DESC, id DESC
        LIMIT ? OFFSET ?
        "#,
        where_sql
    );

    let mut data_q = sqlx::query_as::<_, CorrectionRow>(&data_sql);
    for arg in args {
        data_q = match arg {
            FilterValue::U64(v) => data_q.bind(v),
            FilterValue::Str(s) => data_q.bind(s),
        };
    }

    let rows = data_q
        .bind(per_page)
        .bind(offset)
        .fetch_all(pool.get_ref())
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to fetch correction list");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

    let response = CorrectionListResponse {
        data: rows.into_iter().map(Into::into).collect(),
        page: page as u32,
        per_page: per_page as u32,
        total,
    };

    Ok(HttpResponse::Ok().json(response))
}

/* =========================
Get one correction request
========================= */
#[utoipa::path(
    get,
    path = "/api/v1/corrections/{correction_id}",
    params(("correction_id" = u64, Path, description = "Correction request ID")),
    responses(
        (status = 200, description = "Correction request found", body = CorrectionResponse),
        (status = 404, description = "Correction request not found"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Correction"
)]
pub async fn get_correction(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let correction_id = path.into_inner();

    let row = sqlx::query_as::<_, CorrectionRow>(
        r#"
        SELECT id, attendance_day_id, employee_id, work_date,
               proposed_start, proposed_end, proposed_breaks, proposed_note,
               reason, status, created_at
        FROM correction_requests
        WHERE id = ?
        "#,
    )
    .bind(correction_id)
    .fetch_optional(pool.get_ref())
    .await
    .map_err(db_error)?;

    match row {
        Some(row) => {
            // owners see their own requests, admins see all
            if !auth.is_admin() && auth.employee_id != Some(row.employee_id) {
                return Err(actix_web::error::ErrorForbidden("Not your request"));
            }
            Ok(HttpResponse::Ok().json(CorrectionResponse::from(row)))
        }
        None => Ok(HttpResponse::NotFound().json(serde_json::json!({
            "message": "Correction request not found"
        }))),
    }
}

/// Resolves a request to approved/rejected. Re-resolving an already-resolved
/// request is an informational no-op, never an error.
async fn resolve_correction(
    pool: &MySqlPool,
    correction_id: u64,
    target: CorrectionStatus,
) -> actix_web::Result<HttpResponse> {
    let mut tx = pool.begin().await.map_err(db_error)?;

    let head = sqlx::query_as::<_, (u64, String)>(
        "SELECT attendance_day_id, status FROM correction_requests WHERE id = ?",
    )
    .bind(correction_id)
    .fetch_optional(&mut *tx)
    .await
    .map_err(db_error)?;

    let Some((day_id, _)) = head else {
        return Ok(HttpResponse::NotFound().json(serde_json::json!({
            "message": "Correction request not found"
        })));
    };

    // day first, then the request row, same order as every other writer
    store::lock_day_by_id(&mut tx, day_id).await.map_err(db_error)?;

    let status: Option<String> = sqlx::query_scalar(
        "SELECT status FROM correction_requests WHERE id = ? FOR UPDATE",
    )
    .bind(correction_id)
    .fetch_optional(&mut *tx)
    .await
    .map_err(db_error)?;

    let current = status
        .as_deref()
        .and_then(|s| CorrectionStatus::from_str(s).ok());

    if current != Some(CorrectionStatus::Pending) {
        tx.commit().await.map_err(db_error)?;
        return Ok(HttpResponse::Ok().json(serde_json::json!({
            "message": "Correction request already resolved",
            "status": current
        })));
    }

    sqlx::query("UPDATE correction_requests SET status = ? WHERE id = ?")
        .bind(target.to_string())
        .bind(correction_id)
        .execute(&mut *tx)
        .await
        .map_err(db_error)?;

    // TODO: decide whether approval should apply the request's proposed
    // snapshot to the stored times; today it only recomputes totals from the
    // currently stored shift/break rows and unlocks the day.
    let totals = if target == CorrectionStatus::Approved {
        Some(store::recompute_totals(&mut tx, day_id).await.map_err(db_error)?)
    } else {
        None
    };

    tx.commit().await.map_err(db_error)?;

    tracing::info!(correction_id, day_id, status = %target, "Correction request resolved");

    let mut body = serde_json::json!({
        "message": format!("Correction request {}", target),
        "status": target
    });
    if let Some(t) = totals {
        body["break_minutes"] = t.break_minutes.into();
        body["worked_minutes"] = t.worked_minutes.into();
    }

    Ok(HttpResponse::Ok().json(body))
}

/* =========================
Approve (admin)
========================= */
#[utoipa::path(
    put,
    path = "/api/v1/corrections/{correction_id}/approve",
    params(("correction_id" = u64, Path, description = "Correction request ID")),
    responses(
        (status = 200, description = "Approved, or already resolved", body = Object, example = json!({
            "message": "Correction request approved",
            "status": "approved"
        })),
        (status = 404, description = "Correction request not found"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Correction"
)]
pub async fn approve_correction(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;
    resolve_correction(pool.get_ref(), path.into_inner(), CorrectionStatus::Approved).await
}

/* =========================
Reject (admin)
========================= */
#[utoipa::path(
    put,
    path = "/api/v1/corrections/{correction_id}/reject",
    params(("correction_id" = u64, Path, description = "Correction request ID")),
    responses(
        (status = 200, description = "Rejected, or already resolved", body = Object, example = json!({
            "message": "Correction request rejected",
            "status": "rejected"
        })),
        (status = 404, description = "Correction request not found"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Correction"
)]
pub async fn reject_correction(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;
    resolve_correction(pool.get_ref(), path.into_inner(), CorrectionStatus::Rejected).await
}

//! Row-lock aware persistence helpers for attendance days and their
//! children. Every mutator runs inside a caller-owned transaction that holds
//! the day row lock, so clock idempotence holds under concurrent duplicate
//! requests and a reader never observes partially-updated totals.

use crate::model::correction::CorrectionStatus;
use crate::model::status::WorkStatus;
use crate::timesheet::totals::{self, DayTotals};
use chrono::{NaiveDate, NaiveTime};
use sqlx::{MySql, Transaction};
use std::str::FromStr;

#[derive(Debug, sqlx::FromRow)]
pub struct DayRow {
    pub id: u64,
    pub employee_id: u64,
    pub work_date: NaiveDate,
    pub note: String,
    pub status: String,
}

impl DayRow {
    pub fn status_hint(&self) -> Option<WorkStatus> {
        WorkStatus::from_str(&self.status).ok()
    }
}

#[derive(Debug, sqlx::FromRow)]
pub struct ShiftRow {
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
}

#[derive(Debug, sqlx::FromRow)]
pub struct OpenBreakRow {
    pub id: u64,
    pub start_time: Option<NaiveTime>,
}

/// Locks and returns the caller's day row for the given date.
pub async fn lock_day(
    tx: &mut Transaction<'_, MySql>,
    employee_id: u64,
    date: NaiveDate,
) -> Result<Option<DayRow>, sqlx::Error> {
    sqlx::query_as::<_, DayRow>(
        r#"
        SELECT id, employee_id, work_date, note, status
        FROM attendance_days
        WHERE employee_id = ? AND work_date = ?
        FOR UPDATE
        "#,
    )
    .bind(employee_id)
    .bind(date)
    .fetch_optional(&mut **tx)
    .await
}

/// Read-only lookup, no row lock.
pub async fn find_day(
    tx: &mut Transaction<'_, MySql>,
    employee_id: u64,
    date: NaiveDate,
) -> Result<Option<DayRow>, sqlx::Error> {
    sqlx::query_as::<_, DayRow>(
        r#"
        SELECT id, employee_id, work_date, note, status
        FROM attendance_days
        WHERE employee_id = ? AND work_date = ?
        "#,
    )
    .bind(employee_id)
    .bind(date)
    .fetch_optional(&mut **tx)
    .await
}

pub async fn lock_day_by_id(
    tx: &mut Transaction<'_, MySql>,
    day_id: u64,
) -> Result<Option<DayRow>, sqlx::Error> {
    sqlx::query_as::<_, DayRow>(
        r#"
        SELECT id, employee_id, work_date, note, status
        FROM attendance_days
        WHERE id = ?
        FOR UPDATE
        "#,
    )
    .bind(day_id)
    .fetch_optional(&mut **tx)
    .await
}

pub async fn insert_day(
    tx: &mut Transaction<'_, MySql>,
    employee_id: u64,
    date: NaiveDate,
    status: WorkStatus,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        "INSERT INTO attendance_days (employee_id, work_date, note, status) VALUES (?, ?, '', ?)",
    )
    .bind(employee_id)
    .bind(date)
    .bind(status.to_string())
    .execute(&mut **tx)
    .await?;

    Ok(result.last_insert_id())
}

pub async fn set_day_status(
    tx: &mut Transaction<'_, MySql>,
    day_id: u64,
    status: WorkStatus,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE attendance_days SET status = ? WHERE id = ?")
        .bind(status.to_string())
        .bind(day_id)
        .execute(&mut **tx)
        .await?;
    Ok(())
}

pub async fn set_day_note(
    tx: &mut Transaction<'_, MySql>,
    day_id: u64,
    note: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE attendance_days SET note = ? WHERE id = ?")
        .bind(note)
        .bind(day_id)
        .execute(&mut **tx)
        .await?;
    Ok(())
}

pub async fn shift_times(
    tx: &mut Transaction<'_, MySql>,
    day_id: u64,
) -> Result<Option<ShiftRow>, sqlx::Error> {
    sqlx::query_as::<_, ShiftRow>(
        "SELECT start_time, end_time FROM shift_times WHERE attendance_day_id = ?",
    )
    .bind(day_id)
    .fetch_optional(&mut **tx)
    .await
}

/// Creates or overwrites the day's single shift row.
pub async fn upsert_shift(
    tx: &mut Transaction<'_, MySql>,
    day_id: u64,
    start: Option<NaiveTime>,
    end: Option<NaiveTime>,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO shift_times (attendance_day_id, start_time, end_time)
        VALUES (?, ?, ?)
        ON DUPLICATE KEY UPDATE start_time = VALUES(start_time), end_time = VALUES(end_time)
        "#,
    )
    .bind(day_id)
    .bind(start)
    .bind(end)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

pub async fn set_shift_end(
    tx: &mut Transaction<'_, MySql>,
    day_id: u64,
    end: NaiveTime,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE shift_times SET end_time = ? WHERE attendance_day_id = ?")
        .bind(end)
        .bind(day_id)
        .execute(&mut **tx)
        .await?;
    Ok(())
}

/// The day's open break (start set, end NULL), locked. At most one exists.
pub async fn lock_open_break(
    tx: &mut Transaction<'_, MySql>,
    day_id: u64,
) -> Result<Option<OpenBreakRow>, sqlx::Error> {
    sqlx::query_as::<_, OpenBreakRow>(
        r#"
        SELECT id, start_time
        FROM break_intervals
        WHERE attendance_day_id = ? AND start_time IS NOT NULL AND end_time IS NULL
        ORDER BY break_no DESC
        LIMIT 1
        FOR UPDATE
        "#,
    )
    .bind(day_id)
    .fetch_optional(&mut **tx)
    .await
}

pub async fn next_break_no(
    tx: &mut Transaction<'_, MySql>,
    day_id: u64,
) -> Result<u32, sqlx::Error> {
    let max: Option<u32> = sqlx::query_scalar(
        "SELECT MAX(break_no) FROM break_intervals WHERE attendance_day_id = ?",
    )
    .bind(day_id)
    .fetch_one(&mut **tx)
    .await?;

    Ok(max.unwrap_or(0) + 1)
}

pub async fn insert_break(
    tx: &mut Transaction<'_, MySql>,
    day_id: u64,
    break_no: u32,
    start: Option<NaiveTime>,
    end: Option<NaiveTime>,
) -> Result<(), sqlx::Error> {
    let minutes = totals::break_minutes(start, end);
    sqlx::query(
        r#"
        INSERT INTO break_intervals (attendance_day_id, break_no, start_time, end_time, minutes)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(day_id)
    .bind(break_no)
    .bind(start)
    .bind(end)
    .bind(minutes)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

pub async fn close_break(
    tx: &mut Transaction<'_, MySql>,
    break_id: u64,
    start: Option<NaiveTime>,
    end: NaiveTime,
) -> Result<(), sqlx::Error> {
    let minutes = totals::break_minutes(start, Some(end));
    sqlx::query("UPDATE break_intervals SET end_time = ?, minutes = ? WHERE id = ?")
        .bind(end)
        .bind(minutes)
        .bind(break_id)
        .execute(&mut **tx)
        .await?;
    Ok(())
}

pub async fn delete_breaks(
    tx: &mut Transaction<'_, MySql>,
    day_id: u64,
) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM break_intervals WHERE attendance_day_id = ?")
        .bind(day_id)
        .execute(&mut **tx)
        .await?;
    Ok(())
}

pub async fn break_minute_list(
    tx: &mut Transaction<'_, MySql>,
    day_id: u64,
) -> Result<Vec<i64>, sqlx::Error> {
    let rows: Vec<(i64,)> = sqlx::query_as(
        "SELECT minutes FROM break_intervals WHERE attendance_day_id = ? ORDER BY break_no",
    )
    .bind(day_id)
    .fetch_all(&mut **tx)
    .await?;

    Ok(rows.into_iter().map(|(m,)| m).collect())
}

/// Recomputes the day's totals from the current stored shift and break rows
/// and upserts the daily_totals row. Must run inside the locking transaction.
pub async fn recompute_totals(
    tx: &mut Transaction<'_, MySql>,
    day_id: u64,
) -> Result<DayTotals, sqlx::Error> {
    let shift = shift_times(tx, day_id).await?;
    let (start, end) = shift.map(|s| (s.start_time, s.end_time)).unwrap_or((None, None));
    let breaks = break_minute_list(tx, day_id).await?;

    let day_totals = totals::compute_day_totals(start, end, breaks);

    sqlx::query(
        r#"
        INSERT INTO daily_totals (attendance_day_id, break_minutes, worked_minutes)
        VALUES (?, ?, ?)
        ON DUPLICATE KEY UPDATE
            break_minutes = VALUES(break_minutes),
            worked_minutes = VALUES(worked_minutes)
        "#,
    )
    .bind(day_id)
    .bind(day_totals.break_minutes)
    .bind(day_totals.worked_minutes)
    .execute(&mut **tx)
    .await?;

    Ok(day_totals)
}

/// Status of the day's most-recently-submitted correction request; this and
/// only this governs the pending-lock.
pub async fn latest_request_status(
    tx: &mut Transaction<'_, MySql>,
    day_id: u64,
) -> Result<Option<CorrectionStatus>, sqlx::Error> {
    let status: Option<String> = sqlx::query_scalar(
        r#"
        SELECT status
        FROM correction_requests
        WHERE attendance_day_id = ?
        ORDER BY created_at DESC, id DESC
        LIMIT 1
        "#,
    )
    .bind(day_id)
    .fetch_optional(&mut **tx)
    .await?;

    Ok(status.and_then(|s| CorrectionStatus::from_str(&s).ok()))
}

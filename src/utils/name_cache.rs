use anyhow::Result;
use futures_util::StreamExt;
use moka::future::Cache;
use once_cell::sync::Lazy;
use sqlx::MySqlPool;
use std::time::Duration;

/// employee_id -> display name, used by the admin views and the CSV report
/// so per-row rendering does not hit the employees table.
static NAME_CACHE: Lazy<Cache<u64, String>> = Lazy::new(|| {
    Cache::builder()
        .max_capacity(100_000)
        .time_to_live(Duration::from_secs(3600)) // names change rarely
        .build()
});

fn join_name(first: &str, last: Option<&str>) -> String {
    match last {
        Some(last) if !last.is_empty() => format!("{first} {last}"),
        _ => first.to_string(),
    }
}

/// Cached display name for one employee, loading from the DB on a miss.
/// Falls back to "employee #<id>" if the record is gone.
pub async fn display_name(pool: &MySqlPool, employee_id: u64) -> String {
    if let Some(name) = NAME_CACHE.get(&employee_id).await {
        return name;
    }

    let row = sqlx::query_as::<_, (String, Option<String>)>(
        "SELECT first_name, last_name FROM employees WHERE id = ?",
    )
    .bind(employee_id)
    .fetch_optional(pool)
    .await
    .ok()
    .flatten();

    let name = match row {
        Some((first, last)) => join_name(&first, last.as_deref()),
        None => format!("employee #{employee_id}"),
    };

    NAME_CACHE.insert(employee_id, name.clone()).await;
    name
}

/// Load active employees into the cache at startup, streamed in batches
pub async fn warmup_name_cache(pool: &MySqlPool, batch_size: usize) -> Result<()> {
    let mut stream = sqlx::query_as::<_, (u64, String, Option<String>)>(
        "SELECT id, first_name, last_name FROM employees WHERE status = 'active'",
    )
    .fetch(pool);

    let mut batch = Vec::with_capacity(batch_size);
    let mut total = 0usize;

    while let Some(row) = stream.next().await {
        let (id, first, last) = row?;
        batch.push((id, join_name(&first, last.as_deref())));
        total += 1;

        if batch.len() >= batch_size {
            insert_batch(&batch).await;
            batch.clear();
        }
    }

    if !batch.is_empty() {
        insert_batch(&batch).await;
    }

    tracing::info!(total, "Employee name cache warmup complete");
    Ok(())
}

async fn insert_batch(entries: &[(u64, String)]) {
    let futures: Vec<_> = entries
        .iter()
        .map(|(id, name)| NAME_CACHE.insert(*id, name.clone()))
        .collect();

    futures::future::join_all(futures).await;
}

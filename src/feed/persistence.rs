use crate::error::AppError;
use crate::feed::types::{now_unix_ms, Product, PurchaseRequest};
use crate::geo::{Location, Region};
use serde::Serialize;
use sqlx::{Row, SqlitePool};

/// One journaled purchase. `order_id` is the server-assigned id, present
/// only when the write endpoint acknowledged the order.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseRecord {
    pub id: i64,
    pub order_id: Option<String>,
    pub product: Product,
    pub location: Location,
    pub timestamp: String,
    pub submitted: bool,
    pub created_at_ms: i64,
}

fn bool_to_sqlite(value: bool) -> i64 {
    if value {
        1
    } else {
        0
    }
}

fn sqlite_to_bool(value: i64) -> bool {
    value != 0
}

fn map_purchase_row(row: &sqlx::sqlite::SqliteRow) -> Result<PurchaseRecord, AppError> {
    let product_raw: String = row.try_get("product")?;
    let region_raw: String = row.try_get("region")?;
    let submitted_raw: i64 = row.try_get("submitted")?;

    Ok(PurchaseRecord {
        id: row.try_get("id")?,
        order_id: row.try_get("order_id")?,
        product: Product::parse_str(&product_raw)?,
        location: Location {
            name: row.try_get("city")?,
            lat: row.try_get("lat")?,
            lng: row.try_get("lng")?,
            region: Region::parse_str(&region_raw)?,
        },
        timestamp: row.try_get("timestamp")?,
        submitted: sqlite_to_bool(submitted_raw),
        created_at_ms: row.try_get("created_at_ms")?,
    })
}

pub async fn record_purchase(
    pool: &SqlitePool,
    request: &PurchaseRequest,
    order_id: Option<&str>,
    submitted: bool,
) -> Result<(), AppError> {
    let created_at_ms = now_unix_ms();

    sqlx::query(
        "INSERT INTO purchase_journal (order_id, product, city, lat, lng, region, timestamp, submitted, created_at_ms) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(order_id)
    .bind(request.product.as_str())
    .bind(&request.location.name)
    .bind(request.location.lat)
    .bind(request.location.lng)
    .bind(request.location.region.as_str())
    .bind(&request.timestamp)
    .bind(bool_to_sqlite(submitted))
    .bind(created_at_ms)
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn recent_purchases(
    pool: &SqlitePool,
    limit: u32,
) -> Result<Vec<PurchaseRecord>, AppError> {
    let rows = sqlx::query(
        "SELECT id, order_id, product, city, lat, lng, region, timestamp, submitted, created_at_ms \
         FROM purchase_journal \
         ORDER BY created_at_ms DESC, id DESC \
         LIMIT ?",
    )
    .bind(i64::from(limit))
    .fetch_all(pool)
    .await?;

    let mut records = Vec::with_capacity(rows.len());
    for row in rows {
        records.push(map_purchase_row(&row)?);
    }

    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::initialize_pool_from_path;
    use std::path::PathBuf;

    fn unique_db_path() -> PathBuf {
        let timestamp = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .expect("system clock should be after unix epoch")
            .as_nanos();

        std::env::temp_dir().join(format!("versus-board-journal-{timestamp}.db"))
    }

    fn sample_request(product: Product) -> PurchaseRequest {
        PurchaseRequest {
            product,
            timestamp: "2024-05-01T12:00:00+00:00".to_string(),
            location: Location {
                name: "Tokyo".to_string(),
                lat: 35.6762,
                lng: 139.6503,
                region: Region::Kanto,
            },
        }
    }

    #[tokio::test]
    async fn journal_round_trips_purchases() {
        let db_path = unique_db_path();
        let pool = initialize_pool_from_path(&db_path)
            .await
            .expect("pool initialization should succeed");

        record_purchase(&pool, &sample_request(Product::Kinoko), Some("order-1"), true)
            .await
            .expect("insert should succeed");
        record_purchase(&pool, &sample_request(Product::Takenoko), None, false)
            .await
            .expect("insert should succeed");

        let records = recent_purchases(&pool, 10)
            .await
            .expect("readback should succeed");

        assert_eq!(records.len(), 2);
        // Most recent first.
        assert_eq!(records[0].product, Product::Takenoko);
        assert!(!records[0].submitted);
        assert_eq!(records[0].order_id, None);
        assert_eq!(records[1].order_id.as_deref(), Some("order-1"));
        assert!(records[1].submitted);
        assert_eq!(records[1].location.region, Region::Kanto);

        drop(pool);
        let _ = std::fs::remove_file(db_path);
    }

    #[tokio::test]
    async fn journal_limit_is_respected() {
        let db_path = unique_db_path();
        let pool = initialize_pool_from_path(&db_path)
            .await
            .expect("pool initialization should succeed");

        for _ in 0..5 {
            record_purchase(&pool, &sample_request(Product::Kinoko), None, true)
                .await
                .expect("insert should succeed");
        }

        let records = recent_purchases(&pool, 3)
            .await
            .expect("readback should succeed");
        assert_eq!(records.len(), 3);

        drop(pool);
        let _ = std::fs::remove_file(db_path);
    }
}

//! Typed query wrappers for catalog items.
//!
//! The database is the sole source of truth for ordering; every reader gets
//! rows by ascending position. Writes that touch more than one row go through
//! a single transaction so a failed batch leaves the last confirmed order
//! intact.

use chrono::Utc;
use uuid::Uuid;

use crate::db::{Antique, CreateAntiqueRequest, DbPool, UpdateAntiqueRequest};

/// List all items by ascending display position.
pub async fn list(pool: &DbPool) -> sqlx::Result<Vec<Antique>> {
    sqlx::query_as("SELECT * FROM antiques ORDER BY position ASC")
        .fetch_all(pool)
        .await
}

pub async fn get(pool: &DbPool, id: &str) -> sqlx::Result<Option<Antique>> {
    sqlx::query_as("SELECT * FROM antiques WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await
}

/// Insert a new item at the end of the display order.
///
/// The position is computed inside the INSERT statement, so two concurrent
/// creators cannot read the same maximum.
pub async fn create(pool: &DbPool, req: &CreateAntiqueRequest) -> sqlx::Result<Antique> {
    let id = Uuid::new_v4().to_string();
    let now = Utc::now().to_rfc3339();

    sqlx::query(
        "INSERT INTO antiques (id, title, description, price, image_url, position, created_at, updated_at) \
         VALUES (?, ?, ?, ?, ?, (SELECT COALESCE(MAX(position), 0) + 1 FROM antiques), ?, ?)",
    )
    .bind(&id)
    .bind(&req.title)
    .bind(&req.description)
    .bind(req.price)
    .bind(&req.image_url)
    .bind(&now)
    .bind(&now)
    .execute(pool)
    .await?;

    sqlx::query_as("SELECT * FROM antiques WHERE id = ?")
        .bind(&id)
        .fetch_one(pool)
        .await
}

/// Partial update; absent fields keep their stored value. An explicit empty
/// `image_url` clears the image (placeholder shown publicly).
pub async fn update(
    pool: &DbPool,
    id: &str,
    req: &UpdateAntiqueRequest,
) -> sqlx::Result<Option<Antique>> {
    let now = Utc::now().to_rfc3339();

    let result = sqlx::query(
        "UPDATE antiques SET \
            title = COALESCE(?, title), \
            description = COALESCE(?, description), \
            price = COALESCE(?, price), \
            image_url = COALESCE(?, image_url), \
            updated_at = ? \
         WHERE id = ?",
    )
    .bind(&req.title)
    .bind(&req.description)
    .bind(req.price)
    .bind(&req.image_url)
    .bind(&now)
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Ok(None);
    }

    get(pool, id).await
}

pub async fn delete(pool: &DbPool, id: &str) -> sqlx::Result<bool> {
    let result = sqlx::query("DELETE FROM antiques WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Persist a full position assignment in one transaction.
///
/// All-or-nothing: if any id no longer exists the transaction rolls back and
/// the previous order stays in place.
pub async fn set_positions(pool: &DbPool, assignments: &[(String, i64)]) -> sqlx::Result<()> {
    let now = Utc::now().to_rfc3339();
    let mut tx = pool.begin().await?;

    for (id, position) in assignments {
        let result = sqlx::query("UPDATE antiques SET position = ?, updated_at = ? WHERE id = ?")
            .bind(position)
            .bind(&now)
            .bind(id)
            .execute(&mut *tx)
            .await?;
        if result.rows_affected() == 0 {
            return Err(sqlx::Error::RowNotFound);
        }
    }

    tx.commit().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_support::memory_pool;

    fn item(title: &str) -> CreateAntiqueRequest {
        CreateAntiqueRequest {
            title: title.to_string(),
            description: None,
            price: 120.0,
            image_url: None,
        }
    }

    #[tokio::test]
    async fn create_appends_at_max_plus_one() {
        let pool = memory_pool().await;

        let a = create(&pool, &item("Commode Louis XV")).await.unwrap();
        let b = create(&pool, &item("Fontaine en pierre")).await.unwrap();
        assert_eq!(a.position, 1);
        assert_eq!(b.position, 2);

        let items = list(&pool).await.unwrap();
        assert_eq!(items[0].id, a.id);
        assert_eq!(items[1].id, b.id);
    }

    #[tokio::test]
    async fn update_is_partial_and_can_clear_image() {
        let pool = memory_pool().await;
        let a = create(&pool, &item("Miroir doré")).await.unwrap();

        let updated = update(
            &pool,
            &a.id,
            &UpdateAntiqueRequest {
                image_url: Some("https://img.example.com/mirror.jpg".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap()
        .unwrap();
        assert_eq!(updated.title, "Miroir doré");
        assert_eq!(
            updated.image_url.as_deref(),
            Some("https://img.example.com/mirror.jpg")
        );

        let cleared = update(
            &pool,
            &a.id,
            &UpdateAntiqueRequest {
                image_url: Some(String::new()),
                ..Default::default()
            },
        )
        .await
        .unwrap()
        .unwrap();
        assert_eq!(cleared.image_url.as_deref(), Some(""));
    }

    #[tokio::test]
    async fn update_unknown_id_is_none() {
        let pool = memory_pool().await;
        let out = update(&pool, "nope", &UpdateAntiqueRequest::default())
            .await
            .unwrap();
        assert!(out.is_none());
    }

    #[tokio::test]
    async fn set_positions_rolls_back_on_unknown_id() {
        let pool = memory_pool().await;
        let a = create(&pool, &item("Vase")).await.unwrap();
        let b = create(&pool, &item("Banc")).await.unwrap();

        let err = set_positions(
            &pool,
            &[
                (a.id.clone(), 2),
                ("missing".to_string(), 1),
                (b.id.clone(), 1),
            ],
        )
        .await;
        assert!(err.is_err());

        // Last confirmed order survives the failed batch
        let items = list(&pool).await.unwrap();
        assert_eq!(items[0].position, 1);
        assert_eq!(items[0].id, a.id);
        assert_eq!(items[1].position, 2);
    }

    #[tokio::test]
    async fn set_positions_applies_whole_batch() {
        let pool = memory_pool().await;
        let a = create(&pool, &item("Vase")).await.unwrap();
        let b = create(&pool, &item("Banc")).await.unwrap();

        set_positions(&pool, &[(b.id.clone(), 1), (a.id.clone(), 2)])
            .await
            .unwrap();

        let items = list(&pool).await.unwrap();
        assert_eq!(items[0].id, b.id);
        assert_eq!(items[1].id, a.id);
    }

    #[tokio::test]
    async fn delete_reports_existence() {
        let pool = memory_pool().await;
        let a = create(&pool, &item("Pendule")).await.unwrap();
        assert!(delete(&pool, &a.id).await.unwrap());
        assert!(!delete(&pool, &a.id).await.unwrap());
    }
}

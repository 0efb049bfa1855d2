//! Product catalog: read path for the invoice engine plus the admin
//! workflow that maintains the catalog.

use crate::error::AppError;
use crate::models::Product;
use crate::services::database::Database;
use crate::services::metrics::DB_QUERY_DURATION;
use sqlx::SqliteConnection;
use tracing::{info, instrument};

/// Transaction-scoped product lookup used by the invoice engine.
pub(crate) async fn fetch_product(
    conn: &mut SqliteConnection,
    id: i64,
) -> Result<Option<Product>, AppError> {
    sqlx::query_as::<_, Product>("SELECT id, name, price FROM products WHERE id = ?1")
        .bind(id)
        .fetch_optional(conn)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to fetch product: {}", e)))
}

impl Database {
    /// Look up a product by id.
    #[instrument(skip(self), fields(product_id = id))]
    pub async fn find_product(&self, id: i64) -> Result<Option<Product>, AppError> {
        let mut conn = self.pool().acquire().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to acquire connection: {}", e))
        })?;
        fetch_product(&mut *conn, id).await
    }

    /// List products, optionally filtered by a name substring.
    #[instrument(skip(self))]
    pub async fn list_products(&self, query: Option<&str>) -> Result<Vec<Product>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["list_products"])
            .start_timer();

        let query = query.map(str::trim).filter(|q| !q.is_empty());
        let products = if let Some(q) = query {
            sqlx::query_as::<_, Product>(
                "SELECT id, name, price FROM products WHERE name LIKE ?1 ORDER BY name LIMIT 50",
            )
            .bind(format!("%{}%", q))
            .fetch_all(self.pool())
            .await
        } else {
            sqlx::query_as::<_, Product>(
                "SELECT id, name, price FROM products ORDER BY name LIMIT 500",
            )
            .fetch_all(self.pool())
            .await
        }
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to list products: {}", e)))?;

        timer.observe_duration();

        Ok(products)
    }

    /// Insert-or-update a product by unique name. Returns the row and
    /// whether it was newly created.
    #[instrument(skip(self))]
    pub async fn upsert_product(&self, name: &str, price: f64) -> Result<(Product, bool), AppError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(AppError::BadRequest(anyhow::anyhow!(
                "Product name is required"
            )));
        }

        let existing: Option<i64> = sqlx::query_scalar("SELECT id FROM products WHERE name = ?1")
            .bind(name)
            .fetch_optional(self.pool())
            .await
            .map_err(|e| {
                AppError::DatabaseError(anyhow::anyhow!("Failed to look up product: {}", e))
            })?;

        let product = sqlx::query_as::<_, Product>(
            "INSERT INTO products(name, price) VALUES (?1, ?2) \
             ON CONFLICT(name) DO UPDATE SET price = excluded.price \
             RETURNING id, name, price",
        )
        .bind(name)
        .bind(price)
        .fetch_one(self.pool())
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to upsert product: {}", e)))?;

        info!(product_id = product.id, name = %product.name, "Product upserted");

        Ok((product, existing.is_none()))
    }

    /// Rename/reprice a product. None when the id does not exist.
    #[instrument(skip(self), fields(product_id = id))]
    pub async fn update_product(
        &self,
        id: i64,
        name: &str,
        price: f64,
    ) -> Result<Option<Product>, AppError> {
        sqlx::query_as::<_, Product>(
            "UPDATE products SET name = ?1, price = ?2 WHERE id = ?3 RETURNING id, name, price",
        )
        .bind(name.trim())
        .bind(price)
        .bind(id)
        .fetch_optional(self.pool())
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
                AppError::Conflict(anyhow::anyhow!("Product '{}' already exists", name.trim()))
            }
            _ => AppError::DatabaseError(anyhow::anyhow!("Failed to update product: {}", e)),
        })
    }

    /// Delete a product. Invoice items keep their name/price snapshots;
    /// their catalog reference is detached first.
    #[instrument(skip(self), fields(product_id = id))]
    pub async fn delete_product(&self, id: i64) -> Result<bool, AppError> {
        let mut tx = self
            .pool()
            .begin()
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to begin: {}", e)))?;

        sqlx::query("UPDATE invoice_items SET product_id = NULL WHERE product_id = ?1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                AppError::DatabaseError(anyhow::anyhow!("Failed to detach item references: {}", e))
            })?;

        let result = sqlx::query("DELETE FROM products WHERE id = ?1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                AppError::DatabaseError(anyhow::anyhow!("Failed to delete product: {}", e))
            })?;

        tx.commit()
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to commit: {}", e)))?;

        let deleted = result.rows_affected() > 0;
        if deleted {
            info!(product_id = id, "Product deleted");
        }

        Ok(deleted)
    }

    /// Bulk import "name,price" rows. Tolerates tab/semicolon/comma
    /// delimiters and comma decimals; skips header rows and rows that do
    /// not parse. Errors when nothing at all was importable.
    #[instrument(skip(self, csv))]
    pub async fn import_products_csv(&self, csv: &str) -> Result<(u32, u32), AppError> {
        let rows: Vec<&str> = csv
            .split(['\r', '\n'])
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .collect();
        if rows.is_empty() {
            return Err(AppError::BadRequest(anyhow::anyhow!("No rows found")));
        }

        let mut processed = 0u32;
        let mut skipped = 0u32;

        for row in rows {
            let Some((name, price)) = parse_csv_row(row) else {
                skipped += 1;
                continue;
            };

            sqlx::query(
                "INSERT INTO products(name, price) VALUES (?1, ?2) \
                 ON CONFLICT(name) DO UPDATE SET price = excluded.price",
            )
            .bind(name)
            .bind(price)
            .execute(self.pool())
            .await
            .map_err(|e| {
                AppError::DatabaseError(anyhow::anyhow!("Failed to import product: {}", e))
            })?;
            processed += 1;
        }

        if processed == 0 {
            return Err(AppError::BadRequest(anyhow::anyhow!("No valid rows found")));
        }

        info!(processed, skipped, "Product CSV imported");

        Ok((processed, skipped))
    }
}

fn parse_csv_row(row: &str) -> Option<(&str, f64)> {
    let delimiter = if row.contains('\t') {
        '\t'
    } else if row.contains(';') {
        ';'
    } else {
        ','
    };

    let mut parts = row.split(delimiter).map(str::trim);
    let name = parts.next()?;
    let price_raw = parts.next()?;

    // header rows
    if name.is_empty()
        || name.eq_ignore_ascii_case("service")
        || name.eq_ignore_ascii_case("name")
        || price_raw.eq_ignore_ascii_case("price")
    {
        return None;
    }

    let price: f64 = price_raw.replace(',', ".").parse().ok()?;
    if !price.is_finite() {
        return None;
    }

    Some((name, price))
}

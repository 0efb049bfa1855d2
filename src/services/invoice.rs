//! Invoice transaction engine: turns a validated draft into client, pet,
//! invoice and line item rows inside one transaction per write.

use crate::dtos::{
    InvoiceDetail, InvoiceDraft, InvoiceHeader, InvoiceItemRow, InvoiceSummary, InvoiceWriteResult,
};
use crate::error::AppError;
use crate::services::catalog::fetch_product;
use crate::services::database::Database;
use crate::services::metrics::{DB_QUERY_DURATION, INVOICES_TOTAL, INVOICE_AMOUNT_TOTAL};
use chrono::{NaiveDate, Utc};
use sqlx::SqliteConnection;
use tracing::{info, instrument};

impl Database {
    /// Create an invoice from a draft. Reconciles the client and every pet,
    /// resolves catalog products, assigns the next friendly id and persists
    /// header plus items atomically.
    #[instrument(skip(self, draft), fields(client = %draft.client_name))]
    pub async fn create_invoice(&self, draft: &InvoiceDraft) -> Result<InvoiceWriteResult, AppError> {
        // Two concurrent creates can compute the same friendly id; the
        // unique constraint catches the loser, which retries once.
        match self.try_create_invoice(draft).await {
            Err(AppError::Conflict(_)) => self.try_create_invoice(draft).await,
            other => other,
        }
    }

    async fn try_create_invoice(&self, draft: &InvoiceDraft) -> Result<InvoiceWriteResult, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["create_invoice"])
            .start_timer();

        let date = draft.date.unwrap_or_else(today);
        let total = draft.total();

        let mut tx = self
            .pool()
            .begin()
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to begin: {}", e)))?;

        let client_id =
            resolve_client(&mut *tx, &draft.client_name, draft.contact_info.as_deref()).await?;
        let friendly_id = next_friendly_id(&mut *tx, self.invoice_prefix()).await?;

        let invoice_id: i64 = sqlx::query_scalar(
            "INSERT INTO invoices(friendly_id, client_id, pet_id, date, status, total_amount) \
             VALUES (?1, ?2, NULL, ?3, ?4, ?5) RETURNING id",
        )
        .bind(&friendly_id)
        .bind(client_id)
        .bind(date)
        .bind(draft.status.as_str())
        .bind(total)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
                AppError::Conflict(anyhow::anyhow!("Friendly id {} already taken", friendly_id))
            }
            _ => AppError::DatabaseError(anyhow::anyhow!("Failed to insert invoice: {}", e)),
        })?;

        insert_items(&mut *tx, invoice_id, client_id, draft).await?;

        tx.commit()
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to commit: {}", e)))?;

        timer.observe_duration();
        INVOICES_TOTAL
            .with_label_values(&[draft.status.as_str()])
            .inc();
        INVOICE_AMOUNT_TOTAL.inc_by(total);

        info!(invoice_id, friendly_id = %friendly_id, total, "Invoice created");

        Ok(InvoiceWriteResult {
            invoice_id,
            friendly_id,
            total,
            warnings: vec![],
        })
    }

    /// Full-replace edit: header updated in place (friendly id untouched),
    /// every line item deleted and reinserted from the draft.
    #[instrument(skip(self, draft), fields(invoice_id = id))]
    pub async fn update_invoice(
        &self,
        id: i64,
        draft: &InvoiceDraft,
    ) -> Result<InvoiceWriteResult, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["update_invoice"])
            .start_timer();

        let date = draft.date.unwrap_or_else(today);
        let total = draft.total();

        let mut tx = self
            .pool()
            .begin()
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to begin: {}", e)))?;

        let client_id =
            resolve_client(&mut *tx, &draft.client_name, draft.contact_info.as_deref()).await?;

        let updated = sqlx::query(
            "UPDATE invoices SET client_id = ?1, pet_id = NULL, date = ?2, status = ?3, \
             total_amount = ?4 WHERE id = ?5",
        )
        .bind(client_id)
        .bind(date)
        .bind(draft.status.as_str())
        .bind(total)
        .bind(id)
        .execute(&mut *tx)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to update invoice: {}", e)))?;

        if updated.rows_affected() == 0 {
            return Err(AppError::NotFound(anyhow::anyhow!("Invoice not found")));
        }

        sqlx::query("DELETE FROM invoice_items WHERE invoice_id = ?1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                AppError::DatabaseError(anyhow::anyhow!("Failed to clear invoice items: {}", e))
            })?;

        insert_items(&mut *tx, id, client_id, draft).await?;

        let friendly_id: String =
            sqlx::query_scalar("SELECT friendly_id FROM invoices WHERE id = ?1")
                .bind(id)
                .fetch_one(&mut *tx)
                .await
                .map_err(|e| {
                    AppError::DatabaseError(anyhow::anyhow!("Failed to read friendly id: {}", e))
                })?;

        tx.commit()
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to commit: {}", e)))?;

        timer.observe_duration();

        info!(invoice_id = id, friendly_id = %friendly_id, total, "Invoice updated");

        Ok(InvoiceWriteResult {
            invoice_id: id,
            friendly_id,
            total,
            warnings: vec![],
        })
    }

    /// Remove an invoice and its items as one unit. Returns false when the
    /// invoice does not exist.
    #[instrument(skip(self), fields(invoice_id = id))]
    pub async fn delete_invoice(&self, id: i64) -> Result<bool, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["delete_invoice"])
            .start_timer();

        let mut tx = self
            .pool()
            .begin()
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to begin: {}", e)))?;

        sqlx::query("DELETE FROM invoice_items WHERE invoice_id = ?1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                AppError::DatabaseError(anyhow::anyhow!("Failed to delete invoice items: {}", e))
            })?;

        let result = sqlx::query("DELETE FROM invoices WHERE id = ?1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                AppError::DatabaseError(anyhow::anyhow!("Failed to delete invoice: {}", e))
            })?;

        tx.commit()
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to commit: {}", e)))?;

        timer.observe_duration();

        let deleted = result.rows_affected() > 0;
        if deleted {
            info!(invoice_id = id, "Invoice deleted");
        }

        Ok(deleted)
    }

    /// Header joined with client fields plus items joined with pet
    /// name/species, grouped by pet.
    #[instrument(skip(self), fields(invoice_id = id))]
    pub async fn get_invoice(&self, id: i64) -> Result<Option<InvoiceDetail>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["get_invoice"])
            .start_timer();

        let header = sqlx::query_as::<_, InvoiceHeader>(
            "SELECT i.id, i.friendly_id, i.date, i.status, i.total_amount, \
                    c.id AS client_id, c.name AS client_name, c.contact_info \
             FROM invoices i \
             JOIN clients c ON c.id = i.client_id \
             WHERE i.id = ?1",
        )
        .bind(id)
        .fetch_optional(self.pool())
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to get invoice: {}", e)))?;

        let Some(invoice) = header else {
            return Ok(None);
        };

        let items = sqlx::query_as::<_, InvoiceItemRow>(
            "SELECT ii.id, ii.pet_id, ii.product_id, ii.product_name_snapshot, ii.quantity, \
                    ii.price_snapshot, p.name AS pet_name, p.species AS pet_species \
             FROM invoice_items ii \
             LEFT JOIN pets p ON p.id = ii.pet_id \
             WHERE ii.invoice_id = ?1 \
             ORDER BY ii.pet_id, ii.id",
        )
        .bind(id)
        .fetch_all(self.pool())
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to get invoice items: {}", e))
        })?;

        timer.observe_duration();

        Ok(Some(InvoiceDetail { invoice, items }))
    }

    /// All invoices, newest first.
    #[instrument(skip(self))]
    pub async fn list_invoices(&self) -> Result<Vec<InvoiceSummary>, AppError> {
        self.invoice_summaries(None).await
    }

    /// The ten most recent invoices.
    #[instrument(skip(self))]
    pub async fn recent_invoices(&self) -> Result<Vec<InvoiceSummary>, AppError> {
        self.invoice_summaries(Some(10)).await
    }

    async fn invoice_summaries(
        &self,
        limit: Option<i64>,
    ) -> Result<Vec<InvoiceSummary>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["list_invoices"])
            .start_timer();

        // a negative LIMIT disables it in SQLite
        let summaries = sqlx::query_as::<_, InvoiceSummary>(
            "SELECT i.id, i.friendly_id, i.date, i.status, i.total_amount, \
                    c.name AS client_name, \
                    NULLIF(GROUP_CONCAT(DISTINCT p.name), '') AS pet_names \
             FROM invoices i \
             JOIN clients c ON c.id = i.client_id \
             LEFT JOIN invoice_items ii ON ii.invoice_id = i.id \
             LEFT JOIN pets p ON p.id = ii.pet_id \
             GROUP BY i.id \
             ORDER BY i.id DESC \
             LIMIT ?1",
        )
        .bind(limit.unwrap_or(-1))
        .fetch_all(self.pool())
            .await
            .map_err(|e| {
                AppError::DatabaseError(anyhow::anyhow!("Failed to list invoices: {}", e))
            })?;

        timer.observe_duration();

        Ok(summaries)
    }
}

fn today() -> NaiveDate {
    Utc::now().date_naive()
}

/// Resolve a client name to its row id, creating the row on first sight.
/// A non-null contact_info overwrites; null never erases an existing value.
pub(crate) async fn resolve_client(
    conn: &mut SqliteConnection,
    name: &str,
    contact_info: Option<&str>,
) -> Result<i64, AppError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AppError::BadRequest(anyhow::anyhow!(
            "Client name is required"
        )));
    }
    let contact_info = contact_info.map(str::trim).filter(|c| !c.is_empty());

    sqlx::query_scalar(
        "INSERT INTO clients(name, contact_info) VALUES (?1, ?2) \
         ON CONFLICT(name) DO UPDATE SET \
             contact_info = COALESCE(excluded.contact_info, clients.contact_info) \
         RETURNING id",
    )
    .bind(name)
    .bind(contact_info)
    .fetch_one(conn)
    .await
    .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to upsert client: {}", e)))
}

/// Same pattern as [`resolve_client`], scoped by (name, client_id).
pub(crate) async fn resolve_pet(
    conn: &mut SqliteConnection,
    name: &str,
    species: Option<&str>,
    client_id: i64,
) -> Result<i64, AppError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AppError::BadRequest(anyhow::anyhow!("Pet name is required")));
    }
    let species = species.map(str::trim).filter(|s| !s.is_empty());

    sqlx::query_scalar(
        "INSERT INTO pets(name, species, client_id) VALUES (?1, ?2, ?3) \
         ON CONFLICT(name, client_id) DO UPDATE SET \
             species = COALESCE(excluded.species, pets.species) \
         RETURNING id",
    )
    .bind(name)
    .bind(species)
    .bind(client_id)
    .fetch_one(conn)
    .await
    .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to upsert pet: {}", e)))
}

/// Next id in the "PREFIX-NNNN" sequence. Must run inside the same
/// transaction as the dependent insert.
async fn next_friendly_id(
    conn: &mut SqliteConnection,
    prefix: &str,
) -> Result<String, AppError> {
    let last: Option<String> = sqlx::query_scalar(
        "SELECT friendly_id FROM invoices WHERE friendly_id LIKE ?1 ESCAPE '\\' \
         ORDER BY id DESC LIMIT 1",
    )
    .bind(format!("{}-%", escape_like(prefix)))
    .fetch_optional(conn)
    .await
    .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to scan friendly ids: {}", e)))?;

    Ok(next_in_sequence(prefix, last.as_deref()))
}

/// Escape LIKE wildcards so a configured prefix only ever matches itself.
fn escape_like(s: &str) -> String {
    s.replace('\\', "\\\\").replace('%', "\\%").replace('_', "\\_")
}

fn next_in_sequence(prefix: &str, last: Option<&str>) -> String {
    let last_seq = last
        .and_then(|id| id.rsplit('-').next())
        .and_then(|suffix| suffix.parse::<u64>().ok())
        .unwrap_or(0);
    // widens naturally past 9999
    format!("{}-{:04}", prefix, last_seq + 1)
}

/// Reconcile each pet group and insert its line items. Catalog items
/// snapshot the current product name but keep the operator-entered unit
/// price; later catalog edits or deletions must not rewrite invoice
/// history.
async fn insert_items(
    conn: &mut SqliteConnection,
    invoice_id: i64,
    client_id: i64,
    draft: &InvoiceDraft,
) -> Result<(), AppError> {
    for group in &draft.pets {
        let pet_id = resolve_pet(
            &mut *conn,
            &group.pet_name,
            group.pet_species.as_deref(),
            client_id,
        )
        .await?;

        for item in &group.items {
            let name_snapshot = match item.product_id {
                Some(product_id) => fetch_product(&mut *conn, product_id)
                    .await?
                    .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Product not found")))?
                    .name,
                None => {
                    let name = item.custom_name.as_deref().map(str::trim).unwrap_or("");
                    if name.is_empty() {
                        return Err(AppError::BadRequest(anyhow::anyhow!(
                            "Custom item name required"
                        )));
                    }
                    name.to_string()
                }
            };

            sqlx::query(
                "INSERT INTO invoice_items(invoice_id, pet_id, product_id, \
                 product_name_snapshot, quantity, price_snapshot) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            )
            .bind(invoice_id)
            .bind(pet_id)
            .bind(item.product_id)
            .bind(&name_snapshot)
            .bind(item.quantity)
            .bind(item.unit_price)
            .execute(&mut *conn)
            .await
            .map_err(|e| {
                AppError::DatabaseError(anyhow::anyhow!("Failed to insert invoice item: {}", e))
            })?;
        }
    }
    Ok(())
}

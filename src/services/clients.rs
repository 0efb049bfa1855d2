//! Client and pet administration reads and writes. Invoice submissions
//! reconcile these entities themselves; this is the explicit management
//! surface.

use crate::error::AppError;
use crate::models::{Client, Pet};
use crate::services::database::Database;
use crate::services::metrics::DB_QUERY_DURATION;
use tracing::{info, instrument};

impl Database {
    /// List clients, optionally filtered by a name substring.
    #[instrument(skip(self))]
    pub async fn list_clients(&self, query: Option<&str>) -> Result<Vec<Client>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["list_clients"])
            .start_timer();

        let query = query.map(str::trim).filter(|q| !q.is_empty());
        let clients = if let Some(q) = query {
            sqlx::query_as::<_, Client>(
                "SELECT id, name, contact_info FROM clients WHERE name LIKE ?1 \
                 ORDER BY name LIMIT 20",
            )
            .bind(format!("%{}%", q))
            .fetch_all(self.pool())
            .await
        } else {
            sqlx::query_as::<_, Client>(
                "SELECT id, name, contact_info FROM clients ORDER BY name LIMIT 200",
            )
            .fetch_all(self.pool())
            .await
        }
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to list clients: {}", e)))?;

        timer.observe_duration();

        Ok(clients)
    }

    /// Create a client explicitly. Unlike invoice reconciliation this is a
    /// plain insert; a duplicate name is a conflict.
    #[instrument(skip(self, contact_info))]
    pub async fn create_client(
        &self,
        name: &str,
        contact_info: Option<&str>,
    ) -> Result<Client, AppError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(AppError::BadRequest(anyhow::anyhow!(
                "Client name is required"
            )));
        }
        let contact_info = contact_info.map(str::trim).filter(|c| !c.is_empty());

        let client = sqlx::query_as::<_, Client>(
            "INSERT INTO clients(name, contact_info) VALUES (?1, ?2) \
             RETURNING id, name, contact_info",
        )
        .bind(name)
        .bind(contact_info)
        .fetch_one(self.pool())
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
                AppError::Conflict(anyhow::anyhow!("Client '{}' already exists", name))
            }
            _ => AppError::DatabaseError(anyhow::anyhow!("Failed to create client: {}", e)),
        })?;

        info!(client_id = client.id, name = %client.name, "Client created");

        Ok(client)
    }

    /// Rename/replace contact info. None when the id does not exist.
    #[instrument(skip(self, contact_info), fields(client_id = id))]
    pub async fn update_client(
        &self,
        id: i64,
        name: &str,
        contact_info: Option<&str>,
    ) -> Result<Option<Client>, AppError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(AppError::BadRequest(anyhow::anyhow!(
                "Client name is required"
            )));
        }
        let contact_info = contact_info.map(str::trim).filter(|c| !c.is_empty());

        sqlx::query_as::<_, Client>(
            "UPDATE clients SET name = ?1, contact_info = ?2 WHERE id = ?3 \
             RETURNING id, name, contact_info",
        )
        .bind(name)
        .bind(contact_info)
        .bind(id)
        .fetch_optional(self.pool())
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
                AppError::Conflict(anyhow::anyhow!("Client '{}' already exists", name))
            }
            _ => AppError::DatabaseError(anyhow::anyhow!("Failed to update client: {}", e)),
        })
    }

    /// Delete a client and their pets. Refused while any invoice
    /// references the client; the guard also covers the pets, since
    /// invoice items only reference pets through their invoice.
    #[instrument(skip(self), fields(client_id = id))]
    pub async fn delete_client(&self, id: i64) -> Result<bool, AppError> {
        let mut tx = self
            .pool()
            .begin()
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to begin: {}", e)))?;

        let invoice_count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM invoices WHERE client_id = ?1")
                .bind(id)
                .fetch_one(&mut *tx)
                .await
                .map_err(|e| {
                    AppError::DatabaseError(anyhow::anyhow!("Failed to count invoices: {}", e))
                })?;

        if invoice_count > 0 {
            return Err(AppError::BadRequest(anyhow::anyhow!(
                "Client cannot be deleted (has invoices)."
            )));
        }

        sqlx::query("DELETE FROM pets WHERE client_id = ?1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                AppError::DatabaseError(anyhow::anyhow!("Failed to delete pets: {}", e))
            })?;

        let result = sqlx::query("DELETE FROM clients WHERE id = ?1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                AppError::DatabaseError(anyhow::anyhow!("Failed to delete client: {}", e))
            })?;

        tx.commit()
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to commit: {}", e)))?;

        let deleted = result.rows_affected() > 0;
        if deleted {
            info!(client_id = id, "Client deleted");
        }

        Ok(deleted)
    }

    /// Pets belonging to one client, by name.
    #[instrument(skip(self))]
    pub async fn list_pets(&self, client_id: i64) -> Result<Vec<Pet>, AppError> {
        sqlx::query_as::<_, Pet>(
            "SELECT id, name, species, client_id FROM pets WHERE client_id = ?1 ORDER BY name",
        )
        .bind(client_id)
        .fetch_all(self.pool())
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to list pets: {}", e)))
    }
}

use crate::error::AppError;
use crate::AppState;
use axum::{
    extract::{Query, State},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PetsQuery {
    pub client_id: Option<i64>,
}

pub async fn list_pets(
    State(state): State<AppState>,
    Query(params): Query<PetsQuery>,
) -> Result<impl IntoResponse, AppError> {
    let client_id = params
        .client_id
        .ok_or_else(|| AppError::BadRequest(anyhow::anyhow!("clientId required")))?;
    Ok(Json(state.db.list_pets(client_id).await?))
}

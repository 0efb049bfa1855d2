use crate::dtos::ClientBody;
use crate::error::AppError;
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use serde_json::json;
use validator::Validate;

#[derive(Debug, Deserialize)]
pub struct ClientQuery {
    pub query: Option<String>,
}

pub async fn list_clients(
    State(state): State<AppState>,
    Query(params): Query<ClientQuery>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(state.db.list_clients(params.query.as_deref()).await?))
}

pub async fn create_client(
    State(state): State<AppState>,
    Json(body): Json<ClientBody>,
) -> Result<impl IntoResponse, AppError> {
    body.validate()?;
    let client = state
        .db
        .create_client(&body.name, body.contact_info.as_deref())
        .await?;
    Ok((StatusCode::CREATED, Json(client)))
}

pub async fn update_client(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(body): Json<ClientBody>,
) -> Result<impl IntoResponse, AppError> {
    body.validate()?;
    match state
        .db
        .update_client(id, &body.name, body.contact_info.as_deref())
        .await?
    {
        Some(client) => Ok(Json(client)),
        None => Err(AppError::NotFound(anyhow::anyhow!("Not found"))),
    }
}

pub async fn delete_client(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    if state.db.delete_client(id).await? {
        Ok(Json(json!({ "ok": true })))
    } else {
        Err(AppError::NotFound(anyhow::anyhow!("Not found")))
    }
}

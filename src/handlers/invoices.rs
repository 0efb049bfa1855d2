use crate::dtos::InvoiceDraft;
use crate::error::AppError;
use crate::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde_json::json;
use validator::Validate;

pub async fn create_invoice(
    State(state): State<AppState>,
    Json(draft): Json<InvoiceDraft>,
) -> Result<impl IntoResponse, AppError> {
    draft.validate()?;
    let result = state.db.create_invoice(&draft).await?;
    Ok((StatusCode::CREATED, Json(result)))
}

pub async fn update_invoice(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(draft): Json<InvoiceDraft>,
) -> Result<impl IntoResponse, AppError> {
    draft.validate()?;
    let result = state.db.update_invoice(id, &draft).await?;
    Ok(Json(result))
}

pub async fn get_invoice(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    match state.db.get_invoice(id).await? {
        Some(detail) => Ok(Json(detail)),
        None => Err(AppError::NotFound(anyhow::anyhow!("Not found"))),
    }
}

pub async fn delete_invoice(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    if state.db.delete_invoice(id).await? {
        Ok(Json(json!({ "ok": true })))
    } else {
        Err(AppError::NotFound(anyhow::anyhow!("Not found")))
    }
}

pub async fn list_invoices(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    Ok(Json(state.db.list_invoices().await?))
}

pub async fn recent_invoices(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    Ok(Json(state.db.recent_invoices().await?))
}

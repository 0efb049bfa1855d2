use crate::dtos::{CsvImportBody, CsvImportReport, ProductBody};
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
pub struct ProductQuery {
    pub query: Option<String>,
}

pub async fn list_products(
    State(state): State<AppState>,
    Query(params): Query<ProductQuery>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(
        state.db.list_products(params.query.as_deref()).await?,
    ))
}

pub async fn upsert_product(
    State(state): State<AppState>,
    Json(body): Json<ProductBody>,
) -> Result<impl IntoResponse, AppError> {
    body.validate()?;
    let (product, created) = state.db.upsert_product(&body.name, body.price).await?;
    let status = if created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(product)))
}

pub async fn update_product(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(body): Json<ProductBody>,
) -> Result<impl IntoResponse, AppError> {
    body.validate()?;
    match state.db.update_product(id, &body.name, body.price).await? {
        Some(product) => Ok(Json(product)),
        None => Err(AppError::NotFound(anyhow::anyhow!("Not found"))),
    }
}

pub async fn delete_product(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    if state.db.delete_product(id).await? {
        Ok(Json(json!({ "ok": true })))
    } else {
        Err(AppError::NotFound(anyhow::anyhow!("Not found")))
    }
}

pub async fn import_csv(
    State(state): State<AppState>,
    Json(body): Json<CsvImportBody>,
) -> Result<impl IntoResponse, AppError> {
    let csv = body
        .csv
        .as_deref()
        .filter(|c| !c.trim().is_empty())
        .ok_or_else(|| AppError::BadRequest(anyhow::anyhow!("csv required")))?;
    let (processed, skipped) = state.db.import_products_csv(csv).await?;
    Ok(Json(CsvImportReport {
        ok: true,
        processed,
        skipped,
    }))
}

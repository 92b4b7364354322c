//! Resource CRUD handlers: list, create, retrieve, update, destroy.

use crate::error::AppError;
use crate::response::{success_many, success_one, success_one_ok};
use crate::state::ResourceView;
use crate::store::Record;
use crate::views::{Creator, Destroyer, ListQuery, Lister, Retriever, Updater};
use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde_json::Value;
use std::collections::HashMap;

fn body_to_record(body: Result<Json<Value>, JsonRejection>) -> Result<Record, AppError> {
    let Json(value) = body.map_err(|e| AppError::BadRequest(e.body_text()))?;
    match value {
        Value::Object(m) => Ok(m),
        _ => Err(AppError::BadRequest("body must be a JSON object".into())),
    }
}

pub async fn list(
    State(view): State<ResourceView>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<impl IntoResponse, AppError> {
    let query = ListQuery::from_params(&params)?;
    let page = Lister::list(&view, query).await?;
    Ok(success_many(page))
}

pub async fn create(
    State(view): State<ResourceView>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let payload = body_to_record(body)?;
    let row = Creator::create(&view, payload).await?;
    Ok(success_one(row))
}

pub async fn retrieve(
    State(view): State<ResourceView>,
    Path(params): Path<HashMap<String, String>>,
) -> Result<impl IntoResponse, AppError> {
    let id = view.id_param(&params)?;
    let row = Retriever::retrieve(&view, id).await?;
    Ok(success_one_ok(row))
}

pub async fn update(
    State(view): State<ResourceView>,
    Path(params): Path<HashMap<String, String>>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let id = view.id_param(&params)?;
    let payload = body_to_record(body)?;
    let row = Updater::update(&view, id, payload).await?;
    Ok(success_one_ok(row))
}

pub async fn destroy(
    State(view): State<ResourceView>,
    Path(params): Path<HashMap<String, String>>,
) -> Result<impl IntoResponse, AppError> {
    let id = view.id_param(&params)?;
    Destroyer::destroy(&view, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

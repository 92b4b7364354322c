//! Resource CRUD routes: collection at `/{resource}`, detail at `/{resource}/:{id_param}`.

use crate::handlers::resource::{create, destroy, list, retrieve, update};
use crate::state::ResourceView;
use axum::{routing::get, Router};

pub fn resource_routes(resource: &str, view: ResourceView) -> Router {
    let collection = format!("/{}", resource.trim_matches('/'));
    let detail = format!("{}/:{}", collection, view.config().id_param);
    tracing::info!(
        entity = %view.model().entity_name(),
        collection = %collection,
        detail = %detail,
        "registered resource routes"
    );
    Router::new()
        .route(&collection, get(list).post(create))
        .route(&detail, get(retrieve).patch(update).delete(destroy))
        .with_state(view)
}

//! Response bodies for resource routes.

use crate::store::Record;
use axum::{http::StatusCode, Json};
use serde::Serialize;

/// List response. `count` is the length of this page, not a total row count.
#[derive(Debug, Serialize, PartialEq)]
pub struct ListPage {
    pub data: Vec<Record>,
    pub count: usize,
}

impl ListPage {
    pub fn new(data: Vec<Record>) -> Self {
        let count = data.len();
        ListPage { data, count }
    }
}

pub fn success_many(page: ListPage) -> (StatusCode, Json<ListPage>) {
    (StatusCode::OK, Json(page))
}

pub fn success_one(record: Record) -> (StatusCode, Json<Record>) {
    (StatusCode::CREATED, Json(record))
}

pub fn success_one_ok(record: Record) -> (StatusCode, Json<Record>) {
    (StatusCode::OK, Json(record))
}

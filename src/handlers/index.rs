// src/handlers/index.rs
use actix_web::{web, HttpResponse};
use serde_json::json;

use crate::adapter::EventAdapter;

pub async fn index(adapter: web::Data<EventAdapter>) -> HttpResponse {
    let status = adapter.status();
    HttpResponse::Ok().json(json!({
        "status": "ok",
        "watched_server": status.watched_server,
        "empty_timer": status.empty_timer,
        "last_delivery": status.last_delivery,
    }))
}

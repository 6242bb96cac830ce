// src/test_support.rs
//! Local actix-web endpoint standing in for the webhook receiver. Tests that
//! use it run under `#[actix_web::test]`.
use actix_web::http::{header, StatusCode};
use actix_web::{web, App, HttpRequest, HttpResponse, HttpServer};
use parking_lot::Mutex;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use crate::models::notification::NotificationPayload;

#[derive(Debug, Clone)]
pub struct ReceivedWebhook {
    pub content_type: Option<String>,
    pub payload: NotificationPayload,
}

struct EndpointState {
    status: StatusCode,
    delay: Option<Duration>,
    received: Mutex<Vec<ReceivedWebhook>>,
}

pub struct MockWebhook {
    pub url: String,
    state: Arc<EndpointState>,
}

impl MockWebhook {
    pub fn received(&self) -> Vec<ReceivedWebhook> {
        self.state.received.lock().clone()
    }

    pub fn contents(&self) -> Vec<String> {
        self.received()
            .into_iter()
            .map(|r| r.payload.content)
            .collect()
    }
}

async fn receive(
    req: HttpRequest,
    state: web::Data<EndpointState>,
    payload: web::Json<NotificationPayload>,
) -> HttpResponse {
    let content_type = req
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    state.received.lock().push(ReceivedWebhook {
        content_type,
        payload: payload.into_inner(),
    });

    if let Some(delay) = state.delay {
        actix_web::rt::time::sleep(delay).await;
    }
    HttpResponse::build(state.status).finish()
}

async fn start(status: u16, delay: Option<Duration>) -> MockWebhook {
    let state = Arc::new(EndpointState {
        status: StatusCode::from_u16(status).unwrap(),
        delay,
        received: Mutex::new(Vec::new()),
    });

    let data = web::Data::from(state.clone());
    let server = HttpServer::new(move || {
        App::new()
            .app_data(data.clone())
            .route("/hook", web::post().to(receive))
    })
    .workers(1)
    .disable_signals()
    .bind(("127.0.0.1", 0))
    .unwrap();

    let addr = server.addrs()[0];
    actix_web::rt::spawn(server.run());

    MockWebhook {
        url: format!("http://{}/hook", addr),
        state,
    }
}

pub async fn spawn_webhook(status: u16) -> MockWebhook {
    start(status, None).await
}

/// Records the request but holds the response for a minute.
pub async fn spawn_hanging_webhook() -> MockWebhook {
    start(200, Some(Duration::from_secs(60))).await
}

/// URL of a port nothing listens on.
pub async fn unused_url() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr: SocketAddr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}/hook", addr)
}

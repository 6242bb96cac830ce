// src/handlers/events.rs
use actix_web::{web, HttpRequest, HttpResponse};
use log::debug;
use serde_json::json;

use crate::adapter::EventAdapter;
use crate::models::events::{LoginEvent, OccupancyReport};
use crate::utils::{check_rate_limit, EventRateLimiter, RequestError};

pub async fn handle_login(
    req: HttpRequest,
    adapter: web::Data<EventAdapter>,
    event: web::Json<LoginEvent>,
    rate_limiter: web::Data<EventRateLimiter>,
) -> Result<HttpResponse, RequestError> {
    let ip = check_rate_limit(&req, &rate_limiter)?;
    debug!(
        "Login event from {}: {} ({} online)",
        ip, event.player, event.total_players
    );

    let occupancy = event.occupancy_of(adapter.watched_server());
    // Delivery failures are already logged by the sender; the proxy only gets a flag.
    let notified = adapter
        .on_player_login(&event.player, event.total_players, occupancy)
        .await
        .is_ok();

    Ok(HttpResponse::Ok().json(json!({ "notified": notified })))
}

pub async fn handle_occupancy(
    req: HttpRequest,
    adapter: web::Data<EventAdapter>,
    report: web::Json<OccupancyReport>,
    rate_limiter: web::Data<EventRateLimiter>,
) -> Result<HttpResponse, RequestError> {
    let ip = check_rate_limit(&req, &rate_limiter)?;
    debug!("Occupancy report from {} covering {} servers", ip, report.servers.len());

    let tracked = adapter.on_occupancy_check(&report);
    Ok(HttpResponse::Ok().json(json!({ "tracked": tracked })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::WebhookConfig;
    use crate::handlers::index::index;
    use crate::test_support::{spawn_webhook, unused_url};
    use crate::webhook::WebhookSender;
    use actix_web::http::StatusCode;
    use actix_web::{test, App};
    use governor::{Quota, RateLimiter};
    use std::net::SocketAddr;
    use std::num::NonZeroU32;
    use std::sync::Arc;
    use std::time::Duration;

    fn peer() -> SocketAddr {
        "127.0.0.1:40000".parse().unwrap()
    }

    fn adapter_data(url: &str) -> web::Data<EventAdapter> {
        let sender = WebhookSender::new(Duration::from_secs(5)).unwrap();
        web::Data::new(EventAdapter::new(
            "lobby".to_string(),
            Duration::from_secs(1800),
            WebhookConfig {
                url: url.to_string(),
            },
            Arc::new(sender),
        ))
    }

    fn limiter(burst: u32) -> web::Data<EventRateLimiter> {
        let quota = Quota::per_minute(NonZeroU32::new(burst).unwrap());
        web::Data::new(RateLimiter::keyed(quota))
    }

    macro_rules! app {
        ($adapter:expr, $limiter:expr) => {
            test::init_service(
                App::new()
                    .app_data($adapter.clone())
                    .app_data($limiter.clone())
                    .route("/", web::get().to(index))
                    .route("/events/login", web::post().to(handle_login))
                    .route("/events/occupancy", web::post().to(handle_occupancy)),
            )
            .await
        };
    }

    #[actix_web::test]
    async fn login_notifies_and_starts_empty_timer() {
        let hook = spawn_webhook(200).await;
        let adapter = adapter_data(&hook.url);
        let limiter = limiter(10);
        let app = app!(adapter, limiter);

        let req = test::TestRequest::post()
            .uri("/events/login")
            .peer_addr(peer())
            .set_json(json!({
                "player": "Steve",
                "total_players": 1,
                "servers": { "lobby": 0, "survival": 1 }
            }))
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;

        assert_eq!(body, json!({ "notified": true }));
        assert!(adapter.monitor().is_pending("lobby"));
        assert_eq!(hook.received().len(), 1);

        let req = test::TestRequest::get().uri("/").to_request();
        let status: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(status["status"], "ok");
        assert_eq!(status["watched_server"], "lobby");
        assert_eq!(status["empty_timer"]["server_id"], "lobby");
        assert_eq!(status["last_delivery"]["kind"], "player_joined");

        adapter.shutdown();
    }

    #[actix_web::test]
    async fn failed_delivery_is_still_ok_for_the_proxy() {
        let url = unused_url().await;
        let adapter = adapter_data(&url);
        let limiter = limiter(10);
        let app = app!(adapter, limiter);

        let req = test::TestRequest::post()
            .uri("/events/login")
            .peer_addr(peer())
            .set_json(json!({ "player": "Steve", "total_players": 1 }))
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::OK);
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body, json!({ "notified": false }));
        assert!(!adapter.monitor().is_pending("lobby"));
    }

    #[actix_web::test]
    async fn occupancy_report_cancels_timer() {
        let hook = spawn_webhook(200).await;
        let adapter = adapter_data(&hook.url);
        let limiter = limiter(10);
        let app = app!(adapter, limiter);

        for (players, pending) in [(0, true), (2, false)] {
            let req = test::TestRequest::post()
                .uri("/events/occupancy")
                .peer_addr(peer())
                .set_json(json!({ "servers": { "lobby": players } }))
                .to_request();
            let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
            assert_eq!(body, json!({ "tracked": true }));
            assert_eq!(adapter.monitor().is_pending("lobby"), pending);
        }
        assert!(hook.received().is_empty());
    }

    #[actix_web::test]
    async fn rate_limited_per_peer() {
        let hook = spawn_webhook(200).await;
        let adapter = adapter_data(&hook.url);
        let limiter = limiter(1);
        let app = app!(adapter, limiter);

        let report = json!({ "servers": { "lobby": 1 } });
        let first = test::TestRequest::post()
            .uri("/events/occupancy")
            .peer_addr(peer())
            .set_json(&report)
            .to_request();
        assert_eq!(test::call_service(&app, first).await.status(), StatusCode::OK);

        let second = test::TestRequest::post()
            .uri("/events/occupancy")
            .peer_addr(peer())
            .set_json(&report)
            .to_request();
        assert_eq!(
            test::call_service(&app, second).await.status(),
            StatusCode::TOO_MANY_REQUESTS
        );

        let other_peer = test::TestRequest::post()
            .uri("/events/occupancy")
            .peer_addr("127.0.0.2:40000".parse().unwrap())
            .set_json(&report)
            .to_request();
        assert_eq!(
            test::call_service(&app, other_peer).await.status(),
            StatusCode::OK
        );
    }

    #[actix_web::test]
    async fn missing_peer_address_is_rejected() {
        let adapter = adapter_data(&unused_url().await);
        let limiter = limiter(10);
        let app = app!(adapter, limiter);

        let req = test::TestRequest::post()
            .uri("/events/occupancy")
            .set_json(json!({ "servers": {} }))
            .to_request();
        assert_eq!(
            test::call_service(&app, req).await.status(),
            StatusCode::BAD_REQUEST
        );
    }

    #[actix_web::test]
    async fn malformed_login_is_rejected() {
        let adapter = adapter_data(&unused_url().await);
        let limiter = limiter(10);
        let app = app!(adapter, limiter);

        let req = test::TestRequest::post()
            .uri("/events/login")
            .peer_addr(peer())
            .set_json(json!({ "player": "Steve" }))
            .to_request();
        assert_eq!(
            test::call_service(&app, req).await.status(),
            StatusCode::BAD_REQUEST
        );
        assert!(!adapter.monitor().is_pending("lobby"));
    }
}

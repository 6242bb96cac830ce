// src/main.rs
mod adapter;
mod config;
mod error;
mod handlers;
mod models;
mod monitor;
mod utils;
mod webhook;

#[cfg(test)]
mod test_support;

use actix_web::{web, App, HttpServer};
use adapter::EventAdapter;
use config::Config;
use env_logger::Env;
use governor::RateLimiter;
use log::{error, info};
use utils::EventRateLimiter;
use webhook::WebhookSender;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv::dotenv().ok();
    env_logger::init_from_env(Env::default().default_filter_or("info"));

    let config = Config::from_env();

    let sender = match WebhookSender::new(config.webhook_timeout()) {
        Ok(sender) => sender,
        Err(e) => {
            error!("Failed to build webhook client: {}", e);
            return Err(std::io::Error::new(
                std::io::ErrorKind::Other,
                format!("Failed to build webhook client: {}", e),
            ));
        }
    };

    let adapter = web::Data::new(EventAdapter::on_initialize(&config, sender));
    let event_rate_limiter: web::Data<EventRateLimiter> =
        web::Data::new(RateLimiter::keyed(config.event_quota()));

    let bind = config.bind();
    info!("Listening for proxy events on {}", bind);

    let server_adapter = adapter.clone();
    let result = HttpServer::new(move || {
        App::new()
            .app_data(server_adapter.clone())
            .app_data(event_rate_limiter.clone())
            .route("/", web::get().to(handlers::index::index))
            .route("/events/login", web::post().to(handlers::events::handle_login))
            .route(
                "/events/occupancy",
                web::post().to(handlers::events::handle_occupancy),
            )
    })
    .bind(&bind)?
    .run()
    .await;

    adapter.shutdown();
    info!("Webhook notifier stopped");
    result
}

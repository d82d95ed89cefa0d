use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use dotenv::dotenv;
use tokio::net::TcpListener;
use tower_http::cors::{CorsLayer, Any};
use tower_http::trace::{self, TraceLayer};
use tracing::{Level, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod router;

use appointment_cell::{
    AppointmentBookingService, AppointmentState, InMemoryBookingStore, StaffNotificationHub,
    TimeSlot, STAFF_AUDIENCE,
};
use shared_config::{AppConfig, StorageBackend};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Loading Env Vars
    dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting clinic booking API server");

    let config = AppConfig::from_env();

    let notification_hub = Arc::new(StaffNotificationHub::new(config.notification_channel_capacity));

    let booking_service = match config.storage_backend {
        StorageBackend::Supabase => {
            info!("Using Supabase storage at {}", config.supabase_url);
            AppointmentBookingService::with_supabase(&config, notification_hub.clone())
        }
        StorageBackend::Memory => {
            info!("Using in-memory storage; bookings are lost on restart");
            let slots = match &config.slot_seed_path {
                Some(path) => load_seed_slots(path).await?,
                None => {
                    warn!("SLOT_SEED_PATH not set, in-memory store starts without slots");
                    Vec::new()
                }
            };
            AppointmentBookingService::with_memory_store(
                Arc::new(InMemoryBookingStore::with_slots(slots).await),
                notification_hub.clone(),
            )
            .with_notification_timeout(std::time::Duration::from_millis(config.notification_timeout_ms))
        }
    };

    spawn_staff_event_logger(&notification_hub).await;

    // Set up CORS
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let state = Arc::new(AppointmentState::new(booking_service));

    let app = router::create_router(state)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(trace::DefaultMakeSpan::new()
                    .level(Level::INFO))
                .on_response(trace::DefaultOnResponse::new()
                    .level(Level::INFO)),
        )
        .layer(cors);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    info!("Listening on {}", addr);

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    axum::serve(listener, app)
        .await
        .context("server terminated unexpectedly")?;

    Ok(())
}

async fn load_seed_slots(path: &str) -> anyhow::Result<Vec<TimeSlot>> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("failed to read slot seed file {}", path))?;
    let slots: Vec<TimeSlot> = serde_json::from_str(&raw)
        .with_context(|| format!("slot seed file {} is not a JSON array of time slots", path))?;

    info!("Loaded {} slot(s) from {}", slots.len(), path);
    Ok(slots)
}

/// Staff events are logged until a push transport subscribes to the hub.
async fn spawn_staff_event_logger(hub: &StaffNotificationHub) {
    let mut receiver = hub.subscribe(STAFF_AUDIENCE).await;

    tokio::spawn(async move {
        loop {
            match receiver.recv().await {
                Ok(message) => info!(target: "staff_notifications", "{}", message),
                Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!("Staff event logger lagged, skipped {} event(s)", skipped)
                }
                Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
            }
        }
    });
}

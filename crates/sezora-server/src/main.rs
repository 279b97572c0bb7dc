use std::sync::Arc;

use axum::{
    Router,
    extract::{State, WebSocketUpgrade},
    response::IntoResponse,
    routing::get,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use sezora_api::AppStateInner;
use sezora_gateway::{GatewayContext, handle_connection};

mod config;

use config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sezora=debug,tower_http=debug".into()),
        )
        .init();

    let config = Config::from_env()?;

    // Init database
    let db = Arc::new(sezora_db::Database::open(&config.db_path, config.feed_capacity)?);

    // Signup refuses the admin email; the account only comes from here.
    match &config.admin_password {
        Some(password) => {
            if !sezora_api::auth::ensure_admin(&db, &config.admin_email, password)? {
                info!("Admin account {} already exists", config.admin_email);
            }
        }
        None => warn!(
            "SEZORA_ADMIN_PASSWORD is not set; no admin account is created for {}",
            config.admin_email
        ),
    }

    let api_state = Arc::new(AppStateInner {
        db: db.clone(),
        jwt_secret: config.jwt_secret.clone(),
        admin_email: config.admin_email.clone(),
    });

    let gateway = GatewayContext {
        db,
        jwt_secret: config.jwt_secret.clone(),
        admin_email: config.admin_email.clone(),
    };

    let ws_route = Router::new()
        .route("/gateway", get(ws_upgrade))
        .with_state(gateway);

    let app = Router::new()
        .merge(sezora_api::router(api_state))
        .merge(ws_route)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr = config.addr()?;
    info!("Sezora server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn ws_upgrade(State(ctx): State<GatewayContext>, ws: WebSocketUpgrade) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_connection(socket, ctx))
}

mod handlers;
pub mod middleware;

use std::sync::{Arc, Mutex};

use axum::{
    http::HeaderValue,
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::db::Database;
use crate::draw::DrawRng;
use crate::images::ImageStore;
use crate::reveal::{BoardRegistry, Clock, TokioClock};

use middleware::SecurityConfig;

/// Shared state behind every handler.
///
/// Everything is cheaply cloneable: the database and board registry are
/// handles over shared interiors, the clock is a capability injected so
/// tests can run the reveal cascade on virtual time.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub boards: BoardRegistry,
    pub clock: Arc<dyn Clock>,
    pub rng: Arc<Mutex<DrawRng>>,
    pub images: ImageStore,
}

impl AppState {
    /// Production wiring: real timers, entropy-seeded draws, image store
    /// from the environment.
    pub fn new(db: Database) -> Self {
        Self {
            db,
            boards: BoardRegistry::new(),
            clock: Arc::new(TokioClock),
            rng: Arc::new(Mutex::new(DrawRng::from_entropy())),
            images: ImageStore::from_env(),
        }
    }
}

pub fn create_router(state: AppState) -> Router {
    create_router_with_security(state, SecurityConfig::from_env())
}

pub fn create_router_with_security(state: AppState, security: SecurityConfig) -> Router {
    let api = Router::new()
        // Card catalog
        .route("/cards", get(handlers::list_cards))
        .route("/cards", post(handlers::create_card))
        .route("/cards/{id}", get(handlers::get_card))
        .route("/cards/{id}/image", get(handlers::get_card_image))
        // Players
        .route("/players", get(handlers::list_players))
        .route("/players", post(handlers::create_player))
        .route("/players/{id}", get(handlers::get_player))
        .route("/players/{id}/draw", post(handlers::daily_draw))
        .route("/players/{id}/cards", get(handlers::get_player_cards))
        .route("/players/{id}/sacrifice", post(handlers::sacrifice))
        .route("/players/{id}/exchange", post(handlers::deposit_offer))
        .route(
            "/players/{id}/exchange/{offer_id}/take",
            post(handlers::take_offer),
        )
        // Exchange board and ranking
        .route("/exchange", get(handlers::list_offers))
        .route("/ranking", get(handlers::get_ranking))
        // Reveal boards
        .route("/draws/{id}", get(handlers::get_board))
        // Health
        .route("/health", get(handlers::health));

    let mut router = Router::new()
        .nest("/api/v1", api.with_state(state))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(&security));

    if let Some(limiter) = security.rate_limiter.clone() {
        router = router.layer(axum::middleware::from_fn_with_state(
            limiter,
            middleware::rate_limit_middleware,
        ));
    }
    if security.api_key.is_some() {
        router = router.layer(axum::middleware::from_fn_with_state(
            security,
            middleware::auth_middleware,
        ));
    }

    router
}

fn cors_layer(security: &SecurityConfig) -> CorsLayer {
    match &security.cors_origins {
        Some(origins) => {
            let origins: Vec<HeaderValue> =
                origins.iter().filter_map(|o| o.parse().ok()).collect();
            CorsLayer::new()
                .allow_origin(origins)
                .allow_methods(Any)
                .allow_headers(Any)
        }
        None => CorsLayer::permissive(),
    }
}

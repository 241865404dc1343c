use std::time::Duration;

use axum::{Router, response::Json, routing::get};
use sqlx::sqlite::SqlitePool;
use tower_http::cors::{Any, CorsLayer};
use tower_http::normalize_path::NormalizePath;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::db::{self, EntityQuery};
use crate::error::ApiError;
use crate::models::Envelope;

pub mod games;
pub mod health;
pub mod players;
pub mod tournaments;

/// Runs one entity query and wraps the rows, or reports `not_found` when
/// nothing matched.
pub async fn query_envelope(
    pool: &SqlitePool,
    query: EntityQuery,
    not_found: impl FnOnce() -> String,
) -> Result<Json<Envelope>, ApiError> {
    let rows = db::fetch_rows(pool, &query).await?;

    if rows.is_empty() {
        return Err(ApiError::NotFound(not_found()));
    }

    Ok(Json(Envelope::new(query.entity, rows)))
}

/// The router behind trailing-slash normalization, so `/games/` is served
/// like `/games`. Must wrap the router; a router layer runs after matching.
pub fn app(pool: SqlitePool, request_timeout: Duration) -> NormalizePath<Router> {
    NormalizePath::trim_trailing_slash(router(pool, request_timeout))
}

pub fn router(pool: SqlitePool, request_timeout: Duration) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(|| async { concat!("Game Stats API - v", env!("CARGO_PKG_VERSION")) }))
        .route("/health", get(health::health_check))

        // Game endpoints
        .route("/games", get(games::get_games))
        .route("/games/details/{id}", get(games::get_game_by_id))
        .route("/games/genre/{genre}", get(games::get_games_by_genre))
        .route("/games/platform/{platform}", get(games::get_games_by_platform))
        .route("/games/sort-by-rating", get(games::get_games_sorted_by_rating))

        // Player endpoints
        .route("/players", get(players::get_players))
        .route("/players/details/{id}", get(players::get_player_by_id))
        .route("/players/platform/{platform}", get(players::get_players_by_platform))
        .route("/players/sort-by-rating", get(players::get_players_sorted_by_rating))

        // Tournament endpoints
        .route("/tournaments", get(tournaments::get_tournaments))
        .route("/tournaments/details/{id}", get(tournaments::get_tournament_by_id))
        .route("/tournaments/game/{game_id}", get(tournaments::get_tournaments_by_game_id))
        .route(
            "/tournaments/sort-by-prize-pool",
            get(tournaments::get_tournaments_sorted_by_prize_pool),
        )

        .layer(TimeoutLayer::new(request_timeout))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(pool)
}

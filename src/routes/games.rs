use axum::{
    extract::{Path, State},
    response::Json,
};
use sqlx::sqlite::SqlitePool;

use crate::db::{Bind, EntityQuery};
use crate::error::ApiError;
use crate::models::{Entity, Envelope, LenientInt};
use super::query_envelope;

// GET /games - List all games
pub async fn get_games(State(pool): State<SqlitePool>) -> Result<Json<Envelope>, ApiError> {
    query_envelope(&pool, EntityQuery::all(Entity::Game), || {
        "No Games found.".to_string()
    })
    .await
}

// GET /games/details/:id - Get game by ID
pub async fn get_game_by_id(
    State(pool): State<SqlitePool>,
    Path(id): Path<String>,
) -> Result<Json<Envelope>, ApiError> {
    let id = LenientInt::parse(&id);
    let query = EntityQuery::all(Entity::Game).filter_eq("id", Bind::from(id));

    query_envelope(&pool, query, || format!("No Games found by ID: {id}")).await
}

// GET /games/genre/:genre - Get games by genre
pub async fn get_games_by_genre(
    State(pool): State<SqlitePool>,
    Path(genre): Path<String>,
) -> Result<Json<Envelope>, ApiError> {
    let query = EntityQuery::all(Entity::Game).filter_eq("genre", Bind::Text(genre.clone()));

    query_envelope(&pool, query, || format!("No Games found by genre: {genre}")).await
}

// GET /games/platform/:platform - Get games by platform
pub async fn get_games_by_platform(
    State(pool): State<SqlitePool>,
    Path(platform): Path<String>,
) -> Result<Json<Envelope>, ApiError> {
    let query = EntityQuery::all(Entity::Game).filter_eq("platform", Bind::Text(platform.clone()));

    query_envelope(&pool, query, || format!("No Games found by platform: {platform}")).await
}

// GET /games/sort-by-rating - Get games, highest rated first
pub async fn get_games_sorted_by_rating(
    State(pool): State<SqlitePool>,
) -> Result<Json<Envelope>, ApiError> {
    let query = EntityQuery::all(Entity::Game).sorted_desc("rating");

    query_envelope(&pool, query, || "No Games found".to_string()).await
}

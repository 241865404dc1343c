use axum::{
    extract::{Path, State},
    response::Json,
};
use sqlx::sqlite::SqlitePool;

use crate::db::{Bind, EntityQuery};
use crate::error::ApiError;
use crate::models::{Entity, Envelope, LenientInt};
use super::query_envelope;

// GET /players - List all players
pub async fn get_players(State(pool): State<SqlitePool>) -> Result<Json<Envelope>, ApiError> {
    query_envelope(&pool, EntityQuery::all(Entity::Player), || {
        "No players found.".to_string()
    })
    .await
}

// GET /players/details/:id - Get player by ID
pub async fn get_player_by_id(
    State(pool): State<SqlitePool>,
    Path(id): Path<String>,
) -> Result<Json<Envelope>, ApiError> {
    let id = LenientInt::parse(&id);
    let query = EntityQuery::all(Entity::Player).filter_eq("id", Bind::from(id));

    query_envelope(&pool, query, || format!("No players found with ID: {id}")).await
}

// GET /players/platform/:platform - Get players by platform
pub async fn get_players_by_platform(
    State(pool): State<SqlitePool>,
    Path(platform): Path<String>,
) -> Result<Json<Envelope>, ApiError> {
    let query =
        EntityQuery::all(Entity::Player).filter_eq("platform", Bind::Text(platform.clone()));

    query_envelope(&pool, query, || {
        format!("No players found with platform: {platform}")
    })
    .await
}

// GET /players/sort-by-rating - Get players, highest rated first
pub async fn get_players_sorted_by_rating(
    State(pool): State<SqlitePool>,
) -> Result<Json<Envelope>, ApiError> {
    let query = EntityQuery::all(Entity::Player).sorted_desc("rating");

    query_envelope(&pool, query, || "No players found".to_string()).await
}

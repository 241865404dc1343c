use axum::{
    extract::{Path, State},
    response::Json,
};
use sqlx::sqlite::SqlitePool;

use crate::db::{Bind, EntityQuery};
use crate::error::ApiError;
use crate::models::{Entity, Envelope, LenientInt};
use super::query_envelope;

// GET /tournaments - List all tournaments
pub async fn get_tournaments(State(pool): State<SqlitePool>) -> Result<Json<Envelope>, ApiError> {
    query_envelope(&pool, EntityQuery::all(Entity::Tournament), || {
        "No tournaments found.".to_string()
    })
    .await
}

// GET /tournaments/details/:id - Get tournament by ID
pub async fn get_tournament_by_id(
    State(pool): State<SqlitePool>,
    Path(id): Path<String>,
) -> Result<Json<Envelope>, ApiError> {
    let id = LenientInt::parse(&id);
    let query = EntityQuery::all(Entity::Tournament).filter_eq("id", Bind::from(id));

    query_envelope(&pool, query, || format!("No tournaments found with id: {id}")).await
}

// GET /tournaments/game/:gameId - Get tournaments for one game
pub async fn get_tournaments_by_game_id(
    State(pool): State<SqlitePool>,
    Path(game_id): Path<String>,
) -> Result<Json<Envelope>, ApiError> {
    let game_id = LenientInt::parse(&game_id);
    let query =
        EntityQuery::all(Entity::Tournament).filter_eq("gameId", Bind::from(game_id));

    query_envelope(&pool, query, || {
        format!("No tournaments found with gameId: {game_id}")
    })
    .await
}

// GET /tournaments/sort-by-prize-pool - Get tournaments, largest prize pool first
pub async fn get_tournaments_sorted_by_prize_pool(
    State(pool): State<SqlitePool>,
) -> Result<Json<Envelope>, ApiError> {
    let query = EntityQuery::all(Entity::Tournament).sorted_desc("prizePool");

    query_envelope(&pool, query, || "No tournaments found".to_string()).await
}

use std::path::{Path, PathBuf};

use serde_json::{Number, Value};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::{Column, Row as _, TypeInfo, ValueRef};
use thiserror::Error;

use crate::config::Config;
use crate::models::{Entity, LenientInt, Row};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("seed database {path} could not be copied: {source}")]
    Seed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to open database: {0}")]
    Connect(#[from] sqlx::Error),
}

/// Copies the packaged seed into place if the working copy is missing, then
/// opens a pool on the working copy.
pub async fn open(config: &Config) -> Result<SqlitePool, StoreError> {
    bootstrap(&config.seed_database_path, &config.database_path).await?;

    let options = SqliteConnectOptions::new()
        .filename(&config.database_path)
        .create_if_missing(false);

    let pool = SqlitePoolOptions::new()
        .max_connections(config.max_connections)
        .connect_with(options)
        .await?;

    Ok(pool)
}

async fn bootstrap(seed: &Path, working: &Path) -> Result<(), StoreError> {
    if tokio::fs::try_exists(working).await.unwrap_or(false) {
        return Ok(());
    }

    if let Some(parent) = working.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|source| StoreError::Seed {
                path: seed.to_path_buf(),
                source,
            })?;
    }

    tokio::fs::copy(seed, working)
        .await
        .map_err(|source| StoreError::Seed {
            path: seed.to_path_buf(),
            source,
        })?;

    tracing::info!("Copied seed database {} to {}", seed.display(), working.display());
    Ok(())
}

/// Value bound into a single-column equality filter.
#[derive(Debug, Clone, PartialEq)]
pub enum Bind {
    Int(Option<i64>),
    Real(f64),
    Text(String),
}

impl From<LenientInt> for Bind {
    fn from(value: LenientInt) -> Self {
        match value {
            LenientInt::Int(n) => Bind::Int(Some(n)),
            LenientInt::Float(x) => Bind::Real(x),
            LenientInt::NaN => Bind::Int(None),
        }
    }
}

/// One fixed SELECT against one table: an optional `column = ?` filter and
/// an optional descending sort. Column names come from the route table,
/// never from the request.
#[derive(Debug, Clone)]
pub struct EntityQuery {
    pub entity: Entity,
    pub filter: Option<(&'static str, Bind)>,
    pub sort_desc: Option<&'static str>,
}

impl EntityQuery {
    pub fn all(entity: Entity) -> Self {
        Self {
            entity,
            filter: None,
            sort_desc: None,
        }
    }

    pub fn filter_eq(mut self, column: &'static str, value: Bind) -> Self {
        self.filter = Some((column, value));
        self
    }

    pub fn sorted_desc(mut self, column: &'static str) -> Self {
        self.sort_desc = Some(column);
        self
    }

    pub fn sql(&self) -> String {
        let mut sql = format!("SELECT * FROM {}", self.entity.table());
        if let Some((column, _)) = &self.filter {
            sql.push_str(&format!(" WHERE {column} = ?"));
        }
        if let Some(column) = self.sort_desc {
            sql.push_str(&format!(" ORDER BY {column} DESC"));
        }
        sql
    }
}

pub async fn fetch_rows(pool: &SqlitePool, query: &EntityQuery) -> Result<Vec<Row>, sqlx::Error> {
    let sql = query.sql();
    let mut q = sqlx::query(&sql);
    match &query.filter {
        Some((_, Bind::Int(value))) => q = q.bind(*value),
        Some((_, Bind::Real(value))) => q = q.bind(*value),
        Some((_, Bind::Text(value))) => q = q.bind(value.as_str()),
        None => {}
    }

    let rows = q.fetch_all(pool).await?;
    rows.iter().map(row_to_json).collect()
}

/// Serializes every column of a row, by the storage class of each value.
fn row_to_json(row: &SqliteRow) -> Result<Row, sqlx::Error> {
    let mut out = Row::new();

    for column in row.columns() {
        let idx = column.ordinal();
        let raw = row.try_get_raw(idx)?;

        let value = if raw.is_null() {
            Value::Null
        } else {
            let type_name = raw.type_info().name().to_owned();
            match type_name.as_str() {
                "INTEGER" => Value::from(row.try_get_unchecked::<i64, _>(idx)?),
                "BOOLEAN" => Value::from(row.try_get_unchecked::<bool, _>(idx)?),
                "REAL" | "NUMERIC" => real_to_json(row.try_get_unchecked::<f64, _>(idx)?),
                "BLOB" => Value::from(row.try_get_unchecked::<Vec<u8>, _>(idx)?),
                _ => Value::from(row.try_get_unchecked::<String, _>(idx)?),
            }
        };

        out.insert(column.name().to_owned(), value);
    }

    Ok(out)
}

/// Whole doubles within the exactly representable integer range are written
/// without a fractional part, so `5.0` goes out as `5`.
fn real_to_json(value: f64) -> Value {
    const MAX_EXACT: f64 = 9_007_199_254_740_992.0;

    if value.fract() == 0.0 && value.abs() <= MAX_EXACT {
        Value::from(value as i64)
    } else {
        Number::from_f64(value)
            .map(Value::Number)
            .unwrap_or(Value::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    async fn memory_pool() -> SqlitePool {
        SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap()
    }

    #[test]
    fn sql_for_each_access_pattern() {
        assert_eq!(EntityQuery::all(Entity::Game).sql(), "SELECT * FROM games");
        assert_eq!(
            EntityQuery::all(Entity::Player)
                .filter_eq("platform", Bind::Text("PC".into()))
                .sql(),
            "SELECT * FROM players WHERE platform = ?"
        );
        assert_eq!(
            EntityQuery::all(Entity::Tournament).sorted_desc("prizePool").sql(),
            "SELECT * FROM tournaments ORDER BY prizePool DESC"
        );
    }

    #[tokio::test]
    async fn rows_keep_column_order_and_storage_classes() {
        let pool = memory_pool().await;
        sqlx::query("CREATE TABLE games (id INTEGER, title TEXT, rating REAL, cover BLOB, notes TEXT)")
            .execute(&pool)
            .await
            .unwrap();
        sqlx::query("INSERT INTO games VALUES (1, 'Halo', 4.5, x'0102', NULL)")
            .execute(&pool)
            .await
            .unwrap();

        let rows = fetch_rows(&pool, &EntityQuery::all(Entity::Game)).await.unwrap();

        assert_eq!(rows.len(), 1);
        let keys: Vec<&str> = rows[0].keys().map(String::as_str).collect();
        assert_eq!(keys, ["id", "title", "rating", "cover", "notes"]);
        assert_eq!(
            Value::Object(rows[0].clone()),
            json!({ "id": 1, "title": "Halo", "rating": 4.5, "cover": [1, 2], "notes": null })
        );
    }

    #[tokio::test]
    async fn null_int_bind_matches_nothing() {
        let pool = memory_pool().await;
        sqlx::query("CREATE TABLE players (id INTEGER)")
            .execute(&pool)
            .await
            .unwrap();
        sqlx::query("INSERT INTO players VALUES (1)")
            .execute(&pool)
            .await
            .unwrap();

        let query = EntityQuery::all(Entity::Player).filter_eq("id", Bind::Int(None));
        let rows = fetch_rows(&pool, &query).await.unwrap();

        assert!(rows.is_empty());
    }

    #[tokio::test]
    async fn whole_reals_are_written_as_integers() {
        let pool = memory_pool().await;
        sqlx::query("CREATE TABLE games (id INTEGER, rating REAL)")
            .execute(&pool)
            .await
            .unwrap();
        sqlx::query("INSERT INTO games VALUES (1, 5.0), (2, 4.5), (3, -2.0)")
            .execute(&pool)
            .await
            .unwrap();

        let rows = fetch_rows(&pool, &EntityQuery::all(Entity::Game)).await.unwrap();
        let text = serde_json::to_string(&rows).unwrap();

        assert_eq!(
            text,
            r#"[{"id":1,"rating":5},{"id":2,"rating":4.5},{"id":3,"rating":-2}]"#
        );
    }

    #[test]
    fn real_to_json_edge_values() {
        assert_eq!(real_to_json(0.0), json!(0));
        assert_eq!(real_to_json(1e20), json!(1e20));
        assert_eq!(real_to_json(f64::NAN), Value::Null);
    }

    #[tokio::test]
    async fn overflowed_id_binds_as_real_and_matches_nothing() {
        let pool = memory_pool().await;
        sqlx::query("CREATE TABLE players (id INTEGER)")
            .execute(&pool)
            .await
            .unwrap();
        sqlx::query("INSERT INTO players VALUES (1)")
            .execute(&pool)
            .await
            .unwrap();

        let id = LenientInt::parse("99999999999999999999");
        assert_eq!(Bind::from(id), Bind::Real(1e20));

        let query = EntityQuery::all(Entity::Player).filter_eq("id", Bind::from(id));
        assert!(fetch_rows(&pool, &query).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn missing_table_is_an_error() {
        let pool = memory_pool().await;
        let err = fetch_rows(&pool, &EntityQuery::all(Entity::Tournament))
            .await
            .unwrap_err();

        assert!(err.to_string().contains("no such table: tournaments"));
    }

    #[tokio::test]
    async fn bootstrap_copies_seed_only_when_missing() {
        let dir = std::env::temp_dir().join(format!("game_stats_api_bootstrap_{}", std::process::id()));
        let _ = tokio::fs::remove_dir_all(&dir).await;
        tokio::fs::create_dir_all(&dir).await.unwrap();
        let seed = dir.join("seed.sqlite");
        let working = dir.join("work").join("database.sqlite");

        tokio::fs::write(&seed, b"first").await.unwrap();
        bootstrap(&seed, &working).await.unwrap();
        assert_eq!(tokio::fs::read(&working).await.unwrap(), b"first");

        tokio::fs::write(&seed, b"second").await.unwrap();
        bootstrap(&seed, &working).await.unwrap();
        assert_eq!(tokio::fs::read(&working).await.unwrap(), b"first");

        tokio::fs::remove_dir_all(&dir).await.unwrap();
    }

    #[tokio::test]
    async fn bootstrap_without_seed_fails() {
        let dir = std::env::temp_dir().join(format!("game_stats_api_noseed_{}", std::process::id()));
        let err = bootstrap(&dir.join("missing.sqlite"), &dir.join("database.sqlite"))
            .await
            .unwrap_err();

        assert!(matches!(err, StoreError::Seed { .. }));
        let _ = tokio::fs::remove_dir_all(&dir).await;
    }
}

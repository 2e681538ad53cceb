use std::str::FromStr;

use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use tracing::{debug, info};

use super::model::*;
use super::repo::*;

pub struct SqliteRepository {
    pool: SqlitePool,
}

impl SqliteRepository {
    pub async fn new(db_path: &str, max_connections: u32) -> DbResult<Self> {
        let options = SqliteConnectOptions::from_str(db_path)?
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await?;

        let repo = Self { pool };

        repo.init_schema().await?;

        info!("Database initialized at {}", db_path);

        Ok(repo)
    }

    async fn init_schema(&self) -> DbResult<()> {
        let schema = include_str!("schema.sql");
        sqlx::raw_sql(schema).execute(&self.pool).await?;
        Ok(())
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

fn on_unique_violation(e: sqlx::Error, what: impl FnOnce() -> DbError) -> DbError {
    match e {
        sqlx::Error::Database(ref db) if db.is_unique_violation() => what(),
        _ => DbError::Sqlx(e),
    }
}

fn on_foreign_key_violation(e: sqlx::Error, what: impl FnOnce() -> DbError) -> DbError {
    match e {
        sqlx::Error::Database(ref db) if db.is_foreign_key_violation() => what(),
        _ => DbError::Sqlx(e),
    }
}

#[async_trait]
impl UserRepo for SqliteRepository {
    async fn create_user(&self, email: &str, hashed_password: &str) -> DbResult<User> {
        let user = sqlx::query_as::<_, User>(
            "INSERT INTO users (email, hashed_password, is_active) VALUES (?, ?, 1)
             RETURNING id, email, hashed_password, is_active",
        )
        .bind(email)
        .bind(hashed_password)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            on_unique_violation(e, || DbError::AlreadyExists(format!("User email: {}", email)))
        })?;

        debug!(id = user.id, "created user");
        Ok(user)
    }

    async fn get_user_by_email(&self, email: &str) -> DbResult<User> {
        sqlx::query_as::<_, User>(
            "SELECT id, email, hashed_password, is_active FROM users WHERE email = ? LIMIT 1",
        )
        .bind(email)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => DbError::NotFound(format!("User not found: {}", email)),
            _ => DbError::Sqlx(e),
        })
    }

    async fn get_user(&self, id: i64) -> DbResult<User> {
        sqlx::query_as::<_, User>(
            "SELECT id, email, hashed_password, is_active FROM users WHERE id = ?",
        )
        .bind(id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => DbError::NotFound(format!("User not found: {}", id)),
            _ => DbError::Sqlx(e),
        })
    }
}

#[async_trait]
impl ItemRepo for SqliteRepository {
    async fn create_item(&self, movie_id: i64, rating: f64, owner_id: i64) -> DbResult<Item> {
        sqlx::query_as::<_, Item>(
            "INSERT INTO items (owner_id, movie_id, rating) VALUES (?, ?, ?)
             RETURNING id, owner_id, movie_id, rating",
        )
        .bind(owner_id)
        .bind(movie_id)
        .bind(rating)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            on_foreign_key_violation(e, || {
                DbError::NotFound(format!("User not found: {}", owner_id))
            })
        })
    }

    async fn list_items(&self, offset: i64, limit: i64) -> DbResult<Vec<Item>> {
        let items = sqlx::query_as::<_, Item>(
            "SELECT id, owner_id, movie_id, rating FROM items ORDER BY id LIMIT ? OFFSET ?",
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }

    async fn list_items_by_owner(&self, owner_id: i64) -> DbResult<Vec<Item>> {
        let items = sqlx::query_as::<_, Item>(
            "SELECT id, owner_id, movie_id, rating FROM items WHERE owner_id = ? ORDER BY id",
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }
}

#[async_trait]
impl MovieRepo for SqliteRepository {
    async fn get_movie(&self, movie_id: i64) -> DbResult<Movie> {
        sqlx::query_as::<_, Movie>(
            "SELECT movie_id, title, genres, poster FROM movies WHERE movie_id = ?",
        )
        .bind(movie_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => DbError::NotFound(format!("Movie not found: {}", movie_id)),
            _ => DbError::Sqlx(e),
        })
    }

    async fn get_poster(&self, movie_id: i64) -> DbResult<Movie> {
        // Same row as get_movie; the api layer only projects the poster.
        self.get_movie(movie_id).await
    }

    async fn insert_movie(&self, movie: &Movie) -> DbResult<Movie> {
        sqlx::query_as::<_, Movie>(
            "INSERT INTO movies (movie_id, title, genres, poster) VALUES (?, ?, ?, ?)
             RETURNING movie_id, title, genres, poster",
        )
        .bind(movie.movie_id)
        .bind(&movie.title)
        .bind(&movie.genres)
        .bind(&movie.poster)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            on_unique_violation(e, || {
                DbError::AlreadyExists(format!("Movie id: {}", movie.movie_id))
            })
        })
    }
}

#[async_trait]
impl RecommendationRepo for SqliteRepository {
    async fn list_recommendations(&self, offset: i64, limit: i64) -> DbResult<Vec<Recommendation>> {
        let results = sqlx::query_as::<_, Recommendation>(
            "SELECT id, title, movie_id, user_id FROM recommend ORDER BY id LIMIT ? OFFSET ?",
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(results)
    }

    async fn insert_recommendation(
        &self,
        title: &str,
        movie_id: i64,
        user_id: i64,
    ) -> DbResult<Recommendation> {
        let rec = sqlx::query_as::<_, Recommendation>(
            "INSERT INTO recommend (title, movie_id, user_id) VALUES (?, ?, ?)
             RETURNING id, title, movie_id, user_id",
        )
        .bind(title)
        .bind(movie_id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(rec)
    }
}

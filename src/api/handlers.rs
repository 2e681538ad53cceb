use axum::{
    extract::{Path, Query, State},
    Json,
};
use tracing::info;

use super::error::{not_found, ApiError};
use super::types::*;
use crate::db::DbError;
use crate::server::AppState;

pub async fn create_user(
    State(state): State<AppState>,
    Json(req): Json<UserCreate>,
) -> Result<Json<User>, ApiError> {
    let cost = state.config.auth.bcrypt_cost;
    let password = req.password;
    let hashed = tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
        .await
        .map_err(|e| ApiError::Internal(format!("Password hash task failed: {}", e)))?
        .map_err(|e| ApiError::Internal(format!("Failed to hash password: {}", e)))?;

    // The UNIQUE constraint on email decides; there is no lookup first.
    let user = state
        .db
        .create_user(&req.email, &hashed)
        .await
        .map_err(|e| match e {
            DbError::AlreadyExists(_) => ApiError::Conflict("Email already registered"),
            _ => ApiError::Database(e),
        })?;

    info!(user_id = user.id, "registered user");

    Ok(Json(User::from_row(user, Vec::new())))
}

pub async fn get_user(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> Result<Json<User>, ApiError> {
    let user = state
        .db
        .get_user(user_id)
        .await
        .map_err(not_found("User not found"))?;

    let items = state.db.list_items_by_owner(user.id).await?;

    Ok(Json(User::from_row(user, items)))
}

pub async fn create_item_for_user(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
    Json(req): Json<ItemCreate>,
) -> Result<Json<Item>, ApiError> {
    let item = state
        .db
        .create_item(req.movie_id, req.rating, user_id)
        .await
        .map_err(not_found("User not found"))?;

    Ok(Json(item.into()))
}

pub async fn list_items(
    State(state): State<AppState>,
    Query(page): Query<Pagination>,
) -> Result<Json<Vec<Item>>, ApiError> {
    let items = state
        .db
        .list_items(page.skip.into(), page.limit.into())
        .await?;
    Ok(Json(items.into_iter().map(Item::from).collect()))
}

pub async fn get_movie(
    State(state): State<AppState>,
    Query(query): Query<MovieQuery>,
) -> Result<Json<Movie>, ApiError> {
    let movie = state
        .db
        .get_movie(query.movie_id)
        .await
        .map_err(not_found("Movie not found"))?;

    Ok(Json(movie.into()))
}

pub async fn get_poster(
    State(state): State<AppState>,
    Query(query): Query<MovieQuery>,
) -> Result<Json<Poster>, ApiError> {
    let movie = state
        .db
        .get_poster(query.movie_id)
        .await
        .map_err(not_found("Poster not found"))?;

    Ok(Json(movie.into()))
}

pub async fn list_recommendations(
    State(state): State<AppState>,
    Query(page): Query<Pagination>,
) -> Result<Json<Vec<Recommend>>, ApiError> {
    let recs = state
        .db
        .list_recommendations(page.skip.into(), page.limit.into())
        .await?;
    Ok(Json(recs.into_iter().map(Recommend::from).collect()))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::{to_bytes, Body},
        http::{header, Method, Request, StatusCode},
        Router,
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::config::Config;
    use crate::db::{self, SqliteRepository};
    use crate::server::{build_app, AppState};

    async fn test_state() -> (AppState, Arc<SqliteRepository>) {
        let mut config = Config::default();
        config.auth.bcrypt_cost = 4;
        let repo = Arc::new(SqliteRepository::new("sqlite::memory:", 1).await.unwrap());
        (AppState::new(config, repo.clone()), repo)
    }

    async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(v) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(v.to_string())
            }
            None => Body::empty(),
        };
        let response = app.clone().oneshot(builder.body(body).unwrap()).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    #[tokio::test]
    async fn test_create_user_then_fetch() {
        let (state, repo) = test_state().await;
        let app = build_app(state);

        let (status, user) = send(
            &app,
            Method::POST,
            "/users/",
            Some(json!({"email": "ann@example.com", "password": "hunter2"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(user["email"], "ann@example.com");
        assert_eq!(user["is_active"], true);
        assert!(user.get("password").is_none());
        assert!(user.get("hashed_password").is_none());

        let id = user["id"].as_i64().unwrap();
        let (status, fetched) = send(&app, Method::GET, &format!("/users/{}", id), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(fetched["email"], "ann@example.com");

        use crate::db::UserRepo;
        let row = repo.get_user_by_email("ann@example.com").await.unwrap();
        assert_eq!(row.id, id);
        assert!(bcrypt::verify("hunter2", &row.hashed_password).unwrap());
    }

    #[tokio::test]
    async fn test_duplicate_email_is_conflict() {
        let (state, _repo) = test_state().await;
        let app = build_app(state);
        let body = json!({"email": "dup@example.com", "password": "pw"});

        let (status, _) = send(&app, Method::POST, "/users/", Some(body.clone())).await;
        assert_eq!(status, StatusCode::OK);

        let (status, err) = send(&app, Method::POST, "/users/", Some(body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(err["detail"], "Email already registered");

        let (status, _) = send(&app, Method::GET, "/users/2", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_unknown_ids_are_not_found() {
        let (state, _repo) = test_state().await;
        let app = build_app(state);

        let (status, err) = send(&app, Method::GET, "/users/999", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(err["detail"], "User not found");

        let (status, err) = send(&app, Method::GET, "/movies/?movie_id=999", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(err["detail"], "Movie not found");

        let (status, err) = send(&app, Method::GET, "/poster/?movie_id=999", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(err["detail"], "Poster not found");

        let (status, err) = send(
            &app,
            Method::POST,
            "/users/999/items/",
            Some(json!({"movieId": 1, "rating": 5.0})),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(err["detail"], "User not found");
    }

    #[tokio::test]
    async fn test_items_round_trip_and_paging() {
        let (state, _repo) = test_state().await;
        let app = build_app(state);

        let (_, user) = send(
            &app,
            Method::POST,
            "/users",
            Some(json!({"email": "rater@example.com", "password": "pw"})),
        )
        .await;
        let user_id = user["id"].as_i64().unwrap();

        let uri = format!("/users/{}/items/", user_id);
        let (status, first) = send(
            &app,
            Method::POST,
            &uri,
            Some(json!({"movieId": 1, "rating": 4.5})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(first["owner_id"], user_id);
        assert_eq!(first["movieId"], 1);
        assert_eq!(first["rating"], 4.5);

        let (_, second) = send(
            &app,
            Method::POST,
            &uri,
            Some(json!({"movieId": 2, "rating": 3.0})),
        )
        .await;

        let (status, page) = send(&app, Method::GET, "/items/?skip=0&limit=1", None).await;
        assert_eq!(status, StatusCode::OK);
        let page = page.as_array().unwrap();
        assert_eq!(page.len(), 1);
        assert_eq!(page[0]["id"], first["id"]);

        let (_, all) = send(&app, Method::GET, "/items/", None).await;
        let ids: Vec<&Value> = all.as_array().unwrap().iter().map(|i| &i["id"]).collect();
        assert!(ids.contains(&&second["id"]));

        let (_, owner) = send(&app, Method::GET, &format!("/users/{}", user_id), None).await;
        assert_eq!(owner["items"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_negative_paging_is_rejected() {
        let (state, _repo) = test_state().await;
        let app = build_app(state);

        let (_, user) = send(
            &app,
            Method::POST,
            "/users/",
            Some(json!({"email": "pager@example.com", "password": "pw"})),
        )
        .await;
        let uri = format!("/users/{}/items/", user["id"].as_i64().unwrap());
        for movie_id in 1..=3 {
            send(
                &app,
                Method::POST,
                &uri,
                Some(json!({"movieId": movie_id, "rating": 2.5})),
            )
            .await;
        }

        for uri in [
            "/items/?skip=0&limit=-1",
            "/items/?skip=-5&limit=2",
            "/recommend/?limit=-1",
            "/recommend/?skip=-1",
        ] {
            let (status, _) = send(&app, Method::GET, uri, None).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{}", uri);
        }

        let (status, page) = send(&app, Method::GET, "/items/?skip=1&limit=1", None).await;
        assert_eq!(status, StatusCode::OK);
        let page = page.as_array().unwrap();
        assert_eq!(page.len(), 1);
        assert_eq!(page[0]["movieId"], 2);
    }

    #[tokio::test]
    async fn test_movie_poster_and_recommendations() {
        use crate::db::{MovieRepo, RecommendationRepo};

        let (state, repo) = test_state().await;
        repo.insert_movie(&db::Movie {
            movie_id: 318,
            title: "Shawshank Redemption, The (1994)".to_string(),
            genres: "Crime|Drama".to_string(),
            poster: Some("https://example.com/318.jpg".to_string()),
        })
        .await
        .unwrap();
        repo.insert_recommendation("Shawshank Redemption, The (1994)", 318, 1)
            .await
            .unwrap();
        let app = build_app(state);

        let (status, movie) = send(&app, Method::GET, "/movies/?movie_id=318", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(movie["movieId"], 318);
        assert_eq!(movie["genres"], "Crime|Drama");
        assert!(movie.get("poster").is_none());

        let (status, poster) = send(&app, Method::GET, "/poster/?movie_id=318", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(poster, json!({"poster": "https://example.com/318.jpg"}));

        let (status, recs) = send(&app, Method::GET, "/recommend/?skip=0&limit=10", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(recs[0]["movieId"], 318);
        assert_eq!(recs[0]["userId"], 1);

        let (_, recs) = send(&app, Method::GET, "/recommend/?skip=1", None).await;
        assert_eq!(recs, json!([]));
    }
}

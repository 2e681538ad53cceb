use serde::{Deserialize, Serialize};

use crate::db;

// Wire shapes keep the field names existing clients already send and read.

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserCreate {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub email: String,
    pub id: i64,
    pub is_active: bool,
    #[serde(default)]
    pub items: Vec<Item>,
}

impl User {
    pub fn from_row(user: db::User, items: Vec<db::Item>) -> Self {
        Self {
            email: user.email,
            id: user.id,
            is_active: user.is_active,
            items: items.into_iter().map(Item::from).collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemCreate {
    #[serde(rename = "movieId")]
    pub movie_id: i64,
    pub rating: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Item {
    #[serde(rename = "movieId")]
    pub movie_id: i64,
    pub rating: f64,
    pub id: i64,
    pub owner_id: i64,
}

impl From<db::Item> for Item {
    fn from(item: db::Item) -> Self {
        Self {
            movie_id: item.movie_id,
            rating: item.rating,
            id: item.id,
            owner_id: item.owner_id,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Movie {
    #[serde(rename = "movieId")]
    pub movie_id: i64,
    pub title: String,
    pub genres: String,
}

impl From<db::Movie> for Movie {
    fn from(movie: db::Movie) -> Self {
        Self {
            movie_id: movie.movie_id,
            title: movie.title,
            genres: movie.genres,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Poster {
    pub poster: Option<String>,
}

impl From<db::Movie> for Poster {
    fn from(movie: db::Movie) -> Self {
        Self {
            poster: movie.poster,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recommend {
    pub id: i64,
    pub title: String,
    #[serde(rename = "movieId")]
    pub movie_id: i64,
    #[serde(rename = "userId")]
    pub user_id: i64,
}

impl From<db::Recommendation> for Recommend {
    fn from(rec: db::Recommendation) -> Self {
        Self {
            id: rec.id,
            title: rec.title,
            movie_id: rec.movie_id,
            user_id: rec.user_id,
        }
    }
}

/// `skip` / `limit` query parameters for list endpoints. Unsigned, so a
/// negative value is a 400 from the extractor rather than an unbounded
/// `LIMIT -1` in SQLite.
#[derive(Debug, Clone, Deserialize)]
pub struct Pagination {
    #[serde(default)]
    pub skip: u32,
    #[serde(default = "default_limit")]
    pub limit: u32,
}

fn default_limit() -> u32 {
    100
}

#[derive(Debug, Clone, Deserialize)]
pub struct MovieQuery {
    pub movie_id: i64,
}

use async_trait::async_trait;

use super::model::*;

#[async_trait]
pub trait UserRepo: Send + Sync {
    /// Inserts a new user. A duplicate email yields `DbError::AlreadyExists`.
    async fn create_user(&self, email: &str, hashed_password: &str) -> DbResult<User>;
    async fn get_user_by_email(&self, email: &str) -> DbResult<User>;
    async fn get_user(&self, id: i64) -> DbResult<User>;
}

#[async_trait]
pub trait ItemRepo: Send + Sync {
    /// Inserts a rating owned by `owner_id`. An unknown owner yields `DbError::NotFound`.
    async fn create_item(&self, movie_id: i64, rating: f64, owner_id: i64) -> DbResult<Item>;
    async fn list_items(&self, offset: i64, limit: i64) -> DbResult<Vec<Item>>;
    async fn list_items_by_owner(&self, owner_id: i64) -> DbResult<Vec<Item>>;
}

#[async_trait]
pub trait MovieRepo: Send + Sync {
    async fn get_movie(&self, movie_id: i64) -> DbResult<Movie>;
    async fn get_poster(&self, movie_id: i64) -> DbResult<Movie>;
    async fn insert_movie(&self, movie: &Movie) -> DbResult<Movie>;
}

#[async_trait]
pub trait RecommendationRepo: Send + Sync {
    async fn list_recommendations(&self, offset: i64, limit: i64) -> DbResult<Vec<Recommendation>>;
    async fn insert_recommendation(
        &self,
        title: &str,
        movie_id: i64,
        user_id: i64,
    ) -> DbResult<Recommendation>;
}

pub trait Repository: UserRepo + ItemRepo + MovieRepo + RecommendationRepo + Send + Sync {}

impl<T> Repository for T where T: UserRepo + ItemRepo + MovieRepo + RecommendationRepo + Send + Sync {}

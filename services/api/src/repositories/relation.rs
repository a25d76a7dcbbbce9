//! Favorites, shopping cart membership and author subscriptions
//!
//! Each relation is unique per pair. Adding runs as a single
//! `INSERT .. ON CONFLICT DO NOTHING`, so `false` means the pair already
//! existed. Removing reports `false` when there was nothing to remove.

use common::error::DatabaseResult;
use sqlx::PgPool;
use std::collections::HashSet;

use crate::models::{PageQuery, user::User};

/// User-to-recipe relation kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecipeRelation {
    Favorite,
    Cart,
}

impl RecipeRelation {
    fn table(self) -> &'static str {
        match self {
            RecipeRelation::Favorite => "favorites",
            RecipeRelation::Cart => "carts",
        }
    }

    /// Human readable name used in error messages
    pub fn label(self) -> &'static str {
        match self {
            RecipeRelation::Favorite => "favorites",
            RecipeRelation::Cart => "the shopping cart",
        }
    }
}

/// Relation repository
#[derive(Clone)]
pub struct RelationRepository {
    pool: PgPool,
}

impl RelationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Link a recipe to a user; `false` when already linked
    pub async fn add_recipe(
        &self,
        relation: RecipeRelation,
        user_id: i64,
        recipe_id: i64,
    ) -> DatabaseResult<bool> {
        let inserted: Option<i64> = sqlx::query_scalar(&format!(
            "INSERT INTO {} (user_id, recipe_id) VALUES ($1, $2) \
             ON CONFLICT (user_id, recipe_id) DO NOTHING RETURNING id",
            relation.table()
        ))
        .bind(user_id)
        .bind(recipe_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(inserted.is_some())
    }

    /// Unlink a recipe from a user; `false` when it was not linked
    pub async fn remove_recipe(
        &self,
        relation: RecipeRelation,
        user_id: i64,
        recipe_id: i64,
    ) -> DatabaseResult<bool> {
        let result = sqlx::query(&format!(
            "DELETE FROM {} WHERE user_id = $1 AND recipe_id = $2",
            relation.table()
        ))
        .bind(user_id)
        .bind(recipe_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Subset of `recipe_ids` the user has linked through `relation`
    pub async fn recipes_among(
        &self,
        relation: RecipeRelation,
        user_id: i64,
        recipe_ids: &[i64],
    ) -> DatabaseResult<HashSet<i64>> {
        let ids: Vec<i64> = sqlx::query_scalar(&format!(
            "SELECT recipe_id FROM {} WHERE user_id = $1 AND recipe_id = ANY($2)",
            relation.table()
        ))
        .bind(user_id)
        .bind(recipe_ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(ids.into_iter().collect())
    }

    pub async fn favorited_among(&self, user_id: i64, recipe_ids: &[i64]) -> DatabaseResult<HashSet<i64>> {
        self.recipes_among(RecipeRelation::Favorite, user_id, recipe_ids)
            .await
    }

    pub async fn in_cart_among(&self, user_id: i64, recipe_ids: &[i64]) -> DatabaseResult<HashSet<i64>> {
        self.recipes_among(RecipeRelation::Cart, user_id, recipe_ids)
            .await
    }

    /// Subscribe `user_id` to `author_id`; `false` when already subscribed
    pub async fn follow(&self, user_id: i64, author_id: i64) -> DatabaseResult<bool> {
        let inserted: Option<i64> = sqlx::query_scalar(
            r#"
            INSERT INTO follows (user_id, author_id)
            VALUES ($1, $2)
            ON CONFLICT (user_id, author_id) DO NOTHING
            RETURNING id
            "#,
        )
        .bind(user_id)
        .bind(author_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(inserted.is_some())
    }

    /// Drop a subscription; `false` when there was none
    pub async fn unfollow(&self, user_id: i64, author_id: i64) -> DatabaseResult<bool> {
        let result = sqlx::query("DELETE FROM follows WHERE user_id = $1 AND author_id = $2")
            .bind(user_id)
            .bind(author_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Subset of `author_ids` followed by the user
    pub async fn following_among(&self, user_id: i64, author_ids: &[i64]) -> DatabaseResult<HashSet<i64>> {
        let ids: Vec<i64> = sqlx::query_scalar(
            "SELECT author_id FROM follows WHERE user_id = $1 AND author_id = ANY($2)",
        )
        .bind(user_id)
        .bind(author_ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(ids.into_iter().collect())
    }

    /// One page of authors the user follows, oldest subscription first
    pub async fn followed_authors(
        &self,
        user_id: i64,
        page: &PageQuery,
    ) -> DatabaseResult<(Vec<User>, i64)> {
        let authors = sqlx::query_as::<_, User>(
            r#"
            SELECT u.id, u.email, u.username, u.first_name, u.last_name, u.password_hash, u.created_at
            FROM follows f
            JOIN users u ON u.id = f.author_id
            WHERE f.user_id = $1
            ORDER BY f.id
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(user_id)
        .bind(page.limit() as i64)
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM follows WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await?;

        Ok((authors, count))
    }
}

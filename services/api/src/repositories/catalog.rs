//! Ingredient and tag repositories

use common::error::DatabaseResult;
use sqlx::PgPool;
use std::collections::HashMap;

use crate::models::catalog::{Ingredient, Tag};

/// Ingredient repository
#[derive(Clone)]
pub struct IngredientRepository {
    pool: PgPool,
}

impl IngredientRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// List ingredients, optionally filtered by a case-insensitive name prefix
    pub async fn list(&self, name_prefix: Option<&str>) -> DatabaseResult<Vec<Ingredient>> {
        let pattern = name_prefix
            .map(str::trim)
            .filter(|prefix| !prefix.is_empty())
            .map(|prefix| format!("{}%", escape_like(&prefix.to_lowercase())));

        let ingredients = sqlx::query_as::<_, Ingredient>(
            r#"
            SELECT id, name, measurement_unit
            FROM ingredients
            WHERE $1::TEXT IS NULL OR LOWER(name) LIKE $1
            ORDER BY name, id
            "#,
        )
        .bind(pattern)
        .fetch_all(&self.pool)
        .await?;

        Ok(ingredients)
    }

    pub async fn find_by_id(&self, id: i64) -> DatabaseResult<Option<Ingredient>> {
        let ingredient = sqlx::query_as::<_, Ingredient>(
            "SELECT id, name, measurement_unit FROM ingredients WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(ingredient)
    }
}

fn escape_like(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

/// Tag repository
#[derive(Clone)]
pub struct TagRepository {
    pool: PgPool,
}

impl TagRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list(&self) -> DatabaseResult<Vec<Tag>> {
        let tags = sqlx::query_as::<_, Tag>("SELECT id, name, color, slug FROM tags ORDER BY id")
            .fetch_all(&self.pool)
            .await?;

        Ok(tags)
    }

    pub async fn find_by_id(&self, id: i64) -> DatabaseResult<Option<Tag>> {
        let tag = sqlx::query_as::<_, Tag>("SELECT id, name, color, slug FROM tags WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(tag)
    }

    /// Tags of several recipes, keyed by recipe id
    pub async fn for_recipes(&self, recipe_ids: &[i64]) -> DatabaseResult<HashMap<i64, Vec<Tag>>> {
        let rows: Vec<(i64, i64, String, String, String)> = sqlx::query_as(
            r#"
            SELECT rt.recipe_id, t.id, t.name, t.color, t.slug
            FROM recipe_tags rt
            JOIN tags t ON t.id = rt.tag_id
            WHERE rt.recipe_id = ANY($1)
            ORDER BY t.id
            "#,
        )
        .bind(recipe_ids)
        .fetch_all(&self.pool)
        .await?;

        let mut tags: HashMap<i64, Vec<Tag>> = HashMap::new();
        for (recipe_id, id, name, color, slug) in rows {
            tags.entry(recipe_id).or_default().push(Tag {
                id,
                name,
                color,
                slug,
            });
        }

        Ok(tags)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_like_neutralises_wildcards() {
        assert_eq!(escape_like("100%_pure\\"), "100\\%\\_pure\\\\");
        assert_eq!(escape_like("flour"), "flour");
    }
}

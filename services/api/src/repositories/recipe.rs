//! Recipe repository
//!
//! Recipe writes run in one transaction: referenced ingredient and tag ids
//! are checked first, then the recipe row and its ingredient and tag sets
//! are written. Any error drops the transaction, which rolls it back.

use common::error::{DatabaseError, DatabaseResult};
use sqlx::{PgConnection, PgPool, Postgres, QueryBuilder, Transaction};
use std::collections::{HashMap, HashSet};
use thiserror::Error;
use tracing::info;

use crate::models::{
    PageQuery,
    recipe::{Recipe, RecipeBrief, RecipeDraft, RecipeFilter, RecipeIngredientView, RecipeView},
    user::UserView,
};
use crate::repositories::{UserRepository, catalog::TagRepository, relation::RelationRepository};

/// Error raised by the recipe write path
#[derive(Error, Debug)]
pub enum RecipeWriteError {
    /// Ingredient ids with no matching row
    #[error("Unknown ingredient ids: {0:?}")]
    UnknownIngredients(Vec<i64>),

    /// Tag ids with no matching row
    #[error("Unknown tag ids: {0:?}")]
    UnknownTags(Vec<i64>),

    /// The recipe being updated does not exist
    #[error("Recipe {0} not found")]
    NotFound(i64),

    #[error(transparent)]
    Database(#[from] DatabaseError),
}

impl From<sqlx::Error> for RecipeWriteError {
    fn from(err: sqlx::Error) -> Self {
        RecipeWriteError::Database(DatabaseError::Query(err))
    }
}

const RECIPE_COLUMNS: &str = "r.id, r.author_id, r.name, r.image, r.text, r.cooking_time, r.created_at";

/// Recipe repository
#[derive(Clone)]
pub struct RecipeRepository {
    pool: PgPool,
}

impl RecipeRepository {
    /// Create a new recipe repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert a recipe with its ingredients and tags
    pub async fn create(&self, author_id: i64, draft: &RecipeDraft) -> Result<i64, RecipeWriteError> {
        let mut tx = self.pool.begin().await?;

        ensure_references(&mut tx, draft).await?;

        let recipe_id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO recipes (author_id, name, image, text, cooking_time)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id
            "#,
        )
        .bind(author_id)
        .bind(&draft.name)
        .bind(draft.image.as_deref().unwrap_or_default())
        .bind(&draft.text)
        .bind(draft.cooking_time)
        .fetch_one(&mut *tx)
        .await?;

        write_components(&mut tx, recipe_id, draft).await?;
        tx.commit().await?;

        info!(recipe_id, author_id, "Recipe created");
        Ok(recipe_id)
    }

    /// Replace a recipe's scalar fields, ingredient set and tag set
    pub async fn update(&self, recipe_id: i64, draft: &RecipeDraft) -> Result<(), RecipeWriteError> {
        let mut tx = self.pool.begin().await?;

        let locked: Option<i64> = sqlx::query_scalar("SELECT id FROM recipes WHERE id = $1 FOR UPDATE")
            .bind(recipe_id)
            .fetch_optional(&mut *tx)
            .await?;
        if locked.is_none() {
            return Err(RecipeWriteError::NotFound(recipe_id));
        }

        ensure_references(&mut tx, draft).await?;

        sqlx::query("DELETE FROM recipe_ingredients WHERE recipe_id = $1")
            .bind(recipe_id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM recipe_tags WHERE recipe_id = $1")
            .bind(recipe_id)
            .execute(&mut *tx)
            .await?;

        write_components(&mut tx, recipe_id, draft).await?;

        sqlx::query(
            r#"
            UPDATE recipes
            SET name = $2, text = $3, cooking_time = $4, image = COALESCE($5, image)
            WHERE id = $1
            "#,
        )
        .bind(recipe_id)
        .bind(&draft.name)
        .bind(&draft.text)
        .bind(draft.cooking_time)
        .bind(draft.image.as_deref())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        info!(recipe_id, "Recipe updated");
        Ok(())
    }

    /// Delete a recipe; its ingredient, tag, favorite and cart rows cascade
    pub async fn delete(&self, recipe_id: i64) -> DatabaseResult<bool> {
        let result = sqlx::query("DELETE FROM recipes WHERE id = $1")
            .bind(recipe_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Find a recipe by ID
    pub async fn find_by_id(&self, recipe_id: i64) -> DatabaseResult<Option<Recipe>> {
        let recipe = sqlx::query_as::<_, Recipe>(&format!(
            "SELECT {RECIPE_COLUMNS} FROM recipes r WHERE r.id = $1"
        ))
        .bind(recipe_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(recipe)
    }

    /// Get one page of recipes matching the filter, newest first
    pub async fn list(
        &self,
        viewer: Option<i64>,
        filter: &RecipeFilter,
        page: &PageQuery,
    ) -> DatabaseResult<(Vec<Recipe>, i64)> {
        if filter.needs_viewer() && viewer.is_none() {
            return Ok((Vec::new(), 0));
        }

        let mut count_query = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM recipes r WHERE TRUE");
        push_filters(&mut count_query, viewer, filter);
        let count: i64 = count_query.build_query_scalar().fetch_one(&self.pool).await?;

        let mut select = QueryBuilder::<Postgres>::new(format!(
            "SELECT {RECIPE_COLUMNS} FROM recipes r WHERE TRUE"
        ));
        push_filters(&mut select, viewer, filter);
        select
            .push(" ORDER BY r.created_at DESC, r.id DESC LIMIT ")
            .push_bind(page.limit() as i64)
            .push(" OFFSET ")
            .push_bind(page.offset());

        let recipes = select.build_query_as::<Recipe>().fetch_all(&self.pool).await?;

        Ok((recipes, count))
    }

    /// Ingredient lines of several recipes, keyed by recipe id
    pub async fn ingredients_for(
        &self,
        recipe_ids: &[i64],
    ) -> DatabaseResult<HashMap<i64, Vec<RecipeIngredientView>>> {
        let rows: Vec<(i64, i64, String, String, i32)> = sqlx::query_as(
            r#"
            SELECT ri.recipe_id, i.id, i.name, i.measurement_unit, ri.amount
            FROM recipe_ingredients ri
            JOIN ingredients i ON i.id = ri.ingredient_id
            WHERE ri.recipe_id = ANY($1)
            ORDER BY ri.id
            "#,
        )
        .bind(recipe_ids)
        .fetch_all(&self.pool)
        .await?;

        let mut lines: HashMap<i64, Vec<RecipeIngredientView>> = HashMap::new();
        for (recipe_id, id, name, measurement_unit, amount) in rows {
            lines.entry(recipe_id).or_default().push(RecipeIngredientView {
                id,
                name,
                measurement_unit,
                amount,
            });
        }

        Ok(lines)
    }

    /// Newest recipes of several authors, at most `limit` each
    pub async fn briefs_by_authors(
        &self,
        author_ids: &[i64],
        limit: Option<u32>,
    ) -> DatabaseResult<HashMap<i64, Vec<RecipeBrief>>> {
        let rows: Vec<(i64, i64, String, String, i32)> = sqlx::query_as(
            r#"
            SELECT author_id, id, name, image, cooking_time
            FROM (
                SELECT r.author_id, r.id, r.name, r.image, r.cooking_time,
                       ROW_NUMBER() OVER (PARTITION BY r.author_id ORDER BY r.created_at DESC, r.id DESC) AS rank_in_author
                FROM recipes r
                WHERE r.author_id = ANY($1)
            ) ranked
            WHERE $2::BIGINT IS NULL OR rank_in_author <= $2
            ORDER BY author_id, rank_in_author
            "#,
        )
        .bind(author_ids)
        .bind(limit.map(i64::from))
        .fetch_all(&self.pool)
        .await?;

        let mut briefs: HashMap<i64, Vec<RecipeBrief>> = HashMap::new();
        for (author_id, id, name, image, cooking_time) in rows {
            briefs.entry(author_id).or_default().push(RecipeBrief {
                id,
                name,
                image,
                cooking_time,
            });
        }

        Ok(briefs)
    }

    /// Recipe counts of several authors
    pub async fn counts_by_authors(&self, author_ids: &[i64]) -> DatabaseResult<HashMap<i64, i64>> {
        let rows: Vec<(i64, i64)> = sqlx::query_as(
            r#"
            SELECT author_id, COUNT(*)
            FROM recipes
            WHERE author_id = ANY($1)
            GROUP BY author_id
            "#,
        )
        .bind(author_ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().collect())
    }
}

/// Builds full recipe views for a given caller
#[derive(Clone)]
pub struct RecipeViews {
    pub recipes: RecipeRepository,
    pub users: UserRepository,
    pub tags: TagRepository,
    pub relations: RelationRepository,
}

impl RecipeViews {
    /// Assemble views, preserving the order of `recipes`
    pub async fn build(&self, viewer: Option<i64>, recipes: Vec<Recipe>) -> DatabaseResult<Vec<RecipeView>> {
        if recipes.is_empty() {
            return Ok(Vec::new());
        }

        let recipe_ids: Vec<i64> = recipes.iter().map(|recipe| recipe.id).collect();
        let author_ids: Vec<i64> = recipes
            .iter()
            .map(|recipe| recipe.author_id)
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();

        let mut tags = self.tags.for_recipes(&recipe_ids).await?;
        let mut ingredients = self.recipes.ingredients_for(&recipe_ids).await?;
        let authors: HashMap<i64, _> = self
            .users
            .find_by_ids(&author_ids)
            .await?
            .into_iter()
            .map(|user| (user.id, user))
            .collect();

        let (favorited, in_cart, following) = match viewer {
            Some(user_id) => (
                self.relations.favorited_among(user_id, &recipe_ids).await?,
                self.relations.in_cart_among(user_id, &recipe_ids).await?,
                self.relations.following_among(user_id, &author_ids).await?,
            ),
            None => (HashSet::new(), HashSet::new(), HashSet::new()),
        };

        let mut views = Vec::with_capacity(recipes.len());
        for recipe in recipes {
            // The author row cascades with its recipes, so it is always present
            let Some(author) = authors.get(&recipe.author_id).cloned() else {
                continue;
            };

            views.push(RecipeView {
                id: recipe.id,
                tags: tags.remove(&recipe.id).unwrap_or_default(),
                author: UserView::new(author, following.contains(&recipe.author_id)),
                ingredients: ingredients.remove(&recipe.id).unwrap_or_default(),
                is_favorited: favorited.contains(&recipe.id),
                is_in_shopping_cart: in_cart.contains(&recipe.id),
                name: recipe.name,
                image: recipe.image,
                text: recipe.text,
                cooking_time: recipe.cooking_time,
            });
        }

        Ok(views)
    }
}

fn push_filters(query: &mut QueryBuilder<'_, Postgres>, viewer: Option<i64>, filter: &RecipeFilter) {
    if let Some(author) = filter.author {
        query.push(" AND r.author_id = ").push_bind(author);
    }

    if !filter.tags.is_empty() {
        query
            .push(
                " AND EXISTS (SELECT 1 FROM recipe_tags rt JOIN tags t ON t.id = rt.tag_id \
                 WHERE rt.recipe_id = r.id AND t.slug = ANY(",
            )
            .push_bind(filter.tags.clone())
            .push("))");
    }

    if let Some(user_id) = viewer {
        if filter.is_favorited {
            query
                .push(" AND EXISTS (SELECT 1 FROM favorites f WHERE f.recipe_id = r.id AND f.user_id = ")
                .push_bind(user_id)
                .push(")");
        }
        if filter.is_in_shopping_cart {
            query
                .push(" AND EXISTS (SELECT 1 FROM carts c WHERE c.recipe_id = r.id AND c.user_id = ")
                .push_bind(user_id)
                .push(")");
        }
    }
}

/// Reject drafts that reference missing ingredients or tags
///
/// The referenced rows are share-locked until the transaction ends.
async fn ensure_references(
    tx: &mut Transaction<'_, Postgres>,
    draft: &RecipeDraft,
) -> Result<(), RecipeWriteError> {
    let ingredient_ids: Vec<i64> = draft.ingredients.iter().map(|item| item.id).collect();
    let missing = missing_ids(&mut **tx, "ingredients", &ingredient_ids).await?;
    if !missing.is_empty() {
        return Err(RecipeWriteError::UnknownIngredients(missing));
    }

    let missing = missing_ids(&mut **tx, "tags", &draft.tags).await?;
    if !missing.is_empty() {
        return Err(RecipeWriteError::UnknownTags(missing));
    }

    Ok(())
}

async fn missing_ids(conn: &mut PgConnection, table: &str, ids: &[i64]) -> Result<Vec<i64>, sqlx::Error> {
    let found: HashSet<i64> = sqlx::query_scalar::<_, i64>(&format!(
        "SELECT id FROM {table} WHERE id = ANY($1) FOR SHARE"
    ))
    .bind(ids)
    .fetch_all(conn)
    .await?
    .into_iter()
    .collect();

    let mut missing: Vec<i64> = ids.iter().copied().filter(|id| !found.contains(id)).collect();
    missing.sort_unstable();
    missing.dedup();
    Ok(missing)
}

async fn write_components(
    tx: &mut Transaction<'_, Postgres>,
    recipe_id: i64,
    draft: &RecipeDraft,
) -> Result<(), sqlx::Error> {
    let ingredient_ids: Vec<i64> = draft.ingredients.iter().map(|item| item.id).collect();
    let amounts: Vec<i32> = draft.ingredients.iter().map(|item| item.amount).collect();

    sqlx::query(
        r#"
        INSERT INTO recipe_ingredients (recipe_id, ingredient_id, amount)
        SELECT $1, ingredient_id, amount
        FROM UNNEST($2::BIGINT[], $3::INTEGER[]) AS input (ingredient_id, amount)
        "#,
    )
    .bind(recipe_id)
    .bind(&ingredient_ids)
    .bind(&amounts)
    .execute(&mut **tx)
    .await?;

    sqlx::query(
        r#"
        INSERT INTO recipe_tags (recipe_id, tag_id)
        SELECT $1, tag_id
        FROM UNNEST($2::BIGINT[]) AS input (tag_id)
        "#,
    )
    .bind(recipe_id)
    .bind(&draft.tags)
    .execute(&mut **tx)
    .await?;

    Ok(())
}

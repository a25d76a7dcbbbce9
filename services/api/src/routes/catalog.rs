//! Ingredient and tag handlers

use axum::{
    Json,
    extract::{Path, Query, State},
};

use crate::{
    error::{ApiError, ApiResult},
    models::catalog::{Ingredient, IngredientQuery, Tag},
    state::AppState,
};

/// List ingredients, optionally filtered by name prefix
pub async fn list_ingredients(
    State(state): State<AppState>,
    Query(query): Query<IngredientQuery>,
) -> ApiResult<Json<Vec<Ingredient>>> {
    let ingredients = state
        .ingredient_repository
        .list(query.name.as_deref())
        .await?;

    Ok(Json(ingredients))
}

pub async fn get_ingredient(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<Ingredient>> {
    let ingredient = state
        .ingredient_repository
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Ingredient {} not found", id)))?;

    Ok(Json(ingredient))
}

pub async fn list_tags(State(state): State<AppState>) -> ApiResult<Json<Vec<Tag>>> {
    Ok(Json(state.tag_repository.list().await?))
}

pub async fn get_tag(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<Json<Tag>> {
    let tag = state
        .tag_repository
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Tag {} not found", id)))?;

    Ok(Json(tag))
}

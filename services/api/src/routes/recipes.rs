//! Recipe handlers, favorites, shopping cart and the shopping list download

use axum::{
    Json,
    extract::{Path, State},
    http::{StatusCode, header},
    response::IntoResponse,
};
use axum_extra::extract::{Query, WithRejection};
use tracing::info;

use crate::{
    error::{ApiError, ApiResult, JsonBody},
    middleware::{CurrentUser, MaybeUser},
    models::{
        Page,
        recipe::{CreateRecipeRequest, Recipe, RecipeBrief, RecipeQuery, RecipeView, UpdateRecipeRequest},
    },
    repositories::relation::RecipeRelation,
    shopping_list,
    state::AppState,
    validation::{validate_create_recipe, validate_update_recipe},
};

/// List recipes, newest first
pub async fn list_recipes(
    State(state): State<AppState>,
    viewer: MaybeUser,
    Query(query): Query<RecipeQuery>,
) -> ApiResult<Json<Page<RecipeView>>> {
    let pagination = query.pagination();
    let (recipes, count) = state
        .recipe_repository
        .list(viewer.id(), &query.filter(), &pagination)
        .await?;

    let views = state.recipe_views().build(viewer.id(), recipes).await?;

    Ok(Json(Page::new(&pagination, count, views)))
}

pub async fn get_recipe(
    State(state): State<AppState>,
    viewer: MaybeUser,
    Path(id): Path<i64>,
) -> ApiResult<Json<RecipeView>> {
    let recipe = find_recipe(&state, id).await?;
    Ok(Json(recipe_view(&state, viewer.id(), recipe).await?))
}

/// Create a recipe authored by the caller
pub async fn create_recipe(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    WithRejection(Json(payload), _): JsonBody<CreateRecipeRequest>,
) -> ApiResult<impl IntoResponse> {
    let draft = validate_create_recipe(payload)?;

    let recipe_id = state.recipe_repository.create(user.id, &draft).await?;
    let recipe = find_recipe(&state, recipe_id).await?;
    let view = recipe_view(&state, Some(user.id), recipe).await?;

    Ok((StatusCode::CREATED, Json(view)))
}

/// Replace a recipe's contents; author only
pub async fn update_recipe(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i64>,
    WithRejection(Json(payload), _): JsonBody<UpdateRecipeRequest>,
) -> ApiResult<Json<RecipeView>> {
    let recipe = find_recipe(&state, id).await?;
    ensure_author(&recipe, user.id)?;

    let draft = validate_update_recipe(payload)?;
    state.recipe_repository.update(id, &draft).await?;

    let recipe = find_recipe(&state, id).await?;
    Ok(Json(recipe_view(&state, Some(user.id), recipe).await?))
}

/// Delete a recipe; author only
pub async fn delete_recipe(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i64>,
) -> ApiResult<StatusCode> {
    let recipe = find_recipe(&state, id).await?;
    ensure_author(&recipe, user.id)?;

    if !state.recipe_repository.delete(id).await? {
        return Err(ApiError::NotFound(format!("Recipe {} not found", id)));
    }

    info!(recipe_id = id, user_id = user.id, "Recipe deleted");
    Ok(StatusCode::NO_CONTENT)
}

pub async fn add_favorite(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i64>,
) -> ApiResult<impl IntoResponse> {
    add_relation(&state, RecipeRelation::Favorite, user.id, id).await
}

pub async fn remove_favorite(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i64>,
) -> ApiResult<StatusCode> {
    remove_relation(&state, RecipeRelation::Favorite, user.id, id).await
}

pub async fn add_to_cart(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i64>,
) -> ApiResult<impl IntoResponse> {
    add_relation(&state, RecipeRelation::Cart, user.id, id).await
}

pub async fn remove_from_cart(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i64>,
) -> ApiResult<StatusCode> {
    remove_relation(&state, RecipeRelation::Cart, user.id, id).await
}

/// Download the caller's aggregated shopping list as plain text
pub async fn download_shopping_cart(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> ApiResult<impl IntoResponse> {
    let lines = state
        .shopping_cart_repository
        .lines_for_user(user.id)
        .await?;

    let items = shopping_list::aggregate(lines);
    let body = shopping_list::render(&state.shopping_list.header, &items);

    info!(user_id = user.id, items = items.len(), "Shopping list exported");

    Ok((
        [
            (header::CONTENT_TYPE, "text/plain; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                shopping_list::content_disposition(&state.shopping_list.filename),
            ),
        ],
        body,
    ))
}

async fn find_recipe(state: &AppState, id: i64) -> ApiResult<Recipe> {
    state
        .recipe_repository
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Recipe {} not found", id)))
}

async fn recipe_view(state: &AppState, viewer: Option<i64>, recipe: Recipe) -> ApiResult<RecipeView> {
    let id = recipe.id;
    state
        .recipe_views()
        .build(viewer, vec![recipe])
        .await?
        .pop()
        .ok_or_else(|| ApiError::NotFound(format!("Recipe {} not found", id)))
}

fn ensure_author(recipe: &Recipe, user_id: i64) -> ApiResult<()> {
    if recipe.author_id != user_id {
        return Err(ApiError::Forbidden(
            "Only the author may change this recipe".to_string(),
        ));
    }
    Ok(())
}

async fn add_relation(
    state: &AppState,
    relation: RecipeRelation,
    user_id: i64,
    recipe_id: i64,
) -> ApiResult<(StatusCode, Json<RecipeBrief>)> {
    let recipe = find_recipe(state, recipe_id).await?;

    if !state
        .relation_repository
        .add_recipe(relation, user_id, recipe_id)
        .await?
    {
        return Err(ApiError::Conflict(format!(
            "Recipe is already in {}",
            relation.label()
        )));
    }

    Ok((StatusCode::CREATED, Json(RecipeBrief::from(&recipe))))
}

async fn remove_relation(
    state: &AppState,
    relation: RecipeRelation,
    user_id: i64,
    recipe_id: i64,
) -> ApiResult<StatusCode> {
    find_recipe(state, recipe_id).await?;

    if !state
        .relation_repository
        .remove_recipe(relation, user_id, recipe_id)
        .await?
    {
        return Err(ApiError::Conflict(format!(
            "Recipe is not in {}",
            relation.label()
        )));
    }

    Ok(StatusCode::NO_CONTENT)
}

//! User handlers: registration, profiles, password change and subscriptions

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use axum_extra::extract::WithRejection;
use common::password::{hash_password, verify_password};
use std::collections::HashSet;
use tracing::{info, warn};

use crate::{
    error::{ApiError, ApiResult, JsonBody},
    middleware::{CurrentUser, MaybeUser},
    models::{
        Page, PageQuery,
        user::{
            CreateUserRequest, CreatedUserResponse, NewUser, SetPasswordRequest, SubscriptionQuery,
            SubscriptionView, User, UserView,
        },
    },
    repositories::{USERS_EMAIL_KEY, USERS_USERNAME_KEY},
    state::AppState,
    validation::{FieldErrors, validate_follow, validate_new_user, validate_password},
};

/// List users
pub async fn list_users(
    State(state): State<AppState>,
    viewer: MaybeUser,
    Query(query): Query<PageQuery>,
) -> ApiResult<Json<Page<UserView>>> {
    let (users, count) = state.user_repository.list(&query).await?;

    let ids: Vec<i64> = users.iter().map(|user| user.id).collect();
    let following = match viewer.id() {
        Some(viewer_id) => {
            state
                .relation_repository
                .following_among(viewer_id, &ids)
                .await?
        }
        None => HashSet::new(),
    };

    let views = users
        .into_iter()
        .map(|user| {
            let subscribed = following.contains(&user.id);
            UserView::new(user, subscribed)
        })
        .collect();

    Ok(Json(Page::new(&query, count, views)))
}

/// Register a new user
pub async fn create_user(
    State(state): State<AppState>,
    WithRejection(Json(payload), _): JsonBody<CreateUserRequest>,
) -> ApiResult<impl IntoResponse> {
    validate_new_user(&payload)?;

    let email = payload.email.trim().to_string();
    let username = payload.username.trim().to_string();

    let (email_taken, username_taken) = state
        .user_repository
        .find_taken(&email, &username)
        .await?;
    let mut errors = FieldErrors::new();
    if email_taken {
        errors.add("email", "A user with that email already exists.");
    }
    if username_taken {
        errors.add("username", "A user with that username already exists.");
    }
    if !errors.is_empty() {
        return Err(errors.into());
    }

    let new_user = NewUser {
        email,
        username,
        first_name: payload.first_name.trim().to_string(),
        last_name: payload.last_name.trim().to_string(),
        password_hash: hash_password(&payload.password)?,
    };

    // A concurrent registration can still win the race for the same email or username
    let user = state
        .user_repository
        .create(&new_user)
        .await
        .map_err(|err| match err.constraint().map(str::to_owned).as_deref() {
            Some(USERS_EMAIL_KEY) => ApiError::from(FieldErrors::single(
                "email",
                "A user with that email already exists.",
            )),
            Some(USERS_USERNAME_KEY) => ApiError::from(FieldErrors::single(
                "username",
                "A user with that username already exists.",
            )),
            _ => ApiError::from(err),
        })?;

    info!(user_id = user.id, username = %user.username, "User registered");
    Ok((StatusCode::CREATED, Json(CreatedUserResponse::from(user))))
}

/// Profile of the caller
pub async fn me(State(state): State<AppState>, CurrentUser(auth): CurrentUser) -> ApiResult<Json<UserView>> {
    let user = find_user(&state, auth.id).await?;
    Ok(Json(UserView::new(user, false)))
}

pub async fn get_user(
    State(state): State<AppState>,
    viewer: MaybeUser,
    Path(id): Path<i64>,
) -> ApiResult<Json<UserView>> {
    let user = find_user(&state, id).await?;

    let subscribed = match viewer.id() {
        Some(viewer_id) => state
            .relation_repository
            .following_among(viewer_id, &[id])
            .await?
            .contains(&id),
        None => false,
    };

    Ok(Json(UserView::new(user, subscribed)))
}

/// Change the caller's password
pub async fn set_password(
    State(state): State<AppState>,
    CurrentUser(auth): CurrentUser,
    WithRejection(Json(payload), _): JsonBody<SetPasswordRequest>,
) -> ApiResult<StatusCode> {
    let user = find_user(&state, auth.id).await?;

    let mut errors = FieldErrors::new();
    if payload.current_password.is_empty() {
        errors.add("current_password", "This field is required.");
    } else if !verify_password(&payload.current_password, &user.password_hash)? {
        errors.add("current_password", "Wrong password.");
    }
    if let Err(message) = validate_password(&payload.new_password) {
        errors.add("new_password", message);
    } else if payload.new_password == payload.current_password {
        errors.add("new_password", "New password must differ from the current one.");
    }
    if !errors.is_empty() {
        warn!(user_id = auth.id, "Password change rejected");
        return Err(errors.into());
    }

    let password_hash = hash_password(&payload.new_password)?;
    if !state
        .user_repository
        .update_password(auth.id, &password_hash)
        .await?
    {
        return Err(ApiError::NotFound(format!("User {} not found", auth.id)));
    }

    info!(user_id = auth.id, "Password changed");
    Ok(StatusCode::NO_CONTENT)
}

/// Authors the caller follows, with a preview of their recipes
pub async fn subscriptions(
    State(state): State<AppState>,
    CurrentUser(auth): CurrentUser,
    Query(query): Query<SubscriptionQuery>,
) -> ApiResult<Json<Page<SubscriptionView>>> {
    let pagination = query.pagination();
    let (authors, count) = state
        .relation_repository
        .followed_authors(auth.id, &pagination)
        .await?;

    let results = subscription_views(&state, authors, query.recipes_limit).await?;

    Ok(Json(Page::new(&pagination, count, results)))
}

/// Follow an author
pub async fn subscribe(
    State(state): State<AppState>,
    CurrentUser(auth): CurrentUser,
    Path(author_id): Path<i64>,
    Query(query): Query<SubscriptionQuery>,
) -> ApiResult<impl IntoResponse> {
    validate_follow(auth.id, author_id)?;

    let author = find_user(&state, author_id).await?;

    if !state.relation_repository.follow(auth.id, author_id).await? {
        return Err(ApiError::Conflict(
            "You are already subscribed to this author".to_string(),
        ));
    }

    info!(user_id = auth.id, author_id, "Subscribed");

    let view = subscription_views(&state, vec![author], query.recipes_limit)
        .await?
        .pop()
        .ok_or_else(|| ApiError::NotFound(format!("User {} not found", author_id)))?;

    Ok((StatusCode::CREATED, Json(view)))
}

/// Stop following an author
pub async fn unsubscribe(
    State(state): State<AppState>,
    CurrentUser(auth): CurrentUser,
    Path(author_id): Path<i64>,
) -> ApiResult<StatusCode> {
    find_user(&state, author_id).await?;

    if !state.relation_repository.unfollow(auth.id, author_id).await? {
        return Err(ApiError::Conflict(
            "You are not subscribed to this author".to_string(),
        ));
    }

    info!(user_id = auth.id, author_id, "Unsubscribed");
    Ok(StatusCode::NO_CONTENT)
}

async fn find_user(state: &AppState, id: i64) -> ApiResult<User> {
    state
        .user_repository
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("User {} not found", id)))
}

/// Build subscription entries; every author listed here is followed by the caller
async fn subscription_views(
    state: &AppState,
    authors: Vec<User>,
    recipes_limit: Option<u32>,
) -> ApiResult<Vec<SubscriptionView>> {
    let ids: Vec<i64> = authors.iter().map(|author| author.id).collect();
    let mut briefs = state
        .recipe_repository
        .briefs_by_authors(&ids, recipes_limit)
        .await?;
    let counts = state.recipe_repository.counts_by_authors(&ids).await?;

    Ok(authors
        .into_iter()
        .map(|author| {
            let id = author.id;
            SubscriptionView {
                user: UserView::new(author, true),
                recipes: briefs.remove(&id).unwrap_or_default(),
                recipes_count: counts.get(&id).copied().unwrap_or(0),
            }
        })
        .collect())
}

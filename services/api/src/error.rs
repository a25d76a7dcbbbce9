//! Custom error types for the API service

use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::extract::WithRejection;
use common::error::{DatabaseError, PasswordError};
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::{repositories::recipe::RecipeWriteError, validation::FieldErrors};

/// Custom error type for the API service
#[derive(Error, Debug)]
pub enum ApiError {
    /// Missing, invalid or expired credentials
    #[error("Unauthorized")]
    Unauthorized,

    /// Authenticated, but not allowed to touch the resource
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Referenced resource does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Field-scoped validation failure, nothing was written
    #[error("Validation failed: {0}")]
    Validation(FieldErrors),

    /// Duplicate relation or removal of an absent relation
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Internal server error
    #[error("Internal server error")]
    InternalServerError,

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),
}

impl From<FieldErrors> for ApiError {
    fn from(errors: FieldErrors) -> Self {
        ApiError::Validation(errors)
    }
}

impl From<PasswordError> for ApiError {
    fn from(err: PasswordError) -> Self {
        error!("{}", err);
        ApiError::InternalServerError
    }
}

impl From<RecipeWriteError> for ApiError {
    fn from(err: RecipeWriteError) -> Self {
        match err {
            RecipeWriteError::UnknownIngredients(ids) => ApiError::Validation(FieldErrors::single(
                "ingredients",
                format!("Unknown ingredient id(s): {}", join_ids(&ids)),
            )),
            RecipeWriteError::UnknownTags(ids) => ApiError::Validation(FieldErrors::single(
                "tags",
                format!("Unknown tag id(s): {}", join_ids(&ids)),
            )),
            RecipeWriteError::NotFound(id) => ApiError::NotFound(format!("Recipe {} not found", id)),
            RecipeWriteError::Database(err) => ApiError::Database(err),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        let errors = match &rejection {
            JsonRejection::JsonDataError(err) => data_error_fields(&err.body_text()),
            _ => FieldErrors::single(NON_FIELD_ERRORS, rejection.body_text()),
        };
        ApiError::Validation(errors)
    }
}

/// Key for body errors that cannot be tied to one field
pub const NON_FIELD_ERRORS: &str = "non_field_errors";

/// JSON request body whose rejections render as field errors
pub type JsonBody<T> = WithRejection<Json<T>, ApiError>;

/// Attribute a deserialization failure to the top-level field it names
///
/// The rejection text reads `<prefix>: <path>: <message> at line L column C`,
/// where `<path>` is absent when the failure is not inside a field.
fn data_error_fields(text: &str) -> FieldErrors {
    let detail = text
        .split_once(": ")
        .map(|(_, detail)| detail)
        .unwrap_or(text);
    let detail = detail
        .rsplit_once(" at line ")
        .map(|(message, _)| message)
        .unwrap_or(detail);

    if let Some((path, message)) = detail.split_once(": ") {
        let field = path
            .split(['.', '['])
            .next()
            .unwrap_or_default();
        if !field.is_empty() && field.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return FieldErrors::single(field, message);
        }
    }

    FieldErrors::single(NON_FIELD_ERRORS, detail)
}

fn join_ids(ids: &[i64]) -> String {
    ids.iter()
        .map(i64::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                json!({ "error": "Authentication credentials were not provided or are invalid" }),
            ),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, json!({ "error": msg })),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, json!({ "error": msg })),
            ApiError::Validation(errors) => (StatusCode::BAD_REQUEST, json!({ "errors": errors })),
            ApiError::Conflict(msg) => (StatusCode::BAD_REQUEST, json!({ "error": msg })),
            ApiError::InternalServerError => (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({ "error": "Internal server error" }),
            ),
            ApiError::Database(err) => {
                error!("Database failure: {}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "error": "Database error" }),
                )
            }
        };

        (status, Json(body)).into_response()
    }
}

/// Type alias for API results
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::recipe::CreateRecipeRequest;
    use axum::{
        body::{Body, to_bytes},
        extract::FromRequest,
        http::{Request, header},
    };

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_validation_error_is_field_scoped() {
        let response = ApiError::Validation(FieldErrors::single("tags", "At least one tag is required."))
            .into_response();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            body_json(response).await,
            json!({ "errors": { "tags": ["At least one tag is required."] } })
        );
    }

    #[tokio::test]
    async fn test_unknown_ingredient_maps_to_validation() {
        let response = ApiError::from(RecipeWriteError::UnknownIngredients(vec![4, 9])).into_response();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            body_json(response).await,
            json!({ "errors": { "ingredients": ["Unknown ingredient id(s): 4, 9"] } })
        );
    }

    async fn reject_body(body: &'static str) -> Response {
        let request = Request::post("/api/recipes")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body))
            .unwrap();

        match JsonBody::<CreateRecipeRequest>::from_request(request, &()).await {
            Ok(_) => panic!("body should have been rejected: {body}"),
            Err(err) => err.into_response(),
        }
    }

    #[tokio::test]
    async fn test_wrong_typed_field_is_field_scoped() {
        let response = reject_body(r#"{"name":"Soup","cooking_time":"thirty"}"#).await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        let messages = body["errors"]["cooking_time"].as_array().unwrap();
        assert_eq!(messages.len(), 1);
        assert!(messages[0].as_str().unwrap().contains("expected i32"));
    }

    #[tokio::test]
    async fn test_nested_type_error_names_top_level_field() {
        let response = reject_body(r#"{"ingredients":[{"id":1,"amount":1.5}],"tags":["x"]}"#).await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert!(body["errors"]["ingredients"].is_array());
    }

    #[tokio::test]
    async fn test_malformed_json_is_a_non_field_error() {
        let response = reject_body(r#"{"name": "#).await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert!(body["errors"][NON_FIELD_ERRORS].is_array());
    }

    #[test]
    fn test_data_error_fields_parsing() {
        let errors = data_error_fields(
            "Failed to deserialize the JSON body into the target type: tags[0]: invalid type: string \"x\", expected i64 at line 1 column 12",
        );
        assert_eq!(errors.messages("tags"), ["invalid type: string \"x\", expected i64"]);

        let errors = data_error_fields(
            "Failed to deserialize the JSON body into the target type: invalid type: integer `5`, expected a map at line 1 column 1",
        );
        assert_eq!(
            errors.messages(NON_FIELD_ERRORS),
            ["invalid type: integer `5`, expected a map"]
        );
    }

    #[tokio::test]
    async fn test_status_codes() {
        assert_eq!(
            ApiError::Unauthorized.into_response().status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ApiError::Forbidden("nope".into()).into_response().status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            ApiError::NotFound("gone".into()).into_response().status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::Conflict("twice".into()).into_response().status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::Database(DatabaseError::Migration("boom".into()))
                .into_response()
                .status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}

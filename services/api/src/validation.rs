//! Input validation for recipe and user payloads
//!
//! Checks here are pure: they never touch the database. Whether referenced
//! ingredient and tag ids exist is checked inside the write transaction.

use regex::Regex;
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};
use std::sync::OnceLock;

use crate::models::{
    recipe::{CreateRecipeRequest, IngredientAmount, RecipeDraft, UpdateRecipeRequest},
    user::CreateUserRequest,
};

/// Maximum length of a recipe name
pub const RECIPE_NAME_MAX_LEN: usize = 200;

/// Validation messages keyed by field name
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Errors with a single message on one field
    pub fn single(field: &str, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.add(field, message);
        errors
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn messages(&self, field: &str) -> &[String] {
        self.0.get(field).map(Vec::as_slice).unwrap_or(&[])
    }

    fn into_result(self) -> Result<(), FieldErrors> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

impl std::fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let parts: Vec<String> = self
            .0
            .iter()
            .map(|(field, messages)| format!("{}: {}", field, messages.join(" ")))
            .collect();
        write!(f, "{}", parts.join("; "))
    }
}

/// Validate a creation payload and turn it into a draft
pub fn validate_create_recipe(request: CreateRecipeRequest) -> Result<RecipeDraft, FieldErrors> {
    let mut errors = FieldErrors::new();

    if request.image.trim().is_empty() {
        errors.add("image", "This field is required.");
    }
    check_recipe_fields(
        &mut errors,
        &request.name,
        &request.text,
        request.cooking_time,
        &request.tags,
        &request.ingredients,
    );
    errors.into_result()?;

    Ok(RecipeDraft {
        name: request.name.trim().to_string(),
        text: request.text,
        image: Some(request.image),
        cooking_time: request.cooking_time,
        tags: request.tags,
        ingredients: request.ingredients,
    })
}

/// Validate an update payload and turn it into a draft
pub fn validate_update_recipe(request: UpdateRecipeRequest) -> Result<RecipeDraft, FieldErrors> {
    let mut errors = FieldErrors::new();

    if matches!(&request.image, Some(image) if image.trim().is_empty()) {
        errors.add("image", "This field may not be blank.");
    }
    check_recipe_fields(
        &mut errors,
        &request.name,
        &request.text,
        request.cooking_time,
        &request.tags,
        &request.ingredients,
    );
    errors.into_result()?;

    Ok(RecipeDraft {
        name: request.name.trim().to_string(),
        text: request.text,
        image: request.image,
        cooking_time: request.cooking_time,
        tags: request.tags,
        ingredients: request.ingredients,
    })
}

fn check_recipe_fields(
    errors: &mut FieldErrors,
    name: &str,
    text: &str,
    cooking_time: i32,
    tags: &[i64],
    ingredients: &[IngredientAmount],
) {
    if name.trim().is_empty() {
        errors.add("name", "This field is required.");
    } else if name.trim().chars().count() > RECIPE_NAME_MAX_LEN {
        errors.add(
            "name",
            format!("Ensure this field has no more than {RECIPE_NAME_MAX_LEN} characters."),
        );
    }

    if text.trim().is_empty() {
        errors.add("text", "This field is required.");
    }

    if cooking_time < 1 {
        errors.add("cooking_time", "Cooking time must be at least 1 minute.");
    }

    if tags.is_empty() {
        errors.add("tags", "At least one tag is required.");
    } else if has_duplicates(tags.iter().copied()) {
        errors.add("tags", "Tags must be unique.");
    }

    if ingredients.is_empty() {
        errors.add("ingredients", "At least one ingredient is required.");
    } else {
        if has_duplicates(ingredients.iter().map(|item| item.id)) {
            errors.add("ingredients", "Ingredients must be unique.");
        }
        if ingredients.iter().any(|item| item.amount < 1) {
            errors.add("ingredients", "Ingredient amount must be at least 1.");
        }
    }
}

fn has_duplicates(ids: impl Iterator<Item = i64>) -> bool {
    let mut seen = HashSet::new();
    ids.into_iter().any(|id| !seen.insert(id))
}

/// Validate a registration payload
pub fn validate_new_user(request: &CreateUserRequest) -> Result<(), FieldErrors> {
    let mut errors = FieldErrors::new();

    if let Err(message) = validate_email(&request.email) {
        errors.add("email", message);
    }
    if let Err(message) = validate_username(&request.username) {
        errors.add("username", message);
    }
    if let Err(message) = validate_name(&request.first_name) {
        errors.add("first_name", message);
    }
    if let Err(message) = validate_name(&request.last_name) {
        errors.add("last_name", message);
    }
    if let Err(message) = validate_password(&request.password) {
        errors.add("password", message);
    }

    errors.into_result()
}

/// Validate username
pub fn validate_username(username: &str) -> Result<(), String> {
    if username.is_empty() {
        return Err("Username is required".to_string());
    }

    if username.len() > 150 {
        return Err("Username must be at most 150 characters long".to_string());
    }

    static USERNAME_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = USERNAME_REGEX
        .get_or_init(|| Regex::new(r"^[\w.@+-]+$").expect("Failed to compile username regex"));

    if !regex.is_match(username) {
        return Err(
            "Username can only contain letters, digits and the characters . @ + - _".to_string(),
        );
    }

    if username.eq_ignore_ascii_case("me") {
        return Err("This username is reserved".to_string());
    }

    Ok(())
}

/// Validate email
pub fn validate_email(email: &str) -> Result<(), String> {
    if email.is_empty() {
        return Err("Email is required".to_string());
    }

    if email.len() > 254 {
        return Err("Email must be at most 254 characters long".to_string());
    }

    static EMAIL_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = EMAIL_REGEX.get_or_init(|| {
        Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$")
            .expect("Failed to compile email regex")
    });

    if !regex.is_match(email) {
        return Err("Invalid email format".to_string());
    }

    Ok(())
}

fn validate_name(name: &str) -> Result<(), String> {
    if name.trim().is_empty() {
        return Err("This field is required".to_string());
    }

    if name.chars().count() > 150 {
        return Err("Must be at most 150 characters long".to_string());
    }

    Ok(())
}

/// Validate password
pub fn validate_password(password: &str) -> Result<(), String> {
    if password.is_empty() {
        return Err("Password is required".to_string());
    }

    if password.chars().count() < 8 {
        return Err("Password must be at least 8 characters long".to_string());
    }

    if password.len() > 128 {
        return Err("Password must be at most 128 characters long".to_string());
    }

    if password.chars().all(|c| c.is_ascii_digit()) {
        return Err("Password can't be entirely numeric".to_string());
    }

    Ok(())
}

/// A user may follow anyone but themselves
pub fn validate_follow(user_id: i64, author_id: i64) -> Result<(), FieldErrors> {
    if user_id == author_id {
        return Err(FieldErrors::single("author", "You cannot subscribe to yourself."));
    }
    Ok(())
}

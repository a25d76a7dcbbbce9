//! Foodgram HTTP API
//!
//! Recipes, ingredients, tags, favorites, the shopping cart and author
//! subscriptions over PostgreSQL, plus the plain-text shopping list export.

pub mod config;
pub mod error;
pub mod middleware;
pub mod models;
pub mod repositories;
pub mod routes;
pub mod shopping_list;
pub mod state;
pub mod validation;

pub use routes::create_router;
pub use state::AppState;

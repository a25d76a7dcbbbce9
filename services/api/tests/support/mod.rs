//! Shared setup for the database-backed integration tests
//!
//! Tests skip when `TEST_DATABASE_URL` is unset. Any other setup failure,
//! such as an unreachable server or a failing migration, is returned as an
//! error so the test fails instead of passing silently.

#![allow(dead_code)]

use api::{
    AppState,
    config::ShoppingListConfig,
    middleware::JwtVerifier,
    models::user::{NewUser, User},
};
use common::database::{DatabaseConfig, init_pool, run_migrations};
use sqlx::PgPool;
use std::error::Error;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

pub type TestResult = Result<(), Box<dyn Error>>;

pub const JWT_SECRET: &str = "integration-test-secret";

static COUNTER: AtomicU64 = AtomicU64::new(0);

/// Connected and migrated state, or `None` when no test database is configured
pub async fn setup() -> Result<Option<AppState>, Box<dyn Error>> {
    let Ok(url) = std::env::var("TEST_DATABASE_URL") else {
        eprintln!("TEST_DATABASE_URL not set, skipping");
        return Ok(None);
    };

    let config = DatabaseConfig {
        url,
        max_connections: 5,
        ..DatabaseConfig::default()
    };

    let pool = init_pool(&config).await?;
    run_migrations(&pool).await?;

    Ok(Some(AppState::new(
        pool,
        JwtVerifier::hmac(JWT_SECRET),
        ShoppingListConfig::default(),
    )))
}

pub fn unique(prefix: &str) -> String {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    let n = COUNTER.fetch_add(1, Ordering::SeqCst);
    format!("{prefix}_{nanos}_{n}")
}

pub async fn create_user(state: &AppState) -> Result<User, Box<dyn Error>> {
    let username = unique("cook");
    let user = state
        .user_repository
        .create(&NewUser {
            email: format!("{username}@example.com"),
            username,
            first_name: "Test".to_string(),
            last_name: "Cook".to_string(),
            password_hash: "unused".to_string(),
        })
        .await?;
    Ok(user)
}

pub async fn create_ingredient(pool: &PgPool, name: &str, unit: &str) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("INSERT INTO ingredients (name, measurement_unit) VALUES ($1, $2) RETURNING id")
        .bind(name)
        .bind(unit)
        .fetch_one(pool)
        .await
}

pub async fn create_tag(pool: &PgPool) -> Result<i64, sqlx::Error> {
    let slug = unique("tag");
    sqlx::query_scalar(
        r#"
        INSERT INTO tags (name, color, slug)
        VALUES ($1, '#' || SUBSTRING(MD5($1) FROM 1 FOR 6), $1)
        RETURNING id
        "#,
    )
    .bind(slug)
    .fetch_one(pool)
    .await
}

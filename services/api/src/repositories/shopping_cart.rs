//! Shopping cart reads

use common::error::DatabaseResult;
use sqlx::PgPool;

use crate::shopping_list::CartLine;

/// Reads the ingredient lines behind a user's cart
#[derive(Clone)]
pub struct ShoppingCartRepository {
    pool: PgPool,
}

impl ShoppingCartRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Every ingredient line of every recipe in the user's cart
    pub async fn lines_for_user(&self, user_id: i64) -> DatabaseResult<Vec<CartLine>> {
        let lines = sqlx::query_as::<_, CartLine>(
            r#"
            SELECT i.id AS ingredient_id, i.name, i.measurement_unit, ri.amount::BIGINT AS amount
            FROM carts c
            JOIN recipe_ingredients ri ON ri.recipe_id = c.recipe_id
            JOIN ingredients i ON i.id = ri.ingredient_id
            WHERE c.user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(lines)
    }
}

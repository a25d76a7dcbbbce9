//! Application state shared across handlers

use sqlx::PgPool;

use crate::{
    config::ShoppingListConfig,
    middleware::JwtVerifier,
    repositories::{
        UserRepository,
        catalog::{IngredientRepository, TagRepository},
        recipe::{RecipeRepository, RecipeViews},
        relation::RelationRepository,
        shopping_cart::ShoppingCartRepository,
    },
};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub jwt: JwtVerifier,
    pub shopping_list: ShoppingListConfig,
    pub user_repository: UserRepository,
    pub ingredient_repository: IngredientRepository,
    pub tag_repository: TagRepository,
    pub recipe_repository: RecipeRepository,
    pub relation_repository: RelationRepository,
    pub shopping_cart_repository: ShoppingCartRepository,
}

impl AppState {
    pub fn new(db_pool: PgPool, jwt: JwtVerifier, shopping_list: ShoppingListConfig) -> Self {
        Self {
            jwt,
            shopping_list,
            user_repository: UserRepository::new(db_pool.clone()),
            ingredient_repository: IngredientRepository::new(db_pool.clone()),
            tag_repository: TagRepository::new(db_pool.clone()),
            recipe_repository: RecipeRepository::new(db_pool.clone()),
            relation_repository: RelationRepository::new(db_pool.clone()),
            shopping_cart_repository: ShoppingCartRepository::new(db_pool.clone()),
            db_pool,
        }
    }

    /// Recipe view assembler over this state's repositories
    pub fn recipe_views(&self) -> RecipeViews {
        RecipeViews {
            recipes: self.recipe_repository.clone(),
            users: self.user_repository.clone(),
            tags: self.tag_repository.clone(),
            relations: self.relation_repository.clone(),
        }
    }
}

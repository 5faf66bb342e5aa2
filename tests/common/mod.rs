#![allow(dead_code)]

use chrono::Utc;
use hat_store::{
    db::create_schema,
    entity::{products::ActiveModel as ProductActive, users::ActiveModel as UserActive},
    middleware::auth::AuthUser,
    models::Product,
    state::AppState,
};
use sea_orm::{ActiveModelTrait, ConnectOptions, Database, Set};
use serde_json::json;
use uuid::Uuid;

pub const TEST_SECRET: &str = "test-secret";

// One connection: every connection to `sqlite::memory:` is its own database.
pub async fn setup_state() -> anyhow::Result<AppState> {
    let mut options = ConnectOptions::new("sqlite::memory:");
    options
        .max_connections(1)
        .min_connections(1)
        .sqlx_logging(false);
    let orm = Database::connect(options).await?;
    create_schema(&orm).await?;
    Ok(AppState::new(orm, TEST_SECRET))
}

pub async fn create_user(state: &AppState, role: &str, name: &str) -> anyhow::Result<AuthUser> {
    let user = UserActive {
        id: Set(Uuid::new_v4()),
        email: Set(format!("{}@example.com", name.to_lowercase().replace(' ', "."))),
        name: Set(Some(name.to_string())),
        password_hash: Set("dummy".into()),
        role: Set(role.into()),
        created_at: Set(Utc::now().into()),
    }
    .insert(&state.orm)
    .await?;

    Ok(AuthUser {
        user_id: user.id,
        role: user.role,
        name: user.name,
    })
}

pub async fn create_product(
    state: &AppState,
    slug: &str,
    price: i64,
    collection: &str,
) -> anyhow::Result<Product> {
    let product = ProductActive {
        id: Set(Uuid::new_v4()),
        slug: Set(slug.to_string()),
        name: Set(slug.replace('-', " ")),
        description: Set(Some(format!("The {slug}"))),
        price: Set(price),
        sale_price: Set(None),
        image: Set(None),
        collection: Set(Some(collection.to_string())),
        sizes: Set(json!(["M", "L"])),
        rating: Set(0.0),
        review_count: Set(0),
        created_at: Set(Utc::now().into()),
    }
    .insert(&state.orm)
    .await?;

    Ok(product.into())
}

use chrono::Utc;
use hat_store::{
    config::AppConfig,
    db::{OrmConn, create_orm_conn, run_migrations},
    entity::{
        products::{self, Entity as Products},
        users::{self, Entity as Users},
    },
    services::auth_service::hash_password,
};
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set};
use serde_json::json;
use uuid::Uuid;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    let orm = create_orm_conn(&config.database_url).await?;
    // Ensure migrations are applied.
    run_migrations(&orm).await?;

    let admin_id = ensure_user(&orm, "admin@example.com", "admin123", "Store Admin", "admin").await?;
    let user_id = ensure_user(&orm, "user@example.com", "user123", "Hat Fan", "user").await?;
    seed_products(&orm).await?;

    println!("Seed completed. Admin ID: {admin_id}, User ID: {user_id}");
    Ok(())
}

async fn ensure_user(
    orm: &OrmConn,
    email: &str,
    password: &str,
    name: &str,
    role: &str,
) -> anyhow::Result<Uuid> {
    if let Some(existing) = Users::find()
        .filter(users::Column::Email.eq(email))
        .one(orm)
        .await?
    {
        let mut active: users::ActiveModel = existing.into();
        active.role = Set(role.to_string());
        let user = active.update(orm).await?;
        println!("Ensured user {email} (role={role})");
        return Ok(user.id);
    }

    let user = users::ActiveModel {
        id: Set(Uuid::new_v4()),
        email: Set(email.to_string()),
        name: Set(Some(name.to_string())),
        password_hash: Set(hash_password(password)?),
        role: Set(role.to_string()),
        created_at: Set(Utc::now().into()),
    }
    .insert(orm)
    .await?;

    println!("Created user {email} (role={role})");
    Ok(user.id)
}

async fn seed_products(orm: &OrmConn) -> anyhow::Result<()> {
    let hats: [(&str, &str, &str, i64, Option<i64>, &str, &[&str]); 5] = [
        ("classic-fedora", "Classic Fedora", "Wool felt fedora with a grosgrain band", 8900, None, "Classics", &["S", "M", "L", "XL"]),
        ("panama-straw", "Panama Straw", "Hand-woven toquilla straw for summer", 12900, Some(9900), "Summer", &["M", "L"]),
        ("merino-beanie", "Merino Beanie", "Ribbed merino beanie", 3500, None, "Winter", &["One Size"]),
        ("tweed-flat-cap", "Tweed Flat Cap", "Harris tweed flat cap", 5400, Some(4500), "Classics", &["S", "M", "L"]),
        ("bowler-hat", "Bowler Hat", "Stiff felt bowler", 11000, None, "Formal", &["M", "L"]),
    ];

    for (slug, name, description, price, sale_price, collection, sizes) in hats {
        let exists = Products::find()
            .filter(products::Column::Slug.eq(slug))
            .one(orm)
            .await?
            .is_some();
        if exists {
            continue;
        }

        products::ActiveModel {
            id: Set(Uuid::new_v4()),
            slug: Set(slug.to_string()),
            name: Set(name.to_string()),
            description: Set(Some(description.to_string())),
            price: Set(price),
            sale_price: Set(sale_price),
            image: Set(Some(format!("/images/products/{slug}.jpg"))),
            collection: Set(Some(collection.to_string())),
            sizes: Set(json!(sizes)),
            rating: Set(0.0),
            review_count: Set(0),
            created_at: Set(Utc::now().into()),
        }
        .insert(orm)
        .await?;
    }

    println!("Seeded products");
    Ok(())
}

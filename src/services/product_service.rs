use sea_orm::{
    ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect,
};
use sea_orm::sea_query::{Expr, Func};
use uuid::Uuid;

use crate::{
    db::OrmConn,
    dto::products::ProductList,
    entity::products::{Column, Entity as Products},
    error::{AppError, AppResult},
    models::Product,
    response::{ApiResponse, Meta},
    routes::params::{ProductQuery, ProductSortBy, SortOrder},
    state::AppState,
};

pub async fn list_products(
    state: &AppState,
    query: ProductQuery,
) -> AppResult<ApiResponse<ProductList>> {
    let (page, limit, offset) = query.pagination().normalize();
    let mut condition = Condition::all();

    if let Some(search) = query.q.as_ref().map(|s| s.trim()).filter(|s| !s.is_empty()) {
        let pattern = format!("%{}%", search.to_lowercase());
        condition = condition.add(
            Condition::any()
                .add(Expr::expr(Func::lower(Expr::col(Column::Name))).like(pattern.clone()))
                .add(Expr::expr(Func::lower(Expr::col(Column::Description))).like(pattern)),
        );
    }

    if let Some(collection) = query.collection.as_ref().filter(|c| !c.is_empty()) {
        condition = condition.add(Column::Collection.eq(collection.as_str()));
    }

    if let Some(min_price) = query.min_price {
        condition = condition.add(Column::Price.gte(min_price));
    }

    if let Some(max_price) = query.max_price {
        condition = condition.add(Column::Price.lte(max_price));
    }

    let sort_by = query.sort_by.unwrap_or(ProductSortBy::CreatedAt);
    let sort_order = query.sort_order.unwrap_or(SortOrder::Desc);
    let sort_col = match sort_by {
        ProductSortBy::CreatedAt => Column::CreatedAt,
        ProductSortBy::Price => Column::Price,
        ProductSortBy::Name => Column::Name,
        ProductSortBy::Rating => Column::Rating,
    };

    let mut finder = Products::find().filter(condition);
    finder = match sort_order {
        SortOrder::Asc => finder.order_by_asc(sort_col),
        SortOrder::Desc => finder.order_by_desc(sort_col),
    };

    let total = finder.clone().count(&state.orm).await? as i64;

    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Product::from)
        .collect();

    let meta = Meta::new(page, limit, total);
    let data = ProductList { items };
    Ok(ApiResponse::success("Products", data, Some(meta)))
}

pub async fn get_product(state: &AppState, key: &str) -> AppResult<ApiResponse<Product>> {
    let product = find_product(&state.orm, key)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(ApiResponse::success("Product", product, None))
}

/// Look a product up by UUID, falling back to its slug.
pub async fn find_product(conn: &OrmConn, key: &str) -> AppResult<Option<Product>> {
    let key = key.trim();
    if let Ok(id) = Uuid::parse_str(key) {
        if let Some(model) = Products::find_by_id(id).one(conn).await? {
            return Ok(Some(model.into()));
        }
    }

    let model = Products::find()
        .filter(Column::Slug.eq(key))
        .one(conn)
        .await?;
    Ok(model.map(Product::from))
}

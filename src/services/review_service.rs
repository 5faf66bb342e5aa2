use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, QuerySelect, Set,
    TransactionTrait,
};
use sea_orm::sea_query::Expr;
use serde_json::json;
use uuid::Uuid;

use crate::{
    audit,
    db::OrmConn,
    dto::reviews::{CreateReviewRequest, DeleteReviewQuery, ReviewListQuery, UpdateReviewRequest},
    entity::{
        products::{self, Entity as Products},
        reviews::{ActiveModel, Column, Entity as Reviews},
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::Review,
    state::AppState,
};

pub const ANONYMOUS: &str = "Anonymous";
pub const MIN_RATING: i64 = 1;
pub const MAX_RATING: i64 = 5;

/// Denormalized rating fields written back onto a product.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RatingSummary {
    pub rating: f64,
    pub review_count: i32,
}

impl RatingSummary {
    pub fn from_ratings(ratings: &[i32]) -> Self {
        if ratings.is_empty() {
            return Self {
                rating: 0.0,
                review_count: 0,
            };
        }
        let sum: i64 = ratings.iter().map(|r| i64::from(*r)).sum();
        Self {
            rating: sum as f64 / ratings.len() as f64,
            review_count: ratings.len() as i32,
        }
    }
}

pub async fn list_reviews(state: &AppState, query: ReviewListQuery) -> AppResult<Vec<Review>> {
    let product_id = required_id("productId", query.product_id.as_deref())?;

    let reviews = Reviews::find()
        .filter(Column::ProductId.eq(product_id))
        .order_by_desc(Column::CreatedAt)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Review::from)
        .collect();

    Ok(reviews)
}

pub async fn create_review(
    state: &AppState,
    user: Option<&AuthUser>,
    payload: CreateReviewRequest,
) -> AppResult<Review> {
    let product_id = required_id("productId", payload.product_id.as_deref())?;
    let rating = payload
        .rating
        .ok_or_else(|| AppError::bad_request("rating is required"))
        .and_then(validate_rating)?;

    if Products::find_by_id(product_id)
        .one(&state.orm)
        .await?
        .is_none()
    {
        return Err(AppError::NotFound);
    }

    let user_name = non_blank(payload.user_name)
        .or_else(|| user.and_then(|u| non_blank(u.name.clone())))
        .unwrap_or_else(|| ANONYMOUS.to_string());
    let now = Utc::now();

    let review = ActiveModel {
        id: Set(Uuid::new_v4()),
        product_id: Set(product_id),
        user_id: Set(user.map(|u| u.user_id)),
        user_name: Set(user_name),
        rating: Set(rating),
        title: Set(payload.title),
        review_text: Set(payload.review_text),
        verified: Set(user.is_some()),
        images: Set(json!(payload.images.unwrap_or_default())),
        helpful: Set(0),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    }
    .insert(&state.orm)
    .await?;

    tracing::info!(review_id = %review.id, product_id = %product_id, rating, "review created");
    refresh_product_rating(&state.orm, product_id).await;
    audit::record(
        &state.orm,
        user.map(|u| u.user_id),
        "review_create",
        "reviews",
        json!({ "review_id": review.id, "product_id": product_id, "rating": rating }),
    )
    .await;

    Ok(Review::from(review))
}

pub async fn update_review(
    state: &AppState,
    user: Option<&AuthUser>,
    payload: UpdateReviewRequest,
) -> AppResult<Review> {
    let review_id = required_id("reviewId", payload.review_id.as_deref())?;
    let user = user.ok_or(AppError::Unauthorized)?;
    let rating = payload.rating.map(validate_rating).transpose()?;
    if payload.helpful.is_some_and(|h| h < 0) {
        return Err(AppError::bad_request("helpful must not be negative"));
    }

    let existing = Reviews::find_by_id(review_id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;
    if !user.can_modify(existing.user_id) {
        return Err(AppError::Forbidden);
    }

    let touches_rating = payload.touches_rating();
    let product_id = existing.product_id;
    let mut active: ActiveModel = existing.into();
    if let Some(rating) = rating {
        active.rating = Set(rating);
    }
    if let Some(title) = payload.title {
        active.title = Set(Some(title));
    }
    if let Some(text) = payload.review_text {
        active.review_text = Set(Some(text));
    }
    if let Some(name) = non_blank(payload.user_name) {
        active.user_name = Set(name);
    }
    if let Some(images) = payload.images {
        active.images = Set(json!(images));
    }
    if let Some(helpful) = payload.helpful {
        active.helpful = Set(helpful);
    }
    active.updated_at = Set(Utc::now().into());

    let review = active.update(&state.orm).await?;

    if touches_rating {
        refresh_product_rating(&state.orm, product_id).await;
    }
    audit::record(
        &state.orm,
        Some(user.user_id),
        "review_update",
        "reviews",
        json!({ "review_id": review_id, "product_id": product_id }),
    )
    .await;

    Ok(Review::from(review))
}

pub async fn delete_review(
    state: &AppState,
    user: Option<&AuthUser>,
    query: DeleteReviewQuery,
) -> AppResult<()> {
    let review_id = required_id("reviewId", query.review_id.as_deref())?;
    let user = user.ok_or(AppError::Unauthorized)?;

    let existing = Reviews::find_by_id(review_id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;
    if !user.can_modify(existing.user_id) {
        return Err(AppError::Forbidden);
    }

    let result = Reviews::delete_by_id(review_id).exec(&state.orm).await?;
    if result.rows_affected == 0 {
        return Err(AppError::NotFound);
    }

    tracing::info!(review_id = %review_id, product_id = %existing.product_id, "review deleted");
    refresh_product_rating(&state.orm, existing.product_id).await;
    audit::record(
        &state.orm,
        Some(user.user_id),
        "review_delete",
        "reviews",
        json!({ "review_id": review_id, "product_id": existing.product_id }),
    )
    .await;

    Ok(())
}

/// Recompute a product's mean rating and review count from its full review set.
///
/// The read and the write share one transaction. This is a full recompute,
/// never a running average.
pub async fn recompute_product_rating(conn: &OrmConn, product_id: Uuid) -> AppResult<RatingSummary> {
    let txn = conn.begin().await?;

    let ratings: Vec<i32> = Reviews::find()
        .select_only()
        .column(Column::Rating)
        .filter(Column::ProductId.eq(product_id))
        .into_tuple()
        .all(&txn)
        .await?;
    let summary = RatingSummary::from_ratings(&ratings);

    Products::update_many()
        .col_expr(products::Column::Rating, Expr::value(summary.rating))
        .col_expr(products::Column::ReviewCount, Expr::value(summary.review_count))
        .filter(products::Column::Id.eq(product_id))
        .exec(&txn)
        .await?;

    txn.commit().await?;
    Ok(summary)
}

// The review write has already succeeded; a failed recompute must not undo it.
async fn refresh_product_rating(conn: &OrmConn, product_id: Uuid) {
    match recompute_product_rating(conn, product_id).await {
        Ok(summary) => tracing::debug!(
            product_id = %product_id,
            rating = summary.rating,
            review_count = summary.review_count,
            "product rating recomputed"
        ),
        Err(err) => tracing::warn!(
            error = %err,
            product_id = %product_id,
            "product rating recompute failed"
        ),
    }
}

fn required_id(field: &str, value: Option<&str>) -> AppResult<Uuid> {
    let value = value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| AppError::bad_request(format!("{field} is required")))?;
    Uuid::parse_str(value).map_err(|_| AppError::bad_request(format!("{field} is not a valid id")))
}

fn validate_rating(rating: i64) -> AppResult<i32> {
    if !(MIN_RATING..=MAX_RATING).contains(&rating) {
        return Err(AppError::bad_request(format!(
            "rating must be between {MIN_RATING} and {MAX_RATING}"
        )));
    }
    Ok(rating as i32)
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

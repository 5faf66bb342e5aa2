use axum::{Json, Router, extract::State, http::StatusCode, routing::get};

use crate::{
    dto::reviews::{CreateReviewRequest, DeleteReviewQuery, ReviewListQuery, UpdateReviewRequest},
    error::AppResult,
    extract::{ApiJson, ApiQuery},
    middleware::auth::AuthUser,
    models::Review,
    response::MutationResponse,
    services::review_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new().route(
        "/",
        get(list_reviews)
            .post(create_review)
            .patch(update_review)
            .delete(delete_review),
    )
}

#[utoipa::path(
    get,
    path = "/api/reviews",
    params(ReviewListQuery),
    responses(
        (status = 200, description = "Reviews for the product, newest first", body = Vec<Review>),
        (status = 400, description = "productId missing or invalid"),
        (status = 500, description = "Datastore error"),
    ),
    tag = "Reviews"
)]
pub async fn list_reviews(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<ReviewListQuery>,
) -> AppResult<Json<Vec<Review>>> {
    let reviews = review_service::list_reviews(&state, query).await?;
    Ok(Json(reviews))
}

#[utoipa::path(
    post,
    path = "/api/reviews",
    request_body = CreateReviewRequest,
    responses(
        (status = 201, description = "Review created", body = MutationResponse<Review>),
        (status = 400, description = "productId or rating missing, or rating outside 1..=5"),
        (status = 401, description = "Malformed or expired session token"),
        (status = 404, description = "Product not found"),
        (status = 500, description = "Datastore error"),
    ),
    security((), ("bearer_auth" = [])),
    tag = "Reviews"
)]
pub async fn create_review(
    State(state): State<AppState>,
    user: Option<AuthUser>,
    ApiJson(payload): ApiJson<CreateReviewRequest>,
) -> AppResult<(StatusCode, Json<MutationResponse<Review>>)> {
    let review = review_service::create_review(&state, user.as_ref(), payload).await?;
    Ok((StatusCode::CREATED, Json(MutationResponse::with_review(review))))
}

#[utoipa::path(
    patch,
    path = "/api/reviews",
    request_body = UpdateReviewRequest,
    responses(
        (status = 200, description = "Review updated", body = MutationResponse<Review>),
        (status = 400, description = "reviewId missing or a field is invalid"),
        (status = 401, description = "No session"),
        (status = 403, description = "Not the owner and not an admin"),
        (status = 404, description = "Review not found"),
        (status = 500, description = "Datastore error"),
    ),
    security(("bearer_auth" = [])),
    tag = "Reviews"
)]
pub async fn update_review(
    State(state): State<AppState>,
    user: Option<AuthUser>,
    ApiJson(payload): ApiJson<UpdateReviewRequest>,
) -> AppResult<Json<MutationResponse<Review>>> {
    let review = review_service::update_review(&state, user.as_ref(), payload).await?;
    Ok(Json(MutationResponse::with_review(review)))
}

#[utoipa::path(
    delete,
    path = "/api/reviews",
    params(DeleteReviewQuery),
    responses(
        (status = 200, description = "Review deleted", body = MutationResponse<Review>),
        (status = 400, description = "reviewId missing or invalid"),
        (status = 401, description = "No session"),
        (status = 403, description = "Not the owner and not an admin"),
        (status = 404, description = "Review not found"),
        (status = 500, description = "Datastore error"),
    ),
    security(("bearer_auth" = [])),
    tag = "Reviews"
)]
pub async fn delete_review(
    State(state): State<AppState>,
    user: Option<AuthUser>,
    ApiQuery(query): ApiQuery<DeleteReviewQuery>,
) -> AppResult<Json<MutationResponse<Review>>> {
    review_service::delete_review(&state, user.as_ref(), query).await?;
    Ok(Json(MutationResponse::done()))
}

use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};

/// Ids arrive as strings so a malformed id is reported as a 400 naming the field.
#[derive(Debug, Default, Deserialize, ToSchema, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ReviewListQuery {
    pub product_id: Option<String>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateReviewRequest {
    pub product_id: Option<String>,
    pub rating: Option<i64>,
    pub title: Option<String>,
    pub review_text: Option<String>,
    pub user_name: Option<String>,
    pub images: Option<Vec<String>>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateReviewRequest {
    pub review_id: Option<String>,
    pub rating: Option<i64>,
    pub title: Option<String>,
    pub review_text: Option<String>,
    pub user_name: Option<String>,
    pub images: Option<Vec<String>>,
    pub helpful: Option<i32>,
}

impl UpdateReviewRequest {
    pub fn touches_rating(&self) -> bool {
        self.rating.is_some()
    }
}

#[derive(Debug, Default, Deserialize, ToSchema, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct DeleteReviewQuery {
    pub review_id: Option<String>,
}

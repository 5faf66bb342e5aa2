pub mod auth_service;
pub mod product_service;
pub mod review_service;

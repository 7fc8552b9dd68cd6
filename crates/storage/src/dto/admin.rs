use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

/// Request payload for an administrative rating override
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct RatingOverrideRequest {
    #[validate(range(min = 0, max = 10000, message = "Rating must be between 0 and 10000"))]
    pub rating: i32,
}

use serde::Deserialize;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateReview {
    pub book_id: Option<String>,
    pub rating: Option<i64>,
    /// Comment text; defaults to empty.
    pub review: Option<String>,
}

/// Absent fields are left unchanged; an empty `review` clears the comment.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateReview {
    pub rating: Option<i64>,
    pub review: Option<String>,
}

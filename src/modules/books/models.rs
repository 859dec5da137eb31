use serde::{Deserialize, Serialize};
use shelf_db::{records::calendar_date, Book, RecordId, Review};
use time::Date;

/// `subcategory` may be sent as a single string or as a list.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Subcategories {
    One(String),
    Many(Vec<String>),
}

impl Subcategories {
    pub fn into_vec(self) -> Vec<String> {
        match self {
            Subcategories::One(value) => vec![value],
            Subcategories::Many(values) => values,
        }
    }
}

/// Request body for creating a book. Every field is checked by the catalog
/// store; absent ones are reported together.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBook {
    pub title: Option<String>,
    pub excerpt: Option<String>,
    /// Defaults to the authenticated caller.
    pub user_id: Option<String>,
    #[serde(rename = "ISBN")]
    pub isbn: Option<String>,
    pub category: Option<String>,
    pub subcategory: Option<Subcategories>,
    pub released_at: Option<String>,
}

/// Partial update. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateBook {
    pub title: Option<String>,
    pub excerpt: Option<String>,
    #[serde(rename = "ISBN")]
    pub isbn: Option<String>,
    pub category: Option<String>,
    pub subcategory: Option<Subcategories>,
    pub released_at: Option<String>,
}

/// List projection of a live book.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookSummary {
    pub id: RecordId,
    pub title: String,
    pub excerpt: String,
    pub user_id: RecordId,
    pub category: String,
    #[serde(with = "calendar_date")]
    pub released_at: Date,
    pub reviews: u32,
}

impl From<&Book> for BookSummary {
    fn from(book: &Book) -> Self {
        Self {
            id: book.id,
            title: book.title.clone(),
            excerpt: book.excerpt.clone(),
            user_id: book.user_id,
            category: book.category.clone(),
            released_at: book.released_at,
            reviews: book.reviews,
        }
    }
}

/// A book together with its live reviews.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookDetails {
    #[serde(flatten)]
    pub book: Book,
    pub reviews_data: Vec<Review>,
}

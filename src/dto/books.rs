use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::Book;

#[derive(Debug, Deserialize, ToSchema)]
pub struct BookQuery {
    /// Case-insensitive substring match against title or author.
    pub q: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateBookRequest {
    pub title: String,
    pub author: String,
    pub buy_price: f64,
    pub rent_price: f64,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateBookRequest {
    pub title: Option<String>,
    pub author: Option<String>,
    pub buy_price: Option<f64>,
    pub rent_price: Option<f64>,
}

#[derive(Serialize, ToSchema)]
#[serde(transparent)]
pub struct BookList {
    #[schema(value_type = Vec<Book>)]
    pub items: Vec<Book>,
}

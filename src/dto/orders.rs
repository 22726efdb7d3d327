use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::{ItemKind, OrderStatus};

#[derive(Debug, Deserialize, ToSchema)]
pub struct CartLine {
    pub book_id: i64,
    /// "buy" or "rent"; validated by the service, not by serde, so an
    /// unknown kind reports the item error rather than a body error.
    pub kind: String,
    /// Defaults to 1 when omitted.
    pub quantity: Option<i64>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct PlaceOrderRequest {
    #[serde(default)]
    pub items: Vec<CartLine>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateOrderStatusRequest {
    pub status: String,
}

/// A line item as serialized. Title and author are resolved from the
/// catalog at read time; only the unit price is a snapshot.
#[derive(Debug, Serialize, ToSchema)]
pub struct OrderItemView {
    pub id: i32,
    pub book_id: i32,
    pub title: String,
    pub author: String,
    pub kind: ItemKind,
    pub quantity: i32,
    pub unit_price: f64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderView {
    pub id: i32,
    pub user_id: i32,
    pub created_at: DateTime<Utc>,
    pub status: OrderStatus,
    pub total_amount: f64,
    pub items: Vec<OrderItemView>,
}

#[derive(Serialize, ToSchema)]
#[serde(transparent)]
pub struct OrderList {
    #[schema(value_type = Vec<OrderView>)]
    pub items: Vec<OrderView>,
}

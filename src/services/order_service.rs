use std::collections::HashMap;

use sea_orm::ActiveValue::NotSet;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};

use crate::{
    dto::orders::{
        CartLine, OrderItemView, OrderList, OrderView, PlaceOrderRequest, UpdateOrderStatusRequest,
    },
    entity::{
        books::{Entity as Books, Model as BookModel},
        order_items::{
            ActiveModel as OrderItemActive, Column as OrderItemCol, Entity as OrderItems,
            Model as OrderItemModel,
        },
        orders::{ActiveModel as OrderActive, Column as OrderCol, Entity as Orders, Model as OrderModel},
    },
    error::{AppError, AppResult},
    mailer::{OrderReceipt, ReceiptLine},
    middleware::auth::{AuthUser, ensure_manager},
    models::{ItemKind, OrderStatus, Role},
    money::amount_from_cents,
    response::{ApiResponse, Meta},
    state::AppState,
};

/// A cart line after shape validation, before catalog resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidLine {
    pub book_id: i32,
    pub kind: ItemKind,
    pub quantity: i32,
}

/// Shape-validate the cart. Checks run in a fixed order across the whole
/// cart: emptiness, then item identity and kind, then quantities. Catalog
/// resolution happens later, inside the transaction.
pub fn validate_lines(lines: &[CartLine]) -> Result<Vec<ValidLine>, AppError> {
    if lines.is_empty() {
        return Err(AppError::Validation("No items provided".into()));
    }

    let mut kinds = Vec::with_capacity(lines.len());
    for line in lines {
        if line.book_id <= 0 || i32::try_from(line.book_id).is_err() {
            return Err(AppError::Validation("Invalid item data".into()));
        }
        let kind = line
            .kind
            .parse::<ItemKind>()
            .map_err(|_| AppError::Validation("Invalid item data".into()))?;
        kinds.push(kind);
    }

    let mut valid = Vec::with_capacity(lines.len());
    for (line, kind) in lines.iter().zip(kinds) {
        let quantity = line.quantity.unwrap_or(1);
        if quantity <= 0 || i32::try_from(quantity).is_err() {
            return Err(AppError::Validation("Quantity must be positive".into()));
        }
        valid.push(ValidLine {
            book_id: line.book_id as i32,
            kind,
            quantity: quantity as i32,
        });
    }
    Ok(valid)
}

pub async fn place_order(
    state: &AppState,
    user: &AuthUser,
    payload: PlaceOrderRequest,
) -> AppResult<ApiResponse<OrderView>> {
    let lines = validate_lines(&payload.items)?;

    let txn = state.orm.begin().await?;

    // One fetch per distinct book; repeated lines reuse it. Prices are
    // snapshotted from these rows and never re-read.
    let mut books: HashMap<i32, BookModel> = HashMap::new();
    for line in &lines {
        if !books.contains_key(&line.book_id) {
            let book = Books::find_by_id(line.book_id)
                .one(&txn)
                .await?
                .ok_or_else(|| AppError::NotFound(format!("Book not found: {}", line.book_id)))?;
            books.insert(line.book_id, book);
        }
    }

    let mut total: i64 = 0;
    for line in &lines {
        let book = &books[&line.book_id];
        let unit_price = match line.kind {
            ItemKind::Buy => book.buy_price,
            ItemKind::Rent => book.rent_price,
        };
        total += unit_price * i64::from(line.quantity);
    }

    let order = OrderActive {
        id: NotSet,
        user_id: Set(user.id),
        status: Set(OrderStatus::Pending.as_str().to_string()),
        total_amount: Set(total),
        created_at: NotSet,
    }
    .insert(&txn)
    .await?;

    let mut item_views = Vec::with_capacity(lines.len());
    let mut receipt_lines = Vec::with_capacity(lines.len());
    for line in &lines {
        let book = &books[&line.book_id];
        let unit_price = match line.kind {
            ItemKind::Buy => book.buy_price,
            ItemKind::Rent => book.rent_price,
        };

        let item = OrderItemActive {
            id: NotSet,
            order_id: Set(order.id),
            book_id: Set(line.book_id),
            kind: Set(line.kind.as_str().to_string()),
            quantity: Set(line.quantity),
            unit_price: Set(unit_price),
        }
        .insert(&txn)
        .await?;

        item_views.push(OrderItemView {
            id: item.id,
            book_id: book.id,
            title: book.title.clone(),
            author: book.author.clone(),
            kind: line.kind,
            quantity: item.quantity,
            unit_price: amount_from_cents(item.unit_price),
        });
        receipt_lines.push(ReceiptLine {
            title: book.title.clone(),
            kind: line.kind,
            quantity: item.quantity,
            unit_price_cents: item.unit_price,
        });
    }

    txn.commit().await?;

    tracing::info!(order_id = order.id, user_id = user.id, "order placed");

    // Fire-and-forget receipt. The order is complete once committed; the
    // send runs detached and discards its errors.
    let receipt = OrderReceipt {
        order_id: order.id,
        username: user.username.clone(),
        email: user.email.clone(),
        status: order.status.clone(),
        items: receipt_lines,
        total_cents: order.total_amount,
    };
    let mailer = state.mailer.clone();
    tokio::spawn(async move {
        mailer.send_receipt(&receipt).await;
    });

    let view = order_view(order, item_views)?;
    Ok(ApiResponse::success("Order placed", view, None))
}

/// Customers see their own orders, managers see everyone's. Newest first.
pub async fn list_orders(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<OrderList>> {
    let mut finder = Orders::find();
    if user.role != Role::Manager {
        finder = finder.filter(OrderCol::UserId.eq(user.id));
    }
    let orders = finder
        .order_by_desc(OrderCol::Id)
        .all(&state.orm)
        .await?;

    let ids: Vec<i32> = orders.iter().map(|o| o.id).collect();
    let mut items_by_order = load_items(&state.orm, &ids).await?;

    let mut views = Vec::with_capacity(orders.len());
    for order in orders {
        let items = items_by_order.remove(&order.id).unwrap_or_default();
        views.push(order_view(order, items)?);
    }

    let total = views.len() as i64;
    Ok(ApiResponse::success(
        "Orders",
        OrderList { items: views },
        Some(Meta::total(total)),
    ))
}

pub async fn update_status(
    state: &AppState,
    user: &AuthUser,
    id: i32,
    payload: UpdateOrderStatusRequest,
) -> AppResult<ApiResponse<OrderView>> {
    ensure_manager(user)?;

    let status: OrderStatus = payload
        .status
        .parse()
        .map_err(|_| AppError::Validation("Invalid status".into()))?;

    let existing = Orders::find_by_id(id).one(&state.orm).await?;
    let existing = match existing {
        Some(o) => o,
        None => return Err(AppError::NotFound("Order not found".into())),
    };

    // Overwrite the status only; the stored total stays as computed at
    // creation time.
    let mut active: OrderActive = existing.into();
    active.status = Set(status.as_str().to_string());
    let order = active.update(&state.orm).await?;

    let mut items_by_order = load_items(&state.orm, &[order.id]).await?;
    let items = items_by_order.remove(&order.id).unwrap_or_default();

    let view = order_view(order, items)?;
    Ok(ApiResponse::success("Status updated", view, None))
}

/// Fetch the items of the given orders with their books joined in, so the
/// serialized title/author reflect the catalog as of now.
async fn load_items<C: ConnectionTrait>(
    conn: &C,
    order_ids: &[i32],
) -> AppResult<HashMap<i32, Vec<OrderItemView>>> {
    if order_ids.is_empty() {
        return Ok(HashMap::new());
    }

    let rows = OrderItems::find()
        .filter(OrderItemCol::OrderId.is_in(order_ids.iter().copied()))
        .order_by_asc(OrderItemCol::Id)
        .find_also_related(Books)
        .all(conn)
        .await?;

    let mut grouped: HashMap<i32, Vec<OrderItemView>> = HashMap::new();
    for (item, book) in rows {
        let order_id = item.order_id;
        grouped
            .entry(order_id)
            .or_default()
            .push(item_view(item, book)?);
    }
    Ok(grouped)
}

fn item_view(item: OrderItemModel, book: Option<BookModel>) -> AppResult<OrderItemView> {
    let book = book.ok_or_else(|| {
        AppError::Internal(anyhow::anyhow!(
            "order item {} references missing book {}",
            item.id,
            item.book_id
        ))
    })?;
    let kind: ItemKind = item
        .kind
        .parse()
        .map_err(|err: String| AppError::Internal(anyhow::anyhow!(err)))?;
    Ok(OrderItemView {
        id: item.id,
        book_id: book.id,
        title: book.title,
        author: book.author,
        kind,
        quantity: item.quantity,
        unit_price: amount_from_cents(item.unit_price),
    })
}

fn order_view(order: OrderModel, items: Vec<OrderItemView>) -> AppResult<OrderView> {
    let status: OrderStatus = order
        .status
        .parse()
        .map_err(|err: String| AppError::Internal(anyhow::anyhow!(err)))?;
    Ok(OrderView {
        id: order.id,
        user_id: order.user_id,
        created_at: order.created_at.with_timezone(&chrono::Utc),
        status,
        total_amount: amount_from_cents(order.total_amount),
        items,
    })
}

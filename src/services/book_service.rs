use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::Expr;
use sea_orm::sea_query::extension::postgres::PgExpr;
use sea_orm::{
    ActiveModelTrait, Condition, EntityTrait, QueryFilter, QueryOrder, Set,
};

use crate::{
    dto::books::{BookList, BookQuery, CreateBookRequest, UpdateBookRequest},
    entity::books::{ActiveModel as BookActive, Column as BookCol, Entity as Books, Model as BookModel},
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_manager},
    models::Book,
    money::{amount_from_cents, cents_from_amount},
    response::{ApiResponse, Meta},
    state::AppState,
};

/// Catalog search: case-insensitive substring match on title or author,
/// all books when no query is given. Any authenticated role may call.
pub async fn search(state: &AppState, query: BookQuery) -> AppResult<ApiResponse<BookList>> {
    let mut condition = Condition::all();
    if let Some(q) = query.q.as_ref().map(|s| s.trim()).filter(|s| !s.is_empty()) {
        let pattern = format!("%{q}%");
        condition = condition.add(
            Condition::any()
                .add(Expr::col(BookCol::Title).ilike(pattern.clone()))
                .add(Expr::col(BookCol::Author).ilike(pattern)),
        );
    }

    let items: Vec<Book> = Books::find()
        .filter(condition)
        .order_by_asc(BookCol::Id)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(book_from_entity)
        .collect();

    let total = items.len() as i64;
    Ok(ApiResponse::success(
        "Books",
        BookList { items },
        Some(Meta::total(total)),
    ))
}

pub async fn create_book(
    state: &AppState,
    user: &AuthUser,
    payload: CreateBookRequest,
) -> AppResult<ApiResponse<Book>> {
    ensure_manager(user)?;

    if payload.title.trim().is_empty() || payload.author.trim().is_empty() {
        return Err(AppError::Validation("Title and author are required".into()));
    }
    let buy_price = cents_from_amount(payload.buy_price, "buy_price")?;
    let rent_price = cents_from_amount(payload.rent_price, "rent_price")?;

    let book = BookActive {
        id: NotSet,
        title: Set(payload.title),
        author: Set(payload.author),
        buy_price: Set(buy_price),
        rent_price: Set(rent_price),
    }
    .insert(&state.orm)
    .await?;

    tracing::info!(book_id = book.id, "book created");
    Ok(ApiResponse::success(
        "Book created",
        book_from_entity(book),
        None,
    ))
}

pub async fn update_book(
    state: &AppState,
    user: &AuthUser,
    id: i32,
    payload: UpdateBookRequest,
) -> AppResult<ApiResponse<Book>> {
    ensure_manager(user)?;

    let existing = Books::find_by_id(id).one(&state.orm).await?;
    let existing = match existing {
        Some(b) => b,
        None => return Err(AppError::NotFound("Book not found".into())),
    };

    let mut active: BookActive = existing.into();
    if let Some(title) = payload.title {
        if title.trim().is_empty() {
            return Err(AppError::Validation("Title must not be empty".into()));
        }
        active.title = Set(title);
    }
    if let Some(author) = payload.author {
        if author.trim().is_empty() {
            return Err(AppError::Validation("Author must not be empty".into()));
        }
        active.author = Set(author);
    }
    if let Some(buy_price) = payload.buy_price {
        active.buy_price = Set(cents_from_amount(buy_price, "buy_price")?);
    }
    if let Some(rent_price) = payload.rent_price {
        active.rent_price = Set(cents_from_amount(rent_price, "rent_price")?);
    }

    let book = active.update(&state.orm).await?;

    Ok(ApiResponse::success("Updated", book_from_entity(book), None))
}

pub fn book_from_entity(model: BookModel) -> Book {
    Book {
        id: model.id,
        title: model.title,
        author: model.author,
        buy_price: amount_from_cents(model.buy_price),
        rent_price: amount_from_cents(model.rent_price),
    }
}

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, patch, post},
};

use crate::{
    dto::books::{BookList, BookQuery, CreateBookRequest, UpdateBookRequest},
    error::AppResult,
    extractor::AppJson,
    middleware::auth::AuthUser,
    models::Book,
    response::ApiResponse,
    services::book_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(search_books))
        .route("/", post(create_book))
        .route("/{id}", patch(update_book))
}

#[utoipa::path(
    get,
    path = "/books",
    params(
        ("q" = Option<String>, Query, description = "Substring match on title or author")
    ),
    responses(
        (status = 200, description = "Search catalog", body = ApiResponse<BookList>),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Books"
)]
pub async fn search_books(
    State(state): State<AppState>,
    _user: AuthUser,
    Query(query): Query<BookQuery>,
) -> AppResult<Json<ApiResponse<BookList>>> {
    let resp = book_service::search(&state, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/books",
    request_body = CreateBookRequest,
    responses(
        (status = 200, description = "Create book", body = ApiResponse<Book>),
        (status = 400, description = "Invalid fields"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Books"
)]
pub async fn create_book(
    State(state): State<AppState>,
    user: AuthUser,
    AppJson(payload): AppJson<CreateBookRequest>,
) -> AppResult<Json<ApiResponse<Book>>> {
    let resp = book_service::create_book(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    patch,
    path = "/books/{id}",
    params(
        ("id" = i32, Path, description = "Book ID")
    ),
    request_body = UpdateBookRequest,
    responses(
        (status = 200, description = "Update book", body = ApiResponse<Book>),
        (status = 400, description = "Invalid fields"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Not Found")
    ),
    security(("bearer_auth" = [])),
    tag = "Books"
)]
pub async fn update_book(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<UpdateBookRequest>,
) -> AppResult<Json<ApiResponse<Book>>> {
    let resp = book_service::update_book(&state, &user, id, payload).await?;
    Ok(Json(resp))
}

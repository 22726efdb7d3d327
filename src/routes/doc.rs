use utoipa::{
    Modify, OpenApi,
    openapi::{
        self,
        OpenApi as OpenApiSpec,
        security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    },
};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    dto::{
        auth::{LoginRequest, LoginResponse, RegisterRequest},
        books::{BookList, BookQuery, CreateBookRequest, UpdateBookRequest},
        orders::{
            CartLine, OrderItemView, OrderList, OrderView, PlaceOrderRequest,
            UpdateOrderStatusRequest,
        },
    },
    models::{Book, ItemKind, OrderStatus, Role, User},
    response::{ApiResponse, Meta},
    routes::{auth, books, health, orders},
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        auth::register,
        auth::login,
        books::search_books,
        books::create_book,
        books::update_book,
        orders::place_order,
        orders::list_orders,
        orders::update_order_status
    ),
    components(
        schemas(
            User,
            Book,
            Role,
            OrderStatus,
            ItemKind,
            RegisterRequest,
            LoginRequest,
            LoginResponse,
            BookQuery,
            CreateBookRequest,
            UpdateBookRequest,
            BookList,
            CartLine,
            PlaceOrderRequest,
            UpdateOrderStatusRequest,
            OrderItemView,
            OrderView,
            OrderList,
            Meta,
            ApiResponse<User>,
            ApiResponse<Book>,
            ApiResponse<BookList>,
            ApiResponse<LoginResponse>,
            ApiResponse<OrderView>,
            ApiResponse<OrderList>
        )
    ),
    security(
        ("bearer_auth" = [])
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Auth", description = "Registration and login"),
        (name = "Books", description = "Catalog endpoints"),
        (name = "Orders", description = "Order endpoints"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}

use bookstore_api::dto::orders::CartLine;
use bookstore_api::error::AppError;
use bookstore_api::models::ItemKind;
use bookstore_api::money::{amount_from_cents, cents_from_amount};
use bookstore_api::services::order_service::validate_lines;

fn line(book_id: i64, kind: &str, quantity: Option<i64>) -> CartLine {
    CartLine {
        book_id,
        kind: kind.to_string(),
        quantity,
    }
}

#[test]
fn empty_cart_is_rejected() {
    let err = validate_lines(&[]).unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
    assert_eq!(err.to_string(), "No items provided");
}

#[test]
fn unknown_kind_is_rejected() {
    let err = validate_lines(&[line(1, "steal", Some(1))]).unwrap_err();
    assert_eq!(err.to_string(), "Invalid item data");
}

#[test]
fn non_positive_book_id_is_rejected() {
    let err = validate_lines(&[line(0, "buy", Some(1))]).unwrap_err();
    assert_eq!(err.to_string(), "Invalid item data");

    let err = validate_lines(&[line(-3, "rent", Some(1))]).unwrap_err();
    assert_eq!(err.to_string(), "Invalid item data");
}

#[test]
fn non_positive_quantity_is_rejected() {
    let err = validate_lines(&[line(1, "buy", Some(0))]).unwrap_err();
    assert_eq!(err.to_string(), "Quantity must be positive");

    let err = validate_lines(&[line(1, "rent", Some(-2))]).unwrap_err();
    assert_eq!(err.to_string(), "Quantity must be positive");
}

#[test]
fn omitted_quantity_defaults_to_one() {
    let lines = validate_lines(&[line(3, "rent", None)]).expect("valid");
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0].book_id, 3);
    assert_eq!(lines[0].kind, ItemKind::Rent);
    assert_eq!(lines[0].quantity, 1);
}

#[test]
fn item_errors_win_over_quantity_errors() {
    // A bad quantity on the first line does not mask a bad kind further
    // down; item identity and kind are checked across the whole cart first.
    let err = validate_lines(&[line(1, "buy", Some(0)), line(2, "steal", Some(1))]).unwrap_err();
    assert_eq!(err.to_string(), "Invalid item data");
}

#[test]
fn amounts_convert_to_cents_and_back() {
    assert_eq!(cents_from_amount(12.50, "buy_price").unwrap(), 1250);
    assert_eq!(cents_from_amount(0.0, "buy_price").unwrap(), 0);
    assert_eq!(cents_from_amount(39.99, "rent_price").unwrap(), 3999);
    assert_eq!(amount_from_cents(1250), 12.50);
    assert_eq!(amount_from_cents(2500), 25.00);
}

#[test]
fn bad_amounts_are_rejected() {
    assert!(cents_from_amount(-0.01, "buy_price").is_err());
    assert!(cents_from_amount(f64::NAN, "buy_price").is_err());
    assert!(cents_from_amount(f64::INFINITY, "rent_price").is_err());
    // sub-cent precision
    assert!(cents_from_amount(12.505, "buy_price").is_err());
}

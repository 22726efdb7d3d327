use crate::error::AppError;

/// Currency is stored as integer cents and exposed on the wire as a plain
/// number with two decimal places.
pub fn amount_from_cents(cents: i64) -> f64 {
    cents as f64 / 100.0
}

/// Parse a wire amount into cents. Rejects negative, non-finite, and
/// sub-cent values so stored prices are always exact.
pub fn cents_from_amount(amount: f64, field: &str) -> Result<i64, AppError> {
    if !amount.is_finite() || amount < 0.0 {
        return Err(AppError::Validation(format!(
            "{field} must be a non-negative amount"
        )));
    }
    let scaled = amount * 100.0;
    if !scaled.is_finite() || scaled > i64::MAX as f64 {
        return Err(AppError::Validation(format!("{field} is out of range")));
    }
    let cents = scaled.round();
    if (scaled - cents).abs() > 1e-6 {
        return Err(AppError::Validation(format!(
            "{field} must have at most two decimal places"
        )));
    }
    Ok(cents as i64)
}

//! Line valuation and order aggregation.
//!
//! An order's `total_amount` must always equal the sum of its line totals;
//! these helpers are the only place either figure is computed. Every result is
//! checked for overflow and for the precision the store keeps exactly.

use crate::errors::ServiceError;
use rust_decimal::Decimal;

/// Largest number of significant digits a stored decimal keeps exactly.
/// SQLite reads decimals back through an `f64`.
pub const MAX_SIGNIFICANT_DIGITS: u32 = 15;

/// Digits in the normalized mantissa; zero has none
pub fn significant_digits(value: Decimal) -> u32 {
    let mut mantissa = value.normalize().mantissa().unsigned_abs();
    let mut digits = 0;
    while mantissa > 0 {
        mantissa /= 10;
        digits += 1;
    }
    digits
}

pub fn is_storable(value: Decimal) -> bool {
    significant_digits(value) <= MAX_SIGNIFICANT_DIGITS
}

fn ensure_storable(value: Decimal, what: &str) -> Result<Decimal, ServiceError> {
    if is_storable(value) {
        Ok(value)
    } else {
        Err(ServiceError::ValidationError(format!(
            "{} {} exceeds {} significant digits",
            what, value, MAX_SIGNIFICANT_DIGITS
        )))
    }
}

fn overflow(what: &str) -> ServiceError {
    ServiceError::ValidationError(format!("{} is out of range", what))
}

/// `quantity * unit_price`
pub fn line_total(quantity: Decimal, unit_price: Decimal) -> Result<Decimal, ServiceError> {
    let total = quantity
        .checked_mul(unit_price)
        .ok_or_else(|| overflow("Line total"))?;
    ensure_storable(total, "Line total")
}

/// Sum of already-computed line totals
pub fn order_total<I>(line_totals: I) -> Result<Decimal, ServiceError>
where
    I: IntoIterator<Item = Decimal>,
{
    let total = line_totals
        .into_iter()
        .try_fold(Decimal::ZERO, |acc, line| acc.checked_add(line))
        .ok_or_else(|| overflow("Order total"))?;
    ensure_storable(total, "Order total")
}

/// Signed change to apply to the order when a line total moves from `old` to `new`
pub fn total_delta(old: Decimal, new: Decimal) -> Result<Decimal, ServiceError> {
    new.checked_sub(old).ok_or_else(|| overflow("Line total change"))
}

/// Order total after a line-item create (`old = 0`), update, or delete (`new = 0`)
pub fn adjust_total(
    current: Decimal,
    old_line: Decimal,
    new_line: Decimal,
) -> Result<Decimal, ServiceError> {
    let total = current
        .checked_add(total_delta(old_line, new_line)?)
        .ok_or_else(|| overflow("Order total"))?;
    ensure_storable(total, "Order total")
}

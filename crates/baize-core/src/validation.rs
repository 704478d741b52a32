//! # Validation Module
//!
//! Input validation for the pricing and stock engines. Errors raised here
//! are user-facing and always precede any mutation.

use crate::error::{ValidationError, ValidationResult};
use crate::MAX_ORDER_ITEM_QUANTITY;

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a stock movement quantity.
///
/// ## Rules
/// - Must be positive (> 0); both `increase_stock` and `decrease_stock`
///   take an unsigned-in-spirit magnitude and derive the sign themselves.
///
/// The resulting "quantity must be positive" message bubbles verbatim to
/// the operator UI.
pub fn validate_stock_quantity(quantity: i64) -> ValidationResult<()> {
    if quantity <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }
    Ok(())
}

/// Validates an order-line quantity.
///
/// ## Rules
/// - Must be positive
/// - Must not exceed MAX_ORDER_ITEM_QUANTITY (999)
pub fn validate_order_quantity(quantity: i64) -> ValidationResult<()> {
    validate_stock_quantity(quantity)?;

    if quantity > MAX_ORDER_ITEM_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_ORDER_ITEM_QUANTITY,
        });
    }
    Ok(())
}

/// Validates an hourly rate or unit price.
///
/// ## Rules
/// - Must be a finite number (NaN/infinity never enter the catalog)
/// - Must not be negative; zero is allowed (free play, promo items)
pub fn validate_rate(rate: f64) -> ValidationResult<()> {
    if !rate.is_finite() {
        return Err(ValidationError::InvalidFormat {
            field: "rate".to_string(),
            reason: "must be a finite number".to_string(),
        });
    }
    if rate < 0.0 {
        return Err(ValidationError::MustBeNonNegative {
            field: "rate".to_string(),
        });
    }
    Ok(())
}

// =============================================================================
// Identifier Validators
// =============================================================================

/// Validates a UUID string format.
pub fn validate_uuid(id: &str) -> ValidationResult<()> {
    if id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "id".to_string(),
        });
    }

    uuid::Uuid::parse_str(id).map_err(|_| ValidationError::InvalidFormat {
        field: "id".to_string(),
        reason: "must be a valid UUID".to_string(),
    })?;

    Ok(())
}

/// Validates an item identifier.
///
/// Item ids come from the surrounding catalog and are opaque here; only
/// emptiness and length are checked.
pub fn validate_item_id(item_id: &str) -> ValidationResult<()> {
    let item_id = item_id.trim();

    if item_id.is_empty() {
        return Err(ValidationError::Required {
            field: "item_id".to_string(),
        });
    }

    if item_id.len() > 64 {
        return Err(ValidationError::InvalidFormat {
            field: "item_id".to_string(),
            reason: "must be at most 64 characters".to_string(),
        });
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

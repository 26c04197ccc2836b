//! Error types for budget aggregation

use thiserror::Error;

/// Aggregation errors
///
/// These signal bad data or programming errors; they are not user-facing.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AggregationError {
    /// Exchange rate is zero or missing
    #[error("Division by zero: no usable exchange rate for {context}")]
    DivisionByZero { context: String },

    /// Exchange rate is negative or not a finite number
    #[error("Invalid exchange rate {rate} for {context}")]
    InvalidExchangeRate { rate: f64, context: String },
}

impl AggregationError {
    pub fn division_by_zero(context: impl Into<String>) -> Self {
        AggregationError::DivisionByZero {
            context: context.into(),
        }
    }
}

/// Result type alias for aggregation operations
pub type Result<T> = std::result::Result<T, AggregationError>;

/// Check a rate and return it when it is usable as a divisor
pub(crate) fn checked_rate(rate: Option<f64>, context: &str) -> Result<f64> {
    match rate {
        None => Err(AggregationError::division_by_zero(context)),
        Some(r) if r == 0.0 => Err(AggregationError::division_by_zero(context)),
        Some(r) if !r.is_finite() || r < 0.0 => Err(AggregationError::InvalidExchangeRate {
            rate: r,
            context: context.to_string(),
        }),
        Some(r) => Ok(r),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checked_rate() {
        assert_eq!(checked_rate(Some(500.0), "budget"), Ok(500.0));
        assert!(matches!(
            checked_rate(None, "budget"),
            Err(AggregationError::DivisionByZero { .. })
        ));
        assert!(matches!(
            checked_rate(Some(0.0), "budget"),
            Err(AggregationError::DivisionByZero { .. })
        ));
        assert!(matches!(
            checked_rate(Some(-2.0), "budget"),
            Err(AggregationError::InvalidExchangeRate { .. })
        ));
        assert!(matches!(
            checked_rate(Some(f64::NAN), "budget"),
            Err(AggregationError::InvalidExchangeRate { .. })
        ));
    }

    #[test]
    fn test_error_display() {
        let err = AggregationError::division_by_zero("activity 'Foundations'");
        assert_eq!(
            err.to_string(),
            "Division by zero: no usable exchange rate for activity 'Foundations'"
        );
    }
}

use thiserror::Error;

use crate::models::FieldId;

/// Errors raised by the calculation core.
///
/// Numeric edge cases (empty fields, NaN, division by zero) are not errors;
/// they surface as absent values instead.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CalcError {
    #[error("Invalid field pairing: {0} and {1}")]
    InvalidFieldPair(FieldId, FieldId),
    #[error("Unknown direction: {0}")]
    UnknownDirection(String),
    #[error("Unknown field: {0}")]
    UnknownField(String),
}

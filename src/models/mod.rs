//! Data models for directions, fields, modes, and calculation output.

mod direction;
mod field;
mod output;

pub use direction::Direction;
pub use field::{parse_number, FieldId, FieldInputs, FieldValues};
pub use output::{CalculationMode, CalculationOutput, DerivedValue, ResultPair};

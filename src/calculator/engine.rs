//! Mode selection and the three derivation formulas.
//!
//! Everything here is a pure function of its arguments. Missing or
//! non-finite inputs, and results that come out non-finite (division by a
//! zero entry price, a -100% long), produce `None` rather than an error.

use crate::error::CalcError;
use crate::models::{CalculationMode, Direction, FieldId, FieldValues, ResultPair};

use super::format::round_to;

/// Map the two anchor fields to the mode deriving the third. Order does not matter.
pub fn select_mode(a: FieldId, b: FieldId) -> Result<CalculationMode, CalcError> {
    match (a.min(b), a.max(b)) {
        (FieldId::Entry, FieldId::Exit) => Ok(CalculationMode::DeriveChange),
        (FieldId::Entry, FieldId::Change) => Ok(CalculationMode::DeriveExit),
        (FieldId::Exit, FieldId::Change) => Ok(CalculationMode::DeriveEntry),
        _ => Err(CalcError::InvalidFieldPair(a, b)),
    }
}

fn finite(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite())
}

/// Percentage move from entry to exit, signed so that profit is positive.
pub fn derive_change_percent(
    entry: Option<f64>,
    exit: Option<f64>,
    direction: Direction,
) -> Option<f64> {
    let (entry, exit) = (finite(entry)?, finite(exit)?);
    let change = match direction {
        Direction::Long => (exit - entry) / entry * 100.0,
        Direction::Short => (entry - exit) / entry * 100.0,
    };
    finite(Some(change))
}

pub fn derive_exit_price(
    entry: Option<f64>,
    change_percent: Option<f64>,
    direction: Direction,
) -> Option<f64> {
    let (entry, change) = (finite(entry)?, finite(change_percent)?);
    let exit = match direction {
        Direction::Long => entry * (1.0 + change / 100.0),
        Direction::Short => entry * (1.0 - change / 100.0),
    };
    finite(Some(exit))
}

pub fn derive_entry_price(
    exit: Option<f64>,
    change_percent: Option<f64>,
    direction: Direction,
) -> Option<f64> {
    let (exit, change) = (finite(exit)?, finite(change_percent)?);
    let entry = match direction {
        Direction::Long => exit / (1.0 + change / 100.0),
        Direction::Short => exit / (1.0 - change / 100.0),
    };
    finite(Some(entry))
}

/// Apply the derivation selected by `mode`.
///
/// Only the derived field changes. Its value is rounded to the field's
/// display precision, since that rounded text is what later calculations
/// read back.
pub fn run_calculation(
    values: &FieldValues,
    mode: CalculationMode,
    direction: Direction,
) -> FieldValues {
    let derived = match mode {
        CalculationMode::DeriveChange => {
            derive_change_percent(values.entry, values.exit, direction)
        }
        CalculationMode::DeriveExit => derive_exit_price(values.entry, values.change, direction),
        CalculationMode::DeriveEntry => derive_entry_price(values.exit, values.change, direction),
    };

    let field = mode.derived_field();
    let mut updated = *values;
    updated.set(field, derived.and_then(|v| round_to(v, field.precision())));
    updated
}

/// Leverage used for the leveraged return. Only a missing or non-finite
/// value falls back to 1x; zero and negative leverage pass through.
pub fn effective_leverage(leverage: Option<f64>) -> f64 {
    finite(leverage).unwrap_or(1.0)
}

/// Base and leveraged percentage return for an entry/exit pair.
///
/// A zero price counts as unset. The leveraged figure is computed from the
/// already-rounded base figure.
pub fn compute_results(
    entry: Option<f64>,
    exit: Option<f64>,
    direction: Direction,
    leverage: Option<f64>,
) -> ResultPair {
    let usable = |v: Option<f64>| finite(v).filter(|v| *v != 0.0);
    let (Some(entry), Some(exit)) = (usable(entry), usable(exit)) else {
        return ResultPair::absent();
    };

    let Some(base) = derive_change_percent(Some(entry), Some(exit), direction)
        .and_then(|change| round_to(change, 2))
    else {
        return ResultPair::absent();
    };

    ResultPair {
        base_change_percent: Some(base),
        leveraged_change_percent: round_to(base * effective_leverage(leverage), 2),
    }
}

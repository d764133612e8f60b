//! Fixed-precision rounding and display rendering.
//!
//! Rounding goes through `rust_decimal` on the exact binary value of the
//! `f64`, half away from zero, so `1.005` (stored as 1.00499...) rounds
//! down the way a fixed-precision text conversion would.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;

use crate::models::{CalculationOutput, FieldId};

/// Shown in place of a result that cannot be computed.
pub const PLACEHOLDER: &str = "-";

/// Secondary hint shown next to a calculation failure.
pub const CHECK_INPUTS: &str = "check inputs";

fn rounded_decimal(value: f64, dp: u32) -> Option<Decimal> {
    let mut rounded = Decimal::from_f64_retain(value)?
        .round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero);
    if rounded.is_zero() {
        rounded.set_sign_positive(true);
    }
    Some(rounded)
}

/// Round to `dp` decimal places. Non-finite input yields `None`.
pub fn round_to(value: f64, dp: u32) -> Option<f64> {
    if !value.is_finite() {
        return None;
    }
    match rounded_decimal(value, dp) {
        Some(rounded) => rounded.to_f64(),
        // Beyond Decimal's range there is no fractional part left to round
        None => Some(value),
    }
}

/// Format with exactly `dp` decimal places. Non-finite input yields `None`.
pub fn to_fixed(value: f64, dp: u32) -> Option<String> {
    if !value.is_finite() {
        return None;
    }
    let precision = dp as usize;
    Some(match rounded_decimal(value, dp) {
        Some(rounded) => format!("{:.*}", precision, rounded),
        None => format!("{:.*}", precision, value),
    })
}

/// Text written back into a derived field; empty when the value is absent.
pub fn format_field_value(field: FieldId, value: Option<f64>) -> String {
    value
        .and_then(|v| to_fixed(v, field.precision()))
        .unwrap_or_default()
}

/// Signed percentage with 2 decimals, e.g. `+10.00` or `-3.25`.
pub fn format_percent(value: f64) -> String {
    match to_fixed(value, 2) {
        Some(text) if text.starts_with('-') => text,
        Some(text) => format!("+{}", text),
        None => PLACEHOLDER.to_string(),
    }
}

pub fn format_leverage(leverage: f64) -> String {
    format!("{}", leverage)
}

/// Colour hint for a rendered result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Tone {
    Profit,
    Loss,
    Neutral,
}

impl Tone {
    fn of(value: f64) -> Self {
        match round_to(value, 2) {
            Some(v) if v >= 0.0 => Tone::Profit,
            Some(_) => Tone::Loss,
            None => Tone::Neutral,
        }
    }
}

/// Display strings for one calculation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultView {
    pub base: String,
    pub leveraged: String,
    pub base_tone: Tone,
    pub leveraged_tone: Tone,
    pub mode: Option<String>,
}

impl ResultView {
    pub fn render(output: &CalculationOutput) -> Self {
        if let Some(message) = &output.error {
            return Self {
                base: message.clone(),
                leveraged: CHECK_INPUTS.to_string(),
                base_tone: Tone::Loss,
                leveraged_tone: Tone::Loss,
                mode: None,
            };
        }

        let mode = output
            .mode
            .map(|m| format!("Calculating {}", m.description()));

        match (
            output.results.base_change_percent,
            output.results.leveraged_change_percent,
        ) {
            (Some(base), Some(leveraged)) => Self {
                base: format!("{}%", format_percent(base)),
                leveraged: format!(
                    "{}% ({}x)",
                    format_percent(leveraged),
                    format_leverage(output.leverage)
                ),
                base_tone: Tone::of(base),
                leveraged_tone: Tone::of(leveraged),
                mode,
            },
            _ => Self {
                base: PLACEHOLDER.to_string(),
                leveraged: PLACEHOLDER.to_string(),
                base_tone: Tone::Neutral,
                leveraged_tone: Tone::Neutral,
                mode,
            },
        }
    }
}

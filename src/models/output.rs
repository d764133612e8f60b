//! Calculation modes and the values a calculation produces.

use serde::{Deserialize, Serialize};

use super::FieldId;

/// Which field a calculation derives from the other two.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CalculationMode {
    DeriveChange,
    DeriveExit,
    DeriveEntry,
}

impl CalculationMode {
    /// The field this mode overwrites.
    pub fn derived_field(&self) -> FieldId {
        match self {
            CalculationMode::DeriveChange => FieldId::Change,
            CalculationMode::DeriveExit => FieldId::Exit,
            CalculationMode::DeriveEntry => FieldId::Entry,
        }
    }

    /// Human-readable description for the mode line.
    pub fn description(&self) -> &'static str {
        match self {
            CalculationMode::DeriveChange => "change from entry and exit price",
            CalculationMode::DeriveExit => "exit price from entry price and change",
            CalculationMode::DeriveEntry => "entry price from exit price and change",
        }
    }
}

/// Base and leverage-adjusted percentage return, both rounded to 2 dp.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ResultPair {
    pub base_change_percent: Option<f64>,
    pub leveraged_change_percent: Option<f64>,
}

impl ResultPair {
    pub fn absent() -> Self {
        Self::default()
    }

    #[cfg_attr(not(test), allow(dead_code))]
    pub fn is_absent(&self) -> bool {
        self.base_change_percent.is_none() && self.leveraged_change_percent.is_none()
    }
}

/// The value a calculation wrote into its derived field.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DerivedValue {
    pub field: FieldId,
    pub value: Option<f64>,
}

/// Everything the display surface needs after a calculation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalculationOutput {
    /// None until two fields have been edited
    pub mode: Option<CalculationMode>,

    pub derived: Option<DerivedValue>,

    pub results: ResultPair,

    /// Effective leverage multiplier used for the leveraged result
    pub leverage: f64,

    /// Set when the calculation failed unexpectedly
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CalculationOutput {
    /// Output shown before any calculation and after a reset.
    pub fn placeholder(leverage: f64) -> Self {
        Self {
            mode: None,
            derived: None,
            results: ResultPair::absent(),
            leverage,
            error: None,
        }
    }

    pub fn failed(message: impl Into<String>, leverage: f64) -> Self {
        Self {
            error: Some(message.into()),
            ..Self::placeholder(leverage)
        }
    }

    #[cfg_attr(not(test), allow(dead_code))]
    pub fn is_failed(&self) -> bool {
        self.error.is_some()
    }
}

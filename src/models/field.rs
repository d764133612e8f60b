//! The three editable quantities and their values.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CalcError;

/// One of the three editable numeric fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldId {
    Entry,
    Exit,
    Change,
}

impl FieldId {
    pub const ALL: [FieldId; 3] = [FieldId::Entry, FieldId::Exit, FieldId::Change];

    /// Settings key and command name for this field.
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldId::Entry => "entry",
            FieldId::Exit => "exit",
            FieldId::Change => "change",
        }
    }

    /// Fixed decimal places used when this field holds a derived value.
    pub fn precision(&self) -> u32 {
        match self {
            FieldId::Change => 2,
            FieldId::Entry | FieldId::Exit => 4,
        }
    }

    pub(crate) fn index(&self) -> usize {
        match self {
            FieldId::Entry => 0,
            FieldId::Exit => 1,
            FieldId::Change => 2,
        }
    }
}

impl fmt::Display for FieldId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FieldId {
    type Err = CalcError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "entry" => Ok(FieldId::Entry),
            "exit" => Ok(FieldId::Exit),
            "change" => Ok(FieldId::Change),
            other => Err(CalcError::UnknownField(other.to_string())),
        }
    }
}

/// Parse user-entered text as a finite number.
///
/// Empty, malformed, and non-finite input all yield `None`.
pub fn parse_number(text: &str) -> Option<f64> {
    text.trim()
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
}

/// Numeric values of the three fields; `None` when empty or invalid.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldValues {
    pub entry: Option<f64>,
    pub exit: Option<f64>,
    pub change: Option<f64>,
}

impl FieldValues {
    #[cfg_attr(not(test), allow(dead_code))]
    pub fn new(entry: Option<f64>, exit: Option<f64>, change: Option<f64>) -> Self {
        Self {
            entry,
            exit,
            change,
        }
    }

    pub fn get(&self, field: FieldId) -> Option<f64> {
        match field {
            FieldId::Entry => self.entry,
            FieldId::Exit => self.exit,
            FieldId::Change => self.change,
        }
    }

    pub fn set(&mut self, field: FieldId, value: Option<f64>) {
        match field {
            FieldId::Entry => self.entry = value,
            FieldId::Exit => self.exit = value,
            FieldId::Change => self.change = value,
        }
    }
}

/// Raw text of the three fields, as typed or as written back by a derivation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldInputs {
    texts: [String; 3],
}

impl FieldInputs {
    pub fn get(&self, field: FieldId) -> &str {
        &self.texts[field.index()]
    }

    pub fn set(&mut self, field: FieldId, text: impl Into<String>) {
        self.texts[field.index()] = text.into();
    }

    pub fn clear(&mut self) {
        self.texts = Default::default();
    }

    /// Parse every field into its numeric value.
    pub fn values(&self) -> FieldValues {
        FieldValues {
            entry: parse_number(self.get(FieldId::Entry)),
            exit: parse_number(self.get(FieldId::Exit)),
            change: parse_number(self.get(FieldId::Change)),
        }
    }
}

//! Calculator session: field state, recalculation, and settings persistence.
//!
//! Handles:
//! - Recording edits and tracking which two fields anchor the calculation
//! - Writing the derived value back into its field
//! - Persisting the last-used inputs after each successful calculation
//! - Restoring them on startup and wiping them on reset

use std::sync::Arc;

use anyhow::Result;
use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::db::{keys, SettingsStore};
use crate::error::CalcError;
use crate::models::{
    parse_number, CalculationOutput, DerivedValue, Direction, FieldId, FieldInputs,
};

use super::engine::{compute_results, effective_leverage, run_calculation, select_mode};
use super::format::format_field_value;
use super::recency::RecencyTracker;
use super::CalculatorConfig;

/// Explicitly constructed calculator bound to a settings store.
///
/// Edits and leverage changes only update state; the owner of the debounce
/// timer calls [`Calculator::on_edit_burst_settled`] once the user pauses.
/// Direction changes recalculate immediately.
pub struct Calculator {
    config: CalculatorConfig,
    store: Arc<dyn SettingsStore>,
    tracker: RecencyTracker,
    inputs: FieldInputs,
    leverage: String,
    direction: Direction,
    output: CalculationOutput,
}

impl Calculator {
    pub fn new(config: CalculatorConfig, store: Arc<dyn SettingsStore>) -> Self {
        let leverage = config.default_leverage.clone();
        let direction = config.default_direction;
        let output = CalculationOutput::placeholder(effective_leverage(parse_number(&leverage)));

        Self {
            config,
            store,
            tracker: RecencyTracker::new(),
            inputs: FieldInputs::default(),
            leverage,
            direction,
            output,
        }
    }

    pub fn config(&self) -> &CalculatorConfig {
        &self.config
    }

    pub fn output(&self) -> &CalculationOutput {
        &self.output
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn leverage_text(&self) -> &str {
        &self.leverage
    }

    pub fn input(&self, field: FieldId) -> &str {
        self.inputs.get(field)
    }

    /// Seed state from the settings store.
    ///
    /// Missing or empty values leave the defaults alone. Returns whether any
    /// value was restored; the caller should then schedule a recalculation.
    pub async fn load_settings(&mut self) -> Result<bool> {
        let mut restored = false;

        if let Some(text) = self.stored(keys::DIRECTION).await? {
            match text.parse::<Direction>() {
                Ok(direction) => {
                    self.direction = direction;
                    restored = true;
                }
                Err(e) => warn!(error = %e, "Ignoring stored direction"),
            }
        }

        if let Some(text) = self.stored(keys::LEVERAGE).await? {
            self.leverage = text;
            restored = true;
        }

        for (key, field) in [
            (keys::CHANGE, FieldId::Change),
            (keys::ENTRY, FieldId::Entry),
            (keys::EXIT, FieldId::Exit),
        ] {
            if let Some(text) = self.stored(key).await? {
                self.inputs.set(field, text);
                restored = true;
            }
        }

        if restored {
            info!(
                direction = %self.direction,
                leverage = %self.leverage,
                "Restored previous settings"
            );
        }

        Ok(restored)
    }

    async fn stored(&self, key: &str) -> Result<Option<String>> {
        Ok(self.store.get(key).await?.filter(|v| !v.is_empty()))
    }

    /// Replace a field's text and mark it as the most recent edit.
    pub fn record_edit(&mut self, field: FieldId, text: &str) {
        self.record_edit_at(field, text, Utc::now());
    }

    pub fn record_edit_at(&mut self, field: FieldId, text: &str, at: DateTime<Utc>) {
        debug!(field = %field, text = text, "Field edited");
        self.inputs.set(field, text);
        self.tracker.record_edit(field, at);
    }

    pub fn set_leverage(&mut self, text: &str) {
        debug!(leverage = text, "Leverage edited");
        self.leverage = text.to_string();
    }

    /// Switch direction, recalculate right away, and persist.
    pub async fn set_direction(&mut self, direction: Direction) -> Result<&CalculationOutput> {
        self.direction = direction;
        self.calculate();
        self.save_settings().await?;
        Ok(&self.output)
    }

    /// Recalculate after a burst of edits; persists on success.
    pub async fn on_edit_burst_settled(&mut self) -> Result<&CalculationOutput> {
        if self.calculate() {
            self.save_settings().await?;
        }
        Ok(&self.output)
    }

    /// Restore defaults and erase the whole settings namespace.
    pub async fn reset(&mut self) -> Result<()> {
        self.inputs.clear();
        self.leverage = self.config.default_leverage.clone();
        self.direction = self.config.default_direction;
        self.output = CalculationOutput::placeholder(self.leverage_value());
        self.store.clear().await?;

        info!("Calculator reset");
        Ok(())
    }

    fn leverage_value(&self) -> f64 {
        effective_leverage(parse_number(&self.leverage))
    }

    /// Run one calculation, replacing the output. Failures become an error
    /// output instead of propagating.
    fn calculate(&mut self) -> bool {
        match self.try_calculate() {
            Ok(output) => {
                self.output = output;
                true
            }
            Err(e) => {
                warn!(error = %e, "Calculation failed");
                self.output = CalculationOutput::failed(e.to_string(), self.leverage_value());
                false
            }
        }
    }

    fn try_calculate(&mut self) -> Result<CalculationOutput, CalcError> {
        let mode = self
            .tracker
            .two_most_recent()
            .map(|(a, b)| select_mode(a, b))
            .transpose()?;

        let mut derived = None;
        if let Some(mode) = mode {
            let updated = run_calculation(&self.inputs.values(), mode, self.direction);
            let field = mode.derived_field();
            let value = updated.get(field);
            self.inputs.set(field, format_field_value(field, value));
            derived = Some(DerivedValue { field, value });
        }

        let values = self.inputs.values();
        let leverage = self.leverage_value();
        let results = compute_results(values.entry, values.exit, self.direction, Some(leverage));

        debug!(
            mode = ?mode,
            direction = %self.direction,
            base = ?results.base_change_percent,
            leveraged = ?results.leveraged_change_percent,
            "Calculated"
        );

        Ok(CalculationOutput {
            mode,
            derived,
            results,
            leverage,
            error: None,
        })
    }

    async fn save_settings(&self) -> Result<()> {
        self.store
            .set(keys::DIRECTION, self.direction.as_str())
            .await?;
        self.store.set(keys::LEVERAGE, &self.leverage).await?;
        self.store
            .set(keys::CHANGE, self.inputs.get(FieldId::Change))
            .await?;
        self.store
            .set(keys::ENTRY, self.inputs.get(FieldId::Entry))
            .await?;
        self.store
            .set(keys::EXIT, self.inputs.get(FieldId::Exit))
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calculator::format::{ResultView, PLACEHOLDER};
    use crate::db::MemorySettingsStore;
    use crate::models::CalculationMode;

    fn calculator_with(store: Arc<MemorySettingsStore>) -> Calculator {
        Calculator::new(CalculatorConfig::default(), store)
    }

    fn fresh() -> (Calculator, Arc<MemorySettingsStore>) {
        let store = Arc::new(MemorySettingsStore::new());
        (calculator_with(store.clone()), store)
    }

    #[tokio::test]
    async fn test_entry_and_exit_derive_change() {
        let (mut calc, store) = fresh();

        calc.record_edit(FieldId::Entry, "100");
        calc.record_edit(FieldId::Exit, "110");
        let output = calc.on_edit_burst_settled().await.unwrap().clone();

        assert_eq!(output.mode, Some(CalculationMode::DeriveChange));
        assert_eq!(calc.input(FieldId::Change), "10.00");

        let view = ResultView::render(&output);
        assert_eq!(view.base, "+10.00%");
        assert_eq!(view.leveraged, "+200.00% (20x)");

        assert_eq!(store.get(keys::CHANGE).await.unwrap().as_deref(), Some("10.00"));
        assert_eq!(store.get(keys::DIRECTION).await.unwrap().as_deref(), Some("long"));
        assert_eq!(store.get(keys::LEVERAGE).await.unwrap().as_deref(), Some("20"));
    }

    #[tokio::test]
    async fn test_entry_and_change_derive_exit() {
        let (mut calc, _store) = fresh();

        calc.record_edit(FieldId::Entry, "100");
        calc.record_edit(FieldId::Change, "5");
        let output = calc.on_edit_burst_settled().await.unwrap().clone();

        assert_eq!(output.mode, Some(CalculationMode::DeriveExit));
        assert_eq!(calc.input(FieldId::Exit), "105.0000");
        assert_eq!(output.derived.map(|d| d.field), Some(FieldId::Exit));
        assert_eq!(ResultView::render(&output).base, "+5.00%");
    }

    #[tokio::test]
    async fn test_exit_and_change_derive_entry() {
        let (mut calc, _store) = fresh();

        calc.record_edit(FieldId::Exit, "105");
        calc.record_edit(FieldId::Change, "5");
        let output = calc.on_edit_burst_settled().await.unwrap().clone();

        assert_eq!(output.mode, Some(CalculationMode::DeriveEntry));
        assert_eq!(calc.input(FieldId::Entry), "100.0000");
    }

    #[tokio::test]
    async fn test_third_edit_switches_mode() {
        let (mut calc, _store) = fresh();

        calc.record_edit(FieldId::Entry, "100");
        calc.record_edit(FieldId::Exit, "110");
        calc.on_edit_burst_settled().await.unwrap();

        // Editing change leaves entry as the oldest field
        calc.record_edit(FieldId::Change, "20");
        let output = calc.on_edit_burst_settled().await.unwrap().clone();

        assert_eq!(output.mode, Some(CalculationMode::DeriveEntry));
        assert_eq!(calc.input(FieldId::Entry), "91.6667");

        // Then editing entry leaves exit as the oldest
        calc.record_edit(FieldId::Entry, "100");
        let output = calc.on_edit_burst_settled().await.unwrap().clone();

        assert_eq!(output.mode, Some(CalculationMode::DeriveExit));
        assert_eq!(calc.input(FieldId::Exit), "120.0000");
    }

    #[tokio::test]
    async fn test_missing_source_clears_derived_field() {
        let (mut calc, _store) = fresh();

        calc.record_edit(FieldId::Entry, "100");
        calc.record_edit(FieldId::Change, "5");
        calc.on_edit_burst_settled().await.unwrap();
        assert_eq!(calc.input(FieldId::Exit), "105.0000");

        calc.record_edit(FieldId::Entry, "");
        let output = calc.on_edit_burst_settled().await.unwrap().clone();

        assert_eq!(calc.input(FieldId::Exit), "");
        assert!(output.results.is_absent());
        assert_eq!(ResultView::render(&output).base, PLACEHOLDER);
    }

    #[tokio::test]
    async fn test_direction_change_recalculates_and_persists() {
        let (mut calc, store) = fresh();

        calc.record_edit(FieldId::Entry, "100");
        calc.record_edit(FieldId::Exit, "90");
        calc.on_edit_burst_settled().await.unwrap();
        assert_eq!(calc.input(FieldId::Change), "-10.00");

        let output = calc.set_direction(Direction::Short).await.unwrap().clone();
        assert_eq!(calc.input(FieldId::Change), "10.00");
        assert_eq!(ResultView::render(&output).base, "+10.00%");
        assert_eq!(store.get(keys::DIRECTION).await.unwrap().as_deref(), Some("short"));
    }

    #[tokio::test]
    async fn test_leverage_only_applies_on_settle() {
        let (mut calc, _store) = fresh();

        calc.record_edit(FieldId::Entry, "100");
        calc.record_edit(FieldId::Exit, "110");
        calc.on_edit_burst_settled().await.unwrap();

        calc.set_leverage("5");
        assert_eq!(calc.output().leverage, 20.0);

        let output = calc.on_edit_burst_settled().await.unwrap().clone();
        assert_eq!(ResultView::render(&output).leveraged, "+50.00% (5x)");

        calc.set_leverage("lots");
        let output = calc.on_edit_burst_settled().await.unwrap().clone();
        assert_eq!(ResultView::render(&output).leveraged, "+10.00% (1x)");
    }

    #[tokio::test]
    async fn test_single_edit_has_no_mode() {
        let (mut calc, _store) = fresh();

        calc.record_edit(FieldId::Entry, "100");
        let output = calc.on_edit_burst_settled().await.unwrap().clone();

        assert_eq!(output.mode, None);
        assert_eq!(output.derived, None);
        assert!(output.results.is_absent());
    }

    #[tokio::test]
    async fn test_load_settings_seeds_state() {
        let store = Arc::new(
            MemorySettingsStore::new()
                .with_entry(keys::DIRECTION, "short")
                .with_entry(keys::LEVERAGE, "10")
                .with_entry(keys::ENTRY, "100")
                .with_entry(keys::EXIT, "90")
                .with_entry(keys::CHANGE, ""),
        );
        let mut calc = calculator_with(store);

        assert!(calc.load_settings().await.unwrap());
        assert_eq!(calc.direction(), Direction::Short);
        assert_eq!(calc.leverage_text(), "10");
        assert_eq!(calc.input(FieldId::Entry), "100");
        assert_eq!(calc.input(FieldId::Change), "");

        // No edits yet, so nothing is derived but results still show
        let output = calc.on_edit_burst_settled().await.unwrap().clone();
        assert_eq!(output.mode, None);
        let view = ResultView::render(&output);
        assert_eq!(view.base, "+10.00%");
        assert_eq!(view.leveraged, "+100.00% (10x)");
    }

    #[tokio::test]
    async fn test_load_settings_ignores_bad_direction() {
        let store = Arc::new(MemorySettingsStore::new().with_entry(keys::DIRECTION, "up"));
        let mut calc = calculator_with(store);

        assert!(!calc.load_settings().await.unwrap());
        assert_eq!(calc.direction(), Direction::Long);
    }

    #[tokio::test]
    async fn test_reset_restores_defaults_and_wipes_store() {
        let store = Arc::new(MemorySettingsStore::new().with_entry("other-tool", "keep me?"));
        let mut calc = calculator_with(store.clone());

        calc.record_edit(FieldId::Entry, "100");
        calc.record_edit(FieldId::Exit, "110");
        calc.set_leverage("50");
        calc.set_direction(Direction::Short).await.unwrap();

        calc.reset().await.unwrap();

        for field in FieldId::ALL {
            assert_eq!(calc.input(field), "");
        }
        assert_eq!(calc.leverage_text(), "20");
        assert_eq!(calc.direction(), Direction::Long);

        let view = ResultView::render(calc.output());
        assert_eq!(view.base, PLACEHOLDER);
        assert_eq!(view.leveraged, PLACEHOLDER);

        assert!(store.entries().await.unwrap().is_empty());
    }
}

//! Interactive terminal frontend.
//!
//! Reads one command per line, debounces field and leverage edits, and
//! prints the result after every recalculation. Direction changes apply
//! immediately.

use std::fmt::Write as _;
use std::str::FromStr;

use anyhow::{Context, Result};
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::debug;

use crate::calculator::{Calculator, ResultView};
use crate::debounce::Debouncer;
use crate::error::CalcError;
use crate::models::{Direction, FieldId};

pub const HELP: &str = "\
Commands:
  entry <price>        set the entry price
  exit <price>         set the exit price
  change <percent>     set the percentage change
  leverage <x>         set the leverage multiplier
  long | short         switch direction
  direction <long|short>
  reset                clear everything, including saved settings
  show                 print the current state
  help                 print this help
  quit                 leave
Edit any two of entry, exit and change; the third is derived.
Leave the value off to clear a field.";

/// A parsed input line.
#[derive(Debug, Clone, PartialEq)]
pub enum ReplCommand {
    Edit(FieldId, String),
    Leverage(String),
    Direction(Direction),
    Reset,
    Show,
    Help,
    Quit,
}

#[derive(Debug, Error, PartialEq)]
pub enum CommandError {
    #[error("empty command")]
    Empty,
    #[error("unknown command '{0}', type 'help' for a list")]
    Unknown(String),
    #[error("'{0}' needs an argument")]
    MissingArgument(&'static str),
    #[error(transparent)]
    Calc(#[from] CalcError),
}

impl FromStr for ReplCommand {
    type Err = CommandError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        if line.is_empty() {
            return Err(CommandError::Empty);
        }

        let (head, rest) = match line.split_once(char::is_whitespace) {
            Some((head, rest)) => (head, rest.trim()),
            None => (line, ""),
        };

        match head.to_lowercase().as_str() {
            "entry" | "exit" | "change" => {
                Ok(ReplCommand::Edit(head.parse()?, rest.to_string()))
            }
            "leverage" | "lev" => Ok(ReplCommand::Leverage(rest.to_string())),
            "long" => Ok(ReplCommand::Direction(Direction::Long)),
            "short" => Ok(ReplCommand::Direction(Direction::Short)),
            "direction" | "dir" => {
                if rest.is_empty() {
                    return Err(CommandError::MissingArgument("direction"));
                }
                Ok(ReplCommand::Direction(rest.parse()?))
            }
            "reset" => Ok(ReplCommand::Reset),
            "show" => Ok(ReplCommand::Show),
            "help" | "?" => Ok(ReplCommand::Help),
            "quit" | "q" => Ok(ReplCommand::Quit),
            other => Err(CommandError::Unknown(other.to_string())),
        }
    }
}

/// Current inputs and results as printable text.
pub fn render(calc: &Calculator) -> String {
    let output = calc.output();
    let view = ResultView::render(output);
    let derived = output.derived.map(|d| d.field);

    let mut out = String::new();
    let _ = writeln!(
        out,
        "  {:<10} {:<12} {:<10} {}",
        "Direction",
        calc.direction(),
        "Leverage",
        calc.leverage_text()
    );
    for field in FieldId::ALL {
        let marker = if derived == Some(field) { "  (derived)" } else { "" };
        let _ = writeln!(
            out,
            "  {:<10} {}{}",
            capitalize(field.as_str()),
            display_or_dash(calc.input(field)),
            marker
        );
    }
    if let Some(mode) = &view.mode {
        let _ = writeln!(out, "  {:<10} {}", "Mode", mode);
    }
    let _ = writeln!(out, "  {:<10} {}", "Return", view.base);
    let _ = write!(out, "  {:<10} {}", "Leveraged", view.leveraged);
    out
}

fn display_or_dash(text: &str) -> &str {
    if text.is_empty() {
        "-"
    } else {
        text
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Apply one command. Returns whether the display should be refreshed now.
async fn apply(
    calc: &mut Calculator,
    debouncer: &mut Debouncer,
    command: ReplCommand,
) -> Result<bool> {
    match command {
        ReplCommand::Edit(field, text) => {
            calc.record_edit(field, &text);
            debouncer.poke();
            Ok(false)
        }
        ReplCommand::Leverage(text) => {
            calc.set_leverage(&text);
            debouncer.poke();
            Ok(false)
        }
        ReplCommand::Direction(direction) => {
            // The immediate recalculation covers any pending edits
            debouncer.cancel();
            calc.set_direction(direction).await?;
            Ok(true)
        }
        ReplCommand::Reset => {
            debouncer.cancel();
            calc.reset().await?;
            Ok(true)
        }
        ReplCommand::Show => Ok(true),
        ReplCommand::Help => {
            println!("{}", HELP);
            Ok(false)
        }
        ReplCommand::Quit => Ok(false),
    }
}

/// Run the interactive loop until `quit`, end of input, or Ctrl+C.
pub async fn run(calc: &mut Calculator) -> Result<()> {
    let mut debouncer = Debouncer::new(calc.config().debounce_delay());
    if calc.load_settings().await? {
        debouncer.poke();
    }

    println!("{}\n", HELP);
    println!("{}", render(calc));

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.context("Failed to read input")? else {
                    break;
                };
                match line.parse::<ReplCommand>() {
                    Ok(ReplCommand::Quit) => break,
                    Ok(command) => {
                        debug!(command = ?command, "Command");
                        if apply(calc, &mut debouncer, command).await? {
                            println!("{}", render(calc));
                        }
                    }
                    Err(CommandError::Empty) => {}
                    Err(e) => println!("{}", e),
                }
            }
            _ = debouncer.settled() => {
                calc.on_edit_burst_settled().await?;
                println!("{}", render(calc));
            }
            _ = tokio::signal::ctrl_c() => {
                println!();
                break;
            }
        }
    }

    // Flush a burst that was still waiting on the timer
    if debouncer.is_pending() {
        debouncer.cancel();
        calc.on_edit_burst_settled().await?;
        println!("{}", render(calc));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::calculator::CalculatorConfig;
    use crate::db::MemorySettingsStore;

    #[test]
    fn test_parse_edits() {
        assert_eq!(
            "entry 100".parse::<ReplCommand>().unwrap(),
            ReplCommand::Edit(FieldId::Entry, "100".to_string())
        );
        assert_eq!(
            "  Change   -2.5 ".parse::<ReplCommand>().unwrap(),
            ReplCommand::Edit(FieldId::Change, "-2.5".to_string())
        );
        assert_eq!(
            "exit".parse::<ReplCommand>().unwrap(),
            ReplCommand::Edit(FieldId::Exit, String::new())
        );
        assert_eq!(
            "lev 25".parse::<ReplCommand>().unwrap(),
            ReplCommand::Leverage("25".to_string())
        );
    }

    #[test]
    fn test_parse_direction() {
        assert_eq!(
            "short".parse::<ReplCommand>().unwrap(),
            ReplCommand::Direction(Direction::Short)
        );
        assert_eq!(
            "direction long".parse::<ReplCommand>().unwrap(),
            ReplCommand::Direction(Direction::Long)
        );
        assert_eq!(
            "dir".parse::<ReplCommand>(),
            Err(CommandError::MissingArgument("direction"))
        );
        assert_eq!(
            "dir flat".parse::<ReplCommand>(),
            Err(CommandError::Calc(CalcError::UnknownDirection("flat".to_string())))
        );
    }

    #[test]
    fn test_parse_misc() {
        assert_eq!("".parse::<ReplCommand>(), Err(CommandError::Empty));
        assert_eq!("RESET".parse::<ReplCommand>().unwrap(), ReplCommand::Reset);
        assert_eq!("q".parse::<ReplCommand>().unwrap(), ReplCommand::Quit);
        assert_eq!(
            "buy 3".parse::<ReplCommand>(),
            Err(CommandError::Unknown("buy".to_string()))
        );
    }

    #[tokio::test]
    async fn test_render_marks_derived_field() {
        let store = Arc::new(MemorySettingsStore::new());
        let mut calc = Calculator::new(CalculatorConfig::default(), store);

        calc.record_edit(FieldId::Entry, "100");
        calc.record_edit(FieldId::Change, "5");
        calc.on_edit_burst_settled().await.unwrap();

        let text = render(&calc);
        assert!(text.contains("105.0000  (derived)"));
        assert!(text.contains("Calculating exit price from entry price and change"));
        assert!(text.contains("+100.00% (20x)"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_edits_wait_for_debounce() {
        let store = Arc::new(MemorySettingsStore::new());
        let mut calc = Calculator::new(CalculatorConfig::default(), store);
        let mut debouncer = Debouncer::new(calc.config().debounce_delay());

        for line in ["entry 100", "exit 110"] {
            let command = line.parse::<ReplCommand>().unwrap();
            assert!(!apply(&mut calc, &mut debouncer, command).await.unwrap());
        }
        assert_eq!(calc.input(FieldId::Change), "");
        assert!(debouncer.is_pending());

        debouncer.settled().await;
        calc.on_edit_burst_settled().await.unwrap();
        assert_eq!(calc.input(FieldId::Change), "10.00");

        // Direction applies at once and cancels the timer
        calc.record_edit(FieldId::Exit, "90");
        debouncer.poke();
        let refresh = apply(&mut calc, &mut debouncer, ReplCommand::Direction(Direction::Short))
            .await
            .unwrap();
        assert!(refresh);
        assert!(!debouncer.is_pending());
        assert_eq!(calc.input(FieldId::Change), "10.00");
    }
}

//! Operator interaction: menu, PIN, and file path prompts.
use crate::pipeline::EntryPoint;
use crate::secret::Pin;
use anyhow::{Context, Result};
use dialoguer::{Input, Password};
use std::path::PathBuf;

/// Source of the answers a run needs from a human.
pub trait Operator {
    /// Ask which entry point to run; `None` means exit without action.
    fn choose_entry(&mut self) -> Result<Option<EntryPoint>>;

    /// Read the signing PIN without echoing it.
    fn read_pin(&mut self) -> Result<Pin>;

    /// Read a file path as typed.
    fn read_path(&mut self, prompt: &str) -> Result<PathBuf>;
}

/// Parse a menu answer. Anything other than a listed number is `None`.
pub fn parse_menu_choice(line: &str) -> Option<EntryPoint> {
    line.trim()
        .parse::<u32>()
        .ok()
        .and_then(EntryPoint::from_menu)
}

pub fn menu_text() -> String {
    let mut out = String::new();
    out.push_str("EFI Command Line Interface\n");
    out.push_str("--------------------------\n");
    out.push_str("Available actions:\n");
    out.push_str("[1] Register invoice\n");
    out.push_str("[2] Register invoice manually\n");
    out.push_str("Press any other key to exit\n");
    out
}

/// Interactive terminal operator.
#[derive(Debug, Default)]
pub struct ConsoleOperator;

impl ConsoleOperator {
    pub fn new() -> Self {
        Self
    }
}

impl Operator for ConsoleOperator {
    fn choose_entry(&mut self) -> Result<Option<EntryPoint>> {
        print!("{}", menu_text());
        let line: String = Input::new()
            .with_prompt("Choose an action")
            .allow_empty(true)
            .interact_text()
            .context("read menu choice")?;
        let choice = parse_menu_choice(&line);
        tracing::debug!(?choice, "menu choice");
        Ok(choice)
    }

    fn read_pin(&mut self) -> Result<Pin> {
        let pin = Password::new()
            .with_prompt("Please provide digital signature PIN")
            .interact()
            .context("read signature PIN")?;
        Ok(Pin::new(pin))
    }

    fn read_path(&mut self, prompt: &str) -> Result<PathBuf> {
        let line: String = Input::new()
            .with_prompt(prompt)
            .interact_text()
            .with_context(|| format!("read input for {prompt:?}"))?;
        Ok(PathBuf::from(line.trim()))
    }
}

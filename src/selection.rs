use anyhow::{Context, Result};
use inquire::{InquireError, Text};
use std::cell::RefCell;
use std::collections::VecDeque;
use std::io::{self, BufRead, IsTerminal, Write};

use crate::error::WorktreeError;

/// Trait for reading operator input one line at a time.
/// This allows us to abstract away the interactive prompts for testing
pub trait SelectionProvider {
    /// Shows `prompt` and reads one line.
    ///
    /// Returns `None` when input ends or the operator cancels the prompt.
    ///
    /// # Errors
    /// Returns an error if reading from the terminal fails
    fn read_line(&self, prompt: &str) -> Result<Option<String>>;
}

/// Real implementation: `inquire` on a terminal, plain line reads otherwise
pub struct RealSelectionProvider;

impl SelectionProvider for RealSelectionProvider {
    fn read_line(&self, prompt: &str) -> Result<Option<String>> {
        if io::stdin().is_terminal() {
            return match Text::new(prompt).prompt() {
                Ok(answer) => Ok(Some(answer)),
                Err(InquireError::OperationCanceled | InquireError::OperationInterrupted) => {
                    Ok(None)
                }
                Err(e) => Err(e).context("Failed to read input"),
            };
        }

        print!("{} ", prompt);
        io::stdout().flush()?;

        let mut line = String::new();
        let read = io::stdin()
            .lock()
            .read_line(&mut line)
            .context("Failed to read input")?;
        if read == 0 {
            return Ok(None);
        }
        println!();
        Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
    }
}

/// Mock implementation for testing that replays predetermined lines
pub struct MockSelectionProvider {
    responses: RefCell<VecDeque<String>>,
}

impl MockSelectionProvider {
    pub fn new<I, S>(responses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            responses: RefCell::new(responses.into_iter().map(Into::into).collect()),
        }
    }

    #[must_use]
    pub fn remaining(&self) -> usize {
        self.responses.borrow().len()
    }
}

impl SelectionProvider for MockSelectionProvider {
    fn read_line(&self, _prompt: &str) -> Result<Option<String>> {
        Ok(self.responses.borrow_mut().pop_front())
    }
}

/// Prints `labels` as a numbered menu and reads a 1-based choice.
///
/// Blank input or end of input cancels and yields `None`.
///
/// # Errors
/// Returns [`WorktreeError::InvalidSelection`] for non-numeric or
/// out-of-range input
pub fn select_index(
    provider: &dyn SelectionProvider,
    prompt: &str,
    labels: &[String],
) -> Result<Option<usize>> {
    for (index, label) in labels.iter().enumerate() {
        println!("  {:>2}) {}", index + 1, label);
    }
    println!();

    let Some(input) = provider.read_line(prompt)? else {
        return Ok(None);
    };
    let input = input.trim();
    if input.is_empty() {
        return Ok(None);
    }

    match input.parse::<usize>() {
        Ok(choice) if (1..=labels.len()).contains(&choice) => Ok(Some(choice - 1)),
        _ => Err(WorktreeError::InvalidSelection {
            input: input.to_string(),
            max: labels.len(),
        }
        .into()),
    }
}

/// Asks a yes/no question; `s`, `si`, `y` and `yes` in any case mean yes
///
/// # Errors
/// Returns an error if reading input fails
pub fn confirm(provider: &dyn SelectionProvider, question: &str) -> Result<bool> {
    let answer = provider.read_line(&format!("{} [s/N]:", question))?;
    Ok(answer.is_some_and(|answer| {
        matches!(
            answer.trim().to_lowercase().as_str(),
            "s" | "si" | "sí" | "y" | "yes"
        )
    }))
}

/// Requires the operator to type `word` exactly (case-sensitive)
///
/// # Errors
/// Returns an error if reading input fails
pub fn confirm_word(provider: &dyn SelectionProvider, prompt: &str, word: &str) -> Result<bool> {
    let answer = provider.read_line(&format!("{} Type '{}' to confirm:", prompt, word))?;
    Ok(answer.is_some_and(|answer| answer.trim() == word))
}

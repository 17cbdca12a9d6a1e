// src/prompt/mod.rs

//! Decisions delegated to the user
//!
//! Every question the resolver asks carries a default. A [`Prompter`] that is
//! not interactive is never asked: the helpers [`confirm`], [`choose`] and
//! [`read_text`] return the default straight away, so a non-interactive run
//! never blocks on input.

use crate::error::Result;
use std::collections::VecDeque;
use std::io::{self, BufRead, Write};

/// Source of answers for the resolver's questions
pub trait Prompter {
    fn is_interactive(&self) -> bool;

    /// Yes/no question
    fn confirm(&mut self, question: &str, default: bool) -> Result<bool>;

    /// Pick one of `choices`, answering with its index
    fn choose(&mut self, question: &str, choices: &[String], default: usize) -> Result<usize>;

    /// Free-form answer
    fn read_text(&mut self, question: &str, default: &str) -> Result<String>;
}

/// Ask a yes/no question, or take the default when not interactive
pub fn confirm(prompter: &mut dyn Prompter, question: &str, default: bool) -> Result<bool> {
    if !prompter.is_interactive() {
        return Ok(default);
    }
    prompter.confirm(question, default)
}

/// Ask for a choice, or take the default when not interactive
pub fn choose(
    prompter: &mut dyn Prompter,
    question: &str,
    choices: &[String],
    default: usize,
) -> Result<usize> {
    if !prompter.is_interactive() || choices.len() < 2 {
        return Ok(default);
    }
    let choice = prompter.choose(question, choices, default)?;
    Ok(if choice < choices.len() { choice } else { default })
}

/// Ask for text, or take the default when not interactive
pub fn read_text(prompter: &mut dyn Prompter, question: &str, default: &str) -> Result<String> {
    if !prompter.is_interactive() {
        return Ok(default.to_string());
    }
    prompter.read_text(question, default)
}

/// Prompter reading answers from the terminal
#[derive(Debug, Default)]
pub struct ConsolePrompter;

impl ConsolePrompter {
    pub fn new() -> Self {
        Self
    }

    /// Read one trimmed line, `None` at end of input
    fn read_line(&self) -> Result<Option<String>> {
        let mut input = String::new();
        if io::stdin().lock().read_line(&mut input)? == 0 {
            return Ok(None);
        }
        Ok(Some(input.trim().to_string()))
    }
}

impl Prompter for ConsolePrompter {
    fn is_interactive(&self) -> bool {
        true
    }

    fn confirm(&mut self, question: &str, default: bool) -> Result<bool> {
        let mut stdout = io::stdout();
        loop {
            write!(stdout, "{} [{}] ", question, if default { "Y/n" } else { "y/N" })?;
            stdout.flush()?;

            let Some(input) = self.read_line()? else {
                return Ok(default);
            };
            match input.to_lowercase().as_str() {
                "" => return Ok(default),
                "y" | "yes" => return Ok(true),
                "n" | "no" => return Ok(false),
                _ => writeln!(stdout, "Please answer y or n.")?,
            }
        }
    }

    fn choose(&mut self, question: &str, choices: &[String], default: usize) -> Result<usize> {
        let mut stdout = io::stdout();
        loop {
            writeln!(stdout, "{}", question)?;
            for (i, choice) in choices.iter().enumerate() {
                writeln!(stdout, "  {} - {}", i + 1, choice)?;
            }
            write!(stdout, "> [{}] ", default + 1)?;
            stdout.flush()?;

            let Some(input) = self.read_line()? else {
                return Ok(default);
            };
            if input.is_empty() {
                return Ok(default);
            }
            match input.parse::<usize>() {
                Ok(n) if (1..=choices.len()).contains(&n) => return Ok(n - 1),
                _ => writeln!(stdout, "Please enter a number between 1 and {}.", choices.len())?,
            }
        }
    }

    fn read_text(&mut self, question: &str, default: &str) -> Result<String> {
        let mut stdout = io::stdout();
        if default.is_empty() {
            write!(stdout, "{} ", question)?;
        } else {
            write!(stdout, "{} [{}] ", question, default)?;
        }
        stdout.flush()?;

        Ok(match self.read_line()? {
            Some(input) if !input.is_empty() => input,
            _ => default.to_string(),
        })
    }
}

/// Prompter that always answers with the default
#[derive(Debug, Default)]
pub struct NonInteractive;

impl Prompter for NonInteractive {
    fn is_interactive(&self) -> bool {
        false
    }

    fn confirm(&mut self, _question: &str, default: bool) -> Result<bool> {
        Ok(default)
    }

    fn choose(&mut self, _question: &str, _choices: &[String], default: usize) -> Result<usize> {
        Ok(default)
    }

    fn read_text(&mut self, _question: &str, default: &str) -> Result<String> {
        Ok(default.to_string())
    }
}

/// Canned answer for a [`ScriptedPrompter`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Answer {
    Yes,
    No,
    Choice(usize),
    Text(String),
    /// Take whatever default is offered
    Default,
}

/// Prompter replaying queued answers and recording the questions asked
///
/// Once the queue is empty every question gets its default.
#[derive(Debug, Default)]
pub struct ScriptedPrompter {
    interactive: bool,
    answers: VecDeque<Answer>,
    asked: Vec<String>,
}

impl ScriptedPrompter {
    pub fn new(answers: impl IntoIterator<Item = Answer>) -> Self {
        Self {
            interactive: true,
            answers: answers.into_iter().collect(),
            asked: Vec::new(),
        }
    }

    /// Scripted prompter reporting itself as non-interactive
    pub fn non_interactive() -> Self {
        Self::default()
    }

    /// Questions asked so far, in order
    pub fn asked(&self) -> &[String] {
        &self.asked
    }

    fn next(&mut self, question: &str) -> Answer {
        self.asked.push(question.to_string());
        self.answers.pop_front().unwrap_or(Answer::Default)
    }
}

impl Prompter for ScriptedPrompter {
    fn is_interactive(&self) -> bool {
        self.interactive
    }

    fn confirm(&mut self, question: &str, default: bool) -> Result<bool> {
        Ok(match self.next(question) {
            Answer::Yes => true,
            Answer::No => false,
            _ => default,
        })
    }

    fn choose(&mut self, question: &str, _choices: &[String], default: usize) -> Result<usize> {
        Ok(match self.next(question) {
            Answer::Choice(n) => n,
            _ => default,
        })
    }

    fn read_text(&mut self, question: &str, default: &str) -> Result<String> {
        Ok(match self.next(question) {
            Answer::Text(text) => text,
            _ => default.to_string(),
        })
    }
}

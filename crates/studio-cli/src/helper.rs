//! rustyline helper: command completion, highlighting and inline hints.

use std::borrow::Cow::{self, Borrowed, Owned};

use colored::Colorize;
use rustyline::completion::{Completer, Pair};
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::validate::Validator;
use rustyline::{Context, Helper};

use crate::command::COMMAND_WORDS;

/// Second words accepted after a command.
fn arguments_for(command: &str) -> &'static [&'static str] {
    match command {
        "category" => &["person", "animal", "object"],
        "items" => &["clothing", "accessory"],
        "upload" | "delete" => &["subject", "item"],
        "history" => &["load", "delete"],
        "view" => &["flat", "tilt", "turnaround"],
        "zoom" => &["in", "out"],
        _ => &[],
    }
}

/// Candidates for the word ending at the cursor, with its start offset.
fn candidates(line: &str) -> (usize, Vec<&'static str>) {
    let start = line.rfind(' ').map(|i| i + 1).unwrap_or(0);
    let word = &line[start..];
    let preceding: Vec<&str> = line[..start].split_whitespace().collect();

    let pool: &[&str] = match preceding.as_slice() {
        [] => COMMAND_WORDS,
        [command] => arguments_for(command),
        _ => &[],
    };
    let matches = pool
        .iter()
        .copied()
        .filter(|candidate| candidate.starts_with(word))
        .collect();
    (start, matches)
}

#[derive(Clone, Default)]
pub struct CliHelper;

impl Helper for CliHelper {}

impl Completer for CliHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let (start, matches) = candidates(&line[..pos]);
        let pairs = matches
            .into_iter()
            .map(|candidate| Pair {
                display: candidate.to_string(),
                replacement: candidate.to_string(),
            })
            .collect();
        Ok((start, pairs))
    }
}

impl Highlighter for CliHelper {
    fn highlight<'l>(&self, line: &'l str, _pos: usize) -> Cow<'l, str> {
        let head = line.split_whitespace().next().unwrap_or("");
        if COMMAND_WORDS.contains(&head) {
            let offset = line.find(head).unwrap_or(0);
            Owned(format!(
                "{}{}{}",
                &line[..offset],
                head.bright_cyan(),
                &line[offset + head.len()..]
            ))
        } else {
            Borrowed(line)
        }
    }

    fn highlight_hint<'h>(&self, hint: &'h str) -> Cow<'h, str> {
        Owned(hint.bright_black().to_string())
    }

    fn highlight_char(&self, _line: &str, _pos: usize, _forced: bool) -> bool {
        true
    }
}

impl Hinter for CliHelper {
    type Hint = String;

    fn hint(&self, line: &str, pos: usize, _ctx: &Context<'_>) -> Option<String> {
        let line = &line[..pos];
        if line.is_empty() {
            return None;
        }
        let (start, matches) = candidates(line);
        let word = &line[start..];
        if word.is_empty() {
            return None;
        }
        matches
            .into_iter()
            .find(|candidate| candidate.len() > word.len())
            .map(|candidate| candidate[word.len()..].to_string())
    }
}

impl Validator for CliHelper {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_completes_first_word() {
        let (start, matches) = candidates("tu");
        assert_eq!(start, 0);
        assert_eq!(matches, vec!["turnaround"]);
    }

    #[test]
    fn test_completes_arguments() {
        let (start, matches) = candidates("category a");
        assert_eq!(start, 9);
        assert_eq!(matches, vec!["animal"]);

        let (_, matches) = candidates("upload ");
        assert_eq!(matches, vec!["subject", "item"]);
    }

    #[test]
    fn test_no_candidates_for_paths() {
        let (_, matches) = candidates("upload subject /tm");
        assert!(matches.is_empty());
    }
}

//! Nyush Parser
//!
//! A command line is split into whitespace-separated words; no quoting or
//! escaping is recognized. The first `|` word splits the line into the two
//! sides of a pipeline, and `<`, `>` and `>>` words take the word after them
//! as a filename.

use log::debug;

use self::ast::{Redirect, RedirectInstruction, SimpleCommandBuilder, SimpleCommandPart};
use crate::errors::{Error, Result};

pub mod ast;

const DELIMITERS: &[char] = &[' ', '\t', '\r', '\n'];
const PIPE: &str = "|";
const INITIAL_TOKEN_CAPACITY: usize = 16;

#[derive(Debug)]
pub struct Command {
    /// The command line as typed, used as the job's label.
    pub input: String,
    pub inner: ast::Command,
}

impl Command {
    pub fn new(input: &str, inner: ast::Command) -> Self {
        Self {
            input: input.to_string(),
            inner,
        }
    }

    /// Returns `None` when `input` holds no words.
    pub fn parse(input: &str) -> Result<Option<Self>> {
        let tokens = tokenize(input);
        if tokens.is_empty() {
            return Ok(None);
        }

        let result = parse_tokens(tokens).map(|inner| Command::new(input.trim(), inner));
        debug!("parsed Command: {:?}", result);
        result.map(Some)
    }
}

/// Splits `line` on spaces, tabs, carriage returns and newlines. Runs of
/// delimiters never produce empty tokens.
pub fn tokenize(line: &str) -> Vec<String> {
    let mut tokens = Vec::with_capacity(INITIAL_TOKEN_CAPACITY);
    tokens.extend(
        line.split(DELIMITERS)
            .filter(|token| !token.is_empty())
            .map(str::to_string),
    );
    tokens
}

/// Only the first `|` splits the line; any later `|` is an ordinary word of
/// the second command.
fn parse_tokens(mut tokens: Vec<String>) -> Result<ast::Command> {
    match tokens.iter().position(|token| token == PIPE) {
        Some(index) => {
            let second = tokens.split_off(index + 1);
            tokens.truncate(index);
            Ok(ast::Command::Pipeline(
                parse_simple_command(tokens)?,
                parse_simple_command(second)?,
            ))
        }
        None => Ok(ast::Command::Simple(parse_simple_command(tokens)?)),
    }
}

fn parse_simple_command(tokens: Vec<String>) -> Result<ast::SimpleCommand> {
    let mut builder = SimpleCommandBuilder::new();
    let mut tokens = tokens.into_iter();
    while let Some(token) = tokens.next() {
        let part = match RedirectInstruction::from_operator(&token) {
            Some(instruction) => {
                let filename = tokens.next().ok_or_else(|| {
                    debug!("redirection '{}' is missing a filename", token);
                    Error::invalid_command()
                })?;
                SimpleCommandPart::Redirect(Redirect {
                    instruction,
                    filename,
                })
            }
            None => SimpleCommandPart::Word(token),
        };
        builder = builder.update(part);
    }

    let command = builder.build();
    if command.words.is_empty() {
        debug!("command has no program: {:?}", command);
        return Err(Error::invalid_command());
    }

    Ok(command)
}

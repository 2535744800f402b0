//! Nyush - a small interactive shell
//!
//! Nyush runs one command, or a two-stage pipeline, per line, with `<`, `>`
//! and `>>` redirection. A foreground process that is stopped is kept as a
//! suspended job which the `jobs` and `fg` builtins list and resume.

#![deny(missing_debug_implementations, unused_import_braces)]

#[macro_use]
mod util;

mod builtins;
pub mod core;
pub mod editor;
pub mod errors;
pub mod execute_command;
pub mod shell;
#[cfg(test)]
mod testing;

pub use crate::editor::Editor;
pub use crate::shell::{create_shell, Shell, ShellConfig};
pub use crate::util::NyushExitStatusExt;
